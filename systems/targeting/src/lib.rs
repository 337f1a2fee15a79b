#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that evaluates Manhattan attack ranges and legal targets.

use grid_tactics_core::{CellCoord, PlayerId, UnitId, UnitView};

/// Materialized attack range around a single origin cell.
///
/// Holds every in-bounds cell whose Manhattan distance from the origin is at
/// most the radius, in row-major order. Occupancy plays no role in the range
/// itself; target legality is a separate question answered by
/// [`Targeting::legal_targets`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttackRange {
    origin: CellCoord,
    radius: u32,
    width: u32,
    height: u32,
    cells: Vec<CellCoord>,
}

impl AttackRange {
    /// Cell the range was evaluated from.
    #[must_use]
    pub fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Maximum Manhattan distance covered by the range.
    #[must_use]
    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// Reports whether the given cell lies inside the range.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.x() < self.width
            && cell.y() < self.height
            && self.origin.manhattan_distance(cell) <= self.radius
    }

    /// In-range cells in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }
}

/// Evaluates the attack range for an origin cell on a board of `dims`
/// (width, height) cells.
#[must_use]
pub fn attack_range(dims: (u32, u32), origin: CellCoord, radius: u32) -> AttackRange {
    let (width, height) = dims;
    let mut cells = Vec::new();

    let min_y = origin.y().saturating_sub(radius);
    let max_y = origin.y().saturating_add(radius).min(height.saturating_sub(1));
    for y in min_y..=max_y {
        let remaining = radius - origin.y().abs_diff(y);
        let min_x = origin.x().saturating_sub(remaining);
        let max_x = origin
            .x()
            .saturating_add(remaining)
            .min(width.saturating_sub(1));
        for x in min_x..=max_x {
            cells.push(CellCoord::new(x, y));
        }
    }

    AttackRange {
        origin,
        radius,
        width,
        height,
        cells,
    }
}

/// Targeting system that reuses a scratch buffer across evaluations.
#[derive(Debug, Default)]
pub struct Targeting {
    candidates: Vec<TargetCandidate>,
}

impl Targeting {
    /// Creates a new targeting system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects every living enemy unit standing on a cell of the range.
    ///
    /// The output buffer is cleared before being populated; results are
    /// ordered by ascending unit identifier.
    pub fn legal_targets(
        &mut self,
        range: &AttackRange,
        units: &UnitView,
        attacker_player: PlayerId,
        out: &mut Vec<UnitId>,
    ) {
        out.clear();
        self.prepare_candidates(range, units, attacker_player);
        out.extend(self.candidates.iter().map(|candidate| candidate.unit));
    }

    /// Picks the preferred target among the legal ones, or `None` when the
    /// range holds no living enemy.
    ///
    /// Preference is deterministic: lowest remaining health first, then the
    /// smaller unit identifier.
    #[must_use]
    pub fn best_target(
        &mut self,
        range: &AttackRange,
        units: &UnitView,
        attacker_player: PlayerId,
    ) -> Option<UnitId> {
        self.prepare_candidates(range, units, attacker_player);

        let mut best: Option<TargetCandidate> = None;
        for candidate in &self.candidates {
            match &mut best {
                Some(existing) => {
                    if candidate.precedes(existing) {
                        *existing = *candidate;
                    }
                }
                None => best = Some(*candidate),
            }
        }

        best.map(|candidate| candidate.unit)
    }

    fn prepare_candidates(
        &mut self,
        range: &AttackRange,
        units: &UnitView,
        attacker_player: PlayerId,
    ) {
        self.candidates.clear();
        let (lower, _) = units.iter().size_hint();
        self.candidates.reserve(lower);

        for snapshot in units.iter() {
            if snapshot.player == attacker_player {
                continue;
            }
            if snapshot.health.is_zero() {
                continue;
            }
            if !range.contains(snapshot.cell) {
                continue;
            }

            self.candidates.push(TargetCandidate {
                unit: snapshot.id,
                health: snapshot.health.get(),
            });
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct TargetCandidate {
    unit: UnitId,
    health: u32,
}

impl TargetCandidate {
    fn precedes(&self, other: &Self) -> bool {
        if self.health != other.health {
            return self.health < other.health;
        }

        self.unit < other.unit
    }
}
