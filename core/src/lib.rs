#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Grid Tactics engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use serde::{Deserialize, Serialize};

/// Location of a single board cell expressed as `(x, y)` coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: u32,
    y: u32,
}

impl CellCoord {
    /// Creates a new board cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Terrain kind assigned to a board cell.
///
/// Walkability derives from terrain alone: water never admits a unit, every
/// other terrain does. Terrain never changes step cost in the base movement
/// algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    /// Open grassland, walkable.
    Grass,
    /// Impassable water.
    Water,
    /// Loose sand, walkable.
    Sand,
    /// Bare stone, walkable.
    Stone,
}

impl Terrain {
    /// Reports whether units may occupy or traverse cells of this terrain.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        !matches!(self, Self::Water)
    }

    /// Parses a terrain from its single-character level-data code.
    #[must_use]
    pub const fn from_code(code: char) -> Option<Self> {
        match code {
            'G' => Some(Self::Grass),
            'W' => Some(Self::Water),
            'S' => Some(Self::Sand),
            'T' => Some(Self::Stone),
            _ => None,
        }
    }

    /// Single-character code used by level data for this terrain.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Grass => 'G',
            Self::Water => 'W',
            Self::Sand => 'S',
            Self::Stone => 'T',
        }
    }
}

/// Unique identifier assigned to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a player; doubles as the walk-mask identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(u32);

impl PlayerId {
    /// Creates a new player identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Controller kind for a participating player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    /// Player driven by adapter input.
    Human,
    /// Player driven by the computer policy system.
    Computer,
}

/// Unit archetype recognised by level data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Armoured melee unit fielded by the defending side.
    Knight,
    /// Fast, fragile attacker fielded by the opposing side.
    Spider,
}

impl UnitKind {
    /// Parses a unit kind from its single-character level-data code.
    #[must_use]
    pub const fn from_code(code: char) -> Option<Self> {
        match code {
            'K' => Some(Self::Knight),
            'S' => Some(Self::Spider),
            _ => None,
        }
    }

    /// Single-character code used by level data for this unit kind.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Knight => 'K',
            Self::Spider => 'S',
        }
    }

    /// Starting health for units of this kind.
    #[must_use]
    pub const fn base_health(self) -> Health {
        match self {
            Self::Knight => Health::new(3),
            Self::Spider => Health::new(2),
        }
    }

    /// Damage dealt per attack by units of this kind.
    #[must_use]
    pub const fn attack_power(self) -> u32 {
        match self {
            Self::Knight => 2,
            Self::Spider => 1,
        }
    }

    /// Movement budget in steps per move for units of this kind.
    #[must_use]
    pub const fn move_budget(self) -> u32 {
        match self {
            Self::Knight => 3,
            Self::Spider => 2,
        }
    }

    /// Attack radius in Manhattan distance for units of this kind.
    #[must_use]
    pub const fn attack_radius(self) -> u32 {
        match self {
            Self::Knight => 1,
            Self::Spider => 1,
        }
    }
}

/// Remaining hit points of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Health(u32);

impl Health {
    /// Creates a new health value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric hit point count.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the health remaining after absorbing the provided damage.
    #[must_use]
    pub const fn saturating_damage(self, damage: u32) -> Self {
        Self(self.0.saturating_sub(damage))
    }

    /// Reports whether no hit points remain.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

/// Per-cell traversal restriction maintained alongside occupancy.
///
/// A cell occupied by a unit carries that unit's player identity so the
/// pathfinder can let friendly units pass through while refusing enemies.
/// Vacated cells revert to `Unrestricted`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WalkMask {
    /// Any player's units may traverse the cell.
    Unrestricted,
    /// Only the named player's units may traverse the cell.
    Owner(PlayerId),
}

impl WalkMask {
    /// Reports whether the searching player may traverse a cell carrying
    /// this mask.
    #[must_use]
    pub fn permits(self, player: PlayerId) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Owner(owner) => owner == player,
        }
    }
}

/// Kind of highlight overlay requested from presentation adapters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HighlightKind {
    /// Movement-range highlight.
    Range,
    /// Reconstructed path preview.
    Path,
    /// Attack-range highlight.
    Attack,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Relocates a unit along a reconstructed movement path.
    MoveUnit {
        /// Identifier of the unit to move.
        unit: UnitId,
        /// Ordered cells from the unit's current cell to the destination,
        /// inclusive on both ends.
        path: Vec<CellCoord>,
    },
    /// Resolves an attack between two units.
    Attack {
        /// Identifier of the attacking unit.
        attacker: UnitId,
        /// Identifier of the unit being attacked.
        target: UnitId,
    },
    /// Ends the active player's turn and hands control to the next player.
    EndTurn,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a unit relocated between two cells.
    UnitMoved {
        /// Identifier of the unit that moved.
        unit: UnitId,
        /// Cell the unit occupied before the move.
        from: CellCoord,
        /// Cell the unit occupies after the move.
        to: CellCoord,
    },
    /// Reports that a move request was rejected.
    MoveRejected {
        /// Identifier of the unit named in the request.
        unit: UnitId,
        /// Specific reason the move failed.
        reason: MoveError,
    },
    /// Confirms that an attack landed on a unit that survived it.
    UnitDamaged {
        /// Identifier of the damaged unit.
        unit: UnitId,
        /// Hit points remaining after the attack.
        remaining: Health,
    },
    /// Confirms that a unit was defeated and removed from the board.
    UnitDefeated {
        /// Identifier of the defeated unit.
        unit: UnitId,
        /// Cell the unit occupied when defeated.
        cell: CellCoord,
    },
    /// Reports that an attack request was rejected.
    AttackRejected {
        /// Identifier of the attacker named in the request.
        attacker: UnitId,
        /// Specific reason the attack failed.
        reason: AttackError,
    },
    /// Announces that a player lost their last unit.
    PlayerEliminated {
        /// Identifier of the eliminated player.
        player: PlayerId,
    },
    /// Confirms that the active player ended their turn.
    TurnEnded {
        /// Identifier of the player whose turn ended.
        player: PlayerId,
    },
    /// Announces that control passed to a new active player.
    TurnStarted {
        /// Identifier of the player whose turn began.
        player: PlayerId,
        /// One-based turn counter after the handoff.
        turn: u32,
    },
    /// Announces that the match concluded.
    MatchEnded {
        /// Final outcome of the match.
        outcome: MatchOutcome,
    },
}

/// Reasons a move request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveError {
    /// The match already concluded; no further moves are accepted.
    MatchOver,
    /// No unit with the provided identifier exists.
    MissingUnit,
    /// The unit does not belong to the active player.
    NotActivePlayer,
    /// The unit already moved this turn.
    AlreadyMoved,
    /// The provided path was empty or did not start at the unit's cell.
    InvalidOrigin,
    /// Consecutive path cells were not orthogonal neighbors.
    DiscontiguousPath,
    /// The path is longer than the unit's movement budget allows.
    BudgetExceeded,
    /// A path cell is out of bounds, unwalkable, or masked against the unit.
    BlockedCell,
    /// The destination cell is occupied by another unit.
    DestinationOccupied,
}

/// Reasons an attack request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttackError {
    /// The match already concluded; no further attacks are accepted.
    MatchOver,
    /// No unit with the provided attacker identifier exists.
    MissingAttacker,
    /// The attacker does not belong to the active player.
    NotActivePlayer,
    /// The attacker already attacked this turn.
    AlreadyAttacked,
    /// No unit with the provided target identifier exists.
    MissingTarget,
    /// The target belongs to the attacker's own player.
    FriendlyTarget,
    /// The target lies outside the attacker's weapon radius.
    OutOfRange,
}

/// Final outcome of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchOutcome {
    /// A single player remained or won the turn-limit tie-break.
    Victory {
        /// Identifier of the winning player.
        winner: PlayerId,
    },
    /// The turn-limit tie-break could not separate the survivors.
    Draw,
}

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitSnapshot {
    /// Unique identifier assigned to the unit.
    pub id: UnitId,
    /// Player that owns the unit.
    pub player: PlayerId,
    /// Archetype the unit was created from.
    pub kind: UnitKind,
    /// Grid cell currently occupied by the unit.
    pub cell: CellCoord,
    /// Steps the unit may take in a single move.
    pub move_budget: u32,
    /// Manhattan radius of the unit's weapon.
    pub attack_radius: u32,
    /// Hit points remaining.
    pub health: Health,
    /// Indicates whether the unit moved this turn.
    pub has_moved: bool,
    /// Indicates whether the unit attacked this turn.
    pub has_attacked: bool,
}

/// Read-only snapshot describing all living units on the board.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured unit snapshots in deterministic id order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Retrieves the snapshot for the provided unit, if it is alive.
    #[must_use]
    pub fn get(&self, unit: UnitId) -> Option<&UnitSnapshot> {
        self.snapshots
            .binary_search_by_key(&unit, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}

/// Read-only view into the board's terrain, walk-mask, and occupancy layers.
#[derive(Clone, Copy, Debug)]
pub struct BoardView<'a> {
    terrain: &'a [Terrain],
    masks: &'a [WalkMask],
    occupants: &'a [Option<UnitId>],
    width: u32,
    height: u32,
}

impl<'a> BoardView<'a> {
    /// Captures a new board view backed by the provided dense layers.
    ///
    /// All three slices are row-major with `width * height` entries.
    #[must_use]
    pub fn new(
        terrain: &'a [Terrain],
        masks: &'a [WalkMask],
        occupants: &'a [Option<UnitId>],
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            terrain,
            masks,
            occupants,
            width,
            height,
        }
    }

    /// Provides the dimensions of the underlying board.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Reports whether the coordinate addresses a cell on the board.
    #[must_use]
    pub const fn in_bounds(&self, cell: CellCoord) -> bool {
        cell.x() < self.width && cell.y() < self.height
    }

    /// Terrain of the provided cell, if it lies on the board.
    #[must_use]
    pub fn terrain(&self, cell: CellCoord) -> Option<Terrain> {
        self.index(cell)
            .and_then(|index| self.terrain.get(index).copied())
    }

    /// Walk-mask of the provided cell, if it lies on the board.
    #[must_use]
    pub fn mask(&self, cell: CellCoord) -> Option<WalkMask> {
        self.index(cell)
            .and_then(|index| self.masks.get(index).copied())
    }

    /// Returns the unit occupying the provided cell, if any.
    #[must_use]
    pub fn occupant(&self, cell: CellCoord) -> Option<UnitId> {
        self.index(cell)
            .and_then(|index| self.occupants.get(index).copied().flatten())
    }

    /// Reports whether terrain permits units on the provided cell.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.terrain(cell).is_some_and(Terrain::is_walkable)
    }

    /// Reports whether the searching player may traverse the provided cell.
    ///
    /// Traversal requires walkable terrain and a mask that is unrestricted
    /// or owned by the player. Stopping additionally requires the cell to be
    /// unoccupied; that check belongs to the caller.
    #[must_use]
    pub fn is_traversable_by(&self, cell: CellCoord, player: PlayerId) -> bool {
        self.is_walkable(cell) && self.mask(cell).is_some_and(|mask| mask.permits(player))
    }

    /// Dense row-major index of the provided cell, if it lies on the board.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.in_bounds(cell) {
            let y = usize::try_from(cell.y()).ok()?;
            let x = usize::try_from(cell.x()).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(y * width + x)
        } else {
            None
        }
    }
}

/// Returns the in-bounds orthogonal neighbors of a cell in the fixed
/// up, down, right, left order used throughout the engine.
///
/// The order determines BFS predecessor tie-breaks and therefore which of
/// several equally short paths the pathfinder reconstructs.
#[must_use]
pub fn orthogonal_neighbors(cell: CellCoord, width: u32, height: u32) -> NeighborIter {
    let mut neighbors = NeighborIter::default();

    if cell.y() > 0 {
        neighbors.push(CellCoord::new(cell.x(), cell.y() - 1));
    }
    if cell.y() + 1 < height {
        neighbors.push(CellCoord::new(cell.x(), cell.y() + 1));
    }
    if cell.x() + 1 < width {
        neighbors.push(CellCoord::new(cell.x() + 1, cell.y()));
    }
    if cell.x() > 0 {
        neighbors.push(CellCoord::new(cell.x() - 1, cell.y()));
    }

    neighbors
}

/// Fixed-capacity iterator over a cell's orthogonal neighbors.
#[derive(Clone, Debug, Default)]
pub struct NeighborIter {
    buffer: [Option<CellCoord>; 4],
    len: usize,
    cursor: usize,
}

impl NeighborIter {
    fn push(&mut self, cell: CellCoord) {
        if self.len < self.buffer.len() {
            self.buffer[self.len] = Some(cell);
            self.len += 1;
        }
    }
}

impl Iterator for NeighborIter {
    type Item = CellCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }

        let value = self.buffer[self.cursor];
        self.cursor += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn water_is_the_only_unwalkable_terrain() {
        assert!(Terrain::Grass.is_walkable());
        assert!(Terrain::Sand.is_walkable());
        assert!(Terrain::Stone.is_walkable());
        assert!(!Terrain::Water.is_walkable());
    }

    #[test]
    fn terrain_codes_round_trip() {
        for terrain in [Terrain::Grass, Terrain::Water, Terrain::Sand, Terrain::Stone] {
            assert_eq!(Terrain::from_code(terrain.code()), Some(terrain));
        }
        assert_eq!(Terrain::from_code('X'), None);
    }

    #[test]
    fn walk_mask_permits_owner_and_unrestricted() {
        let red = PlayerId::new(0);
        let blue = PlayerId::new(1);

        assert!(WalkMask::Unrestricted.permits(red));
        assert!(WalkMask::Owner(red).permits(red));
        assert!(!WalkMask::Owner(blue).permits(red));
    }

    #[test]
    fn neighbors_follow_up_down_right_left_order() {
        let collected: Vec<_> = orthogonal_neighbors(CellCoord::new(1, 1), 3, 3).collect();
        assert_eq!(
            collected,
            vec![
                CellCoord::new(1, 0),
                CellCoord::new(1, 2),
                CellCoord::new(2, 1),
                CellCoord::new(0, 1),
            ]
        );
    }

    #[test]
    fn corner_neighbors_are_filtered_to_bounds() {
        let collected: Vec<_> = orthogonal_neighbors(CellCoord::new(0, 0), 3, 3).collect();
        assert_eq!(collected, vec![CellCoord::new(0, 1), CellCoord::new(1, 0)]);
    }

    #[test]
    fn health_saturates_at_zero() {
        let health = Health::new(2);
        assert_eq!(health.saturating_damage(1), Health::new(1));
        assert_eq!(health.saturating_damage(5), Health::new(0));
        assert!(health.saturating_damage(5).is_zero());
    }

    #[test]
    fn unit_view_sorts_and_finds_by_id() {
        let snapshot = |id: u32, cell: CellCoord| UnitSnapshot {
            id: UnitId::new(id),
            player: PlayerId::new(0),
            kind: UnitKind::Knight,
            cell,
            move_budget: 3,
            attack_radius: 1,
            health: Health::new(3),
            has_moved: false,
            has_attacked: false,
        };

        let view = UnitView::from_snapshots(vec![
            snapshot(4, CellCoord::new(2, 0)),
            snapshot(1, CellCoord::new(0, 0)),
        ]);

        let ids: Vec<_> = view.iter().map(|unit| unit.id.get()).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(view.get(UnitId::new(4)).map(|unit| unit.cell), Some(CellCoord::new(2, 0)));
        assert!(view.get(UnitId::new(7)).is_none());
    }

    #[test]
    fn board_view_indexes_row_major_and_rejects_out_of_bounds() {
        let terrain = vec![Terrain::Grass, Terrain::Water, Terrain::Grass, Terrain::Grass];
        let masks = vec![WalkMask::Unrestricted; 4];
        let occupants = vec![None, None, Some(UnitId::new(9)), None];
        let view = BoardView::new(&terrain, &masks, &occupants, 2, 2);

        assert_eq!(view.terrain(CellCoord::new(1, 0)), Some(Terrain::Water));
        assert!(!view.is_walkable(CellCoord::new(1, 0)));
        assert_eq!(view.occupant(CellCoord::new(0, 1)), Some(UnitId::new(9)));
        assert_eq!(view.terrain(CellCoord::new(2, 0)), None);
        assert_eq!(view.occupant(CellCoord::new(0, 2)), None);
    }

    #[test]
    fn cell_coord_round_trips_through_bincode() {
        let cell = CellCoord::new(5, 7);
        let bytes = bincode::serialize(&cell).expect("serialize");
        let restored: CellCoord = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, cell);
    }
}
