//! Authoritative board storage: terrain, walk-masks, and occupancy.

use grid_tactics_core::{BoardView, CellCoord, PlayerId, Terrain, UnitId, WalkMask};

/// Dense rectangular board owning every cell's terrain, walk-mask, and
/// occupancy slot.
///
/// Placement and removal go through a single accessor pair so the cell's
/// occupant, its walk-mask, and the unit's back-reference held by the world
/// can never disagree. Callers never write the layers independently.
#[derive(Clone, Debug)]
pub(crate) struct Board {
    width: u32,
    height: u32,
    terrain: Vec<Terrain>,
    masks: Vec<WalkMask>,
    occupants: Vec<Option<UnitId>>,
}

impl Board {
    /// Creates a board from validated row-major terrain data.
    pub(crate) fn new(width: u32, height: u32, terrain: Vec<Terrain>) -> Self {
        let cell_count = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        assert_eq!(
            terrain.len(),
            cell_count,
            "terrain layer must cover the whole {width}x{height} grid"
        );

        Self {
            width,
            height,
            masks: vec![WalkMask::Unrestricted; cell_count],
            occupants: vec![None; cell_count],
            terrain,
        }
    }

    pub(crate) const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub(crate) fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.x() < self.width && cell.y() < self.height {
            let y = usize::try_from(cell.y()).ok()?;
            let x = usize::try_from(cell.x()).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(y * width + x)
        } else {
            None
        }
    }

    /// Unit occupying the provided cell, if any.
    pub(crate) fn occupant(&self, cell: CellCoord) -> Option<UnitId> {
        self.index(cell)
            .and_then(|index| self.occupants.get(index).copied().flatten())
    }

    /// Places a unit on the provided cell, claiming its walk-mask for the
    /// owning player.
    ///
    /// Returns `false` without mutating when the cell is out of bounds,
    /// unwalkable, or already occupied by a different unit.
    pub(crate) fn place(&mut self, unit: UnitId, owner: PlayerId, cell: CellCoord) -> bool {
        let Some(index) = self.index(cell) else {
            return false;
        };
        if !self.terrain[index].is_walkable() {
            return false;
        }
        if self.occupants[index].is_some_and(|occupant| occupant != unit) {
            return false;
        }

        self.occupants[index] = Some(unit);
        self.masks[index] = WalkMask::Owner(owner);
        true
    }

    /// Removes a unit from the provided cell, resetting the walk-mask.
    ///
    /// The cell must hold exactly the named unit; anything else is an
    /// occupancy-invariant violation and a programming defect, so it fails
    /// loudly rather than being tolerated.
    pub(crate) fn remove(&mut self, unit: UnitId, cell: CellCoord) {
        let index = self
            .index(cell)
            .unwrap_or_else(|| panic!("unit {} recorded on out-of-bounds cell", unit.get()));
        assert_eq!(
            self.occupants[index],
            Some(unit),
            "cell occupancy disagrees with unit {} back-reference",
            unit.get()
        );

        self.occupants[index] = None;
        self.masks[index] = WalkMask::Unrestricted;
    }

    /// Captures a read-only view over all three board layers.
    pub(crate) fn view(&self) -> BoardView<'_> {
        BoardView::new(
            &self.terrain,
            &self.masks,
            &self.occupants,
            self.width,
            self.height,
        )
    }
}
