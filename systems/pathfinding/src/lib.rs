#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement-range and shortest-path engine.
//!
//! Ranges are computed by an unweighted breadth-first search over the board
//! view. Every step costs one regardless of terrain; terrain only decides
//! walkability. The search may pass *through* cells occupied by friendly
//! units (their walk-mask permits the searching player) but a path may only
//! terminate on an unoccupied cell, so occupied cells never enter the
//! stoppable set, with the searching unit's own origin as the only
//! exception.
//!
//! Search bookkeeping (visited, cost, predecessor) lives in dense arrays
//! indexed by cell id inside the returned [`MovementRange`], never on the
//! long-lived board, so abandoned queries leave no state behind.

use std::collections::VecDeque;

use grid_tactics_core::{orthogonal_neighbors, BoardView, CellCoord, PlayerId, UnitSnapshot};

const UNVISITED: u32 = u32::MAX;

/// Movement-range planner that reuses its frontier queue across searches.
#[derive(Debug, Default)]
pub struct Pathfinder {
    frontier: VecDeque<CellCoord>,
}

impl Pathfinder {
    /// Creates a new pathfinder with an empty scratch frontier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the set of cells the unit may legally end a move on.
    ///
    /// The result always contains the unit's current cell.
    #[must_use]
    pub fn movement_range(&mut self, view: &BoardView<'_>, unit: &UnitSnapshot) -> MovementRange {
        self.search(view, unit.cell, unit.player, unit.move_budget)
    }

    /// Breadth-first search from `origin`, bounded by `budget` steps.
    #[must_use]
    pub fn search(
        &mut self,
        view: &BoardView<'_>,
        origin: CellCoord,
        player: PlayerId,
        budget: u32,
    ) -> MovementRange {
        let (width, height) = view.dimensions();
        let cell_count = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);

        let mut range = MovementRange {
            origin,
            width,
            height,
            stoppable: vec![false; cell_count],
            cost: vec![UNVISITED; cell_count],
            predecessor: vec![None; cell_count],
        };

        let Some(origin_index) = view.index(origin) else {
            return range;
        };

        range.cost[origin_index] = 0;
        range.stoppable[origin_index] = true;

        self.frontier.clear();
        self.frontier.push_back(origin);

        while let Some(cell) = self.frontier.pop_front() {
            let Some(cell_index) = view.index(cell) else {
                continue;
            };
            let next_cost = range.cost[cell_index] + 1;
            if next_cost > budget {
                continue;
            }

            for neighbor in orthogonal_neighbors(cell, width, height) {
                let Some(neighbor_index) = view.index(neighbor) else {
                    continue;
                };
                if range.cost[neighbor_index] != UNVISITED {
                    continue;
                }
                if !view.is_traversable_by(neighbor, player) {
                    continue;
                }

                range.cost[neighbor_index] = next_cost;
                range.predecessor[neighbor_index] = Some(cell);
                range.stoppable[neighbor_index] = view.occupant(neighbor).is_none();
                self.frontier.push_back(neighbor);
            }
        }

        range
    }
}

/// Result of a movement-range search: the stoppable set plus the predecessor
/// links required to reconstruct a shortest path to any member.
#[derive(Clone, Debug)]
pub struct MovementRange {
    origin: CellCoord,
    width: u32,
    height: u32,
    stoppable: Vec<bool>,
    cost: Vec<u32>,
    predecessor: Vec<Option<CellCoord>>,
}

impl MovementRange {
    /// Cell the search started from.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Reports whether the unit may legally end a move on the provided cell.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .is_some_and(|index| self.stoppable[index])
    }

    /// Step cost from the origin to the provided cell, if it was reached.
    #[must_use]
    pub fn cost(&self, cell: CellCoord) -> Option<u32> {
        self.index(cell)
            .map(|index| self.cost[index])
            .filter(|&cost| cost != UNVISITED)
    }

    /// Iterates the stoppable cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        let width = self.width;
        self.stoppable
            .iter()
            .enumerate()
            .filter(|(_, stoppable)| **stoppable)
            .filter_map(move |(index, _)| {
                let index = u32::try_from(index).ok()?;
                Some(CellCoord::new(index % width, index / width))
            })
    }

    /// Reconstructs the shortest path from the origin to the target cell,
    /// inclusive on both ends.
    ///
    /// Returns `None` when the target is not a legal stopping cell.
    #[must_use]
    pub fn path_to(&self, target: CellCoord) -> Option<Vec<CellCoord>> {
        if !self.contains(target) {
            return None;
        }

        let mut path = vec![target];
        let mut cursor = target;
        while cursor != self.origin {
            let index = self.index(cursor)?;
            cursor = self.predecessor[index]?;
            path.push(cursor);
        }
        path.reverse();
        Some(path)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.x() < self.width && cell.y() < self.height {
            let y = usize::try_from(cell.y()).ok()?;
            let x = usize::try_from(cell.x()).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(y * width + x)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_tactics_core::{Terrain, UnitId, WalkMask};

    struct Fixture {
        terrain: Vec<Terrain>,
        masks: Vec<WalkMask>,
        occupants: Vec<Option<UnitId>>,
        width: u32,
        height: u32,
    }

    impl Fixture {
        fn grass(width: u32, height: u32) -> Self {
            let cells = (width * height) as usize;
            Self {
                terrain: vec![Terrain::Grass; cells],
                masks: vec![WalkMask::Unrestricted; cells],
                occupants: vec![None; cells],
                width,
                height,
            }
        }

        fn occupy(&mut self, cell: CellCoord, unit: UnitId, owner: PlayerId) {
            let index = (cell.y() * self.width + cell.x()) as usize;
            self.occupants[index] = Some(unit);
            self.masks[index] = WalkMask::Owner(owner);
        }

        fn water(&mut self, cell: CellCoord) {
            let index = (cell.y() * self.width + cell.x()) as usize;
            self.terrain[index] = Terrain::Water;
        }

        fn view(&self) -> BoardView<'_> {
            BoardView::new(
                &self.terrain,
                &self.masks,
                &self.occupants,
                self.width,
                self.height,
            )
        }
    }

    fn searcher() -> PlayerId {
        PlayerId::new(0)
    }

    #[test]
    fn range_on_open_board_matches_manhattan_disc() {
        let mut fixture = Fixture::grass(3, 3);
        let origin = CellCoord::new(0, 0);
        fixture.occupy(origin, UnitId::new(0), searcher());

        let mut pathfinder = Pathfinder::new();
        let range = pathfinder.search(&fixture.view(), origin, searcher(), 2);

        // Exactly the in-bounds cells within two steps of the corner.
        let cells: Vec<_> = range.cells().collect();
        assert_eq!(
            cells,
            vec![
                CellCoord::new(0, 0),
                CellCoord::new(1, 0),
                CellCoord::new(2, 0),
                CellCoord::new(0, 1),
                CellCoord::new(1, 1),
                CellCoord::new(0, 2),
            ]
        );
        for cell in &cells {
            assert!(origin.manhattan_distance(*cell) <= 2);
        }
        assert!(range.contains(origin));
    }

    #[test]
    fn path_follows_fixed_neighbor_order() {
        let mut fixture = Fixture::grass(3, 3);
        let origin = CellCoord::new(0, 0);
        fixture.occupy(origin, UnitId::new(0), searcher());

        let mut pathfinder = Pathfinder::new();
        let range = pathfinder.search(&fixture.view(), origin, searcher(), 2);

        assert_eq!(
            range.path_to(CellCoord::new(0, 2)),
            Some(vec![
                CellCoord::new(0, 0),
                CellCoord::new(0, 1),
                CellCoord::new(0, 2),
            ])
        );
    }

    #[test]
    fn enemy_blocks_stop_and_traversal_but_not_detour() {
        let mut fixture = Fixture::grass(3, 3);
        let origin = CellCoord::new(0, 0);
        fixture.occupy(origin, UnitId::new(0), searcher());
        fixture.occupy(CellCoord::new(0, 1), UnitId::new(1), PlayerId::new(1));

        let mut pathfinder = Pathfinder::new();
        let short = pathfinder.search(&fixture.view(), origin, searcher(), 2);
        assert!(!short.contains(CellCoord::new(0, 1)));
        assert!(!short.contains(CellCoord::new(0, 2)));

        // The detour (1,0) -> (1,1) -> (1,2) -> (0,2) needs four steps.
        let range = pathfinder.search(&fixture.view(), origin, searcher(), 4);
        assert!(!range.contains(CellCoord::new(0, 1)));
        assert!(range.contains(CellCoord::new(0, 2)));
        let path = range.path_to(CellCoord::new(0, 2)).expect("detour exists");
        assert_eq!(path.len(), 5);
        assert!(!path.contains(&CellCoord::new(0, 1)));
    }

    #[test]
    fn friendly_unit_is_traversable_but_not_stoppable() {
        let mut fixture = Fixture::grass(3, 1);
        let origin = CellCoord::new(0, 0);
        fixture.occupy(origin, UnitId::new(0), searcher());
        fixture.occupy(CellCoord::new(1, 0), UnitId::new(1), searcher());

        let mut pathfinder = Pathfinder::new();
        let range = pathfinder.search(&fixture.view(), origin, searcher(), 2);

        assert!(!range.contains(CellCoord::new(1, 0)));
        assert!(range.contains(CellCoord::new(2, 0)));
        assert_eq!(
            range.path_to(CellCoord::new(2, 0)),
            Some(vec![
                CellCoord::new(0, 0),
                CellCoord::new(1, 0),
                CellCoord::new(2, 0),
            ])
        );
    }

    #[test]
    fn water_is_never_entered() {
        let mut fixture = Fixture::grass(3, 1);
        let origin = CellCoord::new(0, 0);
        fixture.occupy(origin, UnitId::new(0), searcher());
        fixture.water(CellCoord::new(1, 0));

        let mut pathfinder = Pathfinder::new();
        let range = pathfinder.search(&fixture.view(), origin, searcher(), 5);

        assert!(!range.contains(CellCoord::new(1, 0)));
        assert!(!range.contains(CellCoord::new(2, 0)));
    }

    #[test]
    fn budget_bounds_the_range() {
        let mut fixture = Fixture::grass(5, 1);
        let origin = CellCoord::new(0, 0);
        fixture.occupy(origin, UnitId::new(0), searcher());

        let mut pathfinder = Pathfinder::new();
        let range = pathfinder.search(&fixture.view(), origin, searcher(), 2);

        assert!(range.contains(CellCoord::new(2, 0)));
        assert!(!range.contains(CellCoord::new(3, 0)));
        assert_eq!(range.cost(CellCoord::new(2, 0)), Some(2));
        assert_eq!(range.cost(CellCoord::new(3, 0)), None);
    }

    #[test]
    fn path_to_out_of_range_cell_is_none() {
        let mut fixture = Fixture::grass(4, 1);
        let origin = CellCoord::new(0, 0);
        fixture.occupy(origin, UnitId::new(0), searcher());

        let mut pathfinder = Pathfinder::new();
        let range = pathfinder.search(&fixture.view(), origin, searcher(), 1);

        assert_eq!(range.path_to(CellCoord::new(3, 0)), None);
        assert_eq!(range.path_to(CellCoord::new(0, 5)), None);
    }

    #[test]
    fn every_range_cell_has_a_path_within_budget() {
        let mut fixture = Fixture::grass(4, 4);
        let origin = CellCoord::new(1, 1);
        fixture.occupy(origin, UnitId::new(0), searcher());
        fixture.water(CellCoord::new(2, 1));
        fixture.occupy(CellCoord::new(1, 2), UnitId::new(1), PlayerId::new(1));

        let budget = 3;
        let mut pathfinder = Pathfinder::new();
        let range = pathfinder.search(&fixture.view(), origin, searcher(), budget);

        for cell in range.cells() {
            let path = range.path_to(cell).expect("stoppable cell has a path");
            assert_eq!(path.first(), Some(&origin));
            assert_eq!(path.last(), Some(&cell));
            assert!((path.len() - 1) as u32 <= budget);
            for pair in path.windows(2) {
                assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
            }
        }
    }
}
