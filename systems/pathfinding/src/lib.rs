#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Breadth-first grid pathfinder with a relaxed-passability fallback.

use std::collections::{HashMap, HashSet, VecDeque};

use flagrush_core::{GridCoord, TileKind};
use flagrush_world::TileMap;

/// Search mode controlling which obstacle classes count as traversable.
///
/// The relaxed mode is scoped to a single retry within one
/// [`Pathfinder::find_path`] call and is never carried across searches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Passability {
    /// Only open ground and wooden boxes are traversable.
    Strict,
    /// Metal boxes additionally count as traversable, recovering
    /// connectivity on maps where every wood-only route is walled off.
    MetalRelaxed,
}

/// Grid pathfinder that reuses its frontier and bookkeeping allocations
/// across searches.
#[derive(Debug, Default)]
pub struct Pathfinder {
    frontier: VecDeque<GridCoord>,
    came_from: HashMap<GridCoord, GridCoord>,
    visited: HashSet<GridCoord>,
}

impl Pathfinder {
    /// Creates a new pathfinder with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds the shortest tile path from `start` to `goal`.
    ///
    /// Unweighted breadth-first search over 4-connected neighbors in the
    /// fixed order north, east, south, west, so equal-length paths resolve
    /// deterministically. The returned path begins one step ahead of
    /// `start` and ends at `goal`; `start == goal` yields an empty path.
    ///
    /// When the strict search exhausts its frontier the search restarts
    /// once with metal boxes treated as traversable. An empty result means
    /// "no route currently known" and is never an error; callers simply
    /// re-attempt on a later planning cycle.
    pub fn find_path(
        &mut self,
        start: GridCoord,
        goal: GridCoord,
        map: &TileMap,
    ) -> VecDeque<GridCoord> {
        if start == goal {
            return VecDeque::new();
        }

        match self.search(start, goal, map, Passability::Strict) {
            Some(path) => path,
            None => self
                .search(start, goal, map, Passability::MetalRelaxed)
                .unwrap_or_default(),
        }
    }

    fn search(
        &mut self,
        start: GridCoord,
        goal: GridCoord,
        map: &TileMap,
        passability: Passability,
    ) -> Option<VecDeque<GridCoord>> {
        self.frontier.clear();
        self.came_from.clear();
        self.visited.clear();

        self.frontier.push_back(start);
        let _ = self.visited.insert(start);

        while let Some(node) = self.frontier.pop_front() {
            if node == goal {
                return Some(self.reconstruct(start, goal));
            }

            for neighbor in neighbors(node) {
                if self.visited.contains(&neighbor) {
                    continue;
                }
                if !is_traversable(map.classify(neighbor), passability) {
                    continue;
                }

                let _ = self.visited.insert(neighbor);
                let _ = self.came_from.insert(neighbor, node);
                self.frontier.push_back(neighbor);
            }
        }

        None
    }

    fn reconstruct(&self, start: GridCoord, goal: GridCoord) -> VecDeque<GridCoord> {
        let mut path = VecDeque::new();
        let mut node = goal;
        while node != start {
            path.push_front(node);
            node = self.came_from[&node];
        }
        path
    }
}

/// The four bordering tiles of a coordinate, in tie-break order.
fn neighbors(coord: GridCoord) -> [GridCoord; 4] {
    let column = coord.column();
    let row = coord.row();
    [
        GridCoord::new(column, row - 1),
        GridCoord::new(column + 1, row),
        GridCoord::new(column, row + 1),
        GridCoord::new(column - 1, row),
    ]
}

fn is_traversable(kind: TileKind, passability: Passability) -> bool {
    match kind {
        TileKind::Open | TileKind::WoodBox => true,
        TileKind::MetalBox => passability == Passability::MetalRelaxed,
        TileKind::StoneBox => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(layout: &str) -> TileMap {
        TileMap::parse(layout).expect("layout parses")
    }

    #[test]
    fn start_equals_goal_yields_empty_path() {
        let map = map("...");
        let mut pathfinder = Pathfinder::new();
        let path = pathfinder.find_path(GridCoord::new(1, 0), GridCoord::new(1, 0), &map);
        assert!(path.is_empty());
    }

    #[test]
    fn straight_corridor_yields_one_waypoint_per_tile() {
        let map = map(".....");
        let mut pathfinder = Pathfinder::new();
        let path = pathfinder.find_path(GridCoord::new(0, 0), GridCoord::new(4, 0), &map);
        assert_eq!(
            Vec::from(path),
            vec![
                GridCoord::new(1, 0),
                GridCoord::new(2, 0),
                GridCoord::new(3, 0),
                GridCoord::new(4, 0),
            ]
        );
    }

    #[test]
    fn path_length_matches_shortest_distance_around_a_wall() {
        // The stone column forces a two-tile detour.
        let map = map(
            "..S..
             ..S..
             .....",
        );
        let mut pathfinder = Pathfinder::new();
        let path = pathfinder.find_path(GridCoord::new(0, 0), GridCoord::new(4, 0), &map);
        assert_eq!(path.len(), 8);
        assert_eq!(path.back(), Some(&GridCoord::new(4, 0)));
        assert!(!path.contains(&GridCoord::new(0, 0)));
    }

    #[test]
    fn wood_boxes_are_traversable_under_strict_passability() {
        let map = map("..W..");
        let mut pathfinder = Pathfinder::new();
        let path = pathfinder.find_path(GridCoord::new(0, 0), GridCoord::new(4, 0), &map);
        assert_eq!(path.len(), 4);
        assert!(path.contains(&GridCoord::new(2, 0)));
    }

    #[test]
    fn metal_boxes_require_the_relaxed_retry() {
        let map = map("..M..");
        let mut pathfinder = Pathfinder::new();
        let path = pathfinder.find_path(GridCoord::new(0, 0), GridCoord::new(4, 0), &map);
        assert_eq!(
            Vec::from(path),
            vec![
                GridCoord::new(1, 0),
                GridCoord::new(2, 0),
                GridCoord::new(3, 0),
                GridCoord::new(4, 0),
            ]
        );
    }

    #[test]
    fn stone_walls_defeat_even_the_relaxed_retry() {
        let map = map("..S..");
        let mut pathfinder = Pathfinder::new();
        let path = pathfinder.find_path(GridCoord::new(0, 0), GridCoord::new(4, 0), &map);
        assert!(path.is_empty());
    }

    #[test]
    fn equal_length_paths_resolve_by_neighbor_order() {
        // Two shortest routes exist; east is explored before south.
        let map = map(
            "...
             ...
             ...",
        );
        let mut pathfinder = Pathfinder::new();
        let path = pathfinder.find_path(GridCoord::new(0, 0), GridCoord::new(1, 1), &map);
        assert_eq!(
            Vec::from(path),
            vec![GridCoord::new(1, 0), GridCoord::new(1, 1)]
        );
    }

    #[test]
    fn repeated_searches_are_deterministic() {
        let map = map(
            ".W...
             .SM..
             .....",
        );
        let mut pathfinder = Pathfinder::new();
        let first = pathfinder.find_path(GridCoord::new(0, 0), GridCoord::new(4, 2), &map);
        let second = pathfinder.find_path(GridCoord::new(0, 0), GridCoord::new(4, 2), &map);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn off_map_goals_yield_no_route() {
        let map = map("...");
        let mut pathfinder = Pathfinder::new();
        let path = pathfinder.find_path(GridCoord::new(0, 0), GridCoord::new(0, -3), &map);
        assert!(path.is_empty());
    }
}
