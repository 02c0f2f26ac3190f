use tracing::debug;

use super::grid::{Grid, GridError, NodeId};
use super::heap::BinaryHeap;
use crate::config::PathfindingConfig;
use crate::geometry::GridPos;

/// Destination-first list of cells; the origin is not included.
///
/// `path[0]` is the destination (or the closest reachable node) and the last
/// element is the first step away from the origin, so consumers walk it from
/// the tail toward index 0.
pub type Path = Vec<GridPos>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heuristic {
    Manhattan,
    /// Octile distance with unit orthogonal and `√2` diagonal cost.
    Diagonal,
}

impl Heuristic {
    pub fn for_connectivity(diagonal: bool) -> Self {
        if diagonal {
            Self::Diagonal
        } else {
            Self::Manhattan
        }
    }

    pub fn distance(self, a: GridPos, b: GridPos) -> f64 {
        let d1 = f64::from(a.c.abs_diff(b.c));
        let d2 = f64::from(a.r.abs_diff(b.r));
        match self {
            Self::Manhattan => d1 + d2,
            Self::Diagonal => {
                let straight = 1.0;
                let diagonal = std::f64::consts::SQRT_2;
                straight * (d1 + d2) + (diagonal - 2.0 * straight) * d1.min(d2)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PathFinding {
    grid: Grid,
    diagonal: bool,
    closest: bool,
    heuristic: Heuristic,
    open: BinaryHeap<NodeId>,
    neighbors: Vec<NodeId>,
}

impl PathFinding {
    pub fn new(columns: u32, rows: u32, config: &PathfindingConfig) -> Self {
        Self::from_grid(Grid::new(columns, rows), config)
    }

    pub fn from_grid(mut grid: Grid, config: &PathfindingConfig) -> Self {
        grid.init();
        let capacity = grid.columns() as usize * grid.rows() as usize;
        Self {
            grid,
            diagonal: config.diagonal,
            closest: config.closest,
            heuristic: Heuristic::for_connectivity(config.diagonal),
            open: BinaryHeap::with_capacity(capacity.min(1024)),
            neighbors: Vec::with_capacity(8),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn columns(&self) -> u32 {
        self.grid.columns()
    }

    pub fn rows(&self) -> u32 {
        self.grid.rows()
    }

    pub fn is_diagonal(&self) -> bool {
        self.diagonal
    }

    pub fn set_diagonal(&mut self, diagonal: bool) {
        self.diagonal = diagonal;
        self.heuristic = Heuristic::for_connectivity(diagonal);
    }

    pub fn is_closest(&self) -> bool {
        self.closest
    }

    pub fn set_closest(&mut self, closest: bool) {
        self.closest = closest;
    }

    pub fn heuristic(&self) -> Heuristic {
        self.heuristic
    }

    pub fn set_cell(&mut self, pos: GridPos, movable: bool) -> Result<(), GridError> {
        let weight = u32::from(movable);
        let node = self.grid.node_at_mut(pos)?;
        node.static_weight = weight;
        node.weight = weight;
        Ok(())
    }

    /// Occupancy passability. Ignored for terrain walls.
    pub fn set_dynamic_cell(&mut self, pos: GridPos, movable: bool) -> Result<(), GridError> {
        let node = self.grid.node_at_mut(pos)?;
        if node.static_weight != 0 {
            node.weight = u32::from(movable);
        }
        Ok(())
    }

    /// Out-of-bounds cells count as filled.
    pub fn is_cell_filled(&self, pos: GridPos) -> bool {
        self.grid
            .node_at(pos)
            .map(|node| node.is_wall())
            .unwrap_or(true)
    }

    /// Open cells around a `size_c` x `size_r` footprint anchored at `pos`.
    ///
    /// The footprint spans columns `pos.c ..= pos.c + size_c - 1` and rows
    /// `pos.r + 1 - size_r ..= pos.r`, clipped to the grid. Footprint cells
    /// and filled cells are excluded; each cell is reported once, in discovery
    /// order.
    pub fn get_adjacent_open_cells(&self, pos: GridPos, size_c: u32, size_r: u32) -> Vec<GridPos> {
        let first_row = pos.r.saturating_sub(size_r.max(1) - 1);
        let last_row = pos.r.min(self.rows().saturating_sub(1));
        let last_column = pos
            .c
            .saturating_add(size_c.max(1) - 1)
            .min(self.columns().saturating_sub(1));
        let in_footprint = |cell: GridPos| {
            (pos.c..=last_column).contains(&cell.c) && (first_row..=last_row).contains(&cell.r)
        };

        let mut cells = Vec::new();
        let mut neighbors = Vec::with_capacity(8);
        for r in (first_row..=last_row).rev() {
            for c in pos.c..=last_column {
                let Some(id) = self.grid.id_of(GridPos { c, r }) else {
                    continue;
                };
                neighbors.clear();
                self.grid.neighbors_into(id, self.diagonal, &mut neighbors);
                for &neighbor in &neighbors {
                    let node = self.grid.node(neighbor);
                    if node.is_wall() || in_footprint(node.pos) || cells.contains(&node.pos) {
                        continue;
                    }
                    cells.push(node.pos);
                }
            }
        }
        cells
    }

    /// Returns `Some(empty)` when the two are equal. When `dest` cannot be
    /// reached the result is `None`, or in closest mode the path to the
    /// visited node with the smallest heuristic distance to `dest` (ties go to
    /// the smaller `g`).
    pub fn solve(&mut self, origin: GridPos, dest: GridPos) -> Option<Path> {
        let start = self.grid.id_of(origin)?;
        let end = self.grid.id_of(dest)?;
        if start == end {
            return Some(Path::new());
        }

        self.grid.clean_dirty();
        self.open.clear();
        let heuristic = self.heuristic;

        let start_h = heuristic.distance(origin, dest);
        {
            let node = self.grid.node_mut_dirty(start);
            node.h = start_h;
            node.f = start_h;
            node.visited = true;
        }
        self.open.push(start, start_h);
        let mut expanded = 0usize;

        let mut neighbors = std::mem::take(&mut self.neighbors);
        while let Some(current) = self.open.pop() {
            if current == end {
                self.neighbors = neighbors;
                return Some(self.path_to(current));
            }
            expanded += 1;
            let current_g = {
                let node = self.grid.node_mut_dirty(current);
                node.closed = true;
                node.g
            };

            neighbors.clear();
            self.grid.neighbors_into(current, self.diagonal, &mut neighbors);
            for &neighbor in &neighbors {
                let candidate = self.grid.node(neighbor);
                if candidate.closed || candidate.is_wall() {
                    continue;
                }
                let g_score = current_g + candidate.cost_from(self.grid.node(current));
                let been_visited = candidate.visited;
                if been_visited && g_score >= candidate.g {
                    continue;
                }

                let h = if been_visited {
                    candidate.h
                } else {
                    heuristic.distance(candidate.pos, dest)
                };
                let f = g_score + h;
                {
                    let node = self.grid.node_mut_dirty(neighbor);
                    node.visited = true;
                    node.parent = Some(current);
                    node.h = h;
                    node.g = g_score;
                    node.f = f;
                }

                if been_visited {
                    self.open.rescore_element(neighbor, f);
                } else {
                    self.open.push(neighbor, f);
                }
            }
        }
        self.neighbors = neighbors;

        if self.closest {
            let closest = self.closest_visited(start);
            let path = self.path_to(closest);
            debug!(
                origin = %origin,
                dest = %dest,
                closest = %self.grid.node(closest).pos,
                expanded,
                "path_closest_fallback"
            );
            return Some(path);
        }
        debug!(origin = %origin, dest = %dest, expanded, "path_unreachable");
        None
    }

    /// Visited node nearest to the goal by `h`, then by `g`. Equal pairs keep
    /// the node reached first.
    fn closest_visited(&self, start: NodeId) -> NodeId {
        let mut closest = start;
        for id in self.grid.touched() {
            let node = self.grid.node(id);
            if !node.visited {
                continue;
            }
            let best = self.grid.node(closest);
            if node.h < best.h || (node.h == best.h && node.g < best.g) {
                closest = id;
            }
        }
        closest
    }

    fn path_to(&self, id: NodeId) -> Path {
        let mut path = Path::new();
        let mut cursor = id;
        while let Some(parent) = self.grid.node(cursor).parent {
            path.push(self.grid.node(cursor).pos);
            cursor = parent;
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orthogonal() -> PathfindingConfig {
        PathfindingConfig {
            diagonal: false,
            closest: false,
        }
    }

    fn diagonal() -> PathfindingConfig {
        PathfindingConfig {
            diagonal: true,
            closest: false,
        }
    }

    fn wall_row(finder: &mut PathFinding, row: u32) {
        for c in 0..finder.columns() {
            finder.set_cell(GridPos::new(c, row), false).expect("in bounds");
        }
    }

    fn assert_contiguous(path: &Path, origin: GridPos, diagonal: bool) {
        let mut previous = origin;
        for &step in path.iter().rev() {
            let dc = previous.c.abs_diff(step.c);
            let dr = previous.r.abs_diff(step.r);
            if diagonal {
                assert!(dc <= 1 && dr <= 1 && dc + dr > 0, "{previous} -> {step}");
            } else {
                assert_eq!(dc + dr, 1, "{previous} -> {step}");
            }
            previous = step;
        }
    }

    #[test]
    fn open_grid_orthogonal_path_matches_manhattan_distance() {
        let mut finder = PathFinding::new(5, 5, &orthogonal());
        let origin = GridPos::new(0, 0);
        let dest = GridPos::new(4, 4);
        let path = finder.solve(origin, dest).expect("reachable");
        assert_eq!(path.len(), 8);
        assert_eq!(path[0], dest);
        assert_contiguous(&path, origin, false);
    }

    #[test]
    fn open_grid_lengths_hold_for_many_pairs() {
        let mut straight = PathFinding::new(7, 6, &orthogonal());
        let mut diag = PathFinding::new(7, 6, &diagonal());
        let cells: Vec<GridPos> = (0..6)
            .flat_map(|r| (0..7).map(move |c| GridPos::new(c, r)))
            .collect();
        for &origin in cells.iter().step_by(5) {
            for &dest in cells.iter().step_by(3) {
                let manhattan = (origin.c.abs_diff(dest.c) + origin.r.abs_diff(dest.r)) as usize;
                let path = straight.solve(origin, dest).expect("open grid");
                assert_eq!(path.len(), manhattan, "{origin} -> {dest}");
                let path = diag.solve(origin, dest).expect("open grid");
                assert!(path.len() <= manhattan, "{origin} -> {dest}");
                assert_contiguous(&path, origin, true);
            }
        }
    }

    #[test]
    fn diagonal_mode_cuts_the_corner() {
        let mut finder = PathFinding::new(5, 5, &diagonal());
        let path = finder
            .solve(GridPos::new(0, 0), GridPos::new(4, 4))
            .expect("reachable");
        assert_eq!(path.len(), 4);
        assert_eq!(finder.heuristic(), Heuristic::Diagonal);
    }

    #[test]
    fn walled_row_is_unreachable_without_closest() {
        let mut finder = PathFinding::new(5, 5, &orthogonal());
        wall_row(&mut finder, 2);
        assert_eq!(finder.solve(GridPos::new(0, 0), GridPos::new(4, 4)), None);
    }

    #[test]
    fn closest_mode_stops_next_to_the_wall() {
        let mut finder = PathFinding::new(5, 5, &orthogonal());
        wall_row(&mut finder, 2);
        finder.set_closest(true);
        let origin = GridPos::new(0, 0);
        let dest = GridPos::new(4, 4);
        let path = finder.solve(origin, dest).expect("closest path");
        let end = path[0];
        assert_eq!(end, GridPos::new(4, 1));
        assert_contiguous(&path, origin, false);
    }

    #[test]
    fn closest_endpoint_has_minimal_heuristic_among_reachable_cells() {
        let mut finder = PathFinding::new(8, 8, &orthogonal());
        for r in 0..8 {
            if r != 6 {
                finder.set_cell(GridPos::new(5, r), false).expect("in bounds");
            }
        }
        finder.set_cell(GridPos::new(4, 6), false).expect("in bounds");
        finder.set_cell(GridPos::new(4, 7), false).expect("in bounds");
        finder.set_closest(true);
        let dest = GridPos::new(7, 0);
        let path = finder.solve(GridPos::new(0, 0), dest).expect("closest path");
        let end = path[0];
        let best = (0..8)
            .flat_map(|r| (0..5).map(move |c| GridPos::new(c, r)))
            .filter(|&pos| !finder.is_cell_filled(pos))
            .map(|pos| Heuristic::Manhattan.distance(pos, dest))
            .fold(f64::INFINITY, f64::min);
        assert_eq!(Heuristic::Manhattan.distance(end, dest), best);
        assert_eq!(end, GridPos::new(4, 0));
    }

    #[test]
    fn closest_tie_on_heuristic_goes_to_cheaper_node() {
        // (2,1) is reached first but through weight 9; (3,0) shares h = 2.
        #[rustfmt::skip]
        let weights = [
            1, 1, 1, 1, 0,
            1, 1, 9, 0, 1,
            1, 1, 0, 1, 0,
        ];
        let grid = Grid::from_weights(5, 3, &weights).expect("grid");
        let mut finder = PathFinding::from_grid(
            grid,
            &PathfindingConfig {
                diagonal: false,
                closest: true,
            },
        );
        let origin = GridPos::new(1, 1);
        let dest = GridPos::new(4, 1);
        let path = finder.solve(origin, dest).expect("closest path");
        assert_eq!(path[0], GridPos::new(3, 0));
        assert_eq!(path.len(), 3);
        assert!(!path.contains(&GridPos::new(2, 1)));
        assert_contiguous(&path, origin, false);

        let heavy = finder.grid().node_at(GridPos::new(2, 1)).expect("node");
        assert!(heavy.visited);
        assert_eq!(heavy.h, Heuristic::Manhattan.distance(GridPos::new(3, 0), dest));
    }

    #[test]
    fn closest_mode_returns_empty_path_when_boxed_in() {
        let mut finder = PathFinding::new(3, 3, &orthogonal());
        finder.set_closest(true);
        finder.set_cell(GridPos::new(1, 0), false).expect("in bounds");
        finder.set_cell(GridPos::new(0, 1), false).expect("in bounds");
        let path = finder
            .solve(GridPos::new(0, 0), GridPos::new(2, 2))
            .expect("closest path");
        assert!(path.is_empty());
    }

    #[test]
    fn same_origin_and_destination_is_empty_not_unreachable() {
        let mut finder = PathFinding::new(3, 3, &orthogonal());
        let pos = GridPos::new(1, 1);
        assert_eq!(finder.solve(pos, pos), Some(Vec::new()));
    }

    #[test]
    fn out_of_bounds_endpoints_are_unreachable() {
        let mut finder = PathFinding::new(3, 3, &orthogonal());
        assert_eq!(finder.solve(GridPos::new(0, 0), GridPos::new(3, 0)), None);
        assert_eq!(finder.solve(GridPos::new(9, 9), GridPos::new(0, 0)), None);
    }

    #[test]
    fn dynamic_cell_never_opens_a_static_wall() {
        let mut finder = PathFinding::new(3, 3, &orthogonal());
        let wall = GridPos::new(1, 1);
        finder.set_cell(wall, false).expect("in bounds");
        finder.set_dynamic_cell(wall, true).expect("in bounds");
        assert!(finder.is_cell_filled(wall));

        let floor = GridPos::new(2, 2);
        finder.set_dynamic_cell(floor, false).expect("in bounds");
        assert!(finder.is_cell_filled(floor));
        finder.set_dynamic_cell(floor, true).expect("in bounds");
        assert!(!finder.is_cell_filled(floor));
        assert!(finder.set_dynamic_cell(GridPos::new(5, 5), true).is_err());
    }

    #[test]
    fn repeated_solves_only_reset_dirty_nodes() {
        let mut finder = PathFinding::new(6, 6, &orthogonal());
        let first = finder
            .solve(GridPos::new(0, 0), GridPos::new(5, 5))
            .expect("first");
        assert!(finder.grid().dirty_count() > 0);
        finder.set_cell(GridPos::new(1, 0), false).expect("in bounds");
        let second = finder
            .solve(GridPos::new(0, 0), GridPos::new(5, 5))
            .expect("second");
        assert_eq!(first.len(), second.len());
        assert!(!second.contains(&GridPos::new(1, 0)));

        let untouched = finder.grid().node_at(GridPos::new(5, 0)).expect("node");
        let fresh = PathFinding::new(6, 6, &orthogonal());
        let clean = fresh.grid().node_at(GridPos::new(5, 0)).expect("node");
        if !untouched.visited {
            assert_eq!(untouched, clean);
        }
    }

    #[test]
    fn path_avoids_heavier_route_through_dynamic_block() {
        let mut finder = PathFinding::new(5, 3, &orthogonal());
        finder.set_dynamic_cell(GridPos::new(2, 1), false).expect("in bounds");
        let path = finder
            .solve(GridPos::new(0, 1), GridPos::new(4, 1))
            .expect("detour");
        assert!(!path.contains(&GridPos::new(2, 1)));
        assert_eq!(path.len(), 6);
    }

    #[test]
    fn adjacent_open_cells_of_single_tile() {
        let mut finder = PathFinding::new(4, 4, &orthogonal());
        finder.set_cell(GridPos::new(2, 1), false).expect("in bounds");
        let mut cells = finder.get_adjacent_open_cells(GridPos::new(1, 1), 1, 1);
        cells.sort();
        assert_eq!(
            cells,
            vec![GridPos::new(0, 1), GridPos::new(1, 0), GridPos::new(1, 2)]
        );
    }

    #[test]
    fn adjacent_open_cells_of_multi_tile_footprint() {
        let finder = PathFinding::new(5, 5, &orthogonal());
        let cells = finder.get_adjacent_open_cells(GridPos::new(1, 2), 2, 2);
        assert_eq!(cells.len(), 8);
        for footprint in [(1, 1), (2, 1), (1, 2), (2, 2)] {
            assert!(!cells.contains(&GridPos::new(footprint.0, footprint.1)));
        }
        assert!(cells.contains(&GridPos::new(0, 1)));
        assert!(cells.contains(&GridPos::new(3, 2)));
        assert!(cells.contains(&GridPos::new(1, 0)));
        assert!(cells.contains(&GridPos::new(2, 3)));

        let diag = PathFinding::new(5, 5, &diagonal());
        assert_eq!(diag.get_adjacent_open_cells(GridPos::new(1, 2), 2, 2).len(), 12);
    }

    #[test]
    fn adjacent_open_cells_clip_oversized_footprint_to_grid() {
        let finder = PathFinding::new(5, 5, &orthogonal());
        let mut cells = finder.get_adjacent_open_cells(GridPos::new(3, 3), u32::MAX, 1);
        cells.sort();
        assert_eq!(
            cells,
            vec![
                GridPos::new(2, 3),
                GridPos::new(3, 2),
                GridPos::new(3, 4),
                GridPos::new(4, 2),
                GridPos::new(4, 4),
            ]
        );

        let column = finder.get_adjacent_open_cells(GridPos::new(1, 4), 1, u32::MAX);
        assert_eq!(column.len(), 10);
        assert!(column.iter().all(|cell| cell.c != 1));
        assert!(finder
            .get_adjacent_open_cells(GridPos::new(u32::MAX, u32::MAX), u32::MAX, u32::MAX)
            .is_empty());
    }
}
