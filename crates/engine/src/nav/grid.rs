use thiserror::Error;

use crate::geometry::GridPos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("weight count mismatch: expected {expected}, got {actual}")]
    WeightCountMismatch { expected: usize, actual: usize },
    #[error("cell {pos} is outside the {columns}x{rows} grid")]
    OutOfBounds {
        pos: GridPos,
        columns: u32,
        rows: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridNode {
    pub pos: GridPos,
    /// Effective traversal cost. `0` is impassable.
    pub weight: u32,
    pub static_weight: u32,
    pub g: f64,
    pub h: f64,
    pub f: f64,
    pub visited: bool,
    pub closed: bool,
    pub parent: Option<NodeId>,
}

impl GridNode {
    fn new(pos: GridPos, weight: u32) -> Self {
        Self {
            pos,
            weight,
            static_weight: weight,
            g: 0.0,
            h: 0.0,
            f: 0.0,
            visited: false,
            closed: false,
            parent: None,
        }
    }

    pub fn is_wall(&self) -> bool {
        self.weight == 0
    }

    /// Cost of entering this node from `from`; diagonal entries cost `weight * √2`.
    pub fn cost_from(&self, from: &GridNode) -> f64 {
        let weight = f64::from(self.weight);
        if from.pos.c != self.pos.c && from.pos.r != self.pos.r {
            weight * std::f64::consts::SQRT_2
        } else {
            weight
        }
    }

    fn clean(&mut self) {
        self.g = 0.0;
        self.h = 0.0;
        self.f = 0.0;
        self.visited = false;
        self.closed = false;
        self.parent = None;
    }
}

/// Row-major cell storage plus the dirty list of the previous search.
///
/// Invariant: a node whose id is not in `dirty` has clean scratch fields.
/// Every search writes scratch only through [`Grid::node_mut_dirty`], so
/// [`Grid::clean_dirty`] restores the invariant without scanning the grid.
#[derive(Debug, Clone)]
pub struct Grid {
    columns: u32,
    rows: u32,
    nodes: Vec<GridNode>,
    dirty: Vec<NodeId>,
}

impl Grid {
    pub fn new(columns: u32, rows: u32) -> Self {
        let mut nodes = Vec::with_capacity(columns as usize * rows as usize);
        for r in 0..rows {
            for c in 0..columns {
                nodes.push(GridNode::new(GridPos { c, r }, 1));
            }
        }
        Self {
            columns,
            rows,
            nodes,
            dirty: Vec::new(),
        }
    }

    pub fn from_weights(columns: u32, rows: u32, weights: &[u8]) -> Result<Self, GridError> {
        let expected = columns as usize * rows as usize;
        if weights.len() != expected {
            return Err(GridError::WeightCountMismatch {
                expected,
                actual: weights.len(),
            });
        }
        let mut grid = Self::new(columns, rows);
        for (node, &weight) in grid.nodes.iter_mut().zip(weights) {
            node.weight = u32::from(weight);
            node.static_weight = u32::from(weight);
        }
        Ok(grid)
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        pos.c < self.columns && pos.r < self.rows
    }

    pub fn id_of(&self, pos: GridPos) -> Option<NodeId> {
        if !self.contains(pos) {
            return None;
        }
        Some(NodeId(
            pos.r as usize * self.columns as usize + pos.c as usize,
        ))
    }

    pub fn checked_id(&self, pos: GridPos) -> Result<NodeId, GridError> {
        self.id_of(pos).ok_or(GridError::OutOfBounds {
            pos,
            columns: self.columns,
            rows: self.rows,
        })
    }

    pub fn node(&self, id: NodeId) -> &GridNode {
        &self.nodes[id.0]
    }

    pub fn node_at(&self, pos: GridPos) -> Option<&GridNode> {
        self.id_of(pos).map(|id| &self.nodes[id.0])
    }

    /// Weight writes only; scratch writes go through [`Grid::node_mut_dirty`].
    pub(crate) fn node_at_mut(&mut self, pos: GridPos) -> Result<&mut GridNode, GridError> {
        let id = self.checked_id(pos)?;
        Ok(&mut self.nodes[id.0])
    }

    /// Mutable access for search scratch writes.
    ///
    /// A node is listed the first time it is touched; searches set `visited`
    /// on every node they touch, so visited nodes are already listed.
    pub(crate) fn node_mut_dirty(&mut self, id: NodeId) -> &mut GridNode {
        if !self.nodes[id.0].visited {
            self.dirty.push(id);
        }
        &mut self.nodes[id.0]
    }

    pub fn init(&mut self) {
        for node in &mut self.nodes {
            node.clean();
        }
        self.dirty.clear();
    }

    pub fn clean_dirty(&mut self) {
        for id in self.dirty.drain(..) {
            self.nodes[id.0].clean();
        }
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// Nodes touched by the last search, in the order they were first reached.
    pub(crate) fn touched(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.dirty.iter().copied()
    }

    /// Orthogonal neighbours come first (west, east, south, north), then the
    /// four diagonals when `diagonal` is set.
    pub fn neighbors_into(&self, id: NodeId, diagonal: bool, out: &mut Vec<NodeId>) {
        let pos = self.nodes[id.0].pos;
        let c = i64::from(pos.c);
        let r = i64::from(pos.r);
        let orthogonal = [(c - 1, r), (c + 1, r), (c, r - 1), (c, r + 1)];
        let diagonals = [
            (c - 1, r - 1),
            (c + 1, r - 1),
            (c - 1, r + 1),
            (c + 1, r + 1),
        ];
        let candidates = orthogonal
            .iter()
            .chain(diagonals.iter().filter(|_| diagonal));
        for &(nc, nr) in candidates {
            if nc < 0 || nr < 0 || nc >= i64::from(self.columns) || nr >= i64::from(self.rows) {
                continue;
            }
            out.push(NodeId(nr as usize * self.columns as usize + nc as usize));
        }
    }
}
