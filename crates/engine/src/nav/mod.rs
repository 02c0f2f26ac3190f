mod grid;
mod heap;
mod search;

pub use grid::{Grid, GridError, GridNode, NodeId};
pub use heap::BinaryHeap;
pub use search::{Heuristic, Path, PathFinding};
