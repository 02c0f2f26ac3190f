use std::fmt;

use crate::geometry::{Direction, GridPos, Vec2};
use crate::nav::Path;

/// Normalisation noise tolerated before the threshold rounds up.
const REACH_THRESHOLD_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MovableId(pub u64);

impl fmt::Display for MovableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "movable#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Movable {
    pub id: MovableId,
    pub grid_pos: GridPos,
    pub position: Vec2,
    pub prev_position: Vec2,
    /// Pixels per frame.
    pub speed_magnitude: f32,
    pub speed_unit_vector: Vec2,
    pub speed_vector: Vec2,
    pub current_path: Path,
    /// Index into `current_path` of the step in progress; counts down to 0.
    pub current_path_step: Option<usize>,
    pub current_target: Option<Vec2>,
    pub current_target_tile: Option<GridPos>,
    pub current_reach_thresh: f32,
    pub final_destination: Option<GridPos>,
    pub direction: Direction,
    pub blocks_tile: bool,
}

impl Movable {
    pub fn new(id: MovableId, grid_pos: GridPos, position: Vec2, speed_magnitude: f32) -> Self {
        Self {
            id,
            grid_pos,
            position,
            prev_position: position,
            speed_magnitude,
            speed_unit_vector: Vec2::ZERO,
            speed_vector: Vec2::ZERO,
            current_path: Path::new(),
            current_path_step: None,
            current_target: None,
            current_target_tile: None,
            current_reach_thresh: 0.0,
            final_destination: None,
            direction: Direction::Idle,
            blocks_tile: true,
        }
    }

    pub fn with_blocks_tile(mut self, blocks_tile: bool) -> Self {
        self.blocks_tile = blocks_tile;
        self
    }

    /// Points the movable at `target` and derives the per-step speed vector
    /// and arrival threshold from the current speed magnitude.
    pub fn set_target(&mut self, target: Vec2, tile: GridPos) {
        self.speed_unit_vector = (target - self.position).normalized();
        self.speed_vector = self.speed_unit_vector.scaled(self.speed_magnitude);
        self.current_reach_thresh = (self.speed_vector.length() - REACH_THRESHOLD_EPSILON)
            .max(0.0)
            .ceil();
        self.current_target = Some(target);
        self.current_target_tile = Some(tile);
    }

    pub fn clear_target(&mut self) {
        self.current_target = None;
        self.current_target_tile = None;
    }

    pub fn is_moving(&self) -> bool {
        self.current_target.is_some()
    }

    pub fn has_path(&self) -> bool {
        self.current_path_step.is_some()
    }

    pub fn current_step_tile(&self) -> Option<GridPos> {
        self.current_path_step
            .and_then(|step| self.current_path.get(step))
            .copied()
    }

    pub(crate) fn clear_path(&mut self) {
        self.current_path.clear();
        self.current_path_step = None;
        self.final_destination = None;
    }
}
