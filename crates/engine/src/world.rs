use std::collections::HashMap;

use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, EngineConfig};
use crate::geometry::{GridPos, IsometricLayout, TileGeometry};
use crate::motion::{
    MotionError, Movable, MovableId, MoveEngine, PropertyBag, TickReport, TweenId, TweenRequest,
    TweenTargetId,
};
use crate::nav::{Grid, GridError, Path, PathFinding};
use crate::transit::{MoveOutcome, MovementCoordinator, Occupancy, TransitError, TransitEvent};

#[derive(Debug, Error)]
pub enum WorldError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Grid(#[from] GridError),
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SpawnError {
    #[error("speed {speed} must be a positive finite number")]
    InvalidSpeed { speed: f32 },
    #[error(transparent)]
    OutOfBounds(#[from] GridError),
    #[error("tile {tile} is not passable")]
    TileBlocked { tile: GridPos },
    #[error(transparent)]
    Motion(#[from] MotionError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovableSpec {
    pub tile: GridPos,
    /// Pixels per frame; the configured default when `None`.
    pub speed: Option<f32>,
    pub blocks_tile: bool,
}

impl MovableSpec {
    pub fn at(tile: GridPos) -> Self {
        Self {
            tile,
            speed: None,
            blocks_tile: true,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn non_blocking(mut self) -> Self {
        self.blocks_tile = false;
        self
    }
}

/// One grid with its movables, tweens and tween targets, driven one frame
/// per [`IsoWorld::run`].
#[derive(Debug)]
pub struct IsoWorld {
    config: EngineConfig,
    engine: MoveEngine,
    coordinator: MovementCoordinator,
    tween_targets: HashMap<TweenTargetId, PropertyBag>,
    next_movable_id: u64,
}

impl IsoWorld {
    pub fn new(
        config: EngineConfig,
        columns: u32,
        rows: u32,
        geometry: Box<dyn TileGeometry>,
    ) -> Result<Self, WorldError> {
        Self::with_grid(config, Grid::new(columns, rows), geometry)
    }

    /// `weights` is row-major; `0` marks a wall.
    pub fn from_weights(
        config: EngineConfig,
        columns: u32,
        rows: u32,
        weights: &[u8],
        geometry: Box<dyn TileGeometry>,
    ) -> Result<Self, WorldError> {
        Self::with_grid(config, Grid::from_weights(columns, rows, weights)?, geometry)
    }

    pub fn isometric(config: EngineConfig, columns: u32, rows: u32) -> Result<Self, WorldError> {
        let layout = IsometricLayout::new(config.transit.tile_width, config.transit.tile_height);
        Self::new(config, columns, rows, Box::new(layout))
    }

    fn with_grid(
        config: EngineConfig,
        grid: Grid,
        geometry: Box<dyn TileGeometry>,
    ) -> Result<Self, WorldError> {
        config.validate()?;
        let (columns, rows) = (grid.columns(), grid.rows());
        let pathfinding = PathFinding::from_grid(grid, &config.pathfinding);
        let coordinator = MovementCoordinator::new(pathfinding, geometry, config.transit);
        info!(
            columns,
            rows,
            diagonal = config.pathfinding.diagonal,
            closest = config.pathfinding.closest,
            tick_rate = config.motion.tick_rate,
            "world_built"
        );
        Ok(Self {
            config,
            engine: MoveEngine::new(&config.motion),
            coordinator,
            tween_targets: HashMap::new(),
            next_movable_id: 1,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn engine(&self) -> &MoveEngine {
        &self.engine
    }

    pub fn pathfinding(&self) -> &PathFinding {
        self.coordinator.pathfinding()
    }

    pub fn occupancy(&self) -> &Occupancy {
        self.coordinator.occupancy()
    }

    pub fn geometry(&self) -> &dyn TileGeometry {
        self.coordinator.geometry()
    }

    pub fn solve(&mut self, origin: GridPos, dest: GridPos) -> Option<Path> {
        self.coordinator.pathfinding_mut().solve(origin, dest)
    }

    pub fn set_cell(&mut self, pos: GridPos, movable: bool) -> Result<(), GridError> {
        self.coordinator.pathfinding_mut().set_cell(pos, movable)
    }

    pub fn set_dynamic_cell(&mut self, pos: GridPos, movable: bool) -> Result<(), GridError> {
        self.coordinator.pathfinding_mut().set_dynamic_cell(pos, movable)
    }

    pub fn is_cell_filled(&self, pos: GridPos) -> bool {
        self.coordinator.pathfinding().is_cell_filled(pos)
    }

    pub fn movable(&self, id: MovableId) -> Option<&Movable> {
        self.engine.movable(id)
    }

    pub fn spawn_movable(&mut self, spec: MovableSpec) -> Result<MovableId, SpawnError> {
        let speed = spec.speed.unwrap_or(self.config.motion.default_speed);
        if !speed.is_finite() || speed <= 0.0 {
            return Err(SpawnError::InvalidSpeed { speed });
        }
        self.pathfinding().grid().checked_id(spec.tile)?;
        if self.is_cell_filled(spec.tile) {
            return Err(SpawnError::TileBlocked { tile: spec.tile });
        }

        let id = MovableId(self.next_movable_id);
        let position = self.geometry().tile_center(spec.tile);
        let movable = Movable::new(id, spec.tile, position, speed).with_blocks_tile(spec.blocks_tile);
        self.engine.insert_movable(movable)?;
        if let Some(movable) = self.engine.movable(id) {
            self.coordinator.place(movable);
        }
        self.next_movable_id += 1;
        info!(movable = id.0, c = spec.tile.c, r = spec.tile.r, speed, "movable_spawned");
        Ok(id)
    }

    pub fn despawn_movable(&mut self, id: MovableId) -> bool {
        self.coordinator.despawn(&mut self.engine, id).is_some()
    }

    pub fn move_to(&mut self, id: MovableId, dest: GridPos) -> Result<MoveOutcome, TransitError> {
        self.coordinator.move_to(&mut self.engine, id, dest)
    }

    pub fn move_through(
        &mut self,
        id: MovableId,
        path: Path,
        speed: Option<f32>,
    ) -> Result<MoveOutcome, TransitError> {
        self.coordinator.move_through(&mut self.engine, id, path, speed)
    }

    pub fn move_adjacent_to(
        &mut self,
        id: MovableId,
        anchor: GridPos,
        size_c: u32,
        size_r: u32,
    ) -> Result<MoveOutcome, TransitError> {
        self.coordinator
            .move_adjacent_to(&mut self.engine, id, anchor, size_c, size_r)
    }

    pub fn stop(&mut self, id: MovableId) -> Result<(), TransitError> {
        self.coordinator.stop(&mut self.engine, id)
    }

    pub fn relocate(&mut self, id: MovableId, dest: GridPos) -> Result<(), TransitError> {
        self.coordinator.relocate(&mut self.engine, id, dest)
    }

    pub fn set_followed(&mut self, followed: Option<MovableId>) {
        self.coordinator.set_followed(followed);
    }

    pub fn run(&mut self) -> TickReport {
        self.engine.run(&mut self.coordinator, &mut self.tween_targets)
    }

    pub fn drain_events(&mut self) -> Vec<TransitEvent> {
        self.coordinator.drain_events()
    }

    pub fn is_active(&self) -> bool {
        self.engine.is_active()
    }

    pub fn insert_tween_target(&mut self, id: TweenTargetId, target: PropertyBag) -> Option<PropertyBag> {
        self.tween_targets.insert(id, target)
    }

    /// Drops the target along with any tweens still running on it.
    pub fn remove_tween_target(&mut self, id: TweenTargetId) -> Option<PropertyBag> {
        self.engine.kill_tweens_of(id);
        self.tween_targets.remove(&id)
    }

    pub fn tween_target(&self, id: TweenTargetId) -> Option<&PropertyBag> {
        self.tween_targets.get(&id)
    }

    pub fn add_tween(
        &mut self,
        target: TweenTargetId,
        request: TweenRequest,
    ) -> Result<TweenId, MotionError> {
        let current = self
            .tween_targets
            .get(&target)
            .ok_or(MotionError::MissingTweenTarget(target))?;
        Ok(self.engine.add_tween(target, current, request))
    }

    pub fn remove_tween(&mut self, target: TweenTargetId, tween: TweenId) -> Result<(), MotionError> {
        self.engine.remove_tween(target, tween)
    }

    pub fn kill_tweens_of(&mut self, target: TweenTargetId) -> usize {
        self.engine.kill_tweens_of(target)
    }
}
