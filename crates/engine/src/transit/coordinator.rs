use thiserror::Error;
use tracing::{debug, info, warn};

use super::events::{ReplanReason, TransitEvent, TransitEventBus};
use super::occupancy::Occupancy;
use crate::config::TransitConfig;
use crate::geometry::{Direction, GridPos, TileGeometry};
use crate::motion::{MotionError, MotionHooks, Movable, MovableId, MoveEngine};
use crate::nav::{GridError, Path, PathFinding};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitError {
    #[error("{0} is unknown")]
    UnknownMovable(MovableId),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Motion(#[from] MotionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Started { steps: usize },
    AlreadyThere,
    AlreadyAdjacent,
    Relocated,
    Unreachable,
}

/// `begin_step` hands the engine a pixel target; the engine calls back through
/// [`MotionHooks`] until arrival; arrival either begins the next step, re-plans
/// first (per-tile revalidation), or finishes the path. A step whose cell is
/// filled when it begins is abandoned and the path re-solved toward the same
/// final destination.
pub struct MovementCoordinator {
    pathfinding: PathFinding,
    geometry: Box<dyn TileGeometry>,
    occupancy: Occupancy,
    events: TransitEventBus,
    config: TransitConfig,
    followed: Option<MovableId>,
}

impl std::fmt::Debug for MovementCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MovementCoordinator")
            .field("pathfinding", &self.pathfinding)
            .field("occupancy", &self.occupancy)
            .field("events", &self.events)
            .field("config", &self.config)
            .field("followed", &self.followed)
            .finish_non_exhaustive()
    }
}

impl MovementCoordinator {
    pub fn new(
        pathfinding: PathFinding,
        geometry: Box<dyn TileGeometry>,
        config: TransitConfig,
    ) -> Self {
        Self {
            pathfinding,
            geometry,
            occupancy: Occupancy::default(),
            events: TransitEventBus::default(),
            config,
            followed: None,
        }
    }

    pub fn pathfinding(&self) -> &PathFinding {
        &self.pathfinding
    }

    pub fn pathfinding_mut(&mut self) -> &mut PathFinding {
        &mut self.pathfinding
    }

    pub fn geometry(&self) -> &dyn TileGeometry {
        self.geometry.as_ref()
    }

    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    pub fn events(&self) -> &TransitEventBus {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<TransitEvent> {
        self.events.drain()
    }

    pub fn config(&self) -> &TransitConfig {
        &self.config
    }

    pub fn followed(&self) -> Option<MovableId> {
        self.followed
    }

    pub fn set_followed(&mut self, followed: Option<MovableId>) {
        self.followed = followed;
    }

    pub fn place(&mut self, movable: &Movable) {
        self.occupancy.enter(
            &mut self.pathfinding,
            movable.id,
            movable.grid_pos,
            movable.blocks_tile,
        );
    }

    pub fn despawn(&mut self, engine: &mut MoveEngine, id: MovableId) -> Option<Movable> {
        let movable = engine.take_movable(id)?;
        self.occupancy.leave(&mut self.pathfinding, id, movable.grid_pos);
        if self.followed == Some(id) {
            self.followed = None;
        }
        Some(movable)
    }

    pub fn move_to(
        &mut self,
        engine: &mut MoveEngine,
        id: MovableId,
        dest: GridPos,
    ) -> Result<MoveOutcome, TransitError> {
        let origin = engine
            .movable(id)
            .ok_or(TransitError::UnknownMovable(id))?
            .grid_pos;
        self.pathfinding.grid().checked_id(dest)?;

        match self.pathfinding.solve(origin, dest) {
            Some(path) => self.follow_path(engine, id, path, None, Some(dest)),
            None => {
                debug!(movable = id.0, origin = %origin, dest = %dest, "move_unreachable");
                self.events.emit(TransitEvent::DestinationUnreachable {
                    movable: id,
                    from: origin,
                    destination: dest,
                });
                Ok(MoveOutcome::Unreachable)
            }
        }
    }

    pub fn move_through(
        &mut self,
        engine: &mut MoveEngine,
        id: MovableId,
        path: Path,
        speed: Option<f32>,
    ) -> Result<MoveOutcome, TransitError> {
        self.follow_path(engine, id, path, speed, None)
    }

    /// `goal` replaces `path[0]` as the target of later re-plans; in closest
    /// mode the two differ.
    fn follow_path(
        &mut self,
        engine: &mut MoveEngine,
        id: MovableId,
        path: Path,
        speed: Option<f32>,
        goal: Option<GridPos>,
    ) -> Result<MoveOutcome, TransitError> {
        if engine.movable(id).is_none() {
            return Err(TransitError::UnknownMovable(id));
        }
        self.cancel_step(engine, id);

        let Some(&dest) = path.first() else {
            self.return_to_tile_center(engine, id)?;
            return Ok(MoveOutcome::AlreadyThere);
        };
        if self.config.instant_relocation {
            self.relocate(engine, id, dest)?;
            return Ok(MoveOutcome::Relocated);
        }

        let steps = path.len();
        engine.prepare_for_move(id, path, speed)?;
        if let Some(movable) = engine.movable_mut(id) {
            movable.final_destination = goal.or(Some(dest));
        }
        debug!(movable = id.0, dest = %dest, steps, "move_started");
        self.begin_step(engine, id);
        Ok(MoveOutcome::Started { steps })
    }

    /// Walks to the nearest reachable open cell around a `size_c` x `size_r`
    /// footprint anchored at `anchor`. Already touching the footprint counts
    /// as a zero-distance relocation.
    pub fn move_adjacent_to(
        &mut self,
        engine: &mut MoveEngine,
        id: MovableId,
        anchor: GridPos,
        size_c: u32,
        size_r: u32,
    ) -> Result<MoveOutcome, TransitError> {
        let origin = engine
            .movable(id)
            .ok_or(TransitError::UnknownMovable(id))?
            .grid_pos;
        self.pathfinding.grid().checked_id(anchor)?;

        if self.touches_footprint(origin, anchor, size_c, size_r) {
            self.relocate(engine, id, origin)?;
            return Ok(MoveOutcome::AlreadyAdjacent);
        }

        let mut best: Option<Path> = None;
        for cell in self.pathfinding.get_adjacent_open_cells(anchor, size_c, size_r) {
            let Some(path) = self.pathfinding.solve(origin, cell) else {
                continue;
            };
            if path.first() != Some(&cell) {
                continue;
            }
            if best.as_ref().map_or(true, |current| path.len() < current.len()) {
                best = Some(path);
            }
        }

        match best {
            Some(path) => self.move_through(engine, id, path, None),
            None => {
                self.events.emit(TransitEvent::DestinationUnreachable {
                    movable: id,
                    from: origin,
                    destination: anchor,
                });
                Ok(MoveOutcome::Unreachable)
            }
        }
    }

    pub fn stop(&mut self, engine: &mut MoveEngine, id: MovableId) -> Result<(), TransitError> {
        if engine.movable(id).is_none() {
            return Err(TransitError::UnknownMovable(id));
        }
        self.cancel_step(engine, id);
        self.set_direction(engine, id, Direction::Idle);
        Ok(())
    }

    pub fn relocate(
        &mut self,
        engine: &mut MoveEngine,
        id: MovableId,
        dest: GridPos,
    ) -> Result<(), TransitError> {
        self.pathfinding.grid().checked_id(dest)?;
        self.cancel_step(engine, id);
        let center = self.geometry.tile_center(dest);
        let movable = engine
            .movable_mut(id)
            .ok_or(TransitError::UnknownMovable(id))?;
        let from = movable.grid_pos;
        movable.position = center;
        movable.prev_position = center;
        movable.grid_pos = dest;
        let blocks_tile = movable.blocks_tile;

        if from != dest {
            self.occupancy
                .relocate(&mut self.pathfinding, id, from, dest, blocks_tile);
            self.events.emit(TransitEvent::Relocated {
                movable: id,
                from,
                to: dest,
            });
        }
        self.finish_path(engine, id);
        Ok(())
    }

    fn cancel_step(&mut self, engine: &mut MoveEngine, id: MovableId) {
        engine.remove_movable(id);
        if let Some(movable) = engine.movable_mut(id) {
            movable.clear_target();
            movable.clear_path();
        }
    }

    /// After a cancelled step the movable may sit between tiles; walk it back
    /// onto the centre of the tile it is recorded on.
    fn return_to_tile_center(
        &mut self,
        engine: &mut MoveEngine,
        id: MovableId,
    ) -> Result<(), TransitError> {
        let Some(movable) = engine.movable(id) else {
            return Err(TransitError::UnknownMovable(id));
        };
        let tile = movable.grid_pos;
        if movable.position == self.geometry.tile_center(tile) {
            self.finish_path(engine, id);
            return Ok(());
        }
        engine.prepare_for_move(id, vec![tile], None)?;
        self.begin_step(engine, id);
        Ok(())
    }

    fn begin_step(&mut self, engine: &mut MoveEngine, id: MovableId) {
        let Some(movable) = engine.movable(id) else {
            return;
        };
        let Some(next) = movable.current_step_tile() else {
            self.finish_path(engine, id);
            return;
        };
        let current = movable.grid_pos;

        let direction = Direction::between(current, next);
        if direction != Direction::Idle {
            self.set_direction(engine, id, direction);
        }

        let others: Vec<MovableId> = self
            .occupancy
            .objects_at(next)
            .into_iter()
            .filter(|other| *other != id)
            .collect();
        if !others.is_empty() {
            self.events.emit(TransitEvent::OtherObjectsOnNextTile {
                movable: id,
                tile: next,
                others,
            });
        }

        if self.is_blocked_for(id, next) {
            debug!(movable = id.0, c = next.c, r = next.r, "step_blocked");
            self.events.emit(TransitEvent::StepBlocked {
                movable: id,
                tile: next,
            });
            engine.remove_movable(id);
            if let Some(movable) = engine.movable_mut(id) {
                movable.clear_target();
            }
            self.replan(engine, id, ReplanReason::Blocked);
            return;
        }

        let target = self.geometry.tile_center(next);
        if let Some(movable) = engine.movable_mut(id) {
            movable.set_target(target, next);
        }
        if let Err(error) = engine.add_movable(id) {
            warn!(movable = id.0, error = %error, "step_register_failed");
        }
    }

    /// Re-solves from the current tile toward the final destination. Paths
    /// never contain filled cells, so the step begun here cannot be blocked
    /// and the recursion through `begin_step` ends.
    fn replan(&mut self, engine: &mut MoveEngine, id: MovableId, reason: ReplanReason) {
        let Some(movable) = engine.movable(id) else {
            return;
        };
        let origin = movable.grid_pos;
        let Some(destination) = movable.final_destination else {
            self.finish_path(engine, id);
            return;
        };
        let remaining: Path = movable
            .current_path_step
            .and_then(|step| movable.current_path.get(..=step))
            .map(<[GridPos]>::to_vec)
            .unwrap_or_default();

        match self.pathfinding.solve(origin, destination) {
            None => {
                warn!(
                    movable = id.0,
                    origin = %origin,
                    destination = %destination,
                    reason = ?reason,
                    "replan_failed"
                );
                if let Some(movable) = engine.movable_mut(id) {
                    movable.clear_target();
                    movable.clear_path();
                }
                self.set_direction(engine, id, Direction::Idle);
                self.events.emit(TransitEvent::DestinationUnreachable {
                    movable: id,
                    from: origin,
                    destination,
                });
            }
            Some(path) if path.is_empty() => self.finish_path(engine, id),
            Some(path) => {
                let steps = path.len();
                if reason == ReplanReason::Blocked || path != remaining {
                    self.events.emit(TransitEvent::Replanned {
                        movable: id,
                        reason,
                        steps,
                    });
                }
                if let Err(error) = engine.prepare_for_move(id, path, None) {
                    warn!(movable = id.0, error = %error, "replan_prepare_failed");
                    return;
                }
                if let Some(movable) = engine.movable_mut(id) {
                    movable.final_destination = Some(destination);
                }
                self.begin_step(engine, id);
            }
        }
    }

    fn finish_path(&mut self, engine: &mut MoveEngine, id: MovableId) {
        engine.remove_movable(id);
        let Some(movable) = engine.movable_mut(id) else {
            return;
        };
        movable.clear_target();
        movable.clear_path();
        let tile = movable.grid_pos;
        self.set_direction(engine, id, Direction::Idle);
        self.events
            .emit(TransitEvent::DestinationReached { movable: id, tile });
        info!(movable = id.0, c = tile.c, r = tile.r, "path_complete");
    }

    fn set_direction(&mut self, engine: &mut MoveEngine, id: MovableId, direction: Direction) {
        let Some(movable) = engine.movable_mut(id) else {
            return;
        };
        if movable.direction == direction {
            return;
        }
        let from = movable.direction;
        movable.direction = direction;
        self.events.emit(TransitEvent::DirectionChanged {
            movable: id,
            from,
            to: direction,
        });
    }

    fn check_for_tile_change(&mut self, engine: &mut MoveEngine, id: MovableId) {
        let Some(movable) = engine.movable_mut(id) else {
            return;
        };
        let Some(tile) = movable.current_target_tile else {
            return;
        };
        let from = movable.grid_pos;
        if tile == from || !self.geometry.tile_contains(tile, movable.position) {
            return;
        }
        movable.grid_pos = tile;
        self.occupancy
            .relocate(&mut self.pathfinding, id, from, tile, movable.blocks_tile);
        debug!(movable = id.0, from = %from, to = %tile, "tile_changed");
        self.events.emit(TransitEvent::TileChanged {
            movable: id,
            from,
            to: tile,
        });
    }

    /// A cell is blocked when it is filled, unless the only thing filling it is
    /// the movable itself.
    fn is_blocked_for(&self, id: MovableId, pos: GridPos) -> bool {
        if !self.pathfinding.is_cell_filled(pos) {
            return false;
        }
        let Some(node) = self.pathfinding.grid().node_at(pos) else {
            return true;
        };
        if node.static_weight == 0 {
            return true;
        }
        !(self.occupancy.objects_at(pos).contains(&id)
            && !self.occupancy.is_blocked_for_other(pos, id))
    }

    fn touches_footprint(&self, pos: GridPos, anchor: GridPos, size_c: u32, size_r: u32) -> bool {
        let first_row = anchor.r.saturating_sub(size_r.max(1) - 1);
        let last_column = anchor.c.saturating_add(size_c.max(1) - 1);
        let dc = gap(pos.c, anchor.c, last_column);
        let dr = gap(pos.r, first_row, anchor.r);
        if self.pathfinding.is_diagonal() {
            dc.max(dr) == 1
        } else {
            dc + dr == 1
        }
    }
}

fn gap(value: u32, low: u32, high: u32) -> u32 {
    if value < low {
        low - value
    } else if value > high {
        value - high
    } else {
        0
    }
}

impl MotionHooks for MovementCoordinator {
    fn on_step_end(&mut self, engine: &mut MoveEngine, id: MovableId) {
        self.check_for_tile_change(engine, id);
        engine.remove_movable(id);
        let Some(movable) = engine.movable_mut(id) else {
            return;
        };
        movable.clear_target();
        let step = movable.current_path_step;
        match step {
            None | Some(0) => self.finish_path(engine, id),
            Some(step) => {
                movable.current_path_step = Some(step - 1);
                if self.config.check_path_by_each_tile {
                    self.replan(engine, id, ReplanReason::Revalidate);
                } else {
                    self.begin_step(engine, id);
                }
            }
        }
    }

    fn on_advanced(&mut self, engine: &mut MoveEngine, id: MovableId) {
        self.check_for_tile_change(engine, id);
        if self.followed == Some(id) {
            if let Some(movable) = engine.movable(id) {
                self.events.emit(TransitEvent::CameraFollow {
                    movable: id,
                    position: movable.position,
                });
            }
        }
    }
}
