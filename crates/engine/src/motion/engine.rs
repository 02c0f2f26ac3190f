use std::collections::{BTreeMap, HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, warn};

use super::easing::Easing;
use super::movable::{Movable, MovableId};
use super::tween::{Tween, TweenEntry, TweenId, TweenRequest, TweenTarget, TweenTargetId, TweenTargets};
use crate::config::MotionConfig;
use crate::geometry::Vec2;
use crate::nav::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MotionError {
    #[error("{0} has no registered tweens")]
    TweenTargetNotRegistered(TweenTargetId),
    #[error("{tween} is not registered on {target}")]
    TweenNotRegistered {
        target: TweenTargetId,
        tween: TweenId,
    },
    #[error("{0} is not in the tween target store")]
    MissingTweenTarget(TweenTargetId),
    #[error("{0} is unknown")]
    UnknownMovable(MovableId),
    #[error("{0} already exists")]
    DuplicateMovable(MovableId),
}

/// Coordinator callbacks invoked synchronously from [`MoveEngine::run`].
///
/// Hooks receive the engine itself and may add or remove movables; the tick
/// keeps processing the remaining entries of its snapshot.
pub trait MotionHooks {
    fn on_step_end(&mut self, _engine: &mut MoveEngine, _id: MovableId) {}

    fn on_advanced(&mut self, _engine: &mut MoveEngine, _id: MovableId) {}
}

impl MotionHooks for () {}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub frame: u64,
    pub movables_advanced: usize,
    pub movables_arrived: usize,
    pub tweens_completed: Vec<(TweenTargetId, TweenId)>,
}

/// Frame driver for movables and tweens.
///
/// `movables` is the arena of every known movable; `active` is the registry
/// the tick walks, in registration order, and `registered` holds the same ids
/// for membership checks. Tween registries are keyed per target, with `tween_order`
/// keeping targets in registration order.
#[derive(Debug)]
pub struct MoveEngine {
    tick_rate: u32,
    default_easing: Easing,
    movables: BTreeMap<MovableId, Movable>,
    active: Vec<MovableId>,
    registered: HashSet<MovableId>,
    tweens: HashMap<TweenTargetId, Vec<Tween>>,
    tween_order: Vec<TweenTargetId>,
    next_tween_id: u64,
    frame: u64,
    movable_snapshot: Vec<MovableId>,
    target_snapshot: Vec<TweenTargetId>,
}

impl Default for MoveEngine {
    fn default() -> Self {
        Self::new(&MotionConfig::default())
    }
}

impl MoveEngine {
    pub fn new(config: &MotionConfig) -> Self {
        Self {
            tick_rate: config.tick_rate.max(1),
            default_easing: config.default_easing,
            movables: BTreeMap::new(),
            active: Vec::new(),
            registered: HashSet::new(),
            tweens: HashMap::new(),
            tween_order: Vec::new(),
            next_tween_id: 0,
            frame: 0,
            movable_snapshot: Vec::new(),
            target_snapshot: Vec::new(),
        }
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn frames_for(&self, seconds: f32) -> u32 {
        if !seconds.is_finite() || seconds <= 0.0 {
            return 0;
        }
        (seconds * self.tick_rate as f32).round() as u32
    }

    pub fn is_active(&self) -> bool {
        !self.active.is_empty() || !self.tween_order.is_empty()
    }

    pub fn insert_movable(&mut self, movable: Movable) -> Result<(), MotionError> {
        if self.movables.contains_key(&movable.id) {
            return Err(MotionError::DuplicateMovable(movable.id));
        }
        self.movables.insert(movable.id, movable);
        Ok(())
    }

    pub fn take_movable(&mut self, id: MovableId) -> Option<Movable> {
        if self.registered.remove(&id) {
            self.active.retain(|active| *active != id);
        }
        self.movables.remove(&id)
    }

    pub fn movable(&self, id: MovableId) -> Option<&Movable> {
        self.movables.get(&id)
    }

    pub fn movable_mut(&mut self, id: MovableId) -> Option<&mut Movable> {
        self.movables.get_mut(&id)
    }

    pub fn movables(&self) -> impl Iterator<Item = &Movable> {
        self.movables.values()
    }

    pub fn movable_count(&self) -> usize {
        self.movables.len()
    }

    pub fn add_movable(&mut self, id: MovableId) -> Result<(), MotionError> {
        if !self.movables.contains_key(&id) {
            return Err(MotionError::UnknownMovable(id));
        }
        if self.registered.insert(id) {
            self.active.push(id);
        }
        Ok(())
    }

    /// Deregisters the movable and zeroes its speed vector. Returns `false`
    /// when it was not registered.
    pub fn remove_movable(&mut self, id: MovableId) -> bool {
        if !self.registered.remove(&id) {
            return false;
        }
        self.active.retain(|active| *active != id);
        if let Some(movable) = self.movables.get_mut(&id) {
            movable.speed_vector = Vec2::ZERO;
        }
        true
    }

    pub fn remove_all_movables(&mut self) {
        self.registered.clear();
        for id in std::mem::take(&mut self.active) {
            if let Some(movable) = self.movables.get_mut(&id) {
                movable.speed_vector = Vec2::ZERO;
            }
        }
    }

    pub fn is_registered(&self, id: MovableId) -> bool {
        self.registered.contains(&id)
    }

    pub fn registered_movables(&self) -> &[MovableId] {
        &self.active
    }

    pub fn prepare_for_move(
        &mut self,
        id: MovableId,
        path: Path,
        speed: Option<f32>,
    ) -> Result<(), MotionError> {
        let movable = self
            .movables
            .get_mut(&id)
            .ok_or(MotionError::UnknownMovable(id))?;
        if let Some(speed) = speed.filter(|speed| speed.is_finite() && *speed > 0.0) {
            movable.speed_magnitude = speed;
        }
        movable.current_path_step = path.len().checked_sub(1);
        movable.final_destination = path.first().copied();
        movable.current_path = path;
        Ok(())
    }

    /// Schedules an interpolation of `target`'s properties toward the
    /// requested values. `current` supplies the begin values; properties that
    /// already hold their final value, or that the target lacks, are skipped.
    /// When nothing is left to animate the id is still issued but no tween is
    /// registered and `on_complete` is dropped uncalled.
    pub fn add_tween(
        &mut self,
        target: TweenTargetId,
        current: &dyn TweenTarget,
        request: TweenRequest,
    ) -> TweenId {
        if request.overwrite {
            self.kill_tweens_of(target);
        }

        let mut entries = Vec::with_capacity(request.props.len());
        for (property, end) in request.props {
            let Some(begin) = current.property(&property) else {
                warn!(target = %target, property = %property, "tween_property_missing");
                continue;
            };
            if begin != end {
                entries.push(TweenEntry {
                    property,
                    begin,
                    delta: end - begin,
                });
            }
        }

        let id = TweenId(self.next_tween_id);
        self.next_tween_id = self.next_tween_id.saturating_add(1);
        if entries.is_empty() {
            debug!(target = %target, tween = %id, "tween_skipped_no_change");
            return id;
        }
        let tween = Tween {
            id,
            entries,
            total_frames: self.frames_for(request.duration_seconds),
            elapsed_frames: 0,
            delay_frames: self.frames_for(request.delay_seconds),
            easing: request.easing.unwrap_or(self.default_easing),
            overwrite: request.overwrite,
            on_complete: request.on_complete,
        };
        debug!(
            target = %target,
            tween = %id,
            total_frames = tween.total_frames,
            properties = tween.entries.len(),
            "tween_added"
        );
        if !self.tweens.contains_key(&target) {
            self.tween_order.push(target);
        }
        self.tweens.entry(target).or_default().push(tween);
        id
    }

    pub fn remove_tween(&mut self, target: TweenTargetId, tween: TweenId) -> Result<(), MotionError> {
        let Some(list) = self.tweens.get_mut(&target) else {
            warn!(target = %target, tween = %tween, "remove_tween_unknown_target");
            return Err(MotionError::TweenTargetNotRegistered(target));
        };
        let Some(index) = list.iter().position(|entry| entry.id == tween) else {
            warn!(target = %target, tween = %tween, "remove_tween_unknown_tween");
            return Err(MotionError::TweenNotRegistered { target, tween });
        };
        list.remove(index);
        if list.is_empty() {
            self.deregister_tween_target(target);
        }
        Ok(())
    }

    pub fn kill_tweens_of(&mut self, target: TweenTargetId) -> usize {
        match self.tweens.remove(&target) {
            Some(list) => {
                self.tween_order.retain(|id| *id != target);
                list.len()
            }
            None => 0,
        }
    }

    pub fn tweens_of(&self, target: TweenTargetId) -> &[Tween] {
        self.tweens.get(&target).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn tween_target_count(&self) -> usize {
        self.tween_order.len()
    }

    fn deregister_tween_target(&mut self, target: TweenTargetId) {
        self.tweens.remove(&target);
        self.tween_order.retain(|id| *id != target);
    }

    /// One animation frame: every registered movable first, then every tween.
    ///
    /// Both passes walk a snapshot taken at the start of the pass. An entry
    /// removed mid-pass is skipped; entries added mid-pass start next frame.
    pub fn run<H>(&mut self, hooks: &mut H, targets: &mut dyn TweenTargets) -> TickReport
    where
        H: MotionHooks + ?Sized,
    {
        self.frame = self.frame.saturating_add(1);
        let mut report = TickReport {
            frame: self.frame,
            ..TickReport::default()
        };
        self.run_movables(hooks, &mut report);
        self.run_tweens(targets, &mut report);
        report
    }

    fn run_movables<H>(&mut self, hooks: &mut H, report: &mut TickReport)
    where
        H: MotionHooks + ?Sized,
    {
        let mut snapshot = std::mem::take(&mut self.movable_snapshot);
        snapshot.clear();
        snapshot.extend_from_slice(&self.active);

        for &id in &snapshot {
            if !self.is_registered(id) {
                continue;
            }
            let Some(movable) = self.movables.get_mut(&id) else {
                continue;
            };
            movable.prev_position = movable.position;
            let Some(target) = movable.current_target else {
                continue;
            };
            if movable.position.distance(target) <= movable.current_reach_thresh {
                movable.position = target;
                report.movables_arrived += 1;
                hooks.on_step_end(self, id);
            } else {
                movable.position = movable.position + movable.speed_vector;
                report.movables_advanced += 1;
                hooks.on_advanced(self, id);
            }
        }

        self.movable_snapshot = snapshot;
    }

    fn run_tweens(&mut self, targets: &mut dyn TweenTargets, report: &mut TickReport) {
        let mut snapshot = std::mem::take(&mut self.target_snapshot);
        snapshot.clear();
        snapshot.extend_from_slice(&self.tween_order);

        for &target_id in &snapshot {
            let Some(list) = self.tweens.get(&target_id) else {
                continue;
            };
            let tween_ids: Vec<TweenId> = list.iter().map(|tween| tween.id).collect();
            let Some(target) = targets.target_mut(target_id) else {
                warn!(target = %target_id, tweens = tween_ids.len(), "tween_target_missing");
                self.deregister_tween_target(target_id);
                continue;
            };

            for tween_id in tween_ids {
                let Some(list) = self.tweens.get_mut(&target_id) else {
                    break;
                };
                let Some(index) = list.iter().position(|tween| tween.id == tween_id) else {
                    continue;
                };
                if !list[index].advance(&mut *target) {
                    continue;
                }
                let mut finished = list.remove(index);
                if list.is_empty() {
                    self.deregister_tween_target(target_id);
                }
                if let Some(on_complete) = finished.on_complete.take() {
                    on_complete(target_id, &mut *target);
                }
                report.tweens_completed.push((target_id, tween_id));
            }
        }

        self.target_snapshot = snapshot;
    }
}
