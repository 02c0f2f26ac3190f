use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::easing::Easing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenTargetId(pub u64);

impl fmt::Display for TweenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tween#{}", self.0)
    }
}

impl fmt::Display for TweenTargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// An object whose named numeric properties can be interpolated.
pub trait TweenTarget {
    fn property(&self, name: &str) -> Option<f32>;
    fn set_property(&mut self, name: &str, value: f32);
}

pub trait TweenTargets {
    fn target_mut(&mut self, id: TweenTargetId) -> Option<&mut dyn TweenTarget>;
}

impl<T: TweenTarget> TweenTargets for HashMap<TweenTargetId, T> {
    fn target_mut(&mut self, id: TweenTargetId) -> Option<&mut dyn TweenTarget> {
        self.get_mut(&id).map(|target| target as &mut dyn TweenTarget)
    }
}

impl<T: TweenTarget> TweenTargets for BTreeMap<TweenTargetId, T> {
    fn target_mut(&mut self, id: TweenTargetId) -> Option<&mut dyn TweenTarget> {
        self.get_mut(&id).map(|target| target as &mut dyn TweenTarget)
    }
}

/// Plain named-property store usable as a tween target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag {
    values: BTreeMap<String, f32>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: f32) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.values.get(name).copied()
    }

    pub fn set(&mut self, name: &str, value: f32) {
        self.values.insert(name.to_string(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl TweenTarget for PropertyBag {
    fn property(&self, name: &str) -> Option<f32> {
        self.get(name)
    }

    fn set_property(&mut self, name: &str, value: f32) {
        self.set(name, value);
    }
}

pub type TweenCallback = Box<dyn FnOnce(TweenTargetId, &mut dyn TweenTarget)>;

pub struct TweenRequest {
    pub duration_seconds: f32,
    pub props: Vec<(String, f32)>,
    pub delay_seconds: f32,
    pub easing: Option<Easing>,
    pub overwrite: bool,
    pub on_complete: Option<TweenCallback>,
}

impl TweenRequest {
    pub fn new(duration_seconds: f32) -> Self {
        Self {
            duration_seconds,
            props: Vec::new(),
            delay_seconds: 0.0,
            easing: None,
            overwrite: false,
            on_complete: None,
        }
    }

    pub fn to(mut self, name: &str, value: f32) -> Self {
        self.props.push((name.to_string(), value));
        self
    }

    pub fn with_delay(mut self, delay_seconds: f32) -> Self {
        self.delay_seconds = delay_seconds;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn on_complete(
        mut self,
        callback: impl FnOnce(TweenTargetId, &mut dyn TweenTarget) + 'static,
    ) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for TweenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TweenRequest")
            .field("duration_seconds", &self.duration_seconds)
            .field("props", &self.props)
            .field("delay_seconds", &self.delay_seconds)
            .field("easing", &self.easing)
            .field("overwrite", &self.overwrite)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TweenEntry {
    pub(crate) property: String,
    pub(crate) begin: f32,
    pub(crate) delta: f32,
}

pub struct Tween {
    pub(crate) id: TweenId,
    pub(crate) entries: Vec<TweenEntry>,
    pub(crate) total_frames: u32,
    pub(crate) elapsed_frames: u32,
    pub(crate) delay_frames: u32,
    pub(crate) easing: Easing,
    pub(crate) overwrite: bool,
    pub(crate) on_complete: Option<TweenCallback>,
}

impl Tween {
    pub fn id(&self) -> TweenId {
        self.id
    }

    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    pub fn elapsed_frames(&self) -> u32 {
        self.elapsed_frames
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    pub fn animates(&self, property: &str) -> bool {
        self.entries.iter().any(|entry| entry.property == property)
    }

    /// Advances one frame and writes the eased values. Returns `true` on the
    /// frame where the tween completes; that frame writes exact end values.
    pub(crate) fn advance(&mut self, target: &mut dyn TweenTarget) -> bool {
        if self.delay_frames > 0 {
            self.delay_frames -= 1;
            return false;
        }
        self.elapsed_frames = self.elapsed_frames.saturating_add(1);
        let finished = self.elapsed_frames >= self.total_frames;
        let elapsed = self.elapsed_frames as f32;
        let total = self.total_frames as f32;
        for entry in &self.entries {
            let value = if finished {
                entry.begin + entry.delta
            } else {
                self.easing.apply(elapsed, entry.begin, entry.delta, total)
            };
            target.set_property(&entry.property, value);
        }
        finished
    }
}

impl fmt::Debug for Tween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tween")
            .field("id", &self.id)
            .field("entries", &self.entries)
            .field("total_frames", &self.total_frames)
            .field("elapsed_frames", &self.elapsed_frames)
            .field("delay_frames", &self.delay_frames)
            .field("easing", &self.easing)
            .field("overwrite", &self.overwrite)
            .finish()
    }
}
