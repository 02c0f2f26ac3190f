mod easing;
mod engine;
mod movable;
mod tween;

pub use easing::{Easing, EasingParseError};
pub use engine::{MotionError, MotionHooks, MoveEngine, TickReport};
pub use movable::{Movable, MovableId};
pub use tween::{
    PropertyBag, Tween, TweenCallback, TweenId, TweenRequest, TweenTarget, TweenTargetId,
    TweenTargets,
};
