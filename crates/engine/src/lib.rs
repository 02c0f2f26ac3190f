pub mod config;
pub mod geometry;
pub mod motion;
pub mod nav;
pub mod transit;
pub mod world;

pub use config::{
    resolve_engine_config, ConfigError, EngineConfig, MotionConfig, PathfindingConfig,
    TransitConfig, CONFIG_ENV_VAR,
};
pub use geometry::{Direction, GridPos, IsometricLayout, TileGeometry, Vec2};
pub use motion::{
    Easing, EasingParseError, MotionError, MotionHooks, Movable, MovableId, MoveEngine,
    PropertyBag, TickReport, TweenId, TweenRequest, TweenTarget, TweenTargetId, TweenTargets,
};
pub use nav::{BinaryHeap, Grid, GridError, GridNode, Heuristic, NodeId, Path, PathFinding};
pub use transit::{
    MoveOutcome, MovementCoordinator, Occupancy, ReplanReason, TransitError, TransitEvent,
    TransitEventBus, TransitEventCounts, TransitEventKind,
};
pub use world::{IsoWorld, MovableSpec, SpawnError, WorldError};
