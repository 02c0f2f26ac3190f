mod coordinator;
mod events;
mod occupancy;

pub use coordinator::{MoveOutcome, MovementCoordinator, TransitError};
pub use events::{ReplanReason, TransitEvent, TransitEventBus, TransitEventCounts, TransitEventKind};
pub use occupancy::Occupancy;
