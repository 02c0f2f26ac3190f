use crate::geometry::{Direction, GridPos, Vec2};
use crate::motion::MovableId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplanReason {
    /// The next cell was filled when the step began.
    Blocked,
    /// Per-tile revalidation after an arrived step.
    Revalidate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransitEvent {
    DirectionChanged {
        movable: MovableId,
        from: Direction,
        to: Direction,
    },
    TileChanged {
        movable: MovableId,
        from: GridPos,
        to: GridPos,
    },
    OtherObjectsOnNextTile {
        movable: MovableId,
        tile: GridPos,
        others: Vec<MovableId>,
    },
    StepBlocked {
        movable: MovableId,
        tile: GridPos,
    },
    Replanned {
        movable: MovableId,
        reason: ReplanReason,
        steps: usize,
    },
    DestinationReached {
        movable: MovableId,
        tile: GridPos,
    },
    DestinationUnreachable {
        movable: MovableId,
        from: GridPos,
        destination: GridPos,
    },
    CameraFollow {
        movable: MovableId,
        position: Vec2,
    },
    Relocated {
        movable: MovableId,
        from: GridPos,
        to: GridPos,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitEventKind {
    DirectionChanged,
    TileChanged,
    OtherObjectsOnNextTile,
    StepBlocked,
    Replanned,
    DestinationReached,
    DestinationUnreachable,
    CameraFollow,
    Relocated,
}

impl TransitEvent {
    pub fn kind(&self) -> TransitEventKind {
        match self {
            Self::DirectionChanged { .. } => TransitEventKind::DirectionChanged,
            Self::TileChanged { .. } => TransitEventKind::TileChanged,
            Self::OtherObjectsOnNextTile { .. } => TransitEventKind::OtherObjectsOnNextTile,
            Self::StepBlocked { .. } => TransitEventKind::StepBlocked,
            Self::Replanned { .. } => TransitEventKind::Replanned,
            Self::DestinationReached { .. } => TransitEventKind::DestinationReached,
            Self::DestinationUnreachable { .. } => TransitEventKind::DestinationUnreachable,
            Self::CameraFollow { .. } => TransitEventKind::CameraFollow,
            Self::Relocated { .. } => TransitEventKind::Relocated,
        }
    }

    pub fn movable(&self) -> MovableId {
        match self {
            Self::DirectionChanged { movable, .. }
            | Self::TileChanged { movable, .. }
            | Self::OtherObjectsOnNextTile { movable, .. }
            | Self::StepBlocked { movable, .. }
            | Self::Replanned { movable, .. }
            | Self::DestinationReached { movable, .. }
            | Self::DestinationUnreachable { movable, .. }
            | Self::CameraFollow { movable, .. }
            | Self::Relocated { movable, .. } => *movable,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitEventCounts {
    pub total: u32,
    pub direction_changed: u32,
    pub tile_changed: u32,
    pub other_objects_on_next_tile: u32,
    pub step_blocked: u32,
    pub replanned: u32,
    pub destination_reached: u32,
    pub destination_unreachable: u32,
    pub camera_follow: u32,
    pub relocated: u32,
}

impl TransitEventCounts {
    fn record(&mut self, kind: TransitEventKind) {
        self.total = self.total.saturating_add(1);
        let slot = match kind {
            TransitEventKind::DirectionChanged => &mut self.direction_changed,
            TransitEventKind::TileChanged => &mut self.tile_changed,
            TransitEventKind::OtherObjectsOnNextTile => &mut self.other_objects_on_next_tile,
            TransitEventKind::StepBlocked => &mut self.step_blocked,
            TransitEventKind::Replanned => &mut self.replanned,
            TransitEventKind::DestinationReached => &mut self.destination_reached,
            TransitEventKind::DestinationUnreachable => &mut self.destination_unreachable,
            TransitEventKind::CameraFollow => &mut self.camera_follow,
            TransitEventKind::Relocated => &mut self.relocated,
        };
        *slot = slot.saturating_add(1);
    }
}

#[derive(Debug, Default)]
pub struct TransitEventBus {
    pending: Vec<TransitEvent>,
    lifetime_counts: TransitEventCounts,
}

impl TransitEventBus {
    pub fn emit(&mut self, event: TransitEvent) {
        self.lifetime_counts.record(event.kind());
        self.pending.push(event);
    }

    pub fn iter_emitted_so_far(&self) -> impl Iterator<Item = &TransitEvent> {
        self.pending.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn drain(&mut self) -> Vec<TransitEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn lifetime_counts(&self) -> TransitEventCounts {
        self.lifetime_counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_queue_but_keeps_counts() {
        let mut bus = TransitEventBus::default();
        bus.emit(TransitEvent::StepBlocked {
            movable: MovableId(1),
            tile: GridPos::new(2, 2),
        });
        bus.emit(TransitEvent::DestinationReached {
            movable: MovableId(1),
            tile: GridPos::new(3, 2),
        });
        assert_eq!(bus.iter_emitted_so_far().count(), 2);

        let drained = bus.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].kind(), TransitEventKind::StepBlocked);
        assert_eq!(drained[1].movable(), MovableId(1));
        assert_eq!(bus.pending_len(), 0);

        let counts = bus.lifetime_counts();
        assert_eq!(counts.total, 2);
        assert_eq!(counts.step_blocked, 1);
        assert_eq!(counts.destination_reached, 1);
        assert_eq!(counts.replanned, 0);
    }
}
