use std::collections::HashMap;

use tracing::warn;

use crate::geometry::GridPos;
use crate::motion::MovableId;
use crate::nav::PathFinding;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Occupant {
    id: MovableId,
    blocks_tile: bool,
}

/// Which movables stand on which tile. Keeps the pathfinding grid's dynamic
/// weights in sync: a cell is filled while any blocking occupant remains.
#[derive(Debug, Default)]
pub struct Occupancy {
    by_tile: HashMap<GridPos, Vec<Occupant>>,
}

impl Occupancy {
    pub fn enter(
        &mut self,
        pathfinding: &mut PathFinding,
        id: MovableId,
        pos: GridPos,
        blocks_tile: bool,
    ) {
        let occupants = self.by_tile.entry(pos).or_default();
        if occupants.iter().any(|occupant| occupant.id == id) {
            return;
        }
        occupants.push(Occupant { id, blocks_tile });
        self.sync_cell(pathfinding, pos);
    }

    pub fn leave(&mut self, pathfinding: &mut PathFinding, id: MovableId, pos: GridPos) {
        let Some(occupants) = self.by_tile.get_mut(&pos) else {
            return;
        };
        occupants.retain(|occupant| occupant.id != id);
        if occupants.is_empty() {
            self.by_tile.remove(&pos);
        }
        self.sync_cell(pathfinding, pos);
    }

    pub fn relocate(
        &mut self,
        pathfinding: &mut PathFinding,
        id: MovableId,
        from: GridPos,
        to: GridPos,
        blocks_tile: bool,
    ) {
        if from == to {
            return;
        }
        self.leave(pathfinding, id, from);
        self.enter(pathfinding, id, to, blocks_tile);
    }

    pub fn objects_at(&self, pos: GridPos) -> Vec<MovableId> {
        self.by_tile
            .get(&pos)
            .map(|occupants| occupants.iter().map(|occupant| occupant.id).collect())
            .unwrap_or_default()
    }

    pub fn is_blocked_by_occupant(&self, pos: GridPos) -> bool {
        self.by_tile
            .get(&pos)
            .is_some_and(|occupants| occupants.iter().any(|occupant| occupant.blocks_tile))
    }

    /// Whether a blocking movable other than `id` stands on `pos`.
    pub fn is_blocked_for_other(&self, pos: GridPos, id: MovableId) -> bool {
        self.by_tile.get(&pos).is_some_and(|occupants| {
            occupants
                .iter()
                .any(|occupant| occupant.blocks_tile && occupant.id != id)
        })
    }

    fn sync_cell(&self, pathfinding: &mut PathFinding, pos: GridPos) {
        let movable = !self.is_blocked_by_occupant(pos);
        if let Err(error) = pathfinding.set_dynamic_cell(pos, movable) {
            warn!(c = pos.c, r = pos.r, error = %error, "occupancy_sync_failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathfindingConfig;

    #[test]
    fn blocking_occupant_fills_cell_until_last_one_leaves() {
        let mut pathfinding = PathFinding::new(3, 3, &PathfindingConfig::default());
        let mut occupancy = Occupancy::default();
        let pos = GridPos::new(1, 1);

        occupancy.enter(&mut pathfinding, MovableId(1), pos, true);
        occupancy.enter(&mut pathfinding, MovableId(2), pos, true);
        assert!(pathfinding.is_cell_filled(pos));
        assert_eq!(occupancy.objects_at(pos), vec![MovableId(1), MovableId(2)]);

        occupancy.leave(&mut pathfinding, MovableId(1), pos);
        assert!(pathfinding.is_cell_filled(pos));
        occupancy.leave(&mut pathfinding, MovableId(2), pos);
        assert!(!pathfinding.is_cell_filled(pos));
        assert!(occupancy.objects_at(pos).is_empty());
    }

    #[test]
    fn non_blocking_occupant_leaves_cell_open() {
        let mut pathfinding = PathFinding::new(3, 3, &PathfindingConfig::default());
        let mut occupancy = Occupancy::default();
        let from = GridPos::new(0, 0);
        let to = GridPos::new(1, 0);

        occupancy.enter(&mut pathfinding, MovableId(1), from, false);
        assert!(!pathfinding.is_cell_filled(from));
        occupancy.relocate(&mut pathfinding, MovableId(1), from, to, false);
        assert_eq!(occupancy.objects_at(to), vec![MovableId(1)]);
        assert!(occupancy.objects_at(from).is_empty());
    }

    #[test]
    fn leaving_does_not_open_static_wall() {
        let mut pathfinding = PathFinding::new(3, 3, &PathfindingConfig::default());
        let pos = GridPos::new(2, 2);
        pathfinding.set_cell(pos, false).expect("set wall");
        let mut occupancy = Occupancy::default();
        occupancy.enter(&mut pathfinding, MovableId(1), pos, true);
        occupancy.leave(&mut pathfinding, MovableId(1), pos);
        assert!(pathfinding.is_cell_filled(pos));
    }
}
