//! Block-grid boundary consumed from the world/terrain subsystem.
//!
//! The simulation core never owns terrain; it reads blocks through
//! [`BlockGrid`]. Block mutation happens on a separate write path outside
//! this crate, so a pathfinding result may go stale the moment it is
//! returned.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;

/// Numeric block identifier. `0` is always air.
pub type BlockId = u16;

pub const AIR: BlockId = 0;
pub const STONE: BlockId = 1;

pub trait BlockGrid {
    fn block(&self, x: i32, y: i32, z: i32) -> BlockId;

    fn is_solid(&self, x: i32, y: i32, z: i32) -> bool {
        self.block(x, y, z) != AIR
    }
}

/// Shared handle to the owning world, registered as a constant component
/// so every behaviour and action can reach the grid.
#[derive(Clone)]
pub struct WorldHandle(Rc<RefCell<dyn BlockGrid>>);

impl WorldHandle {
    pub fn new(grid: impl BlockGrid + 'static) -> Self {
        Self(Rc::new(RefCell::new(grid)))
    }

    pub fn grid(&self) -> Ref<'_, dyn BlockGrid> {
        self.0.borrow()
    }

    pub fn grid_mut(&self) -> RefMut<'_, dyn BlockGrid> {
        self.0.borrow_mut()
    }
}

/// Minimal in-memory grid: an infinite flat floor plus sparse overrides.
/// Backs the demo runner and the tests; real terrain lives elsewhere.
pub struct MapWorld {
    floor_y: i32,
    overrides: HashMap<(i32, i32, i32), BlockId>,
}

impl MapWorld {
    /// Flat world whose topmost solid layer is `floor_y`. Agents stand in
    /// the `floor_y + 1` cell layer.
    pub fn flat(floor_y: i32) -> Self {
        Self {
            floor_y,
            overrides: HashMap::new(),
        }
    }

    /// Places (or, with [`AIR`], carves) a single block.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, id: BlockId) {
        self.overrides.insert((x, y, z), id);
    }
}

impl BlockGrid for MapWorld {
    fn block(&self, x: i32, y: i32, z: i32) -> BlockId {
        if let Some(&id) = self.overrides.get(&(x, y, z)) {
            return id;
        }
        if y <= self.floor_y {
            STONE
        } else {
            AIR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_world_floor() {
        let world = MapWorld::flat(-1);

        assert!(world.is_solid(0, -1, 0));
        assert!(world.is_solid(5, -3, -7));
        assert!(!world.is_solid(0, 0, 0));
        assert_eq!(world.block(0, 0, 0), AIR);
    }

    #[test]
    fn overrides_place_and_carve() {
        let mut world = MapWorld::flat(-1);

        world.set_block(2, 0, 2, STONE);
        assert!(world.is_solid(2, 0, 2));

        world.set_block(0, -1, 0, AIR);
        assert!(!world.is_solid(0, -1, 0));
    }

    #[test]
    fn handle_shares_one_grid() {
        let handle = WorldHandle::new(MapWorld::flat(-1));
        let alias = handle.clone();

        alias.grid_mut().is_solid(0, -1, 0);
        assert!(handle.grid().is_solid(0, -1, 0));
    }
}
