//! Gravity and ground contact against the block grid.
//!
//! Only the vertical axis is integrated here. Horizontal displacement is
//! applied by whatever set the horizontal velocity (the movement actions);
//! `velocity.x`/`velocity.z` are carried as state for animation and
//! presentation, not re-integrated.

use anyhow::Result;

use crate::pathfind::GridPos;
use crate::registry::{EntityId, EntityRegistry};
use crate::sim::TickCtx;

/// Snap distance for settling onto a supporting block.
const GROUND_SNAP: f32 = 0.05;

pub struct PhysicsBehaviour {
    /// Downward acceleration, units per second squared.
    pub gravity_accel: f32,
}

impl Default for PhysicsBehaviour {
    fn default() -> Self {
        Self { gravity_accel: 24.0 }
    }
}

impl PhysicsBehaviour {
    pub fn update(
        &mut self,
        ctx: &mut TickCtx,
        registry: &mut EntityRegistry,
        id: EntityId,
    ) -> Result<()> {
        let Some(mut physics) = registry.physics(id).copied() else {
            return Ok(());
        };
        let Some(position) = registry.position(id) else {
            return Ok(());
        };
        let mut pos = position.pos;
        let dt_s = (ctx.dt_ms / 1000.0) as f32;

        if physics.gravity && !physics.on_ground {
            physics.velocity.y -= self.gravity_accel * dt_s;
        }
        pos.y += physics.velocity.y * dt_s;

        let world = ctx.world.clone();
        let grid = world.grid();
        let cell = GridPos::from_world(pos);
        if grid.is_solid(cell.x, cell.y, cell.z) {
            // Sank into a block; settle on top of it.
            pos.y = (cell.y + 1) as f32;
            physics.velocity.y = 0.0;
            physics.on_ground = true;
        } else if physics.velocity.y <= 0.0
            && grid.is_solid(cell.x, cell.y - 1, cell.z)
            && pos.y - cell.y as f32 <= GROUND_SNAP
        {
            pos.y = cell.y as f32;
            physics.velocity.y = 0.0;
            physics.on_ground = true;
        } else {
            physics.on_ground = false;
        }
        drop(grid);

        if let Some(slot) = registry.position_mut(id) {
            slot.pos = pos;
        }
        if let Some(slot) = registry.physics_mut(id) {
            *slot = physics;
        }
        Ok(())
    }
}
