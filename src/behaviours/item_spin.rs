//! Dropped-item presentation: a slow spin, drawn like any model.

use anyhow::Result;

use crate::components::wrap_angle;
use crate::registry::{EntityId, EntityRegistry};
use crate::render::Renderer;
use crate::sim::TickCtx;

use super::model_draw::submit_model;

pub struct ItemSpinBehaviour {
    /// Yaw rate, radians per second.
    pub spin_rate: f32,
}

impl Default for ItemSpinBehaviour {
    fn default() -> Self {
        Self { spin_rate: 2.0 }
    }
}

impl ItemSpinBehaviour {
    pub fn update(
        &mut self,
        ctx: &mut TickCtx,
        registry: &mut EntityRegistry,
        id: EntityId,
    ) -> Result<()> {
        if let Some(position) = registry.position_mut(id) {
            let dt_s = (ctx.dt_ms / 1000.0) as f32;
            position.yaw = wrap_angle(position.yaw + self.spin_rate * dt_s);
        }
        Ok(())
    }

    pub fn draw(
        &mut self,
        registry: &EntityRegistry,
        id: EntityId,
        renderer: &mut dyn Renderer,
    ) -> Result<()> {
        submit_model(registry, id, renderer);
        Ok(())
    }
}
