//! Frame-cursor advancement.

use anyhow::Result;

use crate::registry::{EntityId, EntityRegistry};
use crate::sim::TickCtx;

#[derive(Default)]
pub struct AnimationBehaviour;

impl AnimationBehaviour {
    pub fn update(
        &mut self,
        ctx: &mut TickCtx,
        registry: &mut EntityRegistry,
        id: EntityId,
    ) -> Result<()> {
        if let Some(animation) = registry.animation_mut(id) {
            animation.advance(ctx.dt_ms);
        }
        Ok(())
    }
}
