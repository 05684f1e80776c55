//! Draw-only behaviour submitting an entity's model transform.

use anyhow::Result;

use crate::registry::{EntityId, EntityRegistry};
use crate::render::{DrawCall, Renderer};

#[derive(Default)]
pub struct ModelDrawBehaviour;

impl ModelDrawBehaviour {
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

/// Shared by every drawable behaviour: position is required, scale and
/// animation are optional extras.
pub(super) fn submit_model(registry: &EntityRegistry, id: EntityId, renderer: &mut dyn Renderer) {
    let Some(position) = registry.position(id) else {
        return;
    };
    let scale = registry.scale(id).copied().unwrap_or_default();
    let frame = registry.animation(id).map_or(0, |animation| animation.frame);
    renderer.submit(DrawCall {
        entity: id,
        position: position.pos,
        yaw: position.yaw,
        scale: scale.scale,
        frame,
    });
}
