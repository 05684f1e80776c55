//! Renderer boundary.
//!
//! Drawable behaviours describe what to draw; an external renderer decides
//! how. [`RecordingRenderer`] is the in-crate capture double used by the
//! runner summary and the tests.

use cgmath::Vector3;

use crate::registry::EntityId;

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub entity: EntityId,
    pub position: Vector3<f32>,
    pub yaw: f32,
    pub scale: Vector3<f32>,
    pub frame: u32,
}

pub trait Renderer {
    fn submit(&mut self, call: DrawCall);
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub calls: Vec<DrawCall>,
}

impl Renderer for RecordingRenderer {
    fn submit(&mut self, call: DrawCall) {
        self.calls.push(call);
    }
}
