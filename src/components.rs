//! Concrete component records.
//!
//! Components are plain data keyed by entity id; they never point back at
//! their owning entity. Any resource a component owns is released by its
//! `Drop` impl when the record leaves the registry table.

use cgmath::Vector3;
use serde::{Deserialize, Serialize};

/// Wraps an angle into `(-PI, PI]`.
pub fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let mut a = angle % TAU;
    if a > PI {
        a -= TAU;
    } else if a <= -PI {
        a += TAU;
    }
    a
}

/// World-space translation plus yaw heading (radians, around +Y,
/// measured from +X toward +Z).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Position {
    pub pos: Vector3<f32>,
    pub yaw: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            pos: Vector3::new(x, y, z),
            yaw: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Scale {
    pub scale: Vector3<f32>,
}

impl Scale {
    pub fn uniform(factor: f32) -> Self {
        Self {
            scale: Vector3::new(factor, factor, factor),
        }
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Physics {
    pub velocity: Vector3<f32>,
    pub gravity: bool,
    pub on_ground: bool,
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            velocity: Vector3::new(0.0, 0.0, 0.0),
            gravity: true,
            on_ground: false,
        }
    }
}

/// Looping frame animation state. The frame cursor is all the renderer
/// needs; clip content lives with the (external) content pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Animation {
    pub frame: u32,
    pub frame_count: u32,
    pub frame_ms: f64,
    pub elapsed_ms: f64,
    pub playing: bool,
}

impl Animation {
    pub fn looping(frame_count: u32, frame_ms: f64) -> Self {
        Self {
            frame: 0,
            frame_count,
            frame_ms,
            elapsed_ms: 0.0,
            playing: true,
        }
    }

    pub fn advance(&mut self, dt_ms: f64) {
        if !self.playing || self.frame_count == 0 || self.frame_ms <= 0.0 {
            return;
        }
        self.elapsed_ms += dt_ms;
        while self.elapsed_ms >= self.frame_ms {
            self.elapsed_ms -= self.frame_ms;
            self.frame = (self.frame + 1) % self.frame_count;
        }
    }
}
