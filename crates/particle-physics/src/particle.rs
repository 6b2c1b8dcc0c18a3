//! Particle record shared between the CPU updaters and the compute shader

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// GPU-compatible particle structure
/// Layout matches the `Particle` struct in `integrate.wgsl` (24 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Particle {
    /// Position in simulation space
    pub position: [f32; 2],
    /// Velocity in units per second
    pub velocity: [f32; 2],
    /// Mass of the particle (uniform, not used by the physics)
    pub mass: f32,
    /// RGBA color for rendering
    pub color: [u8; 4],
}

impl Particle {
    /// Create an opaque white particle with the default mass
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self {
            position: position.to_array(),
            velocity: velocity.to_array(),
            mass: crate::constants::PARTICLE_MASS,
            color: [255; 4],
        }
    }

    /// Set the RGBA color
    pub fn with_color(mut self, color: [u8; 4]) -> Self {
        self.color = color;
        self
    }

    /// Position as a glam vector
    pub fn position(&self) -> Vec2 {
        Vec2::from_array(self.position)
    }

    /// Velocity as a glam vector
    pub fn velocity(&self) -> Vec2 {
        Vec2::from_array(self.velocity)
    }

    /// Is the particle inside the closed rectangle [0, width] x [0, height]
    pub fn is_within(&self, width: f32, height: f32) -> bool {
        let [x, y] = self.position;
        (0.0..=width).contains(&x) && (0.0..=height).contains(&y)
    }
}
