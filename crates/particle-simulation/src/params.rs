//! Uniform parameters for the integration shader

use bytemuck::{Pod, Zeroable};
use particle_physics::SimulationConfig;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SimParams {
    // Group 1: Integration
    // x: width, y: height, z: dt, w: gravity
    pub integration: [f32; 4],

    // Group 2: Collision response
    // x: restitution, y: drag, z: padding, w: padding
    pub response: [f32; 4],

    // Group 3: Counts
    // x: particle_count, y: padding, z: padding, w: padding
    pub counts: [u32; 4],
}

impl Default for SimParams {
    fn default() -> Self {
        let config = SimulationConfig::default();
        Self::from_config(&config, 0, config.dt)
    }
}

impl SimParams {
    pub fn from_config(config: &SimulationConfig, particle_count: u32, dt: f32) -> Self {
        Self {
            integration: [
                config.width,   // width
                config.height,  // height
                dt,             // dt
                config.gravity, // gravity
            ],
            response: [
                config.restitution, // restitution
                config.drag,        // drag
                0.0,                // padding
                0.0,                // padding
            ],
            counts: [
                particle_count, // particle_count
                0,              // padding
                0,              // padding
                0,              // padding
            ],
        }
    }

    pub fn particle_count(&self) -> u32 {
        self.counts[0]
    }

    pub fn dt(&self) -> f32 {
        self.integration[2]
    }
}
