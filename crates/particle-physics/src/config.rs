//! Simulation bounds and tunable physics parameters

use crate::constants::*;

/// Bounds and physics parameters, fixed for the lifetime of a simulation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationConfig {
    pub width: f32,
    pub height: f32,
    /// Design timestep used by `Updater::advance`
    pub dt: f32,
    /// Subtracted from vy each step, scaled by dt
    pub gravity: f32,
    /// Velocity retention on collision, should be below 1
    pub restitution: f32,
    /// Per-step velocity multiplier, slightly below 1
    pub drag: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            dt: TIMESTEP,
            gravity: GRAVITY,
            restitution: RESTITUTION,
            drag: DRAG,
        }
    }
}

impl SimulationConfig {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_dt(mut self, dt: f32) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_drag(mut self, drag: f32) -> Self {
        self.drag = drag;
        self
    }
}
