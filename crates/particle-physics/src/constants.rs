//! Physical constants for the particle simulation
//!
//! Values are in simulation units: one unit is one pixel of the default
//! 800x600 view, time is in seconds.

/// Default simulation width
pub const DEFAULT_WIDTH: f32 = 800.0;

/// Default simulation height
pub const DEFAULT_HEIGHT: f32 = 600.0;

/// Design timestep (60 Hz)
pub const TIMESTEP: f32 = 1.0 / 60.0;

/// Vertical acceleration, subtracted from vy every step
pub const GRAVITY: f32 = 50.0;

/// Fraction of velocity kept (with sign flip) on a boundary collision
pub const RESTITUTION: f32 = 0.8;

/// Per-step velocity multiplier, applied regardless of collision
pub const DRAG: f32 = 0.999;

/// Initial velocity is drawn from [-INITIAL_SPEED, INITIAL_SPEED) on each axis
pub const INITIAL_SPEED: f32 = 50.0;

/// Uniform particle mass
pub const PARTICLE_MASS: f32 = 1.0;
