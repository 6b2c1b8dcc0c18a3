//! # Particle Simulation Engine
//!
//! Execution strategies for advancing a [`ParticleStore`]: CPU worker threads
//! over disjoint sub-ranges, an emulated compute dispatch, and a wgpu compute
//! shader.
//!
//! [`ParticleStore`]: particle_physics::ParticleStore

pub mod compare;
pub mod cpu;
pub mod dispatch;
pub mod gpu;
pub mod params;
pub mod partition;
pub mod pool;
pub mod updater;

pub use compare::*;
pub use cpu::*;
pub use dispatch::*;
pub use gpu::*;
pub use params::*;
pub use partition::*;
pub use pool::*;
pub use updater::*;
