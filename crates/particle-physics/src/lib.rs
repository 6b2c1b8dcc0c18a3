//! # Particle Physics
//!
//! Independent-particle physics shared by every execution strategy: the
//! particle record, the simulation bounds, the per-particle step and the store
//! that owns the particle array.

pub mod config;
pub mod constants;
pub mod particle;
pub mod step;
pub mod store;

pub use config::*;
pub use constants::*;
pub use particle::*;
pub use step::*;
pub use store::*;
