//! Owner of the particle array

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SimulationConfig;
use crate::constants::INITIAL_SPEED;
use crate::particle::Particle;

/// Contiguous particle array plus the bounds it is simulated in.
///
/// Updaters borrow the array mutably for one advance and split it into
/// disjoint sub-slices; readers borrow it immutably in between.
#[derive(Clone, Debug)]
pub struct ParticleStore {
    config: SimulationConfig,
    particles: Vec<Particle>,
}

impl ParticleStore {
    /// Seed `count` particles uniformly over the bounds using `rng`
    pub fn new<R: Rng>(config: SimulationConfig, count: usize, rng: &mut R) -> Self {
        let particles = (0..count)
            .map(|_| random_particle(&config, rng))
            .collect::<Vec<_>>();

        log::info!(
            "Seeded {} particles in {}x{} (dt = {:.5})",
            particles.len(),
            config.width,
            config.height,
            config.dt
        );

        Self { config, particles }
    }

    /// Reproducible seeding from a fixed `seed`
    pub fn with_seed(config: SimulationConfig, count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::new(config, count, &mut rng)
    }

    pub fn from_particles(config: SimulationConfig, particles: Vec<Particle>) -> Self {
        Self { config, particles }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn set_dt(&mut self, dt: f32) {
        self.config.dt = dt;
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Mutable particle access together with the config, for updaters that
    /// need both without cloning the config
    pub fn split_mut(&mut self) -> (&SimulationConfig, &mut [Particle]) {
        (&self.config, &mut self.particles)
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Does every particle lie inside [0, width] x [0, height]
    pub fn within_bounds(&self) -> bool {
        self.particles
            .iter()
            .all(|p| p.is_within(self.config.width, self.config.height))
    }
}

fn random_particle<R: Rng>(config: &SimulationConfig, rng: &mut R) -> Particle {
    let position = Vec2::new(
        rng.random::<f32>() * config.width,
        rng.random::<f32>() * config.height,
    );
    let velocity = Vec2::new(
        rng.random_range(-INITIAL_SPEED..INITIAL_SPEED),
        rng.random_range(-INITIAL_SPEED..INITIAL_SPEED),
    );
    let color = [
        (rng.random::<f32>() * 255.0) as u8,
        (rng.random::<f32>() * 255.0) as u8,
        (rng.random::<f32>() * 255.0) as u8,
        255,
    ];

    Particle::new(position, velocity).with_color(color)
}
