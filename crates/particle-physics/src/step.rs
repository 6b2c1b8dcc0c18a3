//! The per-particle update applied by every execution strategy
//!
//! `integrate.wgsl` carries the same arithmetic in the same order; keep the two
//! in sync.

use glam::Vec2;

use crate::config::SimulationConfig;
use crate::particle::Particle;

/// Advance one particle by `dt`.
///
/// Semi-implicit Euler: gravity updates the velocity first, the new velocity
/// moves the particle. Each axis then collides independently with its bounds
/// (strictly outside only, so a particle resting on an edge never flips), and
/// drag is applied unconditionally.
#[inline]
pub fn step(particle: &mut Particle, config: &SimulationConfig, dt: f32) {
    let mut position = Vec2::from_array(particle.position);
    let mut velocity = Vec2::from_array(particle.velocity);

    velocity.y -= config.gravity * dt;
    position += velocity * dt;

    if position.x < 0.0 || position.x > config.width {
        velocity.x *= -config.restitution;
        position.x = position.x.min(config.width).max(0.0);
    }
    if position.y < 0.0 || position.y > config.height {
        velocity.y *= -config.restitution;
        position.y = position.y.min(config.height).max(0.0);
    }

    velocity *= config.drag;

    particle.position = position.to_array();
    particle.velocity = velocity.to_array();
}

/// Apply [`step`] to every particle of a slice, in index order
pub fn step_all(particles: &mut [Particle], config: &SimulationConfig, dt: f32) {
    for particle in particles {
        step(particle, config, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn particle(x: f32, y: f32, vx: f32, vy: f32) -> Particle {
        Particle::new(Vec2::new(x, y), Vec2::new(vx, vy))
    }

    #[test]
    fn gravity_is_applied_before_moving() {
        let config = SimulationConfig::default();
        let mut p = particle(400.0, 300.0, 0.0, 0.0);
        step(&mut p, &config, DT);

        let vy = -config.gravity * DT;
        assert_eq!(p.position, [400.0, 300.0 + vy * DT]);
        assert_eq!(p.velocity, [0.0, vy * config.drag]);
    }

    #[test]
    fn right_wall_collision_flips_and_damps() {
        let config = SimulationConfig::default().with_restitution(0.8);
        let mut p = particle(config.width - 0.001, 300.0, 50.0, 0.0);
        step(&mut p, &config, DT);

        assert!(p.velocity[0] < 0.0);
        assert!((p.velocity[0] - (-50.0 * 0.8 * config.drag)).abs() < 1e-4);
        assert!(p.position[0] <= config.width);
        assert_eq!(p.position[0], config.width);
    }

    #[test]
    fn left_wall_clamps_to_zero() {
        let config = SimulationConfig::default();
        let mut p = particle(0.1, 300.0, -60.0, 0.0);
        step(&mut p, &config, DT);

        assert_eq!(p.position[0], 0.0);
        assert!(p.velocity[0] > 0.0);
    }

    #[test]
    fn resting_on_edge_is_not_a_collision() {
        let config = SimulationConfig::default();
        let mut p = particle(config.width, 300.0, 0.0, 0.0);
        step(&mut p, &config, DT);

        assert_eq!(p.position[0], config.width);
        assert_eq!(p.velocity[0], 0.0);
    }

    #[test]
    fn corner_collision_flips_both_axes() {
        let config = SimulationConfig::default().with_gravity(0.0);
        let mut p = particle(config.width - 0.01, config.height - 0.01, 30.0, 30.0);
        step(&mut p, &config, DT);

        assert_eq!(p.position, [config.width, config.height]);
        assert!(p.velocity[0] < 0.0);
        assert!(p.velocity[1] < 0.0);
    }

    #[test]
    fn floor_collision_uses_updated_velocity() {
        let config = SimulationConfig::default();
        let mut p = particle(400.0, 0.0, 0.0, 0.0);
        step(&mut p, &config, DT);

        // Gravity pulls vy negative, the particle leaves the bottom bound and bounces.
        let expected = config.gravity * DT * config.restitution * config.drag;
        assert_eq!(p.position[1], 0.0);
        assert!((p.velocity[1] - expected).abs() < 1e-6);
    }

    #[test]
    fn drag_decays_speed_geometrically() {
        let config = SimulationConfig::default().with_gravity(0.0);
        let mut p = particle(400.0, 300.0, 3.0, -4.0);
        let initial = p.velocity().length();

        let steps = 120;
        for _ in 0..steps {
            step(&mut p, &config, DT);
        }

        let expected = initial * config.drag.powi(steps);
        assert!((p.velocity().length() - expected).abs() < 1e-4);
    }

    #[test]
    fn large_timestep_still_ends_inside_bounds() {
        let config = SimulationConfig::default();
        let mut p = particle(10.0, 10.0, -5000.0, 5000.0);
        step(&mut p, &config, 1.0);

        assert!(p.is_within(config.width, config.height));
    }

    #[test]
    fn step_all_matches_individual_steps() {
        let config = SimulationConfig::default();
        let mut batch = vec![
            particle(1.0, 2.0, 3.0, 4.0),
            particle(799.0, 599.0, 40.0, 40.0),
        ];
        let mut single = batch.clone();

        step_all(&mut batch, &config, DT);
        for p in &mut single {
            step(p, &config, DT);
        }
        assert_eq!(batch, single);
    }
}
