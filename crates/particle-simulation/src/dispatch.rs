//! CPU emulation of a compute-shader dispatch
//!
//! Mirrors what `integrate.wgsl` does on the GPU: `dispatch_size(n, g)`
//! workgroups of `g` lanes, every lane handling the particle at its global
//! invocation id and returning early past the end of the array. Lanes share
//! nothing, so there is no barrier inside a workgroup.

use particle_physics::{step, Particle, ParticleStore, SimulationConfig};
use rayon::prelude::*;

use crate::partition::{dispatch_size, WORKGROUP_SIZE};
use crate::updater::Updater;

/// Invocation coordinates handed to a lane, named after their WGSL builtins
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub workgroup_id: u32,
    pub local_invocation_id: u32,
    pub global_invocation_id: u32,
}

/// Data-parallel map over particles in workgroup-sized chunks, run on rayon's
/// global pool
#[derive(Clone, Copy, Debug)]
pub struct DispatchUpdater {
    group_width: u32,
}

impl Default for DispatchUpdater {
    fn default() -> Self {
        Self::new(WORKGROUP_SIZE)
    }
}

impl DispatchUpdater {
    /// `group_width` of zero is treated as one lane per group
    pub fn new(group_width: u32) -> Self {
        Self {
            group_width: group_width.max(1),
        }
    }

    pub fn group_width(&self) -> u32 {
        self.group_width
    }

    /// Run one dispatch over `particles`
    ///
    /// # Panics
    ///
    /// If there are more than `u32::MAX` particles, the range of a WGSL
    /// invocation id.
    pub fn dispatch(&self, particles: &mut [Particle], config: &SimulationConfig, dt: f32) {
        let Ok(count) = u32::try_from(particles.len()) else {
            panic!("{} particles exceed a u32 dispatch", particles.len());
        };
        let groups = dispatch_size(count, self.group_width);
        log::trace!(
            "Dispatching {} workgroups of {} lanes for {} particles",
            groups,
            self.group_width,
            count
        );

        let width = self.group_width;
        particles
            .par_chunks_mut(width as usize)
            .enumerate()
            .for_each(|(group, lanes)| {
                for lane in 0..width {
                    let invocation = Invocation {
                        workgroup_id: group as u32,
                        local_invocation_id: lane,
                        global_invocation_id: global_invocation_id(group, width, lane),
                    };
                    invoke(invocation, lanes, count, config, dt);
                }
            });
    }
}

/// Flat lane index, saturated at `u32::MAX`. A saturated id is never below
/// the particle count, so the lane is guarded out.
fn global_invocation_id(group: usize, width: u32, lane: u32) -> u32 {
    let id = group as u64 * u64::from(width) + u64::from(lane);
    u32::try_from(id).unwrap_or(u32::MAX)
}

/// Body of one shader invocation. `lanes` is the workgroup's slice, `count`
/// the length of the whole array.
fn invoke(
    invocation: Invocation,
    lanes: &mut [Particle],
    count: u32,
    config: &SimulationConfig,
    dt: f32,
) {
    if invocation.global_invocation_id >= count {
        return;
    }
    if let Some(particle) = lanes.get_mut(invocation.local_invocation_id as usize) {
        step(particle, config, dt);
    }
}

impl Updater for DispatchUpdater {
    fn name(&self) -> &'static str {
        "dispatch"
    }

    fn advance_by(&mut self, store: &mut ParticleStore, dt: f32) {
        let (config, particles) = store.split_mut();
        self.dispatch(particles, config, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use particle_physics::step_all;

    #[test]
    fn dispatch_matches_serial_step() {
        let config = SimulationConfig::default();
        let mut store = ParticleStore::with_seed(config, 1_000, 21);
        let mut serial = store.particles().to_vec();

        let mut updater = DispatchUpdater::default();
        for _ in 0..60 {
            updater.advance(&mut store);
            step_all(&mut serial, &config, config.dt);
        }

        assert_eq!(store.particles(), serial.as_slice());
    }

    #[test]
    fn partial_last_group_is_guarded() {
        // 70 particles: one full group of 64 and a tail group of 6 lanes in use.
        let config = SimulationConfig::default();
        let mut store = ParticleStore::with_seed(config, 70, 2);
        let mut serial = store.particles().to_vec();

        DispatchUpdater::new(64).advance(&mut store);
        step_all(&mut serial, &config, config.dt);

        assert_eq!(store.particles(), serial.as_slice());
    }

    #[test]
    fn out_of_range_invocation_does_nothing() {
        let config = SimulationConfig::default();
        let mut lanes = ParticleStore::with_seed(config, 4, 2).particles().to_vec();
        let before = lanes.clone();

        let invocation = Invocation {
            workgroup_id: 1,
            local_invocation_id: 0,
            global_invocation_id: 64,
        };
        invoke(invocation, &mut lanes, 4, &config, config.dt);

        assert_eq!(lanes, before);
    }

    #[test]
    fn global_ids_saturate_instead_of_wrapping() {
        assert_eq!(global_invocation_id(2, 64, 5), 133);
        assert_eq!(global_invocation_id(u32::MAX as usize / 64, 64, 63), u32::MAX);
        assert_eq!(global_invocation_id(u32::MAX as usize, 64, 63), u32::MAX);
    }

    #[test]
    fn zero_width_groups_fall_back_to_single_lanes() {
        assert_eq!(DispatchUpdater::new(0).group_width(), 1);
    }
}
