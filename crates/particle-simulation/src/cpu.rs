//! CPU worker threads spawned fresh for every step

use std::num::NonZeroUsize;
use std::thread;

use particle_physics::{step_all, ParticleStore};

use crate::partition::{partition, split_disjoint};
use crate::updater::Updater;

/// Spawns one scoped thread per sub-range on every advance and joins them all
/// before returning. Holds no threads between steps.
#[derive(Clone, Copy, Debug)]
pub struct ScopedUpdater {
    workers: usize,
}

impl ScopedUpdater {
    /// `workers == 0` runs the whole array on the calling thread
    pub fn new(workers: usize) -> Self {
        Self { workers }
    }

    /// One worker per hardware thread
    pub fn with_available_parallelism() -> Self {
        let workers = thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        log::info!("Scoped updater using {} workers", workers);
        Self::new(workers)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl Updater for ScopedUpdater {
    fn name(&self) -> &'static str {
        "scoped"
    }

    fn advance_by(&mut self, store: &mut ParticleStore, dt: f32) {
        let (config, particles) = store.split_mut();
        let ranges = partition(particles.len(), self.workers);
        log::trace!("Scoped advance over {} sub-ranges", ranges.len());

        if ranges.len() == 1 {
            step_all(particles, config, dt);
            return;
        }

        thread::scope(|scope| {
            for slice in split_disjoint(particles, &ranges) {
                if slice.is_empty() {
                    continue;
                }
                scope.spawn(move || step_all(slice, config, dt));
            }
        });
    }
}
