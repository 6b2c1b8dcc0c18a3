//! CPU workers kept alive across steps

use particle_physics::{step_all, ParticleStore};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use crate::partition::{partition, split_disjoint};
use crate::updater::Updater;

/// Same partitioning as [`ScopedUpdater`], but the worker threads live in a
/// fixed-size pool that is reused for every step. Each advance ends with the
/// pool scope joining all sub-range tasks.
///
/// [`ScopedUpdater`]: crate::cpu::ScopedUpdater
pub struct PooledUpdater {
    pool: ThreadPool,
    workers: usize,
}

impl PooledUpdater {
    /// `workers == 0` keeps a single thread and runs one sub-range per step
    pub fn new(workers: usize) -> Result<Self, ThreadPoolBuildError> {
        // num_threads(0) would let rayon pick every core
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("particle-worker-{i}"))
            .build()?;

        log::info!(
            "Pooled updater built with {} threads for {} workers",
            pool.current_num_threads(),
            workers
        );

        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl Updater for PooledUpdater {
    fn name(&self) -> &'static str {
        "pooled"
    }

    fn advance_by(&mut self, store: &mut ParticleStore, dt: f32) {
        let (config, particles) = store.split_mut();
        let ranges = partition(particles.len(), self.workers);
        log::trace!("Pooled advance over {} sub-ranges", ranges.len());

        self.pool.scope(|scope| {
            for slice in split_disjoint(particles, &ranges) {
                if slice.is_empty() {
                    continue;
                }
                scope.spawn(move |_| step_all(slice, config, dt));
            }
        });
    }
}
