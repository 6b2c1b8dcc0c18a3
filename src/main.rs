//! Parallel Particle Stepper
//!
//! Headless benchmark comparing CPU-parallel and GPU-parallel strategies for
//! the same independent-particle workload. Configuration comes from the
//! environment, see [`config`].

mod config;
mod stats;

use std::time::Instant;

use anyhow::{bail, Context};
use config::{Backend, BenchConfig};
use particle_physics::ParticleStore;
use particle_simulation::{
    Deviation, DispatchUpdater, GpuSimulation, PooledUpdater, ScopedUpdater, Updater,
    GPU_TOLERANCE,
};
use stats::FrameStats;

/// Result of running one backend from the shared initial state
struct Run {
    backend: Backend,
    stats: FrameStats,
    store: ParticleStore,
}

fn run_cpu(
    backend: Backend,
    updater: &mut dyn Updater,
    initial: &ParticleStore,
    frames: usize,
) -> Run {
    let mut store = initial.clone();
    let mut stats = FrameStats::new(updater.name());

    for _ in 0..frames {
        let start = Instant::now();
        updater.advance(&mut store);
        stats.record(start.elapsed());
    }

    Run {
        backend,
        stats,
        store,
    }
}

fn run_gpu(initial: &ParticleStore, frames: usize) -> anyhow::Result<Option<Run>> {
    let config = *initial.config();
    let gpu = match pollster::block_on(GpuSimulation::new(config, initial.particles())) {
        Ok(gpu) => gpu,
        Err(e) => {
            log::warn!("Skipping GPU backend: {e}");
            return Ok(None);
        }
    };

    let mut stats = FrameStats::new("gpu");
    for _ in 0..frames {
        let start = Instant::now();
        gpu.step(config.dt);
        gpu.wait().context("GPU step failed")?;
        stats.record(start.elapsed());
    }

    let particles = gpu.read_particles().context("GPU readback failed")?;
    Ok(Some(Run {
        backend: Backend::Gpu,
        stats,
        store: ParticleStore::from_particles(config, particles),
    }))
}

fn deviation(run: &Run, reference: &Run) -> Deviation {
    Deviation::between(
        run.store.particles(),
        reference.store.particles(),
        GPU_TOLERANCE,
    )
}

/// Every run stays in bounds, CPU runs agree bit-for-bit and the GPU run stays
/// within tolerance of the first CPU run
fn verify(runs: &[Run]) -> anyhow::Result<()> {
    for run in runs {
        if !run.store.within_bounds() {
            bail!("{} left particles outside the simulation bounds", run.backend);
        }
    }

    let mut cpu_runs = runs.iter().filter(|run| run.backend != Backend::Gpu);
    if let Some(reference) = cpu_runs.next() {
        for run in cpu_runs {
            if run.store.particles() != reference.store.particles() {
                bail!(
                    "{} diverged from {}: {}",
                    run.backend,
                    reference.backend,
                    deviation(run, reference)
                );
            }
        }

        if let Some(gpu) = runs.iter().find(|run| run.backend == Backend::Gpu) {
            let deviation = deviation(gpu, reference);
            log::info!("GPU vs {}: {}", reference.backend, deviation);
            if !deviation.is_acceptable() {
                bail!("gpu diverged from {}: {}", reference.backend, deviation);
            }
        }
    }

    log::info!("✓ All backends stayed in bounds and agree");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Initialize logger (RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = BenchConfig::from_env().context("invalid benchmark configuration")?;
    log::info!(
        "Running {} particles for {} frames on {} workers, backends: {:?}",
        config.particle_count,
        config.frames,
        config.workers,
        config.backends
    );

    let initial = ParticleStore::with_seed(config.simulation, config.particle_count, config.seed);
    for (i, p) in initial.particles().iter().take(10).enumerate() {
        log::debug!(
            "    [{}] pos=({:.1}, {:.1}) vel=({:.1}, {:.1}) color={:?}",
            i,
            p.position[0],
            p.position[1],
            p.velocity[0],
            p.velocity[1],
            p.color
        );
    }

    let mut runs = Vec::with_capacity(config.backends.len());
    for backend in &config.backends {
        log::info!("Starting {} backend...", backend);
        let run = match backend {
            Backend::Scoped => {
                let mut updater = ScopedUpdater::new(config.workers);
                Some(run_cpu(*backend, &mut updater, &initial, config.frames))
            }
            Backend::Pooled => {
                let mut updater = PooledUpdater::new(config.workers)
                    .context("unable to build the worker pool")?;
                Some(run_cpu(*backend, &mut updater, &initial, config.frames))
            }
            Backend::Dispatch => {
                let mut updater = DispatchUpdater::default();
                Some(run_cpu(*backend, &mut updater, &initial, config.frames))
            }
            Backend::Gpu => run_gpu(&initial, config.frames)?,
        };
        runs.extend(run);
    }

    log::info!("Summary:");
    for run in &runs {
        log::info!("  {}", run.stats.summary());
    }

    verify(&runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use particle_physics::SimulationConfig;

    fn seeded() -> ParticleStore {
        ParticleStore::with_seed(SimulationConfig::default(), 200, 17)
    }

    fn run(backend: Backend, store: ParticleStore) -> Run {
        Run {
            backend,
            stats: FrameStats::new(backend.to_string()),
            store,
        }
    }

    /// `seeded()` with `edit` applied to its particles
    fn edited(edit: impl FnOnce(&mut [particle_physics::Particle])) -> ParticleStore {
        let store = seeded();
        let mut particles = store.particles().to_vec();
        edit(&mut particles);
        ParticleStore::from_particles(*store.config(), particles)
    }

    #[test]
    fn agreeing_runs_pass() {
        let runs = [
            run(Backend::Scoped, seeded()),
            run(Backend::Pooled, seeded()),
            run(Backend::Gpu, edited(|p| p[0].velocity[0] += 1e-4)),
        ];
        assert!(verify(&runs).is_ok());
    }

    #[test]
    fn out_of_bounds_run_fails() {
        let runs = [run(Backend::Dispatch, edited(|p| p[3].position = [-5.0, 10.0]))];
        assert!(verify(&runs).is_err());
    }

    #[test]
    fn diverged_cpu_run_fails() {
        let runs = [
            run(Backend::Scoped, seeded()),
            run(Backend::Pooled, edited(|p| p[42].velocity[1] += 1e-3)),
        ];
        let err = verify(&runs).unwrap_err();
        assert!(err.to_string().contains("pooled diverged from scoped"));
    }

    #[test]
    fn gpu_beyond_tolerance_fails() {
        // 10 of 200 particles off by a unit of velocity, past the 1% allowance
        let gpu = edited(|p| {
            for particle in &mut p[..10] {
                particle.velocity[0] += 1.0;
            }
        });
        let runs = [run(Backend::Scoped, seeded()), run(Backend::Gpu, gpu)];
        let err = verify(&runs).unwrap_err();
        assert!(err.to_string().contains("gpu diverged from scoped"));
    }

    #[test]
    fn gpu_alone_is_only_bounds_checked() {
        assert!(verify(&[run(Backend::Gpu, seeded())]).is_ok());
    }
}
