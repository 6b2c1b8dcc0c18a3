//! Benchmark configuration read from the environment
//!
//! - `PARTICLES_COUNT` - number of particles (default: 100000).
//! - `PARTICLES_FRAMES` - frames to run per backend (default: 600).
//! - `PARTICLES_WORKERS` - CPU workers (default: number of hardware threads).
//! - `PARTICLES_SEED` - seed for the initial particle state (default: 23).
//! - `PARTICLES_BACKENDS` - comma separated list of `scoped`, `pooled`,
//!   `dispatch` and `gpu` (default: all of them).
//! - `PARTICLES_WIDTH` / `PARTICLES_HEIGHT` - simulation bounds (default: 800 / 600).

use std::env;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use anyhow::{bail, Context};
use particle_physics::{SimulationConfig, DEFAULT_HEIGHT, DEFAULT_WIDTH};

const DEFAULT_COUNT: usize = 100_000;
const DEFAULT_FRAMES: usize = 600;
const DEFAULT_SEED: u64 = 23;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Scoped,
    Pooled,
    Dispatch,
    Gpu,
}

impl Backend {
    pub const ALL: [Backend; 4] = [
        Backend::Scoped,
        Backend::Pooled,
        Backend::Dispatch,
        Backend::Gpu,
    ];
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scoped" | "cpu" => Ok(Backend::Scoped),
            "pooled" | "pool" => Ok(Backend::Pooled),
            "dispatch" => Ok(Backend::Dispatch),
            "gpu" => Ok(Backend::Gpu),
            other => bail!("unknown backend `{other}`"),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::Scoped => "scoped",
            Backend::Pooled => "pooled",
            Backend::Dispatch => "dispatch",
            Backend::Gpu => "gpu",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug)]
pub struct BenchConfig {
    pub particle_count: usize,
    pub frames: usize,
    pub workers: usize,
    pub seed: u64,
    pub backends: Vec<Backend>,
    pub simulation: SimulationConfig,
}

impl BenchConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup, so tests don't have to touch the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let parse = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let particle_count = parse_or(parse("PARTICLES_COUNT"), "PARTICLES_COUNT", DEFAULT_COUNT)?;
        let frames = parse_or(parse("PARTICLES_FRAMES"), "PARTICLES_FRAMES", DEFAULT_FRAMES)?;
        let workers = parse_or(
            parse("PARTICLES_WORKERS"),
            "PARTICLES_WORKERS",
            default_workers(),
        )?;
        let seed = parse_or(parse("PARTICLES_SEED"), "PARTICLES_SEED", DEFAULT_SEED)?;
        let width = parse_or(parse("PARTICLES_WIDTH"), "PARTICLES_WIDTH", DEFAULT_WIDTH)?;
        let height = parse_or(parse("PARTICLES_HEIGHT"), "PARTICLES_HEIGHT", DEFAULT_HEIGHT)?;

        let backends = match parse("PARTICLES_BACKENDS") {
            Some(list) => list
                .split(',')
                .filter(|name| !name.trim().is_empty())
                .map(Backend::from_str)
                .collect::<anyhow::Result<Vec<_>>>()
                .context("invalid PARTICLES_BACKENDS")?,
            None => Backend::ALL.to_vec(),
        };

        if !(width > 0.0 && height > 0.0) {
            bail!("simulation bounds must be positive, got {width}x{height}");
        }
        if backends.is_empty() {
            bail!("PARTICLES_BACKENDS selects no backend");
        }

        Ok(Self {
            particle_count,
            frames,
            workers,
            seed,
            backends,
            simulation: SimulationConfig::new(width, height),
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("invalid {key}: `{value}`")),
        None => Ok(default),
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
