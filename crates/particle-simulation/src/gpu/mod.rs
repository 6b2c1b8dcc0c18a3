//! GPU-based particle integration
//!
//! The particle array lives in a storage buffer; each step is one dispatch of
//! `integrate.wgsl`, one invocation per particle. Workgroups are laid out on a
//! 2D grid once one row would exceed the device's per-dimension limit. Nothing
//! comes back to the CPU until [`GpuSimulation::read_particles`] is called.

mod error;

pub use error::GpuError;

use std::sync::mpsc;

use particle_physics::{Particle, ParticleStore, SimulationConfig};
use wgpu::util::DeviceExt;

use crate::params::SimParams;
use crate::partition::{dispatch_size, workgroup_grid, WORKGROUP_SIZE};

const PARTICLE_SIZE: u64 = std::mem::size_of::<Particle>() as u64;

/// GPU-based particle simulation
pub struct GpuSimulation {
    device: wgpu::Device,
    queue: wgpu::Queue,

    // Buffers
    particle_buffer: wgpu::Buffer,
    staging_buffer: wgpu::Buffer,
    params_buffer: wgpu::Buffer,

    integrate_pipeline: wgpu::ComputePipeline,
    integrate_bind_group: wgpu::BindGroup,

    config: SimulationConfig,
    particle_count: u32,
    workgroups: (u32, u32),
}

impl GpuSimulation {
    /// Request a headless adapter and device, then upload `particles`
    pub async fn new(config: SimulationConfig, particles: &[Particle]) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("Using GPU: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Particle Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        Self::from_device(device, queue, config, particles)
    }

    fn from_device(
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: SimulationConfig,
        particles: &[Particle],
    ) -> Result<Self, GpuError> {
        log::info!("Initializing GpuSimulation with {} particles...", particles.len());
        let (particle_count, workgroups) = fit_to_limits(particles.len(), &device.limits())?;
        log::info!("Dispatch grid {}x{} workgroups", workgroups.0, workgroups.1);

        // Storage bindings may not be empty, keep room for at least one particle.
        let buffer_size = PARTICLE_SIZE * u64::from(particle_count.max(1));

        let particle_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Buffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        if !particles.is_empty() {
            queue.write_buffer(&particle_buffer, 0, bytemuck::cast_slice(particles));
        }

        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Staging Buffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let params = SimParams::from_config(&config, particle_count, config.dt);
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Simulation Params Buffer"),
            contents: bytemuck::cast_slice(&[params]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        log::info!("Buffers created");

        let integrate_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Integration Compute Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/integrate.wgsl").into()),
        });

        let integrate_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Integration Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: false },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let integrate_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Integration Pipeline Layout"),
                bind_group_layouts: &[&integrate_bind_group_layout],
                push_constant_ranges: &[],
            });

        let integrate_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Integration Pipeline"),
            layout: Some(&integrate_pipeline_layout),
            module: &integrate_shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let integrate_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Integration Bind Group"),
            layout: &integrate_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: particle_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        log::info!("Integration pipeline created");

        Ok(Self {
            device,
            queue,
            particle_buffer,
            staging_buffer,
            params_buffer,
            integrate_pipeline,
            integrate_bind_group,
            config,
            particle_count,
            workgroups,
        })
    }

    /// Step the simulation forward by `dt` without reading anything back
    pub fn step(&self, dt: f32) {
        let params = SimParams::from_config(&self.config, self.particle_count, dt);
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::cast_slice(&[params]));

        let (groups_x, groups_y) = self.workgroups;
        if groups_x == 0 {
            return;
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Simulation Encoder"),
            });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Integration Compute Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.integrate_pipeline);
            compute_pass.set_bind_group(0, &self.integrate_bind_group, &[]);
            compute_pass.dispatch_workgroups(groups_x, groups_y, 1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Block until every submitted step has finished on the GPU
    pub fn wait(&self) -> Result<(), GpuError> {
        self.device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })?;
        Ok(())
    }

    /// Replace the device-side particles. The count is fixed at construction.
    pub fn upload(&self, particles: &[Particle]) -> Result<(), GpuError> {
        self.check_count(particles.len())?;
        if !particles.is_empty() {
            self.queue
                .write_buffer(&self.particle_buffer, 0, bytemuck::cast_slice(particles));
        }
        Ok(())
    }

    /// Copy the particle buffer back to the CPU, blocking until the GPU is done
    pub fn read_particles(&self) -> Result<Vec<Particle>, GpuError> {
        if self.particle_count == 0 {
            return Ok(Vec::new());
        }

        let size = PARTICLE_SIZE * u64::from(self.particle_count);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Particle Readback Encoder"),
            });
        encoder.copy_buffer_to_buffer(&self.particle_buffer, 0, &self.staging_buffer, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = self.staging_buffer.slice(..size);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            // The receiver only goes away if read_particles already bailed out
            let _ = sender.send(result);
        });
        self.device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })?;
        receiver
            .recv()
            .map_err(|_| GpuError::ReadbackChannelClosed)??;

        let particles = {
            let data = slice.get_mapped_range();
            bytemuck::cast_slice::<u8, Particle>(&data).to_vec()
        };
        self.staging_buffer.unmap();

        Ok(particles)
    }

    /// Upload, step and read back: one synchronous advance of `store`
    pub fn advance_store(&self, store: &mut ParticleStore, dt: f32) -> Result<(), GpuError> {
        self.upload(store.particles())?;
        self.step(dt);
        let particles = self.read_particles()?;
        store.particles_mut().copy_from_slice(&particles);
        Ok(())
    }

    pub fn particle_count(&self) -> u32 {
        self.particle_count
    }

    fn check_count(&self, actual: usize) -> Result<(), GpuError> {
        let expected = self.particle_count as usize;
        if actual != expected {
            return Err(GpuError::ParticleCountMismatch { expected, actual });
        }
        Ok(())
    }
}

/// Largest particle count `limits` can bind and dispatch
fn max_particles(limits: &wgpu::Limits) -> usize {
    let binding = u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size);
    let per_dimension = u64::from(limits.max_compute_workgroups_per_dimension);
    let max = (binding / PARTICLE_SIZE)
        .min(per_dimension * per_dimension * u64::from(WORKGROUP_SIZE))
        .min(u64::from(u32::MAX));
    usize::try_from(max).unwrap_or(usize::MAX)
}

/// Particle count and workgroup grid for `requested` particles on a device
/// with `limits`
fn fit_to_limits(requested: usize, limits: &wgpu::Limits) -> Result<(u32, (u32, u32)), GpuError> {
    let limit = max_particles(limits);
    let too_many = || GpuError::TooManyParticles { requested, limit };
    if requested > limit {
        return Err(too_many());
    }

    let count = u32::try_from(requested).map_err(|_| too_many())?;
    let groups = dispatch_size(count, WORKGROUP_SIZE);
    let grid = workgroup_grid(groups, limits.max_compute_workgroups_per_dimension)
        .ok_or_else(too_many)?;
    Ok((count, grid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downlevel_device_needs_two_rows_for_large_counts() {
        let limits = wgpu::Limits::downlevel_defaults();
        let (count, grid) = fit_to_limits(4_200_000, &limits).unwrap();

        assert_eq!(count, 4_200_000);
        assert_eq!(grid, (limits.max_compute_workgroups_per_dimension, 2));
    }

    #[test]
    fn empty_store_dispatches_nothing() {
        let limits = wgpu::Limits::downlevel_defaults();
        assert_eq!(fit_to_limits(0, &limits).unwrap(), (0, (0, 0)));
    }

    #[test]
    fn storage_binding_caps_the_particle_count() {
        let limits = wgpu::Limits {
            max_storage_buffer_binding_size: 24 * 1_000,
            ..wgpu::Limits::downlevel_defaults()
        };

        assert_eq!(max_particles(&limits), 1_000);
        assert!(fit_to_limits(1_000, &limits).is_ok());
        assert!(matches!(
            fit_to_limits(1_001, &limits),
            Err(GpuError::TooManyParticles {
                requested: 1_001,
                limit: 1_000
            })
        ));
    }

    #[test]
    fn workgroup_limit_caps_the_particle_count() {
        let limits = wgpu::Limits {
            max_compute_workgroups_per_dimension: 4,
            ..wgpu::Limits::downlevel_defaults()
        };

        // 4 x 4 groups of 64 lanes
        assert_eq!(max_particles(&limits), 1_024);
        assert_eq!(fit_to_limits(1_024, &limits).unwrap(), (1_024, (4, 4)));
        assert!(fit_to_limits(1_025, &limits).is_err());
    }
}
