use thiserror::Error;

/// Things that can go wrong while setting up or talking to the GPU backend
#[derive(Error, Debug)]
pub enum GpuError {
    #[error("No suitable GPU adapter is available")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    #[error("Unable to create the GPU device")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("Failed while waiting for the GPU to finish")]
    Poll(#[from] wgpu::PollError),

    #[error("Unable to map the particle readback buffer")]
    BufferMap(#[from] wgpu::BufferAsyncError),

    #[error("The readback callback was dropped before it reported")]
    ReadbackChannelClosed,

    #[error("{requested} particles exceed the device limit of {limit}")]
    TooManyParticles { requested: usize, limit: usize },

    #[error("Expected {expected} particles but got {actual}")]
    ParticleCountMismatch { expected: usize, actual: usize },
}
