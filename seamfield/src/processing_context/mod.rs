mod gpu_context;

pub use gpu_context::{GpuContext, GpuPipeline};

use crate::ops::Backend;
use crate::prelude::*;

/// Owns the optional GPU and its cached pipelines for one batch run.
#[derive(Debug)]
pub struct ProcessingContext {
    gpu_context: Option<GpuContext>,
}

impl ProcessingContext {
    /// Tries to bring up a GPU; stays CPU-only with a warning if none exists.
    pub fn new() -> Self {
        match Gpu::new() {
            Ok(gpu) => Self::with_gpu(GpuContext::new(gpu)),
            Err(e) => {
                tracing::warn!("GPU initialization failed, falling back to CPU: {}", e);
                Self::cpu_only()
            }
        }
    }

    /// Builds the context a requested backend needs.
    ///
    /// `Some(Backend::Cpu)` never touches the GPU. `Some(Backend::Gpu)` fails
    /// with [`Error::NoGpuContext`] when no adapter is available. `None`
    /// behaves like [`ProcessingContext::new`].
    pub fn for_backend(requested: Option<Backend>) -> Result<Self> {
        match requested {
            Some(Backend::Cpu) => Ok(Self::cpu_only()),
            Some(Backend::Gpu) => match Gpu::new() {
                Ok(gpu) => Ok(Self::with_gpu(GpuContext::new(gpu))),
                Err(e) => {
                    tracing::error!("GPU backend requested but unavailable: {}", e);
                    Err(Error::NoGpuContext)
                }
            },
            None => Ok(Self::new()),
        }
    }

    pub fn cpu_only() -> Self {
        Self { gpu_context: None }
    }

    pub fn with_gpu(gpu_context: GpuContext) -> Self {
        Self {
            gpu_context: Some(gpu_context),
        }
    }

    pub fn has_gpu(&self) -> bool {
        self.gpu_context.is_some()
    }

    pub fn gpu(&self) -> Option<&Gpu> {
        self.gpu_context.as_ref().map(|p| p.gpu())
    }

    /// Returns None if no GPU is available.
    pub fn gpu_context(&mut self) -> Option<&mut GpuContext> {
        self.gpu_context.as_mut()
    }
}

impl Default for ProcessingContext {
    fn default() -> Self {
        Self::new()
    }
}
