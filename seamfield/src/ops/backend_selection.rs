use serde::{Deserialize, Serialize};

use crate::common::error::{Error, Result};
use crate::processing_context::ProcessingContext;

/// Where a kernel runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Cpu,
    Gpu,
}

/// Selects the backend for an operation.
///
/// An explicit request is honoured or rejected; otherwise the GPU is used
/// whenever the context has one.
pub fn select_backend(ctx: &ProcessingContext, requested: Option<Backend>) -> Result<Backend> {
    match requested {
        Some(Backend::Gpu) if !ctx.has_gpu() => Err(Error::NoGpuContext),
        Some(backend) => Ok(backend),
        None if ctx.has_gpu() => Ok(Backend::Gpu),
        None => Ok(Backend::Cpu),
    }
}
