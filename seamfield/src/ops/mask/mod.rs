mod cpu;
mod gpu;
mod pipeline;

pub use pipeline::GpuMaskPipeline;

use super::Backend;
use crate::common::error::{Error, Result};
use crate::gpu::Gpu;
use crate::processing_context::ProcessingContext;
use crate::raster::{LayerPair, SampleFormat};

pub(crate) const MASK_ON: u32 = 255;
pub(crate) const MASK_OFF: u32 = 0;

/// Thresholds both layers of a layered source into an 8-bit binary mask.
///
/// A pixel becomes 255 when its value is strictly above the threshold and 0
/// otherwise; `invert` swaps the two.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaskExtractor {
    /// Defaults to half of the source range.
    pub threshold: Option<u32>,
    pub invert: bool,
}

impl MaskExtractor {
    pub fn new(threshold: Option<u32>, invert: bool) -> Self {
        Self { threshold, invert }
    }

    pub fn threshold_for(&self, sample_format: SampleFormat) -> u32 {
        self.threshold.unwrap_or(sample_format.max_value() / 2)
    }

    pub fn execute(
        &self,
        ctx: &mut ProcessingContext,
        backend: Backend,
        layers: &LayerPair,
    ) -> Result<LayerPair> {
        match backend {
            Backend::Cpu => self.apply_cpu(layers),
            Backend::Gpu => {
                let gpu_ctx = ctx.gpu_context().ok_or(Error::NoGpuContext)?;
                let gpu = gpu_ctx.gpu().clone();
                let pipeline = gpu_ctx.get_or_create(GpuMaskPipeline::new)?;
                self.apply_gpu(&gpu, pipeline, layers)
            }
        }
    }

    pub fn apply_cpu(&self, layers: &LayerPair) -> Result<LayerPair> {
        let threshold = self.threshold_for(layers.desc().sample_format);
        cpu::apply(layers, threshold, self.invert)
    }

    pub fn apply_gpu(
        &self,
        ctx: &Gpu,
        pipeline: &GpuMaskPipeline,
        layers: &LayerPair,
    ) -> Result<LayerPair> {
        let threshold = self.threshold_for(layers.desc().sample_format);
        gpu::apply(ctx, pipeline, layers, threshold, self.invert)
    }
}
