mod cpu;
mod gpu;
mod pipeline;
mod precision;
mod propagator;


pub use cpu::CpuFieldKernel;
pub use gpu::GpuFieldKernel;
pub use pipeline::GpuDistanceFieldPipeline;
pub use precision::{
    BetaPolicy, Precision, rescale, scale_u8_to_u16, scale_u8_to_u32, scale_u16_to_u32,
};
pub use propagator::{
    DEFAULT_MAX_ITERATIONS, FieldKernel, PassDirection, PassReport, PassUniforms, PingPong,
    PropagationReport, PropagationSettings, Propagator, PropagatorState, Roles, WORKGROUP_SIZE,
    WorkGroups,
};

pub(crate) use pipeline::layout_entry;

use super::Backend;
use crate::common::error::{Error, Result};
use crate::gpu::Gpu;
use crate::processing_context::ProcessingContext;
use crate::raster::{Layer, LayerPair, Raster, RasterDesc};

/// Two-pass seam-aware distance field.
///
/// Seeds are pixels with value 0; pixels at the tier maximum are unreached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceField {
    pub precision: Precision,
    pub beta_policy: BetaPolicy,
    /// Per-pass ceiling, at least 1.
    pub max_iterations: u32,
}

/// Distances of both layers plus how the passes went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOutput {
    pub layers: LayerPair,
    pub report: PropagationReport,
}

/// Source layers widened to the tier, ready for upload.
struct PreparedLayers {
    desc: RasterDesc,
    west: Vec<u32>,
    east: Vec<u32>,
}

impl Default for DistanceField {
    fn default() -> Self {
        Self::new(Precision::Mid)
    }
}

impl DistanceField {
    pub fn new(precision: Precision) -> Self {
        Self {
            precision,
            beta_policy: precision.default_beta_policy(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_beta_policy(mut self, beta_policy: BetaPolicy) -> Self {
        self.beta_policy = beta_policy;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn settings(&self) -> PropagationSettings {
        PropagationSettings {
            max_iterations: self.max_iterations,
            beta_policy: self.beta_policy,
            max_value: self.precision.max_value(),
        }
    }

    /// Runs on the backend the context resolves to.
    pub fn execute(
        &self,
        ctx: &mut ProcessingContext,
        backend: Backend,
        layers: LayerPair,
    ) -> Result<FieldOutput> {
        match backend {
            Backend::Cpu => self.apply_cpu(layers),
            Backend::Gpu => {
                // Validate before touching the device.
                let prepared = self.prepare(layers)?;
                let gpu_ctx = ctx.gpu_context().ok_or(Error::NoGpuContext)?;
                let gpu = gpu_ctx.gpu().clone();
                let precision = self.precision;
                let pipeline = gpu_ctx.get_or_create_variant(precision.variant(), |gpu| {
                    GpuDistanceFieldPipeline::new(gpu, precision)
                })?;
                self.run_gpu(&gpu, pipeline, prepared)
            }
        }
    }

    pub fn apply_cpu(&self, layers: LayerPair) -> Result<FieldOutput> {
        let prepared = self.prepare(layers)?;
        let desc = prepared.desc;
        let kernel = CpuFieldKernel::new(desc.width, desc.height, self.precision.max_value());
        self.run(kernel, prepared)
    }

    pub fn apply_gpu(
        &self,
        ctx: &Gpu,
        pipeline: &GpuDistanceFieldPipeline,
        layers: LayerPair,
    ) -> Result<FieldOutput> {
        let prepared = self.prepare(layers)?;
        self.run_gpu(ctx, pipeline, prepared)
    }

    fn run_gpu(
        &self,
        ctx: &Gpu,
        pipeline: &GpuDistanceFieldPipeline,
        prepared: PreparedLayers,
    ) -> Result<FieldOutput> {
        assert_eq!(
            pipeline.precision(),
            self.precision,
            "pipeline compiled for another precision"
        );
        let kernel = GpuFieldKernel::new(ctx, pipeline, prepared.desc)?;
        self.run(kernel, prepared)
    }

    fn prepare(&self, layers: LayerPair) -> Result<PreparedLayers> {
        let source = *layers.desc();
        if source.width == 0 || source.height == 0 {
            return Err(Error::Config(format!(
                "cannot build a distance field over an empty {}x{} layer",
                source.width, source.height
            )));
        }
        if self.max_iterations == 0 {
            return Err(Error::Config("max_iterations must be at least 1".to_string()));
        }

        let target = self.precision.sample_format();
        let [west, east] = layers.into_layers();
        let west = rescale(west.samples(), target)?;
        let east = rescale(east.samples(), target)?;

        Ok(PreparedLayers {
            desc: source.with_sample_format(target),
            west,
            east,
        })
    }

    fn run<K: FieldKernel>(&self, kernel: K, prepared: PreparedLayers) -> Result<FieldOutput> {
        let PreparedLayers { desc, west, east } = prepared;

        tracing::debug!(
            "distance field {}x{} per layer, {}, {:?} beta",
            desc.width,
            desc.height,
            self.precision,
            self.beta_policy
        );

        let mut propagator = Propagator::new(kernel, desc.width, desc.height, self.settings())?;
        propagator.upload(&west, &east)?;
        drop((west, east));

        let report = propagator.run()?;
        let [west, east] = propagator.read_result()?;

        tracing::debug!(
            "propagation finished after {} iterations, result in {:?}",
            report.total_iterations(),
            report.result
        );

        let layers = LayerPair::new(
            Raster::from_words(desc, &west)?,
            Raster::from_words(desc, &east)?,
        )?;

        Ok(FieldOutput { layers, report })
    }
}

impl FieldOutput {
    pub fn layer(&self, layer: Layer) -> &Raster {
        self.layers.layer(layer)
    }
}
