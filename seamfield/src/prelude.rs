// Error handling
pub use crate::common::{Error, Result};

// Rasters and I/O
pub use crate::raster::{
    ContainerFormat, FormatRegistry, Layer, LayerPair, Raster, RasterDesc, SampleFormat, Samples,
};

// Context and cached pipelines
pub use crate::processing_context::{GpuContext, GpuPipeline, ProcessingContext};

// Operations
pub use crate::ops::{
    Backend, BetaPolicy, CpuFieldKernel, DEFAULT_MAX_ITERATIONS, DistanceField, FieldKernel,
    FieldOutput, GpuDistanceFieldPipeline, GpuFieldKernel, GpuMaskPipeline, MaskExtractor,
    PassDirection, PassReport, PassUniforms, PingPong, Precision, PropagationReport,
    PropagationSettings, Propagator, PropagatorState, Roles, WORKGROUP_SIZE, WorkGroups,
    rescale, scale_u8_to_u16, scale_u8_to_u32, scale_u16_to_u32, select_backend,
};

// Batch driver
pub use crate::config::{Config, MaskConfig, TierConfig};
pub use crate::pipeline::{FieldGenerator, GeneratedFiles};

// GPU
pub use crate::gpu::{ChangeFlag, Gpu, GpuLayers, ReadBuffer, WriteBuffer};
