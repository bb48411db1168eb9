mod backend_selection;
pub(crate) mod distance_field;
pub(crate) mod mask;

pub use backend_selection::{Backend, select_backend};
pub use distance_field::{
    BetaPolicy, CpuFieldKernel, DEFAULT_MAX_ITERATIONS, DistanceField, FieldKernel, FieldOutput,
    GpuDistanceFieldPipeline, GpuFieldKernel, PassDirection, PassReport, PassUniforms, PingPong,
    Precision, PropagationReport, PropagationSettings, Propagator, PropagatorState, Roles,
    WORKGROUP_SIZE, WorkGroups, rescale, scale_u8_to_u16, scale_u8_to_u32, scale_u16_to_u32,
};
pub use mask::{GpuMaskPipeline, MaskExtractor};
