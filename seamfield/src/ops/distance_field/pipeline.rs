use super::precision::Precision;
use crate::common::error::Result;
use crate::gpu::Gpu;
use crate::processing_context::GpuPipeline;

const DISTANCE_FIELD_SHADER: &str = include_str!("distance_field.wgsl");

/// Compiled relaxation kernel for one precision tier.
#[derive(Debug)]
pub struct GpuDistanceFieldPipeline {
    pub(super) compute_pipeline: wgpu::ComputePipeline,
    pub(super) bind_group_layout: wgpu::BindGroupLayout,
    precision: Precision,
}

impl GpuDistanceFieldPipeline {
    pub fn new(ctx: &Gpu, precision: Precision) -> Result<Self> {
        let device = ctx.device();
        let source = shader_source(precision);

        ctx.scoped(|| {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("distance_field_shader"),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

            let bind_group_layout =
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("distance_field_bind_group_layout"),
                    entries: &[
                        // Params uniform
                        layout_entry(0, wgpu::BufferBindingType::Uniform),
                        // Source layers
                        layout_entry(1, wgpu::BufferBindingType::Storage { read_only: true }),
                        // Destination layers
                        layout_entry(2, wgpu::BufferBindingType::Storage { read_only: false }),
                        // Change flag
                        layout_entry(3, wgpu::BufferBindingType::Storage { read_only: false }),
                    ],
                });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("distance_field_pipeline_layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

            let compute_pipeline =
                device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some("distance_field_pipeline"),
                    layout: Some(&pipeline_layout),
                    module: &shader,
                    entry_point: Some("main"),
                    compilation_options: Default::default(),
                    cache: None,
                });

            Self {
                compute_pipeline,
                bind_group_layout,
                precision,
            }
        })
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }
}

impl GpuPipeline for GpuDistanceFieldPipeline {}

fn shader_source(precision: Precision) -> String {
    format!(
        "const MAX_VALUE: u32 = {}u;\n{}",
        precision.max_value(),
        DISTANCE_FIELD_SHADER
    )
}

pub(crate) fn layout_entry(binding: u32, ty: wgpu::BufferBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_utils::test_gpu;

    #[test]
    fn test_shader_source_declares_tier_maximum() {
        assert!(shader_source(Precision::Low).starts_with("const MAX_VALUE: u32 = 255u;"));
        assert!(shader_source(Precision::Mid).starts_with("const MAX_VALUE: u32 = 65535u;"));
        assert!(shader_source(Precision::High).starts_with("const MAX_VALUE: u32 = 4294967295u;"));
    }

    #[test]
    fn test_every_tier_compiles() {
        let Some(gpu) = test_gpu() else {
            return;
        };

        for precision in Precision::ALL {
            let pipeline = GpuDistanceFieldPipeline::new(&gpu, precision).unwrap();
            assert_eq!(pipeline.precision(), precision);
        }
    }
}
