use crate::common::error::Result;
use crate::gpu::Gpu;
use crate::ops::distance_field::layout_entry;
use crate::processing_context::GpuPipeline;

const MASK_SHADER: &str = include_str!("mask.wgsl");

#[derive(Debug)]
pub struct GpuMaskPipeline {
    pub(super) compute_pipeline: wgpu::ComputePipeline,
    pub(super) bind_group_layout: wgpu::BindGroupLayout,
}

impl GpuMaskPipeline {
    pub fn new(ctx: &Gpu) -> Result<Self> {
        let device = ctx.device();

        ctx.scoped(|| {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("mask_shader"),
                source: wgpu::ShaderSource::Wgsl(MASK_SHADER.into()),
            });

            let bind_group_layout =
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("mask_bind_group_layout"),
                    entries: &[
                        layout_entry(0, wgpu::BufferBindingType::Uniform),
                        layout_entry(1, wgpu::BufferBindingType::Storage { read_only: true }),
                        layout_entry(2, wgpu::BufferBindingType::Storage { read_only: false }),
                    ],
                });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("mask_pipeline_layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

            let compute_pipeline =
                device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some("mask_pipeline"),
                    layout: Some(&pipeline_layout),
                    module: &shader,
                    entry_point: Some("main"),
                    compilation_options: Default::default(),
                    cache: None,
                });

            Self {
                compute_pipeline,
                bind_group_layout,
            }
        })
    }
}

impl GpuPipeline for GpuMaskPipeline {}
