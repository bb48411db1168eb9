use wgpu::util::DeviceExt;

use super::pipeline::GpuMaskPipeline;
use crate::common::error::Result;
use crate::gpu::{Gpu, GpuLayers};
use crate::ops::distance_field::WorkGroups;
use crate::raster::{Layer, LayerPair, Raster, SampleFormat};

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Params {
    width: u32,
    height: u32,
    threshold: u32,
    invert: u32,
}

pub(super) fn apply(
    ctx: &Gpu,
    pipeline: &GpuMaskPipeline,
    layers: &LayerPair,
    threshold: u32,
    invert: bool,
) -> Result<LayerPair> {
    let device = ctx.device();
    let queue = ctx.queue();

    let source_desc = *layers.desc();
    let output_desc = source_desc.with_sample_format(SampleFormat::U8);

    let output = ctx.scoped(|| {
        let input = GpuLayers::from_words(ctx, source_desc, &layers.to_words());
        let mut output = GpuLayers::new_empty(ctx, output_desc);

        let params = Params {
            width: source_desc.width,
            height: source_desc.height,
            threshold,
            invert: invert as u32,
        };
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mask_params_buffer"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mask_bind_group"),
            layout: &pipeline.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: input.read_buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: output.write_buffer().as_entire_binding(),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("mask_encoder"),
        });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("mask_pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&pipeline.compute_pipeline);
            compute_pass.set_bind_group(0, &bind_group, &[]);
            let groups = WorkGroups::covering(source_desc.width, source_desc.height);
            compute_pass.dispatch_workgroups(groups.x, groups.y, groups.z);
        }

        queue.submit(std::iter::once(encoder.finish()));
        output
    })?;

    ctx.wait()?;

    let west = Raster::from_words(output_desc, &output.read_layer(ctx, Layer::West)?)?;
    let east = Raster::from_words(output_desc, &output.read_layer(ctx, Layer::East)?)?;

    LayerPair::new(west, east)
}
