use super::pipeline::GpuDistanceFieldPipeline;
use super::propagator::{FieldKernel, PassUniforms, PingPong, Roles, WorkGroups};
use crate::common::error::Result;
use crate::gpu::{ChangeFlag, Gpu, GpuLayers};
use crate::raster::{Layer, RasterDesc};

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Params {
    width: u32,
    height: u32,
    offset_x: u32,
    offset_y: u32,
    beta: u32,
    _padding: [u32; 3],
}

/// Relaxation kernel running on the device.
///
/// Owns the ping/pong layered buffers and the change flag. One bind group is
/// built per dispatch parity, indexed by the buffer being read.
#[derive(Debug)]
pub struct GpuFieldKernel<'a> {
    ctx: &'a Gpu,
    pipeline: &'a GpuDistanceFieldPipeline,
    desc: RasterDesc,
    buffers: [GpuLayers; 2],
    change_flag: ChangeFlag,
    params_buffer: wgpu::Buffer,
    bind_groups: [wgpu::BindGroup; 2],
}

impl<'a> GpuFieldKernel<'a> {
    /// Allocates ping, pong and the change flag for layers described by `desc`.
    pub fn new(ctx: &'a Gpu, pipeline: &'a GpuDistanceFieldPipeline, desc: RasterDesc) -> Result<Self> {
        let device = ctx.device();

        ctx.scoped(|| {
            let mut ping = GpuLayers::new_empty(ctx, desc);
            let mut pong = GpuLayers::new_empty(ctx, desc);
            let mut change_flag = ChangeFlag::new(ctx);

            let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("distance_field_params_buffer"),
                size: std::mem::size_of::<Params>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });

            let read_ping = bind_group(
                ctx,
                pipeline,
                &params_buffer,
                &ping,
                &mut pong,
                &mut change_flag,
            );
            let read_pong = bind_group(
                ctx,
                pipeline,
                &params_buffer,
                &pong,
                &mut ping,
                &mut change_flag,
            );

            Self {
                ctx,
                pipeline,
                desc,
                buffers: [ping, pong],
                change_flag,
                params_buffer,
                bind_groups: [read_ping, read_pong],
            }
        })
    }
}

fn bind_group(
    ctx: &Gpu,
    pipeline: &GpuDistanceFieldPipeline,
    params_buffer: &wgpu::Buffer,
    src: &GpuLayers,
    dst: &mut GpuLayers,
    change_flag: &mut ChangeFlag,
) -> wgpu::BindGroup {
    ctx.device().create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("distance_field_bind_group"),
        layout: &pipeline.bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: src.read_buffer().as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: dst.write_buffer().as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: change_flag.write_buffer().as_entire_binding(),
            },
        ],
    })
}

impl FieldKernel for GpuFieldKernel<'_> {
    fn upload(&mut self, layer: Layer, words: &[u32]) -> Result<()> {
        let ctx = self.ctx;
        let buffers = &self.buffers;
        ctx.scoped(|| {
            for buffer in buffers {
                buffer.upload_layer(ctx, layer, words);
            }
        })
    }

    fn reset_change_flag(&mut self) -> Result<()> {
        let ctx = self.ctx;
        let change_flag = &mut self.change_flag;
        ctx.scoped(|| change_flag.reset(ctx))
    }

    fn dispatch(&mut self, roles: Roles, groups: WorkGroups, uniforms: PassUniforms) -> Result<()> {
        assert_ne!(roles.read, roles.write, "dispatch must not read its destination");

        let ctx = self.ctx;
        let device = ctx.device();
        let queue = ctx.queue();

        let params = Params {
            width: self.desc.width,
            height: self.desc.height,
            offset_x: uniforms.offset[0],
            offset_y: uniforms.offset[1],
            beta: uniforms.beta,
            _padding: [0; 3],
        };
        let bind_group = &self.bind_groups[roles.read.index()];
        let pipeline = self.pipeline;
        let params_buffer = &self.params_buffer;

        ctx.scoped(|| {
            queue.write_buffer(params_buffer, 0, bytemuck::bytes_of(&params));

            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("distance_field_encoder"),
            });

            {
                let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("distance_field_pass"),
                    timestamp_writes: None,
                });
                compute_pass.set_pipeline(&pipeline.compute_pipeline);
                compute_pass.set_bind_group(0, bind_group, &[]);
                compute_pass.dispatch_workgroups(groups.x, groups.y, groups.z);
            }

            queue.submit(std::iter::once(encoder.finish()));
        })
    }

    fn barrier(&mut self) -> Result<()> {
        self.ctx.wait()
    }

    fn read_change_flag(&mut self) -> Result<u32> {
        self.change_flag.read(self.ctx)
    }

    fn read_layer(&mut self, buffer: PingPong, layer: Layer) -> Result<Vec<u32>> {
        self.buffers[buffer.index()].read_layer(self.ctx, layer)
    }
}
