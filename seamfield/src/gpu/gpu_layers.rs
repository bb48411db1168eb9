use std::sync::mpsc;

use wgpu::util::DeviceExt;

use super::Gpu;
use crate::common::{Error, Result};
use crate::raster::{Layer, RasterDesc};

const WORD_SIZE: u64 = std::mem::size_of::<u32>() as u64;

/// Wrapper for read-only buffer access.
#[derive(Debug)]
pub struct ReadBuffer<'a>(pub(crate) &'a wgpu::Buffer);

impl ReadBuffer<'_> {
    /// Returns the entire buffer as a binding resource.
    pub fn as_entire_binding(&self) -> wgpu::BindingResource<'_> {
        self.0.as_entire_binding()
    }
}

/// Wrapper for writable buffer access.
#[derive(Debug)]
pub struct WriteBuffer<'a>(pub(crate) &'a wgpu::Buffer);

impl WriteBuffer<'_> {
    /// Returns the entire buffer as a binding resource.
    pub fn as_entire_binding(&self) -> wgpu::BindingResource<'_> {
        self.0.as_entire_binding()
    }
}

/// Two raster layers stored on the GPU as one storage buffer of 32-bit words.
///
/// Layout is layer-major, then row-major within a layer. `desc` describes a
/// single layer; its sample format is the width the words are read back as.
#[derive(Debug)]
pub struct GpuLayers {
    buffer: wgpu::Buffer,
    desc: RasterDesc,
}

impl GpuLayers {
    /// Uploads `words` (both layers, layer-major) into a new buffer.
    pub fn from_words(ctx: &Gpu, desc: RasterDesc, words: &[u32]) -> Self {
        assert_eq!(
            words.len(),
            desc.pixel_count() * 2,
            "layered upload must cover both layers"
        );

        let buffer = ctx
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("gpu_layers_buffer"),
                contents: bytemuck::cast_slice(words),
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
            });

        Self { buffer, desc }
    }

    /// Creates a zero-filled layered buffer.
    pub fn new_empty(ctx: &Gpu, desc: RasterDesc) -> Self {
        let buffer = ctx.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("gpu_layers_buffer"),
            size: desc.pixel_count() as u64 * 2 * WORD_SIZE,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self { buffer, desc }
    }

    /// Overwrites one layer.
    pub fn upload_layer(&self, ctx: &Gpu, layer: Layer, words: &[u32]) {
        assert_eq!(words.len(), self.desc.pixel_count(), "layer size mismatch");

        ctx.queue().write_buffer(
            &self.buffer,
            self.layer_offset(layer),
            bytemuck::cast_slice(words),
        );
    }

    /// Downloads one layer to the host. Blocks until the copy completes.
    pub fn read_layer(&self, ctx: &Gpu, layer: Layer) -> Result<Vec<u32>> {
        read_words(ctx, &self.buffer, self.layer_offset(layer), self.layer_size())
    }

    /// Returns the per-layer descriptor.
    pub fn desc(&self) -> &RasterDesc {
        &self.desc
    }

    /// Returns a read-only buffer wrapper for binding in shaders.
    pub fn read_buffer(&self) -> ReadBuffer<'_> {
        ReadBuffer(&self.buffer)
    }

    /// Returns a writable buffer wrapper for binding in shaders.
    ///
    /// Note: `&mut self` is intentional to prevent accidental writes to non-mutable buffers.
    pub fn write_buffer(&mut self) -> WriteBuffer<'_> {
        WriteBuffer(&self.buffer)
    }

    fn layer_size(&self) -> u64 {
        self.desc.pixel_count() as u64 * WORD_SIZE
    }

    fn layer_offset(&self, layer: Layer) -> u64 {
        layer.index() as u64 * self.layer_size()
    }
}

/// Single shared counter the distance kernel raises when it changes a pixel.
#[derive(Debug)]
pub struct ChangeFlag {
    buffer: wgpu::Buffer,
}

impl ChangeFlag {
    pub fn new(ctx: &Gpu) -> Self {
        let buffer = ctx
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("change_flag_buffer"),
                contents: bytemuck::bytes_of(&0u32),
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
            });

        Self { buffer }
    }

    pub fn reset(&self, ctx: &Gpu) {
        ctx.queue()
            .write_buffer(&self.buffer, 0, bytemuck::bytes_of(&0u32));
    }

    /// Reads the flag back to the host. Blocks until the copy completes.
    pub fn read(&self, ctx: &Gpu) -> Result<u32> {
        let words = read_words(ctx, &self.buffer, 0, WORD_SIZE)?;
        Ok(words[0])
    }

    pub fn write_buffer(&mut self) -> WriteBuffer<'_> {
        WriteBuffer(&self.buffer)
    }
}

fn read_words(ctx: &Gpu, source: &wgpu::Buffer, offset: u64, size: u64) -> Result<Vec<u32>> {
    let staging_buffer = ctx.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some("gpu_layers_staging"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = ctx
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("gpu_layers_download_encoder"),
        });
    encoder.copy_buffer_to_buffer(source, offset, &staging_buffer, 0, size);
    ctx.queue().submit(std::iter::once(encoder.finish()));

    let (sender, receiver) = mpsc::channel();
    let buffer_slice = staging_buffer.slice(..);
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });

    ctx.wait()?;

    receiver
        .recv()
        .map_err(|e| Error::Device(format!("buffer map callback dropped: {}", e)))?
        .map_err(|e| Error::Device(e.to_string()))?;

    let data = buffer_slice.get_mapped_range();
    let words: Vec<u32> = bytemuck::cast_slice(&data).to_vec();
    drop(data);
    staging_buffer.unmap();

    Ok(words)
}
