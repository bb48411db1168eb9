mod gpu_layers;

use std::sync::Arc;

pub use self::gpu_layers::{ChangeFlag, GpuLayers, ReadBuffer, WriteBuffer};

use crate::common::{Error, Result};

/// GPU context holding wgpu device and queue for compute operations.
#[derive(Debug, Clone)]
pub struct Gpu {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
}

impl Gpu {
    /// Creates a new GPU context on the high-performance adapter, with its
    /// storage binding and buffer size limits.
    pub fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| Error::Device(format!("failed to find suitable GPU adapter: {}", e)))?;

        // Full-resolution layered buffers exceed the default 128 MiB binding.
        let adapter_limits = adapter.limits();
        let limits = wgpu::Limits {
            max_storage_buffer_binding_size: adapter_limits.max_storage_buffer_binding_size,
            max_buffer_size: adapter_limits.max_buffer_size,
            ..Default::default()
        };

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("seamfield_device"),
            required_limits: limits,
            ..Default::default()
        }))
        .map_err(|e| Error::Device(format!("failed to create device: {}", e)))?;

        device.on_uncaptured_error(Box::new(|err| {
            tracing::error!("uncaptured GPU error: {}", err);
        }));

        let info = adapter.get_info();
        tracing::debug!("using GPU adapter {} ({:?})", info.name, info.backend);

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }

    /// Returns a reference to the wgpu device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the wgpu queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Blocks until every submitted command buffer has completed.
    pub fn wait(&self) -> Result<()> {
        self.device
            .poll(wgpu::PollType::Wait)
            .map(|_| ())
            .map_err(|e| Error::Device(e.to_string()))
    }

    /// Runs `f` inside validation and out-of-memory error scopes.
    ///
    /// Any error the device reports for the calls made by `f` becomes
    /// [`Error::Device`].
    pub fn scoped<T>(&self, f: impl FnOnce() -> T) -> Result<T> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let value = f();

        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());

        match validation.or(out_of_memory) {
            Some(err) => Err(err.into()),
            None => Ok(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_utils::test_gpu;

    #[test]
    fn test_gpu_context_creation() {
        let result = Gpu::new();
        if let Err(e) = &result {
            eprintln!(
                "GPU context creation failed (expected on headless systems): {}",
                e
            );
            return;
        }
        let gpu = result.unwrap();
        gpu.wait().unwrap();
    }

    #[test]
    fn test_scoped_reports_validation_errors() {
        let Some(gpu) = test_gpu() else {
            return;
        };

        // A MAP_READ buffer may only be combined with COPY_DST.
        let result = gpu.scoped(|| {
            gpu.device().create_buffer(&wgpu::BufferDescriptor {
                label: Some("invalid_usage"),
                size: 4,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::STORAGE,
                mapped_at_creation: false,
            })
        });
        assert!(matches!(result, Err(Error::Device(_))));
    }
}
