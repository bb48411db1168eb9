use super::propagator::{FieldKernel, PassUniforms, PingPong, Roles, WorkGroups, WORKGROUP_SIZE};
use crate::common::error::Result;
use crate::raster::Layer;

/// Host implementation of the relaxation kernel.
///
/// Computes exactly what the compute shader computes, one pixel at a time.
#[derive(Debug, Clone)]
pub struct CpuFieldKernel {
    width: u32,
    height: u32,
    max_value: u32,
    buffers: [Vec<u32>; 2],
    change_flag: u32,
}

impl CpuFieldKernel {
    pub fn new(width: u32, height: u32, max_value: u32) -> Self {
        let len = width as usize * height as usize * 2;
        Self {
            width,
            height,
            max_value,
            buffers: [vec![max_value; len], vec![max_value; len]],
            change_flag: 0,
        }
    }

    fn layer_len(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl FieldKernel for CpuFieldKernel {
    fn upload(&mut self, layer: Layer, words: &[u32]) -> Result<()> {
        let len = self.layer_len();
        assert_eq!(words.len(), len, "layer size mismatch");

        let start = layer.index() * len;
        for buffer in self.buffers.iter_mut() {
            buffer[start..start + len].copy_from_slice(words);
        }

        Ok(())
    }

    fn reset_change_flag(&mut self) -> Result<()> {
        self.change_flag = 0;
        Ok(())
    }

    fn dispatch(&mut self, roles: Roles, groups: WorkGroups, uniforms: PassUniforms) -> Result<()> {
        assert_ne!(roles.read, roles.write, "dispatch must not read its destination");

        let (width, height, max_value) = (self.width, self.height, self.max_value);
        let [ping, pong] = &mut self.buffers;
        let (src, dst) = match roles.read {
            PingPong::Ping => (&*ping, pong),
            PingPong::Pong => (&*pong, ping),
        };

        let x_end = (groups.x * WORKGROUP_SIZE).min(width);
        let y_end = (groups.y * WORKGROUP_SIZE).min(height);
        let layers = (groups.z as usize).min(Layer::ALL.len());

        for layer in &Layer::ALL[..layers] {
            for y in 0..y_end {
                for x in 0..x_end {
                    let index = word_index(width, height, *layer, x, y);
                    let value = relax(src, width, height, *layer, x, y, uniforms, max_value);
                    dst[index] = value;
                    if value != src[index] {
                        self.change_flag = 1;
                    }
                }
            }
        }

        Ok(())
    }

    fn barrier(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_change_flag(&mut self) -> Result<u32> {
        Ok(self.change_flag)
    }

    fn read_layer(&mut self, buffer: PingPong, layer: Layer) -> Result<Vec<u32>> {
        let len = self.layer_len();
        let start = layer.index() * len;
        Ok(self.buffers[buffer.index()][start..start + len].to_vec())
    }
}

fn word_index(width: u32, height: u32, layer: Layer, x: u32, y: u32) -> usize {
    (layer.index() * height as usize + y as usize) * width as usize + x as usize
}

/// New value of pixel `(x, y)` of `layer` given the source buffer.
///
/// Neighbours are `p + offset` and `p - offset`. Rows stop at the top and
/// bottom edges; columns continue across the seam into the other layer.
/// A neighbour closer than `beta` to the maximum is skipped so the sum
/// cannot overflow the tier.
#[allow(clippy::too_many_arguments)]
pub(super) fn relax(
    src: &[u32],
    width: u32,
    height: u32,
    layer: Layer,
    x: u32,
    y: u32,
    uniforms: PassUniforms,
    max_value: u32,
) -> u32 {
    let current = src[word_index(width, height, layer, x, y)];
    let [dx, dy] = uniforms.offset;
    let beta = uniforms.beta;

    let forward = step(width, height, layer, x, y, dx, dy, true);
    let backward = step(width, height, layer, x, y, dx, dy, false);

    let mut best = current;
    for (n_layer, nx, ny) in forward.into_iter().chain(backward) {
        let neighbour = src[word_index(width, height, n_layer, nx, ny)];
        if beta <= max_value && neighbour <= max_value - beta {
            best = best.min(neighbour + beta);
        }
    }

    best
}

#[allow(clippy::too_many_arguments)]
fn step(
    width: u32,
    height: u32,
    layer: Layer,
    x: u32,
    y: u32,
    dx: u32,
    dy: u32,
    forward: bool,
) -> Option<(Layer, u32, u32)> {
    let ny = if forward {
        let ny = y + dy;
        if ny >= height {
            return None;
        }
        ny
    } else {
        y.checked_sub(dy)?
    };

    let (n_layer, nx) = if forward {
        let nx = x + dx;
        if nx >= width {
            (layer.other(), nx - width)
        } else {
            (layer, nx)
        }
    } else if x < dx {
        (layer.other(), x + width - dx)
    } else {
        (layer, x - dx)
    };

    Some((n_layer, nx, ny))
}
