use std::fmt;

use super::precision::BetaPolicy;
use crate::common::error::{Error, Result};
use crate::raster::Layer;

/// Edge length of a square compute work group.
pub const WORKGROUP_SIZE: u32 = 16;

/// Default per-pass iteration ceiling.
pub const DEFAULT_MAX_ITERATIONS: u32 = 3000;

/// One of the two layered buffers the propagator alternates between.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PingPong {
    Ping = 0,
    Pong = 1,
}

impl PingPong {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn other(self) -> PingPong {
        match self {
            PingPong::Ping => PingPong::Pong,
            PingPong::Pong => PingPong::Ping,
        }
    }
}

/// Source and destination of a single dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Roles {
    pub read: PingPong,
    pub write: PingPong,
}

impl Roles {
    /// Roles of the `dispatch`-th dispatch of a run, counted across passes.
    ///
    /// Even dispatches read ping and write pong, odd ones the reverse, so the
    /// first read of a pass is always the last write of the previous one.
    pub fn for_dispatch(dispatch: u64) -> Roles {
        let read = if dispatch % 2 == 0 {
            PingPong::Ping
        } else {
            PingPong::Pong
        };

        Roles {
            read,
            write: read.other(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassDirection {
    Vertical,
    Horizontal,
}

impl PassDirection {
    /// Order in which a run executes its passes.
    pub const ORDER: [PassDirection; 2] = [PassDirection::Vertical, PassDirection::Horizontal];

    /// Neighbour offset `(dx, dy)`; the kernel looks at `p + offset` and `p - offset`.
    pub fn offset(self) -> [u32; 2] {
        match self {
            PassDirection::Vertical => [0, 1],
            PassDirection::Horizontal => [1, 0],
        }
    }
}

impl fmt::Display for PassDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassDirection::Vertical => write!(f, "vertical"),
            PassDirection::Horizontal => write!(f, "horizontal"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkGroups {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl WorkGroups {
    /// Grid covering one `width` x `height` layer per z slice, both layers.
    pub fn covering(width: u32, height: u32) -> WorkGroups {
        WorkGroups {
            x: width.div_ceil(WORKGROUP_SIZE),
            y: height.div_ceil(WORKGROUP_SIZE),
            z: 2,
        }
    }
}

/// Per-dispatch kernel parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassUniforms {
    pub offset: [u32; 2],
    pub beta: u32,
}

/// Device side of the propagator.
///
/// Implementations own the ping/pong layered buffers and the change flag.
/// Calls are issued strictly in order: the propagator never dispatches
/// while a previous dispatch may still be running, because it always calls
/// [`FieldKernel::barrier`] before reading the flag.
pub trait FieldKernel {
    /// Writes `words` into `layer` of both ping and pong.
    fn upload(&mut self, layer: Layer, words: &[u32]) -> Result<()>;

    fn reset_change_flag(&mut self) -> Result<()>;

    /// Runs one relaxation step from `roles.read` into `roles.write`.
    fn dispatch(&mut self, roles: Roles, groups: WorkGroups, uniforms: PassUniforms) -> Result<()>;

    /// Blocks until every dispatched write is visible.
    fn barrier(&mut self) -> Result<()>;

    fn read_change_flag(&mut self) -> Result<u32>;

    fn read_layer(&mut self, buffer: PingPong, layer: Layer) -> Result<Vec<u32>>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropagationSettings {
    pub max_iterations: u32,
    pub beta_policy: BetaPolicy,
    /// Saturation value of the tier; beta never exceeds it.
    pub max_value: u32,
}

impl PropagationSettings {
    pub fn beta(&self, iteration: u32) -> u32 {
        self.beta_policy.beta(iteration).min(self.max_value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassReport {
    pub direction: PassDirection,
    /// Dispatches issued by this pass.
    pub iterations: u32,
    /// False when the pass stopped at the iteration ceiling.
    pub converged: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropagationReport {
    pub passes: Vec<PassReport>,
    /// Buffer holding the final distances.
    pub result: PingPong,
}

impl PropagationReport {
    pub fn total_iterations(&self) -> u64 {
        self.passes.iter().map(|p| p.iterations as u64).sum()
    }

    pub fn hit_ceiling(&self) -> bool {
        self.passes.iter().any(|p| !p.converged)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropagatorState {
    Idle,
    PassVertical,
    PassHorizontal,
    Done,
}

impl PropagatorState {
    fn for_pass(direction: PassDirection) -> PropagatorState {
        match direction {
            PassDirection::Vertical => PropagatorState::PassVertical,
            PassDirection::Horizontal => PropagatorState::PassHorizontal,
        }
    }
}

/// Drives the two-pass ping/pong relaxation on a [`FieldKernel`].
#[derive(Debug)]
pub struct Propagator<K> {
    kernel: K,
    width: u32,
    height: u32,
    settings: PropagationSettings,
    state: PropagatorState,
    dispatches: u64,
    passes: Vec<PassReport>,
}

impl<K: FieldKernel> Propagator<K> {
    pub fn new(kernel: K, width: u32, height: u32, settings: PropagationSettings) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Config(format!(
                "cannot propagate over an empty {}x{} layer",
                width, height
            )));
        }
        if settings.max_iterations == 0 {
            return Err(Error::Config(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            kernel,
            width,
            height,
            settings,
            state: PropagatorState::Idle,
            dispatches: 0,
            passes: Vec::with_capacity(PassDirection::ORDER.len()),
        })
    }

    pub fn state(&self) -> PropagatorState {
        self.state
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn into_kernel(self) -> K {
        self.kernel
    }

    /// Seeds ping and pong with the layered source, west then east.
    pub fn upload(&mut self, west: &[u32], east: &[u32]) -> Result<()> {
        assert_eq!(self.state, PropagatorState::Idle, "source already uploaded");
        let layer_len = self.width as usize * self.height as usize;
        assert_eq!(west.len(), layer_len, "west layer size mismatch");
        assert_eq!(east.len(), layer_len, "east layer size mismatch");

        self.kernel.upload(Layer::West, west)?;
        self.kernel.upload(Layer::East, east)?;
        self.state = PropagatorState::PassVertical;

        Ok(())
    }

    /// Runs the vertical then the horizontal pass to convergence or ceiling.
    pub fn run(&mut self) -> Result<PropagationReport> {
        assert_eq!(
            self.state,
            PropagatorState::PassVertical,
            "upload the source before running"
        );

        for direction in PassDirection::ORDER {
            self.state = PropagatorState::for_pass(direction);
            let report = self.run_pass(direction)?;
            self.passes.push(report);
        }
        self.state = PropagatorState::Done;

        Ok(self.report())
    }

    /// Downloads both layers of the buffer the last dispatch wrote.
    pub fn read_result(&mut self) -> Result<[Vec<u32>; 2]> {
        assert_eq!(self.state, PropagatorState::Done, "propagation not finished");

        let buffer = self.last_written();
        let west = self.kernel.read_layer(buffer, Layer::West)?;
        let east = self.kernel.read_layer(buffer, Layer::East)?;

        Ok([west, east])
    }

    pub fn report(&self) -> PropagationReport {
        PropagationReport {
            passes: self.passes.clone(),
            result: self.last_written(),
        }
    }

    fn last_written(&self) -> PingPong {
        // Before any dispatch, ping and pong both hold the source.
        match self.dispatches {
            0 => PingPong::Ping,
            n => Roles::for_dispatch(n - 1).write,
        }
    }

    fn run_pass(&mut self, direction: PassDirection) -> Result<PassReport> {
        let groups = WorkGroups::covering(self.width, self.height);
        let offset = direction.offset();
        let mut iteration = 0;

        loop {
            if iteration == self.settings.max_iterations {
                tracing::warn!(
                    "{} pass hit the iteration ceiling ({}) before converging",
                    direction,
                    self.settings.max_iterations
                );
                return Ok(PassReport {
                    direction,
                    iterations: iteration,
                    converged: false,
                });
            }

            let roles = Roles::for_dispatch(self.dispatches);
            let uniforms = PassUniforms {
                offset,
                beta: self.settings.beta(iteration),
            };

            self.kernel.reset_change_flag()?;
            self.kernel.dispatch(roles, groups, uniforms)?;
            self.kernel.barrier()?;
            let changed = self.kernel.read_change_flag()?;

            self.dispatches += 1;
            iteration += 1;

            tracing::debug!(
                "{} pass iteration {}: beta {}, {:?} -> {:?}, changed {}",
                direction,
                iteration,
                uniforms.beta,
                roles.read,
                roles.write,
                changed
            );

            if changed == 0 {
                tracing::debug!("{} pass converged after {} iterations", direction, iteration);
                return Ok(PassReport {
                    direction,
                    iterations: iteration,
                    converged: true,
                });
            }
        }
    }
}
