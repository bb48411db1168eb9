mod common;
mod gpu;
mod ops;
mod processing_context;
mod raster;

pub mod config;
pub mod pipeline;
pub mod prelude;

pub use prelude::*;
