use crate::gpu::Gpu;

/// Returns a GPU, or None on machines without a usable adapter.
pub(crate) fn test_gpu() -> Option<Gpu> {
    match Gpu::new() {
        Ok(gpu) => Some(gpu),
        Err(e) => {
            eprintln!("skipping GPU test, no adapter available: {}", e);
            None
        }
    }
}
