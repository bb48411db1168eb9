use std::any::{Any, TypeId};

use hashbrown::HashMap;

use crate::prelude::*;

/// Trait marker for GPU pipelines that can be cached.
pub trait GpuPipeline: Any + std::fmt::Debug + Send + Sync {}

/// Cache for GPU pipelines.
///
/// Lazily initializes pipelines on first use. Pipelines are stored by their
/// TypeId and a variant key, so one pipeline type can hold several compiled
/// kernel variants (one per precision tier).
#[derive(Debug)]
pub struct GpuContext {
    gpu: Gpu,
    pipelines: HashMap<(TypeId, u32), Box<dyn GpuPipeline>>,
}

impl GpuContext {
    pub fn new(gpu: Gpu) -> Self {
        Self {
            gpu,
            pipelines: HashMap::new(),
        }
    }

    /// Returns the pipeline of type T, creating it with the provided function if needed.
    pub fn get_or_create<T, F>(&mut self, create: F) -> Result<&T>
    where
        T: GpuPipeline,
        F: FnOnce(&Gpu) -> Result<T>,
    {
        self.get_or_create_variant(0, create)
    }

    /// Same as [`Self::get_or_create`] for one of several variants of T.
    pub fn get_or_create_variant<T, F>(&mut self, variant: u32, create: F) -> Result<&T>
    where
        T: GpuPipeline,
        F: FnOnce(&Gpu) -> Result<T>,
    {
        let key = (TypeId::of::<T>(), variant);

        if !self.pipelines.contains_key(&key) {
            let pipeline = create(&self.gpu)?;
            self.pipelines.insert(key, Box::new(pipeline));
        }

        self.pipelines
            .get(&key)
            .and_then(|p| (p.as_ref() as &dyn Any).downcast_ref::<T>())
            .ok_or_else(|| Error::Config("pipeline cache holds a mismatched type".to_string()))
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Returns a reference to the GPU context.
    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }
}
