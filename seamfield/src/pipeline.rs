use std::path::{Path, PathBuf};

use crate::common::error::Result;
use crate::config::Config;
use crate::ops::{Backend, FieldOutput, Precision, PropagationReport, select_backend};
use crate::processing_context::ProcessingContext;
use crate::raster::{FormatRegistry, Layer, LayerPair, Raster};

/// Files written by one run, west layer first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFiles {
    pub paths: [PathBuf; 2],
    /// Present for distance fields.
    pub report: Option<PropagationReport>,
}

/// `mask{W}_{i}.png`, `W` being the seam-joined width of both layers.
pub fn mask_file_name(layer_width: u32, layer: Layer) -> String {
    format!("mask{}_{}.png", layer_width * 2, layer.index())
}

/// `distance_field{W}_{i}.{ext}`
pub fn distance_field_file_name(layer_width: u32, layer: Layer, extension: &str) -> String {
    format!(
        "distance_field{}_{}.{}",
        layer_width * 2,
        layer.index(),
        extension
    )
}

/// Loads west/east sources, runs one operation and writes one file per layer.
///
/// The processing context is created on the first operation, after the
/// sources have been validated, so bad input never touches the device.
#[derive(Debug)]
pub struct FieldGenerator {
    config: Config,
    registry: FormatRegistry,
    ctx: Option<(ProcessingContext, Backend)>,
}

impl FieldGenerator {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let registry = config.format_registry();

        Ok(Self {
            config,
            registry,
            ctx: None,
        })
    }

    /// Uses an existing context instead of creating one on demand.
    pub fn with_context(config: Config, ctx: ProcessingContext) -> Result<Self> {
        let mut generator = Self::new(config)?;
        let backend = select_backend(&ctx, generator.config.backend)?;
        generator.ctx = Some((ctx, backend));
        Ok(generator)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// Reads and validates a west/east pair.
    ///
    /// Extensions are compared before either file is decoded.
    pub fn load_pair(&self, west: &Path, east: &Path) -> Result<LayerPair> {
        self.registry.resolve_pair(west, east)?;

        let west = Raster::read_file(west, &self.registry)?;
        let east = Raster::read_file(east, &self.registry)?;

        LayerPair::new(west, east)
    }

    pub fn generate_mask(&mut self, west: &Path, east: &Path) -> Result<GeneratedFiles> {
        tracing::info!("Generating mask");

        let layers = self.load_pair(west, east)?;
        let width = layers.desc().width;

        let extractor = self.config.mask_extractor();
        let (ctx, backend) = self.context()?;
        let mask = extractor.execute(ctx, backend, &layers)?;
        drop(layers);

        let paths = Layer::ALL.map(|layer| self.output_path(&mask_file_name(width, layer)));
        self.save(&mask, &paths)?;

        Ok(GeneratedFiles {
            paths,
            report: None,
        })
    }

    pub fn generate_distance_field(
        &mut self,
        west: &Path,
        east: &Path,
        precision: Precision,
    ) -> Result<GeneratedFiles> {
        tracing::info!("Generating distance field ({})", precision);

        let layers = self.load_pair(west, east)?;
        let width = layers.desc().width;

        let field = self.config.distance_field(precision);
        let (ctx, backend) = self.context()?;
        let FieldOutput { layers, report } = field.execute(ctx, backend, layers)?;

        if report.hit_ceiling() {
            tracing::warn!(
                "distance field did not fully converge within {} iterations per pass",
                field.max_iterations
            );
        }

        let extension = self.config.extension(precision);
        let paths = Layer::ALL
            .map(|layer| self.output_path(&distance_field_file_name(width, layer, &extension)));
        self.save(&layers, &paths)?;

        Ok(GeneratedFiles {
            paths,
            report: Some(report),
        })
    }

    fn context(&mut self) -> Result<(&mut ProcessingContext, Backend)> {
        let (ctx, backend) = match &mut self.ctx {
            Some(entry) => entry,
            slot => {
                let ctx = ProcessingContext::for_backend(self.config.backend)?;
                let backend = select_backend(&ctx, self.config.backend)?;
                tracing::debug!("running on the {:?} backend", backend);
                slot.insert((ctx, backend))
            }
        };

        Ok((ctx, *backend))
    }

    fn output_path(&self, file_name: &str) -> PathBuf {
        self.config.output_dir.join(file_name)
    }

    /// Writes both layers; on failure removes whatever was already written.
    fn save(&self, layers: &LayerPair, paths: &[PathBuf; 2]) -> Result<()> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        for (i, layer) in Layer::ALL.into_iter().enumerate() {
            tracing::info!("Saving to {}", paths[i].display());
            if let Err(e) = layers.layer(layer).save_file(&paths[i], &self.registry) {
                for written in &paths[..i] {
                    let _ = std::fs::remove_file(written);
                }
                return Err(e);
            }
        }

        Ok(())
    }
}
