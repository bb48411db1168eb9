use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use seamfield::{Backend, Config, Precision};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// YAML configuration file; flags below override it
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base log level, unless RUST_LOG is set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Directory for rolling log files
    #[arg(long, global = true, default_value = "logs")]
    pub log_dir: PathBuf,

    /// Directory the generated rasters are written to
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Compute backend; defaults to the GPU when one is available
    #[arg(long, global = true, value_enum)]
    pub backend: Option<BackendArg>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Threshold a west/east source pair into two 8-bit masks
    Mask {
        /// West (layer 0) source raster
        west: PathBuf,
        /// East (layer 1) source raster
        east: PathBuf,
        /// Values strictly above this become 255 (default: half of the sample range)
        #[arg(long)]
        threshold: Option<u32>,
        /// Swap the two classes
        #[arg(long)]
        invert: bool,
    },
    /// Compute the seam-aware distance field of a west/east mask pair
    Distance {
        /// West (layer 0) mask
        west: PathBuf,
        /// East (layer 1) mask
        east: PathBuf,
        #[arg(long, value_enum, default_value_t = PrecisionArg::Mid)]
        precision: PrecisionArg,
        /// Per-pass iteration ceiling
        #[arg(long)]
        max_iterations: Option<u32>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Gpu,
    Cpu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PrecisionArg {
    Low,
    Mid,
    High,
}

impl From<BackendArg> for Backend {
    fn from(value: BackendArg) -> Self {
        match value {
            BackendArg::Gpu => Backend::Gpu,
            BackendArg::Cpu => Backend::Cpu,
        }
    }
}

impl From<PrecisionArg> for Precision {
    fn from(value: PrecisionArg) -> Self {
        match value {
            PrecisionArg::Low => Precision::Low,
            PrecisionArg::Mid => Precision::Mid,
            PrecisionArg::High => Precision::High,
        }
    }
}

impl Cli {
    /// Applies command line overrides on top of `config`.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        if let Some(backend) = self.backend {
            config.backend = Some(backend.into());
        }

        match &self.command {
            Command::Mask {
                threshold, invert, ..
            } => {
                if threshold.is_some() {
                    config.mask.threshold = *threshold;
                }
                if *invert {
                    config.mask.invert = true;
                }
            }
            Command::Distance { max_iterations, .. } => {
                if let Some(max_iterations) = max_iterations {
                    config.max_iterations = *max_iterations;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_distance_overrides() {
        let cli = Cli::parse_from([
            "fieldgen",
            "--backend",
            "cpu",
            "--output-dir",
            "out",
            "distance",
            "w.png",
            "e.png",
            "--precision",
            "high",
            "--max-iterations",
            "10",
        ]);

        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.backend, Some(Backend::Cpu));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.max_iterations, 10);
        match cli.command {
            Command::Distance { precision, .. } => {
                assert_eq!(Precision::from(precision), Precision::High)
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_mask_overrides_keep_config_values() {
        let cli = Cli::parse_from(["fieldgen", "mask", "w.tif", "e.tif"]);

        let mut config = Config::default();
        config.mask.threshold = Some(5);
        config.mask.invert = true;
        cli.apply_overrides(&mut config);

        assert_eq!(config.mask.threshold, Some(5));
        assert!(config.mask.invert);
        assert_eq!(config.backend, None);
    }
}
