use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::common::error::{Error, Result};
use crate::ops::{Backend, BetaPolicy, DEFAULT_MAX_ITERATIONS, DistanceField, MaskExtractor, Precision};
use crate::raster::{ContainerFormat, FormatRegistry};

/// Batch settings, usually read from a YAML file. Every field is optional.
///
/// ```yaml
/// max_iterations: 3000
/// output_dir: out
/// tiers:
///   mid: { beta: linear, extension: tiff }
/// mask: { threshold: 100, invert: true }
/// extensions: { pgm16: tiff }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub max_iterations: u32,
    pub output_dir: PathBuf,
    pub backend: Option<Backend>,
    pub tiers: Tiers,
    pub mask: MaskConfig,
    /// Extra extension aliases merged into the default registry.
    pub extensions: HashMap<String, ContainerFormat>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tiers {
    pub low: TierConfig,
    pub mid: TierConfig,
    pub high: TierConfig,
}

/// Per-tier overrides; unset fields fall back to the tier's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TierConfig {
    pub beta: Option<BetaPolicy>,
    pub extension: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MaskConfig {
    pub threshold: Option<u32>,
    pub invert: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            output_dir: PathBuf::from("."),
            backend: None,
            tiers: Tiers::default(),
            mask: MaskConfig::default(),
            extensions: HashMap::new(),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Config> {
        let config: Config = serde_yml::from_str(yaml)
            .map_err(|e| Error::Config(format!("invalid configuration: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!("loaded configuration from {}", path.as_ref().display());
        Config::from_yaml(&yaml)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(Error::Config("max_iterations must be at least 1".to_string()));
        }

        let registry = self.format_registry();
        for precision in Precision::ALL {
            let extension = self.extension(precision);
            let container = registry
                .get(&extension)
                .ok_or_else(|| Error::UnsupportedExtension(format!(".{}", extension)))?;
            if !container.encodes(precision.sample_format()) {
                return Err(Error::Config(format!(
                    "{} output cannot be written as .{} ({})",
                    precision, extension, container
                )));
            }
        }

        Ok(())
    }

    /// Default registry plus the configured aliases.
    pub fn format_registry(&self) -> FormatRegistry {
        let mut registry = FormatRegistry::default();
        for (ext, container) in &self.extensions {
            registry.insert(ext, *container);
        }
        registry
    }

    pub fn tier(&self, precision: Precision) -> &TierConfig {
        match precision {
            Precision::Low => &self.tiers.low,
            Precision::Mid => &self.tiers.mid,
            Precision::High => &self.tiers.high,
        }
    }

    pub fn beta_policy(&self, precision: Precision) -> BetaPolicy {
        self.tier(precision)
            .beta
            .unwrap_or_else(|| precision.default_beta_policy())
    }

    /// Output extension of a tier, lowercase and without the leading dot.
    pub fn extension(&self, precision: Precision) -> String {
        self.tier(precision)
            .extension
            .as_deref()
            .unwrap_or_else(|| precision.default_extension())
            .trim_start_matches('.')
            .to_ascii_lowercase()
    }

    pub fn distance_field(&self, precision: Precision) -> DistanceField {
        DistanceField::new(precision)
            .with_beta_policy(self.beta_policy(precision))
            .with_max_iterations(self.max_iterations)
    }

    pub fn mask_extractor(&self) -> MaskExtractor {
        MaskExtractor::new(self.mask.threshold, self.mask.invert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.max_iterations, 3000);
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.beta_policy(Precision::Low), BetaPolicy::Linear);
        assert_eq!(config.beta_policy(Precision::Mid), BetaPolicy::Sqrt);
        assert_eq!(config.beta_policy(Precision::High), BetaPolicy::Linear);
        assert_eq!(config.extension(Precision::Low), "png");
        assert_eq!(config.extension(Precision::Mid), "tif");
    }

    #[test]
    fn test_overrides_are_applied() {
        let yaml = r#"
max_iterations: 12
output_dir: out
backend: cpu
tiers:
  mid:
    beta: linear
    extension: .TIFF
mask:
  threshold: 9
  invert: true
extensions:
  dat: tiff
"#;
        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(config.max_iterations, 12);
        assert_eq!(config.backend, Some(Backend::Cpu));
        assert_eq!(config.beta_policy(Precision::Mid), BetaPolicy::Linear);
        assert_eq!(config.extension(Precision::Mid), "tiff");
        assert_eq!(config.beta_policy(Precision::High), BetaPolicy::Linear);
        assert_eq!(config.format_registry().get("dat"), Some(ContainerFormat::Tiff));

        let field = config.distance_field(Precision::Mid);
        assert_eq!(field.max_iterations, 12);
        assert_eq!(field.beta_policy, BetaPolicy::Linear);

        assert_eq!(config.mask_extractor(), MaskExtractor::new(Some(9), true));
    }

    #[test]
    fn test_zero_ceiling_is_rejected() {
        let err = Config::from_yaml("max_iterations: 0").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_tier_container_must_encode_tier_width() {
        let err = Config::from_yaml("tiers: { high: { extension: png } }").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_yaml("tiers: { low: { extension: webp } }").unwrap_err();
        assert!(matches!(err, Error::UnsupportedExtension(_)));

        assert!(Config::from_yaml("tiers: { mid: { extension: png } }").is_ok());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let err = Config::from_yaml("max_iteration: 5").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_yaml_round_trip() {
        let mut config = Config::default();
        config.max_iterations = 42;
        config.tiers.low.beta = Some(BetaPolicy::Sqrt);

        let yaml = config.to_yaml().unwrap();
        assert_eq!(Config::from_yaml(&yaml).unwrap(), config);
    }
}
