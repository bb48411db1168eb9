use std::fmt;
use std::path::Path;

use common::file_format::get_file_extension;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::SampleFormat;
use crate::common::{Error, Result};

/// Raster container and the codec that handles it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Png,
    Jpeg,
    Bmp,
    Tga,
    Gif,
    Tiff,
}

impl ContainerFormat {
    /// Sample widths this container can be written with.
    pub fn encodes(self, sample_format: SampleFormat) -> bool {
        match self {
            ContainerFormat::Png => matches!(sample_format, SampleFormat::U8 | SampleFormat::U16),
            ContainerFormat::Jpeg | ContainerFormat::Bmp | ContainerFormat::Tga => {
                sample_format == SampleFormat::U8
            }
            ContainerFormat::Gif => false,
            ContainerFormat::Tiff => true,
        }
    }

    /// Codec used when the container is not decoded by the TIFF reader.
    pub(crate) fn image_format(self) -> Option<image::ImageFormat> {
        match self {
            ContainerFormat::Png => Some(image::ImageFormat::Png),
            ContainerFormat::Jpeg => Some(image::ImageFormat::Jpeg),
            ContainerFormat::Bmp => Some(image::ImageFormat::Bmp),
            ContainerFormat::Tga => Some(image::ImageFormat::Tga),
            ContainerFormat::Gif => Some(image::ImageFormat::Gif),
            ContainerFormat::Tiff => None,
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContainerFormat::Png => "PNG",
            ContainerFormat::Jpeg => "JPEG",
            ContainerFormat::Bmp => "BMP",
            ContainerFormat::Tga => "TGA",
            ContainerFormat::Gif => "GIF",
            ContainerFormat::Tiff => "TIFF",
        };
        f.write_str(name)
    }
}

/// Maps lowercase file extensions to containers.
///
/// Passed explicitly to every load/save so callers and tests can swap in
/// their own mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatRegistry {
    formats: HashMap<String, ContainerFormat>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for (ext, container) in [
            ("jpeg", ContainerFormat::Jpeg),
            ("jpg", ContainerFormat::Jpeg),
            ("png", ContainerFormat::Png),
            ("tga", ContainerFormat::Tga),
            ("bmp", ContainerFormat::Bmp),
            ("gif", ContainerFormat::Gif),
            ("tif", ContainerFormat::Tiff),
            ("tiff", ContainerFormat::Tiff),
        ] {
            registry.insert(ext, container);
        }
        registry
    }
}

impl FormatRegistry {
    pub fn empty() -> Self {
        Self {
            formats: HashMap::new(),
        }
    }

    /// Registers `ext` (with or without a leading dot, any case).
    pub fn insert(&mut self, ext: &str, container: ContainerFormat) {
        self.formats
            .insert(normalize_extension(ext), container);
    }

    pub fn get(&self, ext: &str) -> Option<ContainerFormat> {
        self.formats.get(&normalize_extension(ext)).copied()
    }

    pub fn resolve(&self, path: &Path) -> Result<ContainerFormat> {
        let ext = get_file_extension(path)
            .ok_or_else(|| Error::MissingExtension(path.to_path_buf()))?;

        self.formats
            .get(&ext)
            .copied()
            .ok_or_else(|| Error::UnsupportedExtension(format!(".{}", ext)))
    }

    /// Resolves the shared container of a west/east source pair.
    ///
    /// The extensions must match before either is looked up.
    pub fn resolve_pair(&self, first: &Path, second: &Path) -> Result<ContainerFormat> {
        let ext0 = get_file_extension(first)
            .ok_or_else(|| Error::MissingExtension(first.to_path_buf()))?;
        let ext1 = get_file_extension(second)
            .ok_or_else(|| Error::MissingExtension(second.to_path_buf()))?;

        if ext0 != ext1 {
            return Err(Error::ExtensionMismatch(
                format!(".{}", ext0),
                format!(".{}", ext1),
            ));
        }

        self.resolve(first)
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn default_registry_covers_source_formats() {
        let registry = FormatRegistry::default();
        assert_eq!(registry.get("png"), Some(ContainerFormat::Png));
        assert_eq!(registry.get(".JPG"), Some(ContainerFormat::Jpeg));
        assert_eq!(registry.get("tif"), Some(ContainerFormat::Tiff));
        assert_eq!(registry.get("psd"), None);
    }

    #[test]
    fn resolve_pair_rejects_mismatched_extensions() {
        let registry = FormatRegistry::default();
        let err = registry
            .resolve_pair(Path::new("mask_0.png"), Path::new("mask_1.tif"))
            .unwrap_err();
        assert!(matches!(err, Error::ExtensionMismatch(ref a, ref b) if a == ".png" && b == ".tif"));
    }

    #[test]
    fn resolve_reports_unsupported_and_missing() {
        let registry = FormatRegistry::default();
        let err = registry.resolve(Path::new("terrain.hdr")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedExtension(ref e) if e == ".hdr"));

        let err = registry.resolve(Path::new("terrain")).unwrap_err();
        assert!(matches!(err, Error::MissingExtension(ref p) if *p == PathBuf::from("terrain")));
    }

    #[test]
    fn custom_registry_mapping() {
        let mut registry = FormatRegistry::empty();
        assert!(registry.resolve(Path::new("a.png")).is_err());

        registry.insert(".Raw16", ContainerFormat::Tiff);
        assert_eq!(
            registry.resolve(Path::new("a.raw16")).unwrap(),
            ContainerFormat::Tiff
        );
    }

    #[test]
    fn encodable_sample_widths() {
        assert!(ContainerFormat::Png.encodes(SampleFormat::U16));
        assert!(!ContainerFormat::Png.encodes(SampleFormat::U32));
        assert!(ContainerFormat::Tiff.encodes(SampleFormat::U32));
        assert!(!ContainerFormat::Jpeg.encodes(SampleFormat::U16));
        assert!(!ContainerFormat::Gif.encodes(SampleFormat::U8));
    }
}
