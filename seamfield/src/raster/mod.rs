mod io;
mod registry;
mod tiff;

#[cfg(test)]
mod tests;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use registry::{ContainerFormat, FormatRegistry};

use crate::common::{Error, Result};

/// Unsigned integer sample width of a single-channel raster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    U8,
    U16,
    U32,
}

impl SampleFormat {
    pub fn bits(self) -> u32 {
        match self {
            SampleFormat::U8 => 8,
            SampleFormat::U16 => 16,
            SampleFormat::U32 => 32,
        }
    }

    pub fn max_value(self) -> u32 {
        match self {
            SampleFormat::U8 => u8::MAX as u32,
            SampleFormat::U16 => u16::MAX as u32,
            SampleFormat::U32 => u32::MAX,
        }
    }

    pub fn from_bit_count(bits: u8) -> Option<Self> {
        match bits {
            8 => Some(SampleFormat::U8),
            16 => Some(SampleFormat::U16),
            32 => Some(SampleFormat::U32),
            _ => None,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.bits())
    }
}

#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub struct RasterDesc {
    pub width: u32,
    pub height: u32,
    pub sample_format: SampleFormat,
}

impl RasterDesc {
    pub fn new(width: u32, height: u32, sample_format: SampleFormat) -> Self {
        Self {
            width,
            height,
            sample_format,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn with_sample_format(self, sample_format: SampleFormat) -> Self {
        Self {
            sample_format,
            ..self
        }
    }
}

/// Row-major pixel storage, origin top-left.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Samples {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl Samples {
    pub fn zeroed(sample_format: SampleFormat, len: usize) -> Self {
        match sample_format {
            SampleFormat::U8 => Samples::U8(vec![0; len]),
            SampleFormat::U16 => Samples::U16(vec![0; len]),
            SampleFormat::U32 => Samples::U32(vec![0; len]),
        }
    }

    /// Narrows 32-bit words into `sample_format`, saturating at its maximum.
    pub fn from_words(sample_format: SampleFormat, words: &[u32]) -> Self {
        let max = sample_format.max_value();
        match sample_format {
            SampleFormat::U8 => Samples::U8(words.iter().map(|&v| v.min(max) as u8).collect()),
            SampleFormat::U16 => Samples::U16(words.iter().map(|&v| v.min(max) as u16).collect()),
            SampleFormat::U32 => Samples::U32(words.to_vec()),
        }
    }

    pub fn sample_format(&self) -> SampleFormat {
        match self {
            Samples::U8(_) => SampleFormat::U8,
            Samples::U16(_) => SampleFormat::U16,
            Samples::U32(_) => SampleFormat::U32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Samples::U8(v) => v.len(),
            Samples::U16(v) => v.len(),
            Samples::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Widens every sample to a 32-bit word without changing its value.
    pub fn to_words(&self) -> Vec<u32> {
        match self {
            Samples::U8(v) => v.iter().map(|&s| s as u32).collect(),
            Samples::U16(v) => v.iter().map(|&s| s as u32).collect(),
            Samples::U32(v) => v.clone(),
        }
    }

    pub fn get(&self, index: usize) -> u32 {
        match self {
            Samples::U8(v) => v[index] as u32,
            Samples::U16(v) => v[index] as u32,
            Samples::U32(v) => v[index],
        }
    }

    fn set(&mut self, index: usize, value: u32) {
        match self {
            Samples::U8(v) => v[index] = value as u8,
            Samples::U16(v) => v[index] = value as u16,
            Samples::U32(v) => v[index] = value,
        }
    }
}

/// Single-channel raster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    desc: RasterDesc,
    samples: Samples,
}

impl Raster {
    pub fn new(desc: RasterDesc, samples: Samples) -> Result<Raster> {
        if samples.sample_format() != desc.sample_format {
            return Err(Error::Config(format!(
                "sample storage is {} but the raster is declared {}",
                samples.sample_format(),
                desc.sample_format
            )));
        }
        if samples.len() != desc.pixel_count() {
            return Err(Error::Config(format!(
                "sample count {} does not match {}x{}",
                samples.len(),
                desc.width,
                desc.height
            )));
        }

        Ok(Raster { desc, samples })
    }

    pub fn new_empty(desc: RasterDesc) -> Raster {
        let samples = Samples::zeroed(desc.sample_format, desc.pixel_count());
        Raster { desc, samples }
    }

    pub fn from_words(desc: RasterDesc, words: &[u32]) -> Result<Raster> {
        Raster::new(desc, Samples::from_words(desc.sample_format, words))
    }

    pub fn desc(&self) -> &RasterDesc {
        &self.desc
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    pub fn into_samples(self) -> Samples {
        self.samples
    }

    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.samples.get(self.index(x, y))
    }

    pub fn set(&mut self, x: u32, y: u32, value: u32) {
        let index = self.index(x, y);
        self.samples.set(index, value);
    }

    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.desc.width && y < self.desc.height);
        y as usize * self.desc.width as usize + x as usize
    }

    pub fn read_file<P: AsRef<Path>>(path: P, registry: &FormatRegistry) -> Result<Raster> {
        let container = registry.resolve(path.as_ref())?;
        io::load(path.as_ref(), container)
    }

    pub fn save_file<P: AsRef<Path>>(&self, path: P, registry: &FormatRegistry) -> Result<()> {
        let container = registry.resolve(path.as_ref())?;
        io::save(self, path.as_ref(), container)
    }
}

/// One of the two seam-adjacent slices of a layered texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    West = 0,
    East = 1,
}

impl Layer {
    pub const ALL: [Layer; 2] = [Layer::West, Layer::East];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn other(self) -> Layer {
        match self {
            Layer::West => Layer::East,
            Layer::East => Layer::West,
        }
    }
}

/// Two equal-shape rasters, west (layer 0) and east (layer 1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerPair {
    west: Raster,
    east: Raster,
}

impl LayerPair {
    pub fn new(west: Raster, east: Raster) -> Result<LayerPair> {
        let (w, e) = (west.desc(), east.desc());
        if w.width != e.width {
            return Err(Error::ShapeMismatch {
                what: "width",
                first: w.width.to_string(),
                second: e.width.to_string(),
            });
        }
        if w.height != e.height {
            return Err(Error::ShapeMismatch {
                what: "height",
                first: w.height.to_string(),
                second: e.height.to_string(),
            });
        }
        if w.sample_format != e.sample_format {
            return Err(Error::ShapeMismatch {
                what: "sample format",
                first: w.sample_format.to_string(),
                second: e.sample_format.to_string(),
            });
        }

        Ok(LayerPair { west, east })
    }

    pub fn desc(&self) -> &RasterDesc {
        self.west.desc()
    }

    pub fn layer(&self, layer: Layer) -> &Raster {
        match layer {
            Layer::West => &self.west,
            Layer::East => &self.east,
        }
    }

    pub fn into_layers(self) -> [Raster; 2] {
        [self.west, self.east]
    }

    /// Both layers as 32-bit words, layer-major.
    pub fn to_words(&self) -> Vec<u32> {
        let mut words = Vec::with_capacity(self.desc().pixel_count() * 2);
        for layer in Layer::ALL {
            words.extend(self.layer(layer).samples().to_words());
        }
        words
    }
}
