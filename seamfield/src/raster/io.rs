use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tiff::decoder::DecodingResult;

use super::tiff::save_tiff;
use super::{ContainerFormat, Raster, RasterDesc, SampleFormat, Samples};
use crate::common::{Error, Result};

pub(crate) fn load(path: &Path, container: ContainerFormat) -> Result<Raster> {
    match container.image_format() {
        Some(format) => load_image(path, format),
        None => load_tiff(path),
    }
}

pub(crate) fn save(raster: &Raster, path: &Path, container: ContainerFormat) -> Result<()> {
    let sample_format = raster.desc().sample_format;
    if !container.encodes(sample_format) {
        return Err(Error::Config(format!(
            "{} cannot store {}-bit samples ({})",
            container,
            sample_format.bits(),
            path.display()
        )));
    }

    match container.image_format() {
        Some(format) => save_image(raster, path, format),
        None => save_tiff(raster, path),
    }
}

fn load_image(path: &Path, format: image::ImageFormat) -> Result<Raster> {
    let mut reader = image::ImageReader::open(path).map_err(|e| Error::decode(path, e))?;
    reader.set_format(format);
    let img = reader.decode().map_err(|e| Error::decode(path, e))?;

    let (width, height) = (img.width(), img.height());
    let samples = match img.color() {
        image::ColorType::L8 => Samples::U8(img.into_luma8().into_raw()),
        image::ColorType::L16 => Samples::U16(img.into_luma16().into_raw()),
        other => {
            return Err(Error::ChannelCount {
                path: path.to_path_buf(),
                channels: other.channel_count(),
            });
        }
    };

    let desc = RasterDesc::new(width, height, samples.sample_format());
    Raster::new(desc, samples)
}

pub(crate) fn load_tiff(path: &Path) -> Result<Raster> {
    let file = File::open(path).map_err(|e| Error::decode(path, e))?;
    let limits = tiff::decoder::Limits::unlimited();
    let mut decoder = tiff::decoder::Decoder::new(BufReader::new(file))
        .map_err(|e| Error::decode(path, e))?
        .with_limits(limits);

    let color_type = decoder.colortype().map_err(|e| Error::decode(path, e))?;
    let channels = match color_type {
        tiff::ColorType::Gray(_) => 1,
        tiff::ColorType::GrayA(_) => 2,
        tiff::ColorType::RGB(_) | tiff::ColorType::YCbCr(_) => 3,
        tiff::ColorType::RGBA(_) | tiff::ColorType::CMYK(_) => 4,
        other => {
            return Err(Error::decode(
                path,
                format!("unsupported TIFF colour type {:?}", other),
            ));
        }
    };
    if channels != 1 {
        return Err(Error::ChannelCount {
            path: path.to_path_buf(),
            channels,
        });
    }

    let (width, height) = decoder.dimensions().map_err(|e| Error::decode(path, e))?;
    let samples = match decoder.read_image().map_err(|e| Error::decode(path, e))? {
        DecodingResult::U8(buf) => Samples::U8(buf),
        DecodingResult::U16(buf) => Samples::U16(buf),
        DecodingResult::U32(buf) => Samples::U32(buf),
        DecodingResult::I8(buf) => Samples::U8(buf.into_iter().map(offset_i8).collect()),
        DecodingResult::I16(buf) => Samples::U16(buf.into_iter().map(offset_i16).collect()),
        DecodingResult::I32(buf) => Samples::U32(buf.into_iter().map(offset_i32).collect()),
        _ => {
            return Err(Error::decode(
                path,
                "TIFF sample format is not an 8/16/32-bit integer",
            ));
        }
    };

    let desc = RasterDesc::new(width, height, samples.sample_format());
    Raster::new(desc, samples)
}

// Signed samples are shifted by half their range: order is kept and zero
// lands on the unsigned midpoint, so `> max / 2` reads as `>= 0`.
fn offset_i8(v: i8) -> u8 {
    (v as u8) ^ 0x80
}

fn offset_i16(v: i16) -> u16 {
    (v as u16) ^ 0x8000
}

fn offset_i32(v: i32) -> u32 {
    (v as u32) ^ 0x8000_0000
}

fn save_image(raster: &Raster, path: &Path, format: image::ImageFormat) -> Result<()> {
    let desc = raster.desc();
    let (bytes, color): (&[u8], image::ColorType) = match raster.samples() {
        Samples::U8(buf) => (buf.as_slice(), image::ColorType::L8),
        Samples::U16(buf) => (bytemuck::cast_slice(buf.as_slice()), image::ColorType::L16),
        Samples::U32(_) => {
            return Err(Error::encode(
                path,
                format!("{:?} cannot hold {} samples", format, SampleFormat::U32),
            ));
        }
    };

    image::save_buffer_with_format(path, bytes, desc.width, desc.height, color, format)
        .map_err(|e| Error::encode(path, e))
}
