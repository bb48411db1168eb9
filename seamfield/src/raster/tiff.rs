use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tiff::encoder::{TiffEncoder, colortype};

use super::{Raster, Samples};
use crate::common::{Error, Result};

/// Writes a single-channel, unsigned integer, black-is-zero TIFF.
pub(crate) fn save_tiff(raster: &Raster, path: &Path) -> Result<()> {
    let desc = raster.desc();
    let file = File::create(path).map_err(|e| Error::encode(path, e))?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file)).map_err(|e| Error::encode(path, e))?;

    let (width, height) = (desc.width, desc.height);
    let written = match raster.samples() {
        Samples::U8(buf) => encoder.write_image::<colortype::Gray8>(width, height, buf),
        Samples::U16(buf) => encoder.write_image::<colortype::Gray16>(width, height, buf),
        Samples::U32(buf) => encoder.write_image::<colortype::Gray32>(width, height, buf),
    };

    written.map_err(|e| Error::encode(path, e))
}
