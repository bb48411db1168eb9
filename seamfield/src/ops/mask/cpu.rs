use super::{MASK_OFF, MASK_ON};
use crate::common::error::Result;
use crate::raster::{Layer, LayerPair, Raster, RasterDesc, SampleFormat};

pub(super) fn classify(value: u32, threshold: u32, invert: bool) -> u32 {
    if (value > threshold) != invert {
        MASK_ON
    } else {
        MASK_OFF
    }
}

pub(super) fn apply(layers: &LayerPair, threshold: u32, invert: bool) -> Result<LayerPair> {
    let desc = RasterDesc {
        sample_format: SampleFormat::U8,
        ..*layers.desc()
    };

    let [west, east] = Layer::ALL.map(|layer| {
        let words: Vec<u32> = layers
            .layer(layer)
            .samples()
            .to_words()
            .into_iter()
            .map(|v| classify(v, threshold, invert))
            .collect();
        Raster::from_words(desc, &words)
    });

    LayerPair::new(west?, east?)
}
