use common::test_utils::test_output_path;

use super::*;

fn gradient(width: u32, height: u32, sample_format: SampleFormat) -> Raster {
    let desc = RasterDesc::new(width, height, sample_format);
    let mut raster = Raster::new_empty(desc);
    let step = sample_format.max_value() / (width * height);
    for y in 0..height {
        for x in 0..width {
            raster.set(x, y, (y * width + x) * step);
        }
    }
    raster
}

#[test]
fn test_layer_pair_rejects_shape_mismatch() {
    let a = Raster::new_empty(RasterDesc::new(4, 4, SampleFormat::U8));
    let b = Raster::new_empty(RasterDesc::new(5, 4, SampleFormat::U8));
    let err = LayerPair::new(a.clone(), b).unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { what: "width", .. }));

    let c = Raster::new_empty(RasterDesc::new(4, 3, SampleFormat::U8));
    let err = LayerPair::new(a.clone(), c).unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { what: "height", .. }));

    let d = Raster::new_empty(RasterDesc::new(4, 4, SampleFormat::U16));
    let err = LayerPair::new(a, d).unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { what: "sample format", .. }));
}

#[test]
fn test_layer_pair_words_are_layer_major() {
    let mut west = Raster::new_empty(RasterDesc::new(2, 1, SampleFormat::U8));
    let mut east = west.clone();
    west.set(0, 0, 1);
    west.set(1, 0, 2);
    east.set(0, 0, 3);
    east.set(1, 0, 4);

    let pair = LayerPair::new(west, east).unwrap();
    assert_eq!(pair.to_words(), vec![1, 2, 3, 4]);
}

#[test]
fn test_raster_new_validates_storage() {
    let desc = RasterDesc::new(2, 2, SampleFormat::U8);
    assert!(Raster::new(desc, Samples::U8(vec![0; 3])).is_err());
    assert!(Raster::new(desc, Samples::U16(vec![0; 4])).is_err());
    assert!(Raster::new(desc, Samples::U8(vec![0; 4])).is_ok());
}

#[test]
fn test_from_words_saturates() {
    let samples = Samples::from_words(SampleFormat::U8, &[0, 200, 300, u32::MAX]);
    assert_eq!(samples, Samples::U8(vec![0, 200, 255, 255]));

    let samples = Samples::from_words(SampleFormat::U16, &[65535, 65536]);
    assert_eq!(samples, Samples::U16(vec![65535, 65535]));
}

#[test]
fn test_png_round_trip_u8_and_u16() {
    let registry = FormatRegistry::default();

    for sample_format in [SampleFormat::U8, SampleFormat::U16] {
        let raster = gradient(7, 3, sample_format);
        let path = test_output_path(&format!("raster_round_trip_{}.png", sample_format));
        raster.save_file(&path, &registry).unwrap();

        let loaded = Raster::read_file(&path, &registry).unwrap();
        assert_eq!(loaded, raster);
    }
}

#[test]
fn test_tiff_round_trip_all_widths() {
    let registry = FormatRegistry::default();

    for sample_format in [SampleFormat::U8, SampleFormat::U16, SampleFormat::U32] {
        let raster = gradient(5, 4, sample_format);
        let path = test_output_path(&format!("raster_round_trip_{}.tif", sample_format));
        raster.save_file(&path, &registry).unwrap();

        let loaded = Raster::read_file(&path, &registry).unwrap();
        assert_eq!(loaded, raster);
    }
}

#[test]
fn test_signed_tiff_loads_offset_by_half_range() {
    use ::tiff::encoder::{TiffEncoder, colortype};

    let path = test_output_path("raster_signed.tif");
    let file = std::fs::File::create(&path).unwrap();
    TiffEncoder::new(file)
        .unwrap()
        .write_image::<colortype::GrayI16>(4, 1, &[-32768i16, -1, 0, 32767])
        .unwrap();

    let loaded = Raster::read_file(&path, &FormatRegistry::default()).unwrap();
    assert_eq!(loaded.desc(), &RasterDesc::new(4, 1, SampleFormat::U16));
    assert_eq!(loaded.samples(), &Samples::U16(vec![0, 32767, 32768, 65535]));
}

#[test]
fn test_png_refuses_u32() {
    let registry = FormatRegistry::default();
    let raster = gradient(2, 2, SampleFormat::U32);
    let path = test_output_path("raster_u32.png");
    let err = raster.save_file(&path, &registry).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_multi_channel_source_is_rejected() {
    let path = test_output_path("raster_rgb.png");
    image::save_buffer_with_format(
        &path,
        &[10u8; 2 * 2 * 3],
        2,
        2,
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )
    .unwrap();

    let err = Raster::read_file(&path, &FormatRegistry::default()).unwrap_err();
    assert!(matches!(err, Error::ChannelCount { channels: 3, .. }));
}

#[test]
fn test_undecodable_file_reports_path() {
    let path = test_output_path("raster_garbage.png");
    std::fs::write(&path, b"definitely not a png").unwrap();

    let err = Raster::read_file(&path, &FormatRegistry::default()).unwrap_err();
    match err {
        Error::Decode { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_file_is_a_decode_error() {
    let path = test_output_path("raster_does_not_exist.tif");
    let _ = std::fs::remove_file(&path);

    let err = Raster::read_file(&path, &FormatRegistry::default()).unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}
