use super::*;

#[test]
fn encode_png_unpremultiplies() {
    let frame = FrameRGBA {
        width: 2,
        height: 1,
        data: vec![100, 50, 0, 128, 10, 20, 30, 255],
        premultiplied: true,
    };
    let png = frame.encode_png().unwrap();
    let img = image::load_from_memory(&png).unwrap().to_rgba8();
    let a = img.get_pixel(0, 0).0;
    assert_eq!(a[3], 128);
    assert!((i32::from(a[0]) - 199).abs() <= 1);
    assert!((i32::from(a[1]) - 100).abs() <= 1);
    assert_eq!(img.get_pixel(1, 0).0, [10, 20, 30, 255]);
}

#[test]
fn encode_rejects_mismatched_buffer() {
    let err = encode_rgba8_png(4, 4, vec![0; 3]).unwrap_err();
    assert!(matches!(err, UnmarkError::Rasterization(_)));
}

#[test]
fn mask_decodes_to_luma() {
    let data = [[0u8, 0, 0, 255], [255, 255, 255, 255]].concat();
    let mask = MaskImage {
        width: 2,
        height: 1,
        png: encode_rgba8_png(2, 1, data).unwrap(),
    };
    assert_eq!(mask.decode_luma().unwrap(), vec![0, 255]);
    assert_eq!(MaskImage::FILE_NAME, "mask.png");
}
