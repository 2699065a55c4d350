/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::*;

fn palette() -> Palette {

    let mut palette = Palette::new(0, 0);

    palette.set(1, PaletteEntry { y: 235, cr: 128, cb: 128, alpha: 255 });
    palette.set(2, PaletteEntry { y: 16, cr: 128, cb: 128, alpha: 128 });

    palette
}

#[test]
fn test_empty_image() {
    assert!(matches!(reconstruct(&[], &palette()), Err(RasterError::EmptyImage)));
    assert!(matches!(
        reconstruct(&[vec![], vec![1, 2]], &palette()),
        Err(RasterError::EmptyImage)
    ));
}

#[test]
fn test_palette_mapping() {

    let image = reconstruct(&[vec![1, 2], vec![0, 1]], &palette()).unwrap();

    assert_eq!(image.dimensions(), (2, 2));
    assert_eq!(*image.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    assert_eq!(*image.get_pixel(1, 0), Rgba([0, 0, 0, 128]));
    assert_eq!(*image.get_pixel(0, 1), Rgba([0, 0, 0, 0]));
    assert_eq!(*image.get_pixel(1, 1), Rgba([255, 255, 255, 255]));
}

#[test]
fn test_ragged_lines() {

    let image = reconstruct(&[vec![1, 1, 1], vec![1], vec![1, 1, 1, 1]], &palette()).unwrap();

    assert_eq!(image.dimensions(), (3, 3));
    assert_eq!(image.get_pixel(2, 1).0[3], 0);
    assert_eq!(image.get_pixel(2, 2).0[3], 255);
}

#[test]
fn test_render_object() {

    let object = Object {
        id: 1,
        width: 3,
        height: 1,
        completed: true,
        data: vec![0x00, 0x83, 0x01, 0x00, 0x00],
        ..Default::default()
    };
    let image = render_object(&object, &palette()).unwrap();

    assert_eq!(image.dimensions(), (3, 1));
}

#[test]
fn test_render_object_bad_data() {

    let object = Object {
        width: 2,
        height: 1,
        data: vec![0x01, 0x01],
        ..Default::default()
    };

    assert!(matches!(
        render_object(&object, &palette()),
        Err(RasterError::Rle { source: RleError::UnterminatedLine { pixels: 2 } })
    ));
}

#[test]
fn test_render_object_declared_size() {

    let object = Object {
        id: 1,
        width: 4,
        height: 2,
        completed: true,
        data: vec![0x01, 0x00, 0x00],
        ..Default::default()
    };
    let image = render_object(&object, &palette()).unwrap();

    assert_eq!(image.dimensions(), (4, 2));
    assert_eq!(image.get_pixel(0, 0).0[3], 255);
    assert_eq!(image.get_pixel(1, 0).0[3], 0);
    assert_eq!(image.get_pixel(0, 1).0[3], 0);
}

#[test]
fn test_render_object_without_dimensions() {

    let object = Object {
        data: vec![0x01, 0x00, 0x00],
        ..Default::default()
    };

    assert!(matches!(render_object(&object, &palette()), Err(RasterError::EmptyImage)));
}

#[test]
fn test_render_object_wider_than_declared() {

    let mut data = Vec::new();

    for _ in 0..20_000 {
        data.extend_from_slice(&[0x00, 0x7F, 0xFF]);
    }
    data.extend_from_slice(&[0x00, 0x00]);

    let object = Object {
        id: 1,
        width: 1,
        height: 1,
        completed: true,
        data,
        ..Default::default()
    };

    assert!(matches!(
        render_object(&object, &palette()),
        Err(RasterError::Rle { source: RleError::LineOverflow { line: 0, width: 1 } })
    ));
}

#[test]
fn test_render_object_taller_than_declared() {

    let object = Object {
        id: 1,
        width: 1,
        height: 1,
        completed: true,
        data: vec![0x01, 0x00, 0x00, 0x01, 0x00, 0x00],
        ..Default::default()
    };

    assert!(matches!(
        render_object(&object, &palette()),
        Err(RasterError::Rle { source: RleError::TooManyLines { height: 1 } })
    ));
}

#[test]
fn test_flatten() {

    let image = reconstruct(&[vec![0, 1, 2]], &palette()).unwrap();
    let flat = flatten(&image, Rgb([255, 255, 255]));

    assert_eq!(*flat.get_pixel(0, 0), Rgb([255, 255, 255]));
    assert_eq!(*flat.get_pixel(1, 0), Rgb([255, 255, 255]));
    assert_eq!(*flat.get_pixel(2, 0), Rgb([127, 127, 127]));
}

#[test]
fn test_encode_png() {

    let image = reconstruct(&[vec![1, 2], vec![2, 1]], &palette()).unwrap();
    let png = encode_png(&flatten(&image, Rgb([255, 255, 255]))).unwrap();

    assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
}
