/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Turns decoded objects into raster images.

#[cfg(test)]
mod tests;

use super::{
    object::Object,
    rle::{self, RleError},
    segment::{Palette, PaletteEntry},
};
use image::{
    codecs::png::PngEncoder,
    ColorType,
    ImageEncoder,
    ImageError,
    Rgb,
    RgbImage,
    Rgba,
    RgbaImage,
};
use thiserror::Error as ThisError;

/// A specialized [`Result`](std::result::Result) type for raster operations.
pub type RasterResult<T> = Result<T, RasterError>;

#[derive(ThisError, Debug)]
pub enum RasterError {
    /// The pixel matrix has no rows, or its first row has no pixels.
    #[error("image has no pixels")]
    EmptyImage,
    /// The display set holding the object defines no palette.
    #[error("no palette to map the object through")]
    MissingPalette,
    /// The object data is not valid run-length encoded data.
    #[error("object data could not be decoded")]
    Rle {
        #[from]
        source: RleError,
    },
    #[error("image could not be encoded")]
    Encoding {
        #[from]
        source: ImageError,
    },
}

/// Maps a matrix of pixel IDs through `palette`.
///
/// The width of the image is the length of the first line. Shorter lines leave their
/// remaining pixels transparent and longer lines are cut.
pub fn reconstruct(lines: &[Vec<u8>], palette: &Palette) -> RasterResult<RgbaImage> {

    let height = lines.len();
    let width = lines.first().map_or(0, Vec::len);

    if height == 0 || width == 0 {
        return Err(RasterError::EmptyImage)
    }

    Ok(paint(lines, width as u32, height as u32, palette))
}

/// Decodes the data of `object` and maps it through `palette` onto an image of the object's
/// declared size. Missing pixels are left transparent.
pub fn render_object(object: &Object, palette: &Palette) -> RasterResult<RgbaImage> {

    let width = object.width as usize;
    let height = object.height as usize;

    if width == 0 || height == 0 {
        return Err(RasterError::EmptyImage)
    }

    let lines = rle::decode_bounded(&object.data, width, height)?;

    Ok(paint(&lines, width as u32, height as u32, palette))
}

fn paint(lines: &[Vec<u8>], width: u32, height: u32, palette: &Palette) -> RgbaImage {

    let mut image = RgbaImage::new(width, height);

    for (y, line) in lines.iter().take(height as usize).enumerate() {
        for (x, id) in line.iter().take(width as usize).enumerate() {
            image.put_pixel(x as u32, y as u32, rgba_pixel(palette.get(*id)));
        }
    }

    image
}

/// Converts a limited-range BT.709 YCbCr palette entry to RGB, keeping its alpha.
pub fn rgba_pixel(entry: PaletteEntry) -> Rgba<u8> {

    let y = (entry.y as f64 - 16.0) * 1.164383562;
    let cb = entry.cb as f64 - 128.0;
    let cr = entry.cr as f64 - 128.0;

    let red = y + cr * 1.792741071;
    let green = y - cr * 0.5329093286 - cb * 0.2132486143;
    let blue = y + cb * 2.112401786;

    Rgba([to_byte(red), to_byte(green), to_byte(blue), entry.alpha])
}

fn to_byte(value: f64) -> u8 {
    (value + 0.5).max(0.0).min(255.0) as u8
}

/// Composites `image` over an opaque `background`.
pub fn flatten(image: &RgbaImage, background: Rgb<u8>) -> RgbImage {

    RgbImage::from_fn(image.width(), image.height(), |x, y| {

        let Rgba([red, green, blue, alpha]) = *image.get_pixel(x, y);
        let blend = |fore: u8, back: u8| {
            ((fore as u32 * alpha as u32 + back as u32 * (255 - alpha as u32) + 127) / 255) as u8
        };

        Rgb([
            blend(red, background.0[0]),
            blend(green, background.0[1]),
            blend(blue, background.0[2]),
        ])
    })
}

/// Encodes `image` as a PNG file.
pub fn encode_png(image: &RgbImage) -> RasterResult<Vec<u8>> {

    let mut output = Vec::new();

    PngEncoder::new(&mut output).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ColorType::Rgb8,
    )?;

    Ok(output)
}
