//! Tile normalization: crop a source image to its crop region and resample
//! the result to the uniform tile edge.

use fast_image_resize::{images::Image, ResizeOptions, Resizer};
use image::{imageops, ImageBuffer, Rgb, RgbImage};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use super::crop::CropRegion;
use crate::error::TileError;

/// A finished mosaic cell: exactly tile_size x tile_size pixels
#[derive(Debug, Clone)]
pub struct Tile {
    pub image: RgbImage,
    pub source: PathBuf,
}

/// Crop `img` to `region` and scale the result to `tile_size` square.
///
/// Non-square regions (edge-clamped crops, full-image fallbacks) are
/// center-cropped to their shorter side first, so tiles are never
/// distorted or padded.
pub fn normalize_tile(
    img: &RgbImage,
    region: CropRegion,
    tile_size: u32,
    source: &Path,
) -> Result<Tile, TileError> {
    if region.width() == 0 || region.height() == 0 {
        return Err(TileError::EmptyCrop(source.to_path_buf()));
    }

    let mut cropped = imageops::crop_imm(img, region.x0, region.y0, region.width(), region.height())
        .to_image();

    let (width, height) = cropped.dimensions();
    if width != height {
        let side = width.min(height);
        let x = (width - side) / 2;
        let y = (height - side) / 2;
        cropped = imageops::crop_imm(&cropped, x, y, side, side).to_image();
    }

    let image = resize_square(&cropped, tile_size, source)?;
    Ok(Tile {
        image,
        source: source.to_path_buf(),
    })
}

/// Resize a square image to the exact tile edge using a high-quality
/// convolution filter. Already-sized input is returned unchanged.
fn resize_square(img: &RgbImage, edge: u32, source: &Path) -> Result<RgbImage, TileError> {
    let (src_width, src_height) = img.dimensions();

    if src_width == edge && src_height == edge {
        return Ok(img.clone());
    }

    let resample_err = |message: String| TileError::Resample {
        path: source.to_path_buf(),
        message,
    };

    let src_width_nz = NonZeroU32::new(src_width)
        .ok_or_else(|| resample_err("source width is zero".to_string()))?;
    let src_height_nz = NonZeroU32::new(src_height)
        .ok_or_else(|| resample_err("source height is zero".to_string()))?;
    let edge_nz =
        NonZeroU32::new(edge).ok_or_else(|| resample_err("tile edge is zero".to_string()))?;

    let src_pixels: Vec<u8> = img.pixels().flat_map(|p| [p[0], p[1], p[2]]).collect();
    let src_image = Image::from_vec_u8(
        src_width_nz.into(),
        src_height_nz.into(),
        src_pixels,
        fast_image_resize::PixelType::U8x3,
    )
    .map_err(|e| resample_err(e.to_string()))?;

    let mut dst_image = Image::new(
        edge_nz.into(),
        edge_nz.into(),
        fast_image_resize::PixelType::U8x3,
    );

    let mut resizer = Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, Some(&ResizeOptions::default()))
        .map_err(|e| resample_err(e.to_string()))?;

    let dst_pixels = dst_image.buffer();
    let mut output = ImageBuffer::new(edge, edge);
    for (i, pixel) in output.pixels_mut().enumerate() {
        let base = i * 3;
        if base + 2 < dst_pixels.len() {
            *pixel = Rgb([dst_pixels[base], dst_pixels[base + 1], dst_pixels[base + 2]]);
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_image(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn test_normalized_tile_has_exact_size() {
        let img = create_test_image(500, 400);
        let region = CropRegion {
            x0: 100,
            y0: 100,
            x1: 300,
            y1: 300,
        };
        let tile = normalize_tile(&img, region, 128, Path::new("a.jpg")).unwrap();
        assert_eq!(tile.image.dimensions(), (128, 128));
    }

    #[test]
    fn test_non_square_region_center_cropped_not_distorted() {
        let img = create_test_image(400, 300);
        let region = CropRegion::full_image(400, 300);
        let tile = normalize_tile(&img, region, 64, Path::new("a.jpg")).unwrap();
        assert_eq!(tile.image.dimensions(), (64, 64));
    }

    #[test]
    fn test_idempotent_on_tile_sized_input() {
        let img = create_test_image(128, 128);
        let region = CropRegion::full_image(128, 128);

        let once = normalize_tile(&img, region, 128, Path::new("a.jpg")).unwrap();
        let twice = normalize_tile(&once.image, region, 128, Path::new("a.jpg")).unwrap();

        assert_eq!(once.image.as_raw(), img.as_raw());
        assert_eq!(twice.image.as_raw(), once.image.as_raw());
    }

    #[test]
    fn test_empty_region_is_an_error() {
        let img = create_test_image(100, 100);
        let region = CropRegion {
            x0: 50,
            y0: 50,
            x1: 50,
            y1: 80,
        };
        let err = normalize_tile(&img, region, 64, Path::new("a.jpg")).unwrap_err();
        assert!(matches!(err, TileError::EmptyCrop(_)));
    }

    #[test]
    fn test_upscaling_small_crop() {
        let img = create_test_image(32, 32);
        let region = CropRegion::full_image(32, 32);
        let tile = normalize_tile(&img, region, 256, Path::new("a.jpg")).unwrap();
        assert_eq!(tile.image.dimensions(), (256, 256));
    }
}
