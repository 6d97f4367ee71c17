//! Mosaic layout: arrange normalized tiles into one large grid or into
//! printable pages.
//!
//! The canvas is owned and written exclusively here; pipeline workers only
//! ever hand over finished tiles.

use anyhow::{Context, Result};
use image::{imageops, ImageBuffer, RgbImage};
use std::path::{Path, PathBuf};

use super::tile::Tile;
use crate::utils::{verbose_println, warn_println};

/// Maximum pixel dimension the JPEG encoder accepts on either axis
pub const MAX_CANVAS_DIM: u32 = 65_500;

/// One rectangular section of an oversized canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionRect {
    pub row: u32,
    pub col: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Number of grid rows needed for `tile_count` tiles at `cols` columns
pub fn grid_rows(tile_count: usize, cols: u32) -> u32 {
    (tile_count as u32).div_ceil(cols)
}

/// Partition a canvas into sections no larger than `max_dim` on either
/// axis. Sections tile the canvas exactly: no overlap, no gap.
pub fn split_sections(width: u32, height: u32, max_dim: u32) -> Vec<SectionRect> {
    let x_splits = width.div_ceil(max_dim);
    let y_splits = height.div_ceil(max_dim);

    let mut sections = Vec::with_capacity((x_splits * y_splits) as usize);
    for row in 0..y_splits {
        for col in 0..x_splits {
            let x = col * max_dim;
            let y = row * max_dim;
            sections.push(SectionRect {
                row,
                col,
                x,
                y,
                width: max_dim.min(width - x),
                height: max_dim.min(height - y),
            });
        }
    }
    sections
}

/// Tiles per page given the page capacity in full rows
pub fn paginate(tile_count: usize, cols: u32, rows_per_page: u32) -> Vec<usize> {
    let capacity = (cols * rows_per_page) as usize;
    let mut pages = Vec::new();
    let mut remaining = tile_count;
    while remaining > 0 {
        let take = remaining.min(capacity);
        pages.push(take);
        remaining -= take;
    }
    pages
}

/// Compose all tiles into one mosaic, splitting into bounded sections only
/// when the canvas exceeds `max_dim`. Tiles land row-major in slice order.
pub fn compose_single(
    tiles: &[Tile],
    cols: u32,
    tile_size: u32,
    max_dim: u32,
    output_dir: &Path,
    verbose: bool,
) -> Result<Vec<PathBuf>> {
    let rows = grid_rows(tiles.len(), cols);
    let canvas_width = cols * tile_size;
    let canvas_height = rows * tile_size;
    verbose_println(
        verbose,
        &format!("Assembling {}x{} mosaic canvas", canvas_width, canvas_height),
    );

    let mut canvas: RgbImage = ImageBuffer::new(canvas_width, canvas_height);
    for (index, tile) in tiles.iter().enumerate() {
        let x = (index as u32 % cols) * tile_size;
        let y = (index as u32 / cols) * tile_size;
        imageops::replace(&mut canvas, &tile.image, x as i64, y as i64);
    }

    if canvas_width <= max_dim && canvas_height <= max_dim {
        let output_file = output_dir.join("mosaic.jpg");
        match canvas.save(&output_file) {
            Ok(()) => return Ok(vec![output_file]),
            Err(e) => warn_println(&format!(
                "Failed to save {}: {}. Splitting into sections.",
                output_file.display(),
                e
            )),
        }
    }

    let mut written = Vec::new();
    for section in split_sections(canvas_width, canvas_height, max_dim) {
        let part =
            imageops::crop_imm(&canvas, section.x, section.y, section.width, section.height)
                .to_image();
        let output_file = output_dir.join(format!("mosaic_{}_{}.jpg", section.row, section.col));
        part.save(&output_file)
            .with_context(|| format!("Failed to save mosaic section: {}", output_file.display()))?;
        verbose_println(
            verbose,
            &format!("Saved mosaic section: {}", output_file.display()),
        );
        written.push(output_file);
    }
    Ok(written)
}

/// Compose tiles into fixed-size pages, breaking to a new page before a row
/// would overflow the page height. The final partial page is still written.
pub fn compose_pages(
    tiles: &[Tile],
    cols: u32,
    tile_size: u32,
    page_width: u32,
    page_height: u32,
    output_dir: &Path,
    verbose: bool,
) -> Result<Vec<PathBuf>> {
    let rows_per_page = (page_height / tile_size).max(1);
    let pages = paginate(tiles.len(), cols, rows_per_page);

    let mut written = Vec::new();
    let mut offset = 0usize;
    for (page_index, &count) in pages.iter().enumerate() {
        let mut canvas: RgbImage = ImageBuffer::new(page_width, page_height);
        for (index, tile) in tiles[offset..offset + count].iter().enumerate() {
            let x = (index as u32 % cols) * tile_size;
            let y = (index as u32 / cols) * tile_size;
            imageops::replace(&mut canvas, &tile.image, x as i64, y as i64);
        }
        offset += count;

        let output_file = output_dir.join(format!("page_{}.jpg", page_index + 1));
        canvas
            .save(&output_file)
            .with_context(|| format!("Failed to save mosaic page: {}", output_file.display()))?;
        verbose_println(
            verbose,
            &format!("Saved mosaic page: {}", output_file.display()),
        );
        written.push(output_file);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid_tile(edge: u32, color: [u8; 3]) -> Tile {
        Tile {
            image: ImageBuffer::from_pixel(edge, edge, Rgb(color)),
            source: PathBuf::from(format!("tile_{}_{}_{}.jpg", color[0], color[1], color[2])),
        }
    }

    #[test]
    fn test_grid_rows_rounds_up() {
        assert_eq!(grid_rows(10, 3), 4);
        assert_eq!(grid_rows(9, 3), 3);
        assert_eq!(grid_rows(1, 3), 1);
        assert_eq!(grid_rows(0, 3), 0);
    }

    #[test]
    fn test_split_sections_counts() {
        let sections = split_sections(150, 40, 60);
        // ceil(150/60) = 3 horizontal, ceil(40/60) = 1 vertical
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].width, 60);
        assert_eq!(sections[2].width, 30);
    }

    #[test]
    fn test_split_sections_reconstruct_without_overlap_or_gap() {
        let (width, height, max_dim) = (150u32, 130u32, 60u32);
        let sections = split_sections(width, height, max_dim);

        let mut covered = vec![0u8; (width * height) as usize];
        for section in &sections {
            assert!(section.width <= max_dim && section.height <= max_dim);
            for y in section.y..section.y + section.height {
                for x in section.x..section.x + section.width {
                    covered[(y * width + x) as usize] += 1;
                }
            }
        }
        assert!(covered.iter().all(|&count| count == 1));
    }

    #[test]
    fn test_paginate_matches_page_break_policy() {
        // cols=3, tile=100, page_height=250: two full rows fit per page, so
        // 10 tiles split into a 6-tile page and a 4-tile page.
        assert_eq!(paginate(10, 3, 2), vec![6, 4]);
        assert_eq!(paginate(6, 3, 2), vec![6]);
        assert_eq!(paginate(0, 3, 2), Vec::<usize>::new());
    }

    #[test]
    fn test_compose_single_within_limits() {
        let dir = tempfile::tempdir().unwrap();
        let tiles: Vec<Tile> = vec![
            solid_tile(16, [255, 0, 0]),
            solid_tile(16, [0, 255, 0]),
            solid_tile(16, [0, 0, 255]),
            solid_tile(16, [255, 255, 0]),
            solid_tile(16, [0, 255, 255]),
        ];

        let written = compose_single(&tiles, 2, 16, MAX_CANVAS_DIM, dir.path(), false).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("mosaic.jpg"));

        let mosaic = image::open(&written[0]).unwrap().to_rgb8();
        // 2 columns, 5 tiles -> 3 rows
        assert_eq!(mosaic.dimensions(), (32, 48));

        // Row-major placement: second tile sits in the top-right cell
        let pixel = mosaic.get_pixel(24, 8);
        assert!(pixel[1] > 200 && pixel[0] < 60);
    }

    #[test]
    fn test_compose_single_splits_oversized_canvas() {
        let dir = tempfile::tempdir().unwrap();
        let tiles: Vec<Tile> = (0..5).map(|i| solid_tile(16, [i * 40, 0, 0])).collect();

        // 2 cols x 3 rows of 16px tiles = 32x48 canvas, over a 32px ceiling
        let written = compose_single(&tiles, 2, 16, 32, dir.path(), false).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("mosaic_0_0.jpg"));
        assert!(written[1].ends_with("mosaic_1_0.jpg"));

        let top = image::open(&written[0]).unwrap().to_rgb8();
        let bottom = image::open(&written[1]).unwrap().to_rgb8();
        assert_eq!(top.dimensions(), (32, 32));
        assert_eq!(bottom.dimensions(), (32, 16));
    }

    #[test]
    fn test_compose_pages_breaks_before_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let tiles: Vec<Tile> = (0..10).map(|i| solid_tile(16, [0, i * 25, 0])).collect();

        // Page of 48x40 at 16px tiles: 2 rows fit, third would overflow
        let written = compose_pages(&tiles, 3, 16, 48, 40, dir.path(), false).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("page_1.jpg"));
        assert!(written[1].ends_with("page_2.jpg"));

        for path in &written {
            let page = image::open(path).unwrap().to_rgb8();
            assert_eq!(page.dimensions(), (48, 40));
        }
    }

    #[test]
    fn test_compose_pages_single_partial_page() {
        let dir = tempfile::tempdir().unwrap();
        let tiles: Vec<Tile> = (0..2).map(|i| solid_tile(16, [0, 0, 100 + i * 50])).collect();

        let written = compose_pages(&tiles, 3, 16, 48, 40, dir.path(), false).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("page_1.jpg"));
    }
}
