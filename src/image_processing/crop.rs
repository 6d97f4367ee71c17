//! Crop geometry: converts a subject box (or its absence) into a crop
//! rectangle that is fully inside the image.
//!
//! Geometry never fails; pathological detector output degrades to the whole
//! image and is logged as a warning.

use super::detection::BBox;
use crate::utils::warn_println;

/// Pixel rectangle to crop from a source image, 0 <= x0 < x1 <= width and
/// the same for y
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl CropRegion {
    pub fn full_image(width: u32, height: u32) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: width,
            y1: height,
        }
    }

    /// Largest centered square that fits the image
    pub fn centered_min_square(width: u32, height: u32) -> Self {
        let side = width.min(height);
        let x0 = (width - side) / 2;
        let y0 = (height - side) / 2;
        Self {
            x0,
            y0,
            x1: x0 + side,
            y1: y0 + side,
        }
    }

    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }
}

/// Derive the crop rectangle for one image.
///
/// With a subject box: a square of edge max(box_w, box_h, min_edge) + margin
/// centered on the box, each side clamped into the image by a plain max/min.
/// Clamping may shrink the square against a boundary; the result is not
/// re-centered afterwards. Without a box: the largest centered square.
pub fn derive_crop_region(
    image_size: (u32, u32),
    subject: Option<&BBox>,
    min_edge: u32,
    margin: u32,
) -> CropRegion {
    let (width, height) = image_size;

    let bbox = match subject {
        Some(bbox) => bbox,
        None => return CropRegion::centered_min_square(width, height),
    };

    if ![bbox.x0, bbox.y0, bbox.x1, bbox.y1]
        .iter()
        .all(|c| c.is_finite())
    {
        warn_println(&format!(
            "Subject box has non-finite coordinates ({:?}), using the whole image",
            bbox
        ));
        return CropRegion::full_image(width, height);
    }

    let x0 = bbox.x0.clamp(0.0, width as f32) as i64;
    let y0 = bbox.y0.clamp(0.0, height as f32) as i64;
    let x1 = bbox.x1.clamp(0.0, width as f32) as i64;
    let y1 = bbox.y1.clamp(0.0, height as f32) as i64;

    if x0 >= x1 || y0 >= y1 {
        warn_println(&format!(
            "Subject box is empty after clamping ({:?}), using the whole image",
            bbox
        ));
        return CropRegion::full_image(width, height);
    }

    let center_x = (x0 + x1) / 2;
    let center_y = (y0 + y1) / 2;
    let edge = (x1 - x0).max(y1 - y0).max(min_edge as i64) + margin as i64;
    let half = edge / 2;

    let region = CropRegion {
        x0: (center_x - half).max(0) as u32,
        y0: (center_y - half).max(0) as u32,
        x1: (center_x + half).min(width as i64) as u32,
        y1: (center_y + half).min(height as i64) as u32,
    };

    if region.x0 >= region.x1 || region.y0 >= region.y1 {
        warn_println(&format!(
            "Crop collapsed to an empty region for box {:?}, using the whole image",
            bbox
        ));
        return CropRegion::full_image(width, height);
    }

    region
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subject_uses_centered_min_square() {
        let region = derive_crop_region((400, 300), None, 64, 0);
        assert_eq!(
            region,
            CropRegion {
                x0: 50,
                y0: 0,
                x1: 350,
                y1: 300
            }
        );
        assert_eq!(region.width(), region.height());
    }

    #[test]
    fn test_interior_box_square_centered_on_subject() {
        let bbox = BBox::new(400.0, 300.0, 500.0, 360.0);
        let region = derive_crop_region((1000, 800), Some(&bbox), 64, 0);

        // Square of the larger box dimension
        assert_eq!(region.width(), 100);
        assert_eq!(region.height(), 100);

        // Region center stays inside the box rectangle
        let cx = (region.x0 + region.x1) / 2;
        let cy = (region.y0 + region.y1) / 2;
        assert!((400..=500).contains(&cx));
        assert!((300..=360).contains(&cy));
    }

    #[test]
    fn test_min_edge_floor() {
        let bbox = BBox::new(100.0, 100.0, 110.0, 112.0);
        let region = derive_crop_region((1000, 800), Some(&bbox), 64, 0);
        assert_eq!(region.width(), 64);
        assert_eq!(region.height(), 64);
    }

    #[test]
    fn test_margin_expands_square() {
        let bbox = BBox::new(400.0, 300.0, 500.0, 400.0);
        let with_margin = derive_crop_region((1000, 800), Some(&bbox), 64, 20);
        let without = derive_crop_region((1000, 800), Some(&bbox), 64, 0);
        assert_eq!(with_margin.width(), without.width() + 20);
    }

    #[test]
    fn test_clamp_hugs_the_edge_without_recentering() {
        // Subject close to the left border: x0 saturates at 0 and the lost
        // width is not pushed to the right side.
        let bbox = BBox::new(0.0, 300.0, 60.0, 500.0);
        let region = derive_crop_region((1000, 800), Some(&bbox), 64, 0);

        assert_eq!(region.x0, 0);
        assert_eq!(region.x1, 130); // center 30 + half 100
        assert!(region.width() < region.height());
    }

    #[test]
    fn test_nan_box_falls_back_to_full_image() {
        let bbox = BBox::new(f32::NAN, 10.0, 50.0, 50.0);
        let region = derive_crop_region((640, 480), Some(&bbox), 64, 0);
        assert_eq!(region, CropRegion::full_image(640, 480));
    }

    #[test]
    fn test_infinite_box_falls_back_to_full_image() {
        let bbox = BBox::new(0.0, 0.0, f32::INFINITY, 50.0);
        let region = derive_crop_region((640, 480), Some(&bbox), 64, 0);
        assert_eq!(region, CropRegion::full_image(640, 480));
    }

    #[test]
    fn test_inverted_box_falls_back_to_full_image() {
        let bbox = BBox::new(100.0, 100.0, 40.0, 140.0);
        let region = derive_crop_region((640, 480), Some(&bbox), 64, 0);
        assert_eq!(region, CropRegion::full_image(640, 480));
    }

    #[test]
    fn test_box_outside_image_falls_back_to_full_image() {
        // Clamping collapses the box onto the right border
        let bbox = BBox::new(700.0, 100.0, 900.0, 200.0);
        let region = derive_crop_region((640, 480), Some(&bbox), 64, 0);
        assert_eq!(region, CropRegion::full_image(640, 480));
    }

    #[test]
    fn test_min_edge_larger_than_image() {
        let bbox = BBox::new(10.0, 10.0, 30.0, 30.0);
        let region = derive_crop_region((50, 40), Some(&bbox), 64, 0);
        // Square clamps to the image extent instead of collapsing
        assert!(region.width() > 0 && region.height() > 0);
        assert!(region.x1 <= 50 && region.y1 <= 40);
    }
}
