use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::edges::canny;
use log::debug;

use crate::models::TextZone;

/// Boxes must be strictly wider and taller than this to count as text.
pub const MIN_ZONE_WIDTH: u32 = 30;
pub const MIN_ZONE_HEIGHT: u32 = 10;

const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;

/// Locates rectangular text-bearing regions from the outer contours of the
/// edge map.
pub struct ZoneDetector;

impl ZoneDetector {
    /// Bounding boxes of outermost edge contours, without ordering guarantee.
    pub fn detect_zones(image: &GrayImage) -> Vec<TextZone> {
        let edges = canny(image, CANNY_LOW, CANNY_HIGH);

        let zones: Vec<TextZone> = find_contours::<u32>(&edges)
            .into_iter()
            .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
            .filter_map(|contour| Self::bounding_box(&contour.points))
            .filter(|zone| zone.width > MIN_ZONE_WIDTH && zone.height > MIN_ZONE_HEIGHT)
            .collect();

        debug!("Detected {} candidate text zones", zones.len());
        zones
    }

    fn bounding_box(points: &[imageproc::point::Point<u32>]) -> Option<TextZone> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for point in points {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }
        Some(TextZone {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::point::Point;
    use imageproc::rect::Rect;

    fn white(width: u32, height: u32) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([255]))
    }

    #[test]
    fn test_large_block_detected() {
        let mut image = white(120, 80);
        draw_filled_rect_mut(&mut image, Rect::at(20, 20).of_size(60, 20), Luma([0]));

        let zones = ZoneDetector::detect_zones(&image);
        assert!(!zones.is_empty());
        assert!(zones.iter().any(|zone| {
            (18..=21).contains(&zone.x)
                && (58..=64).contains(&zone.width)
                && (18..=24).contains(&zone.height)
        }));
    }

    #[test]
    fn test_small_marks_filtered() {
        let mut image = white(120, 80);
        // Punctuation-sized and too-thin blocks.
        draw_filled_rect_mut(&mut image, Rect::at(10, 10).of_size(6, 6), Luma([0]));
        draw_filled_rect_mut(&mut image, Rect::at(40, 50).of_size(60, 4), Luma([0]));
        draw_filled_rect_mut(&mut image, Rect::at(10, 30).of_size(12, 30), Luma([0]));

        let zones = ZoneDetector::detect_zones(&image);
        assert!(zones.iter().all(|z| z.width > MIN_ZONE_WIDTH && z.height > MIN_ZONE_HEIGHT));
        assert!(zones.is_empty());
    }

    #[test]
    fn test_blank_image_has_no_zones() {
        assert!(ZoneDetector::detect_zones(&white(64, 64)).is_empty());
    }

    #[test]
    fn test_bounding_box() {
        let points = vec![Point::new(5, 9), Point::new(40, 2), Point::new(12, 20)];
        assert_eq!(
            ZoneDetector::bounding_box(&points),
            Some(TextZone { x: 5, y: 2, width: 36, height: 19 })
        );
        assert_eq!(ZoneDetector::bounding_box(&[]), None);
    }
}
