//! QR code detection and overlay

use image::{Rgb, RgbImage};
use rqrr::{PreparedImage, Point};
use tracing::debug;

use super::slot::ScanSlot;

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BOX_THICKNESS: u32 = 2;

/// Axis-aligned box in pixel coordinates, inclusive corners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

/// Finds QR codes in frames and records the latest payload
#[derive(Debug, Clone)]
pub struct CodeDetector {
    slot: ScanSlot,
}

impl CodeDetector {
    pub fn new(slot: ScanSlot) -> Self {
        Self { slot }
    }

    /// Decode every code in `frame`, box it, and store its text
    ///
    /// When several codes are in view the last one decoded stays in the slot.
    /// Returns the decoded texts in the order they were processed.
    pub fn detect(&self, frame: &mut RgbImage) -> Vec<String> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Vec::new();
        }

        let mut prepared = PreparedImage::prepare_from_greyscale(
            width as usize,
            height as usize,
            |x, y| luma(frame.get_pixel(x as u32, y as u32)),
        );

        let mut decoded = Vec::new();
        for grid in prepared.detect_grids() {
            match grid.decode() {
                Ok((_meta, content)) => {
                    if let Some(bounds) = bounding_box(&grid.bounds, width, height) {
                        draw_box(frame, bounds, BOX_COLOR, BOX_THICKNESS);
                    }
                    self.slot.store(content.clone());
                    decoded.push(content);
                }
                Err(e) => {
                    debug!("[VIDEO] Undecodable code candidate: {:?}", e);
                }
            }
        }

        decoded
    }
}

fn luma(pixel: &Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0;
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
}

/// Smallest box containing all four corners, clamped to the frame
fn bounding_box(corners: &[Point; 4], width: u32, height: u32) -> Option<BoundingBox> {
    let max_x = width.checked_sub(1)? as i32;
    let max_y = height.checked_sub(1)? as i32;

    let xs = corners.iter().map(|p| p.x.clamp(0, max_x));
    let ys = corners.iter().map(|p| p.y.clamp(0, max_y));

    Some(BoundingBox {
        left: xs.clone().min()? as u32,
        right: xs.max()? as u32,
        top: ys.clone().min()? as u32,
        bottom: ys.max()? as u32,
    })
}

/// Hollow rectangle growing inwards from `bounds`
fn draw_box(image: &mut RgbImage, bounds: BoundingBox, color: Rgb<u8>, thickness: u32) {
    for t in 0..thickness {
        let left = bounds.left + t;
        let top = bounds.top + t;
        let (Some(right), Some(bottom)) = (bounds.right.checked_sub(t), bounds.bottom.checked_sub(t))
        else {
            return;
        };
        if left > right || top > bottom {
            return;
        }

        for x in left..=right {
            image.put_pixel(x, top, color);
            image.put_pixel(x, bottom, color);
        }
        for y in top..=bottom {
            image.put_pixel(left, y, color);
            image.put_pixel(right, y, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::fixtures::render_codes;

    #[test]
    fn test_single_code_is_stored_and_boxed() {
        let slot = ScanSlot::new();
        let detector = CodeDetector::new(slot.clone());
        let mut frame = render_codes(&[r#"{"item_id": "42", "qty": 3}"#]);

        let decoded = detector.detect(&mut frame);

        assert_eq!(decoded, vec![r#"{"item_id": "42", "qty": 3}"#.to_string()]);
        assert_eq!(slot.peek().as_deref(), Some(r#"{"item_id": "42", "qty": 3}"#));
        assert!(frame.pixels().any(|p| *p == BOX_COLOR), "no overlay drawn");
    }

    #[test]
    fn test_two_codes_last_one_wins() {
        let slot = ScanSlot::new();
        let detector = CodeDetector::new(slot.clone());
        let mut frame = render_codes(&["shelf-A", "shelf-B"]);

        let decoded = detector.detect(&mut frame);

        assert_eq!(decoded.len(), 2);
        assert!(decoded.contains(&"shelf-A".to_string()));
        assert!(decoded.contains(&"shelf-B".to_string()));
        assert_eq!(slot.peek(), decoded.last().cloned());
    }

    #[test]
    fn test_blank_frame_leaves_slot_alone() {
        let slot = ScanSlot::new();
        slot.store("earlier".into());
        let detector = CodeDetector::new(slot.clone());
        let mut frame = RgbImage::from_pixel(320, 240, Rgb([255, 255, 255]));

        assert!(detector.detect(&mut frame).is_empty());
        assert_eq!(slot.peek().as_deref(), Some("earlier"));
    }

    #[test]
    fn test_bounding_box_clamps() {
        let corners = [
            Point { x: -5, y: 10 },
            Point { x: 50, y: 8 },
            Point { x: 52, y: 70 },
            Point { x: 2, y: 300 },
        ];
        let bounds = bounding_box(&corners, 100, 100).unwrap();
        assert_eq!(
            bounds,
            BoundingBox { left: 0, top: 8, right: 52, bottom: 99 }
        );
    }

    #[test]
    fn test_draw_box_outline_only() {
        let mut image = RgbImage::new(10, 10);
        draw_box(
            &mut image,
            BoundingBox { left: 1, top: 1, right: 8, bottom: 8 },
            BOX_COLOR,
            2,
        );
        assert_eq!(*image.get_pixel(1, 1), BOX_COLOR);
        assert_eq!(*image.get_pixel(2, 5), BOX_COLOR);
        assert_eq!(*image.get_pixel(5, 5), Rgb([0, 0, 0]));
    }
}
