use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Decides when dragging the chat snaps it onto the guide lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SnapPolicy {
    /// Snap whenever the chat is both cropped and outlined. The override only
    /// changes how the magnet toggle looks.
    #[default]
    FlagsOnly,
    /// Like `FlagsOnly`, but an active override switches snapping off.
    OverrideDisables,
}

impl SnapPolicy {
    pub fn is_active(self, cropped: bool, outlined: bool, magnetic_override: bool) -> bool {
        match self {
            SnapPolicy::FlagsOnly => cropped && outlined,
            SnapPolicy::OverrideDisables => cropped && outlined && !magnetic_override,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SnapPolicy::FlagsOnly => "Cropped + outlined",
            SnapPolicy::OverrideDisables => "Toggle can disable",
        }
    }

    pub fn all() -> [SnapPolicy; 2] { [SnapPolicy::FlagsOnly, SnapPolicy::OverrideDisables] }
}

/// Guide lines sit `offset` pixels in from the left, top and bottom canvas edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapGuides { pub offset: i32, pub tolerance: i32 }

impl Default for SnapGuides {
    fn default() -> Self { Self { offset: 10, tolerance: 10 } }
}

/// Bounding box of pixels with non-zero alpha as `(left, top, right, bottom)`,
/// right and bottom exclusive.
pub fn alpha_bbox(img: &RgbaImage) -> Option<(i32, i32, i32, i32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, px) in img.enumerate_pixels() {
        if px.0[3] == 0 { continue; }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((l, t, r, b)) => (l.min(x), t.min(y), r.max(x), b.max(y)),
        });
    }
    bounds.map(|(l, t, r, b)| (l as i32, t as i32, r as i32 + 1, b as i32 + 1))
}

/// Pulls the visible edges of the chat onto nearby guides. Each edge is corrected
/// on its own; bottom is checked after top so it wins when both are in reach.
pub fn snap_position(pos: (i32, i32), bbox: (i32, i32, i32, i32), canvas_height: u32, guides: SnapGuides) -> (i32, i32) {
    let (left, top, _right, bottom) = bbox;
    let (mut x, mut y) = pos;
    let g: i32 = guides.offset;
    let bottom_guide: i32 = canvas_height as i32 - g;

    if (x + left - g).abs() < guides.tolerance { x = g - left; }
    if (y + top - g).abs() < guides.tolerance { y = g - top; }
    if (y + bottom - bottom_guide).abs() < guides.tolerance { y = bottom_guide - bottom; }
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn policies() {
        assert!(SnapPolicy::FlagsOnly.is_active(true, true, false));
        assert!(SnapPolicy::FlagsOnly.is_active(true, true, true));
        assert!(!SnapPolicy::FlagsOnly.is_active(true, false, true));
        assert!(!SnapPolicy::FlagsOnly.is_active(false, true, false));
        assert!(SnapPolicy::OverrideDisables.is_active(true, true, false));
        assert!(!SnapPolicy::OverrideDisables.is_active(true, true, true));
    }

    #[test]
    fn bbox_ignores_transparent_pixels() {
        let mut img = RgbaImage::from_pixel(10, 8, Rgba([0, 0, 0, 0]));
        assert_eq!(alpha_bbox(&img), None);
        img.put_pixel(2, 3, Rgba([255, 255, 255, 255]));
        img.put_pixel(6, 5, Rgba([0, 0, 0, 1]));
        assert_eq!(alpha_bbox(&img), Some((2, 3, 7, 6)));
    }

    #[test]
    fn left_and_top_snap_within_tolerance() {
        let guides = SnapGuides::default();
        // visible content starts 2px into the image
        let bbox = (2, 2, 20, 20);
        assert_eq!(snap_position((15, 14), bbox, 650, guides), (8, 8));
        // 10px away is outside the strict tolerance
        assert_eq!(snap_position((18, 18), bbox, 650, guides), (18, 18));
    }

    #[test]
    fn bottom_snaps_to_lower_guide() {
        let guides = SnapGuides::default();
        let bbox = (0, 0, 50, 100);
        // bottom edge at 535 + 100 = 635, guide at 640
        assert_eq!(snap_position((300, 535), bbox, 650, guides), (300, 540));
        assert_eq!(snap_position((300, 520), bbox, 650, guides), (300, 520));
    }

    #[test]
    fn bottom_wins_over_top_for_tall_content() {
        let guides = SnapGuides { offset: 10, tolerance: 10 };
        let bbox = (0, 0, 10, 25);
        // top at 12 (near 10) and bottom at 37 (near 40 on a 50px canvas)
        assert_eq!(snap_position((0, 12), bbox, 50, guides), (0, 15));
    }
}
