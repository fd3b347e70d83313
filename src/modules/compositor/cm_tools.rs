use image::{imageops, DynamicImage, GrayImage, Luma, RgbImage, Rgba, RgbaImage};
use std::path::Path;
use crate::error::{EditorError, Result};
use super::cm_helpers::SelectionRect;
use super::cm_state::CanvasState;

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Decodes a background. Its alpha is dropped here, so it always pastes opaque.
pub fn decode_background(path: &Path) -> Result<RgbaImage> {
    let img: DynamicImage = image::open(path)
        .map_err(|source| EditorError::ImageLoad { path: path.to_path_buf(), source })?;
    Ok(DynamicImage::ImageRgb8(img.to_rgb8()).to_rgba8())
}

pub fn decode_chat(path: &Path) -> Result<RgbaImage> {
    let img: DynamicImage = image::open(path)
        .map_err(|source| EditorError::ImageLoad { path: path.to_path_buf(), source })?;
    Ok(img.to_rgba8())
}

/// Pixels darker than `threshold` on every channel become fully transparent.
pub fn remove_background(img: &RgbaImage, threshold: u8) -> RgbaImage {
    let mut out: RgbaImage = img.clone();
    for px in out.pixels_mut() {
        let [r, g, b, _] = px.0;
        if r < threshold && g < threshold && b < threshold { *px = TRANSPARENT; }
    }
    out
}

/// Crops the part of `img` (placed at `origin`) covered by `rect`, clamped to the image.
pub fn crop_region(img: &RgbaImage, origin: (i32, i32), rect: SelectionRect) -> Result<RgbaImage> {
    let (x1, y1, x2, y2) = rect.relative_to(origin);
    let (w, h) = (img.width() as i64, img.height() as i64);
    let (x1, y1) = (x1.max(0), y1.max(0));
    let (x2, y2) = (x2.min(w), y2.min(h));
    if x2 - x1 <= 0 || y2 - y1 <= 0 { return Err(EditorError::SelectionTooSmall); }
    Ok(imageops::crop_imm(img, x1 as u32, y1 as u32, (x2 - x1) as u32, (y2 - y1) as u32).to_image())
}

fn dilate_3x3(mask: &GrayImage) -> GrayImage {
    let (w, h) = mask.dimensions();
    GrayImage::from_fn(w, h, |x, y| {
        let mut peak: u8 = 0;
        for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                peak = peak.max(mask.get_pixel(nx, ny).0[0]);
            }
        }
        Luma([peak])
    })
}

/// ITU-R 601 luma in 16-bit fixed point, alpha ignored.
fn luma_601(img: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b, _] = img.get_pixel(x, y).0;
        let l: u32 = (r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16;
        Luma([l as u8])
    })
}

/// Black outline one pixel wide around everything bright in `img`.
pub fn add_outline(img: &RgbaImage) -> RgbaImage {
    let luma: GrayImage = luma_601(img);
    let grown: GrayImage = dilate_3x3(&luma);
    let mut out: RgbaImage = RgbaImage::from_fn(img.width(), img.height(), |x, y| {
        Rgba([0, 0, 0, grown.get_pixel(x, y).0[0]])
    });
    imageops::overlay(&mut out, img, 0, 0);
    out
}

/// Clears `rect` (corners inclusive) to transparent. Anything outside the image is ignored.
/// Returns whether at least one pixel was touched.
pub fn clear_region(img: &mut RgbaImage, origin: (i32, i32), rect: SelectionRect) -> bool {
    let (x1, y1, x2, y2) = rect.relative_to(origin);
    let (w, h) = (img.width() as i64, img.height() as i64);
    let (sx, sy) = (x1.max(0), y1.max(0));
    let (ex, ey) = (x2.min(w - 1), y2.min(h - 1));
    if sx > ex || sy > ey { return false; }
    for y in sy..=ey {
        for x in sx..=ex {
            img.put_pixel(x as u32, y as u32, TRANSPARENT);
        }
    }
    true
}

pub fn rescale(source: &RgbaImage, factor: f32) -> RgbaImage {
    if (factor - 1.0).abs() < f32::EPSILON { return source.clone(); }
    let w: u32 = ((source.width() as f32 * factor) as u32).max(1);
    let h: u32 = ((source.height() as f32 * factor) as u32).max(1);
    imageops::resize(source, w, h, imageops::FilterType::Lanczos3)
}

/// Flattens both layers onto a white canvas of the given size.
pub fn composite(canvas: &CanvasState, width: u32, height: u32) -> RgbImage {
    let mut out: RgbaImage = RgbaImage::from_pixel(width, height, WHITE);
    if let Some(bg) = &canvas.background {
        imageops::replace(&mut out, bg.image(), canvas.bg_pos.0 as i64, canvas.bg_pos.1 as i64);
    }
    if let Some(chat) = &canvas.chat {
        imageops::overlay(&mut out, chat, canvas.chat_pos.0 as i64, canvas.chat_pos.1 as i64);
    }
    DynamicImage::ImageRgba8(out).to_rgb8()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use crate::modules::compositor::cm_state::BackgroundLayer;

    fn solid(w: u32, h: u32, px: [u8; 4]) -> RgbaImage { RgbaImage::from_pixel(w, h, Rgba(px)) }

    #[test]
    fn dark_pixels_become_transparent() {
        let mut img = solid(2, 1, [10, 10, 10, 255]);
        img.put_pixel(1, 0, Rgba([200, 10, 10, 255]));
        let out = remove_background(&img, 50);
        assert_eq!(out.get_pixel(0, 0), &TRANSPARENT);
        assert_eq!(out.get_pixel(1, 0), &Rgba([200, 10, 10, 255]));
    }

    #[test]
    fn threshold_is_strict() {
        let img = solid(1, 1, [50, 0, 0, 255]);
        assert_eq!(remove_background(&img, 50).get_pixel(0, 0), &Rgba([50, 0, 0, 255]));
    }

    #[test]
    fn crop_translates_and_clamps() {
        let mut img = solid(10, 10, [255, 255, 255, 255]);
        img.put_pixel(2, 3, Rgba([1, 2, 3, 255]));
        let rect = SelectionRect::from_corners((105, 53), (0, 0));
        let out = crop_region(&img, (100, 50), rect).unwrap();
        assert_eq!(out.dimensions(), (5, 3));
        let rect = SelectionRect::from_corners((102, 53), (200, 200));
        let out = crop_region(&img, (100, 50), rect).unwrap();
        assert_eq!(out.dimensions(), (8, 7));
        assert_eq!(out.get_pixel(0, 0), &Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn crop_outside_image_is_too_small() {
        let img = solid(10, 10, [255, 255, 255, 255]);
        let rect = SelectionRect::from_corners((300, 300), (400, 400));
        assert!(matches!(crop_region(&img, (0, 0), rect), Err(EditorError::SelectionTooSmall)));
        let line = SelectionRect::from_corners((2, 2), (2, 8));
        assert!(matches!(crop_region(&img, (0, 0), line), Err(EditorError::SelectionTooSmall)));
    }

    #[test]
    fn outline_surrounds_bright_pixels() {
        let mut img = solid(5, 5, [0, 0, 0, 0]);
        img.put_pixel(2, 2, Rgba([255, 255, 255, 255]));
        let out = add_outline(&img);
        assert_eq!(out.get_pixel(2, 2), &Rgba([255, 255, 255, 255]));
        for (x, y) in [(1, 1), (2, 1), (3, 3), (1, 2)] {
            assert_eq!(out.get_pixel(x, y), &Rgba([0, 0, 0, 255]), "({x},{y})");
        }
        assert_eq!(out.get_pixel(0, 0).0[3], 0);
        assert_eq!(out.get_pixel(4, 2).0[3], 0);
    }

    #[test]
    fn outline_strength_uses_601_luma() {
        let mut img = solid(3, 1, [0, 0, 0, 0]);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(2, 0, Rgba([0, 255, 0, 255]));
        let out = add_outline(&img);
        // middle pixel takes the brighter neighbour
        assert_eq!(out.get_pixel(1, 0), &Rgba([0, 0, 0, 150]));

        let mut red = solid(2, 1, [0, 0, 0, 0]);
        red.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        assert_eq!(add_outline(&red).get_pixel(1, 0), &Rgba([0, 0, 0, 76]));
    }

    #[test]
    fn clear_region_is_inclusive_and_clips() {
        let mut img = solid(4, 4, [9, 9, 9, 255]);
        let rect = SelectionRect::from_corners((11, 11), (100, 100));
        assert!(clear_region(&mut img, (10, 10), rect));
        assert_eq!(img.get_pixel(0, 0).0[3], 255);
        assert_eq!(img.get_pixel(1, 1), &TRANSPARENT);
        assert_eq!(img.get_pixel(3, 3), &TRANSPARENT);
        assert_eq!(img.get_pixel(0, 3).0[3], 255);

        let mut untouched = solid(4, 4, [9, 9, 9, 255]);
        let far = SelectionRect::from_corners((-20, -20), (-5, -5));
        assert!(!clear_region(&mut untouched, (0, 0), far));
        assert!(untouched.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn composite_layers_clip_at_canvas_edges() {
        let mut canvas = CanvasState::default();
        canvas.background = Some(BackgroundLayer::new(solid(4, 4, [0, 0, 255, 255]), 1.0));
        canvas.bg_pos = (-2, -2);
        let mut chat = solid(3, 1, [255, 0, 0, 255]);
        chat.put_pixel(1, 0, TRANSPARENT);
        canvas.chat = Some(chat);
        canvas.chat_pos = (4, 5);

        let out = composite(&canvas, 6, 6);
        assert_eq!(out.dimensions(), (6, 6));
        assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 255]));
        assert_eq!(out.get_pixel(1, 1), &Rgb([0, 0, 255]));
        assert_eq!(out.get_pixel(2, 2), &Rgb([255, 255, 255]));
        assert_eq!(out.get_pixel(4, 5), &Rgb([255, 0, 0]));
        assert_eq!(out.get_pixel(5, 5), &Rgb([255, 255, 255]));
    }

    #[test]
    fn rescale_never_collapses_to_zero() {
        let img = solid(10, 4, [1, 1, 1, 255]);
        assert_eq!(rescale(&img, 0.1).dimensions(), (1, 1));
        assert_eq!(rescale(&img, 2.0).dimensions(), (20, 8));
        assert_eq!(rescale(&img, 1.0), img);
    }
}
