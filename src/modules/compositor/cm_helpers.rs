use eframe::egui;
use image::RgbaImage;

/// Axis-aligned rectangle in canvas pixels, always stored as min/max.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRect { pub min_x: i32, pub min_y: i32, pub max_x: i32, pub max_y: i32 }

impl SelectionRect {
    pub fn from_corners(a: (i32, i32), b: (i32, i32)) -> Self {
        Self { min_x: a.0.min(b.0), min_y: a.1.min(b.1), max_x: a.0.max(b.0), max_y: a.1.max(b.1) }
    }

    pub fn width(&self) -> i32 { self.max_x - self.min_x }
    pub fn height(&self) -> i32 { self.max_y - self.min_y }

    /// Same rectangle expressed relative to a layer whose top-left sits at `origin`.
    pub fn relative_to(&self, origin: (i32, i32)) -> (i64, i64, i64, i64) {
        let (ox, oy) = (origin.0 as i64, origin.1 as i64);
        (self.min_x as i64 - ox, self.min_y as i64 - oy, self.max_x as i64 - ox, self.max_y as i64 - oy)
    }
}

/// Screen position to integer canvas pixels, canvas origin at the top-left.
pub(super) fn screen_to_canvas(pos: egui::Pos2, origin: egui::Pos2) -> (i32, i32) {
    ((pos.x - origin.x).floor() as i32, (pos.y - origin.y).floor() as i32)
}

pub(super) fn canvas_to_screen(p: (i32, i32), origin: egui::Pos2) -> egui::Pos2 {
    egui::pos2(origin.x + p.0 as f32, origin.y + p.1 as f32)
}

pub(super) fn layer_rect(pos: (i32, i32), img: &RgbaImage, origin: egui::Pos2) -> egui::Rect {
    egui::Rect::from_min_size(canvas_to_screen(pos, origin), egui::vec2(img.width() as f32, img.height() as f32))
}

pub(super) fn to_color_image(img: &RgbaImage) -> egui::ColorImage {
    egui::ColorImage::from_rgba_unmultiplied([img.width() as usize, img.height() as usize], img.as_raw())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_are_normalized() {
        let r = SelectionRect::from_corners((40, 5), (10, 25));
        assert_eq!(r, SelectionRect { min_x: 10, min_y: 5, max_x: 40, max_y: 25 });
        assert_eq!((r.width(), r.height()), (30, 20));
    }

    #[test]
    fn relative_coordinates_subtract_origin() {
        let r = SelectionRect::from_corners((10, 10), (20, 30));
        assert_eq!(r.relative_to((15, -5)), (-5, 15, 5, 35));
    }

    #[test]
    fn screen_mapping_floors() {
        let origin = egui::pos2(100.0, 50.0);
        assert_eq!(screen_to_canvas(egui::pos2(110.7, 49.5), origin), (10, -1));
        assert_eq!(canvas_to_screen((10, -1), origin), egui::pos2(110.0, 49.0));
    }
}
