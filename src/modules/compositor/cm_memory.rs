use image::{imageops, Rgb, RgbImage};
use crate::error::{EditorError, Result};

pub const DEFAULT_MEMORY_LIMIT: usize = 5;

/// Composited canvases waiting to be glued into one tall export.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryBuffer {
    slots: Vec<RgbImage>,
    limit: usize,
}

impl MemoryBuffer {
    pub fn new(limit: usize) -> Self { Self { slots: Vec::new(), limit: limit.max(1) } }

    pub fn len(&self) -> usize { self.slots.len() }
    pub fn is_empty(&self) -> bool { self.slots.is_empty() }
    pub fn is_full(&self) -> bool { self.slots.len() >= self.limit }
    pub fn limit(&self) -> usize { self.limit }
    pub fn clear(&mut self) { self.slots.clear(); }

    /// Appends a snapshot and returns the new count.
    pub fn push(&mut self, img: RgbImage) -> Result<usize> {
        if self.is_full() { return Err(EditorError::MemoryFull { limit: self.limit }); }
        self.slots.push(img);
        Ok(self.slots.len())
    }

    /// Stacks the first `count` snapshots top to bottom on a white sheet of
    /// `width` x `height * count`. Snapshots of another size are clipped or padded.
    pub fn stack(&self, count: usize, width: u32, height: u32) -> Result<RgbImage> {
        if self.slots.is_empty() { return Err(EditorError::MemoryEmpty); }
        if count == 0 || count > self.slots.len() {
            return Err(EditorError::InvalidExportCount { requested: count, available: self.slots.len() });
        }
        let total: u32 = u32::try_from(count).ok()
            .and_then(|c| height.checked_mul(c))
            .ok_or(EditorError::SheetTooLarge { count, height })?;
        let mut sheet: RgbImage = RgbImage::from_pixel(width, total, Rgb([255, 255, 255]));
        for (i, slot) in self.slots.iter().take(count).enumerate() {
            imageops::replace(&mut sheet, slot, 0, i as i64 * height as i64);
        }
        Ok(sheet)
    }
}

impl Default for MemoryBuffer {
    fn default() -> Self { Self::new(DEFAULT_MEMORY_LIMIT) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shade(v: u8) -> RgbImage { RgbImage::from_pixel(4, 3, Rgb([v, v, v])) }

    #[test]
    fn rejects_push_beyond_limit() {
        let mut mem = MemoryBuffer::new(5);
        for i in 0..5 {
            assert_eq!(mem.push(shade(i)).unwrap(), i as usize + 1);
        }
        assert!(mem.is_full());
        assert!(matches!(mem.push(shade(9)), Err(EditorError::MemoryFull { limit: 5 })));
        assert_eq!(mem.len(), 5);
    }

    #[test]
    fn stacks_first_images_vertically() {
        let mut mem = MemoryBuffer::new(5);
        for v in [10, 20, 30, 40, 50] { mem.push(shade(v)).unwrap(); }
        let sheet = mem.stack(3, 4, 3).unwrap();
        assert_eq!(sheet.dimensions(), (4, 9));
        assert_eq!(sheet.get_pixel(0, 0), &Rgb([10, 10, 10]));
        assert_eq!(sheet.get_pixel(3, 4), &Rgb([20, 20, 20]));
        assert_eq!(sheet.get_pixel(2, 8), &Rgb([30, 30, 30]));
    }

    #[test]
    fn stack_pads_smaller_snapshots_with_white() {
        let mut mem = MemoryBuffer::new(2);
        mem.push(shade(0)).unwrap();
        let sheet = mem.stack(1, 6, 5).unwrap();
        assert_eq!(sheet.dimensions(), (6, 5));
        assert_eq!(sheet.get_pixel(5, 4), &Rgb([255, 255, 255]));
        assert_eq!(sheet.get_pixel(3, 2), &Rgb([0, 0, 0]));
    }

    #[test]
    fn stack_validates_count() {
        let mut mem = MemoryBuffer::new(5);
        assert!(matches!(mem.stack(1, 4, 3), Err(EditorError::MemoryEmpty)));
        mem.push(shade(1)).unwrap();
        assert!(matches!(mem.stack(0, 4, 3), Err(EditorError::InvalidExportCount { requested: 0, available: 1 })));
        assert!(matches!(mem.stack(2, 4, 3), Err(EditorError::InvalidExportCount { requested: 2, available: 1 })));
    }

    #[test]
    fn stack_height_overflow_is_an_error() {
        let mut mem = MemoryBuffer::new(5);
        for _ in 0..5 { mem.push(RgbImage::new(1, 1)).unwrap(); }
        assert!(matches!(mem.stack(5, 1, 1_000_000_000), Err(EditorError::SheetTooLarge { count: 5, height: 1_000_000_000 })));
    }
}
