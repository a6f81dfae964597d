use serde::{Deserialize, Serialize};

/// Axis-aligned crop rectangle in pixels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CropRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Create a new rectangle from origin and size
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Both dimensions are non-zero
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn x2(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn y2(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// Scale origin and size by `factor`, rounding to the nearest pixel
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            x: (self.x as f64 * factor).round() as i32,
            y: (self.y as f64 * factor).round() as i32,
            width: (self.width as f64 * factor).round() as u32,
            height: (self.height as f64 * factor).round() as u32,
        }
    }

    /// Shift by (dx, dy)
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// True when the whole rectangle lies inside a `width` x `height` image
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.is_valid()
            && self.x >= 0
            && self.y >= 0
            && self.x2() <= width as i64
            && self.y2() <= height as i64
    }

    /// Intersection with a `width` x `height` image, if any pixels remain
    pub fn clamped_to(&self, width: u32, height: u32) -> Option<Self> {
        let x1 = self.x.max(0) as i64;
        let y1 = self.y.max(0) as i64;
        let x2 = self.x2().min(width as i64);
        let y2 = self.y2().min(height as i64);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        Some(Self {
            x: x1 as i32,
            y: y1 as i32,
            width: (x2 - x1) as u32,
            height: (y2 - y1) as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_validation() {
        assert!(CropRect::new(0, 0, 10, 10).is_valid());
        assert!(!CropRect::new(0, 0, 0, 10).is_valid());
        assert!(!CropRect::new(0, 0, 10, 0).is_valid());
    }

    #[test]
    fn test_rect_scaled_rounds() {
        let rect = CropRect::new(10, 20, 30, 41);
        assert_eq!(rect.scaled(1.5), CropRect::new(15, 30, 45, 62));
        assert_eq!(rect.scaled(0.5), CropRect::new(5, 10, 15, 21));
    }

    #[test]
    fn test_rect_fits_within() {
        let rect = CropRect::new(10, 10, 90, 40);
        assert!(rect.fits_within(100, 50));
        // Exclusive far edge
        assert!(!rect.fits_within(99, 50));
        assert!(!rect.fits_within(100, 49));
        assert!(!CropRect::new(-1, 0, 10, 10).fits_within(100, 100));
        assert!(!CropRect::new(0, 0, 0, 10).fits_within(100, 100));
    }

    #[test]
    fn test_rect_clamped_to() {
        let rect = CropRect::new(-10, 20, 50, 100);
        assert_eq!(rect.clamped_to(30, 60), Some(CropRect::new(0, 20, 30, 40)));
        assert_eq!(CropRect::new(40, 0, 10, 10).clamped_to(30, 60), None);
    }
}
