// File: crates/sextant-core/src/geometry.rs
// Summary: Lightweight geometry helpers for pixel math.

use crate::types::Insets;

/// Pixel dimensions of a drawing region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RectI32 {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl RectI32 {
    pub const fn from_ltrb(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }
    pub const fn width(&self) -> i32 { self.right - self.left }
    pub const fn height(&self) -> i32 { self.bottom - self.top }

    /// Plot area left after removing `insets` from a surface of `size`.
    /// Degenerate sizes collapse to a 1px area instead of inverting.
    pub fn plot_area(size: Size, insets: &Insets) -> Self {
        let w = size.width as i32;
        let h = size.height as i32;
        let left = (insets.left as i32).min(w - 1).max(0);
        let top = (insets.top as i32).min(h - 1).max(0);
        let right = (w - insets.right as i32).max(left + 1);
        let bottom = (h - insets.bottom as i32).max(top + 1);
        Self { left, top, right, bottom }
    }
}

#[inline]
pub fn clamp<T: PartialOrd>(v: T, lo: T, hi: T) -> T {
    if v < lo { lo } else if v > hi { hi } else { v }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_area_removes_insets() {
        let r = RectI32::plot_area(Size::new(200, 100), &Insets::new(10, 20, 5, 15));
        assert_eq!(r, RectI32::from_ltrb(10, 5, 180, 85));
        assert_eq!(r.width(), 170);
        assert_eq!(r.height(), 80);
    }

    #[test]
    fn plot_area_never_inverts_on_tiny_surfaces() {
        let r = RectI32::plot_area(Size::new(20, 10), &Insets::default());
        assert!(r.width() >= 1);
        assert!(r.height() >= 1);
    }
}
