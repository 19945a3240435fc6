use serde::{Deserialize, Serialize};

/// Pixel rectangle around one detected face, edges in frame coordinates.
///
/// `right` and `bottom` are exclusive, so `width = right - left`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl FaceBox {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> i32 {
        (self.right - self.left).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.bottom - self.top).max(0)
    }

    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// True when the box lies fully inside a `width × height` frame.
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.left >= 0
            && self.top >= 0
            && self.right <= width as i32
            && self.bottom <= height as i32
            && !self.is_empty()
    }

    /// Intersects the box with the frame bounds.
    pub fn clamp_to(&self, width: u32, height: u32) -> FaceBox {
        let w = width as i32;
        let h = height as i32;
        let left = self.left.clamp(0, w);
        let top = self.top.clamp(0, h);
        FaceBox {
            left,
            top,
            right: self.right.clamp(left, w),
            bottom: self.bottom.clamp(top, h),
        }
    }
}
