//! Bounding box type in COCO's native XYWH format.

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in XYWH format: `[x, y, width, height]`
/// where `(x, y)` is the top-left corner in absolute pixel coordinates.
///
/// This is COCO's on-disk representation and the canonical format for this
/// crate; it serializes transparently as a four-element JSON array.
///
/// Note: this type does NOT enforce that the box lies within any image
/// bounds, or that width/height are non-negative. Malformed boxes are
/// representable on purpose - validation should catch and report them
/// rather than preventing them from being loaded.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bbox(pub [f64; 4]);

impl Bbox {
    /// Creates a new bounding box from explicit components.
    #[inline]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self([x, y, width, height])
    }

    /// Returns the x coordinate of the top-left corner.
    #[inline]
    pub fn x(&self) -> f64 {
        self.0[0]
    }

    /// Returns the y coordinate of the top-left corner.
    #[inline]
    pub fn y(&self) -> f64 {
        self.0[1]
    }

    /// Returns the width of the bounding box.
    #[inline]
    pub fn width(&self) -> f64 {
        self.0[2]
    }

    /// Returns the height of the bounding box.
    #[inline]
    pub fn height(&self) -> f64 {
        self.0[3]
    }

    /// Returns the area of the bounding box.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Returns a copy scaled component-wise: x and width by `scale_x`,
    /// y and height by `scale_y`.
    #[inline]
    pub fn scaled(&self, scale_x: f64, scale_y: f64) -> Self {
        Self([
            self.0[0] * scale_x,
            self.0[1] * scale_y,
            self.0[2] * scale_x,
            self.0[3] * scale_y,
        ])
    }

    /// Returns a copy clipped to `[0, width] x [0, height]` image bounds.
    ///
    /// The top-left corner is clamped into the image first, then the box
    /// extent is reduced so the bottom-right corner stays inside as well.
    pub fn clamped(&self, image_width: f64, image_height: f64) -> Self {
        let x = self.x().clamp(0.0, image_width);
        let y = self.y().clamp(0.0, image_height);
        let w = self.width().clamp(0.0, image_width - x);
        let h = self.height().clamp(0.0, image_height - y);
        Self([x, y, w, h])
    }

    /// Returns true if the box lies entirely within `[0, width] x [0, height]`.
    pub fn within_bounds(&self, image_width: f64, image_height: f64) -> bool {
        self.x() >= 0.0
            && self.y() >= 0.0
            && self.width() >= 0.0
            && self.height() >= 0.0
            && self.x() + self.width() <= image_width
            && self.y() + self.height() <= image_height
    }

    /// Returns true if all components are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl std::fmt::Debug for Bbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bbox")
            .field("x", &self.0[0])
            .field("y", &self.0[1])
            .field("width", &self.0[2])
            .field("height", &self.0[3])
            .finish()
    }
}

impl Default for Bbox {
    fn default() -> Self {
        Self([0.0, 0.0, 0.0, 0.0])
    }
}

impl From<[f64; 4]> for Bbox {
    fn from(raw: [f64; 4]) -> Self {
        Self(raw)
    }
}
