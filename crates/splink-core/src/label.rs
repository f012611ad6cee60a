//! Connection label placement.
//!
//! The label hangs off a point at a fixed parametric position on the curve.
//! Only its offset from that anchor is stored, so the label follows the
//! curve as it is reshaped.

use crate::config::LABEL_POSITION;
use crate::spline::Spline;
use kurbo::{Point, Rect, Size, Vec2};

/// Locates the point at a fixed global parameter on a spline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParametricLocator {
    pub position: f64,
}

impl Default for ParametricLocator {
    fn default() -> Self {
        Self {
            position: LABEL_POSITION,
        }
    }
}

impl ParametricLocator {
    pub fn locate(&self, spline: &Spline) -> Point {
        spline.point_on_curve(self.position)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Label {
    pub text: Option<String>,
    /// Measured size of the rendered text, supplied by the canvas.
    pub size: Size,
    pub offset: Vec2,
    pub locator: ParametricLocator,
}

impl Label {
    pub fn at(position: f64) -> Self {
        Self {
            locator: ParametricLocator { position },
            ..Self::default()
        }
    }

    pub fn anchor(&self, spline: &Spline) -> Point {
        self.locator.locate(spline)
    }

    /// Center of the label.
    pub fn position(&self, spline: &Spline) -> Point {
        self.anchor(spline) + self.offset
    }

    /// Place the label center at `p` by recomputing the offset.
    pub fn move_to(&mut self, spline: &Spline, p: Point) {
        self.offset = p - self.anchor(spline);
    }

    /// Box covered by the label text, if there is any text.
    pub fn bounds(&self, spline: &Spline) -> Option<Rect> {
        self.text
            .as_ref()
            .map(|_| Rect::from_center_size(self.position(spline), self.size))
    }
}
