//! Orientation-aware placement of the two endpoint control points.
//!
//! Only the control point next to waypoint 0 or waypoint N is ever
//! constrained, and only while that end is attached to a connector that
//! reports an orientation. The allowed position lies on the orientation
//! axis through the end waypoint at `distance(end, neighbour) * factor`.

use crate::model::{Axis, Orientation};
use crate::spline::Spline;
use kurbo::Point;

/// Constraint for one attached, oriented end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndConstraint {
    pub orientation: Orientation,
    pub factor: f64,
}

/// Constraints for both ends. `None` means the end is free.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlPointPolicy {
    pub start: Option<EndConstraint>,
    pub end: Option<EndConstraint>,
}

impl ControlPointPolicy {
    /// No constraints at all: every target passes through.
    pub const FREE: Self = Self {
        start: None,
        end: None,
    };

    /// Map a requested control point position at waypoint `index` to the
    /// position the policy allows.
    pub fn constrain(&self, spline: &Spline, index: usize, target: Point) -> Point {
        let last = spline.segment_count();
        if last == 0 {
            return target;
        }
        if index == 0
            && let Some(c) = self.start
        {
            return constrained_point(spline.point_at(0), spline.point_at(1), c);
        }
        if index == last
            && let Some(c) = self.end
        {
            return constrained_point(spline.point_at(last), spline.point_at(last - 1), c);
        }
        target
    }

    /// Whether the control point at waypoint `index` is pinned by an orientation.
    pub fn is_constrained(&self, spline: &Spline, index: usize) -> bool {
        let last = spline.segment_count();
        last > 0 && ((index == 0 && self.start.is_some()) || (index == last && self.end.is_some()))
    }
}

/// Control point position for an end waypoint given its neighbour.
pub fn constrained_point(end: Point, neighbour: Point, c: EndConstraint) -> Point {
    let offset = end.distance(neighbour) * c.factor * c.orientation.sign();
    match c.orientation.axis() {
        Axis::Horizontal => Point::new(end.x + offset, end.y),
        Axis::Vertical => Point::new(end.x, end.y + offset),
    }
}

/// Inverse of `constrained_point`: the factor that places the control point
/// at the projection of `pointer` onto the orientation axis.
///
/// Returns `None` when the reference distance is degenerate. Factors are
/// clamped at zero so the tangent never points into the connector.
pub fn project_factor(
    end: Point,
    pointer: Point,
    orientation: Orientation,
    reference_distance: f64,
) -> Option<f64> {
    if reference_distance <= f64::EPSILON {
        return None;
    }
    let along = (pointer - end).dot(orientation.direction());
    Some((along / reference_distance).max(0.0))
}
