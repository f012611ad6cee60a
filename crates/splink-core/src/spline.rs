//! Piecewise-cubic curve model.
//!
//! A spline is stored as a flat sequence of knots. Each knot carries the
//! waypoint the curve passes through plus its incoming and outgoing control
//! points, so segment `i` is
//! `(knot[i].point, knot[i].ctrl_out, knot[i + 1].ctrl_in, knot[i + 1].point)`
//! and consecutive segments share their waypoint by construction.
//!
//! The two end knots only use one control point each: knot 0 its
//! `ctrl_out`, the last knot its `ctrl_in`.

use crate::config::HIT_TOLERANCE;
use crate::constraint::ControlPointPolicy;
use crate::hit::HitCache;
use crate::model::{Side, mirror};
use kurbo::{BezPath, CubicBez, ParamCurve, Point, Rect, Shape, Vec2};

/// A waypoint with its two tangent handles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Knot {
    pub point: Point,
    pub ctrl_in: Point,
    pub ctrl_out: Point,
}

impl Knot {
    /// A knot whose control points sit on the waypoint itself.
    pub fn corner(point: Point) -> Self {
        Self {
            point,
            ctrl_in: point,
            ctrl_out: point,
        }
    }

    pub fn ctrl(&self, side: Side) -> Point {
        match side {
            Side::Left => self.ctrl_in,
            Side::Right => self.ctrl_out,
        }
    }

    fn ctrl_mut(&mut self, side: Side) -> &mut Point {
        match side {
            Side::Left => &mut self.ctrl_in,
            Side::Right => &mut self.ctrl_out,
        }
    }

    fn translate(&mut self, delta: Vec2) {
        self.point += delta;
        self.ctrl_in += delta;
        self.ctrl_out += delta;
    }
}

/// An ordered, continuous sequence of cubic Bezier segments.
#[derive(Debug, Clone)]
pub struct Spline {
    knots: Vec<Knot>,
    hit: HitCache,
}

impl Default for Spline {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Spline {
    fn eq(&self, other: &Self) -> bool {
        self.knots == other.knots
    }
}

impl Spline {
    /// An empty spline: zero segments, one degenerate waypoint.
    pub fn new() -> Self {
        Self::with_hit_tolerance(HIT_TOLERANCE)
    }

    pub fn with_hit_tolerance(width: f64) -> Self {
        Self {
            knots: Vec::new(),
            hit: HitCache::new(width),
        }
    }

    /// A single segment from `from` to `to` with control points on the chord.
    pub fn line(from: Point, to: Point) -> Self {
        let mut spline = Self::new();
        spline.push_point(from);
        spline.push_point(to);
        spline
    }

    /// Build from explicit segments. A segment that does not start where the
    /// previous one ended is joined at the previous end point.
    pub fn from_segments(segments: &[CubicBez]) -> Self {
        let mut spline = Self::new();
        spline.replace_segments(segments);
        spline
    }

    /// Replace the whole geometry, keeping the hit tolerance.
    pub fn replace_segments(&mut self, segments: &[CubicBez]) {
        self.knots.clear();
        if let Some(first) = segments.first() {
            self.knots.push(Knot {
                point: first.p0,
                ctrl_in: first.p0,
                ctrl_out: first.p1,
            });
        }
        for (i, seg) in segments.iter().enumerate() {
            let next = segments.get(i + 1);
            if let Some(next) = next
                && next.p0 != seg.p3
            {
                log::warn!(
                    "segment {} starts at {:?}, expected {:?}; joining",
                    i + 1,
                    next.p0,
                    seg.p3
                );
            }
            self.knots.push(Knot {
                point: seg.p3,
                ctrl_in: seg.p2,
                ctrl_out: next.map_or(seg.p3, |n| n.p1),
            });
        }
        self.hit.invalidate();
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn segment_count(&self) -> usize {
        self.knots.len().saturating_sub(1)
    }

    /// Always `segment_count() + 1`, even for an empty spline.
    pub fn waypoint_count(&self) -> usize {
        self.segment_count() + 1
    }

    pub fn is_empty(&self) -> bool {
        self.segment_count() == 0
    }

    /// Index of the last waypoint.
    pub fn last_index(&self) -> usize {
        self.segment_count()
    }

    pub fn knots(&self) -> &[Knot] {
        &self.knots
    }

    pub fn hit_tolerance(&self) -> f64 {
        self.hit.width()
    }

    pub fn segment(&self, i: usize) -> Option<CubicBez> {
        let a = self.knots.get(i)?;
        let b = self.knots.get(i + 1)?;
        Some(CubicBez::new(a.point, a.ctrl_out, b.ctrl_in, b.point))
    }

    pub fn segments(&self) -> impl Iterator<Item = CubicBez> + '_ {
        self.knots
            .windows(2)
            .map(|w| CubicBez::new(w[0].point, w[0].ctrl_out, w[1].ctrl_in, w[1].point))
    }

    /// Waypoint `i`, or the origin when there is no such waypoint.
    pub fn point_at(&self, i: usize) -> Point {
        self.knots.get(i).map_or(Point::ZERO, |k| k.point)
    }

    /// Control point on `side` of waypoint `i`.
    ///
    /// The end waypoints have a single control point; `side` is ignored there.
    pub fn ctrl_point_at(&self, i: usize, side: Side) -> Point {
        let side = self.effective_side(i, side);
        self.knots.get(i).map_or(Point::ZERO, |k| k.ctrl(side))
    }

    /// Whether waypoint `i` is strictly between the two ends.
    pub fn is_interior(&self, i: usize) -> bool {
        i > 0 && i < self.last_index()
    }

    fn effective_side(&self, i: usize, side: Side) -> Side {
        if i == 0 {
            Side::Right
        } else if i == self.last_index() {
            Side::Left
        } else {
            side
        }
    }

    /// Point at global parameter `position` in [0, 1] (clamped).
    pub fn point_on_curve(&self, position: f64) -> Point {
        let n = self.segment_count();
        if n == 0 {
            return self.point_at(0);
        }
        let position = if position.is_nan() {
            0.0
        } else {
            position.clamp(0.0, 1.0)
        };
        let scaled = position * n as f64;
        let index = (scaled.floor() as usize).min(n - 1);
        let t = scaled - index as f64;
        self.segment(index).map_or(Point::ZERO, |seg| seg.eval(t))
    }

    /// Tight bounds of the curve. An empty spline yields a zero-area rect at
    /// its only waypoint.
    pub fn bounds(&self) -> Rect {
        let p0 = self.point_at(0);
        self.segments()
            .map(|seg| seg.bounding_box())
            .reduce(|a, b| a.union(b))
            .unwrap_or_else(|| Rect::from_points(p0, p0))
    }

    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        if let Some(first) = self.knots.first() {
            path.move_to(first.point);
        }
        for seg in self.segments() {
            path.curve_to(seg.p1, seg.p2, seg.p3);
        }
        path
    }

    // ─── Hit testing ─────────────────────────────────────────────────────

    /// Segment whose stroked outline contains (x, y).
    pub fn find_segment(&self, x: f64, y: f64) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        self.hit
            .find(Point::new(x, y), || self.segments().collect())
    }

    /// Number of cached outlines, `None` while stale.
    pub fn cached_shapes(&self) -> Option<usize> {
        self.hit.cached_len()
    }

    pub fn invalidate_cache(&mut self) {
        self.hit.invalidate();
    }

    /// Rebuild the hit cache now instead of on the next hit test.
    pub fn rebuild_cache(&mut self) {
        let segments: Vec<CubicBez> = self.segments().collect();
        self.hit.rebuild(&segments);
    }

    // ─── Mutation ────────────────────────────────────────────────────────

    /// Move waypoint `index` to `target`, carrying its control points along.
    pub fn set_point_at(&mut self, index: usize, target: Point) -> bool {
        let Some(knot) = self.knots.get_mut(index) else {
            return false;
        };
        let delta = target - knot.point;
        knot.translate(delta);
        self.hit.invalidate();
        true
    }

    /// Move a control point. The target goes through `policy` first; at an
    /// interior waypoint the opposite control point is mirrored through the
    /// waypoint to keep the tangent continuous.
    pub fn set_ctrl_point_at(
        &mut self,
        index: usize,
        side: Side,
        target: Point,
        policy: &ControlPointPolicy,
    ) -> bool {
        if index >= self.knots.len() {
            return false;
        }
        let side = self.effective_side(index, side);
        let target = policy.constrain(self, index, target);
        let interior = self.is_interior(index);

        let knot = &mut self.knots[index];
        let center = knot.point;
        *knot.ctrl_mut(side) = target;
        if interior {
            *knot.ctrl_mut(side.opposite()) = mirror(target, center);
        }
        self.hit.invalidate();
        true
    }

    /// Append a waypoint. The new segment's control points sit at the thirds
    /// of its chord.
    pub fn push_point(&mut self, p: Point) {
        match self.knots.last_mut() {
            None => self.knots.push(Knot::corner(p)),
            Some(last) => {
                let third = (p - last.point) / 3.0;
                last.ctrl_out = last.point + third;
                self.knots.push(Knot {
                    point: p,
                    ctrl_in: p - third,
                    ctrl_out: p,
                });
            }
        }
        self.hit.invalidate();
    }

    /// Insert a waypoint on the segment under (x, y), returning its index.
    ///
    /// The segment is subdivided at its parametric midpoint and the new shared
    /// waypoint is then moved onto (x, y). Every interior waypoint the split
    /// touched gets its tangent made symmetric again: the new one, and the
    /// old segment ends when they are not curve endpoints.
    pub fn split_segment(&mut self, x: f64, y: f64) -> Option<usize> {
        let k = self.find_segment(x, y)?;
        let (left, right) = self.segment(k)?.subdivide();

        self.knots[k].ctrl_out = left.p1;
        self.knots[k + 1].ctrl_in = right.p2;
        self.knots.insert(
            k + 1,
            Knot {
                point: left.p3,
                ctrl_in: left.p2,
                ctrl_out: right.p1,
            },
        );

        let index = k + 1;
        self.set_point_at(index, Point::new(x, y));
        let knot = &mut self.knots[index];
        knot.ctrl_in = mirror(knot.ctrl_out, knot.point);

        // Subdivision shortened the handles facing the split.
        if self.is_interior(k) {
            let knot = &mut self.knots[k];
            knot.ctrl_in = mirror(knot.ctrl_out, knot.point);
        }
        if self.is_interior(k + 2) {
            let knot = &mut self.knots[k + 2];
            knot.ctrl_out = mirror(knot.ctrl_in, knot.point);
        }
        self.hit.invalidate();
        log::debug!("split segment {k} at ({x}, {y})");
        Some(index)
    }

    /// Remove the interior waypoint within `radius` of (x, y), merging its
    /// two segments. Returns whether a waypoint was removed.
    pub fn join_segments(&mut self, x: f64, y: f64, radius: f64) -> bool {
        let p = Point::new(x, y);
        let found = (1..self.last_index()).find(|&i| self.knots[i].point.distance(p) <= radius);
        match found {
            Some(i) => {
                log::debug!("join at waypoint {i}");
                self.remove_point(i)
            }
            None => false,
        }
    }

    /// Remove waypoint `i`. At either end this drops the first/last segment;
    /// in between, the two adjoining segments merge into one that keeps the
    /// outer control points.
    pub fn remove_point(&mut self, i: usize) -> bool {
        if i >= self.knots.len() {
            return false;
        }
        self.knots.remove(i);
        self.hit.invalidate();
        true
    }

    /// Run the curve the other way round without changing its shape.
    pub fn reverse(&mut self) {
        self.knots.reverse();
        for knot in &mut self.knots {
            std::mem::swap(&mut knot.ctrl_in, &mut knot.ctrl_out);
        }
        self.hit.invalidate();
    }

    pub fn translate(&mut self, delta: Vec2) {
        for knot in &mut self.knots {
            knot.translate(delta);
        }
        self.hit.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn close(a: Point, b: Point) -> bool {
        a.distance(b) < 1e-9
    }

    /// Two segments through (100, 0) with symmetric handles.
    fn two_segments() -> Spline {
        Spline::from_segments(&[
            CubicBez::new((0.0, 0.0), (30.0, 40.0), (70.0, 40.0), (100.0, 0.0)),
            CubicBez::new((100.0, 0.0), (130.0, -40.0), (170.0, -40.0), (200.0, 0.0)),
        ])
    }

    #[test]
    fn waypoint_count_is_segments_plus_one() {
        let mut spline = Spline::new();
        assert_eq!(spline.segment_count(), 0);
        assert_eq!(spline.waypoint_count(), 1);
        spline.push_point(Point::new(0.0, 0.0));
        assert_eq!(spline.waypoint_count(), 1);
        spline.push_point(Point::new(10.0, 0.0));
        spline.push_point(Point::new(20.0, 5.0));
        assert_eq!(spline.segment_count(), 2);
        assert_eq!(spline.waypoint_count(), 3);
    }

    #[test]
    fn empty_spline_queries_are_degenerate() {
        let spline = Spline::new();
        assert_eq!(spline.point_at(0), Point::ZERO);
        assert_eq!(spline.ctrl_point_at(3, Side::Left), Point::ZERO);
        assert_eq!(spline.point_on_curve(0.5), Point::ZERO);
        assert_eq!(spline.find_segment(0.0, 0.0), None);
    }

    #[test]
    fn segments_share_waypoints() {
        let spline = two_segments();
        let segs: Vec<CubicBez> = spline.segments().collect();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].p3, segs[1].p0);
        assert_eq!(segs[1].p1, Point::new(130.0, -40.0));
    }

    #[test]
    fn set_point_moves_only_that_waypoint() {
        let mut spline = two_segments();
        let before_ctrl_in = spline.ctrl_point_at(1, Side::Left);
        assert!(spline.set_point_at(1, Point::new(110.0, 15.0)));
        assert_eq!(spline.point_at(1), Point::new(110.0, 15.0));
        assert_eq!(spline.point_at(0), Point::new(0.0, 0.0));
        assert_eq!(spline.point_at(2), Point::new(200.0, 0.0));
        // Handles ride along with the waypoint.
        assert_eq!(
            spline.ctrl_point_at(1, Side::Left),
            before_ctrl_in + Vec2::new(10.0, 15.0)
        );
        assert!(!spline.set_point_at(7, Point::ZERO));
    }

    #[test]
    fn endpoint_ctrl_point_is_not_mirrored() {
        let mut spline = Spline::line(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        let end_ctrl = spline.ctrl_point_at(1, Side::Left);
        spline.set_ctrl_point_at(0, Side::Right, Point::new(20.0, 30.0), &ControlPointPolicy::FREE);
        assert_eq!(spline.ctrl_point_at(0, Side::Right), Point::new(20.0, 30.0));
        assert_eq!(spline.knots()[0].ctrl_in, Point::new(0.0, 0.0));
        assert_eq!(spline.ctrl_point_at(1, Side::Left), end_ctrl);
    }

    #[test]
    fn interior_ctrl_point_mirrors_through_waypoint() {
        let mut spline = two_segments();
        spline.set_ctrl_point_at(1, Side::Left, Point::new(80.0, 20.0), &ControlPointPolicy::FREE);
        assert_eq!(spline.ctrl_point_at(1, Side::Left), Point::new(80.0, 20.0));
        assert_eq!(spline.ctrl_point_at(1, Side::Right), Point::new(120.0, -20.0));

        spline.set_ctrl_point_at(1, Side::Right, Point::new(100.0, 50.0), &ControlPointPolicy::FREE);
        assert_eq!(spline.ctrl_point_at(1, Side::Left), Point::new(100.0, -50.0));
    }

    #[test]
    fn point_on_curve_hits_ends_and_clamps() {
        let spline = two_segments();
        assert_eq!(spline.point_on_curve(0.0), spline.point_at(0));
        assert_eq!(spline.point_on_curve(1.0), spline.point_at(2));
        assert_eq!(spline.point_on_curve(-3.0), spline.point_at(0));
        assert_eq!(spline.point_on_curve(7.5), spline.point_at(2));
        assert!(close(spline.point_on_curve(0.5), Point::new(100.0, 0.0)));
        // Midpoint of the first segment.
        assert!(close(spline.point_on_curve(0.25), Point::new(50.0, 30.0)));
    }

    #[test]
    fn split_inserts_waypoint_at_click() {
        let mut spline = Spline::line(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        let index = spline.split_segment(50.0, 3.0);
        assert_eq!(index, Some(1));
        assert_eq!(spline.segment_count(), 2);
        assert_eq!(spline.point_at(1), Point::new(50.0, 3.0));
        assert_eq!(spline.point_at(0), Point::new(0.0, 0.0));
        assert_eq!(spline.point_at(2), Point::new(100.0, 0.0));
        let knot = spline.knots()[1];
        assert!(close(mirror(knot.ctrl_out, knot.point), knot.ctrl_in));
    }

    #[test]
    fn split_middle_segment_keeps_neighbours_smooth() {
        let mut spline = Spline::new();
        for x in [0.0, 100.0, 200.0, 300.0] {
            spline.push_point(Point::new(x, 0.0));
        }
        let free = ControlPointPolicy::FREE;
        spline.set_ctrl_point_at(1, Side::Right, Point::new(130.0, 30.0), &free);
        spline.set_ctrl_point_at(2, Side::Left, Point::new(170.0, 30.0), &free);

        assert_eq!(spline.split_segment(150.0, 22.5), Some(2));
        assert_eq!(spline.segment_count(), 4);
        for i in 1..=3 {
            let knot = spline.knots()[i];
            assert!(close(mirror(knot.ctrl_out, knot.point), knot.ctrl_in), "waypoint {i}: {knot:?}");
        }
        // The split side keeps the subdivided handle.
        assert!(close(spline.ctrl_point_at(1, Side::Right), Point::new(115.0, 15.0)));
        assert!(close(spline.ctrl_point_at(3, Side::Left), Point::new(185.0, 15.0)));
    }

    #[test]
    fn split_far_from_curve_is_a_no_op() {
        let mut spline = Spline::line(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        assert_eq!(spline.split_segment(50.0, 60.0), None);
        assert_eq!(spline.segment_count(), 1);
    }

    #[test]
    fn join_removes_interior_waypoint() {
        let mut spline = two_segments();
        assert!(spline.join_segments(102.0, 2.0, 5.0));
        assert_eq!(spline.segment_count(), 1);
        let seg = spline.segment(0).unwrap();
        assert_eq!(seg.p0, Point::new(0.0, 0.0));
        assert_eq!(seg.p1, Point::new(30.0, 40.0));
        assert_eq!(seg.p2, Point::new(170.0, -40.0));
        assert_eq!(seg.p3, Point::new(200.0, 0.0));
    }

    #[test]
    fn join_far_away_changes_nothing() {
        let mut spline = two_segments();
        let before = spline.clone();
        assert!(!spline.join_segments(150.0, 50.0, 5.0));
        // End waypoints are never joined.
        assert!(!spline.join_segments(0.0, 0.0, 5.0));
        assert_eq!(spline, before);
    }

    #[test]
    fn remove_endpoint_drops_segment() {
        let mut spline = two_segments();
        assert!(spline.remove_point(0));
        assert_eq!(spline.segment_count(), 1);
        assert_eq!(spline.point_at(0), Point::new(100.0, 0.0));
        assert!(spline.remove_point(1));
        assert_eq!(spline.segment_count(), 0);
        assert!(!spline.remove_point(4));
    }

    #[test]
    fn reverse_keeps_shape() {
        let mut spline = two_segments();
        let mid = spline.point_on_curve(0.25);
        spline.reverse();
        assert_eq!(spline.point_at(0), Point::new(200.0, 0.0));
        assert_eq!(spline.ctrl_point_at(0, Side::Right), Point::new(170.0, -40.0));
        assert!(close(spline.point_on_curve(0.75), mid));
    }

    #[test]
    fn mutations_invalidate_hit_cache() {
        let mut spline = two_segments();
        spline.rebuild_cache();
        assert_eq!(spline.cached_shapes(), Some(2));
        spline.set_point_at(2, Point::new(210.0, 0.0));
        assert_eq!(spline.cached_shapes(), None);
        assert!(spline.find_segment(100.0, 0.0).is_some());
        assert_eq!(spline.cached_shapes(), Some(2));
        spline.push_point(Point::new(300.0, 0.0));
        assert_eq!(spline.cached_shapes(), None);
    }

    #[test]
    fn bounds_cover_curve() {
        let spline = two_segments();
        let b = spline.bounds();
        assert_eq!(b.x0, 0.0);
        assert_eq!(b.x1, 200.0);
        assert!(b.y1 > 29.0 && b.y1 <= 30.0 + 1e-9);
    }
}
