//! Cached point-in-curve hit testing.
//!
//! Each segment is stroked once into a closed outline of fixed width and
//! kept until the geometry changes. A point hits a segment when it lies
//! inside that outline. The cache is either absent or aligned 1:1 with the
//! segment list it was built from.

use kurbo::{BezPath, CubicBez, Point, Rect, Shape, Stroke, StrokeOpts};
use std::cell::OnceCell;

/// Flattening/stroking accuracy in document units.
const STROKE_ACCURACY: f64 = 0.1;

#[derive(Debug, Clone)]
struct SegmentShape {
    bounds: Rect,
    outline: BezPath,
}

#[derive(Debug, Clone)]
struct Shapes {
    /// Union of all segment bounds, for the cheap miss pre-check.
    bounds: Rect,
    segments: Vec<SegmentShape>,
}

/// Lazily built stroked outlines, one per segment.
#[derive(Debug, Clone)]
pub struct HitCache {
    width: f64,
    shapes: OnceCell<Shapes>,
}

impl HitCache {
    pub fn new(width: f64) -> Self {
        Self {
            width,
            shapes: OnceCell::new(),
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// Drop the cached outlines; the next `find` rebuilds them.
    pub fn invalidate(&mut self) {
        if self.shapes.take().is_some() {
            log::trace!("hit cache invalidated");
        }
    }

    /// Number of cached outlines, or `None` when the cache is stale.
    pub fn cached_len(&self) -> Option<usize> {
        self.shapes.get().map(|s| s.segments.len())
    }

    /// Replace the cache with outlines for `segments` right away.
    pub fn rebuild(&mut self, segments: &[CubicBez]) {
        self.shapes = OnceCell::new();
        let _ = self.shapes.set(build_shapes(segments, self.width));
    }

    /// Index of the segment whose outline contains `pt`.
    ///
    /// `segments` is only called when the cache has to be rebuilt.
    pub fn find(&self, pt: Point, segments: impl FnOnce() -> Vec<CubicBez>) -> Option<usize> {
        let shapes = self
            .shapes
            .get_or_init(|| build_shapes(&segments(), self.width));
        if !shapes.bounds.contains(pt) {
            return None;
        }
        shapes
            .segments
            .iter()
            .position(|s| s.bounds.contains(pt) && s.outline.contains(pt))
    }
}

fn build_shapes(segments: &[CubicBez], width: f64) -> Shapes {
    log::trace!("building hit outlines for {} segments", segments.len());
    let style = Stroke::new(width);
    let opts = StrokeOpts::default();
    let half = width / 2.0;

    let mut bounds: Option<Rect> = None;
    let segments: Vec<SegmentShape> = segments
        .iter()
        .map(|seg| {
            let outline = kurbo::stroke(
                seg.path_elements(STROKE_ACCURACY),
                &style,
                &opts,
                STROKE_ACCURACY,
            );
            let seg_bounds = seg.bounding_box().inflate(half, half);
            bounds = Some(bounds.map_or(seg_bounds, |b| b.union(seg_bounds)));
            SegmentShape {
                bounds: seg_bounds,
                outline,
            }
        })
        .collect();

    Shapes {
        bounds: bounds.unwrap_or(Rect::ZERO),
        segments,
    }
}
