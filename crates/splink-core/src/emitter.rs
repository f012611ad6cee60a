//! Emitter: Connection geometry → compact text record.
//!
//! `points:<N>:<8N numbers>;label:<dx>:<dy>;factors:<start>:<end>`
//!
//! Coordinates and the label offset are rounded to whole units; factors keep
//! their shortest decimal form. The output round-trips through the parser.
//!
//! Only whole segments are written. A spline holding a single waypoint (one
//! pushed point, no segment yet) encodes as `points:0` and that waypoint is
//! not kept.

use crate::connection::Connection;
use kurbo::Point;
use std::fmt::Write;

/// Encode a connection's segments, label offset, and endpoint factors.
#[must_use]
pub fn encode_geometry(connection: &Connection) -> String {
    let spline = connection.spline();
    let mut out = String::with_capacity(48 + spline.segment_count() * 40);

    let _ = write!(out, "points:{}", spline.segment_count());
    for seg in spline.segments() {
        for p in [seg.p0, seg.p1, seg.p2, seg.p3] {
            emit_point(&mut out, p);
        }
    }

    let offset = connection.label.offset;
    let _ = write!(
        out,
        ";label:{}:{}",
        format_coord(offset.x),
        format_coord(offset.y)
    );
    let _ = write!(
        out,
        ";factors:{}:{}",
        connection.start_factor(),
        connection.end_factor()
    );
    out
}

fn emit_point(out: &mut String, p: Point) {
    let _ = write!(out, ":{}:{}", format_coord(p.x), format_coord(p.y));
}

fn format_coord(v: f64) -> i64 {
    v.round() as i64
}
