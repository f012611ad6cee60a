//! Shared value types for the connection engine.
//!
//! Figures and connectors are owned by the canvas; the engine only sees
//! them through ids and the small descriptors below.

use crate::id::{ConnectorId, FigureId};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

// ─── Orientation ─────────────────────────────────────────────────────────

/// Direction a connector forces the curve to leave or enter in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Top,
    Bottom,
    Left,
    Right,
}

/// Coordinate axis an orientation runs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn axis(self) -> Axis {
        match self {
            Orientation::Left | Orientation::Right => Axis::Horizontal,
            Orientation::Top | Orientation::Bottom => Axis::Vertical,
        }
    }

    /// Top/Left point toward negative coordinates.
    pub fn sign(self) -> f64 {
        match self {
            Orientation::Top | Orientation::Left => -1.0,
            Orientation::Bottom | Orientation::Right => 1.0,
        }
    }

    /// Unit vector pointing away from the connector.
    pub fn direction(self) -> Vec2 {
        match self.axis() {
            Axis::Horizontal => Vec2::new(self.sign(), 0.0),
            Axis::Vertical => Vec2::new(0.0, self.sign()),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Orientation::Top => Orientation::Bottom,
            Orientation::Bottom => Orientation::Top,
            Orientation::Left => Orientation::Right,
            Orientation::Right => Orientation::Left,
        }
    }
}

// ─── Curve addressing ────────────────────────────────────────────────────

/// Which control point of a waypoint: the one before it or the one after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Control point preceding the waypoint (incoming tangent).
    Left,
    /// Control point following the waypoint (outgoing tangent).
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// One of the two ends of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum End {
    Start,
    End,
}

impl End {
    pub fn opposite(self) -> Self {
        match self {
            End::Start => End::End,
            End::End => End::Start,
        }
    }
}

// ─── Figures ─────────────────────────────────────────────────────────────

/// Value types carried along data links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Any,
    Bool,
    Integer,
    Float,
    Text,
}

impl DataType {
    /// Whether a value of `self` can feed an input of type `target`.
    ///
    /// Exact matches and `Any` always pass. Widening (integer → float,
    /// anything → text) only passes when auto-conversion is allowed.
    pub fn feeds(self, target: DataType, allow_auto_conversion: bool) -> bool {
        if self == target || self == DataType::Any || target == DataType::Any {
            return true;
        }
        if !allow_auto_conversion {
            return false;
        }
        matches!(
            (self, target),
            (DataType::Integer, DataType::Float)
                | (DataType::Bool, DataType::Integer)
                | (_, DataType::Text)
        )
    }
}

/// Whether a socket consumes or produces data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocketRole {
    Input,
    Output,
}

/// What kind of shape a connector belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FigureKind {
    /// A process node (activity, gateway, event).
    Node,
    /// A typed data port on a node.
    Socket { role: SocketRole, data_type: DataType },
    /// A text label.
    Label,
}

/// The part of a figure the engine needs for policy decisions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FigureInfo {
    pub id: FigureId,
    pub kind: FigureKind,
}

/// Knobs for `can_link_figures`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkCheck {
    /// Skip data type compatibility entirely.
    pub omit_type_check: bool,
    /// Accept widening conversions between data types.
    pub allow_auto_conversion: bool,
}

// ─── Connection ends ─────────────────────────────────────────────────────

/// An attached end: the connector and the orientation it last reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionEnd {
    pub connector: ConnectorId,
    pub orientation: Option<Orientation>,
}

/// Attachment state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Unconnected,
    StartOnly,
    EndOnly,
    Connected,
}

impl LinkState {
    pub fn from_ends(start: bool, end: bool) -> Self {
        match (start, end) {
            (false, false) => LinkState::Unconnected,
            (true, false) => LinkState::StartOnly,
            (false, true) => LinkState::EndOnly,
            (true, true) => LinkState::Connected,
        }
    }
}

/// Point reflection of `p` through `center`.
pub fn mirror(p: Point, center: Point) -> Point {
    center + (center - p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_signs() {
        assert_eq!(Orientation::Top.sign(), -1.0);
        assert_eq!(Orientation::Left.sign(), -1.0);
        assert_eq!(Orientation::Bottom.sign(), 1.0);
        assert_eq!(Orientation::Right.sign(), 1.0);
        assert_eq!(Orientation::Left.direction(), Vec2::new(-1.0, 0.0));
        assert_eq!(Orientation::Bottom.direction(), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn data_type_conversion_rules() {
        assert!(DataType::Integer.feeds(DataType::Integer, false));
        assert!(DataType::Any.feeds(DataType::Bool, false));
        assert!(!DataType::Integer.feeds(DataType::Float, false));
        assert!(DataType::Integer.feeds(DataType::Float, true));
        assert!(DataType::Float.feeds(DataType::Text, true));
        assert!(!DataType::Text.feeds(DataType::Integer, true));
    }

    #[test]
    fn mirror_reflects_through_center() {
        let p = mirror(Point::new(10.0, 5.0), Point::new(20.0, 0.0));
        assert_eq!(p, Point::new(30.0, -5.0));
    }

    #[test]
    fn link_state_from_ends() {
        assert_eq!(LinkState::from_ends(false, false), LinkState::Unconnected);
        assert_eq!(LinkState::from_ends(true, true), LinkState::Connected);
        assert_eq!(LinkState::from_ends(false, true), LinkState::EndOnly);
    }
}
