pub mod config;
pub mod connection;
pub mod constraint;
pub mod emitter;
pub mod format;
pub mod hit;
pub mod id;
pub mod kind;
pub mod label;
pub mod model;
pub mod parser;
pub mod spline;

pub use config::{DecodeMode, EngineConfig};
pub use connection::{Connection, ConnectorLookup, Subscriptions};
pub use constraint::{ControlPointPolicy, EndConstraint};
pub use emitter::encode_geometry;
pub use format::format_geometry;
pub use id::{ConnectionId, ConnectorId, FigureId};
pub use kind::ConnectionKind;
pub use label::{Label, ParametricLocator};
pub use model::*;
pub use parser::decode_geometry;
pub use spline::{Knot, Spline};

// Re-export kurbo so downstream crates share the same geometry types
pub use kurbo;
