//! Engine tunables.
//!
//! All distances are in document units and are deliberately not scaled by
//! the display zoom level.

use serde::{Deserialize, Serialize};

// ─── Defaults ─────────────────────────────────────────────────────────────

/// Width of the stroked outline used for segment hit testing.
pub const HIT_TOLERANCE: f64 = 15.0;
/// Snap radius around an interior waypoint for `join_segments`.
pub const JOIN_RADIUS: f64 = 5.0;
/// Pointer travel required before a handle drag starts mutating.
pub const DRAG_DEADZONE: f64 = 4.0;
/// Endpoint tangent length as a fraction of the neighbour distance.
pub const DEFAULT_FACTOR: f64 = 0.3;
/// Parametric position of the label anchor on the curve.
pub const LABEL_POSITION: f64 = 0.5;
/// Margin added around the curve bounds for `display_box`.
pub const DISPLAY_MARGIN: f64 = 10.0;

/// How `decode_geometry` treats a malformed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeMode {
    /// Skip the bad field, keep everything decoded so far.
    #[default]
    Lenient,
    /// Fail on the first bad field.
    Strict,
}

// ─── Config ───────────────────────────────────────────────────────────────

/// Configuration shared by the geometry, lifecycle, and handle layers.
///
/// Missing keys fall back to the defaults above when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub hit_tolerance: f64,
    pub join_radius: f64,
    pub drag_deadzone: f64,
    pub default_factor: f64,
    pub label_position: f64,
    pub display_margin: f64,
    pub decode_mode: DecodeMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hit_tolerance: HIT_TOLERANCE,
            join_radius: JOIN_RADIUS,
            drag_deadzone: DRAG_DEADZONE,
            default_factor: DEFAULT_FACTOR,
            label_position: LABEL_POSITION,
            display_margin: DISPLAY_MARGIN,
            decode_mode: DecodeMode::Lenient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_config_keeps_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "join_radius": 8.0, "decode_mode": "strict" }"#).unwrap();
        assert_eq!(config.join_radius, 8.0);
        assert_eq!(config.decode_mode, DecodeMode::Strict);
        assert_eq!(config.hit_tolerance, HIT_TOLERANCE);
        assert_eq!(config.default_factor, DEFAULT_FACTOR);
    }

    #[test]
    fn empty_config_is_default() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
