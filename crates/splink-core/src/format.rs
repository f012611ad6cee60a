//! Geometry formatting pipeline: decode → canonical encode.
//!
//! Used by `splink format` to normalise stored records: rounds coordinates,
//! drops unknown fields, and reorders fields canonically.

use crate::config::EngineConfig;
use crate::connection::Connection;
use crate::emitter::encode_geometry;
use crate::id::ConnectionId;
use crate::kind::ConnectionKind;
use crate::parser::decode_geometry;

/// Decode `text` with `config.decode_mode` and re-emit it canonically.
///
/// The output is idempotent: formatting it again yields the same string.
///
/// # Errors
/// Returns the decode error in strict mode. Lenient decoding never fails.
pub fn format_geometry(text: &str, config: &EngineConfig) -> Result<String, String> {
    let mut scratch = Connection::new(ConnectionId::intern("format"), ConnectionKind::Flow, config);
    decode_geometry(text, &mut scratch, config.decode_mode)?;
    Ok(encode_geometry(&scratch))
}

// ─── Tests ────────────────────────────────────────────────────────────────
