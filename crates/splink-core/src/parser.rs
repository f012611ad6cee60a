//! Parser for the geometry record written by the emitter.
//!
//! Built on `winnow` 0.7. Fields are `;`-separated and start with their
//! name; values follow, each introduced by `:`. Unknown field names are
//! ignored so newer writers can add fields.

use crate::config::DecodeMode;
use crate::connection::Connection;
use kurbo::{CubicBez, Vec2};
use winnow::ascii::digit1;
use winnow::combinator::{preceded, repeat};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

/// One decoded field of the record.
#[derive(Debug, Clone, PartialEq)]
enum Field<'a> {
    Points(Vec<CubicBez>),
    Label(Vec2),
    Factors(f64, f64),
    Unknown(&'a str),
}

/// Decode `text` into `connection`.
///
/// In [`DecodeMode::Lenient`] a malformed field is logged and skipped while
/// the well-formed ones are still applied, so this never fails. In
/// [`DecodeMode::Strict`] the first malformed field is returned as an error
/// and the connection is left untouched.
///
/// The hit-test cache is always rebuilt afterwards. Layout is not re-run.
pub fn decode_geometry(
    text: &str,
    connection: &mut Connection,
    mode: DecodeMode,
) -> Result<(), String> {
    let mut fields = Vec::new();
    for raw in text.split(';') {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        match parse_field.parse(raw) {
            Ok(field) => fields.push(field),
            Err(e) => match mode {
                DecodeMode::Strict => return Err(format!("Geometry field `{raw}`: {e}")),
                DecodeMode::Lenient => log::warn!("skipping malformed geometry field `{raw}`"),
            },
        }
    }

    for field in fields {
        match field {
            Field::Points(segments) => connection.set_segments(&segments),
            Field::Label(offset) => connection.set_label_offset(offset),
            Field::Factors(start, end) => connection.set_factors(start, end),
            Field::Unknown(name) => log::debug!("ignoring geometry field `{name}`"),
        }
    }
    connection.rebuild_hit_cache();
    Ok(())
}

// ─── Field parsers ──────────────────────────────────────────────────────

fn parse_field<'a>(input: &mut &'a str) -> ModalResult<Field<'a>> {
    let name = parse_identifier.parse_next(input)?;
    match name {
        "points" => parse_points.map(Field::Points).parse_next(input),
        "label" => parse_pair.map(Field::Label).parse_next(input),
        "factors" => parse_pair
            .map(|v| Field::Factors(v.x, v.y))
            .parse_next(input),
        _ => {
            let _ = take_till::<_, _, ContextError>(0.., ';').parse_next(input);
            Ok(Field::Unknown(name))
        }
    }
}

fn parse_identifier<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_').parse_next(input)
}

/// `:<N>` followed by exactly `8N` values.
fn parse_points(input: &mut &str) -> ModalResult<Vec<CubicBez>> {
    let count = parse_count.parse_next(input)?;
    let expected = count
        .checked_mul(8)
        .ok_or_else(|| ErrMode::Backtrack(ContextError::new()))?;
    let values: Vec<f64> = repeat(expected, parse_value).parse_next(input)?;
    Ok(values
        .chunks_exact(8)
        .map(|v| CubicBez::new((v[0], v[1]), (v[2], v[3]), (v[4], v[5]), (v[6], v[7])))
        .collect())
}

fn parse_count(input: &mut &str) -> ModalResult<usize> {
    preceded(':', digit1.parse_to()).parse_next(input)
}

fn parse_pair(input: &mut &str) -> ModalResult<Vec2> {
    (parse_value, parse_value)
        .map(|(x, y)| Vec2::new(x, y))
        .parse_next(input)
}

fn parse_value(input: &mut &str) -> ModalResult<f64> {
    preceded(':', parse_number).parse_next(input)
}

fn parse_number(input: &mut &str) -> ModalResult<f64> {
    let start = *input;
    if input.starts_with('-') || input.starts_with('+') {
        *input = &input[1..];
    }
    let _ = take_while::<_, _, ErrMode<ContextError>>(1.., |c: char| c.is_ascii_digit())
        .parse_next(input)?;
    if input.starts_with('.') {
        *input = &input[1..];
        let _ =
            take_while::<_, _, ContextError>(0.., |c: char| c.is_ascii_digit()).parse_next(input);
    }
    let matched = &start[..start.len() - input.len()];
    matched
        .parse::<f64>()
        .map_err(|_| ErrMode::Backtrack(ContextError::new()))
}
