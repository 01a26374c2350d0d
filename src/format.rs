//! Printf-style and sexagesimal number formatting for `Number` elements.
//!
//! Every `defNumber`/`oneNumber` carries a `format` attribute such as
//! `"%6.2f"` (printf) or `"%10.6m"` (sexagesimal, meaning "as sexagesimal
//! with this many characters and this many sub-fields"). The element body
//! itself is always a plain decimal or colon-separated sexagesimal string;
//! the format only governs how a *local* value should be rendered back to
//! the wire (spec §4.E) when this library originates a `newNumberVector`.

use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SEXAGESIMAL_RE: Regex = Regex::new(r"^%(\d+)\.(\d+)m$").unwrap();
    static ref NUMBER_RE: Regex =
        Regex::new(r"^\s*(-?)\s*(\d+(?:\.\d+)?)\s*(?:[:\s]\s*(\d+(?:\.\d+)?))?\s*(?:[:\s]\s*(\d+(?:\.\d+)?))?\s*$")
            .unwrap();
}

/// A parsed `format` attribute, ready to render an `f64` back to text.
#[derive(Debug, Clone, PartialEq)]
pub enum NumberFormat {
    /// A classic printf numeric conversion, e.g. `"%6.2f"`, `"%d"`, `"%g"`.
    Printf(String),
    /// Sexagesimal rendering: `width` total characters, `precision` digits
    /// after the colons (3 = h:m, 5 = h:m.d, 6 = h:m:s, 8 = h:m:s.d, 9 = h:m:s.dd).
    Sexagesimal { width: usize, precision: usize },
}

impl NumberFormat {
    /// Parse a wire `format` attribute such as `"%6.2f"` or `"%10.6m"`.
    pub fn parse(format: &str) -> Result<Self> {
        if let Some(caps) = SEXAGESIMAL_RE.captures(format) {
            let width: usize = caps[1]
                .parse()
                .map_err(|_| Error::Format(format!("invalid sexagesimal width in '{}'", format)))?;
            let precision: usize = caps[2]
                .parse()
                .map_err(|_| Error::Format(format!("invalid sexagesimal precision in '{}'", format)))?;
            return Ok(NumberFormat::Sexagesimal { width, precision });
        }

        if format.matches('%').count() == 1 {
            return Ok(NumberFormat::Printf(format.to_string()));
        }

        Err(Error::Format(format!("unrecognized number format '{}'", format)))
    }

    /// Render `value` per this format.
    pub fn format(&self, value: f64) -> Result<String> {
        match self {
            NumberFormat::Printf(fmt) => format_printf(fmt, value),
            NumberFormat::Sexagesimal { width, precision } => {
                Ok(format_sexagesimal(value, *width, *precision))
            }
        }
    }
}

/// A crude printf-style renderer covering the conversions that actually show
/// up in `defNumber` formats: `%<width>.<prec>f`, `%d`, `%g`, `%e`.
fn format_printf(fmt: &str, value: f64) -> Result<String> {
    let body = fmt
        .strip_prefix('%')
        .ok_or_else(|| Error::Format(format!("format '{}' has no leading %", fmt)))?;
    let conv = body
        .chars()
        .last()
        .ok_or_else(|| Error::Format(format!("format '{}' has no conversion", fmt)))?;
    let spec = &body[..body.len() - conv.len_utf8()];
    let (width, precision) = match spec.split_once('.') {
        Some((w, p)) => (w.parse::<usize>().ok(), p.parse::<usize>().ok()),
        None => (spec.parse::<usize>().ok(), None),
    };

    let rendered = match conv {
        'd' | 'i' => format!("{}", value.round() as i64),
        'e' => match precision {
            Some(p) => format!("{:.*e}", p, value),
            None => format!("{:e}", value),
        },
        'g' => format!("{}", value),
        'f' | 'm' => match precision {
            Some(p) => format!("{:.*}", p, value),
            None => format!("{}", value),
        },
        other => return Err(Error::Format(format!("unsupported printf conversion '{}'", other))),
    };

    match width {
        Some(w) if rendered.len() < w => Ok(format!("{:>width$}", rendered, width = w)),
        _ => Ok(rendered),
    }
}

/// Render `value` as sexagesimal per INDI's `%W.Pm` convention.
///
/// `precision` selects the sub-field layout: 3 → `h:m`, 5 → `h:m.d`,
/// 6 → `h:m:s`, 8 → `h:m:s.d`, 9 → `h:m:s.dd`. `width` is the minimum total
/// field width; short renders are left-padded with spaces.
pub fn format_sexagesimal(value: f64, width: usize, precision: usize) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let mut remainder = value.abs();
    let degrees = remainder.trunc() as i64;
    remainder = (remainder - remainder.trunc()) * 60.0;
    let minutes = remainder.trunc() as i64;
    remainder = (remainder - remainder.trunc()) * 60.0;
    let seconds = remainder;

    let body = match precision {
        3 => format!("{}{}:{:02}", sign, degrees, minutes),
        5 => format!("{}{}:{:02}.{:01}", sign, degrees, minutes, (seconds / 6.0).round() as i64),
        6 => format!("{}{}:{:02}:{:02}", sign, degrees, minutes, seconds.round() as i64),
        8 => format!("{}{}:{:02}:{:04.1}", sign, degrees, minutes, seconds),
        9 => format!("{}{}:{:02}:{:05.2}", sign, degrees, minutes, seconds),
        _ => format!("{}{}:{:02}:{:02}", sign, degrees, minutes, seconds.round() as i64),
    };

    if body.len() < width {
        format!("{:>width$}", body, width = width)
    } else {
        body
    }
}

/// Parse a wire number body, which may be a plain decimal or a
/// colon/space-separated sexagesimal string (`"12:30:00"`, `"-12 30"`).
pub fn parse_number(s: &str) -> Result<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(Error::Format("empty number body".to_string()));
    }
    if let Ok(v) = trimmed.parse::<f64>() {
        return Ok(v);
    }

    let caps = NUMBER_RE
        .captures(trimmed)
        .ok_or_else(|| Error::Format(format!("'{}' is not a valid number", trimmed)))?;
    let negative = &caps[1] == "-";
    let mut value: f64 = caps[2].parse().unwrap_or(0.0);
    let mut scale = 1.0 / 60.0;
    for group in [caps.get(3), caps.get(4)] {
        if let Some(m) = group {
            let part: f64 = m.as_str().parse().unwrap_or(0.0);
            value += part * scale;
            scale /= 60.0;
        }
    }
    Ok(if negative { -value } else { value })
}

/// `serde(deserialize_with)` helper for `oneNumber`/`defNumber` text bodies.
///
/// Per spec §7's general parse-failure policy, a malformed numeric body must
/// not abort the whole fragment: it is coerced to `NaN` and logged, rather
/// than propagated as a deserialization error.
/// An empty (whitespace-only) body is not an error at all (spec §4.C: "this
/// is a documented deviation from the stricter INDI spec but is required
/// because real servers emit it") — it is logged at `debug`, not `warn`, and
/// rendered as `NaN` the same as a genuinely malformed body, since the wire
/// struct's `value: f64` field has no room for a separate "unset" variant.
/// [`crate::store::vector::Property::from_define`] stores this `NaN` as-is
/// in [`crate::store::element::ElementValue::Number`]; nothing in this
/// crate constructs [`crate::store::element::ElementValue::Unset`] for a
/// `Number` element.
pub fn deserialize_wire_number<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    let raw = String::deserialize(deserializer)?;
    if raw.trim().is_empty() {
        tracing::debug!("empty number element body; treating as unset (NaN)");
        return Ok(f64::NAN);
    }
    match parse_number(&raw) {
        Ok(v) => Ok(v),
        Err(_) => {
            tracing::warn!(body = %raw, "number element body failed to parse; using NaN");
            Ok(f64::NAN)
        }
    }
}
