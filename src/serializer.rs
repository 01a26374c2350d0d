//! Renders an outbound `Update` to the exact bytes that go on the wire.
//!
//! Only the shapes a client ever originates are handled here:
//! `newXXXVector`, `getProperties`, `delProperty` (a targeted unwatch
//! request), and `message`. `defXXXVector`/`setXXXVector` are
//! device-originated and are never serialized by this crate.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::format::NumberFormat;
use crate::message::GetProperties;
use crate::update::{NewProperty, Update};

#[derive(Serialize)]
#[serde(rename = "oneNumber")]
struct WireOneNumber<'a> {
    #[serde(rename = "@name")]
    name: &'a str,
    #[serde(rename = "$text")]
    value: String,
}

#[derive(Serialize)]
#[serde(rename = "newNumberVector")]
struct WireNewNumberVector<'a> {
    #[serde(rename = "@device")]
    device: &'a str,
    #[serde(rename = "@name")]
    name: &'a str,
    #[serde(rename = "@timestamp", skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(rename = "oneNumber")]
    numbers: Vec<WireOneNumber<'a>>,
}

/// Render `update` to its wire bytes, including the trailing LF spec §6
/// requires for every outbound message. `number_formats` supplies the
/// printf/sexagesimal format string for each number element by name — the
/// one piece of information a `NewNumberVector`'s bare `OneNumber`s don't
/// carry on their own, captured by the caller (`Store`/the connection
/// engine) from the `defNumber` that first introduced the element.
pub fn serialize(update: &Update, number_formats: &HashMap<String, String>) -> Result<String> {
    let body = match update {
        Update::NewProperty(NewProperty::Number(v)) => {
            let numbers = v
                .numbers
                .iter()
                .map(|n| WireOneNumber {
                    name: &n.name,
                    value: render_number(n.value, number_formats.get(&n.name).map(String::as_str)),
                })
                .collect();
            let wire = WireNewNumberVector {
                device: &v.device,
                name: &v.name,
                timestamp: v.timestamp.as_ref().map(|t| t.to_string()),
                numbers,
            };
            quick_xml::se::to_string(&wire).map_err(Error::from)?
        }
        Update::NewProperty(NewProperty::Text(v)) => serialize_typed(v)?,
        Update::NewProperty(NewProperty::Switch(v)) => serialize_typed(v)?,
        Update::GetProperties(g) => serialize_typed(g)?,
        Update::DeleteProperty(d) => serialize_typed(d)?,
        Update::Message(m) => serialize_typed(m)?,
        Update::DefineProperty(_) | Update::SetProperty(_) => {
            return Err(Error::Format(
                "defXXXVector/setXXXVector are device-originated; this client never sends them"
                    .to_string(),
            ));
        }
    };
    Ok(format!("{}\n", body))
}

fn serialize_typed<T: Serialize>(value: &T) -> Result<String> {
    quick_xml::se::to_string(value).map_err(Error::from)
}

/// Render a single number element body, falling back to the plain decimal
/// rendering when no format is known or the format string fails to parse
/// (never blocks sending on a cosmetic formatting problem).
fn render_number(value: f64, format: Option<&str>) -> String {
    if value.is_nan() {
        return String::new();
    }
    match format.map(NumberFormat::parse) {
        Some(Ok(fmt)) => fmt.format(value).unwrap_or_else(|_| value.to_string()),
        _ => value.to_string(),
    }
}
