//! The `Update` value: the single discriminated type that flows between the
//! streaming parser (`crate::parser`), the property store (`crate::store`),
//! and the serializer (`crate::serializer`).
//!
//! An `Update` is produced either by parsing an inbound XML fragment, or by
//! the store constructing an outbound mutation in response to a client
//! setting an element's value.

use crate::message::{DelProperty, GetProperties, Message};
use crate::message::{DefLightVector, DefNumberVector, DefSwitchVector, DefTextVector};
use crate::message::{NewNumberVector, NewSwitchVector, NewTextVector};
use crate::message::{SetLightVector, SetNumberVector, SetSwitchVector, SetTextVector};
use crate::property::PropertyKind;
use crate::timestamp::INDITimestamp;

/// Kind-dispatching wrapper around a `defXXXVector` fragment
#[derive(Debug, Clone)]
pub enum DefineProperty {
    /// A number property definition
    Number(DefNumberVector),
    /// A text property definition
    Text(DefTextVector),
    /// A switch property definition
    Switch(DefSwitchVector),
    /// A light property definition
    Light(DefLightVector),
}

impl DefineProperty {
    /// Device this definition belongs to
    pub fn device(&self) -> &str {
        match self {
            DefineProperty::Number(v) => &v.device,
            DefineProperty::Text(v) => &v.device,
            DefineProperty::Switch(v) => &v.device,
            DefineProperty::Light(v) => &v.device,
        }
    }

    /// Property name being defined
    pub fn name(&self) -> &str {
        match self {
            DefineProperty::Number(v) => &v.name,
            DefineProperty::Text(v) => &v.name,
            DefineProperty::Switch(v) => &v.name,
            DefineProperty::Light(v) => &v.name,
        }
    }

    /// The kind discriminant for this definition
    pub fn kind(&self) -> PropertyKind {
        match self {
            DefineProperty::Number(_) => PropertyKind::Number,
            DefineProperty::Text(_) => PropertyKind::Text,
            DefineProperty::Switch(_) => PropertyKind::Switch,
            DefineProperty::Light(_) => PropertyKind::Light,
        }
    }

    /// The server-reported `@timestamp`, if the device sent one (spec §3:
    /// a property's "last-seen timestamp (UTC)").
    pub fn timestamp(&self) -> Option<&INDITimestamp> {
        match self {
            DefineProperty::Number(v) => v.timestamp.as_ref(),
            DefineProperty::Text(v) => v.timestamp.as_ref(),
            DefineProperty::Switch(v) => v.timestamp.as_ref(),
            DefineProperty::Light(v) => v.timestamp.as_ref(),
        }
    }
}

/// Kind-dispatching wrapper around a `setXXXVector` fragment, or a locally
/// constructed outbound mutation carrying the same shape
#[derive(Debug, Clone)]
pub enum SetProperty {
    /// A number property update
    Number(SetNumberVector),
    /// A text property update
    Text(SetTextVector),
    /// A switch property update
    Switch(SetSwitchVector),
    /// A light property update (device-originated only; lights are read-only)
    Light(SetLightVector),
}

impl SetProperty {
    /// Device this update belongs to
    pub fn device(&self) -> &str {
        match self {
            SetProperty::Number(v) => &v.device,
            SetProperty::Text(v) => &v.device,
            SetProperty::Switch(v) => &v.device,
            SetProperty::Light(v) => &v.device,
        }
    }

    /// Property name being updated
    pub fn name(&self) -> &str {
        match self {
            SetProperty::Number(v) => &v.name,
            SetProperty::Text(v) => &v.name,
            SetProperty::Switch(v) => &v.name,
            SetProperty::Light(v) => &v.name,
        }
    }

    /// The kind discriminant for this update
    pub fn kind(&self) -> PropertyKind {
        match self {
            SetProperty::Number(_) => PropertyKind::Number,
            SetProperty::Text(_) => PropertyKind::Text,
            SetProperty::Switch(_) => PropertyKind::Switch,
            SetProperty::Light(_) => PropertyKind::Light,
        }
    }

    /// The server-reported `@timestamp`, if the device sent one (spec §3:
    /// a property's "last-seen timestamp (UTC)").
    pub fn timestamp(&self) -> Option<&INDITimestamp> {
        match self {
            SetProperty::Number(v) => v.timestamp.as_ref(),
            SetProperty::Text(v) => v.timestamp.as_ref(),
            SetProperty::Switch(v) => v.timestamp.as_ref(),
            SetProperty::Light(v) => v.timestamp.as_ref(),
        }
    }
}

/// Kind-dispatching wrapper around a `newXXXVector` fragment: a client→device
/// mutation request. Lights never appear here — they cannot be set by a
/// client.
#[derive(Debug, Clone)]
pub enum NewProperty {
    /// A number property mutation request
    Number(NewNumberVector),
    /// A text property mutation request
    Text(NewTextVector),
    /// A switch property mutation request
    Switch(NewSwitchVector),
}

impl NewProperty {
    /// Device this mutation targets
    pub fn device(&self) -> &str {
        match self {
            NewProperty::Number(v) => &v.device,
            NewProperty::Text(v) => &v.device,
            NewProperty::Switch(v) => &v.device,
        }
    }

    /// Property name being mutated
    pub fn name(&self) -> &str {
        match self {
            NewProperty::Number(v) => &v.name,
            NewProperty::Text(v) => &v.name,
            NewProperty::Switch(v) => &v.name,
        }
    }

    /// The kind discriminant for this mutation
    pub fn kind(&self) -> PropertyKind {
        match self {
            NewProperty::Number(_) => PropertyKind::Number,
            NewProperty::Text(_) => PropertyKind::Text,
            NewProperty::Switch(_) => PropertyKind::Switch,
        }
    }
}

/// A single parsed or outbound protocol event
#[derive(Debug, Clone)]
pub enum Update {
    /// A device announcing a new property (`defXXXVector`)
    DefineProperty(DefineProperty),
    /// A device reporting new element values for an existing property (`setXXXVector`)
    SetProperty(SetProperty),
    /// A device (or client, for a targeted request) removing a property or device (`delProperty`)
    DeleteProperty(DelProperty),
    /// A client requesting the device apply new element values (`newXXXVector`)
    NewProperty(NewProperty),
    /// A client (or, on the wire, rarely a device) requesting property definitions (`getProperties`)
    GetProperties(GetProperties),
    /// Free-form commentary, optionally scoped to a device (`message`)
    Message(Message),
}

impl Update {
    /// Device this update is scoped to, if any. `GetProperties` and
    /// site-wide `Message` updates may have none.
    pub fn device(&self) -> Option<&str> {
        match self {
            Update::DefineProperty(d) => Some(d.device()),
            Update::SetProperty(s) => Some(s.device()),
            Update::DeleteProperty(d) => Some(d.device.as_str()),
            Update::NewProperty(n) => Some(n.device()),
            Update::GetProperties(g) => g.device.as_deref(),
            Update::Message(m) => m.device.as_deref(),
        }
    }
}
