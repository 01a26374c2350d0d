//! INDI Protocol Message Types
//!
//! This module implements the typed wire-message structs for the INDI
//! (Instrument Neutral Distributed Interface) protocol, as defined in the
//! [INDI Protocol Specification](https://www.indilib.org/develop/developer-manual/104-indi-protocol.html).
//!
//! The protocol is XML-based and defines several message shapes for device
//! control and property management:
//!
//! - Property Definitions (defXXXVector)
//! - Property Updates (setXXXVector, newXXXVector)
//! - Property Queries (getProperties)
//! - Property Deletion (delProperty)
//! - Free-form commentary (message)
//!
//! Each property kind (Number, Text, Switch, Light) has its own module with
//! a consistent structure:
//! - `define.rs`: Property definition types (defXXXVector)
//! - `set.rs`: Property update types sent by the device (setXXXVector)
//! - `new.rs`: Property update requests sent by the client (newXXXVector)
//!
//! BLOB vectors are intentionally not modeled: this crate recognizes BLOB
//! start tags at the wire level so the streaming parser can skip their
//! subtrees without mistaking them for malformed input, but never buffers
//! BLOB payloads or exposes them as store properties.
//!
//! Common functionality is shared through the `common` module, including the
//! `INDIVector` trait, which provides a unified interface for all vector
//! types, and the canonical `PropertyState`/`PropertyPerm` value types
//! (re-exported here from `crate::property`, the single source of truth for
//! all enum wire casings).
//!
//! These structs are the typed payload the streaming parser (`crate::parser`)
//! populates from a complete top-level XML fragment, and the shape the
//! serializer (`crate::serializer`) renders back to bytes; `message` itself
//! never parses a live, indefinite byte stream — see `crate::parser` for that.

pub mod common;
pub mod light;
pub mod number;
pub mod switch;
pub mod text;

pub use common::vector::INDIVector;
pub use common::{DelProperty, GetProperties, Message};
pub use light::{DefLight, DefLightVector, OneLight, SetLightVector};
pub use number::{DefNumber, DefNumberVector, NewNumberVector, OneNumber, SetNumberVector};
pub use switch::{DefSwitch, DefSwitchVector, NewSwitchVector, OneSwitch, SetSwitchVector};
pub use text::{DefText, DefTextVector, NewTextVector, OneText, SetTextVector};

/// Top-level tag names recognized for BLOB vectors. Not modeled as typed
/// structs (BLOB payloads are out of scope); kept here purely so the parser
/// can recognize and skip these subtrees instead of treating them as
/// unrecognized input.
pub const BLOB_TAGS: &[&str] = &["defBLOBVector", "setBLOBVector"];
