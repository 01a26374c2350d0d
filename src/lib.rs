#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

//! INDI protocol client implementation in Rust.
//!
//! This crate speaks the INDI (Instrument Neutral Distributed Interface)
//! protocol used in astronomy for device control and automation: a
//! self-healing streaming XML parser, a Device → Property → Element store
//! with watcher fan-out, and two connection engines (blocking and
//! cooperative) sharing the same wire codec.
//!
//! # Features
//! - Async (`tokio`) and blocking (`std::thread`) client variants
//! - A never-panics, chunk-boundary-agnostic streaming XML parser
//! - A watched, change-detecting property store with JSON snapshots
//! - Structured error handling and logging
//!
//! This crate does not implement an INDI server or a CLI; see spec
//! Non-goals.

/// The public client types: [`client::Client`], [`client::BlockingClient`],
/// [`client::ClientConfig`].
pub mod client;
/// The two connection engines driving the TCP stream.
pub mod connection;
/// Error types and handling.
pub mod error;
/// Printf-style and sexagesimal number formatting.
pub mod format;
/// Wire message types (def/set/new/one, per property kind).
pub mod message;
/// The property store: Device → Property → Element tree with watchers.
pub mod store;
/// Synchronization helpers built on store watchers.
pub mod sync;
/// Property types and handling.
pub mod property;
/// The streaming XML parser.
pub mod parser;
/// Renders outbound `Update`s to wire bytes.
pub mod serializer;
/// ISO-8601 timestamps with exact-precision round-trip.
pub mod timestamp;
/// The parsed, kind-dispatching representation of one inbound or outbound
/// protocol message.
pub mod update;

/// Common types and traits.
pub mod prelude {
    pub use crate::client::{BlockingClient, Client, ClientConfig};
    pub use crate::error::Error;
    pub use crate::property::{PropertyKind, PropertyPerm, PropertyState};
    pub use crate::store::element::ElementValue;
    pub use crate::store::vector::Property;
    pub use crate::store::Store;
    pub use crate::sync::StateTarget;
    pub use crate::update::Update;
}

/// Result type for INDI operations.
pub type Result<T> = std::result::Result<T, error::Error>;

/// Version of the INDI protocol implemented by this library.
pub const PROTOCOL_VERSION: &str = "1.7";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_version() {
        assert_eq!(PROTOCOL_VERSION, "1.7");
    }
}
