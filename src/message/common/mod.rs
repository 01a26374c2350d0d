pub mod basic;
pub mod message;
pub mod vector;

pub use crate::property::{PropertyPerm, PropertyState};
pub use basic::{DelProperty, GetProperties};
pub use message::Message;
pub use vector::INDIVector;
