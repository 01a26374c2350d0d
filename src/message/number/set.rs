use serde::{Deserialize, Serialize};
use crate::message::common::PropertyState;
use crate::timestamp::INDITimestamp;
use super::one::OneNumber;

/// Set number vector
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "setNumberVector")]
pub struct SetNumberVector {
    /// Device name
    #[serde(rename = "@device")]
    pub device: String,
    /// Property name
    #[serde(rename = "@name")]
    pub name: String,
    /// Property state
    #[serde(rename = "@state")]
    pub state: Option<PropertyState>,
    /// Property timeout - worse-case time to affect a change
    #[serde(rename = "@timeout")]
    pub timeout: Option<f64>,
    /// Property timestamp
    #[serde(rename = "@timestamp")]
    pub timestamp: Option<INDITimestamp>,
    /// Optional message/commentary
    #[serde(rename = "@message")]
    pub message: Option<String>,
    /// Number elements
    #[serde(rename = "oneNumber")]
    pub numbers: Vec<OneNumber>,
}
