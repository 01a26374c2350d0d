use serde::{Deserialize, Serialize};
use crate::timestamp::INDITimestamp;
use super::one::OneNumber;

/// New number vector
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "newNumberVector")]
pub struct NewNumberVector {
    /// Device name
    #[serde(rename = "@device")]
    pub device: String,
    /// Property name
    #[serde(rename = "@name")]
    pub name: String,
    /// Property timestamp
    #[serde(rename = "@timestamp")]
    pub timestamp: Option<INDITimestamp>,
    /// Number elements
    #[serde(rename = "oneNumber")]
    pub numbers: Vec<OneNumber>,
}
