use super::one::OneLight;
use crate::property::PropertyState;
use crate::timestamp::INDITimestamp;
use serde::{Deserialize, Serialize};

/// Set light vector command
///
/// Lights are status indicators only: a device updates their state to
/// reflect internal status and the client never sends `newLightVector`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "setLightVector")]
pub struct SetLightVector {
    /// Device name
    #[serde(rename = "@device")]
    pub device: String,
    /// Property name
    #[serde(rename = "@name")]
    pub name: String,
    /// Property state, no change if absent
    #[serde(rename = "@state", skip_serializing_if = "Option::is_none")]
    pub state: Option<PropertyState>,
    /// Moment when these data were valid
    #[serde(rename = "@timestamp", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<INDITimestamp>,
    /// Commentary
    #[serde(rename = "@message", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Light elements
    #[serde(rename = "oneLight")]
    pub lights: Vec<OneLight>,
}
