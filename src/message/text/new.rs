use crate::timestamp::INDITimestamp;
use super::one::OneText;
use serde::{Deserialize, Serialize};

/// New text vector command
/// 
/// According to the INDI protocol specification, this command informs the Device
/// of new target values for a Property. After sending, the Client must set its
/// local state for the Property to Busy, leaving it up to the Device to change
/// it when it sees fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "newTextVector")]
pub struct NewTextVector {
    /// Device name
    #[serde(rename = "@device")]
    pub device: String,
    /// Property name
    #[serde(rename = "@name")]
    pub name: String,
    /// Moment when this message was generated
    #[serde(rename = "@timestamp")]
    pub timestamp: Option<INDITimestamp>,
    /// Text elements
    #[serde(rename = "oneText")]
    pub texts: Vec<OneText>,
}
