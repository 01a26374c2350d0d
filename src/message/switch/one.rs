use serde::{Deserialize, Serialize};
use crate::property::SwitchState;

/// One switch element used in new and set operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "oneSwitch")]
pub struct OneSwitch {
    /// Name of this switch element
    #[serde(rename = "@name")]
    pub name: String,
    /// Switch state
    #[serde(rename = "$text")]
    pub value: SwitchState,
}
