use crate::property::PropertyState;
use serde::{Deserialize, Serialize};

/// One light element used in set operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "oneLight")]
pub struct OneLight {
    /// Light name
    #[serde(rename = "@name")]
    pub name: String,
    /// Light state
    #[serde(rename = "$text")]
    pub state: PropertyState,
}
