use serde::{Deserialize, Serialize};

/// One text element used in new and set operations
/// 
/// According to the INDI protocol, this represents a single text element
/// within a text vector command. It contains the name of the text element
/// and its value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "oneText")]
pub struct OneText {
    /// Name of this text element
    #[serde(rename = "@name")]
    pub name: String,
    /// Text value
    #[serde(rename = "$text")]
    pub value: String,
}
