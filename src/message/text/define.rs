use crate::prelude::PropertyPerm;
use crate::message::common::PropertyState;
use crate::timestamp::INDITimestamp;
use crate::message::common::vector::INDIVector;
use serde::{Deserialize, Serialize};

/// Define one member of a text vector
/// 
/// This struct represents a single text element within a text vector as defined by the INDI protocol.
/// Each text element has a required name, an optional label (defaulting to name if absent),
/// and a text value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "defText")]
pub struct DefText {
    /// Name of this text element
    #[serde(rename = "@name")]
    pub name: String,
    /// GUI label, or use name by default
    #[serde(rename = "@label", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Text value
    #[serde(rename = "$text")]
    pub value: String,
}

/// Define a property that holds one or more text elements.
/// 
/// # String Handling
/// 
/// This struct uses owned `String` types for all string fields. This is a deliberate design choice:
/// 
/// - Owned `String` is required for XML serialization/deserialization
/// - It ensures the data lives as long as the struct itself
/// - It provides clear ownership semantics for the XML attributes
/// 
/// While this struct stores owned strings, it implements the `INDIVector` trait which provides
/// efficient read-only access through `&str` references. This is achieved by using `as_deref()`
/// in the trait implementation to convert from `&String` to `&str`.
/// 
/// This approach combines the benefits of:
/// - Owned data for XML serialization (`String`)
/// - Efficient read access through the trait interface (`&str`)
/// 
/// According to the INDI protocol specification, this vector can hold one or more text elements
/// and includes various attributes for device identification, GUI presentation, state tracking,
/// and client control.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "defTextVector")]
pub struct DefTextVector {
    /// Device name
    #[serde(rename = "@device")]
    pub device: String,
    /// Property name
    #[serde(rename = "@name")]
    pub name: String,
    /// GUI label, use name by default
    #[serde(rename = "@label", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Property group membership, blank by default
    #[serde(rename = "@group", skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Current state of Property
    #[serde(rename = "@state")]
    pub state: PropertyState,
    /// Ostensible Client controlability
    #[serde(rename = "@perm")]
    pub perm: PropertyPerm,
    /// Worse-case time to affect, 0 default, N/A for ro
    #[serde(rename = "@timeout", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
    /// Moment when these data were valid
    #[serde(rename = "@timestamp", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<INDITimestamp>,
    /// Commentary
    #[serde(rename = "@message", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Text elements
    #[serde(rename = "defText")]
    pub texts: Vec<DefText>,
}

impl INDIVector for DefTextVector {
    type Element = DefText;

    fn device(&self) -> &str {
        &self.device
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    fn state(&self) -> PropertyState {
        self.state
    }

    fn perm(&self) -> PropertyPerm {
        self.perm
    }

    fn timeout(&self) -> Option<f64> {
        self.timeout
    }

    fn timestamp(&self) -> Option<&INDITimestamp> {
        self.timestamp.as_ref()
    }

    fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    fn elements(&self) -> &[Self::Element] {
        &self.texts
    }
}
