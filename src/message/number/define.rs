use crate::prelude::PropertyPerm;
use crate::property::PropertyState;
use crate::timestamp::INDITimestamp;
use crate::message::common::vector::INDIVector;
use serde::{Deserialize, Serialize};

/// Number element in a number vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefNumber {
    /// Number name
    #[serde(rename = "@name")]
    pub name: String,
    /// Number label
    #[serde(rename = "@label")]
    pub label: Option<String>,
    /// Number format
    #[serde(rename = "@format")]
    pub format: String,
    /// Number minimum value
    #[serde(rename = "@min")]
    pub min: f64,
    /// Number maximum value
    #[serde(rename = "@max")]
    pub max: f64,
    /// Number step value
    #[serde(rename = "@step")]
    pub step: f64,
    /// Number value
    #[serde(rename = "$text", deserialize_with = "crate::format::deserialize_wire_number")]
    pub value: f64,
}

impl DefNumber {
    /// Create a new DefNumber
    pub fn new(name: String, label: Option<String>, format: String, min: f64, max: f64, step: f64, value: f64) -> Self {
        Self {
            name,
            label,
            format,
            min,
            max,
            step,
            value,
        }
    }
}

/// Number vector definition that follows the INDI protocol DTD specification.
/// 
/// Uses the same string handling approach as [`crate::message::text::DefTextVector`] - see its documentation
/// for details about the string ownership design.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "defNumberVector")]
pub struct DefNumberVector {
    /// Device name
    #[serde(rename = "@device")]
    pub device: String,
    /// Property name
    #[serde(rename = "@name")]
    pub name: String,
    /// Property label
    #[serde(rename = "@label")]
    pub label: Option<String>,
    /// Property group
    #[serde(rename = "@group")]
    pub group: Option<String>,
    /// Property state
    #[serde(rename = "@state")]
    pub state: PropertyState,
    /// Property permission
    #[serde(rename = "@perm")]
    pub perm: PropertyPerm,
    /// Property timeout
    #[serde(rename = "@timeout")]
    pub timeout: Option<f64>,
    /// Property timestamp
    #[serde(rename = "@timestamp")]
    pub timestamp: Option<INDITimestamp>,
    /// Optional message
    #[serde(rename = "@message")]
    pub message: Option<String>,
    /// Number elements
    #[serde(rename = "defNumber")]
    pub numbers: Vec<DefNumber>,
}

impl INDIVector for DefNumberVector {
    type Element = DefNumber;

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
        &self.numbers
    }
}
