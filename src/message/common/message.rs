use crate::timestamp::INDITimestamp;
use serde::{Deserialize, Serialize};

/// A message associated with a device or the entire system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "message")]
pub struct Message {
    /// Device name (if absent, message is considered site-wide)
    #[serde(rename = "@device", skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Timestamp when this message was generated
    #[serde(rename = "@timestamp", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<INDITimestamp>,
    /// Message text/commentary
    #[serde(rename = "@message", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Message {
    /// Create a new site-wide message
    pub fn new(message: String) -> Self {
        Self {
            device: None,
            timestamp: None,
            message: Some(message),
        }
    }

    /// Create a new device-specific message
    pub fn new_for_device(device: String, message: String) -> Self {
        Self {
            device: Some(device),
            timestamp: None,
            message: Some(message),
        }
    }

    /// Set the timestamp
    pub fn with_timestamp(mut self, timestamp: INDITimestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_site_wide() {
        let message = Message::new("hello".to_string());
        assert!(message.device.is_none());
        assert_eq!(message.message.unwrap(), "hello");
    }

    #[test]
    fn test_message_for_device() {
        let message =
            Message::new_for_device("CCD Simulator".to_string(), "connected".to_string());
        assert_eq!(message.device.unwrap(), "CCD Simulator");
        assert_eq!(message.message.unwrap(), "connected");
    }
}
