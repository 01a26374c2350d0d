use serde::{Deserialize, Serialize};

/// Get properties request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "getProperties")]
pub struct GetProperties {
    /// Protocol version
    #[serde(rename = "@version")]
    pub version: String,
    /// Device name
    #[serde(rename = "@device", skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Property name
    #[serde(rename = "@name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Delete a property, or an entire device if `name` is absent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "delProperty")]
pub struct DelProperty {
    /// Device name
    #[serde(rename = "@device")]
    pub device: String,
    /// Property name; absent means delete the whole device
    #[serde(rename = "@name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Moment when this message was generated
    #[serde(rename = "@timestamp", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<crate::timestamp::INDITimestamp>,
    /// Commentary
    #[serde(rename = "@message", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_properties_optional_fields() {
        let props = GetProperties {
            version: "1.7".to_string(),
            device: None,
            name: None,
        };

        assert!(props.device.is_none());
        assert!(props.name.is_none());

        let props_with_device = GetProperties {
            version: "1.7".to_string(),
            device: Some("test_device".to_string()),
            name: None,
        };

        assert_eq!(props_with_device.device, Some("test_device".to_string()));
        assert!(props_with_device.name.is_none());
    }

    #[test]
    fn test_del_property_device_only() {
        let del = DelProperty {
            device: "test_device".to_string(),
            name: None,
            timestamp: None,
            message: None,
        };

        assert_eq!(del.device, "test_device");
        assert!(del.name.is_none());
    }
}
