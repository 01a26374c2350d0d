//! A device: a named collection of properties.

use crate::store::vector::Property;
use crate::store::watcher::WatcherRegistry;

/// One device and its currently-defined properties.
pub struct Device {
    /// Device name
    pub name: String,
    /// Properties, keyed by property name, in definition order of insertion
    pub properties: Vec<Property>,
    /// Watchers registered at the device level
    pub watchers: WatcherRegistry,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name)
            .field("properties", &self.properties.len())
            .finish()
    }
}

impl Device {
    /// Create a new, empty device
    pub fn new(name: String) -> Self {
        Self {
            name,
            properties: Vec::new(),
            watchers: WatcherRegistry::new(),
        }
    }

    /// Look up a property by name
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Look up a property by name, mutably
    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.name == name)
    }

    /// Remove a property by name. Returns true if it was present.
    pub fn remove_property(&mut self, name: &str) -> bool {
        let before = self.properties.len();
        self.properties.retain(|p| p.name != name);
        self.properties.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{PropertyKind, PropertyPerm, PropertyState};
    use crate::store::vector::Property as StoreProperty;
    use crate::update::DefineProperty;
    use crate::message::DefTextVector;

    fn text_def(name: &str) -> DefineProperty {
        DefineProperty::Text(DefTextVector {
            device: "Mount".to_string(),
            name: name.to_string(),
            label: None,
            group: None,
            state: PropertyState::Idle,
            perm: PropertyPerm::Rw,
            timeout: None,
            timestamp: None,
            message: None,
            texts: vec![],
        })
    }

    #[test]
    fn test_add_and_remove_property() {
        let mut device = Device::new("Mount".to_string());
        device
            .properties
            .push(StoreProperty::from_define(&text_def("SITE")));
        assert!(device.property("SITE").is_some());
        assert_eq!(device.property("SITE").unwrap().kind, PropertyKind::Text);

        assert!(device.remove_property("SITE"));
        assert!(device.property("SITE").is_none());
        assert!(!device.remove_property("SITE"));
    }
}
