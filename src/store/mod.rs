//! The property store: a Device → Property → Element tree folded from a
//! sequence of `Update`s, with per-level watcher fan-out and a JSON
//! snapshot suitable for inspection or logging.

pub mod device;
pub mod element;
pub mod history;
pub mod vector;
pub mod watcher;

use std::collections::HashMap;

use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::property::PropertyKind;
use crate::store::device::Device;
use crate::store::element::ElementValue;
use crate::store::history::MAX_ELEMENT_HISTORY;
use crate::store::vector::Property;
use crate::store::watcher::{WatcherId, WatcherRegistry};
use crate::timestamp::INDITimestamp;
use crate::update::{NewProperty, SetProperty, Update};

/// The Device → Property → Element tree that the connection engine folds
/// parsed `Update`s into, and that client code reads from and writes to.
pub struct Store {
    devices: Vec<Device>,
    history_capacity: usize,
    client_watchers: WatcherRegistry,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("devices", &self.devices.len())
            .finish()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(MAX_ELEMENT_HISTORY)
    }
}

impl Store {
    /// Create an empty store with the given per-element history capacity
    pub fn new(history_capacity: usize) -> Self {
        Self {
            devices: Vec::new(),
            history_capacity,
            client_watchers: WatcherRegistry::new(),
        }
    }

    fn device_mut(&mut self, name: &str) -> Option<&mut Device> {
        self.devices.iter_mut().find(|d| d.name == name)
    }

    fn device_or_create(&mut self, name: &str) -> &mut Device {
        if !self.devices.iter().any(|d| d.name == name) {
            self.devices.push(Device::new(name.to_string()));
        }
        self.devices.iter_mut().find(|d| d.name == name).unwrap()
    }

    /// Look up a device by name
    pub fn device(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.name == name)
    }

    /// All currently-known device names
    pub fn devices(&self) -> impl Iterator<Item = &str> {
        self.devices.iter().map(|d| d.name.as_str())
    }

    /// Look up a property by device and property name
    pub fn property(&self, device: &str, name: &str) -> Option<&Property> {
        self.device(device).and_then(|d| d.property(name))
    }

    /// Fold an `Update` into the tree, firing watchers in
    /// element → property → device → client order for whatever changed.
    /// Returns `true` iff any observable field differed from its prior
    /// value (a `DefineProperty` always returns `true`).
    pub fn apply(&mut self, update: &Update) -> bool {
        let changed = match update {
            Update::DefineProperty(def) => {
                let device = self.device_or_create(def.device());
                match device.property_mut(def.name()) {
                    Some(existing) => existing.redefine(def),
                    None => {
                        let mut prop = Property::from_define(def);
                        // `Property::from_define` seeds each element's
                        // history with its defined value at this store's
                        // default capacity; re-bound it to the configured
                        // capacity without losing that seeded entry.
                        prop.elements.iter_mut().for_each(|el| {
                            let mut history = crate::store::history::History::new(self.history_capacity);
                            for (at, value) in el.history.iter() {
                                history.push(*at, value.clone());
                            }
                            el.history = history;
                        });
                        device.properties.push(prop);
                    }
                }
                if let Some(prop) = device.property(def.name()) {
                    prop.watchers.notify(update);
                }
                device.watchers.notify(update);
                true
            }
            Update::SetProperty(set) => self.apply_set_property(set, update),
            Update::NewProperty(new) => self.apply_optimistic_echo(new, update),
            Update::DeleteProperty(del) => {
                let mut changed = false;
                if let Some(device) = self.device_mut(&del.device) {
                    match &del.name {
                        Some(name) => {
                            changed = device.remove_property(name);
                        }
                        None => {
                            changed = true;
                            device.watchers.notify(update);
                            self.devices.retain(|d| d.name != del.device);
                        }
                    }
                }
                changed
            }
            Update::GetProperties(_) | Update::Message(_) => false,
        };

        self.client_watchers.notify(update);
        changed
    }

    fn apply_set_property(&mut self, set: &SetProperty, update: &Update) -> bool {
        let Some(device) = self.device_mut(set.device()) else {
            tracing::warn!(device = set.device(), "setProperty for unknown device");
            return false;
        };
        let Some(prop) = device.property_mut(set.name()) else {
            tracing::warn!(
                device = set.device(),
                property = set.name(),
                "setProperty for undefined property"
            );
            return false;
        };

        let (meta_changed, changed_elements) = prop.apply_set(set);
        for el_name in &changed_elements {
            if let Some(el) = prop.element(el_name) {
                el.watchers.notify(update);
            }
        }
        if !changed_elements.is_empty() || meta_changed {
            prop.watchers.notify(update);
            device.watchers.notify(update);
        }
        meta_changed || !changed_elements.is_empty()
    }

    /// Optimistically fold a client-originated `NewProperty` into the local
    /// tree before it is transmitted, per the documented echo policy
    /// (spec §4.F "Echo policy"): the submitted element values are applied
    /// immediately and the vector moves to `Busy`, so a caller racing
    /// `wait_for_state` against its own write sees the submitted values
    /// right away rather than stalling until the server confirms.
    fn apply_optimistic_echo(&mut self, new: &NewProperty, update: &Update) -> bool {
        let Some(device) = self.device_mut(new.device()) else {
            return false;
        };
        let Some(prop) = device.property_mut(new.name()) else {
            return false;
        };
        let now = Utc::now();
        prop.timestamp = now;
        match new {
            NewProperty::Number(v) => {
                for one in &v.numbers {
                    if let Some(el) = prop.element_mut(&one.name) {
                        let format = match &el.value {
                            ElementValue::Number(_, f) => f.clone(),
                            _ => String::new(),
                        };
                        el.set_value(ElementValue::Number(one.value, format), now);
                    }
                }
            }
            NewProperty::Text(v) => {
                for one in &v.texts {
                    if let Some(el) = prop.element_mut(&one.name) {
                        el.set_value(ElementValue::Text(one.value.clone()), now);
                    }
                }
            }
            NewProperty::Switch(v) => {
                for one in &v.switches {
                    if let Some(el) = prop.element_mut(&one.name) {
                        el.set_value(ElementValue::Switch(one.value), now);
                    }
                }
            }
        }
        prop.state = crate::property::PropertyState::Busy;
        prop.watchers.notify(update);
        device.watchers.notify(update);
        true
    }

    /// Resolve a dotted `device.property.element` path to its current value.
    /// `None` rather than an error for a missing leaf, since pollers
    /// (`crate::sync::wait_for_properties`) call this every tick and a
    /// not-yet-defined property is the expected steady state, not a fault.
    pub fn get(&self, path: &str) -> Option<&ElementValue> {
        let mut parts = path.splitn(3, '.');
        let device = parts.next()?;
        let property = parts.next()?;
        let element = parts.next()?;
        self.property(device, property)
            .and_then(|p| p.element(element))
            .map(|e| &e.value)
    }

    /// Resolve a dotted `device.property.element` path, surfacing a
    /// `LookupError` naming the missing component and listing the
    /// identifiers that were available instead.
    pub fn get_checked(&self, path: &str) -> Result<&ElementValue> {
        let mut parts = path.splitn(3, '.');
        let malformed = || {
            Error::LookupError(format!(
                "'{}' is not a well-formed device.property.element identifier",
                path
            ))
        };
        let device_name = parts.next().ok_or_else(malformed)?;
        let property_name = parts.next().ok_or_else(malformed)?;
        let element_name = parts.next().ok_or_else(malformed)?;

        let device = self.device(device_name).ok_or_else(|| {
            let available: Vec<&str> = self.devices().collect();
            Error::LookupError(format!(
                "no device named '{}'; available devices: [{}]",
                device_name,
                available.join(", ")
            ))
        })?;
        let prop = device.property(property_name).ok_or_else(|| {
            let available: Vec<&str> = device.properties.iter().map(|p| p.name.as_str()).collect();
            Error::LookupError(format!(
                "no property named '{}' on device '{}'; available properties: [{}]",
                property_name,
                device_name,
                available.join(", ")
            ))
        })?;
        prop.element(element_name).map(|e| &e.value).ok_or_else(|| {
            let available: Vec<&str> = prop.elements.iter().map(|e| e.name.as_str()).collect();
            Error::LookupError(format!(
                "no element named '{}' on {}.{}; available elements: [{}]",
                element_name,
                device_name,
                property_name,
                available.join(", ")
            ))
        })
    }

    /// Set a dotted `device.property.element` path to a new value, producing
    /// the outbound `Update::NewProperty` the caller is expected to transmit.
    /// This also optimistically applies the echo to the local tree (moving
    /// the owning vector to `Busy`), per the documented outbound echo policy.
    pub fn set(&mut self, path: &str, value: ElementValue) -> Result<Update> {
        let mut parts = path.splitn(3, '.');
        let malformed = || {
            Error::LookupError(format!(
                "'{}' is not a well-formed device.property.element identifier",
                path
            ))
        };
        let device = parts.next().ok_or_else(malformed)?;
        let property = parts.next().ok_or_else(malformed)?;
        let element = parts.next().ok_or_else(malformed)?;

        let prop = self.property(device, property).ok_or_else(|| {
            let available: Vec<&str> = self.device(device).map_or(Vec::new(), |d| {
                d.properties.iter().map(|p| p.name.as_str()).collect()
            });
            Error::LookupError(format!(
                "no property named '{}' on device '{}'; available properties: [{}]",
                property,
                device,
                available.join(", ")
            ))
        })?;
        prop.validate_assignment(element, &value)?;

        let new_update = build_new_property(prop, element, value)?;
        self.apply(&new_update);
        Ok(new_update)
    }

    /// Register a watcher at the client (store-wide) level
    pub fn watch_client<F>(&mut self, f: F) -> WatcherId
    where
        F: Fn(&Update) + Send + Sync + 'static,
    {
        self.client_watchers.register(f)
    }

    /// Remove a previously registered client-level watcher
    pub fn unwatch_client(&mut self, id: WatcherId) {
        self.client_watchers.remove(id);
    }

    /// Register a watcher on a device. No-op (returns `None`) if the device
    /// doesn't exist yet.
    pub fn watch_device<F>(&mut self, device: &str, f: F) -> Option<WatcherId>
    where
        F: Fn(&Update) + Send + Sync + 'static,
    {
        Some(self.device_or_create(device).watchers.register(f))
    }

    /// Register a watcher on a property. Creates the device (but not the
    /// property) if it doesn't exist yet; returns `None` if the property
    /// isn't defined.
    pub fn watch_property<F>(&mut self, device: &str, property: &str, f: F) -> Option<WatcherId>
    where
        F: Fn(&Update) + Send + Sync + 'static,
    {
        self.device_mut(device)?
            .property_mut(property)
            .map(|p| p.watchers.register(f))
    }

    /// Register a watcher on a single element; returns `None` if the
    /// device, property, or element doesn't exist yet.
    pub fn watch_element<F>(
        &mut self,
        device: &str,
        property: &str,
        element: &str,
        f: F,
    ) -> Option<WatcherId>
    where
        F: Fn(&Update) + Send + Sync + 'static,
    {
        self.device_mut(device)?
            .property_mut(property)?
            .element_mut(element)
            .map(|e| e.watchers.register(f))
    }

    /// Remove a previously registered device-level watcher. No-op if the
    /// device or the watcher is already gone.
    pub fn unwatch_device(&mut self, device: &str, id: WatcherId) {
        if let Some(d) = self.device_mut(device) {
            d.watchers.remove(id);
        }
    }

    /// Remove a previously registered property-level watcher. No-op if the
    /// device, property, or the watcher is already gone.
    pub fn unwatch_property(&mut self, device: &str, property: &str, id: WatcherId) {
        if let Some(p) = self.device_mut(device).and_then(|d| d.property_mut(property)) {
            p.watchers.remove(id);
        }
    }

    /// Remove a previously registered element-level watcher. No-op if the
    /// device, property, element, or the watcher is already gone.
    pub fn unwatch_element(&mut self, device: &str, property: &str, element: &str, id: WatcherId) {
        if let Some(e) = self
            .device_mut(device)
            .and_then(|d| d.property_mut(property))
            .and_then(|p| p.element_mut(element))
        {
            e.watchers.remove(id);
        }
    }

    /// The printf/sexagesimal `format` string captured at definition time
    /// for each `Number` element of `device.name`, keyed by element name.
    /// Used by the connection engine to hand the serializer the formatting
    /// information a bare outbound `oneNumber` doesn't carry on its own
    /// (spec §4.E).
    pub fn number_formats(&self, device: &str, name: &str) -> HashMap<String, String> {
        let mut formats = HashMap::new();
        if let Some(prop) = self.property(device, name) {
            for el in &prop.elements {
                if let ElementValue::Number(_, format) = &el.value {
                    if !format.is_empty() {
                        formats.insert(el.name.clone(), format.clone());
                    }
                }
            }
        }
        formats
    }

    /// Render the full tree as a `serde_json::Value`, with per-element
    /// `times`/`values` parallel arrays drawn from history.
    pub fn snapshot(&self) -> Value {
        let mut devices = Map::new();
        for device in &self.devices {
            let mut properties = Map::new();
            for prop in &device.properties {
                let mut elements = Map::new();
                for el in &prop.elements {
                    // `el.history` already carries the current value as its
                    // newest entry (pushed by `Element::set_value`/`new`),
                    // so no separate "current value" pair is appended here
                    // — doing so would both duplicate it and push the
                    // rendered arrays one entry past the history bound.
                    let mut times = Vec::new();
                    let mut values = Vec::new();
                    for (at, value) in el.history.iter() {
                        times.push(json!(at.to_rfc3339()));
                        values.push(value.to_json());
                    }

                    elements.insert(
                        el.name.clone(),
                        json!({
                            "label": el.label,
                            "value": el.value.to_json(),
                            "times": times,
                            "values": values,
                        }),
                    );
                }
                properties.insert(
                    prop.name.clone(),
                    json!({
                        "kind": prop.kind.to_string(),
                        "state": prop.state.to_string(),
                        "perm": prop.perm.to_string(),
                        "label": prop.label,
                        "group": prop.group,
                        "timestamp": prop.timestamp.to_rfc3339(),
                        "elements": elements,
                    }),
                );
            }
            devices.insert(device.name.clone(), Value::Object(properties));
        }
        Value::Object(devices)
    }
}

fn build_new_property(prop: &Property, element: &str, value: ElementValue) -> Result<Update> {
    use crate::message::{NewNumberVector, NewSwitchVector, NewTextVector, OneNumber, OneSwitch, OneText};

    let timestamp = Some(INDITimestamp::now(Some(3)));
    match (prop.kind, &value) {
        (PropertyKind::Number, ElementValue::Number(v, _)) => {
            let numbers = prop
                .elements
                .iter()
                .map(|e| OneNumber {
                    name: e.name.clone(),
                    value: if e.name == element {
                        *v
                    } else if let ElementValue::Number(existing, _) = e.value {
                        existing
                    } else {
                        0.0
                    },
                })
                .collect();
            Ok(Update::NewProperty(NewProperty::Number(NewNumberVector {
                device: prop.device.clone(),
                name: prop.name.clone(),
                timestamp,
                numbers,
            })))
        }
        (PropertyKind::Text, ElementValue::Text(v)) => {
            let texts = prop
                .elements
                .iter()
                .map(|e| OneText {
                    name: e.name.clone(),
                    value: if e.name == element {
                        v.clone()
                    } else if let ElementValue::Text(existing) = &e.value {
                        existing.clone()
                    } else {
                        String::new()
                    },
                })
                .collect();
            Ok(Update::NewProperty(NewProperty::Text(NewTextVector {
                device: prop.device.clone(),
                name: prop.name.clone(),
                timestamp,
                texts,
            })))
        }
        (PropertyKind::Switch, ElementValue::Switch(state)) => {
            // Per spec, switch NewProperty carries only the element(s) being
            // changed, unlike Number/Text which carry the whole vector.
            Ok(Update::NewProperty(NewProperty::Switch(NewSwitchVector {
                device: prop.device.clone(),
                name: prop.name.clone(),
                timestamp,
                switches: vec![OneSwitch {
                    name: element.to_string(),
                    value: *state,
                }],
            })))
        }
        _ => Err(Error::Property(format!(
            "value kind mismatch for {}.{}.{}",
            prop.device, prop.name, element
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{DefNumber, DefNumberVector};
    use crate::property::{PropertyPerm, PropertyState};
    use crate::update::DefineProperty;

    fn exposure_def(value: f64) -> Update {
        Update::DefineProperty(DefineProperty::Number(DefNumberVector {
            device: "CCD Simulator".to_string(),
            name: "CCD_EXPOSURE".to_string(),
            label: None,
            group: None,
            state: PropertyState::Idle,
            perm: PropertyPerm::Rw,
            timeout: None,
            timestamp: None,
            message: None,
            numbers: vec![DefNumber::new(
                "CCD_EXPOSURE_VALUE".to_string(),
                None,
                "%5.2f".to_string(),
                0.0,
                36000.0,
                0.0,
                value,
            )],
        }))
    }

    #[test]
    fn test_define_then_get() {
        let mut store = Store::default();
        assert!(store.apply(&exposure_def(1.0)));
        assert_eq!(
            store.get("CCD Simulator.CCD_EXPOSURE.CCD_EXPOSURE_VALUE"),
            Some(&ElementValue::Number(1.0, "%5.2f".to_string()))
        );
    }

    #[test]
    fn test_redefine_always_reports_changed() {
        let mut store = Store::default();
        store.apply(&exposure_def(1.0));
        assert!(store.apply(&exposure_def(1.0)));
    }

    #[test]
    fn test_set_builds_new_property_and_echoes_busy() {
        let mut store = Store::default();
        store.apply(&exposure_def(1.0));
        let update = store
            .set(
                "CCD Simulator.CCD_EXPOSURE.CCD_EXPOSURE_VALUE",
                ElementValue::Number(5.0, String::new()),
            )
            .unwrap();
        assert!(matches!(update, Update::NewProperty(NewProperty::Number(_))));
        assert_eq!(
            store.property("CCD Simulator", "CCD_EXPOSURE").unwrap().state,
            PropertyState::Busy
        );
    }

    #[test]
    fn test_set_rejects_readonly() {
        let mut store = Store::default();
        let mut def = exposure_def(1.0);
        if let Update::DefineProperty(DefineProperty::Number(v)) = &mut def {
            v.perm = PropertyPerm::Ro;
        }
        store.apply(&def);
        let result = store.set(
            "CCD Simulator.CCD_EXPOSURE.CCD_EXPOSURE_VALUE",
            ElementValue::Number(5.0, String::new()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_delete_whole_device() {
        let mut store = Store::default();
        store.apply(&exposure_def(1.0));
        let del = Update::DeleteProperty(crate::message::DelProperty {
            device: "CCD Simulator".to_string(),
            name: None,
            timestamp: None,
            message: None,
        });
        assert!(store.apply(&del));
        assert!(store.device("CCD Simulator").is_none());
    }

    #[test]
    fn test_get_checked_names_missing_component() {
        let mut store = Store::default();
        store.apply(&exposure_def(1.0));

        let err = store.get_checked("CCD Simulator.CCD_EXPOSURE.BOGUS").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("BOGUS"));
        assert!(msg.contains("CCD_EXPOSURE_VALUE"));

        let err = store.get_checked("CCD Simulator.BOGUS_PROP.x").unwrap_err();
        assert!(err.to_string().contains("BOGUS_PROP"));

        let err = store.get_checked("Nonexistent.x.y").unwrap_err();
        assert!(err.to_string().contains("Nonexistent"));
    }

    #[test]
    fn test_snapshot_is_stable_across_calls_when_unchanged() {
        let mut store = Store::default();
        store.apply(&exposure_def(1.0));
        assert_eq!(store.snapshot(), store.snapshot());
    }

    #[test]
    fn test_snapshot_times_pair_each_value_with_its_own_observation_time() {
        use crate::message::{DefNumber, DefNumberVector, OneNumber, SetNumberVector};
        use crate::timestamp::INDITimestamp;
        use std::str::FromStr;

        let t0 = INDITimestamp::from_str("2019-08-12T20:49:50.000000Z").unwrap();
        let t1 = INDITimestamp::from_str("2019-08-12T20:49:51.000000Z").unwrap();

        let mut store = Store::default();
        store.apply(&Update::DefineProperty(DefineProperty::Number(DefNumberVector {
            device: "CCD Simulator".to_string(),
            name: "CCD_EXPOSURE".to_string(),
            label: None,
            group: None,
            state: PropertyState::Idle,
            perm: PropertyPerm::Rw,
            timeout: None,
            timestamp: Some(t0.clone()),
            message: None,
            numbers: vec![DefNumber::new(
                "CCD_EXPOSURE_VALUE".to_string(),
                None,
                "%g".to_string(),
                0.0,
                36000.0,
                0.0,
                0.0,
            )],
        })));
        store.apply(&Update::SetProperty(SetProperty::Number(SetNumberVector {
            device: "CCD Simulator".to_string(),
            name: "CCD_EXPOSURE".to_string(),
            state: None,
            timeout: None,
            timestamp: Some(t1.clone()),
            message: None,
            numbers: vec![OneNumber {
                name: "CCD_EXPOSURE_VALUE".to_string(),
                value: 1.0,
            }],
        })));

        let snapshot = store.snapshot();
        let element = &snapshot["CCD Simulator"]["CCD_EXPOSURE"]["elements"]["CCD_EXPOSURE_VALUE"];
        assert_eq!(element["times"], json!([t0.to_string(), t1.to_string()]));
        assert_eq!(element["values"], json!([0.0, 1.0]));

        // The property's own "last-seen" timestamp tracks the most recent
        // set, not wall-clock time.
        assert_eq!(
            snapshot["CCD Simulator"]["CCD_EXPOSURE"]["timestamp"],
            json!(t1.to_string())
        );
    }

    #[test]
    fn test_snapshot_history_bounded_after_many_distinct_updates() {
        use crate::message::{OneNumber, SetNumberVector};

        let mut store = Store::default();
        store.apply(&exposure_def(0.0));
        for i in 1..=150 {
            store.apply(&Update::SetProperty(SetProperty::Number(SetNumberVector {
                device: "CCD Simulator".to_string(),
                name: "CCD_EXPOSURE".to_string(),
                state: None,
                timeout: None,
                timestamp: None,
                message: None,
                numbers: vec![OneNumber {
                    name: "CCD_EXPOSURE_VALUE".to_string(),
                    value: i as f64,
                }],
            })));
        }

        let snapshot = store.snapshot();
        let element = &snapshot["CCD Simulator"]["CCD_EXPOSURE"]["elements"]["CCD_EXPOSURE_VALUE"];
        assert_eq!(element["values"].as_array().unwrap().len(), MAX_ELEMENT_HISTORY);
        assert_eq!(element["value"], json!(150.0));
    }

    #[test]
    fn test_client_watcher_fires() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let mut store = Store::default();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        store.watch_client(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        store.apply(&exposure_def(1.0));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
