//! A property vector: the device/name-addressed node holding a set of
//! elements plus the vector-level metadata (state, perm, label, ...).

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::message::INDIVector;
use crate::property::{PropertyKind, PropertyPerm, PropertyState, SwitchRule, SwitchState};
use crate::store::element::{Element, ElementValue};
use crate::store::watcher::WatcherRegistry;
use crate::update::{DefineProperty, SetProperty};

/// A single property (a `defXXXVector` once defined), holding its elements
/// in definition order.
pub struct Property {
    /// Device this property belongs to
    pub device: String,
    /// Property name
    pub name: String,
    /// Kind discriminant (Number/Text/Switch/Light)
    pub kind: PropertyKind,
    /// GUI label
    pub label: Option<String>,
    /// GUI group
    pub group: Option<String>,
    /// Current vector state
    pub state: PropertyState,
    /// Client controllability
    pub perm: PropertyPerm,
    /// Switch selection rule, only meaningful for `PropertyKind::Switch`
    pub rule: Option<SwitchRule>,
    /// Worst-case time to effect a change, if advertised
    pub timeout: Option<f64>,
    /// Moment the most recent def/set for this vector reported as valid
    /// (spec §3: a property's "last-seen timestamp (UTC)"), or local
    /// wall-clock time if the device didn't report one.
    pub timestamp: DateTime<Utc>,
    /// Most recent commentary attached to this vector
    pub message: Option<String>,
    /// Elements in definition order
    pub elements: Vec<Element>,
    /// Watchers registered at the property level
    pub watchers: WatcherRegistry,
}

impl std::fmt::Debug for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property")
            .field("device", &self.device)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("perm", &self.perm)
            .field("elements", &self.elements.len())
            .finish()
    }
}

impl Property {
    /// Build a fresh property from a `defXXXVector`
    pub fn from_define(def: &DefineProperty) -> Self {
        // The server-reported moment these data were valid (spec §3's
        // property-level "last-seen timestamp"), falling back to wall-clock
        // time when the device didn't send one; also the observation time
        // recorded against every element defined here.
        let at = def
            .timestamp()
            .map(|t| t.datetime())
            .unwrap_or_else(Utc::now);

        let (device, name, kind, label, group, state, perm, rule, timeout, message, elements) =
            match def {
                DefineProperty::Number(v) => (
                    v.device(),
                    v.name(),
                    PropertyKind::Number,
                    v.label(),
                    v.group(),
                    v.state(),
                    v.perm(),
                    None,
                    v.timeout(),
                    v.message(),
                    v.numbers
                        .iter()
                        .map(|n| {
                            Element::new(
                                n.name.clone(),
                                n.label.clone(),
                                ElementValue::Number(n.value, n.format.clone()),
                                at,
                            )
                        })
                        .collect::<Vec<_>>(),
                ),
                DefineProperty::Text(v) => (
                    v.device(),
                    v.name(),
                    PropertyKind::Text,
                    v.label(),
                    v.group(),
                    v.state(),
                    v.perm(),
                    None,
                    v.timeout(),
                    v.message(),
                    v.texts
                        .iter()
                        .map(|t| {
                            Element::new(
                                t.name.clone(),
                                t.label.clone(),
                                ElementValue::Text(t.value.clone()),
                                at,
                            )
                        })
                        .collect::<Vec<_>>(),
                ),
                DefineProperty::Switch(v) => (
                    v.device(),
                    v.name(),
                    PropertyKind::Switch,
                    v.label(),
                    v.group(),
                    v.state(),
                    v.perm(),
                    Some(v.rule),
                    v.timeout(),
                    v.message(),
                    v.switches
                        .iter()
                        .map(|s| {
                            Element::new(
                                s.name.clone(),
                                s.label.clone(),
                                ElementValue::Switch(s.value),
                                at,
                            )
                        })
                        .collect::<Vec<_>>(),
                ),
                DefineProperty::Light(v) => (
                    v.device(),
                    v.name(),
                    PropertyKind::Light,
                    v.label(),
                    v.group(),
                    v.state(),
                    v.perm(),
                    None,
                    v.timeout(),
                    v.message(),
                    v.lights
                        .iter()
                        .map(|l| {
                            Element::new(
                                l.name.clone(),
                                l.label.clone(),
                                ElementValue::Light(l.state),
                                at,
                            )
                        })
                        .collect::<Vec<_>>(),
                ),
            };

        Self {
            device: device.to_string(),
            name: name.to_string(),
            kind,
            label: label.map(str::to_string),
            group: group.map(str::to_string),
            state,
            perm,
            rule,
            timeout,
            timestamp: at,
            message: message.map(str::to_string),
            elements,
            watchers: WatcherRegistry::new(),
        }
    }

    /// Re-apply a `defXXXVector` for an already-defined property. Per spec
    /// §3, a redefinition of the SAME kind is ignored outright — the prior
    /// definition wins, nothing about this vector's stored state changes —
    /// and a redefinition of a DIFFERENT kind is also ignored, but logged as
    /// a protocol violation. Either way the caller (`Store::apply`) still
    /// reports `changed = true` so watchers refresh on the redefinition
    /// event itself, per §4.D, even though the data underneath is untouched.
    pub fn redefine(&mut self, def: &DefineProperty) {
        if def.kind() != self.kind {
            tracing::warn!(
                device = %self.device,
                property = %self.name,
                "redefinition with differing property kind; ignoring redefine, keeping prior kind"
            );
        }
        // Same-kind redefinition: also ignored (prior definition wins).
    }

    /// Apply a `setXXXVector`, returning whether any vector-level metadata
    /// changed together with the names of elements whose value changed.
    /// Per spec, element-level watchers only fire for the latter.
    pub fn apply_set(&mut self, set: &SetProperty) -> (bool, Vec<String>) {
        let mut meta_changed = false;
        let mut changed_elements = Vec::new();
        // The server-reported moment this update is valid, falling back to
        // wall-clock time if absent; used as every changed element's
        // observation time below. Recorded on the vector itself (spec §3's
        // "last-seen timestamp") but — like label/min/max/format — not
        // itself a `changed` field: a server resending the same values
        // under a fresh timestamp is not an observable change.
        let now = set
            .timestamp()
            .map(|t| t.datetime())
            .unwrap_or_else(Utc::now);
        self.timestamp = now;

        macro_rules! apply_state_meta {
            ($v:expr) => {{
                if let Some(state) = $v.state {
                    if state != self.state {
                        self.state = state;
                        meta_changed = true;
                    }
                }
                if $v.timeout != self.timeout {
                    self.timeout = $v.timeout;
                    meta_changed = true;
                }
                if $v.message != self.message {
                    self.message = $v.message.clone();
                    meta_changed = true;
                }
            }};
        }

        match set {
            SetProperty::Number(v) => {
                apply_state_meta!(v);
                for one in &v.numbers {
                    if let Some(el) = self.elements.iter_mut().find(|e| e.name == one.name) {
                        let format = match &el.value {
                            ElementValue::Number(_, f) => f.clone(),
                            _ => String::new(),
                        };
                        if el.set_value(ElementValue::Number(one.value, format), now) {
                            changed_elements.push(el.name.clone());
                        }
                    }
                }
            }
            SetProperty::Text(v) => {
                apply_state_meta!(v);
                for one in &v.texts {
                    if let Some(el) = self.elements.iter_mut().find(|e| e.name == one.name) {
                        if el.set_value(ElementValue::Text(one.value.clone()), now) {
                            changed_elements.push(el.name.clone());
                        }
                    }
                }
            }
            SetProperty::Switch(v) => {
                apply_state_meta!(v);
                for one in &v.switches {
                    if let Some(el) = self.elements.iter_mut().find(|e| e.name == one.name) {
                        if el.set_value(ElementValue::Switch(one.value), now) {
                            changed_elements.push(el.name.clone());
                        }
                    }
                }
            }
            SetProperty::Light(v) => {
                if let Some(state) = v.state {
                    if state != self.state {
                        self.state = state;
                        meta_changed = true;
                    }
                }
                if v.message != self.message {
                    self.message = v.message.clone();
                    meta_changed = true;
                }
                for one in &v.lights {
                    if let Some(el) = self.elements.iter_mut().find(|e| e.name == one.name) {
                        if el.set_value(ElementValue::Light(one.state), now) {
                            changed_elements.push(el.name.clone());
                        }
                    }
                }
            }
        }
        (meta_changed, changed_elements)
    }

    /// Look up an element by name
    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.name == name)
    }

    /// Look up an element by name, mutably
    pub fn element_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.name == name)
    }

    /// Validate that `value` is acceptable for element `element_name` given
    /// this vector's kind, permission and (for switches) rule, per the
    /// element value assignment contract.
    pub fn validate_assignment(&self, element_name: &str, value: &ElementValue) -> Result<()> {
        if self.kind == PropertyKind::Light {
            return Err(Error::PermissionError(format!(
                "{}.{} is a light; lights reject all client-side assignment",
                self.device, self.name
            )));
        }
        if self.perm == PropertyPerm::Ro {
            return Err(Error::PermissionError(format!(
                "{}.{} is read-only",
                self.device, self.name
            )));
        }
        let Some(el) = self.element(element_name) else {
            let available: Vec<&str> = self.elements.iter().map(|e| e.name.as_str()).collect();
            return Err(Error::LookupError(format!(
                "no element named '{}' on {}.{}; available elements: [{}]",
                element_name,
                self.device,
                self.name,
                available.join(", ")
            )));
        };
        match (self.kind, value) {
            (PropertyKind::Number, ElementValue::Number(_, _)) => {}
            (PropertyKind::Text, ElementValue::Text(_)) => {}
            (PropertyKind::Switch, ElementValue::Switch(_)) => {}
            _ => {
                return Err(Error::TypeError(format!(
                    "value for {}.{}.{} is not a member of the {} value set",
                    self.device, self.name, element_name, self.kind
                )));
            }
        }
        let _ = el;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{DefNumber, DefNumberVector};

    fn number_def() -> DefineProperty {
        DefineProperty::Number(DefNumberVector {
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
                1.0,
            )],
        })
    }

    #[test]
    fn test_from_define_number() {
        let prop = Property::from_define(&number_def());
        assert_eq!(prop.kind, PropertyKind::Number);
        assert_eq!(prop.elements.len(), 1);
        assert_eq!(
            prop.element("CCD_EXPOSURE_VALUE").unwrap().value,
            ElementValue::Number(1.0, "%5.2f".to_string())
        );
    }

    #[test]
    fn test_redefine_always_changes_shape() {
        let mut prop = Property::from_define(&number_def());
        prop.redefine(&number_def());
        assert_eq!(prop.elements.len(), 1);
    }

    #[test]
    fn test_validate_assignment_rejects_readonly() {
        let mut def = number_def();
        if let DefineProperty::Number(v) = &mut def {
            v.perm = PropertyPerm::Ro;
        }
        let prop = Property::from_define(&def);
        let result =
            prop.validate_assignment("CCD_EXPOSURE_VALUE", &ElementValue::Number(2.0, "%5.2f".into()));
        assert!(result.is_err());
    }
}
