//! A single named value within a property vector.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::property::SwitchState;
use crate::store::history::{History, MAX_ELEMENT_HISTORY};

/// The value currently held by an element, tagged by kind.
///
/// `Number` carries the printf-style format string captured from the
/// defining `defNumber` element (spec §4.E): outbound `newNumberVector`
/// bodies have no format of their own, so the element is the only place
/// that format can live between definition and a later write.
#[derive(Debug, Clone)]
pub enum ElementValue {
    /// A number value together with its display format (e.g. `"%6.2f"`).
    /// An unset/unparseable wire body is represented as `NaN` here (see
    /// `crate::format::deserialize_wire_number`), not as a separate variant.
    Number(f64, String),
    /// A text value
    Text(String),
    /// A switch value
    Switch(SwitchState),
    /// A light status value, rendered via `crate::property::PropertyState`
    Light(crate::property::PropertyState),
    /// No value has been received yet (an empty element body)
    Unset,
}

impl PartialEq for ElementValue {
    /// Repeated NaN (unset/unparseable) number bodies must compare equal so
    /// `Element::set_value`'s change detection doesn't treat a device
    /// resending the same unset value as a real change every time (spec
    /// §4.D: "History is appended only when the server-reported value
    /// actually changes") — IEEE `NaN != NaN` would otherwise defeat that
    /// invariant for any element that stays unset across updates.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ElementValue::Number(a, fa), ElementValue::Number(b, fb)) => {
                fa == fb && (a == b || (a.is_nan() && b.is_nan()))
            }
            (ElementValue::Text(a), ElementValue::Text(b)) => a == b,
            (ElementValue::Switch(a), ElementValue::Switch(b)) => a == b,
            (ElementValue::Light(a), ElementValue::Light(b)) => a == b,
            (ElementValue::Unset, ElementValue::Unset) => true,
            _ => false,
        }
    }
}

impl ElementValue {
    /// Render this value the way it would appear in `Store::snapshot()`
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ElementValue::Number(n, _) => json!(n),
            ElementValue::Text(s) => json!(s),
            ElementValue::Switch(s) => json!(s.to_string()),
            ElementValue::Light(s) => json!(s.to_string()),
            ElementValue::Unset => serde_json::Value::Null,
        }
    }
}

/// One element of a property vector (a `oneNumber`/`oneText`/`oneSwitch`/
/// `oneLight` slot), with its bounded value history and its own watcher set.
pub struct Element {
    /// Element name, as it appears on the wire
    pub name: String,
    /// GUI label, defaulting to `name` when the device didn't supply one
    pub label: Option<String>,
    /// Current value
    pub value: ElementValue,
    /// The moment `value` was observed (the defining/updating message's
    /// `@timestamp`, or local wall-clock time when none was reported), not
    /// when this element was last inspected. Paired with `value` in
    /// `Store::snapshot()`'s `times`/`values` arrays.
    pub last_seen: DateTime<Utc>,
    /// Recent value history, most recent last
    pub history: History,
    /// Watchers registered at this element specifically
    pub watchers: crate::store::watcher::WatcherRegistry,
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("name", &self.name)
            .field("value", &self.value)
            .finish()
    }
}

impl Element {
    /// Create a new, freshly-defined element, observed at `at` (the defining
    /// message's `@timestamp`, or wall-clock time if the device didn't
    /// report one). The defined value is itself the first history entry,
    /// so `history.latest()` always agrees with `value`.
    pub fn new(name: String, label: Option<String>, value: ElementValue, at: DateTime<Utc>) -> Self {
        Self::with_history_capacity(name, label, value, at, MAX_ELEMENT_HISTORY)
    }

    /// Create a new element with a custom history capacity
    pub fn with_history_capacity(
        name: String,
        label: Option<String>,
        value: ElementValue,
        at: DateTime<Utc>,
        capacity: usize,
    ) -> Self {
        let mut history = History::new(capacity);
        history.push(at, value.clone());
        Self {
            name,
            label,
            value,
            last_seen: at,
            history,
            watchers: crate::store::watcher::WatcherRegistry::new(),
        }
    }

    /// Replace the current value, observed at `at`. Only when the new value
    /// actually differs from the old one is it recorded into history (spec
    /// §4.D: "History is appended only when the server-reported value
    /// actually changes"), keyed to `at`. `history.latest()` therefore
    /// always equals the current value rather than the value it superseded.
    /// Returns true if the value changed.
    pub fn set_value(&mut self, value: ElementValue, at: DateTime<Utc>) -> bool {
        let changed = self.value != value;
        if changed {
            self.value = value.clone();
            self.history.push(at, value);
            self.last_seen = at;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_value_reports_change() {
        let mut el = Element::new(
            "FOCUS".to_string(),
            None,
            ElementValue::Number(1.0, "%.2f".to_string()),
            Utc::now(),
        );
        assert!(el.set_value(ElementValue::Number(2.0, "%.2f".to_string()), Utc::now()));
        assert!(!el.set_value(ElementValue::Number(2.0, "%.2f".to_string()), Utc::now()));
        // The defined value and the one real change each recorded a history
        // entry; the no-op re-assignment did not append another.
        assert_eq!(el.history.len(), 2);
    }

    #[test]
    fn test_history_pairs_each_value_with_the_time_it_held() {
        let t0 = DateTime::parse_from_rfc3339("2019-08-12T20:49:50Z").unwrap().with_timezone(&Utc);
        let t1 = DateTime::parse_from_rfc3339("2019-08-12T20:49:51Z").unwrap().with_timezone(&Utc);

        let mut el = Element::new(
            "CCD_EXPOSURE_VALUE".to_string(),
            None,
            ElementValue::Number(0.0, "%g".to_string()),
            t0,
        );
        assert!(el.set_value(ElementValue::Number(1.0, "%g".to_string()), t1));

        // The latest history entry is the CURRENT value keyed to the time it
        // was observed, matching `el.value`/`el.last_seen` exactly.
        let (at, value) = el.history.latest().expect("history entry");
        assert_eq!(*at, t1);
        assert_eq!(*value, ElementValue::Number(1.0, "%g".to_string()));
        assert_eq!(el.last_seen, t1);

        // The defined value is still the oldest entry.
        let mut entries = el.history.iter();
        let (at0, value0) = entries.next().expect("defined value entry");
        assert_eq!(*at0, t0);
        assert_eq!(*value0, ElementValue::Number(0.0, "%g".to_string()));
    }

    #[test]
    fn test_history_bounded_after_many_distinct_updates() {
        let mut el = Element::with_history_capacity(
            "CCD_EXPOSURE_VALUE".to_string(),
            None,
            ElementValue::Number(0.0, "%g".to_string()),
            Utc::now(),
            MAX_ELEMENT_HISTORY,
        );

        // One value at construction plus 150 further distinct updates: 151
        // distinct values total, well past the history bound.
        for i in 1..=150 {
            el.set_value(ElementValue::Number(i as f64, "%g".to_string()), Utc::now());
        }

        assert_eq!(el.history.len(), MAX_ELEMENT_HISTORY);
        // The oldest surviving entry is the (151 - 100 + 1)-th distinct
        // value, i.e. value 52 (construction is value 0, so update `i`
        // carries value `i`).
        let (_, oldest) = el.history.iter().next().expect("history entry");
        assert_eq!(*oldest, ElementValue::Number(52.0, "%g".to_string()));
        let (_, newest) = el.history.latest().expect("history entry");
        assert_eq!(*newest, ElementValue::Number(150.0, "%g".to_string()));
    }

    #[test]
    fn test_to_json_switch() {
        let val = ElementValue::Switch(SwitchState::On);
        assert_eq!(val.to_json(), serde_json::json!("On"));
    }

    #[test]
    fn test_repeated_unset_number_is_not_a_change() {
        let mut el = Element::new(
            "VALUE".to_string(),
            None,
            ElementValue::Number(f64::NAN, "%g".to_string()),
            Utc::now(),
        );
        assert!(!el.set_value(ElementValue::Number(f64::NAN, "%g".to_string()), Utc::now()));
        // The defined (unset) value is still the only history entry; the
        // repeated unset report did not add a second one.
        assert_eq!(el.history.len(), 1);
        assert_eq!(el.value.to_json(), serde_json::Value::Null);
    }
}
