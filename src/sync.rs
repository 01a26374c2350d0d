//! Synchronization helpers built on [`crate::store::Store`] watchers (spec
//! §4.H): [`wait_for_properties`] blocks until a set of properties exists;
//! [`wait_for_state`] blocks until a set of elements reaches a target value
//! or satisfies a predicate.
//!
//! Both take the store behind a `tokio::sync::Mutex` rather than the
//! `std::sync::Mutex` the blocking engine uses, since they `await` between
//! lock acquisitions. The watcher closure registered by `wait_for_state`
//! never re-locks the store — `Store::apply` calls it while the connection
//! engine already holds the lock, so closures only fire a
//! [`tokio::sync::Notify`] and return immediately; the actual re-check runs
//! in this module's waiter loop, after the lock has been released and
//! re-acquired fresh. Locking the store from inside its own watcher
//! callback would deadlock against a mutex that isn't reentrant.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Mutex, Notify};

use crate::error::{Error, Result};
use crate::store::element::ElementValue;
use crate::store::Store;
use crate::update::Update;

/// How often `wait_for_properties` polls for existence (spec §4.H: "Polling
/// at 1 Hz is acceptable").
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// What `wait_for_state` checks an element against.
pub enum StateTarget {
    /// Block until the element's value equals this exactly.
    Value(ElementValue),
    /// Block until this predicate over the element's current value returns
    /// `true`. Never submitted as an outbound assignment — there's no
    /// single value to send, so the caller is expected to have already
    /// triggered whatever change it's waiting on.
    Predicate(Arc<dyn Fn(&ElementValue) -> bool + Send + Sync>),
}

impl StateTarget {
    fn matches(&self, value: &ElementValue) -> bool {
        match self {
            StateTarget::Value(target) => target == value,
            StateTarget::Predicate(pred) => pred(value),
        }
    }

    fn submit_value(&self) -> Option<ElementValue> {
        match self {
            StateTarget::Value(v) => Some(v.clone()),
            StateTarget::Predicate(_) => None,
        }
    }
}

/// Block until every `device.property` id in `ids` exists in the store, or
/// raise [`Error::Timeout`] after `timeout_secs`. Returns the elapsed time
/// in seconds (spec S3).
pub async fn wait_for_properties(
    store: Arc<Mutex<Store>>,
    ids: &[String],
    timeout_secs: f64,
) -> Result<f64> {
    let deadline = Instant::now() + Duration::from_secs_f64(timeout_secs.max(0.0));
    let started = Instant::now();

    loop {
        {
            let guard = store.lock().await;
            let all_present = ids.iter().all(|id| {
                let mut parts = id.splitn(2, '.');
                match (parts.next(), parts.next()) {
                    (Some(device), Some(property)) => guard.property(device, property).is_some(),
                    _ => false,
                }
            });
            if all_present {
                return Ok(started.elapsed().as_secs_f64());
            }
        }

        if Instant::now() >= deadline {
            return Err(Error::Timeout(
                timeout_secs,
                format!("properties not defined: {}", ids.join(", ")),
            ));
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        tokio::time::sleep(remaining.min(POLL_INTERVAL)).await;
    }
}

/// Block until every `device.property.element` entry in `targets` matches
/// its target (value equality or predicate), or raise [`Error::Timeout`]
/// after `timeout_secs`. Returns the elapsed time in seconds.
///
/// For entries with a [`StateTarget::Value`], the target is submitted as an
/// assignment on `outbound` before waiting, so a caller can express "set
/// `mount.slew.ra` to 12.5 and wait for it to get there" as one call.
/// [`StateTarget::Predicate`] entries are never submitted — only observed.
pub async fn wait_for_state(
    store: Arc<Mutex<Store>>,
    outbound: mpsc::Sender<Update>,
    targets: HashMap<String, StateTarget>,
    timeout_secs: f64,
) -> Result<f64> {
    let started = Instant::now();
    let deadline = started + Duration::from_secs_f64(timeout_secs.max(0.0));
    let notify = Arc::new(Notify::new());

    let mut pending: HashMap<String, StateTarget> = HashMap::new();
    let mut registered: Vec<(String, String, crate::store::watcher::WatcherId)> = Vec::new();
    let mut to_send: Vec<Update> = Vec::new();

    {
        let mut guard = store.lock().await;
        for (path, target) in targets {
            let already_satisfied = guard
                .get(&path)
                .map(|value| target.matches(value))
                .unwrap_or(false);
            if already_satisfied {
                continue;
            }

            let (device, property) = match split_property_path(&path) {
                Some(parts) => parts,
                None => {
                    return Err(Error::LookupError(format!(
                        "'{}' is not a device.property.element path",
                        path
                    )))
                }
            };

            let watcher_notify = Arc::clone(&notify);
            if let Some(id) =
                guard.watch_property(&device, &property, move |_update: &Update| {
                    watcher_notify.notify_one();
                })
            {
                registered.push((device.clone(), property.clone(), id));
            }

            if let Some(value) = target.submit_value() {
                to_send.push(guard.set(&path, value)?);
            }
            pending.insert(path, target);
        }
    }

    for update in to_send {
        outbound
            .send(update)
            .await
            .map_err(|_| Error::ConnectionError("outbound channel closed".to_string()))?;
    }

    let result = wait_loop(&store, &notify, &mut pending, deadline).await;

    {
        let mut guard = store.lock().await;
        for (device, property, id) in registered {
            guard.unwatch_property(&device, &property, id);
        }
    }

    result.map(|_| started.elapsed().as_secs_f64())
}

async fn wait_loop(
    store: &Arc<Mutex<Store>>,
    notify: &Arc<Notify>,
    pending: &mut HashMap<String, StateTarget>,
    deadline: Instant,
) -> Result<()> {
    loop {
        if pending.is_empty() {
            return Ok(());
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(Error::Timeout(
                deadline.duration_since(Instant::now()).as_secs_f64().max(0.0),
                format!("state not reached: {}", pending.keys().cloned().collect::<Vec<_>>().join(", ")),
            ));
        }

        match tokio::time::timeout(remaining, notify.notified()).await {
            Ok(()) => {
                let guard = store.lock().await;
                pending.retain(|path, target| {
                    !guard
                        .get(path)
                        .map(|value| target.matches(value))
                        .unwrap_or(false)
                });
            }
            Err(_) => {
                return Err(Error::Timeout(
                    deadline.saturating_duration_since(Instant::now()).as_secs_f64(),
                    format!(
                        "state not reached: {}",
                        pending.keys().cloned().collect::<Vec<_>>().join(", ")
                    ),
                ));
            }
        }
    }
}

fn split_property_path(path: &str) -> Option<(String, String)> {
    let mut parts = path.splitn(3, '.');
    let device = parts.next()?;
    let property = parts.next()?;
    parts.next()?;
    Some((device.to_string(), property.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{PropertyPerm, PropertyState};
    use crate::update::DefineProperty;

    fn define_number(device: &str, prop: &str, element: &str, value: f64) -> Update {
        use crate::message::{DefNumber, DefNumberVector};
        Update::DefineProperty(DefineProperty::Number(DefNumberVector {
            device: device.to_string(),
            name: prop.to_string(),
            label: None,
            group: None,
            state: PropertyState::Idle,
            perm: PropertyPerm::Rw,
            timeout: None,
            timestamp: None,
            message: None,
            numbers: vec![DefNumber {
                name: element.to_string(),
                label: None,
                format: "%g".to_string(),
                min: 0.0,
                max: 100.0,
                step: 1.0,
                value,
            }],
        }))
    }

    #[tokio::test]
    async fn test_wait_for_properties_timeout_then_success() {
        let store = Arc::new(Mutex::new(Store::default()));
        let err = wait_for_properties(Arc::clone(&store), &["test.prop".to_string()], 0.0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(_, _)));

        store
            .lock()
            .await
            .apply(&define_number("test", "prop", "value", 1.0));
        let elapsed = wait_for_properties(store, &["test.prop".to_string()], 1.0)
            .await
            .unwrap();
        assert!(elapsed >= 0.0);
    }

    #[tokio::test]
    async fn test_wait_for_state_already_satisfied_returns_immediately() {
        let store = Arc::new(Mutex::new(Store::default()));
        store
            .lock()
            .await
            .apply(&define_number("mount", "slew", "ra", 5.0));

        let (tx, _rx) = mpsc::channel(8);
        let mut targets = HashMap::new();
        targets.insert(
            "mount.slew.ra".to_string(),
            StateTarget::Value(ElementValue::Number(5.0, "%g".to_string())),
        );

        let elapsed = wait_for_state(store, tx, targets, 1.0).await.unwrap();
        assert!(elapsed < 1.0);
    }

    #[tokio::test]
    async fn test_wait_for_state_predicate_never_submits() {
        let store = Arc::new(Mutex::new(Store::default()));
        store
            .lock()
            .await
            .apply(&define_number("mount", "slew", "ra", 5.0));

        let (tx, mut rx) = mpsc::channel(8);
        let mut targets = HashMap::new();
        targets.insert(
            "mount.slew.ra".to_string(),
            StateTarget::Predicate(Arc::new(|v: &ElementValue| {
                matches!(v, ElementValue::Number(n, _) if *n >= 5.0)
            })),
        );

        wait_for_state(store, tx, targets, 1.0).await.unwrap();
        assert!(rx.try_recv().is_err());
    }
}
