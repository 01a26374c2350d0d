//! The public, consumer-facing client (spec §6).
//!
//! [`Client`] is the primary, cooperative (`tokio`) entry point: it owns a
//! [`crate::connection::cooperative::CooperativeConnection`] and the shared
//! [`Store`], and exposes `start`/`stop`, dotted-path `get`/`set`, watcher
//! registration at every level, `snapshot()`, and the
//! [`crate::sync::wait_for_properties`]/[`crate::sync::wait_for_state`]
//! helpers. [`BlockingClient`] presents the same surface over the
//! `std::thread`-based engine for callers without a `tokio` runtime.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::Value;

use crate::connection::blocking::BlockingConnection;
use crate::connection::cooperative::CooperativeConnection;
use crate::connection::ConnectionStatus;
use crate::error::{Error, Result};
use crate::store::element::ElementValue;
use crate::store::watcher::WatcherId;
use crate::store::Store;
use crate::sync::{self, StateTarget};
use crate::update::Update;

/// Default INDI server port.
pub const DEFAULT_PORT: u16 = 7624;

/// Client configuration: address, reconnection policy, and per-element
/// history capacity, following the teacher's `ClientConfig` shape.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Host to connect to.
    pub host: String,
    /// Port to connect to.
    pub port: u16,
    /// Whether the cooperative variant should reconnect automatically after
    /// losing the connection (spec §4.G). Ignored by [`BlockingClient`].
    pub reconnect_automatically: bool,
    /// Per-element history capacity; see [`crate::store::history`].
    pub history_capacity: usize,
}

impl ClientConfig {
    /// Default INDI server port (7624).
    pub const DEFAULT_PORT: u16 = DEFAULT_PORT;

    /// A configuration targeting `host:port` with the library's defaults
    /// for everything else (no automatic reconnection, the store's default
    /// history capacity).
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            reconnect_automatically: false,
            history_capacity: crate::store::history::MAX_ELEMENT_HISTORY,
        }
    }

    /// Enable automatic reconnection for the cooperative variant.
    pub fn with_reconnect(mut self, reconnect: bool) -> Self {
        self.reconnect_automatically = reconnect;
        self
    }

    /// Override the per-element history capacity.
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", DEFAULT_PORT)
    }
}

/// The cooperative (`tokio`) INDI client.
pub struct Client {
    store: Arc<tokio::sync::Mutex<Store>>,
    connection: CooperativeConnection,
}

impl Client {
    /// Create a new, not-yet-started client targeting `host:port` with
    /// default configuration.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_config(ClientConfig::new(host, port))
    }

    /// Create a new, not-yet-started client from an explicit configuration.
    pub fn with_config(config: ClientConfig) -> Self {
        let store = Arc::new(tokio::sync::Mutex::new(Store::new(config.history_capacity)));
        let connection = CooperativeConnection::new(
            config.host,
            config.port,
            Arc::clone(&store),
            config.reconnect_automatically,
        );
        Self { store, connection }
    }

    /// The address this client connects (or is connected) to.
    pub fn server_addr(&self, config: &ClientConfig) -> SocketAddr {
        format!("{}:{}", config.host, config.port)
            .parse()
            .unwrap_or_else(|_| ([127, 0, 0, 1], config.port).into())
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    /// Open the connection and start both workers. Returns immediately;
    /// poll [`Self::status`] or use [`Self::wait_for_properties`] to
    /// observe progress.
    pub fn start(&mut self) {
        self.connection.start();
    }

    /// Equivalent to [`Self::start`], named to match the "run until
    /// stopped, optionally reconnecting" framing from spec §6.
    pub fn run(&mut self, reconnect_automatically: bool) {
        if reconnect_automatically {
            tracing::warn!(
                "Client::run(reconnect_automatically = true) requires a client constructed \
                 with ClientConfig::with_reconnect(true); this call does not retroactively \
                 enable it"
            );
        }
        self.start();
    }

    /// Request shutdown and wait for the connection task to finish.
    pub async fn stop(&mut self) {
        self.connection.stop().await;
    }

    /// Look up the current value at a dotted `device.property.element`
    /// path.
    pub async fn get(&self, path: &str) -> Option<ElementValue> {
        self.store.lock().await.get(path).cloned()
    }

    /// Assign a new value at a dotted `device.property.element` path,
    /// enqueueing the resulting `NewProperty` on the outbound path.
    pub async fn set(&self, path: &str, value: ElementValue) -> Result<()> {
        let update = self.store.lock().await.set(path, value)?;
        self.connection
            .outbound()
            .send(update)
            .await
            .map_err(|_| Error::ConnectionError("outbound channel closed".to_string()))
    }

    /// A JSON-shaped snapshot of the entire Device → Property → Element
    /// tree (spec §4.D).
    pub async fn snapshot(&self) -> Value {
        self.store.lock().await.snapshot()
    }

    /// Register a client-level watcher, firing on every applied `Update`.
    pub async fn add_watcher<F>(&self, f: F) -> WatcherId
    where
        F: Fn(&Update) + Send + Sync + 'static,
    {
        self.store.lock().await.watch_client(f)
    }

    /// Remove a client-level watcher.
    pub async fn remove_watcher(&self, id: WatcherId) {
        self.store.lock().await.unwatch_client(id);
    }

    /// Register a device-level watcher. `None` only in pathological cases
    /// (the store always creates the device record on first registration).
    pub async fn add_device_watcher<F>(&self, device: &str, f: F) -> Option<WatcherId>
    where
        F: Fn(&Update) + Send + Sync + 'static,
    {
        self.store.lock().await.watch_device(device, f)
    }

    /// Remove a device-level watcher.
    pub async fn remove_device_watcher(&self, device: &str, id: WatcherId) {
        self.store.lock().await.unwatch_device(device, id);
    }

    /// Register a property-level watcher. `None` if the property isn't
    /// defined yet.
    pub async fn add_property_watcher<F>(&self, device: &str, property: &str, f: F) -> Option<WatcherId>
    where
        F: Fn(&Update) + Send + Sync + 'static,
    {
        self.store.lock().await.watch_property(device, property, f)
    }

    /// Remove a property-level watcher.
    pub async fn remove_property_watcher(&self, device: &str, property: &str, id: WatcherId) {
        self.store.lock().await.unwatch_property(device, property, id);
    }

    /// Register an element-level watcher. `None` if the element isn't
    /// defined yet.
    pub async fn add_element_watcher<F>(
        &self,
        device: &str,
        property: &str,
        element: &str,
        f: F,
    ) -> Option<WatcherId>
    where
        F: Fn(&Update) + Send + Sync + 'static,
    {
        self.store
            .lock()
            .await
            .watch_element(device, property, element, f)
    }

    /// Remove an element-level watcher.
    pub async fn remove_element_watcher(
        &self,
        device: &str,
        property: &str,
        element: &str,
        id: WatcherId,
    ) {
        self.store
            .lock()
            .await
            .unwatch_element(device, property, element, id);
    }

    /// Block until every `device.property` id in `ids` has been defined.
    pub async fn wait_for_properties(&self, ids: &[String], timeout_secs: f64) -> Result<f64> {
        sync::wait_for_properties(Arc::clone(&self.store), ids, timeout_secs).await
    }

    /// Block until every tracked element reaches its target value or
    /// satisfies its predicate (spec §4.H).
    pub async fn wait_for_state(
        &self,
        targets: HashMap<String, StateTarget>,
        timeout_secs: f64,
    ) -> Result<f64> {
        sync::wait_for_state(
            Arc::clone(&self.store),
            self.connection.outbound(),
            targets,
            timeout_secs,
        )
        .await
    }
}

/// The blocking (`std::thread`) INDI client, for callers without a `tokio`
/// runtime. Presents the same synchronous surface as [`Client`]'s async
/// methods, minus the synchronization helpers (spec §4.H is built on the
/// `tokio`-based primitives in [`crate::sync`]; the blocking variant's own
/// callers poll [`Self::snapshot`] instead, the same way the teacher's CLI
/// tools did).
pub struct BlockingClient {
    store: Arc<std::sync::Mutex<Store>>,
    connection: BlockingConnection,
}

impl BlockingClient {
    /// Create a new, not-yet-started client targeting `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_config(ClientConfig::new(host, port))
    }

    /// Create a new, not-yet-started client from an explicit configuration.
    /// `config.reconnect_automatically` is ignored; the blocking variant
    /// never reconnects on its own (spec §4.F).
    pub fn with_config(config: ClientConfig) -> Self {
        let store = Arc::new(std::sync::Mutex::new(Store::new(config.history_capacity)));
        let connection = BlockingConnection::new(config.host, config.port, Arc::clone(&store));
        Self { store, connection }
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    /// Open the connection and start both worker threads.
    pub fn start(&mut self) -> Result<()> {
        self.connection.start()
    }

    /// Signal both workers to stop and join them.
    pub fn stop(&mut self) {
        self.connection.stop();
    }

    /// Look up the current value at a dotted `device.property.element`
    /// path.
    pub fn get(&self, path: &str) -> Option<ElementValue> {
        self.store.lock().unwrap().get(path).cloned()
    }

    /// Assign a new value at a dotted `device.property.element` path,
    /// enqueueing the resulting `NewProperty` on the outbound path.
    pub fn set(&self, path: &str, value: ElementValue) -> Result<()> {
        let update = self.store.lock().unwrap().set(path, value)?;
        self.connection
            .outbound()
            .send(update)
            .map_err(|_| Error::ConnectionError("outbound channel closed".to_string()))
    }

    /// A JSON-shaped snapshot of the entire Device → Property → Element
    /// tree.
    pub fn snapshot(&self) -> Value {
        self.store.lock().unwrap().snapshot()
    }

    /// Register a client-level watcher, firing on every applied `Update`.
    pub fn add_watcher<F>(&self, f: F) -> WatcherId
    where
        F: Fn(&Update) + Send + Sync + 'static,
    {
        self.store.lock().unwrap().watch_client(f)
    }

    /// Remove a client-level watcher.
    pub fn remove_watcher(&self, id: WatcherId) {
        self.store.lock().unwrap().unwatch_client(id);
    }

    /// Block until every `device.property` id in `ids` has been defined,
    /// polling at 1 Hz (spec §4.H).
    pub fn wait_for_properties(&self, ids: &[String], timeout_secs: f64) -> Result<f64> {
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs_f64(timeout_secs.max(0.0));
        let started = std::time::Instant::now();
        loop {
            let all_present = {
                let guard = self.store.lock().unwrap();
                ids.iter().all(|id| {
                    let mut parts = id.splitn(2, '.');
                    match (parts.next(), parts.next()) {
                        (Some(device), Some(property)) => guard.property(device, property).is_some(),
                        _ => false,
                    }
                })
            };
            if all_present {
                return Ok(started.elapsed().as_secs_f64());
            }
            if std::time::Instant::now() >= deadline {
                return Err(Error::Timeout(
                    timeout_secs,
                    format!("properties not defined: {}", ids.join(", ")),
                ));
            }
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            std::thread::sleep(remaining.min(std::time::Duration::from_secs(1)));
        }
    }
}
