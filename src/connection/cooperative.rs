//! Component G: the cooperative, `tokio`-task connection engine.
//!
//! Same external contract as [`super::blocking`] — one inbound task parses
//! and applies, one outbound task serializes and sends — but structured as
//! async tasks over a real `tokio::net::TcpStream`, and with an optional
//! automatic-reconnect loop wrapping both. This is the primary, fully
//! exercised variant; the blocking engine exists for callers who can't run
//! a `tokio` runtime.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::connection::{ConnectionStatus, SharedStatus, CHUNK_MAX_READ_SIZE, RECONNECTION_DELAY, SOCKET_READ_TIMEOUT};
use crate::message::GetProperties;
use crate::parser::XmlStreamParser;
use crate::serializer::serialize;
use crate::store::Store;
use crate::update::Update;
use crate::PROTOCOL_VERSION;

/// The cooperative connection engine (spec §4.G).
///
/// `run()` drives the connection until `stop()` is called or (absent
/// `reconnect_automatically`) the socket closes. Reconnection, when
/// enabled, sleeps [`RECONNECTION_DELAY`] between attempts and re-announces
/// interest with a fresh `GetProperties` on every successful reconnect.
pub struct CooperativeConnection {
    host: String,
    port: u16,
    store: Arc<Mutex<Store>>,
    status: Arc<SharedStatus>,
    outbound_tx: mpsc::Sender<Update>,
    outbound_rx: Option<mpsc::Receiver<Update>>,
    reconnect_automatically: bool,
    task: Option<JoinHandle<()>>,
}

impl CooperativeConnection {
    /// Create a new, not-yet-started engine targeting `host:port`.
    pub fn new(host: impl Into<String>, port: u16, store: Arc<Mutex<Store>>, reconnect_automatically: bool) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(256);
        Self {
            host: host.into(),
            port,
            store,
            status: Arc::new(SharedStatus::new()),
            outbound_tx,
            outbound_rx: Some(outbound_rx),
            reconnect_automatically,
            task: None,
        }
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.status.get()
    }

    /// A shared status handle, for callers (e.g. [`crate::sync::wait_for_state`])
    /// that need to poll or await connectivity without holding the store lock.
    pub fn shared_status(&self) -> Arc<SharedStatus> {
        Arc::clone(&self.status)
    }

    /// A clonable sender for enqueuing outbound `Update`s.
    pub fn outbound(&self) -> mpsc::Sender<Update> {
        self.outbound_tx.clone()
    }

    /// Spawn the connect-and-drive loop as a background task. Returns
    /// immediately; connectivity is reported via [`Self::status`].
    pub fn start(&mut self) {
        if self.task.is_some() {
            return;
        }
        if self.outbound_rx.is_none() {
            // A prior start()/stop() cycle already moved the receiver into
            // that cycle's driving task; open a fresh channel so this
            // restart doesn't panic on the `.expect()` below.
            let (tx, rx) = mpsc::channel(256);
            self.outbound_tx = tx;
            self.outbound_rx = Some(rx);
        }
        self.status.set(ConnectionStatus::Starting);
        let host = self.host.clone();
        let port = self.port;
        let store = Arc::clone(&self.store);
        let status = Arc::clone(&self.status);
        let rx = self
            .outbound_rx
            .take()
            .expect("outbound receiver taken twice; start() called after stop() without a fresh engine");
        let reconnect = self.reconnect_automatically;
        self.task = Some(tokio::spawn(async move {
            drive(host, port, store, status, rx, reconnect).await;
        }));
    }

    /// Request shutdown and wait for the driving task to finish.
    pub async fn stop(&mut self) {
        self.status.set(ConnectionStatus::Stopped);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

async fn drive(
    host: String,
    port: u16,
    store: Arc<Mutex<Store>>,
    status: Arc<SharedStatus>,
    mut outbound_rx: mpsc::Receiver<Update>,
    reconnect_automatically: bool,
) {
    loop {
        if status.is_stopped() {
            return;
        }
        match TcpStream::connect((host.as_str(), port)).await {
            Ok(stream) => {
                status.set(ConnectionStatus::Connected);
                run_session(stream, &store, &status, &mut outbound_rx).await;
            }
            Err(e) => {
                tracing::warn!(error = %e, host, port, "connect failed");
            }
        }

        if status.is_stopped() || !reconnect_automatically {
            status.set(ConnectionStatus::Stopped);
            return;
        }
        status.set(ConnectionStatus::Reconnecting);
        tokio::time::sleep(RECONNECTION_DELAY).await;
    }
}

/// Drive a single connected session until the socket closes or `stop()` is
/// observed. On return the caller decides whether to reconnect.
async fn run_session(
    stream: TcpStream,
    store: &Arc<Mutex<Store>>,
    status: &Arc<SharedStatus>,
    outbound_rx: &mut mpsc::Receiver<Update>,
) {
    let (mut read_half, mut write_half) = stream.into_split();

    let initial = Update::GetProperties(GetProperties {
        version: PROTOCOL_VERSION.to_string(),
        device: None,
        name: None,
    });
    let bytes = match serialize(&initial, &HashMap::new()) {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(error = %e, "failed to serialize initial getProperties");
            return;
        }
    };
    if let Err(e) = write_half.write_all(bytes.as_bytes()).await {
        tracing::warn!(error = %e, "failed to send initial getProperties");
        return;
    }

    let mut parser = XmlStreamParser::new();
    let mut buf = [0u8; CHUNK_MAX_READ_SIZE];

    loop {
        tokio::select! {
            biased;

            _ = tokio::time::sleep(Duration::from_millis(100)), if status.is_stopped() => {
                let _ = write_half.shutdown().await;
                return;
            }

            update = outbound_rx.recv() => {
                match update {
                    Some(update) => {
                        let formats = match &update {
                            Update::NewProperty(n) => store.lock().await.number_formats(n.device(), n.name()),
                            _ => HashMap::new(),
                        };
                        match serialize(&update, &formats) {
                            Ok(bytes) => {
                                if let Err(e) = write_half.write_all(bytes.as_bytes()).await {
                                    tracing::warn!(error = %e, "outbound write failed");
                                    return;
                                }
                            }
                            Err(e) => tracing::warn!(error = %e, "failed to serialize outbound update"),
                        }
                    }
                    None => {
                        let _ = write_half.shutdown().await;
                        return;
                    }
                }
            }

            read_result = tokio::time::timeout(SOCKET_READ_TIMEOUT, read_half.read(&mut buf)) => {
                match read_result {
                    Ok(Ok(0)) => {
                        tracing::warn!("server closed the connection");
                        return;
                    }
                    Ok(Ok(n)) => {
                        parser.feed(&buf[..n]);
                        let mut guard = store.lock().await;
                        while let Some(update) = parser.next_update() {
                            guard.apply(&update);
                        }
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, "inbound read failed");
                        return;
                    }
                    Err(_) => {
                        // Read timeout: loop back around to re-check `status`.
                    }
                }
            }
        }

        if status.is_stopped() {
            let _ = write_half.shutdown().await;
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_start_stop_against_loopback_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 256];
            // Drain the initial getProperties, then send a simple def back.
            let _ = socket.read(&mut buf).await;
            let fragment = br#"<defTextVector device="Mount" name="SITE" state="Idle" perm="ro"><defText name="SITE_NAME">Home</defText></defTextVector>"#;
            let _ = socket.write_all(fragment).await;
            tokio::time::sleep(Duration::from_millis(200)).await;
        });

        let store = Arc::new(Mutex::new(Store::default()));
        let mut conn = CooperativeConnection::new("127.0.0.1", addr.port(), Arc::clone(&store), false);
        conn.start();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(conn.status(), ConnectionStatus::Connected);
        assert!(store.lock().await.device("Mount").is_some());

        conn.stop().await;
        assert_eq!(conn.status(), ConnectionStatus::Stopped);

        let _ = server.await;
    }

    #[tokio::test]
    async fn test_reconnects_after_server_drop_when_enabled() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            // First connection: accept then immediately drop.
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
            // Second connection: accept and hold briefly.
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
            drop(socket);
        });

        let store = Arc::new(Mutex::new(Store::default()));
        let mut conn = CooperativeConnection::new("127.0.0.1", addr.port(), store, true);
        conn.start();

        tokio::time::sleep(Duration::from_millis(50)).await;
        // Either still connected to the first (about to drop) or already
        // reconnecting; either is a valid snapshot of the state machine.
        let first = conn.status();
        assert!(matches!(
            first,
            ConnectionStatus::Connected | ConnectionStatus::Reconnecting
        ));

        tokio::time::sleep(RECONNECTION_DELAY + Duration::from_millis(200)).await;
        assert_eq!(conn.status(), ConnectionStatus::Connected);

        conn.stop().await;
        let _ = server.await;
    }
}
