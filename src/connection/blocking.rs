//! Component F: the blocking, two-`std::thread` connection engine.
//!
//! One inbound worker reads up to [`CHUNK_MAX_READ_SIZE`](super::CHUNK_MAX_READ_SIZE)
//! bytes per call with a [`SYNCHRONIZATION_TIMEOUT`](super::SYNCHRONIZATION_TIMEOUT)
//! receive deadline, feeds them to [`XmlStreamParser`], and drains the
//! resulting queue into the shared [`Store`]. One outbound worker dequeues
//! `Update`s with the same timeout, serializes them, and writes them to the
//! socket. Both re-check [`SharedStatus`] on every timeout, so `stop()` has
//! bounded latency.
//!
//! The socket is abstracted behind [`ReadTransport`]/[`WriteTransport`] (one
//! trait per half, mirroring a real `TcpStream::try_clone` split) so tests
//! can drive the worker loops against [`mockall`]-generated mocks instead of
//! a real socket.

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::connection::{ConnectionStatus, SharedStatus, CHUNK_MAX_READ_SIZE, SYNCHRONIZATION_TIMEOUT};
use crate::error::{Error, Result};
use crate::message::GetProperties;
use crate::parser::XmlStreamParser;
use crate::serializer::serialize;
use crate::store::Store;
use crate::update::Update;
use crate::PROTOCOL_VERSION;

/// The read half of a socket, abstracted for testability.
#[cfg_attr(test, mockall::automock)]
pub trait ReadTransport: Send {
    /// Set (or clear) the blocking receive deadline.
    fn set_read_timeout(&self, dur: Option<std::time::Duration>) -> io::Result<()>;
    /// Read up to `buf.len()` bytes, per the usual `Read::read` contract.
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// The write half of a socket, abstracted for testability.
#[cfg_attr(test, mockall::automock)]
pub trait WriteTransport: Send {
    /// Write the full buffer, per the usual `Write::write_all` contract.
    fn write_chunk(&mut self, buf: &[u8]) -> io::Result<()>;
    /// Close the write half (best-effort; a lost connection's write half may
    /// already be gone).
    fn shutdown(&mut self) -> io::Result<()>;
}

impl ReadTransport for TcpStream {
    fn set_read_timeout(&self, dur: Option<std::time::Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, dur)
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }
}

impl WriteTransport for TcpStream {
    fn write_chunk(&mut self, buf: &[u8]) -> io::Result<()> {
        Write::write_all(self, buf)
    }

    fn shutdown(&mut self) -> io::Result<()> {
        TcpStream::shutdown(self, std::net::Shutdown::Both)
    }
}

/// The blocking, thread-per-direction connection engine (spec §4.F).
pub struct BlockingConnection {
    host: String,
    port: u16,
    store: Arc<Mutex<Store>>,
    status: Arc<SharedStatus>,
    outbound_tx: mpsc::Sender<Update>,
    outbound_rx: Option<mpsc::Receiver<Update>>,
    inbound_handle: Option<JoinHandle<()>>,
    outbound_handle: Option<JoinHandle<()>>,
}

impl BlockingConnection {
    /// Create a new, not-yet-started engine targeting `host:port`, sharing
    /// `store` with the rest of the client.
    pub fn new(host: impl Into<String>, port: u16, store: Arc<Mutex<Store>>) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel();
        Self {
            host: host.into(),
            port,
            store,
            status: Arc::new(SharedStatus::new()),
            outbound_tx,
            outbound_rx: Some(outbound_rx),
            inbound_handle: None,
            outbound_handle: None,
        }
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.status.get()
    }

    /// A clonable handle for enqueuing outbound `Update`s (e.g. from
    /// `Store::set`'s result) onto the outbound worker's queue.
    pub fn outbound(&self) -> mpsc::Sender<Update> {
        self.outbound_tx.clone()
    }

    /// Open the socket, announce interest in the server's full tree with an
    /// unfiltered `GetProperties`, and start both workers. Idempotent if
    /// already `Connected`.
    pub fn start(&mut self) -> Result<()> {
        if self.status.get() == ConnectionStatus::Connected {
            return Ok(());
        }
        if self.outbound_rx.is_none() {
            // A prior start()/stop() cycle already moved the receiver into
            // that cycle's outbound worker; open a fresh channel so this
            // restart doesn't panic on the `.expect()` below.
            let (tx, rx) = mpsc::channel();
            self.outbound_tx = tx;
            self.outbound_rx = Some(rx);
        }
        self.status.set(ConnectionStatus::Starting);
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .map_err(|e| Error::ConnectionError(e.to_string()))?;
        let read_half: TcpStream = stream
            .try_clone()
            .map_err(|e| Error::ConnectionError(e.to_string()))?;
        self.start_with_transports(Box::new(read_half), Box::new(stream))
    }

    /// Shared `start()` body, taking already-open transport halves so tests
    /// can substitute mocks for a real socket.
    fn start_with_transports(
        &mut self,
        read: Box<dyn ReadTransport>,
        mut write: Box<dyn WriteTransport>,
    ) -> Result<()> {
        let initial = Update::GetProperties(GetProperties {
            version: PROTOCOL_VERSION.to_string(),
            device: None,
            name: None,
        });
        let bytes = serialize(&initial, &HashMap::new())?;
        write
            .write_chunk(bytes.as_bytes())
            .map_err(|e| Error::ConnectionError(e.to_string()))?;

        self.status.set(ConnectionStatus::Connected);

        let inbound_store = Arc::clone(&self.store);
        let inbound_status = Arc::clone(&self.status);
        self.inbound_handle = Some(thread::spawn(move || {
            inbound_loop(read, inbound_store, inbound_status);
        }));

        let outbound_store = Arc::clone(&self.store);
        let outbound_status = Arc::clone(&self.status);
        let rx = self
            .outbound_rx
            .take()
            .expect("outbound receiver taken twice; start() called after stop() without a fresh engine");
        self.outbound_handle = Some(thread::spawn(move || {
            outbound_loop(write, rx, outbound_store, outbound_status);
        }));

        Ok(())
    }

    /// Signal both workers to stop and join them. Bounded to roughly
    /// `2 * SYNCHRONIZATION_TIMEOUT` latency (spec S6).
    pub fn stop(&mut self) {
        self.status.set(ConnectionStatus::Stopped);
        if let Some(handle) = self.inbound_handle.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.outbound_handle.take() {
            let _ = handle.join();
        }
    }
}

fn inbound_loop(mut read: Box<dyn ReadTransport>, store: Arc<Mutex<Store>>, status: Arc<SharedStatus>) {
    if let Err(e) = read.set_read_timeout(Some(SYNCHRONIZATION_TIMEOUT)) {
        tracing::warn!(error = %e, "failed to set read timeout; proceeding without it");
    }
    let mut parser = XmlStreamParser::new();
    let mut buf = [0u8; CHUNK_MAX_READ_SIZE];

    while !status.is_stopped() {
        match read.read_chunk(&mut buf) {
            Ok(0) => {
                tracing::warn!("server closed the connection");
                status.set(ConnectionStatus::Stopped);
                break;
            }
            Ok(n) => {
                parser.feed(&buf[..n]);
                let mut guard = store.lock().unwrap();
                while let Some(update) = parser.next_update() {
                    guard.apply(&update);
                }
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                continue;
            }
            Err(e) => {
                tracing::warn!(error = %e, "inbound read failed");
                status.set(ConnectionStatus::Stopped);
                break;
            }
        }
    }
}

fn outbound_loop(
    mut write: Box<dyn WriteTransport>,
    rx: mpsc::Receiver<Update>,
    store: Arc<Mutex<Store>>,
    status: Arc<SharedStatus>,
) {
    while !status.is_stopped() {
        match rx.recv_timeout(SYNCHRONIZATION_TIMEOUT) {
            Ok(update) => {
                let formats = match &update {
                    Update::NewProperty(n) => store.lock().unwrap().number_formats(n.device(), n.name()),
                    _ => HashMap::new(),
                };
                match serialize(&update, &formats) {
                    Ok(bytes) => {
                        if let Err(e) = write.write_chunk(bytes.as_bytes()) {
                            tracing::warn!(error = %e, "outbound write failed");
                            status.set(ConnectionStatus::Stopped);
                            break;
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "failed to serialize outbound update"),
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    let _ = write.shutdown();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read as _, Write as _};
    use std::net::TcpListener;
    use std::time::Duration;

    #[test]
    fn test_mock_inbound_loop_applies_update_then_stops_on_timeout_flag() {
        let mut mock = MockReadTransport::new();
        mock.expect_set_read_timeout().returning(|_| Ok(()));

        const FRAGMENT: &[u8] = br#"<defTextVector device="Mount" name="SITE" state="Idle" perm="ro"><defText name="SITE_NAME">Home</defText></defTextVector>"#;
        let mut served = false;
        mock.expect_read_chunk().returning(move |buf| {
            if !served {
                served = true;
                buf[..FRAGMENT.len()].copy_from_slice(FRAGMENT);
                Ok(FRAGMENT.len())
            } else {
                Err(io::Error::from(io::ErrorKind::WouldBlock))
            }
        });

        let store = Arc::new(Mutex::new(Store::default()));
        let status = Arc::new(SharedStatus::new());
        let status_for_stopper = Arc::clone(&status);
        let store_for_check = Arc::clone(&store);

        let handle = thread::spawn(move || {
            inbound_loop(Box::new(mock), store, status);
        });

        // Give the worker a moment to apply the fragment, then request stop.
        thread::sleep(Duration::from_millis(50));
        assert!(store_for_check.lock().unwrap().device("Mount").is_some());
        status_for_stopper.set(ConnectionStatus::Stopped);
        handle.join().unwrap();
    }

    #[test]
    fn test_mock_outbound_loop_serializes_and_writes() {
        let mut mock = MockWriteTransport::new();
        mock.expect_write_chunk()
            .withf(|buf| String::from_utf8_lossy(buf).contains("getProperties"))
            .returning(|_| Ok(()));
        mock.expect_shutdown().returning(|| Ok(()));

        let (tx, rx) = mpsc::channel();
        let store = Arc::new(Mutex::new(Store::default()));
        let status = Arc::new(SharedStatus::new());
        let status_for_stopper = Arc::clone(&status);

        let handle = thread::spawn(move || {
            outbound_loop(Box::new(mock), rx, store, status);
        });

        tx.send(Update::GetProperties(GetProperties {
            version: "1.7".to_string(),
            device: None,
            name: None,
        }))
        .unwrap();

        thread::sleep(Duration::from_millis(50));
        status_for_stopper.set(ConnectionStatus::Stopped);
        handle.join().unwrap();
    }

    /// S6: start/stop idempotence against a real loopback socket, bounded
    /// to `2 * SYNCHRONIZATION_TIMEOUT`.
    #[test]
    fn test_start_stop_idempotence_real_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            if let Ok((mut socket, _)) = listener.accept() {
                let mut buf = [0u8; 256];
                // Drain the initial GetProperties, then just sit idle.
                let _ = socket.read(&mut buf);
                thread::sleep(Duration::from_millis(200));
            }
        });

        let store = Arc::new(Mutex::new(Store::default()));
        let mut conn = BlockingConnection::new("127.0.0.1", addr.port(), store);

        let started = std::time::Instant::now();
        conn.start().unwrap();
        conn.stop();
        conn.start().unwrap();
        conn.stop();
        assert!(started.elapsed() < 4 * SYNCHRONIZATION_TIMEOUT);
        assert_eq!(conn.status(), ConnectionStatus::Stopped);

        let _ = server.join();
    }

    #[test]
    fn test_outbound_loop_exits_when_sender_dropped() {
        let mut mock = MockWriteTransport::new();
        mock.expect_write_chunk().returning(|_| Ok(()));
        mock.expect_shutdown().returning(|| Ok(()));

        let (tx, rx) = mpsc::channel::<Update>();
        drop(tx);
        let store = Arc::new(Mutex::new(Store::default()));
        let status = Arc::new(SharedStatus::new());

        outbound_loop(Box::new(mock), rx, store, status);
    }
}
