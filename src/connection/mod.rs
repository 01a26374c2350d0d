//! The connection engine: the two concurrent loops (inbound parse-and-apply,
//! outbound serialize-and-send) that drive an INDI TCP stream, in the two
//! concurrency models spec §5 requires.
//!
//! [`blocking`] is component F (spec §4.F): two `std::thread` workers
//! sharing a cloned `TcpStream`, bounded-latency shutdown via a receive
//! timeout on every blocking call. [`cooperative`] is component G (spec
//! §4.G): the same contract as two `tokio` tasks, with automatic
//! reconnection. Both drive the same [`crate::parser::XmlStreamParser`],
//! [`crate::store::Store`], and [`crate::serializer::serialize`] — only the
//! I/O driver differs, per the design note in spec §9 ("prefer a single
//! implementation parameterized by an I/O driver").

pub mod blocking;
pub mod cooperative;

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

/// Bytes read per inbound `recv`/`read` call (spec §4.F).
pub const CHUNK_MAX_READ_SIZE: usize = 1024;

/// Receive deadline used by the blocking variant's two workers so `stop()`
/// latency is bounded (spec §4.F).
pub const SYNCHRONIZATION_TIMEOUT: Duration = Duration::from_secs(1);

/// Receive deadline used by the cooperative variant's inbound task (spec
/// §4.G); longer than [`SYNCHRONIZATION_TIMEOUT`] since cancellation there
/// is structured rather than poll-based.
pub const SOCKET_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// How long the cooperative variant sleeps between a dropped connection and
/// a reconnection attempt, when `reconnect_automatically` is set (spec §4.G).
pub const RECONNECTION_DELAY: Duration = Duration::from_secs(2);

/// The connection state machine shared by both engine variants (spec §4.F):
/// `Starting` → `Connected` → `Stopped`, with `Reconnecting` only ever
/// entered by the cooperative variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionStatus {
    /// Not yet connected; the initial state before `start()`/`run()`.
    Starting = 0,
    /// Socket open, both workers running.
    Connected = 1,
    /// Lost the connection and, per `reconnect_automatically`, sleeping
    /// before a retry (cooperative variant only).
    Reconnecting = 2,
    /// `stop()` was called (or the engine gave up); both workers have
    /// exited or are exiting.
    Stopped = 3,
}

impl From<u8> for ConnectionStatus {
    fn from(value: u8) -> Self {
        match value {
            0 => ConnectionStatus::Starting,
            1 => ConnectionStatus::Connected,
            2 => ConnectionStatus::Reconnecting,
            _ => ConnectionStatus::Stopped,
        }
    }
}

/// An atomically-shared [`ConnectionStatus`], cheap to poll from either
/// worker loop without taking the store's mutex.
#[derive(Debug)]
pub struct SharedStatus(AtomicU8);

impl SharedStatus {
    /// Create a new shared status cell, initialized to `Starting`.
    pub fn new() -> Self {
        Self(AtomicU8::new(ConnectionStatus::Starting as u8))
    }

    /// Read the current status.
    pub fn get(&self) -> ConnectionStatus {
        ConnectionStatus::from(self.0.load(Ordering::SeqCst))
    }

    /// Store a new status.
    pub fn set(&self, status: ConnectionStatus) {
        self.0.store(status as u8, Ordering::SeqCst);
    }

    /// True once `stop()` has been requested.
    pub fn is_stopped(&self) -> bool {
        self.get() == ConnectionStatus::Stopped
    }
}

impl Default for SharedStatus {
    fn default() -> Self {
        Self::new()
    }
}
