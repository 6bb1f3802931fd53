//! Operation lifecycle events
//!
//! Every encrypt or decrypt call reports when it starts, and whether it
//! succeeded or failed, to an [`EventSink`] owned by the
//! [`CipherService`](crate::cipher::CipherService). The default sink forwards
//! to the `log` facade; tests can inject a [`MemorySink`] or a closure.

use crate::cipher::Scheme;
use crate::error::ErrorKind;
use std::fmt;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Encrypt => f.write_str("encryption"),
            Direction::Decrypt => f.write_str("decryption"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CipherEvent {
    Started {
        direction: Direction,
        scheme: Scheme,
        input_len: usize,
    },
    Succeeded {
        direction: Direction,
        scheme: Scheme,
        output_len: usize,
    },
    Failed {
        direction: Direction,
        scheme: Scheme,
        kind: ErrorKind,
        message: String,
    },
}

/// Receives lifecycle events. Sinks are shared across threads by the
/// service, so implementations must be `Send + Sync`.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &CipherEvent);
}

impl<F> EventSink for F
where
    F: Fn(&CipherEvent) + Send + Sync,
{
    fn emit(&self, event: &CipherEvent) {
        self(event)
    }
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &CipherEvent) {
        match event {
            CipherEvent::Started {
                direction,
                scheme,
                input_len,
            } => log::info!("starting {} ({}), data length: {}", direction, scheme, input_len),
            CipherEvent::Succeeded {
                direction,
                scheme,
                output_len,
            } => log::info!(
                "{} successful ({}), output length: {}",
                direction,
                scheme,
                output_len
            ),
            CipherEvent::Failed {
                kind: ErrorKind::InvalidPassphrase,
                message,
                ..
            } => log::warn!("{}", message),
            CipherEvent::Failed {
                direction,
                scheme,
                message,
                ..
            } => log::error!("error during {} ({}): {}", direction, scheme, message),
        }
    }
}

/// Discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &CipherEvent) {}
}

/// Records events in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<CipherEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<CipherEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &CipherEvent) {
        let mut events = match self.events.lock() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push(event.clone());
    }
}
