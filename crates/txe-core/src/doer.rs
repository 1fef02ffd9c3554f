//! Configuration set and the doer contract each backend adapter implements.
//!
//! A doer bundles the execution parameters for one logical transaction call
//! (title, timeout, retry/ping bounds, an opaque backend options payload)
//! with the begin capability against its connection type. Mutation goes
//! through ordered field setters applied under an exclusive lock; the design
//! assumes mutation happens once per call, before the retry loop starts.

use std::sync::Mutex;
use std::time::Duration;

use crate::context::Context;
use crate::error::{BoxError, TxnError};
use crate::txn::TxnHandle;

pub const DEFAULT_TITLE: &str = "Txn`Nameless";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_PING: u32 = 4;
pub const DEFAULT_MAX_RETRY: u32 = 4;

/// Execution parameters for one logical transaction call.
#[derive(Debug, Clone)]
pub struct TxnFields<O> {
    /// Human-readable tag carried on every log line for this call.
    pub title: String,
    /// Propagate work-unit panics instead of converting them to errors.
    pub rethrow_panic: bool,
    /// Per-attempt deadline; values of 1 ms or less disable it.
    pub timeout: Duration,
    /// Attempt bound for the reconnect probe; 0 disables probing.
    pub max_ping: u32,
    /// Retry bound for the outer loop; 0 retries without a ceiling.
    pub max_retry: u32,
    /// Backend-specific payload, opaque to the engine. Must be present
    /// before an attempt begins; the backend cannot interpret its absence.
    pub options: Option<O>,
}

impl<O> Default for TxnFields<O> {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            rethrow_panic: false,
            timeout: DEFAULT_TIMEOUT,
            max_ping: DEFAULT_MAX_PING,
            max_retry: DEFAULT_MAX_RETRY,
            options: None,
        }
    }
}

impl<O> TxnFields<O> {
    /// Defaults with the given setters applied in order.
    pub fn new(setters: impl IntoIterator<Item = Setter<O>>) -> Self {
        let mut fields = Self::default();
        for setter in setters {
            setter(&mut fields);
        }
        fields
    }
}

/// Ordered field mutator applied under the configuration lock.
pub type Setter<O> = Box<dyn FnOnce(&mut TxnFields<O>) + Send>;

pub fn with_title<O>(value: impl Into<String>) -> Setter<O> {
    let value = value.into();
    Box::new(move |fields| fields.title = value)
}

pub fn with_rethrow_panic<O>(value: bool) -> Setter<O> {
    Box::new(move |fields| fields.rethrow_panic = value)
}

pub fn with_timeout<O>(value: Duration) -> Setter<O> {
    Box::new(move |fields| fields.timeout = value)
}

pub fn with_max_ping<O>(value: u32) -> Setter<O> {
    Box::new(move |fields| fields.max_ping = value)
}

pub fn with_max_retry<O>(value: u32) -> Setter<O> {
    Box::new(move |fields| fields.max_retry = value)
}

pub fn with_options<O: Send + 'static>(value: O) -> Setter<O> {
    Box::new(move |fields| fields.options = Some(value))
}

/// Lock-protected configuration bag shared by every doer implementation.
///
/// May be shared across logical calls on the same instance, so every
/// mutation is serialized behind the lock. Reads take the same lock; it is
/// uncontended by construction since mutation happens between calls, never
/// concurrently with an in-flight attempt of the same call.
#[derive(Debug)]
pub struct DoerBase<O> {
    fields: Mutex<TxnFields<O>>,
}

impl<O> Default for DoerBase<O> {
    fn default() -> Self {
        Self {
            fields: Mutex::new(TxnFields::default()),
        }
    }
}

impl<O: Clone> DoerBase<O> {
    pub fn new(setters: impl IntoIterator<Item = Setter<O>>) -> Self {
        Self {
            fields: Mutex::new(TxnFields::new(setters)),
        }
    }

    /// Apply each setter in order under the exclusive lock. An empty setter
    /// list leaves the fields unchanged.
    pub fn multi_set(&self, setters: impl IntoIterator<Item = Setter<O>>) {
        let mut fields = self.fields.lock().unwrap();
        for setter in setters {
            setter(&mut fields);
        }
    }

    /// Replace the whole set atomically. Rejects a missing options payload.
    pub fn reset(&self, fields: TxnFields<O>) -> Result<(), TxnError> {
        if fields.options.is_none() {
            return Err(TxnError::InvalidConfig("options payload is required"));
        }
        *self.fields.lock().unwrap() = fields;
        Ok(())
    }

    pub fn title(&self) -> String {
        self.fields.lock().unwrap().title.clone()
    }

    pub fn rethrow_panic(&self) -> bool {
        self.fields.lock().unwrap().rethrow_panic
    }

    pub fn timeout(&self) -> Duration {
        self.fields.lock().unwrap().timeout
    }

    pub fn max_ping(&self) -> u32 {
        self.fields.lock().unwrap().max_ping
    }

    pub fn max_retry(&self) -> u32 {
        self.fields.lock().unwrap().max_retry
    }

    pub fn options(&self) -> Option<O> {
        self.fields.lock().unwrap().options.clone()
    }
}

/// Contract a backend doer satisfies: configuration access plus the begin
/// capability against its connection type.
///
/// The transaction handle may borrow the connection for its lifetime, hence
/// the generic associated type.
pub trait Doer {
    type Options: Clone + Send + 'static;
    type Conn;
    type Txn<'c>: TxnHandle
    where
        Self::Conn: 'c;

    fn base(&self) -> &DoerBase<Self::Options>;

    /// Begin one backend transaction against the given connection.
    fn begin_txn<'c>(
        &self,
        ctx: &Context,
        conn: &'c Self::Conn,
    ) -> Result<Self::Txn<'c>, BoxError>;

    fn title(&self) -> String {
        self.base().title()
    }

    fn rethrow_panic(&self) -> bool {
        self.base().rethrow_panic()
    }

    fn timeout(&self) -> Duration {
        self.base().timeout()
    }

    fn max_ping(&self) -> u32 {
        self.base().max_ping()
    }

    fn max_retry(&self) -> u32 {
        self.base().max_retry()
    }

    fn options(&self) -> Option<Self::Options> {
        self.base().options()
    }
}
