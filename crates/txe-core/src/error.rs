//! Engine error taxonomy: phase-tagged failures with merged rollback evidence.

use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;

/// Boundary error type for backend and work-unit failures.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Error returned by the execution orchestrator and the retry loop.
///
/// Each variant tags the phase that failed. When a rollback was attempted and
/// itself failed, the rollback error rides along in the variant so operators
/// can tell "rolled back cleanly after a business error" from "rollback
/// failed, data state uncertain".
#[derive(Debug)]
pub enum TxnError {
    /// The ambient context was already cancelled or past its deadline.
    ContextDone,
    /// Backend begin failed; no handle exists, nothing was rolled back.
    Begin(BoxError),
    /// The work unit returned an error.
    Do {
        source: BoxError,
        rollback: Option<BoxError>,
    },
    /// Commit failed.
    Commit {
        source: BoxError,
        rollback: Option<BoxError>,
    },
    /// A panic was intercepted at the attempt boundary.
    Recovered {
        panic: String,
        backtrace: Backtrace,
        rollback: Option<BoxError>,
    },
    /// The prober was handed no ping function.
    NilPingFn,
    /// The prober exhausted its attempt limit; wraps the last ping error.
    RetryLimit { limit: u32, source: BoxError },
    /// Configuration replacement rejected, e.g. a missing options payload.
    InvalidConfig(&'static str),
}

impl TxnError {
    /// Rollback failure that accompanied this error, if any.
    pub fn rollback_error(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TxnError::Do { rollback, .. }
            | TxnError::Commit { rollback, .. }
            | TxnError::Recovered { rollback, .. } => {
                rollback.as_deref().map(|e| e as &(dyn Error + 'static))
            }
            _ => None,
        }
    }
}

fn write_rollback(f: &mut fmt::Formatter<'_>, rollback: &Option<BoxError>) -> fmt::Result {
    match rollback {
        Some(e) => write!(f, "; rollback: {e}"),
        None => Ok(()),
    }
}

impl fmt::Display for TxnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxnError::ContextDone => write!(f, "context done"),
            TxnError::Begin(e) => write!(f, "begin: {e}"),
            TxnError::Do { source, rollback } => {
                write!(f, "do: {source}")?;
                write_rollback(f, rollback)
            }
            TxnError::Commit { source, rollback } => {
                write!(f, "commit: {source}")?;
                write_rollback(f, rollback)
            }
            TxnError::Recovered {
                panic,
                backtrace,
                rollback,
            } => {
                write!(f, "panic recovered: {panic}")?;
                write_rollback(f, rollback)?;
                write!(f, "\nstack backtrace:\n{backtrace}")
            }
            TxnError::NilPingFn => write!(f, "ping function is nil"),
            TxnError::RetryLimit { limit, source } => {
                write!(f, "reached retry limit ({limit}), last error: {source}")
            }
            TxnError::InvalidConfig(what) => write!(f, "invalid configuration: {what}"),
        }
    }
}

impl Error for TxnError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TxnError::Begin(e) => Some(&**e),
            TxnError::Do { source, .. }
            | TxnError::Commit { source, .. }
            | TxnError::RetryLimit { source, .. } => Some(&**source),
            _ => None,
        }
    }
}
