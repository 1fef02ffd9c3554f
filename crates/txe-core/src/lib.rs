//! Backend-agnostic transaction execution engine.
//!
//! One logical call runs begin, work, then commit-or-rollback with panic
//! containment ([`execute`]), optionally wrapped in a retry loop that probes
//! backend connectivity between attempts ([`run_with_retry`]). Backends plug
//! in by implementing [`Doer`] for their connection and handle types.

pub mod config;
pub mod logging;

pub mod context;
pub mod doer;
pub mod error;
pub mod exec;
pub mod retry;
pub mod txn;

pub use config::TxeConfig;
pub use context::Context;
pub use doer::{Doer, DoerBase, Setter, TxnFields};
pub use error::{BoxError, TxnError};
pub use exec::execute;
pub use retry::{probe, probe_with_policy, run_with_retry, BackoffPolicy};
pub use txn::{Pinger, TxnHandle};
