//! Backend capability contracts.
//!
//! These two traits are the only backend-specific extension points: a begun
//! transaction must know how to commit, roll back and report whether it still
//! wraps a live driver object, and a connection must answer a connectivity
//! ping. Everything else the engine does is backend-agnostic.

use crate::context::Context;
use crate::error::BoxError;

/// One begun backend transaction, exclusively owned by a single attempt.
pub trait TxnHandle {
    /// Commit the transaction.
    fn commit(&mut self, ctx: &Context) -> Result<(), BoxError>;

    /// Roll the transaction back.
    fn rollback(&mut self, ctx: &Context) -> Result<(), BoxError>;

    /// True when no usable driver transaction is present, e.g. the wrapper
    /// was already consumed by a commit attempt. Kept explicit because some
    /// driver wrapper types carry a dead inner object rather than vanishing.
    fn is_nil(&self) -> bool;
}

/// Connectivity probe contract for a backend connection.
pub trait Pinger {
    /// Cheap round trip to the backend; `Ok` means the connection is healthy.
    fn ping(&self, ctx: &Context) -> Result<(), BoxError>;
}
