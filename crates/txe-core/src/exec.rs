//! Execution orchestrator: one attempt of begin, work, commit-or-rollback.
//!
//! Panics raised by the work unit (or by the backend during commit/rollback)
//! are intercepted at the attempt boundary and converted into errors with a
//! captured backtrace, unless the caller explicitly opted into rethrow.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::time::Duration;

use crate::context::Context;
use crate::doer::Doer;
use crate::error::{BoxError, TxnError};
use crate::txn::TxnHandle;

/// Timeouts at or below this threshold leave the attempt unbounded.
const TIMEOUT_MIN: Duration = Duration::from_millis(1);

/// Run exactly one transaction attempt: begin, invoke the work unit, then
/// commit or roll back.
///
/// The work unit must not commit or roll back itself; the handle stays owned
/// by the orchestrator. Rollback failures are merged into the returned error
/// rather than discarded.
pub fn execute<D, F>(ctx: &Context, conn: &D::Conn, doer: &D, work: F) -> Result<(), TxnError>
where
    D: Doer,
    F: FnOnce(&Context, &D) -> Result<(), BoxError>,
{
    // Never begin a transaction against a dead context.
    if ctx.is_done() {
        return Err(TxnError::ContextDone);
    }
    let timeout = doer.timeout();
    let ctx = if timeout > TIMEOUT_MIN {
        ctx.with_timeout(timeout)
    } else {
        ctx.clone()
    };
    let mut tx = doer.begin_txn(&ctx, conn).map_err(TxnError::Begin)?;
    let attempt = catch_unwind(AssertUnwindSafe(|| run_attempt(&ctx, &mut tx, doer, work)));
    match attempt {
        Ok(outcome) => outcome,
        Err(payload) => {
            if doer.rethrow_panic() {
                // Explicit escape hatch: no cleanup, the caller wants a crash.
                resume_unwind(payload);
            }
            let panic = panic_message(&*payload);
            let backtrace = Backtrace::force_capture();
            let rollback = if tx.is_nil() {
                None
            } else {
                tx.rollback(&ctx).err()
            };
            Err(TxnError::Recovered {
                panic,
                backtrace,
                rollback,
            })
        }
    }
}

fn run_attempt<D, F>(
    ctx: &Context,
    tx: &mut impl TxnHandle,
    doer: &D,
    work: F,
) -> Result<(), TxnError>
where
    D: Doer,
    F: FnOnce(&Context, &D) -> Result<(), BoxError>,
{
    if let Err(source) = work(ctx, doer) {
        let rollback = tx.rollback(ctx).err();
        return Err(TxnError::Do { source, rollback });
    }
    if let Err(source) = tx.commit(ctx) {
        let rollback = tx.rollback(ctx).err();
        return Err(TxnError::Commit { source, rollback });
    }
    Ok(())
}

/// Best-effort rendering of a panic payload for the error message.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
