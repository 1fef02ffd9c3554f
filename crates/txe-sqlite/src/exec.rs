//! Convenience entry points: apply a preset plus caller setters, then run
//! the retry loop.

use txe_core::doer::{Doer, Setter};
use txe_core::{run_with_retry, BoxError, Context, TxnError};

use crate::doer::{SqliteConn, SqliteDoer, SqliteOptions};

/// Run a read-write transaction under the retry loop. `extra` setters are
/// applied after the preset, so callers can override individual fields.
pub fn execute_rw<F>(
    ctx: &Context,
    conn: &SqliteConn,
    doer: &SqliteDoer,
    title: &str,
    extra: Vec<Setter<SqliteOptions>>,
    work: F,
) -> Result<(), TxnError>
where
    F: FnMut(&Context, &SqliteDoer) -> Result<(), BoxError>,
{
    let mut setters = SqliteDoer::read_write_setters(title);
    setters.extend(extra);
    doer.base().multi_set(setters);
    run_with_retry(ctx, conn, doer, work)
}

/// Run a read-only transaction under the retry loop.
pub fn execute_ro<F>(
    ctx: &Context,
    conn: &SqliteConn,
    doer: &SqliteDoer,
    title: &str,
    extra: Vec<Setter<SqliteOptions>>,
    work: F,
) -> Result<(), TxnError>
where
    F: FnMut(&Context, &SqliteDoer) -> Result<(), BoxError>,
{
    let mut setters = SqliteDoer::read_only_setters(title);
    setters.extend(extra);
    doer.base().multi_set(setters);
    run_with_retry(ctx, conn, doer, work)
}
