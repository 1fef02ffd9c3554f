//! Outer retry loop: drive single attempts, probe connectivity on failure,
//! stop once the backend is confirmed reachable but still erroring.

use std::time::Instant;

use tracing::{debug, error, info};

use super::ping::probe;
use crate::context::Context;
use crate::doer::Doer;
use crate::error::{BoxError, TxnError};
use crate::exec::execute;
use crate::txn::Pinger;

/// Repeatedly run [`execute`] until it succeeds, the retry ceiling is hit,
/// or a failure happens while the backend is confirmed reachable.
///
/// The first pass is retry 0; with `max_retry = N > 0` the loop runs at most
/// `N + 1` attempts. After each failure the connection is probed (bounded by
/// `max_ping`; 0 skips probing, leaving connectivity unverified so the loop
/// keeps retrying). A probe that succeeds on its first attempt means the
/// earlier failure was not connectivity-related: the error is surfaced as
/// durable instead of retried, except on the very first pass, which always
/// earns one retry. Each retry gets a fresh per-attempt timeout budget.
pub fn run_with_retry<D, F>(
    ctx: &Context,
    conn: &D::Conn,
    doer: &D,
    mut work: F,
) -> Result<(), TxnError>
where
    D: Doer,
    D::Conn: Pinger,
    F: FnMut(&Context, &D) -> Result<(), BoxError>,
{
    let title = doer.title();
    let max_retry = doer.max_retry();
    let max_ping = doer.max_ping();
    let started = Instant::now();
    debug!(title = %title, "transaction starting");
    let mut retries: u32 = 0;
    loop {
        match execute(ctx, conn, doer, &mut work) {
            Ok(()) => {
                info!(title = %title, retries, elapsed = ?started.elapsed(), "transaction committed");
                return Ok(());
            }
            Err(err) => {
                let (pings, verdict) = if max_ping == 0 {
                    // Probing disabled: connectivity stays unverified.
                    (0, Ok(()))
                } else {
                    let mut observer = |cnt: u32, delay: std::time::Duration| {
                        info!(title = %title, retries, pings = cnt, delay = ?delay, "ping");
                    };
                    probe(
                        max_ping,
                        Some(&mut observer),
                        Some(|c: &Context| conn.ping(c)),
                    )
                };
                let connected = max_ping > 0 && verdict.is_ok() && pings <= 1;
                if connected && retries > 0 {
                    error!(title = %title, retries, pings, "backend reachable, giving up: {err}");
                    return Err(err);
                }
                if retries >= max_retry && max_retry > 0 {
                    error!(title = %title, retries, pings, "retry limit hit, giving up: {err}");
                    return Err(err);
                }
                info!(title = %title, retries, pings, "retrying after failure: {err}");
                retries += 1;
            }
        }
    }
}
