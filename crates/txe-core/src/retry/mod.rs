//! Reconnect probing and the outer retry loop.
//!
//! The prober is a standalone retry-with-backoff primitive (quadratic delay
//! with a cap and ±5% jitter, fresh 2-second sub-deadline per ping). The
//! retry loop composes it with the orchestrator: keep retrying through what
//! looks like transient connectivity loss, stop promptly once the backend is
//! confirmed reachable but still erroring.

mod backoff;
mod ping;
mod run;

pub use backoff::BackoffPolicy;
pub use ping::{probe, probe_with_policy, OnAttempt};
pub use run::run_with_retry;
