//! Reconnect prober: repeat a ping under backoff until it succeeds or the
//! attempt limit is exhausted.

use std::backtrace::Backtrace;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use super::backoff::BackoffPolicy;
use crate::context::Context;
use crate::error::{BoxError, TxnError};
use crate::exec::panic_message;

/// Observer invoked with (attempt count, upcoming delay) before each sleep.
pub type OnAttempt<'a> = &'a mut dyn FnMut(u32, Duration);

/// Probe with the default backoff policy (1 s unit, 64 s cap, 2 s ping
/// deadline). Returns the number of attempts made alongside the outcome.
pub fn probe<P>(
    limit: u32,
    on_attempt: Option<OnAttempt<'_>>,
    ping: Option<P>,
) -> (u32, Result<(), TxnError>)
where
    P: FnMut(&Context) -> Result<(), BoxError>,
{
    probe_with_policy(&BackoffPolicy::default(), limit, on_attempt, ping)
}

/// Probe with an explicit policy. A `limit` of zero is normalized to 3.
///
/// Each attempt runs the ping under a fresh sub-deadline; a missing ping
/// function or a panic inside it counts as a failed attempt like any other,
/// so both still respect the limit. A panic in the attempt observer is
/// likewise recovered, ending the probe with an error instead of a crash.
/// Exceeding the limit yields a
/// "reached retry limit" error wrapping the last ping failure; a late
/// success on the attempt right past the limit still counts as success.
pub fn probe_with_policy<P>(
    policy: &BackoffPolicy,
    limit: u32,
    mut on_attempt: Option<OnAttempt<'_>>,
    mut ping: Option<P>,
) -> (u32, Result<(), TxnError>)
where
    P: FnMut(&Context) -> Result<(), BoxError>,
{
    let limit = if limit == 0 { 3 } else { limit };
    let mut cnt = 0u32;
    loop {
        let err: Option<BoxError> = match ping.as_mut() {
            Some(ping) => {
                let ctx = Context::background().with_timeout(policy.ping_timeout);
                match catch_unwind(AssertUnwindSafe(|| ping(&ctx))) {
                    Ok(Ok(())) => None,
                    Ok(Err(e)) => Some(e),
                    Err(payload) => Some(Box::new(TxnError::Recovered {
                        panic: panic_message(&*payload),
                        backtrace: Backtrace::force_capture(),
                        rollback: None,
                    })),
                }
            }
            None => Some(Box::new(TxnError::NilPingFn)),
        };
        cnt += 1;
        if cnt > limit {
            let result = match err {
                Some(source) => Err(TxnError::RetryLimit { limit, source }),
                None => Ok(()),
            };
            return (cnt, result);
        }
        let delay = policy.delay_for(cnt);
        if let Some(cb) = on_attempt.as_mut() {
            // The observer is caller code too; a panic in it must not
            // escape the prober.
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| cb(cnt, delay))) {
                let err = TxnError::Recovered {
                    panic: panic_message(&*payload),
                    backtrace: Backtrace::force_capture(),
                    rollback: None,
                };
                return (cnt, Err(err));
            }
        }
        match err {
            None => return (cnt, Ok(())),
            Some(_) => std::thread::sleep(policy.jittered(delay)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> BackoffPolicy {
        BackoffPolicy {
            unit: Duration::from_millis(1),
            max_delay: Duration::from_millis(8),
            ping_timeout: Duration::from_secs(2),
        }
    }

    type PingFn = fn(&Context) -> Result<(), BoxError>;

    #[test]
    fn succeeds_on_first_attempt() {
        let (cnt, result) = probe_with_policy(&fast(), 5, None, Some(|_: &Context| Ok(())));
        assert_eq!(cnt, 1);
        assert!(result.is_ok());
    }

    #[test]
    fn succeeds_on_second_attempt() {
        let mut calls = 0;
        let ping = |_: &Context| {
            calls += 1;
            if calls == 2 {
                Ok(())
            } else {
                Err("failed".into())
            }
        };
        let (cnt, result) = probe_with_policy(&fast(), 2, None, Some(ping));
        assert_eq!(cnt, 2);
        assert!(result.is_ok());
    }

    #[test]
    fn reaches_retry_limit() {
        let ping = |_: &Context| -> Result<(), BoxError> { Err("failed".into()) };
        let (cnt, result) = probe_with_policy(&fast(), 2, None, Some(ping));
        assert_eq!(cnt, 3);
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "reached retry limit (2), last error: failed");
    }

    #[test]
    fn missing_ping_function_consumes_attempts() {
        let (cnt, result) = probe_with_policy(&fast(), 2, None, None::<PingFn>);
        assert_eq!(cnt, 3);
        let err = result.unwrap_err();
        assert_eq!(
            err.to_string(),
            "reached retry limit (2), last error: ping function is nil"
        );
    }

    #[test]
    fn zero_limit_is_normalized_to_three() {
        let ping = |_: &Context| -> Result<(), BoxError> { Err("failed".into()) };
        let (cnt, result) = probe_with_policy(&fast(), 0, None, Some(ping));
        assert_eq!(cnt, 4);
        assert!(result.unwrap_err().to_string().contains("retry limit (3)"));
    }

    #[test]
    fn panicking_ping_becomes_an_error() {
        let ping = |_: &Context| -> Result<(), BoxError> { panic!("ping exploded") };
        let (cnt, result) = probe_with_policy(&fast(), 1, None, Some(ping));
        assert_eq!(cnt, 2);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("ping exploded"));
    }

    #[test]
    fn panicking_observer_is_contained() {
        let mut observer = |_: u32, _: Duration| panic!("observer exploded");
        let ping = |_: &Context| -> Result<(), BoxError> { Err("failed".into()) };
        let (cnt, result) = probe_with_policy(&fast(), 2, Some(&mut observer), Some(ping));
        assert_eq!(cnt, 1);
        let err = result.unwrap_err();
        assert!(matches!(err, TxnError::Recovered { .. }));
        assert!(err.to_string().contains("observer exploded"));
    }

    #[test]
    fn reports_attempts_and_delays() {
        let mut seen = Vec::new();
        let mut observer = |cnt: u32, delay: Duration| seen.push((cnt, delay));
        let ping = |_: &Context| -> Result<(), BoxError> { Err("failed".into()) };
        let policy = fast();
        let (_, result) = probe_with_policy(&policy, 2, Some(&mut observer), Some(ping));
        assert!(result.is_err());
        assert_eq!(
            seen,
            vec![
                (1, Duration::from_millis(1)),
                (2, Duration::from_millis(4)),
            ]
        );
    }

    #[test]
    fn ping_receives_a_sub_deadline() {
        let ping = |ctx: &Context| -> Result<(), BoxError> {
            assert!(ctx.deadline().is_some());
            assert!(ctx.remaining().unwrap() <= Duration::from_secs(2));
            Ok(())
        };
        let (cnt, result) = probe_with_policy(&fast(), 1, None, Some(ping));
        assert_eq!(cnt, 1);
        assert!(result.is_ok());
    }
}
