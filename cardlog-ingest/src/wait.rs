//! Bounded polling for conditions the automation cannot trigger itself.

use anyhow::Result;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::CaptureError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSpec {
    pub timeout: Duration,
    pub interval: Duration,
}

impl PollSpec {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    pub fn from_secs(timeout_secs: u64, interval: Duration) -> Self {
        Self::new(Duration::from_secs(timeout_secs), interval)
    }
}

/// Run `probe` until it yields `Some`, sleeping `spec.interval` between attempts.
///
/// The probe always runs at least once. Errors from the probe abort the wait
/// immediately; running out of time yields [`CaptureError::Timeout`]. A timeout
/// too large to represent as an instant means no deadline.
pub async fn poll_until<T, F>(what: &str, spec: PollSpec, mut probe: F) -> Result<T>
where
    F: AsyncFnMut() -> Result<Option<T>>,
{
    let deadline = Instant::now().checked_add(spec.timeout);
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        if let Some(found) = probe().await? {
            log::debug!("{what}: ready after {attempts} attempt(s)");
            return Ok(found);
        }

        let now = Instant::now();
        let remaining = match deadline {
            Some(d) => d.saturating_duration_since(now),
            None => spec.interval,
        };
        if deadline.is_some() && remaining.is_zero() {
            return Err(CaptureError::Timeout {
                what: what.to_string(),
                after: spec.timeout,
            }
            .into());
        }

        log::debug!("{what}: not yet (attempt {attempts}), sleeping {:?}", spec.interval);
        tokio::time::sleep(spec.interval.min(remaining)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn fast(timeout_ms: u64) -> PollSpec {
        PollSpec::new(Duration::from_millis(timeout_ms), Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_returns_once_probe_succeeds() {
        let mut calls = 0;
        let v = poll_until("third call", fast(1_000), async || {
            calls += 1;
            Ok((calls == 3).then_some(calls))
        })
        .await
        .unwrap();
        assert_eq!(v, 3);
    }

    #[tokio::test]
    async fn test_times_out_with_distinguishable_error() {
        let err = poll_until::<(), _>("never", fast(30), async || Ok(None))
            .await
            .unwrap_err();

        let capture = err.downcast_ref::<CaptureError>().expect("CaptureError");
        assert!(capture.is_timeout());
        assert!(err.to_string().contains("never"));
    }

    #[tokio::test]
    async fn test_probe_error_aborts_without_waiting() {
        let started = Instant::now();
        let err = poll_until::<(), _>("broken", fast(10_000), async || Err(anyhow!("boom")))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_unrepresentable_timeout_waits_without_deadline() {
        let spec = PollSpec::from_secs(u64::MAX, Duration::from_millis(1));
        let v = poll_until("huge", spec, async || Ok(Some(1))).await.unwrap();
        assert_eq!(v, 1);

        let mut calls = 0;
        let v = poll_until("huge, later", spec, async || {
            calls += 1;
            Ok((calls == 4).then_some(calls))
        })
        .await
        .unwrap();
        assert_eq!(v, 4);
    }

    #[tokio::test]
    async fn test_zero_timeout_still_probes_once() {
        let mut calls = 0;
        let v = poll_until("immediate", fast(0), async || {
            calls += 1;
            Ok(Some(calls))
        })
        .await
        .unwrap();
        assert_eq!(v, 1);
    }
}
