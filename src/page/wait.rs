use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{DvDebugError, Result};

/// Poll an async probe until it yields a value or the deadline passes.
///
/// The probe runs once immediately, then every `interval` until `timeout`
/// elapses, at which point the wait fails with `DependencyTimeout(label)`.
/// Probe errors (a broken bridge, a closed tab) abort the wait early.
pub async fn poll_until<T, F, Fut>(
    label: &str,
    timeout: Duration,
    interval: Duration,
    mut probe: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let deadline = Instant::now() + timeout;

    loop {
        if let Some(value) = probe().await? {
            return Ok(value);
        }

        if Instant::now() + interval > deadline {
            return Err(DvDebugError::DependencyTimeout(label.to_string()));
        }

        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn returns_value_once_probe_succeeds() {
        let calls = AtomicU32::new(0);

        let calls_ref = &calls;
        let result = poll_until(
            "test value",
            Duration::from_millis(500),
            Duration::from_millis(5),
            move || async move {
                let n = calls_ref.fetch_add(1, Ordering::SeqCst);
                Ok(if n >= 3 { Some(n) } else { None })
            },
        )
        .await;

        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn times_out_with_label() {
        let result: Result<()> = poll_until(
            "debug component",
            Duration::from_millis(30),
            Duration::from_millis(5),
            || async { Ok(None) },
        )
        .await;

        match result {
            Err(DvDebugError::DependencyTimeout(label)) => {
                assert_eq!(label, "debug component");
            }
            other => panic!("expected DependencyTimeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn probe_errors_abort_the_wait() {
        let result: Result<()> = poll_until(
            "anything",
            Duration::from_millis(100),
            Duration::from_millis(5),
            || async { Err(DvDebugError::ExecutionFailed("tab closed".to_string())) },
        )
        .await;

        assert!(matches!(result, Err(DvDebugError::ExecutionFailed(_))));
    }
}
