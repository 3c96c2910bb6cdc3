//! Load-readiness notification with an explicit deadline

use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use crate::errors::ActionError;

/// Default upper bound on waiting for a document to finish loading.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Loading,
    Complete,
}

/// Suspend-until-signalled replacement for polling `document.readyState`.
///
/// The producer side (a browser event listener) flips the state; any number
/// of waiters suspend on it with their own deadline.
#[derive(Debug, Clone)]
pub struct ReadinessSignal {
    tx: watch::Sender<LoadState>,
}

impl Default for ReadinessSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(LoadState::Loading);
        Self { tx }
    }

    pub fn state(&self) -> LoadState {
        *self.tx.borrow()
    }

    pub fn mark_loading(&self) {
        self.tx.send_replace(LoadState::Loading);
    }

    pub fn mark_complete(&self) {
        self.tx.send_replace(LoadState::Complete);
    }

    /// Resolve once the document is complete, or fail with `NavTimeout` at the deadline.
    pub async fn wait_complete(&self, timeout: Duration) -> Result<(), ActionError> {
        let mut rx = self.tx.subscribe();
        let waited = tokio::time::timeout(
            timeout,
            rx.wait_for(|state| *state == LoadState::Complete),
        )
        .await
        .map(|result| result.map(|_| ()));
        match waited {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(ActionError::Interrupted(
                "readiness signal dropped".to_string(),
            )),
            Err(_) => {
                debug!(timeout_ms = timeout.as_millis() as u64, "load wait deadline reached");
                Err(ActionError::NavTimeout(format!(
                    "document not complete after {}ms",
                    timeout.as_millis()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn already_complete_resolves_immediately() {
        let signal = ReadinessSignal::new();
        signal.mark_complete();
        assert_ok!(signal.wait_complete(Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn waiter_wakes_on_completion() {
        let signal = ReadinessSignal::new();
        let producer = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            producer.mark_complete();
        });
        assert_ok!(signal.wait_complete(Duration::from_secs(2)).await);
        assert_eq!(signal.state(), LoadState::Complete);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_yields_nav_timeout() {
        let signal = ReadinessSignal::new();
        let err = signal
            .wait_complete(Duration::from_millis(250))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::NavTimeout(_)));
    }
}
