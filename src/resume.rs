use std::time::Duration;
use tokio::sync::watch;

use crate::error::HarnessError;

/// Out-of-band trigger that resolves a pending [`ResumeSignal`].
pub struct ResumeHandle {
    tx: watch::Sender<bool>,
}

impl ResumeHandle {
    pub fn resume(&self) {
        let _ = self.tx.send(true);
    }
}

/// Suspension point for interactive login: capture blocks on `wait` until a
/// human signals completion, bounded by a fixed ceiling. Dropping the handle
/// without resuming leaves the signal pending until the ceiling fires.
pub struct ResumeSignal {
    rx: watch::Receiver<bool>,
}

impl ResumeSignal {
    pub fn pair() -> (ResumeHandle, ResumeSignal) {
        let (tx, rx) = watch::channel(false);
        (ResumeHandle { tx }, ResumeSignal { rx })
    }

    /// Resolves when the operator presses Enter on stdin.
    pub fn from_stdin() -> ResumeSignal {
        let (handle, signal) = Self::pair();
        tokio::task::spawn_blocking(move || {
            let mut line = String::new();
            let _ = std::io::stdin().read_line(&mut line);
            handle.resume();
        });
        signal
    }

    pub async fn wait(mut self, ceiling: Duration) -> Result<(), HarnessError> {
        let resumed = async {
            loop {
                if *self.rx.borrow() {
                    return;
                }
                if self.rx.changed().await.is_err() {
                    // Handle dropped without resuming; only the ceiling
                    // can end the suspension now.
                    std::future::pending::<()>().await;
                }
            }
        };

        tokio::time::timeout(ceiling, resumed)
            .await
            .map_err(|_| HarnessError::LoginTimeout(ceiling.as_secs()))
    }
}
