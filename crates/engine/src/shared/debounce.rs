use std::{future::pending, pin::Pin, time::Duration};
use tokio::time::{sleep_until, Instant, Sleep};

/// A single pending timer. Arming it again pushes the deadline back instead of
/// adding a second timer, so a burst of changes ends in one firing.
#[derive(Debug, Default)]
pub struct DebounceSlot {
    sleep: Option<Pin<Box<Sleep>>>,
}

impl DebounceSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, delay: Duration) {
        let deadline = Instant::now() + delay;
        match &mut self.sleep {
            Some(sleep) => sleep.as_mut().reset(deadline),
            None => self.sleep = Some(Box::pin(sleep_until(deadline))),
        }
    }

    pub fn cancel(&mut self) {
        self.sleep = None;
    }

    pub fn is_armed(&self) -> bool {
        self.sleep.is_some()
    }

    /// Completes when the armed deadline passes and disarms the slot. Never
    /// completes while the slot is not armed.
    pub async fn fired(&mut self) {
        match &mut self.sleep {
            Some(sleep) => {
                sleep.as_mut().await;
                self.sleep = None;
            }
            None => pending::<()>().await,
        }
    }
}
