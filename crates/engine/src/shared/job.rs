use std::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A spawned background job that stops when told to or when the handle is dropped.
///
/// Stopping only prevents new work: the job is expected to check the token
/// between units of work, so nothing is interrupted mid-way.
pub struct JobHandle {
    name: &'static str,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl JobHandle {
    pub fn spawn<F, Fut>(name: &'static str, job: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(job(cancel.clone()));
        debug!("Started {}", name);
        Self {
            name,
            cancel,
            handle: Some(handle),
        }
    }

    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            debug!("Stopping {}", self.name);
            self.cancel.cancel();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stops the job and waits for the work it was doing to complete
    pub async fn join(mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for JobHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
