use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::session::Session;

/// Owns the lifetime of one in-flight generation session.
///
/// The driver task and [`abort`](Self::abort) both mutate the session
/// through the shared `watch` sender, so the rendering boundary always
/// observes a consistent aggregate and cancellation lands without waiting
/// for the transport to wind down.
pub struct GenerationHandle {
    session_tx: Arc<watch::Sender<Session>>,
    session_rx: watch::Receiver<Session>,
    token: CancellationToken,
    driver: JoinHandle<()>,
}

impl GenerationHandle {
    pub(crate) fn new(
        session_tx: Arc<watch::Sender<Session>>,
        token: CancellationToken,
        driver: JoinHandle<()>,
    ) -> Self {
        let session_rx = session_tx.subscribe();
        Self {
            session_tx,
            session_rx,
            token,
            driver,
        }
    }

    /// Stop the transport and park the session in `Cancelled` immediately.
    ///
    /// The session transition happens synchronously here, not when the
    /// transport acknowledges: once this returns, events still draining
    /// from buffered chunks can no longer mutate the session. Calling it
    /// again, or on an already-terminal session, is a no-op.
    ///
    /// The session must be parked before the token fires: the driver reacts
    /// to the token by winding down, and it must find the session already
    /// terminal rather than conclude the stream died mid-run.
    pub fn abort(&self) {
        self.session_tx.send_modify(|session| session.cancel());
        self.token.cancel();
    }

    /// Live aggregate for the rendering boundary.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session_rx.clone()
    }

    /// Snapshot of the session as it stands right now.
    pub fn snapshot(&self) -> Session {
        self.session_rx.borrow().clone()
    }

    pub fn is_finished(&self) -> bool {
        self.session_rx.borrow().status().is_terminal()
    }

    /// Wait for the driver to stop and return the final, immutable session.
    pub async fn finished(self) -> Session {
        if let Err(e) = self.driver.await {
            error!("generation driver task failed: {e}");
        }
        self.session_rx.borrow().clone()
    }
}
