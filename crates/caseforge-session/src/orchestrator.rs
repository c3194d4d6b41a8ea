use std::sync::Arc;

use caseforge_stream::{GenerateRequest, StreamingGenerator};
use futures::StreamExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::handle::GenerationHandle;
use crate::session::Session;

/// One logical generation slot: at most one active session at a time.
///
/// Starting a new generation first aborts the previous one, so two state
/// machines can never race to feed the same rendering surface, and every
/// run gets a fresh session and stream state; nothing carries over.
#[derive(Default)]
pub struct GenerationSlot {
    active: Option<(Arc<watch::Sender<Session>>, CancellationToken)>,
}

impl GenerationSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a generation run against `source`, returning its handle.
    pub fn start<G>(&mut self, source: Arc<G>, request: GenerateRequest) -> GenerationHandle
    where
        G: StreamingGenerator + 'static,
    {
        self.abort();

        let (session_tx, _) = watch::channel(Session::new());
        let session_tx = Arc::new(session_tx);
        let token = CancellationToken::new();

        let driver = tokio::spawn(drive(
            source,
            request,
            Arc::clone(&session_tx),
            token.clone(),
        ));

        self.active = Some((Arc::clone(&session_tx), token.clone()));
        GenerationHandle::new(session_tx, token, driver)
    }

    /// Cancel whatever is currently running in this slot, if anything.
    ///
    /// Session first, token second: the driver's reaction to the token must
    /// observe an already-cancelled session (see `GenerationHandle::abort`).
    pub fn abort(&mut self) {
        if let Some((session_tx, token)) = self.active.take() {
            session_tx.send_modify(|session| session.cancel());
            token.cancel();
        }
    }
}

/// Drive one session from stream open to terminal state.
///
/// Transitions happen strictly sequentially in this task, in the exact
/// order frames completed on the wire. Cancellation is cooperative: the
/// token is checked before each event is processed, and a cancelled token
/// drops the stream, which tears the transport down.
async fn drive<G>(
    source: Arc<G>,
    request: GenerateRequest,
    session_tx: Arc<watch::Sender<Session>>,
    token: CancellationToken,
) where
    G: StreamingGenerator,
{
    session_tx.send_modify(|session| session.start());

    let mut events = match source.generate_stream(request).await {
        Ok(events) => events,
        Err(e) => {
            session_tx.send_modify(|session| session.fail(format!("failed to open stream: {e:#}")));
            return;
        }
    };

    loop {
        let next = tokio::select! {
            _ = token.cancelled() => {
                debug!("generation cancelled, stopping event loop");
                break;
            }
            next = events.next() => next,
        };

        let Some(next) = next else {
            // Clean end-of-stream. Whether that is success depends on
            // whether a `complete` event already landed; see below.
            break;
        };

        match next {
            Ok(event) => {
                session_tx.send_modify(|session| session.apply(event));
                if session_tx.borrow().status().is_terminal() {
                    break;
                }
            }
            Err(e) => {
                session_tx.send_modify(|session| session.fail(e.to_string()));
                break;
            }
        }
    }

    // A clean `complete` event is the only sanctioned success path; a
    // stream that just stops mid-session is a failure.
    session_tx.send_modify(|session| {
        if !session.status().is_terminal() {
            session.fail("stream ended unexpectedly");
        }
    });
}
