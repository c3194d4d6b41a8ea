use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use caseforge_session::{GenerationSlot, Mode, SessionOutcome, SessionStatus};
use caseforge_stream::{
    CompletionResult, EventStream, GenerateRequest, GenerationEvent, HallucinationReport,
    StreamError, Steps, StreamingGenerator, TestCase,
};
use tokio::sync::Notify;

/// Hands out pre-scripted event streams instead of opening HTTP requests.
struct ScriptedSource {
    streams: Mutex<VecDeque<EventStream>>,
}

impl ScriptedSource {
    fn new(streams: Vec<EventStream>) -> Arc<Self> {
        Arc::new(Self {
            streams: Mutex::new(streams.into_iter().collect()),
        })
    }
}

#[async_trait]
impl StreamingGenerator for ScriptedSource {
    async fn generate_stream(&self, _request: GenerateRequest) -> Result<EventStream> {
        self.streams
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted stream left"))
    }
}

/// A source whose stream can never be opened.
struct BrokenSource;

#[async_trait]
impl StreamingGenerator for BrokenSource {
    async fn generate_stream(&self, _request: GenerateRequest) -> Result<EventStream> {
        anyhow::bail!("connection refused")
    }
}

fn events(items: Vec<Result<GenerationEvent, StreamError>>) -> EventStream {
    Box::pin(futures::stream::iter(items))
}

fn item(id: &str, feature: Option<&str>) -> GenerationEvent {
    GenerationEvent::TestCase {
        test_case: TestCase {
            id: id.to_string(),
            description: String::new(),
            preconditions: String::new(),
            steps: Steps::Text(String::new()),
            expected_result: String::new(),
            feature: feature.map(str::to_string),
            feature_description: None,
            hallucination: None,
        },
    }
}

fn complete() -> GenerationEvent {
    GenerationEvent::Complete {
        result: CompletionResult {
            hallucination_report: HallucinationReport::default(),
        },
    }
}

fn request() -> GenerateRequest {
    GenerateRequest::new("uploads/spec.pdf", "Login")
}

#[tokio::test]
async fn test_batch_run_completes_and_aggregates() {
    let source = ScriptedSource::new(vec![events(vec![
        Ok(GenerationEvent::Status {
            message: "Extracting features...".to_string(),
        }),
        Ok(GenerationEvent::BatchStart { total_features: 2 }),
        Ok(GenerationEvent::Progress {
            current: 1,
            total: 2,
            feature: "A".to_string(),
        }),
        Ok(item("TC-1", Some("A"))),
        Ok(GenerationEvent::Progress {
            current: 2,
            total: 2,
            feature: "B".to_string(),
        }),
        Ok(item("TC-2", Some("B"))),
        Ok(complete()),
    ])]);

    let mut slot = GenerationSlot::new();
    let handle = slot.start(source, request());
    let session = handle.finished().await;

    assert_eq!(session.status(), SessionStatus::Completed);
    assert_eq!(session.mode(), Mode::Batch);
    assert_eq!(session.items().len(), 2);
    assert_eq!(session.ratio(), 1.0);
    assert_eq!(session.groups().len(), 2);
    assert!(matches!(
        session.outcome(),
        Some(SessionOutcome::Completed { .. })
    ));
}

#[tokio::test]
async fn test_stream_ending_without_complete_fails_the_session() {
    let source = ScriptedSource::new(vec![events(vec![Ok(item("TC-1", None))])]);

    let mut slot = GenerationSlot::new();
    let session = slot.start(source, request()).finished().await;

    assert_eq!(session.status(), SessionStatus::Failed);
    match session.outcome() {
        Some(SessionOutcome::Failed { message }) => {
            assert_eq!(message, "stream ended unexpectedly");
        }
        other => panic!("expected failed outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn test_transport_error_fails_the_session_and_stops_reading() {
    let source = ScriptedSource::new(vec![events(vec![
        Ok(item("TC-1", None)),
        Err(StreamError::Transport("connection reset".to_string())),
        Ok(item("TC-2", None)),
    ])]);

    let mut slot = GenerationSlot::new();
    let session = slot.start(source, request()).finished().await;

    assert_eq!(session.status(), SessionStatus::Failed);
    assert_eq!(session.items().len(), 1);
    match session.outcome() {
        Some(SessionOutcome::Failed { message }) => {
            assert!(message.contains("connection reset"), "got: {message}");
        }
        other => panic!("expected failed outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn test_decode_error_fails_the_session() {
    let decode_err = caseforge_stream::decode_frame("{broken").unwrap_err();
    let source = ScriptedSource::new(vec![events(vec![Err(decode_err)])]);

    let mut slot = GenerationSlot::new();
    let session = slot.start(source, request()).finished().await;

    assert_eq!(session.status(), SessionStatus::Failed);
}

#[tokio::test]
async fn test_failure_to_open_the_stream_fails_the_session() {
    let mut slot = GenerationSlot::new();
    let session = slot.start(Arc::new(BrokenSource), request()).finished().await;

    assert_eq!(session.status(), SessionStatus::Failed);
    match session.outcome() {
        Some(SessionOutcome::Failed { message }) => {
            assert!(message.contains("connection refused"), "got: {message}");
        }
        other => panic!("expected failed outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn test_abort_after_batch_start_cancels_with_zero_items() {
    let gate = Arc::new(Notify::new());
    let stream_gate = Arc::clone(&gate);

    let gated: EventStream = Box::pin(async_stream::stream! {
        yield Ok(GenerationEvent::BatchStart { total_features: 2 });
        stream_gate.notified().await;
        yield Ok(item("TC-1", Some("A")));
        yield Ok(complete());
    });

    let mut slot = GenerationSlot::new();
    let handle = slot.start(ScriptedSource::new(vec![gated]), request());

    let mut rx = handle.subscribe();
    rx.wait_for(|session| session.mode() == Mode::Batch)
        .await
        .unwrap();

    handle.abort();

    // The abort is already visible, before the driver has wound down.
    assert_eq!(handle.snapshot().status(), SessionStatus::Cancelled);

    // Let any buffered events drain; they must bounce off the session.
    gate.notify_one();
    let session = handle.finished().await;

    assert_eq!(session.status(), SessionStatus::Cancelled);
    assert!(session.items().is_empty());
    assert!(session.outcome().is_none());
}

#[tokio::test]
async fn test_abort_against_a_stalled_transport_never_reads_as_failure() {
    // A transport that delivers nothing: the driver sits in its select
    // until the token fires, then winds down. The session it finds must
    // already be Cancelled, not an unexpectedly-ended stream.
    let stalled: EventStream = Box::pin(futures::stream::pending());

    let mut slot = GenerationSlot::new();
    let handle = slot.start(ScriptedSource::new(vec![stalled]), request());

    handle.abort();
    let session = handle.finished().await;

    assert_eq!(session.status(), SessionStatus::Cancelled);
    assert!(session.outcome().is_none());
}

#[tokio::test]
async fn test_slot_abort_against_a_stalled_transport_cancels_cleanly() {
    let stalled: EventStream = Box::pin(futures::stream::pending());

    let mut slot = GenerationSlot::new();
    let handle = slot.start(ScriptedSource::new(vec![stalled]), request());

    slot.abort();
    let session = handle.finished().await;

    assert_eq!(session.status(), SessionStatus::Cancelled);
    assert!(session.outcome().is_none());
}

#[tokio::test]
async fn test_starting_a_new_generation_aborts_the_active_one() {
    let gate = Arc::new(Notify::new());
    let stream_gate = Arc::clone(&gate);

    let stalled: EventStream = Box::pin(async_stream::stream! {
        yield Ok(item("TC-1", None));
        stream_gate.notified().await;
        yield Ok(complete());
    });

    let mut slot = GenerationSlot::new();
    let first = slot.start(ScriptedSource::new(vec![stalled]), request());

    let mut rx = first.subscribe();
    rx.wait_for(|session| !session.items().is_empty())
        .await
        .unwrap();

    let second = slot.start(
        ScriptedSource::new(vec![events(vec![Ok(complete())])]),
        request(),
    );

    let first_session = first.finished().await;
    assert_eq!(first_session.status(), SessionStatus::Cancelled);
    assert!(first_session.items().is_empty());

    let second_session = second.finished().await;
    assert_eq!(second_session.status(), SessionStatus::Completed);
    assert_ne!(first_session.id(), second_session.id());
}

#[tokio::test]
async fn test_rerun_after_completion_starts_from_a_fresh_session() {
    let source = ScriptedSource::new(vec![
        events(vec![Ok(item("TC-1", None)), Ok(complete())]),
        events(vec![Ok(complete())]),
    ]);

    let mut slot = GenerationSlot::new();
    let first = slot
        .start(Arc::clone(&source), request())
        .finished()
        .await;
    assert_eq!(first.status(), SessionStatus::Completed);
    assert_eq!(first.items().len(), 1);

    let second = slot.start(source, request()).finished().await;
    assert_eq!(second.status(), SessionStatus::Completed);
    assert!(second.items().is_empty());
    assert_ne!(first.id(), second.id());
}
