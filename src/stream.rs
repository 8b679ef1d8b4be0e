//! Streaming call orchestration.
//!
//! Each streamed chat or generate call runs on its own spawned task:
//!
//! ```text
//! build request ──► send ──► status check ──► StreamReader ──► done / EOF
//!       │             │            │                │
//!       └─────────────┴────────────┴────────────────┴──► error slot
//! ```
//!
//! The caller gets an [`EventStream`] holding the receiving ends. Events go
//! through a capacity-1 channel so a slow consumer throttles body reads. At
//! most one terminal error is published, always after the event channel has
//! closed. The response body is owned by the task and is dropped before the
//! task ends, whichever way it ends.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::client::check_response;
use crate::error::{SkaldError, SkaldResult};
use crate::models::References;
use crate::sse::{StreamEnd, StreamEvent, StreamReader};
use crate::traits::{HttpClient, HttpRequest};

/// Capacity of the event channel.
const EVENT_BUFFER: usize = 1;

/// Start a streaming call on a new task.
///
/// `request` is the already-built request, or the error that prevented
/// building it; the latter is reported through the error slot without
/// touching the network.
pub(crate) fn spawn_stream(
    transport: Arc<dyn HttpClient>,
    request: SkaldResult<HttpRequest>,
    cancel: &CancellationToken,
) -> EventStream {
    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
    let (error_tx, error_rx) = oneshot::channel();
    let cancel = cancel.child_token();
    let guard = cancel.clone().drop_guard();

    let task = tokio::spawn(async move {
        let outcome = drive(transport, request, &events_tx, &cancel).await;
        drop(events_tx);
        if let Err(err) = outcome {
            tracing::debug!(error = %err, "Streaming call failed");
            let _ = error_tx.send(err);
        }
    });

    EventStream {
        events: events_rx,
        error: error_rx,
        task: Some(task),
        _cancel_on_drop: guard,
    }
}

async fn drive(
    transport: Arc<dyn HttpClient>,
    request: SkaldResult<HttpRequest>,
    events: &mpsc::Sender<StreamEvent>,
    cancel: &CancellationToken,
) -> SkaldResult<()> {
    let request = request?;
    tracing::debug!(method = %request.method, url = %request.url, "Starting streaming request");

    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(SkaldError::Cancelled),
        response = transport.send(request) => response?,
    };

    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(SkaldError::Cancelled),
        checked = check_response(response) => checked?,
    };
    tracing::debug!(status = response.status, "Stream opened");

    match StreamReader::new(response.body).run(events, cancel).await? {
        StreamEnd::ConsumerGone => tracing::debug!("Stream consumer went away"),
        StreamEnd::Done | StreamEnd::Eof => {}
    }
    Ok(())
}

/// Live events of one streaming call plus its terminal outcome.
///
/// Iterate with [`next_event`](Self::next_event) or as a
/// [`futures::Stream`], then call [`finish`](Self::finish) to learn whether
/// the stream ended cleanly. Dropping an `EventStream` cancels the call and
/// releases the connection.
///
/// # Example
///
/// ```ignore
/// let mut stream = client.streamed_chat(ChatParams::new("What is Skald?"), &cancel);
/// while let Some(event) = stream.next_event().await {
///     print!("{}", event.text());
/// }
/// stream.finish().await?;
/// ```
pub struct EventStream {
    events: mpsc::Receiver<StreamEvent>,
    error: oneshot::Receiver<SkaldError>,
    task: Option<JoinHandle<()>>,
    _cancel_on_drop: DropGuard,
}

impl EventStream {
    /// Next event, or `None` once the stream has terminated.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }

    /// Terminal error, if one has already been published.
    ///
    /// Does not wait. An error is only ever published after the event
    /// channel has closed.
    pub fn try_error(&mut self) -> Option<SkaldError> {
        self.error.try_recv().ok()
    }

    /// Wait for the call to end and return its outcome.
    ///
    /// Undelivered events are discarded; the event channel is closed first so
    /// the task can finish even when nobody drained it.
    pub async fn finish(mut self) -> SkaldResult<()> {
        self.events.close();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Streaming task did not complete");
                return Err(SkaldError::TaskFailed(e.to_string()));
            }
        }
        match self.error.try_recv() {
            Ok(err) => Err(err),
            Err(_) => Ok(()),
        }
    }

    /// Drain every event, then return them with the outcome.
    pub async fn collect_events(mut self) -> SkaldResult<Vec<StreamEvent>> {
        let mut collected = Vec::new();
        while let Some(event) = self.events.recv().await {
            collected.push(event);
        }
        self.finish().await?;
        Ok(collected)
    }

    /// Drain the stream into its concatenated token text.
    pub async fn collect_text(self) -> SkaldResult<String> {
        Ok(self.collect_summary().await?.text)
    }

    /// Drain the stream into text, the last chat id seen and all references.
    pub async fn collect_summary(self) -> SkaldResult<StreamSummary> {
        let mut summary = StreamSummary::default();
        for event in self.collect_events().await? {
            summary.completed |= event.is_done();
            if event.is_token() {
                summary.text.push_str(event.text());
            }
            if let Some(chat_id) = event.chat_id {
                summary.chat_id = Some(chat_id);
            }
            summary.references.extend(event.references);
        }
        Ok(summary)
    }
}

impl Stream for EventStream {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_recv(cx)
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("running", &self.task.as_ref().map(|t| !t.is_finished()))
            .finish_non_exhaustive()
    }
}

/// Aggregate of a fully drained stream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamSummary {
    /// Concatenated `token` content
    pub text: String,
    pub chat_id: Option<String>,
    pub references: References,
    /// Whether a `done` event was received
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::traits::{HttpError, HttpResponse, Method};
    use std::time::Duration;

    const URL: &str = "http://skald.test/api/v1/chat";

    fn request() -> SkaldResult<HttpRequest> {
        Ok(HttpRequest::new(Method::Post, URL))
    }

    fn spawn(mock: &MockHttpClient, cancel: &CancellationToken) -> EventStream {
        spawn_stream(Arc::new(mock.clone()), request(), cancel)
    }

    #[tokio::test]
    async fn test_construction_error_never_sends() {
        let mock = MockHttpClient::new();
        let stream = spawn_stream(
            Arc::new(mock.clone()),
            Err(SkaldError::RequestConstruction("bad body".to_string())),
            &CancellationToken::new(),
        );

        let err = stream.collect_events().await.unwrap_err();
        assert!(matches!(err, SkaldError::RequestConstruction(_)));
        assert!(mock.get_requests().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error() {
        let mock = MockHttpClient::new();
        mock.set_response(
            URL,
            MockResponse::Error(HttpError::ConnectionFailed("refused".to_string())),
        );
        let err = spawn(&mock, &CancellationToken::new())
            .collect_events()
            .await
            .unwrap_err();
        assert!(matches!(err, SkaldError::Transport(HttpError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn test_summary() {
        let mock = MockHttpClient::new();
        mock.set_response(
            URL,
            MockResponse::sse(concat!(
                "data: {\"type\":\"token\",\"content\":\"See [[1]]\"}\n",
                "data: {\"type\":\"references\",\"references\":{\"1\":{\"memo_uuid\":\"u\",\"memo_title\":\"t\"}}}\n",
                "data: {\"type\":\"done\",\"chat_id\":\"c-1\"}\n",
            )),
        );
        let summary = spawn(&mock, &CancellationToken::new())
            .collect_summary()
            .await
            .unwrap();

        assert_eq!(summary.text, "See [[1]]");
        assert_eq!(summary.chat_id.as_deref(), Some("c-1"));
        assert_eq!(summary.references["1"].memo_title, "t");
        assert!(summary.completed);
        assert!(mock.all_bodies_released());
    }

    #[tokio::test]
    async fn test_finish_without_draining() {
        let mock = MockHttpClient::new();
        mock.set_response(
            URL,
            MockResponse::Stalled(vec![bytes::Bytes::from_static(
                b"data: {\"type\":\"token\",\"content\":\"a\"}\n",
            )]),
        );
        let stream = spawn(&mock, &CancellationToken::new());

        let result = tokio::time::timeout(Duration::from_secs(2), stream.finish())
            .await
            .expect("finish should not hang");
        assert!(result.is_ok());
        assert!(mock.all_bodies_released());
    }

    struct PanickingTransport;

    #[async_trait::async_trait]
    impl HttpClient for PanickingTransport {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, HttpError> {
            panic!("transport bug");
        }
    }

    #[tokio::test]
    async fn test_crashed_task_is_not_a_clean_finish() {
        let stream = spawn_stream(
            Arc::new(PanickingTransport),
            request(),
            &CancellationToken::new(),
        );

        let err = stream.finish().await.unwrap_err();
        assert!(matches!(err, SkaldError::TaskFailed(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_null_optional_fields_reach_consumer() {
        let mock = MockHttpClient::new();
        mock.set_response(
            URL,
            MockResponse::sse(concat!(
                "data: {\"type\":\"token\",\"content\":\"Hi\",\"chat_id\":null,\"references\":null}\n",
                "data: {\"type\":\"done\",\"chat_id\":\"c-2\",\"references\":null}\n",
            )),
        );
        let summary = spawn(&mock, &CancellationToken::new())
            .collect_summary()
            .await
            .unwrap();

        assert_eq!(summary.text, "Hi");
        assert_eq!(summary.chat_id.as_deref(), Some("c-2"));
        assert!(summary.references.is_empty());
        assert!(summary.completed);
    }

    #[tokio::test]
    async fn test_try_error_before_and_after() {
        let mock = MockHttpClient::new();
        mock.set_response(URL, MockResponse::Status(500, "boom".into()));
        let mut stream = spawn(&mock, &CancellationToken::new());

        assert!(stream.next_event().await.is_none());
        // The error is sent right after the event channel closes.
        let err = loop {
            if let Some(err) = stream.try_error() {
                break err;
            }
            tokio::task::yield_now().await;
        };
        assert_eq!(err.status_code(), Some(500));
    }
}
