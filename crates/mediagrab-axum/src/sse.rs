//! SSE event broadcaster.
//!
//! Implements the download event sink so the job runner can publish
//! session updates that stream to every connected web client.

use std::convert::Infallible;
use std::sync::Arc;

use axum::response::sse::{Event, Sse};
use futures_util::stream::Stream;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use mediagrab_core::download::DownloadEvent;
use mediagrab_core::ports::DownloadEventSink;

/// SSE broadcaster backed by a tokio broadcast channel.
///
/// Multiple clients receive the same events simultaneously; slow clients
/// may miss events if the buffer overflows.
#[derive(Debug, Clone)]
pub struct SseBroadcaster {
    sender: broadcast::Sender<DownloadEvent>,
}

impl SseBroadcaster {
    /// Create a broadcaster with the specified channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a broadcaster with default capacity (256 events).
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(256)
    }

    /// Create an SSE stream for a new client connection.
    ///
    /// Includes a keep-alive ping every 30 seconds to prevent proxy
    /// timeouts.
    pub fn subscribe(
        self: Arc<Self>,
    ) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static> {
        let receiver = self.sender.subscribe();
        let stream = BroadcastStream::new(receiver).filter_map(|result| match result {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => Some(Ok(Event::default().data(json))),
                Err(e) => {
                    tracing::warn!("Failed to serialize event: {}", e);
                    None
                }
            },
            Err(e) => {
                // Lagged or closed receivers just skip ahead
                tracing::debug!("SSE stream error: {}", e);
                None
            }
        });

        Sse::new(stream).keep_alive(
            axum::response::sse::KeepAlive::new()
                .interval(std::time::Duration::from_secs(30))
                .text("ping"),
        )
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl DownloadEventSink for SseBroadcaster {
    fn emit(&self, event: DownloadEvent) {
        // No subscribers is fine; the send error is not actionable
        let _ = self.sender.send(event);
    }

    fn clone_box(&self) -> Box<dyn DownloadEventSink> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediagrab_core::download::SessionId;

    #[test]
    fn broadcaster_starts_without_subscribers() {
        let broadcaster = SseBroadcaster::with_defaults();
        assert_eq!(broadcaster.subscriber_count(), 0);
        // Emitting without subscribers must not panic
        broadcaster.emit(DownloadEvent::cancelled(SessionId::new()));
    }

    #[tokio::test]
    async fn subscriber_receives_events() {
        let broadcaster = SseBroadcaster::with_defaults();
        let mut receiver = broadcaster.sender.subscribe();

        let id = SessionId::new();
        broadcaster.emit(DownloadEvent::complete(id, "clip.mp4"));

        let event = receiver.recv().await.unwrap();
        match event {
            DownloadEvent::DownloadComplete { session_id, filename } => {
                assert_eq!(session_id, id);
                assert_eq!(filename, "clip.mp4");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
