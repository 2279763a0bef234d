//! Download event sink port.
//!
//! Abstracts event delivery so the job runner can publish session updates
//! without coupling to the transport (SSE, in-process channels, tests).

use crate::download::DownloadEvent;

/// Port for publishing download events.
pub trait DownloadEventSink: Send + Sync {
    /// Publish one event to all subscribers.
    ///
    /// Must not block; implementations buffer or drop as appropriate.
    fn emit(&self, event: DownloadEvent);

    /// Clone this sink into a boxed trait object.
    fn clone_box(&self) -> Box<dyn DownloadEventSink>;
}

/// A sink that discards all events, for tests and headless contexts.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEventSink;

impl DownloadEventSink for NoopEventSink {
    fn emit(&self, _event: DownloadEvent) {}

    fn clone_box(&self) -> Box<dyn DownloadEventSink> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::SessionId;

    #[test]
    fn noop_sink_does_not_panic() {
        let sink = NoopEventSink;
        sink.emit(DownloadEvent::cancelled(SessionId::new()));
        let _boxed: Box<dyn DownloadEventSink> = sink.clone_box();
    }
}
