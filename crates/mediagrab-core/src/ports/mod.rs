//! Port definitions: the traits adapters implement for the core.

mod activity;
mod event_sink;
mod extractor;

pub use activity::{
    ActivityKind, ActivityLog, ActivityLogError, ActivityRecord, CallerId, NoopActivityLog,
};
pub use event_sink::{DownloadEventSink, NoopEventSink};
pub use extractor::{
    Extractor, ExtractorError, FetchOutcome, MediaProbe, ProgressFrame, ProgressSink, Rendition,
};
