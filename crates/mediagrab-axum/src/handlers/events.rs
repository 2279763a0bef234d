//! SSE events handler - real-time session event streaming.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures_util::stream::Stream;

use crate::state::AppState;

/// SSE stream endpoint.
///
/// Clients connect here to receive progress updates and terminal events
/// for every session, tagged with the session ID for demultiplexing.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static> {
    state.sse.clone().subscribe()
}
