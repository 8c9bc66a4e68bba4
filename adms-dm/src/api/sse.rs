//! SSE stream of processed change notices

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use crate::AppState;

/// GET /api/events
///
/// Streams one `change` event per processed row change, carrying the full
/// notice (rows, delta, activity entry) as JSON.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscription.read().await.subscribe_notices();
    info!("New SSE client connected to change notices");

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(notice) => {
                let event = Event::default()
                    .event("change")
                    .json_data(&notice)
                    .ok();
                event.map(Ok)
            }
            Err(e) => {
                // BroadcastStream wraps RecvError, just log and continue
                warn!("SSE client error: {:?}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
