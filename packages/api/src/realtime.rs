//! Real-time lifecycle events: a debug log of everything the registry and
//! pool emit, and an SSE stream of the same events.

use actors::JobRegistry;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::Stream;
use futures_util::stream;
use job_core::JobEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::init::AppState;

/// Log every lifecycle event at debug level.
///
/// The task ends when the registry is dropped.
pub fn spawn_event_log(registry: &JobRegistry) -> JoinHandle<()> {
    let mut events = registry.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::debug!("{}", event.description()),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event log fell behind, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Next event for an SSE client. Lagging clients skip ahead.
async fn next_event(
    mut events: broadcast::Receiver<JobEvent>,
) -> Option<(Result<Event, serde_json::Error>, broadcast::Receiver<JobEvent>)> {
    loop {
        match events.recv().await {
            Ok(event) => return Some((format_sse_event(&event), events)),
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => return None,
        }
    }
}

/// SSE event name: the event's serialized `event` tag.
fn event_name(data: &serde_json::Value) -> &str {
    data.get("event").and_then(|v| v.as_str()).unwrap_or("message")
}

fn format_sse_event(event: &JobEvent) -> Result<Event, serde_json::Error> {
    let data = serde_json::to_value(event)?;
    Ok(Event::default()
        .event(event_name(&data))
        .data(data.to_string()))
}

/// `GET /events`
pub(crate) async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, serde_json::Error>>> {
    let events = state.registry.subscribe();
    Sse::new(stream::unfold(events, next_event)).keep_alive(KeepAlive::default())
}
