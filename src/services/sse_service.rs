use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

use crate::{
    dto::{
        game::GameSummary,
        sse::{Handshake, ServerEvent},
    },
    services::sse_events,
    state::SharedState,
};

/// Subscribe to the game SSE stream.
pub fn subscribe(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.sse().subscribe()
}

/// Convert a broadcast receiver into an SSE response, forwarding events until the
/// client disconnects. The handshake and the current game are sent first so a fresh
/// client does not wait for the next mutation.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    initial: Vec<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        for payload in initial {
            if tx.send(Ok(to_event(payload))).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(skipped, "SSE subscriber lagged; skipping events");
                            continue;
                        }
                    }
                }
            }
        }

        info!("game SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Events a new subscriber receives before live updates.
pub async fn initial_events(state: &SharedState) -> Vec<ServerEvent> {
    let degraded = state.is_degraded();
    let mut events = Vec::with_capacity(2);

    if let Ok(handshake) = ServerEvent::json(
        Some("handshake".to_string()),
        &Handshake {
            stream: "game".into(),
            message: "game stream connected".into(),
            degraded,
        },
    ) {
        events.push(handshake);
    }

    let game = state.game_snapshot().await;
    if let Ok(snapshot) = ServerEvent::json(
        Some(sse_events::EVENT_GAME_STATE.to_string()),
        &GameSummary::from(&game),
    ) {
        events.push(snapshot);
    }

    events
}

/// Send a human-readable info message onto the game SSE stream.
pub fn broadcast_info(state: &SharedState, message: &str) {
    state.sse().broadcast(ServerEvent::new(
        Some("info".to_string()),
        message.to_string(),
    ));
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}
