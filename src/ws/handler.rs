//! WebSocket upgrade handler for match observers

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::ObserverSignal;
use crate::util::rate_limit::ObserverRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler. Observers are anonymous; each connection
/// gets a fresh id for log correlation.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let observer_id = Uuid::new_v4();
    info!(observer_id = %observer_id, "New observer connection");

    let (mut ws_sink, ws_stream) = socket.split();

    let handle = match state.registry.get(&state.default_match_id) {
        Some(handle) => handle,
        None => {
            error!(observer_id = %observer_id, "Default match not running");
            let _ = ws_sink.send(Message::Close(None)).await;
            return;
        }
    };

    let welcome = ServerMsg::Welcome {
        observer_id,
        match_id: handle.id,
        server_time: unix_millis(),
    };
    if let Err(e) = send_msg(&mut ws_sink, &welcome).await {
        error!(observer_id = %observer_id, error = %e, "Failed to send welcome");
        return;
    }

    let snapshot_rx = handle.snapshot_tx.subscribe();
    run_session(observer_id, ws_sink, ws_stream, handle.control_tx, snapshot_rx).await;

    info!(observer_id = %observer_id, "Observer connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    observer_id: Uuid,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    control_tx: mpsc::Sender<ObserverSignal>,
    mut snapshot_rx: broadcast::Receiver<ServerMsg>,
) {
    let rate_limiter = ObserverRateLimiter::new();

    // Writer task: match broadcast -> WebSocket
    let writer_observer_id = observer_id;
    let writer_handle = tokio::spawn(async move {
        loop {
            match snapshot_rx.recv().await {
                Ok(msg) => {
                    if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                        debug!(observer_id = %writer_observer_id, error = %e, "WebSocket send failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // A slow client just skips ahead to fresher state.
                    warn!(
                        observer_id = %writer_observer_id,
                        lagged_count = n,
                        "Observer lagged, skipping {} snapshots", n
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(observer_id = %writer_observer_id, "Snapshot channel closed");
                    break;
                }
            }
        }
    });

    // Reader loop: WebSocket -> match loop
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_msg() {
                    warn!(observer_id = %observer_id, "Rate limited observer message");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(client_msg) => {
                        let signal = ObserverSignal {
                            observer_id,
                            msg: client_msg,
                            received_at: unix_millis(),
                        };

                        if control_tx.send(signal).await.is_err() {
                            debug!(observer_id = %observer_id, "Control channel closed");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(observer_id = %observer_id, error = %e, "Failed to parse client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(observer_id = %observer_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) => {
                debug!(observer_id = %observer_id, "Received ping");
            }
            Ok(Message::Pong(_)) => {
                debug!(observer_id = %observer_id, "Received pong");
            }
            Ok(Message::Close(_)) => {
                info!(observer_id = %observer_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(observer_id = %observer_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
