use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::ServerMessage,
    services::game_service,
    state::{FrameSender, SharedState, send_frame},
};

/// Handle the full lifecycle for an individual player WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let connection = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                return;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    let player_id = match game_service::connect(&state, connection, outbound_tx.clone()).await {
        Ok(player_id) => player_id,
        Err(err) => {
            info!(%connection, reason = %err, "connection refused");
            let _ = send_frame(&outbound_tx, &ServerMessage::error(err.to_string()));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    info!(%connection, player = %player_id, "player connected");

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                debug!(player = %player_id, payload = %text, "received player message");
                if let Err(err) =
                    game_service::handle_text(&state, connection, text.as_str()).await
                {
                    warn!(player = %player_id, error = %err, "failed to process player message");
                }
            }
            Ok(Message::Close(_)) => {
                info!(player = %player_id, "player closed");
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(player = %player_id, error = %err, "websocket error");
                break;
            }
        }
    }

    game_service::disconnect(&state, connection).await;
    info!(player = %player_id, "player disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: FrameSender) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
