use tokio::time::sleep;
use tracing::{debug, warn};

use crate::{
    dto::ws::ClientMessage,
    error::{ConnectionError, JoinError},
    state::{
        FrameSender, SharedState,
        game::{ConnectionId, PlayerId},
        session::{GameSession, Outbound, PlayerCommand, ScheduledTimer},
    },
};

/// Admit a connection and subscribe its sender to session broadcasts.
pub async fn connect(
    state: &SharedState,
    connection: ConnectionId,
    sender: FrameSender,
) -> Result<PlayerId, JoinError> {
    let mut session = state.session().lock().await;
    let (player_id, outbound) = session.connect(connection)?;
    state.hub().subscribe(connection, sender);
    deliver(state, &mut session, outbound);
    Ok(player_id)
}

/// Parse a text frame and apply it on behalf of `connection`.
///
/// Unknown message types are ignored; unparsable payloads are returned as
/// [`ConnectionError::Malformed`] and leave the session untouched.
pub async fn handle_text(
    state: &SharedState,
    connection: ConnectionId,
    text: &str,
) -> Result<(), ConnectionError> {
    match ClientMessage::from_json_str(text)?.into_command() {
        Some(command) => handle_command(state, connection, command).await,
        None => debug!(%connection, "ignoring message of unknown type"),
    }
    Ok(())
}

/// Apply a player command under the session lock.
pub async fn handle_command(state: &SharedState, connection: ConnectionId, command: PlayerCommand) {
    let mut session = state.session().lock().await;
    match session.handle(connection, command) {
        Ok(outbound) => deliver(state, &mut session, outbound),
        Err(err) => debug!(%connection, command = command.name(), error = %err, "command ignored"),
    }
}

/// Remove a connection from the session and its subscribers.
pub async fn disconnect(state: &SharedState, connection: ConnectionId) {
    let mut session = state.session().lock().await;
    state.hub().unsubscribe(&connection);
    let outbound = session.disconnect(connection);
    deliver(state, &mut session, outbound);
}

/// Re-enter the session for a timer armed earlier.
pub async fn fire_timer(state: &SharedState, timer: ScheduledTimer) {
    let mut session = state.session().lock().await;
    let outbound = session.on_timer(timer);
    deliver(state, &mut session, outbound);
}

/// Deliver effects in order while the session lock is held.
///
/// Subscribers that turn out to be unreachable are disconnected on the spot,
/// which may produce further effects; those are delivered in the same pass.
fn deliver(state: &SharedState, session: &mut GameSession, outbound: Vec<Outbound>) {
    let mut pending = outbound;
    while !pending.is_empty() {
        let mut unreachable = Vec::new();
        for effect in pending.drain(..) {
            match effect {
                Outbound::Broadcast(message) => {
                    unreachable.extend(state.hub().broadcast(&message));
                }
                Outbound::Direct {
                    connection,
                    message,
                } => {
                    if let Err(err) = state.hub().send_to(&connection, &message) {
                        warn!(%connection, error = %err, "direct message not delivered");
                        unreachable.push(connection);
                    }
                }
                Outbound::Schedule(timer) => schedule(state, timer),
            }
        }

        for connection in unreachable {
            if state.hub().unsubscribe(&connection) {
                warn!(%connection, "peer unreachable; treating as disconnect");
            }
            pending.extend(session.disconnect(connection));
        }
    }
}

fn schedule(state: &SharedState, timer: ScheduledTimer) {
    debug!(kind = ?timer.kind, delay_ms = timer.delay.as_millis() as u64, "timer armed");
    let state = state.clone();
    tokio::spawn(async move {
        sleep(timer.delay).await;
        fire_timer(&state, timer).await;
    });
}
