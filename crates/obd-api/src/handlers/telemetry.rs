//! WebSocket telemetry streaming
//!
//! Every connected client gets its own polling loop over the shared device
//! link. Loops serialize through the link's gate, so adding clients divides
//! device throughput instead of corrupting exchanges.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use obd_elm::ObdLink;
use obd_protocol::{decode, DecodedValue, Pid, SpeedUnit, TelemetryPayload};
use tokio::time;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::state::AppState;

/// Control message a client sends to flip between km/h and mph
pub const TOGGLE_SPEED_UNIT: &str = "toggle_speed_unit";

/// GET /ws
/// Upgrade to a WebSocket and stream telemetry until the client leaves
pub async fn telemetry_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| client_session(socket, state))
}

/// One client's session: poll, push, then listen briefly for control
/// messages. The bounded control wait doubles as the tick interval.
async fn client_session(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();
    let mut unit = SpeedUnit::default();
    info!(%client_id, "Telemetry client connected");

    loop {
        let payload = poll_snapshot(state.link(), state.pids(), unit).await;
        let text = match serde_json::to_string(&payload) {
            Ok(text) => text,
            Err(e) => {
                error!(%client_id, error = %e, "Telemetry payload failed to serialize");
                break;
            }
        };
        if socket.send(Message::Text(text.into())).await.is_err() {
            break;
        }

        match time::timeout(state.control_wait(), socket.recv()).await {
            // quiet tick, poll again
            Err(_) => {}
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                debug!(%client_id, error = %e, "Client socket error");
                break;
            }
            Ok(Some(Ok(message))) => match message {
                Message::Text(cmd) if cmd.as_str().trim() == TOGGLE_SPEED_UNIT => {
                    unit = unit.toggled();
                    debug!(%client_id, unit = %unit, "Speed unit toggled");
                }
                Message::Text(cmd) => {
                    debug!(%client_id, command = %cmd.as_str(), "Ignoring unknown control message");
                }
                Message::Close(_) => break,
                // pings are answered by the protocol layer; binary is ignored
                _ => {}
            },
        }
    }

    info!(%client_id, "Telemetry client disconnected");
}

/// Poll the configured PIDs once and assemble a payload.
///
/// Device failures degrade to inline diagnostic values; they never end the
/// client's stream.
async fn poll_snapshot(
    link: &Arc<dyn ObdLink>,
    pids: &[String],
    unit: SpeedUnit,
) -> TelemetryPayload {
    let mut payload = TelemetryPayload::new(unit);
    for code in pids {
        let value = match link.execute(code).await {
            Ok(raw) => decode(code, &raw, unit),
            Err(e) => {
                debug!(pid = %code, error = %e, "Device exchange failed");
                // a dead link renders the same way a NO DATA reply does
                DecodedValue::NoData("Error".to_string())
            }
        };
        match Pid::from_code(code) {
            Some(pid) => payload.insert(pid, value),
            None => payload.insert_extra(code.as_str(), value),
        }
    }
    payload
}
