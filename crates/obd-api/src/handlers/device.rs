//! Adapter identification handler

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use obd_elm::commands;
use obd_protocol::codec;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Response for GET /api/device
#[derive(Debug, Serialize)]
pub struct DeviceInfoResponse {
    /// Adapter identification string (ATI)
    pub identity: String,
    /// Supply voltage as reported by the adapter (ATRV)
    pub voltage: String,
    /// Active OBD protocol description (ATDP)
    pub protocol: String,
    /// Configured device endpoint
    pub endpoint: String,
    /// Timestamp (unix ms)
    pub checked_at: i64,
}

/// GET /api/device
/// Query the adapter for its identification, supply voltage, and protocol.
/// Serialized through the same gate as telemetry polls.
pub async fn device_info(
    State(state): State<AppState>,
) -> Result<Json<DeviceInfoResponse>, ApiError> {
    let link = state.link();

    let identity = link.execute(commands::IDENTIFY).await?;
    let voltage = link.execute(commands::READ_VOLTAGE).await?;
    let protocol = link.execute(commands::DESCRIBE_PROTOCOL).await?;

    Ok(Json(DeviceInfoResponse {
        identity: codec::clean(&identity),
        voltage: codec::clean(&voltage),
        protocol: codec::clean(&protocol),
        endpoint: link.endpoint(),
        checked_at: Utc::now().timestamp_millis(),
    }))
}
