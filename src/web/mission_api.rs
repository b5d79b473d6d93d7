use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    config::CONFIG,
    dispatch::{DispatchLink, LinkStatus},
    elevation,
    error::MissionError,
    mission::{
        planner,
        waypoint::{self, RawWaypoint, Waypoint},
    },
};

#[derive(Debug, Deserialize)]
pub struct MissionRequest {
    pub waypoints: Vec<RawWaypoint>,
}

#[derive(Debug, Serialize)]
pub struct MissionResponse {
    pub waypoints: Vec<Waypoint>,
    pub dispatched: bool,
    pub detail: String,
}

#[derive(Debug, Deserialize)]
pub struct PointRequest {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub vehicle_id: String,
    pub version: String,
    pub link: LinkStatus,
    pub start: Waypoint,
}

pub fn routes() -> Router {
    Router::new()
        .route("/api/mission", post(submit_mission))
        .route("/api/waypoint", post(add_waypoint))
        .route("/api/status", get(status_api))
}

/// Full mission submission: validate, order from the launch point, dispatch.
///
/// A dispatch failure is not an HTTP error: the ordered plan is still useful
/// to the operator, so it comes back with `dispatched: false` and the reason.
async fn submit_mission(
    Json(request): Json<MissionRequest>,
) -> Result<Json<MissionResponse>, MissionError> {
    let mission = waypoint::build_mission(&request.waypoints, CONFIG.planner.default_altitude)?;
    let ordered = planner::plan(&CONFIG.planner.start(), &mission)?;

    if ordered.is_empty() {
        return Ok(Json(MissionResponse {
            waypoints: ordered,
            dispatched: false,
            detail: "no waypoints to dispatch".to_string(),
        }));
    }

    let link = DispatchLink::instance().await;
    match link.transmit(&ordered).await {
        Ok(()) => {
            info!("Dispatched mission of {} waypoints", ordered.len());
            Ok(Json(MissionResponse {
                waypoints: ordered,
                dispatched: true,
                detail: "mission dispatched".to_string(),
            }))
        }
        Err(e) => {
            warn!("Mission planned but not dispatched: {}", e);
            Ok(Json(MissionResponse {
                waypoints: ordered,
                dispatched: false,
                detail: e.to_string(),
            }))
        }
    }
}

/// Single-point ingestion: always derives altitude from terrain elevation.
async fn add_waypoint(Json(request): Json<PointRequest>) -> Result<Json<Waypoint>, MissionError> {
    let lat = request
        .lat
        .ok_or_else(|| MissionError::MalformedInput("lat is required".to_string()))?;
    let lng = request
        .lng
        .ok_or_else(|| MissionError::MalformedInput("lng is required".to_string()))?;

    let point = waypoint::enrich(lat, lng, elevation::provider(), &CONFIG.elevation).await?;
    Ok(Json(point))
}

async fn status_api() -> Json<StatusResponse> {
    let link = DispatchLink::instance().await;
    Json(StatusResponse {
        vehicle_id: CONFIG.general.vehicle_id.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        link: link.status().await,
        start: CONFIG.planner.start(),
    })
}
