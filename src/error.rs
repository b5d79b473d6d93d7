use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Error taxonomy for mission planning and dispatch.
///
/// `ElevationUnavailable` never reaches a caller: the fallback-altitude
/// policy absorbs it at the enrichment call site. `DispatchUnavailable` is
/// reported inside a success payload (`dispatched: false`), not as an HTTP
/// error; the mapping below exists for completeness.
#[derive(Debug, Error)]
pub enum MissionError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("coordinate out of range: {0}")]
    OutOfRange(String),

    #[error("elevation unavailable: {0}")]
    ElevationUnavailable(String),

    #[error("dispatch unavailable: {0}")]
    DispatchUnavailable(String),

    #[error("planning defect: {0}")]
    PlanningDefect(String),
}

impl IntoResponse for MissionError {
    fn into_response(self) -> Response {
        let status = match &self {
            MissionError::MalformedInput(_) | MissionError::OutOfRange(_) => {
                StatusCode::BAD_REQUEST
            }
            MissionError::PlanningDefect(_) => StatusCode::INTERNAL_SERVER_ERROR,
            MissionError::ElevationUnavailable(_) | MissionError::DispatchUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_map_to_400() {
        let response =
            MissionError::MalformedInput("lat missing".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = MissionError::OutOfRange("lat 91".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_planning_defect_maps_to_500() {
        let response = MissionError::PlanningDefect("lost waypoint".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
