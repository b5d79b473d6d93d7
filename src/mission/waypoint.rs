use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ElevationConfig;
use crate::elevation::ElevationProvider;
use crate::error::MissionError;

/// A 3D point the vehicle must visit. Altitude is meters above ground at the
/// launch site; latitude and longitude are WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "altitude")]
    pub alt: f64,
}

impl Waypoint {
    pub fn validate_position(lat: f64, lng: f64) -> Result<(), MissionError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(MissionError::OutOfRange(format!(
                "latitude {} outside [-90, 90]",
                lat
            )));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(MissionError::OutOfRange(format!(
                "longitude {} outside [-180, 180]",
                lng
            )));
        }
        Ok(())
    }
}

/// Wire-level waypoint as submitted by the operator; altitude is optional.
#[derive(Debug, Deserialize)]
pub struct RawWaypoint {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub altitude: Option<f64>,
}

/// Validates a submitted batch into a mission waypoint set.
///
/// The batch replaces any previous submission wholesale. A single bad entry
/// rejects the entire batch; there is no partial acceptance. Entries without
/// an altitude get `default_altitude`, never an elevation lookup.
pub fn build_mission(
    raw: &[RawWaypoint],
    default_altitude: f64,
) -> Result<Vec<Waypoint>, MissionError> {
    let mut mission = Vec::with_capacity(raw.len());
    for (index, entry) in raw.iter().enumerate() {
        let lat = entry.lat.ok_or_else(|| {
            MissionError::MalformedInput(format!("waypoint {}: lat is required", index))
        })?;
        let lng = entry.lng.ok_or_else(|| {
            MissionError::MalformedInput(format!("waypoint {}: lng is required", index))
        })?;
        Waypoint::validate_position(lat, lng)?;
        mission.push(Waypoint {
            lat,
            lng,
            alt: entry.altitude.unwrap_or(default_altitude),
        });
    }
    debug!("Validated mission of {} waypoints", mission.len());
    Ok(mission)
}

/// Builds a single waypoint with an altitude derived from terrain elevation.
///
/// The derived altitude is `elevation + safety_margin`, capped at
/// `max_altitude`. Elevation lookup is fail-open: any provider failure falls
/// back to `fallback_altitude` so planning never blocks on terrain data.
pub async fn enrich<P: ElevationProvider>(
    lat: f64,
    lng: f64,
    provider: &P,
    config: &ElevationConfig,
) -> Result<Waypoint, MissionError> {
    Waypoint::validate_position(lat, lng)?;

    let alt = match provider.elevation(lat, lng).await {
        Ok(elevation) => {
            let derived = (elevation + config.safety_margin).min(config.max_altitude);
            debug!(
                "Terrain at ({:.4}, {:.4}) is {:.1} m, flying at {:.1} m",
                lat, lng, elevation, derived
            );
            derived
        }
        Err(e) => {
            warn!(
                "Elevation lookup failed for ({:.4}, {:.4}), using fallback: {}",
                lat, lng, e
            );
            config.fallback_altitude
        }
    };

    Ok(Waypoint { lat, lng, alt })
}
