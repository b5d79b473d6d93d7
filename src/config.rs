use anyhow::Result;
use config;
use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::mission::waypoint::Waypoint;

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

#[derive(Debug, Deserialize)]
pub struct Config {
    pub general: GeneralConfig,
    pub planner: PlannerConfig,
    pub elevation: ElevationConfig,
    pub dispatch: DispatchConfig,
    pub web: WebConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    pub log_level: String,
    pub vehicle_id: String,
}

#[derive(Debug, Deserialize)]
pub struct PlannerConfig {
    pub start_lat: f64,
    pub start_lng: f64,
    pub start_alt: f64,
    pub default_altitude: f64,
}

impl PlannerConfig {
    /// Launch point of the vehicle; fixed for the lifetime of a run.
    pub fn start(&self) -> Waypoint {
        Waypoint {
            lat: self.start_lat,
            lng: self.start_lng,
            alt: self.start_alt,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ElevationConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub safety_margin: f64,
    pub max_altitude: f64,
    pub fallback_altitude: f64,
}

#[derive(Debug, Deserialize)]
pub struct DispatchConfig {
    pub port: String,
    pub baud_rate: u32,
}

#[derive(Debug, Deserialize)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env = std::env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        let config_path = format!("config/{}.toml", env);
        let fallback_path = format!("/etc/skyroute/{}.toml", env);

        let path = if std::path::Path::new(&config_path).exists() {
            config_path
        } else {
            fallback_path
        };
        Self::load_from(std::path::Path::new(&path))
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?;
        let config = settings.try_deserialize()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_dev_config() -> Result<()> {
        let config = Config::load()?;
        assert_eq!(config.planner.default_altitude, 50.0);
        assert_eq!(config.elevation.fallback_altitude, 10.0);
        assert_eq!(config.dispatch.baud_rate, 115200);
        Ok(())
    }

    #[test]
    fn test_start_location() -> Result<()> {
        let config = Config::load()?;
        let start = config.planner.start();
        assert_eq!(start.lat, 33.6844);
        assert_eq!(start.lng, 73.0479);
        assert_eq!(start.alt, 100.0);
        Ok(())
    }

    #[test]
    fn test_load_from_explicit_path() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bench.toml");
        std::fs::write(
            &path,
            r#"
[general]
log_level = "debug"
vehicle_id = "bench-rig"

[planner]
start_lat = 0.0
start_lng = 0.0
start_alt = 0.0
default_altitude = 40.0

[elevation]
endpoint = "http://127.0.0.1:9/API/astergdem"
timeout_secs = 1
safety_margin = 5.0
max_altitude = 100.0
fallback_altitude = 10.0

[dispatch]
port = "/dev/ttyUSB7"
baud_rate = 57600

[web]
host = "127.0.0.1"
port = 8099
"#,
        )?;

        let config = Config::load_from(&path)?;
        assert_eq!(config.general.vehicle_id, "bench-rig");
        assert_eq!(config.planner.default_altitude, 40.0);
        assert_eq!(config.dispatch.port, "/dev/ttyUSB7");
        assert_eq!(config.dispatch.baud_rate, 57600);
        Ok(())
    }
}
