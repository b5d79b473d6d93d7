use std::time::Duration;

use anyhow::Result;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::config::CONFIG;
use crate::error::MissionError;

/// Terrain elevation capability: coordinate in, elevation estimate out.
///
/// Every failure mode (transport, timeout, bad status, malformed body) maps
/// to `ElevationUnavailable`; the fallback-altitude policy lives at the call
/// site, not here.
#[allow(async_fn_in_trait)]
pub trait ElevationProvider: Send + Sync {
    async fn elevation(&self, lat: f64, lng: f64) -> Result<f64, MissionError>;
}

static PROVIDER: Lazy<OpenTopoClient> = Lazy::new(|| {
    OpenTopoClient::new(
        &CONFIG.elevation.endpoint,
        Duration::from_secs(CONFIG.elevation.timeout_secs),
    )
    .expect("Failed to build elevation client")
});

pub fn provider() -> &'static OpenTopoClient {
    &PROVIDER
}

/// OpenTopography ASTER GDEM client, AAIGrid output format.
pub struct OpenTopoClient {
    client: reqwest::Client,
    endpoint: String,
}

impl OpenTopoClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

impl ElevationProvider for OpenTopoClient {
    async fn elevation(&self, lat: f64, lng: f64) -> Result<f64, MissionError> {
        let url = format!(
            "{}?demtype=ASTERGDEMV3&south={}&north={}&west={}&east={}&outputFormat=AAIGrid",
            self.endpoint,
            lat - 0.001,
            lat + 0.001,
            lng - 0.001,
            lng + 0.001
        );
        debug!("Querying elevation: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MissionError::ElevationUnavailable(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(MissionError::ElevationUnavailable(format!(
                "service returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| MissionError::ElevationUnavailable(format!("body read failed: {e}")))?;
        parse_aaigrid(&body)
    }
}

/// Pulls the first grid value out of an AAIGrid response: six header lines
/// (ncols, nrows, corner, cell size, nodata), data rows after.
pub fn parse_aaigrid(body: &str) -> Result<f64, MissionError> {
    let line = body.lines().nth(6).ok_or_else(|| {
        MissionError::ElevationUnavailable("truncated AAIGrid response".to_string())
    })?;
    let value = line.split_whitespace().next().ok_or_else(|| {
        MissionError::ElevationUnavailable("empty AAIGrid data row".to_string())
    })?;
    value
        .parse::<f64>()
        .map_err(|e| MissionError::ElevationUnavailable(format!("bad elevation value: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_GRID: &str = "ncols 4\n\
                               nrows 4\n\
                               xllcorner 73.0469\n\
                               yllcorner 33.6834\n\
                               cellsize 0.000277\n\
                               NODATA_value -9999\n\
                               512 513 514 515\n\
                               516 517 518 519\n";

    #[test]
    fn test_parse_aaigrid() -> anyhow::Result<()> {
        assert_eq!(parse_aaigrid(SAMPLE_GRID)?, 512.0);
        Ok(())
    }

    #[test]
    fn test_parse_truncated_body() {
        let result = parse_aaigrid("ncols 4\nnrows 4\n");
        assert!(matches!(
            result,
            Err(MissionError::ElevationUnavailable(_))
        ));
    }

    #[test]
    fn test_parse_non_numeric_value() {
        let body = "a\nb\nc\nd\ne\nf\nnot-a-number\n";
        assert!(parse_aaigrid(body).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unavailable() -> anyhow::Result<()> {
        // Port 9 (discard) refuses the connection immediately.
        let client = OpenTopoClient::new("http://127.0.0.1:9/API/astergdem", Duration::from_secs(1))?;
        let result = client.elevation(33.6844, 73.0479).await;
        assert!(matches!(
            result,
            Err(MissionError::ElevationUnavailable(_))
        ));
        Ok(())
    }
}
