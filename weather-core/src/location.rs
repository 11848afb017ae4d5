//! Startup location lookup.
//!
//! A [`LocationSource`] answers "where am I?" once. The default source is an
//! IP geolocation service; [`FixedLocation`] returns coordinates given on the
//! command line. Failures never reach the user: [`locate_once`] logs them and
//! leaves the session idle.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::{
    fmt::Debug,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::{debug, info, instrument, warn};

use crate::{error::LocationError, model::Coordinates};

/// Knobs for a single position request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationOptions {
    pub high_accuracy: bool,
    pub timeout_ms: u64,
    /// Oldest previous fix that may be reused; `0` always asks again.
    pub maximum_age_ms: u64,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self { high_accuracy: true, timeout_ms: 5000, maximum_age_ms: 0 }
    }
}

impl GeolocationOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn maximum_age(&self) -> Duration {
        Duration::from_millis(self.maximum_age_ms)
    }
}

#[async_trait]
pub trait LocationSource: Send + Sync + Debug {
    async fn current_position(
        &self,
        options: &GeolocationOptions,
    ) -> Result<Coordinates, LocationError>;
}

/// Always reports the same coordinates.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl LocationSource for FixedLocation {
    async fn current_position(
        &self,
        _options: &GeolocationOptions,
    ) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// IP geolocation against an ip-api.com compatible endpoint.
#[derive(Debug)]
pub struct IpApiLocator {
    endpoint: String,
    http: Client,
    last_fix: Mutex<Option<(Instant, Coordinates)>>,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    city: Option<String>,
}

impl IpApiLocator {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), http: Client::new(), last_fix: Mutex::new(None) }
    }

    fn cached(&self, maximum_age: Duration) -> Option<Coordinates> {
        if maximum_age.is_zero() {
            return None;
        }
        let guard = self.last_fix.lock().ok()?;
        (*guard).filter(|(at, _)| at.elapsed() <= maximum_age).map(|(_, coords)| coords)
    }

    fn remember(&self, coords: Coordinates) {
        if let Ok(mut guard) = self.last_fix.lock() {
            *guard = Some((Instant::now(), coords));
        }
    }
}

#[async_trait]
impl LocationSource for IpApiLocator {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn current_position(
        &self,
        options: &GeolocationOptions,
    ) -> Result<Coordinates, LocationError> {
        if let Some(coords) = self.cached(options.maximum_age()) {
            debug!(?coords, "reusing previous position fix");
            return Ok(coords);
        }
        if options.high_accuracy {
            debug!("high accuracy requested; IP lookup resolves to city level only");
        }

        let res = self
            .http
            .get(&self.endpoint)
            .timeout(options.timeout())
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = res.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(LocationError::PermissionDenied);
        }
        if !status.is_success() {
            return Err(LocationError::ServiceUnavailable(format!("status {status}")));
        }

        let parsed: IpApiResponse = res.json().await.map_err(map_transport_error)?;

        if parsed.status != "success" {
            return Err(LocationError::ServiceUnavailable(
                parsed.message.unwrap_or_else(|| parsed.status.clone()),
            ));
        }

        let (Some(latitude), Some(longitude)) = (parsed.lat, parsed.lon) else {
            return Err(LocationError::Other("response is missing coordinates".into()));
        };

        let coords = Coordinates::new(latitude, longitude);
        info!(
            lat = latitude,
            lon = longitude,
            city = parsed.city.as_deref().unwrap_or("?"),
            "geolocation resolution successful"
        );
        self.remember(coords);
        Ok(coords)
    }
}

fn map_transport_error(err: reqwest::Error) -> LocationError {
    if err.is_timeout() {
        LocationError::Timeout
    } else if err.is_connect() {
        LocationError::ServiceUnavailable(err.to_string())
    } else {
        LocationError::Other(err.to_string())
    }
}

/// One-shot startup lookup. `None` source means the capability is absent.
pub async fn locate_once(
    source: Option<&dyn LocationSource>,
    options: &GeolocationOptions,
) -> Option<Coordinates> {
    let Some(source) = source else {
        warn!("geolocation is not available; staying idle");
        return None;
    };

    match source.current_position(options).await {
        Ok(coords) => Some(coords),
        Err(e) => {
            warn!(error = %e, "error getting location");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Denied;

    #[async_trait]
    impl LocationSource for Denied {
        async fn current_position(
            &self,
            _options: &GeolocationOptions,
        ) -> Result<Coordinates, LocationError> {
            Err(LocationError::PermissionDenied)
        }
    }

    #[test]
    fn default_options_ask_for_a_fresh_accurate_fix() {
        let opts = GeolocationOptions::default();

        assert!(opts.high_accuracy);
        assert_eq!(opts.timeout(), Duration::from_secs(5));
        assert!(opts.maximum_age().is_zero());
    }

    #[tokio::test]
    async fn fixed_location_reports_its_coordinates() {
        let source: &dyn LocationSource = &FixedLocation(Coordinates::new(51.5, -0.12));
        let got = locate_once(Some(source), &GeolocationOptions::default()).await;

        assert_eq!(got, Some(Coordinates::new(51.5, -0.12)));
    }

    #[tokio::test]
    async fn missing_source_yields_nothing() {
        assert_eq!(locate_once(None, &GeolocationOptions::default()).await, None);
    }

    #[tokio::test]
    async fn failures_are_absorbed() {
        let source: &dyn LocationSource = &Denied;
        assert_eq!(locate_once(Some(source), &GeolocationOptions::default()).await, None);
    }

    #[test]
    fn zero_maximum_age_never_reuses_a_fix() {
        let locator = IpApiLocator::new("http://127.0.0.1:9/");
        locator.remember(Coordinates::new(1.0, 2.0));

        assert_eq!(locator.cached(Duration::ZERO), None);
        assert_eq!(locator.cached(Duration::from_secs(60)), Some(Coordinates::new(1.0, 2.0)));
    }
}
