use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::{
    Config,
    error::FetchError,
    model::{WeatherQuery, WeatherRecord, format_local_clock, format_local_date},
};

use super::WeatherProvider;

/// OpenWeather "current weather" client, metric units.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Build from config. A missing key is not an error here: the provider
    /// rejects the request and the session shows its error phase.
    pub fn from_config(config: &Config) -> Self {
        let api_key = match config.api_key() {
            Some(key) => key.to_owned(),
            None => {
                warn!(
                    "No OpenWeather API key configured; requests will be rejected. \
                     Hint: run `weather configure` or set OPENWEATHER_API_KEY."
                );
                String::new()
            }
        };

        Self::new(api_key, config.base_url.clone())
    }

    fn query_params(&self, query: &WeatherQuery) -> Vec<(&'static str, String)> {
        let mut params = match query {
            WeatherQuery::Coordinates(c) => {
                vec![("lat", c.latitude.to_string()), ("lon", c.longitude.to_string())]
            }
            WeatherQuery::Name(name) => vec![("q", name.clone())],
        };
        params.push(("APPID", self.api_key.clone()));
        params.push(("units", "metric".to_string()));
        params
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self))]
    async fn current_weather(&self, query: &WeatherQuery) -> Result<WeatherRecord, FetchError> {
        let url = format!("{}/weather", self.base_url);

        let res = self.http.get(&url).query(&self.query_params(query)).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            debug!(%status, "OpenWeather current request failed");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        normalize(&body)
    }
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: String,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    temp_max: f64,
    temp_min: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    timezone: i64,
    sys: OwSys,
    weather: Vec<OwWeather>,
    main: OwMain,
    clouds: OwClouds,
    wind: OwWind,
}

/// Turn a "current weather" JSON body into a [`WeatherRecord`].
///
/// Every field is required; times are shifted by the response's `timezone`
/// offset and rendered as UTC.
pub fn normalize(body: &str) -> Result<WeatherRecord, FetchError> {
    let parsed: OwCurrentResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let weather = parsed
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::Malformed("response contained no weather entry".into()))?;

    let clock = |ts: i64, what: &str| {
        format_local_clock(ts, parsed.timezone)
            .ok_or_else(|| FetchError::Malformed(format!("{what} timestamp out of range")))
    };

    let current_time = clock(parsed.dt, "dt")?;
    let sunrise = clock(parsed.sys.sunrise, "sunrise")?;
    let sunset = clock(parsed.sys.sunset, "sunset")?;
    let current_date = format_local_date(parsed.dt, parsed.timezone)
        .ok_or_else(|| FetchError::Malformed("dt timestamp out of range".into()))?;

    Ok(WeatherRecord {
        city: parsed.name,
        country: parsed.sys.country,
        current_date,
        current_time,
        description: weather.description,
        main: weather.main,
        temp: parsed.main.temp,
        highest_temp: parsed.main.temp_max,
        lowest_temp: parsed.main.temp_min,
        sunrise,
        sunset,
        clouds: parsed.clouds.all,
        humidity: parsed.main.humidity,
        wind: parsed.wind.speed,
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
