use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Geographic position in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// What to ask the provider for.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherQuery {
    Coordinates(Coordinates),
    Name(String),
}

/// Normalized current conditions for one location.
///
/// Built wholesale from a single provider response; there is no way to
/// assemble one field by field outside of the provider module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub city: String,
    pub country: String,
    /// "Weekday, Day Month" in the location's local time.
    pub current_date: String,
    /// 12-hour "h:mm AM" in the location's local time.
    pub current_time: String,
    pub description: String,
    /// Provider category, e.g. "Rain", "Clear", "Clouds".
    pub main: String,
    pub temp: f64,
    pub highest_temp: f64,
    pub lowest_temp: f64,
    pub sunrise: String,
    pub sunset: String,
    pub clouds: u8,
    pub humidity: u8,
    pub wind: f64,
}

impl WeatherRecord {
    pub fn icon(&self) -> WeatherIcon {
        WeatherIcon::for_category(&self.main)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherIcon {
    Bolt,
    LightRain,
    HeavyRain,
    Snowflake,
    Sun,
    Cloud,
    Haze,
}

impl WeatherIcon {
    /// Every category maps to an icon; unknown ones fall back to haze.
    pub fn for_category(main: &str) -> Self {
        match main {
            "Thunderstorm" => Self::Bolt,
            "Drizzle" => Self::LightRain,
            "Rain" => Self::HeavyRain,
            "Snow" => Self::Snowflake,
            "Clear" => Self::Sun,
            "Clouds" => Self::Cloud,
            _ => Self::Haze,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bolt => "bolt",
            Self::LightRain => "light_rain",
            Self::HeavyRain => "heavy_rain",
            Self::Snowflake => "snowflake",
            Self::Sun => "sun",
            Self::Cloud => "cloud",
            Self::Haze => "haze",
        }
    }
}

impl std::fmt::Display for WeatherIcon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formats a unix timestamp shifted by `offset_secs` as "Tuesday, 14 October".
///
/// Returns `None` when the shifted timestamp is out of chrono's range.
pub fn format_local_date(ts: i64, offset_secs: i64) -> Option<String> {
    let shifted = DateTime::from_timestamp(ts.checked_add(offset_secs)?, 0)?;
    Some(shifted.format("%A, %-d %B").to_string())
}

/// Formats a unix timestamp shifted by `offset_secs` as "6:05 PM".
pub fn format_local_clock(ts: i64, offset_secs: i64) -> Option<String> {
    let shifted = DateTime::from_timestamp(ts.checked_add(offset_secs)?, 0)?;
    Some(shifted.format("%-I:%M %p").to_string())
}
