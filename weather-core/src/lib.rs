//! Core library for the `weather` lookup app.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather "current weather" client and its normalization
//! - Startup location lookup
//! - The search session: query text, display phase and request sequencing
//!
//! It is used by `weather-cli`, but can also be reused by other front ends.

pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod provider;
pub mod session;

pub use config::Config;
pub use error::{FetchError, LocationError, ValidationError};
pub use location::{FixedLocation, GeolocationOptions, IpApiLocator, LocationSource, locate_once};
pub use model::{Coordinates, WeatherIcon, WeatherQuery, WeatherRecord};
pub use provider::{OpenWeatherProvider, WeatherProvider};
pub use session::{FetchOutcome, Phase, PendingFetch, Session, fetch};
