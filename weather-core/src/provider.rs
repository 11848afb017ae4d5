use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::FetchError,
    model::{Coordinates, WeatherQuery, WeatherRecord},
};

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// Source of current conditions. Both query kinds share one normalization.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_weather(&self, query: &WeatherQuery) -> Result<WeatherRecord, FetchError>;

    async fn by_coordinates(&self, coords: Coordinates) -> Result<WeatherRecord, FetchError> {
        self.current_weather(&WeatherQuery::Coordinates(coords)).await
    }

    async fn by_name(&self, name: &str) -> Result<WeatherRecord, FetchError> {
        self.current_weather(&WeatherQuery::Name(name.to_owned())).await
    }
}
