//! HTTP clients for the third-party providers Flightwatch depends on.
//!
//! [`AeroApiClient`] implements [`flightwatch_core::provider::FlightDataProvider`]
//! against FlightAware AeroAPI; [`OpenWeatherClient`] implements
//! [`flightwatch_core::provider::WeatherProvider`] against the OpenWeather
//! 5-day forecast endpoint.

pub mod aeroapi;
pub mod error;
mod http;
pub mod openweather;

pub use aeroapi::AeroApiClient;
pub use error::{Error, Result};
pub use openweather::OpenWeatherClient;
