//! OpenWeather 5-day / 3-hour forecast client.
//!
//! `GET {base}/data/2.5/forecast?q={city}&appid={key}&units=metric`

use std::time::Duration;

use flightwatch_core::{
  ProviderError,
  provider::{ForecastResponse, WeatherLookup, WeatherProvider},
};
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use crate::{
  Result,
  http::{build_client, error_detail, join, parse_base},
};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

const PROVIDER: &str = "OpenWeather";

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
  client:   Client,
  endpoint: Url,
  api_key:  String,
}

impl OpenWeatherClient {
  pub fn new(
    base_url: &str,
    api_key: impl Into<String>,
    timeout: Option<Duration>,
  ) -> Result<Self> {
    let base = parse_base(base_url)?;
    Ok(Self {
      client:   build_client(timeout)?,
      endpoint: join(&base, &["data", "2.5", "forecast"]),
      api_key:  api_key.into(),
    })
  }
}

impl WeatherProvider for OpenWeatherClient {
  async fn forecast(&self, city: String) -> Result<WeatherLookup, ProviderError> {
    debug!(%city, "querying OpenWeather forecast");

    let resp = self
      .client
      .get(self.endpoint.clone())
      .query(&[
        ("q", city.as_str()),
        ("appid", self.api_key.as_str()),
        ("units", "metric"),
      ])
      .send()
      .await
      .map_err(|e| ProviderError::Transport {
        provider: PROVIDER,
        message:  e.to_string(),
      })?;

    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
      return Ok(WeatherLookup::NotFound);
    }
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Ok(WeatherLookup::Rejected {
        status: status.as_u16(),
        detail: error_detail(&body),
      });
    }

    let body: ForecastResponse = resp.json().await.map_err(|e| ProviderError::Decode {
      provider: PROVIDER,
      message:  e.to_string(),
    })?;
    Ok(WeatherLookup::Forecast(body))
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
  };

  use super::*;

  fn client(server: &MockServer) -> OpenWeatherClient {
    OpenWeatherClient::new(&server.uri(), "wx-key", None).unwrap()
  }

  #[tokio::test]
  async fn forecast_decodes_city_and_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/data/2.5/forecast"))
      .and(query_param("q", "New York"))
      .and(query_param("appid", "wx-key"))
      .and(query_param("units", "metric"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "cod": "200",
        "list": [
          { "dt": 1718539200, "dt_txt": "2024-06-16 12:00:00", "main": { "temp": 24.5 } }
        ],
        "city": {
          "name": "New York",
          "coord": { "lat": 40.7143, "lon": -74.006 },
          "country": "US",
          "sunrise": 1718443800,
          "sunset": 1718498400,
          "timezone": -14400
        }
      })))
      .expect(1)
      .mount(&server)
      .await;

    let lookup = client(&server).forecast("New York".into()).await.unwrap();
    let WeatherLookup::Forecast(forecast) = lookup else { panic!("expected forecast") };
    assert_eq!(forecast.city.name, "New York");
    assert_eq!(forecast.city.country.as_deref(), Some("US"));
    assert_eq!(forecast.list.len(), 1);
    assert_eq!(forecast.list[0].dt_txt, "2024-06-16 12:00:00");
    assert_eq!(forecast.list[0].fields["main"]["temp"], 24.5);
  }

  #[tokio::test]
  async fn unknown_city_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(
        ResponseTemplate::new(404).set_body_json(json!({ "cod": "404", "message": "city not found" })),
      )
      .mount(&server)
      .await;

    let lookup = client(&server).forecast("Atlantis".into()).await.unwrap();
    assert!(matches!(lookup, WeatherLookup::NotFound));
  }

  #[tokio::test]
  async fn other_statuses_are_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(
        ResponseTemplate::new(401).set_body_json(json!({ "cod": 401, "message": "Invalid API key" })),
      )
      .mount(&server)
      .await;

    match client(&server).forecast("Paris".into()).await.unwrap() {
      WeatherLookup::Rejected { status, detail } => {
        assert_eq!(status, 401);
        assert_eq!(detail, "Invalid API key");
      }
      other => panic!("expected rejection, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "list": [] })))
      .mount(&server)
      .await;

    let err = client(&server).forecast("Paris".into()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Decode { .. }));
  }
}
