//! Weather tool - OpenWeatherMap current weather

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::traits::Tool;
use crate::error::{Error, Result};

pub const NAME: &str = "Weather";
pub const DESCRIPTION: &str = "Useful for when you need to answer questions about weather.";
pub const DEFAULT_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    #[serde(default)]
    weather: Vec<Condition>,
    main: MainReadings,
    #[serde(default)]
    wind: Option<Wind>,
    #[serde(default)]
    clouds: Option<Clouds>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: u32,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: f64,
    #[serde(default)]
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Clouds {
    all: u32,
}

/// Current-weather tool
pub struct WeatherTool {
    client: Client,
    endpoint: String,
    api_key: SecretString,
}

impl WeatherTool {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: SecretString) -> Self {
        WeatherTool {
            client,
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

fn format_report(location: &str, report: &WeatherResponse) -> String {
    let status = report
        .weather
        .first()
        .map(|c| c.description.as_str())
        .unwrap_or("unknown");

    let mut lines = vec![
        format!("In {}, the current weather is as follows:", location),
        format!("Detailed status: {}", status),
    ];
    if let Some(ref wind) = report.wind {
        match wind.deg {
            Some(deg) => lines.push(format!("Wind speed: {} m/s, direction: {}°", wind.speed, deg)),
            None => lines.push(format!("Wind speed: {} m/s", wind.speed)),
        }
    }
    lines.push(format!("Humidity: {}%", report.main.humidity));
    lines.push("Temperature:".to_string());
    lines.push(format!("  - Current: {}°C", report.main.temp));
    lines.push(format!("  - High: {}°C", report.main.temp_max));
    lines.push(format!("  - Low: {}°C", report.main.temp_min));
    lines.push(format!("  - Feels like: {}°C", report.main.feels_like));
    if let Some(ref clouds) = report.clouds {
        lines.push(format!("Cloud cover: {}%", clouds.all));
    }
    lines.join("\n")
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    async fn invoke(&self, query: &str) -> Result<String> {
        let location = query.trim();
        let url = Url::parse_with_params(
            &self.endpoint,
            &[("q", location), ("appid", self.api_key.expose_secret()), ("units", "metric")],
        )?;

        debug!("Weather lookup: {}", location);
        let response = self.client.get(url).send().await.map_err(|e| e.without_url())?;

        match response.status() {
            status if status.is_success() => {
                let report: WeatherResponse = response.json().await.map_err(|e| {
                    Error::Provider(format!("Failed to parse weather response: {}", e.without_url()))
                })?;
                Ok(format_report(location, &report))
            }
            StatusCode::NOT_FOUND => Ok(format!("No weather data found for {}", location)),
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(Error::Provider(format!(
                    "OpenWeatherMap failed with status {}: {}",
                    status, text
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_formats_report() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "London"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "London",
                "weather": [{"description": "light rain"}],
                "main": {"temp": 11.5, "feels_like": 10.2, "temp_min": 9.0, "temp_max": 13.0, "humidity": 81},
                "wind": {"speed": 4.1, "deg": 230},
                "clouds": {"all": 90}
            })))
            .mount(&server)
            .await;

        let tool = WeatherTool::new(Client::new(), server.uri(), "owm".to_string().into());
        let report = tool.invoke("London").await.unwrap();

        assert!(report.starts_with("In London, the current weather is as follows:"));
        assert!(report.contains("Detailed status: light rain"));
        assert!(report.contains("  - Current: 11.5°C"));
        assert!(report.contains("Humidity: 81%"));
        assert!(report.contains("Cloud cover: 90%"));
    }

    #[tokio::test]
    async fn test_unknown_location() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "cod": "404", "message": "city not found"
            })))
            .mount(&server)
            .await;

        let tool = WeatherTool::new(Client::new(), server.uri(), "owm".to_string().into());
        assert_eq!(
            tool.invoke("Atlantis").await.unwrap(),
            "No weather data found for Atlantis"
        );
    }
}
