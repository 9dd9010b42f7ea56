//! Location and weather directives
//!
//! Location comes from an IP geolocation lookup, weather from Open-Meteo
//! for that location. Both return JSON text and also store the parsed
//! value in the context.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::readers::fetch_json;
use crate::directive::{Directive, DirectiveOutput, Scope};
use crate::error::DirectiveError;
use crate::grammar::Token;

const GEOLOCATION_URL: &str = "https://get.geojs.io/v1/ip/geo.json";
const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Context key holding the parsed geolocation
const LOCATION_DATA_KEY: &str = "locationData";

#[derive(Debug, Clone, Deserialize)]
struct GeoLocation {
    #[serde(default)]
    city: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    country: String,
    latitude: String,
    longitude: String,
}

impl GeoLocation {
    fn label(&self) -> String {
        [&self.city, &self.region, &self.country]
            .into_iter()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Geolocation from the context when already fetched, else from the network
async fn locate(scope: &Scope<'_>) -> Result<(GeoLocation, Value), DirectiveError> {
    let raw = match scope.context.get(LOCATION_DATA_KEY) {
        Some(value) => value.clone(),
        None => fetch_json(scope.env, GEOLOCATION_URL).await?,
    };
    let location: GeoLocation = serde_json::from_value(raw.clone())
        .map_err(|e| DirectiveError::unavailable(format!("geolocation response: {e}")))?;
    Ok((location, raw))
}

/// `{{location}}`
pub struct Location;

#[async_trait]
impl Directive for Location {
    fn name(&self) -> &str {
        "location"
    }

    fn description(&self) -> &str {
        "Approximate location (city, region, country)"
    }

    fn result_keys(&self) -> &[&'static str] {
        &["location"]
    }

    fn constant(&self) -> bool {
        true
    }

    async fn apply(&self, _token: &Token, scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        debug!("Location::apply: called");
        let (location, raw) = locate(scope).await?;
        Ok(DirectiveOutput::keyed("location", location.label()).with_field(LOCATION_DATA_KEY, raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Forecast {
    Current,
    Week,
}

/// `{{currentWeather}}` and `{{weekWeather}}`
pub struct Weather {
    forecast: Forecast,
}

impl Weather {
    pub fn current() -> Self {
        Self {
            forecast: Forecast::Current,
        }
    }

    pub fn week() -> Self {
        Self {
            forecast: Forecast::Week,
        }
    }

    fn url(&self, location: &GeoLocation, fahrenheit: bool) -> String {
        let unit = if fahrenheit { "fahrenheit" } else { "celsius" };
        let query = match self.forecast {
            Forecast::Current => "current=temperature_2m,apparent_temperature,relative_humidity_2m,precipitation,weather_code,wind_speed_10m",
            Forecast::Week => "daily=weather_code,temperature_2m_max,temperature_2m_min,precipitation_sum,precipitation_probability_max",
        };
        format!(
            "{FORECAST_URL}?latitude={}&longitude={}&{query}&temperature_unit={unit}&timezone=auto",
            location.latitude, location.longitude
        )
    }
}

#[async_trait]
impl Directive for Weather {
    fn name(&self) -> &str {
        match self.forecast {
            Forecast::Current => "currentWeather",
            Forecast::Week => "weekWeather",
        }
    }

    fn description(&self) -> &str {
        match self.forecast {
            Forecast::Current => "Current weather at the approximate location, as JSON",
            Forecast::Week => "Seven-day forecast at the approximate location, as JSON",
        }
    }

    fn result_keys(&self) -> &[&'static str] {
        match self.forecast {
            Forecast::Current => &["currentWeather"],
            Forecast::Week => &["weekWeather"],
        }
    }

    fn constant(&self) -> bool {
        true
    }

    async fn apply(&self, token: &Token, scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        debug!(forecast = ?self.forecast, "Weather::apply: called");
        let (location, raw_location) = locate(scope).await?;
        let fahrenheit = token.args.get("unit").is_some_and(|u| u.eq_ignore_ascii_case("fahrenheit"));

        let response = fetch_json(scope.env, &self.url(&location, fahrenheit)).await?;
        let section = match self.forecast {
            Forecast::Current => response.get("current"),
            Forecast::Week => response.get("daily"),
        }
        .cloned()
        .ok_or_else(|| DirectiveError::unavailable("forecast response had no data"))?;

        Ok(DirectiveOutput::text(section.to_string())
            .with_field(self.name(), section)
            .with_field(LOCATION_DATA_KEY, raw_location))
    }
}
