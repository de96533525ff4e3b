use serde::Deserialize;

use super::{LatLon, LocationPoint};
use crate::error::ViewerError;

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Resolves a free-text place name to coordinates.
pub trait Geocoder: Send + Sync {
    fn resolve(&self, name: &str) -> Result<LocationPoint, ViewerError>;
}

/// Client for a Nominatim-compatible `/search` endpoint.
pub struct NominatimGeocoder {
    endpoint: String,
    user_agent: String,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

impl NominatimGeocoder {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            user_agent: format!("slidemap/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Geocoder for NominatimGeocoder {
    fn resolve(&self, name: &str) -> Result<LocationPoint, ViewerError> {
        let failed = |status: String| ViewerError::Geocode {
            name: name.to_string(),
            status,
        };

        let body = ureq::get(&self.endpoint)
            .header("User-Agent", &self.user_agent)
            .query("q", name)
            .query("format", "json")
            .query("limit", "1")
            .call()
            .map_err(|e| failed(e.to_string()))?
            .body_mut()
            .read_to_string()
            .map_err(|e| failed(e.to_string()))?;

        parse_response(name, &body)
    }
}

/// Take the first hit of a search response.
fn parse_response(name: &str, body: &str) -> Result<LocationPoint, ViewerError> {
    let failed = |status: String| ViewerError::Geocode {
        name: name.to_string(),
        status,
    };
    let hits: Vec<SearchHit> =
        serde_json::from_str(body).map_err(|e| failed(format!("invalid response: {e}")))?;
    let hit = hits
        .into_iter()
        .next()
        .ok_or_else(|| failed("ZERO_RESULTS".to_string()))?;
    let lat = hit.lat.parse::<f64>().map_err(|e| failed(format!("bad latitude: {e}")))?;
    let lon = hit.lon.parse::<f64>().map_err(|e| failed(format!("bad longitude: {e}")))?;

    let mut point = LocationPoint::new(name, LatLon::new(lat, lon));
    if let Some(display) = hit.display_name.filter(|d| d != name) {
        point = point.with_note(display);
    }
    Ok(point)
}
