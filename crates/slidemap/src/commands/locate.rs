use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;

use crate::config::{Backend, Config};
use crate::locate::{LocationResolver, Strategy};
use crate::map::LocationPoint;
use crate::map::geocode::NominatimGeocoder;
use crate::map::route::Route;

pub fn run(name: &str, backend: Option<Backend>) -> Result<()> {
    let config = Config::load_or_default();
    let point = locate(name, backend.unwrap_or(config.backend()), &config)?;

    println!("{} {}", point.name.bold(), point.coordinates.to_string().green());
    if let Some(note) = &point.note {
        println!("  {}", note.dimmed());
    }
    Ok(())
}

/// Resolve `name` the way a location link would, without waiting for a reveal.
fn locate(name: &str, backend: Backend, config: &Config) -> Result<LocationPoint> {
    let strategy = strategy_for(backend, config);
    let route = matches!(backend, Backend::FixedRoute).then(Route::first_journey);

    crate::debug!("locate"; "resolving `{name}` via {backend}");
    let resolver = LocationResolver::new(strategy, config.reveal_delay());
    Ok(resolver.resolve_now(name, route.as_ref())?)
}

/// Build the resolution strategy for `backend` from configuration.
pub fn strategy_for(backend: Backend, config: &Config) -> Strategy {
    match backend {
        Backend::FixedRoute => Strategy::FixedRoute,
        Backend::Geocoding => {
            Strategy::Geocoding(Arc::new(NominatimGeocoder::new(config.geocoder_url())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_for_backend() {
        let config = Config::default();
        assert!(matches!(
            strategy_for(Backend::FixedRoute, &config),
            Strategy::FixedRoute
        ));
        assert!(matches!(
            strategy_for(Backend::Geocoding, &config),
            Strategy::Geocoding(_)
        ));
    }

    #[test]
    fn test_locate_on_route() {
        let config = Config::default();
        let point = locate("Iconium", Backend::FixedRoute, &config).unwrap();
        assert_eq!(point.name, "Iconium");

        let err = locate("Nowhere", Backend::FixedRoute, &config).unwrap_err();
        assert!(err.to_string().contains("Nowhere"));
    }
}
