use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use crate::error::ViewerError;
use crate::map::LocationPoint;
use crate::map::geocode::Geocoder;
use crate::map::route::Route;

/// Delay between jumping to the map slide and revealing the location.
pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(600);

/// How location names become map positions.
#[derive(Clone)]
pub enum Strategy {
    /// Look names up in the pre-registered route.
    FixedRoute,
    /// Ask an external service.
    Geocoding(Arc<dyn Geocoder>),
}

impl std::fmt::Debug for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FixedRoute => write!(f, "FixedRoute"),
            Self::Geocoding(_) => write!(f, "Geocoding"),
        }
    }
}

/// What the map should do about a resolved name.
#[derive(Debug)]
pub enum Lookup {
    /// Open the marker of route point `index`.
    RoutePoint(usize),
    /// Centre on a geocoded point and give it a marker.
    Found(LocationPoint),
    /// Not on the route; show the overview instead.
    NotOnRoute(ViewerError),
    /// The geocoder could not place it; leave the map alone.
    Failed(ViewerError),
}

struct PendingReveal {
    name: String,
    due: Instant,
}

type GeocodeReply = (u64, Result<LocationPoint, ViewerError>);

pub struct LocationResolver {
    strategy: Strategy,
    reveal_delay: Duration,
    pending: Option<PendingReveal>,
    generation: u64,
    in_flight: usize,
    replies_tx: Sender<GeocodeReply>,
    replies_rx: Receiver<GeocodeReply>,
}

impl LocationResolver {
    pub fn new(strategy: Strategy, reveal_delay: Duration) -> Self {
        let (replies_tx, replies_rx) = mpsc::channel();
        Self {
            strategy,
            reveal_delay,
            pending: None,
            generation: 0,
            in_flight: 0,
            replies_tx,
            replies_rx,
        }
    }

    /// Queue a reveal of `name`. A newer request replaces an unrevealed older one.
    pub fn schedule(&mut self, name: &str, now: Instant) {
        self.generation += 1;
        self.pending = Some(PendingReveal {
            name: name.trim().to_string(),
            due: now + self.reveal_delay,
        });
    }

    /// When the queued reveal fires, if any.
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }

    /// True while a reveal is queued or a geocode request is outstanding.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some() || self.in_flight > 0
    }

    /// Fire a due reveal and collect finished geocode replies.
    pub fn poll(&mut self, now: Instant, route: Option<&Route>) -> Vec<Lookup> {
        let mut out = Vec::new();

        if self.pending.as_ref().is_some_and(|p| p.due <= now) {
            if let Some(PendingReveal { name, .. }) = self.pending.take() {
                match self.strategy.clone() {
                    Strategy::FixedRoute => out.push(lookup_on_route(&name, route)),
                    Strategy::Geocoding(geocoder) => self.spawn_geocode(geocoder, name),
                }
            }
        }

        while let Ok((generation, reply)) = self.replies_rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            if generation != self.generation {
                crate::debug!("locate"; "dropping stale geocode reply");
                continue;
            }
            out.push(match reply {
                Ok(point) => Lookup::Found(point),
                Err(e) => Lookup::Failed(e),
            });
        }
        out
    }

    /// Resolve immediately on the calling thread.
    pub fn resolve_now(&self, name: &str, route: Option<&Route>) -> Result<LocationPoint, ViewerError> {
        match &self.strategy {
            Strategy::FixedRoute => {
                let route = route.ok_or_else(|| ViewerError::LocationNotPreDefined(name.to_string()))?;
                route
                    .find(name)
                    .and_then(|i| route.points().get(i))
                    .cloned()
                    .ok_or_else(|| ViewerError::LocationNotPreDefined(name.to_string()))
            }
            Strategy::Geocoding(geocoder) => geocoder.resolve(name),
        }
    }

    fn spawn_geocode(&mut self, geocoder: Arc<dyn Geocoder>, name: String) {
        let generation = self.generation;
        let replies = self.replies_tx.clone();
        crate::debug!("locate"; "geocoding `{name}`");
        let spawned = std::thread::Builder::new()
            .name("geocoder".to_string())
            .spawn(move || {
                let reply = geocoder.resolve(&name);
                replies.send((generation, reply)).ok();
            });
        match spawned {
            Ok(_) => self.in_flight += 1,
            Err(e) => crate::error!("locate"; "failed to start geocoder thread: {e}"),
        }
    }
}

fn lookup_on_route(name: &str, route: Option<&Route>) -> Lookup {
    match route.and_then(|r| r.find(name)) {
        Some(index) => Lookup::RoutePoint(index),
        None => Lookup::NotOnRoute(ViewerError::LocationNotPreDefined(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::LatLon;

    struct FakeGeocoder;

    impl Geocoder for FakeGeocoder {
        fn resolve(&self, name: &str) -> Result<LocationPoint, ViewerError> {
            match name {
                "Rome" => Ok(LocationPoint::new("Rome", LatLon::new(41.9, 12.5))),
                _ => Err(ViewerError::Geocode {
                    name: name.to_string(),
                    status: "ZERO_RESULTS".to_string(),
                }),
            }
        }
    }

    fn wait_for_replies(resolver: &mut LocationResolver, now: Instant) -> Vec<Lookup> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let out = resolver.poll(now, None);
            if !out.is_empty() || Instant::now() > deadline {
                return out;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_reveal_waits_for_delay() {
        let route = Route::first_journey();
        let t0 = Instant::now();
        let mut resolver = LocationResolver::new(Strategy::FixedRoute, DEFAULT_REVEAL_DELAY);
        resolver.schedule("Paphos, Cyprus", t0);
        assert!(resolver.is_busy());
        assert!(resolver.poll(t0 + Duration::from_millis(599), Some(&route)).is_empty());

        let out = resolver.poll(t0 + DEFAULT_REVEAL_DELAY, Some(&route));
        assert!(matches!(out.as_slice(), [Lookup::RoutePoint(3)]));
        assert!(!resolver.is_busy());
    }

    #[test]
    fn test_newer_request_replaces_pending() {
        let route = Route::first_journey();
        let t0 = Instant::now();
        let mut resolver = LocationResolver::new(Strategy::FixedRoute, Duration::ZERO);
        resolver.schedule("Perga", t0);
        resolver.schedule("Derbe", t0);
        let out = resolver.poll(t0, Some(&route));
        assert!(matches!(out.as_slice(), [Lookup::RoutePoint(8)]));
    }

    #[test]
    fn test_unknown_name_falls_back() {
        let route = Route::first_journey();
        let t0 = Instant::now();
        let mut resolver = LocationResolver::new(Strategy::FixedRoute, Duration::ZERO);
        resolver.schedule("Nowhere", t0);
        let out = resolver.poll(t0, Some(&route));
        assert!(matches!(
            out.as_slice(),
            [Lookup::NotOnRoute(ViewerError::LocationNotPreDefined(name))] if name == "Nowhere"
        ));
    }

    #[test]
    fn test_geocoding_on_worker() {
        let t0 = Instant::now();
        let mut resolver =
            LocationResolver::new(Strategy::Geocoding(Arc::new(FakeGeocoder)), Duration::ZERO);
        resolver.schedule("Rome", t0);
        let out = wait_for_replies(&mut resolver, t0);
        assert!(matches!(out.as_slice(), [Lookup::Found(p)] if p.name == "Rome"));
        assert!(!resolver.is_busy());

        resolver.schedule("Atlantis", t0);
        let out = wait_for_replies(&mut resolver, t0);
        assert!(matches!(out.as_slice(), [Lookup::Failed(ViewerError::Geocode { .. })]));
    }

    #[test]
    fn test_resolve_now() {
        let route = Route::first_journey();
        let resolver = LocationResolver::new(Strategy::FixedRoute, DEFAULT_REVEAL_DELAY);
        let point = resolver.resolve_now("Antioch, Syria", Some(&route)).unwrap();
        assert_eq!(point.coordinates, LatLon::new(36.2021, 36.1511));
        assert!(matches!(
            resolver.resolve_now("Nowhere", Some(&route)),
            Err(ViewerError::LocationNotPreDefined(_))
        ));
    }
}
