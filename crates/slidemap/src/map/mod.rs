pub mod canvas;
pub mod geocode;
pub mod projection;
pub mod route;
pub mod tiles;

use serde::{Deserialize, Serialize};

/// Latitude/longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl std::fmt::Display for LatLon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lon)
    }
}

/// A named place that can carry a marker and a popup.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPoint {
    pub name: String,
    pub coordinates: LatLon,
    pub note: Option<String>,
}

impl LocationPoint {
    pub fn new(name: impl Into<String>, coordinates: LatLon) -> Self {
        Self {
            name: name.into(),
            coordinates,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Everything shown in the popup: the name, then the note.
    pub fn popup_text(&self) -> String {
        match &self.note {
            Some(note) => format!("{}\n{note}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Axis-aligned lat/lon box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub fn around(points: impl IntoIterator<Item = LatLon>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = Self {
            south: first.lat,
            west: first.lon,
            north: first.lat,
            east: first.lon,
        };
        for p in points {
            bounds.south = bounds.south.min(p.lat);
            bounds.north = bounds.north.max(p.lat);
            bounds.west = bounds.west.min(p.lon);
            bounds.east = bounds.east.max(p.lon);
        }
        Some(bounds)
    }

    pub fn center(&self) -> LatLon {
        LatLon::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }
}

pub type MarkerId = usize;

/// Capabilities the viewer needs from a map widget.
pub trait MapBackend {
    /// Build the widget. Called at most once per session.
    fn create(&mut self, center: LatLon, zoom: f64);
    fn set_view(&mut self, center: LatLon, zoom: f64);
    fn fit_bounds(&mut self, bounds: Bounds);
    fn add_marker(&mut self, point: &LocationPoint) -> MarkerId;
    fn draw_route(&mut self, points: &[LatLon]);
    /// Open `marker`'s popup, closing any other.
    fn open_popup(&mut self, marker: MarkerId);
    fn close_popup(&mut self);
}

/// Starting view before anything is revealed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapDefaults {
    pub center: LatLon,
    pub zoom: f64,
    pub reveal_zoom: f64,
}

impl Default for MapDefaults {
    fn default() -> Self {
        // Eastern Mediterranean, wide enough for the whole route
        Self {
            center: LatLon::new(36.5, 33.0),
            zoom: 6.0,
            reveal_zoom: 8.0,
        }
    }
}

/// Owns a backend and constructs it lazily, exactly once.
pub struct MapAdapter<B: MapBackend> {
    backend: B,
    defaults: MapDefaults,
    route: Option<route::Route>,
    markers: Vec<MarkerId>,
    /// Markers added for places off the route, by name.
    placed: Vec<(String, MarkerId)>,
    initialized: bool,
}

impl<B: MapBackend> MapAdapter<B> {
    /// `route` is `Some` for the fixed-route map, `None` when places are geocoded.
    pub fn new(backend: B, defaults: MapDefaults, route: Option<route::Route>) -> Self {
        Self {
            backend,
            defaults,
            route,
            markers: Vec::new(),
            placed: Vec::new(),
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn route(&self) -> Option<&route::Route> {
        self.route.as_ref()
    }

    /// Build the map on first call; later calls do nothing.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        self.backend.create(self.defaults.center, self.defaults.zoom);

        let Some(route) = &self.route else {
            crate::debug!("map"; "map created without a fixed route");
            return;
        };
        let line: Vec<LatLon> = route.line().collect();
        self.backend.draw_route(&line);
        self.markers = route
            .points()
            .iter()
            .map(|p| self.backend.add_marker(p))
            .collect();
        if let Some(bounds) = route.bounds() {
            self.backend.fit_bounds(bounds);
        }
        crate::debug!("map"; "route drawn with {} markers", self.markers.len());
    }

    /// Centre on route point `index` and open its popup.
    pub fn reveal_route_point(&mut self, index: usize) {
        self.initialize();
        let (Some(route), Some(&marker)) = (&self.route, self.markers.get(index)) else {
            return;
        };
        let Some(point) = route.points().get(index) else {
            return;
        };
        self.backend
            .set_view(point.coordinates, self.defaults.reveal_zoom);
        self.backend.open_popup(marker);
    }

    /// Centre on an ad-hoc point. A place revealed before reuses its marker.
    pub fn reveal_location(&mut self, point: &LocationPoint) {
        self.initialize();
        let marker = match self.placed.iter().find(|(name, _)| *name == point.name) {
            Some(&(_, marker)) => marker,
            None => {
                let marker = self.backend.add_marker(point);
                self.placed.push((point.name.clone(), marker));
                marker
            }
        };
        self.backend
            .set_view(point.coordinates, self.defaults.reveal_zoom);
        self.backend.open_popup(marker);
    }

    /// Close popups and show the route's midpoint at the default zoom.
    pub fn show_overview(&mut self) {
        self.initialize();
        self.backend.close_popup();
        let center = self
            .route
            .as_ref()
            .and_then(|r| r.bounds())
            .map(|b| b.center())
            .unwrap_or(self.defaults.center);
        self.backend.set_view(center, self.defaults.zoom);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Records every backend call.
    #[derive(Debug, Default)]
    pub struct RecordingBackend {
        pub calls: Vec<String>,
        pub creates: usize,
        pub route_draws: usize,
        pub markers: Vec<LocationPoint>,
        pub center: Option<LatLon>,
        pub zoom: Option<f64>,
        pub open_popup: Option<MarkerId>,
    }

    impl MapBackend for RecordingBackend {
        fn create(&mut self, center: LatLon, zoom: f64) {
            self.creates += 1;
            self.center = Some(center);
            self.zoom = Some(zoom);
            self.calls.push("create".to_string());
        }

        fn set_view(&mut self, center: LatLon, zoom: f64) {
            self.center = Some(center);
            self.zoom = Some(zoom);
            self.calls.push(format!("set_view {center}"));
        }

        fn fit_bounds(&mut self, bounds: Bounds) {
            self.center = Some(bounds.center());
            self.calls.push("fit_bounds".to_string());
        }

        fn add_marker(&mut self, point: &LocationPoint) -> MarkerId {
            self.markers.push(point.clone());
            self.markers.len() - 1
        }

        fn draw_route(&mut self, _points: &[LatLon]) {
            self.route_draws += 1;
            self.calls.push("draw_route".to_string());
        }

        fn open_popup(&mut self, marker: MarkerId) {
            self.open_popup = Some(marker);
        }

        fn close_popup(&mut self) {
            self.open_popup = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingBackend;
    use super::*;

    fn fixed_route_adapter() -> MapAdapter<RecordingBackend> {
        MapAdapter::new(
            RecordingBackend::default(),
            MapDefaults::default(),
            Some(route::Route::first_journey()),
        )
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut map = fixed_route_adapter();
        map.initialize();
        map.initialize();
        assert!(map.is_initialized());
        assert_eq!(map.backend().creates, 1);
        assert_eq!(map.backend().route_draws, 1);
        assert_eq!(
            map.backend().markers.len(),
            route::Route::first_journey().points().len()
        );
        // viewport ends fitted to the route
        assert_eq!(map.backend().calls.last().map(String::as_str), Some("fit_bounds"));
    }

    #[test]
    fn test_geocoded_map_has_no_route() {
        let mut map = MapAdapter::new(RecordingBackend::default(), MapDefaults::default(), None);
        map.initialize();
        assert_eq!(map.backend().creates, 1);
        assert_eq!(map.backend().route_draws, 0);
        assert!(map.backend().markers.is_empty());
    }

    #[test]
    fn test_reveal_replaces_open_popup() {
        let mut map = fixed_route_adapter();
        map.reveal_route_point(2);
        assert_eq!(map.backend().open_popup, Some(2));
        map.reveal_route_point(0);
        assert_eq!(map.backend().open_popup, Some(0));
        assert_eq!(map.backend().center, Some(LatLon::new(36.2021, 36.1511)));
    }

    #[test]
    fn test_reveal_location_adds_marker() {
        let mut map = MapAdapter::new(RecordingBackend::default(), MapDefaults::default(), None);
        let point = LocationPoint::new("Rome", LatLon::new(41.9028, 12.4964));
        map.reveal_location(&point);
        assert_eq!(map.backend().markers, vec![point]);
        assert_eq!(map.backend().open_popup, Some(0));
        assert_eq!(map.backend().zoom, Some(MapDefaults::default().reveal_zoom));
    }

    #[test]
    fn test_reveal_same_place_reuses_marker() {
        let mut map = MapAdapter::new(RecordingBackend::default(), MapDefaults::default(), None);
        let rome = LocationPoint::new("Rome", LatLon::new(41.9028, 12.4964));
        let ostia = LocationPoint::new("Ostia", LatLon::new(41.7314, 12.2869));
        map.reveal_location(&rome);
        map.reveal_location(&ostia);
        map.reveal_location(&rome);
        map.reveal_location(&rome);
        assert_eq!(map.backend().markers, vec![rome, ostia]);
        assert_eq!(map.backend().open_popup, Some(0));
    }

    #[test]
    fn test_overview_closes_popup() {
        let mut map = fixed_route_adapter();
        map.reveal_route_point(1);
        map.show_overview();
        assert_eq!(map.backend().open_popup, None);
        let bounds = map.route().and_then(|r| r.bounds()).unwrap();
        assert_eq!(map.backend().center, Some(bounds.center()));
        assert_eq!(map.backend().zoom, Some(MapDefaults::default().zoom));
    }

    #[test]
    fn test_bounds_around_points() {
        let bounds = Bounds::around([
            LatLon::new(36.0, 30.0),
            LatLon::new(38.0, 36.0),
            LatLon::new(35.0, 32.0),
        ])
        .unwrap();
        assert_eq!(bounds.south, 35.0);
        assert_eq!(bounds.north, 38.0);
        assert_eq!(bounds.west, 30.0);
        assert_eq!(bounds.east, 36.0);
        assert_eq!(bounds.center(), LatLon::new(36.5, 33.0));
        assert!(Bounds::around(std::iter::empty()).is_none());
    }
}
