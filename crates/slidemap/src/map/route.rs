use super::{Bounds, LatLon, LocationPoint};

/// An ordered, pre-registered sequence of places drawn as one connected line.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    name: String,
    points: Vec<LocationPoint>,
    closed: bool,
}

impl Route {
    pub fn new(name: impl Into<String>, points: Vec<LocationPoint>) -> Self {
        Self {
            name: name.into(),
            points,
            closed: false,
        }
    }

    /// Draw the line back to the first point.
    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    /// Paul's first missionary journey, Acts 13-14.
    pub fn first_journey() -> Self {
        let stop = |name: &str, lat: f64, lon: f64, note: &str| {
            LocationPoint::new(name, LatLon::new(lat, lon)).with_note(note)
        };
        Self::new(
            "First missionary journey",
            vec![
                stop("Antioch, Syria", 36.2021, 36.1511, "Sending church (Acts 13:1-3)"),
                stop("Seleucia Pieria", 36.1236, 35.9225, "Port of departure (Acts 13:4)"),
                stop("Salamis, Cyprus", 35.1856, 33.9006, "Preaching in the synagogues (Acts 13:5)"),
                stop("Paphos, Cyprus", 34.7554, 32.4060, "Sergius Paulus believes (Acts 13:6-12)"),
                stop("Perga", 36.9613, 30.8539, "John Mark returns home (Acts 13:13)"),
                stop("Antioch of Pisidia", 38.3060, 31.1891, "Sermon in the synagogue (Acts 13:14-52)"),
                stop("Iconium", 37.8714, 32.4846, "A great number believe (Acts 14:1-7)"),
                stop("Lystra", 37.5786, 32.4539, "Healing of the lame man (Acts 14:8-20)"),
                stop("Derbe", 37.3500, 33.3667, "Many disciples made (Acts 14:20-21)"),
                stop("Attalia", 36.8841, 30.7056, "Sailing home (Acts 14:25-26)"),
            ],
        )
        .closed()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[LocationPoint] {
        &self.points
    }

    /// Vertices of the polyline, returning to the start when closed.
    pub fn line(&self) -> impl Iterator<Item = LatLon> + '_ {
        let back = self
            .closed
            .then(|| self.points.first().map(|p| p.coordinates))
            .flatten();
        self.points.iter().map(|p| p.coordinates).chain(back)
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::around(self.points.iter().map(|p| p.coordinates))
    }

    /// Index of the first point named `query`, else the first whose popup mentions it.
    pub fn find(&self, query: &str) -> Option<usize> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        self.points
            .iter()
            .position(|p| p.name == query)
            .or_else(|| self.points.iter().position(|p| p.popup_text().contains(query)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_journey_starts_at_antioch() {
        let route = Route::first_journey();
        assert_eq!(route.points().len(), 10);
        assert_eq!(route.points()[0].name, "Antioch, Syria");
        assert_eq!(route.points()[0].coordinates, LatLon::new(36.2021, 36.1511));
    }

    #[test]
    fn test_closed_line_returns_home() {
        let route = Route::first_journey();
        let line: Vec<LatLon> = route.line().collect();
        assert_eq!(line.len(), 11);
        assert_eq!(line.first(), line.last());

        let open = Route::new("open", route.points().to_vec());
        assert_eq!(open.line().count(), 10);
    }

    #[test]
    fn test_find_prefers_exact_name() {
        let route = Route::first_journey();
        // "Antioch" appears in two names; exact match decides
        assert_eq!(route.find("Antioch of Pisidia"), Some(5));
        assert_eq!(route.find("Antioch, Syria"), Some(0));
    }

    #[test]
    fn test_find_by_popup_substring() {
        let route = Route::first_journey();
        assert_eq!(route.find("Antioch"), Some(0));
        assert_eq!(route.find("Sergius Paulus"), Some(3));
        assert_eq!(route.find("Cyprus"), Some(2));
        assert_eq!(route.find("Nowhere"), None);
        assert_eq!(route.find("  "), None);
    }

    #[test]
    fn test_bounds_cover_route() {
        let bounds = Route::first_journey().bounds().unwrap();
        assert_eq!(bounds.south, 34.7554);
        assert_eq!(bounds.north, 38.3060);
        assert_eq!(bounds.west, 30.7056);
        assert_eq!(bounds.east, 36.1511);
    }
}
