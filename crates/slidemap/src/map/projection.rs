//! Web-Mercator math for the slippy map.

use super::{Bounds, LatLon};

pub const TILE_SIZE: f64 = 256.0;
pub const MIN_ZOOM: f64 = 2.0;
pub const MAX_ZOOM: f64 = 18.0;

/// Mercator's usable latitude range.
const MAX_LAT: f64 = 85.051_128_78;

/// Position in world pixels at `zoom`, origin top-left.
pub fn world_px(point: LatLon, zoom: f64) -> (f64, f64) {
    let scale = TILE_SIZE * 2f64.powf(zoom);
    let lat = point.lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
    let x = (point.lon + 180.0) / 360.0 * scale;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) / 2.0 * scale;
    (x, y)
}

/// Largest zoom at which `bounds` fits inside a `width`×`height` viewport with `padding` pixels each side.
pub fn fit_zoom(bounds: Bounds, width: f64, height: f64, padding: f64) -> f64 {
    let avail_w = (width - 2.0 * padding).max(1.0);
    let avail_h = (height - 2.0 * padding).max(1.0);
    let (x0, y0) = world_px(LatLon::new(bounds.north, bounds.west), 0.0);
    let (x1, y1) = world_px(LatLon::new(bounds.south, bounds.east), 0.0);
    let span_w = (x1 - x0).abs();
    let span_h = (y1 - y0).abs();
    if span_w <= f64::EPSILON && span_h <= f64::EPSILON {
        return MAX_ZOOM;
    }
    let zoom_w = if span_w > 0.0 { (avail_w / span_w).log2() } else { MAX_ZOOM };
    let zoom_h = if span_h > 0.0 { (avail_h / span_h).log2() } else { MAX_ZOOM };
    zoom_w.min(zoom_h).clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Number of tiles per axis at integer zoom `z`.
pub fn tiles_per_axis(z: u32) -> u32 {
    1 << z.min(MAX_ZOOM as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_origin_is_map_center() {
        let (x, y) = world_px(LatLon::new(0.0, 0.0), 0.0);
        assert!(close(x, 128.0));
        assert!(close(y, 128.0));
        let (x, _) = world_px(LatLon::new(0.0, 0.0), 1.0);
        assert!(close(x, 256.0));
    }

    #[test]
    fn test_fit_zoom_shrinks_for_wider_bounds() {
        let small = Bounds {
            south: 36.0,
            west: 32.0,
            north: 37.0,
            east: 33.0,
        };
        let large = Bounds {
            south: 30.0,
            west: 20.0,
            north: 40.0,
            east: 40.0,
        };
        let z_small = fit_zoom(small, 800.0, 600.0, 20.0);
        let z_large = fit_zoom(large, 800.0, 600.0, 20.0);
        assert!(z_small > z_large);
        assert!((MIN_ZOOM..=MAX_ZOOM).contains(&z_large));
    }

    #[test]
    fn test_fit_zoom_single_point() {
        let point = Bounds {
            south: 36.0,
            west: 33.0,
            north: 36.0,
            east: 33.0,
        };
        assert_eq!(fit_zoom(point, 800.0, 600.0, 20.0), MAX_ZOOM);
    }

    #[test]
    fn test_tiles_per_axis() {
        assert_eq!(tiles_per_axis(0), 1);
        assert_eq!(tiles_per_axis(6), 64);
    }
}
