use eframe::egui::{self, Color32, Pos2, Rect, Stroke, Vec2};

use super::projection::{self, TILE_SIZE};
use super::tiles::{TileCache, TileKey};
use super::{Bounds, LatLon, LocationPoint, MapBackend, MarkerId};
use crate::theme::Theme;

/// Viewport size assumed until the first paint reports the real one.
const DEFAULT_VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);
const FIT_PADDING: f64 = 48.0;

/// Live state of the map widget.
#[derive(Debug, Clone)]
pub struct MapView {
    pub center: LatLon,
    pub zoom: f64,
    pub active_marker: Option<MarkerId>,
    pub route_line: Vec<LatLon>,
    pub markers: Vec<LocationPoint>,
}

/// Slippy map painted with egui shapes over raster tiles.
#[derive(Debug, Default)]
pub struct CanvasMap {
    view: Option<MapView>,
    viewport: Option<Vec2>,
    /// Bounds fitted against the assumed viewport, refitted on the first paint.
    pending_fit: Option<Bounds>,
}

impl CanvasMap {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn view(&self) -> Option<&MapView> {
        self.view.as_ref()
    }

    fn viewport(&self) -> Vec2 {
        self.viewport.unwrap_or(DEFAULT_VIEWPORT)
    }

    /// Record the painted size of the map.
    fn set_viewport(&mut self, size: Vec2) {
        let first = self.viewport.is_none();
        self.viewport = Some(size);
        if let Some(bounds) = self.pending_fit.take() {
            if first {
                crate::debug!("map"; "refitting route to {:.0}x{:.0}", size.x, size.y);
                self.apply_fit(bounds);
            }
        }
    }

    fn apply_fit(&mut self, bounds: Bounds) {
        let viewport = self.viewport();
        if let Some(view) = &mut self.view {
            view.center = bounds.center();
            view.zoom = projection::fit_zoom(
                bounds,
                viewport.x as f64,
                viewport.y as f64,
                FIT_PADDING,
            );
        }
    }

    /// Paint the map into `rect`. Draws only the background until the map exists.
    pub fn paint(
        &mut self,
        ui: &egui::Ui,
        rect: Rect,
        tiles: &mut TileCache,
        theme: &Theme,
        scale: f32,
    ) {
        self.set_viewport(rect.size());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 8.0 * scale, theme.map_land);

        let Some(view) = &self.view else {
            return;
        };
        let ctx = ui.ctx();
        tiles.poll(ctx);

        let (cx, cy) = projection::world_px(view.center, view.zoom);
        let to_screen = |p: LatLon| {
            let (x, y) = projection::world_px(p, view.zoom);
            rect.center() + Vec2::new((x - cx) as f32, (y - cy) as f32)
        };

        if tiles.is_enabled() {
            paint_tiles(&painter, ctx, rect, view, tiles);
        }

        if view.route_line.len() > 1 {
            let points: Vec<Pos2> = view.route_line.iter().map(|p| to_screen(*p)).collect();
            painter.add(egui::Shape::line(
                points,
                Stroke::new(3.5 * scale, theme.route_color),
            ));
        }

        for (id, marker) in view.markers.iter().enumerate() {
            let pos = to_screen(marker.coordinates);
            let active = view.active_marker == Some(id);
            let radius = (if active { 10.0 } else { 7.0 }) * scale;
            painter.circle(
                pos,
                radius,
                theme.marker_color,
                Stroke::new(2.0 * scale, Color32::WHITE),
            );
        }

        if let Some(marker) = view.active_marker.and_then(|id| view.markers.get(id)) {
            paint_popup(&painter, to_screen(marker.coordinates), marker, theme, scale);
        }

        if tiles.is_enabled() {
            let font = egui::FontId::proportional(theme.small_size * 0.5 * scale);
            painter.text(
                rect.right_bottom() - Vec2::new(6.0, 4.0) * scale,
                egui::Align2::RIGHT_BOTTOM,
                "\u{a9} OpenStreetMap contributors",
                font,
                Theme::with_opacity(theme.foreground, 0.7),
            );
        }
    }
}

fn paint_tiles(
    painter: &egui::Painter,
    ctx: &egui::Context,
    rect: Rect,
    view: &MapView,
    tiles: &mut TileCache,
) {
    let z = view.zoom.round().clamp(0.0, projection::MAX_ZOOM) as u32;
    // Tiles are fetched at integer zoom and stretched for fractional zoom.
    let factor = 2f64.powf(view.zoom - z as f64);
    let (cx, cy) = projection::world_px(view.center, z as f64);
    let half_w = rect.width() as f64 / 2.0 / factor;
    let half_h = rect.height() as f64 / 2.0 / factor;
    let n = projection::tiles_per_axis(z) as i64;

    let x0 = ((cx - half_w) / TILE_SIZE).floor() as i64;
    let x1 = ((cx + half_w) / TILE_SIZE).floor() as i64;
    let y0 = (((cy - half_h) / TILE_SIZE).floor() as i64).max(0);
    let y1 = (((cy + half_h) / TILE_SIZE).floor() as i64).min(n - 1);
    let size = (TILE_SIZE * factor) as f32;
    let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));

    for ty in y0..=y1 {
        for tx in x0..=x1 {
            let key = TileKey {
                z,
                x: tx.rem_euclid(n) as u32,
                y: ty as u32,
            };
            let Some(texture) = tiles.get(ctx, key) else {
                continue;
            };
            let min = rect.center()
                + Vec2::new(
                    ((tx as f64 * TILE_SIZE - cx) * factor) as f32,
                    ((ty as f64 * TILE_SIZE - cy) * factor) as f32,
                );
            let tile_rect = Rect::from_min_size(min, Vec2::splat(size));
            painter.image(texture.id(), tile_rect, uv, Color32::WHITE);
        }
    }
}

fn paint_popup(painter: &egui::Painter, anchor: Pos2, point: &LocationPoint, theme: &Theme, scale: f32) {
    let padding = 10.0 * scale;
    let title = painter.layout_no_wrap(
        point.name.clone(),
        egui::FontId::proportional(theme.small_size * 0.8 * scale),
        theme.popup_foreground,
    );
    let note = point.note.as_ref().map(|note| {
        painter.layout(
            note.clone(),
            egui::FontId::proportional(theme.small_size * 0.6 * scale),
            theme.popup_foreground,
            360.0 * scale,
        )
    });

    let note_size = note.as_ref().map(|g| g.size()).unwrap_or(Vec2::ZERO);
    let gap = if note.is_some() { 4.0 * scale } else { 0.0 };
    let width = title.size().x.max(note_size.x) + padding * 2.0;
    let height = title.size().y + gap + note_size.y + padding * 2.0;
    let bottom = anchor.y - 16.0 * scale;
    let popup = Rect::from_min_size(
        Pos2::new(anchor.x - width / 2.0, bottom - height),
        Vec2::new(width, height),
    );

    painter.rect_filled(popup.translate(Vec2::splat(2.0 * scale)), 6.0 * scale, Color32::from_black_alpha(60));
    painter.rect_filled(popup, 6.0 * scale, theme.popup_background);
    let tip = vec![
        Pos2::new(anchor.x - 7.0 * scale, bottom),
        Pos2::new(anchor.x + 7.0 * scale, bottom),
        Pos2::new(anchor.x, bottom + 8.0 * scale),
    ];
    painter.add(egui::Shape::convex_polygon(tip, theme.popup_background, Stroke::NONE));

    let title_height = title.size().y;
    painter.galley(popup.min + Vec2::splat(padding), title, theme.popup_foreground);
    if let Some(note) = note {
        let pos = popup.min + Vec2::new(padding, padding + title_height + gap);
        painter.galley(pos, note, theme.popup_foreground);
    }
}

impl MapBackend for CanvasMap {
    fn create(&mut self, center: LatLon, zoom: f64) {
        if self.view.is_some() {
            return;
        }
        self.view = Some(MapView {
            center,
            zoom,
            active_marker: None,
            route_line: Vec::new(),
            markers: Vec::new(),
        });
    }

    fn set_view(&mut self, center: LatLon, zoom: f64) {
        self.pending_fit = None;
        if let Some(view) = &mut self.view {
            view.center = center;
            view.zoom = zoom.clamp(projection::MIN_ZOOM, projection::MAX_ZOOM);
        }
    }

    fn fit_bounds(&mut self, bounds: Bounds) {
        if self.viewport.is_none() {
            self.pending_fit = Some(bounds);
        }
        self.apply_fit(bounds);
    }

    fn add_marker(&mut self, point: &LocationPoint) -> MarkerId {
        match &mut self.view {
            Some(view) => {
                view.markers.push(point.clone());
                view.markers.len() - 1
            }
            None => 0,
        }
    }

    fn draw_route(&mut self, points: &[LatLon]) {
        if let Some(view) = &mut self.view {
            view.route_line = points.to_vec();
        }
    }

    fn open_popup(&mut self, marker: MarkerId) {
        if let Some(view) = &mut self.view {
            if marker < view.markers.len() {
                view.active_marker = Some(marker);
            }
        }
    }

    fn close_popup(&mut self) {
        if let Some(view) = &mut self.view {
            view.active_marker = None;
        }
    }
}
