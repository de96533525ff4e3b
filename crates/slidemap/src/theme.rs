use eframe::egui::Color32;

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub background: Color32,
    pub foreground: Color32,
    pub heading_color: Color32,
    pub accent: Color32,
    pub muted: Color32,
    pub progress_track: Color32,
    pub quote_bar: Color32,
    pub map_land: Color32,
    pub route_color: Color32,
    pub marker_color: Color32,
    pub popup_background: Color32,
    pub popup_foreground: Color32,
    pub h1_size: f32,
    pub h2_size: f32,
    pub h3_size: f32,
    pub body_size: f32,
    pub small_size: f32,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "dark".to_string(),
            background: Color32::from_rgb(0x1B, 0x1F, 0x2A),
            foreground: Color32::from_rgb(0xD6, 0xD2, 0xC4),
            heading_color: Color32::from_rgb(0xF2, 0xD4, 0x8A),
            accent: Color32::from_rgb(0xE0, 0x9F, 0x3E),
            muted: Color32::from_rgb(0x6E, 0x72, 0x7D),
            progress_track: Color32::from_rgb(0x2C, 0x31, 0x3E),
            quote_bar: Color32::from_rgb(0x8C, 0x6A, 0x3A),
            map_land: Color32::from_rgb(0x2A, 0x30, 0x3C),
            route_color: Color32::from_rgb(0xE0, 0x6C, 0x4A),
            marker_color: Color32::from_rgb(0xF2, 0xD4, 0x8A),
            popup_background: Color32::from_rgb(0x26, 0x2B, 0x38),
            popup_foreground: Color32::from_rgb(0xEE, 0xEA, 0xDC),
            h1_size: 88.0,
            h2_size: 64.0,
            h3_size: 48.0,
            body_size: 38.0,
            small_size: 24.0,
        }
    }

    pub fn light() -> Self {
        Self {
            name: "light".to_string(),
            background: Color32::from_rgb(0xF7, 0xF1, 0xE3),
            foreground: Color32::from_rgb(0x3B, 0x2F, 0x22),
            heading_color: Color32::from_rgb(0x5A, 0x2E, 0x0E),
            accent: Color32::from_rgb(0xB3, 0x5C, 0x1E),
            muted: Color32::from_rgb(0x9A, 0x8C, 0x78),
            progress_track: Color32::from_rgb(0xE4, 0xDA, 0xC4),
            quote_bar: Color32::from_rgb(0xC9, 0x9A, 0x5B),
            map_land: Color32::from_rgb(0xE8, 0xE0, 0xCC),
            route_color: Color32::from_rgb(0xC0, 0x39, 0x2B),
            marker_color: Color32::from_rgb(0x5A, 0x2E, 0x0E),
            popup_background: Color32::WHITE,
            popup_foreground: Color32::from_rgb(0x3B, 0x2F, 0x22),
            h1_size: 88.0,
            h2_size: 64.0,
            h3_size: 48.0,
            body_size: 38.0,
            small_size: 24.0,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "dark" => Self::dark(),
            _ => Self::light(),
        }
    }

    /// Apply opacity to a color
    pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
        Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), (opacity * 255.0) as u8)
    }

    pub fn heading_size(&self, level: u8) -> f32 {
        match level {
            1 => self.h1_size,
            2 => self.h2_size,
            3 => self.h3_size,
            _ => self.body_size,
        }
    }
}
