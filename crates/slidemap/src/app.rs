use std::sync::mpsc::{self, Receiver};
use std::time::Instant;

use eframe::egui;

use crate::config::{Backend, Config};
use crate::deck::loader::{self, LoadEvent};
use crate::deck::source::SlideSource;
use crate::deck::{Block, Inline, Slide};
use crate::effects::{Appearance, RISE_DISTANCE};
use crate::input::{self, Command, SwipeTracker};
use crate::map::canvas::CanvasMap;
use crate::map::tiles::TileCache;
use crate::nav::Edge;
use crate::session::{Outcome, Session, SessionOptions};
use crate::theme::Theme;

/// Everything the command line decided about a viewing session.
#[derive(Debug, Clone)]
pub struct Launch {
    pub source: SlideSource,
    pub windowed: bool,
    /// 0-based.
    pub start_slide: Option<usize>,
    /// 0-based.
    pub map_slide: Option<usize>,
    pub count: usize,
    pub backend: Backend,
}

pub struct ViewerApp {
    session: Session<CanvasMap>,
    theme: Theme,
    loads: Receiver<LoadEvent>,
    tiles: TileCache,
    swipe: SwipeTracker,
    /// Fullscreen state the window last reported.
    reported_fullscreen: Option<bool>,
    pending_start: Option<usize>,
    /// Slide the window title was last set for.
    titled: Option<usize>,
}

impl ViewerApp {
    fn new(
        session: Session<CanvasMap>,
        theme: Theme,
        loads: Receiver<LoadEvent>,
        tiles: TileCache,
        swipe: SwipeTracker,
        start_slide: Option<usize>,
    ) -> Self {
        Self {
            session,
            theme,
            loads,
            tiles,
            swipe,
            reported_fullscreen: None,
            pending_start: start_slide.filter(|s| *s > 0),
            titled: None,
        }
    }

    fn compute_scale(rect: egui::Rect) -> f32 {
        let ref_w = 1920.0;
        let ref_h = 1080.0;
        (rect.width() / ref_w).min(rect.height() / ref_h)
    }

    fn drain_loads(&mut self, now: Instant) {
        while let Ok(event) = self.loads.try_recv() {
            self.session.handle_load_event(event, now);
        }

        if let Some(start) = self.pending_start {
            if start < self.session.nav().total_slides() {
                self.pending_start = None;
                self.session.dispatch(Command::GoTo(start), now);
            } else if !self.session.nav().is_loading() {
                self.pending_start = None;
                crate::warn!(
                    "viewer";
                    "start slide {} does not exist; the deck has {} slide(s)",
                    start + 1,
                    self.session.nav().total_slides()
                );
            }
        }
    }

    fn apply_outcome(outcome: Outcome, viewport_cmds: &mut Vec<egui::ViewportCommand>) {
        if let Outcome::Fullscreen(on) = outcome {
            viewport_cmds.push(egui::ViewportCommand::Fullscreen(on));
        }
    }

    /// Keyboard and touch input, collected as commands.
    fn collect_input(&mut self, ctx: &egui::Context, viewport_cmds: &mut Vec<egui::ViewportCommand>) -> Vec<Command> {
        let swipe = &mut self.swipe;
        let mut reported = None;
        let commands = ctx.input(|i| {
            if i.key_pressed(egui::Key::Q) {
                viewport_cmds.push(egui::ViewportCommand::Close);
                return Vec::new();
            }
            reported = i.viewport().fullscreen;

            let mut commands = input::commands_from_input(i);
            if i.multi_touch().is_some() {
                swipe.cancel();
            }
            for event in &i.events {
                if let egui::Event::Touch { phase, pos, .. } = event {
                    match phase {
                        egui::TouchPhase::Start => swipe.begin(pos.x),
                        egui::TouchPhase::End => commands.extend(swipe.end(pos.x)),
                        egui::TouchPhase::Cancel => swipe.cancel(),
                        egui::TouchPhase::Move => {}
                    }
                }
            }
            commands
        });

        if reported.is_some() && reported != self.reported_fullscreen {
            self.reported_fullscreen = reported;
            if let Some(fullscreen) = reported {
                self.session.sync_fullscreen(fullscreen);
            }
        }
        commands
    }

    fn draw_progress(&self, ui: &egui::Ui, rect: egui::Rect, scale: f32) {
        let controls = self.session.controls();
        let height = 6.0 * scale.max(0.5);
        let track = egui::Rect::from_min_size(rect.min, egui::vec2(rect.width(), height));
        ui.painter().rect_filled(track, 0.0, self.theme.progress_track);
        let filled = egui::Rect::from_min_size(
            rect.min,
            egui::vec2(rect.width() * (controls.progress_percent as f32 / 100.0), height),
        );
        ui.painter().rect_filled(filled, 0.0, self.theme.accent);
    }

    /// Prev/next buttons, counter and fullscreen toggle along the bottom edge.
    fn draw_controls(&self, ui: &mut egui::Ui, rect: egui::Rect, scale: f32, now: Instant) -> Vec<Command> {
        let controls = self.session.controls();
        let effects = self.session.effects();
        let mut commands = Vec::new();

        let font = egui::FontId::proportional(self.theme.small_size * scale.max(0.6));
        let button_size = egui::vec2(64.0, 44.0) * scale.max(0.6);
        let gap = 16.0 * scale.max(0.6);
        let y = rect.bottom() - button_size.y - 24.0 * scale.max(0.6);

        let counter = ui.painter().layout_no_wrap(
            controls.counter.clone(),
            font.clone(),
            self.theme.accent,
        );
        let total_w = button_size.x * 3.0 + counter.size().x + gap * 3.0;
        let mut x = rect.center().x - total_w / 2.0;

        let button = |ui: &mut egui::Ui, x: f32, label: &str, dimmed: bool, shake: f32| {
            let r = egui::Rect::from_min_size(egui::pos2(x + shake, y), button_size);
            ui.scope(|ui| {
                if dimmed {
                    ui.set_opacity(0.5);
                }
                ui.put(
                    r,
                    egui::Button::new(egui::RichText::new(label).font(font.clone()).color(self.theme.foreground))
                        .fill(Theme::with_opacity(self.theme.progress_track, 0.9))
                        .corner_radius(8.0 * scale.max(0.6)),
                )
                .clicked()
            })
            .inner
        };

        if button(ui, x, "\u{2190}", controls.prev_disabled, effects.shake_offset(Edge::First, now)) {
            commands.push(Command::Previous);
        }
        x += button_size.x + gap;

        let counter_pos = egui::pos2(x, y + (button_size.y - counter.size().y) / 2.0);
        ui.painter().galley(counter_pos, counter.clone(), self.theme.accent);
        x += counter.size().x + gap;

        if button(ui, x, "\u{2192}", controls.next_disabled, effects.shake_offset(Edge::Last, now)) {
            commands.push(Command::Next);
        }
        x += button_size.x + gap;

        let icon = if self.session.nav().state().is_fullscreen {
            "\u{1F5D7}"
        } else {
            "\u{1F5D6}"
        };
        if button(ui, x, icon, false, 0.0) {
            commands.push(Command::ToggleFullscreen);
        }

        if self.session.is_autoplaying() {
            ui.painter().text(
                egui::pos2(rect.right() - 24.0 * scale, y + button_size.y / 2.0),
                egui::Align2::RIGHT_CENTER,
                "auto",
                egui::FontId::proportional(self.theme.small_size * 0.7 * scale.max(0.6)),
                self.theme.muted,
            );
        }
        commands
    }

    /// Draw the active slide; returns the location a link click asked for.
    fn draw_slide(&mut self, ui: &mut egui::Ui, slide: &Slide, rect: egui::Rect, scale: f32, now: Instant) -> Option<String> {
        let whole = self.session.effects().slide_appearance(slide.index, now);
        let mut clicked = None;

        let content_rect = rect
            .shrink2(egui::vec2(140.0, 90.0) * scale)
            .translate(egui::vec2(0.0, whole.offset_y * scale));
        let mut ui = ui.new_child(
            egui::UiBuilder::new()
                .max_rect(content_rect)
                .layout(egui::Layout::top_down(egui::Align::Center)),
        );
        ui.set_opacity(whole.opacity);
        ui.spacing_mut().item_spacing = egui::vec2(0.0, 12.0 * scale);

        if slide.content.blocks.is_empty() {
            ui.label(
                egui::RichText::new(slide.content.raw.trim())
                    .size(self.theme.body_size * scale)
                    .color(self.theme.foreground),
            );
            return None;
        }

        let mut animated = 0;
        for block in &slide.content.blocks {
            let look = if block.animates() {
                let look = self.session.effects().element_appearance(slide.index, animated, now);
                animated += 1;
                Some(look)
            } else {
                None
            };

            match block {
                Block::MapContainer => {
                    let width = ui.available_width();
                    let height = (ui.available_height() - 8.0 * scale).max(240.0 * scale);
                    let (map_rect, _) = ui.allocate_exact_size(egui::vec2(width, height), egui::Sense::hover());
                    self.session
                        .map_mut()
                        .backend_mut()
                        .paint(&ui, map_rect, &mut self.tiles, &self.theme, scale);
                }
                _ => {
                    if let Some(name) = self.draw_block(&mut ui, block, look, scale) {
                        clicked = Some(name);
                    }
                }
            }
        }
        clicked
    }

    fn draw_block(&self, ui: &mut egui::Ui, block: &Block, look: Option<Appearance>, scale: f32) -> Option<String> {
        let rise = RISE_DISTANCE * scale;
        let look = look.unwrap_or(Appearance::SETTLED);
        let dy = look.offset_y * scale;
        let animated = block.animates();

        ui.scope(|ui| {
            ui.set_opacity(look.opacity);
            if animated {
                // the block always spans `rise`; only its position inside moves
                ui.add_space(dy);
            }
            let clicked = match block {
                Block::Heading { level, inlines } => {
                    let size = self.theme.heading_size(*level) * scale;
                    self.draw_inlines(ui, inlines, size, self.theme.heading_color, true, "")
                }
                Block::Paragraph { inlines } => {
                    self.draw_inlines(ui, inlines, self.theme.body_size * scale, self.theme.foreground, false, "")
                }
                Block::ListItem { inlines } => self.draw_inlines(
                    ui,
                    inlines,
                    self.theme.body_size * scale,
                    self.theme.foreground,
                    false,
                    "\u{2022} ",
                ),
                Block::Quote { inlines } => {
                    let shown = egui::Frame::new()
                        .inner_margin(egui::Margin::symmetric((18.0 * scale) as i8, (6.0 * scale) as i8))
                        .show(ui, |ui| {
                            self.draw_inlines(ui, inlines, self.theme.body_size * 0.9 * scale, self.theme.foreground, false, "")
                        });
                    let bar = shown.response.rect;
                    ui.painter().vline(
                        bar.left(),
                        bar.y_range(),
                        egui::Stroke::new(4.0 * scale, self.theme.quote_bar),
                    );
                    shown.inner
                }
                Block::Divider => {
                    let (r, _) = ui.allocate_exact_size(egui::vec2(160.0 * scale, 6.0 * scale), egui::Sense::hover());
                    ui.painter().rect_filled(r, 3.0 * scale, self.theme.accent);
                    None
                }
                Block::MapContainer => None,
            };
            if animated {
                ui.add_space((rise - dy).max(0.0));
            }
            clicked
        })
        .inner
    }

    fn draw_inlines(
        &self,
        ui: &mut egui::Ui,
        inlines: &[Inline],
        size: f32,
        color: egui::Color32,
        strong: bool,
        prefix: &str,
    ) -> Option<String> {
        let mut clicked = None;
        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing.x = 0.0;
            if !prefix.is_empty() {
                ui.label(egui::RichText::new(prefix).size(size).color(self.theme.accent));
            }
            for inline in inlines {
                match inline {
                    Inline::Text(text) => {
                        let mut rich = egui::RichText::new(text).size(size).color(color);
                        if strong {
                            rich = rich.strong();
                        }
                        ui.label(rich);
                    }
                    Inline::Strong(text) => {
                        ui.label(egui::RichText::new(text).size(size).color(self.theme.heading_color).strong());
                    }
                    Inline::Location { label, name } => {
                        let link = ui
                            .link(egui::RichText::new(label).size(size).color(self.theme.accent))
                            .on_hover_text(format!("Show {name} on the map"));
                        if link.clicked() {
                            clicked = Some(name.clone());
                        }
                    }
                }
            }
        });
        clicked
    }

    fn draw_waiting(&self, ui: &egui::Ui, rect: egui::Rect, scale: f32) {
        let text = if !self.session.nav().is_loading() {
            "No slides could be loaded"
        } else {
            "Loading slides\u{2026}"
        };
        ui.painter().text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            text,
            egui::FontId::proportional(self.theme.body_size * scale),
            self.theme.muted,
        );
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.drain_loads(now);

        // Collect viewport commands to send AFTER the input closure
        let mut viewport_cmds: Vec<egui::ViewportCommand> = Vec::new();
        let mut commands = self.collect_input(ctx, &mut viewport_cmds);

        let bg = self.theme.background;
        let slide = self.session.nav().current_slide().cloned();
        if let Some(slide) = &slide {
            if self.titled != Some(slide.index) {
                self.titled = Some(slide.index);
                let title = match slide.content.title() {
                    Some(heading) if !heading.is_empty() => format!("{heading} - slidemap"),
                    _ => format!("Slide {} - slidemap", slide.index + 1),
                };
                viewport_cmds.push(egui::ViewportCommand::Title(title));
            }
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(bg).inner_margin(0.0))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                ui.painter().rect_filled(rect, 0.0, bg);
                let scale = Self::compute_scale(rect);

                match &slide {
                    Some(slide) => {
                        if let Some(name) = self.draw_slide(ui, slide, rect, scale, now) {
                            commands.push(Command::ActivateLocation(name));
                        }
                    }
                    None => self.draw_waiting(ui, rect, scale),
                }
                self.draw_progress(ui, rect, scale);
                commands.extend(self.draw_controls(ui, rect, scale, now));
            });

        for command in commands {
            let outcome = self.session.dispatch(command, now);
            Self::apply_outcome(outcome, &mut viewport_cmds);
        }
        self.session.tick(now);

        for cmd in viewport_cmds {
            ctx.send_viewport_cmd(cmd);
        }

        if let Some(at) = self.session.next_wakeup(now) {
            ctx.request_repaint_after(at.saturating_duration_since(now));
        }
    }
}

pub fn run(launch: Launch, config: &Config) -> anyhow::Result<()> {
    let title = format!("slidemap - {}", launch.source);
    crate::log!("viewer"; "opening {} ({} lookups)", launch.source, launch.backend);

    let options = SessionOptions {
        map_slide: launch.map_slide,
        strategy: crate::commands::locate::strategy_for(launch.backend, config),
        reveal_delay: config.reveal_delay(),
        autoplay_delay: config.autoplay_delay(),
        ..SessionOptions::default()
    };
    let theme = Theme::from_name(config.theme());
    let tiles = TileCache::new(config.tile_url());
    let swipe = SwipeTracker::new(config.swipe_threshold());

    let viewport = if launch.windowed {
        egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_title(&title)
    } else {
        egui::ViewportBuilder::default()
            .with_fullscreen(true)
            .with_title(&title)
    };

    let options_native = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options_native,
        Box::new(move |cc| {
            let visuals = if theme.name == "dark" {
                egui::Visuals::dark()
            } else {
                egui::Visuals::light()
            };
            cc.egui_ctx.set_visuals(visuals);

            let (tx, rx) = mpsc::channel();
            let ctx = cc.egui_ctx.clone();
            loader::spawn(launch.source, launch.count, tx, move || ctx.request_repaint())?;

            let mut session = Session::new(CanvasMap::new(), options);
            session.sync_fullscreen(!launch.windowed);
            let app = ViewerApp::new(session, theme, rx, tiles, swipe, launch.start_slide);
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
