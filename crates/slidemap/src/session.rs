//! The viewing session: every piece of state the window shows, with no UI.
//!
//! The window forwards input as [`Command`]s and calls [`Session::tick`] once
//! per frame; everything else (map construction, deferred reveals, effects,
//! auto-advance) happens in here.

use std::time::{Duration, Instant};

use crate::deck::SlideContent;
use crate::deck::loader::LoadEvent;
use crate::effects::{Effects, EntranceTiming};
use crate::error::ViewerError;
use crate::input::{Command, ControlsView};
use crate::locate::{LocationResolver, Lookup, Strategy};
use crate::map::route::Route;
use crate::map::{MapAdapter, MapBackend, MapDefaults};
use crate::nav::{Edge, Navigator, Transition};

pub const DEFAULT_AUTOPLAY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// 0-based index of the map slide; detected from the slides when `None`.
    pub map_slide: Option<usize>,
    pub strategy: Strategy,
    pub reveal_delay: Duration,
    pub autoplay_delay: Duration,
    pub map_defaults: MapDefaults,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            map_slide: None,
            strategy: Strategy::FixedRoute,
            reveal_delay: crate::locate::DEFAULT_REVEAL_DELAY,
            autoplay_delay: DEFAULT_AUTOPLAY_DELAY,
            map_defaults: MapDefaults::default(),
        }
    }
}

/// Result of one dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Moved { from: usize, to: usize },
    Bounced(Edge),
    /// The window should enter (`true`) or leave fullscreen.
    Fullscreen(bool),
    Autoplay(bool),
    /// A reveal was queued for the map slide.
    LocationQueued,
    Ignored,
}

pub struct Session<B: MapBackend> {
    nav: Navigator,
    map: MapAdapter<B>,
    resolver: LocationResolver,
    effects: Effects,
    map_slide: Option<usize>,
    map_slide_configured: bool,
    autoplay_delay: Duration,
    autoplay_due: Option<Instant>,
}

impl<B: MapBackend> Session<B> {
    pub fn new(backend: B, options: SessionOptions) -> Self {
        let route = match options.strategy {
            Strategy::FixedRoute => Some(Route::first_journey()),
            Strategy::Geocoding(_) => None,
        };
        Self {
            nav: Navigator::new(),
            map: MapAdapter::new(backend, options.map_defaults, route),
            resolver: LocationResolver::new(options.strategy, options.reveal_delay),
            effects: Effects::new(),
            map_slide: options.map_slide,
            map_slide_configured: options.map_slide.is_some(),
            autoplay_delay: options.autoplay_delay,
            autoplay_due: None,
        }
    }

    pub fn nav(&self) -> &Navigator {
        &self.nav
    }

    #[cfg(test)]
    pub fn map(&self) -> &MapAdapter<B> {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut MapAdapter<B> {
        &mut self.map
    }

    pub fn effects(&self) -> &Effects {
        &self.effects
    }

    pub fn controls(&self) -> ControlsView {
        ControlsView::from_nav(&self.nav)
    }

    #[cfg(test)]
    pub fn map_slide(&self) -> Option<usize> {
        self.map_slide
    }

    pub fn is_autoplaying(&self) -> bool {
        self.autoplay_due.is_some()
    }

    /// Append a loaded slide. The first one gets the slow intro.
    pub fn add_slide(&mut self, markup: String, now: Instant) -> usize {
        let content = SlideContent::parse(markup);
        let has_map = content.has_map_container();
        let animated = animated_count(&content);
        let locations = content.locations().len();
        let index = self.nav.push_slide(content);
        if locations > 0 {
            crate::debug!("session"; "slide {} links {locations} location(s)", index + 1);
        }

        if has_map && !self.map_slide_configured && self.map_slide.is_none() {
            crate::debug!("session"; "map container found on slide {}", index + 1);
            self.map_slide = Some(index);
        }
        if index == 0 {
            self.effects.enter(0, animated, EntranceTiming::INTRO, now);
            self.after_landing(0);
        }
        index
    }

    pub fn handle_load_event(&mut self, event: LoadEvent, now: Instant) {
        match event {
            LoadEvent::Slide { ordinal, markup } => {
                let index = self.add_slide(markup, now);
                crate::trace!("session"; "fragment {ordinal} is slide {}", index + 1);
            }
            LoadEvent::Failed(e) if e.is_fetch_failure() => {
                crate::warn!(
                    "session";
                    "continuing with a partial deck of {} slide(s): {e}",
                    self.nav.total_slides()
                );
            }
            LoadEvent::Failed(e) => {
                crate::error!("session"; "slide loading failed: {e}");
            }
            LoadEvent::Finished { loaded } => {
                self.nav.finish_loading();
                crate::log!("session"; "{loaded} slide(s) loaded");
                if self.map_slide.is_none() {
                    crate::debug!("session"; "no slide carries a map");
                }
            }
        }
    }

    pub fn dispatch(&mut self, command: Command, now: Instant) -> Outcome {
        crate::trace!("session"; "{command:?}");
        match command {
            Command::Next => {
                let t = self.nav.next();
                self.apply(t, now)
            }
            Command::Previous => {
                let t = self.nav.previous();
                self.apply(t, now)
            }
            Command::First => {
                let t = self.nav.first();
                self.apply(t, now)
            }
            Command::Last => {
                let t = self.nav.last();
                self.apply(t, now)
            }
            Command::GoTo(index) => match self.nav.go_to(index) {
                Ok(t) => self.apply(t, now),
                Err(e) => {
                    crate::warn!("session"; "{e}");
                    Outcome::Ignored
                }
            },
            Command::ToggleFullscreen => Outcome::Fullscreen(self.nav.toggle_fullscreen()),
            Command::ToggleAutoplay => {
                self.autoplay_due = match self.autoplay_due {
                    Some(_) => None,
                    None => Some(now + self.autoplay_delay),
                };
                crate::log!("session"; "auto-advance {}", if self.is_autoplaying() { "on" } else { "off" });
                Outcome::Autoplay(self.is_autoplaying())
            }
            Command::ActivateLocation(name) => self.activate_location(&name, now),
        }
    }

    /// Record a fullscreen change reported by the window.
    pub fn sync_fullscreen(&mut self, fullscreen: bool) {
        if self.nav.state().is_fullscreen != fullscreen {
            self.nav.set_fullscreen(fullscreen);
        }
    }

    /// Advance time: auto-advance, due reveals, finished geocode requests.
    pub fn tick(&mut self, now: Instant) {
        if let Some(due) = self.autoplay_due {
            if now >= due {
                let t = if self.nav.is_last() {
                    self.nav.first()
                } else {
                    self.nav.next()
                };
                self.apply(t, now);
                self.autoplay_due = Some(now + self.autoplay_delay);
            }
        }

        let lookups = self.resolver.poll(now, self.map.route());
        for lookup in lookups {
            self.reveal(lookup);
        }
    }

    /// Earliest moment something scheduled will change, for repaint timing.
    pub fn next_wakeup(&self, now: Instant) -> Option<Instant> {
        if self.effects.is_animating(now) {
            return Some(now);
        }
        let mut due = [self.autoplay_due, self.resolver.next_due()]
            .into_iter()
            .flatten()
            .min();
        if self.resolver.is_busy() && due.is_none() {
            // a geocode reply may arrive at any time
            due = Some(now + Duration::from_millis(100));
        }
        due
    }

    fn apply(&mut self, transition: Transition, now: Instant) -> Outcome {
        match transition {
            Transition::Moved { from, to } => {
                let animated = self
                    .nav
                    .current_slide()
                    .map(|s| animated_count(&s.content))
                    .unwrap_or(0);
                self.effects.enter(to, animated, EntranceTiming::STANDARD, now);
                self.after_landing(to);
                Outcome::Moved { from, to }
            }
            Transition::Bounced(edge) => {
                self.effects.shake(edge, now);
                Outcome::Bounced(edge)
            }
            Transition::Idle => Outcome::Ignored,
        }
    }

    /// Build the map the first time its slide is shown.
    fn after_landing(&mut self, index: usize) {
        if self.map_slide != Some(index) || self.map.is_initialized() {
            return;
        }
        if self.map_ready(index) {
            self.map.initialize();
        }
    }

    /// The map slide's container is present; logs when it is not.
    fn map_ready(&self, index: usize) -> bool {
        let present = self
            .nav
            .store()
            .get(index)
            .is_ok_and(|s| s.content.has_map_container());
        if !present {
            crate::warn!("map"; "{}", ViewerError::MapElementMissing { slide: Some(index) });
        }
        present
    }

    fn activate_location(&mut self, name: &str, now: Instant) -> Outcome {
        let Some(map_slide) = self.map_slide else {
            crate::warn!("map"; "{} (cannot show `{name}`)", ViewerError::MapElementMissing { slide: None });
            return Outcome::Ignored;
        };
        let outcome = match self.nav.go_to(map_slide) {
            Ok(t) => self.apply(t, now),
            Err(e) => {
                crate::warn!("map"; "map slide not loaded yet: {e}");
                return Outcome::Ignored;
            }
        };
        if !self.map_ready(map_slide) {
            return outcome;
        }
        self.map.initialize();
        self.resolver.schedule(name, now);
        crate::debug!("map"; "revealing `{name}` shortly");
        Outcome::LocationQueued
    }

    fn reveal(&mut self, lookup: Lookup) {
        match lookup {
            Lookup::RoutePoint(index) => {
                self.map.reveal_route_point(index);
            }
            Lookup::Found(point) => {
                crate::debug!("map"; "{} is at {}", point.name, point.coordinates);
                self.map.reveal_location(&point);
            }
            Lookup::NotOnRoute(e) => {
                crate::warn!("map"; "{e}; showing the whole route");
                self.map.show_overview();
            }
            Lookup::Failed(e) => {
                crate::error!("map"; "{e}");
            }
        }
    }
}

/// Elements that fade in on entrance: everything but headings and the map.
fn animated_count(content: &SlideContent) -> usize {
    content.blocks.iter().filter(|b| b.animates()).count()
}
