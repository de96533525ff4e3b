use eframe::egui;

use crate::nav::Navigator;

/// Everything the viewer can be asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Next,
    Previous,
    First,
    Last,
    GoTo(usize),
    ToggleFullscreen,
    ToggleAutoplay,
    /// A location link was clicked.
    ActivateLocation(String),
}

/// Default minimum horizontal travel for a swipe, in points.
pub const DEFAULT_SWIPE_THRESHOLD: f32 = 50.0;

/// Navigation keys and their commands. Quit is handled by the window.
const KEY_BINDINGS: &[(egui::Key, Command)] = &[
    (egui::Key::ArrowRight, Command::Next),
    (egui::Key::Space, Command::Next),
    (egui::Key::PageDown, Command::Next),
    (egui::Key::ArrowLeft, Command::Previous),
    (egui::Key::PageUp, Command::Previous),
    (egui::Key::Home, Command::First),
    (egui::Key::End, Command::Last),
    (egui::Key::F, Command::ToggleFullscreen),
    (egui::Key::A, Command::ToggleAutoplay),
];

pub fn command_for_key(key: egui::Key) -> Option<Command> {
    KEY_BINDINGS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, command)| command.clone())
}

/// Commands for the keys pressed this frame, in press order. Auto-repeat is ignored.
pub fn commands_from_input(input: &egui::InputState) -> Vec<Command> {
    input
        .events
        .iter()
        .filter_map(|event| match event {
            egui::Event::Key {
                key,
                pressed: true,
                repeat: false,
                ..
            } => command_for_key(*key),
            _ => None,
        })
        .collect()
}

/// Turns a single-finger horizontal drag into a navigation command.
#[derive(Debug, Clone)]
pub struct SwipeTracker {
    threshold: f32,
    start_x: Option<f32>,
}

impl Default for SwipeTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SWIPE_THRESHOLD)
    }
}

impl SwipeTracker {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            start_x: None,
        }
    }

    pub fn begin(&mut self, x: f32) {
        self.start_x = Some(x);
    }

    pub fn cancel(&mut self) {
        self.start_x = None;
    }

    /// Finish the gesture. Travel must exceed the threshold; anything shorter is a tap.
    pub fn end(&mut self, x: f32) -> Option<Command> {
        let start = self.start_x.take()?;
        if x < start - self.threshold {
            Some(Command::Next)
        } else if x > start + self.threshold {
            Some(Command::Previous)
        } else {
            None
        }
    }
}

/// What the progress bar and the controls show.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlsView {
    pub progress_percent: f64,
    pub counter: String,
    pub prev_disabled: bool,
    pub next_disabled: bool,
}

impl ControlsView {
    pub fn from_nav(nav: &Navigator) -> Self {
        let total = nav.total_slides();
        let counter = if total == 0 {
            "0/0".to_string()
        } else {
            format!("{}/{}", nav.current_index() + 1, total)
        };
        Self {
            progress_percent: nav.progress_percent(),
            counter,
            prev_disabled: total == 0 || nav.is_first(),
            next_disabled: total == 0 || nav.is_last(),
        }
    }
}
