use crate::deck::{Slide, SlideContent, SlideStore};
use crate::error::ViewerError;

/// The single piece of presentation state. Only [`Navigator`] mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PresentationState {
    pub current_index: usize,
    pub total_slides: usize,
    pub is_fullscreen: bool,
}

/// Which end of the deck a refused move ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    First,
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved { from: usize, to: usize },
    /// Already at an edge; state unchanged, feedback only.
    Bounced(Edge),
    /// Nothing loaded yet.
    Idle,
}

/// Slide-navigation state machine over the slides loaded so far.
#[derive(Debug, Default)]
pub struct Navigator {
    store: SlideStore,
    state: PresentationState,
    loading_complete: bool,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a loaded slide. The first slide becomes the active one.
    pub fn push_slide(&mut self, content: SlideContent) -> usize {
        let index = self.store.push(content);
        self.state.total_slides = self.store.len();
        if index == 0 {
            self.state.current_index = 0;
            self.store.set_active(0, true);
        }
        index
    }

    pub fn finish_loading(&mut self) {
        self.loading_complete = true;
    }

    pub fn is_loading(&self) -> bool {
        !self.loading_complete
    }

    pub fn state(&self) -> PresentationState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn total_slides(&self) -> usize {
        self.state.total_slides
    }

    pub fn store(&self) -> &SlideStore {
        &self.store
    }

    pub fn current_slide(&self) -> Option<&Slide> {
        self.store.get(self.state.current_index).ok()
    }

    pub fn is_first(&self) -> bool {
        self.state.current_index == 0
    }

    pub fn is_last(&self) -> bool {
        self.state.current_index + 1 >= self.state.total_slides
    }

    pub fn next(&mut self) -> Transition {
        if self.state.total_slides == 0 {
            return Transition::Idle;
        }
        if self.is_last() {
            return Transition::Bounced(Edge::Last);
        }
        self.activate(self.state.current_index + 1)
    }

    pub fn previous(&mut self) -> Transition {
        if self.state.total_slides == 0 {
            return Transition::Idle;
        }
        if self.is_first() {
            return Transition::Bounced(Edge::First);
        }
        self.activate(self.state.current_index - 1)
    }

    pub fn go_to(&mut self, index: usize) -> Result<Transition, ViewerError> {
        if index >= self.state.total_slides {
            return Err(ViewerError::OutOfRange {
                index,
                total: self.state.total_slides,
            });
        }
        Ok(self.activate(index))
    }

    pub fn first(&mut self) -> Transition {
        self.go_to(0).unwrap_or(Transition::Idle)
    }

    pub fn last(&mut self) -> Transition {
        match self.state.total_slides {
            0 => Transition::Idle,
            n => self.go_to(n - 1).unwrap_or(Transition::Idle),
        }
    }

    fn activate(&mut self, to: usize) -> Transition {
        let from = self.state.current_index;
        self.store.set_active(from, false);
        self.state.current_index = to;
        self.store.set_active(to, true);
        debug_assert_eq!(self.store.active_indices(), vec![to]);
        Transition::Moved { from, to }
    }

    /// `(current + 1) / total * 100`, or 0 with nothing loaded.
    pub fn progress_percent(&self) -> f64 {
        if self.state.total_slides == 0 {
            return 0.0;
        }
        (self.state.current_index + 1) as f64 / self.state.total_slides as f64 * 100.0
    }

    pub fn toggle_fullscreen(&mut self) -> bool {
        self.state.is_fullscreen = !self.state.is_fullscreen;
        self.state.is_fullscreen
    }

    /// Record a fullscreen change made outside the viewer (window manager, Esc).
    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        self.state.is_fullscreen = fullscreen;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck(n: usize) -> Navigator {
        let mut nav = Navigator::new();
        for i in 0..n {
            nav.push_slide(SlideContent::parse(format!("<h1>Slide {}</h1>", i + 1)));
        }
        nav.finish_loading();
        nav
    }

    fn assert_single_active(nav: &Navigator) {
        assert_eq!(nav.store().active_indices(), vec![nav.current_index()]);
    }

    #[test]
    fn test_initial_state() {
        let nav = deck(19);
        assert_eq!(nav.current_index(), 0);
        assert_eq!(nav.total_slides(), 19);
        assert!(!nav.is_loading());
        assert_single_active(&nav);
    }

    #[test]
    fn test_empty_deck_is_idle() {
        let mut nav = Navigator::new();
        assert_eq!(nav.next(), Transition::Idle);
        assert_eq!(nav.previous(), Transition::Idle);
        assert_eq!(nav.last(), Transition::Idle);
        assert_eq!(nav.progress_percent(), 0.0);
        assert!(nav.store().active_indices().is_empty());
    }

    #[test]
    fn test_bounds_hold_for_any_sequence() {
        let mut nav = deck(5);
        // A fixed pseudo-random walk heavily biased toward both edges
        let mut seed: u32 = 0x2545_f491;
        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            if seed % 3 == 0 {
                nav.previous();
            } else {
                nav.next();
            }
            assert!(nav.current_index() < nav.total_slides());
            assert_single_active(&nav);
        }
        for _ in 0..20 {
            nav.previous();
        }
        assert_eq!(nav.current_index(), 0);
    }

    #[test]
    fn test_go_to_activates_exactly_one() {
        let mut nav = deck(19);
        for k in [18, 3, 0, 11, 11] {
            assert!(matches!(nav.go_to(k), Ok(Transition::Moved { to, .. }) if to == k));
            assert_eq!(nav.current_index(), k);
            assert_single_active(&nav);
            assert!(nav.store().get(k).unwrap().is_active);
        }
    }

    #[test]
    fn test_go_to_out_of_range_is_noop() {
        let mut nav = deck(4);
        nav.go_to(2).unwrap();
        assert!(matches!(
            nav.go_to(4),
            Err(ViewerError::OutOfRange { index: 4, total: 4 })
        ));
        assert_eq!(nav.current_index(), 2);
        assert_single_active(&nav);
    }

    #[test]
    fn test_progress_at_boundaries() {
        let mut nav = deck(4);
        assert_eq!(nav.progress_percent(), 25.0);
        nav.next();
        assert_eq!(nav.progress_percent(), 50.0);
        nav.last();
        assert_eq!(nav.progress_percent(), 100.0);

        let nav = deck(19);
        assert_eq!(nav.progress_percent(), 1.0 / 19.0 * 100.0);
    }

    #[test]
    fn test_next_at_last_only_bounces() {
        let mut nav = deck(3);
        nav.last();
        let before = nav.state();
        assert_eq!(nav.next(), Transition::Bounced(Edge::Last));
        assert_eq!(nav.next(), Transition::Bounced(Edge::Last));
        assert_eq!(nav.state(), before);
        assert_single_active(&nav);

        nav.first();
        assert_eq!(nav.previous(), Transition::Bounced(Edge::First));
        assert_eq!(nav.current_index(), 0);
    }

    #[test]
    fn test_navigation_while_loading() {
        let mut nav = Navigator::new();
        nav.push_slide(SlideContent::parse("<h1>One</h1>"));
        nav.push_slide(SlideContent::parse("<h1>Two</h1>"));
        assert!(nav.is_loading());
        nav.next();
        assert_eq!(nav.next(), Transition::Bounced(Edge::Last));
        // a later slide arrives; the edge moves with it
        nav.push_slide(SlideContent::parse("<h1>Three</h1>"));
        assert_eq!(nav.next(), Transition::Moved { from: 1, to: 2 });
        assert_single_active(&nav);
    }

    #[test]
    fn test_fullscreen_flag() {
        let mut nav = deck(1);
        assert!(nav.toggle_fullscreen());
        assert!(!nav.toggle_fullscreen());
        nav.set_fullscreen(true);
        assert!(nav.state().is_fullscreen);
    }
}
