//! Timed presentation effects: edge shake and slide entrance.
//!
//! Effects are timestamps compared against the frame clock. None of them
//! blocks navigation; starting a new one simply replaces the old.

use std::time::{Duration, Instant};

use crate::nav::Edge;

pub const SHAKE_DURATION: Duration = Duration::from_millis(500);
/// Peak horizontal displacement of a shaking button, in points.
pub const SHAKE_AMPLITUDE: f32 = 5.0;
/// Vertical distance an element rises while fading in, in points.
pub const RISE_DISTANCE: f32 = 20.0;

/// Shake keyframes at 0%, 25%, 50%, 75% and 100%, in units of amplitude.
const SHAKE_KEYFRAMES: [f32; 5] = [0.0, -1.0, 1.0, -1.0, 0.0];

/// Smooth cubic ease-in-out over `0..=1`.
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Horizontal shake offset `elapsed` into the animation.
pub fn shake_offset(elapsed: Duration) -> f32 {
    if elapsed >= SHAKE_DURATION {
        return 0.0;
    }
    let t = ease_in_out(elapsed.as_secs_f32() / SHAKE_DURATION.as_secs_f32());
    let pos = t * (SHAKE_KEYFRAMES.len() - 1) as f32;
    let i = (pos.floor() as usize).min(SHAKE_KEYFRAMES.len() - 2);
    let frac = pos - i as f32;
    let value = SHAKE_KEYFRAMES[i] + (SHAKE_KEYFRAMES[i + 1] - SHAKE_KEYFRAMES[i]) * frac;
    value * SHAKE_AMPLITUDE
}

/// Delay, stagger and length of a per-element entrance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntranceTiming {
    pub delay: Duration,
    pub stagger: Duration,
    pub duration: Duration,
}

impl EntranceTiming {
    /// Used whenever a slide becomes active.
    pub const STANDARD: Self = Self {
        delay: Duration::from_millis(50),
        stagger: Duration::from_millis(100),
        duration: Duration::from_millis(500),
    };

    /// Slower reveal for the very first slide of the session.
    pub const INTRO: Self = Self {
        delay: Duration::from_millis(300),
        stagger: Duration::from_millis(200),
        duration: Duration::from_millis(800),
    };

    /// When element `n` finishes.
    fn end_of(&self, n: usize) -> Duration {
        self.delay + self.stagger * n as u32 + self.duration
    }
}

/// Opacity and downward offset of something mid-entrance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Appearance {
    pub opacity: f32,
    pub offset_y: f32,
}

impl Appearance {
    pub const SETTLED: Self = Self {
        opacity: 1.0,
        offset_y: 0.0,
    };

    fn at(progress: f32) -> Self {
        let eased = ease_in_out(progress);
        Self {
            opacity: eased,
            offset_y: (1.0 - eased) * RISE_DISTANCE,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Entrance {
    slide: usize,
    started: Instant,
    timing: EntranceTiming,
    elements: usize,
}

#[derive(Debug, Default)]
pub struct Effects {
    shake: Option<(Edge, Instant)>,
    entrance: Option<Entrance>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shake(&mut self, edge: Edge, now: Instant) {
        self.shake = Some((edge, now));
    }

    /// Offset for the button guarding `edge`.
    pub fn shake_offset(&self, edge: Edge, now: Instant) -> f32 {
        match self.shake {
            Some((e, started)) if e == edge => shake_offset(now.saturating_duration_since(started)),
            _ => 0.0,
        }
    }

    /// Start the entrance of `slide`, which has `elements` animated elements.
    pub fn enter(&mut self, slide: usize, elements: usize, timing: EntranceTiming, now: Instant) {
        self.entrance = Some(Entrance {
            slide,
            started: now,
            timing,
            elements,
        });
    }

    /// The slide as a whole: a plain fade and rise over the standard duration.
    pub fn slide_appearance(&self, slide: usize, now: Instant) -> Appearance {
        match self.entrance {
            Some(e) if e.slide == slide => {
                let elapsed = now.saturating_duration_since(e.started).as_secs_f32();
                Appearance::at(elapsed / EntranceTiming::STANDARD.duration.as_secs_f32())
            }
            _ => Appearance::SETTLED,
        }
    }

    /// Animated element `n` (0-based, headings excluded) of `slide`.
    pub fn element_appearance(&self, slide: usize, n: usize, now: Instant) -> Appearance {
        let Some(e) = self.entrance.filter(|e| e.slide == slide) else {
            return Appearance::SETTLED;
        };
        let start = e.started + e.timing.delay + e.timing.stagger * n as u32;
        if now < start {
            return Appearance::at(0.0);
        }
        let elapsed = now.duration_since(start).as_secs_f32();
        Appearance::at(elapsed / e.timing.duration.as_secs_f32())
    }

    /// True while anything still moves, so the UI keeps repainting.
    pub fn is_animating(&self, now: Instant) -> bool {
        let shaking = self
            .shake
            .is_some_and(|(_, started)| now.saturating_duration_since(started) < SHAKE_DURATION);
        let entering = self.entrance.is_some_and(|e| {
            let longest = e
                .timing
                .end_of(e.elements.saturating_sub(1))
                .max(EntranceTiming::STANDARD.duration);
            now.saturating_duration_since(e.started) < longest
        });
        shaking || entering
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_ease_in_out_endpoints() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(0.5), 0.5);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert_eq!(ease_in_out(-3.0), 0.0);
        assert_eq!(ease_in_out(7.0), 1.0);
    }

    #[test]
    fn test_shake_keyframes() {
        assert_eq!(shake_offset(ms(0)), 0.0);
        // eased midpoint lands on the 50% keyframe
        assert_eq!(shake_offset(ms(250)), SHAKE_AMPLITUDE);
        assert_eq!(shake_offset(ms(500)), 0.0);
        assert_eq!(shake_offset(ms(900)), 0.0);
        for t in (0..500).step_by(7) {
            assert!(shake_offset(ms(t)).abs() <= SHAKE_AMPLITUDE);
        }
    }

    #[test]
    fn test_shake_targets_one_edge() {
        let t0 = Instant::now();
        let mut fx = Effects::new();
        fx.shake(Edge::Last, t0);
        assert_eq!(fx.shake_offset(Edge::Last, t0 + ms(250)), SHAKE_AMPLITUDE);
        assert_eq!(fx.shake_offset(Edge::First, t0 + ms(250)), 0.0);
        assert!(fx.is_animating(t0 + ms(100)));
        assert!(!fx.is_animating(t0 + ms(600)));
    }

    #[test]
    fn test_staggered_entrance() {
        let t0 = Instant::now();
        let mut fx = Effects::new();
        fx.enter(3, 4, EntranceTiming::STANDARD, t0);

        // second element has not started while the first is halfway
        let at = t0 + ms(50 + 250);
        let first = fx.element_appearance(3, 0, at);
        assert_eq!(first.opacity, 0.5);
        assert_eq!(first.offset_y, RISE_DISTANCE / 2.0);
        let fourth = fx.element_appearance(3, 3, at);
        assert_eq!(fourth.opacity, 0.0);
        assert_eq!(fourth.offset_y, RISE_DISTANCE);

        // other slides are untouched
        assert_eq!(fx.element_appearance(2, 0, at), Appearance::SETTLED);

        let done = t0 + ms(50 + 300 + 500);
        assert_eq!(fx.element_appearance(3, 3, done), Appearance::SETTLED);
        assert!(!fx.is_animating(done));
        assert!(fx.is_animating(done - ms(1)));
    }

    #[test]
    fn test_intro_is_slower() {
        let t0 = Instant::now();
        let mut fx = Effects::new();
        fx.enter(0, 2, EntranceTiming::INTRO, t0);
        assert_eq!(fx.element_appearance(0, 0, t0 + ms(250)).opacity, 0.0);
        assert_eq!(fx.element_appearance(0, 1, t0 + ms(300 + 200 + 400)).opacity, 0.5);
    }

    #[test]
    fn test_slide_fades_in() {
        let t0 = Instant::now();
        let mut fx = Effects::new();
        fx.enter(1, 0, EntranceTiming::STANDARD, t0);
        assert_eq!(fx.slide_appearance(1, t0).opacity, 0.0);
        assert_eq!(fx.slide_appearance(1, t0 + ms(500)), Appearance::SETTLED);
        assert_eq!(fx.slide_appearance(0, t0), Appearance::SETTLED);
    }
}
