//! Timed rectangle transitions.
//!
//! `RectMotion` models how a styled element moves: instant writes are staged
//! and only take effect once committed (or on the next sample), while a
//! transition always starts from the committed on-screen values. Staging a
//! start rectangle and transitioning without a commit in between therefore
//! animates from the old position, which is why entry slides commit first.

use std::time::Duration;

use crate::models::Rect;

/// Per-property transition durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionTiming {
    /// Duration for `left`.
    pub horizontal: Duration,
    /// Duration for `top`, `width` and `height`.
    pub other: Duration,
}

impl TransitionTiming {
    pub const INSTANT: Self = Self {
        horizontal: Duration::ZERO,
        other: Duration::ZERO,
    };

    /// Slow horizontal slide, quick everything else.
    pub fn slide(slide: Duration, settle: Duration) -> Self {
        Self {
            horizontal: slide,
            other: settle,
        }
    }

    /// Same short duration on every property.
    pub fn settle(settle: Duration) -> Self {
        Self {
            horizontal: settle,
            other: settle,
        }
    }

    pub fn is_instant(&self) -> bool {
        self.horizontal.is_zero() && self.other.is_zero()
    }
}

// ---------------------------------------------------------------------------
// Easing
// ---------------------------------------------------------------------------

/// Maps `t` in [0, 1] to output in [0, 1].
pub type EasingFn = fn(f64) -> f64;

/// CSS `ease`, i.e. `cubic-bezier(0.25, 0.1, 0.25, 1.0)`.
#[inline]
pub fn ease(t: f64) -> f64 {
    cubic_bezier(0.25, 0.1, 0.25, 1.0, t.clamp(0.0, 1.0))
}

fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, t: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    let bezier = |a: f64, b: f64, s: f64| {
        let inv = 1.0 - s;
        3.0 * inv * inv * s * a + 3.0 * inv * s * s * b + s * s * s
    };

    // x(s) is monotonic for x1, x2 in [0, 1]; bisect for the s giving x = t.
    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    let mut s = t;
    for _ in 0..48 {
        let x = bezier(x1, x2, s);
        if (x - t).abs() < 1e-7 {
            break;
        }
        if x < t {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    bezier(y1, y2, s)
}

// ---------------------------------------------------------------------------
// Tween
// ---------------------------------------------------------------------------

/// Interpolates one property from `from` to `to`, starting at `start` on the
/// frame clock. A zero duration jumps straight to `to`.
#[derive(Debug, Clone, Copy)]
struct Tween {
    from: f64,
    to: f64,
    start: Duration,
    duration: Duration,
    easing: EasingFn,
}

impl Tween {
    fn new(from: f64, to: f64, start: Duration, duration: Duration) -> Self {
        Self {
            from,
            to,
            start,
            duration,
            easing: ease,
        }
    }

    fn fixed(value: f64) -> Self {
        Self::new(value, value, Duration::ZERO, Duration::ZERO)
    }

    /// Raw linear progress (before easing), in [0.0, 1.0].
    fn progress(&self, now: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.start);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    fn value(&self, now: Duration) -> f64 {
        if self.is_complete(now) {
            return self.to;
        }
        self.from + (self.to - self.from) * (self.easing)(self.progress(now))
    }

    fn is_complete(&self, now: Duration) -> bool {
        self.duration.is_zero() || now.saturating_sub(self.start) >= self.duration
    }
}

// ---------------------------------------------------------------------------
// RectMotion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RectMotion {
    left: Tween,
    top: Tween,
    width: Tween,
    height: Tween,
    staged: Option<Rect>,
}

impl RectMotion {
    pub fn new(rect: Rect) -> Self {
        Self {
            left: Tween::fixed(rect.left),
            top: Tween::fixed(rect.top),
            width: Tween::fixed(rect.width),
            height: Tween::fixed(rect.height),
            staged: None,
        }
    }

    /// Stage `rect` with no transition.
    pub fn set_instant(&mut self, rect: Rect) {
        self.staged = Some(rect);
    }

    /// Make a staged rectangle the committed on-screen state.
    pub fn commit(&mut self) {
        if let Some(rect) = self.staged.take() {
            *self = Self::new(rect);
        }
    }

    /// Transition every property from its committed value to `rect`.
    /// Any uncommitted staged rectangle is discarded.
    pub fn transition_to(&mut self, rect: Rect, timing: TransitionTiming, now: Duration) {
        self.staged = None;
        let current = self.current(now);
        let tween = |from: f64, to: f64, duration: Duration| Tween::new(from, to, now, duration);
        self.left = tween(current.left, rect.left, timing.horizontal);
        self.top = tween(current.top, rect.top, timing.other);
        self.width = tween(current.width, rect.width, timing.other);
        self.height = tween(current.height, rect.height, timing.other);
    }

    /// On-screen rectangle at `now`. Commits any staged write first.
    pub fn sample(&mut self, now: Duration) -> Rect {
        self.commit();
        self.current(now)
    }

    /// Final rectangle once every running transition has finished.
    pub fn destination(&self) -> Rect {
        self.staged.unwrap_or(Rect::new(
            self.left.to,
            self.top.to,
            self.width.to,
            self.height.to,
        ))
    }

    pub fn is_settled(&self, now: Duration) -> bool {
        self.staged.is_none()
            && self.left.is_complete(now)
            && self.top.is_complete(now)
            && self.width.is_complete(now)
            && self.height.is_complete(now)
    }

    fn current(&self, now: Duration) -> Rect {
        Rect::new(
            self.left.value(now),
            self.top.value(now),
            self.width.value(now),
            self.height.value(now),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn ease_endpoints_and_shape() {
        assert_eq!(ease(0.0), 0.0);
        assert_eq!(ease(1.0), 1.0);
        assert_eq!(ease(-0.5), 0.0);
        assert_eq!(ease(1.5), 1.0);
        assert!((ease(0.5) - 0.8024).abs() < 1e-3);
        let samples: Vec<f64> = (0..=100).map(|i| ease(i as f64 / 100.0)).collect();
        assert!(samples.windows(2).all(|w| w[0] <= w[1] + 1e-12));
    }

    #[test]
    fn timing_helpers() {
        assert!(TransitionTiming::INSTANT.is_instant());
        let slide = TransitionTiming::slide(ms(4000), ms(300));
        assert_eq!(slide.horizontal, ms(4000));
        assert_eq!(slide.other, ms(300));
        assert!(!TransitionTiming::settle(ms(300)).is_instant());
    }

    #[test]
    fn committed_start_then_slide_animates_from_start() {
        let mut motion = RectMotion::new(Rect::new(0.0, 0.0, 0.0, 0.0));
        let start = Rect::new(800.0, 216.0, 192.0, 108.0);
        let target = Rect::new(300.0, 216.0, 192.0, 108.0);

        motion.set_instant(start);
        motion.commit();
        motion.transition_to(target, TransitionTiming::slide(ms(4000), ms(300)), ms(1000));

        assert_eq!(motion.sample(ms(1000)), start);
        let mid = motion.sample(ms(3000));
        assert!(mid.left < 800.0 && mid.left > 300.0);
        assert_eq!(mid.top, 216.0);
        assert!(!motion.is_settled(ms(3000)));
        assert_eq!(motion.sample(ms(5000)), target);
        assert!(motion.is_settled(ms(5000)));
    }

    #[test]
    fn uncommitted_start_is_coalesced_away() {
        let old = Rect::new(50.0, 0.0, 192.0, 108.0);
        let mut motion = RectMotion::new(old);
        motion.set_instant(Rect::new(800.0, 0.0, 192.0, 108.0));
        motion.transition_to(
            Rect::new(300.0, 0.0, 192.0, 108.0),
            TransitionTiming::slide(ms(4000), ms(300)),
            ms(0),
        );
        assert_eq!(motion.sample(ms(0)).left, 50.0);
    }

    #[test]
    fn instant_write_applies_on_next_sample() {
        let mut motion = RectMotion::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        let rect = Rect::new(5.0, 6.0, 7.0, 8.0);
        motion.set_instant(rect);
        assert!(!motion.is_settled(ms(0)));
        assert_eq!(motion.destination(), rect);
        assert_eq!(motion.sample(ms(0)), rect);
        assert!(motion.is_settled(ms(0)));
    }

    #[test]
    fn size_settles_before_horizontal_slide() {
        let mut motion = RectMotion::new(Rect::new(800.0, 0.0, 100.0, 108.0));
        motion.transition_to(
            Rect::new(300.0, 108.0, 192.0, 108.0),
            TransitionTiming::slide(ms(4000), ms(300)),
            ms(0),
        );
        let r = motion.sample(ms(300));
        assert_eq!(r.top, 108.0);
        assert_eq!(r.width, 192.0);
        assert!(r.left > 300.0);
    }

    #[test]
    fn retarget_mid_flight_starts_from_current_value() {
        let mut motion = RectMotion::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        motion.transition_to(
            Rect::new(1000.0, 0.0, 10.0, 10.0),
            TransitionTiming::settle(ms(1000)),
            ms(0),
        );
        let mid = motion.sample(ms(500)).left;
        motion.transition_to(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            TransitionTiming::settle(ms(1000)),
            ms(500),
        );
        assert!((motion.sample(ms(500)).left - mid).abs() < 1e-9);
    }
}
