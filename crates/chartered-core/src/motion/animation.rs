//! Scroll animation state advanced once per animation frame

use super::easing::EasingType;
use super::timing::{is_complete, lerp, progress};

/// An in-flight eased scroll from one document offset to another
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollAnimation {
    /// Host time the animation started at
    start_ms: f64,
    from: f64,
    to: f64,
    duration_ms: f64,
    easing: EasingType,
}

impl ScrollAnimation {
    pub fn new(from: f64, to: f64, start_ms: f64, duration_ms: f64, easing: EasingType) -> Self {
        Self {
            start_ms,
            from,
            to,
            duration_ms,
            easing,
        }
    }

    /// Final scroll offset
    pub fn target(&self) -> f64 {
        self.to
    }

    /// Interpolated offset at `now_ms`
    pub fn position_at(&self, now_ms: f64) -> f64 {
        if is_complete(self.start_ms, now_ms, self.duration_ms) {
            return self.to;
        }
        let t = progress(self.start_ms, now_ms, self.duration_ms);
        lerp(self.from, self.to, self.easing.apply(t))
    }

    pub fn is_finished(&self, now_ms: f64) -> bool {
        is_complete(self.start_ms, now_ms, self.duration_ms)
    }
}
