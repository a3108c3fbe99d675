//! Time calculation utilities for frame-driven animations
//!
//! Times are milliseconds on the host clock (`Host::now_ms`), which is
//! `performance.now()` in a browser and the virtual clock in headless runs.

/// Animation progress (0.0 to 1.0) from start time, current time, and duration
///
/// # Returns
/// Progress value clamped to [0.0, 1.0]
#[inline]
pub fn progress(start_ms: f64, now_ms: f64, duration_ms: f64) -> f64 {
    if duration_ms <= 0.0 {
        return 1.0;
    }
    ((now_ms - start_ms) / duration_ms).clamp(0.0, 1.0)
}

/// Check if animation is complete
#[inline]
pub fn is_complete(start_ms: f64, now_ms: f64, duration_ms: f64) -> bool {
    now_ms - start_ms >= duration_ms
}

/// Linear interpolation between two values
#[inline]
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}
