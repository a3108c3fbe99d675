//! Eased motion for frame-driven animations
//!
//! ## Atomic layer
//! - `easing` - pure easing curves mapping [0, 1] to [0, 1]
//! - `timing` - progress and interpolation helpers on the host clock
//!
//! ## Molecular layer
//! - `animation` - a scroll animation combining both, advanced once per frame

pub mod easing;
pub mod timing;

pub mod animation;

pub use animation::ScrollAnimation;
pub use easing::EasingType;
