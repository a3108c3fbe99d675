//! Interactive behaviours of the site
//!
//! Each component owns its slice of state and touches the page only through
//! [`Host`](crate::dom::Host). The [`Site`](crate::Site) dispatcher routes
//! events to them.

pub mod counter;
pub mod fallback;
pub mod form;
pub mod lazy_image;
pub mod monitor;
pub mod navigation;
pub mod reveal;
pub mod scroll_effects;
pub mod smooth_scroll;

pub use counter::{CounterState, Counters};
pub use fallback::apply_css_fallback;
pub use form::{ContactForm, FormState, SubmitPhase};
pub use lazy_image::LazyImages;
pub use monitor::Monitor;
pub use navigation::{DrawerState, Navigation, NavigationState};
pub use reveal::{Reveal, RevealPhase};
pub use scroll_effects::{scroll_progress, ScrollEffects, ScrollEffectsState};
pub use smooth_scroll::SmoothScroll;
