//! Interactive behaviour for the Chartered Audits marketing site
//!
//! Components (scroll progress, navigation, counters, the contact form,
//! reveal animations, anchor scrolling, lazy images, diagnostics) are plain
//! state machines fed by [`PageEvent`]s through [`Site::dispatch`]. They reach
//! the page only through the [`Host`] trait, so the same code runs in the
//! browser (`chartered-web`) and against [`HeadlessPage`] in tests.

pub mod components;
pub mod config;
pub mod dom;
pub mod error;
pub mod event;
pub mod motion;
pub mod selector;
pub mod site;
pub mod submit;

#[cfg(feature = "runtime")]
pub mod logging;
#[cfg(feature = "runtime")]
pub mod runtime;

pub use config::SiteConfig;
pub use dom::{ElementId, HeadlessPage, Host};
pub use error::{Error, Result};
pub use event::{EventOutcome, PageEvent};
pub use selector::Selector;
pub use site::Site;
pub use submit::Submitter;

#[cfg(feature = "runtime")]
pub use runtime::Driver;
