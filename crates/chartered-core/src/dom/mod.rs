//! Page abstraction shared by every component
//!
//! Components never talk to a browser directly. They go through [`Host`],
//! which is implemented by the wasm binding in `chartered-web` and by
//! [`HeadlessPage`] for native runs and tests.

pub mod geometry;
mod headless;

pub use geometry::{intersect, Intersection, Length, ObserverOptions, ObserverSpec, RootMargin};
pub use headless::{ElementBuilder, HeadlessPage, FRAME_INTERVAL_MS};

use crate::event::{FrameTask, ObserverKind, Report, TimerTask};
use crate::selector::Selector;

/// Opaque handle to an element owned by a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

/// Document scroll position and extent, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    /// Largest reachable scroll offset
    pub fn max_scroll(&self) -> f64 {
        (self.scroll_height - self.client_height).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Instant,
    Smooth,
}

/// Ordered snapshot of a form's named fields
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormData {
    pub fields: Vec<(String, String)>,
}

impl FormData {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Everything a component may ask of the page it runs in
///
/// Missing elements are never an error: queries return `None` or an empty
/// list and mutations of unknown handles are ignored.
pub trait Host {
    // Queries

    fn query_all(&self, selector: &Selector) -> Vec<ElementId>;
    fn element_by_id(&self, id: &str) -> Option<ElementId>;
    fn body(&self) -> Option<ElementId>;
    /// Whether `node` is `ancestor` or one of its descendants
    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool;
    /// Nearest inclusive ancestor of `node` matching `selector`
    fn closest(&self, node: ElementId, selector: &Selector) -> Option<ElementId>;
    /// First descendant of `root` matching `selector`
    fn query_within(&self, root: ElementId, selector: &Selector) -> Option<ElementId>;
    fn attribute(&self, el: ElementId, name: &str) -> Option<String>;
    fn has_class(&self, el: ElementId, class: &str) -> bool;
    fn text_content(&self, el: ElementId) -> String;
    fn inner_html(&self, el: ElementId) -> String;
    fn form_data(&self, form: ElementId) -> FormData;
    fn supports_custom_properties(&self) -> bool;

    // Mutation

    fn set_class(&mut self, el: ElementId, class: &str, on: bool);
    fn set_attribute(&mut self, el: ElementId, name: &str, value: &str);
    /// Set an inline style property; an empty value removes it
    fn set_style(&mut self, el: ElementId, property: &str, value: &str);
    fn set_inner_html(&mut self, el: ElementId, html: &str);
    fn set_disabled(&mut self, el: ElementId, disabled: bool);
    /// Create a `<tag class="...">` and append it to `parent`
    fn create_element(&mut self, tag: &str, class: &str, parent: ElementId) -> Option<ElementId>;
    fn inject_stylesheet(&mut self, css: &str);
    /// Restore every field of a form to its default value
    fn reset_form(&mut self, form: ElementId);

    // Geometry

    fn scroll_metrics(&self) -> ScrollMetrics;
    /// Top edge of the element relative to the viewport
    fn bounding_top(&self, el: ElementId) -> Option<f64>;
    fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior);

    // Scheduling

    fn request_frame(&mut self, task: FrameTask);
    fn set_timeout(&mut self, delay_ms: u64, task: TimerTask);
    fn register_observer(&mut self, kind: ObserverKind, options: ObserverOptions);
    fn observe(&mut self, kind: ObserverKind, el: ElementId);
    fn unobserve(&mut self, kind: ObserverKind, el: ElementId);
    /// Hand the form's data to the submitter; the host answers with
    /// [`PageEvent::SubmissionSettled`](crate::PageEvent::SubmissionSettled)
    fn begin_submission(&mut self, form: ElementId, data: FormData);
    /// Milliseconds on the host's monotonic clock
    fn now_ms(&self) -> f64;

    // Diagnostics

    fn report(&mut self, report: Report);
}
