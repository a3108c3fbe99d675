//! Scroll progress bar and parallax, throttled to one update per frame

use tracing::debug;

use crate::config::ScrollConfig;
use crate::dom::{ElementId, Host, ScrollMetrics};
use crate::event::FrameTask;
use crate::selector::Selector;
use crate::Result;

/// Scroll progress in percent, clamped to [0, 100]
///
/// Content that cannot scroll reports 0.
pub fn scroll_progress(metrics: &ScrollMetrics) -> f64 {
    let scrollable = metrics.scroll_height - metrics.client_height;
    if scrollable <= 0.0 {
        return 0.0;
    }
    (metrics.scroll_top / scrollable * 100.0).clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrollEffectsState {
    /// A frame callback is scheduled and further scroll signals are dropped
    pub frame_pending: bool,
    pub progress: f64,
    pub parallax_offset: f64,
    /// Completed frame updates
    pub updates: u64,
}

pub struct ScrollEffects {
    parallax: Selector,
    speed: f64,
    progress_class: String,
    progress_bar_class: String,
    progress_bar: Option<ElementId>,
    state: ScrollEffectsState,
}

impl ScrollEffects {
    pub fn new(config: &ScrollConfig) -> Result<Self> {
        Ok(Self {
            parallax: Selector::parse(&config.parallax_selector)?,
            speed: config.parallax_speed,
            progress_class: config.progress_class.clone(),
            progress_bar_class: config.progress_bar_class.clone(),
            progress_bar: None,
            state: ScrollEffectsState::default(),
        })
    }

    pub fn state(&self) -> &ScrollEffectsState {
        &self.state
    }

    pub fn progress_bar(&self) -> Option<ElementId> {
        self.progress_bar
    }

    /// Append the progress container and bar to the body
    pub fn setup(&mut self, host: &mut dyn Host) {
        let Some(body) = host.body() else {
            debug!("No body, progress bar skipped");
            return;
        };
        let bar = host
            .create_element("div", &self.progress_class, body)
            .and_then(|container| host.create_element("div", &self.progress_bar_class, container));
        self.progress_bar = bar;
    }

    pub fn on_scroll(&mut self, host: &mut dyn Host) {
        if self.state.frame_pending {
            return;
        }
        self.state.frame_pending = true;
        host.request_frame(FrameTask::ScrollEffects);
    }

    pub fn on_frame(&mut self, host: &mut dyn Host) {
        self.state.frame_pending = false;
        let metrics = host.scroll_metrics();

        self.state.progress = scroll_progress(&metrics);
        if let Some(bar) = self.progress_bar {
            host.set_style(bar, "width", &format!("{}%", self.state.progress));
        }

        self.state.parallax_offset = metrics.scroll_top * self.speed;
        let transform = format!("translateY({}px)", self.state.parallax_offset);
        for el in host.query_all(&self.parallax) {
            host.set_style(el, "transform", &transform);
        }
        self.state.updates += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementBuilder, HeadlessPage, ScrollBehavior};
    use crate::event::PageEvent;

    fn metrics(top: f64, height: f64, client: f64) -> ScrollMetrics {
        ScrollMetrics {
            scroll_top: top,
            scroll_height: height,
            client_height: client,
        }
    }

    #[test]
    fn test_progress_guards_unscrollable_content() {
        assert_eq!(scroll_progress(&metrics(0.0, 800.0, 800.0)), 0.0);
        assert_eq!(scroll_progress(&metrics(50.0, 600.0, 800.0)), 0.0);
    }

    #[test]
    fn test_progress_is_clamped() {
        assert_eq!(scroll_progress(&metrics(500.0, 1800.0, 800.0)), 50.0);
        assert_eq!(scroll_progress(&metrics(4000.0, 1800.0, 800.0)), 100.0);
        assert_eq!(scroll_progress(&metrics(-20.0, 1800.0, 800.0)), 0.0);
    }

    #[test]
    fn test_scroll_burst_coalesces_into_one_frame() {
        let mut page = HeadlessPage::new(800.0);
        page.set_document_height(1800.0);
        let floating = page.append(page.body_id(), ElementBuilder::new("div").class("floating-elements"));
        let mut effects = ScrollEffects::new(&ScrollConfig::default()).unwrap();
        effects.setup(&mut page);

        page.scroll_to(500.0, ScrollBehavior::Instant);
        for _ in 0..5 {
            effects.on_scroll(&mut page);
        }
        assert_eq!(page.pending_frames(), &[FrameTask::ScrollEffects]);
        assert!(effects.state().frame_pending);

        page.advance_to(16.0);
        for event in page.take_due() {
            if let PageEvent::AnimationFrame { task: FrameTask::ScrollEffects, .. } = event {
                effects.on_frame(&mut page);
            }
        }

        assert_eq!(effects.state().updates, 1);
        assert!(!effects.state().frame_pending);
        let bar = effects.progress_bar().unwrap();
        assert_eq!(page.style(bar, "width"), Some("50%"));
        assert_eq!(page.style(floating, "transform"), Some("translateY(250px)"));
    }

    #[test]
    fn test_progress_bar_is_nested_in_container() {
        let mut page = HeadlessPage::new(800.0);
        let mut effects = ScrollEffects::new(&ScrollConfig::default()).unwrap();
        effects.setup(&mut page);

        let bar = effects.progress_bar().unwrap();
        assert!(page.has_class(bar, "scroll-progress-bar"));
        let container = page.children(page.body_id())[0];
        assert!(page.has_class(container, "scroll-progress"));
        assert!(page.contains(container, bar));
    }
}
