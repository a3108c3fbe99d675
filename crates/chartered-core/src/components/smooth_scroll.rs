//! In-page anchor links that glide to their target below the fixed header

use tracing::debug;

use crate::config::{ScrollMode, SmoothScrollConfig};
use crate::dom::{ElementId, Host, ScrollBehavior};
use crate::event::{EventOutcome, FrameTask};
use crate::motion::ScrollAnimation;
use crate::selector::Selector;
use crate::Result;

pub struct SmoothScroll {
    config: SmoothScrollConfig,
    anchors: Selector,
    animation: Option<ScrollAnimation>,
    frame_pending: bool,
}

impl SmoothScroll {
    pub fn new(config: &SmoothScrollConfig) -> Result<Self> {
        Ok(Self {
            anchors: Selector::parse(&config.anchor_selector)?,
            config: config.clone(),
            animation: None,
            frame_pending: false,
        })
    }

    /// Scroll animation in flight, if any
    pub fn animation(&self) -> Option<&ScrollAnimation> {
        self.animation.as_ref()
    }

    /// Document offset that puts `el` just below the header
    pub fn destination(&self, el: ElementId, host: &dyn Host) -> Option<f64> {
        let metrics = host.scroll_metrics();
        let top = host.bounding_top(el)? + metrics.scroll_top - self.config.header_offset;
        Some(top.clamp(0.0, metrics.max_scroll()))
    }

    pub fn on_click(&mut self, target: ElementId, host: &mut dyn Host, outcome: &mut EventOutcome) {
        let Some(link) = host.closest(target, &self.anchors) else {
            return;
        };
        outcome.prevent_default();

        let href = host.attribute(link, "href").unwrap_or_default();
        let id = href.strip_prefix('#').unwrap_or(&href);
        if id.is_empty() {
            return;
        }
        let Some(section) = host.element_by_id(id) else {
            debug!(href = %href, "Anchor target not found");
            return;
        };
        let Some(top) = self.destination(section, host) else {
            return;
        };

        match self.config.mode {
            ScrollMode::Native => host.scroll_to(top, ScrollBehavior::Smooth),
            ScrollMode::Animated => {
                let from = host.scroll_metrics().scroll_top;
                self.animation = Some(ScrollAnimation::new(
                    from,
                    top,
                    host.now_ms(),
                    self.config.duration_ms as f64,
                    self.config.easing,
                ));
                if !self.frame_pending {
                    self.frame_pending = true;
                    host.request_frame(FrameTask::SmoothScroll);
                }
            }
        }
        debug!(href = %href, top, "Smooth scroll started");
    }

    pub fn on_frame(&mut self, host: &mut dyn Host) {
        self.frame_pending = false;
        let Some(animation) = &self.animation else {
            return;
        };
        let now = host.now_ms();
        host.scroll_to(animation.position_at(now), ScrollBehavior::Instant);
        if animation.is_finished(now) {
            self.animation = None;
        } else {
            self.frame_pending = true;
            host.request_frame(FrameTask::SmoothScroll);
        }
    }
}
