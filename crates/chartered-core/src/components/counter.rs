//! Statistic counters that count up once when first scrolled into view

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::CounterConfig;
use crate::dom::{ElementId, Host, ObserverOptions};
use crate::event::{FrameTask, IntersectionEntry, ObserverKind};
use crate::selector::Selector;
use crate::Result;

/// Per-counter animation state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterState {
    pub target: i64,
    /// Accumulated, unrounded value
    pub current: f64,
    pub increment: f64,
    /// Set on first entry into the viewport; never cleared
    pub animated: bool,
    /// Value currently shown
    pub displayed: i64,
}

impl CounterState {
    fn new(target: i64, steps: u32) -> Self {
        Self {
            target,
            current: 0.0,
            increment: target as f64 / steps as f64,
            animated: false,
            displayed: 0,
        }
    }

    /// Advance one frame; returns true while more frames are needed
    fn step(&mut self) -> bool {
        if self.current < self.target as f64 {
            self.current += self.increment;
            // Float accumulation may overshoot by an ulp; never show more than the target
            self.displayed = (self.current.ceil() as i64).min(self.target);
            true
        } else {
            self.displayed = self.target;
            false
        }
    }
}

pub struct Counters {
    selector: Selector,
    target_attribute: String,
    animated_class: String,
    steps: u32,
    observer: ObserverOptions,
    counters: BTreeMap<ElementId, CounterState>,
}

impl Counters {
    pub fn new(config: &CounterConfig) -> Result<Self> {
        Ok(Self {
            selector: Selector::parse(&config.selector)?,
            target_attribute: config.target_attribute.clone(),
            animated_class: config.animated_class.clone(),
            steps: config.steps.max(1),
            observer: config.observer.resolve()?,
            counters: BTreeMap::new(),
        })
    }

    pub fn get(&self, el: ElementId) -> Option<&CounterState> {
        self.counters.get(&el)
    }

    pub fn setup(&mut self, host: &mut dyn Host) {
        host.register_observer(ObserverKind::Counters, self.observer.clone());
        for el in host.query_all(&self.selector) {
            let raw = host.attribute(el, &self.target_attribute);
            match raw.as_deref().map(parse_target) {
                Some(Some(target)) => {
                    self.counters.insert(el, CounterState::new(target, self.steps));
                    host.observe(ObserverKind::Counters, el);
                }
                _ => warn!(?el, value = ?raw, "Counter without a numeric target skipped"),
            }
        }
    }

    pub fn on_intersection(&mut self, entries: &[IntersectionEntry], host: &mut dyn Host) {
        for entry in entries.iter().filter(|e| e.is_intersecting) {
            let el = entry.target;
            let Some(counter) = self.counters.get_mut(&el) else {
                continue;
            };
            if counter.animated || host.has_class(el, &self.animated_class) {
                continue;
            }
            counter.animated = true;
            host.set_class(el, &self.animated_class, true);
            host.unobserve(ObserverKind::Counters, el);
            debug!(?el, target = counter.target, "Counter animation started");
            self.on_frame(el, host);
        }
    }

    /// Run one step and schedule the next one if needed
    pub fn on_frame(&mut self, el: ElementId, host: &mut dyn Host) {
        let Some(counter) = self.counters.get_mut(&el) else {
            return;
        };
        let more = counter.step();
        host.set_inner_html(el, &counter.displayed.to_string());
        if more {
            host.request_frame(FrameTask::CounterStep(el));
        }
    }
}

/// Leading integer of an attribute value, like `parseInt`
fn parse_target(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let end = trimmed
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}
