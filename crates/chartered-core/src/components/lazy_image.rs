//! Deferred image loading: the real source is swapped in on first sight

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::LazyImageConfig;
use crate::dom::{ElementId, Host, ObserverOptions};
use crate::event::{IntersectionEntry, ObserverKind};
use crate::selector::Selector;
use crate::Result;

pub struct LazyImages {
    selector: Selector,
    source_attribute: String,
    lazy_class: String,
    observer: ObserverOptions,
    pending: BTreeSet<ElementId>,
    loaded: BTreeSet<ElementId>,
}

impl LazyImages {
    pub fn new(config: &LazyImageConfig) -> Result<Self> {
        Ok(Self {
            selector: Selector::parse(&config.selector)?,
            source_attribute: config.source_attribute.clone(),
            lazy_class: config.lazy_class.clone(),
            observer: config.observer.resolve()?,
            pending: BTreeSet::new(),
            loaded: BTreeSet::new(),
        })
    }

    pub fn is_loaded(&self, el: ElementId) -> bool {
        self.loaded.contains(&el)
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn setup(&mut self, host: &mut dyn Host) {
        host.register_observer(ObserverKind::LazyImages, self.observer.clone());
        for img in host.query_all(&self.selector) {
            host.observe(ObserverKind::LazyImages, img);
            self.pending.insert(img);
        }
    }

    pub fn on_intersection(&mut self, entries: &[IntersectionEntry], host: &mut dyn Host) {
        for entry in entries.iter().filter(|e| e.is_intersecting) {
            let img = entry.target;
            if !self.pending.remove(&img) {
                continue;
            }
            host.unobserve(ObserverKind::LazyImages, img);
            let Some(src) = host.attribute(img, &self.source_attribute) else {
                continue;
            };
            host.set_attribute(img, "src", &src);
            host.set_class(img, &self.lazy_class, false);
            self.loaded.insert(img);
            debug!(src = %src, "Lazy image loaded");
        }
    }
}
