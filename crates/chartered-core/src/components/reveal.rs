//! Staggered fade-and-rise of cards as they enter the viewport

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::RevealConfig;
use crate::dom::{ElementId, Host, ObserverOptions};
use crate::event::{IntersectionEntry, ObserverKind, TimerTask};
use crate::selector::Selector;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealPhase {
    #[default]
    Hidden,
    /// Reveal timer is running
    Scheduled,
    Revealed,
}

pub struct Reveal {
    selector: Selector,
    stagger_ms: u64,
    offset_px: f64,
    transition: String,
    observer: ObserverOptions,
    items: BTreeMap<ElementId, RevealPhase>,
}

impl Reveal {
    pub fn new(config: &RevealConfig) -> Result<Self> {
        Ok(Self {
            selector: Selector::parse(&config.selector)?,
            stagger_ms: config.stagger_ms,
            offset_px: config.offset_px,
            transition: config.transition.clone(),
            observer: config.observer.resolve()?,
            items: BTreeMap::new(),
        })
    }

    pub fn phase(&self, el: ElementId) -> Option<RevealPhase> {
        self.items.get(&el).copied()
    }

    /// Hide every item and start observing it
    pub fn setup(&mut self, host: &mut dyn Host) {
        host.register_observer(ObserverKind::Reveal, self.observer.clone());
        let hidden = format!("translateY({}px)", self.offset_px);
        for el in host.query_all(&self.selector) {
            host.set_style(el, "opacity", "0");
            host.set_style(el, "transform", &hidden);
            host.set_style(el, "transition", &self.transition);
            host.observe(ObserverKind::Reveal, el);
            self.items.insert(el, RevealPhase::Hidden);
        }
        debug!(items = self.items.len(), "Reveal items hidden");
    }

    /// Schedule each newly visible item, delayed by its position in the batch
    pub fn on_intersection(&mut self, entries: &[IntersectionEntry], host: &mut dyn Host) {
        for (index, entry) in entries.iter().enumerate() {
            if !entry.is_intersecting {
                continue;
            }
            let Some(phase) = self.items.get_mut(&entry.target) else {
                continue;
            };
            if *phase != RevealPhase::Hidden {
                continue;
            }
            *phase = RevealPhase::Scheduled;
            host.set_timeout(index as u64 * self.stagger_ms, TimerTask::Reveal(entry.target));
            host.unobserve(ObserverKind::Reveal, entry.target);
        }
    }

    pub fn on_timer(&mut self, el: ElementId, host: &mut dyn Host) {
        let Some(phase) = self.items.get_mut(&el) else {
            return;
        };
        if *phase == RevealPhase::Revealed {
            return;
        }
        *phase = RevealPhase::Revealed;
        host.set_style(el, "opacity", "1");
        host.set_style(el, "transform", "translateY(0)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementBuilder, HeadlessPage};
    use crate::event::PageEvent;

    fn setup(count: usize) -> (HeadlessPage, Reveal, Vec<ElementId>) {
        let mut page = HeadlessPage::new(800.0);
        let body = page.body_id();
        let classes = ["service-card", "client-card", "benefit-item"];
        let cards = (0..count)
            .map(|i| page.append(body, ElementBuilder::new("div").class(classes[i % 3])))
            .collect();
        let mut reveal = Reveal::new(&RevealConfig::default()).unwrap();
        reveal.setup(&mut page);
        (page, reveal, cards)
    }

    fn fire_until(page: &mut HeadlessPage, reveal: &mut Reveal, ms: f64) {
        page.advance_to(ms);
        for event in page.take_due() {
            if let PageEvent::Timer(TimerTask::Reveal(el)) = event {
                reveal.on_timer(el, page);
            }
        }
    }

    #[test]
    fn test_items_start_hidden_and_observed() {
        let (page, reveal, cards) = setup(3);
        for card in &cards {
            assert_eq!(page.style(*card, "opacity"), Some("0"));
            assert_eq!(page.style(*card, "transform"), Some("translateY(30px)"));
            assert_eq!(
                page.style(*card, "transition"),
                Some("opacity 0.6s ease, transform 0.6s ease")
            );
            assert!(page.is_observed(ObserverKind::Reveal, *card));
            assert_eq!(reveal.phase(*card), Some(RevealPhase::Hidden));
        }
    }

    #[test]
    fn test_batch_is_staggered_by_position() {
        let (mut page, mut reveal, cards) = setup(3);
        let entries: Vec<_> = cards.iter().map(|c| IntersectionEntry::entering(*c)).collect();
        reveal.on_intersection(&entries, &mut page);

        fire_until(&mut page, &mut reveal, 0.0);
        assert_eq!(page.style(cards[0], "opacity"), Some("1"));
        assert_eq!(page.style(cards[1], "opacity"), Some("0"));

        fire_until(&mut page, &mut reveal, 100.0);
        assert_eq!(page.style(cards[1], "opacity"), Some("1"));
        assert_eq!(page.style(cards[2], "opacity"), Some("0"));

        fire_until(&mut page, &mut reveal, 200.0);
        assert_eq!(page.style(cards[2], "transform"), Some("translateY(0)"));
        assert!(cards.iter().all(|c| reveal.phase(*c) == Some(RevealPhase::Revealed)));
    }

    #[test]
    fn test_stagger_counts_non_intersecting_entries() {
        let (mut page, mut reveal, cards) = setup(2);
        let entries = [IntersectionEntry::leaving(cards[0]), IntersectionEntry::entering(cards[1])];
        reveal.on_intersection(&entries, &mut page);

        fire_until(&mut page, &mut reveal, 99.0);
        assert_eq!(page.style(cards[1], "opacity"), Some("0"));
        fire_until(&mut page, &mut reveal, 100.0);
        assert_eq!(page.style(cards[1], "opacity"), Some("1"));
        assert_eq!(reveal.phase(cards[0]), Some(RevealPhase::Hidden));
    }

    #[test]
    fn test_revealed_items_stay_revealed() {
        let (mut page, mut reveal, cards) = setup(1);
        reveal.on_intersection(&[IntersectionEntry::entering(cards[0])], &mut page);
        assert!(!page.is_observed(ObserverKind::Reveal, cards[0]));
        fire_until(&mut page, &mut reveal, 0.0);

        reveal.on_intersection(&[IntersectionEntry::leaving(cards[0])], &mut page);
        reveal.on_intersection(&[IntersectionEntry::entering(cards[0])], &mut page);
        assert_eq!(page.pending_timers(), 0);
        assert_eq!(page.style(cards[0], "opacity"), Some("1"));
    }
}
