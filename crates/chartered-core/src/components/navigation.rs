//! Mobile drawer toggling and active-section link highlighting

use tracing::debug;

use crate::config::NavigationConfig;
use crate::dom::{ElementId, Host, ObserverOptions};
use crate::event::{IntersectionEntry, ObserverKind};
use crate::selector::Selector;
use crate::Result;

/// Drawer flags; the three always change together
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawerState {
    pub drawer_open: bool,
    pub toggle_active: bool,
    pub scroll_locked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
    pub drawer: DrawerState,
    /// Identifier of the section currently in the band
    pub current_section: Option<String>,
    pub active_link: Option<ElementId>,
}

pub struct Navigation {
    config: NavigationConfig,
    links: Selector,
    sections: Selector,
    observer: ObserverOptions,
    toggle: Option<ElementId>,
    drawer: Option<ElementId>,
    link_targets: Vec<(ElementId, Option<String>)>,
    state: NavigationState,
}

impl Navigation {
    pub fn new(config: &NavigationConfig) -> Result<Self> {
        Ok(Self {
            links: Selector::parse(&config.link_selector)?,
            sections: Selector::parse(&config.section_selector)?,
            observer: config.observer.resolve()?,
            config: config.clone(),
            toggle: None,
            drawer: None,
            link_targets: Vec::new(),
            state: NavigationState::default(),
        })
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn setup(&mut self, host: &mut dyn Host) {
        self.toggle = host.element_by_id(&self.config.toggle_id);
        self.drawer = host.element_by_id(&self.config.drawer_id);
        if self.toggle.is_none() || self.drawer.is_none() {
            debug!("Mobile menu markup missing, drawer disabled");
        }

        self.link_targets = host
            .query_all(&self.links)
            .into_iter()
            .map(|link| (link, host.attribute(link, &self.config.section_attribute)))
            .collect();

        host.register_observer(ObserverKind::Sections, self.observer.clone());
        for section in host.query_all(&self.sections) {
            host.observe(ObserverKind::Sections, section);
        }
    }

    pub fn on_click(&mut self, target: ElementId, host: &mut dyn Host) {
        let (Some(toggle), Some(drawer)) = (self.toggle, self.drawer) else {
            return;
        };

        if host.contains(toggle, target) {
            let open = !self.state.drawer.drawer_open;
            self.apply_drawer(open, toggle, drawer, host);
        } else if self.state.drawer.drawer_open && !host.contains(drawer, target) {
            self.apply_drawer(false, toggle, drawer, host);
        }
    }

    fn apply_drawer(&mut self, open: bool, toggle: ElementId, drawer: ElementId, host: &mut dyn Host) {
        host.set_class(drawer, &self.config.open_class, open);
        host.set_class(toggle, &self.config.toggle_active_class, open);
        if let Some(body) = host.body() {
            host.set_class(body, &self.config.body_lock_class, open);
        }
        self.state.drawer = DrawerState {
            drawer_open: open,
            toggle_active: open,
            scroll_locked: open,
        };
        debug!(open, "Mobile drawer toggled");
    }

    /// Mark the link of every intersecting section; the last one in the
    /// batch ends up active
    pub fn on_intersection(&mut self, entries: &[IntersectionEntry], host: &mut dyn Host) {
        for entry in entries.iter().filter(|e| e.is_intersecting) {
            let Some(id) = host.attribute(entry.target, "id") else {
                continue;
            };
            self.activate(&id, host);
        }
    }

    fn activate(&mut self, section: &str, host: &mut dyn Host) {
        let mut active = None;
        for (link, target) in &self.link_targets {
            let on = target.as_deref() == Some(section);
            host.set_class(*link, &self.config.active_link_class, on);
            if on {
                active = Some(*link);
            }
        }
        self.state.current_section = Some(section.to_string());
        self.state.active_link = active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementBuilder, HeadlessPage};

    struct Fixture {
        page: HeadlessPage,
        nav: Navigation,
        toggle: ElementId,
        drawer: ElementId,
        drawer_link: ElementId,
        outside: ElementId,
        links: Vec<ElementId>,
        sections: Vec<ElementId>,
    }

    fn fixture() -> Fixture {
        let mut page = HeadlessPage::new(1000.0);
        let body = page.body_id();
        let toggle = page.append(body, ElementBuilder::new("button").id("mobileMenuToggle"));
        let drawer = page.append(body, ElementBuilder::new("nav").id("sidenav"));
        let mut links = Vec::new();
        for name in ["home", "services", "contact"] {
            links.push(page.append(
                drawer,
                ElementBuilder::new("a").class("nav-link").attr("data-section", name),
            ));
        }
        let drawer_link = links[0];
        let main = page.append(body, ElementBuilder::new("main"));
        let mut sections = Vec::new();
        for (i, name) in ["home", "services", "contact"].iter().enumerate() {
            sections.push(page.append(
                main,
                ElementBuilder::new("section").id(name).layout(i as f64 * 1000.0, 1000.0),
            ));
        }
        let outside = page.append(main, ElementBuilder::new("p"));

        let mut nav = Navigation::new(&NavigationConfig::default()).unwrap();
        nav.setup(&mut page);
        Fixture {
            page,
            nav,
            toggle,
            drawer,
            drawer_link,
            outside,
            links,
            sections,
        }
    }

    fn active_links(f: &Fixture) -> Vec<ElementId> {
        f.links
            .iter()
            .copied()
            .filter(|l| f.page.has_class(*l, "active"))
            .collect()
    }

    #[test]
    fn test_toggle_flips_all_flags_together() {
        let mut f = fixture();
        f.nav.on_click(f.toggle, &mut f.page);

        let drawer = f.nav.state().drawer;
        assert!(drawer.drawer_open && drawer.toggle_active && drawer.scroll_locked);
        assert!(f.page.has_class(f.drawer, "open"));
        assert!(f.page.has_class(f.toggle, "active"));
        assert!(f.page.has_class(f.page.body_id(), "menu-open"));

        f.nav.on_click(f.toggle, &mut f.page);
        assert_eq!(f.nav.state().drawer, DrawerState::default());
        assert!(!f.page.has_class(f.page.body_id(), "menu-open"));
    }

    #[test]
    fn test_outside_click_closes_inside_click_does_not() {
        let mut f = fixture();
        f.nav.on_click(f.toggle, &mut f.page);

        f.nav.on_click(f.drawer_link, &mut f.page);
        assert!(f.nav.state().drawer.drawer_open);

        f.nav.on_click(f.outside, &mut f.page);
        assert!(!f.nav.state().drawer.drawer_open);
        assert!(!f.page.has_class(f.drawer, "open"));
    }

    #[test]
    fn test_outside_click_while_closed_is_noop() {
        let mut f = fixture();
        f.nav.on_click(f.outside, &mut f.page);
        assert_eq!(f.nav.state().drawer, DrawerState::default());
    }

    #[test]
    fn test_single_section_marks_single_link() {
        let mut f = fixture();
        let entries = [IntersectionEntry::entering(f.sections[1])];
        f.nav.on_intersection(&entries, &mut f.page);
        assert_eq!(active_links(&f), vec![f.links[1]]);

        // Repeating the same report changes nothing
        f.nav.on_intersection(&entries, &mut f.page);
        assert_eq!(active_links(&f), vec![f.links[1]]);
        assert_eq!(f.nav.state().current_section.as_deref(), Some("services"));
    }

    #[test]
    fn test_last_intersecting_section_wins() {
        let mut f = fixture();
        let entries = [
            IntersectionEntry::entering(f.sections[0]),
            IntersectionEntry::leaving(f.sections[1]),
            IntersectionEntry::entering(f.sections[2]),
        ];
        f.nav.on_intersection(&entries, &mut f.page);
        assert_eq!(active_links(&f), vec![f.links[2]]);
        assert_eq!(f.nav.state().active_link, Some(f.links[2]));
    }

    #[test]
    fn test_missing_markup_is_inert() {
        let mut page = HeadlessPage::new(800.0);
        let stray = page.append(page.body_id(), ElementBuilder::new("div"));
        let mut nav = Navigation::new(&NavigationConfig::default()).unwrap();
        nav.setup(&mut page);
        nav.on_click(stray, &mut page);
        assert_eq!(nav.state(), &NavigationState::default());
    }
}
