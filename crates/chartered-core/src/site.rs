//! Event dispatcher wiring every component to a host page

use tracing::{debug, info};

use crate::components::{
    apply_css_fallback, ContactForm, Counters, LazyImages, Monitor, Navigation, Reveal, ScrollEffects,
    SmoothScroll,
};
use crate::config::SiteConfig;
use crate::dom::{HeadlessPage, Host};
use crate::event::{EventOutcome, FrameTask, ObserverKind, PageEvent, TimerTask};
use crate::Result;

/// Upper bound on derived-event rounds per pump; observers settle in two
const MAX_PUMP_ROUNDS: usize = 16;

/// All interactive behaviour of one page
pub struct Site {
    config: SiteConfig,
    scroll_effects: ScrollEffects,
    navigation: Navigation,
    counters: Counters,
    form: ContactForm,
    reveal: Reveal,
    smooth_scroll: SmoothScroll,
    lazy_images: LazyImages,
    monitor: Monitor,
    initialized: bool,
    fallback_applied: bool,
}

impl Site {
    /// Build every component from a validated configuration
    pub fn new(config: SiteConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            scroll_effects: ScrollEffects::new(&config.scroll)?,
            navigation: Navigation::new(&config.navigation)?,
            counters: Counters::new(&config.counters)?,
            form: ContactForm::new(&config.form)?,
            reveal: Reveal::new(&config.reveal)?,
            smooth_scroll: SmoothScroll::new(&config.smooth_scroll)?,
            lazy_images: LazyImages::new(&config.lazy_images)?,
            monitor: Monitor::new(&config.monitor)?,
            config,
            initialized: false,
            fallback_applied: false,
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn fallback_applied(&self) -> bool {
        self.fallback_applied
    }

    pub fn scroll_effects(&self) -> &ScrollEffects {
        &self.scroll_effects
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn form(&self) -> &ContactForm {
        &self.form
    }

    pub fn reveal(&self) -> &Reveal {
        &self.reveal
    }

    pub fn smooth_scroll(&self) -> &SmoothScroll {
        &self.smooth_scroll
    }

    pub fn lazy_images(&self) -> &LazyImages {
        &self.lazy_images
    }

    /// Set up every component against the loaded page; runs once
    pub fn init(&mut self, host: &mut dyn Host) {
        if self.initialized {
            debug!("Site already initialized");
            return;
        }
        self.fallback_applied = apply_css_fallback(&self.config.fallback, host);
        self.scroll_effects.setup(host);
        self.navigation.setup(host);
        self.counters.setup(host);
        self.form.setup(host);
        self.reveal.setup(host);
        self.lazy_images.setup(host);
        self.initialized = true;
        info!("Site initialized");
    }

    /// Route one page event to the components interested in it
    pub fn dispatch(&mut self, event: PageEvent, host: &mut dyn Host) -> EventOutcome {
        let mut outcome = EventOutcome::default();
        if !self.initialized && !matches!(event, PageEvent::ContentLoaded | PageEvent::Load(_)) {
            debug!(?event, "Event before initialization dropped");
            return outcome;
        }

        match event {
            PageEvent::ContentLoaded => self.init(host),
            PageEvent::Scroll => self.scroll_effects.on_scroll(host),
            PageEvent::Click { target } => {
                self.navigation.on_click(target, host);
                self.smooth_scroll.on_click(target, host, &mut outcome);
                self.monitor.on_click(target, host);
            }
            PageEvent::AnimationFrame { task, .. } => match task {
                FrameTask::ScrollEffects => self.scroll_effects.on_frame(host),
                FrameTask::CounterStep(el) => self.counters.on_frame(el, host),
                FrameTask::SmoothScroll => self.smooth_scroll.on_frame(host),
            },
            PageEvent::Timer(task) => match task {
                TimerTask::Reveal(el) => self.reveal.on_timer(el, host),
                TimerTask::RevertSubmit(form) => self.form.on_revert(form, host),
            },
            PageEvent::Intersection { observer, entries } => match observer {
                ObserverKind::Sections => self.navigation.on_intersection(&entries, host),
                ObserverKind::Counters => self.counters.on_intersection(&entries, host),
                ObserverKind::Reveal => self.reveal.on_intersection(&entries, host),
                ObserverKind::LazyImages => self.lazy_images.on_intersection(&entries, host),
            },
            PageEvent::Submit { form } => self.form.on_submit(form, host, &mut outcome),
            PageEvent::SubmissionSettled { form, outcome: result } => {
                self.form.on_settled(form, &result, host)
            }
            PageEvent::Load(timing) => self.monitor.on_load(timing, host),
        }
        outcome
    }

    /// Deliver scroll and intersection events until the page is quiet
    pub fn pump(&mut self, page: &mut HeadlessPage) {
        for _ in 0..MAX_PUMP_ROUNDS {
            let events = page.take_derived_events();
            if events.is_empty() {
                return;
            }
            for event in events {
                self.dispatch(event, page);
            }
        }
        debug!("Derived events still pending after {} rounds", MAX_PUMP_ROUNDS);
    }

    /// Advance the page clock by `ms`, firing due frames and timers in order
    ///
    /// Submissions stay queued on the page; settle them with
    /// [`PageEvent::SubmissionSettled`] or use the tokio `Driver`.
    pub fn run_for(&mut self, page: &mut HeadlessPage, ms: f64) {
        let end = page.now() + ms;
        self.pump(page);
        while let Some(at) = page.next_deadline().filter(|at| *at <= end) {
            page.advance_to(at);
            for event in page.take_due() {
                self.dispatch(event, page);
            }
            self.pump(page);
        }
        page.advance_to(end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::SubmitPhase;
    use crate::dom::{ElementBuilder, ElementId, ScrollBehavior};
    use crate::event::{NavigationTiming, Report};

    struct Landing {
        page: HeadlessPage,
        toggle: ElementId,
        services_link: ElementId,
        counter: ElementId,
        card: ElementId,
        image: ElementId,
        form: ElementId,
        message: ElementId,
        button: ElementId,
    }

    fn landing() -> Landing {
        let mut page = HeadlessPage::new(800.0);
        page.set_document_height(2800.0);
        let body = page.body_id();
        let header = page.append(body, ElementBuilder::new("header").layout(0.0, 80.0));
        let toggle = page.append(header, ElementBuilder::new("button").id("mobileMenuToggle").html("Menu"));
        let drawer = page.append(header, ElementBuilder::new("nav").id("sidenav"));
        page.append(
            drawer,
            ElementBuilder::new("a").class("nav-link").attr("data-section", "home").attr("href", "#home"),
        );
        let services_link = page.append(
            drawer,
            ElementBuilder::new("a")
                .class("nav-link")
                .attr("data-section", "services")
                .attr("href", "#services")
                .html("Services"),
        );

        let home = page.append(body, ElementBuilder::new("section").id("home").layout(0.0, 1000.0));
        page.append(home, ElementBuilder::new("div").class("floating-elements"));
        let counter = page.append(
            home,
            ElementBuilder::new("span")
                .class("stat-number")
                .attr("data-target", "250")
                .html("0")
                .layout(300.0, 40.0),
        );

        let services = page.append(body, ElementBuilder::new("section").id("services").layout(1000.0, 1000.0));
        let card = page.append(services, ElementBuilder::new("div").class("service-card").layout(1100.0, 300.0));
        let image = page.append(
            services,
            ElementBuilder::new("img")
                .class("lazy")
                .attr("data-src", "audit.jpg")
                .layout(1500.0, 200.0),
        );

        let contact = page.append(body, ElementBuilder::new("section").id("contact").layout(2000.0, 1000.0));
        let form = page.append(contact, ElementBuilder::new("form").id("contactForm"));
        let message = page.append(form, ElementBuilder::new("textarea").attr("name", "message").value(""));
        let button = page.append(
            form,
            ElementBuilder::new("button").attr("type", "submit").html("<span>Send Message</span>"),
        );

        Landing {
            page,
            toggle,
            services_link,
            counter,
            card,
            image,
            form,
            message,
            button,
        }
    }

    fn started() -> (Site, Landing) {
        let mut l = landing();
        let mut site = Site::new(SiteConfig::default()).unwrap();
        site.dispatch(PageEvent::ContentLoaded, &mut l.page);
        site.pump(&mut l.page);
        (site, l)
    }

    #[test]
    fn test_events_before_content_loaded_are_dropped() {
        let mut l = landing();
        let mut site = Site::new(SiteConfig::default()).unwrap();
        let outcome = site.dispatch(PageEvent::Click { target: l.services_link }, &mut l.page);
        assert!(!outcome.default_prevented);
        assert!(!site.is_initialized());
    }

    #[test]
    fn test_visible_counter_runs_on_load() {
        let (mut site, mut l) = started();
        site.run_for(&mut l.page, 3000.0);
        assert_eq!(l.page.text_content(l.counter), "250");
        assert_eq!(site.counters().get(l.counter).map(|c| c.displayed), Some(250));
        assert_eq!(site.navigation().state().current_section.as_deref(), Some("home"));
    }

    #[test]
    fn test_scrolling_reveals_cards_and_loads_images() {
        let (mut site, mut l) = started();
        assert_eq!(l.page.style(l.card, "opacity"), Some("0"));
        assert_eq!(l.page.attribute(l.image, "src"), None);

        l.page.scroll_to(1000.0, ScrollBehavior::Instant);
        site.run_for(&mut l.page, 500.0);

        assert_eq!(l.page.style(l.card, "opacity"), Some("1"));
        assert_eq!(l.page.attribute(l.image, "src").as_deref(), Some("audit.jpg"));
        assert_eq!(site.scroll_effects().state().progress, 50.0);
        assert_eq!(site.navigation().state().current_section.as_deref(), Some("services"));
    }

    #[test]
    fn test_anchor_click_scrolls_and_logs_interaction() {
        let (mut site, mut l) = started();
        let outcome = site.dispatch(PageEvent::Click { target: l.services_link }, &mut l.page);
        assert!(outcome.default_prevented);

        site.run_for(&mut l.page, 1000.0);
        assert_eq!(l.page.scroll_top(), 920.0);
        assert!(l.page.reports().contains(&Report::Interaction {
            label: "Services".to_string()
        }));
    }

    #[test]
    fn test_drawer_toggle_through_dispatch() {
        let (mut site, mut l) = started();
        site.dispatch(PageEvent::Click { target: l.toggle }, &mut l.page);
        assert!(site.navigation().state().drawer.drawer_open);
        assert!(l.page.has_class(l.page.body_id(), "menu-open"));
    }

    #[test]
    fn test_submission_round_trip() {
        let (mut site, mut l) = started();
        l.page.set_value(l.message, "Need an audit");
        let outcome = site.dispatch(PageEvent::Submit { form: l.form }, &mut l.page);
        assert!(outcome.default_prevented);

        let submissions = l.page.take_submissions();
        assert_eq!(submissions[0].1.get("message"), Some("Need an audit"));
        site.dispatch(
            PageEvent::SubmissionSettled {
                form: l.form,
                outcome: Ok(()),
            },
            &mut l.page,
        );
        assert_eq!(l.page.text_content(l.button), "Message Sent!");

        site.run_for(&mut l.page, 3000.0);
        assert_eq!(site.form().state().phase, SubmitPhase::Idle);
        assert_eq!(l.page.inner_html(l.button), "<span>Send Message</span>");
        assert_eq!(l.page.value(l.message), Some(""));
    }

    #[test]
    fn test_load_timing_is_reported() {
        let (mut site, mut l) = started();
        site.dispatch(
            PageEvent::Load(NavigationTiming {
                load_event_start: 10.0,
                load_event_end: 22.0,
            }),
            &mut l.page,
        );
        assert_eq!(l.page.reports(), &[Report::PageLoad { duration_ms: 12.0 }]);
    }

    #[test]
    fn test_fallback_runs_during_init() {
        let mut page = HeadlessPage::new(800.0).without_custom_properties();
        let mut site = Site::new(SiteConfig::default()).unwrap();
        site.dispatch(PageEvent::ContentLoaded, &mut page);
        assert!(site.fallback_applied());
        assert_eq!(page.stylesheets().len(), 1);

        site.init(&mut page);
        assert_eq!(page.stylesheets().len(), 1);
    }
}
