//! Runs the site behaviour in the browser
//!
//! On `DOMContentLoaded` the configuration is read from an optional
//! `<script type="application/toml" id="site-config">` block, a [`Site`] is
//! built, and page events are forwarded to it through [`WebHost`].

mod host;
pub mod logging;
mod submit;

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, Context};
use chartered_core::event::{NavigationTiming, PageEvent};
use chartered_core::{EventOutcome, Site, SiteConfig, Submitter};
use gloo::events::{EventListener, EventListenerOptions};
use gloo::timers::callback::Timeout;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, PerformanceNavigationTiming};

pub use host::WebHost;
pub use submit::{FetchSubmitter, TimerSubmitter};

/// Id of the inline configuration block
const CONFIG_ELEMENT_ID: &str = "site-config";

/// Console log filter
const LOG_FILTER: &str = "info";

thread_local! {
    static APP: RefCell<Option<Rc<App>>> = const { RefCell::new(None) };
}

/// The mounted site: state, host, and the listeners feeding it
pub struct App {
    site: RefCell<Site>,
    host: RefCell<WebHost>,
    listeners: RefCell<Vec<EventListener>>,
}

impl App {
    /// Dispatch one event; events arriving while another is handled are dropped
    pub(crate) fn dispatch(self: &Rc<Self>, event: PageEvent) -> EventOutcome {
        let (Ok(mut site), Ok(mut host)) = (self.site.try_borrow_mut(), self.host.try_borrow_mut()) else {
            tracing::warn!(?event, "Re-entrant event dropped");
            return EventOutcome::default();
        };
        site.dispatch(event, &mut *host)
    }

    pub(crate) fn run_frame(self: &Rc<Self>, timestamp: f64) {
        let tasks = match self.host.try_borrow_mut() {
            Ok(mut host) => host.take_frame(),
            Err(_) => return,
        };
        for task in tasks {
            self.dispatch(PageEvent::AnimationFrame { task, timestamp });
        }
    }

    pub(crate) fn deliver_intersections(self: &Rc<Self>, observer: chartered_core::event::ObserverKind, entries: &js_sys::Array) {
        let entries = match self.host.try_borrow() {
            Ok(host) => host.intersection_entries(entries),
            Err(_) => return,
        };
        if !entries.is_empty() {
            self.dispatch(PageEvent::Intersection { observer, entries });
        }
    }

    fn event_target(self: &Rc<Self>, event: &Event) -> Option<chartered_core::ElementId> {
        let element = event.target()?.dyn_into::<Element>().ok()?;
        let host = self.host.try_borrow().ok()?;
        Some(host.register(element))
    }

    fn listen(self: &Rc<Self>, listener: EventListener) {
        self.listeners.borrow_mut().push(listener);
    }

    fn install_listeners(self: &Rc<Self>, window: &web_sys::Window, document: &web_sys::Document) {
        let app = Rc::downgrade(self);
        self.listen(EventListener::new_with_options(
            window,
            "scroll",
            EventListenerOptions {
                passive: true,
                ..EventListenerOptions::default()
            },
            move |_| {
                if let Some(app) = app.upgrade() {
                    app.dispatch(PageEvent::Scroll);
                }
            },
        ));

        let app = Rc::downgrade(self);
        self.listen(EventListener::new_with_options(
            document,
            "click",
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                let Some(app) = app.upgrade() else {
                    return;
                };
                let Some(target) = app.event_target(event) else {
                    return;
                };
                if app.dispatch(PageEvent::Click { target }).default_prevented {
                    event.prevent_default();
                }
            },
        ));

        let app = Rc::downgrade(self);
        self.listen(EventListener::new_with_options(
            document,
            "submit",
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                let Some(app) = app.upgrade() else {
                    return;
                };
                let Some(form) = app.event_target(event) else {
                    return;
                };
                if app.dispatch(PageEvent::Submit { form }).default_prevented {
                    event.prevent_default();
                }
            },
        ));

        let app = Rc::downgrade(self);
        let load_window = window.clone();
        self.listen(EventListener::once(window, "load", move |_| {
            // loadEventEnd is only filled in once the load handlers returned
            Timeout::new(0, move || {
                if let (Some(app), Some(timing)) = (app.upgrade(), navigation_timing(&load_window)) {
                    app.dispatch(PageEvent::Load(timing));
                }
            })
            .forget();
        }));
    }
}

fn navigation_timing(window: &web_sys::Window) -> Option<NavigationTiming> {
    let entries = window.performance()?.get_entries_by_type("navigation");
    let entry = entries.get(0).dyn_into::<PerformanceNavigationTiming>().ok()?;
    Some(NavigationTiming {
        load_event_start: entry.load_event_start(),
        load_event_end: entry.load_event_end(),
    })
}

/// Parse the inline configuration text, falling back to defaults when absent
pub fn config_from_script(text: Option<&str>) -> anyhow::Result<SiteConfig> {
    match text.map(str::trim).filter(|t| !t.is_empty()) {
        Some(text) => SiteConfig::from_toml_str(text).context("Invalid inline site configuration"),
        None => Ok(SiteConfig::default()),
    }
}

/// Like [`config_from_script`], but a broken block only costs its overrides
pub fn config_or_default(text: Option<&str>) -> SiteConfig {
    config_from_script(text).unwrap_or_else(|e| {
        tracing::error!("{:#}; using the default configuration", e);
        SiteConfig::default()
    })
}

fn submitter_for(config: &SiteConfig) -> Rc<dyn Submitter> {
    match &config.form.endpoint {
        Some(endpoint) => Rc::new(FetchSubmitter::new(endpoint)),
        None => Rc::new(TimerSubmitter::new(config.form.simulated_delay_ms)),
    }
}

fn mount() -> anyhow::Result<()> {
    let window = web_sys::window().ok_or_else(|| anyhow!("No window"))?;
    let document = window.document().ok_or_else(|| anyhow!("No document"))?;

    let script = document
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|el| el.text_content());
    let config = config_or_default(script.as_deref());
    let submitter = submitter_for(&config);
    let site = Site::new(config).context("Failed to build site")?;

    let app = Rc::new_cyclic(|weak| App {
        site: RefCell::new(site),
        host: RefCell::new(WebHost::new(window.clone(), document.clone(), submitter, weak.clone())),
        listeners: RefCell::new(Vec::new()),
    });
    app.dispatch(PageEvent::ContentLoaded);
    app.install_listeners(&window, &document);

    APP.with(|slot| *slot.borrow_mut() = Some(app));
    Ok(())
}

fn mount_logged() {
    if let Err(e) = mount() {
        gloo::console::error!(format!("Site initialization failed: {:#}", e));
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    logging::init(LOG_FILTER);
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("No document"))?;

    if document.ready_state() == "loading" {
        EventListener::once(&document, "DOMContentLoaded", |_| mount_logged()).forget();
    } else {
        mount_logged();
    }
    Ok(())
}
