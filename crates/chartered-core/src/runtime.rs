//! Tokio driver for running a [`Site`] against a [`HeadlessPage`]
//!
//! The driver maps the page's virtual clock onto tokio time, so frames,
//! timers, and in-flight submissions interleave the way they would in a
//! browser. Under a paused tokio clock whole interaction sequences run
//! instantly and deterministically.

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::FormConfig;
use crate::dom::{ElementId, HeadlessPage, Host, ScrollBehavior};
use crate::event::{EventOutcome, NavigationTiming, PageEvent};
use crate::site::Site;
use crate::submit::{SimulatedSubmitter, Submitter};
use crate::Result;

type SubmissionFuture = Pin<Box<dyn Future<Output = Result<()>>>>;

struct InFlight {
    form: ElementId,
    future: SubmissionFuture,
}

enum Wake {
    Settled(ElementId, Result<()>),
    Clock,
}

/// Pick the submitter the form configuration asks for
pub fn submitter_for(config: &FormConfig) -> Result<Rc<dyn Submitter>> {
    let simulated = || -> Rc<dyn Submitter> {
        Rc::new(SimulatedSubmitter::new(Duration::from_millis(config.simulated_delay_ms)))
    };
    match &config.endpoint {
        #[cfg(feature = "http")]
        Some(endpoint) => Ok(Rc::new(crate::submit::HttpSubmitter::new(endpoint)?)),
        #[cfg(not(feature = "http"))]
        Some(endpoint) => {
            warn!(endpoint = %endpoint, "HTTP support disabled, simulating submissions");
            Ok(simulated())
        }
        None => Ok(simulated()),
    }
}

fn ms_to_duration(ms: f64) -> Duration {
    Duration::from_micros((ms.max(0.0) * 1000.0).ceil() as u64)
}

async fn settle(in_flight: &mut Option<InFlight>) -> (ElementId, Result<()>) {
    match in_flight {
        Some(job) => {
            let result = job.future.as_mut().await;
            (job.form, result)
        }
        None => std::future::pending().await,
    }
}

pub struct Driver {
    site: Site,
    page: HeadlessPage,
    submitter: Rc<dyn Submitter>,
    in_flight: Option<InFlight>,
    origin: Instant,
}

impl Driver {
    pub fn new(site: Site, page: HeadlessPage, submitter: Rc<dyn Submitter>) -> Self {
        Self {
            site,
            page,
            submitter,
            in_flight: None,
            origin: Instant::now(),
        }
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn page(&self) -> &HeadlessPage {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut HeadlessPage {
        &mut self.page
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Fire `ContentLoaded` and deliver the first observer reports
    pub fn start(&mut self) {
        self.dispatch(PageEvent::ContentLoaded);
    }

    /// Report the page load with the given navigation timing
    pub fn load(&mut self, timing: NavigationTiming) {
        self.dispatch(PageEvent::Load(timing));
    }

    pub fn click(&mut self, target: ElementId) -> EventOutcome {
        self.dispatch(PageEvent::Click { target })
    }

    pub fn submit(&mut self, form: ElementId) -> EventOutcome {
        self.dispatch(PageEvent::Submit { form })
    }

    /// Scroll like a user would, instantly
    pub fn scroll_to(&mut self, top: f64) {
        self.sync_clock();
        self.page.scroll_to(top, ScrollBehavior::Instant);
        self.settle_page();
    }

    /// Dispatch one event and everything it immediately causes
    pub fn dispatch(&mut self, event: PageEvent) -> EventOutcome {
        self.sync_clock();
        let outcome = self.site.dispatch(event, &mut self.page);
        self.settle_page();
        outcome
    }

    /// Let `duration` of tokio time pass, running frames, timers, and
    /// submissions as they come due
    pub async fn advance(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        loop {
            let next_ms = self.page.next_deadline();
            let wake = next_ms.map_or(deadline, |ms| (self.origin + ms_to_duration(ms)).min(deadline));

            let woke = tokio::select! {
                biased;
                (form, result) = settle(&mut self.in_flight) => Wake::Settled(form, result),
                _ = tokio::time::sleep_until(wake) => Wake::Clock,
            };

            self.sync_clock();
            let clock = matches!(woke, Wake::Clock);
            match woke {
                Wake::Settled(form, outcome) => {
                    self.in_flight = None;
                    debug!(ok = outcome.is_ok(), "Submission settled");
                    self.site
                        .dispatch(PageEvent::SubmissionSettled { form, outcome }, &mut self.page);
                }
                Wake::Clock => {
                    // Tokio rounds to whole milliseconds; never leave a due task behind
                    if let Some(ms) = next_ms.filter(|ms| self.origin + ms_to_duration(*ms) <= Instant::now()) {
                        self.page.advance_to(ms);
                    }
                    for event in self.page.take_due() {
                        self.site.dispatch(event, &mut self.page);
                    }
                }
            }
            self.settle_page();

            if clock && Instant::now() >= deadline {
                break;
            }
        }
    }

    /// Move the page clock to tokio's current time
    fn sync_clock(&mut self) {
        let elapsed = Instant::now().duration_since(self.origin);
        self.page.advance_to(elapsed.as_micros() as f64 / 1000.0);
    }

    /// Deliver derived events and start any requested submissions
    fn settle_page(&mut self) {
        self.site.pump(&mut self.page);
        for (form, data) in self.page.take_submissions() {
            if self.in_flight.is_some() {
                warn!(?form, "Submission already in flight, request dropped");
                continue;
            }
            let submitter = Rc::clone(&self.submitter);
            self.in_flight = Some(InFlight {
                form,
                future: Box::pin(async move { submitter.submit(data).await }),
            });
        }
    }
}
