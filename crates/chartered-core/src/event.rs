//! Messages exchanged between a host page and the [`Site`](crate::Site) dispatcher

use crate::dom::ElementId;
use crate::Error;

/// Work a component asked to run on the next animation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FrameTask {
    /// Coalesced progress bar and parallax update
    ScrollEffects,
    /// Advance one counter by one increment
    CounterStep(ElementId),
    /// Advance the eased in-page scroll
    SmoothScroll,
}

/// Work a component asked to run after a delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerTask {
    /// Make one staggered reveal item visible
    Reveal(ElementId),
    /// Put the submit control of a form back to idle
    RevertSubmit(ElementId),
}

/// The intersection observers the site registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObserverKind {
    Sections,
    Counters,
    Reveal,
    LazyImages,
}

impl ObserverKind {
    pub const ALL: [ObserverKind; 4] = [
        ObserverKind::Sections,
        ObserverKind::Counters,
        ObserverKind::Reveal,
        ObserverKind::LazyImages,
    ];
}

/// One element's entry in an intersection report
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub target: ElementId,
    pub is_intersecting: bool,
    pub ratio: f64,
}

impl IntersectionEntry {
    pub fn entering(target: ElementId) -> Self {
        Self {
            target,
            is_intersecting: true,
            ratio: 1.0,
        }
    }

    pub fn leaving(target: ElementId) -> Self {
        Self {
            target,
            is_intersecting: false,
            ratio: 0.0,
        }
    }
}

/// Timestamps of the navigation performance entry, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NavigationTiming {
    pub load_event_start: f64,
    pub load_event_end: f64,
}

/// Everything that can happen to the page
#[derive(Debug)]
pub enum PageEvent {
    /// Initial page content is ready
    ContentLoaded,
    /// The document scrolled
    Scroll,
    /// A click bubbled to the document from `target`
    Click { target: ElementId },
    AnimationFrame { task: FrameTask, timestamp: f64 },
    Timer(TimerTask),
    Intersection {
        observer: ObserverKind,
        entries: Vec<IntersectionEntry>,
    },
    /// A form is being submitted
    Submit { form: ElementId },
    /// The submission started for `form` finished
    SubmissionSettled {
        form: ElementId,
        outcome: Result<(), Error>,
    },
    /// The page finished loading
    Load(NavigationTiming),
}

/// Diagnostics emitted to the host's logging channel
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    PageLoad { duration_ms: f64 },
    Interaction { label: String },
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Report::PageLoad { duration_ms } => write!(f, "Page Load Time: {}", duration_ms),
            Report::Interaction { label } => write!(f, "Interaction: {}", label),
        }
    }
}

/// What the host should do with the native event after dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventOutcome {
    pub default_prevented: bool,
}

impl EventOutcome {
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }
}
