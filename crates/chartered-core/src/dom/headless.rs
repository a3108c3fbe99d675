//! In-memory page used for native runs and tests
//!
//! `HeadlessPage` keeps a small element tree with layout boxes, a viewport,
//! and a virtual millisecond clock. Frames, timers, observers, and
//! submissions are queued rather than executed; the caller decides when time
//! moves and delivers the resulting events (see [`Site::run_for`] and the
//! tokio `Driver`).
//!
//! [`Site::run_for`]: crate::Site::run_for

use std::collections::{BTreeMap, HashMap};

use crate::dom::geometry::{intersect, ObserverOptions};
use crate::dom::{ElementId, FormData, Host, ScrollBehavior, ScrollMetrics};
use crate::event::{FrameTask, IntersectionEntry, ObserverKind, PageEvent, Report, TimerTask};
use crate::selector::{ElementView, Selector};

/// Delay between two animation frames (~60fps)
pub const FRAME_INTERVAL_MS: f64 = 16.0;

#[derive(Debug, Clone, Default)]
struct Node {
    tag: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    style: BTreeMap<String, String>,
    html: String,
    value: String,
    default_value: String,
    disabled: bool,
    /// Offset of the top edge from the document top
    top: f64,
    height: f64,
}

impl ElementView for Node {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn attr(&self, name: &str) -> Option<&str> {
        if name == "class" {
            return None;
        }
        self.attrs.get(name).map(String::as_str)
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// Fluent description of an element to append to a [`HeadlessPage`]
#[derive(Debug, Clone, Default)]
pub struct ElementBuilder {
    node: Node,
}

impl ElementBuilder {
    pub fn new(tag: &str) -> Self {
        Self {
            node: Node {
                tag: tag.to_ascii_lowercase(),
                ..Default::default()
            },
        }
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(mut self, class: &str) -> Self {
        for c in class.split_whitespace() {
            if !self.node.has_class(c) {
                self.node.classes.push(c.to_string());
            }
        }
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.node.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn html(mut self, html: &str) -> Self {
        self.node.html = html.to_string();
        self
    }

    /// Current and default value of a form field
    pub fn value(mut self, value: &str) -> Self {
        self.node.value = value.to_string();
        self.node.default_value = value.to_string();
        self
    }

    /// Document offset and height of the element box
    pub fn layout(mut self, top: f64, height: f64) -> Self {
        self.node.top = top;
        self.node.height = height;
        self
    }
}

#[derive(Debug, Clone)]
struct PendingTimer {
    due: f64,
    seq: u64,
    task: TimerTask,
}

#[derive(Debug, Clone, Default)]
struct Observer {
    options: ObserverOptions,
    /// Observed elements with their last reported state
    targets: Vec<(ElementId, Option<bool>)>,
}

/// A page that lives entirely in memory
#[derive(Debug, Clone)]
pub struct HeadlessPage {
    nodes: Vec<Node>,
    body: ElementId,
    viewport_height: f64,
    document_height: Option<f64>,
    scroll_top: f64,
    scroll_pending: bool,
    now_ms: f64,
    frames: Vec<FrameTask>,
    frame_due: Option<f64>,
    timers: Vec<PendingTimer>,
    timer_seq: u64,
    observers: BTreeMap<ObserverKind, Observer>,
    submissions: Vec<(ElementId, FormData)>,
    stylesheets: Vec<String>,
    reports: Vec<Report>,
    scroll_requests: Vec<(f64, ScrollBehavior)>,
    custom_properties: bool,
}

impl HeadlessPage {
    /// Empty page with a `<body>` and the given viewport height
    pub fn new(viewport_height: f64) -> Self {
        Self {
            nodes: vec![Node {
                tag: "body".to_string(),
                ..Default::default()
            }],
            body: ElementId(0),
            viewport_height,
            document_height: None,
            scroll_top: 0.0,
            scroll_pending: false,
            now_ms: 0.0,
            frames: Vec::new(),
            frame_due: None,
            timers: Vec::new(),
            timer_seq: 0,
            observers: BTreeMap::new(),
            submissions: Vec::new(),
            stylesheets: Vec::new(),
            reports: Vec::new(),
            scroll_requests: Vec::new(),
            custom_properties: true,
        }
    }

    /// Pretend the engine lacks CSS custom property support
    pub fn without_custom_properties(mut self) -> Self {
        self.custom_properties = false;
        self
    }

    /// Fix the scrollable height instead of deriving it from element boxes
    pub fn set_document_height(&mut self, height: f64) {
        self.document_height = Some(height);
    }

    pub fn body_id(&self) -> ElementId {
        self.body
    }

    /// Append an element under `parent` and return its handle
    pub fn append(&mut self, parent: ElementId, builder: ElementBuilder) -> ElementId {
        let id = ElementId(self.nodes.len());
        let mut node = builder.node;
        node.parent = Some(parent);
        self.nodes.push(node);
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.push(id);
        }
        id
    }

    fn node(&self, el: ElementId) -> Option<&Node> {
        self.nodes.get(el.0)
    }

    fn node_mut(&mut self, el: ElementId) -> Option<&mut Node> {
        self.nodes.get_mut(el.0)
    }

    /// Descendants of `root` in document order, excluding `root`
    fn descendants(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self
            .node(root)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.node(id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    // Inspection helpers

    pub fn style(&self, el: ElementId, property: &str) -> Option<&str> {
        self.node(el)?.style.get(property).map(String::as_str)
    }

    pub fn value(&self, el: ElementId) -> Option<&str> {
        self.node(el).map(|n| n.value.as_str())
    }

    pub fn set_value(&mut self, el: ElementId, value: &str) {
        if let Some(node) = self.node_mut(el) {
            node.value = value.to_string();
        }
    }

    pub fn is_disabled(&self, el: ElementId) -> bool {
        self.node(el).is_some_and(|n| n.disabled)
    }

    pub fn children(&self, el: ElementId) -> &[ElementId] {
        self.node(el).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn stylesheets(&self) -> &[String] {
        &self.stylesheets
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn scroll_requests(&self) -> &[(f64, ScrollBehavior)] {
        &self.scroll_requests
    }

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    pub fn is_observed(&self, kind: ObserverKind, el: ElementId) -> bool {
        self.observers
            .get(&kind)
            .is_some_and(|o| o.targets.iter().any(|(t, _)| *t == el))
    }

    pub fn pending_frames(&self) -> &[FrameTask] {
        &self.frames
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn has_pending_work(&self) -> bool {
        !self.frames.is_empty() || !self.timers.is_empty()
    }

    // Clock and queues

    pub fn now(&self) -> f64 {
        self.now_ms
    }

    /// Move the virtual clock forward; it never goes backwards
    pub fn advance_to(&mut self, now_ms: f64) {
        if now_ms > self.now_ms {
            self.now_ms = now_ms;
        }
    }

    /// Earliest time at which a frame or timer becomes due
    pub fn next_deadline(&self) -> Option<f64> {
        let timer = self.timers.iter().map(|t| t.due).reduce(f64::min);
        match (timer, self.frame_due) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Timers and frames due at the current time, timers first
    pub fn take_due(&mut self) -> Vec<PageEvent> {
        let now = self.now_ms;
        let mut due: Vec<PendingTimer> = Vec::new();
        self.timers.retain(|t| {
            if t.due <= now {
                due.push(t.clone());
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)));

        let mut events: Vec<PageEvent> = due.into_iter().map(|t| PageEvent::Timer(t.task)).collect();

        if self.frame_due.is_some_and(|at| at <= now) {
            self.frame_due = None;
            events.extend(
                std::mem::take(&mut self.frames)
                    .into_iter()
                    .map(|task| PageEvent::AnimationFrame { task, timestamp: now }),
            );
        }
        events
    }

    /// Scroll and intersection events caused by changes since the last call
    pub fn take_derived_events(&mut self) -> Vec<PageEvent> {
        let mut events = Vec::new();
        if std::mem::take(&mut self.scroll_pending) {
            events.push(PageEvent::Scroll);
        }

        let viewport = self.viewport_height;
        let scroll_top = self.scroll_top;
        let boxes: HashMap<ElementId, (f64, f64)> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (ElementId(i), (n.top - scroll_top, n.height)))
            .collect();

        for (kind, observer) in self.observers.iter_mut() {
            let mut entries = Vec::new();
            for (target, last) in observer.targets.iter_mut() {
                let Some(&(top, height)) = boxes.get(&*target) else {
                    continue;
                };
                let hit = intersect(top, height, viewport, &observer.options);
                if *last != Some(hit.is_intersecting) {
                    *last = Some(hit.is_intersecting);
                    entries.push(IntersectionEntry {
                        target: *target,
                        is_intersecting: hit.is_intersecting,
                        ratio: hit.ratio,
                    });
                }
            }
            if !entries.is_empty() {
                events.push(PageEvent::Intersection {
                    observer: *kind,
                    entries,
                });
            }
        }
        events
    }

    /// Submissions requested since the last call
    pub fn take_submissions(&mut self) -> Vec<(ElementId, FormData)> {
        std::mem::take(&mut self.submissions)
    }
}

/// Drop markup tags, keeping text
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn is_form_field(tag: &str) -> bool {
    matches!(tag, "input" | "textarea" | "select")
}

impl Host for HeadlessPage {
    fn query_all(&self, selector: &Selector) -> Vec<ElementId> {
        self.descendants(self.body)
            .into_iter()
            .filter(|id| self.node(*id).is_some_and(|n| selector.matches(n)))
            .collect()
    }

    fn element_by_id(&self, id: &str) -> Option<ElementId> {
        self.descendants(self.body)
            .into_iter()
            .find(|el| self.node(*el).and_then(|n| n.attr("id")) == Some(id))
    }

    fn body(&self) -> Option<ElementId> {
        Some(self.body)
    }

    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).and_then(|n| n.parent);
        }
        false
    }

    fn closest(&self, node: ElementId, selector: &Selector) -> Option<ElementId> {
        let mut current = Some(node);
        while let Some(id) = current {
            let n = self.node(id)?;
            if selector.matches(n) {
                return Some(id);
            }
            current = n.parent;
        }
        None
    }

    fn query_within(&self, root: ElementId, selector: &Selector) -> Option<ElementId> {
        self.descendants(root)
            .into_iter()
            .find(|id| self.node(*id).is_some_and(|n| selector.matches(n)))
    }

    fn attribute(&self, el: ElementId, name: &str) -> Option<String> {
        self.node(el)?.attrs.get(name).cloned()
    }

    fn has_class(&self, el: ElementId, class: &str) -> bool {
        self.node(el).is_some_and(|n| n.has_class(class))
    }

    fn text_content(&self, el: ElementId) -> String {
        let Some(node) = self.node(el) else {
            return String::new();
        };
        let mut text = strip_tags(&node.html);
        for child in &node.children {
            text.push_str(&self.text_content(*child));
        }
        text
    }

    fn inner_html(&self, el: ElementId) -> String {
        self.node(el).map(|n| n.html.clone()).unwrap_or_default()
    }

    fn form_data(&self, form: ElementId) -> FormData {
        let fields = self
            .descendants(form)
            .into_iter()
            .filter_map(|id| self.node(id))
            .filter(|n| is_form_field(&n.tag))
            .filter_map(|n| n.attrs.get("name").map(|name| (name.clone(), n.value.clone())))
            .collect();
        FormData { fields }
    }

    fn supports_custom_properties(&self) -> bool {
        self.custom_properties
    }

    fn set_class(&mut self, el: ElementId, class: &str, on: bool) {
        if let Some(node) = self.node_mut(el) {
            let present = node.has_class(class);
            if on && !present {
                node.classes.push(class.to_string());
            } else if !on && present {
                node.classes.retain(|c| c != class);
            }
        }
    }

    fn set_attribute(&mut self, el: ElementId, name: &str, value: &str) {
        if let Some(node) = self.node_mut(el) {
            node.attrs.insert(name.to_string(), value.to_string());
        }
    }

    fn set_style(&mut self, el: ElementId, property: &str, value: &str) {
        if let Some(node) = self.node_mut(el) {
            if value.is_empty() {
                node.style.remove(property);
            } else {
                node.style.insert(property.to_string(), value.to_string());
            }
        }
    }

    fn set_inner_html(&mut self, el: ElementId, html: &str) {
        if let Some(node) = self.node_mut(el) {
            node.html = html.to_string();
        }
    }

    fn set_disabled(&mut self, el: ElementId, disabled: bool) {
        if let Some(node) = self.node_mut(el) {
            node.disabled = disabled;
        }
    }

    fn create_element(&mut self, tag: &str, class: &str, parent: ElementId) -> Option<ElementId> {
        self.node(parent)?;
        Some(self.append(parent, ElementBuilder::new(tag).class(class)))
    }

    fn inject_stylesheet(&mut self, css: &str) {
        self.stylesheets.push(css.to_string());
    }

    fn reset_form(&mut self, form: ElementId) {
        for id in self.descendants(form) {
            if let Some(node) = self.node_mut(id) {
                if is_form_field(&node.tag) {
                    node.value = node.default_value.clone();
                }
            }
        }
    }

    fn scroll_metrics(&self) -> ScrollMetrics {
        let content = self
            .nodes
            .iter()
            .map(|n| n.top + n.height)
            .fold(0.0_f64, f64::max);
        let scroll_height = self
            .document_height
            .unwrap_or(content)
            .max(self.viewport_height);
        ScrollMetrics {
            scroll_top: self.scroll_top,
            scroll_height,
            client_height: self.viewport_height,
        }
    }

    fn bounding_top(&self, el: ElementId) -> Option<f64> {
        self.node(el).map(|n| n.top - self.scroll_top)
    }

    fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior) {
        self.scroll_requests.push((top, behavior));
        let clamped = top.clamp(0.0, self.scroll_metrics().max_scroll());
        if clamped != self.scroll_top {
            self.scroll_top = clamped;
            self.scroll_pending = true;
        }
    }

    fn request_frame(&mut self, task: FrameTask) {
        self.frames.push(task);
        if self.frame_due.is_none() {
            self.frame_due = Some(self.now_ms + FRAME_INTERVAL_MS);
        }
    }

    fn set_timeout(&mut self, delay_ms: u64, task: TimerTask) {
        self.timer_seq += 1;
        self.timers.push(PendingTimer {
            due: self.now_ms + delay_ms as f64,
            seq: self.timer_seq,
            task,
        });
    }

    fn register_observer(&mut self, kind: ObserverKind, options: ObserverOptions) {
        self.observers.entry(kind).or_default().options = options;
    }

    fn observe(&mut self, kind: ObserverKind, el: ElementId) {
        let observer = self.observers.entry(kind).or_default();
        if !observer.targets.iter().any(|(t, _)| *t == el) {
            observer.targets.push((el, None));
        }
    }

    fn unobserve(&mut self, kind: ObserverKind, el: ElementId) {
        if let Some(observer) = self.observers.get_mut(&kind) {
            observer.targets.retain(|(t, _)| *t != el);
        }
    }

    fn begin_submission(&mut self, form: ElementId, data: FormData) {
        self.submissions.push((form, data));
    }

    fn now_ms(&self) -> f64 {
        self.now_ms
    }

    fn report(&mut self, report: Report) {
        tracing::info!("{}", report);
        self.reports.push(report);
    }
}
