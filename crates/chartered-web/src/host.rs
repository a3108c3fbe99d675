//! [`Host`] implementation over the live DOM

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use chartered_core::dom::{ElementId, FormData, ObserverOptions, ScrollBehavior, ScrollMetrics};
use chartered_core::event::{FrameTask, IntersectionEntry, ObserverKind, PageEvent, Report, TimerTask};
use chartered_core::{Host, Selector, Submitter};
use gloo::render::{request_animation_frame, AnimationFrame};
use gloo::timers::callback::Timeout;
use js_sys::{Array, WeakMap};
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, HtmlButtonElement, HtmlElement, HtmlFormElement, IntersectionObserver,
    IntersectionObserverEntry, IntersectionObserverInit, ScrollToOptions, Window,
};

use crate::App;

type ObserverCallback = Closure<dyn FnMut(Array, IntersectionObserver)>;

/// New registrations between two sweeps of detached elements
const SWEEP_INTERVAL: usize = 256;

/// Id-keyed store of the elements handed out to the core
struct Registry<E> {
    live: HashMap<usize, E>,
    next_id: usize,
}

impl<E: Clone> Registry<E> {
    fn new() -> Self {
        Self {
            live: HashMap::new(),
            next_id: 0,
        }
    }

    /// Store a newly seen element; the flag says a sweep is due
    fn insert(&mut self, element: E) -> (usize, bool) {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id, element);
        (id, self.next_id % SWEEP_INTERVAL == 0)
    }

    /// Put back an element that was swept but is in use again
    fn restore(&mut self, id: usize, element: E) {
        self.live.entry(id).or_insert(element);
    }

    fn get(&self, id: usize) -> Option<E> {
        self.live.get(&id).cloned()
    }

    /// Drop every element `keep` rejects; returns how many went
    fn sweep(&mut self, keep: impl Fn(&E) -> bool) -> usize {
        let before = self.live.len();
        self.live.retain(|_, e| keep(e));
        before - self.live.len()
    }
}

struct Observer {
    observer: IntersectionObserver,
    _callback: ObserverCallback,
}

/// The browser page, addressed through stable [`ElementId`] handles
pub struct WebHost {
    window: Window,
    document: Document,
    /// Element to id; entries go away with the element
    ids: WeakMap,
    elements: RefCell<Registry<Element>>,
    frames: Vec<FrameTask>,
    frame_handle: Option<AnimationFrame>,
    observers: HashMap<ObserverKind, Observer>,
    submitter: Rc<dyn Submitter>,
    app: Weak<App>,
}

fn log_js_error<T>(action: &str, result: Result<T, JsValue>) {
    if let Err(e) = result {
        warn!("{} failed: {:?}", action, e);
    }
}

impl WebHost {
    pub fn new(window: Window, document: Document, submitter: Rc<dyn Submitter>, app: Weak<App>) -> Self {
        Self {
            window,
            document,
            ids: WeakMap::new(),
            elements: RefCell::new(Registry::new()),
            frames: Vec::new(),
            frame_handle: None,
            observers: HashMap::new(),
            submitter,
            app,
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Handle for `element`, reusing the existing one if it was seen before
    pub fn register(&self, element: Element) -> ElementId {
        let mut elements = self.elements.borrow_mut();
        if let Some(id) = self.ids.get(&element).as_f64() {
            let id = id as usize;
            elements.restore(id, element);
            return ElementId(id);
        }

        let key = element.clone();
        let (id, sweep_due) = elements.insert(element);
        self.ids.set(&key, &JsValue::from_f64(id as f64));
        if sweep_due {
            // Detached elements are forgotten here; they keep their id if seen again
            let dropped = elements.sweep(|e| e.is_connected());
            if dropped > 0 {
                tracing::debug!(dropped, "Swept detached elements");
            }
        }
        ElementId(id)
    }

    fn element(&self, el: ElementId) -> Option<Element> {
        self.elements.borrow().get(el.0)
    }

    /// Frame tasks queued for the frame that is about to run
    pub fn take_frame(&mut self) -> Vec<FrameTask> {
        self.frame_handle = None;
        std::mem::take(&mut self.frames)
    }

    pub fn intersection_entries(&self, entries: &Array) -> Vec<IntersectionEntry> {
        entries
            .iter()
            .filter_map(|value| value.dyn_into::<IntersectionObserverEntry>().ok())
            .map(|entry| IntersectionEntry {
                target: self.register(entry.target()),
                is_intersecting: entry.is_intersecting(),
                ratio: entry.intersection_ratio(),
            })
            .collect()
    }
}

impl Host for WebHost {
    fn query_all(&self, selector: &Selector) -> Vec<ElementId> {
        let Ok(list) = self.document.query_selector_all(&selector.to_string()) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|el| self.register(el))
            .collect()
    }

    fn element_by_id(&self, id: &str) -> Option<ElementId> {
        Some(self.register(self.document.get_element_by_id(id)?))
    }

    fn body(&self) -> Option<ElementId> {
        Some(self.register(self.document.body()?.into()))
    }

    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        match (self.element(ancestor), self.element(node)) {
            (Some(a), Some(n)) => {
                let node: &web_sys::Node = &n;
                a.contains(Some(node))
            }
            _ => false,
        }
    }

    fn closest(&self, node: ElementId, selector: &Selector) -> Option<ElementId> {
        let found = self.element(node)?.closest(&selector.to_string()).ok()??;
        Some(self.register(found))
    }

    fn query_within(&self, root: ElementId, selector: &Selector) -> Option<ElementId> {
        let found = self.element(root)?.query_selector(&selector.to_string()).ok()??;
        Some(self.register(found))
    }

    fn attribute(&self, el: ElementId, name: &str) -> Option<String> {
        self.element(el)?.get_attribute(name)
    }

    fn has_class(&self, el: ElementId, class: &str) -> bool {
        self.element(el).is_some_and(|e| e.class_list().contains(class))
    }

    fn text_content(&self, el: ElementId) -> String {
        self.element(el)
            .and_then(|e| e.text_content())
            .unwrap_or_default()
    }

    fn inner_html(&self, el: ElementId) -> String {
        self.element(el).map(|e| e.inner_html()).unwrap_or_default()
    }

    fn form_data(&self, form: ElementId) -> FormData {
        let Some(form) = self.element(form).and_then(|e| e.dyn_into::<HtmlFormElement>().ok()) else {
            return FormData::default();
        };
        let Ok(data) = web_sys::FormData::new_with_form(&form) else {
            return FormData::default();
        };
        let Ok(Some(entries)) = js_sys::try_iter(data.as_ref()) else {
            return FormData::default();
        };
        // File entries have no string value and are skipped
        let fields = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let pair = Array::from(&entry);
                Some((pair.get(0).as_string()?, pair.get(1).as_string()?))
            })
            .collect();
        FormData { fields }
    }

    fn supports_custom_properties(&self) -> bool {
        web_sys::css::supports_with_value("color", "var(--primary)").unwrap_or(false)
    }

    fn set_class(&mut self, el: ElementId, class: &str, on: bool) {
        if let Some(e) = self.element(el) {
            let list = e.class_list();
            log_js_error("class update", if on { list.add_1(class) } else { list.remove_1(class) });
        }
    }

    fn set_attribute(&mut self, el: ElementId, name: &str, value: &str) {
        if let Some(e) = self.element(el) {
            log_js_error("setAttribute", e.set_attribute(name, value));
        }
    }

    fn set_style(&mut self, el: ElementId, property: &str, value: &str) {
        let Some(e) = self.element(el).and_then(|e| e.dyn_into::<HtmlElement>().ok()) else {
            return;
        };
        let style = e.style();
        if value.is_empty() {
            log_js_error("style removal", style.remove_property(property));
        } else {
            log_js_error("style update", style.set_property(property, value));
        }
    }

    fn set_inner_html(&mut self, el: ElementId, html: &str) {
        if let Some(e) = self.element(el) {
            e.set_inner_html(html);
        }
    }

    fn set_disabled(&mut self, el: ElementId, disabled: bool) {
        let Some(e) = self.element(el) else {
            return;
        };
        if let Some(button) = e.dyn_ref::<HtmlButtonElement>() {
            button.set_disabled(disabled);
        } else if disabled {
            log_js_error("setAttribute", e.set_attribute("disabled", ""));
        } else {
            log_js_error("removeAttribute", e.remove_attribute("disabled"));
        }
    }

    fn create_element(&mut self, tag: &str, class: &str, parent: ElementId) -> Option<ElementId> {
        let parent = self.element(parent)?;
        let element = self.document.create_element(tag).ok()?;
        element.set_class_name(class);
        parent.append_child(&element).ok()?;
        Some(self.register(element))
    }

    fn inject_stylesheet(&mut self, css: &str) {
        let Some(head) = self.document.head() else {
            return;
        };
        let Ok(style) = self.document.create_element("style") else {
            return;
        };
        style.set_text_content(Some(css));
        log_js_error("stylesheet injection", head.append_child(&style));
    }

    fn reset_form(&mut self, form: ElementId) {
        if let Some(form) = self.element(form).and_then(|e| e.dyn_into::<HtmlFormElement>().ok()) {
            form.reset();
        }
    }

    fn scroll_metrics(&self) -> ScrollMetrics {
        let scroll_top = self.window.page_y_offset().unwrap_or(0.0);
        let Some(root) = self.document.document_element() else {
            return ScrollMetrics {
                scroll_top,
                ..Default::default()
            };
        };
        ScrollMetrics {
            scroll_top,
            scroll_height: root.scroll_height() as f64,
            client_height: root.client_height() as f64,
        }
    }

    fn bounding_top(&self, el: ElementId) -> Option<f64> {
        Some(self.element(el)?.get_bounding_client_rect().top())
    }

    fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior) {
        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(match behavior {
            ScrollBehavior::Instant => web_sys::ScrollBehavior::Instant,
            ScrollBehavior::Smooth => web_sys::ScrollBehavior::Smooth,
        });
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn request_frame(&mut self, task: FrameTask) {
        self.frames.push(task);
        if self.frame_handle.is_some() {
            return;
        }
        let app = self.app.clone();
        self.frame_handle = Some(request_animation_frame(move |timestamp| {
            if let Some(app) = app.upgrade() {
                app.run_frame(timestamp);
            }
        }));
    }

    fn set_timeout(&mut self, delay_ms: u64, task: TimerTask) {
        let app = self.app.clone();
        let delay = u32::try_from(delay_ms).unwrap_or(u32::MAX);
        Timeout::new(delay, move || {
            if let Some(app) = app.upgrade() {
                app.dispatch(PageEvent::Timer(task));
            }
        })
        .forget();
    }

    fn register_observer(&mut self, kind: ObserverKind, options: ObserverOptions) {
        let app = self.app.clone();
        let callback: ObserverCallback = Closure::new(move |entries: Array, _observer: IntersectionObserver| {
            if let Some(app) = app.upgrade() {
                app.deliver_intersections(kind, &entries);
            }
        });

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        init.set_root_margin(&options.root_margin.to_string());

        match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init) {
            Ok(observer) => {
                let replaced = self.observers.insert(
                    kind,
                    Observer {
                        observer,
                        _callback: callback,
                    },
                );
                if let Some(previous) = replaced {
                    previous.observer.disconnect();
                }
            }
            Err(e) => warn!(?kind, "IntersectionObserver unavailable: {:?}", e),
        }
    }

    fn observe(&mut self, kind: ObserverKind, el: ElementId) {
        if let (Some(observer), Some(element)) = (self.observers.get(&kind), self.element(el)) {
            observer.observer.observe(&element);
        }
    }

    fn unobserve(&mut self, kind: ObserverKind, el: ElementId) {
        if let (Some(observer), Some(element)) = (self.observers.get(&kind), self.element(el)) {
            observer.observer.unobserve(&element);
        }
    }

    fn begin_submission(&mut self, form: ElementId, data: FormData) {
        let submitter = Rc::clone(&self.submitter);
        let app = self.app.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = submitter.submit(data).await;
            if let Some(app) = app.upgrade() {
                app.dispatch(PageEvent::SubmissionSettled { form, outcome });
            }
        });
    }

    fn now_ms(&self) -> f64 {
        self.window.performance().map(|p| p.now()).unwrap_or(0.0)
    }

    fn report(&mut self, report: Report) {
        gloo::console::log!(report.to_string());
    }
}
