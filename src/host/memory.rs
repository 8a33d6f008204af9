//! In-memory host - Deterministic page, clock, viewport and store
//!
//! Used by the test suite and the demo, and usable by any embedder that
//! drives the page itself (server-side rendering previews, snapshot tools).
//!
//! # Pattern
//!
//! - `MemoryPage` holds elements in document order with vertical geometry
//! - `ManualScheduler` is a virtual clock: nothing fires until `advance()`
//! - `ManualViewport` computes intersections from page geometry on `scan()`
//!
//! # Example
//!
//! ```ignore
//! let page = Rc::new(MemoryPage::new(800.0));
//! page.element("about").at(900.0, 600.0);
//!
//! let clock = Rc::new(ManualScheduler::new());
//! let viewport = Rc::new(ManualViewport::new());
//!
//! page.set_scroll_y(700.0);
//! viewport.scan(&*page, &*page);
//! clock.advance(100);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use super::{
    Document, IntersectionCallback, ObserverId, PreferenceStore, Scheduler, Task, TimerHandle,
    ViewportObserver, Window,
};
use crate::types::{ElementId, IntersectionEntry, ObserveOptions, Rect, ScrollBehavior};

// =============================================================================
// MEMORY PAGE
// =============================================================================

#[derive(Debug, Clone, Default)]
struct MemoryElement {
    classes: Vec<String>,
    text: String,
    attributes: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    rect: Rect,
}

/// A page held in memory: elements plus a scrollable window.
#[derive(Debug)]
pub struct MemoryPage {
    elements: RefCell<Vec<(ElementId, MemoryElement)>>,
    scroll_y: Cell<f32>,
    viewport_height: Cell<f32>,
    scroll_log: RefCell<Vec<(f32, ScrollBehavior)>>,
    alerts: RefCell<Vec<String>>,
}

impl MemoryPage {
    pub fn new(viewport_height: f32) -> Self {
        Self {
            elements: RefCell::new(Vec::new()),
            scroll_y: Cell::new(0.0),
            viewport_height: Cell::new(viewport_height),
            scroll_log: RefCell::new(Vec::new()),
            alerts: RefCell::new(Vec::new()),
        }
    }

    /// Insert (or reuse) an element and return a builder for it.
    ///
    /// Elements are kept in insertion order, which is the document order
    /// `elements_with_class` reports.
    pub fn element(&self, id: impl Into<ElementId>) -> ElementBuilder<'_> {
        let id = id.into();
        {
            let mut elements = self.elements.borrow_mut();
            if !elements.iter().any(|(existing, _)| *existing == id) {
                elements.push((id.clone(), MemoryElement::default()));
            }
        }
        ElementBuilder { page: self, id }
    }

    pub fn remove(&self, id: &ElementId) {
        self.elements.borrow_mut().retain(|(existing, _)| existing != id);
    }

    /// Jump the window without recording a programmatic scroll.
    pub fn set_scroll_y(&self, y: f32) {
        self.scroll_y.set(y.clamp(0.0, self.max_scroll()));
    }

    pub fn set_viewport_height(&self, height: f32) {
        self.viewport_height.set(height);
    }

    /// Bottom edge of the lowest element.
    pub fn page_height(&self) -> f32 {
        self.elements
            .borrow()
            .iter()
            .map(|(_, el)| el.rect.bottom())
            .fold(0.0, f32::max)
    }

    fn max_scroll(&self) -> f32 {
        (self.page_height() - self.viewport_height.get()).max(0.0)
    }

    pub fn classes(&self, id: &ElementId) -> Vec<String> {
        self.with_element(id, |el| el.classes.clone()).unwrap_or_default()
    }

    pub fn style(&self, id: &ElementId, property: &str) -> Option<String> {
        self.with_element(id, |el| el.styles.get(property).cloned()).flatten()
    }

    /// Every programmatic `scroll_to` so far.
    pub fn scroll_log(&self) -> Vec<(f32, ScrollBehavior)> {
        self.scroll_log.borrow().clone()
    }

    /// Every message passed to `notify` so far.
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.borrow().clone()
    }

    fn with_element<R>(&self, id: &ElementId, f: impl FnOnce(&MemoryElement) -> R) -> Option<R> {
        let elements = self.elements.borrow();
        elements.iter().find(|(existing, _)| existing == id).map(|(_, el)| f(el))
    }

    fn with_element_mut(&self, id: &ElementId, f: impl FnOnce(&mut MemoryElement)) {
        let mut elements = self.elements.borrow_mut();
        if let Some((_, el)) = elements.iter_mut().find(|(existing, _)| existing == id) {
            f(el);
        }
    }
}

/// Fluent setup of one `MemoryPage` element.
pub struct ElementBuilder<'a> {
    page: &'a MemoryPage,
    id: ElementId,
}

impl ElementBuilder<'_> {
    /// Place the element at `top` (page coordinates) with `height`.
    pub fn at(self, top: f32, height: f32) -> Self {
        self.page.with_element_mut(&self.id, |el| el.rect = Rect::new(top, height));
        self
    }

    pub fn class(self, class: &str) -> Self {
        self.page.set_class(&self.id, class, true);
        self
    }

    pub fn attr(self, name: &str, value: &str) -> Self {
        self.page.set_attribute(&self.id, name, value);
        self
    }

    pub fn text(self, text: &str) -> Self {
        self.page.set_text(&self.id, text);
        self
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }
}

impl Document for MemoryPage {
    fn contains(&self, id: &ElementId) -> bool {
        self.with_element(id, |_| ()).is_some()
    }

    fn has_class(&self, id: &ElementId, class: &str) -> bool {
        self.with_element(id, |el| el.classes.iter().any(|c| c == class))
            .unwrap_or(false)
    }

    fn set_class(&self, id: &ElementId, class: &str, enabled: bool) {
        self.with_element_mut(id, |el| {
            let present = el.classes.iter().any(|c| c == class);
            if enabled && !present {
                el.classes.push(class.to_string());
            } else if !enabled && present {
                el.classes.retain(|c| c != class);
            }
        });
    }

    fn set_class_name(&self, id: &ElementId, class_name: &str) {
        self.with_element_mut(id, |el| {
            el.classes = class_name.split_whitespace().map(str::to_string).collect();
        });
    }

    fn text(&self, id: &ElementId) -> Option<String> {
        self.with_element(id, |el| el.text.clone())
    }

    fn set_text(&self, id: &ElementId, text: &str) {
        self.with_element_mut(id, |el| el.text = text.to_string());
    }

    fn attribute(&self, id: &ElementId, name: &str) -> Option<String> {
        self.with_element(id, |el| el.attributes.get(name).cloned()).flatten()
    }

    fn set_attribute(&self, id: &ElementId, name: &str, value: &str) {
        self.with_element_mut(id, |el| {
            el.attributes.insert(name.to_string(), value.to_string());
        });
    }

    fn set_style(&self, id: &ElementId, property: &str, value: Option<&str>) {
        self.with_element_mut(id, |el| match value {
            Some(v) if !v.is_empty() => {
                el.styles.insert(property.to_string(), v.to_string());
            }
            _ => {
                el.styles.remove(property);
            }
        });
    }

    fn offset_top(&self, id: &ElementId) -> Option<f32> {
        self.with_element(id, |el| el.rect.top)
    }

    fn offset_height(&self, id: &ElementId) -> Option<f32> {
        self.with_element(id, |el| el.rect.height)
    }

    fn elements_with_class(&self, class: &str) -> Vec<ElementId> {
        self.elements
            .borrow()
            .iter()
            .filter(|(_, el)| el.classes.iter().any(|c| c == class))
            .map(|(id, _)| id.clone())
            .collect()
    }
}

impl Window for MemoryPage {
    fn scroll_y(&self) -> f32 {
        self.scroll_y.get()
    }

    fn viewport_height(&self) -> f32 {
        self.viewport_height.get()
    }

    fn scroll_to(&self, top: f32, behavior: ScrollBehavior) {
        self.scroll_log.borrow_mut().push((top, behavior));
        self.set_scroll_y(top);
    }

    fn notify(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }
}

// =============================================================================
// MANUAL SCHEDULER
// =============================================================================

/// Virtual clock. Timers fire only inside `advance`/`run_until_idle`, in
/// due order, ties broken by scheduling order.
#[derive(Default)]
pub struct ManualScheduler {
    now: Cell<u64>,
    next_id: Cell<u64>,
    queue: RefCell<BTreeMap<(u64, u64), Task>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in ms.
    pub fn now(&self) -> u64 {
        self.now.get()
    }

    /// Number of timers waiting to fire.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Due time of the next timer, if any.
    pub fn next_due(&self) -> Option<u64> {
        self.queue.borrow().keys().next().map(|(due, _)| *due)
    }

    /// Move the clock forward `ms`, firing every timer that comes due
    /// (including ones scheduled by timers firing in the window).
    ///
    /// Returns how many timers fired.
    pub fn advance(&self, ms: u64) -> usize {
        let target = self.now.get() + ms;
        let mut fired = 0;
        while let Some(due) = self.next_due() {
            if due > target {
                break;
            }
            self.fire_next();
            fired += 1;
        }
        self.now.set(target);
        fired
    }

    /// Fire timers in order until none remain or `limit` have fired.
    pub fn run_until_idle(&self, limit: usize) -> usize {
        let mut fired = 0;
        while fired < limit && self.next_due().is_some() {
            self.fire_next();
            fired += 1;
        }
        fired
    }

    fn fire_next(&self) {
        // Release the queue borrow before running: tasks schedule more tasks.
        let next = {
            let mut queue = self.queue.borrow_mut();
            let key = queue.keys().next().copied();
            key.and_then(|key| queue.remove(&key).map(|task| (key, task)))
        };
        if let Some(((due, id), task)) = next {
            self.now.set(due.max(self.now.get()));
            trace!(timer = id, due, "timer fired");
            task();
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay_ms: u64, task: Task) -> TimerHandle {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.queue
            .borrow_mut()
            .insert((self.now.get() + delay_ms, id), task);
        TimerHandle(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        self.queue.borrow_mut().retain(|&(_, id), _| id != handle.0);
    }
}

// =============================================================================
// MANUAL VIEWPORT
// =============================================================================

/// What an observer last reported for a target: intersecting, and how many
/// thresholds were met.
type Crossing = (bool, usize);

struct Connection {
    options: ObserveOptions,
    callback: IntersectionCallback,
    targets: Vec<ElementId>,
    last: HashMap<ElementId, Crossing>,
}

/// Viewport observer driven explicitly: either hand it entries with
/// `deliver`, or let `scan` derive them from page geometry.
#[derive(Default)]
pub struct ManualViewport {
    next_id: Cell<u64>,
    connections: RefCell<BTreeMap<ObserverId, Connection>>,
}

impl ManualViewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self, observer: ObserverId) -> bool {
        self.connections.borrow().contains_key(&observer)
    }

    pub fn observers(&self) -> Vec<ObserverId> {
        self.connections.borrow().keys().copied().collect()
    }

    /// Targets currently observed by `observer`, in observation order.
    pub fn observed(&self, observer: ObserverId) -> Vec<ElementId> {
        self.connections
            .borrow()
            .get(&observer)
            .map(|c| c.targets.clone())
            .unwrap_or_default()
    }

    /// Deliver a hand-made batch. Entries for targets the observer is not
    /// watching are dropped, as a real host would never send them.
    pub fn deliver(&self, observer: ObserverId, entries: Vec<IntersectionEntry>) {
        let callback = {
            let connections = self.connections.borrow();
            let Some(conn) = connections.get(&observer) else {
                return;
            };
            let batch: Vec<IntersectionEntry> = entries
                .into_iter()
                .filter(|e| conn.targets.contains(&e.target))
                .collect();
            if batch.is_empty() {
                return;
            }
            (conn.callback.clone(), batch)
        };
        let (callback, batch) = callback;
        callback(&batch);
    }

    /// Deliver the same batch to every connected observer.
    pub fn deliver_all(&self, entries: Vec<IntersectionEntry>) {
        for observer in self.observers() {
            self.deliver(observer, entries.clone());
        }
    }

    /// Recompute intersections from page geometry and notify every observer
    /// whose targets changed state (or were newly observed).
    pub fn scan(&self, document: &dyn Document, window: &dyn Window) {
        let scroll_y = window.scroll_y();
        let viewport_height = window.viewport_height();

        let mut batches = Vec::new();
        {
            let mut connections = self.connections.borrow_mut();
            for (&id, conn) in connections.iter_mut() {
                let band = conn.options.root_margin.band(viewport_height);
                let mut batch = Vec::new();
                for target in &conn.targets {
                    let (Some(top), Some(height)) =
                        (document.offset_top(target), document.offset_height(target))
                    else {
                        continue;
                    };
                    let rect = Rect::new(top, height).relative_to(scroll_y);
                    let ratio = band.intersection(rect);
                    let is_intersecting = ratio.is_some();
                    let ratio = ratio.unwrap_or(0.0);
                    let met = if is_intersecting {
                        conn.options.thresholds.iter().filter(|t| ratio >= **t).count()
                    } else {
                        0
                    };
                    let crossing = (is_intersecting, met);
                    if conn.last.get(target) != Some(&crossing) {
                        conn.last.insert(target.clone(), crossing);
                        batch.push(IntersectionEntry {
                            target: target.clone(),
                            is_intersecting,
                            ratio,
                        });
                    }
                }
                if !batch.is_empty() {
                    batches.push((id, conn.callback.clone(), batch));
                }
            }
        }

        for (id, callback, batch) in batches {
            // An earlier callback may have torn this observer down.
            if !self.is_connected(id) {
                continue;
            }
            trace!(observer = id.0, entries = batch.len(), "intersection batch");
            callback(&batch);
        }
    }
}

impl ViewportObserver for ManualViewport {
    fn connect(&self, options: ObserveOptions, callback: IntersectionCallback) -> ObserverId {
        let id = ObserverId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.connections.borrow_mut().insert(
            id,
            Connection {
                options,
                callback,
                targets: Vec::new(),
                last: HashMap::new(),
            },
        );
        id
    }

    fn observe(&self, observer: ObserverId, target: &ElementId) {
        if let Some(conn) = self.connections.borrow_mut().get_mut(&observer) {
            if !conn.targets.contains(target) {
                conn.targets.push(target.clone());
            }
        }
    }

    fn unobserve(&self, observer: ObserverId, target: &ElementId) {
        if let Some(conn) = self.connections.borrow_mut().get_mut(&observer) {
            conn.targets.retain(|t| t != target);
            conn.last.remove(target);
        }
    }

    fn disconnect(&self, observer: ObserverId) {
        self.connections.borrow_mut().remove(&observer);
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}
