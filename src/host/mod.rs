//! Host Module - Capabilities the page environment provides
//!
//! spark-folio never touches a browser directly. Everything a component
//! needs from the page is injected through these traits:
//!
//! - **Document** - element markup (classes, text, attributes, geometry)
//! - **Window** - scroll position, programmatic scrolling, alerts
//! - **ViewportObserver** - batched intersection notifications
//! - **Scheduler** - cancellable one-shot timers
//! - **PreferenceStore** - the single persisted key/value pair (theme)
//!
//! All traits take `&self`: hosts are shared behind `Rc` and use interior
//! mutability, matching the single-threaded callback model of a page.
//!
//! [`memory`] contains deterministic in-memory implementations.

use std::rc::Rc;

use crate::types::{ElementId, IntersectionEntry, ObserveOptions, ScrollBehavior};

pub mod memory;

pub use memory::{ManualScheduler, ManualViewport, MemoryPage, MemoryStore};

// =============================================================================
// DOCUMENT
// =============================================================================

/// Element markup. Every method tolerates unknown ids: reads return
/// `None`/`false`, writes are dropped.
pub trait Document {
    fn contains(&self, id: &ElementId) -> bool;

    fn has_class(&self, id: &ElementId, class: &str) -> bool;

    /// Add (`enabled`) or remove a class.
    fn set_class(&self, id: &ElementId, class: &str, enabled: bool);

    /// Replace the whole class attribute.
    fn set_class_name(&self, id: &ElementId, class_name: &str);

    fn text(&self, id: &ElementId) -> Option<String>;

    fn set_text(&self, id: &ElementId, text: &str);

    fn attribute(&self, id: &ElementId, name: &str) -> Option<String>;

    fn set_attribute(&self, id: &ElementId, name: &str, value: &str);

    /// Set (`Some`) or clear (`None`) an inline style property.
    fn set_style(&self, id: &ElementId, property: &str, value: Option<&str>);

    /// Distance from the top of the page, in px.
    fn offset_top(&self, id: &ElementId) -> Option<f32>;

    fn offset_height(&self, id: &ElementId) -> Option<f32>;

    /// Elements carrying `class`, in document order.
    fn elements_with_class(&self, class: &str) -> Vec<ElementId>;

    /// Toggle a class and return whether it is now present.
    fn toggle_class(&self, id: &ElementId, class: &str) -> bool {
        let enabled = !self.has_class(id, class);
        self.set_class(id, class, enabled);
        enabled
    }
}

// =============================================================================
// WINDOW
// =============================================================================

pub trait Window {
    fn scroll_y(&self) -> f32;

    fn viewport_height(&self) -> f32;

    fn scroll_to(&self, top: f32, behavior: ScrollBehavior);

    /// Show a blocking message to the visitor (an alert).
    fn notify(&self, message: &str);
}

// =============================================================================
// VIEWPORT OBSERVATION
// =============================================================================

/// Identifies one connected observer on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub u64);

/// Receives every batch of notifications for one observer.
pub type IntersectionCallback = Rc<dyn Fn(&[IntersectionEntry])>;

/// The host's intersection-notification facility.
///
/// Hosts deliver entries in the order they detected the state changes.
/// A newly observed element gets one initial notification.
pub trait ViewportObserver {
    fn connect(&self, options: ObserveOptions, callback: IntersectionCallback) -> ObserverId;

    fn observe(&self, observer: ObserverId, target: &ElementId);

    fn unobserve(&self, observer: ObserverId, target: &ElementId);

    /// Drop the observer and all of its targets. Unknown ids are ignored.
    fn disconnect(&self, observer: ObserverId);
}

// =============================================================================
// SCHEDULING
// =============================================================================

/// Handle of a pending timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

pub type Task = Box<dyn FnOnce()>;

pub trait Scheduler {
    /// Run `task` once, `delay_ms` from now.
    fn schedule(&self, delay_ms: u64, task: Task) -> TimerHandle;

    /// Cancel a pending timer. Cancelling a fired or unknown handle is a no-op.
    fn cancel(&self, handle: TimerHandle);
}

// =============================================================================
// PREFERENCES
// =============================================================================

pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str);
}

// =============================================================================
// PAGE HOST
// =============================================================================

/// Everything `app::mount` needs, bundled.
///
/// `viewport` is optional: hosts without intersection notifications still
/// get every other behavior.
#[derive(Clone)]
pub struct PageHost {
    pub document: Rc<dyn Document>,
    pub window: Rc<dyn Window>,
    pub scheduler: Rc<dyn Scheduler>,
    pub viewport: Option<Rc<dyn ViewportObserver>>,
    pub store: Rc<dyn PreferenceStore>,
}
