//! Reveal Controller - One-shot reveal-on-scroll
//!
//! Every registered element starts hidden. The first time enough of it is
//! visible it gets the revealed class and is never watched again.
//!
//! - Eligible: intersecting with `ratio >= threshold`
//! - Elements eligible in the same notification batch cascade:
//!   the i-th one is revealed `i * stagger_ms` later (the first immediately)
//! - The cascade is batch-local: two batches both start at zero delay
//! - No viewport observer: everything is revealed at mount
//!
//! State per element only moves forward: `Hidden -> Pending -> Revealed`.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde::Deserialize;
use spark_signals::{signal, Signal};
use tracing::{debug, trace};

use crate::host::{Document, ObserverId, Scheduler, TimerHandle, ViewportObserver};
use crate::types::{ElementId, Inset, IntersectionEntry, ObserveOptions, RootMargin};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RevealOptions {
    /// Visible fraction required, 0.0-1.0.
    pub threshold: f32,
    /// Fire this many px before the element reaches the viewport bottom.
    pub bottom_margin_px: f32,
    /// Delay step between elements revealed in the same batch.
    pub stagger_ms: u64,
    pub revealed_class: String,
}

impl Default for RevealOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            bottom_margin_px: 50.0,
            stagger_ms: 100,
            revealed_class: "revealed".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RevealState {
    Hidden,
    /// Eligible, waiting for its stagger delay.
    Pending,
    Revealed,
}

pub type RevealListener = Rc<dyn Fn(&ElementId)>;

// =============================================================================
// CONTROLLER
// =============================================================================

struct Inner {
    document: Rc<dyn Document>,
    scheduler: Rc<dyn Scheduler>,
    viewport: Option<Rc<dyn ViewportObserver>>,
    observer: Cell<Option<ObserverId>>,
    options: RevealOptions,
    states: RefCell<Vec<(ElementId, RevealState)>>,
    timers: RefCell<Vec<(ElementId, TimerHandle)>>,
    listeners: RefCell<Vec<RevealListener>>,
    revealed: Signal<usize>,
}

impl Inner {
    fn state(&self, id: &ElementId) -> Option<RevealState> {
        self.states
            .borrow()
            .iter()
            .find(|(el, _)| el == id)
            .map(|(_, state)| *state)
    }

    /// Move `id` forward to `next`. Returns false if it was already there
    /// or further along.
    fn promote(&self, id: &ElementId, next: RevealState) -> bool {
        let mut states = self.states.borrow_mut();
        match states.iter_mut().find(|(el, _)| el == id) {
            Some((_, state)) if *state < next => {
                *state = next;
                true
            }
            _ => false,
        }
    }

    fn handle_batch(self: &Rc<Self>, entries: &[IntersectionEntry]) {
        let threshold = self.options.threshold;
        let mut slot = 0u64;

        for entry in entries {
            if !entry.is_intersecting || entry.ratio < threshold {
                continue;
            }
            // Only Hidden -> Pending takes a cascade slot; repeats in the batch don't
            if !self.promote(&entry.target, RevealState::Pending) {
                continue;
            }
            let id = entry.target.clone();
            if let (Some(viewport), Some(observer)) = (self.viewport.as_ref(), self.observer.get()) {
                viewport.unobserve(observer, &id);
            }

            let delay = self.options.stagger_ms * slot;
            slot += 1;
            trace!(element = %id, delay, "reveal scheduled");
            if delay == 0 {
                self.reveal(&id);
                continue;
            }

            let weak: Weak<Inner> = Rc::downgrade(self);
            let target = id.clone();
            let handle = self.scheduler.schedule(
                delay,
                Box::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.reveal(&target);
                    }
                }),
            );
            self.timers.borrow_mut().push((id, handle));
        }
    }

    fn reveal(&self, id: &ElementId) {
        self.timers.borrow_mut().retain(|(el, _)| el != id);
        if !self.promote(id, RevealState::Revealed) {
            return;
        }
        self.document.set_class(id, &self.options.revealed_class, true);
        self.revealed.set(self.revealed.get() + 1);

        let listeners: Vec<RevealListener> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(id);
        }
    }
}

/// Reveals registered elements as they scroll into view.
///
/// Dropping the controller cancels pending reveals and disconnects.
pub struct RevealController {
    inner: Rc<Inner>,
}

impl RevealController {
    /// Register `targets` (missing elements are skipped) and start watching.
    pub fn mount(
        document: Rc<dyn Document>,
        viewport: Option<Rc<dyn ViewportObserver>>,
        scheduler: Rc<dyn Scheduler>,
        targets: Vec<ElementId>,
        options: RevealOptions,
    ) -> Self {
        let mut states: Vec<(ElementId, RevealState)> = Vec::new();
        for id in targets {
            if !document.contains(&id) {
                debug!(element = %id, "reveal target missing, skipped");
            } else if !states.iter().any(|(el, _)| *el == id) {
                states.push((id, RevealState::Hidden));
            }
        }

        let inner = Rc::new(Inner {
            document,
            scheduler,
            viewport,
            observer: Cell::new(None),
            options,
            states: RefCell::new(states),
            timers: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
            revealed: signal(0),
        });

        let ids: Vec<ElementId> = inner.states.borrow().iter().map(|(id, _)| id.clone()).collect();

        let Some(viewport) = inner.viewport.clone() else {
            debug!(count = ids.len(), "no viewport observer, revealing everything");
            for id in &ids {
                inner.reveal(id);
            }
            return Self { inner };
        };
        if ids.is_empty() {
            return Self { inner };
        }

        let weak: Weak<Inner> = Rc::downgrade(&inner);
        let observer = viewport.connect(
            ObserveOptions {
                root_margin: RootMargin::new(
                    Inset::Pixels(0.0),
                    Inset::Pixels(inner.options.bottom_margin_px),
                ),
                thresholds: vec![inner.options.threshold],
            },
            Rc::new(move |entries: &[IntersectionEntry]| {
                if let Some(inner) = weak.upgrade() {
                    inner.handle_batch(entries);
                }
            }),
        );
        inner.observer.set(Some(observer));
        for id in &ids {
            viewport.observe(observer, id);
        }
        debug!(count = ids.len(), "reveal controller watching");

        Self { inner }
    }

    pub fn state(&self, id: &ElementId) -> Option<RevealState> {
        self.inner.state(id)
    }

    pub fn is_revealed(&self, id: &ElementId) -> bool {
        self.state(id) == Some(RevealState::Revealed)
    }

    /// Registered elements, in registration order.
    pub fn targets(&self) -> Vec<ElementId> {
        self.inner.states.borrow().iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn revealed_count(&self) -> usize {
        self.inner.revealed.get()
    }

    /// Reactive count of revealed elements.
    pub fn revealed_signal(&self) -> Signal<usize> {
        self.inner.revealed.clone()
    }

    /// Call `listener` each time an element is revealed from now on.
    pub fn on_reveal<F>(&self, listener: F)
    where
        F: Fn(&ElementId) + 'static,
    {
        self.inner.listeners.borrow_mut().push(Rc::new(listener));
    }

    pub fn is_observing(&self) -> bool {
        self.inner.observer.get().is_some()
    }

    /// Cancel staggered reveals still waiting and detach from the viewport.
    /// Elements already revealed stay revealed. Idempotent.
    pub fn disconnect(&self) {
        let timers: Vec<(ElementId, TimerHandle)> = self.inner.timers.borrow_mut().drain(..).collect();
        for (_, handle) in timers {
            self.inner.scheduler.cancel(handle);
        }
        if let (Some(id), Some(viewport)) = (self.inner.observer.take(), self.inner.viewport.as_ref()) {
            viewport.disconnect(id);
            debug!("reveal controller disconnected");
        }
    }
}

impl Drop for RevealController {
    fn drop(&mut self) {
        self.disconnect();
    }
}
