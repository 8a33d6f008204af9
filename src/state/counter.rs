//! Counter - Counts an element's text up from zero to a target
//!
//! The animation itself is [`CounterAnimation`], a pure frame table: frame
//! `i` of `n` shows `target * i / n` rounded, and frame `n` is exactly the
//! target. [`Counter`] steps through it on the host scheduler.
//!
//! Counters are found by class and read their target from `data-target`.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use serde::Deserialize;
use spark_signals::{signal, Signal};
use tracing::{debug, trace};

use crate::host::{Document, Scheduler, TimerHandle};
use crate::types::ElementId;

/// Attribute holding the value a counter ends at.
pub const TARGET_ATTRIBUTE: &str = "data-target";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CounterOptions {
    pub duration_ms: u64,
    /// Interval between frames. Must be non-zero.
    pub frame_ms: u64,
}

impl Default for CounterOptions {
    fn default() -> Self {
        Self {
            duration_ms: 2000,
            frame_ms: 16,
        }
    }
}

// =============================================================================
// ANIMATION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterAnimation {
    target: u64,
    frames: u64,
}

impl CounterAnimation {
    /// At least one frame, even for a zero duration.
    pub fn new(target: u64, options: CounterOptions) -> Self {
        let frames = options
            .duration_ms
            .div_ceil(options.frame_ms.max(1))
            .max(1);
        Self { target, frames }
    }

    pub fn target(&self) -> u64 {
        self.target
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Value shown at `frame` (clamped to the last frame).
    pub fn value_at(&self, frame: u64) -> u64 {
        let frame = frame.min(self.frames);
        if frame == self.frames {
            return self.target;
        }
        let scaled = u128::from(self.target) * u128::from(frame) * 2 + u128::from(self.frames);
        (scaled / (u128::from(self.frames) * 2)) as u64
    }
}

// =============================================================================
// DRIVER
// =============================================================================

struct Inner {
    document: Rc<dyn Document>,
    scheduler: Rc<dyn Scheduler>,
    element: ElementId,
    animation: CounterAnimation,
    frame_ms: u64,
    frame: Cell<u64>,
    pending: Cell<Option<TimerHandle>>,
    value: Signal<u64>,
}

pub struct Counter {
    inner: Rc<Inner>,
}

impl Counter {
    /// Read the target from the element's `data-target`. `None` when the
    /// element is missing or the attribute is absent or not a number.
    pub fn from_element(
        document: Rc<dyn Document>,
        scheduler: Rc<dyn Scheduler>,
        element: ElementId,
        options: CounterOptions,
    ) -> Option<Self> {
        let raw = document.attribute(&element, TARGET_ATTRIBUTE)?;
        let Ok(target) = raw.trim().parse::<u64>() else {
            debug!(%element, %raw, "counter target is not a number");
            return None;
        };
        Some(Self::new(document, scheduler, element, target, options))
    }

    pub fn new(
        document: Rc<dyn Document>,
        scheduler: Rc<dyn Scheduler>,
        element: ElementId,
        target: u64,
        options: CounterOptions,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                document,
                scheduler,
                element,
                animation: CounterAnimation::new(target, options),
                frame_ms: options.frame_ms.max(1),
                frame: Cell::new(0),
                pending: Cell::new(None),
                value: signal(0),
            }),
        }
    }

    pub fn element(&self) -> &ElementId {
        &self.inner.element
    }

    /// Start from zero. Ignored while running or once finished.
    pub fn start(&self) {
        let inner = &self.inner;
        if inner.pending.get().is_some() || inner.frame.get() > 0 {
            return;
        }
        inner.document.set_text(&inner.element, "0");
        debug!(element = %inner.element, target = inner.animation.target(), "counter started");
        schedule_frame(inner);
    }

    pub fn value(&self) -> u64 {
        self.inner.value.get()
    }

    pub fn value_signal(&self) -> Signal<u64> {
        self.inner.value.clone()
    }

    pub fn is_running(&self) -> bool {
        self.inner.pending.get().is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.inner.frame.get() >= self.inner.animation.frames()
    }

    /// Stop where it is. Idempotent.
    pub fn cancel(&self) {
        if let Some(handle) = self.inner.pending.take() {
            self.inner.scheduler.cancel(handle);
        }
    }
}

impl Drop for Counter {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn schedule_frame(inner: &Rc<Inner>) {
    let weak: Weak<Inner> = Rc::downgrade(inner);
    let handle = inner.scheduler.schedule(
        inner.frame_ms,
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                step(&inner);
            }
        }),
    );
    inner.pending.set(Some(handle));
}

fn step(inner: &Rc<Inner>) {
    inner.pending.set(None);
    let frame = inner.frame.get() + 1;
    inner.frame.set(frame);

    let value = inner.animation.value_at(frame);
    trace!(element = %inner.element, frame, value, "counter frame");
    inner.document.set_text(&inner.element, &value.to_string());
    inner.value.set(value);

    if frame < inner.animation.frames() {
        schedule_frame(inner);
    }
}
