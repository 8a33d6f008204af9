//! Typewriter - Types and deletes a cycle of strings, one grapheme per tick
//!
//! Split in two:
//!
//! - [`Sequencer`] is a plain state machine. Each call to `advance()` moves
//!   the cursor by one grapheme and says how long to wait before the next
//!   call. It owns no timer and never blocks.
//! - [`Typewriter`] drives a sequencer from the host [`Scheduler`], writing
//!   each frame into a text element and a reactive signal.
//!
//! # Cycle
//!
//! ```text
//! Typing ──(count == len)──> Pausing ──> Deleting ──(count == 0)──> Transitioning ──> Typing (next string)
//!    └──(count == len, last string, no loop)──> Done
//! ```
//!
//! # Example
//!
//! ```ignore
//! let sequencer = Sequencer::new(["Developer", "Designer"], TypewriterTiming::default(), true)?;
//! let typewriter = Typewriter::mount(document, scheduler, "typed".into(), sequencer, 500);
//! // ... later, when the view goes away
//! typewriter.cancel();
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde::Deserialize;
use spark_signals::{signal, Signal};
use tracing::{debug, trace};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{FolioError, Result};
use crate::host::{Document, Scheduler, TimerHandle};
use crate::types::ElementId;

// =============================================================================
// TIMING
// =============================================================================

/// Delays between ticks, in ms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TypewriterTiming {
    /// Between typed graphemes.
    pub type_ms: u64,
    /// Between deleted graphemes.
    pub delete_ms: u64,
    /// Hold once a string is fully typed.
    pub pause_ms: u64,
    /// Gap after a string is fully deleted, before the next one starts.
    pub transition_ms: u64,
}

impl Default for TypewriterTiming {
    fn default() -> Self {
        Self {
            type_ms: 100,
            delete_ms: 50,
            pause_ms: 2000,
            transition_ms: 500,
        }
    }
}

// =============================================================================
// SEQUENCER
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Typing,
    /// Fully typed, holding before the first deletion.
    Pausing,
    Deleting,
    /// Fully deleted, waiting before the next string.
    Transitioning,
    /// Non-looping sequence finished. Terminal.
    Done,
}

/// Result of one `advance()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    pub text: String,
    /// Delay before the next tick, `None` once the sequence is done.
    pub next_delay_ms: Option<u64>,
}

#[derive(Debug, Clone)]
struct Entry {
    text: String,
    /// Byte offset after each grapheme, with a leading 0.
    bounds: Vec<usize>,
}

impl Entry {
    fn new(text: String) -> Self {
        let mut bounds = vec![0];
        bounds.extend(
            text.grapheme_indices(true)
                .map(|(offset, grapheme)| offset + grapheme.len()),
        );
        Self { text, bounds }
    }

    fn len(&self) -> usize {
        self.bounds.len() - 1
    }

    fn prefix(&self, count: usize) -> &str {
        &self.text[..self.bounds[count]]
    }
}

#[derive(Debug, Clone)]
pub struct Sequencer {
    entries: Vec<Entry>,
    index: usize,
    count: usize,
    phase: Phase,
    looping: bool,
    timing: TypewriterTiming,
}

impl Sequencer {
    /// Fails with [`FolioError::EmptySequence`] when `strings` is empty.
    pub fn new<I, S>(strings: I, timing: TypewriterTiming, looping: bool) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries: Vec<Entry> = strings.into_iter().map(|s| Entry::new(s.into())).collect();
        if entries.is_empty() {
            return Err(FolioError::EmptySequence);
        }
        Ok(Self {
            entries,
            index: 0,
            count: 0,
            phase: Phase::Typing,
            looping,
            timing,
        })
    }

    /// Index of the string being typed or deleted.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Graphemes of the current string shown.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Length of the current string, in graphemes.
    pub fn current_len(&self) -> usize {
        self.entries[self.index].len()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Text currently shown.
    pub fn text(&self) -> &str {
        self.entries[self.index].prefix(self.count)
    }

    /// Move one grapheme and return the new text and the next delay.
    pub fn advance(&mut self) -> Tick {
        let len = self.current_len();
        let next_delay_ms = match self.phase {
            Phase::Done => None,
            Phase::Typing | Phase::Transitioning => {
                self.phase = Phase::Typing;
                if self.count < len {
                    self.count += 1;
                }
                if self.count < len {
                    Some(self.timing.type_ms)
                } else if !self.looping && self.index + 1 == self.entries.len() {
                    self.phase = Phase::Done;
                    None
                } else {
                    self.phase = Phase::Pausing;
                    Some(self.timing.pause_ms)
                }
            }
            Phase::Pausing | Phase::Deleting => {
                self.phase = Phase::Deleting;
                self.count = self.count.saturating_sub(1);
                if self.count > 0 {
                    Some(self.timing.delete_ms)
                } else {
                    // Text is empty here, so moving the index changes nothing visible
                    self.index = (self.index + 1) % self.entries.len();
                    self.phase = Phase::Transitioning;
                    Some(self.timing.transition_ms)
                }
            }
        };

        Tick {
            text: self.text().to_string(),
            next_delay_ms,
        }
    }
}

// =============================================================================
// TYPEWRITER (scheduler driver)
// =============================================================================

struct Inner {
    sequencer: RefCell<Sequencer>,
    document: Rc<dyn Document>,
    scheduler: Rc<dyn Scheduler>,
    target: ElementId,
    pending: Cell<Option<TimerHandle>>,
    text: Signal<String>,
}

/// Runs a [`Sequencer`] on the host scheduler.
///
/// Dropping the typewriter cancels its pending tick.
pub struct Typewriter {
    inner: Rc<Inner>,
}

impl Typewriter {
    /// Start typing into `target` after `start_delay_ms`.
    ///
    /// A missing target leaves the typewriter idle; nothing is scheduled.
    pub fn mount(
        document: Rc<dyn Document>,
        scheduler: Rc<dyn Scheduler>,
        target: ElementId,
        sequencer: Sequencer,
        start_delay_ms: u64,
    ) -> Self {
        let present = document.contains(&target);
        let inner = Rc::new(Inner {
            sequencer: RefCell::new(sequencer),
            document,
            scheduler,
            target,
            pending: Cell::new(None),
            text: signal(String::new()),
        });

        if present {
            inner.document.set_text(&inner.target, "");
            schedule_tick(&inner, start_delay_ms);
        } else {
            debug!(target_id = %inner.target, "typewriter target missing, not starting");
        }

        Self { inner }
    }

    /// Text currently shown.
    pub fn text(&self) -> String {
        self.inner.text.get()
    }

    /// Reactive view of the shown text.
    pub fn text_signal(&self) -> Signal<String> {
        self.inner.text.clone()
    }

    pub fn phase(&self) -> Phase {
        self.inner.sequencer.borrow().phase()
    }

    /// Whether a tick is scheduled.
    pub fn is_running(&self) -> bool {
        self.inner.pending.get().is_some()
    }

    /// Cancel the pending tick. The text stays as it is. Idempotent.
    pub fn cancel(&self) {
        if let Some(handle) = self.inner.pending.take() {
            self.inner.scheduler.cancel(handle);
            debug!(target_id = %self.inner.target, "typewriter cancelled");
        }
    }
}

impl Drop for Typewriter {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn schedule_tick(inner: &Rc<Inner>, delay_ms: u64) {
    let weak: Weak<Inner> = Rc::downgrade(inner);
    let handle = inner.scheduler.schedule(
        delay_ms,
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                tick(&inner);
            }
        }),
    );
    inner.pending.set(Some(handle));
}

fn tick(inner: &Rc<Inner>) {
    inner.pending.set(None);
    let Tick { text, next_delay_ms } = inner.sequencer.borrow_mut().advance();
    trace!(target_id = %inner.target, text = %text, ?next_delay_ms, "typewriter tick");

    inner.document.set_text(&inner.target, &text);
    inner.text.set(text);

    if let Some(delay) = next_delay_ms {
        schedule_tick(inner, delay);
    }
}
