//! # spark-folio
//!
//! Reactive, scroll-driven page behaviors for a single-page portfolio.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals): every
//! component publishes its state (active section, revealed count, typed text,
//! chrome flags) as a `Signal`.
//!
//! ## Architecture
//!
//! The crate owns no browser. The page is reached only through the traits in
//! [`host`], so the same components run against a real page binding or the
//! deterministic in-memory host used by the tests:
//!
//! ```text
//! host events ──> MountHandle::dispatch ──> chrome / theme / form / keyboard
//! viewport    ──> SectionWatcher, RevealController
//! scheduler   ──> Typewriter, LoadingScreen, Counter, staggered reveals
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Element ids, geometry, intersection entries, chrome flags
//! - [`host`] - Host capability traits and in-memory implementations
//! - [`state`] - The page behaviors
//! - [`theme`] - Light/dark theme with a persisted preference
//! - [`config`] - TOML configuration
//! - [`app`] - Mount everything and route host events

pub mod app;
pub mod config;
pub mod error;
pub mod host;
pub mod state;
pub mod theme;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use app::{mount, unmount, MountHandle, PageEvent};
pub use config::FolioConfig;
pub use error::{FolioError, FormError, Result};

pub use host::{
    Document, ManualScheduler, ManualViewport, MemoryPage, MemoryStore, PageHost,
    PreferenceStore, Scheduler, ViewportObserver, Window,
};

pub use state::{
    // Scroll-driven
    NavLink, RevealController, RevealOptions, RevealState, SectionWatchOptions, SectionWatcher,
    // Typewriter
    Phase, Sequencer, Tick, Typewriter, TypewriterTiming,
    // Chrome
    BackToTop, LoadingScreen, LoadingStage, NavElements, Navigation, SmoothScroll,
    // Form and counter
    ContactFields, ContactForm, ContactSubmission, Counter, CounterOptions, SubmitOutcome,
    // Keyboard
    KeyboardEvent,
};

pub use theme::{ThemeElements, ThemeManager, ThemeMode};
