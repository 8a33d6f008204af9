//! State Module - Page behaviors
//!
//! Each component here owns exactly the elements and host capabilities it
//! was mounted with and never calls another component:
//!
//! - **Sections** - Active nav link for the section in view
//! - **Reveal** - One-shot reveal-on-scroll with a staggered cascade
//! - **Typewriter** - Type/delete cycle over a list of strings
//! - **Chrome** - Navbar, mobile menu, loading overlay
//! - **Scroll** - Anchor scrolling below the header, back-to-top
//! - **Contact** - Contact form validation
//! - **Counter** - Count-up number animation
//! - **Keyboard** - Key event dispatch and handler registry

pub mod chrome;
pub mod contact;
pub mod counter;
pub mod keyboard;
pub mod reveal;
pub mod scroll;
pub mod sections;
pub mod typewriter;

pub use chrome::{LoadingScreen, LoadingStage, NavElements, Navigation};
pub use contact::{ContactFields, ContactForm, ContactSubmission, SubmitOutcome};
pub use counter::{Counter, CounterAnimation, CounterOptions};
pub use keyboard::KeyboardEvent;
pub use reveal::{RevealController, RevealOptions, RevealState};
pub use scroll::{BackToTop, SmoothScroll};
pub use sections::{NavLink, SectionWatchOptions, SectionWatcher};
pub use typewriter::{Phase, Sequencer, Tick, Typewriter, TypewriterTiming};
