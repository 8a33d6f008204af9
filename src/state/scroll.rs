//! Scroll Module - Anchor navigation and the back-to-top control
//!
//! - Clicking an in-page anchor (`href="#about"`) scrolls smoothly to the
//!   target, leaving room for the fixed header
//! - The back-to-top button shows once the page is scrolled far enough and
//!   scrolls smoothly to the top when clicked
//!
//! Both only read the window position when the host reports a scroll or a
//! click; neither holds a timer.

use std::rc::Rc;

use spark_signals::{signal, Signal};
use tracing::{debug, trace};

use crate::host::{Document, Window};
use crate::types::{ElementId, ScrollBehavior};

// =============================================================================
// SCROLL CONSTANTS
// =============================================================================

/// Header height used when the navbar is missing or has no height.
pub const DEFAULT_HEADER_OFFSET: f32 = 80.0;

/// Scroll distance past which the back-to-top button shows.
pub const BACK_TO_TOP_THRESHOLD: f32 = 200.0;

// =============================================================================
// SMOOTH ANCHOR SCROLL
// =============================================================================

pub struct SmoothScroll {
    document: Rc<dyn Document>,
    window: Rc<dyn Window>,
    navbar: ElementId,
    fallback_offset: f32,
}

impl SmoothScroll {
    pub fn new(
        document: Rc<dyn Document>,
        window: Rc<dyn Window>,
        navbar: ElementId,
        fallback_offset: f32,
    ) -> Self {
        Self {
            document,
            window,
            navbar,
            fallback_offset,
        }
    }

    /// Height of the fixed header, falling back when it is absent or zero.
    pub fn header_offset(&self) -> f32 {
        self.document
            .offset_height(&self.navbar)
            .filter(|h| *h > 0.0)
            .unwrap_or(self.fallback_offset)
    }

    /// Where the window should land for `href`, if it names an element on
    /// this page.
    pub fn target_top(&self, href: &str) -> Option<f32> {
        let target = ElementId::from_anchor(href)?;
        let top = self.document.offset_top(&target)?;
        Some(top - self.header_offset())
    }

    /// Handle a click on `clicked`. Returns true if it was an in-page anchor
    /// that was scrolled to (the default navigation should be prevented).
    pub fn handle_click(&self, clicked: &ElementId) -> bool {
        let Some(href) = self.document.attribute(clicked, "href") else {
            return false;
        };
        let Some(top) = self.target_top(&href) else {
            trace!(%href, "not an in-page anchor");
            return false;
        };
        debug!(%href, top, "smooth scroll to anchor");
        self.window.scroll_to(top, ScrollBehavior::Smooth);
        true
    }
}

// =============================================================================
// BACK TO TOP
// =============================================================================

pub struct BackToTop {
    document: Rc<dyn Document>,
    window: Rc<dyn Window>,
    button: ElementId,
    threshold: f32,
    visible_class: String,
    visible: Signal<bool>,
}

impl BackToTop {
    /// `None` when the button is not on the page.
    pub fn mount(
        document: Rc<dyn Document>,
        window: Rc<dyn Window>,
        button: ElementId,
        threshold: f32,
    ) -> Option<Self> {
        if !document.contains(&button) {
            debug!(%button, "back-to-top button missing");
            return None;
        }
        let control = Self {
            document,
            window,
            button,
            threshold,
            visible_class: "visible".to_string(),
            visible: signal(false),
        };
        control.on_scroll(control.window.scroll_y());
        Some(control)
    }

    /// Show the button strictly past the threshold.
    pub fn on_scroll(&self, scroll_y: f32) {
        let visible = scroll_y > self.threshold;
        self.document
            .set_class(&self.button, &self.visible_class, visible);
        if self.visible.get() != visible {
            self.visible.set(visible);
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    pub fn visible_signal(&self) -> Signal<bool> {
        self.visible.clone()
    }

    /// Returns true if `clicked` is the button (and the page was scrolled up).
    pub fn handle_click(&self, clicked: &ElementId) -> bool {
        if *clicked != self.button {
            return false;
        }
        self.window.scroll_to(0.0, ScrollBehavior::Smooth);
        true
    }
}
