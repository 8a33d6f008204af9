//! Page Chrome - Navigation bar, mobile menu and loading overlay
//!
//! - Navbar gets `scrolled` once the page moves past a small threshold
//! - The menu toggle opens/closes the mobile menu and locks body scrolling
//!   while it is open; following a menu link or pressing Escape closes it
//! - The loading overlay fades out shortly after the page finishes loading
//!   and is then removed from layout
//!
//! State is published as [`ChromeState`] flags through a signal.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use spark_signals::{signal, Signal};
use tracing::debug;

use super::keyboard;
use crate::host::{Document, Scheduler, TimerHandle};
use crate::types::{ChromeState, ElementId};

// =============================================================================
// NAVIGATION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavElements {
    pub navbar: ElementId,
    pub menu_toggle: ElementId,
    /// Container of the menu links (the mobile menu itself).
    pub links: ElementId,
    /// Element whose overflow is locked while the menu is open.
    pub body: ElementId,
}

impl Default for NavElements {
    fn default() -> Self {
        Self {
            navbar: ElementId::new("navbar"),
            menu_toggle: ElementId::new("menuToggle"),
            links: ElementId::new("navLinks"),
            body: ElementId::new("body"),
        }
    }
}

struct NavInner {
    document: Rc<dyn Document>,
    elements: NavElements,
    menu_links: Vec<ElementId>,
    scrolled_threshold: f32,
    state: Signal<ChromeState>,
}

impl NavInner {
    fn update(&self, flags: ChromeState, on: bool) {
        let mut state = self.state.get();
        state.set(flags, on);
        if state != self.state.get() {
            self.state.set(state);
        }
    }

    fn close_menu(&self) {
        self.document.set_class(&self.elements.links, "active", false);
        self.document.set_style(&self.elements.body, "overflow", None);
        self.update(ChromeState::MENU_OPEN, false);
    }
}

pub struct Navigation {
    inner: Rc<NavInner>,
    escape_cleanup: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Navigation {
    /// Needs the navbar, the menu toggle and the links container; `None`
    /// if any is missing. `menu_links` are the anchors inside the menu.
    pub fn mount(
        document: Rc<dyn Document>,
        elements: NavElements,
        menu_links: Vec<ElementId>,
        scrolled_threshold: f32,
    ) -> Option<Self> {
        let required = [&elements.navbar, &elements.menu_toggle, &elements.links];
        if required.iter().any(|id| !document.contains(id)) {
            debug!("navigation markup missing, navigation disabled");
            return None;
        }

        let inner = Rc::new(NavInner {
            document,
            elements,
            menu_links,
            scrolled_threshold,
            state: signal(ChromeState::NONE),
        });

        let weak: Weak<NavInner> = Rc::downgrade(&inner);
        let cleanup = keyboard::on_key("Escape", move || {
            if let Some(inner) = weak.upgrade() {
                inner.close_menu();
            }
            false
        });

        Some(Self {
            inner,
            escape_cleanup: RefCell::new(Some(Box::new(cleanup))),
        })
    }

    /// Navbar `scrolled` class strictly past the threshold.
    pub fn on_scroll(&self, scroll_y: f32) {
        let scrolled = scroll_y > self.inner.scrolled_threshold;
        self.inner
            .document
            .set_class(&self.inner.elements.navbar, "scrolled", scrolled);
        self.inner.update(ChromeState::SCROLLED, scrolled);
    }

    /// Open or close the mobile menu. Returns whether it is now open.
    pub fn toggle_menu(&self) -> bool {
        let inner = &self.inner;
        let open = inner.document.toggle_class(&inner.elements.links, "active");
        inner.document.set_style(
            &inner.elements.body,
            "overflow",
            if open { Some("hidden") } else { None },
        );
        inner.update(ChromeState::MENU_OPEN, open);
        open
    }

    pub fn close_menu(&self) {
        self.inner.close_menu();
    }

    pub fn is_menu_open(&self) -> bool {
        self.inner.state.get().contains(ChromeState::MENU_OPEN)
    }

    pub fn state(&self) -> ChromeState {
        self.inner.state.get()
    }

    pub fn state_signal(&self) -> Signal<ChromeState> {
        self.inner.state.clone()
    }

    /// Route a click. Returns true only when the toggle was clicked; menu
    /// link clicks close the menu but are left for anchor scrolling.
    pub fn handle_click(&self, clicked: &ElementId) -> bool {
        if *clicked == self.inner.elements.menu_toggle {
            self.toggle_menu();
            return true;
        }
        if self.inner.menu_links.contains(clicked) {
            self.close_menu();
        }
        false
    }

    /// Remove the Escape handler. Idempotent.
    pub fn teardown(&self) {
        if let Some(cleanup) = self.escape_cleanup.borrow_mut().take() {
            cleanup();
        }
    }
}

impl Drop for Navigation {
    fn drop(&mut self) {
        self.teardown();
    }
}

// =============================================================================
// LOADING SCREEN
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingStage {
    Showing,
    /// Fade-out class applied, still in layout.
    Fading,
    Removed,
}

struct LoadingInner {
    document: Rc<dyn Document>,
    scheduler: Rc<dyn Scheduler>,
    overlay: ElementId,
    fade_ms: u64,
    remove_ms: u64,
    stage: Cell<LoadingStage>,
    pending: Cell<Option<TimerHandle>>,
}

fn fade(inner: &Rc<LoadingInner>) {
    inner.document.set_class(&inner.overlay, "hidden", true);
    inner.stage.set(LoadingStage::Fading);

    let weak = Rc::downgrade(inner);
    let handle = inner.scheduler.schedule(
        inner.remove_ms,
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.pending.set(None);
                inner.document.set_style(&inner.overlay, "display", Some("none"));
                inner.stage.set(LoadingStage::Removed);
                debug!("loading overlay removed");
            }
        }),
    );
    inner.pending.set(Some(handle));
}

pub struct LoadingScreen {
    inner: Rc<LoadingInner>,
}

impl LoadingScreen {
    /// `None` when the overlay is not on the page.
    pub fn mount(
        document: Rc<dyn Document>,
        scheduler: Rc<dyn Scheduler>,
        overlay: ElementId,
        fade_ms: u64,
        remove_ms: u64,
    ) -> Option<Self> {
        if !document.contains(&overlay) {
            debug!(%overlay, "loading overlay missing");
            return None;
        }
        Some(Self {
            inner: Rc::new(LoadingInner {
                document,
                scheduler,
                overlay,
                fade_ms,
                remove_ms,
                stage: Cell::new(LoadingStage::Showing),
                pending: Cell::new(None),
            }),
        })
    }

    /// Page finished loading: fade after `fade_ms`, remove `remove_ms`
    /// later. Repeated calls are ignored.
    pub fn on_load(&self) {
        let inner = &self.inner;
        if inner.stage.get() != LoadingStage::Showing || inner.pending.get().is_some() {
            return;
        }
        let weak = Rc::downgrade(inner);
        let handle = inner.scheduler.schedule(
            inner.fade_ms,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.pending.set(None);
                    fade(&inner);
                }
            }),
        );
        inner.pending.set(Some(handle));
    }

    pub fn stage(&self) -> LoadingStage {
        self.inner.stage.get()
    }

    /// Cancel whichever step is pending. Idempotent.
    pub fn cancel(&self) {
        if let Some(handle) = self.inner.pending.take() {
            self.inner.scheduler.cancel(handle);
        }
    }
}

impl Drop for LoadingScreen {
    fn drop(&mut self) {
        self.cancel();
    }
}
