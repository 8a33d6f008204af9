//! App - Mount every page behavior and route host events to them
//!
//! `mount()` looks at the page, builds each component whose markup is
//! present, and returns a [`MountHandle`]. The host forwards its events
//! through [`MountHandle::dispatch`]; intersection notifications and timers
//! reach the components directly through the collaborators in [`PageHost`].
//!
//! # Example
//!
//! ```ignore
//! let handle = spark_folio::mount(host, &FolioConfig::default())?;
//! handle.dispatch(PageEvent::Loaded);
//! if handle.dispatch(PageEvent::Click("link-about".into())) {
//!     // prevent the browser default
//! }
//! handle.unmount();
//! ```

use std::cell::Cell;
use std::rc::{Rc, Weak};

use tracing::{debug, info};

use crate::config::FolioConfig;
use crate::error::Result;
use crate::host::PageHost;
use crate::state::keyboard::{self, KeyboardEvent};
use crate::state::scroll::{BackToTop, SmoothScroll};
use crate::state::{
    ContactForm, Counter, LoadingScreen, LoadingStage, NavLink, Navigation, RevealController, SectionWatcher,
    Sequencer, SubmitOutcome, Typewriter,
};
use crate::theme::ThemeManager;
use crate::types::{ChromeState, ElementId};

// =============================================================================
// Events
// =============================================================================

/// Host events the page reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    /// The page and its assets finished loading.
    Loaded,
    /// The window scrolled; the position is read from the host window.
    Scrolled,
    Click(ElementId),
    Key(KeyboardEvent),
    /// A form was submitted.
    Submit(ElementId),
}

// =============================================================================
// Mount Handle
// =============================================================================

/// Handle for unmounting the page behaviors.
///
/// Dropping the handle unmounts too.
pub struct MountHandle {
    host: PageHost,
    theme: Option<ThemeManager>,
    loading: Option<LoadingScreen>,
    navigation: Option<Navigation>,
    smooth_scroll: SmoothScroll,
    back_to_top: Option<BackToTop>,
    contact: Option<ContactForm>,
    sections: SectionWatcher,
    reveal: RevealController,
    typewriter: Option<Typewriter>,
    counters: Rc<Vec<Counter>>,
    loaded: Cell<bool>,
    mounted: Cell<bool>,
}

impl MountHandle {
    /// Route one host event. Returns true when the event was handled and
    /// the host default (navigation, form post) should be prevented.
    pub fn dispatch(&self, event: PageEvent) -> bool {
        if !self.mounted.get() {
            return false;
        }
        match event {
            PageEvent::Loaded => {
                self.loaded.set(true);
                if let Some(loading) = &self.loading {
                    loading.on_load();
                }
                false
            }
            PageEvent::Scrolled => {
                let y = self.host.window.scroll_y();
                if let Some(navigation) = &self.navigation {
                    navigation.on_scroll(y);
                }
                if let Some(back_to_top) = &self.back_to_top {
                    back_to_top.on_scroll(y);
                }
                false
            }
            PageEvent::Click(target) => self.click(&target),
            PageEvent::Key(event) => keyboard::dispatch(event),
            PageEvent::Submit(form) => match &self.contact {
                Some(contact) if contact.is_form(&form) => {
                    if let SubmitOutcome::Rejected(err) = contact.submit() {
                        debug!(%err, "submission rejected");
                    }
                    true
                }
                _ => false,
            },
        }
    }

    fn click(&self, target: &ElementId) -> bool {
        if let Some(theme) = self.theme.as_ref().filter(|t| t.is_toggle(target)) {
            theme.toggle();
            return true;
        }
        // Menu links close the menu and still fall through to anchor scrolling
        if let Some(navigation) = &self.navigation {
            if navigation.handle_click(target) {
                return true;
            }
        }
        if let Some(back_to_top) = &self.back_to_top {
            if back_to_top.handle_click(target) {
                return true;
            }
        }
        self.smooth_scroll.handle_click(target)
    }

    /// Combined chrome flags. `LOADED` is set once the loading overlay starts
    /// fading, or on load when the page has no overlay.
    pub fn chrome(&self) -> ChromeState {
        let mut state = self
            .navigation
            .as_ref()
            .map_or(ChromeState::NONE, Navigation::state);
        if self.back_to_top.as_ref().is_some_and(BackToTop::is_visible) {
            state |= ChromeState::BACK_TO_TOP;
        }
        let faded = match &self.loading {
            Some(loading) => loading.stage() != LoadingStage::Showing,
            None => self.loaded.get(),
        };
        if faded {
            state |= ChromeState::LOADED;
        }
        state
    }

    pub fn theme(&self) -> Option<&ThemeManager> {
        self.theme.as_ref()
    }

    pub fn loading(&self) -> Option<&LoadingScreen> {
        self.loading.as_ref()
    }

    pub fn navigation(&self) -> Option<&Navigation> {
        self.navigation.as_ref()
    }

    pub fn back_to_top(&self) -> Option<&BackToTop> {
        self.back_to_top.as_ref()
    }

    pub fn contact(&self) -> Option<&ContactForm> {
        self.contact.as_ref()
    }

    pub fn sections(&self) -> &SectionWatcher {
        &self.sections
    }

    pub fn reveal(&self) -> &RevealController {
        &self.reveal
    }

    pub fn typewriter(&self) -> Option<&Typewriter> {
        self.typewriter.as_ref()
    }

    pub fn counters(&self) -> &[Counter] {
        &self.counters
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    /// Cancel every timer, disconnect every observer and remove keyboard
    /// handlers. Idempotent.
    ///
    /// Classes and text already applied to the page stay as they are.
    pub fn unmount(&self) {
        if !self.mounted.replace(false) {
            return;
        }
        if let Some(navigation) = &self.navigation {
            navigation.teardown();
        }
        if let Some(loading) = &self.loading {
            loading.cancel();
        }
        if let Some(typewriter) = &self.typewriter {
            typewriter.cancel();
        }
        for counter in self.counters.iter() {
            counter.cancel();
        }
        self.sections.disconnect();
        self.reveal.disconnect();
        info!("page behaviors unmounted");
    }
}

impl Drop for MountHandle {
    fn drop(&mut self) {
        self.unmount();
    }
}

// =============================================================================
// Mount Function
// =============================================================================

/// Mount every behavior whose markup is on the page.
///
/// Fails on an invalid configuration, or when the typewriter target is
/// present but no strings are configured.
pub fn mount(host: PageHost, config: &FolioConfig) -> Result<MountHandle> {
    config.validate()?;
    let layout = &config.layout;
    let document = host.document.clone();

    // Everything that can fail runs before the page is touched
    let sequencer = if document.contains(&layout.typewriter_target) {
        let tw = &config.typewriter;
        Some(Sequencer::new(tw.strings.iter().cloned(), tw.timing, tw.looping)?)
    } else {
        debug!(target_id = %layout.typewriter_target, "no typewriter target");
        None
    };

    let theme = ThemeManager::mount(document.clone(), host.store.clone(), layout.theme_elements());

    let loading = LoadingScreen::mount(
        document.clone(),
        host.scheduler.clone(),
        layout.loading_overlay.clone(),
        config.loading.fade_ms,
        config.loading.remove_ms,
    );

    let menu_links = document.elements_with_class(&layout.nav_link_class);
    let navigation = Navigation::mount(
        document.clone(),
        layout.nav_elements(),
        menu_links,
        config.chrome.scrolled_threshold,
    );

    let smooth_scroll = SmoothScroll::new(
        document.clone(),
        host.window.clone(),
        layout.navbar.clone(),
        config.chrome.header_fallback,
    );

    let back_to_top = BackToTop::mount(
        document.clone(),
        host.window.clone(),
        layout.back_to_top.clone(),
        config.chrome.back_to_top_threshold,
    );

    let contact = ContactForm::mount(document.clone(), host.window.clone(), layout.contact_fields());

    let sections = SectionWatcher::mount(
        document.clone(),
        host.viewport.clone(),
        NavLink::from_document(&*document, &layout.nav_link_class),
        config.sections.clone(),
    );

    let reveal = RevealController::mount(
        document.clone(),
        host.viewport.clone(),
        host.scheduler.clone(),
        document.elements_with_class(&layout.reveal_class),
        config.reveal.clone(),
    );

    let typewriter = sequencer.map(|sequencer| {
        Typewriter::mount(
            document.clone(),
            host.scheduler.clone(),
            layout.typewriter_target.clone(),
            sequencer,
            config.typewriter.start_delay_ms,
        )
    });

    let counters: Rc<Vec<Counter>> = Rc::new(
        document
            .elements_with_class(&layout.counter_class)
            .into_iter()
            .filter_map(|id| {
                Counter::from_element(document.clone(), host.scheduler.clone(), id, config.counter)
            })
            .collect(),
    );
    start_counters(&reveal, &counters);

    info!(
        theme = theme.is_some(),
        navigation = navigation.is_some(),
        loading = loading.is_some(),
        contact = contact.is_some(),
        typewriter = typewriter.is_some(),
        reveal_targets = reveal.targets().len(),
        counters = counters.len(),
        "page behaviors mounted"
    );

    Ok(MountHandle {
        host,
        theme,
        loading,
        navigation,
        smooth_scroll,
        back_to_top,
        contact,
        sections,
        reveal,
        typewriter,
        counters,
        loaded: Cell::new(false),
        mounted: Cell::new(true),
    })
}

/// Unmount and clean up.
pub fn unmount(handle: MountHandle) {
    handle.unmount();
}

/// Counters that are also reveal targets start on their first reveal; the
/// rest (and any already revealed) start now.
fn start_counters(reveal: &RevealController, counters: &Rc<Vec<Counter>>) {
    let weak: Weak<Vec<Counter>> = Rc::downgrade(counters);
    reveal.on_reveal(move |id| {
        let Some(counters) = weak.upgrade() else {
            return;
        };
        for counter in counters.iter().filter(|c| c.element() == id) {
            counter.start();
        }
    });

    let targets = reveal.targets();
    for counter in counters.iter() {
        if !targets.contains(counter.element()) || reveal.is_revealed(counter.element()) {
            counter.start();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FolioError;
    use crate::host::{Document, ManualScheduler, ManualViewport, MemoryPage, MemoryStore};
    use crate::state::keyboard::reset_keyboard_state;
    use crate::types::ScrollBehavior;

    struct Fixture {
        page: Rc<MemoryPage>,
        clock: Rc<ManualScheduler>,
        viewport: Rc<ManualViewport>,
        host: PageHost,
    }

    fn setup() -> Fixture {
        reset_keyboard_state();
        let page = Rc::new(MemoryPage::new(800.0));
        page.element("html");
        page.element("body");
        page.element("loadingOverlay");
        page.element("navbar").at(0.0, 70.0);
        page.element("menuToggle");
        page.element("navLinks");
        page.element("themeToggle");
        page.element("themeIcon");
        page.element("backToTop");
        page.element("typed");
        page.element("link-home").class("nav-link").attr("href", "#home");
        page.element("link-about").class("nav-link").attr("href", "#about");
        page.element("home").at(0.0, 1000.0);
        page.element("about").at(1000.0, 1000.0).class("reveal");
        page.element("stat").at(1200.0, 50.0).class("reveal").class("counter").attr("data-target", "12");

        let clock = Rc::new(ManualScheduler::new());
        let viewport = Rc::new(ManualViewport::new());
        let host = PageHost {
            document: page.clone(),
            window: page.clone(),
            scheduler: clock.clone(),
            viewport: Some(viewport.clone()),
            store: Rc::new(MemoryStore::new()),
        };
        Fixture { page, clock, viewport, host }
    }

    #[test]
    fn test_mounts_present_components() {
        let f = setup();
        let handle = mount(f.host.clone(), &FolioConfig::default()).unwrap();

        assert!(handle.theme().is_some());
        assert!(handle.navigation().is_some());
        assert!(handle.loading().is_some());
        assert!(handle.contact().is_none());
        assert!(handle.typewriter().is_some_and(Typewriter::is_running));
        assert!(handle.sections().is_watching());
        assert_eq!(handle.reveal().targets().len(), 2);
        assert_eq!(handle.counters().len(), 1);
    }

    #[test]
    fn test_click_routing() {
        let f = setup();
        let handle = mount(f.host.clone(), &FolioConfig::default()).unwrap();

        assert!(handle.dispatch(PageEvent::Click("themeToggle".into())));
        assert_eq!(f.page.attribute(&"html".into(), "data-theme").as_deref(), Some("dark"));

        assert!(handle.dispatch(PageEvent::Click("menuToggle".into())));
        assert!(handle.chrome().contains(ChromeState::MENU_OPEN));

        // Menu link: closes the menu and scrolls to the anchor
        assert!(handle.dispatch(PageEvent::Click("link-about".into())));
        assert!(!handle.chrome().contains(ChromeState::MENU_OPEN));
        assert_eq!(f.page.scroll_log(), vec![(930.0, ScrollBehavior::Smooth)]);

        assert!(!handle.dispatch(PageEvent::Click("home".into())));
    }

    #[test]
    fn test_scroll_updates_chrome() {
        let f = setup();
        let handle = mount(f.host.clone(), &FolioConfig::default()).unwrap();

        f.page.set_scroll_y(300.0);
        handle.dispatch(PageEvent::Scrolled);
        let chrome = handle.chrome();
        assert!(chrome.contains(ChromeState::SCROLLED | ChromeState::BACK_TO_TOP));
        assert!(!chrome.contains(ChromeState::LOADED));
    }

    #[test]
    fn test_counter_starts_on_reveal() {
        let f = setup();
        let handle = mount(f.host.clone(), &FolioConfig::default()).unwrap();
        assert!(!handle.counters()[0].is_running());

        f.page.set_scroll_y(700.0);
        f.viewport.scan(&*f.page, &*f.page);
        // Second in the batch after "about"
        assert!(!handle.reveal().is_revealed(&"stat".into()));
        f.clock.advance(100);
        assert!(handle.reveal().is_revealed(&"stat".into()));
        assert!(handle.counters()[0].is_running());

        f.clock.advance(5000);
        assert_eq!(f.page.text(&"stat".into()).as_deref(), Some("12"));
    }

    #[test]
    fn test_counter_without_viewport() {
        let mut f = setup();
        f.host.viewport = None;
        let handle = mount(f.host.clone(), &FolioConfig::default()).unwrap();
        assert!(handle.counters()[0].is_running());
    }

    #[test]
    fn test_empty_typewriter_strings() {
        let f = setup();
        let mut config = FolioConfig::default();
        config.typewriter.strings.clear();
        assert!(matches!(mount(f.host.clone(), &config), Err(FolioError::EmptySequence)));

        f.page.remove(&"typed".into());
        assert!(mount(f.host.clone(), &config).is_ok());
    }

    #[test]
    fn test_failed_mount_leaves_page_untouched() {
        let mut f = setup();
        f.host.viewport = None;
        let mut config = FolioConfig::default();
        config.typewriter.strings.clear();

        assert!(mount(f.host.clone(), &config).is_err());
        assert_eq!(f.host.store.get(crate::theme::THEME_KEY), None);
        assert_eq!(f.page.attribute(&"html".into(), "data-theme"), None);
        assert!(f.page.elements_with_class("revealed").is_empty());
        assert_eq!(f.clock.pending(), 0);
        assert_eq!(keyboard::handler_count("Escape"), 0);
    }

    #[test]
    fn test_loaded_flag_follows_overlay_fade() {
        let f = setup();
        let handle = mount(f.host.clone(), &FolioConfig::default()).unwrap();

        handle.dispatch(PageEvent::Loaded);
        assert!(!handle.chrome().contains(ChromeState::LOADED));
        f.clock.advance(299);
        assert!(!handle.chrome().contains(ChromeState::LOADED));
        f.clock.advance(1);
        assert!(handle.chrome().contains(ChromeState::LOADED));

        f.page.remove(&"loadingOverlay".into());
        let bare = mount(f.host.clone(), &FolioConfig::default()).unwrap();
        bare.dispatch(PageEvent::Loaded);
        assert!(bare.chrome().contains(ChromeState::LOADED));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let f = setup();
        let mut config = FolioConfig::default();
        config.reveal.threshold = -0.5;
        assert!(matches!(mount(f.host, &config), Err(FolioError::InvalidConfig(_))));
    }

    #[test]
    fn test_unmount_tears_down() {
        let f = setup();
        let handle = mount(f.host.clone(), &FolioConfig::default()).unwrap();
        handle.dispatch(PageEvent::Loaded);
        assert!(f.clock.pending() > 0);
        assert_eq!(keyboard::handler_count("Escape"), 1);

        handle.unmount();
        assert!(!handle.is_mounted());
        assert_eq!(f.clock.pending(), 0);
        assert!(f.viewport.observers().is_empty());
        assert_eq!(keyboard::handler_count("Escape"), 0);
        assert!(!handle.dispatch(PageEvent::Click("themeToggle".into())));

        handle.unmount();
    }

    #[test]
    fn test_drop_unmounts() {
        let f = setup();
        let handle = mount(f.host.clone(), &FolioConfig::default()).unwrap();
        drop(handle);
        assert_eq!(f.clock.pending(), 0);
        assert!(f.viewport.observers().is_empty());
    }
}
