//! Section Watcher - Highlights the nav link of the section in view
//!
//! Each page section is watched against an activation band near the top of
//! the viewport. Whichever section most recently entered the band is the
//! active one, and exactly its nav link carries the active class. When no
//! section touches the band, no link is highlighted.
//!
//! # Tie-break
//!
//! Entries are applied in delivery order. If one batch reports several
//! sections entering, the last one processed wins. When the active section
//! leaves, the most recently entered section still in the band takes over.
//!
//! # Example
//!
//! ```ignore
//! let links = NavLink::from_document(&*document, "nav-link");
//! let watcher = SectionWatcher::mount(document, Some(viewport), links, SectionWatchOptions::default());
//! assert_eq!(watcher.active(), Some(ElementId::new("about")));
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde::Deserialize;
use spark_signals::{signal, Signal};
use tracing::{debug, trace};

use crate::host::{Document, ObserverId, ViewportObserver};
use crate::types::{ElementId, Inset, IntersectionEntry, ObserveOptions, RootMargin};

// =============================================================================
// TYPES
// =============================================================================

/// A section and the nav link that points at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub section: ElementId,
    pub link: ElementId,
}

impl NavLink {
    pub fn new(section: impl Into<ElementId>, link: impl Into<ElementId>) -> Self {
        Self {
            section: section.into(),
            link: link.into(),
        }
    }

    /// Pair every element carrying `link_class` with the section its
    /// `href="#..."` points at. Links without a fragment href are skipped.
    pub fn from_document(document: &dyn Document, link_class: &str) -> Vec<NavLink> {
        document
            .elements_with_class(link_class)
            .into_iter()
            .filter_map(|link| {
                let href = document.attribute(&link, "href")?;
                let section = ElementId::from_anchor(&href)?;
                Some(NavLink { section, link })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SectionWatchOptions {
    /// Shrinks the viewport to the activation band.
    pub root_margin: RootMargin,
    /// Class put on the highlighted nav link.
    pub active_class: String,
}

impl Default for SectionWatchOptions {
    fn default() -> Self {
        Self {
            root_margin: RootMargin::new(Inset::Percent(30.0), Inset::Percent(70.0)),
            active_class: "active".to_string(),
        }
    }
}

// =============================================================================
// WATCHER
// =============================================================================

struct Inner {
    document: Rc<dyn Document>,
    links: Vec<NavLink>,
    active_class: String,
    /// Sections currently in the band, oldest entry first.
    intersecting: RefCell<Vec<ElementId>>,
    active: Signal<Option<ElementId>>,
}

impl Inner {
    fn handle_batch(&self, entries: &[IntersectionEntry]) {
        {
            let mut intersecting = self.intersecting.borrow_mut();
            for entry in entries {
                if !self.links.iter().any(|l| l.section == entry.target) {
                    continue;
                }
                intersecting.retain(|s| *s != entry.target);
                if entry.is_intersecting {
                    intersecting.push(entry.target.clone());
                }
                trace!(section = %entry.target, entering = entry.is_intersecting, "section notification");
            }
        }

        let next = self.intersecting.borrow().last().cloned();
        self.apply(next.as_ref());
        if self.active.get() != next {
            debug!(section = ?next.as_ref().map(ElementId::as_str), "active section changed");
            self.active.set(next);
        }
    }

    fn apply(&self, active: Option<&ElementId>) {
        for link in &self.links {
            let on = Some(&link.section) == active;
            self.document.set_class(&link.link, &self.active_class, on);
        }
    }
}

/// Keeps the nav highlight in sync with the section in view.
///
/// Dropping the watcher disconnects its observer.
pub struct SectionWatcher {
    inner: Rc<Inner>,
    viewport: Option<Rc<dyn ViewportObserver>>,
    observer: Cell<Option<ObserverId>>,
}

impl SectionWatcher {
    /// Start watching. Links whose section or link element is missing are
    /// ignored. Without a viewport observer the watcher stays inert.
    pub fn mount(
        document: Rc<dyn Document>,
        viewport: Option<Rc<dyn ViewportObserver>>,
        links: Vec<NavLink>,
        options: SectionWatchOptions,
    ) -> Self {
        let links: Vec<NavLink> = links
            .into_iter()
            .filter(|l| {
                let present = document.contains(&l.section) && document.contains(&l.link);
                if !present {
                    debug!(section = %l.section, link = %l.link, "nav link skipped, markup missing");
                }
                present
            })
            .collect();

        let inner = Rc::new(Inner {
            document,
            links,
            active_class: options.active_class,
            intersecting: RefCell::new(Vec::new()),
            active: signal(None),
        });

        let watcher = Self {
            inner,
            viewport,
            observer: Cell::new(None),
        };

        let Some(viewport) = watcher.viewport.clone() else {
            debug!("no viewport observer, section watcher inert");
            return watcher;
        };
        if watcher.inner.links.is_empty() {
            debug!("no sections to watch");
            return watcher;
        }

        let weak: Weak<Inner> = Rc::downgrade(&watcher.inner);
        let id = viewport.connect(
            ObserveOptions {
                root_margin: options.root_margin,
                thresholds: vec![0.0],
            },
            Rc::new(move |entries: &[IntersectionEntry]| {
                if let Some(inner) = weak.upgrade() {
                    inner.handle_batch(entries);
                }
            }),
        );

        let mut observed: Vec<&ElementId> = Vec::new();
        for link in &watcher.inner.links {
            if !observed.contains(&&link.section) {
                viewport.observe(id, &link.section);
                observed.push(&link.section);
            }
        }
        watcher.observer.set(Some(id));
        watcher
    }

    /// The active section, if any.
    pub fn active(&self) -> Option<ElementId> {
        self.inner.active.get()
    }

    /// Reactive view of the active section.
    pub fn active_signal(&self) -> Signal<Option<ElementId>> {
        self.inner.active.clone()
    }

    /// Whether an observer is connected.
    pub fn is_watching(&self) -> bool {
        self.observer.get().is_some()
    }

    /// Detach from the viewport observer. Idempotent.
    pub fn disconnect(&self) {
        if let (Some(id), Some(viewport)) = (self.observer.take(), self.viewport.as_ref()) {
            viewport.disconnect(id);
            debug!("section watcher disconnected");
        }
    }
}

impl Drop for SectionWatcher {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ManualViewport, MemoryPage};

    struct Fixture {
        page: Rc<MemoryPage>,
        viewport: Rc<ManualViewport>,
        watcher: SectionWatcher,
    }

    /// Sections a, b, c stacked 1000px apart, each 800px tall.
    fn setup() -> Fixture {
        let page = Rc::new(MemoryPage::new(1000.0));
        for (i, name) in ["a", "b", "c"].into_iter().enumerate() {
            page.element(name).at(i as f32 * 1000.0, 800.0);
            page.element(format!("link-{name}"))
                .class("nav-link")
                .attr("href", &format!("#{name}"));
        }
        let viewport = Rc::new(ManualViewport::new());
        let links = NavLink::from_document(&*page, "nav-link");
        let watcher = SectionWatcher::mount(
            page.clone(),
            Some(viewport.clone()),
            links,
            SectionWatchOptions::default(),
        );
        Fixture { page, viewport, watcher }
    }

    fn highlighted(page: &MemoryPage) -> Vec<String> {
        page.elements_with_class("active")
            .into_iter()
            .map(|id| id.as_str().to_string())
            .collect()
    }

    fn observer(f: &Fixture) -> ObserverId {
        f.viewport.observers()[0]
    }

    #[test]
    fn test_from_document_pairs_links() {
        let f = setup();
        let links = NavLink::from_document(&*f.page, "nav-link");
        assert_eq!(links.len(), 3);
        assert_eq!(links[1], NavLink::new("b", "link-b"));
    }

    #[test]
    fn test_only_b_highlighted() {
        let f = setup();
        f.viewport.deliver(
            observer(&f),
            vec![
                IntersectionEntry::leaving("a"),
                IntersectionEntry::entering("b", 0.0),
                IntersectionEntry::leaving("c"),
            ],
        );
        assert_eq!(highlighted(&f.page), vec!["link-b"]);
        assert_eq!(f.watcher.active(), Some(ElementId::new("b")));
    }

    #[test]
    fn test_last_entering_in_batch_wins() {
        let f = setup();
        f.viewport.deliver(
            observer(&f),
            vec![IntersectionEntry::entering("a", 0.0), IntersectionEntry::entering("b", 0.0)],
        );
        assert_eq!(highlighted(&f.page), vec!["link-b"]);
    }

    #[test]
    fn test_last_entering_in_batch_wins_reversed() {
        let f = setup();
        f.viewport.deliver(
            observer(&f),
            vec![IntersectionEntry::entering("b", 0.0), IntersectionEntry::entering("a", 0.0)],
        );
        assert_eq!(highlighted(&f.page), vec!["link-a"]);
    }

    #[test]
    fn test_falls_back_to_remaining_section() {
        let f = setup();
        let id = observer(&f);
        f.viewport.deliver(id, vec![IntersectionEntry::entering("a", 0.0)]);
        f.viewport.deliver(id, vec![IntersectionEntry::entering("b", 0.0)]);
        f.viewport.deliver(id, vec![IntersectionEntry::leaving("b")]);
        assert_eq!(highlighted(&f.page), vec!["link-a"]);

        f.viewport.deliver(id, vec![IntersectionEntry::leaving("a")]);
        assert!(highlighted(&f.page).is_empty());
        assert_eq!(f.watcher.active(), None);
    }

    #[test]
    fn test_tracks_scroll_geometry() {
        let f = setup();
        // Band is a line 300px below the viewport top
        f.viewport.scan(&*f.page, &*f.page);
        assert_eq!(highlighted(&f.page), vec!["link-a"]);

        f.page.set_scroll_y(900.0);
        f.viewport.scan(&*f.page, &*f.page);
        assert_eq!(highlighted(&f.page), vec!["link-b"]);

        // Gap between b (ends 1800) and c (starts 2000): line at 1850
        f.page.set_scroll_y(1550.0);
        f.viewport.scan(&*f.page, &*f.page);
        assert!(highlighted(&f.page).is_empty());
    }

    #[test]
    fn test_no_viewport_is_inert() {
        let page = Rc::new(MemoryPage::new(1000.0));
        page.element("a").at(0.0, 800.0);
        page.element("link-a").class("nav-link").attr("href", "#a");
        let links = NavLink::from_document(&*page, "nav-link");
        let watcher = SectionWatcher::mount(page.clone(), None, links, SectionWatchOptions::default());

        assert!(!watcher.is_watching());
        assert_eq!(watcher.active(), None);
        assert!(page.elements_with_class("active").is_empty());
    }

    #[test]
    fn test_missing_markup_skipped() {
        let page = Rc::new(MemoryPage::new(1000.0));
        page.element("a").at(0.0, 800.0);
        page.element("link-a");
        let viewport = Rc::new(ManualViewport::new());
        let watcher = SectionWatcher::mount(
            page.clone(),
            Some(viewport.clone()),
            vec![NavLink::new("a", "link-a"), NavLink::new("ghost", "link-ghost")],
            SectionWatchOptions::default(),
        );

        let id = viewport.observers()[0];
        assert_eq!(viewport.observed(id), vec![ElementId::new("a")]);
        viewport.deliver(id, vec![IntersectionEntry::entering("a", 0.0)]);
        assert_eq!(watcher.active(), Some(ElementId::new("a")));
    }

    #[test]
    fn test_disconnect_and_drop() {
        let f = setup();
        let id = observer(&f);
        f.watcher.disconnect();
        assert!(!f.viewport.is_connected(id));
        f.watcher.disconnect();

        let g = setup();
        let id = observer(&g);
        let viewport = g.viewport.clone();
        drop(g);
        assert!(!viewport.is_connected(id));
    }
}
