//! Core types for spark-folio.
//!
//! These types are shared by every component and by the host traits.
//! Geometry is vertical-only: a portfolio page scrolls on one axis, so a
//! rectangle is just a top edge and a height in CSS pixels.

use std::fmt;

use serde::Deserialize;

// =============================================================================
// Element identity
// =============================================================================

/// Opaque identifier of a page element (the markup `id`, without `#`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse an in-page anchor (`#about`) into the element it targets.
    ///
    /// Returns `None` for anything that is not a fragment link, and for
    /// the bare `#` placeholder.
    pub fn from_anchor(href: &str) -> Option<Self> {
        let id = href.strip_prefix('#')?;
        if id.is_empty() {
            return None;
        }
        Some(Self::new(id))
    }

    /// The anchor form of this id (`#about`).
    pub fn anchor(&self) -> String {
        format!("#{}", self.0)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// =============================================================================
// Geometry
// =============================================================================

/// Vertical extent of an element, in viewport or page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(top: f32, height: f32) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Shift into viewport coordinates for the given scroll position.
    pub fn relative_to(&self, scroll_y: f32) -> Self {
        Self::new(self.top - scroll_y, self.height)
    }
}

/// The region of the viewport that counts as "visible" for an observer.
///
/// A band may have zero height (an activation line); touching it still
/// counts as intersecting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub top: f32,
    pub bottom: f32,
}

impl Band {
    /// Intersection ratio of `rect` against this band.
    ///
    /// `None` when the two do not touch. Zero-height elements report 1.0
    /// while touching.
    pub fn intersection(&self, rect: Rect) -> Option<f32> {
        if rect.top > self.bottom || rect.bottom() < self.top {
            return None;
        }
        if rect.height <= 0.0 {
            return Some(1.0);
        }
        let overlap = rect.bottom().min(self.bottom) - rect.top.max(self.top);
        Some((overlap.max(0.0) / rect.height).clamp(0.0, 1.0))
    }
}

/// One side of a root margin. Positive values shrink the viewport inward.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Inset {
    /// Percentage (0-100) of the viewport height.
    Percent(f32),
    Pixels(f32),
}

impl Inset {
    fn resolve(self, viewport_height: f32) -> f32 {
        match self {
            Self::Percent(p) => viewport_height * p / 100.0,
            Self::Pixels(px) => px,
        }
    }
}

impl Default for Inset {
    fn default() -> Self {
        Self::Pixels(0.0)
    }
}

/// Vertical root margin applied to the viewport before intersecting.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct RootMargin {
    pub top: Inset,
    pub bottom: Inset,
}

impl RootMargin {
    pub const fn new(top: Inset, bottom: Inset) -> Self {
        Self { top, bottom }
    }

    /// Resolve against a viewport height. Never inverted: if the insets
    /// overlap, the band collapses to a line.
    pub fn band(&self, viewport_height: f32) -> Band {
        let top = self.top.resolve(viewport_height);
        let bottom = viewport_height - self.bottom.resolve(viewport_height);
        Band {
            top,
            bottom: bottom.max(top),
        }
    }
}

// =============================================================================
// Observation
// =============================================================================

/// Options handed to the viewport observer when connecting.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserveOptions {
    pub root_margin: RootMargin,
    /// Visibility fractions at which the host should notify.
    pub thresholds: Vec<f32>,
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            root_margin: RootMargin::default(),
            thresholds: vec![0.0],
        }
    }
}

/// One intersection notification for one observed element.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry {
    pub target: ElementId,
    pub is_intersecting: bool,
    /// Fraction of the element inside the band, 0.0-1.0.
    pub ratio: f32,
}

impl IntersectionEntry {
    pub fn entering(target: impl Into<ElementId>, ratio: f32) -> Self {
        Self {
            target: target.into(),
            is_intersecting: true,
            ratio,
        }
    }

    pub fn leaving(target: impl Into<ElementId>) -> Self {
        Self {
            target: target.into(),
            is_intersecting: false,
            ratio: 0.0,
        }
    }
}

// =============================================================================
// Window
// =============================================================================

/// How a programmatic scroll should move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollBehavior {
    Instant,
    #[default]
    Smooth,
}

// =============================================================================
// Page chrome state (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Visual state of the fixed page chrome.
    ///
    /// Combine with bitwise OR: `ChromeState::SCROLLED | ChromeState::MENU_OPEN`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ChromeState: u8 {
        const NONE = 0;
        /// Page scrolled past the navbar threshold.
        const SCROLLED = 1 << 0;
        /// Mobile menu expanded.
        const MENU_OPEN = 1 << 1;
        /// Back-to-top control shown.
        const BACK_TO_TOP = 1 << 2;
        /// Loading overlay has started fading out.
        const LOADED = 1 << 3;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_anchor() {
        assert_eq!(ElementId::from_anchor("#about"), Some(ElementId::new("about")));
        assert_eq!(ElementId::from_anchor("#"), None);
        assert_eq!(ElementId::from_anchor("https://example.com"), None);
        assert_eq!(ElementId::new("work").anchor(), "#work");
    }

    #[test]
    fn test_band_intersection() {
        let band = Band { top: 100.0, bottom: 300.0 };
        assert_eq!(band.intersection(Rect::new(400.0, 100.0)), None);
        assert_eq!(band.intersection(Rect::new(150.0, 100.0)), Some(1.0));
        assert_eq!(band.intersection(Rect::new(250.0, 100.0)), Some(0.5));
    }

    #[test]
    fn test_activation_line_counts_contact() {
        // 30% top / 70% bottom of an 800px viewport leaves a line at 240px
        let margin = RootMargin::new(Inset::Percent(30.0), Inset::Percent(70.0));
        let band = margin.band(800.0);
        assert_eq!(band.top, 240.0);
        assert_eq!(band.bottom, 240.0);
        assert!(band.intersection(Rect::new(0.0, 500.0)).is_some());
        assert!(band.intersection(Rect::new(241.0, 500.0)).is_none());
    }

    #[test]
    fn test_overlapping_insets_collapse() {
        let margin = RootMargin::new(Inset::Percent(80.0), Inset::Percent(80.0));
        let band = margin.band(100.0);
        assert_eq!(band.top, 80.0);
        assert_eq!(band.bottom, 80.0);
    }

    #[test]
    fn test_chrome_flags() {
        let state = ChromeState::SCROLLED | ChromeState::MENU_OPEN;
        assert!(state.contains(ChromeState::MENU_OPEN));
        assert!(!state.contains(ChromeState::BACK_TO_TOP));
    }
}
