//! Theme System for spark-folio.
//!
//! Light/dark switching with the choice persisted in the host preference
//! store under [`THEME_KEY`]. The active mode is written to the root
//! element's `data-theme` attribute (the stylesheet keys off it) and the
//! toggle icon swaps between a sun (dark mode on) and a moon.
//!
//! # Example
//!
//! ```ignore
//! use spark_folio::theme::{ThemeManager, ThemeElements, ThemeMode};
//!
//! let theme = ThemeManager::mount(document, store, ThemeElements::default()).unwrap();
//! theme.toggle();
//! assert_eq!(theme.mode(), ThemeMode::Dark);
//! ```

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use spark_signals::{signal, Signal};
use tracing::{debug, warn};

use crate::host::{Document, PreferenceStore};
use crate::types::ElementId;

/// Preference store key holding `"light"` or `"dark"`.
pub const THEME_KEY: &str = "theme";

/// Root attribute the stylesheet reads.
pub const THEME_ATTRIBUTE: &str = "data-theme";

// =============================================================================
// ThemeMode
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Icon shown on the toggle: the mode you would switch to.
    pub fn icon_class(self) -> &'static str {
        match self {
            Self::Light => "fas fa-moon",
            Self::Dark => "fas fa-sun",
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTheme(pub String);

impl FromStr for ThemeMode {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(UnknownTheme(other.to_string())),
        }
    }
}

// =============================================================================
// ThemeManager
// =============================================================================

/// Elements the theme manager writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeElements {
    /// Carries `data-theme` (the document element).
    pub root: ElementId,
    pub toggle: ElementId,
    pub icon: ElementId,
}

impl Default for ThemeElements {
    fn default() -> Self {
        Self {
            root: ElementId::new("html"),
            toggle: ElementId::new("themeToggle"),
            icon: ElementId::new("themeIcon"),
        }
    }
}

pub struct ThemeManager {
    document: Rc<dyn Document>,
    store: Rc<dyn PreferenceStore>,
    elements: ThemeElements,
    mode: Signal<ThemeMode>,
}

impl ThemeManager {
    /// Apply the saved theme (light when none is saved).
    ///
    /// Returns `None` when the toggle or icon is missing from the page.
    pub fn mount(
        document: Rc<dyn Document>,
        store: Rc<dyn PreferenceStore>,
        elements: ThemeElements,
    ) -> Option<Self> {
        if !document.contains(&elements.toggle) || !document.contains(&elements.icon) {
            debug!("theme toggle markup missing, theme manager disabled");
            return None;
        }

        let saved = match store.get(THEME_KEY) {
            None => ThemeMode::default(),
            Some(raw) => raw.parse().unwrap_or_else(|UnknownTheme(value)| {
                warn!(%value, "ignoring unknown saved theme");
                ThemeMode::default()
            }),
        };

        let manager = Self {
            document,
            store,
            elements,
            mode: signal(saved),
        };
        manager.set_theme(saved);
        Some(manager)
    }

    pub fn mode(&self) -> ThemeMode {
        self.mode.get()
    }

    /// Reactive view of the current mode.
    pub fn mode_signal(&self) -> Signal<ThemeMode> {
        self.mode.clone()
    }

    /// Apply, persist, and update the icon.
    pub fn set_theme(&self, mode: ThemeMode) {
        self.document
            .set_attribute(&self.elements.root, THEME_ATTRIBUTE, mode.as_str());
        self.store.set(THEME_KEY, mode.as_str());
        self.document
            .set_class_name(&self.elements.icon, mode.icon_class());
        self.mode.set(mode);
        debug!(%mode, "theme applied");
    }

    /// Flip the theme currently on the root. Returns the new mode.
    pub fn toggle(&self) -> ThemeMode {
        let current = self
            .document
            .attribute(&self.elements.root, THEME_ATTRIBUTE)
            .and_then(|value| value.parse().ok())
            .unwrap_or_else(|| self.mode());
        let next = current.toggled();
        self.set_theme(next);
        next
    }

    /// Whether a click on `target` is a click on the toggle.
    pub fn is_toggle(&self, target: &ElementId) -> bool {
        *target == self.elements.toggle
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryPage, MemoryStore};

    fn setup() -> (Rc<MemoryPage>, Rc<MemoryStore>) {
        let page = Rc::new(MemoryPage::new(800.0));
        page.element("html");
        page.element("themeToggle");
        page.element("themeIcon");
        (page, Rc::new(MemoryStore::new()))
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("dark".parse::<ThemeMode>(), Ok(ThemeMode::Dark));
        assert_eq!(" light ".parse::<ThemeMode>(), Ok(ThemeMode::Light));
        assert!("sepia".parse::<ThemeMode>().is_err());
    }

    #[test]
    fn test_defaults_to_light() {
        let (page, store) = setup();
        let theme = ThemeManager::mount(page.clone(), store.clone(), ThemeElements::default()).unwrap();

        assert_eq!(theme.mode(), ThemeMode::Light);
        assert_eq!(page.attribute(&"html".into(), THEME_ATTRIBUTE).as_deref(), Some("light"));
        assert_eq!(page.classes(&"themeIcon".into()), vec!["fas", "fa-moon"]);
        assert_eq!(store.get(THEME_KEY).as_deref(), Some("light"));
    }

    #[test]
    fn test_restores_saved_theme() {
        let (page, store) = setup();
        store.set(THEME_KEY, "dark");
        let theme = ThemeManager::mount(page.clone(), store, ThemeElements::default()).unwrap();

        assert_eq!(theme.mode(), ThemeMode::Dark);
        assert_eq!(page.classes(&"themeIcon".into()), vec!["fas", "fa-sun"]);
    }

    #[test]
    fn test_unknown_saved_theme_falls_back() {
        let (page, store) = setup();
        store.set(THEME_KEY, "sepia");
        let theme = ThemeManager::mount(page, store.clone(), ThemeElements::default()).unwrap();

        assert_eq!(theme.mode(), ThemeMode::Light);
        assert_eq!(store.get(THEME_KEY).as_deref(), Some("light"));
    }

    #[test]
    fn test_toggle_persists() {
        let (page, store) = setup();
        let theme = ThemeManager::mount(page.clone(), store.clone(), ThemeElements::default()).unwrap();

        assert_eq!(theme.toggle(), ThemeMode::Dark);
        assert_eq!(store.get(THEME_KEY).as_deref(), Some("dark"));
        assert_eq!(theme.toggle(), ThemeMode::Light);
        assert_eq!(page.attribute(&"html".into(), THEME_ATTRIBUTE).as_deref(), Some("light"));
    }

    #[test]
    fn test_mode_signal_follows_toggle() {
        let (page, store) = setup();
        let theme = ThemeManager::mount(page, store, ThemeElements::default()).unwrap();
        let mode = theme.mode_signal();

        theme.toggle();
        assert_eq!(mode.get(), ThemeMode::Dark);
    }

    #[test]
    fn test_missing_markup_disables() {
        let page = Rc::new(MemoryPage::new(800.0));
        page.element("themeToggle");
        let store = Rc::new(MemoryStore::new());
        assert!(ThemeManager::mount(page, store.clone(), ThemeElements::default()).is_none());
        assert_eq!(store.get(THEME_KEY), None);
    }
}
