//! Page configuration.
//!
//! Every section is optional; anything left out takes the default that
//! matches the stock portfolio markup.
//!
//! ```toml
//! [sections]
//! root_margin = { top = { percent = 30.0 }, bottom = { percent = 70.0 } }
//!
//! [reveal]
//! threshold = 0.1
//! stagger_ms = 100
//!
//! [typewriter]
//! strings = ["Developer", "Designer"]
//! loop = true
//! type_ms = 100
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{FolioError, Result};
use crate::state::{
    ContactFields, CounterOptions, NavElements, RevealOptions, SectionWatchOptions, TypewriterTiming,
};
use crate::theme::ThemeElements;
use crate::types::{ElementId, Inset};

// =============================================================================
// SECTIONS
// =============================================================================

/// Element ids and marker classes the components look for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub nav_link_class: String,
    pub reveal_class: String,
    pub counter_class: String,

    pub navbar: ElementId,
    pub menu_toggle: ElementId,
    pub nav_links: ElementId,
    pub body: ElementId,

    pub theme_root: ElementId,
    pub theme_toggle: ElementId,
    pub theme_icon: ElementId,

    pub loading_overlay: ElementId,
    pub back_to_top: ElementId,
    pub typewriter_target: ElementId,

    pub contact_form: ElementId,
    pub contact_name: ElementId,
    pub contact_email: ElementId,
    pub contact_message: ElementId,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let nav = NavElements::default();
        let theme = ThemeElements::default();
        let contact = ContactFields::default();
        Self {
            nav_link_class: "nav-link".into(),
            reveal_class: "reveal".into(),
            counter_class: "counter".into(),
            navbar: nav.navbar,
            menu_toggle: nav.menu_toggle,
            nav_links: nav.links,
            body: nav.body,
            theme_root: theme.root,
            theme_toggle: theme.toggle,
            theme_icon: theme.icon,
            loading_overlay: ElementId::new("loadingOverlay"),
            back_to_top: ElementId::new("backToTop"),
            typewriter_target: ElementId::new("typed"),
            contact_form: contact.form,
            contact_name: contact.name,
            contact_email: contact.email,
            contact_message: contact.message,
        }
    }
}

impl LayoutConfig {
    pub fn nav_elements(&self) -> NavElements {
        NavElements {
            navbar: self.navbar.clone(),
            menu_toggle: self.menu_toggle.clone(),
            links: self.nav_links.clone(),
            body: self.body.clone(),
        }
    }

    pub fn theme_elements(&self) -> ThemeElements {
        ThemeElements {
            root: self.theme_root.clone(),
            toggle: self.theme_toggle.clone(),
            icon: self.theme_icon.clone(),
        }
    }

    pub fn contact_fields(&self) -> ContactFields {
        ContactFields {
            form: self.contact_form.clone(),
            name: self.contact_name.clone(),
            email: self.contact_email.clone(),
            message: self.contact_message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TypewriterConfig {
    pub strings: Vec<String>,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub start_delay_ms: u64,
    #[serde(flatten)]
    pub timing: TypewriterTiming,
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            strings: vec!["Developer".into(), "Designer".into(), "Creator".into()],
            looping: true,
            start_delay_ms: 500,
            timing: TypewriterTiming::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChromeConfig {
    /// Navbar turns `scrolled` strictly past this.
    pub scrolled_threshold: f32,
    /// Back-to-top shows strictly past this.
    pub back_to_top_threshold: f32,
    /// Header height used when the navbar has none.
    pub header_fallback: f32,
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            scrolled_threshold: 50.0,
            back_to_top_threshold: crate::state::scroll::BACK_TO_TOP_THRESHOLD,
            header_fallback: crate::state::scroll::DEFAULT_HEADER_OFFSET,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoadingConfig {
    pub fade_ms: u64,
    pub remove_ms: u64,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            fade_ms: 300,
            remove_ms: 400,
        }
    }
}

// =============================================================================
// FOLIO CONFIG
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    pub layout: LayoutConfig,
    pub sections: SectionWatchOptions,
    pub reveal: RevealOptions,
    pub typewriter: TypewriterConfig,
    pub chrome: ChromeConfig,
    pub loading: LoadingConfig,
    pub counter: CounterOptions,
}

impl FolioConfig {
    /// Parse and validate.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| FolioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded page configuration");
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.reveal.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(FolioError::invalid(format!(
                "reveal.threshold must be within 0.0..=1.0, got {threshold}"
            )));
        }
        if self.reveal.bottom_margin_px < 0.0 {
            return Err(FolioError::invalid("reveal.bottom_margin_px must not be negative"));
        }
        if self.counter.frame_ms == 0 {
            return Err(FolioError::invalid("counter.frame_ms must be greater than zero"));
        }

        let margin = self.sections.root_margin;
        for (side, inset) in [("top", margin.top), ("bottom", margin.bottom)] {
            let valid = match inset {
                Inset::Percent(p) => (0.0..=100.0).contains(&p),
                Inset::Pixels(px) => px >= 0.0,
            };
            if !valid {
                return Err(FolioError::invalid(format!(
                    "sections.root_margin.{side} is out of range: {inset:?}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RootMargin;

    #[test]
    fn test_empty_is_default() {
        let config = FolioConfig::from_toml_str("").unwrap();
        assert_eq!(config, FolioConfig::default());
        assert_eq!(
            config.sections.root_margin,
            RootMargin::new(Inset::Percent(30.0), Inset::Percent(70.0))
        );
        assert_eq!(config.loading.fade_ms, 300);
        assert_eq!(config.layout.typewriter_target, ElementId::new("typed"));
    }

    #[test]
    fn test_partial_sections() {
        let config = FolioConfig::from_toml_str(
            r#"
            [layout]
            navbar = "header"

            [sections]
            root_margin = { top = { percent = 20.0 }, bottom = { percent = 60.0 } }

            [reveal]
            stagger_ms = 50

            [typewriter]
            strings = ["Hi", "Yo"]
            loop = false
            pause_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.layout.navbar, ElementId::new("header"));
        assert_eq!(config.layout.menu_toggle, ElementId::new("menuToggle"));
        assert_eq!(config.sections.root_margin.top, Inset::Percent(20.0));
        assert_eq!(config.sections.active_class, "active");
        assert_eq!(config.reveal.stagger_ms, 50);
        assert_eq!(config.reveal.threshold, 0.1);
        assert_eq!(config.typewriter.strings, vec!["Hi", "Yo"]);
        assert!(!config.typewriter.looping);
        assert_eq!(config.typewriter.timing.pause_ms, 500);
        assert_eq!(config.typewriter.timing.type_ms, 100);
    }

    #[test]
    fn test_validation() {
        let err = FolioConfig::from_toml_str("[reveal]\nthreshold = 1.5").unwrap_err();
        assert!(matches!(err, FolioError::InvalidConfig(_)));

        let err = FolioConfig::from_toml_str("[counter]\nframe_ms = 0").unwrap_err();
        assert!(err.to_string().contains("frame_ms"));

        let err = FolioConfig::from_toml_str(
            "[sections]\nroot_margin = { top = { percent = 130.0 } }",
        )
        .unwrap_err();
        assert!(err.to_string().contains("root_margin.top"));
    }

    #[test]
    fn test_parse_error() {
        let err = FolioConfig::from_toml_str("[reveal\nthreshold = ").unwrap_err();
        assert!(matches!(err, FolioError::Config(_)));
    }

    #[test]
    fn test_load_file() {
        let dir = std::env::temp_dir().join(format!("spark_folio_config_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("folio.toml");
        fs::write(&path, "[loading]\nfade_ms = 10\n").unwrap();

        let config = FolioConfig::load(&path).unwrap();
        assert_eq!(config.loading.fade_ms, 10);
        assert_eq!(config.loading.remove_ms, 400);

        fs::remove_dir_all(&dir).unwrap();

        let err = FolioConfig::load(&path).unwrap_err();
        assert!(matches!(err, FolioError::Io { .. }));
    }
}
