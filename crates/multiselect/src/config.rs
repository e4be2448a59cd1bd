//! Palette configuration.
//!
//! [`PaletteConfig`] is the initialization object handed over by the host.
//! It deserializes from the same camelCase JSON the host would pass:
//!
//! ```
//! use multiselect::PaletteConfig;
//!
//! let config = PaletteConfig::from_json(
//!     r#"{"filter": true, "allowOrder": true, "localizedText": {"addTitle": "Add"}}"#,
//! )?;
//! assert!(config.filter);
//! assert!(!config.allow_move_all);
//! assert_eq!(config.localized_text.add_title, "Add");
//! assert_eq!(config.localized_text.remove_title, "Remove selection");
//! # Ok::<(), multiselect::PaletteError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Options recognized at initialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaletteConfig {
    /// Show a filter box above each list.
    pub filter: bool,
    /// Show the move-up and move-down buttons.
    pub allow_order: bool,
    /// Show the add-all and remove-all buttons.
    pub allow_move_all: bool,
    /// Stack the lists vertically.
    pub vertical: bool,
    /// Extra class added to the container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_class: Option<String>,
    /// Button titles.
    pub localized_text: LocalizedText,
    /// Name of the background filter thread. Filtering runs inline when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_script: Option<String>,
}

impl PaletteConfig {
    /// Parses an initialization object.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Enables the filter boxes.
    pub fn with_filter(mut self, filter: bool) -> Self {
        self.filter = filter;
        self
    }

    /// Enables reordering of the selection.
    pub fn with_order(mut self, allow_order: bool) -> Self {
        self.allow_order = allow_order;
        self
    }

    /// Enables the move-all buttons.
    pub fn with_move_all(mut self, allow_move_all: bool) -> Self {
        self.allow_move_all = allow_move_all;
        self
    }

    /// Sets the layout orientation.
    pub fn with_vertical(mut self, vertical: bool) -> Self {
        self.vertical = vertical;
        self
    }

    /// Sets the custom container class.
    pub fn with_custom_class(mut self, class: impl Into<String>) -> Self {
        self.custom_class = Some(class.into());
        self
    }

    /// Sets the button titles.
    pub fn with_localized_text(mut self, text: LocalizedText) -> Self {
        self.localized_text = text;
        self
    }

    /// Runs filtering on a background thread with the given name.
    pub fn with_worker(mut self, name: impl Into<String>) -> Self {
        self.worker_script = Some(name.into());
        self
    }
}

/// Titles of the palette buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocalizedText {
    pub add_title: String,
    pub add_all_title: String,
    pub remove_title: String,
    pub remove_all_title: String,
    pub move_up_title: String,
    pub move_down_title: String,
    pub clear_filter_title: String,
}

impl Default for LocalizedText {
    fn default() -> Self {
        Self {
            add_title: "Add selected choices".into(),
            add_all_title: "Add all".into(),
            remove_title: "Remove selection".into(),
            remove_all_title: "Remove all".into(),
            move_up_title: "Move selection up".into(),
            move_down_title: "Move selection down".into(),
            clear_filter_title: "Clear filter".into(),
        }
    }
}
