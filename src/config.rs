//! Toolkit configuration.
//!
//! Loaded once when a [`Runtime`](crate::Runtime) is created. Every field has a
//! default, so an empty TOML document is a valid configuration.
//!
//! ```toml
//! default_tag = "section"
//! keyboard_clicks = true
//! skip_hidden_updates = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::is_valid_tag;
use crate::error::{Error, Result};

/// Settings shared by every view built against one runtime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Tag used when an element definition omits its type.
    pub default_tag: String,

    /// Give click handlers on focusable elements Enter/Space activation and
    /// suppress mouse-down focus.
    pub keyboard_clicks: bool,

    /// Skip bound updates for invisible targets in views that do not pick a
    /// skip policy themselves.
    pub skip_hidden_updates: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_tag: "div".to_string(),
            keyboard_clicks: true,
            skip_hidden_updates: false,
        }
    }
}

impl Config {
    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded toolkit configuration");
        Ok(config)
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_tag(&self.default_tag) {
            return Err(Error::InvalidConfig(format!(
                "default_tag {:?} is not a valid tag name",
                self.default_tag
            )));
        }
        Ok(())
    }
}
