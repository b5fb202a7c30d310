//! Display preferences for glossed documents.
//!
//! User overrides are persisted under the [`STORAGE_KEY`] table of a TOML file
//! and merged over defaults computed from the active theme's text colour.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Config, ConfigError};

/// Table name holding the persisted overrides.
pub const STORAGE_KEY: &str = "dualread-display";

const DEFAULT_PRIMARY_FONT_SIZE: u32 = 18;
const DEFAULT_GLOSS_FONT_SIZE: u32 = 11;
const GLOSS_ALPHA: f32 = 0.65;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayPreferences {
    pub primary_font_size: u32,
    pub gloss_font_size: u32,
    pub primary_color: String,
    pub gloss_color: String,
}

/// Persisted, partial preferences. Unset fields fall back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceOverrides {
    pub primary_font_size: Option<u32>,
    pub gloss_font_size: Option<u32>,
    pub primary_color: Option<String>,
    pub gloss_color: Option<String>,
}

impl DisplayPreferences {
    /// Defaults for a theme: primary text in the theme colour, glosses in a
    /// translucent variant of it when the colour is a hex value.
    pub fn defaults_for_theme(text_color: &str) -> Self {
        let text_color = text_color.trim();
        let gloss_color = parse_hex_color(text_color)
            .map(|(r, g, b)| format!("rgba({r}, {g}, {b}, {GLOSS_ALPHA})"))
            .unwrap_or_else(|| text_color.to_string());

        Self {
            primary_font_size: DEFAULT_PRIMARY_FONT_SIZE,
            gloss_font_size: DEFAULT_GLOSS_FONT_SIZE,
            primary_color: text_color.to_string(),
            gloss_color,
        }
    }

    #[must_use]
    pub fn merged(mut self, overrides: &PreferenceOverrides) -> Self {
        if let Some(size) = overrides.primary_font_size {
            self.primary_font_size = size;
        }
        if let Some(size) = overrides.gloss_font_size {
            self.gloss_font_size = size;
        }
        if let Some(color) = &overrides.primary_color {
            self.primary_color = color.clone();
        }
        if let Some(color) = &overrides.gloss_color {
            self.gloss_color = color.clone();
        }
        self
    }

    /// Glosses sit above the text and must be the smaller of the two.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gloss_font_size == 0 {
            return Err(ConfigError::InvalidPreference(
                "gloss font size must be positive".to_string(),
            ));
        }
        if self.gloss_font_size >= self.primary_font_size {
            return Err(ConfigError::InvalidPreference(format!(
                "gloss font size ({}) must be smaller than primary font size ({})",
                self.gloss_font_size, self.primary_font_size
            )));
        }
        Ok(())
    }

    /// CSS rules for the ruby markup produced by the merger.
    pub fn stylesheet(&self) -> String {
        format!(
            "ruby {{ font-size: {}px; color: {}; }}\nrt {{ font-size: {}px; color: {}; }}\n",
            self.primary_font_size, self.primary_color, self.gloss_font_size, self.gloss_color
        )
    }
}

fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let expand = |i: usize| channel(&hex[i..=i].repeat(2));
            Some((expand(0)?, expand(1)?, expand(2)?))
        }
        6 => Some((channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        _ => None,
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferenceFile {
    #[serde(rename = "dualread-display", default)]
    display: PreferenceOverrides,
}

/// TOML file holding the persisted overrides.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> PathBuf {
        Config::config_dir().join("preferences.toml")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the overrides; a missing file means no overrides.
    pub fn load(&self) -> Result<PreferenceOverrides, ConfigError> {
        if !self.path.exists() {
            return Ok(PreferenceOverrides::default());
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|source| ConfigError::ConfigReadError {
                config_path: self.path.clone(),
                source,
            })?;

        let file: PreferenceFile =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: self.path.clone(),
                source,
            })?;

        Ok(file.display)
    }

    pub fn save(&self, overrides: &PreferenceOverrides) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = PreferenceFile {
            display: overrides.clone(),
        };
        std::fs::write(&self.path, toml::to_string_pretty(&file)?)?;
        Ok(())
    }

    /// Theme defaults with the persisted overrides applied.
    pub fn resolve(&self, theme_text_color: &str) -> Result<DisplayPreferences, ConfigError> {
        let overrides = self.load()?;
        Ok(DisplayPreferences::defaults_for_theme(theme_text_color).merged(&overrides))
    }
}
