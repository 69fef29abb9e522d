//! `runtext.toml` discovery and parsing.
//!
//! Discovery prefers a local working-directory file before falling back to
//! the platform config dir. Unknown fields are ignored (TOML
//! deserialization tolerance) so the file format can grow without breaking
//! older binaries; a missing file yields defaults, a malformed one is an
//! error with context.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::info;

use crate::EditorStyle;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct LimitSection {
    #[serde(default)]
    pub max_count: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TruncationSection {
    #[serde(default)]
    pub expand_text: Option<String>,
    #[serde(default)]
    pub collapse_text: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct SeparatorSection {
    /// Appended to the default full-width closer set.
    #[serde(default)]
    pub extra_closers: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub limit: LimitSection,
    #[serde(default)]
    pub truncation: TruncationSection,
    #[serde(default)]
    pub separator: SeparatorSection,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>,
    pub file: ConfigFile,
}

impl Config {
    /// Session character limit from the file, if configured.
    pub fn max_count(&self) -> Option<usize> {
        self.file.limit.max_count
    }

    /// An [`EditorStyle`] with file overrides applied on top of defaults.
    pub fn editor_style(&self) -> EditorStyle {
        let mut style = EditorStyle::default();
        if let Some(text) = &self.file.truncation.expand_text {
            style.expand_text = text.clone();
        }
        if let Some(text) = &self.file.truncation.collapse_text {
            style.collapse_text = text.clone();
        }
        if let Some(extra) = &self.file.separator.extra_closers {
            style.separator_closers.push_str(extra);
        }
        style
    }
}

/// Best-effort config path: local `runtext.toml` first, then the platform
/// config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("runtext.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("runtext").join("runtext.toml");
    }
    PathBuf::from("runtext.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    match fs::read_to_string(&path) {
        Ok(content) => {
            let file: ConfigFile = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            info!(target: "config.file", path = %path.display(), "loaded config");
            Ok(Config {
                raw: Some(content),
                file,
            })
        }
        Err(_) => {
            info!(target: "config.file", path = %path.display(), "no config file, using defaults");
            Ok(Config::default())
        }
    }
}
