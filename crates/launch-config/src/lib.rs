//! # Launch Configuration
//!
//! YAML configuration parser for store-launch.
//!
//! This crate parses `launch.yaml` files and converts them into the
//! orchestrator's settings and per-platform strategies. Path values may use
//! `${VAR}`, `${VAR:-default}` and a leading `~`.

#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

pub mod parser;

pub use parser::{LaunchSetup, parse_file, parse_str};

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// Environment variable not found
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    /// `~` was used but the home directory is unknown
    #[error("Cannot expand '~' in {0}: home directory unknown")]
    NoHomeDir(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Optional profile name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Global settings
    #[serde(default, skip_serializing_if = "Settings::is_default")]
    pub settings: Settings,

    /// Directory holding one sub-directory per managed version
    pub versions_dir: String,

    /// Where the game lives inside a platform library
    pub game: Game,

    /// Platform definitions
    #[serde(default)]
    pub platforms: Platforms,
}

/// Global settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    /// Default log level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Library discovery timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_timeout: Option<u64>,
}

impl Settings {
    /// Check if settings are default (all None)
    fn is_default(&self) -> bool {
        self == &Settings::default()
    }
}

/// Game layout shared by all platforms
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Game {
    /// Canonical install directory name
    pub install_dir: String,
    /// Executable path relative to the install directory
    pub executable: String,
    /// Flags passed to every launch
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub launch_flags: BTreeSet<String>,
}

/// Per-platform sections; absent platforms are not configured
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Platforms {
    /// Steam
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steam: Option<SteamPlatform>,

    /// Epic Games Store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epic: Option<EpicPlatform>,
}

impl Platforms {
    /// Whether no platform is configured
    pub fn is_empty(&self) -> bool {
        self.steam.is_none() && self.epic.is_none()
    }
}

/// Steam platform definition
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SteamPlatform {
    /// Steam app id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,

    /// Steam installation roots; the usual locations when empty
    #[serde(default)]
    pub roots: Vec<String>,

    /// Install directory name override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_dir: Option<String>,
}

/// Epic platform definition
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EpicPlatform {
    /// Catalog app name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    /// Launcher manifest directories; the launcher's default when empty
    #[serde(default)]
    pub manifest_dirs: Vec<String>,

    /// Library roots probed when no manifest matches
    #[serde(default)]
    pub library_roots: Vec<String>,

    /// Install directory name override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_dir: Option<String>,
}
