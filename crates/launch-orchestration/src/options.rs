//! Launch request types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Distribution platform a game installation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Valve's Steam client
    Steam,
    /// Epic Games Store
    Epic,
}

impl Platform {
    /// Lowercase identifier used in configuration and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Steam => "steam",
            Platform::Epic => "epic",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "steam" => Ok(Platform::Steam),
            "epic" | "egs" => Ok(Platform::Epic),
            other => Err(format!("unknown platform '{}', expected steam or epic", other)),
        }
    }
}

/// Identifies which installation the version repository should resolve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDescriptor {
    /// Version identifier, also the managed directory name
    pub id: String,
    /// The platform's own official build, installed by the store client itself
    pub native_to_platform: bool,
}

impl VersionDescriptor {
    /// The store client's own install
    pub fn native(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            native_to_platform: true,
        }
    }

    /// A version installed and managed out-of-band
    pub fn managed(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            native_to_platform: false,
        }
    }
}

/// A single launch request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchOptions {
    /// Platform whose strategy handles this request
    pub platform: Platform,
    /// Version to make playable
    pub version: VersionDescriptor,
    /// The files are this platform's build flavour and get its integration arguments
    pub platform_build: bool,
    /// Extra flags passed through to the game
    #[serde(default)]
    pub launch_flags: BTreeSet<String>,
}

impl LaunchOptions {
    /// Create options for the given platform and version
    pub fn new(platform: Platform, version: VersionDescriptor) -> Self {
        Self {
            platform,
            version,
            platform_build: true,
            launch_flags: BTreeSet::new(),
        }
    }

    /// Set whether the files are the platform's own build flavour
    pub fn with_platform_build(mut self, platform_build: bool) -> Self {
        self.platform_build = platform_build;
        self
    }

    /// Add a flag passed through to the game
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.launch_flags.insert(flag.into());
        self
    }
}
