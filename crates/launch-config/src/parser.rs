//! Configuration parser with environment variable substitution

use crate::{Config, ConfigError, EpicPlatform, Result, SteamPlatform};
use launch_orchestration::{
    EpicConfig, EpicStrategy, InstallLayout, OrchestratorSettings, SteamConfig, SteamStrategy,
    Strategy,
};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));

/// Parse a YAML configuration file
pub fn parse_file(path: impl AsRef<Path>) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_str(&content)
}

/// Parse YAML configuration from a string
pub fn parse_str(content: &str) -> Result<Config> {
    let config: Config = serde_yaml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    // Check version
    if config.version != "1.0" {
        return Err(ConfigError::ValidationError(format!(
            "Unsupported version: {}, expected 1.0",
            config.version
        )));
    }

    if config.platforms.is_empty() {
        return Err(ConfigError::ValidationError(
            "At least one platform must be configured".to_string(),
        ));
    }

    check_dir_name("game.install_dir", &config.game.install_dir)?;
    if let Some(steam) = &config.platforms.steam {
        if let Some(name) = &steam.install_dir {
            check_dir_name("platforms.steam.install_dir", name)?;
        }
    }
    if let Some(epic) = &config.platforms.epic {
        if let Some(name) = &epic.install_dir {
            check_dir_name("platforms.epic.install_dir", name)?;
        }
    }

    let executable = Path::new(&config.game.executable);
    if config.game.executable.is_empty() || executable.is_absolute() {
        return Err(ConfigError::ValidationError(format!(
            "game.executable must be a path relative to the install directory, got '{}'",
            config.game.executable
        )));
    }

    if config.settings.discovery_timeout == Some(0) {
        return Err(ConfigError::ValidationError(
            "settings.discovery_timeout must be at least 1 second".to_string(),
        ));
    }

    Ok(())
}

fn check_dir_name(field: &str, name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(ConfigError::ValidationError(format!(
            "{} must be a single directory name, got '{}'",
            field, name
        )));
    }
    Ok(())
}

/// Substitute environment variables in a string
pub fn substitute_env_vars(input: &str) -> Result<String> {
    let mut result = input.to_string();
    let mut errors = Vec::new();

    for cap in ENV_VAR.captures_iter(input) {
        let full_match = &cap[0];
        let var_expr = &cap[1];

        // Handle default values: ${VAR:-default}
        let (var_name, default_value) = match var_expr.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (var_expr, None),
        };

        match std::env::var(var_name) {
            Ok(value) => result = result.replace(full_match, &value),
            Err(_) => match default_value {
                Some(default) => result = result.replace(full_match, default),
                None => errors.push(var_name.to_string()),
            },
        }
    }

    if !errors.is_empty() {
        return Err(ConfigError::EnvVarNotFound(errors.join(", ")));
    }

    Ok(result)
}

/// Expand a leading `~` to the home directory
pub fn expand_home(input: &str) -> Result<PathBuf> {
    let rest = match input.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(['/', '\\']) => rest,
        _ => return Ok(PathBuf::from(input)),
    };

    let home = dirs::home_dir().ok_or_else(|| ConfigError::NoHomeDir(input.to_string()))?;
    Ok(home.join(rest.trim_start_matches(['/', '\\'])))
}

/// Substitute variables, then expand `~`
pub fn resolve_path(input: &str) -> Result<PathBuf> {
    let substituted = substitute_env_vars(input)?;
    expand_home(&substituted)
}

fn resolve_paths(inputs: &[String]) -> Result<Vec<PathBuf>> {
    inputs.iter().map(|input| resolve_path(input)).collect()
}

/// Steam installation roots used when none are configured
pub fn default_steam_roots() -> Vec<PathBuf> {
    if cfg!(windows) {
        return vec![PathBuf::from(r"C:\Program Files (x86)\Steam")];
    }

    let mut roots = Vec::new();
    if let Some(home) = dirs::home_dir() {
        roots.push(home.join(".steam").join("steam"));
    }
    if let Some(data) = dirs::data_dir() {
        roots.push(data.join("Steam"));
    }
    roots
}

/// Epic launcher manifest directories used when none are configured
pub fn default_epic_manifest_dirs() -> Vec<PathBuf> {
    if cfg!(windows) {
        vec![PathBuf::from(r"C:\ProgramData\Epic\EpicGamesLauncher\Data\Manifests")]
    } else {
        Vec::new()
    }
}

/// Everything the composition root needs, resolved from a [`Config`]
#[derive(Debug, Clone)]
pub struct LaunchSetup {
    /// Orchestrator tunables
    pub settings: OrchestratorSettings,
    /// One strategy per configured platform
    pub strategies: Vec<Strategy>,
    /// Root of the managed version directories
    pub versions_dir: PathBuf,
    /// Flags passed to every launch
    pub launch_flags: BTreeSet<String>,
}

impl LaunchSetup {
    /// Resolve paths and build strategies
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut strategies: Vec<Strategy> = Vec::new();
        if let Some(steam) = &config.platforms.steam {
            strategies.push(steam_strategy(config, steam)?.into());
        }
        if let Some(epic) = &config.platforms.epic {
            strategies.push(epic_strategy(config, epic)?.into());
        }

        Ok(Self {
            settings: orchestrator_settings(config),
            strategies,
            versions_dir: resolve_path(&config.versions_dir)?,
            launch_flags: config.game.launch_flags.clone(),
        })
    }
}

/// Convert global settings to orchestrator settings
pub fn orchestrator_settings(config: &Config) -> OrchestratorSettings {
    let mut settings = OrchestratorSettings::default();
    if let Some(secs) = config.settings.discovery_timeout {
        settings.discovery_timeout = Duration::from_secs(secs);
    }
    settings
}

fn layout(config: &Config, install_dir: Option<&String>) -> InstallLayout {
    let install_dir = install_dir.unwrap_or(&config.game.install_dir);
    InstallLayout::new(install_dir.clone(), &config.game.executable)
}

fn steam_strategy(config: &Config, steam: &SteamPlatform) -> Result<SteamStrategy> {
    let mut steam_config = SteamConfig::new(layout(config, steam.install_dir.as_ref()));
    steam_config.app_id = steam.app_id.clone();
    steam_config.steam_roots = if steam.roots.is_empty() {
        default_steam_roots()
    } else {
        resolve_paths(&steam.roots)?
    };

    debug!("Steam roots: {:?}", steam_config.steam_roots);
    Ok(SteamStrategy::new(steam_config))
}

fn epic_strategy(config: &Config, epic: &EpicPlatform) -> Result<EpicStrategy> {
    let mut epic_config = EpicConfig::new(layout(config, epic.install_dir.as_ref()));
    epic_config.app_name = epic.app_name.clone();
    epic_config.manifest_dirs = if epic.manifest_dirs.is_empty() {
        default_epic_manifest_dirs()
    } else {
        resolve_paths(&epic.manifest_dirs)?
    };
    epic_config.library_roots = resolve_paths(&epic.library_roots)?;

    debug!(
        "Epic manifests: {:?}, library roots: {:?}",
        epic_config.manifest_dirs, epic_config.library_roots
    );
    Ok(EpicStrategy::new(epic_config))
}
