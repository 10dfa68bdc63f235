// Application configuration management
use crate::error::{Result, RoleError};
use crate::models::Environment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub session: SessionConfig,
    /// Environment registry: name -> (region, role_arn, description).
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Base profile the ambient context falls back to.
    #[serde(default = "default_profile_name")]
    pub default_profile: String,
    /// Ordered base-profile candidates probed during source selection.
    #[serde(default = "default_source_candidates")]
    pub source_candidates: Vec<String>,
    /// Accounts a source candidate must belong to. Empty list disables
    /// the heuristic and always falls back to the default profile.
    #[serde(default)]
    pub allowed_account_ids: Vec<String>,
}

fn default_profile_name() -> String {
    "default".to_string()
}

fn default_source_candidates() -> Vec<String> {
    vec!["master".to_string(), "default".to_string()]
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            default_profile: default_profile_name(),
            source_candidates: default_source_candidates(),
            allowed_account_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Default trust-exchange duration in seconds.
    #[serde(default = "default_duration_seconds")]
    pub duration_seconds: i32,
    /// Source profile written into the default identity binding when
    /// switching environments.
    #[serde(default = "default_profile_name")]
    pub source_profile: String,
}

fn default_duration_seconds() -> i32 {
    3600
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_seconds: default_duration_seconds(),
            source_profile: default_profile_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvironmentEntry {
    pub region: String,
    pub role_arn: String,
    #[serde(default)]
    pub description: String,
}

impl Config {
    /// Get the config directory path
    ///
    /// Priority:
    /// 1. XDG_CONFIG_HOME/rolekeeper (if env var is set)
    /// 2. ~/.config/rolekeeper (if ~/.config exists)
    /// 3. ~/.rolekeeper (fallback on Unix, doesn't create ~/.config)
    /// 4. Platform default on Windows
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg_config).join("rolekeeper"));
        }

        #[cfg(unix)]
        {
            if let Some(home_dir) = dirs::home_dir() {
                let xdg_config = home_dir.join(".config");

                // If ~/.config exists, use it (user has adopted XDG)
                if xdg_config.exists() {
                    return Ok(xdg_config.join("rolekeeper"));
                }

                return Ok(home_dir.join(".rolekeeper"));
            }
        }

        #[cfg(not(unix))]
        {
            if let Some(config_dir) = dirs::config_dir() {
                return Ok(config_dir.join("rolekeeper"));
            }
        }

        Err(RoleError::ConfigError(
            "Could not determine config directory".to_string(),
        ))
    }

    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, environment variables, and defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        let mut config = if config_path.exists() {
            tracing::debug!("Loading config from: {}", config_path.display());
            let contents = fs::read_to_string(&config_path)
                .map_err(|e| RoleError::ConfigError(format!("Failed to read config file: {}", e)))?;

            toml::from_str(&contents)
                .map_err(|e| RoleError::ConfigError(format!("Failed to parse config file: {}", e)))?
        } else {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            Config::default()
        };

        if let Ok(profile) = std::env::var("ROLEKEEPER_DEFAULT_PROFILE") {
            tracing::debug!("Using default profile from environment: {}", profile);
            config.identity.default_profile = profile;
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir()?;
        let config_path = Self::config_file_path()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).map_err(|e| {
                RoleError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
            tracing::info!("Created config directory: {}", config_dir.display());
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| RoleError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, toml_string)
            .map_err(|e| RoleError::ConfigError(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved config to: {}", config_path.display());
        Ok(())
    }

    /// Create a sample config file with comments
    pub fn create_sample() -> Result<()> {
        let config_dir = Self::config_dir()?;
        let config_path = Self::config_file_path()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).map_err(|e| {
                RoleError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        // Don't overwrite existing config
        if config_path.exists() {
            return Err(RoleError::ConfigError(format!(
                "Config file already exists at: {}",
                config_path.display()
            )));
        }

        let sample_config = r#"# rolekeeper configuration
# Location priority:
#   1. $XDG_CONFIG_HOME/rolekeeper/config.toml (if XDG_CONFIG_HOME is set)
#   2. ~/.config/rolekeeper/config.toml (if ~/.config exists)
#   3. ~/.rolekeeper/config.toml (fallback)

[identity]
# Base profile restored when no session is active
default_profile = "default"

# Base-profile candidates probed (in order) when no --source-profile is
# given. The first one whose caller account is in allowed_account_ids wins.
source_candidates = ["master", "default"]

# Accounts that base candidates must belong to. Leave empty to skip the
# probe and always use default_profile. Pass --source-profile explicitly
# where correctness matters; this list is a best-effort fallback only.
allowed_account_ids = []

[session]
# Default trust-exchange duration (provider bounds: 900-43200)
duration_seconds = 3600

# Source profile written into the default identity binding on `switch`
source_profile = "default"

# Named environments for `rolekeeper switch <name>`
# [environments.dev]
# region = "us-west-2"
# role_arn = "arn:aws:iam::111111111111:role/dev-access"
# description = "Development account"
"#;

        fs::write(&config_path, sample_config)
            .map_err(|e| RoleError::ConfigError(format!("Failed to write sample config: {}", e)))?;

        println!("Created sample config file at: {}", config_path.display());
        println!("\nEdit the file to register environments and the account allow-list.");

        Ok(())
    }

    /// Environment registry as domain values.
    pub fn environments(&self) -> BTreeMap<String, Environment> {
        self.environments
            .iter()
            .map(|(name, entry)| {
                (
                    name.clone(),
                    Environment {
                        name: name.clone(),
                        region: entry.region.clone(),
                        role_arn: entry.role_arn.clone(),
                        description: entry.description.clone(),
                    },
                )
            })
            .collect()
    }

    pub fn add_environment(&mut self, env: &Environment) {
        self.environments.insert(
            env.name.clone(),
            EnvironmentEntry {
                region: env.region.clone(),
                role_arn: env.role_arn.clone(),
                description: env.description.clone(),
            },
        );
    }

    pub fn remove_environment(&mut self, name: &str) -> bool {
        self.environments.remove(name).is_some()
    }
}
