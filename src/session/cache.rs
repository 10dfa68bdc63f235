use crate::config::Config;
use crate::error::{Result, RoleError};
use crate::models::{CredentialSet, IdentityContext};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Persisted form of an active session, so separate invocations observe
/// the same assumed identity until it expires or is released.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub credentials: CredentialSet,
    pub role_label: String,
    pub original_context: IdentityContext,
}

/// Stores the session record as JSON in the config directory.
pub struct SessionCache {
    cache_file: PathBuf,
}

impl SessionCache {
    pub fn new() -> Result<Self> {
        let dir = Config::config_dir()?;
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self {
            cache_file: dir.join("session.json"),
        })
    }

    pub fn with_path(cache_file: PathBuf) -> Self {
        Self { cache_file }
    }

    pub fn load(&self) -> Result<Option<SessionRecord>> {
        if !self.cache_file.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.cache_file)
            .map_err(|e| RoleError::CacheError(format!("Failed to read session cache: {}", e)))?;

        match serde_json::from_str(&contents) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                // A corrupt record is dropped rather than wedging startup
                tracing::warn!("Discarding corrupt session cache: {}", e);
                self.clear()?;
                Ok(None)
            }
        }
    }

    pub fn save(&self, record: &SessionRecord) -> Result<()> {
        let json = serde_json::to_string_pretty(record)?;

        fs::write(&self.cache_file, json)
            .map_err(|e| RoleError::CacheError(format!("Failed to write session cache: {}", e)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut permissions = fs::metadata(&self.cache_file)?.permissions();
            permissions.set_mode(0o600);
            fs::set_permissions(&self.cache_file, permissions)?;
        }

        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.cache_file.exists() {
            fs::remove_file(&self.cache_file).map_err(|e| {
                RoleError::CacheError(format!("Failed to remove session cache: {}", e))
            })?;
        }
        Ok(())
    }
}
