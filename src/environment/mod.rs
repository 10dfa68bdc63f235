// Environment switching: pointing the default identity binding at a
// named (role, region) pair.
use crate::config::SessionConfig;
use crate::error::{Result, RoleError};
use crate::models::Environment;
use crate::store::{CredentialStore, DefaultBinding};
use std::collections::BTreeMap;

/// Maps environment names onto the default identity binding, so that
/// subsequent role assumptions target the right trust role.
///
/// Switching while a session is active is refused by the calling layer;
/// this component assumes the session has been ended first.
pub struct EnvironmentSwitcher {
    store: CredentialStore,
    environments: BTreeMap<String, Environment>,
    source_profile: String,
    duration_seconds: i32,
}

impl EnvironmentSwitcher {
    pub fn new(
        store: CredentialStore,
        environments: BTreeMap<String, Environment>,
        session: &SessionConfig,
    ) -> Self {
        Self {
            store,
            environments,
            source_profile: session.source_profile.clone(),
            duration_seconds: session.duration_seconds,
        }
    }

    pub fn environments(&self) -> &BTreeMap<String, Environment> {
        &self.environments
    }

    /// Rewrite the default binding to the named environment. Bindings
    /// for other registered environments are removed so exactly one is
    /// authoritative. An unknown name leaves everything unchanged.
    pub fn switch(&self, name: &str) -> Result<Environment> {
        let env = self
            .environments
            .get(name)
            .ok_or_else(|| RoleError::EnvironmentNotFound(name.to_string()))?;

        let conflicting: Vec<String> = self.environments.keys().cloned().collect();
        self.store.remove_config_profiles(&conflicting)?;

        self.store.set_default_binding(&DefaultBinding {
            role_arn: env.role_arn.clone(),
            region: env.region.clone(),
            source_profile: self.source_profile.clone(),
            duration_seconds: self.duration_seconds,
        })?;

        tracing::info!(environment = %name, region = %env.region, "Switched environment");
        Ok(env.clone())
    }

    /// Derive the current environment by exact (role_arn, region) match
    /// of the default binding against the registry. First match wins;
    /// no match or no binding reports `None` (Unknown).
    pub fn current(&self) -> Result<Option<String>> {
        let Some(binding) = self.store.default_binding()? else {
            return Ok(None);
        };

        Ok(self
            .environments
            .values()
            .find(|env| env.role_arn == binding.role_arn && env.region == binding.region)
            .map(|env| env.name.clone()))
    }
}
