// Read-only aggregation for observability
use crate::environment::EnvironmentSwitcher;
use crate::error::Result;
use crate::models::{ProfileSummary, SessionInfo};
use crate::session::SessionManager;
use crate::store::CredentialStore;
use serde::Serialize;
use std::collections::BTreeMap;

/// Single snapshot of session, identity, environment and profile state.
#[derive(Debug, Serialize)]
pub struct Status {
    pub current_identity: String,
    pub session: SessionInfo,
    pub environment: Option<String>,
    pub profiles: BTreeMap<String, ProfileSummary>,
}

/// Aggregates SessionManager and CredentialStore state. Reads live
/// through the session manager, so building a status triggers the same
/// lazy expiry check as any other read; nothing else is mutated.
pub struct StatusReporter<'a> {
    session: &'a SessionManager,
    store: &'a CredentialStore,
    environments: &'a EnvironmentSwitcher,
}

impl<'a> StatusReporter<'a> {
    pub fn new(
        session: &'a SessionManager,
        store: &'a CredentialStore,
        environments: &'a EnvironmentSwitcher,
    ) -> Self {
        Self {
            session,
            store,
            environments,
        }
    }

    pub fn report(&self) -> Result<Status> {
        Ok(Status {
            current_identity: self.session.current_identity().describe(),
            session: self.session.session_info(),
            environment: self.environments.current()?,
            profiles: self.store.list()?,
        })
    }
}
