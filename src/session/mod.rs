// Active-session state machine: which credential set is the effective
// identity, and how the original one comes back.
mod cache;

pub use cache::{SessionCache, SessionRecord};

use crate::error::{Result, RoleError};
use crate::models::{CredentialSet, IdentityContext, SessionInfo};
use chrono::Duration;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Safety margin subtracted from the expiration: credentials are
/// treated as expired five minutes before the provider invalidates them.
pub const GRACE_BUFFER_SECONDS: i64 = 300;

fn grace_buffer() -> Duration {
    Duration::seconds(GRACE_BUFFER_SECONDS)
}

struct SessionState {
    credentials: Option<CredentialSet>,
    role_label: Option<String>,
    /// Ambient context snapshotted when the first assumption of the
    /// cycle began. Survives refreshes; consumed by restoration.
    original_context: Option<IdentityContext>,
    /// The currently-effective identity for outgoing calls.
    ambient: IdentityContext,
}

/// Owns the single session record. Idle: ambient context is the base
/// identity. Active: an assumed credential set is installed as ambient
/// context and the prior one is held for restoration.
///
/// Expiry is detected lazily on read; there is no background timer. All
/// state access goes through one lock, which is never held across
/// network I/O (the trust exchange happens before `begin_session`).
pub struct SessionManager {
    state: Mutex<SessionState>,
    default_profile: String,
    cache: Option<SessionCache>,
}

impl SessionManager {
    pub fn new(default_profile: impl Into<String>) -> Self {
        let default_profile = default_profile.into();
        Self {
            state: Mutex::new(SessionState {
                credentials: None,
                role_label: None,
                original_context: None,
                ambient: IdentityContext::from_profile(&default_profile),
            }),
            default_profile,
            cache: None,
        }
    }

    /// Manager backed by a persistent session record. A still-valid
    /// persisted session is adopted as the Active state; an expired one
    /// is discarded.
    pub fn with_cache(default_profile: impl Into<String>, cache: SessionCache) -> Result<Self> {
        let mut manager = Self::new(default_profile);

        if let Some(record) = cache.load()? {
            if record.credentials.expiration.is_none() {
                // Active always implies an expiration; a record without
                // one is corrupt
                tracing::warn!("Persisted session has no expiration, discarding");
                cache.clear()?;
            } else if record.credentials.is_expired_with_buffer(grace_buffer()) {
                tracing::info!("Persisted session has expired, discarding");
                cache.clear()?;
            } else {
                let state = manager.state.get_mut().unwrap_or_else(PoisonError::into_inner);
                state.ambient = IdentityContext::from_credentials(record.credentials.clone());
                state.credentials = Some(record.credentials);
                state.role_label = Some(record.role_label);
                state.original_context = Some(record.original_context);
            }
        }

        manager.cache = Some(cache);
        Ok(manager)
    }

    /// Idle -> Active, or Active -> Active (refresh).
    ///
    /// Precondition: the credential set has an expiration in the future.
    /// The ambient context is snapshotted only when no snapshot exists,
    /// so the true original identity survives successive assumptions.
    pub fn begin_session(&self, credentials: CredentialSet, role_label: &str) -> Result<SessionInfo> {
        let Some(expiration) = credentials.expiration else {
            return Err(RoleError::InvalidInput(
                "Session credentials must have an expiration".to_string(),
            ));
        };
        if expiration <= chrono::Utc::now() {
            return Err(RoleError::InvalidInput(format!(
                "Session credentials already expired at {}",
                expiration
            )));
        }

        let mut state = self.lock();

        if state.original_context.is_none() {
            state.original_context = Some(state.ambient.clone());
        }

        state.ambient = IdentityContext::from_credentials(credentials.clone());
        state.credentials = Some(credentials);
        state.role_label = Some(role_label.to_string());

        self.persist(&state)?;

        tracing::info!(role_label = %role_label, expires_at = %expiration, "Session active");
        Ok(info_of(&state))
    }

    /// Active -> Idle regardless of remaining validity. Idempotent when
    /// already Idle.
    pub fn end_session(&self) -> SessionInfo {
        let mut state = self.lock();

        if state.credentials.is_some() {
            let role_label = state.role_label.clone().unwrap_or_default();
            self.restore(&mut state);
            tracing::info!(role_label = %role_label, "Session released");
        }

        info_of(&state)
    }

    /// Current session view. Reads never mutate state except for the
    /// lazy expiry transition, which is idempotent.
    pub fn session_info(&self) -> SessionInfo {
        let mut state = self.lock();
        self.check_expiry(&mut state);
        info_of(&state)
    }

    /// The currently-effective identity for outgoing calls.
    pub fn current_identity(&self) -> IdentityContext {
        let mut state = self.lock();
        self.check_expiry(&mut state);
        state.ambient.clone()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_expiry(&self, state: &mut SessionState) {
        if let Some(credentials) = &state.credentials {
            if credentials.is_expired_with_buffer(grace_buffer()) {
                let role_label = state.role_label.clone().unwrap_or_default();
                self.restore(state);
                tracing::info!(role_label = %role_label, "Session credentials expired, restored base identity");
            }
        }

        // Idle steady state: ambient always names a usable base identity
        if state.credentials.is_none() && state.ambient.is_empty() {
            state.ambient = IdentityContext::from_profile(&self.default_profile);
        }
    }

    fn restore(&self, state: &mut SessionState) {
        state.credentials = None;
        state.role_label = None;
        state.ambient = state
            .original_context
            .take()
            .unwrap_or_else(|| IdentityContext::from_profile(&self.default_profile));

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.clear() {
                tracing::warn!("Failed to clear session cache: {}", e);
            }
        }
    }

    fn persist(&self, state: &SessionState) -> Result<()> {
        let Some(cache) = &self.cache else {
            return Ok(());
        };
        let (Some(credentials), Some(role_label), Some(original_context)) = (
            state.credentials.as_ref(),
            state.role_label.as_ref(),
            state.original_context.as_ref(),
        ) else {
            return Ok(());
        };

        cache.save(&SessionRecord {
            credentials: credentials.clone(),
            role_label: role_label.clone(),
            original_context: original_context.clone(),
        })
    }
}

fn info_of(state: &SessionState) -> SessionInfo {
    SessionInfo {
        active: state.credentials.is_some(),
        role_label: state.role_label.clone(),
        expires_at: state.credentials.as_ref().and_then(|c| c.expiration),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn temp_creds(key: &str, expires_in: Duration) -> CredentialSet {
        CredentialSet {
            access_key_id: key.to_string(),
            secret_access_key: "secret".to_string(),
            session_token: Some("token".to_string()),
            expiration: Some(Utc::now() + expires_in),
        }
    }

    #[test]
    fn test_begin_session_activates() {
        let manager = SessionManager::new("default");
        let info = manager
            .begin_session(temp_creds("ASIA1", Duration::hours(1)), "role-x")
            .unwrap();

        assert!(info.active);
        assert_eq!(info.role_label.as_deref(), Some("role-x"));
        assert!(info.expires_at.unwrap() > Utc::now());

        let identity = manager.current_identity();
        assert_eq!(
            identity.credentials.unwrap().access_key_id,
            "ASIA1".to_string()
        );
    }

    #[test]
    fn test_begin_session_requires_future_expiration() {
        let manager = SessionManager::new("default");

        let base = CredentialSet::base("AKIA", "secret");
        assert!(matches!(
            manager.begin_session(base, "x"),
            Err(RoleError::InvalidInput(_))
        ));

        let expired = temp_creds("ASIA", Duration::hours(-1));
        assert!(matches!(
            manager.begin_session(expired, "x"),
            Err(RoleError::InvalidInput(_))
        ));

        assert!(!manager.session_info().active);
    }

    #[test]
    fn test_session_info_idempotent() {
        let manager = SessionManager::new("default");
        manager
            .begin_session(temp_creds("ASIA1", Duration::hours(1)), "role-x")
            .unwrap();

        assert_eq!(manager.session_info(), manager.session_info());
    }

    #[test]
    fn test_expiry_within_grace_buffer() {
        let manager = SessionManager::new("default");
        // Valid at begin time, but inside the 5 minute grace buffer
        manager
            .begin_session(temp_creds("ASIA1", Duration::minutes(3)), "role-x")
            .unwrap();

        let info = manager.session_info();
        assert!(!info.active);
        assert_eq!(info.role_label, None);

        // Ambient context resolved back to the base identity
        assert_eq!(
            manager.current_identity(),
            IdentityContext::from_profile("default")
        );
    }

    #[test]
    fn test_expiry_is_monotonic() {
        let manager = SessionManager::new("default");
        manager
            .begin_session(temp_creds("ASIA1", Duration::minutes(3)), "role-x")
            .unwrap();

        for _ in 0..3 {
            assert!(!manager.session_info().active);
        }

        // A new assumption is the only way back to Active
        manager
            .begin_session(temp_creds("ASIA2", Duration::hours(1)), "role-y")
            .unwrap();
        assert!(manager.session_info().active);
    }

    #[test]
    fn test_end_session_restores_prior_context() {
        let manager = SessionManager::new("default");
        let before = manager.current_identity();

        manager
            .begin_session(temp_creds("ASIA1", Duration::hours(1)), "role-x")
            .unwrap();
        let info = manager.end_session();

        assert!(!info.active);
        assert_eq!(manager.current_identity(), before);
    }

    #[test]
    fn test_end_session_idempotent_when_idle() {
        let manager = SessionManager::new("default");
        assert!(!manager.end_session().active);
        assert_eq!(
            manager.current_identity(),
            IdentityContext::from_profile("default")
        );
    }

    #[test]
    fn test_refresh_keeps_original_snapshot() {
        let manager = SessionManager::new("default");
        let before_first = manager.current_identity();

        manager
            .begin_session(temp_creds("ASIA-A", Duration::hours(1)), "role-a")
            .unwrap();
        manager
            .begin_session(temp_creds("ASIA-B", Duration::hours(1)), "role-b")
            .unwrap();

        let info = manager.session_info();
        assert_eq!(info.role_label.as_deref(), Some("role-b"));

        // Restores the context from before A, not the one between A and B
        manager.end_session();
        assert_eq!(manager.current_identity(), before_first);
    }

    #[test]
    fn test_new_cycle_takes_fresh_snapshot() {
        let manager = SessionManager::new("default");

        manager
            .begin_session(temp_creds("ASIA-A", Duration::hours(1)), "role-a")
            .unwrap();
        manager.end_session();

        // Snapshot was consumed; a new cycle snapshots again
        manager
            .begin_session(temp_creds("ASIA-B", Duration::hours(1)), "role-b")
            .unwrap();
        manager.end_session();
        assert_eq!(
            manager.current_identity(),
            IdentityContext::from_profile("default")
        );
    }

    #[test]
    fn test_persisted_session_adopted_by_new_manager() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        let first =
            SessionManager::with_cache("default", SessionCache::with_path(path.clone())).unwrap();
        first
            .begin_session(temp_creds("ASIA1", Duration::hours(1)), "role-x")
            .unwrap();

        let second =
            SessionManager::with_cache("default", SessionCache::with_path(path.clone())).unwrap();
        let info = second.session_info();
        assert!(info.active);
        assert_eq!(info.role_label.as_deref(), Some("role-x"));

        second.end_session();

        let third = SessionManager::with_cache("default", SessionCache::with_path(path)).unwrap();
        assert!(!third.session_info().active);
    }

    #[test]
    fn test_expired_persisted_session_discarded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        SessionCache::with_path(path.clone())
            .save(&SessionRecord {
                credentials: temp_creds("ASIA1", Duration::minutes(2)),
                role_label: "role-x".to_string(),
                original_context: IdentityContext::from_profile("master"),
            })
            .unwrap();

        let manager =
            SessionManager::with_cache("default", SessionCache::with_path(path.clone())).unwrap();
        assert!(!manager.session_info().active);
        assert!(!path.exists());
    }

    #[test]
    fn test_persisted_session_without_expiration_discarded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        // Hand-edited record with base credentials; never a valid session
        SessionCache::with_path(path.clone())
            .save(&SessionRecord {
                credentials: CredentialSet::base("AKIA", "secret"),
                role_label: "role-x".to_string(),
                original_context: IdentityContext::from_profile("master"),
            })
            .unwrap();

        let manager =
            SessionManager::with_cache("default", SessionCache::with_path(path.clone())).unwrap();
        let info = manager.session_info();
        assert!(!info.active);
        assert_eq!(info.expires_at, None);
        assert!(!path.exists());
    }
}
