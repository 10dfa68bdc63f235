// Role assumption: source-identity selection and the trust exchange
use crate::config::IdentityConfig;
use crate::error::{Result, RoleError};
use crate::models::{AssumeRoleRequest, CredentialSet, IdentityContext};
use crate::sts::TrustExchange;

/// Provider-enforced bounds on the trust-exchange duration.
pub const MIN_DURATION_SECONDS: i32 = 900;
pub const MAX_DURATION_SECONDS: i32 = 43200;

/// Turns (role, session name, duration) into a temporary credential set
/// via the trust exchange, signing with a known base identity.
///
/// Isolation: the exchange context is always built from a named base
/// profile, never from whatever override happens to be ambient. Because
/// the context is an explicit value, there is no global state to clear
/// and restore around the call.
pub struct RoleAssumer<T> {
    exchange: T,
    source_candidates: Vec<String>,
    allowed_account_ids: Vec<String>,
    default_profile: String,
}

impl<T: TrustExchange> RoleAssumer<T> {
    pub fn new(exchange: T, identity: &IdentityConfig) -> Self {
        Self {
            exchange,
            source_candidates: identity.source_candidates.clone(),
            allowed_account_ids: identity.allowed_account_ids.clone(),
            default_profile: identity.default_profile.clone(),
        }
    }

    /// Assume a role and return its temporary credentials. Persisting
    /// the result is the caller's concern. No retries happen here; a
    /// `Transient` error is the caller's cue to retry explicitly.
    pub async fn assume_role(&self, request: &AssumeRoleRequest) -> Result<CredentialSet> {
        validate(request)?;

        let context = self.resolve_source(request.source_profile.as_deref()).await?;
        let credentials = self.exchange.assume_role(&context, request).await?;

        if credentials.expiration.is_none() {
            return Err(RoleError::Transient(
                "Trust exchange returned credentials without an expiration".to_string(),
            ));
        }
        Ok(credentials)
    }

    /// Pick the base identity that signs the trust exchange.
    ///
    /// An explicit source profile always wins. Otherwise each candidate
    /// is probed with the identity check and the first one whose account
    /// is in the allow-list is used. The fallback to the default profile
    /// is a best-effort heuristic, not a guarantee; callers that need
    /// certainty should pass `source_profile`.
    async fn resolve_source(&self, explicit: Option<&str>) -> Result<IdentityContext> {
        if let Some(profile) = explicit {
            if profile.is_empty() {
                return Err(RoleError::InvalidInput(
                    "Source profile must be non-empty".to_string(),
                ));
            }
            return Ok(IdentityContext::from_profile(profile));
        }

        if self.allowed_account_ids.is_empty() {
            tracing::debug!(
                "No account allow-list configured, using default profile '{}'",
                self.default_profile
            );
            return Ok(IdentityContext::from_profile(&self.default_profile));
        }

        for candidate in &self.source_candidates {
            let context = IdentityContext::from_profile(candidate);
            match self.exchange.caller_identity(&context).await {
                Ok(identity) if self.allowed_account_ids.contains(&identity.account_id) => {
                    tracing::debug!(
                        profile = %candidate,
                        account_id = %identity.account_id,
                        "Selected source profile"
                    );
                    return Ok(context);
                }
                Ok(identity) => {
                    tracing::debug!(
                        profile = %candidate,
                        account_id = %identity.account_id,
                        "Candidate account not in allow-list"
                    );
                }
                Err(e) => {
                    tracing::debug!(profile = %candidate, error = %e, "Candidate probe failed");
                }
            }
        }

        tracing::warn!(
            "No source candidate matched the account allow-list, falling back to '{}'",
            self.default_profile
        );
        Ok(IdentityContext::from_profile(&self.default_profile))
    }
}

fn validate(request: &AssumeRoleRequest) -> Result<()> {
    if request.role_arn.is_empty() || !request.role_arn.starts_with("arn:") {
        return Err(RoleError::InvalidInput(format!(
            "Malformed role ARN: '{}'",
            request.role_arn
        )));
    }
    if request.session_name.is_empty() {
        return Err(RoleError::InvalidInput(
            "Session name must be non-empty".to_string(),
        ));
    }
    if !(MIN_DURATION_SECONDS..=MAX_DURATION_SECONDS).contains(&request.duration_seconds) {
        return Err(RoleError::InvalidDuration(request.duration_seconds));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CallerIdentity;
    use chrono::{Duration, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Fake trust exchange: canned identities per profile, records the
    /// contexts it was called with.
    struct FakeExchange {
        identities: HashMap<String, CallerIdentity>,
        probed: Mutex<Vec<String>>,
        exchange_contexts: Mutex<Vec<IdentityContext>>,
    }

    impl FakeExchange {
        fn new(identities: &[(&str, &str)]) -> Self {
            Self {
                identities: identities
                    .iter()
                    .map(|(profile, account)| {
                        (
                            profile.to_string(),
                            CallerIdentity {
                                account_id: account.to_string(),
                                user_id: "AIDAEXAMPLE".to_string(),
                                arn: format!("arn:aws:iam::{}:user/test", account),
                            },
                        )
                    })
                    .collect(),
                probed: Mutex::new(Vec::new()),
                exchange_contexts: Mutex::new(Vec::new()),
            }
        }
    }

    impl TrustExchange for FakeExchange {
        async fn assume_role(
            &self,
            context: &IdentityContext,
            _request: &AssumeRoleRequest,
        ) -> Result<CredentialSet> {
            self.exchange_contexts.lock().unwrap().push(context.clone());
            Ok(CredentialSet {
                access_key_id: "ASIAFAKE".to_string(),
                secret_access_key: "secret".to_string(),
                session_token: Some("token".to_string()),
                expiration: Some(Utc::now() + Duration::hours(1)),
            })
        }

        async fn caller_identity(&self, context: &IdentityContext) -> Result<CallerIdentity> {
            let profile = context.profile.clone().unwrap_or_default();
            self.probed.lock().unwrap().push(profile.clone());
            self.identities
                .get(&profile)
                .cloned()
                .ok_or_else(|| RoleError::NoCredentials(format!("no identity for '{}'", profile)))
        }
    }

    fn identity_config(candidates: &[&str], allowed: &[&str]) -> IdentityConfig {
        IdentityConfig {
            default_profile: "default".to_string(),
            source_candidates: candidates.iter().map(|s| s.to_string()).collect(),
            allowed_account_ids: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn request(source_profile: Option<&str>) -> AssumeRoleRequest {
        AssumeRoleRequest {
            role_arn: "arn:aws:iam::111111111111:role/X".to_string(),
            session_name: "test-session".to_string(),
            external_id: None,
            duration_seconds: 3600,
            source_profile: source_profile.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_successful_assume_returns_future_expiration() {
        let exchange = FakeExchange::new(&[]);
        let assumer = RoleAssumer::new(exchange, &identity_config(&[], &[]));

        let creds = assumer.assume_role(&request(None)).await.unwrap();
        assert!(creds.expiration.unwrap() > Utc::now());
    }

    #[tokio::test]
    async fn test_explicit_source_profile_skips_probing() {
        let exchange = FakeExchange::new(&[("master", "111111111111")]);
        let assumer = RoleAssumer::new(
            exchange,
            &identity_config(&["master", "default"], &["111111111111"]),
        );

        assumer.assume_role(&request(Some("special"))).await.unwrap();

        assert!(assumer.exchange.probed.lock().unwrap().is_empty());
        let contexts = assumer.exchange.exchange_contexts.lock().unwrap();
        assert_eq!(contexts[0].profile.as_deref(), Some("special"));
    }

    #[tokio::test]
    async fn test_probe_accepts_first_allow_listed_candidate() {
        let exchange = FakeExchange::new(&[
            ("wrong", "999999999999"),
            ("master", "111111111111"),
        ]);
        let assumer = RoleAssumer::new(
            exchange,
            &identity_config(&["wrong", "master"], &["111111111111"]),
        );

        assumer.assume_role(&request(None)).await.unwrap();

        assert_eq!(
            *assumer.exchange.probed.lock().unwrap(),
            vec!["wrong".to_string(), "master".to_string()]
        );
        let contexts = assumer.exchange.exchange_contexts.lock().unwrap();
        assert_eq!(contexts[0].profile.as_deref(), Some("master"));
    }

    #[tokio::test]
    async fn test_probe_falls_back_to_default_with_no_match() {
        let exchange = FakeExchange::new(&[("wrong", "999999999999")]);
        let assumer = RoleAssumer::new(
            exchange,
            &identity_config(&["wrong", "missing"], &["111111111111"]),
        );

        assumer.assume_role(&request(None)).await.unwrap();

        let contexts = assumer.exchange.exchange_contexts.lock().unwrap();
        assert_eq!(contexts[0].profile.as_deref(), Some("default"));
    }

    #[tokio::test]
    async fn test_exchange_context_never_carries_override_credentials() {
        // Source selection resolves through the candidate list; the
        // context handed to the exchange is a bare profile reference.
        let exchange = FakeExchange::new(&[("master", "111111111111")]);
        let assumer = RoleAssumer::new(exchange, &identity_config(&["master"], &["111111111111"]));

        assumer.assume_role(&request(None)).await.unwrap();

        let contexts = assumer.exchange.exchange_contexts.lock().unwrap();
        assert_eq!(contexts[0].credentials, None);
        assert_eq!(contexts[0].profile.as_deref(), Some("master"));
    }

    #[tokio::test]
    async fn test_duration_out_of_bounds_rejected_before_any_rpc() {
        let exchange = FakeExchange::new(&[]);
        let assumer = RoleAssumer::new(exchange, &identity_config(&[], &[]));

        let mut too_short = request(None);
        too_short.duration_seconds = 899;
        assert!(matches!(
            assumer.assume_role(&too_short).await,
            Err(RoleError::InvalidDuration(899))
        ));

        let mut too_long = request(None);
        too_long.duration_seconds = 43201;
        assert!(matches!(
            assumer.assume_role(&too_long).await,
            Err(RoleError::InvalidDuration(43201))
        ));

        assert!(assumer.exchange.exchange_contexts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_role_arn_rejected() {
        let exchange = FakeExchange::new(&[]);
        let assumer = RoleAssumer::new(exchange, &identity_config(&[], &[]));

        let mut bad = request(None);
        bad.role_arn = "not-an-arn".to_string();
        assert!(matches!(
            assumer.assume_role(&bad).await,
            Err(RoleError::InvalidInput(_))
        ));
    }
}
