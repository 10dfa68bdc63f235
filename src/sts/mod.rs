// Trust-exchange and identity-check RPC collaborator
use crate::error::{Result, RoleError};
use crate::models::{AssumeRoleRequest, CallerIdentity, CredentialSet, IdentityContext};
use aws_config::BehaviorVersion;
use aws_sdk_sts::error::{ProvideErrorMetadata, SdkError};
use chrono::{DateTime, Utc};

/// The external RPC pair this engine depends on: the trust exchange
/// (AssumeRole) and the identity check (GetCallerIdentity). Both take
/// the signing identity as an explicit context value; nothing here
/// reads ambient process state.
pub trait TrustExchange {
    fn assume_role(
        &self,
        context: &IdentityContext,
        request: &AssumeRoleRequest,
    ) -> impl std::future::Future<Output = Result<CredentialSet>> + Send;

    fn caller_identity(
        &self,
        context: &IdentityContext,
    ) -> impl std::future::Future<Output = Result<CallerIdentity>> + Send;
}

/// AWS STS implementation. The client is rebuilt from the identity
/// context on every call, with the SDK identity cache disabled, so the
/// context passed in is always the identity that signs the request.
pub struct StsExchange {
    region: Option<String>,
}

impl StsExchange {
    pub fn new(region: Option<String>) -> Self {
        Self { region }
    }

    async fn client(&self, context: &IdentityContext) -> aws_sdk_sts::Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .identity_cache(aws_config::identity::IdentityCache::no_cache());

        if let Some(creds) = &context.credentials {
            let provider = aws_sdk_sts::config::Credentials::new(
                creds.access_key_id.clone(),
                creds.secret_access_key.clone(),
                creds.session_token.clone(),
                creds.expiration.map(std::time::SystemTime::from),
                "rolekeeper-identity-context",
            );
            loader = loader.credentials_provider(provider);
        } else if let Some(profile) = &context.profile {
            loader = loader.profile_name(profile);
        }

        if let Some(region) = &self.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }

        let config = loader.load().await;
        aws_sdk_sts::Client::new(&config)
    }
}

impl TrustExchange for StsExchange {
    async fn assume_role(
        &self,
        context: &IdentityContext,
        request: &AssumeRoleRequest,
    ) -> Result<CredentialSet> {
        tracing::debug!(
            role_arn = %request.role_arn,
            session_name = %request.session_name,
            context = %context.describe(),
            "Calling STS AssumeRole"
        );

        let client = self.client(context).await;
        let mut call = client
            .assume_role()
            .role_arn(&request.role_arn)
            .role_session_name(&request.session_name)
            .duration_seconds(request.duration_seconds);
        if let Some(external_id) = &request.external_id {
            call = call.external_id(external_id);
        }

        let response = call
            .send()
            .await
            .map_err(|e| map_sdk_error("AssumeRole", e))?;

        let creds = response.credentials().ok_or_else(|| {
            RoleError::Transient("AssumeRole returned no credentials".to_string())
        })?;
        let expiration = to_utc(creds.expiration())?;

        tracing::info!(
            role_arn = %request.role_arn,
            expiration = %expiration,
            "Role assumed"
        );

        Ok(CredentialSet {
            access_key_id: creds.access_key_id().to_string(),
            secret_access_key: creds.secret_access_key().to_string(),
            session_token: Some(creds.session_token().to_string()),
            expiration: Some(expiration),
        })
    }

    async fn caller_identity(&self, context: &IdentityContext) -> Result<CallerIdentity> {
        let client = self.client(context).await;
        let response = client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| map_sdk_error("GetCallerIdentity", e))?;

        let field = |name: &str, value: Option<&str>| {
            value.map(str::to_string).ok_or_else(|| {
                RoleError::Transient(format!("GetCallerIdentity returned no {}", name))
            })
        };

        Ok(CallerIdentity {
            account_id: field("account", response.account())?,
            user_id: field("user id", response.user_id())?,
            arn: field("arn", response.arn())?,
        })
    }
}

/// Convert the provider's absolute timestamp to UTC.
fn to_utc(timestamp: &aws_smithy_types::DateTime) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
        .ok_or_else(|| RoleError::Transient("Invalid expiration timestamp".to_string()))
}

/// Map SDK failures onto the error taxonomy. Provider code and message
/// are preserved verbatim for service rejections.
fn map_sdk_error<E, R>(context: &str, err: SdkError<E, R>) -> RoleError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    if let SdkError::ServiceError(service_err) = &err {
        let code = service_err.err().code().unwrap_or("Unknown");
        let message = service_err.err().message().unwrap_or("no message");
        let detail = format!("{}: {} - {}", context, code, message);

        return match code {
            "AccessDenied" | "AccessDeniedException" => RoleError::Denied(detail),
            "MalformedPolicyDocument"
            | "MalformedPolicyDocumentException"
            | "PackedPolicyTooLarge"
            | "RegionDisabledException"
            | "ValidationError" => RoleError::InvalidInput(detail),
            "NoSuchEntity" | "NoSuchEntityException" => RoleError::NotFound(detail),
            "ExpiredToken"
            | "ExpiredTokenException"
            | "InvalidClientTokenId"
            | "UnrecognizedClientException"
            | "SignatureDoesNotMatch" => RoleError::NoCredentials(detail),
            _ => RoleError::Denied(detail),
        };
    }

    match err {
        SdkError::ConstructionFailure(_) => RoleError::NoCredentials(format!(
            "{}: could not resolve credentials to sign the request",
            context
        )),
        other => RoleError::Transient(format!("{}: {}", context, other)),
    }
}
