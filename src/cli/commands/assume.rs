use crate::assume::RoleAssumer;
use crate::config::Config;
use crate::error::Result;
use crate::models::AssumeRoleRequest;
use crate::session::{SessionCache, SessionManager};
use crate::sts::StsExchange;
use crate::store::CredentialStore;
use chrono::Utc;

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    region: Option<String>,
    role_arn: String,
    session_name: Option<String>,
    external_id: Option<String>,
    duration: Option<i32>,
    source_profile: Option<String>,
    profile: Option<String>,
) -> Result<()> {
    let config = Config::load()?;

    let request = AssumeRoleRequest {
        role_arn,
        session_name: session_name
            .unwrap_or_else(|| format!("rolekeeper-{}", Utc::now().timestamp())),
        external_id,
        duration_seconds: duration.unwrap_or(config.session.duration_seconds),
        source_profile,
    };

    let assumer = RoleAssumer::new(StsExchange::new(region), &config.identity);
    // Trust exchange runs before the session lock is ever taken
    let credentials = assumer.assume_role(&request).await?;

    let session =
        SessionManager::with_cache(&config.identity.default_profile, SessionCache::new()?)?;
    let info = session.begin_session(credentials.clone(), &request.role_arn)?;

    if let Some(name) = &profile {
        CredentialStore::new()?.save(name, &credentials)?;
        println!("Saved session credentials to profile '{}'", name);
    }

    println!("✓ Assumed role: {}", request.role_arn);
    if let Some(expires_at) = info.expires_at {
        println!(
            "  Session expires at {} ({})",
            expires_at.format("%Y-%m-%d %H:%M:%S UTC"),
            credentials.expiration_display()
        );
    }
    println!("  Run 'rolekeeper release' to restore the prior identity.");

    Ok(())
}
