use crate::config::Config;
use crate::environment::EnvironmentSwitcher;
use crate::error::{Result, RoleError};
use crate::session::{SessionCache, SessionManager};
use crate::store::CredentialStore;

pub async fn execute(name: String) -> Result<()> {
    let config = Config::load()?;

    // Switching under an active session would leave the session's
    // restore target pointing at the wrong environment
    let session =
        SessionManager::with_cache(&config.identity.default_profile, SessionCache::new()?)?;
    if session.session_info().active {
        return Err(RoleError::InvalidInput(
            "A session is active; run 'rolekeeper release' before switching environments"
                .to_string(),
        ));
    }

    let switcher = EnvironmentSwitcher::new(
        CredentialStore::new()?,
        config.environments(),
        &config.session,
    );
    let env = switcher.switch(&name)?;

    println!("✓ Switched to environment '{}'", env.name);
    println!("  Region: {}", env.region);
    println!("  Role:   {}", env.role_arn);
    if !env.description.is_empty() {
        println!("  {}", env.description);
    }

    Ok(())
}
