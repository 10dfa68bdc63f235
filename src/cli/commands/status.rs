use crate::config::Config;
use crate::environment::EnvironmentSwitcher;
use crate::error::Result;
use crate::models::ProfileKind;
use crate::session::{SessionCache, SessionManager};
use crate::status::StatusReporter;
use crate::store::CredentialStore;

pub async fn execute(json: bool) -> Result<()> {
    let config = Config::load()?;
    let store = CredentialStore::new()?;
    let switcher = EnvironmentSwitcher::new(
        CredentialStore::new()?,
        config.environments(),
        &config.session,
    );
    let session =
        SessionManager::with_cache(&config.identity.default_profile, SessionCache::new()?)?;

    let status = StatusReporter::new(&session, &store, &switcher).report()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Identity:    {}", status.current_identity);

    if status.session.active {
        let role = status.session.role_label.as_deref().unwrap_or("?");
        match status.session.expires_at {
            Some(expires_at) => println!(
                "Session:     active ({}, expires {})",
                role,
                expires_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            None => println!("Session:     active ({})", role),
        }
    } else {
        println!("Session:     none");
    }

    println!(
        "Environment: {}",
        status.environment.as_deref().unwrap_or("unknown")
    );

    if status.profiles.is_empty() {
        println!("Profiles:    none");
    } else {
        println!("Profiles:");
        for (name, summary) in &status.profiles {
            let detail = match summary.kind {
                ProfileKind::RoleLinked => summary.role_arn.clone().unwrap_or_default(),
                _ => summary.access_key_id.clone().unwrap_or_default(),
            };
            println!("  {:<20} {:<12} {}", name, summary.kind.as_str(), detail);
        }
    }

    Ok(())
}
