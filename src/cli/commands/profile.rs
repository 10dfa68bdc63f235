use crate::cli::ProfileCommands;
use crate::error::{Result, RoleError};
use crate::models::{CredentialSet, ProfileKind};
use crate::store::CredentialStore;

pub async fn execute(command: ProfileCommands) -> Result<()> {
    let store = CredentialStore::new()?;

    match command {
        ProfileCommands::List { format } => list(&store, &format),
        ProfileCommands::Save {
            name,
            access_key_id,
            secret_access_key,
            session_token,
        } => {
            let credentials = CredentialSet {
                access_key_id,
                secret_access_key,
                session_token,
                expiration: None,
            };
            store.save(&name, &credentials)?;
            println!("✓ Saved profile '{}'", name);
            Ok(())
        }
        ProfileCommands::Link {
            name,
            role_arn,
            source_profile,
            region,
            external_id,
            duration,
        } => {
            store.save_role_profile(
                &name,
                &role_arn,
                &source_profile,
                &region,
                external_id.as_deref(),
                duration,
            )?;
            println!("✓ Linked profile '{}' to {}", name, role_arn);
            Ok(())
        }
        ProfileCommands::Remove { name } => {
            store.remove(&name)?;
            println!("✓ Removed profile '{}'", name);
            Ok(())
        }
    }
}

fn list(store: &CredentialStore, format: &str) -> Result<()> {
    let profiles = store.list()?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&profiles)?),
        "text" => {
            if profiles.is_empty() {
                println!("No profiles found.");
                return Ok(());
            }
            for (name, summary) in &profiles {
                let detail = match summary.kind {
                    ProfileKind::RoleLinked => summary.role_arn.clone().unwrap_or_default(),
                    _ => summary.access_key_id.clone().unwrap_or_default(),
                };
                println!("{:<20} {:<12} {}", name, summary.kind.as_str(), detail);
            }
        }
        _ => {
            return Err(RoleError::InvalidInput(format!(
                "Unsupported format: {}. Use 'text' or 'json'",
                format
            )))
        }
    }

    Ok(())
}
