use crate::cli::EnvCommands;
use crate::config::Config;
use crate::environment::EnvironmentSwitcher;
use crate::error::{Result, RoleError};
use crate::models::Environment;
use crate::store::CredentialStore;

pub async fn execute(command: EnvCommands) -> Result<()> {
    match command {
        EnvCommands::List { format } => list(&format),
        EnvCommands::Current => current(),
        EnvCommands::Add {
            name,
            region,
            role_arn,
            description,
        } => add(name, region, role_arn, description),
        EnvCommands::Remove { name } => remove(&name),
    }
}

fn list(format: &str) -> Result<()> {
    let config = Config::load()?;
    let environments = config.environments();

    match format {
        "json" => {
            let values: Vec<&Environment> = environments.values().collect();
            println!("{}", serde_json::to_string_pretty(&values)?);
        }
        "text" => {
            if environments.is_empty() {
                println!("No environments registered. Add one with 'rolekeeper env add'.");
                return Ok(());
            }
            for env in environments.values() {
                println!("{:<16} {:<14} {}", env.name, env.region, env.role_arn);
                if !env.description.is_empty() {
                    println!("{:<16} {}", "", env.description);
                }
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

fn current() -> Result<()> {
    let config = Config::load()?;
    let switcher = EnvironmentSwitcher::new(
        CredentialStore::new()?,
        config.environments(),
        &config.session,
    );

    match switcher.current()? {
        Some(name) => println!("{}", name),
        None => println!("unknown"),
    }
    Ok(())
}

fn add(name: String, region: String, role_arn: String, description: String) -> Result<()> {
    if !role_arn.starts_with("arn:") {
        return Err(RoleError::InvalidInput(format!(
            "Malformed role ARN: {}",
            role_arn
        )));
    }

    let mut config = Config::load()?;
    config.add_environment(&Environment {
        name: name.clone(),
        region,
        role_arn,
        description,
    });
    config.save()?;

    println!("✓ Registered environment '{}'", name);
    Ok(())
}

fn remove(name: &str) -> Result<()> {
    let mut config = Config::load()?;
    if !config.remove_environment(name) {
        return Err(RoleError::EnvironmentNotFound(name.to_string()));
    }
    config.save()?;

    println!("✓ Removed environment '{}'", name);
    Ok(())
}
