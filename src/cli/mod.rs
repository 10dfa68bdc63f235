// CLI interface
pub mod commands;

use crate::error::Result;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "rolekeeper")]
#[command(about = "Assume-role session broker for AWS profiles", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// AWS region for STS calls
    #[arg(long, env = "AWS_REGION", global = true)]
    pub region: Option<String>,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assume a role and make its credentials the active identity
    Assume {
        /// ARN of the role to assume
        role_arn: String,

        /// Session name recorded in the provider's audit trail
        #[arg(long)]
        session_name: Option<String>,

        /// External id required by some trust policies
        #[arg(long)]
        external_id: Option<String>,

        /// Credential lifetime in seconds (900-43200)
        #[arg(long)]
        duration: Option<i32>,

        /// Base profile that signs the trust exchange (skips the
        /// candidate probe)
        #[arg(long)]
        source_profile: Option<String>,

        /// Also save the assumed credentials under this profile name
        #[arg(long)]
        profile: Option<String>,
    },

    /// Release the active session and restore the prior identity
    Release,

    /// Show session, identity, environment and profile state
    Status {
        /// Output in JSON format for scripting
        #[arg(long)]
        json: bool,
    },

    /// Point the default identity binding at a named environment
    Switch {
        /// Environment name from the config registry
        name: String,
    },

    /// Manage the environment registry
    Env {
        #[command(subcommand)]
        command: EnvCommands,
    },

    /// Manage stored credential profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Manage the rolekeeper config file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell type to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum EnvCommands {
    /// List registered environments
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show which environment the default binding matches
    Current,

    /// Register an environment
    Add {
        name: String,

        #[arg(long)]
        region: String,

        #[arg(long)]
        role_arn: String,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Remove an environment from the registry
    Remove { name: String },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List stored profiles with their type
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Save base credentials under a profile name
    Save {
        name: String,

        #[arg(long)]
        access_key_id: String,

        #[arg(long)]
        secret_access_key: String,

        #[arg(long)]
        session_token: Option<String>,
    },

    /// Save role-linkage metadata under a profile name
    Link {
        name: String,

        #[arg(long)]
        role_arn: String,

        #[arg(long)]
        source_profile: String,

        #[arg(long, default_value = "us-east-1")]
        region: String,

        #[arg(long)]
        external_id: Option<String>,

        #[arg(long, default_value_t = 3600)]
        duration: i32,
    },

    /// Remove a profile
    Remove { name: String },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Create a sample config file
    Init,

    /// Show the config file path and its state
    Path,
}

#[derive(Debug, Clone, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

pub async fn execute(args: Cli) -> Result<()> {
    match args.command {
        Commands::Assume {
            role_arn,
            session_name,
            external_id,
            duration,
            source_profile,
            profile,
        } => {
            commands::assume::execute(
                args.region,
                role_arn,
                session_name,
                external_id,
                duration,
                source_profile,
                profile,
            )
            .await
        }
        Commands::Release => commands::release::execute().await,
        Commands::Status { json } => commands::status::execute(json).await,
        Commands::Switch { name } => commands::switch::execute(name).await,
        Commands::Env { command } => commands::env::execute(command).await,
        Commands::Profile { command } => commands::profile::execute(command).await,
        Commands::Config { command } => commands::config::execute(command).await,
        Commands::Completions { shell } => {
            commands::completions::execute(shell);
            Ok(())
        }
    }
}
