use crate::cli::ConfigCommand;
use crate::config::Config;
use crate::error::Result;

pub async fn execute(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Init => Config::create_sample(),
        ConfigCommand::Path => {
            let path = Config::config_file_path()?;
            println!("Config file path: {}", path.display());

            if path.exists() {
                match Config::load() {
                    Ok(config) => {
                        println!("Status: valid ({} environments)", config.environments.len())
                    }
                    Err(e) => println!("Status: invalid ({})", e),
                }
            } else {
                println!("Status: not found (using defaults)");
                println!("\nRun 'rolekeeper config init' to create a sample config file.");
            }

            Ok(())
        }
    }
}
