//! Config subcommand handlers.

use lokal_config::ConfigError;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
        }

        ConfigCommand::Show => {
            let cfg = config::effective_config(global)?;
            let text = toml::to_string_pretty(&cfg.redacted()).map_err(ConfigError::from)?;
            output::print_output(text.trim_end(), global.quiet);
        }

        ConfigCommand::Init => {
            let cfg = config::effective_config(global)?;
            // Refuse to persist something that cannot be used.
            cfg.to_client_config()?;
            let path = config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Wrote {}", path.display());
            }
        }
    }
    Ok(())
}
