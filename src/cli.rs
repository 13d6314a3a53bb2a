//! Command-line arguments for the headless driver.

use clap::Parser;

use crate::config::{ConfigError, MapConfig};

/// Fetch the stars around an exoplanet and optionally ask the chatbot about it.
///
/// Flags override the built-in [`MapConfig`] defaults and can also be given
/// through `EXOSKY_*` environment variables.
#[derive(Parser, Debug, Default)]
#[command(name = "exosky_map", version)]
pub struct CliArgs {
    /// Planet to centre the star map on.
    #[arg(default_value = "")]
    pub planet: String,

    /// Chat message to send once the request is issued.
    pub message: Vec<String>,

    /// Base url of the star/chat backend.
    #[arg(long, env = "EXOSKY_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Frames per second of the driver loop.
    #[arg(long, env = "EXOSKY_FRAME_RATE", value_parser = clap::value_parser!(u32).range(1..))]
    pub frame_rate: Option<u32>,
}

impl CliArgs {
    /// The chat message words joined back into one line, if any were given.
    pub fn chat_message(&self) -> Option<String> {
        (!self.message.is_empty()).then(|| self.message.join(" "))
    }
}

impl MapConfig {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) -> Result<(), ConfigError> {
        if let Some(ref url) = args.backend_url {
            let url = url.trim();
            if url.is_empty() {
                return Err(ConfigError::EmptyBackendUrl);
            }
            self.backend_url = url.to_string();
        }
        if let Some(rate) = args.frame_rate {
            self.frame_rate = rate;
        }
        Ok(())
    }
}
