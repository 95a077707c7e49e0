//! Configuration options.
//!
//! The dispatch core is configured from a TOML file shared with the rest of
//! the engine; the path is typically a command line argument of the
//! embedding application.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Loads a configuration file from `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> AppLayerConfig {
    let config_str = fs::read_to_string(path).expect("ERROR: File read failed");
    toml::from_str(&config_str).expect("Invalid config file")
}

/// Default configuration, suitable for tests and offline analysis.
pub fn default_config() -> AppLayerConfig {
    AppLayerConfig::default()
}

/// Runtime options for the application-layer dispatch core.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct AppLayerConfig {
    /// The engine runs as an in-path filter rather than a passive sniffer.
    /// Replay polarity differs between the two modes. Defaults to `false`.
    #[serde(default = "default_inline")]
    pub inline: bool,

    /// Capacity of the shared stream-message recycling pool. Defaults to
    /// `512`.
    #[serde(default = "default_msg_pool_capacity")]
    pub msg_pool_capacity: usize,
}

fn default_inline() -> bool {
    false
}

fn default_msg_pool_capacity() -> usize {
    512
}

impl Default for AppLayerConfig {
    fn default() -> Self {
        AppLayerConfig {
            inline: default_inline(),
            msg_pool_capacity: default_msg_pool_capacity(),
        }
    }
}
