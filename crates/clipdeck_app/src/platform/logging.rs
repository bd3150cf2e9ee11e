//! Logger setup for the `clipdeck` binary.
//!
//! File output goes to `./clipdeck.log` in the current working directory.

use std::path::Path;

use engine_logging::LogDestination;

use super::config::{AppConfig, LogTarget};

const LOG_FILE: &str = "clipdeck.log";

pub fn initialize(config: &AppConfig) {
    let destination = match config.log {
        LogTarget::Terminal => LogDestination::Terminal,
        LogTarget::File => LogDestination::File,
        LogTarget::Both => LogDestination::Both,
    };
    engine_logging::initialize(destination, config.level_filter(), Path::new(LOG_FILE));
}
