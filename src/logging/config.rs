use std::{fs, path::Path};

use log::LevelFilter;
use serde::Deserialize;

/// System-wide configuration file shared by every skill on the device.
pub const SYSTEM_CONFIG: &str = "/etc/mycroft/mycroft.conf";

const DEFAULT_LEVEL: &str = "DEBUG";

/// The subset of the system configuration the logger cares about.
#[derive(Deserialize, Debug)]
struct SystemConfig {
    #[serde(default = "default_level")]
    log_level: String,
}

fn default_level() -> String {
    DEFAULT_LEVEL.into()
}

/// Process-wide logging settings, built once at startup and handed to
/// [`LogConfig::install`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    level: LevelFilter,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Debug,
        }
    }
}

impl LogConfig {
    pub fn new(level: LevelFilter) -> Self {
        Self { level }
    }

    /// Reads `log_level` from a JSON file that may contain `//` or `#` line
    /// comments. Anything that goes wrong yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.is_file() {
            return Self::default();
        }

        let Ok(text) = fs::read_to_string(path) else {
            return Self::default();
        };

        match serde_json::from_str::<SystemConfig>(&strip_comments(&text)) {
            Ok(config) => Self::new(parse_level(&config.log_level)),
            Err(_) => Self::default(),
        }
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }
}

/// Drops whole-line `//` and `#` comments.
pub(crate) fn strip_comments(text: &str) -> String {
    text.lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !(trimmed.starts_with("//") || trimmed.starts_with('#'))
        })
        .collect::<Vec<&str>>()
        .join("\n")
}

/// Maps a severity name onto the `log` crate's filters. Unknown names get the
/// default level.
pub(crate) fn parse_level(name: &str) -> LevelFilter {
    match name.trim().to_ascii_uppercase().as_str() {
        "NOTSET" => LevelFilter::Trace,
        "DEBUG" => LevelFilter::Debug,
        "INFO" => LevelFilter::Info,
        "WARN" | "WARNING" => LevelFilter::Warn,
        "ERROR" | "CRITICAL" | "FATAL" => LevelFilter::Error,
        _ => LevelFilter::Debug,
    }
}
