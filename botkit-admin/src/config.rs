use std::{fs, io, path::Path, time::Duration};

use log::{debug, info};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "config.toml";

/// Settings read from `config.toml`, command line flags win over the file.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone)]
#[serde(default)]
pub struct Settings {
    /// `admin-ajax.php` style endpoint taking the license form
    pub endpoint: String,
    pub nonce: String,
    /// Salt for the instance fingerprint
    pub instance_key: String,
    pub timeout_secs: u64,
    pub notification_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            nonce: String::new(),
            instance_key: "botkit".to_owned(),
            timeout_secs: 30,
            notification_ms: 5000,
        }
    }
}

impl Settings {
    /// A missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        Ok(toml::from_str(&raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        fs::write(path, toml::to_string_pretty(self)?)?;
        info!("Config written to {}", path.display());
        Ok(())
    }

    #[must_use]
    pub fn with_overrides(mut self, endpoint: Option<String>, nonce: Option<String>) -> Self {
        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint;
        }
        if let Some(nonce) = nonce {
            self.nonce = nonce;
        }
        self
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub const fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }
}
