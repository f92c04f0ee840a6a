use std::{fs, io, path::Path};

use botkit_core::LicenseStatus;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

pub const STATUS_FILE: &str = "status.mpk";

/// Last status the server reported, kept between runs.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone, Default)]
pub struct StoredStatus {
    pub status: LicenseStatus,
    pub checked_at: Option<DateTime<Utc>>,
}

impl StoredStatus {
    /// A missing or unreadable file means nothing is known yet.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!("Failed to read {}: {e}", path.display());
                return Self::default();
            }
        };

        // MsgPack
        let Ok(stored) = rmp_serde::from_slice::<Self>(&bytes) else {
            warn!("Discarding unreadable status file {}", path.display());
            return Self::default();
        };

        stored
    }

    pub fn save(path: &Path, status: &LicenseStatus) -> Result<Self, Box<dyn std::error::Error>> {
        let stored = Self { status: status.clone(), checked_at: Some(Utc::now()) };
        fs::write(path, rmp_serde::to_vec(&stored)?)?;
        debug!("Status {} saved to {}", status.state, path.display());
        Ok(stored)
    }
}
