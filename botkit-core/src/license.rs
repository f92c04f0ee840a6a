use std::fmt;

use serde::{Deserialize, Serialize};

/// Validity of the license as last reported by the server.
#[derive(Serialize, Deserialize, Default, Debug, Eq, PartialEq, Clone, Copy)]
pub enum LicenseState {
    #[default]
    Unknown,
    Valid,
    Invalid,
    Warning,
    Error,
}

impl LicenseState {
    /// Maps the wire `status` string. Anything unrecognised is `Unknown`.
    #[must_use]
    pub fn from_wire(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "valid" => Self::Valid,
            "invalid" => Self::Invalid,
            "warning" => Self::Warning,
            "error" => Self::Error,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LicenseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The status held by a controller. Always replaced as a whole.
#[derive(Serialize, Deserialize, Default, Debug, Eq, PartialEq, Clone)]
pub struct LicenseStatus {
    pub state: LicenseState,

    // presentation only
    pub class: String,

    pub message: String,
}

impl LicenseStatus {
    #[must_use]
    pub fn new(state: LicenseState, class: impl Into<String>, message: impl Into<String>) -> Self {
        Self { state, class: class.into(), message: message.into() }
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self.state, LicenseState::Valid)
    }
}

/// `status_display` object as sent by the licensing endpoint.
#[derive(Serialize, Deserialize, Default, Debug, Eq, PartialEq, Clone)]
pub struct StatusDisplay {
    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub class: String,

    #[serde(default)]
    pub message: String,
}

impl From<StatusDisplay> for LicenseStatus {
    fn from(display: StatusDisplay) -> Self {
        Self { state: LicenseState::from_wire(&display.status), class: display.class, message: display.message }
    }
}
