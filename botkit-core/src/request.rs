use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::LicenseError,
    license::{LicenseStatus, StatusDisplay},
};

/// AJAX action every license request is routed through.
pub const AJAX_ACTION: &str = "license_action";

pub const LICENSE_KEY_FIELD: &str = "license_key";

#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ActivationAction {
    Activate,
    Deactivate,
    Check,
}

impl ActivationAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::Check => "check",
        }
    }
}

impl fmt::Display for ActivationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivationAction {
    type Err = LicenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "activate" => Ok(Self::Activate),
            "deactivate" => Ok(Self::Deactivate),
            "check" => Ok(Self::Check),
            other => Err(LicenseError::UnknownAction(other.to_owned())),
        }
    }
}

/// One user initiated license request. Built per submit, dropped once resolved.
#[derive(Debug, Clone)]
pub struct ActivationRequest {
    id: Uuid,
    action: ActivationAction,
    nonce: String,
    fields: Vec<(String, String)>,
}

impl ActivationRequest {
    pub fn new(action: ActivationAction, nonce: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4(), action, nonce: nonce.into(), fields: Vec::new() }
    }

    /// Adds a form field. A field with the same name is replaced in place.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if let Some(existing) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            existing.1 = value;
        } else {
            self.fields.push((name, value));
        }
        self
    }

    #[must_use]
    pub fn license_key(self, key: impl Into<String>) -> Self {
        self.field(LICENSE_KEY_FIELD, key)
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn action(&self) -> ActivationAction {
        self.action
    }

    #[must_use]
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    #[must_use]
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    /// # Errors
    /// Will return `Err` if the request can't be sent as is
    pub fn validate(&self) -> Result<(), LicenseError> {
        if self.nonce.trim().is_empty() {
            return Err(LicenseError::MissingNonce);
        }

        if self.action == ActivationAction::Activate && self.get(LICENSE_KEY_FIELD).is_none_or(|key| key.trim().is_empty()) {
            return Err(LicenseError::MissingLicenseKey);
        }

        Ok(())
    }

    /// Form pairs in wire order: routing fields first, then the payload.
    /// Payload fields can't override the routing fields.
    #[must_use]
    pub fn form(&self) -> Vec<(&str, &str)> {
        let mut form = vec![("action", AJAX_ACTION), ("nonce", self.nonce.as_str()), ("license_action", self.action.as_str())];
        form.extend(self.fields.iter().filter(|(name, _)| !matches!(name.as_str(), "action" | "nonce" | "license_action")).map(|(n, v)| (n.as_str(), v.as_str())));
        form
    }
}

/// Reply envelope. Only `success`, `data.message` and `data.status_display`
/// are read; anything else the server sends is ignored.
#[derive(Serialize, Deserialize, Default, Debug, Eq, PartialEq, Clone)]
pub struct ActivationResponse {
    pub success: bool,

    #[serde(default, deserialize_with = "response_data")]
    pub data: Option<ResponseData>,
}

#[derive(Serialize, Deserialize, Default, Debug, Eq, PartialEq, Clone)]
pub struct ResponseData {
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub status_display: Option<StatusDisplay>,
}

/// `data` as sent by `wp_send_json_*`: an object, a bare message string, or a
/// list of `{code, message}` errors. Other shapes carry nothing we read.
fn response_data<'de, D>(deserializer: D) -> Result<Option<ResponseData>, D::Error>
where
    D: Deserializer<'de>,
{
    let data = match Value::deserialize(deserializer)? {
        Value::Object(map) => serde_json::from_value(Value::Object(map)).ok(),
        Value::String(message) => Some(ResponseData { message: Some(message), status_display: None }),
        Value::Array(errors) => errors.iter().find_map(|e| e.get("message")?.as_str()).map(|m| ResponseData { message: Some(m.to_owned()), status_display: None }),
        _ => None,
    };

    Ok(data)
}

/// A field of the wrong shape reads as absent instead of failing the whole reply.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(serde_json::from_value(Value::deserialize(deserializer)?).ok())
}

/// Outcome of one request, after the wire shape has been interpreted.
#[derive(Default, Debug, Eq, PartialEq, Clone)]
pub struct ActivationResult {
    pub success: bool,
    pub message: Option<String>,
    pub status: Option<LicenseStatus>,
}

impl From<ActivationResponse> for ActivationResult {
    fn from(response: ActivationResponse) -> Self {
        let data = response.data.unwrap_or_default();

        Self {
            success: response.success,
            message: data.message.filter(|m| !m.trim().is_empty()),
            status: data.status_display.map(LicenseStatus::from),
        }
    }
}
