//! License activation client for the AI BotKit license manager.
//!
//! A [`LicenseController`] sends activate/deactivate/check requests through a
//! [`Transport`], holds the last reported [`LicenseStatus`], keeps the submit
//! control in sync and reports every outcome once through a [`Notifier`].

pub mod controller;
pub mod error;
pub mod instance;
pub mod license;
pub mod notify;
pub mod render;
pub mod request;
pub mod transport;

pub use controller::LicenseController;
pub use error::{LicenseError, TransportError};
pub use instance::Instance;
pub use license::{LicenseState, LicenseStatus};
pub use notify::{NotificationDisplay, NotificationHandle, Notifier, Severity};
pub use render::{ControlState, IconKind, StatusView, render};
pub use request::{ActivationAction, ActivationRequest, ActivationResult};
pub use transport::{HttpTransport, Transport};

/// Controller talking to a real licensing endpoint.
pub type HttpLicenseController = LicenseController<HttpTransport>;
