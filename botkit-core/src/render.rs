use crate::license::{LicenseState, LicenseStatus};

pub const ACTIVATE_LABEL: &str = "Activate License";
pub const DEACTIVATE_LABEL: &str = "Deactivate License";
pub const PROCESSING_LABEL: &str = "Processing...";
pub const DEACTIVATE_CONFIRM: &str = "Are you sure you want to deactivate your license?";

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum IconKind {
    Positive,
    Negative,
}

impl IconKind {
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Positive => "✓",
            Self::Negative => "✗",
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct StatusView {
    pub css_class: String,
    pub icon: IconKind,
    pub message: String,
}

/// Projects a status into display attributes. Applying them is up to the caller.
#[must_use]
pub fn render(status: &LicenseStatus) -> StatusView {
    let css_class = if status.class.trim().is_empty() { status.state.as_str().to_owned() } else { status.class.clone() };
    let icon = if status.state == LicenseState::Valid { IconKind::Positive } else { IconKind::Negative };

    StatusView { css_class, icon, message: status.message.clone() }
}

/// The submit control as the controller last left it.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct ControlState {
    pub label: String,
    pub css_class: &'static str,
    pub confirm: Option<&'static str>,
    pub enabled: bool,
}

impl ControlState {
    /// Affordance offered next: a valid license can only be deactivated.
    #[must_use]
    pub fn for_status(status: &LicenseStatus) -> Self {
        if status.is_valid() {
            Self { label: DEACTIVATE_LABEL.to_owned(), css_class: "button-secondary", confirm: Some(DEACTIVATE_CONFIRM), enabled: true }
        } else {
            Self { label: ACTIVATE_LABEL.to_owned(), css_class: "button-primary", confirm: None, enabled: true }
        }
    }

    pub(crate) fn busy(&self) -> Self {
        Self { label: PROCESSING_LABEL.to_owned(), enabled: false, ..self.clone() }
    }
}
