use std::{error::Error, path::Path, sync::Arc};

use botkit_core::{
    ActivationAction, ActivationRequest, HttpLicenseController, HttpTransport, Instance, LicenseController, Notifier,
    render::{ControlState, DEACTIVATE_CONFIRM, render},
};
use dialoguer::{Confirm, Password, theme::ColorfulTheme};
use log::{info, warn};

use crate::{config::Settings, display, display::TerminalDisplay, store::StoredStatus};

fn controller(settings: &Settings, stored: &StoredStatus) -> Result<HttpLicenseController, Box<dyn Error>> {
    if settings.endpoint.trim().is_empty() {
        return Err("No licensing endpoint configured, pass --endpoint or set `endpoint` in config.toml".into());
    }

    let transport = HttpTransport::new(settings.endpoint.clone(), settings.timeout());
    let notifier = Notifier::init(Arc::new(TerminalDisplay), settings.notification_duration());

    Ok(LicenseController::new(transport, notifier, stored.status.clone()))
}

/// Builds the request for `action`, bound to this machine when it can be fingerprinted.
fn request(settings: &Settings, action: ActivationAction) -> ActivationRequest {
    let request = ActivationRequest::new(action, settings.nonce.clone());

    if let Some(instance) = Instance::detect(&settings.instance_key) {
        info!("Instance: {} ({})", instance.name, instance.id);
        instance.attach(request)
    } else {
        warn!("Failed to fingerprint this machine, sending without instance");
        request
    }
}

async fn run(controller: &HttpLicenseController, request: ActivationRequest, status_path: &Path) -> Result<(), Box<dyn Error>> {
    let outcome = controller.submit(request).await;

    // the notifier only lives as long as this command
    controller.notifier().shutdown();

    outcome?;

    let stored = StoredStatus::save(status_path, &controller.status())?;
    display::print_status(&render(&stored.status), &controller.control(), stored.checked_at);
    Ok(())
}

/// Activate a license key, prompting for it when not given
pub async fn activate_wizard(settings: &Settings, status_path: &Path, key: Option<String>) -> Result<(), Box<dyn Error>> {
    let stored = StoredStatus::load(status_path);
    let controller = controller(settings, &stored)?;

    if controller.next_action() != ActivationAction::Activate {
        warn!("License is already active, activating again");
    }

    let key = match key {
        Some(key) => key,
        None => Password::with_theme(&ColorfulTheme::default()).with_prompt("License key").interact()?,
    };

    run(&controller, request(settings, ActivationAction::Activate).license_key(key.trim()), status_path).await
}

/// Deactivate the license on this machine after confirmation
pub async fn deactivate_wizard(settings: &Settings, status_path: &Path, yes: bool) -> Result<(), Box<dyn Error>> {
    let stored = StoredStatus::load(status_path);
    let controller = controller(settings, &stored)?;

    let prompt = controller.control().confirm.unwrap_or(DEACTIVATE_CONFIRM);
    if !yes && !Confirm::with_theme(&ColorfulTheme::default()).with_prompt(prompt).default(false).interact()? {
        println!("Deactivation cancelled.");
        return Ok(());
    }

    run(&controller, request(settings, ActivationAction::Deactivate), status_path).await
}

/// Ask the server for the current status of the license
pub async fn check_wizard(settings: &Settings, status_path: &Path) -> Result<(), Box<dyn Error>> {
    let stored = StoredStatus::load(status_path);
    let controller = controller(settings, &stored)?;

    run(&controller, request(settings, ActivationAction::Check), status_path).await
}

/// Show the last known status without contacting the server
pub fn show_status(status_path: &Path) {
    let stored = StoredStatus::load(status_path);
    let control = ControlState::for_status(&stored.status);

    display::print_status(&render(&stored.status), &control, stored.checked_at);
}
