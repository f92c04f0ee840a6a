//! Activation controller.
//!
//! Owns the held [`LicenseStatus`] and the submit control. A submission claims
//! the in-flight flag up front and hands back both the flag and the control
//! from a drop guard, so every exit path (including a dropped future) leaves
//! the control enabled.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::{
    error::LicenseError,
    license::LicenseStatus,
    notify::{Notifier, Severity},
    render::ControlState,
    request::{ActivationAction, ActivationRequest, ActivationResult},
    transport::Transport,
};

pub const SUCCESS_FALLBACK: &str = "License updated successfully.";
pub const REJECTED_FALLBACK: &str = "License request failed. Please try again.";
pub const TRANSPORT_MESSAGE: &str = "Connection error. Please try again.";
pub const BUSY_MESSAGE: &str = "A license request is already in progress.";

struct Shared {
    status: LicenseStatus,
    control: ControlState,
}

pub struct LicenseController<T> {
    transport: T,
    notifier: Notifier,
    shared: Mutex<Shared>,
    in_flight: AtomicBool,
}

/// Held for the duration of one submission.
struct Submission<'a> {
    shared: &'a Mutex<Shared>,
    in_flight: &'a AtomicBool,
    restore: ControlState,
}

impl Drop for Submission<'_> {
    fn drop(&mut self) {
        let mut control = self.restore.clone();
        control.enabled = true;

        self.shared.lock().control = control;
        self.in_flight.store(false, Ordering::Release);
    }
}

impl<T: Transport> LicenseController<T> {
    /// `initial` is whatever status the host had before the controller attached.
    pub fn new(transport: T, notifier: Notifier, initial: LicenseStatus) -> Self {
        let control = ControlState::for_status(&initial);

        Self { transport, notifier, shared: Mutex::new(Shared { status: initial, control }), in_flight: AtomicBool::new(false) }
    }

    #[must_use]
    pub fn status(&self) -> LicenseStatus {
        self.shared.lock().status.clone()
    }

    #[must_use]
    pub fn control(&self) -> ControlState {
        self.shared.lock().control.clone()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// What the control offers next, based on the held status.
    #[must_use]
    pub fn next_action(&self) -> ActivationAction {
        if self.shared.lock().status.is_valid() { ActivationAction::Deactivate } else { ActivationAction::Activate }
    }

    #[must_use]
    pub const fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    fn begin(&self) -> Option<Submission<'_>> {
        if self.in_flight.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            return None;
        }

        let mut shared = self.shared.lock();
        let restore = shared.control.clone();
        shared.control = restore.busy();

        Some(Submission { shared: &self.shared, in_flight: &self.in_flight, restore })
    }

    /// Sends one license request and reports its outcome exactly once.
    ///
    /// # Errors
    /// Will return `Err` if the request is invalid, another request is still running,
    /// the server rejects it or it never reaches the server
    pub async fn submit(&self, request: ActivationRequest) -> Result<ActivationResult, LicenseError> {
        if let Err(e) = request.validate() {
            warn!("License request {} not sent: {e}", request.id());
            self.notifier.notify(e.to_string(), Severity::Warning);
            return Err(e);
        }

        let Some(mut submission) = self.begin() else {
            warn!("License request {} refused, another request is in flight", request.id());
            self.notifier.notify(BUSY_MESSAGE, Severity::Warning);
            return Err(LicenseError::Busy);
        };

        debug!("License request {} started: {}", request.id(), request.action());

        let response = match self.transport.send(&request).await {
            Ok(response) => response,
            Err(e) => {
                error!("License request {} failed: {e}", request.id());
                self.notifier.notify(TRANSPORT_MESSAGE, Severity::Error);
                return Err(LicenseError::Transport(e));
            }
        };

        let result = ActivationResult::from(response);

        if !result.success {
            let message = result.message.clone().unwrap_or_else(|| REJECTED_FALLBACK.to_owned());
            warn!("License request {} rejected: {message}", request.id());
            self.notifier.notify(message.clone(), Severity::Error);
            return Err(LicenseError::Rejected(message));
        }

        let status = {
            let mut shared = self.shared.lock();
            if let Some(status) = &result.status {
                shared.status = status.clone();
            }
            shared.status.clone()
        };
        submission.restore = ControlState::for_status(&status);

        let message = result
            .message
            .clone()
            .or_else(|| result.status.as_ref().map(|s| s.message.clone()).filter(|m| !m.trim().is_empty()))
            .unwrap_or_else(|| SUCCESS_FALLBACK.to_owned());

        info!("License request {} ({}) succeeded, license is {}", request.id(), request.action(), status.state);
        self.notifier.notify(message, Severity::Success);

        Ok(result)
    }
}
