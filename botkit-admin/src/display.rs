use botkit_core::{
    ControlState, IconKind, Severity, StatusView,
    notify::{Notification, NotificationDisplay, NotificationId},
};
use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use log::trace;

/// Prints toasts as they appear. Nothing to take down on a terminal.
pub struct TerminalDisplay;

fn paint(text: &str, severity: Severity) -> ColoredString {
    match severity {
        Severity::Success => text.green(),
        Severity::Error => text.red(),
        Severity::Warning => text.yellow(),
        Severity::Info => text.blue(),
    }
}

impl NotificationDisplay for TerminalDisplay {
    fn show(&self, notification: &Notification) {
        let line = format!("{} {}", notification.severity.icon(), notification.message);
        println!("{}", paint(&line, notification.severity).bold());
    }

    fn remove(&self, id: NotificationId) {
        trace!("Notification {id} dismissed");
    }
}

pub fn print_status(view: &StatusView, control: &ControlState, checked_at: Option<DateTime<Utc>>) {
    let icon = match view.icon {
        IconKind::Positive => view.icon.glyph().green(),
        IconKind::Negative => view.icon.glyph().red(),
    };
    let message = if view.message.is_empty() { "No license information." } else { view.message.as_str() };

    println!("{}", "-".repeat(60));
    println!("{icon} {message} [{}]", view.css_class);
    if let Some(at) = checked_at {
        println!("  Last checked : {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("  Next action  : {}", control.label.bold());
    println!("{}", "-".repeat(60));
}
