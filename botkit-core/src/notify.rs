//! Transient toast notifications.
//!
//! Every notification owns one dismissal timer. Manual dismissal aborts that
//! timer, and whichever of the two runs first removes the entry; the other
//! finds nothing and does nothing.
//!
//! `parking_lot::Mutex` guards the display list and is never held across an
//! `.await`. [`NotificationDisplay::show`] runs under it so a concurrent
//! shutdown can't drain the list between showing and recording an entry;
//! displays must not call back into the notifier from `show`.
//! [`NotificationDisplay::remove`] runs outside of it while the entry sits in
//! [`Phase::Dismissing`].

use std::{
    fmt,
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use log::{debug, trace, warn};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

pub const DEFAULT_DURATION: Duration = Duration::from_millis(5000);

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Error => "✗",
            Self::Warning => "⚠",
            Self::Info => "ℹ",
        }
    }

    #[must_use]
    pub const fn class(self) -> &'static str {
        match self {
            Self::Success => "notice-success",
            Self::Error => "notice-error",
            Self::Warning => "notice-warning",
            Self::Info => "notice-info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct NotificationId(u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum Phase {
    Visible,
    Dismissing,
    Removed,
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub severity: Severity,
    pub duration: Duration,
}

/// Where notifications are actually shown.
pub trait NotificationDisplay: Send + Sync {
    fn show(&self, notification: &Notification);

    fn remove(&self, id: NotificationId);
}

/// Returned by [`Notifier::notify`] to dismiss early.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub struct NotificationHandle {
    id: NotificationId,
}

impl NotificationHandle {
    #[must_use]
    pub const fn id(&self) -> NotificationId {
        self.id
    }
}

struct Entry {
    notification: Notification,
    phase: Phase,
    timer: Option<JoinHandle<()>>,
}

#[derive(Debug, Clone, Copy)]
enum Removal {
    Dismissed,
    Expired,
}

struct Inner {
    display: Arc<dyn NotificationDisplay>,
    entries: Mutex<Vec<Entry>>,
    next_id: AtomicU64,
    default_duration: Duration,
    closed: AtomicBool,
}

impl Inner {
    fn remove(&self, id: NotificationId, removal: Removal) -> bool {
        let timer = {
            let mut entries = self.entries.lock();
            let Some(entry) = entries.iter_mut().find(|e| e.notification.id == id && e.phase == Phase::Visible) else {
                trace!("Notification {id} already removed ({removal:?})");
                return false;
            };

            entry.phase = Phase::Dismissing;
            entry.timer.take()
        };

        if let (Removal::Dismissed, Some(timer)) = (removal, timer) {
            timer.abort();
        }

        self.display.remove(id);
        self.entries.lock().retain(|e| e.notification.id != id);

        debug!("Notification {id} removed ({removal:?})");
        true
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        for entry in self.entries.get_mut().drain(..) {
            if let Some(timer) = entry.timer {
                timer.abort();
            }
        }
    }
}

/// The notification area. Cloning shares the same area.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<Inner>,
}

impl Notifier {
    pub fn init(display: Arc<dyn NotificationDisplay>, default_duration: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                display,
                entries: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                default_duration,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Shows a notification for the default duration.
    ///
    /// # Panics
    /// Panics when called outside of a tokio runtime.
    pub fn notify(&self, message: impl Into<String>, severity: Severity) -> NotificationHandle {
        self.notify_for(message, severity, self.inner.default_duration)
    }

    /// # Panics
    /// Panics when called outside of a tokio runtime.
    pub fn notify_for(&self, message: impl Into<String>, severity: Severity, duration: Duration) -> NotificationHandle {
        let id = NotificationId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let handle = NotificationHandle { id };

        // closed only flips under this lock
        let mut entries = self.inner.entries.lock();
        if self.inner.closed.load(Ordering::Acquire) {
            warn!("Notification {id} dropped, notifier is shut down");
            return handle;
        }

        let mut entry = Entry { notification: Notification { id, message: message.into(), severity, duration }, phase: Phase::Visible, timer: None };
        self.inner.display.show(&entry.notification);

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);

        // the timer can't observe the entry until the lock is released
        entry.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(inner) = weak.upgrade() {
                inner.remove(id, Removal::Expired);
            }
        }));
        entries.push(entry);

        handle
    }

    /// Returns `false` when the notification was already gone.
    pub fn dismiss(&self, handle: &NotificationHandle) -> bool {
        self.inner.remove(handle.id, Removal::Dismissed)
    }

    #[must_use]
    pub fn phase(&self, handle: &NotificationHandle) -> Phase {
        self.inner.entries.lock().iter().find(|e| e.notification.id == handle.id).map_or(Phase::Removed, |e| e.phase)
    }

    /// Currently shown notifications, oldest first.
    #[must_use]
    pub fn visible(&self) -> Vec<Notification> {
        self.inner.entries.lock().iter().filter(|e| e.phase == Phase::Visible).map(|e| e.notification.clone()).collect()
    }

    /// Removes everything and stops accepting new notifications.
    pub fn shutdown(&self) {
        let drained: Vec<Entry> = {
            let mut entries = self.inner.entries.lock();
            self.inner.closed.store(true, Ordering::Release);
            entries.drain(..).collect()
        };

        for entry in drained {
            if let Some(timer) = entry.timer {
                timer.abort();
            }
            // a dismissing entry is taken down by whoever is dismissing it
            if entry.phase == Phase::Visible {
                self.inner.display.remove(entry.notification.id);
            }
        }

        debug!("Notifier shut down");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Debug, Eq, PartialEq, Clone)]
    pub enum Event {
        Show(NotificationId, Severity, String),
        Remove(NotificationId),
    }

    #[derive(Default)]
    pub struct Recorder {
        pub events: Mutex<Vec<Event>>,
    }

    impl Recorder {
        pub fn shown(&self) -> Vec<(Severity, String)> {
            self.events
                .lock()
                .iter()
                .filter_map(|e| match e {
                    Event::Show(_, severity, message) => Some((*severity, message.clone())),
                    Event::Remove(_) => None,
                })
                .collect()
        }

        fn removals(&self, id: NotificationId) -> usize {
            self.events.lock().iter().filter(|e| **e == Event::Remove(id)).count()
        }
    }

    impl NotificationDisplay for Recorder {
        fn show(&self, notification: &Notification) {
            self.events.lock().push(Event::Show(notification.id, notification.severity, notification.message.clone()));
        }

        fn remove(&self, id: NotificationId) {
            self.events.lock().push(Event::Remove(id));
        }
    }

    fn notifier() -> (Notifier, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        (Notifier::init(recorder.clone(), DEFAULT_DURATION), recorder)
    }

    #[test]
    fn severity_styles() {
        assert_eq!(Severity::Success.icon(), "✓");
        assert_eq!(Severity::Error.class(), "notice-error");
        assert_eq!(Severity::Warning.to_string(), "warning");
    }

    #[tokio::test(start_paused = true)]
    async fn expires_after_duration() {
        let (notifier, recorder) = notifier();
        let handle = notifier.notify("Saved", Severity::Success);

        assert_eq!(notifier.phase(&handle), Phase::Visible);
        tokio::time::sleep(Duration::from_millis(4900)).await;
        assert_eq!(notifier.visible().len(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(notifier.visible().is_empty());
        assert_eq!(notifier.phase(&handle), Phase::Removed);
        assert_eq!(recorder.removals(handle.id()), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_is_idempotent_and_cancels_timer() {
        let (notifier, recorder) = notifier();
        let handle = notifier.notify("Oops", Severity::Error);

        assert!(notifier.dismiss(&handle));
        assert!(!notifier.dismiss(&handle));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(recorder.removals(handle.id()), 1);
        assert!(!notifier.dismiss(&handle));
    }

    #[tokio::test(start_paused = true)]
    async fn independent_timers() {
        let (notifier, _recorder) = notifier();
        let slow = notifier.notify_for("slow", Severity::Info, Duration::from_millis(3000));
        let fast = notifier.notify_for("fast", Severity::Warning, Duration::from_millis(1000));
        let other = notifier.notify_for("other", Severity::Info, Duration::from_millis(3000));

        assert_eq!(notifier.visible().iter().map(|n| n.message.as_str()).collect::<Vec<_>>(), vec!["slow", "fast", "other"]);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(notifier.phase(&fast), Phase::Removed);
        assert_eq!(notifier.phase(&slow), Phase::Visible);

        // dismissing one leaves the rest alone
        notifier.dismiss(&slow);
        assert_eq!(notifier.visible().iter().map(|n| n.id).collect::<Vec<_>>(), vec![other.id()]);
    }

    /// Reads the phase of the entry being taken down from inside `remove`.
    #[derive(Default)]
    struct PhaseWatcher {
        notifier: std::sync::OnceLock<Notifier>,
        seen: Mutex<Vec<Phase>>,
    }

    impl NotificationDisplay for PhaseWatcher {
        fn show(&self, _notification: &Notification) {}

        fn remove(&self, id: NotificationId) {
            if let Some(notifier) = self.notifier.get() {
                self.seen.lock().push(notifier.phase(&NotificationHandle { id }));
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn entry_is_dismissing_while_taken_down() {
        let watcher = Arc::new(PhaseWatcher::default());
        let notifier = Notifier::init(watcher.clone(), DEFAULT_DURATION);
        let _ = watcher.notifier.set(notifier.clone());

        let manual = notifier.notify("manual", Severity::Info);
        notifier.notify_for("timed", Severity::Info, Duration::from_millis(100));

        assert!(notifier.dismiss(&manual));
        assert_eq!(notifier.phase(&manual), Phase::Removed);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*watcher.seen.lock(), vec![Phase::Dismissing, Phase::Dismissing]);
        assert!(notifier.visible().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn nothing_survives_a_concurrent_shutdown() {
        for _ in 0..20 {
            let (notifier, recorder) = notifier();

            let producers: Vec<_> = (0..4)
                .map(|_| {
                    let notifier = notifier.clone();
                    tokio::spawn(async move {
                        for i in 0..200 {
                            notifier.notify(format!("n{i}"), Severity::Info);
                            if i % 16 == 0 {
                                tokio::task::yield_now().await;
                            }
                        }
                    })
                })
                .collect();

            tokio::task::yield_now().await;
            notifier.shutdown();

            for producer in producers {
                producer.await.unwrap();
            }

            assert!(notifier.visible().is_empty());

            let events = recorder.events.lock();
            for event in events.iter() {
                if let Event::Show(id, _, _) = event {
                    assert!(events.contains(&Event::Remove(*id)), "{id} left on screen after shutdown");
                }
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_clears_everything() {
        let (notifier, recorder) = notifier();
        let a = notifier.notify("a", Severity::Info);
        let b = notifier.notify("b", Severity::Info);

        notifier.shutdown();
        assert!(notifier.visible().is_empty());
        assert_eq!(recorder.removals(a.id()), 1);
        assert_eq!(recorder.removals(b.id()), 1);

        let late = notifier.notify("late", Severity::Info);
        assert_eq!(notifier.phase(&late), Phase::Removed);
        assert_eq!(recorder.shown().len(), 2);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(recorder.removals(a.id()), 1);
    }
}
