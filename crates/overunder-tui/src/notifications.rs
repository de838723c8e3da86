// Transient toast notifications shown over the dashboard.

use std::time::{Duration, Instant};

/// How long a toast stays up unless told otherwise.
pub const DEFAULT_DURATION: Duration = Duration::from_secs(5);

/// Most toasts kept on screen at once; older ones are dropped first.
const MAX_VISIBLE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationKind {
    pub fn title(self) -> &'static str {
        match self {
            NotificationKind::Success => "Success",
            NotificationKind::Error => "Error",
            NotificationKind::Warning => "Warning",
            NotificationKind::Info => "Info",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    shown_at: Instant,
    /// Zero means the toast stays until cleared.
    duration: Duration,
}

impl Notification {
    pub fn is_expired(&self, now: Instant) -> bool {
        !self.duration.is_zero() && now.saturating_duration_since(self.shown_at) >= self.duration
    }
}

/// Toast stack, newest last.
#[derive(Debug, Default)]
pub struct Notifications {
    items: Vec<Notification>,
}

impl Notifications {
    pub fn show(&mut self, message: impl Into<String>, kind: NotificationKind, duration: Duration) {
        self.show_at(message, kind, duration, Instant::now());
    }

    pub fn show_at(
        &mut self,
        message: impl Into<String>,
        kind: NotificationKind,
        duration: Duration,
        now: Instant,
    ) {
        self.items.push(Notification {
            message: message.into(),
            kind,
            shown_at: now,
            duration,
        });
        if self.items.len() > MAX_VISIBLE {
            let excess = self.items.len() - MAX_VISIBLE;
            self.items.drain(..excess);
        }
    }

    /// Drop every toast whose duration has elapsed.
    pub fn prune(&mut self, now: Instant) {
        self.items.retain(|n| !n.is_expired(now));
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
