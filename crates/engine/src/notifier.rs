//! Notification sinks
//!
//! Fire-and-forget: a notifier never fails and never retries. Notices live
//! only as long as whoever displays them keeps them.

use mirror_core::{Notice, NotificationConfig, Severity};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{error, info};

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice)
    }
}

/// Writes notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Error => error!("{}: {}", notice.title, notice.description),
            Severity::Success | Severity::Info => info!("{}: {}", notice.title, notice.description),
        }
    }
}

/// Fans notices out to any number of UI subscribers
#[derive(Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notice>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, notice: Notice) {
        // No subscribers is fine; the notice simply has no audience
        let _ = self.tx.send(notice);
    }
}

/// Applies the user's notification preferences before forwarding
pub struct FilteredNotifier<N> {
    inner: N,
    config: RwLock<NotificationConfig>,
}

impl<N: Notifier> FilteredNotifier<N> {
    pub fn new(inner: N, config: NotificationConfig) -> Self {
        Self {
            inner,
            config: RwLock::new(config),
        }
    }

    pub fn set_config(&self, config: NotificationConfig) {
        if let Ok(mut guard) = self.config.write() {
            *guard = config;
        }
    }

    pub fn config(&self) -> NotificationConfig {
        self.config
            .read()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

impl<N: Notifier> Notifier for FilteredNotifier<N> {
    fn notify(&self, notice: Notice) {
        let cfg = self.config();
        if !cfg.enabled {
            return;
        }
        if notice.severity == Severity::Success && !cfg.show_success {
            return;
        }
        self.inner.notify(notice);
    }
}
