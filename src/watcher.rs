//! Polls the config file and reports settled changes to the controller

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::presenter::ControllerEvent;

/// What we compare between polls; `None` when the file is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    modified: Option<SystemTime>,
    len: u64,
}

fn fingerprint(path: &Path) -> Option<Fingerprint> {
    let metadata = std::fs::metadata(path).ok()?;
    Some(Fingerprint {
        modified: metadata.modified().ok(),
        len: metadata.len(),
    })
}

/// Tracks the reported fingerprint and a pending one waiting to settle
#[derive(Debug)]
struct Debouncer {
    reported: Option<Fingerprint>,
    pending: Option<Option<Fingerprint>>,
}

impl Debouncer {
    fn new(initial: Option<Fingerprint>) -> Self {
        Self {
            reported: initial,
            pending: None,
        }
    }

    /// Feed one observation; true when a change has stayed put for a full interval
    fn observe(&mut self, current: Option<Fingerprint>) -> bool {
        if current == self.reported {
            self.pending = None;
            return false;
        }
        if self.pending == Some(current) {
            self.reported = current;
            self.pending = None;
            return true;
        }
        self.pending = Some(current);
        false
    }
}

pub struct ConfigWatcher {
    path: PathBuf,
    interval: Duration,
}

impl ConfigWatcher {
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            path: path.into(),
            interval,
        }
    }

    /// Start polling; the task ends when the receiver is dropped
    pub fn spawn(self, events: UnboundedSender<ControllerEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                path = %self.path.display(),
                interval_ms = self.interval.as_millis() as u64,
                "Watching config file"
            );
            let mut debouncer = Debouncer::new(fingerprint(&self.path));
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if !debouncer.observe(fingerprint(&self.path)) {
                    continue;
                }
                debug!(path = %self.path.display(), "Config file changed");
                if events.send(ControllerEvent::ConfigChanged).is_err() {
                    debug!("Controller gone, watcher exiting");
                    break;
                }
            }
        })
    }
}
