use std::collections::HashMap;

use sotah_bus::Listener;
use tokio::sync::Mutex;
use tracing::info;

/// Registry of running subject listeners, keyed by subject name
/// (spec.md Section 4.8, `Listeners`).
#[derive(Default)]
pub struct Listeners {
    entries: Mutex<HashMap<String, Listener>>,
}

impl Listeners {
    pub fn new() -> Self {
        Listeners {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a started listener. Replacing an existing entry for the
    /// same subject stops the prior one first.
    pub async fn add(&self, subject: impl Into<String>, listener: Listener) {
        let subject = subject.into();
        let previous = self.entries.lock().await.insert(subject.clone(), listener);
        if let Some(previous) = previous {
            previous.stop().await;
        }
    }

    /// Signals and awaits every registered listener, in no particular
    /// order (spec.md Section 4.8, `Stop`).
    pub async fn stop_all(&self) {
        let entries = std::mem::take(&mut *self.entries.lock().await);
        let count = entries.len();
        for (subject, listener) in entries {
            listener.stop().await;
            info!(subject, "listener stopped");
        }
        info!(count, "all listeners stopped");
    }
}
