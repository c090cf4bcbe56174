//! Throttle for credential-failure notifications.
//!
//! An expired cookie would otherwise page the operator on every scheduled
//! run. Each account gets at most one notification per window; the
//! last-notified timestamps persist as JSON across runs, and a later
//! successful login clears the account's entry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use windfall_common::Clock;

const WINDOW_SECS: i64 = 6 * 3600;
const STATE_FILE: &str = "notify-state.json";

pub struct NotifyGate {
    path: PathBuf,
}

impl NotifyGate {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(STATE_FILE),
        }
    }

    /// Whether a failure notification for `account` may go out now. A `true`
    /// answer stamps the window immediately.
    pub async fn allow(&self, account: u32, clock: &dyn Clock) -> bool {
        let mut state = self.load().await;
        let now = clock.unix_now();
        let key = account.to_string();
        if let Some(last) = state.get(&key) {
            if now - last < WINDOW_SECS {
                tracing::debug!(account, "Failure already notified within the window");
                return false;
            }
        }
        state.insert(key, now);
        self.store(&state).await;
        true
    }

    /// A successful login resets the account's window.
    pub async fn clear(&self, account: u32) {
        let mut state = self.load().await;
        if state.remove(&account.to_string()).is_some() {
            self.store(&state).await;
        }
    }

    async fn load(&self) -> HashMap<String, i64> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                tracing::warn!(path = %self.path.display(), %err, "Notify state unreadable, resetting");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        }
    }

    async fn store(&self, state: &HashMap<String, i64>) {
        let raw = match serde_json::to_string(state) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::error!(%err, "Notify state serialization failed");
                return;
            }
        };
        if let Some(parent) = self.path.parent() {
            if let Err(err) = tokio::fs::create_dir_all(parent).await {
                tracing::error!(%err, "Notify state directory unavailable");
                return;
            }
        }
        if let Err(err) = tokio::fs::write(&self.path, raw).await {
            tracing::error!(path = %self.path.display(), %err, "Notify state write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use windfall_common::FixedClock;

    #[tokio::test]
    async fn one_notification_per_window_per_account() {
        let dir = tempfile::tempdir().unwrap();
        let gate = NotifyGate::new(dir.path());
        let clock = FixedClock::at_hour(10);

        assert!(gate.allow(1, &clock).await);
        assert!(!gate.allow(1, &clock).await);
        // a different account has its own window
        assert!(gate.allow(2, &clock).await);
    }

    #[tokio::test]
    async fn window_expiry_reopens_the_gate() {
        let dir = tempfile::tempdir().unwrap();
        let gate = NotifyGate::new(dir.path());
        let early = FixedClock {
            now: Utc::now(),
            hour: 8,
        };
        assert!(gate.allow(1, &early).await);

        let later = FixedClock {
            now: early.now + Duration::hours(7),
            hour: 15,
        };
        assert!(gate.allow(1, &later).await);
    }

    #[tokio::test]
    async fn success_clears_the_account_entry() {
        let dir = tempfile::tempdir().unwrap();
        let gate = NotifyGate::new(dir.path());
        let clock = FixedClock::at_hour(10);

        assert!(gate.allow(1, &clock).await);
        gate.clear(1).await;
        assert!(gate.allow(1, &clock).await);
    }

    #[tokio::test]
    async fn state_survives_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let clock = FixedClock::at_hour(10);
        {
            let gate = NotifyGate::new(dir.path());
            assert!(gate.allow(1, &clock).await);
        }
        let gate = NotifyGate::new(dir.path());
        assert!(!gate.allow(1, &clock).await);
    }
}
