//! # Permission Gate
//!
//! Caches the platform's notification permission. The state is read on every
//! dispatch and only refreshed by an explicit request, never polled.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock};

use super::platform::PlatformNotifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Unknown,
    Granted,
    Denied,
    /// The host has no notification API; treated like `Denied` by the dispatcher
    Unsupported,
}

impl PermissionState {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionState::Granted)
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionState::Unknown => write!(f, "unknown"),
            PermissionState::Granted => write!(f, "granted"),
            PermissionState::Denied => write!(f, "denied"),
            PermissionState::Unsupported => write!(f, "unsupported"),
        }
    }
}

pub struct PermissionGate {
    notifier: Arc<dyn PlatformNotifier>,
    state: RwLock<PermissionState>,
}

impl PermissionGate {
    /// Seed the cache from the platform once, without prompting
    pub fn new(notifier: Arc<dyn PlatformNotifier>) -> Self {
        let initial = if notifier.is_supported() {
            notifier.query_permission()
        } else {
            PermissionState::Unsupported
        };

        PermissionGate {
            notifier,
            state: RwLock::new(initial),
        }
    }

    pub fn status(&self) -> PermissionState {
        match self.state.read() {
            Ok(state) => *state,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Ask for permission unless it is already granted.
    ///
    /// Returns whether notifications may be shown. Platform errors are logged and
    /// cached as `Denied` so the caller can retry later.
    pub async fn request_permission(&self) -> bool {
        match self.status() {
            PermissionState::Granted => return true,
            PermissionState::Unsupported => {
                info!("Notifications unsupported here; using in-app alerts only");
                return false;
            }
            PermissionState::Unknown | PermissionState::Denied => {}
        }

        let answer = match self.notifier.request_permission().await {
            Ok(state) => state,
            Err(e) => {
                warn!("Notification permission request failed: {e}");
                PermissionState::Denied
            }
        };

        // A prompt never reports "unknown" back; treat it as a refusal
        let answer = match answer {
            PermissionState::Unknown => PermissionState::Denied,
            other => other,
        };

        self.set(answer);
        info!("Notification permission is now {answer}");
        answer.is_granted()
    }

    fn set(&self, value: PermissionState) {
        match self.state.write() {
            Ok(mut state) => *state = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reminders::platform::RecordingNotifier;

    #[tokio::test]
    async fn test_granted_prompt_is_cached() {
        let notifier = Arc::new(RecordingNotifier::new());
        let gate = PermissionGate::new(notifier.clone());
        assert_eq!(gate.status(), PermissionState::Unknown);

        assert!(gate.request_permission().await);
        assert!(gate.request_permission().await);
        assert_eq!(gate.status(), PermissionState::Granted);
        assert_eq!(notifier.prompt_count(), 1);
    }

    #[tokio::test]
    async fn test_pre_granted_never_prompts() {
        let notifier = Arc::new(RecordingNotifier::pre_granted());
        let gate = PermissionGate::new(notifier.clone());

        assert!(gate.request_permission().await);
        assert_eq!(notifier.prompt_count(), 0);
    }

    #[tokio::test]
    async fn test_denied_can_be_retried() {
        let notifier = Arc::new(RecordingNotifier::new());
        notifier.answer_prompt_with(PermissionState::Denied);
        let gate = PermissionGate::new(notifier.clone());

        assert!(!gate.request_permission().await);
        assert_eq!(gate.status(), PermissionState::Denied);

        notifier.answer_prompt_with(PermissionState::Granted);
        assert!(gate.request_permission().await);
        assert_eq!(notifier.prompt_count(), 2);
    }

    #[tokio::test]
    async fn test_unsupported_reports_without_prompting() {
        let notifier = Arc::new(RecordingNotifier::unsupported());
        let gate = PermissionGate::new(notifier.clone());

        assert_eq!(gate.status(), PermissionState::Unsupported);
        assert!(!gate.request_permission().await);
        assert_eq!(notifier.prompt_count(), 0);
    }

    #[test]
    fn test_status_has_no_side_effects() {
        let notifier = Arc::new(RecordingNotifier::new());
        let gate = PermissionGate::new(notifier.clone());
        let _ = gate.status();
        let _ = gate.status();
        assert_eq!(notifier.prompt_count(), 0);
    }
}
