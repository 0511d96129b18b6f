//! # Dispatcher
//!
//! Surfaces a fired reminder: platform notification when permitted, an in-app
//! alert whenever the host is in the foreground, plus an optional tone and
//! vibration. Every platform call is best-effort; a failure is logged and the
//! remaining channels still run.
//!
//! - **Version**: 1.2.1
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.1: Auto-dismiss only closes the notification instance it was armed for
//! - 1.2.0: DispatchReport returned for the test-notification path
//! - 1.1.0: Auto-dismiss of platform notifications
//! - 1.0.0: Initial release

use dashmap::DashMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::permission::PermissionGate;
use super::platform::{InAppAlert, NotificationPayload, PlatformNotifier};
use super::registry::ReminderTarget;
use super::settings::SettingsStore;

pub const TONE_FREQUENCY_HZ: u32 = 880;
pub const TONE_DURATION: Duration = Duration::from_millis(200);
pub const VIBRATION_PATTERN: [u32; 3] = [200, 100, 200];
pub const NOTIFICATION_ICON: &str = "/icons/reminder-192.png";

/// What a single dispatch actually managed to do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    /// Settings master switch was off; nothing was attempted
    pub suppressed: bool,
    pub notification_shown: bool,
    pub in_app_alert: bool,
    pub tone_played: bool,
    pub vibrated: bool,
}

impl DispatchReport {
    /// True when the user saw something
    pub fn visible(&self) -> bool {
        self.notification_shown || self.in_app_alert
    }
}

/// What the user did with a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum NotificationAction {
    /// Clicked the notification body
    Open,
    Snooze { minutes: u32 },
    Dismiss,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub tag: String,
    pub entity_id: String,
    pub action: NotificationAction,
}

/// Where an interaction leads once the notification is closed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Navigate to the entity's completion view
    OpenCompletion { entity_id: String },
    Snooze { entity_id: String, minutes: u32 },
    Dismissed,
}

/// Path of the completion view for an entity
pub fn completion_url(entity_id: &str) -> String {
    format!("/habits/{entity_id}/complete")
}

pub struct Dispatcher {
    notifier: Arc<dyn PlatformNotifier>,
    permission: Arc<PermissionGate>,
    settings: Arc<SettingsStore>,
    auto_dismiss: Duration,
    /// Notification id currently on screen for each tag
    showing: Arc<DashMap<String, String>>,
}

impl Dispatcher {
    pub fn new(
        notifier: Arc<dyn PlatformNotifier>,
        permission: Arc<PermissionGate>,
        settings: Arc<SettingsStore>,
        auto_dismiss: Duration,
    ) -> Self {
        Dispatcher {
            notifier,
            permission,
            settings,
            auto_dismiss,
            showing: Arc::new(DashMap::new()),
        }
    }

    /// Show a fired reminder on every channel that is enabled and available
    pub fn dispatch(&self, target: &ReminderTarget) -> DispatchReport {
        let settings = self.settings.get();
        let mut report = DispatchReport::default();

        if !settings.enabled {
            debug!("Notifications disabled; suppressing {}", target.key);
            report.suppressed = true;
            return report;
        }

        let notification_id = uuid::Uuid::new_v4().to_string();
        let payload = Self::payload(target, &notification_id);

        if self.permission.status().is_granted() {
            match self.notifier.show(&payload) {
                Ok(()) => {
                    report.notification_shown = true;
                    self.showing.insert(payload.tag.clone(), notification_id.clone());
                    self.schedule_auto_dismiss(&payload.tag, &notification_id);
                }
                Err(e) => warn!("Failed to show notification for {}: {e}", target.key),
            }
        }

        if self.notifier.is_foreground() {
            let alert = InAppAlert {
                tag: payload.tag.clone(),
                entity_id: target.entity_id.clone(),
                title: payload.title.clone(),
                body: payload.body.clone(),
            };
            match self.notifier.show_in_app_alert(&alert) {
                Ok(()) => report.in_app_alert = true,
                Err(e) => warn!("Failed to show in-app alert for {}: {e}", target.key),
            }
        }

        if settings.sound {
            match self.notifier.play_tone(TONE_FREQUENCY_HZ, TONE_DURATION) {
                Ok(()) => report.tone_played = true,
                Err(e) => warn!("Could not play reminder tone: {e}"),
            }
        }

        if settings.vibration {
            match self.notifier.vibrate(&VIBRATION_PATTERN) {
                Ok(()) => report.vibrated = true,
                Err(e) => debug!("Vibration unavailable: {e}"),
            }
        }

        info!(
            "🔔 Dispatched {} ({}) notification={} alert={}",
            target.key, target.entity_title, report.notification_shown, report.in_app_alert
        );
        report
    }

    /// Close the notification and decide where the interaction leads
    pub fn route(&self, interaction: &Interaction) -> Route {
        self.close(&interaction.tag);

        match &interaction.action {
            NotificationAction::Open => Route::OpenCompletion {
                entity_id: interaction.entity_id.clone(),
            },
            NotificationAction::Snooze { minutes } => Route::Snooze {
                entity_id: interaction.entity_id.clone(),
                minutes: *minutes,
            },
            NotificationAction::Dismiss => Route::Dismissed,
        }
    }

    pub fn close(&self, tag: &str) {
        self.showing.remove(tag);
        if let Err(e) = self.notifier.close(tag) {
            warn!("Failed to close notification {tag}: {e}");
        }
    }

    fn payload(target: &ReminderTarget, notification_id: &str) -> NotificationPayload {
        let body = target
            .rule
            .custom_message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Time for {}!", target.entity_title));

        NotificationPayload {
            title: format!("⏰ {}", target.entity_title),
            body,
            tag: target.key.to_string(),
            icon: Some(NOTIFICATION_ICON.to_string()),
            require_interaction: true,
            data: serde_json::json!({
                "notificationId": notification_id,
                "entityId": target.entity_id,
                "key": target.key.as_str(),
                "url": completion_url(&target.entity_id),
            }),
        }
    }

    /// Close `tag` after the delay unless it was replaced or closed meanwhile
    fn schedule_auto_dismiss(&self, tag: &str, notification_id: &str) {
        if self.auto_dismiss.is_zero() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No runtime available; {tag} will not auto-dismiss");
            return;
        };

        let notifier = self.notifier.clone();
        let showing = self.showing.clone();
        let tag = tag.to_string();
        let notification_id = notification_id.to_string();
        let delay = self.auto_dismiss;
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if showing.remove_if(&tag, |_, current| *current == notification_id).is_none() {
                debug!("{tag} was replaced or closed; skipping auto-dismiss");
                return;
            }
            if let Err(e) = notifier.close(&tag) {
                warn!("Failed to auto-dismiss notification {tag}: {e}");
            }
        });
    }
}
