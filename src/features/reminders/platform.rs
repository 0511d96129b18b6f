//! # Platform Notifier
//!
//! Boundary between the reminder engine and whatever surface actually shows
//! notifications, plays tones and vibrates. Hosts supply an implementation;
//! `HeadlessNotifier` covers environments with no notification support and
//! `RecordingNotifier` captures every call for tests.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Added close() so auto-dismiss and interaction routing can retract banners
//! - 1.0.0: Initial release

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::permission::PermissionState;

/// Everything a platform needs to display one notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    /// Same-tag notifications replace each other instead of stacking
    pub tag: String,
    pub icon: Option<String>,
    /// Stay on screen until the user acts on it
    pub require_interaction: bool,
    pub data: serde_json::Value,
}

/// Foreground banner shown inside the host regardless of permission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InAppAlert {
    pub tag: String,
    pub entity_id: String,
    pub title: String,
    pub body: String,
}

#[async_trait]
pub trait PlatformNotifier: Send + Sync {
    /// Whether the host has a notification API at all
    fn is_supported(&self) -> bool;

    /// Current permission without prompting the user
    fn query_permission(&self) -> PermissionState;

    /// Prompt the user for permission
    async fn request_permission(&self) -> Result<PermissionState>;

    fn show(&self, payload: &NotificationPayload) -> Result<()>;

    fn close(&self, tag: &str) -> Result<()>;

    /// Vibration pattern in milliseconds, alternating on/off
    fn vibrate(&self, pattern: &[u32]) -> Result<()>;

    fn play_tone(&self, frequency_hz: u32, duration: Duration) -> Result<()>;

    /// Whether the host UI is currently visible
    fn is_foreground(&self) -> bool;

    fn show_in_app_alert(&self, alert: &InAppAlert) -> Result<()>;
}

/// Environment without any notification surface.
///
/// Reports unsupported and turns every call into a no-op, so the engine keeps
/// scheduling and logging without a UI attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessNotifier;

#[async_trait]
impl PlatformNotifier for HeadlessNotifier {
    fn is_supported(&self) -> bool {
        false
    }

    fn query_permission(&self) -> PermissionState {
        PermissionState::Unsupported
    }

    async fn request_permission(&self) -> Result<PermissionState> {
        Ok(PermissionState::Unsupported)
    }

    fn show(&self, _payload: &NotificationPayload) -> Result<()> {
        Err(anyhow!("Notifications are not supported in this environment"))
    }

    fn close(&self, _tag: &str) -> Result<()> {
        Ok(())
    }

    fn vibrate(&self, _pattern: &[u32]) -> Result<()> {
        Err(anyhow!("Vibration is not supported in this environment"))
    }

    fn play_tone(&self, _frequency_hz: u32, _duration: Duration) -> Result<()> {
        Err(anyhow!("Audio is not supported in this environment"))
    }

    fn is_foreground(&self) -> bool {
        false
    }

    fn show_in_app_alert(&self, _alert: &InAppAlert) -> Result<()> {
        Ok(())
    }
}

/// Notifier that records every call, with switchable failure modes
#[derive(Debug)]
pub struct RecordingNotifier {
    supported: bool,
    answer: Mutex<PermissionState>,
    initial: PermissionState,
    foreground: AtomicBool,
    fail_tone: AtomicBool,
    fail_vibrate: AtomicBool,
    prompts: AtomicUsize,
    shown: Mutex<Vec<NotificationPayload>>,
    closed: Mutex<Vec<String>>,
    alerts: Mutex<Vec<InAppAlert>>,
    tones: AtomicUsize,
    vibrations: Mutex<Vec<Vec<u32>>>,
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingNotifier {
    /// Supported platform whose prompt grants permission; starts unknown and foreground
    pub fn new() -> Self {
        RecordingNotifier {
            supported: true,
            answer: Mutex::new(PermissionState::Granted),
            initial: PermissionState::Unknown,
            foreground: AtomicBool::new(true),
            fail_tone: AtomicBool::new(false),
            fail_vibrate: AtomicBool::new(false),
            prompts: AtomicUsize::new(0),
            shown: Mutex::new(Vec::new()),
            closed: Mutex::new(Vec::new()),
            alerts: Mutex::new(Vec::new()),
            tones: AtomicUsize::new(0),
            vibrations: Mutex::new(Vec::new()),
        }
    }

    /// Platform with no notification API
    pub fn unsupported() -> Self {
        RecordingNotifier {
            supported: false,
            initial: PermissionState::Unsupported,
            ..Self::new()
        }
    }

    /// Platform where permission was already granted before startup
    pub fn pre_granted() -> Self {
        RecordingNotifier {
            initial: PermissionState::Granted,
            ..Self::new()
        }
    }

    pub fn answer_prompt_with(&self, state: PermissionState) {
        if let Ok(mut answer) = self.answer.lock() {
            *answer = state;
        }
    }

    pub fn set_foreground(&self, foreground: bool) {
        self.foreground.store(foreground, Ordering::SeqCst);
    }

    pub fn fail_tone(&self, fail: bool) {
        self.fail_tone.store(fail, Ordering::SeqCst);
    }

    pub fn fail_vibrate(&self, fail: bool) {
        self.fail_vibrate.store(fail, Ordering::SeqCst);
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    pub fn shown(&self) -> Vec<NotificationPayload> {
        self.shown.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn closed(&self) -> Vec<String> {
        self.closed.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn alerts(&self) -> Vec<InAppAlert> {
        self.alerts.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn tone_count(&self) -> usize {
        self.tones.load(Ordering::SeqCst)
    }

    pub fn vibrations(&self) -> Vec<Vec<u32>> {
        self.vibrations.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PlatformNotifier for RecordingNotifier {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn query_permission(&self) -> PermissionState {
        self.initial
    }

    async fn request_permission(&self) -> Result<PermissionState> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        self.answer
            .lock()
            .map(|answer| *answer)
            .map_err(|_| anyhow!("permission answer lock poisoned"))
    }

    fn show(&self, payload: &NotificationPayload) -> Result<()> {
        if !self.supported {
            return Err(anyhow!("Notifications are not supported"));
        }
        self.shown
            .lock()
            .map_err(|_| anyhow!("shown lock poisoned"))?
            .push(payload.clone());
        Ok(())
    }

    fn close(&self, tag: &str) -> Result<()> {
        self.closed
            .lock()
            .map_err(|_| anyhow!("closed lock poisoned"))?
            .push(tag.to_string());
        Ok(())
    }

    fn vibrate(&self, pattern: &[u32]) -> Result<()> {
        if self.fail_vibrate.load(Ordering::SeqCst) {
            return Err(anyhow!("Vibration API unavailable"));
        }
        self.vibrations
            .lock()
            .map_err(|_| anyhow!("vibrations lock poisoned"))?
            .push(pattern.to_vec());
        Ok(())
    }

    fn play_tone(&self, _frequency_hz: u32, _duration: Duration) -> Result<()> {
        if self.fail_tone.load(Ordering::SeqCst) {
            return Err(anyhow!("Audio context creation failed"));
        }
        self.tones.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_foreground(&self) -> bool {
        self.foreground.load(Ordering::SeqCst)
    }

    fn show_in_app_alert(&self, alert: &InAppAlert) -> Result<()> {
        self.alerts
            .lock()
            .map_err(|_| anyhow!("alerts lock poisoned"))?
            .push(alert.clone());
        Ok(())
    }
}
