use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::AuthResult;

pub const DEFAULT_VISIBILITY_MS: u64 = 3_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Error,
    Result,
}

/// Message for the host UI. How it is displayed (toast, alert, log line)
/// is up to the host; `visible_for_ms` is only a hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub visible_for_ms: u64,
    pub emitted_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            description: None,
            visible_for_ms: DEFAULT_VISIBILITY_MS,
            emitted_at: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_visibility(mut self, visible_for: Duration) -> Self {
        self.visible_for_ms = u64::try_from(visible_for.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn visible_for(&self) -> Duration {
        Duration::from_millis(self.visible_for_ms)
    }

    pub fn for_result(result: &AuthResult) -> Self {
        if result.success {
            let tier = result
                .tier_used
                .map(|tier| tier.as_str())
                .unwrap_or("unknown");
            let suffix = if result.fallback_used {
                " (with fallback)"
            } else {
                ""
            };
            return Self::new(NotificationKind::Result, "Authenticated")
                .with_description(format!("Authenticated with {tier} biometrics{suffix}"));
        }

        Self::new(NotificationKind::Result, "Authentication failed").with_description(format!(
            "Error: {}\nCode: {}",
            result
                .error_message
                .as_deref()
                .unwrap_or("authentication failed"),
            result.error_code.as_deref().unwrap_or("N/A")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BiometricTier;

    #[test]
    fn result_notification_describes_tier_and_fallback() {
        let notification = Notification::for_result(&AuthResult::success(BiometricTier::Weak, true));
        assert_eq!(notification.kind, NotificationKind::Result);
        assert_eq!(
            notification.description.as_deref(),
            Some("Authenticated with weak biometrics (with fallback)")
        );
    }

    #[test]
    fn failed_result_notification_falls_back_to_na_code() {
        let notification = Notification::for_result(&AuthResult::failure("Face not recognized", None));
        assert_eq!(notification.message, "Authentication failed");
        assert_eq!(
            notification.description.as_deref(),
            Some("Error: Face not recognized\nCode: N/A")
        );
    }

    #[test]
    fn default_visibility_matches_toast_duration() {
        let notification = Notification::info("hello");
        assert_eq!(notification.visible_for(), Duration::from_secs(3));
        let longer = notification.with_visibility(Duration::from_secs(5));
        assert_eq!(longer.visible_for_ms, 5_000);
    }
}
