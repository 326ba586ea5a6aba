use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::AuthResult;

/// Stable codes for failures that originate inside the orchestrator rather
/// than the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    TierUnavailable,
    Busy,
    NoSensor,
    ProviderFault,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::TierUnavailable => "tier_unavailable",
            ErrorCode::Busy => "busy",
            ErrorCode::NoSensor => "no_sensor",
            ErrorCode::ProviderFault => "provider_fault",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "tier_unavailable" => Some(ErrorCode::TierUnavailable),
            "busy" => Some(ErrorCode::Busy),
            "no_sensor" => Some(ErrorCode::NoSensor),
            "provider_fault" => Some(ErrorCode::ProviderFault),
            _ => None,
        }
    }
}

/// Why an authentication result failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Unavailable,
    Busy,
    NoSensor,
    ProviderFault,
    UserCancelled,
    AuthenticationDenied,
}

/// Maps a failed result onto the failure taxonomy. Returns `None` for
/// successful results.
pub fn classify_failure(result: &AuthResult) -> Option<FailureKind> {
    if result.success {
        return None;
    }

    if let Some(code) = result.error_code.as_deref() {
        if let Some(known) = ErrorCode::from_code(code) {
            return Some(match known {
                ErrorCode::TierUnavailable => FailureKind::Unavailable,
                ErrorCode::Busy => FailureKind::Busy,
                ErrorCode::NoSensor => FailureKind::NoSensor,
                ErrorCode::ProviderFault => FailureKind::ProviderFault,
            });
        }
    }

    let haystack = format!(
        "{} {}",
        result.error_code.as_deref().unwrap_or_default(),
        result.error_message.as_deref().unwrap_or_default()
    )
    .to_ascii_lowercase();

    if haystack.contains("cancel") || haystack.contains("negative_button") {
        Some(FailureKind::UserCancelled)
    } else {
        Some(FailureKind::AuthenticationDenied)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {what}: '{value}'")]
pub struct ParseEnumError {
    pub what: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(what: &'static str, value: impl Into<String>) -> Self {
        Self {
            what,
            value: value.into(),
        }
    }
}
