use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ParseEnumError;

/// Identifies one orchestration session for the lifetime of its host process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Device-defined biometric security class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiometricTier {
    /// Spoof-resistant sensors such as fingerprint or iris.
    Strong,
    /// Less robust modalities such as camera-based face unlock.
    Weak,
}

impl BiometricTier {
    pub const ALL: [BiometricTier; 2] = [BiometricTier::Strong, BiometricTier::Weak];

    pub fn as_str(self) -> &'static str {
        match self {
            BiometricTier::Strong => "strong",
            BiometricTier::Weak => "weak",
        }
    }
}

impl fmt::Display for BiometricTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BiometricTier {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strong" => Ok(BiometricTier::Strong),
            "weak" => Ok(BiometricTier::Weak),
            other => Err(ParseEnumError::new("biometric tier", other)),
        }
    }
}

/// Order in which best-effort authentication walks the tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierOrder {
    #[default]
    StrongFirst,
    WeakFirst,
}

impl TierOrder {
    pub fn tiers(self) -> [BiometricTier; 2] {
        match self {
            TierOrder::StrongFirst => [BiometricTier::Strong, BiometricTier::Weak],
            TierOrder::WeakFirst => [BiometricTier::Weak, BiometricTier::Strong],
        }
    }
}

impl FromStr for TierOrder {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "strong_first" => Ok(TierOrder::StrongFirst),
            "weak_first" => Ok(TierOrder::WeakFirst),
            other => Err(ParseEnumError::new("tier order", other)),
        }
    }
}

/// Immutable snapshot produced by probing one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorCapability {
    pub tier: BiometricTier,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biometry_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SensorCapability {
    pub fn available(tier: BiometricTier, biometry_type: Option<String>) -> Self {
        Self {
            tier,
            available: true,
            biometry_type,
            error: None,
        }
    }

    pub fn unavailable(tier: BiometricTier) -> Self {
        Self {
            tier,
            available: false,
            biometry_type: None,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// The pair of per-tier snapshots from one capability refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorCapabilities {
    pub strong: SensorCapability,
    pub weak: SensorCapability,
}

impl SensorCapabilities {
    pub fn unavailable() -> Self {
        Self {
            strong: SensorCapability::unavailable(BiometricTier::Strong),
            weak: SensorCapability::unavailable(BiometricTier::Weak),
        }
    }

    pub fn get(&self, tier: BiometricTier) -> &SensorCapability {
        match tier {
            BiometricTier::Strong => &self.strong,
            BiometricTier::Weak => &self.weak,
        }
    }

    pub fn set(&mut self, capability: SensorCapability) {
        match capability.tier {
            BiometricTier::Strong => self.strong = capability,
            BiometricTier::Weak => self.weak = capability,
        }
    }

    pub fn is_available(&self, tier: BiometricTier) -> bool {
        self.get(tier).available
    }

    pub fn any_available(&self) -> bool {
        self.strong.available || self.weak.available
    }
}

impl Default for SensorCapabilities {
    fn default() -> Self {
        Self::unavailable()
    }
}

/// Input to one authentication call. Prompt strings are passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthAttemptOptions {
    pub tier: BiometricTier,
    pub prompt_title: String,
    pub prompt_subtitle: String,
    pub prompt_description: String,
    pub cancel_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_label: Option<String>,
    pub allow_device_credentials: bool,
    pub disable_fallback: bool,
}

impl AuthAttemptOptions {
    pub fn new(tier: BiometricTier, prompt_title: impl Into<String>) -> Self {
        Self {
            tier,
            prompt_title: prompt_title.into(),
            prompt_subtitle: String::new(),
            prompt_description: String::new(),
            cancel_label: "Cancel".to_string(),
            fallback_label: None,
            allow_device_credentials: false,
            disable_fallback: false,
        }
    }

    pub fn face_unlock() -> Self {
        Self {
            prompt_subtitle: "Look at the camera to authenticate".to_string(),
            prompt_description: "Using face recognition".to_string(),
            allow_device_credentials: true,
            ..Self::new(BiometricTier::Weak, "Face Unlock")
        }
    }

    pub fn fingerprint() -> Self {
        Self {
            prompt_subtitle: "Place your finger on the sensor".to_string(),
            prompt_description: "Fingerprint authentication".to_string(),
            allow_device_credentials: true,
            ..Self::new(BiometricTier::Strong, "Fingerprint")
        }
    }

    pub fn any_biometric() -> Self {
        Self {
            prompt_subtitle: "Use your fingerprint or face".to_string(),
            prompt_description: "Authenticate with any available method".to_string(),
            fallback_label: Some("Use password".to_string()),
            allow_device_credentials: true,
            disable_fallback: false,
            ..Self::new(BiometricTier::Strong, "Biometric Authentication")
        }
    }

    /// Copy of these options targeted at `tier`.
    pub fn with_tier(&self, tier: BiometricTier) -> Self {
        Self {
            tier,
            ..self.clone()
        }
    }
}

/// Outcome of one authentication attempt.
///
/// A successful result always names the tier that satisfied it; a failed
/// result never does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier_used: Option<BiometricTier>,
    #[serde(default)]
    pub fallback_used: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl AuthResult {
    pub fn success(tier: BiometricTier, fallback_used: bool) -> Self {
        Self {
            success: true,
            tier_used: Some(tier),
            fallback_used,
            error_message: None,
            error_code: None,
        }
    }

    pub fn failure(message: impl Into<String>, code: Option<String>) -> Self {
        Self {
            success: false,
            tier_used: None,
            fallback_used: false,
            error_message: Some(message.into()),
            error_code: code,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.success == self.tier_used.is_some()
    }

    /// Restores the success/tier invariant for a result produced by an
    /// attempt at `attempted`. Well-formed results come back unchanged.
    pub fn normalized_for(mut self, attempted: BiometricTier) -> Self {
        if self.success && self.tier_used.is_none() {
            self.tier_used = Some(attempted);
        } else if !self.success {
            self.tier_used = None;
        }
        self
    }
}

/// Observable phase of an orchestration session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorState {
    Idle,
    CapabilitiesKnown,
    Authenticating,
}
