//! Configurable stand-in for the native biometric sensor stack.

use std::{
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::Duration,
};

use anyhow::anyhow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::domain::{AuthAttemptOptions, AuthResult, BiometricTier, SensorCapability};
use tokio::sync::RwLock;
use tracing::debug;

use crate::BiometricProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulatedOutcome {
    #[default]
    Succeed,
    /// Succeeds through the device PIN/pattern when the attempt allows it.
    DeviceCredential,
    Deny,
    Cancel,
    /// The platform rejects the call outright.
    Fault,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierProfile {
    pub available: bool,
    pub biometry_type: Option<String>,
    pub outcome: SimulatedOutcome,
    pub probe_fault: bool,
}

impl Default for TierProfile {
    fn default() -> Self {
        Self {
            available: true,
            biometry_type: None,
            outcome: SimulatedOutcome::Succeed,
            probe_fault: false,
        }
    }
}

impl TierProfile {
    pub fn absent() -> Self {
        Self {
            available: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceProfile {
    pub strong: TierProfile,
    pub weak: TierProfile,
    pub prompt_latency_ms: u64,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            strong: TierProfile {
                biometry_type: Some("fingerprint".to_string()),
                ..TierProfile::default()
            },
            weak: TierProfile {
                biometry_type: Some("face".to_string()),
                ..TierProfile::default()
            },
            prompt_latency_ms: 0,
        }
    }
}

impl DeviceProfile {
    pub fn tier(&self, tier: BiometricTier) -> &TierProfile {
        match tier {
            BiometricTier::Strong => &self.strong,
            BiometricTier::Weak => &self.weak,
        }
    }
}

pub struct SimulatedProvider {
    profile: RwLock<DeviceProfile>,
    debug_mode: AtomicBool,
    probe_calls: AtomicUsize,
    authenticate_calls: AtomicUsize,
}

impl SimulatedProvider {
    pub fn new(profile: DeviceProfile) -> Self {
        Self {
            profile: RwLock::new(profile),
            debug_mode: AtomicBool::new(false),
            probe_calls: AtomicUsize::new(0),
            authenticate_calls: AtomicUsize::new(0),
        }
    }

    pub async fn replace_profile(&self, profile: DeviceProfile) {
        *self.profile.write().await = profile;
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode.load(Ordering::SeqCst)
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn authenticate_calls(&self) -> usize {
        self.authenticate_calls.load(Ordering::SeqCst)
    }
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new(DeviceProfile::default())
    }
}

#[async_trait]
impl BiometricProvider for SimulatedProvider {
    async fn probe(&self, tier: BiometricTier) -> anyhow::Result<SensorCapability> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        let profile = self.profile.read().await;
        let tier_profile = profile.tier(tier);

        if tier_profile.probe_fault {
            return Err(anyhow!("biometric manager unavailable for {tier} tier"));
        }

        if tier_profile.available {
            Ok(SensorCapability::available(
                tier,
                tier_profile.biometry_type.clone(),
            ))
        } else {
            Ok(SensorCapability::unavailable(tier).with_error("No biometrics enrolled"))
        }
    }

    async fn authenticate(&self, options: AuthAttemptOptions) -> anyhow::Result<AuthResult> {
        self.authenticate_calls.fetch_add(1, Ordering::SeqCst);
        let (tier_profile, latency) = {
            let profile = self.profile.read().await;
            (
                profile.tier(options.tier).clone(),
                Duration::from_millis(profile.prompt_latency_ms),
            )
        };

        if self.debug_mode() {
            debug!(tier = %options.tier, outcome = ?tier_profile.outcome, "simulated prompt shown");
        }

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if !tier_profile.available {
            return Ok(AuthResult::failure(
                "No biometric sensor enrolled",
                Some("NOT_ENROLLED".to_string()),
            ));
        }

        match tier_profile.outcome {
            SimulatedOutcome::Succeed => Ok(AuthResult::success(options.tier, false)),
            SimulatedOutcome::DeviceCredential => {
                if options.allow_device_credentials && !options.disable_fallback {
                    Ok(AuthResult::success(options.tier, true))
                } else {
                    Ok(AuthResult::failure(
                        "Device credential fallback is disabled",
                        Some("FALLBACK_DISABLED".to_string()),
                    ))
                }
            }
            SimulatedOutcome::Deny => Ok(AuthResult::failure(
                "Biometric not recognized",
                Some("AUTHENTICATION_FAILED".to_string()),
            )),
            SimulatedOutcome::Cancel => Ok(AuthResult::failure(
                "Authentication cancelled by user",
                Some("USER_CANCELED".to_string()),
            )),
            SimulatedOutcome::Fault => Err(anyhow!("biometric hardware fault")),
        }
    }

    async fn set_debug_mode(&self, enabled: bool) -> anyhow::Result<()> {
        self.debug_mode.store(enabled, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn probe_reports_absent_sensor_without_error() {
        let provider = SimulatedProvider::new(DeviceProfile {
            weak: TierProfile::absent(),
            ..DeviceProfile::default()
        });

        let strong = provider.probe(BiometricTier::Strong).await.expect("strong");
        assert!(strong.available);
        assert_eq!(strong.biometry_type.as_deref(), Some("fingerprint"));

        let weak = provider.probe(BiometricTier::Weak).await.expect("weak");
        assert!(!weak.available);
        assert_eq!(weak.error.as_deref(), Some("No biometrics enrolled"));
        assert_eq!(provider.probe_calls(), 2);
    }

    #[tokio::test]
    async fn probe_fault_is_an_error() {
        let provider = SimulatedProvider::new(DeviceProfile {
            strong: TierProfile {
                probe_fault: true,
                ..TierProfile::default()
            },
            ..DeviceProfile::default()
        });

        assert!(provider.probe(BiometricTier::Strong).await.is_err());
        assert!(provider.probe(BiometricTier::Weak).await.is_ok());
    }

    #[tokio::test]
    async fn device_credential_outcome_respects_fallback_flags() {
        let provider = SimulatedProvider::new(DeviceProfile {
            strong: TierProfile {
                outcome: SimulatedOutcome::DeviceCredential,
                ..TierProfile::default()
            },
            ..DeviceProfile::default()
        });

        let allowed = provider
            .authenticate(AuthAttemptOptions::any_biometric())
            .await
            .expect("allowed");
        assert_eq!(allowed, AuthResult::success(BiometricTier::Strong, true));

        let mut strict = AuthAttemptOptions::fingerprint();
        strict.disable_fallback = true;
        let denied = provider.authenticate(strict).await.expect("denied");
        assert!(!denied.success);
        assert_eq!(denied.error_code.as_deref(), Some("FALLBACK_DISABLED"));
    }

    #[tokio::test]
    async fn fault_outcome_rejects_and_debug_mode_is_recorded() {
        let provider = SimulatedProvider::new(DeviceProfile {
            weak: TierProfile {
                outcome: SimulatedOutcome::Fault,
                ..TierProfile::default()
            },
            ..DeviceProfile::default()
        });
        provider.set_debug_mode(true).await.expect("debug mode");
        assert!(provider.debug_mode());

        let err = provider
            .authenticate(AuthAttemptOptions::face_unlock())
            .await
            .expect_err("fault");
        assert_eq!(err.to_string(), "biometric hardware fault");
        assert_eq!(provider.authenticate_calls(), 1);
    }

    #[test]
    fn partial_profile_fills_missing_fields_from_defaults() {
        let profile: DeviceProfile = serde_json::from_str(
            r#"{"weak": {"available": false}, "prompt_latency_ms": 25}"#,
        )
        .expect("profile");
        assert!(profile.strong.available);
        assert!(!profile.weak.available);
        assert_eq!(profile.weak.outcome, SimulatedOutcome::Succeed);
        assert_eq!(profile.prompt_latency_ms, 25);
    }
}
