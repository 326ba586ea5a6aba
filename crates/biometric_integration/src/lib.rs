use async_trait::async_trait;
use shared::domain::{AuthAttemptOptions, AuthResult, BiometricTier, SensorCapability};

mod simulated;

pub use simulated::{DeviceProfile, SimulatedOutcome, SimulatedProvider, TierProfile};

/// Platform capability that probes sensors and presents biometric prompts.
///
/// `probe` reports an absent sensor as `available = false`; an `Err` means
/// the platform itself failed. Likewise `authenticate` resolves with a
/// failed `AuthResult` for wrong faces, cancels and timeouts and only
/// errors on platform faults such as revoked permissions.
#[async_trait]
pub trait BiometricProvider: Send + Sync {
    async fn probe(&self, tier: BiometricTier) -> anyhow::Result<SensorCapability>;
    async fn authenticate(&self, options: AuthAttemptOptions) -> anyhow::Result<AuthResult>;

    async fn set_debug_mode(&self, _enabled: bool) -> anyhow::Result<()> {
        Ok(())
    }
}
