use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::anyhow;
use async_trait::async_trait;
use biometric_integration::BiometricProvider;
use shared::{
    domain::{
        AuthAttemptOptions, AuthResult, BiometricTier, OrchestratorState, SensorCapabilities,
        SensorCapability, SessionId, TierOrder,
    },
    error::ErrorCode,
    notification::Notification,
};
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

const DEFAULT_NOTIFICATION_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Order `authenticate_any` walks the tiers in.
    pub tier_order: TierOrder,
    /// Ask the provider for verbose diagnostics before each capability refresh.
    pub debug_mode: bool,
    pub notification_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            tier_order: TierOrder::StrongFirst,
            debug_mode: false,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }
}

#[derive(Debug, Error)]
enum AttemptError {
    #[error("tier unavailable")]
    Unavailable,
    #[error("authentication already in progress")]
    Busy,
    #[error("no biometric sensor available")]
    NoSensor,
    #[error("{0}")]
    ProviderFault(String),
}

impl AttemptError {
    fn code(&self) -> ErrorCode {
        match self {
            AttemptError::Unavailable => ErrorCode::TierUnavailable,
            AttemptError::Busy => ErrorCode::Busy,
            AttemptError::NoSensor => ErrorCode::NoSensor,
            AttemptError::ProviderFault(_) => ErrorCode::ProviderFault,
        }
    }

    fn into_result(self) -> AuthResult {
        let code = self.code().as_str().to_string();
        AuthResult::failure(self.to_string(), Some(code))
    }
}

/// Placeholder used until a platform provider is wired in. Every call faults.
pub struct MissingBiometricProvider;

#[async_trait]
impl BiometricProvider for MissingBiometricProvider {
    async fn probe(&self, tier: BiometricTier) -> anyhow::Result<SensorCapability> {
        Err(anyhow!("biometric provider unavailable for {tier} tier"))
    }

    async fn authenticate(&self, _options: AuthAttemptOptions) -> anyhow::Result<AuthResult> {
        Err(anyhow!("biometric provider unavailable"))
    }
}

struct CapabilityState {
    current: SensorCapabilities,
    probed: bool,
}

/// Clears the in-flight flag on every exit path, including the caller
/// dropping the attempt future.
struct AttemptGuard<'a> {
    in_flight: &'a AtomicBool,
    session: SessionId,
    finished: bool,
}

impl AttemptGuard<'_> {
    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
        if !self.finished {
            debug!(session = %self.session, "authentication attempt abandoned by caller");
        }
    }
}

/// Sequences capability probes and authentication attempts against a
/// [`BiometricProvider`] for one orchestration session.
///
/// At most one attempt is in flight at a time; a second call made while one
/// is pending is rejected immediately with a `busy` result. No call ever
/// returns an error: faults become failed results or notifications.
pub struct BiometricOrchestrator {
    session: SessionId,
    provider: Arc<dyn BiometricProvider>,
    config: OrchestratorConfig,
    capabilities: RwLock<CapabilityState>,
    in_flight: AtomicBool,
    notifications: broadcast::Sender<Notification>,
}

impl BiometricOrchestrator {
    pub fn new(provider: Arc<dyn BiometricProvider>) -> Self {
        Self::new_with_config(provider, OrchestratorConfig::default())
    }

    pub fn unconfigured() -> Self {
        Self::new(Arc::new(MissingBiometricProvider))
    }

    pub fn new_with_config(
        provider: Arc<dyn BiometricProvider>,
        config: OrchestratorConfig,
    ) -> Self {
        let (notifications, _) = broadcast::channel(config.notification_capacity.max(1));
        Self {
            session: SessionId::new(),
            provider,
            config,
            capabilities: RwLock::new(CapabilityState {
                current: SensorCapabilities::unavailable(),
                probed: false,
            }),
            in_flight: AtomicBool::new(false),
            notifications,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub fn notification_stream(&self) -> BroadcastStream<Notification> {
        BroadcastStream::new(self.notifications.subscribe())
    }

    pub async fn state(&self) -> OrchestratorState {
        if self.in_flight.load(Ordering::Acquire) {
            return OrchestratorState::Authenticating;
        }
        if self.capabilities.read().await.probed {
            OrchestratorState::CapabilitiesKnown
        } else {
            OrchestratorState::Idle
        }
    }

    pub async fn capabilities(&self) -> SensorCapabilities {
        self.capabilities.read().await.current.clone()
    }

    /// Probes Strong then Weak. A faulting probe keeps that tier's previous
    /// snapshot and yields a single error notification for the refresh.
    pub async fn refresh_capabilities(&self) -> SensorCapabilities {
        if self.config.debug_mode {
            if let Err(err) = self.provider.set_debug_mode(true).await {
                warn!(
                    session = %self.session,
                    "biometric: failed to enable provider debug mode: {err}"
                );
            }
        }

        let mut probed = Vec::with_capacity(BiometricTier::ALL.len());
        let mut faults = Vec::new();
        for tier in BiometricTier::ALL {
            match self.provider.probe(tier).await {
                Ok(mut capability) => {
                    capability.tier = tier;
                    info!(
                        session = %self.session,
                        tier = %tier,
                        available = capability.available,
                        biometry_type = capability.biometry_type.as_deref().unwrap_or("unknown"),
                        "biometric: probed sensor"
                    );
                    probed.push(capability);
                }
                Err(err) => {
                    warn!(session = %self.session, tier = %tier, "biometric: probe failed: {err}");
                    faults.push(format!("{tier} tier: {err}"));
                }
            }
        }

        let weak_reported_available = probed
            .iter()
            .any(|capability| capability.tier == BiometricTier::Weak && capability.available);

        let snapshot = {
            let mut guard = self.capabilities.write().await;
            for capability in probed {
                guard.current.set(capability);
            }
            guard.probed = true;
            guard.current.clone()
        };

        if !faults.is_empty() {
            self.emit(
                Notification::error("Failed to check biometric availability")
                    .with_description(faults.join("\n")),
            );
        }

        if weak_reported_available {
            self.emit(
                Notification::info("Face Unlock available").with_description(
                    "This device supports weak biometrics such as face unlock; they can be used for authentication.",
                ),
            );
        }

        snapshot
    }

    /// Runs one prompt at `tier`. The tier must have been reported available
    /// by the last refresh; otherwise the provider is never called.
    pub async fn authenticate(
        &self,
        tier: BiometricTier,
        options: AuthAttemptOptions,
    ) -> AuthResult {
        let Some(guard) = self.try_begin_attempt() else {
            return self.reject_busy();
        };

        let result = self
            .attempt(tier, &options)
            .await
            .unwrap_or_else(AttemptError::into_result);
        guard.finish();

        self.emit(Notification::for_result(&result));
        result
    }

    /// Tries each available tier in the configured order and stops at the
    /// first success. When every attempt fails the last one made is returned.
    pub async fn authenticate_any(&self, options: AuthAttemptOptions) -> AuthResult {
        let Some(guard) = self.try_begin_attempt() else {
            return self.reject_busy();
        };

        let result = self.attempt_in_order(&options).await;
        guard.finish();

        self.emit(Notification::for_result(&result));
        result
    }

    async fn attempt_in_order(&self, options: &AuthAttemptOptions) -> AuthResult {
        let capabilities = self.capabilities().await;
        let tiers: Vec<BiometricTier> = self
            .config
            .tier_order
            .tiers()
            .into_iter()
            .filter(|tier| capabilities.is_available(*tier))
            .collect();

        if tiers.is_empty() {
            info!(session = %self.session, "biometric: no tier available, skipping provider");
            return AttemptError::NoSensor.into_result();
        }

        let mut last = AttemptError::NoSensor.into_result();
        for tier in tiers {
            let result = self
                .attempt(tier, options)
                .await
                .unwrap_or_else(AttemptError::into_result);
            if result.success {
                return result;
            }
            info!(
                session = %self.session,
                tier = %tier,
                "biometric: attempt failed, trying next tier"
            );
            last = result;
        }
        last
    }

    async fn attempt(
        &self,
        tier: BiometricTier,
        options: &AuthAttemptOptions,
    ) -> Result<AuthResult, AttemptError> {
        if !self.capabilities.read().await.current.is_available(tier) {
            info!(
                session = %self.session,
                tier = %tier,
                "biometric: tier unavailable, provider not called"
            );
            return Err(AttemptError::Unavailable);
        }

        info!(session = %self.session, tier = %tier, "biometric: presenting prompt");
        match self.provider.authenticate(options.with_tier(tier)).await {
            Ok(result) => {
                if !result.is_well_formed() {
                    warn!(
                        session = %self.session,
                        tier = %tier,
                        "biometric: provider result violated tier invariant"
                    );
                }
                Ok(result.normalized_for(tier))
            }
            Err(err) => {
                warn!(session = %self.session, tier = %tier, "biometric: provider fault: {err}");
                Err(AttemptError::ProviderFault(err.to_string()))
            }
        }
    }

    fn try_begin_attempt(&self) -> Option<AttemptGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| AttemptGuard {
                in_flight: &self.in_flight,
                session: self.session,
                finished: false,
            })
    }

    fn reject_busy(&self) -> AuthResult {
        let err = AttemptError::Busy;
        warn!(session = %self.session, "biometric: rejected concurrent attempt");
        self.emit(Notification::error(err.to_string()));
        err.into_result()
    }

    fn emit(&self, notification: Notification) {
        let _ = self.notifications.send(notification);
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
