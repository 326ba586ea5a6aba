use std::{sync::Arc, time::Duration};

use auth_core::{BiometricOrchestrator, OrchestratorConfig};
use biometric_integration::{DeviceProfile, SimulatedOutcome, SimulatedProvider, TierProfile};
use shared::{
    domain::{AuthAttemptOptions, AuthResult, BiometricTier, OrchestratorState, TierOrder},
    error::{classify_failure, FailureKind},
    notification::NotificationKind,
};

#[tokio::test]
async fn face_unlock_fallback_session_acceptance() {
    let provider = Arc::new(SimulatedProvider::new(DeviceProfile {
        strong: TierProfile {
            biometry_type: Some("fingerprint".to_string()),
            outcome: SimulatedOutcome::Deny,
            ..TierProfile::default()
        },
        ..DeviceProfile::default()
    }));
    let orchestrator = BiometricOrchestrator::new_with_config(
        provider.clone(),
        OrchestratorConfig {
            debug_mode: true,
            ..OrchestratorConfig::default()
        },
    );
    let mut notifications = orchestrator.subscribe_notifications();

    let capabilities = orchestrator.refresh_capabilities().await;
    assert!(capabilities.strong.available && capabilities.weak.available);
    assert!(provider.debug_mode());
    let info = notifications.recv().await.expect("info notification");
    assert_eq!(info.kind, NotificationKind::Info);

    let result = orchestrator
        .authenticate_any(AuthAttemptOptions::any_biometric())
        .await;
    assert_eq!(result, AuthResult::success(BiometricTier::Weak, false));
    assert_eq!(provider.authenticate_calls(), 2);

    let outcome = notifications.recv().await.expect("result notification");
    assert_eq!(outcome.kind, NotificationKind::Result);
    assert_eq!(
        outcome.description.as_deref(),
        Some("Authenticated with weak biometrics")
    );
    assert_eq!(orchestrator.state().await, OrchestratorState::CapabilitiesKnown);
}

#[tokio::test]
async fn recheck_picks_up_newly_enrolled_sensor() {
    let provider = Arc::new(SimulatedProvider::new(DeviceProfile {
        weak: TierProfile::absent(),
        strong: TierProfile::absent(),
        prompt_latency_ms: 0,
    }));
    let orchestrator = BiometricOrchestrator::new(provider.clone());

    orchestrator.refresh_capabilities().await;
    let before = orchestrator
        .authenticate(BiometricTier::Weak, AuthAttemptOptions::face_unlock())
        .await;
    assert_eq!(classify_failure(&before), Some(FailureKind::Unavailable));
    assert_eq!(provider.authenticate_calls(), 0);

    provider.replace_profile(DeviceProfile::default()).await;
    orchestrator.refresh_capabilities().await;

    let after = orchestrator
        .authenticate(BiometricTier::Weak, AuthAttemptOptions::face_unlock())
        .await;
    assert!(after.success);
    assert_eq!(provider.authenticate_calls(), 1);
}

#[tokio::test]
async fn slow_prompt_blocks_a_second_prompt() {
    let provider = Arc::new(SimulatedProvider::new(DeviceProfile {
        prompt_latency_ms: 50,
        ..DeviceProfile::default()
    }));
    let orchestrator = BiometricOrchestrator::new_with_config(
        provider.clone(),
        OrchestratorConfig {
            tier_order: TierOrder::WeakFirst,
            ..OrchestratorConfig::default()
        },
    );
    orchestrator.refresh_capabilities().await;

    let (first, second) = tokio::join!(
        orchestrator.authenticate_any(AuthAttemptOptions::any_biometric()),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            orchestrator
                .authenticate(BiometricTier::Strong, AuthAttemptOptions::fingerprint())
                .await
        }
    );

    assert_eq!(first, AuthResult::success(BiometricTier::Weak, false));
    assert_eq!(classify_failure(&second), Some(FailureKind::Busy));
    assert_eq!(provider.authenticate_calls(), 1);
}

#[tokio::test]
async fn hardware_fault_during_prompt_is_contained() {
    let provider = Arc::new(SimulatedProvider::new(DeviceProfile {
        strong: TierProfile {
            outcome: SimulatedOutcome::Fault,
            ..TierProfile::default()
        },
        weak: TierProfile::absent(),
        prompt_latency_ms: 0,
    }));
    let orchestrator = BiometricOrchestrator::new(provider);
    orchestrator.refresh_capabilities().await;

    let result = orchestrator
        .authenticate_any(AuthAttemptOptions::any_biometric())
        .await;

    assert_eq!(classify_failure(&result), Some(FailureKind::ProviderFault));
    assert_eq!(result.error_message.as_deref(), Some("biometric hardware fault"));
    assert_eq!(orchestrator.state().await, OrchestratorState::CapabilitiesKnown);
}
