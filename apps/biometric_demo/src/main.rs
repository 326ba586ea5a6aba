use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use auth_core::BiometricOrchestrator;
use biometric_integration::SimulatedProvider;
use clap::{Parser, Subcommand, ValueEnum};
use futures::StreamExt;
use shared::{
    domain::{AuthAttemptOptions, BiometricTier},
    notification::{Notification, NotificationKind},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::load_settings;

#[derive(Parser, Debug)]
struct Args {
    /// Path to a TOML file describing the orchestrator and simulated device.
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe both tiers and print the capability snapshot.
    Probe,
    /// Authenticate at a single tier.
    Authenticate {
        #[arg(long, default_value = "strong")]
        tier: BiometricTier,
        #[arg(long, value_enum)]
        preset: Option<Preset>,
    },
    /// Best-effort authentication across all available tiers.
    Any,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Preset {
    FaceUnlock,
    Fingerprint,
    Any,
}

impl Preset {
    fn options(self) -> AuthAttemptOptions {
        match self {
            Preset::FaceUnlock => AuthAttemptOptions::face_unlock(),
            Preset::Fingerprint => AuthAttemptOptions::fingerprint(),
            Preset::Any => AuthAttemptOptions::any_biometric(),
        }
    }

    fn for_tier(tier: BiometricTier) -> Self {
        match tier {
            BiometricTier::Strong => Preset::Fingerprint,
            BiometricTier::Weak => Preset::FaceUnlock,
        }
    }
}

fn log_notification(notification: &Notification) {
    let description = notification.description.as_deref().unwrap_or_default();
    match notification.kind {
        NotificationKind::Info => info!("notice: {} {description}", notification.message),
        NotificationKind::Error => error!("error: {} {description}", notification.message),
        NotificationKind::Result => info!("result: {} {description}", notification.message),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();
    let settings = load_settings(args.config.as_deref())?;

    let provider = Arc::new(SimulatedProvider::new(settings.device.clone()));
    let orchestrator =
        BiometricOrchestrator::new_with_config(provider, settings.orchestrator_config());
    info!(session = %orchestrator.session_id(), "biometric: session started");

    let mut notifications = orchestrator.notification_stream();
    let printer = tokio::spawn(async move {
        while let Some(item) = notifications.next().await {
            match item {
                Ok(notification) => log_notification(&notification),
                Err(err) => warn!("notification stream lagged: {err}"),
            }
        }
    });

    let capabilities = orchestrator.refresh_capabilities().await;

    match args.command {
        Command::Probe => {
            println!("{}", serde_json::to_string_pretty(&capabilities)?);
        }
        Command::Authenticate { tier, preset } => {
            let options = preset.unwrap_or_else(|| Preset::for_tier(tier)).options();
            let result = orchestrator.authenticate(tier, options).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Any => {
            let result = orchestrator
                .authenticate_any(AuthAttemptOptions::any_biometric())
                .await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    drop(orchestrator);
    printer.await?;

    Ok(())
}
