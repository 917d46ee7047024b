//! Lark Notify - sends text notifications through Lark robot webhooks.
//!
//! The library exposes the [`notify::Notifier`] seam, the Lark webhook
//! notifier, a registry that maps configured kinds to notifier factories and
//! a dispatcher that applies the generic retry and dry-run settings.

pub mod cli;
pub mod config;
pub mod error;
pub mod notify;
pub mod validation;

use std::path::Path;

use anyhow::Result;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use crate::cli::{Cli, Commands, SendArgs};
use crate::error::AppError;
use crate::notify::lark::{self, LarkNotifier};
use crate::notify::NotifierRegistry;

/// Runs the command selected on the command line.
pub async fn run(cli: Cli) -> Result<()> {
    setup_logging(cli.log_level())?;

    let registry = default_registry();

    match cli.command {
        Commands::Send(args) => send(&registry, args, &cli.config).await,
        Commands::ConfigValidate => validate_config(&registry, &cli.config),
        Commands::ConfigShow => show_config(&registry, &cli.config),
        Commands::Kinds => {
            for kind in registry.kinds() {
                println!("{}", kind);
            }
            Ok(())
        }
    }
}

/// Registers every notifier kind this build ships with.
pub fn default_registry() -> NotifierRegistry {
    let mut registry = NotifierRegistry::new();
    registry.register(lark::KIND, LarkNotifier::from_resolved);
    registry
}

/// Initializes the tracing subscriber for structured logging.
fn setup_logging(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .json()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Sends one notification through every matching configured notifier.
async fn send(registry: &NotifierRegistry, args: SendArgs, config_path: &Path) -> Result<()> {
    let mut config = config::loader::load_and_validate(config_path, &registry.kinds())?;

    if args.dry_run {
        config
            .notify
            .values_mut()
            .flatten()
            .for_each(|entry| entry.dry = true);
    }

    let message = match args.message {
        Some(message) => message,
        None => read_stdin().await?,
    };

    let dispatcher = registry
        .build_all(&config)
        .map_err(AppError::Config)?
        .filter(args.kind.as_deref(), args.name.as_deref());

    if dispatcher.is_empty() {
        warn!(kind = ?args.kind, name = ?args.name, "No notifier matched, nothing sent");
        return Ok(());
    }

    info!(notifiers = dispatcher.len(), title = %args.title, "Sending notification");
    let report = dispatcher.notify_all(&args.title, &message).await;

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(()) if outcome.dry => println!("[{} / {}] dry run", outcome.kind, outcome.name),
            Ok(()) => println!("[{} / {}] sent", outcome.kind, outcome.name),
            Err(e) => println!(
                "[{} / {}] failed after {} attempt(s): {}",
                outcome.kind, outcome.name, outcome.attempts, e
            ),
        }
    }

    if !report.is_success() {
        return Err(AppError::DeliveryFailed {
            failed: report.failures().count(),
            total: report.outcomes.len(),
        }
        .into());
    }

    Ok(())
}

/// Reads the notification body from stdin, dropping one trailing newline.
async fn read_stdin() -> Result<String, AppError> {
    let mut message = String::new();
    tokio::io::stdin().read_to_string(&mut message).await?;

    if message.ends_with('\n') {
        message.pop();
        if message.ends_with('\r') {
            message.pop();
        }
    }

    Ok(message)
}

/// Validates the configuration file and reports any issues.
fn validate_config(registry: &NotifierRegistry, config_path: &Path) -> Result<()> {
    let config = config::loader::load_and_validate(config_path, &registry.kinds())?;
    // Also catches what validation cannot, e.g. client construction failures.
    let dispatcher = registry.build_all(&config)?;

    println!("Configuration is valid.");
    println!("Found {} notifier(s):", dispatcher.len());
    for resolved in config.resolved() {
        println!(
            "  - {} / {} (timeout: {}s, attempts: {}{})",
            resolved.kind,
            resolved.name,
            resolved.timeout.as_secs(),
            resolved.retry.max_attempts,
            if resolved.dry { ", dry" } else { "" }
        );
    }

    Ok(())
}

/// Displays the parsed configuration.
fn show_config(registry: &NotifierRegistry, config_path: &Path) -> Result<()> {
    let config = config::loader::load_and_validate(config_path, &registry.kinds())?;
    let yaml = serde_yaml::to_string(&config)?;
    println!("{}", yaml);
    Ok(())
}
