//! Command-line interface definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Sends chat notifications through Lark robot webhooks.
#[derive(Parser, Debug)]
#[command(name = "lark-notify", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "notify.yaml", env = "CONFIG_PATH", global = true)]
    pub config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Returns the log level based on verbosity flags.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a notification to every configured notifier.
    Send(SendArgs),

    /// Validate the configuration file without sending anything.
    #[command(name = "config-validate")]
    ConfigValidate,

    /// Display the parsed configuration.
    #[command(name = "config-show")]
    ConfigShow,

    /// List the notifier kinds this build can send to.
    Kinds,
}

/// Arguments for the send subcommand.
#[derive(Args, Debug)]
pub struct SendArgs {
    /// Notification title.
    #[arg(short, long)]
    pub title: String,

    /// Notification body. Read from stdin when omitted.
    #[arg(short, long)]
    pub message: Option<String>,

    /// Only send through notifiers of this kind.
    #[arg(long)]
    pub kind: Option<String>,

    /// Only send through the notifier with this name.
    #[arg(long)]
    pub name: Option<String>,

    /// Log the notification instead of sending it.
    #[arg(long, default_value = "false")]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_send() {
        let cli = Cli::try_parse_from([
            "lark-notify",
            "-vv",
            "--config",
            "/etc/notify.yaml",
            "send",
            "--title",
            "Probe down",
            "--message",
            "api timed out",
            "--kind",
            "lark",
        ])
        .unwrap();

        assert_eq!(cli.log_level(), "trace");
        assert_eq!(cli.config, PathBuf::from("/etc/notify.yaml"));
        match cli.command {
            Commands::Send(args) => {
                assert_eq!(args.title, "Probe down");
                assert_eq!(args.message.as_deref(), Some("api timed out"));
                assert_eq!(args.kind.as_deref(), Some("lark"));
                assert!(args.name.is_none());
                assert!(!args.dry_run);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_send_requires_title() {
        assert!(Cli::try_parse_from(["lark-notify", "send", "--message", "m"]).is_err());
    }

    #[test]
    fn test_config_subcommands() {
        let cli = Cli::try_parse_from(["lark-notify", "config-validate"]).unwrap();
        assert!(matches!(cli.command, Commands::ConfigValidate));
        assert_eq!(cli.log_level(), "info");

        let cli = Cli::try_parse_from(["lark-notify", "kinds"]).unwrap();
        assert!(matches!(cli.command, Commands::Kinds));
    }
}
