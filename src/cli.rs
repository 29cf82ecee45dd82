use std::path::PathBuf;

use app_state::Plan;
use app_ui::{ColorScheme, ThemeMode};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "social-confidence")]
#[command(version)]
#[command(about = "Conversation advice for everyday social situations", long_about = None)]
pub struct Cli {
    /// Directory holding the local store
    #[arg(long, env = "SOCIAL_CONFIDENCE_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Completion endpoint URL
    #[arg(long, env = "SOCIAL_CONFIDENCE_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Advice request timeout in seconds
    #[arg(long, env = "SOCIAL_CONFIDENCE_TIMEOUT_SECS", global = true)]
    pub timeout_secs: Option<u64>,

    /// Appearance reported by the OS (light or dark)
    #[arg(long, env = "SOCIAL_CONFIDENCE_SYSTEM_SCHEME", global = true)]
    pub system_scheme: Option<ColorScheme>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Sign out
    Logout,
    /// Request a password reset link
    ForgotPassword {
        #[arg(long)]
        email: Option<String>,
    },
    /// Show the signed-in user
    Whoami,
    /// Edit name or email
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// List subscription plans
    Plans,
    /// Switch to a plan (free, premium or pro)
    Subscribe { plan: Plan },
    /// Show or set the theme (light, dark or system)
    Theme { mode: Option<ThemeMode> },
    /// Describe a situation and get advice
    Advise { situation: Option<String> },
    /// Past advice
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },
    /// Saved advice
    Saved {
        #[command(subcommand)]
        action: Option<SavedAction>,
    },
    /// App settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum HistoryAction {
    List,
    Show { id: String },
    Remove { id: String },
    Clear,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SavedAction {
    List,
    Show { id: String },
    Remove { id: String },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SettingsAction {
    Show,
    /// Turn notifications on or off
    Notifications {
        #[arg(value_parser = BoolishValueParser::new(), action = ArgAction::Set)]
        enabled: bool,
    },
    /// Turn history recording on or off
    SaveHistory {
        #[arg(value_parser = BoolishValueParser::new(), action = ArgAction::Set)]
        enabled: bool,
    },
    ClearHistory,
    /// Remove stored advice and sign out
    DeleteAccount {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subscribe_plan() {
        let cli = Cli::try_parse_from(["social-confidence", "subscribe", "Premium"]).unwrap();
        assert!(matches!(cli.command, Command::Subscribe { plan: Plan::Premium }));
        assert!(Cli::try_parse_from(["social-confidence", "subscribe", "gold"]).is_err());
    }

    #[test]
    fn test_parse_theme_and_scheme() {
        let cli = Cli::try_parse_from([
            "social-confidence",
            "theme",
            "dark",
            "--system-scheme",
            "light",
        ])
        .unwrap();
        assert_eq!(cli.system_scheme, Some(ColorScheme::Light));
        assert!(matches!(cli.command, Command::Theme { mode: Some(ThemeMode::Dark) }));
    }

    #[test]
    fn test_parse_settings_toggles() {
        let cli =
            Cli::try_parse_from(["social-confidence", "settings", "save-history", "off"]).unwrap();
        match cli.command {
            Command::Settings { action } => {
                assert_eq!(action, Some(SettingsAction::SaveHistory { enabled: false }))
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli =
            Cli::try_parse_from(["social-confidence", "settings", "notifications", "off"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Settings { action: Some(SettingsAction::Notifications { enabled: false }) }
        ));

        let cli =
            Cli::try_parse_from(["social-confidence", "settings", "notifications", "on"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Settings { action: Some(SettingsAction::Notifications { enabled: true }) }
        ));

        assert!(Cli::try_parse_from(["social-confidence", "settings", "save-history"]).is_err());
    }

    #[test]
    fn test_command_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_history_defaults_to_list() {
        let cli = Cli::try_parse_from(["social-confidence", "history"]).unwrap();
        assert!(matches!(cli.command, Command::History { action: None }));
    }
}
