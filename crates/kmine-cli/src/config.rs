//! CLI configuration management.
//!
//! ```text
//! Cli
//! └── command: Command
//!     ├── tools                      # list registered tools
//!     ├── ask --tool <NAME> <Q>      # ChatWithDataConfig flattened
//!     └── route <Q>                  # ChatWithDataConfig flattened
//! ```
//!
//! All settings can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.

use std::process;

use clap::{Parser, Subcommand};
use kmine_rig::ChatWithDataConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "kmine")]
#[command(about = "Ask questions about call-center data")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Lists the registered tools and their parameter schemas.
    Tools,

    /// Runs one tool by its exact name.
    Ask {
        /// Tool name, e.g. `ChatWithSQLDatabase`.
        #[arg(long, short)]
        tool: String,

        /// The question.
        question: String,

        #[command(flatten)]
        config: ChatWithDataConfig,
    },

    /// Lets the model choose the tool for the question.
    Route {
        /// The question.
        question: String,

        #[command(flatten)]
        config: ChatWithDataConfig,
    },
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is read before clap runs so its values act as defaults
    /// for the `env` attributes.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    ///
    /// Logs go to stderr so answers on stdout stay machine-readable.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    /// Returns the tool configuration of the subcommand, if it takes one.
    pub fn config(&self) -> Option<&ChatWithDataConfig> {
        match &self.command {
            Command::Tools => None,
            Command::Ask { config, .. } | Command::Route { config, .. } => Some(config),
        }
    }

    /// Logs build information and the configuration (secrets masked).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        if let Some(config) = self.config() {
            tracing::info!(
                target: TRACING_TARGET_CONFIG,
                endpoint = %config.azure_openai_endpoint,
                model = config.model(),
                search_index = %config.azure_ai_search_index,
                project_client = config.use_ai_project_client,
                request_timeout_secs = config.request_timeout_secs,
                "Tool configuration"
            );
            tracing::debug!(target: TRACING_TARGET_CONFIG, config = ?config, "Full configuration");
        }
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    const REQUIRED: [&str; 12] = [
        "--azure-openai-endpoint",
        "https://res.openai.azure.com",
        "--azure-openai-deployment-model",
        "gpt-4o-mini",
        "--azure-openai-api-key",
        "key",
        "--azure-ai-search-endpoint",
        "https://search.windows.net",
        "--azure-ai-search-api-key",
        "skey",
        "--azure-ai-search-index",
        "call_transcripts",
    ];

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn tools_needs_no_configuration() {
        let cli = Cli::try_parse_from(["kmine", "tools"]).unwrap();
        assert!(cli.config().is_none());
    }

    #[test]
    fn ask_parses_tool_and_question() {
        let args = ["kmine", "ask", "--tool", "Greeting", "Hello"]
            .into_iter()
            .chain(REQUIRED);
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Ask {
            tool,
            question,
            config,
        } = cli.command
        else {
            panic!("expected ask");
        };
        assert_eq!(tool, "Greeting");
        assert_eq!(question, "Hello");
        assert_eq!(config.azure_ai_search_index, "call_transcripts");
        assert!(!config.use_ai_project_client);
    }

    fn project_flag(value: &str) -> bool {
        let args = [
            "kmine",
            "route",
            "How many calls?",
            "--use-ai-project-client",
            value,
            "--azure-ai-project-conn-string",
            "host;sub;rg;proj",
        ]
        .into_iter()
        .chain(REQUIRED);
        let cli = Cli::try_parse_from(args).unwrap();
        cli.config().unwrap().use_ai_project_client
    }

    #[test]
    fn project_flag_is_on_only_for_true() {
        assert!(project_flag("true"));
        assert!(project_flag("True"));
        assert!(project_flag("TRUE"));

        for value in ["false", "False", "yes", "1", "on", "maybe"] {
            assert!(!project_flag(value), "{value:?} turned the flag on");
        }
    }

    #[test]
    fn route_with_project_settings_validates() {
        let args = [
            "kmine",
            "route",
            "How many calls?",
            "--use-ai-project-client",
            "true",
            "--azure-ai-project-conn-string",
            "host;sub;rg;proj",
        ]
        .into_iter()
        .chain(REQUIRED);
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.config().unwrap().validate().is_ok());
    }
}
