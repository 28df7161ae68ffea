use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use codelia_core::{AnalysisService, PromptStore, SettingsStore};
use codelia_logging::{init_tracing, init_tracing_with_dir, LogFormat, Logger};
use codelia_scoring::DEFAULT_PATTERN;

mod analysis;
mod api;
mod config;
mod history;
mod serve;

use analysis::{ImproveArgs, InputArgs};
use config::ConfigAction;
use history::HistoryAction;

#[derive(Parser, Debug)]
#[command(
    name = "codelia",
    about = "Score and rewrite system requirements against INCOSE writing rules",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    log_format: LogFormatChoice,

    /// Diagnostic log level (RUST_LOG overrides)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Also write diagnostics to a daily-rotated file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Mirror workflow events as JSON lines to this file
    #[arg(long, global = true)]
    event_log: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Settings file (default: $CODELIA_CONFIG or <config dir>/codelia/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory whose scoring_criteria.md / quality.md override the built-in prompts
    #[arg(long, global = true)]
    prompts_dir: Option<PathBuf>,

    /// History database (default: <data dir>/codelia/history.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score a requirement against the INCOSE writing rules
    Evaluate {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Score, rewrite, re-score and compare a requirement
    Improve {
        #[command(flatten)]
        input: InputArgs,

        /// Requirement pattern to rewrite into
        #[arg(long, default_value = DEFAULT_PATTERN)]
        pattern: String,

        /// Pattern field as key=value (repeatable)
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,

        /// Save the rewritten requirements to history
        #[arg(long)]
        save: bool,

        /// Parent requirement id used when saving (e.g. SYS-010)
        #[arg(long, default_value = "")]
        parent_id: String,
    },

    /// Run the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(short, long, default_value_t = 8000)]
        port: u16,
    },

    /// Show or edit provider and project settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Browse or prune saved requirements
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_format: LogFormat = cli.log_format.into();

    let _log_guard = match &cli.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            Some(init_tracing_with_dir(&cli.log_level, log_format, dir))
        }
        None => {
            init_tracing(&cli.log_level, log_format);
            None
        }
    };

    let logger = match &cli.event_log {
        Some(path) => Logger::with_file(log_format, path)
            .with_context(|| format!("Failed to open event log {}", path.display()))?,
        None => Logger::new(log_format),
    };
    let logger = Arc::new(logger);

    let settings = match cli.config {
        Some(path) => SettingsStore::new(path),
        None => SettingsStore::from_env()?,
    };
    let prompts = match cli.prompts_dir {
        Some(dir) => PromptStore::with_dir(dir),
        None => PromptStore::from_env(),
    };
    let service = Arc::new(AnalysisService::new(settings, prompts, logger.clone()));

    match cli.command {
        Command::Evaluate { input } => {
            analysis::handle_evaluate_command(&service, input, cli.json).await
        }
        Command::Improve {
            input,
            pattern,
            fields,
            save,
            parent_id,
        } => {
            let args = ImproveArgs {
                input,
                pattern,
                fields,
                save,
                parent_id,
            };
            analysis::handle_improve_command(&service, args, cli.db.as_deref(), &logger, cli.json)
                .await
        }
        Command::Serve { host, port } => {
            serve::handle_serve_command(service, cli.db.as_deref(), logger, &host, port).await
        }
        Command::Config { action } => {
            config::handle_config_command(service.settings(), action, cli.json)
        }
        Command::History { action } => {
            history::handle_history_command(cli.db.as_deref(), action, cli.json)
        }
    }
}
