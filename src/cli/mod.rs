// CLI module - Command-line front end for emitting, stress testing and masking

mod output;

use crate::config::LoggingConfig;
use crate::error::{CorelogError, Result};
use crate::logs::{LogCategory, LogData, LogLevel};
use crate::sanitize;
use crate::system::LoggingSystem;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// corelog - structured, categorized logging with a rotating file sink
#[derive(Parser)]
#[command(name = "corelog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a single entry and shut down
    Emit {
        /// Message text
        message: String,

        #[arg(short, long, default_value = "INFO")]
        level: LogLevel,

        #[arg(short = 'C', long, default_value = "GENERAL")]
        category: LogCategory,

        /// Component name recorded with the entry
        #[arg(long, default_value = "cli")]
        component: String,

        /// Structured data (KEY=VALUE format)
        #[arg(short, long)]
        data: Vec<String>,

        /// Write to this file, overriding the configuration
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Hammer the file writer from several threads and report drops
    Stress {
        /// Number of producer threads
        #[arg(short, long, default_value = "8")]
        producers: usize,

        /// Entries logged by each producer
        #[arg(short, long, default_value = "1000")]
        entries: usize,

        /// File queue capacity
        #[arg(short, long, default_value = "64")]
        queue_capacity: usize,

        /// Target log file (defaults to a file in the temp directory)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Run a masking helper on a value
    Mask {
        kind: MaskKind,
        value: String,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MaskKind {
    Email,
    Token,
    Credential,
    User,
    Session,
    Uri,
    Exception,
    Secret,
}

impl Cli {
    /// Run the CLI application
    pub fn run() -> Result<()> {
        let cli = Cli::parse();
        init_tracing();
        cli.execute()
    }

    fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Emit {
                message,
                level,
                category,
                component,
                data,
                file,
            } => {
                let mut config = self.load_config()?;
                if let Some(file) = file {
                    config.file_logging_enabled = true;
                    config.log_file_path = Some(file.clone());
                }
                let data = parse_data_pairs(data)?;
                emit(config, *level, *category, component, message, data)
            }

            Commands::Stress {
                producers,
                entries,
                queue_capacity,
                file,
            } => {
                let path = file
                    .clone()
                    .unwrap_or_else(|| std::env::temp_dir().join("corelog-stress.log"));
                // Every submitted entry must pass the level filter for the counts to balance
                let config = LoggingConfig {
                    global_level: LogLevel::Info,
                    category_levels: Default::default(),
                    file_logging_enabled: false,
                    queue_capacity: *queue_capacity,
                    register_exit_hook: false,
                    ..self.load_config()?
                };
                stress(config, &path, *producers, *entries)
            }

            Commands::Mask { kind, value } => {
                output::print_masked(&format!("{:?}", kind).to_lowercase(), &mask(*kind, value));
                Ok(())
            }

            Commands::Config => {
                let config = self.load_config()?;
                output::print_config(&config.to_toml()?);
                Ok(())
            }
        }
    }

    /// File configuration with env overrides, or the environment alone
    fn load_config(&self) -> Result<LoggingConfig> {
        match &self.config {
            Some(path) => LoggingConfig::from_file(path)?.with_env_overrides(),
            None => LoggingConfig::from_env(),
        }
    }
}

/// Route `tracing` output, including fallback reports, to stderr
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn emit(
    config: LoggingConfig,
    level: LogLevel,
    category: LogCategory,
    component: &str,
    message: &str,
    data: LogData,
) -> Result<()> {
    let system = LoggingSystem::new(config.clone());
    system.start(config)?;

    let logger = system.logger(component, category);
    if !logger.is_enabled(level) {
        output::print_warning(&format!(
            "{} is below the {} threshold for {}; nothing logged",
            level,
            system.effective_level(category),
            category
        ));
    } else {
        logger.log(level, message, Some(data), None);
        output::print_success_msg(&format!("Logged {} entry to {}", level, category));
    }

    system.shutdown();
    if system.dropped_count() > 0 {
        return Err(CorelogError::LogWriteError(format!(
            "{} entries could not be written",
            system.dropped_count()
        )));
    }
    Ok(())
}

fn stress(config: LoggingConfig, path: &Path, producers: usize, entries: usize) -> Result<()> {
    let system = LoggingSystem::new(config.clone());
    system.start(config)?;
    system.enable_file_logging(path)?;

    let pb = output::create_progress_bar(&format!(
        "Logging {} entries from {} producers...",
        producers * entries,
        producers
    ));
    let started = Instant::now();

    let handles: Vec<_> = (0..producers)
        .map(|p| {
            let system = Arc::clone(&system);
            thread::spawn(move || {
                let logger = system.logger(format!("producer-{}", p), LogCategory::Performance);
                for i in 0..entries {
                    logger.info(format!("entry {}", i));
                }
            })
        })
        .collect();

    let mut panicked = false;
    for handle in handles {
        panicked |= handle.join().is_err();
    }
    system.shutdown();
    let elapsed = started.elapsed();

    let report = output::StressReport {
        submitted: (producers * entries) as u64,
        written: system.written_count(),
        dropped: system.dropped_count(),
        elapsed,
    };

    if panicked || !report.is_consistent() {
        output::finish_progress_error(pb, "Stress run finished with inconsistent counts");
        output::print_stress_report(&report, path);
        return Err(CorelogError::Other(
            "written + dropped does not match submitted".to_string(),
        ));
    }

    output::finish_progress_success(pb, "Stress run complete");
    output::print_stress_report(&report, path);
    Ok(())
}

fn mask(kind: MaskKind, value: &str) -> String {
    match kind {
        MaskKind::Email => sanitize::mask_email(value),
        MaskKind::Token => sanitize::mask_token(value),
        MaskKind::Credential => sanitize::mask_credential_id(value),
        MaskKind::User => sanitize::mask_user_id(value),
        MaskKind::Session => sanitize::mask_session_id(value),
        MaskKind::Uri => sanitize::mask_uri_params(value),
        MaskKind::Exception => sanitize::sanitize_stack_trace(value),
        MaskKind::Secret => sanitize::looks_like_secret(value).to_string(),
    }
}

/// Parse structured data from KEY=VALUE format; values that parse as JSON keep their type
fn parse_data_pairs(pairs: &[String]) -> Result<LogData> {
    let mut data = LogData::new();

    for pair in pairs {
        if let Some((key, value)) = pair.split_once('=') {
            let value = serde_json::from_str(value)
                .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
            data.insert(key.to_string(), value);
        } else {
            return Err(CorelogError::InvalidConfig(format!(
                "Invalid data format: '{}'. Expected KEY=VALUE",
                pair
            )));
        }
    }

    Ok(data)
}
