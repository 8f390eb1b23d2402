// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use rust_decimal::Decimal;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use alipay2ofx::app_config::{self, Config};
use alipay2ofx::app_controller::{ConversionOptions, Controller};
use alipay2ofx::file_utils::FileManager;
use alipay2ofx::ofx::validate_ofx;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert an Alipay statement to OFX (default command)
    Convert(ConvertArgs),

    /// Check that an OFX file is well formed
    Validate {
        /// OFX file to check
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Set logging level
        #[arg(short, long, value_enum)]
        log_level: Option<CliLogLevel>,
    },

    /// Generate shell completions for alipay2ofx
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    /// Alipay statement export (TXT/CSV)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// OFX file to write
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    #[command(flatten)]
    flags: ConvertFlags,
}

#[derive(Args, Debug, Clone)]
struct ConvertFlags {
    /// Translate payee and memo texts
    #[arg(long)]
    translate: bool,

    /// Google Cloud Translation API key
    #[arg(long = "api_key", visible_alias = "api-key", env = "GOOGLE_TRANSLATE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Target language code (e.g., 'en', 'de', 'zh-TW')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Translation cache file
    #[arg(long)]
    cache_file: Option<String>,

    /// Account id to write instead of the one in the export
    #[arg(long)]
    account: Option<String>,

    /// Closing balance for the statement
    #[arg(long, allow_hyphen_values = true)]
    ledger_balance: Option<Decimal>,

    /// Date of the closing balance (YYYY-MM-DD)
    #[arg(long)]
    ledger_date: Option<NaiveDate>,

    /// Do not show the translation progress bar
    #[arg(long)]
    no_progress: bool,

    /// Configuration file path
    #[arg(short, long, visible_alias = "config", default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// alipay2ofx - Alipay statement to OFX converter
///
/// Converts Alipay transaction exports into OFX bank statements, optionally
/// translating payee and memo texts through Google Cloud Translation.
#[derive(Parser, Debug)]
#[command(name = "alipay2ofx")]
#[command(args_conflicts_with_subcommands = true)]
#[command(version)]
#[command(about = "Convert Alipay statements to OFX")]
#[command(long_about = "alipay2ofx converts Alipay transaction exports into OFX 1.02 bank statements.

EXAMPLES:
    alipay2ofx alipay.txt statement.ofx                     # Convert without translation
    alipay2ofx alipay.txt statement.ofx --translate         # Translate with the cached/Google API
    alipay2ofx alipay.txt out.ofx --translate -t de         # Translate into German
    alipay2ofx alipay.txt out.ofx --ledger-balance 1520.33  # Set the closing balance
    alipay2ofx validate statement.ofx                       # Check an OFX file
    alipay2ofx completions bash > alipay2ofx.bash           # Generate bash completions

CONFIGURATION:
    Settings are read from conf.json by default; use --config-path for another
    file. A missing file means defaults. The API key can also be given through
    the GOOGLE_TRANSLATE_API_KEY environment variable.

TRANSLATION CACHE:
    Translations are kept in translations.txt, one 'source|translation' pair
    per line. The file can be edited by hand to correct translations.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Alipay statement export (TXT/CSV)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// OFX file to write
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(flatten)]
    flags: ConvertFlags,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // The logger itself passes everything; log::max_level does the filtering
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour and tag for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "ERROR"),
            Level::Warn => ("1;33", "WARN "),
            Level::Info => ("1;32", "INFO "),
            Level::Debug => ("1;36", "DEBUG"),
            Level::Trace => ("1;35", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let now = chrono::Local::now().format("%H:%M:%S.%3f");
        let (colour, tag) = Self::style_for_level(record.level());
        let mut stderr = std::io::stderr();
        let _ = if stderr.is_terminal() {
            writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", colour, now, tag, record.args())
        } else {
            writeln!(stderr, "{} {} {}", now, tag, record.args())
        };
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = CommandLineOptions::parse();

    let result = match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "alipay2ofx", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Validate { file, log_level }) => run_validate(file, log_level),
        Some(Commands::Convert(args)) => run_convert(args).await,
        None => match (cli.input, cli.output) {
            // Default behavior - top-level args mean convert
            (Some(input), Some(output)) => run_convert(ConvertArgs { input, output, flags: cli.flags }).await,
            _ => {
                let _ = CommandLineOptions::command().print_help();
                Err(anyhow::anyhow!("INPUT and OUTPUT are required when no subcommand is specified"))
            }
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn apply_log_level(level: app_config::LogLevel) {
    log::set_max_level(level.into());
}

async fn run_convert(args: ConvertArgs) -> Result<()> {
    let flags = args.flags;

    // A level given on the command line applies before the config is read
    if let Some(level) = flags.log_level {
        apply_log_level(level.into());
    }

    let mut config = Config::load_or_default(&flags.config_path)?;

    // Override config with CLI options if provided
    if let Some(target_language) = &flags.target_language {
        config.target_language = target_language.clone();
    }
    if let Some(cache_file) = &flags.cache_file {
        config.translation.cache_file = cache_file.clone();
    }
    match flags.log_level {
        Some(level) => config.log_level = level.into(),
        None => apply_log_level(config.log_level),
    }

    let controller = Controller::with_config(config)?;

    let options = ConversionOptions {
        translate: flags.translate,
        api_key: flags.api_key,
        account_id: flags.account,
        ledger_balance: flags.ledger_balance,
        ledger_date: flags.ledger_date,
        show_progress: !flags.no_progress && std::io::stderr().is_terminal(),
    };

    info!("Converting {:?} to {:?}", args.input, args.output);
    let report = controller.run(&args.input, &args.output, &options).await?;

    if report.skipped > 0 {
        info!("{} malformed records were skipped, see the warnings above", report.skipped);
    }

    Ok(())
}

fn run_validate(file: PathBuf, log_level: Option<CliLogLevel>) -> Result<()> {
    if let Some(level) = log_level {
        apply_log_level(level.into());
    }

    let content = FileManager::read_statement(&file)
        .with_context(|| format!("Failed to read OFX file: {:?}", file))?;
    let summary = validate_ofx(&content)
        .with_context(|| format!("{:?} is not a valid OFX statement", file))?;

    info!(
        "{:?} is valid: {} transactions, account {}, currency {}",
        file,
        summary.transaction_count,
        summary.account_id.as_deref().unwrap_or("-"),
        summary.currency.as_deref().unwrap_or("-")
    );

    Ok(())
}
