//! PostgreSQL Settings Migration Tool - CLI Interface
//! Author: kartik4091
//! Created: 2025-06-06
//!
//! Carries customized settings from an old configuration into a new one.

use clap::{Arg, ArgAction, ArgGroup, ArgMatches, Command, ValueEnum};
use gucmigrate::{
    MigrationConfig, MigrationSummary, Pipeline, ReportConfig, ReportFormat, SourceConfig,
    TargetConfig,
};
use std::path::PathBuf;
use std::process;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    /// Error messages only
    Error,
    /// Warning and error messages
    Warn,
    /// Info, warning, and error messages (default)
    Info,
    /// Debug and all messages
    Debug,
    /// Trace and all messages (most verbose)
    Trace,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportFormatArg {
    /// Plain text report
    Text,
    /// JSON report
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let matches = build_cli().get_matches();

    let log_level = if matches.get_flag("quiet") {
        LogLevel::Error
    } else {
        matches.get_one::<LogLevel>("verbose").copied().unwrap_or(LogLevel::Info)
    };
    init_logging(log_level);

    let config = config_from_matches(&matches);
    display_config_summary(&config);

    let mut pipeline = Pipeline::new(config);
    let start_time = std::time::Instant::now();

    match pipeline.execute().await {
        Ok(summary) => display_completion_summary(&summary, start_time.elapsed()),
        Err(e) => {
            error!("❌ {}", e);
            process::exit(1);
        }
    }
}

fn build_cli() -> Command {
    Command::new("gucmigrate")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Carry customized PostgreSQL settings from an old configuration into a new one")
        .long_about("Reads the non-default settings of an old postgresql.conf (plus its \
                    postgresql.auto.conf) or of a running server, and merges them into a new \
                    postgresql.conf or a running server. Renamed and removed settings are \
                    mapped or commented out, and every decision is reported.")

        // Source
        .arg(Arg::new("old_file")
            .long("old_file")
            .value_name("FILE")
            .value_parser(clap::value_parser!(PathBuf))
            .help("Old postgresql.conf to read settings from"))

        .arg(Arg::new("old_auto_file")
            .long("old_auto_file")
            .value_name("FILE")
            .value_parser(clap::value_parser!(PathBuf))
            .requires("old_file")
            .help("Old postgresql.auto.conf, read after --old_file"))

        .arg(Arg::new("old_conninfo")
            .long("old_conninfo")
            .value_name("CONNINFO")
            .help("Connection string of the old server"))

        // Target
        .arg(Arg::new("new_file")
            .long("new_file")
            .value_name("FILE")
            .value_parser(clap::value_parser!(PathBuf))
            .help("New postgresql.conf to rewrite in place"))

        .arg(Arg::new("new_conninfo")
            .long("new_conninfo")
            .value_name("CONNINFO")
            .help("Connection string of the new server (uses ALTER SYSTEM)"))

        // Output and reporting
        .arg(Arg::new("report")
            .short('r')
            .long("report")
            .value_name("FILE")
            .value_parser(clap::value_parser!(PathBuf))
            .help("Write a report of every decision"))

        .arg(Arg::new("report_format")
            .long("report_format")
            .value_parser(clap::value_parser!(ReportFormatArg))
            .requires("report")
            .help("Report format [default: text]"))

        .arg(Arg::new("dry_run")
            .long("dry_run")
            .action(ArgAction::SetTrue)
            .help("Show what would be done without changing the target"))

        // Logging
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .value_parser(clap::value_parser!(LogLevel))
            .default_value("info")
            .help("Set logging verbosity"))

        .arg(Arg::new("quiet")
            .short('q')
            .long("quiet")
            .action(ArgAction::SetTrue)
            .help("Suppress all output except errors"))

        // Exactly one source and one target
        .group(ArgGroup::new("source")
            .args(["old_file", "old_conninfo"])
            .required(true)
            .multiple(false))

        .group(ArgGroup::new("target")
            .args(["new_file", "new_conninfo"])
            .required(true)
            .multiple(false))
}

fn init_logging(level: LogLevel) {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let filter_level = match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(format!("gucmigrate={}", filter_level)))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn config_from_matches(matches: &ArgMatches) -> MigrationConfig {
    let source = match matches.get_one::<PathBuf>("old_file") {
        Some(path) => SourceConfig::File {
            path: path.clone(),
            auto_path: matches.get_one::<PathBuf>("old_auto_file").cloned(),
        },
        None => SourceConfig::Server {
            conninfo: matches.get_one::<String>("old_conninfo").cloned().unwrap_or_default(),
        },
    };

    let target = match matches.get_one::<PathBuf>("new_file") {
        Some(path) => TargetConfig::File { path: path.clone() },
        None => TargetConfig::Server {
            conninfo: matches.get_one::<String>("new_conninfo").cloned().unwrap_or_default(),
        },
    };

    let mut config = MigrationConfig::new(source, target);
    config.dry_run = matches.get_flag("dry_run");
    config.report = matches.get_one::<PathBuf>("report").map(|path| ReportConfig {
        output_path: path.clone(),
        format: match matches.get_one::<ReportFormatArg>("report_format") {
            Some(ReportFormatArg::Json) => ReportFormat::Json,
            _ => ReportFormat::PlainText,
        },
    });
    config
}

fn display_config_summary(config: &MigrationConfig) {
    info!("📋 Configuration Summary:");
    info!("   Source: {}", config.source_label());
    info!("   Target: {}", config.target_label());
    if config.dry_run {
        info!("   Mode:   dry run");
    }
    if let Some(report) = &config.report {
        info!("   Report: {}", report.output_path.display());
    }
}

fn display_completion_summary(summary: &MigrationSummary, duration: std::time::Duration) {
    info!("📊 Processing Summary:");
    info!("   Total Time: {:.2?}", duration);
    info!("   Non-default settings found: {}", summary.load.non_default);
    info!("   Overridden while loading:   {}", summary.load.overridden);
    if summary.load.malformed > 0 {
        info!("   Malformed lines ignored:    {}", summary.load.malformed);
    }
    info!("   Already matching:           {}", summary.changes.matched);
    info!("   Renamed:                    {}", summary.changes.renamed);
    info!("   Obsolete:                   {}", summary.changes.obsolete);
    info!("   Appended:                   {}", summary.changes.appended);
    info!("   Changes made:               {}", summary.changes.changed);
}
