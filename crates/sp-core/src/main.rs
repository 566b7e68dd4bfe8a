//! showproc - report a snapshot of the current processes.
//!
//! Entry point handling argument parsing, configuration resolution, logging
//! setup and the mapping of outcomes to exit codes.

use clap::{Args, Parser};
use sp_common::{OutputFormat, ProcessId};
use sp_core::config::{load_config, ConfigError, ConfigOptions, ConfigOverrides};
use sp_core::exit_codes::ExitCode;
use sp_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use sp_core::report::render;
use sp_core::{log_event, LiveSnapshotEngine, Snapshot, SnapshotError, SnapshotOptions};
use std::io::{self, BufWriter};
use std::path::PathBuf;

/// Report a snapshot of the current processes in `ps -ef` layout
#[derive(Parser, Debug)]
#[command(name = "showproc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(flatten)]
    snapshot: SnapshotArgs,
}

/// Options controlling configuration, output and diagnostics
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Config file (JSON); defaults to $XDG_CONFIG_HOME/showproc/config.json
    #[arg(long, env = "SHOWPROC_CONFIG")]
    config: Option<PathBuf>,

    /// Output format [default: table]
    #[arg(long, short = 'f')]
    format: Option<OutputFormat>,

    /// Increase log verbosity on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    /// Log format on stderr (human, jsonl)
    #[arg(long)]
    log_format: Option<LogFormat>,
}

/// Options controlling what is collected
#[derive(Args, Debug)]
struct SnapshotArgs {
    /// Only report these process ids (repeatable, comma-separated)
    #[arg(long, short = 'p', value_delimiter = ',')]
    pid: Vec<u32>,

    /// Extraction worker threads
    #[arg(long, short = 'j')]
    jobs: Option<usize>,

    /// Process-information filesystem root
    #[arg(long)]
    proc_root: Option<PathBuf>,

    /// Device directory searched for terminals
    #[arg(long)]
    dev_root: Option<PathBuf>,

    /// Maximum bytes read from each command line
    #[arg(long)]
    cmdline_max_bytes: Option<usize>,
}

impl SnapshotArgs {
    fn overrides(&self, format: Option<OutputFormat>) -> ConfigOverrides {
        ConfigOverrides {
            proc_root: self.proc_root.clone(),
            dev_root: self.dev_root.clone(),
            cmdline_max_bytes: self.cmdline_max_bytes,
            jobs: self.jobs,
            format,
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version land here too, on stdout
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            let _ = err.print();
            std::process::exit(code.as_i32());
        }
    };

    let log_config = LogConfig::from_env(
        LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet),
        cli.global.log_format,
    );
    init_logging(&log_config);

    let ctx = LogContext::new(generate_run_id());
    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_STARTED,
        Stage::Init,
        "Starting snapshot",
        version = env!("CARGO_PKG_VERSION")
    );

    let exit_code = run(&cli, &ctx);
    std::process::exit(exit_code.as_i32());
}

fn run(cli: &Cli, ctx: &LogContext) -> ExitCode {
    let options = ConfigOptions {
        config_path: cli.global.config.clone(),
        cli: cli.snapshot.overrides(cli.global.format),
    };
    let resolved = match load_config(&options) {
        Ok(resolved) => resolved,
        Err(err) => return config_failure(ctx, &err),
    };
    let config = resolved.config;
    log_event!(
        ctx,
        DEBUG,
        event_names::CONFIG_LOADED,
        Stage::Init,
        "Configuration resolved",
        source = tracing::field::debug(&resolved.source_path),
        proc_root = tracing::field::display(config.proc_root.display()),
        dev_root = tracing::field::display(config.dev_root.display()),
        jobs = config.jobs as u64,
        format = tracing::field::display(config.format)
    );

    let engine = match LiveSnapshotEngine::from_config(&config) {
        Ok(engine) => engine,
        Err(err) => return snapshot_failure(ctx, &err),
    };
    let clock = engine.clock();
    log_event!(
        ctx,
        DEBUG,
        event_names::CLOCK_READ,
        Stage::Init,
        "Read clock baseline",
        boot_time = clock.boot_time(),
        now = clock.now(),
        ticks_per_second = clock.ticks_per_second()
    );

    let snapshot_options = SnapshotOptions {
        pids: cli.snapshot.pid.iter().copied().map(ProcessId).collect(),
        jobs: config.jobs,
    };
    let snapshot = match engine.take(&snapshot_options, ctx) {
        Ok(snapshot) => snapshot,
        Err(err) => return snapshot_failure(ctx, &err),
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if let Err(err) = render(&mut out, &snapshot, config.format) {
        if err.kind() != io::ErrorKind::BrokenPipe {
            eprintln!("showproc: cannot write report: {err}");
            return ExitCode::IoError;
        }
    }

    summarize(ctx, &snapshot)
}

/// Report skips on stderr and pick the exit code.
fn summarize(ctx: &LogContext, snapshot: &Snapshot) -> ExitCode {
    let vanished = snapshot
        .skipped
        .iter()
        .filter(|s| s.reason.is_expected_race())
        .count();
    log_event!(
        ctx,
        INFO,
        event_names::RUN_FINISHED,
        Stage::Report,
        "Snapshot complete",
        rows = snapshot.rows.len() as u64,
        skipped = snapshot.skipped.len() as u64,
        vanished = vanished as u64
    );

    if !snapshot.skipped.is_empty() || !snapshot.missing.is_empty() {
        eprintln!(
            "showproc: {} process(es) skipped ({} exited during the scan), {} requested pid(s) not found",
            snapshot.skipped.len(),
            vanished,
            snapshot.missing.len()
        );
    }
    if snapshot.is_partial() {
        ExitCode::Partial
    } else {
        ExitCode::Clean
    }
}

fn config_failure(ctx: &LogContext, err: &ConfigError) -> ExitCode {
    log_event!(
        ctx,
        DEBUG,
        event_names::INTERNAL_ERROR,
        Stage::Init,
        "Configuration rejected",
        error = tracing::field::display(err)
    );
    eprintln!("showproc: {err}");
    ExitCode::ArgsError
}

fn snapshot_failure(ctx: &LogContext, err: &SnapshotError) -> ExitCode {
    let code = match err {
        SnapshotError::Enumeration(e) if e.source.kind() == io::ErrorKind::PermissionDenied => {
            ExitCode::PermissionError
        }
        SnapshotError::Enumeration(_) | SnapshotError::Clock(_) => ExitCode::IoError,
        SnapshotError::WorkerPanicked => ExitCode::InternalError,
    };
    log_event!(
        ctx,
        DEBUG,
        event_names::INTERNAL_ERROR,
        Stage::Scan,
        "Snapshot failed",
        error = tracing::field::display(err),
        exit_code = code.code_name()
    );
    eprintln!("showproc: {err}");
    code
}
