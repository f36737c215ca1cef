mod algorithm;
mod cli;
mod config;
mod digest;
mod dispatch;
mod select;
mod task;
mod util;

use algorithm::Algorithm;
use anyhow::{Context, bail};
use cli::{Cli, Command};
use config::WorkspaceConfig;
use dispatch::{DispatchMode, TaskRequest, TargetOutcome};
use std::fmt as stdfmt;
use std::io::{IsTerminal, stderr};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Event, Level, Subscriber, error, info};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt as tracing_fmt;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

struct HashSumExitCode;

impl HashSumExitCode {
    /// Exit code used when at least one target failed.
    fn target_failed() -> ExitCode {
        ExitCode::from(1)
    }

    /// Exit code used for other errors (bad configuration, unknown task, etc.).
    fn any_error() -> ExitCode {
        ExitCode::from(255)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_level.as_deref());

    // Change working directory if -C was specified
    if let Some(directory) = cli.directory
        && let Err(e) = std::env::set_current_dir(&directory)
    {
        error!(
            "Failed to change directory to {}: {}",
            directory.display(),
            e
        );
        return HashSumExitCode::any_error();
    }

    let current_dir = PathBuf::from(".");

    let result: anyhow::Result<ExitCode> = match cli.command {
        Command::Calculate {
            algorithm,
            sequential,
        } => {
            let request = algorithm
                .map(TaskRequest::with_algorithm)
                .unwrap_or_default();
            handle_calculate(&current_dir, &request, dispatch_mode(sequential))
        }
        Command::Rule(args) => handle_rule(&current_dir, &args),
        Command::Inputs { task } => handle_inputs(&current_dir, &task),
        Command::Identify { path } => handle_identify(&path),
    };

    match result {
        Ok(exit_code) => exit_code,
        Err(err) => {
            error!("{err:#}");
            HashSumExitCode::any_error()
        }
    }
}

fn dispatch_mode(sequential: bool) -> DispatchMode {
    if sequential {
        DispatchMode::Sequential
    } else {
        DispatchMode::Parallel
    }
}

fn handle_rule(root: &Path, args: &[String]) -> anyhow::Result<ExitCode> {
    let Some((name, rest)) = args.split_first() else {
        bail!("Missing task name");
    };

    let request = TaskRequest::parse(name)?;
    let mode = rule_dispatch_mode(name, rest)?;
    if let Some(algorithm) = request.algorithm_override() {
        info!("Task {} overrides the algorithm with {}", name, algorithm);
    }
    handle_calculate(root, &request, mode)
}

/// Task rules accept the same `--sequential` flag as `calculate`.
fn rule_dispatch_mode(name: &str, args: &[String]) -> anyhow::Result<DispatchMode> {
    let mut sequential = false;
    for arg in args {
        match arg.as_str() {
            "--sequential" => sequential = true,
            other => bail!("Unexpected argument for {}: {}", name, other),
        }
    }
    Ok(dispatch_mode(sequential))
}

fn handle_calculate(
    root: &Path,
    request: &TaskRequest,
    mode: DispatchMode,
) -> anyhow::Result<ExitCode> {
    let config = WorkspaceConfig::load(root).context("Failed to load configuration")?;
    let targets = config.targets(root);

    let outcomes = dispatch::dispatch(&config.fingerprint, &targets, request, mode);

    for outcome in &outcomes {
        if let Ok(result) = &outcome.result {
            info!(
                "{}: {} {}",
                outcome.target, result.algorithm, result.hex_digest
            );
        }
    }

    Ok(summarize(&outcomes))
}

fn handle_inputs(root: &Path, task: &str) -> anyhow::Result<ExitCode> {
    let request = TaskRequest::parse(task)?;
    let config = WorkspaceConfig::load(root).context("Failed to load configuration")?;
    let targets = config.targets(root);

    let outcomes = dispatch::declare(
        &config.fingerprint,
        &targets,
        &request,
        DispatchMode::Sequential,
    );

    for outcome in &outcomes {
        let Ok(inputs) = &outcome.result else {
            continue;
        };

        println!("[{}]", outcome.target);
        println!("algorithm = {}", inputs.algorithm);
        println!("extensions = {}", inputs.extensions.join(", "));
        for file in &inputs.files {
            println!("input = {} ({} bytes)", file.path.display(), file.size);
        }
        for output in inputs.outputs() {
            println!("output = {}", output.display());
        }
        println!("fingerprint = {}", inputs.fingerprint());
        println!();
    }

    Ok(summarize(&outcomes))
}

fn handle_identify(path: &Path) -> anyhow::Result<ExitCode> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let algorithm = Algorithm::from_hex_digest(&content)?;
    println!("{algorithm}");

    Ok(ExitCode::SUCCESS)
}

fn summarize<T>(outcomes: &[TargetOutcome<T>]) -> ExitCode {
    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();

    if failed == 0 {
        info!("Processed {} targets", outcomes.len());
        return ExitCode::SUCCESS;
    }

    error!("{} of {} targets failed", failed, outcomes.len());
    HashSumExitCode::target_failed()
}

fn init_tracing(verbose: u8, log_level: Option<&str>) {
    let stderr_is_terminal = stderr().is_terminal();
    let formatter = EmojiFormatter { stderr_is_terminal };

    // An explicit --log-level or -v wins over RUST_LOG.
    let filter = match (log_level, verbose) {
        (Some(level), _) => EnvFilter::new(level),
        (None, 0) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        (None, 1) => EnvFilter::new("info"),
        (None, _) => EnvFilter::new("debug"),
    };

    let fmt_layer = tracing_fmt::layer()
        .event_format(formatter)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

struct EmojiFormatter {
    stderr_is_terminal: bool,
}

impl<S, N> FormatEvent<S, N> for EmojiFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> stdfmt::Result {
        if self.stderr_is_terminal {
            match *event.metadata().level() {
                Level::DEBUG => write!(writer, "🔍 ")?,
                Level::INFO => write!(writer, "ℹ️ ")?,
                Level::WARN => write!(writer, "⚠️  ")?,
                Level::ERROR => write!(writer, "❌️ ")?,
                _ => {}
            }
        } else {
            match *event.metadata().level() {
                Level::DEBUG => writer.write_str("DEBUG: ")?,
                Level::INFO => writer.write_str("INFO: ")?,
                Level::WARN => writer.write_str("WARN: ")?,
                Level::ERROR => writer.write_str("ERROR: ")?,
                _ => {}
            }
        }

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
