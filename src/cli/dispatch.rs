//! Runs a parsed CLI invocation against the driver and reports the outcome.

use std::io::IsTerminal;

use crate::cli::{Cli, Command};
use crate::diagnostics::{ColorMode, ErrorFormat, FormatOptions, format_diagnostics};
use crate::driver::{CompileReport, CompilerDriver};
use crate::error::{Error, Result};
use crate::io_delegate::RealIoDelegate;
use crate::logging::{LogFormat, LogOptions};

/// Execute `cli` against `driver`, printing diagnostics to stderr.
///
/// # Errors
/// Returns an error when the task fails; diagnostics have already been
/// rendered by then.
pub fn run(driver: &CompilerDriver, cli: Cli) -> Result<()> {
    let log_options = cli.log_settings.merged_with_env().resolved();
    init_logging(&log_options);

    let io = RealIoDelegate;
    match cli.command {
        Command::Help => {
            println!("{}", Cli::usage());
            Ok(())
        }
        Command::Version => {
            println!("aidlc {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::CompileJava(options) => {
            let report = driver.compile_java(&options, &io);
            finish_task(report, cli.error_format, "compilation")
        }
        Command::CompileCpp(options) => {
            let report = driver.compile_cpp(&options, &io);
            finish_task(report, cli.error_format, "compilation")
        }
        Command::Preprocess(options) => {
            let report = driver.preprocess(&options, &io);
            finish_task(report, cli.error_format, "preprocessing")
        }
    }
}

/// Print a process-level error the way the binary reports failures.
pub fn report_error(error: &Error) {
    eprintln!("error: {error}");
}

fn finish_task(
    report: CompileReport,
    error_format: Option<ErrorFormat>,
    task: &str,
) -> Result<()> {
    if !report.diagnostics.is_empty() {
        let options = FormatOptions {
            format: error_format.unwrap_or(ErrorFormat::Short),
            color: ColorMode::Auto,
            is_terminal: std::io::stderr().is_terminal(),
        };
        eprintln!(
            "{}",
            format_diagnostics(&report.diagnostics, &report.files, options)
        );
    }
    if report.succeeded() {
        Ok(())
    } else {
        let noun = if report.errors == 1 { "error" } else { "errors" };
        Err(Error::compile(format!(
            "{task} failed with {} {noun}",
            report.errors
        )))
    }
}

fn init_logging(options: &LogOptions) {
    use std::sync::OnceLock;
    use tracing_subscriber::{EnvFilter, fmt};

    static INITIALISED: OnceLock<()> = OnceLock::new();

    let _ = INITIALISED.get_or_init(|| {
        let use_ansi = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
        let level = options.level.as_tracing_level();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(options.level.to_string()));

        match options.format {
            LogFormat::Json => {
                let subscriber = fmt::fmt()
                    .with_env_filter(filter)
                    .with_max_level(level)
                    .with_ansi(use_ansi)
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .json()
                    .finish();
                let _ = tracing::subscriber::set_global_default(subscriber);
            }
            _ => {
                let subscriber = fmt::fmt()
                    .with_env_filter(filter)
                    .with_max_level(level)
                    .with_ansi(use_ansi)
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .compact()
                    .finish();
                let _ = tracing::subscriber::set_global_default(subscriber);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    #[test]
    fn help_and_version_succeed() {
        let driver = CompilerDriver::new();
        let cli = Cli::parse_from(["help"].into_iter()).expect("parse help");
        assert!(run(&driver, cli).is_ok());
        let cli = Cli::parse_from(["version"].into_iter()).expect("parse version");
        assert!(run(&driver, cli).is_ok());
    }

    #[test]
    fn missing_input_surfaces_as_compile_error() {
        let driver = CompilerDriver::new();
        let cli = Cli::parse_from(
            ["compile-java", "definitely/missing/IGone.aidl", "out.java"].into_iter(),
        )
        .expect("parse compile");
        let err = run(&driver, cli).expect_err("missing input fails");
        assert!(err.to_string().contains("compilation failed"));
    }
}
