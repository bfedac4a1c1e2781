//! CLI front end: command parsing and dispatch for the `aidlc` binary.

pub mod dispatch;

use std::env;
use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use crate::diagnostics::ErrorFormat;
use crate::driver::{CppOptions, JavaOptions};
use crate::logging::{LogFormat, LogLevel, LogSettings};

/// Top-level commands supported by the `aidlc` CLI.
#[derive(Debug, Clone)]
pub enum Command {
    CompileJava(JavaOptions),
    CompileCpp(CppOptions),
    Preprocess(JavaOptions),
    Help,
    Version,
}

/// Parsed CLI invocation.
#[derive(Debug, Clone)]
pub struct Cli {
    pub command: Command,
    pub log_settings: LogSettings,
    pub error_format: Option<ErrorFormat>,
}

/// Error emitted while parsing command-line arguments.
#[derive(Debug, Clone)]
pub struct CliError {
    message: String,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn with_usage(message: impl Into<String>) -> Self {
        let mut owned = message.into();
        owned.push_str("\n\n");
        owned.push_str(&Cli::usage());
        Self::new(owned)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for CliError {}

impl Cli {
    /// Parse arguments from the environment.
    ///
    /// # Errors
    /// Returns a [`CliError`] when the arguments cannot be interpreted as a
    /// supported command.
    pub fn parse() -> Result<Self, CliError> {
        Self::parse_from(env::args().skip(1))
    }

    /// Parse arguments from an iterator (useful for testing).
    ///
    /// # Errors
    /// Returns a [`CliError`] when the provided iterator does not describe a
    /// valid invocation.
    pub fn parse_from<I, T>(args: I) -> Result<Self, CliError>
    where
        I: Iterator<Item = T>,
        T: Into<String>,
    {
        let mut iter = args.map(Into::into).peekable();
        let mut log_settings = LogSettings::default();
        let mut error_format = None;

        while let Some(flag) = iter.peek().cloned() {
            match flag.as_str() {
                "--log-level" => {
                    iter.next();
                    let value = expect_value(&mut iter, "--log-level")?;
                    log_settings.level = Some(
                        LogLevel::parse(&value)
                            .ok_or_else(|| CliError::new(format!("unknown log level '{value}'")))?,
                    );
                }
                "--log-format" => {
                    iter.next();
                    let value = expect_value(&mut iter, "--log-format")?;
                    log_settings.format = Some(
                        LogFormat::parse(&value)
                            .ok_or_else(|| CliError::new(format!("unknown log format '{value}'")))?,
                    );
                }
                "--error-format" => {
                    iter.next();
                    let value = expect_value(&mut iter, "--error-format")?;
                    error_format = Some(ErrorFormat::parse(&value).ok_or_else(|| {
                        CliError::new(format!("unknown error format '{value}'"))
                    })?);
                }
                _ => break,
            }
        }

        let Some(raw_command) = iter.next() else {
            return Err(CliError::with_usage("missing command"));
        };

        let command = match raw_command.as_str() {
            "compile-java" => Command::CompileJava(parse_compile_java(iter.collect())?),
            "compile-cpp" => Command::CompileCpp(parse_compile_cpp(iter.collect())?),
            "preprocess" => Command::Preprocess(parse_preprocess(iter.collect())?),
            "help" | "--help" | "-h" => Command::Help,
            "version" | "--version" | "-V" => Command::Version,
            other => {
                return Err(CliError::with_usage(format!("unknown command '{other}'")));
            }
        };

        Ok(Cli {
            command,
            log_settings,
            error_format,
        })
    }

    /// Return formatted general help text.
    #[must_use]
    pub fn usage() -> String {
        "usage: aidlc [--log-level LEVEL] [--log-format FORMAT] [--error-format FORMAT] COMMAND\n\
         \n\
         commands:\n\
         \x20 compile-java [-I DIR]... [-p FILE]... [-d DEPFILE] [-a] [-b] [-o FOLDER] INPUT [OUTPUT]\n\
         \x20     compile an interface to Java proxy/stub source\n\
         \x20 compile-cpp  [-I DIR]... [-p FILE]... INPUT OUTPUT\n\
         \x20     compile an interface to C++ proxy/stub source\n\
         \x20 preprocess   OUTPUT INPUT...\n\
         \x20     emit a compact declaration listing for later compilations\n\
         \x20 help | version\n\
         \n\
         options:\n\
         \x20 -I DIR      add DIR to the import search path\n\
         \x20 -p FILE     read preprocessed declarations from FILE\n\
         \x20 -d DEPFILE  write a make-style dependency file to DEPFILE\n\
         \x20 -a          write the dependency file next to the output (<output>.d)\n\
         \x20 -b          fail explicitly when the input declares a parcelable\n\
         \x20 -o FOLDER   derive the output path under FOLDER from the package\n"
            .to_string()
    }
}

fn expect_value(
    iter: &mut std::iter::Peekable<impl Iterator<Item = String>>,
    flag: &str,
) -> Result<String, CliError> {
    iter.next()
        .ok_or_else(|| CliError::with_usage(format!("expected value after {flag}")))
}

fn parse_compile_java(args: Vec<String>) -> Result<JavaOptions, CliError> {
    let mut options = JavaOptions::default();
    let mut positional = Vec::new();
    let mut iter = args.into_iter().peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-I" | "--import-path" => options
                .import_paths
                .push(PathBuf::from(expect_value(&mut iter, "-I")?)),
            "-p" | "--preprocessed" => options
                .preprocessed_files
                .push(PathBuf::from(expect_value(&mut iter, "-p")?)),
            "-d" | "--dep-file" => {
                options.dep_file_name = Some(PathBuf::from(expect_value(&mut iter, "-d")?));
            }
            "-o" | "--out-folder" => {
                options.output_base_folder = Some(PathBuf::from(expect_value(&mut iter, "-o")?));
            }
            "-a" => options.auto_dep_file = true,
            "-b" => options.fail_on_parcelable = true,
            _ if arg.starts_with("-I") && arg.len() > 2 => {
                options.import_paths.push(PathBuf::from(&arg[2..]));
            }
            _ if arg.starts_with("-p") && arg.len() > 2 => {
                options.preprocessed_files.push(PathBuf::from(&arg[2..]));
            }
            _ if arg.starts_with("-d") && arg.len() > 2 => {
                options.dep_file_name = Some(PathBuf::from(&arg[2..]));
            }
            _ if arg.starts_with("-o") && arg.len() > 2 => {
                options.output_base_folder = Some(PathBuf::from(&arg[2..]));
            }
            _ if arg.starts_with('-') => {
                return Err(CliError::with_usage(format!(
                    "unsupported option '{arg}' for compile-java"
                )));
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    options.input_file_name = PathBuf::from(
        positional
            .next()
            .ok_or_else(|| CliError::with_usage("compile-java requires an input file"))?,
    );
    options.output_file_name = positional.next().map(PathBuf::from);
    if let Some(extra) = positional.next() {
        return Err(CliError::with_usage(format!(
            "unexpected argument '{extra}' for compile-java"
        )));
    }
    if options.output_file_name.is_none() && options.output_base_folder.is_none() {
        return Err(CliError::with_usage(
            "compile-java requires an output file or -o FOLDER",
        ));
    }
    Ok(options)
}

fn parse_compile_cpp(args: Vec<String>) -> Result<CppOptions, CliError> {
    let mut options = CppOptions::default();
    let mut positional = Vec::new();
    let mut iter = args.into_iter().peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-I" | "--import-path" => options
                .import_paths
                .push(PathBuf::from(expect_value(&mut iter, "-I")?)),
            "-p" | "--preprocessed" => options
                .preprocessed_files
                .push(PathBuf::from(expect_value(&mut iter, "-p")?)),
            _ if arg.starts_with("-I") && arg.len() > 2 => {
                options.import_paths.push(PathBuf::from(&arg[2..]));
            }
            _ if arg.starts_with("-p") && arg.len() > 2 => {
                options.preprocessed_files.push(PathBuf::from(&arg[2..]));
            }
            _ if arg.starts_with('-') => {
                return Err(CliError::with_usage(format!(
                    "unsupported option '{arg}' for compile-cpp"
                )));
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    options.input_file_name = PathBuf::from(
        positional
            .next()
            .ok_or_else(|| CliError::with_usage("compile-cpp requires an input file"))?,
    );
    options.output_file_name = PathBuf::from(
        positional
            .next()
            .ok_or_else(|| CliError::with_usage("compile-cpp requires an output file"))?,
    );
    if let Some(extra) = positional.next() {
        return Err(CliError::with_usage(format!(
            "unexpected argument '{extra}' for compile-cpp"
        )));
    }
    Ok(options)
}

fn parse_preprocess(args: Vec<String>) -> Result<JavaOptions, CliError> {
    let mut options = JavaOptions::default();
    let mut positional = Vec::new();
    for arg in args {
        if arg.starts_with('-') {
            return Err(CliError::with_usage(format!(
                "unsupported option '{arg}' for preprocess"
            )));
        }
        positional.push(arg);
    }
    let mut positional = positional.into_iter();
    options.output_file_name = Some(PathBuf::from(positional.next().ok_or_else(|| {
        CliError::with_usage("preprocess requires an output file")
    })?));
    options.files_to_preprocess = positional.map(PathBuf::from).collect();
    if options.files_to_preprocess.is_empty() {
        return Err(CliError::with_usage(
            "preprocess requires at least one input file",
        ));
    }
    Ok(options)
}
