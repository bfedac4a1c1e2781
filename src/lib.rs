#![deny(unsafe_code)]
#![warn(clippy::all)]

//! Core library for the `aidlc` interface compiler.
//!
//! The compiler turns an `.aidl` interface description into client proxy and
//! server stub source for the binder IPC transport. This crate holds the
//! front end (lexer, parser, import resolution), the language-parametric type
//! namespace, validation, and the driver that orchestrates a compilation; the
//! Java and C++ generators consume the validated interface it produces.

pub mod cli;
pub mod codegen;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod frontend;
pub mod io_delegate;
pub mod logging;
pub mod types;
pub mod validate;
