// Copyright (c) Contributors to the stagekey project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for stagekey operations.

use miette::Diagnostic;
use thiserror::Error;

use crate::key::Stage;

/// Convenience Result type with stagekey Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during stagekey operations.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Two registrations share a key name
    #[error("A key named {0:?} is already registered")]
    #[diagnostic(
        code(stagekey::duplicate_key_name),
        help("Key names are global to the program; pick a distinct name for each key")
    )]
    DuplicateKeyName(String),

    /// Command-line input did not match the key's converter
    #[error("Invalid value {input:?} for --{key}: {reason}")]
    #[diagnostic(code(stagekey::parse_failure))]
    ParseFailure {
        key: String,
        input: String,
        reason: String,
    },

    /// A binding was requested at a stage the key does not participate in
    #[error("Key {key:?} has stage {actual:?} and cannot be bound for the {requested:?} stage")]
    #[diagnostic(
        code(stagekey::stage_mismatch),
        help("Runtime-only keys must be resolved by the generated program; configure-only keys must be baked at configure time")
    )]
    StageMismatch {
        key: String,
        actual: Stage,
        requested: Stage,
    },

    /// Input contained arguments that match no key in the resolved set
    #[error("Unrecognized command-line input: {0}")]
    #[diagnostic(
        code(stagekey::unknown_arguments),
        help("Every argument must correspond to a registered key of the stage being resolved")
    )]
    UnknownArguments(#[source] clap::Error),

    /// A runtime parser rejected its input
    #[error("Invalid {what} value: {input:?}")]
    #[diagnostic(code(stagekey::runtime_parse))]
    RuntimeParse { what: String, input: String },
}
