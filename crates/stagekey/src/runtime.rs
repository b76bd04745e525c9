// Copyright (c) Contributors to the stagekey project.
// SPDX-License-Identifier: Apache-2.0

//! Runtime parsers invoked by generated programs.
//!
//! Emitted declarations name these functions (see
//! [`Converter::runtime_name`](crate::converter::Converter::runtime_name)), so
//! a program generated at configure time can link against this crate and
//! re-parse its own command-line input at startup. Each parser here must
//! accept exactly the texts produced by the matching converter's `serialize`,
//! otherwise a configure-resolved value cannot be reconstructed at runtime.

use crate::{Error, Result};

#[cfg(test)]
#[path = "./runtime_test.rs"]
mod runtime_test;

/// Parse a signed integer value.
pub fn int(raw: &str) -> Result<i64> {
    raw.parse().map_err(|_| Error::RuntimeParse {
        what: "integer".to_string(),
        input: raw.to_string(),
    })
}

/// Parse a floating point value.
pub fn float(raw: &str) -> Result<f64> {
    raw.parse().map_err(|_| Error::RuntimeParse {
        what: "float".to_string(),
        input: raw.to_string(),
    })
}

/// Parse a boolean value (`true` or `false`).
pub fn bool(raw: &str) -> Result<core::primitive::bool> {
    match raw {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::RuntimeParse {
            what: "boolean".to_string(),
            input: raw.to_string(),
        }),
    }
}

/// Parse a string value (never fails).
pub fn string(raw: &str) -> Result<String> {
    Ok(raw.to_string())
}

/// Build a parser for comma-separated lists of `elem` values.
///
/// The empty string parses to the empty list. Elements are split on `,`
/// without trimming, matching the list converter's `serialize`.
pub fn list<T>(elem: impl Fn(&str) -> Result<T>) -> impl Fn(&str) -> Result<Vec<T>> {
    move |raw: &str| {
        if raw.is_empty() {
            return Ok(Vec::new());
        }
        raw.split(',').map(|part| elem(part)).collect()
    }
}

/// Build a parser for optional `elem` values.
///
/// The empty string parses to `None`; anything else is parsed by `elem`.
pub fn option<T>(elem: impl Fn(&str) -> Result<T>) -> impl Fn(&str) -> Result<Option<T>> {
    move |raw: &str| {
        if raw.is_empty() {
            Ok(None)
        } else {
            elem(raw).map(Some)
        }
    }
}

/// Resolve a value from the actual runtime input, falling back to the
/// serialized configure-time value when the user supplied nothing.
pub fn resolve<T>(
    parser: impl Fn(&str) -> Result<T>,
    raw: Option<&str>,
    fallback: &str,
) -> Result<T> {
    match raw {
        Some(input) => parser(input),
        None => parser(fallback),
    }
}
