// Copyright (c) Contributors to the stagekey project.
// SPDX-License-Identifier: Apache-2.0

//! Per-type conversion strategies for key values.
//!
//! A [`Converter`] bundles everything the engine needs to move one value type
//! between its three representations: the textual argument form parsed from
//! command-line input, the canonical serialized text handed to the other
//! stage, and the source-level literal used when a value is baked into
//! generated output. One implementation exists per concrete type, plus
//! wrapping combinators for lists and options.

use crate::runtime;

#[cfg(test)]
#[path = "./converter_test.rs"]
mod converter_test;

/// Conversion strategy for one value type.
///
/// The central contract is `parse(serialize(x)) == x` for every `x` the
/// converter can itself produce: emitted declarations embed serialized text
/// and rely on the runtime parser named by [`runtime_name`](Self::runtime_name)
/// to reconstruct the exact configure-time value.
pub trait Converter: Send + Sync + 'static {
    /// Concrete value type this converter handles.
    type Output: Clone + Send + Sync + 'static;

    /// Parse a textual argument into a value.
    fn parse(&self, input: &str) -> Result<Self::Output, String>;

    /// Serialize a value into canonical text accepted by [`parse`](Self::parse).
    fn serialize(&self, value: &Self::Output) -> String;

    /// Render a value as a source-level literal for emitted declarations.
    ///
    /// Defaults to the serialized form, which is already literal-shaped for
    /// numeric and boolean values; string-like converters quote and escape.
    fn literal(&self, value: &Self::Output) -> String {
        self.serialize(value)
    }

    /// Source expression naming the parser the generated program invokes
    /// when it re-resolves this value at the other stage.
    fn runtime_name(&self) -> String;

    /// Whether the argument takes a value on the command line.
    ///
    /// False only for presence flags, where the bare argument means `true`.
    fn takes_value(&self) -> bool {
        true
    }
}

/// Converter for signed integers.
pub fn int() -> IntConverter {
    IntConverter
}

/// Converter for floating point numbers.
pub fn float() -> FloatConverter {
    FloatConverter
}

/// Converter for plain strings.
pub fn string() -> StringConverter {
    StringConverter
}

/// Converter for explicit `true`/`false` values.
pub fn boolean() -> BoolConverter {
    BoolConverter
}

/// Converter for presence flags: the argument takes no value and its
/// presence on the command line means `true`.
pub fn flag() -> FlagConverter {
    FlagConverter
}

/// Converter for comma-separated lists of `inner` values.
///
/// Elements must not contain the `,` separator; with that restriction the
/// round-trip contract holds element-wise.
pub fn list_of<C: Converter>(inner: C) -> ListOf<C> {
    ListOf(inner)
}

/// Converter for optional `inner` values, where the empty string means `None`.
pub fn option_of<C: Converter>(inner: C) -> OptionOf<C> {
    OptionOf(inner)
}

#[derive(Debug, Clone, Copy)]
pub struct IntConverter;

impl Converter for IntConverter {
    type Output = i64;

    fn parse(&self, input: &str) -> Result<i64, String> {
        runtime::int(input).map_err(|e| e.to_string())
    }

    fn serialize(&self, value: &i64) -> String {
        value.to_string()
    }

    fn runtime_name(&self) -> String {
        "stagekey::runtime::int".to_string()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FloatConverter;

impl Converter for FloatConverter {
    type Output = f64;

    fn parse(&self, input: &str) -> Result<f64, String> {
        runtime::float(input).map_err(|e| e.to_string())
    }

    fn serialize(&self, value: &f64) -> String {
        // Display of f64 is shortest round-trip text
        value.to_string()
    }

    fn literal(&self, value: &f64) -> String {
        // Debug keeps the decimal point so the literal stays a float
        format!("{value:?}")
    }

    fn runtime_name(&self) -> String {
        "stagekey::runtime::float".to_string()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StringConverter;

impl Converter for StringConverter {
    type Output = String;

    fn parse(&self, input: &str) -> Result<String, String> {
        Ok(input.to_string())
    }

    fn serialize(&self, value: &String) -> String {
        value.clone()
    }

    fn literal(&self, value: &String) -> String {
        format!("{value:?}")
    }

    fn runtime_name(&self) -> String {
        "stagekey::runtime::string".to_string()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BoolConverter;

impl Converter for BoolConverter {
    type Output = bool;

    fn parse(&self, input: &str) -> Result<bool, String> {
        runtime::bool(input).map_err(|e| e.to_string())
    }

    fn serialize(&self, value: &bool) -> String {
        value.to_string()
    }

    fn runtime_name(&self) -> String {
        "stagekey::runtime::bool".to_string()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FlagConverter;

impl Converter for FlagConverter {
    type Output = bool;

    fn parse(&self, input: &str) -> Result<bool, String> {
        runtime::bool(input).map_err(|e| e.to_string())
    }

    fn serialize(&self, value: &bool) -> String {
        value.to_string()
    }

    fn runtime_name(&self) -> String {
        "stagekey::runtime::bool".to_string()
    }

    fn takes_value(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ListOf<C>(C);

impl<C: Converter> Converter for ListOf<C> {
    type Output = Vec<C::Output>;

    fn parse(&self, input: &str) -> Result<Vec<C::Output>, String> {
        if input.is_empty() {
            return Ok(Vec::new());
        }
        input.split(',').map(|part| self.0.parse(part)).collect()
    }

    fn serialize(&self, value: &Vec<C::Output>) -> String {
        value
            .iter()
            .map(|v| self.0.serialize(v))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn literal(&self, value: &Vec<C::Output>) -> String {
        let items = value
            .iter()
            .map(|v| self.0.literal(v))
            .collect::<Vec<_>>()
            .join(", ");
        format!("vec![{items}]")
    }

    fn runtime_name(&self) -> String {
        format!("stagekey::runtime::list({})", self.0.runtime_name())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OptionOf<C>(C);

impl<C: Converter> Converter for OptionOf<C> {
    type Output = Option<C::Output>;

    fn parse(&self, input: &str) -> Result<Option<C::Output>, String> {
        if input.is_empty() {
            Ok(None)
        } else {
            self.0.parse(input).map(Some)
        }
    }

    fn serialize(&self, value: &Option<C::Output>) -> String {
        match value {
            None => String::new(),
            Some(v) => self.0.serialize(v),
        }
    }

    fn literal(&self, value: &Option<C::Output>) -> String {
        match value {
            None => "None".to_string(),
            Some(v) => format!("Some({})", self.0.literal(v)),
        }
    }

    fn runtime_name(&self) -> String {
        format!("stagekey::runtime::option({})", self.0.runtime_name())
    }
}
