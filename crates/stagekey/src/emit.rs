// Copyright (c) Contributors to the stagekey project.
// SPDX-License-Identifier: Apache-2.0

//! Emission of persisted declarations for the other stage.
//!
//! A resolved key is persisted as a declaration binding a deterministic name
//! to either a literal (the value is fixed for good) or a runtime-parser call
//! with a serialized fallback (the generated program may override the value
//! from its own input). The declaration is first captured as a [`Decl`] and
//! only turned into target text by [`Decl::render`], keeping the resolution
//! core free of target-syntax concerns.
//!
//! Rendered runtime calls assume the generated program exposes its raw
//! argument lookup as `matches.get(<key name>) -> Option<&str>` and links
//! against this crate's [`runtime`](crate::runtime) module.

use crate::key::{Stage, UntypedKey};
use crate::resolve::ResolutionMap;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./emit_test.rs"]
mod emit_test;

/// Rust keywords that a sanitized key name must not collide with.
const KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern", "false", "fn",
    "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
    "return", "self", "static", "struct", "super", "trait", "true", "type", "unsafe", "use",
    "where", "while",
];

/// Deterministic, collision-free identifier for a key's bound declaration.
///
/// Names already usable as identifiers pass through unchanged. Names that
/// need sanitizing, or that collide with a keyword, get a short hash of the
/// raw name appended, so `my-key` and `my_key` can never produce the same
/// binding.
pub fn binding_name(key: &UntypedKey) -> String {
    let name = key.name();
    let mut cleaned = String::with_capacity(name.len());
    for ch in name.chars() {
        if cleaned.is_empty() && ch.is_ascii_digit() {
            cleaned.push('_');
        }
        if ch.is_ascii_alphanumeric() || ch == '_' {
            cleaned.push(ch);
        } else {
            cleaned.push('_');
        }
    }
    if cleaned.is_empty() {
        cleaned.push('_');
    }

    if cleaned == name && !KEYWORDS.contains(&cleaned.as_str()) {
        cleaned
    } else {
        format!("{}_{:08x}", cleaned, fnv1a(name) as u32)
    }
}

/// The source fragment that reads an already-bound key value at its point
/// of use.
pub fn emit_call(key: &UntypedKey) -> String {
    binding_name(key)
}

/// How a persisted declaration produces its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclKind {
    /// The value is fixed: a source-level literal.
    Literal(String),
    /// The value is re-resolved by the generated program: a runtime-parser
    /// call over the other stage's actual input, with a serialized fallback.
    RuntimeCall { parser: String, fallback: String },
}

/// A persisted declaration for one key, ready to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decl {
    binding: String,
    key_name: String,
    kind: DeclKind,
}

impl Decl {
    /// The name the declaration binds.
    pub fn binding(&self) -> &str {
        &self.binding
    }

    /// The raw key name the declaration was emitted for.
    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// How the bound value is produced.
    pub fn kind(&self) -> &DeclKind {
        &self.kind
    }

    /// Format the declaration as target source text.
    pub fn render(&self) -> String {
        match &self.kind {
            DeclKind::Literal(literal) => format!("let {} = {};", self.binding, literal),
            DeclKind::RuntimeCall { parser, fallback } => format!(
                "let {} = stagekey::runtime::resolve({}, matches.get({:?}), {:?})?;",
                self.binding, parser, self.key_name, fallback
            ),
        }
    }
}

/// Emit the declaration for `key` under `map`.
///
/// Runtime-visible keys (stage `Run` or `Both`) become runtime-parser calls
/// whose fallback serializes the value resolved here — a `Both` key fixed at
/// configure time therefore stays overridable when the generated program
/// runs. Configure-only keys become literals.
pub fn declaration(map: &ResolutionMap, key: &UntypedKey) -> Decl {
    if key.stage().is_runtime() {
        Decl {
            binding: binding_name(key),
            key_name: key.name().to_string(),
            kind: DeclKind::RuntimeCall {
                parser: key.runtime_name(),
                fallback: key.serialized(map),
            },
        }
    } else {
        Decl {
            binding: binding_name(key),
            key_name: key.name().to_string(),
            kind: DeclKind::Literal(key.literal(map)),
        }
    }
}

/// Emit a literal declaration, freezing the key at its configure-resolved
/// value.
///
/// Fails with [`Error::StageMismatch`] for keys that are not resolvable at
/// configure time; the emitter never downgrades a key's stage silently.
pub fn configure_literal(map: &ResolutionMap, key: &UntypedKey) -> Result<Decl> {
    if !key.stage().is_configure() {
        return Err(Error::StageMismatch {
            key: key.name().to_string(),
            actual: key.stage(),
            requested: Stage::Configure,
        });
    }
    Ok(Decl {
        binding: binding_name(key),
        key_name: key.name().to_string(),
        kind: DeclKind::Literal(key.literal(map)),
    })
}

/// Emit a runtime-parser call declaration for a runtime-visible key.
///
/// Fails with [`Error::StageMismatch`] for configure-only keys, which the
/// generated program has no way to resolve.
pub fn runtime_call(map: &ResolutionMap, key: &UntypedKey) -> Result<Decl> {
    if !key.stage().is_runtime() {
        return Err(Error::StageMismatch {
            key: key.name().to_string(),
            actual: key.stage(),
            requested: Stage::Run,
        });
    }
    Ok(Decl {
        binding: binding_name(key),
        key_name: key.name().to_string(),
        kind: DeclKind::RuntimeCall {
            parser: key.runtime_name(),
            fallback: key.serialized(map),
        },
    })
}

fn fnv1a(input: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in input.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
