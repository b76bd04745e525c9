// Copyright (c) Contributors to the stagekey project.
// SPDX-License-Identifier: Apache-2.0

//! Stage resolution: from a key set to an argument specification to a map.
//!
//! The resolver is a pure function from an argv-like string list to a
//! [`ResolutionMap`] — callers own whatever I/O produced that list. One
//! argument is constructed per key relevant to the requested stage; parsed
//! input is converted through each key's converter, then proxy cascades are
//! applied as override defaults (configure stage only).

use std::any::Any;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::sync::Arc;

use clap::{Arg, ArgAction, Command};

use crate::key::{filter_stage, Key, Stage, UntypedKey};
use crate::value::{DepSet, Value};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./resolve_test.rs"]
mod resolve_test;

/// Type-erased resolved value; recovered through the originating key.
pub(crate) type Stored = Arc<dyn Any + Send + Sync>;

/// Resolved values for one stage.
///
/// Explicit entries come from command-line input or environment-variable
/// fallbacks; derived entries come from proxy cascades. Lookup precedence is
/// explicit, then derived, then the key's own default, so a partially
/// populated map is always valid and reads never fail.
#[derive(Clone, Default)]
pub struct ResolutionMap {
    explicit: BTreeMap<String, Stored>,
    derived: BTreeMap<String, Stored>,
}

impl ResolutionMap {
    /// An empty map; every read falls back to the key's default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a key's value: explicit entry, derived override, or default.
    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &Key<T>) -> T {
        key.get(self)
    }

    /// True if `key` has an explicit entry (as opposed to a default or a
    /// proxy-derived value).
    pub fn is_explicit(&self, key: &UntypedKey) -> bool {
        self.explicit.contains_key(key.name())
    }

    /// True iff every dependency of `value` has an explicit entry.
    pub fn is_resolved<T>(&self, value: &Value<T>) -> bool
    where
        T: 'static,
    {
        value.deps().iter().all(|key| self.is_explicit(key))
    }

    /// Evaluate `value` only if it is resolvable purely from explicit
    /// entries. Callers use this to decide whether a value can be baked into
    /// generated output or must be deferred to the other stage.
    pub fn peek<T>(&self, value: &Value<T>) -> Option<T>
    where
        T: 'static,
    {
        if self.is_resolved(value) {
            Some(value.eval(self))
        } else {
            None
        }
    }

    pub(crate) fn insert_explicit(&mut self, name: &str, value: Stored) {
        self.explicit.insert(name.to_string(), value);
    }

    pub(crate) fn insert_derived(&mut self, name: &str, value: Stored) {
        self.derived.insert(name.to_string(), value);
    }

    pub(crate) fn stored(&self, name: &str) -> Option<&Stored> {
        self.explicit.get(name).or_else(|| self.derived.get(name))
    }

    /// Explicit boolean entry, false when absent. Used for proxy flags.
    pub(crate) fn explicit_flag(&self, name: &str) -> bool {
        self.explicit
            .get(name)
            .and_then(|stored| stored.downcast_ref::<bool>())
            .copied()
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for ResolutionMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionMap")
            .field("explicit", &self.explicit.keys().collect::<Vec<_>>())
            .field("derived", &self.derived.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Build the argument specification for `stage` over `keys`.
///
/// One `--<name>` argument per key in `filter_stage(stage, keys)`: help text
/// from the key's doc and default, presence flags for valueless keys, and
/// environment-variable fallbacks where registered. Help and version flags
/// are disabled; rendering help output is the caller's concern.
pub fn command(stage: Stage, keys: &DepSet) -> Command {
    let mut cmd = Command::new("stagekey")
        .no_binary_name(true)
        .disable_help_flag(true)
        .disable_version_flag(true);

    for key in filter_stage(stage, keys) {
        let mut arg = Arg::new(key.name().to_string()).long(key.name().to_string());

        if key.takes_value() {
            arg = arg
                .value_name("VALUE")
                .num_args(1)
                .help(format!("{} [default: {}]", key.doc(), key.serialized_default()));
        } else {
            arg = arg.action(ArgAction::SetTrue).help(key.doc().to_string());
        }

        if let Some(var) = key.env() {
            arg = arg.env(var.to_string());
        }

        cmd = cmd.arg(arg);
    }

    cmd
}

/// Parse argv-like input for `stage` over `keys` into a [`ResolutionMap`].
///
/// Malformed input for a key fails with [`Error::ParseFailure`] naming that
/// key; input matching no key fails with [`Error::UnknownArguments`]. Keys
/// absent from the input simply have no explicit entry and fall back to
/// proxy-derived values or defaults when read.
pub fn parse<I, S>(stage: Stage, keys: &DepSet, argv: I) -> Result<ResolutionMap>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
{
    let selected = filter_stage(stage, keys);
    let matches = command(stage, keys)
        .try_get_matches_from(argv)
        .map_err(Error::UnknownArguments)?;

    let mut map = ResolutionMap::new();
    for key in &selected {
        if key.takes_value() {
            if let Some(raw) = matches.get_one::<String>(key.name()) {
                key.parse_into(raw, &mut map)?;
            }
        } else if matches.get_flag(key.name()) {
            key.parse_into("true", &mut map)?;
        }
    }

    if stage.is_configure() {
        crate::proxy::apply_cascades(&selected, &mut map);
    }

    tracing::trace!(stage = ?stage, resolved = ?map, "parsed stage input");
    Ok(map)
}

/// Resolve everything `value` depends on for `stage`, then evaluate it.
///
/// The value's result is produced directly from the parsed input.
pub fn parse_value<T, I, S>(stage: Stage, value: &Value<T>, argv: I) -> Result<T>
where
    T: 'static,
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
{
    let map = parse(stage, value.deps(), argv)?;
    Ok(value.eval(&map))
}
