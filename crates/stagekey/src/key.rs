// Copyright (c) Contributors to the stagekey project.
// SPDX-License-Identifier: Apache-2.0

//! Named, typed, staged configuration keys and the process-wide registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

use crate::converter::Converter;
use crate::resolve::ResolutionMap;
use crate::value::DepSet;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./key_test.rs"]
mod key_test;

/// When a key's concrete value becomes available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Resolved at configure time only; bakeable into generated output.
    Configure,
    /// Resolved only when the generated program starts.
    Run,
    /// Resolved at configure time and re-resolvable at runtime.
    Both,
}

impl Stage {
    /// True if the key is visible to the generated program's own parsing.
    pub fn is_runtime(self) -> bool {
        matches!(self, Stage::Run | Stage::Both)
    }

    /// True if the key participates in configure-time resolution.
    pub fn is_configure(self) -> bool {
        matches!(self, Stage::Configure | Stage::Both)
    }

    /// True if a key of this stage is resolvable at `stage`.
    pub(crate) fn participates_in(self, stage: Stage) -> bool {
        match stage {
            Stage::Configure => self.is_configure(),
            Stage::Run => self.is_runtime(),
            Stage::Both => true,
        }
    }
}

/// Type-erased view of a registered key.
///
/// Exposes only what dependency tracking, parsing, and emission need; the
/// concrete value type is recovered through the originating [`Key<T>`].
pub(crate) trait KeyInfo: Send + Sync {
    fn name(&self) -> &str;
    fn doc(&self) -> &str;
    fn stage(&self) -> Stage;
    fn env(&self) -> Option<&str>;
    fn takes_value(&self) -> bool;
    fn runtime_name(&self) -> String;
    fn serialized_default(&self) -> String;

    /// Parse `input` with the key's converter and record it as an explicit
    /// entry in `map`.
    fn parse_into(&self, input: &str, map: &mut ResolutionMap) -> Result<()>;

    /// Serialize the key's value under `map` (explicit, derived, or default).
    fn serialized(&self, map: &ResolutionMap) -> String;

    /// Render the key's value under `map` as a source-level literal.
    fn literal(&self, map: &ResolutionMap) -> String;
}

struct KeyData<T: Clone + Send + Sync + 'static> {
    name: String,
    doc: String,
    default: T,
    converter: Arc<dyn Converter<Output = T>>,
    stage: Stage,
    env: Option<String>,
}

impl<T: Clone + Send + Sync + 'static> KeyData<T> {
    /// Value under `map`: explicit entry, proxy-derived override, or default.
    fn current(&self, map: &ResolutionMap) -> T {
        map.stored(&self.name)
            .and_then(|stored| stored.downcast_ref::<T>())
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}

impl<T: Clone + Send + Sync + 'static> KeyInfo for KeyData<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn doc(&self) -> &str {
        &self.doc
    }

    fn stage(&self) -> Stage {
        self.stage
    }

    fn env(&self) -> Option<&str> {
        self.env.as_deref()
    }

    fn takes_value(&self) -> bool {
        self.converter.takes_value()
    }

    fn runtime_name(&self) -> String {
        self.converter.runtime_name()
    }

    fn serialized_default(&self) -> String {
        self.converter.serialize(&self.default)
    }

    fn parse_into(&self, input: &str, map: &mut ResolutionMap) -> Result<()> {
        let parsed = self
            .converter
            .parse(input)
            .map_err(|reason| Error::ParseFailure {
                key: self.name.clone(),
                input: input.to_string(),
                reason,
            })?;
        map.insert_explicit(&self.name, Arc::new(parsed));
        Ok(())
    }

    fn serialized(&self, map: &ResolutionMap) -> String {
        self.converter.serialize(&self.current(map))
    }

    fn literal(&self, map: &ResolutionMap) -> String {
        self.converter.literal(&self.current(map))
    }
}

/// A named, typed configuration slot with a default, converter, and stage.
///
/// Cheap to clone; all clones refer to the same registered key.
pub struct Key<T: Clone + Send + Sync + 'static> {
    data: Arc<KeyData<T>>,
}

impl<T: Clone + Send + Sync + 'static> Clone for Key<T> {
    fn clone(&self) -> Self {
        Key {
            data: self.data.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("name", &self.data.name)
            .field("stage", &self.data.stage)
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> Key<T> {
    /// Register a key with stage [`Stage::Both`].
    pub fn new(
        name: impl Into<String>,
        doc: impl Into<String>,
        default: T,
        converter: impl Converter<Output = T>,
    ) -> Result<Self> {
        Self::builder(name, doc, default, converter).register()
    }

    /// Start building a key; finish with [`KeyBuilder::register`].
    pub fn builder(
        name: impl Into<String>,
        doc: impl Into<String>,
        default: T,
        converter: impl Converter<Output = T>,
    ) -> KeyBuilder<T> {
        KeyBuilder {
            name: name.into(),
            doc: doc.into(),
            default,
            converter: Arc::new(converter),
            stage: Stage::Both,
            env: None,
        }
    }

    /// The key's unique name.
    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// The key's documentation string.
    pub fn doc(&self) -> &str {
        &self.data.doc
    }

    /// The stage at which this key is resolved.
    pub fn stage(&self) -> Stage {
        self.data.stage
    }

    /// The default used when no input resolves this key.
    pub fn default(&self) -> &T {
        &self.data.default
    }

    /// Environment variable consulted when the argument is absent, if any.
    pub fn env(&self) -> Option<&str> {
        self.data.env.as_deref()
    }

    /// Type-erased handle for dependency sets and emission.
    pub fn untyped(&self) -> UntypedKey {
        UntypedKey {
            info: self.data.clone(),
        }
    }

    /// Read this key's value under `map`, falling back to the default.
    pub fn get(&self, map: &ResolutionMap) -> T {
        self.data.current(map)
    }
}

/// Builder for [`Key`] registration.
pub struct KeyBuilder<T: Clone + Send + Sync + 'static> {
    name: String,
    doc: String,
    default: T,
    converter: Arc<dyn Converter<Output = T>>,
    stage: Stage,
    env: Option<String>,
}

impl<T: Clone + Send + Sync + 'static> KeyBuilder<T> {
    /// Set the key's stage (default: [`Stage::Both`]).
    pub fn stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    /// Consult an environment variable when the argument is absent.
    pub fn env(mut self, var: impl Into<String>) -> Self {
        self.env = Some(var.into());
        self
    }

    /// Register the key, failing if the name is already taken.
    pub fn register(self) -> Result<Key<T>> {
        let key = Key {
            data: Arc::new(KeyData {
                name: self.name,
                doc: self.doc,
                default: self.default,
                converter: self.converter,
                stage: self.stage,
                env: self.env,
            }),
        };

        let mut registry = REGISTRY.lock().unwrap();
        if registry.contains_key(key.name()) {
            return Err(Error::DuplicateKeyName(key.name().to_string()));
        }
        registry.insert(key.name().to_string(), key.untyped());
        tracing::debug!(key = key.name(), stage = ?key.stage(), "registered key");

        Ok(key)
    }
}

/// Register a boolean presence flag: default false, no argument value.
pub fn flag(name: impl Into<String>, doc: impl Into<String>, stage: Stage) -> Result<Key<bool>> {
    Key::builder(name, doc, false, crate::converter::flag())
        .stage(stage)
        .register()
}

/// A type-erased handle to a registered key.
///
/// Compares, orders, and hashes by key name, so dependency sets behave as
/// sets of key identities.
#[derive(Clone)]
pub struct UntypedKey {
    info: Arc<dyn KeyInfo>,
}

impl UntypedKey {
    /// The key's unique name.
    pub fn name(&self) -> &str {
        self.info.name()
    }

    /// The key's documentation string.
    pub fn doc(&self) -> &str {
        self.info.doc()
    }

    /// The stage at which this key is resolved.
    pub fn stage(&self) -> Stage {
        self.info.stage()
    }

    /// Environment variable fallback, if any.
    pub fn env(&self) -> Option<&str> {
        self.info.env()
    }

    /// Whether the key's argument takes a value.
    pub fn takes_value(&self) -> bool {
        self.info.takes_value()
    }

    /// Source expression naming the runtime parser for this key's type.
    pub fn runtime_name(&self) -> String {
        self.info.runtime_name()
    }

    pub(crate) fn serialized_default(&self) -> String {
        self.info.serialized_default()
    }

    pub(crate) fn parse_into(&self, input: &str, map: &mut ResolutionMap) -> Result<()> {
        self.info.parse_into(input, map)
    }

    pub(crate) fn serialized(&self, map: &ResolutionMap) -> String {
        self.info.serialized(map)
    }

    pub(crate) fn literal(&self, map: &ResolutionMap) -> String {
        self.info.literal(map)
    }
}

impl fmt::Debug for UntypedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UntypedKey")
            .field("name", &self.name())
            .field("stage", &self.stage())
            .finish()
    }
}

impl PartialEq for UntypedKey {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for UntypedKey {}

impl PartialOrd for UntypedKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UntypedKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name().cmp(other.name())
    }
}

impl std::hash::Hash for UntypedKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

/// Process-wide key catalog, populated during single-threaded authoring and
/// read-only afterwards. The lock exists so parallel tests stay safe.
static REGISTRY: Lazy<Mutex<BTreeMap<String, UntypedKey>>> =
    Lazy::new(|| Mutex::new(BTreeMap::new()));

/// Look up a registered key by name.
pub fn lookup(name: &str) -> Option<UntypedKey> {
    REGISTRY.lock().unwrap().get(name).cloned()
}

/// The subset of `keys` relevant to `stage`.
///
/// `Both`-stage keys appear in both the configure and run subsets, so callers
/// never ask the user for configure-only keys during runtime resolution and
/// vice versa.
pub fn filter_stage(stage: Stage, keys: &DepSet) -> DepSet {
    keys.iter()
        .filter(|key| key.stage().participates_in(stage))
        .cloned()
        .collect()
}
