// Copyright (c) Contributors to the stagekey project.
// SPDX-License-Identifier: Apache-2.0

//! Proxy keys: boolean switches that cascade derived values into other keys.
//!
//! A proxy is a configure-stage flag. When it parses true, each of its
//! setters derives a value for a target key; a `Some` result becomes an
//! override default for that target for the remainder of the resolution
//! pass. Explicit user input for the target always wins over any
//! proxy-derived value.

use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

use crate::converter;
use crate::key::{Key, Stage, UntypedKey};
use crate::resolve::{ResolutionMap, Stored};
use crate::value::DepSet;
use crate::Result;

#[cfg(test)]
#[path = "./proxy_test.rs"]
mod proxy_test;

/// A single cascade from a proxy to a target key.
pub struct Setter {
    target: UntypedKey,
    derive: Arc<dyn Fn(bool) -> Option<Stored> + Send + Sync>,
}

impl Setter {
    /// Cascade into `target`: when the proxy resolves true, `f` derives the
    /// override value, and `None` leaves the target untouched.
    pub fn new<U, F>(target: &Key<U>, f: F) -> Setter
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(bool) -> Option<U> + Send + Sync + 'static,
    {
        Setter {
            target: target.untyped(),
            derive: Arc::new(move |enabled| f(enabled).map(|v| Arc::new(v) as Stored)),
        }
    }

    /// The key this setter overrides.
    pub fn target(&self) -> &UntypedKey {
        &self.target
    }
}

struct ProxyEntry {
    key: UntypedKey,
    setters: Vec<Setter>,
}

/// Registered proxies in registration order. Cascade application follows
/// this order, so a later proxy's `Some` overrides an earlier one's.
static PROXIES: Lazy<Mutex<Vec<ProxyEntry>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Register a proxy: a configure-stage flag whose presence cascades the
/// given setters into their target keys.
pub fn proxy(
    name: impl Into<String>,
    doc: impl Into<String>,
    setters: Vec<Setter>,
) -> Result<Key<bool>> {
    let key = Key::builder(name, doc, false, converter::flag())
        .stage(Stage::Configure)
        .register()?;

    PROXIES.lock().unwrap().push(ProxyEntry {
        key: key.untyped(),
        setters,
    });

    Ok(key)
}

/// The dependency closure of a proxy: the proxy key itself plus every key
/// appearing as a cascade target.
pub fn proxy_closure(key: &Key<bool>) -> DepSet {
    let mut closure = DepSet::from([key.untyped()]);
    let proxies = PROXIES.lock().unwrap();
    for entry in proxies.iter() {
        if entry.key.name() != key.name() {
            continue;
        }
        closure.extend(entry.setters.iter().map(|s| s.target.clone()));
    }
    closure
}

/// Apply cascades for every enabled proxy in `selected`, in registration
/// order, recording derived values as override defaults in `map`.
///
/// Called by the resolver after explicit input has been recorded and only
/// for the configure stage; proxies are configuration switches, never
/// runtime-visible.
pub(crate) fn apply_cascades(selected: &DepSet, map: &mut ResolutionMap) {
    let proxies = PROXIES.lock().unwrap();
    for entry in proxies.iter() {
        if !selected.contains(&entry.key) {
            continue;
        }
        if !map.explicit_flag(entry.key.name()) {
            continue;
        }
        for setter in &entry.setters {
            if let Some(derived) = (setter.derive)(true) {
                tracing::debug!(
                    proxy = entry.key.name(),
                    target = setter.target.name(),
                    "applying proxy cascade"
                );
                map.insert_derived(setter.target.name(), derived);
            }
        }
    }
}
