// Copyright (c) Contributors to the stagekey project.
// SPDX-License-Identifier: Apache-2.0

//! stagekey - staged, dependency-tracked configuration keys
//!
//! This crate is the configuration core of a device-composition DSL:
//! applications are assembled from interchangeable implementation modules
//! ("devices"), each parameterized by named configuration keys whose values
//! arrive at configure time, at runtime, or both.
//!
//! # Overview
//!
//! Devices build [`Value`]s out of [`Key`]s through the applicative
//! combinators, which track the full set of keys each value transitively
//! depends on. The resolver turns a key set into a command-line argument
//! specification, parses actual input into a [`ResolutionMap`], and values
//! are then evaluated against that map with per-key default fallback. The
//! emitter persists resolved keys as declarations the generated program can
//! evaluate at the other stage without re-running resolution.
//!
//! # Example
//!
//! ```
//! use stagekey::{converter, Key, Stage};
//!
//! let port = Key::builder("doc-port", "TCP port to listen on", 8080_i64, converter::int())
//!     .stage(Stage::Both)
//!     .register()
//!     .unwrap();
//!
//! let banner = port.value().map(|p| format!("listening on :{p}"));
//!
//! let map = stagekey::parse(Stage::Configure, banner.deps(), ["--doc-port=9090"]).unwrap();
//! assert_eq!(banner.eval(&map), "listening on :9090");
//! assert_eq!(map.get(&port), 9090);
//! ```

pub mod converter;
pub mod emit;
pub mod error;
pub mod key;
pub mod proxy;
pub mod resolve;
pub mod runtime;
pub mod value;

pub use emit::{
    binding_name, configure_literal, declaration, emit_call, runtime_call, Decl, DeclKind,
};
pub use error::{Error, Result};
pub use key::{filter_stage, flag, lookup, Key, KeyBuilder, Stage, UntypedKey};
pub use proxy::{proxy, proxy_closure, Setter};
pub use resolve::{command, parse, parse_value, ResolutionMap};
pub use value::{DepSet, Value};
