// Copyright (c) Contributors to the stagekey project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;
use crate::converter;
use crate::key::Key;
use crate::resolve::parse;
use crate::runtime;
use crate::value::DepSet;

fn configure_key(name: &str, default: i64) -> Key<i64> {
    Key::builder(name, "test key", default, converter::int())
        .stage(Stage::Configure)
        .register()
        .unwrap()
}

#[rstest]
fn test_binding_name_passes_clean_names_through() {
    let key = Key::new("emit_clean_name", "k", 0_i64, converter::int()).unwrap();
    assert_eq!(binding_name(&key.untyped()), "emit_clean_name");
}

#[rstest]
fn test_binding_name_is_deterministic_and_collision_free() {
    let dashed = Key::new("emit-my-key", "k", 0_i64, converter::int()).unwrap();
    let underscored = Key::new("emit_my_key", "k", 0_i64, converter::int()).unwrap();

    let a = binding_name(&dashed.untyped());
    let b = binding_name(&underscored.untyped());

    assert_eq!(a, binding_name(&dashed.untyped()));
    assert_ne!(a, b);
    assert!(a.starts_with("emit_my_key_"));
    assert_eq!(b, "emit_my_key");
}

#[rstest]
fn test_binding_name_avoids_keywords() {
    let key = Key::new("match", "keyword-named key", 0_i64, converter::int()).unwrap();
    let binding = binding_name(&key.untyped());
    assert_ne!(binding, "match");
    assert!(binding.starts_with("match_"));
}

#[rstest]
fn test_emit_call_references_the_binding() {
    let key = configure_key("emit_call_key", 0);
    assert_eq!(emit_call(&key.untyped()), binding_name(&key.untyped()));
}

#[rstest]
fn test_configure_key_emits_a_literal() {
    let key = configure_key("emit_rate", 8080);
    let map = parse(
        Stage::Configure,
        &DepSet::from([key.untyped()]),
        ["--emit_rate=9090"],
    )
    .unwrap();

    let decl = declaration(&map, &key.untyped());
    assert_eq!(decl.kind(), &DeclKind::Literal("9090".to_string()));
    assert_eq!(decl.render(), "let emit_rate = 9090;");
}

#[rstest]
fn test_run_key_emits_a_runtime_call() {
    let key = Key::builder("emit_run_port", "p", 8080_i64, converter::int())
        .stage(Stage::Run)
        .register()
        .unwrap();

    // The configure-stage map never saw this key; the fallback is the default
    let decl = declaration(&crate::ResolutionMap::new(), &key.untyped());
    assert_eq!(
        decl.kind(),
        &DeclKind::RuntimeCall {
            parser: "stagekey::runtime::int".to_string(),
            fallback: "8080".to_string(),
        }
    );
    assert_eq!(
        decl.render(),
        "let emit_run_port = stagekey::runtime::resolve(stagekey::runtime::int, matches.get(\"emit_run_port\"), \"8080\")?;"
    );
}

#[rstest]
fn test_both_key_stays_overridable_with_resolved_fallback() {
    let key = Key::new("emit_both_port", "p", 8080_i64, converter::int()).unwrap();
    let map = parse(
        Stage::Configure,
        &DepSet::from([key.untyped()]),
        ["--emit_both_port=9090"],
    )
    .unwrap();

    let decl = declaration(&map, &key.untyped());
    match decl.kind() {
        DeclKind::RuntimeCall { parser, fallback } => {
            assert_eq!(parser, "stagekey::runtime::int");
            // Fixed at configure time: the resolved value becomes the fallback
            assert_eq!(fallback, "9090");
        }
        other => panic!("expected RuntimeCall, got {other:?}"),
    }

    // The generated program reconstructs the value when not overridden
    let reconstructed = runtime::resolve(runtime::int, None, "9090").unwrap();
    assert_eq!(reconstructed, 9090);
    // And the user can still override it at runtime
    let overridden = runtime::resolve(runtime::int, Some("7070"), "9090").unwrap();
    assert_eq!(overridden, 7070);
}

#[rstest]
fn test_configure_literal_can_freeze_a_both_key() {
    let key = Key::new("emit_frozen", "p", 1_i64, converter::int()).unwrap();
    let map = parse(
        Stage::Configure,
        &DepSet::from([key.untyped()]),
        ["--emit_frozen=3"],
    )
    .unwrap();

    let decl = configure_literal(&map, &key.untyped()).unwrap();
    assert_eq!(decl.kind(), &DeclKind::Literal("3".to_string()));
}

#[rstest]
fn test_stage_mismatch_is_never_silent() {
    let run_only = Key::builder("emit_run_only", "r", 0_i64, converter::int())
        .stage(Stage::Run)
        .register()
        .unwrap();
    let cfg_only = configure_key("emit_cfg_only", 0);
    let map = crate::ResolutionMap::new();

    let err = configure_literal(&map, &run_only.untyped()).unwrap_err();
    assert!(matches!(
        err,
        Error::StageMismatch {
            requested: Stage::Configure,
            ..
        }
    ));

    let err = runtime_call(&map, &cfg_only.untyped()).unwrap_err();
    assert!(matches!(
        err,
        Error::StageMismatch {
            requested: Stage::Run,
            ..
        }
    ));
}

#[rstest]
fn test_string_literals_are_escaped() {
    let key = Key::builder(
        "emit_greeting",
        "g",
        String::new(),
        converter::string(),
    )
    .stage(Stage::Configure)
    .register()
    .unwrap();

    let map = parse(
        Stage::Configure,
        &DepSet::from([key.untyped()]),
        ["--emit_greeting=say \"hi\""],
    )
    .unwrap();

    let decl = declaration(&map, &key.untyped());
    assert_eq!(
        decl.kind(),
        &DeclKind::Literal("\"say \\\"hi\\\"\"".to_string())
    );
}
