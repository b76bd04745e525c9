// Copyright (c) Contributors to the stagekey project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;
use crate::converter::{self, Converter};

#[rstest]
fn test_int() {
    assert_eq!(int("42").unwrap(), 42);
    assert_eq!(int("-7").unwrap(), -7);
    assert!(matches!(
        int("forty-two"),
        Err(Error::RuntimeParse { .. })
    ));
}

#[rstest]
fn test_float() {
    assert_eq!(float("1.5").unwrap(), 1.5);
    assert!(float("").is_err());
}

#[rstest]
fn test_bool() {
    assert!(bool("true").unwrap());
    assert!(!bool("false").unwrap());
    assert!(bool("1").is_err());
}

#[rstest]
fn test_string_never_fails() {
    assert_eq!(string("").unwrap(), "");
    assert_eq!(string("anything").unwrap(), "anything");
}

#[rstest]
fn test_list() {
    let parse = list(int);
    assert_eq!(parse("80,443").unwrap(), vec![80, 443]);
    assert_eq!(parse("").unwrap(), Vec::<i64>::new());
    assert!(parse("80,oops").is_err());
}

#[rstest]
fn test_option() {
    let parse = option(int);
    assert_eq!(parse("").unwrap(), None);
    assert_eq!(parse("9090").unwrap(), Some(9090));
}

#[rstest]
fn test_resolve_prefers_actual_input() {
    assert_eq!(resolve(int, Some("9090"), "8080").unwrap(), 9090);
    assert_eq!(resolve(int, None, "8080").unwrap(), 8080);
    assert!(resolve(int, Some("oops"), "8080").is_err());
}

/// The runtime parsers must accept exactly what the converters produce;
/// otherwise emitted fallbacks cannot reconstruct configure-time values.
#[rstest]
fn test_agrees_with_converters() {
    let int_conv = converter::int();
    for value in [0_i64, 1234, -5] {
        let text = int_conv.serialize(&value);
        assert_eq!(int(&text).unwrap(), int_conv.parse(&text).unwrap());
    }

    let list_conv = converter::list_of(converter::int());
    let text = list_conv.serialize(&vec![80, 443]);
    assert_eq!(list(int)(&text).unwrap(), list_conv.parse(&text).unwrap());

    let opt_conv = converter::option_of(converter::string());
    let text = opt_conv.serialize(&Some("x".to_string()));
    assert_eq!(option(string)(&text).unwrap(), opt_conv.parse(&text).unwrap());
}
