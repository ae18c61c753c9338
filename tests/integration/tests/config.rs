//! Integration tests for engine configuration and the one-call pipeline.

mod common;

use common::init_tracing;
use pretty_assertions::assert_eq;
use quire::{ConfigError, EngineConfig, Error, Options, markdown_to_commonmark};
use rstest::rstest;

#[rstest]
#[case::defaults("{}", "\"Hi\" -- a\nb\n", "\"Hi\" -- a\nb\n")]
#[case::smart(r#"{ "options": ["smart"] }"#, "\"Hi\" -- a\n", "\u{201c}Hi\u{201d} \u{2013} a\n")]
#[case::nobreaks(r#"{ "options": ["nobreaks"] }"#, "a\nb\n", "a b\n")]
#[case::width(r#"{ "width": 10 }"#, "aaa bbb ccc ddd\n", "aaa bbb\nccc ddd\n")]
fn pipeline_follows_config(#[case] json: &str, #[case] input: &str, #[case] expected: &str) {
    init_tracing();
    let config = EngineConfig::from_json(json).unwrap();
    assert_eq!(markdown_to_commonmark(input, &config).unwrap(), expected);
}

#[test]
fn config_round_trips_through_json() {
    let config = EngineConfig::from(Options::SMART | Options::HARDBREAKS);
    let json = config.to_json().unwrap();
    let loaded = EngineConfig::from_json(&json).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(
        loaded.resolve_options().unwrap(),
        Options::SMART | Options::HARDBREAKS
    );
}

#[rstest]
#[case::unknown_option(r#"{ "options": ["footnotes"] }"#)]
#[case::unknown_field(r#"{ "wrap": 80 }"#)]
#[case::wrong_type(r#"{ "width": "wide" }"#)]
fn bad_configs_are_rejected(#[case] json: &str) {
    let err = EngineConfig::from_json(json).unwrap_err();
    let err: Error = err.into();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn unknown_option_is_named() {
    let err = EngineConfig::from_json(r#"{ "options": ["smart", "tables"] }"#).unwrap_err();
    assert!(matches!(&err, ConfigError::UnknownOption(name) if name == "tables"));
    assert_eq!(err.to_string(), "Unknown option: tables");
}
