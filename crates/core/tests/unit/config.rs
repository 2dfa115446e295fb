//! # Configuration Tests
//!
//! Defaults, JSON parsing, file loading, and validation.

use std::io::Write;

use pretty_assertions::assert_eq;
use weakmem_core::MemoryOrder;
use weakmem_core::common::ConfigError;
use weakmem_core::config::*;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert!(!config.general.trace_operations);
    assert_eq!(config.buffer.capacity, 2);
    assert_eq!(config.ordering.min_ordering, 0);
    assert_eq!(config.ordering.min_order(), MemoryOrder::NOT_ATOMIC);
}

#[test]
fn test_empty_json_is_default() {
    assert_eq!(Config::from_json("{}").unwrap(), Config::default());
}

#[test]
fn test_partial_sections_keep_defaults() {
    let config = Config::from_json(r#"{ "buffer": {} , "general": { "trace_operations": true } }"#).unwrap();
    assert_eq!(config.buffer.capacity, 2);
    assert!(config.general.trace_operations);
}

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "buffer": {{ "capacity": 8 }}, "ordering": {{ "min_ordering": 11 }} }}"#).unwrap();
    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.buffer.capacity, 8);
    assert_eq!(config.ordering.min_order(), MemoryOrder::RELEASE);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_malformed_json_is_parse_error() {
    let err = Config::from_json(r#"{ "buffer": { "capacity": "two" } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_unknown_order_bits_rejected() {
    let err = Config::from_json(r#"{ "ordering": { "min_ordering": 128 } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_oversized_capacity_rejected() {
    let err = Config::from_json(r#"{ "buffer": { "capacity": 40000 } }"#).unwrap_err();
    assert!(err.to_string().contains("buffer.capacity"));

    let largest = format!(r#"{{ "buffer": {{ "capacity": {MAX_CAPACITY} }} }}"#);
    assert_eq!(Config::from_json(&largest).unwrap().buffer.capacity, 32767);
}
