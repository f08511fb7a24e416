// ABOUTME: Shared test support for integration tests.
// ABOUTME: Provides the in-memory fake runtime and descriptor helpers.

pub mod fake_runtime;

use flotilla::config::Descriptor;

/// Parse a descriptor from inline YAML, panicking on error.
pub fn descriptor(yaml: &str) -> Descriptor {
    Descriptor::from_yaml(yaml).expect("test descriptor should parse")
}
