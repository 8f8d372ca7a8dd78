//! YAML wire/boundary support for certificate snapshots.
//!
//! This crate provides **wire models** and **format/translation helpers** for the on-disk files
//! the certificate store hands to the presentation layer:
//! - person snapshots (a person, their vaccination state and their certificates)
//! - value-set files (code to display text tables)
//!
//! This crate focuses on:
//! - strict serialisation/deserialisation (`deny_unknown_fields`)
//! - translation between domain types from `certview-types` and wire structs
//! - reporting the failing path when a file does not match the wire schema

pub mod snapshot;
pub mod value_sets;

// Re-export facades
pub use snapshot::{PersonSnapshot, PersonSnapshotData};
pub use value_sets::ValueSets;

/// Errors returned by the `certview-wire` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("invalid UUID: {0}")]
    InvalidUuid(String),
}

/// Type alias for Results that can fail with a [`WireError`].
pub type WireResult<T> = Result<T, WireError>;

/// Deserialise `yaml_text` into `T`, naming the failing path on schema mismatch.
pub(crate) fn parse_strict<T>(yaml_text: &str, what: &str) -> WireResult<T>
where
    T: serde::de::DeserializeOwned,
{
    let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

    match serde_path_to_error::deserialize::<_, T>(deserializer) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() {
                "<root>"
            } else {
                path.as_str()
            };
            Err(WireError::Translation(format!(
                "{what} schema mismatch at {path}: {source}"
            )))
        }
    }
}
