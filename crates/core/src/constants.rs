//! Constants used throughout the certview core crate.

/// Default directory for person snapshot files when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "certificate_data";

/// File extension of person snapshot files.
pub const SNAPSHOT_EXTENSION: &str = "yaml";

/// Locale used when none is configured.
pub const DEFAULT_LOCALE: crate::Locale = crate::Locale::En;
