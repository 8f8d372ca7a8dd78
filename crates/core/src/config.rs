//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Binaries read environment variables and hand the raw values to the
//! `*_from_env_value` helpers below; nothing in this crate reads the environment itself.

use crate::constants::DEFAULT_LOCALE;
use crate::locale::{utc, DisplayContext, Locale};
use crate::{CoreError, CoreResult};
use chrono::FixedOffset;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    value_sets_file: Option<PathBuf>,
    display: DisplayContext,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if `data_dir` is not an existing directory or the
    /// value-set file does not exist.
    pub fn new(
        data_dir: PathBuf,
        value_sets_file: Option<PathBuf>,
        display: DisplayContext,
    ) -> CoreResult<Self> {
        if !data_dir.is_dir() {
            return Err(CoreError::InvalidInput(format!(
                "certificate data directory does not exist: {}",
                data_dir.display()
            )));
        }

        if let Some(file) = &value_sets_file {
            if !file.is_file() {
                return Err(CoreError::InvalidInput(format!(
                    "value set file does not exist: {}",
                    file.display()
                )));
            }
        }

        Ok(Self {
            data_dir,
            value_sets_file,
            display,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn value_sets_file(&self) -> Option<&Path> {
        self.value_sets_file.as_deref()
    }

    pub fn display(&self) -> &DisplayContext {
        &self.display
    }
}

/// Parse the display locale from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default locale.
pub fn locale_from_env_value(value: Option<String>) -> CoreResult<Locale> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(|v| v.parse::<Locale>()).transpose()?;

    Ok(parsed.unwrap_or(DEFAULT_LOCALE))
}

/// Parse the display UTC offset from an optional string value.
///
/// Accepts `Z`, `+HH:MM`, `-HH:MM` or `+HHMM`. If `value` is `None` or empty, returns UTC.
pub fn utc_offset_from_env_value(value: Option<String>) -> CoreResult<FixedOffset> {
    let Some(value) = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
    else {
        return Ok(utc());
    };

    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return Ok(utc());
    }

    // chrono ignores trailing input after the offset, so the shape is checked first
    let rest = value
        .strip_prefix('+')
        .or_else(|| value.strip_prefix('-'))
        .unwrap_or_default()
        .as_bytes();
    let well_formed = match rest {
        [h1, h2, b':', m1, m2] | [h1, h2, m1, m2] => {
            [h1, h2, m1, m2].iter().all(|b| b.is_ascii_digit())
        }
        _ => false,
    };
    if !well_formed {
        return Err(CoreError::InvalidInput(format!("invalid UTC offset: {value}")));
    }

    value
        .parse::<FixedOffset>()
        .map_err(|e| CoreError::InvalidInput(format!("invalid UTC offset {value}: {e}")))
}
