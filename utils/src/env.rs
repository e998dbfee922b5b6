use std::env::VarError;

use tracing::{debug, warn};

#[derive(thiserror::Error, Debug)]
pub enum EnvError {
    #[error("unable to retrieve {key}")]
    Missing { key: String },

    #[error("{key} is not valid unicode")]
    NotUnicode { key: String },
}

/// Reads an environment variable that must be present.
pub fn require(key: &str) -> Result<String, EnvError> {
    match std::env::var(key) {
        Ok(value) => {
            debug!(key, %value, "env");
            Ok(value)
        }
        Err(VarError::NotPresent) => Err(EnvError::Missing {
            key: key.to_string(),
        }),
        Err(VarError::NotUnicode(_)) => Err(EnvError::NotUnicode {
            key: key.to_string(),
        }),
    }
}

/// Reads a required variable as an unsigned number, taking its leading
/// decimal digits only (`"4,2"` is 4). A value without leading digits,
/// including a negative number such as `"-3"`, is 0.
pub fn require_u32(key: &str) -> Result<u32, EnvError> {
    let value = require(key)?;
    Ok(match leading_u32(&value) {
        Some(n) => n,
        None => {
            warn!(key, %value, "no leading number, using 0");
            0
        }
    })
}

/// Parses the leading run of ASCII digits after optional whitespace and `+`.
/// Returns `None` when there are no digits or they overflow `u32`.
pub fn leading_u32(value: &str) -> Option<u32> {
    let value = value.trim_start();
    let value = value.strip_prefix('+').unwrap_or(value);
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    value[..end].parse().ok()
}
