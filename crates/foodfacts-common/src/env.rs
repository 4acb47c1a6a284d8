//! Typed environment variable access
//!
//! Blank values are treated as unset. Values that are present but do not
//! parse are reported as [`CommonError::InvalidEnv`] instead of silently
//! falling back to the default.

use std::{fmt::Display, str::FromStr};

use crate::{CommonError, Result};

/// Read a variable, trimming whitespace. Blank values count as unset.
pub fn var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read the first variable that is set among `keys`.
pub fn first_var(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| var(key))
}

/// Read and parse a variable.
pub fn parse_var<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match var(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| CommonError::InvalidEnv {
                key: key.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}

/// Read and parse a variable, falling back to `default` when unset.
pub fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    Ok(parse_var(key)?.unwrap_or(default))
}

/// String variable with a default.
pub fn string_or(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|| default.to_string())
}
