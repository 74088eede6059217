//! # Environment Variables
//!
//! Typed access to the bridge's environment. Missing and malformed values are
//! distinct errors so callers can default the first and reject the second.

use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("environment variable {name} has an invalid value: {value:?}")]
    WrongFormat { name: &'static str, value: String },
}

/// Value of `name`; blank values count as unset.
pub fn get_env(name: &'static str) -> Result<String, Error> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::MissingEnv(name)),
    }
}

pub fn get_env_or(name: &'static str, default: &str) -> String {
    get_env(name).unwrap_or_else(|_| default.to_string())
}

pub fn get_env_parse<T: FromStr>(name: &'static str) -> Result<T, Error> {
    let value = get_env(name)?;
    value.trim().parse::<T>().map_err(|_| Error::WrongFormat { name, value })
}

/// Parse `name`, using `default` when unset. A set but unparsable value is
/// still an error.
pub fn get_env_parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, Error> {
    match get_env_parse(name) {
        Err(Error::MissingEnv(_)) => Ok(default),
        other => other,
    }
}

/// Comma separated list, trimmed, empty items dropped. Unset gives an empty list.
pub fn get_env_list(name: &'static str) -> Vec<String> {
    get_env(name)
        .map(|value| split_list(&value))
        .unwrap_or_default()
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
