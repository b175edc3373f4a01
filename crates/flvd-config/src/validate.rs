//! Value parsers shared by the environment loader.

use std::net::IpAddr;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

/// Strict boolean parse: unknown spellings are rejected instead of read as `false`.
pub(crate) fn parse_flag(field: &'static str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::invalid(field, "not_a_boolean", value)),
    }
}

pub(crate) fn parse_bind_addr(field: &'static str, value: &str) -> ConfigResult<IpAddr> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(field, "not_an_ip_address", value))
}

pub(crate) fn parse_port(field: &'static str, value: &str) -> ConfigResult<u16> {
    let port: u32 = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(field, "not_an_integer", value))?;
    if !(1..=65_535).contains(&port) {
        return Err(ConfigError::invalid(field, "out_of_range", value));
    }
    u16::try_from(port).map_err(|_| ConfigError::invalid(field, "out_of_range", value))
}

pub(crate) fn parse_positive(field: &'static str, value: &str, max: usize) -> ConfigResult<usize> {
    let parsed: usize = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(field, "not_an_integer", value))?;
    if parsed == 0 {
        return Err(ConfigError::invalid(field, "zero", value));
    }
    if parsed > max {
        return Err(ConfigError::invalid(field, "out_of_range", value));
    }
    Ok(parsed)
}

pub(crate) fn parse_secs(field: &'static str, value: &str) -> ConfigResult<Duration> {
    value
        .trim()
        .parse()
        .map(Duration::from_secs)
        .map_err(|_| ConfigError::invalid(field, "not_an_integer", value))
}

pub(crate) fn parse_choice<T>(
    field: &'static str,
    value: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> ConfigResult<T> {
    parse(value).ok_or_else(|| ConfigError::invalid(field, "unknown_variant", value))
}
