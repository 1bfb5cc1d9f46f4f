use std::{env, str::FromStr};

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Reads and parses the environment variable `name`.
///
/// Returns `None` if the variable is not set. A value that is set but cannot be parsed is reported back as an error
/// string so that the caller can decide how loudly to complain about it.
pub fn env_value<T>(name: &str) -> Option<Result<T, String>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(name).ok()?;
    Some(raw.trim().parse::<T>().map_err(|e| format!("{raw} is not a valid value for {name}. {e}")))
}
