use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Whether the app process is put into its own process group before launch.
///
/// - `Auto`: new group where the platform has process groups, otherwise none.
/// - `None`: the child shares the supervisor's group and receives terminal
///   signals (Ctrl-C) directly.
/// - `NewGroup`: the child gets its own group, so signals sent to the
///   supervisor are not forwarded to it automatically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IsolateMode {
    #[default]
    Auto,
    None,
    NewGroup,
}

impl FromStr for IsolateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(IsolateMode::Auto),
            "none" => Ok(IsolateMode::None),
            "new-group" | "new_group" => Ok(IsolateMode::NewGroup),
            other => Err(format!(
                "invalid isolate mode: {other} (expected \"auto\", \"none\" or \"new-group\")"
            )),
        }
    }
}

/// Parse a simple duration string like `"5s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", s))
}

/// Split a `KEY=VALUE` environment entry.
///
/// The value may be empty or contain further `=`; the key may not be empty.
pub fn split_env_entry(entry: &str) -> Result<(&str, &str), String> {
    match entry.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        Some(_) => Err(format!("environment entry '{entry}' has an empty key")),
        None => Err(format!("environment entry '{entry}' must be KEY=VALUE")),
    }
}
