//! Input normalization shared by the stores

use crate::{Error, Result};

/// Trim a required text field, rejecting blank values
pub(crate) fn required_text(value: &str, message: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(message.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Accept `#rgb` or `#rrggbb`, lowercased; fall back to `default` when absent
pub(crate) fn color_or(value: Option<&str>, default: &str) -> Result<String> {
    match value.map(str::trim) {
        None | Some("") => Ok(default.to_string()),
        Some(color) => normalize_color(color),
    }
}

pub(crate) fn normalize_color(value: &str) -> Result<String> {
    let value = value.trim();
    let valid = value
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()));
    if !valid {
        return Err(Error::InvalidInput(format!("Invalid color '{}'", value)));
    }
    Ok(value.to_lowercase())
}
