use once_cell::sync::Lazy;
use regex::Regex;

/// Lower case alphanumeric segments with inner hyphens, separated by dots.
pub const NAME_PATTERN: &str = r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$";

static NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(NAME_PATTERN).expect("file system name pattern is valid"));

/// Validate a file system name, returning the message shown next to the field.
pub fn validate_name(name: &str) -> Result<(), String> {
    match NAME_REGEX.is_match(name) {
        true => Ok(()),
        false => Err(format!("Must match the expression: {NAME_PATTERN}")),
    }
}
