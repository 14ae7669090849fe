//! Reference name validation.
//!
//! Reference names are keys of the `references` property file and are also
//! used on the command line, so they must survive both untouched:
//! - Must be non-empty
//! - Must not contain whitespace, `=`, `#`, `:` or control characters
//! - Must not contain `..` (reserved for diff ranges)
//! - Must not start or end with `.` or `/`
//! - Must not contain consecutive slashes (`//`)

use crate::error::{StoreError, StoreResult};

/// Characters that are forbidden anywhere in a reference name.
const FORBIDDEN_CHARS: &[char] = &['=', '#', ':', '\\'];

fn invalid(name: &str, reason: impl Into<String>) -> StoreError {
    StoreError::InvalidReferenceName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a reference name, returning `Ok(())` if valid.
///
/// ```
/// use arbor_store::validate_reference_name;
///
/// assert!(validate_reference_name("main").is_ok());
/// assert!(validate_reference_name("release/1.0").is_ok());
/// assert!(validate_reference_name("").is_err());
/// assert!(validate_reference_name("a..b").is_err());
/// ```
pub fn validate_reference_name(name: &str) -> StoreResult<()> {
    if name.is_empty() {
        return Err(invalid(name, "reference name must not be empty"));
    }
    if let Some(ch) = name
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_CHARS.contains(c))
    {
        return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
    }
    if name.contains("..") {
        return Err(invalid(name, "must not contain '..'"));
    }
    if name.starts_with('.') || name.ends_with('.') {
        return Err(invalid(name, "must not start or end with '.'"));
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid(name, "must not start or end with '/'"));
    }
    if name.contains("//") {
        return Err(invalid(name, "must not contain consecutive slashes '//'"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        for name in ["main", "dev", "feature/auth", "v1.2", "a-b_c"] {
            assert!(validate_reference_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn invalid_names() {
        for name in [
            "", "has space", "a=b", "a#b", "a:b", "a..b", ".hidden", "trail.", "/lead",
            "trail/", "a//b", "tab\there",
        ] {
            assert!(validate_reference_name(name).is_err(), "{name:?}");
        }
    }
}
