//! Input validation for caller-supplied fields.
//!
//! Every identifier that is embedded in a key is checked here before any
//! store call, so a value can never contain the `#` key separator and the
//! key mapping stays injective.

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::keys::MAX_NUMBER;

/// Length limits for validated fields.
pub mod limits {
    /// Maximum account (user or organization) name length.
    pub const MAX_ACCOUNT_NAME_LENGTH: usize = 39;
    /// Maximum repository name length.
    pub const MAX_REPO_NAME_LENGTH: usize = 100;
    /// Maximum issue / pull request title length.
    pub const MAX_TITLE_LENGTH: usize = 256;
    /// Maximum length of free-text bodies (issues, PRs, comments).
    pub const MAX_BODY_LENGTH: usize = 65_536;
    /// Maximum repository description or account bio length.
    pub const MAX_DESCRIPTION_LENGTH: usize = 1_024;
    /// Maximum display name, email or language length.
    pub const MAX_SHORT_TEXT_LENGTH: usize = 255;
    /// Maximum git branch name length.
    pub const MAX_BRANCH_LENGTH: usize = 255;
    /// Maximum label length.
    pub const MAX_LABEL_LENGTH: usize = 50;
    /// Maximum emoji identifier length (e.g. "thumbsup", "+1").
    pub const MAX_EMOJI_LENGTH: usize = 32;
    /// Maximum comment id length.
    pub const MAX_COMMENT_ID_LENGTH: usize = 64;
}

/// Error constants for validation failures.
pub mod errmsg {
    pub const EMPTY: &str = "must not be empty";
    pub const TOO_LONG: &str = "exceeds maximum length";
    pub const ACCOUNT_NAME_INVALID_START: &str = "must not start with a hyphen";
    pub const ACCOUNT_NAME_INVALID_CHARS: &str =
        "contains invalid characters (allowed: a-z, A-Z, 0-9, -)";
    pub const REPO_NAME_INVALID_CHARS: &str =
        "contains invalid characters (allowed: a-z, A-Z, 0-9, ., _, -)";
    pub const REPO_NAME_DOTS: &str = "must not be '.' or '..'";
    pub const SEPARATOR: &str = "must not contain '#'";
    pub const WHITESPACE: &str = "must not contain whitespace";
    pub const NUMBER_OUT_OF_RANGE: &str = "must be between 1 and 999999";
    pub const EMAIL_INVALID: &str = "must be of the form local@domain";
}

fn too_long(field: &str, max: usize, got: usize) -> Error {
    Error::validation(field, format!("{} (max: {max}, got: {got})", errmsg::TOO_LONG))
}

/// Validate an account name (users and organizations share one namespace).
///
/// Rules:
/// - 1 to 39 characters
/// - May contain: letters, digits, hyphen
/// - Must not start with a hyphen
pub fn validate_account_name(field: &str, name: &str) -> Result<()> {
    let first = name
        .chars()
        .next()
        .ok_or_else(|| Error::validation(field, errmsg::EMPTY))?;
    if name.len() > limits::MAX_ACCOUNT_NAME_LENGTH {
        return Err(too_long(field, limits::MAX_ACCOUNT_NAME_LENGTH, name.len()));
    }
    if first == '-' {
        return Err(Error::validation(field, errmsg::ACCOUNT_NAME_INVALID_START));
    }
    if !name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-') {
        return Err(Error::validation(field, errmsg::ACCOUNT_NAME_INVALID_CHARS));
    }
    Ok(())
}

/// Validate a repository name.
///
/// Rules:
/// - 1 to 100 characters
/// - May contain: letters, digits, `.`, `_`, `-`
/// - Must not be `.` or `..`
pub fn validate_repo_name(field: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::validation(field, errmsg::EMPTY));
    }
    if name.len() > limits::MAX_REPO_NAME_LENGTH {
        return Err(too_long(field, limits::MAX_REPO_NAME_LENGTH, name.len()));
    }
    if name == "." || name == ".." {
        return Err(Error::validation(field, errmsg::REPO_NAME_DOTS));
    }
    if !name
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'))
    {
        return Err(Error::validation(field, errmsg::REPO_NAME_INVALID_CHARS));
    }
    Ok(())
}

/// Validate an issue or pull request number against the key width.
pub fn validate_number(field: &str, number: u64) -> Result<u32> {
    match u32::try_from(number) {
        Ok(n) if (1..=MAX_NUMBER).contains(&n) => Ok(n),
        _ => Err(Error::validation(
            field,
            format!("{} (got: {number})", errmsg::NUMBER_OUT_OF_RANGE),
        )),
    }
}

/// Validate a key segment that is not otherwise constrained (comment ids,
/// emoji): non-empty, bounded, no separator, no whitespace.
pub fn validate_key_segment(field: &str, value: &str, max: usize) -> Result<()> {
    if value.is_empty() {
        return Err(Error::validation(field, errmsg::EMPTY));
    }
    if value.len() > max {
        return Err(too_long(field, max, value.len()));
    }
    if value.contains('#') {
        return Err(Error::validation(field, errmsg::SEPARATOR));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(Error::validation(field, errmsg::WHITESPACE));
    }
    Ok(())
}

/// Required free text: non-blank and bounded.
pub fn validate_text(field: &str, value: &str, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(field, errmsg::EMPTY));
    }
    validate_optional_text(field, Some(value), max)
}

/// Optional free text: bounded when present.
pub fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> Result<()> {
    match value {
        Some(v) if v.len() > max => Err(too_long(field, max, v.len())),
        _ => Ok(()),
    }
}

pub fn validate_email(field: &str, email: Option<&str>) -> Result<()> {
    let Some(email) = email else {
        return Ok(());
    };
    validate_optional_text(field, Some(email), limits::MAX_SHORT_TEXT_LENGTH)?;
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace) =>
        {
            Ok(())
        }
        _ => Err(Error::validation(field, errmsg::EMAIL_INVALID)),
    }
}

/// Validate each member of a string set (assignees, labels).
pub fn validate_set(
    field: &str,
    values: &BTreeSet<String>,
    member: impl Fn(&str, &str) -> Result<()>,
) -> Result<()> {
    values.iter().try_for_each(|value| member(field, value))
}
