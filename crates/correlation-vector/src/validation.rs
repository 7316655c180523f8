//! Strict validation of candidate correlation vector strings, and the
//! options object that controls parse behavior.

use serde::{Deserialize, Serialize};

use crate::base::is_base_char;
use crate::error::CorrelationVectorError;
use crate::vector::{DELIMITER, TERMINATOR};
use crate::version::CorrelationVectorVersion;

/// Options controlling [`crate::CorrelationVector::parse_with`] and the
/// parse step of `extend`/`spin`.
///
/// The original implementation family exposes a process-global "validate on
/// creation" switch; that hidden coupling is replaced here by an explicit
/// options value with the same lenient default. Telemetry pipelines depend on
/// being able to ingest slightly malformed vectors without failing, so
/// leniency is the default and strictness is opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// When true, parse rejects non-conforming input with
    /// [`CorrelationVectorError::Malformed`] or
    /// [`CorrelationVectorError::UnsupportedVersion`]. When false, input is
    /// accepted best-effort and round-trips as-is.
    pub validate: bool,
    /// Version used when the input is absent or its shape matches no known
    /// version.
    pub default_version: CorrelationVectorVersion,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            validate: false,
            default_version: CorrelationVectorVersion::V1,
        }
    }
}

impl ParseOptions {
    /// Returns options with strict validation enabled.
    pub fn strict() -> Self {
        Self {
            validate: true,
            ..Self::default()
        }
    }
}

/// Validates `value` against the encoding rules of its inferred version.
///
/// Checks, in order: a base field followed by at least one extension field;
/// base length matching a known version (otherwise
/// [`CorrelationVectorError::UnsupportedVersion`]); base characters inside
/// the alphabet; every extension field a decimal `u32` with no sign and no
/// leading zeros other than the literal `"0"`; at most one terminator, at
/// the very end; field count within the version's depth ceiling; total
/// length within the version's length ceiling.
///
/// # Returns
/// The inferred version on success.
///
/// # Example
/// ```
/// use correlation_vector::validation::validate_value;
/// use correlation_vector::CorrelationVectorVersion;
///
/// let version = validate_value("abcdefghijklmnop.3.11").unwrap();
/// assert_eq!(version, CorrelationVectorVersion::V1);
/// assert!(validate_value("abcdefghijklmnop.03").is_err());
/// ```
pub fn validate_value(value: &str) -> Result<CorrelationVectorVersion, CorrelationVectorError> {
    if value.is_empty() {
        return Err(CorrelationVectorError::malformed(value, "empty string"));
    }

    let body = match value.strip_suffix(TERMINATOR) {
        Some(body) => body,
        None => value,
    };
    if body.contains(TERMINATOR) {
        return Err(CorrelationVectorError::malformed(
            value,
            "terminator is only permitted at the end",
        ));
    }
    if body.is_empty() {
        return Err(CorrelationVectorError::malformed(value, "missing base"));
    }

    let mut fields = body.split(DELIMITER);
    let base = fields.next().unwrap_or(body);
    let version = CorrelationVectorVersion::from_base_length(base.len()).ok_or_else(|| {
        CorrelationVectorError::UnsupportedVersion {
            value: value.to_string(),
        }
    })?;
    if !base.chars().all(is_base_char) {
        return Err(CorrelationVectorError::malformed(
            value,
            "base contains characters outside the encoding alphabet",
        ));
    }

    let rules = version.rules();
    let mut depth = 0usize;
    for field in fields {
        depth += 1;
        validate_extension_field(value, field)?;
    }
    if depth == 0 {
        return Err(CorrelationVectorError::malformed(
            value,
            "missing extension field",
        ));
    }
    if depth > rules.max_extension_depth {
        return Err(CorrelationVectorError::malformed(
            value,
            format!(
                "{} extension fields exceed the {} maximum of {}",
                depth, version, rules.max_extension_depth
            ),
        ));
    }
    if value.len() > rules.max_vector_length {
        return Err(CorrelationVectorError::malformed(
            value,
            format!(
                "length {} exceeds the {} maximum of {}",
                value.len(),
                version,
                rules.max_vector_length
            ),
        ));
    }

    Ok(version)
}

/// Returns true if `value` passes strict validation.
pub fn is_valid(value: &str) -> bool {
    validate_value(value).is_ok()
}

fn validate_extension_field(value: &str, field: &str) -> Result<(), CorrelationVectorError> {
    if field.is_empty() {
        return Err(CorrelationVectorError::malformed(
            value,
            "empty extension field",
        ));
    }
    if !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CorrelationVectorError::malformed(
            value,
            format!("extension field '{}' is not a non-negative integer", field),
        ));
    }
    if field.len() > 1 && field.starts_with('0') {
        return Err(CorrelationVectorError::malformed(
            value,
            format!("extension field '{}' has leading zeros", field),
        ));
    }
    if field.parse::<u32>().is_err() {
        return Err(CorrelationVectorError::malformed(
            value,
            format!("extension field '{}' is out of range", field),
        ));
    }
    Ok(())
}
