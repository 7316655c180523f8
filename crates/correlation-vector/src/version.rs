//! Correlation vector versions and their encoding rules.

use serde::{Deserialize, Serialize};

/// Protocol versions supported by this crate.
///
/// Each version pins a set of [`EncodingRules`]. Adding a version means
/// adding a variant here plus one rules entry; everything else in the crate
/// is polymorphic over [`CorrelationVectorVersion::rules`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationVectorVersion {
    /// Legacy profile: 16-character base, 63-character ceiling.
    V1,
    /// Current profile: 22-character (UUID-derived) base, 127-character ceiling.
    V2,
}

/// Per-version encoding limits.
///
/// `max_extension_depth` is derived from the length ceiling: every extension
/// field costs at least two characters (`.0`), so the depth is
/// `(max_vector_length - base_length) / 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingRules {
    /// Number of characters in a freshly generated base.
    pub base_length: usize,
    /// Ceiling on the total canonical string length, terminator included.
    pub max_vector_length: usize,
    /// Ceiling on the number of `.`-separated extension fields.
    pub max_extension_depth: usize,
}

const V1_RULES: EncodingRules = EncodingRules {
    base_length: 16,
    max_vector_length: 63,
    max_extension_depth: 23,
};

const V2_RULES: EncodingRules = EncodingRules {
    base_length: 22,
    max_vector_length: 127,
    max_extension_depth: 52,
};

impl CorrelationVectorVersion {
    /// Returns the encoding rules for this version.
    pub fn rules(&self) -> &'static EncodingRules {
        match self {
            CorrelationVectorVersion::V1 => &V1_RULES,
            CorrelationVectorVersion::V2 => &V2_RULES,
        }
    }

    /// Returns the version as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationVectorVersion::V1 => "v1",
            CorrelationVectorVersion::V2 => "v2",
        }
    }

    /// Returns all supported versions.
    pub fn all() -> &'static [CorrelationVectorVersion] {
        &[CorrelationVectorVersion::V1, CorrelationVectorVersion::V2]
    }

    /// Returns the version whose base length is exactly `len`, if any.
    pub fn from_base_length(len: usize) -> Option<Self> {
        CorrelationVectorVersion::all()
            .iter()
            .copied()
            .find(|v| v.rules().base_length == len)
    }

    /// Infers the version of a candidate string from the length of its base
    /// field (everything before the first delimiter).
    ///
    /// Returns `None` for null/empty input or a base length that matches no
    /// known version; lenient callers substitute their configured default.
    /// Inference runs *before* validation because the validation rules are
    /// version-specific.
    ///
    /// # Example
    /// ```
    /// use correlation_vector::CorrelationVectorVersion;
    ///
    /// let v = CorrelationVectorVersion::infer(Some("abcdefghijklmnop.1"));
    /// assert_eq!(v, Some(CorrelationVectorVersion::V1));
    /// assert_eq!(CorrelationVectorVersion::infer(None), None);
    /// ```
    pub fn infer(value: Option<&str>) -> Option<Self> {
        let value = value?;
        if value.is_empty() {
            return None;
        }
        let base = value.split('.').next().unwrap_or(value);
        Self::from_base_length(base.len())
    }
}

impl std::fmt::Display for CorrelationVectorVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CorrelationVectorVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1" => Ok(CorrelationVectorVersion::V1),
            "v2" => Ok(CorrelationVectorVersion::V2),
            _ => Err(format!("unknown correlation vector version: {}", s)),
        }
    }
}
