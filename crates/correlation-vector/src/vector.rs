//! The correlation vector value type and its mutators.

use std::sync::{Mutex, MutexGuard};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::base::{random_base, uuid_base};
use crate::error::CorrelationVectorError;
use crate::spin::{spin_value, SpinParameters};
use crate::validation::{validate_value, ParseOptions};
use crate::version::CorrelationVectorVersion;

/// Separator between the base and each extension field.
pub(crate) const DELIMITER: char = '.';

/// Marker appended once a vector is frozen by a length or depth ceiling.
pub(crate) const TERMINATOR: char = '!';

/// Mutable state shared by callers holding one vector instance.
///
/// `value` is the cached canonical string; every mutation keeps it in step
/// with `extension`/`terminated` under the same lock acquisition.
#[derive(Debug)]
struct Inner {
    extension: Vec<u32>,
    terminated: bool,
    value: String,
}

/// A correlation vector: a stable base plus a hierarchical extension path.
///
/// One logical operation keeps one base; the extension deepens by one field
/// per service hop (`extend`/`spin`) and the last field counts events at the
/// current hop (`increment`). Once a length or depth ceiling is hit, the
/// vector freezes: the canonical string gains a trailing `!` and never
/// changes again.
///
/// Instances may be shared across threads; `increment` serializes internally
/// so concurrent callers never lose or duplicate counts.
///
/// # Example
/// ```
/// use correlation_vector::CorrelationVector;
///
/// // An inbound header value gains one hop on arrival...
/// let cv = CorrelationVector::extend(Some("PmvzQKgYek6SdkT5sWaqwA.1")).unwrap();
/// assert_eq!(cv.value(), "PmvzQKgYek6SdkT5sWaqwA.1.0");
///
/// // ...and the new hop counts outbound events.
/// assert_eq!(cv.increment(), "PmvzQKgYek6SdkT5sWaqwA.1.1");
/// ```
#[derive(Debug)]
pub struct CorrelationVector {
    version: CorrelationVectorVersion,
    base: String,
    inner: Mutex<Inner>,
}

impl CorrelationVector {
    /// Creates a fresh vector for `version` with a random base and extension
    /// `[0]`.
    ///
    /// Fails only with [`CorrelationVectorError::RandomnessUnavailable`].
    pub fn new(version: CorrelationVectorVersion) -> Result<Self, CorrelationVectorError> {
        let base = random_base(version)?;
        Ok(Self::assemble(version, base, vec![0], false))
    }

    /// Creates a v2 vector whose base is derived deterministically from a
    /// caller-supplied UUID, with extension `[0]`.
    ///
    /// # Example
    /// ```
    /// use correlation_vector::CorrelationVector;
    /// use uuid::Uuid;
    ///
    /// let uuid = Uuid::parse_str("6ba7b810-9dad-11d1-80b4-00c04fd430c8").unwrap();
    /// let a = CorrelationVector::from_uuid(&uuid);
    /// let b = CorrelationVector::from_uuid(&uuid);
    /// assert_eq!(a.base(), b.base());
    /// ```
    pub fn from_uuid(uuid: &Uuid) -> Self {
        Self::assemble(
            CorrelationVectorVersion::V2,
            uuid_base(uuid),
            vec![0],
            false,
        )
    }

    /// Parses an inbound string with default (lenient) options.
    ///
    /// `None` or an empty string mints a fresh default-version vector, as if
    /// no correlation vector arrived with the request.
    pub fn parse(value: Option<&str>) -> Result<Self, CorrelationVectorError> {
        Self::parse_with(value, &ParseOptions::default())
    }

    /// Parses an inbound string.
    ///
    /// With `options.validate` set, non-conforming input fails with
    /// [`CorrelationVectorError::Malformed`] (or `UnsupportedVersion` when
    /// the base matches no known profile). Without it, input is accepted
    /// best-effort: the version falls back to `options.default_version` when
    /// the base shape matches nothing, numeric fields with leading zeros are
    /// normalized, over-length input is kept verbatim, and input without a
    /// parseable numeric tail is absorbed wholesale into the base so that it
    /// still round-trips.
    ///
    /// A trailing `!` marks the parsed vector as terminated.
    pub fn parse_with(
        value: Option<&str>,
        options: &ParseOptions,
    ) -> Result<Self, CorrelationVectorError> {
        let raw = match value {
            Some(s) if !s.is_empty() => s,
            _ => return Self::new(options.default_version),
        };

        if options.validate {
            let version = validate_value(raw)?;
            let (body, terminated) = split_terminator(raw);
            let mut fields = body.split(DELIMITER);
            let base = fields.next().unwrap_or(body).to_string();
            let extension = fields.filter_map(|f| f.parse::<u32>().ok()).collect();
            return Ok(Self::assemble(version, base, extension, terminated));
        }

        let (body, terminated) = split_terminator(raw);
        let mut fields = body.split(DELIMITER);
        let base = fields.next().unwrap_or(body);
        let extension: Option<Vec<u32>> = fields.map(|f| f.parse::<u32>().ok()).collect();
        let version = CorrelationVectorVersion::from_base_length(base.len())
            .unwrap_or(options.default_version);
        match extension {
            Some(extension) if !extension.is_empty() => Ok(Self::assemble(
                version,
                base.to_string(),
                extension,
                terminated,
            )),
            // No numeric tail at all: keep the whole body as the base so the
            // value round-trips. Such a vector cannot increment but can still
            // be extended.
            _ => Ok(Self::assemble(version, body.to_string(), vec![], terminated)),
        }
    }

    /// Parses (or mints) a vector and appends a `0` extension field: a new
    /// hop begins. Uses default (lenient) options.
    ///
    /// If the result would exceed the version's depth or length ceiling the
    /// append is suppressed and the parsed vector is returned terminated.
    pub fn extend(value: Option<&str>) -> Result<Self, CorrelationVectorError> {
        Self::extend_with(value, &ParseOptions::default())
    }

    /// [`CorrelationVector::extend`] with explicit parse options.
    pub fn extend_with(
        value: Option<&str>,
        options: &ParseOptions,
    ) -> Result<Self, CorrelationVectorError> {
        let cv = Self::parse_with(value, options)?;
        cv.append_segment(0);
        Ok(cv)
    }

    /// Like [`CorrelationVector::extend`], but the appended field carries a
    /// clock-and-randomness spin value instead of `0`, so uncoordinated
    /// producers branching from one base diverge. Uses default spin
    /// parameters and default (lenient) parse options.
    pub fn spin(value: Option<&str>) -> Result<Self, CorrelationVectorError> {
        Self::spin_with(value, &SpinParameters::default(), &ParseOptions::default())
    }

    /// [`CorrelationVector::spin`] with explicit spin parameters and parse
    /// options.
    pub fn spin_with(
        value: Option<&str>,
        parameters: &SpinParameters,
        options: &ParseOptions,
    ) -> Result<Self, CorrelationVectorError> {
        let cv = Self::parse_with(value, options)?;
        let segment = spin_value(parameters)?;
        cv.append_segment(segment);
        Ok(cv)
    }

    /// Increments the last extension field by one and returns the resulting
    /// canonical string.
    ///
    /// On a terminated vector this is a no-op returning the frozen string.
    /// If the incremented string would no longer fit the version's length
    /// ceiling (terminator included), the counter stays at its last valid
    /// value and the vector terminates instead. The whole operation is a
    /// single serialized mutation, so concurrent callers observe strictly
    /// increasing values and a consistent termination.
    pub fn increment(&self) -> String {
        let mut inner = self.lock();
        if inner.terminated || inner.extension.is_empty() {
            return inner.value.clone();
        }
        let rules = self.version.rules();
        let last = inner.extension.len() - 1;
        let next = match inner.extension[last].checked_add(1) {
            Some(next) => next,
            None => {
                // Counter exhaustion freezes the vector like a length
                // ceiling would; it never wraps.
                return terminate(&mut inner, rules.max_vector_length);
            }
        };
        let grown = decimal_width(next) - decimal_width(inner.extension[last]);
        if inner.value.len() + grown + 1 > rules.max_vector_length {
            return terminate(&mut inner, rules.max_vector_length);
        }
        inner.extension[last] = next;
        let value = render(&self.base, &inner.extension, false);
        inner.value = value;
        inner.value.clone()
    }

    /// The version whose encoding rules govern this vector.
    pub fn version(&self) -> CorrelationVectorVersion {
        self.version
    }

    /// The immutable base field.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// A snapshot of the extension fields.
    pub fn extension(&self) -> Vec<u32> {
        self.lock().extension.clone()
    }

    /// The canonical string: `base(.ext)+` with a trailing `!` once
    /// terminated.
    pub fn value(&self) -> String {
        self.lock().value.clone()
    }

    /// True once a ceiling has frozen this vector.
    pub fn is_terminated(&self) -> bool {
        self.lock().terminated
    }

    fn assemble(
        version: CorrelationVectorVersion,
        base: String,
        extension: Vec<u32>,
        terminated: bool,
    ) -> Self {
        let value = render(&base, &extension, terminated);
        Self {
            version,
            base,
            inner: Mutex::new(Inner {
                extension,
                terminated,
                value,
            }),
        }
    }

    /// Appends one extension field, or terminates if a ceiling is in the way.
    fn append_segment(&self, segment: u32) {
        let mut inner = self.lock();
        if inner.terminated {
            return;
        }
        let rules = self.version.rules();
        let new_len = inner.value.len() + 1 + decimal_width(segment);
        if inner.extension.len() + 1 > rules.max_extension_depth
            || new_len + 1 > rules.max_vector_length
        {
            terminate(&mut inner, rules.max_vector_length);
            return;
        }
        inner.extension.push(segment);
        inner.value.push(DELIMITER);
        inner.value.push_str(&segment.to_string());
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Mutations never panic between the extension and value updates, so
        // a poisoned guard still holds a consistent snapshot.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn terminate(inner: &mut Inner, max_vector_length: usize) -> String {
    inner.terminated = true;
    // Inbound vectors may already sit exactly at the ceiling; the frozen
    // string must still respect it, so the marker is dropped when there is
    // no room left.
    if inner.value.len() < max_vector_length {
        inner.value.push(TERMINATOR);
    }
    inner.value.clone()
}

fn render(base: &str, extension: &[u32], terminated: bool) -> String {
    let mut out = String::with_capacity(base.len() + 4 * extension.len() + 1);
    out.push_str(base);
    for field in extension {
        out.push(DELIMITER);
        out.push_str(&field.to_string());
    }
    if terminated {
        out.push(TERMINATOR);
    }
    out
}

fn decimal_width(n: u32) -> usize {
    let mut width = 1;
    let mut n = n / 10;
    while n > 0 {
        width += 1;
        n /= 10;
    }
    width
}

fn split_terminator(raw: &str) -> (&str, bool) {
    match raw.strip_suffix(TERMINATOR) {
        Some(body) => (body, true),
        None => (raw, false),
    }
}

impl Clone for CorrelationVector {
    fn clone(&self) -> Self {
        let inner = self.lock();
        Self::assemble(
            self.version,
            self.base.clone(),
            inner.extension.clone(),
            inner.terminated,
        )
    }
}

impl PartialEq for CorrelationVector {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version && self.value() == other.value()
    }
}

impl Eq for CorrelationVector {}

impl std::fmt::Display for CorrelationVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl std::str::FromStr for CorrelationVector {
    type Err = CorrelationVectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(Some(s))
    }
}

impl Serialize for CorrelationVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value())
    }
}

impl<'de> Deserialize<'de> for CorrelationVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        CorrelationVector::parse(Some(&value)).map_err(D::Error::custom)
    }
}
