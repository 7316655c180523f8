//! Correlation Vector Library
//!
//! A correlation vector (cV) is a compact, versioned identifier used to
//! correlate related events across distributed service calls. One logical
//! operation keeps a stable random *base*; the dot-separated *extension*
//! path deepens by one field per service hop, letting downstream telemetry
//! reconstruct causal order without a central coordinator.
//!
//! # Overview
//!
//! - Inbound header values are parsed (leniently by default) into a
//!   [`CorrelationVector`].
//! - [`CorrelationVector::extend`] appends a `0` field: a new hop begins.
//! - [`CorrelationVector::increment`] advances the current hop's counter;
//!   it is safe to call from many threads sharing one instance.
//! - [`CorrelationVector::spin`] appends a clock-and-randomness field so
//!   uncoordinated producers branch from one base without colliding.
//! - When a length or depth ceiling is reached the vector *terminates*: the
//!   canonical string gains a trailing `!` and is frozen permanently. This
//!   is a designed degrade, not an error.
//!
//! # Example
//!
//! ```
//! use correlation_vector::{CorrelationVector, CorrelationVectorVersion, HEADER_NAME};
//!
//! // No inbound vector: mint a fresh one.
//! let cv = CorrelationVector::new(CorrelationVectorVersion::V2).unwrap();
//! assert_eq!(cv.extension(), vec![0]);
//!
//! // Inbound vector from a header: extend, then count outbound calls.
//! let cv = CorrelationVector::extend(Some("PmvzQKgYek6SdkT5sWaqwA.1")).unwrap();
//! assert_eq!(cv.value(), "PmvzQKgYek6SdkT5sWaqwA.1.0");
//! let outbound = cv.increment();
//! assert_eq!(outbound, "PmvzQKgYek6SdkT5sWaqwA.1.1");
//! assert_eq!(HEADER_NAME, "MS-CV");
//! ```
//!
//! # Modules
//!
//! - [`error`]: typed failures for strict parsing and entropy sources
//! - [`version`]: version profiles and their encoding rules
//! - [`base`]: the encoding alphabet and base-field generation
//! - [`validation`]: strict validation and [`ParseOptions`]
//! - [`vector`]: the value type and its mutators
//! - [`spin`]: spin parameters and the entropy engine

pub mod base;
pub mod error;
pub mod spin;
pub mod validation;
pub mod vector;
pub mod version;

pub use base::BASE_ALPHABET;
pub use error::CorrelationVectorError;
pub use spin::{SpinEntropy, SpinParameters, SpinPeriodicity};
pub use validation::{is_valid, validate_value, ParseOptions};
pub use vector::CorrelationVector;
pub use version::{CorrelationVectorVersion, EncodingRules};

/// Name of the header that carries the canonical string between services.
///
/// Transport itself is a collaborator concern; the core only exposes the
/// constant.
pub const HEADER_NAME: &str = "MS-CV";

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_round_trip_stability() {
        for &version in CorrelationVectorVersion::all() {
            let cv = CorrelationVector::new(version).unwrap();
            let parsed = CorrelationVector::parse(Some(&cv.value())).unwrap();
            assert_eq!(parsed.value(), cv.value());
            assert_eq!(parsed.version(), version);

            let strict =
                CorrelationVector::parse_with(Some(&cv.value()), &ParseOptions::strict()).unwrap();
            assert_eq!(strict.value(), cv.value());
        }
    }

    #[test]
    fn test_extend_none_defaults() {
        let cv = CorrelationVector::extend(None).unwrap();
        assert_eq!(cv.version(), CorrelationVectorVersion::V1);
        assert_eq!(cv.base().len(), 16);
        assert_eq!(cv.extension(), vec![0, 0]);
    }

    #[test]
    fn test_sequential_increments_are_strictly_increasing() {
        let cv = CorrelationVector::new(CorrelationVectorVersion::V2).unwrap();
        let mut previous = 0;
        for expected in 1..=200u32 {
            let value = cv.increment();
            let last = *cv.extension().last().unwrap();
            assert_eq!(last, expected);
            assert!(last > previous);
            assert!(value.ends_with(&last.to_string()));
            previous = last;
        }
    }

    #[test]
    fn test_concurrent_increments_lose_nothing() {
        let cv = Arc::new(CorrelationVector::new(CorrelationVectorVersion::V2).unwrap());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cv = Arc::clone(&cv);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    cv.increment();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*cv.extension().last().unwrap(), 800);
        assert!(!cv.is_terminated());
    }

    #[test]
    fn test_strict_and_lenient_asymmetry() {
        // Over the v1 length ceiling but structurally sound.
        let long = format!("abcdefghijklmnop{}", ".4294967295".repeat(5));

        let err = CorrelationVector::parse_with(Some(&long), &ParseOptions::strict()).unwrap_err();
        assert!(matches!(err, CorrelationVectorError::Malformed { .. }));

        let cv = CorrelationVector::parse(Some(&long)).unwrap();
        assert_eq!(cv.value(), long);
    }

    #[test]
    fn test_spin_branches_diverge() {
        let base = CorrelationVector::new(CorrelationVectorVersion::V2).unwrap();
        let value = base.value();
        // Full-width randomness bounds the collision probability at 2^-32.
        let parameters = SpinParameters {
            entropy: SpinEntropy::Four,
            periodicity: SpinPeriodicity::Fine,
        };
        let a =
            CorrelationVector::spin_with(Some(&value), &parameters, &ParseOptions::default())
                .unwrap();
        let b =
            CorrelationVector::spin_with(Some(&value), &parameters, &ParseOptions::default())
                .unwrap();
        assert_eq!(a.base(), b.base());
        assert_ne!(a.extension().last(), b.extension().last());
        assert_ne!(a.value(), b.value());
    }

    #[test]
    fn test_spin_branches_diverge_across_threads() {
        let base = CorrelationVector::new(CorrelationVectorVersion::V2).unwrap();
        let value = base.value();
        let parameters = SpinParameters {
            entropy: SpinEntropy::Four,
            periodicity: SpinPeriodicity::Fine,
        };
        let mut handles = Vec::new();
        for _ in 0..4 {
            let value = value.clone();
            handles.push(thread::spawn(move || {
                CorrelationVector::spin_with(
                    Some(&value),
                    &parameters,
                    &ParseOptions::default(),
                )
                .unwrap()
                .value()
            }));
        }
        let mut values: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        values.sort();
        values.dedup();
        assert_eq!(values.len(), 4);
    }

    #[test]
    fn test_worked_v1_example() {
        let cv = CorrelationVector::parse(Some("abcdefghijklmnop.0")).unwrap();
        assert_eq!(cv.increment(), "abcdefghijklmnop.1");
    }

    #[test]
    fn test_fan_out_pattern() {
        // One handler extends the inbound vector, then each sub-call spins
        // its own branch off the shared value.
        let inbound = "PmvzQKgYek6SdkT5sWaqwA.3";
        let handler = CorrelationVector::extend(Some(inbound)).unwrap();
        assert_eq!(handler.value(), "PmvzQKgYek6SdkT5sWaqwA.3.0");

        let branch_a = CorrelationVector::extend(Some(&handler.increment())).unwrap();
        let branch_b = CorrelationVector::extend(Some(&handler.increment())).unwrap();
        assert_eq!(branch_a.value(), "PmvzQKgYek6SdkT5sWaqwA.3.1.0");
        assert_eq!(branch_b.value(), "PmvzQKgYek6SdkT5sWaqwA.3.2.0");
    }
}
