//! Spin entropy: clock and randomness folded into a new extension segment.
//!
//! `spin` lets independently-operating producers branch from one shared base
//! without coordinating: each producer appends a segment whose value mixes
//! low-order wall-clock bits with OS randomness, so concurrent branches
//! diverge with probability bounded by the entropy width while the field
//! stays narrow enough to respect the version length ceilings.
//!
//! The exact Microsoft wire bit layout is not reproduced here; the constants
//! below are documented and conservative. See DESIGN.md.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::CorrelationVectorError;

/// How many bytes of OS randomness a spin mixes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpinEntropy {
    /// No randomness; the spin value is clock-only.
    None,
    /// One byte (8 bits).
    One,
    /// Two bytes (16 bits). The default.
    Two,
    /// Four bytes (32 bits); leaves no room for clock bits.
    Four,
}

impl SpinEntropy {
    /// Bit width of the random component.
    pub fn bits(&self) -> u32 {
        match self {
            SpinEntropy::None => 0,
            SpinEntropy::One => 8,
            SpinEntropy::Two => 16,
            SpinEntropy::Four => 32,
        }
    }
}

impl Default for SpinEntropy {
    fn default() -> Self {
        SpinEntropy::Two
    }
}

/// How many low-order bits of the millisecond tick counter a spin keeps.
///
/// Coarser settings produce shorter fields at the cost of collision
/// resistance between spins that land in the same clock window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpinPeriodicity {
    /// No clock bits.
    None,
    /// 16 bits. The default.
    Coarse,
    /// 24 bits.
    Medium,
    /// 32 bits.
    Fine,
}

impl SpinPeriodicity {
    /// Bit width of the clock component before capping.
    pub fn bits(&self) -> u32 {
        match self {
            SpinPeriodicity::None => 0,
            SpinPeriodicity::Coarse => 16,
            SpinPeriodicity::Medium => 24,
            SpinPeriodicity::Fine => 32,
        }
    }
}

impl Default for SpinPeriodicity {
    fn default() -> Self {
        SpinPeriodicity::Coarse
    }
}

/// Parameters for [`crate::CorrelationVector::spin_with`].
///
/// The defaults keep both components non-zero (16 clock bits, 16 random
/// bits) so concurrent spins on one base collide with probability at most
/// 2^-16 even inside a single clock tick, while the appended field never
/// exceeds one `u32`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinParameters {
    /// Random component width.
    pub entropy: SpinEntropy,
    /// Clock component width.
    pub periodicity: SpinPeriodicity,
}

/// Computes one spin value: `(clock_bits << entropy_width) | random_bits`.
///
/// The clock width is capped so the combined value always fits a single
/// `u32` extension field.
pub(crate) fn spin_value(params: &SpinParameters) -> Result<u32, CorrelationVectorError> {
    let entropy_bits = params.entropy.bits();
    let clock_bits = params.periodicity.bits().min(32 - entropy_bits);

    let mut random = 0u32;
    if entropy_bits > 0 {
        let mut buf = [0u8; 4];
        OsRng
            .try_fill_bytes(&mut buf[..(entropy_bits / 8) as usize])
            .map_err(|e| CorrelationVectorError::RandomnessUnavailable(e.to_string()))?;
        random = u32::from_le_bytes(buf) & mask(entropy_bits);
    }

    let ticks = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| {
            CorrelationVectorError::RandomnessUnavailable(format!(
                "system clock is before the unix epoch: {}",
                e
            ))
        })?
        .as_millis() as u64;
    let clock = (ticks as u32) & mask(clock_bits);

    Ok((((clock as u64) << entropy_bits) as u32) | random)
}

fn mask(bits: u32) -> u32 {
    if bits >= 32 {
        u32::MAX
    } else {
        (1u32 << bits) - 1
    }
}
