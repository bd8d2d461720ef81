use super::*;

pub(crate) static DIFFICULTY_1_TARGET: LazyLock<U256> =
    LazyLock::new(|| U256::from_big_endian(&Target::MAX.to_be_bytes()));

/// Converts a share difficulty into the 256-bit target a hash has to stay
/// under. Difficulty one is the genesis target; higher difficulties divide it
/// down. Fractional difficulties are handled by scaling the division so the
/// integer arithmetic keeps its precision.
pub(crate) fn diff_to_target(difficulty: f64) -> U256 {
    assert!(
        difficulty.is_finite() && difficulty > 0.0,
        "difficulty must be finite and > 0"
    );

    // 2^32 - 1 is safe: DIFFICULTY_1_TARGET (2^224) * scale fits in 256 bits.
    const MAX_SCALE_NUM: u64 = 0xFFFF_FFFF;

    let max_by_den = (u64::MAX as f64 / difficulty).floor();
    let scale = max_by_den.min(MAX_SCALE_NUM as f64).max(1.0) as u64;

    let numerator = (*DIFFICULTY_1_TARGET).saturating_mul(U256::from(scale));
    let denominator = (difficulty * scale as f64).round() as u64;

    if denominator == 0 {
        U256::MAX
    } else {
        numerator / U256::from(denominator)
    }
}

/// The same division in the other direction: how much difficulty a target
/// (or a hash treated as one) proves.
pub(crate) fn target_to_difficulty(target: U256) -> f64 {
    if target.is_zero() {
        return f64::INFINITY;
    }

    u256_to_f64(*DIFFICULTY_1_TARGET) / u256_to_f64(target)
}

/// The effective difficulty a share's hash proves, emitted as float or
/// integer depending on pool configuration.
pub(crate) fn share_difficulty(hash: U256, vdiff_float: bool) -> ShareDiff {
    if vdiff_float {
        ShareDiff::Float(target_to_difficulty(hash))
    } else if hash.is_zero() {
        ShareDiff::Int(u64::MAX)
    } else {
        let diff = *DIFFICULTY_1_TARGET / hash;
        if diff.bits() > 64 {
            ShareDiff::Int(u64::MAX)
        } else {
            ShareDiff::Int(diff.as_u64())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Display)]
pub enum ShareDiff {
    #[display("{_0}")]
    Int(u64),
    #[display("{_0}")]
    Float(f64),
}

impl ShareDiff {
    pub fn as_f64(self) -> f64 {
        match self {
            ShareDiff::Int(diff) => diff as f64,
            ShareDiff::Float(diff) => diff,
        }
    }
}

fn u256_to_f64(value: U256) -> f64 {
    value
        .0
        .iter()
        .enumerate()
        .map(|(i, limb)| *limb as f64 * 2f64.powi(64 * i as i32))
        .sum()
}
