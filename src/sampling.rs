// Copyright (C) 2021 Andreas Doerr
// SPDX-License-Identifier: Apache-2.0

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// 	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Sampling math for the difficulty-weighted proof protocol

use num_bigint::BigUint;
use num_traits::{FromPrimitive, ToPrimitive};

use crate::{hash::Hash, Error, Result};

#[cfg(test)]
#[path = "sampling_tests.rs"]
mod tests;

/// Security parameter. The adversary success probability is bounded by
/// `2^-LAMBDA`.
pub const LAMBDA: u32 = 50;

/// Assumed upper bound on the adversary's fraction of honest difficulty.
pub const C: f64 = 0.5;

fn to_f64(value: &BigUint) -> Result<f64> {
    value
        .to_f64()
        .filter(|v| v.is_finite())
        .ok_or(Error::DifficultyRange)
}

/// Number of difficulty-weighted samples needed to push the adversary's
/// success probability below `2^-LAMBDA`.
///
/// `r1` is the claimed additional difficulty, `r2` the total difficulty
/// including it. One more sample than the bound is requested.
pub(crate) fn query_count(r1: &BigUint, r2: &BigUint, leaf_count: u64) -> Result<u64> {
    let r1 = to_f64(r1)?;
    let r2 = to_f64(r2)?;

    // log_c(y) = log2(y) / log2(c)
    let log_c = (r1 / r2).log2() / C.log2();
    let x = (1.0 - 1.0 / log_c).max(0.0);

    let m = (-f64::from(LAMBDA) - (C * leaf_count as f64).log2()) / x.log2();

    Ok(m.ceil() as u64 + 1)
}

/// Ratio of the claimed additional difficulty to the proven total.
pub(crate) fn delta(r1: &BigUint, total: &BigUint) -> Result<f64> {
    Ok(to_f64(r1)? / to_f64(total)?)
}

/// Inverse-CDF transform mapping a uniform `y` in `[0, 1)` to a weight
/// skewed toward 1 according to `delta`.
pub(crate) fn cdf(y: f64, delta: f64) -> f64 {
    1.0 - (y * delta.ln()).exp()
}

/// Map a hash to a uniform value in `[0, 1)`.
///
/// The first 8 bytes are taken big-endian and the IEEE-754 sign and
/// exponent fields are forced so that the bits form a double in `[1, 2)`;
/// subtracting 1 yields `[0, 1)`. The construction is bit-exact, existing
/// proofs depend on it.
pub(crate) fn hash_to_f64(hash: &Hash) -> f64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&hash.as_ref()[..8]);

    let bits = u64::from_be_bytes(raw);
    let bits = (bits | 0x3FF0_0000_0000_0000) & 0x3FFF_FFFF_FFFF_FFFF;

    f64::from_bits(bits) - 1.0
}

/// Scale a difficulty by a weight, truncating toward zero.
///
/// The locator and the proof verifier both use this conversion, so both
/// sides truncate identically.
pub(crate) fn scale_difficulty(difficulty: &BigUint, weight: f64) -> Result<BigUint> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(Error::InvalidWeight);
    }

    let scaled = to_f64(difficulty)? * weight;

    BigUint::from_f64(scaled.floor()).ok_or(Error::DifficultyRange)
}
