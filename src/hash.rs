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

//! Hash type and SHA3-256 hashing over the canonical RLP encoding

use core::{
    cmp::min,
    convert::AsRef,
    fmt::{self, Write},
};

use codec::{Decode, Encode};
use rlp::RlpStream;
use sha3::{Digest, Sha3_256};

use crate::Error;

#[cfg(test)]
#[path = "hash_tests.rs"]
mod tests;

macro_rules! to_hex {
    ($bytes:expr) => {{
        (|| -> Result<String, fmt::Error> {
            let mut s = String::with_capacity(64);

            for b in $bytes {
                write!(&mut s, "{:02x}", b)?
            }

            Ok(s)
        })()
    }};
}

/// Generic hash type which should be compatible with most hashes used
/// within the blockchain domain.
#[derive(Copy, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Hash([u8; 32]);

/// A hash consisting of all zeros.
pub const ZERO_HASH: Hash = Hash([0; 32]);

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const DISP_SIZE: usize = 12;

        let hex = to_hex!(&self.0)?;
        write!(f, "{}", &hex[..DISP_SIZE])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl rlp::Encodable for Hash {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.encoder().encode_value(&self.0);
    }
}

impl Hash {
    /// 32 byte hash
    pub const LEN: usize = 32;

    /// Return a hash initialized from `v`.
    ///
    /// At most, up to [`Hash::LEN`] bytes will be copied from `v`. If `v` has less
    /// than [`Hash::LEN`] bytes, the hash will be padded with 0's from left to right.
    pub fn from_vec(v: &[u8]) -> Hash {
        let mut h = [0; Hash::LEN];
        let sz = min(v.len(), Hash::LEN);
        h[..sz].copy_from_slice(&v[..sz]);
        Hash(h)
    }

    /// Retrun a hash initialized from string `hex`.
    ///
    /// An error is returned, if `hex` is not a well-formed hex string like `"0xcafe"`.
    pub fn from_hex(hex: &str) -> Result<Hash, Error> {
        match parse_hex(hex) {
            Ok(v) => Ok(Hash::from_vec(&v)),
            Err(s) => Err(Error::ParseHex(s)),
        }
    }

    /// Full hexadecimal rendering, for diagnostics.
    pub fn to_hex(&self) -> String {
        let hex: Result<String, fmt::Error> = to_hex!(&self.0);
        hex.unwrap_or_default()
    }
}

fn parse_hex(hex: &str) -> Result<Vec<u8>, String> {
    let hex = hex.trim().trim_start_matches("0x");

    if hex.len() % 2 != 0 {
        Err(hex.to_string())
    } else {
        (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| hex.to_string()))
            .collect()
    }
}

fn sha3(bytes: &[u8]) -> Hash {
    Hash::from_vec(&Sha3_256::digest(bytes))
}

/// Hash of two sibling hashes under the canonical encoding.
///
/// This is the merge function for internal MMR nodes as well as for bagging
/// peaks into the MMR root.
pub fn merge_hashes(left: &Hash, right: &Hash) -> Hash {
    let mut s = RlpStream::new_list(2);
    s.append(left);
    s.append(right);
    sha3(&s.out())
}

/// Per-query challenge hash, derived from the MMR root and the query index.
///
/// Each sampling query `i` draws its pseudorandomness from this hash, which
/// makes the whole challenge public and non-interactive.
pub fn challenge_hash(root: &Hash, index: u64) -> Hash {
    let mut s = RlpStream::new_list(2);
    s.append(root);
    s.append(&index);
    sha3(&s.out())
}

/// Hash of a single `u64` under the canonical encoding.
pub fn hash_u64(v: u64) -> Hash {
    sha3(&rlp::encode(&v))
}
