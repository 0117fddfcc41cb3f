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

//! Merkle Proof for a MMR path

use codec::{Decode, Encode};

use crate::{
    hash::{merge_hashes, Hash},
    utils::{get_peaks, parent_offset, pos_height_in_tree, pos_in_peaks},
};

#[cfg(test)]
#[path = "proof_tests.rs"]
mod tests;

/// Positional membership proof for a single leaf.
///
/// The path contains the sibling hashes up to the enclosing peak, then the
/// bagged hash of the peaks to the right (if any), then the left peaks from
/// right to left.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct MerkleProof {
    pub mmr_size: u64,
    pub path: Vec<Hash>,
}

impl Default for MerkleProof {
    fn default() -> Self {
        MerkleProof::new()
    }
}

impl MerkleProof {
    pub fn new() -> MerkleProof {
        MerkleProof {
            mmr_size: 0,
            path: Vec::default(),
        }
    }

    /// Verify that the leaf with `leaf_hash` is a MMR node at position
    /// `pos` given the root hash `root`.
    ///
    /// Peak bagging keeps the asymmetry of the root computation: the
    /// accumulated hash is the first merge argument at the last peak and
    /// the second one everywhere else.
    pub fn verify(&self, root: Hash, pos: u64, leaf_hash: Hash) -> bool {
        let peaks = get_peaks(self.mmr_size);

        let last_peak = match peaks.last() {
            Some(&p) => p,
            None => return false,
        };

        let mut pos = pos;
        let mut hash = leaf_hash;
        let mut height = 0;

        for proof in &self.path {
            // bagging peaks
            if pos_in_peaks(pos, &peaks) {
                if pos == last_peak {
                    hash = merge_hashes(&hash, proof);
                } else {
                    hash = merge_hashes(proof, &hash);
                    pos = last_peak;
                }
                continue;
            }

            // merkle path
            let pos_height = pos_height_in_tree(pos);
            let next_height = pos_height_in_tree(pos + 1);

            if next_height > pos_height {
                // we are the right child
                hash = merge_hashes(proof, &hash);
                pos += 1;
            } else {
                // we are the left child
                hash = merge_hashes(&hash, proof);
                pos += parent_offset(height);
            }

            height += 1;
        }

        hash == root
    }
}
