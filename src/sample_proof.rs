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

//! Difficulty-weighted sampling proofs
//!
//! A sampling proof convinces a verifier that the MMR behind a root hash
//! carries its claimed total difficulty. The prover reveals a pseudorandom,
//! difficulty-weighted set of leaves together with the sibling witnesses
//! needed to rebuild the root. All pseudorandomness is derived from the
//! root hash itself, so the challenge is public and non-interactive.

use core::slice;

use codec::{Decode, Encode};
use num_bigint::BigUint;

use crate::{
    hash::{challenge_hash, Hash},
    sampling::{cdf, delta, hash_to_f64, query_count, scale_difficulty},
    utils::{left_leaf_number, node_from_leaf},
    Error, Mmr, Node, Result, Store,
};

#[cfg(test)]
#[path = "sample_proof_tests.rs"]
mod tests;

/// Anchor positions sit at this leaf interval.
const ANCHOR_INTERVAL: u64 = 30_000;

/// At most this many anchor positions are returned.
const MAX_ANCHORS: u64 = 10;

/// One element of a sampling proof.
///
/// The element sequence is the pre-order traversal of the subtree induced
/// by the sampled leaves, with the `Root` sentinel appended last.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProofElem {
    /// Terminal sentinel carrying the claimed root.
    Root {
        hash: Hash,
        difficulty: BigUint,
        leaf_count: u64,
    },
    /// Sibling witness for a subtree without sampled leaves.
    Node {
        hash: Hash,
        difficulty: BigUint,
        right: bool,
    },
    /// A disclosed sampled leaf.
    Child {
        hash: Hash,
        difficulty: BigUint,
        position: u64,
    },
}

/// A complete sampling proof, the wire boundary to the verifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofInfo {
    pub root_hash: Hash,
    pub root_difficulty: BigUint,
    pub leaf_count: u64,
    pub elems: Vec<ProofElem>,
}

/// A sampled leaf number paired with the weight that selected it.
#[derive(Clone, Debug, PartialEq)]
pub struct ProofBlock {
    pub number: u64,
    pub aggregated_weight: f64,
}

fn encode_difficulty<T: codec::Output + ?Sized>(difficulty: &BigUint, dest: &mut T) {
    difficulty.to_bytes_be().encode_to(dest);
}

fn decode_difficulty<I: codec::Input>(input: &mut I) -> core::result::Result<BigUint, codec::Error> {
    let bytes = Vec::<u8>::decode(input)?;
    Ok(BigUint::from_bytes_be(&bytes))
}

impl Encode for ProofElem {
    fn encode_to<T: codec::Output + ?Sized>(&self, dest: &mut T) {
        match self {
            ProofElem::Root {
                hash,
                difficulty,
                leaf_count,
            } => {
                dest.push_byte(0);
                hash.encode_to(dest);
                encode_difficulty(difficulty, dest);
                leaf_count.encode_to(dest);
            }
            ProofElem::Node {
                hash,
                difficulty,
                right,
            } => {
                dest.push_byte(1);
                hash.encode_to(dest);
                encode_difficulty(difficulty, dest);
                right.encode_to(dest);
            }
            ProofElem::Child {
                hash,
                difficulty,
                position,
            } => {
                dest.push_byte(2);
                hash.encode_to(dest);
                encode_difficulty(difficulty, dest);
                position.encode_to(dest);
            }
        }
    }
}

impl Decode for ProofElem {
    fn decode<I: codec::Input>(input: &mut I) -> core::result::Result<Self, codec::Error> {
        match input.read_byte()? {
            0 => Ok(ProofElem::Root {
                hash: Hash::decode(input)?,
                difficulty: decode_difficulty(input)?,
                leaf_count: u64::decode(input)?,
            }),
            1 => Ok(ProofElem::Node {
                hash: Hash::decode(input)?,
                difficulty: decode_difficulty(input)?,
                right: bool::decode(input)?,
            }),
            2 => Ok(ProofElem::Child {
                hash: Hash::decode(input)?,
                difficulty: decode_difficulty(input)?,
                position: u64::decode(input)?,
            }),
            _ => Err("unexpected proof element discriminator".into()),
        }
    }
}

impl Encode for ProofInfo {
    fn encode_to<T: codec::Output + ?Sized>(&self, dest: &mut T) {
        self.root_hash.encode_to(dest);
        encode_difficulty(&self.root_difficulty, dest);
        self.leaf_count.encode_to(dest);
        self.elems.encode_to(dest);
    }
}

impl Decode for ProofInfo {
    fn decode<I: codec::Input>(input: &mut I) -> core::result::Result<Self, codec::Error> {
        Ok(ProofInfo {
            root_hash: Hash::decode(input)?,
            root_difficulty: decode_difficulty(input)?,
            leaf_count: u64::decode(input)?,
            elems: Vec::<ProofElem>::decode(input)?,
        })
    }
}

impl<S> Mmr<S>
where
    S: Store,
{
    /// Create a sampling proof for a claimed additional difficulty beyond
    /// the MMR's total.
    ///
    /// Return the proof, the sampled leaf numbers and the anchor positions.
    /// The sampled leaf numbers are sorted ascending and may contain
    /// duplicates when two samples land in the same leaf. Anchors are
    /// returned for fast-sync callers and are not part of the proof body.
    pub fn create_new_proof(
        &self,
        added_difficulty: &BigUint,
    ) -> Result<(ProofInfo, Vec<u64>, Vec<u64>)> {
        if self.leaf_count() < 2 {
            return Err(Error::NotEnoughLeaves(self.leaf_count()));
        }

        let root_hash = self.root()?;
        let root_difficulty = self.root_difficulty()?;
        let total = &root_difficulty + added_difficulty;

        let m = query_count(added_difficulty, &total, self.leaf_count())?;
        let delta = delta(added_difficulty, &root_difficulty)?;

        let mut weights: Vec<f64> = (0..m)
            .map(|i| cdf(hash_to_f64(&challenge_hash(&root_hash, i)), delta))
            .collect();
        weights.sort_by(|a, b| a.total_cmp(b));

        let mut blocks = Vec::with_capacity(weights.len());
        for w in &weights {
            blocks.push(self.leaf_by_weight(*w)?);
        }
        blocks.sort_unstable();

        let anchors = anchor_blocks(self.leaf_count());

        let mut elems = Vec::new();
        self.proof_elems(0, self.leaf_count(), &blocks, &mut elems)?;
        elems.push(ProofElem::Root {
            hash: root_hash,
            difficulty: root_difficulty.clone(),
            leaf_count: self.leaf_count(),
        });

        let info = ProofInfo {
            root_hash,
            root_difficulty,
            leaf_count: self.leaf_count(),
            elems,
        };

        Ok((info, blocks, anchors))
    }

    /// Emit the pre-order proof elements covering the sampled leaf numbers
    /// in `blocks`, for the leaf range `[start, start + leaves)`.
    ///
    /// `blocks` must be sorted and non-empty. A side of the split without
    /// sampled leaves contributes a single witness node; duplicates in
    /// `blocks` collapse into one disclosed leaf.
    fn proof_elems(
        &self,
        start: u64,
        leaves: u64,
        blocks: &[u64],
        elems: &mut Vec<ProofElem>,
    ) -> Result<()> {
        if leaves == 1 {
            let node = self.node_at(node_from_leaf(start))?;
            elems.push(ProofElem::Child {
                hash: node.hash(),
                difficulty: node.difficulty().clone(),
                position: node.position(),
            });
            return Ok(());
        }

        let boundary = start + left_leaf_number(leaves);
        let split = blocks.partition_point(|&b| b < boundary);
        let (left, right) = blocks.split_at(split);

        if left.is_empty() {
            let witness = self.subtree_root(start, boundary - start)?;
            elems.push(ProofElem::Node {
                hash: witness.hash(),
                difficulty: witness.difficulty().clone(),
                right: false,
            });
        } else {
            self.proof_elems(start, boundary - start, left, elems)?;
        }

        if right.is_empty() {
            let witness = self.subtree_root(boundary, start + leaves - boundary)?;
            elems.push(ProofElem::Node {
                hash: witness.hash(),
                difficulty: witness.difficulty().clone(),
                right: true,
            });
        } else {
            self.proof_elems(boundary, start + leaves - boundary, right, elems)?;
        }

        Ok(())
    }
}

/// Up to ten anchor positions, one per 30000-leaf interval, counting down
/// from the latest interval boundary.
fn anchor_blocks(leaf_count: u64) -> Vec<u64> {
    let base = ((leaf_count - 1) / ANCHOR_INTERVAL) * ANCHOR_INTERVAL;

    let mut anchors = Vec::new();
    for k in 0..MAX_ANCHORS {
        let offset = k * ANCHOR_INTERVAL;
        if base <= offset + ANCHOR_INTERVAL {
            break;
        }
        anchors.push(base - offset);
    }

    anchors
}

/// Reconstruct the challenge for a received batch of sampled positions.
///
/// Recompute the query count and the sorted weights from the root hash and
/// pair them with the sorted positions. An [`Error::SampleCount`] is
/// returned if the number of positions disagrees with the recomputed query
/// count.
pub fn verify_required_blocks(
    positions: &[u64],
    root_hash: &Hash,
    root_difficulty: &BigUint,
    added_difficulty: &BigUint,
    leaf_count: u64,
) -> Result<Vec<ProofBlock>> {
    let total = root_difficulty + added_difficulty;
    let m = query_count(added_difficulty, &total, leaf_count)?;

    if positions.len() as u64 != m {
        return Err(Error::SampleCount {
            want: m,
            got: positions.len() as u64,
        });
    }

    let delta = delta(added_difficulty, root_difficulty)?;

    let mut weights: Vec<f64> = (0..m)
        .map(|i| cdf(hash_to_f64(&challenge_hash(root_hash, i)), delta))
        .collect();
    weights.sort_by(|a, b| a.total_cmp(b));

    let mut positions = positions.to_vec();
    positions.sort_unstable();

    Ok(positions
        .into_iter()
        .zip(weights)
        .map(|(number, aggregated_weight)| ProofBlock {
            number,
            aggregated_weight,
        })
        .collect())
}

/// Verify a sampling proof against the challenge blocks reconstructed by
/// [`verify_required_blocks`].
///
/// The proof elements are replayed along the same traversal the prover
/// used. Every disclosed leaf must sit inside the difficulty interval
/// spanned by everything to its left, and the rebuilt root must match the
/// claimed hash and difficulty. Any shape or consistency violation rejects
/// the proof.
pub fn verify_proof(proof: &ProofInfo, proof_blocks: &[ProofBlock]) -> bool {
    if proof.leaf_count == 0 || proof_blocks.is_empty() {
        return false;
    }

    let (last, body) = match proof.elems.split_last() {
        Some(x) => x,
        None => return false,
    };
    if !matches!(last, ProofElem::Root { .. }) {
        return false;
    }

    let mut blocks = proof_blocks.to_vec();
    blocks.sort_by(|a, b| a.number.cmp(&b.number));

    let mut elems = body.iter();
    let mut agg = BigUint::default();

    let root = match rebuild(
        &mut elems,
        &blocks,
        0,
        proof.leaf_count,
        &mut agg,
        &proof.root_difficulty,
    ) {
        Some(n) => n,
        None => return false,
    };

    elems.next().is_none()
        && root.hash() == proof.root_hash
        && root.difficulty() == &proof.root_difficulty
}

/// Consume a witness element for a subtree without sampled leaves.
fn take_witness(
    elems: &mut slice::Iter<'_, ProofElem>,
    right: bool,
    agg: &mut BigUint,
) -> Option<Node> {
    match elems.next()? {
        ProofElem::Node {
            hash,
            difficulty,
            right: flag,
        } if *flag == right => {
            *agg += difficulty;
            Some(Node::leaf(*hash, difficulty.clone()))
        }
        _ => None,
    }
}

/// Rebuild the subtree root over `[start, start + leaves)` from the proof
/// elements, mirroring the prover's traversal.
///
/// `agg` accumulates the difficulty of everything left of the subtree
/// being rebuilt, which is the lower end of the weight-consistency
/// interval for each disclosed leaf. `None` rejects the proof.
fn rebuild(
    elems: &mut slice::Iter<'_, ProofElem>,
    blocks: &[ProofBlock],
    start: u64,
    leaves: u64,
    agg: &mut BigUint,
    root_difficulty: &BigUint,
) -> Option<Node> {
    if leaves == 1 {
        let (hash, difficulty) = match elems.next()? {
            ProofElem::Child {
                hash, difficulty, ..
            } => (hash, difficulty),
            _ => return None,
        };

        let upper = &*agg + difficulty;
        for block in blocks {
            if block.number != start {
                return None;
            }
            let scaled = scale_difficulty(root_difficulty, block.aggregated_weight).ok()?;
            if scaled < *agg || scaled >= upper {
                return None;
            }
        }

        *agg = upper;
        return Some(Node::leaf(*hash, difficulty.clone()));
    }

    let boundary = start + left_leaf_number(leaves);
    let split = blocks.partition_point(|b| b.number < boundary);
    let (left_blocks, right_blocks) = blocks.split_at(split);

    let left = if left_blocks.is_empty() {
        take_witness(elems, false, agg)?
    } else {
        rebuild(elems, left_blocks, start, boundary - start, agg, root_difficulty)?
    };

    let right = if right_blocks.is_empty() {
        take_witness(elems, true, agg)?
    } else {
        rebuild(
            elems,
            right_blocks,
            boundary,
            start + leaves - boundary,
            agg,
            root_difficulty,
        )?
    };

    // perfect ranges merge like tree nodes, forest ranges bag right-first
    if leaves.is_power_of_two() {
        Some(Node::merge(&left, &right))
    } else {
        Some(Node::merge(&right, &left))
    }
}
