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

//! Merkle-Mountain-Range implementation

use num_bigint::BigUint;

use crate::{
    hash::{merge_hashes, Hash, ZERO_HASH},
    proof::MerkleProof,
    sampling::scale_difficulty,
    utils::{
        get_peaks, leaf_to_node_number, left_leaf_number, node_from_leaf, node_to_leaf_number,
        parent_offset, pos_height_in_tree, sibling_offset,
    },
    Error, Node, Result, Store,
};

#[cfg(test)]
#[path = "mmr_tests.rs"]
mod tests;

/// Difficulty-weighted Merkle-Mountain-Range (MMR).
///
/// The MMR is kept as a flat array of nodes, which is the post-order
/// traversal of a forest of perfect binary trees. All positions are `'0'`
/// based indices into that array.
///
/// Every node carries a cumulative difficulty next to its hash. An internal
/// node's difficulty is the exact sum of its children's, so the bagged root
/// carries the total difficulty of all leaves.
pub struct Mmr<S>
where
    S: Store,
{
    // total number of MMR nodes, i.e. MMR size
    size: u64,
    // number of leaf nodes pushed so far
    leaf_count: u64,
    // backing store for the MMR
    store: S,
}

impl<S> Mmr<S>
where
    S: Store,
{
    /// Return a MMR backed by `store`.
    ///
    /// The size and leaf count are taken from the store, so resuming from a
    /// populated store continues where it left off. Consecutive peaks
    /// delimit the mountains, so each node-count span yields one mountain's
    /// leaf count.
    pub fn new(store: S) -> Self {
        let size = store.len();

        let mut leaf_count = 0;
        let mut prev = 0;
        for &p in &get_peaks(size) {
            leaf_count += node_to_leaf_number(p + 1 - prev);
            prev = p + 1;
        }

        Mmr {
            size,
            leaf_count,
            store,
        }
    }

    /// Return MMR size, i.e. total number of nodes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Return the number of leaf nodes.
    pub fn leaf_count(&self) -> u64 {
        self.leaf_count
    }

    /// Return the node at position `pos`.
    pub fn node_at(&self, pos: u64) -> Result<&Node> {
        self.store.node_at(pos)
    }

    /// Append a leaf with the given `hash` and `difficulty`.
    ///
    /// Appending a leaf merges all now-complete subtrees along the way, so
    /// a single push may add several internal nodes. Return the position of
    /// the new leaf.
    pub fn push(&mut self, hash: Hash, difficulty: BigUint) -> Result<u64> {
        let leaf_pos = self.size;

        let mut leaf = Node::leaf(hash, difficulty);
        leaf.set_position(leaf_pos);
        self.store.append(leaf)?;

        let mut pos = leaf_pos;
        let mut height = 0;

        while pos_height_in_tree(pos + 1) > height {
            pos += 1;

            let left_pos = pos - parent_offset(height);
            let right_pos = left_pos + sibling_offset(height);

            let parent = Node::merge(self.store.node_at(left_pos)?, self.store.node_at(right_pos)?);
            self.store.append(parent)?;

            height += 1;
        }

        self.size = pos + 1;
        self.leaf_count += 1;

        Ok(leaf_pos)
    }

    /// Return the root hash of the MMR.
    ///
    /// Find all the current peaks and bag them together into a single peak
    /// hash. An empty MMR has the all-zero root.
    pub fn root(&self) -> Result<Hash> {
        if self.size == 0 {
            return Ok(ZERO_HASH);
        }
        if self.size == 1 {
            return Ok(self.store.node_at(0)?.hash());
        }

        let root = self.bag_rhs_peaks(0, &get_peaks(self.size))?;

        Ok(root.map(|n| n.hash()).unwrap_or(ZERO_HASH))
    }

    /// Return the total difficulty of the MMR, i.e. the difficulty carried
    /// by the bagged root.
    pub fn root_difficulty(&self) -> Result<BigUint> {
        if self.size == 0 {
            return Ok(BigUint::default());
        }
        if self.size == 1 {
            return Ok(self.store.node_at(0)?.difficulty().clone());
        }

        let root = self.bag_rhs_peaks(0, &get_peaks(self.size))?;

        Ok(root.map(|n| n.difficulty().clone()).unwrap_or_default())
    }

    /// Bag all peaks to the right of `pos` into a single node.
    ///
    /// Peaks are folded right to left, with the bagged accumulator as the
    /// first merge argument. `None` if there is no peak right of `pos`.
    fn bag_rhs_peaks(&self, pos: u64, peaks: &[u64]) -> Result<Option<Node>> {
        let mut rhs = Vec::new();

        for &p in peaks {
            if p > pos {
                rhs.push(self.store.node_at(p)?.clone());
            }
        }

        let mut root = None;

        for peak in rhs.into_iter().rev() {
            root = match root {
                None => Some(peak),
                Some(bagged) => Some(Node::merge(&bagged, &peak)),
            };
        }

        Ok(root)
    }

    /// Return a MMR membership proof for a leaf node at position `pos`.
    ///
    /// Walk upward from the leaf collecting sibling hashes until the
    /// enclosing peak. The path is completed with the bagged hash of all
    /// peaks to the right, followed by the left peaks from right to left.
    pub fn gen_proof(&self, pos: u64) -> Result<MerkleProof> {
        if pos >= self.size {
            return Err(Error::MissingNode(pos));
        }
        if pos_height_in_tree(pos) != 0 {
            return Err(Error::ExpectingLeaf(pos));
        }

        let mut path = Vec::new();
        let mut height = 0;
        let mut pos = pos;

        while pos < self.size {
            let pos_height = pos_height_in_tree(pos);
            let next_height = pos_height_in_tree(pos + 1);

            if next_height > pos_height {
                // we are the right child, sibling is to the left
                let sib_pos = pos - sibling_offset(height);
                if sib_pos >= self.size {
                    break;
                }
                path.push(self.store.node_at(sib_pos)?.hash());
                pos += 1;
            } else {
                // we are the left child, sibling is to the right
                let sib_pos = pos + sibling_offset(height);
                if sib_pos >= self.size {
                    break;
                }
                path.push(self.store.node_at(sib_pos)?.hash());
                pos += parent_offset(height);
            }

            height += 1;
        }

        // pos found no more siblings, so it is the peak of its mountain
        let peaks = get_peaks(self.size);

        if let Some(rhs) = self.bag_rhs_peaks(pos, &peaks)? {
            path.push(rhs.hash());
        }

        for &p in peaks.iter().rev() {
            if p < pos {
                path.push(self.store.node_at(p)?.hash());
            }
        }

        Ok(MerkleProof {
            mmr_size: self.size,
            path,
        })
    }

    /// Validate the MMR by re-calculating hash and difficulty of all inner,
    /// i.e. parent nodes. Return `true`, if the MMR is valid or an error.
    pub fn validate(&self) -> Result<bool> {
        for pos in 0..self.size {
            let height = pos_height_in_tree(pos);

            // inner nodes, i.e. parents start at height 1
            if height > 0 {
                let left_pos = pos - parent_offset(height - 1);
                let right_pos = pos - 1;

                let left = self.store.node_at(left_pos)?;
                let right = self.store.node_at(right_pos)?;
                let parent = self.store.node_at(pos)?;

                if parent.hash() != merge_hashes(&left.hash(), &right.hash()) {
                    return Err(Error::InvalidNodeHash(pos));
                }
                if parent.difficulty() != &(left.difficulty() + right.difficulty()) {
                    return Err(Error::InvalidNodeDifficulty(pos));
                }
            }
        }

        Ok(true)
    }

    /// Return the leaf index selected by a difficulty weight in `[0, 1)`.
    ///
    /// The weight is scaled to an absolute difficulty and the forest is
    /// descended by cumulative difficulty: the returned leaf is the unique
    /// one whose difficulty prefix interval contains the scaled weight. A
    /// weight landing exactly on a subtree boundary selects the first leaf
    /// of the right subtree.
    pub fn leaf_by_weight(&self, weight: f64) -> Result<u64> {
        if !(0.0..1.0).contains(&weight) {
            return Err(Error::InvalidWeight);
        }
        if self.leaf_count == 0 {
            return Err(Error::NotEnoughLeaves(0));
        }

        let weight_abs = scale_difficulty(&self.root_difficulty()?, weight)?;

        let mut agg_leaf = 0;
        let mut agg_difficulty = BigUint::default();
        let mut tree_size = self.leaf_count;

        while tree_size > 1 {
            let left_leaves = left_leaf_number(tree_size);

            // the last node covering all leaves up to the split boundary is
            // the root of the left subtree
            let left_root = self.store.node_at(node_from_leaf(agg_leaf + left_leaves) - 1)?;
            let boundary = &agg_difficulty + left_root.difficulty();

            if weight_abs >= boundary {
                agg_leaf += left_leaves;
                agg_difficulty = boundary;
                tree_size -= left_leaves;
            } else {
                tree_size = left_leaves;
            }
        }

        Ok(agg_leaf)
    }

    /// Return the root node over the leaf range `[start, start + leaves)`.
    ///
    /// An aligned power-of-two range is a stored subtree: its nodes form a
    /// contiguous post-order run right after the nodes covering `[0,
    /// start)`, with the subtree root last. Any other range spans several
    /// mountains and is bagged right-first, the same as the MMR root.
    pub(crate) fn subtree_root(&self, start: u64, leaves: u64) -> Result<Node> {
        if leaves.is_power_of_two() {
            let root_pos = node_from_leaf(start) + leaf_to_node_number(leaves) - 1;
            return Ok(self.store.node_at(root_pos)?.clone());
        }

        let left_leaves = left_leaf_number(leaves);
        let left = self.subtree_root(start, left_leaves)?;
        let right = self.subtree_root(start + left_leaves, leaves - left_leaves)?;

        Ok(Node::merge(&right, &left))
    }
}
