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

//! MMR node type

use num_bigint::BigUint;

use crate::hash::{merge_hashes, Hash};

/// A single MMR node.
///
/// For a leaf node, `hash` is the block summary hash and `difficulty` the
/// block's own difficulty. For an internal node, `hash` is the merge of the
/// two child hashes and `difficulty` the sum of the child difficulties.
/// `position` is the node's index in the flat MMR array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    hash: Hash,
    difficulty: BigUint,
    position: u64,
}

impl Node {
    /// Return a new leaf node. The position is assigned on push.
    pub fn leaf(hash: Hash, difficulty: BigUint) -> Self {
        Node {
            hash,
            difficulty,
            position: 0,
        }
    }

    /// Merge two sibling nodes into their parent.
    ///
    /// The parent position follows from the post-order layout, where a
    /// parent is appended directly after its right child. For bagged
    /// pseudo-nodes the position carries no meaning.
    pub(crate) fn merge(left: &Node, right: &Node) -> Self {
        Node {
            hash: merge_hashes(&left.hash, &right.hash),
            difficulty: &left.difficulty + &right.difficulty,
            position: right.position + 1,
        }
    }

    pub fn hash(&self) -> Hash {
        self.hash
    }

    pub fn difficulty(&self) -> &BigUint {
        &self.difficulty
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: u64) {
        self.position = position;
    }
}
