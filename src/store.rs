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

//! Merkle-Mountain-Range storage

use crate::{Error, Node, Result};

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

/// Backing store for the flat MMR node array.
///
/// Nodes are only ever appended, never mutated or removed.
pub trait Store {
    fn append(&mut self, node: Node) -> Result<()>;

    fn node_at(&self, idx: u64) -> Result<&Node>;

    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory store.
pub struct VecStore {
    /// MMR nodes for both, leaves and parents
    pub nodes: Vec<Node>,
}

impl Store for VecStore {
    fn append(&mut self, node: Node) -> Result<()> {
        self.nodes.push(node);
        Ok(())
    }

    fn node_at(&self, idx: u64) -> Result<&Node> {
        self.nodes
            .get(idx as usize)
            .ok_or(Error::MissingNode(idx))
    }

    fn len(&self) -> u64 {
        self.nodes.len() as u64
    }
}

impl VecStore {
    pub fn new() -> Self {
        VecStore { nodes: vec![] }
    }
}

impl Default for VecStore {
    fn default() -> Self {
        Self::new()
    }
}
