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

//! Merkle-Mountain-Range with difficulty-weighted sampling proofs.
//!
//! The MMR is an append-only authenticated data structure over a sequence
//! of block summaries `(hash, difficulty)`. Next to positional membership
//! proofs it supports a succinct probabilistic proof that the MMR carries
//! its claimed total difficulty: a pseudorandom, difficulty-weighted set
//! of leaves is disclosed and checked against the root.

pub use error::Error;
pub use hash::{challenge_hash, hash_u64, merge_hashes, Hash, ZERO_HASH};
pub use mmr::Mmr;
pub use node::Node;
pub use proof::MerkleProof;
pub use sample_proof::{
    verify_proof, verify_required_blocks, ProofBlock, ProofElem, ProofInfo,
};
pub use sampling::{C, LAMBDA};
pub use store::{Store, VecStore};

mod error;
mod hash;
mod mmr;
mod node;
mod proof;
mod sample_proof;
mod sampling;
mod store;
mod utils;

pub type Result<T> = core::result::Result<T, Error>;
