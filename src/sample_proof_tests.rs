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

//! Sampling proof unit tests

use codec::{Decode, Encode};
use num_bigint::BigUint;

use crate::{hash_u64, Error, Mmr, VecStore};

use super::{anchor_blocks, verify_proof, verify_required_blocks, ProofElem, ProofInfo};

fn make_mmr(num_leaves: u64) -> Mmr<VecStore> {
    let mut mmr = Mmr::new(VecStore::new());

    (0..num_leaves).for_each(|i| {
        let _ = mmr.push(hash_u64(i), BigUint::from(1000u32)).unwrap();
    });

    mmr
}

#[test]
fn anchor_blocks_works() {
    assert!(anchor_blocks(2).is_empty());
    assert!(anchor_blocks(10_000).is_empty());
    assert!(anchor_blocks(30_001).is_empty());

    assert_eq!(vec![60_000], anchor_blocks(60_001));
    assert_eq!(vec![60_000], anchor_blocks(70_000));

    let want = (2..=10).rev().map(|k| k * 30_000).collect::<Vec<_>>();
    assert_eq!(want, anchor_blocks(300_001));

    // capped at ten anchors
    let got = anchor_blocks(400_000);
    assert_eq!(10, got.len());
    assert_eq!(390_000, got[0]);
    assert_eq!(120_000, got[9]);
}

#[test]
fn proof_elem_codec_works() {
    let root = ProofElem::Root {
        hash: hash_u64(1),
        difficulty: BigUint::from(10_000u32),
        leaf_count: 10,
    };
    let node = ProofElem::Node {
        hash: hash_u64(2),
        difficulty: BigUint::from(4000u32),
        right: true,
    };
    let child = ProofElem::Child {
        hash: hash_u64(3),
        difficulty: BigUint::from(1000u32),
        position: 7,
    };

    for (discriminator, elem) in [(0u8, &root), (1u8, &node), (2u8, &child)] {
        let encoded = elem.encode();

        assert_eq!(discriminator, encoded[0]);
        assert_eq!(elem, &ProofElem::decode(&mut &encoded[..]).unwrap());
    }
}

#[test]
fn proof_info_codec_works() {
    let mmr = make_mmr(10);
    let (info, _, _) = mmr.create_new_proof(&BigUint::from(1000u32)).unwrap();

    let encoded = info.encode();
    let decoded = ProofInfo::decode(&mut &encoded[..]).unwrap();

    assert_eq!(info, decoded);
}

#[test]
fn create_new_proof_works() {
    let mmr = make_mmr(10);
    let (info, blocks, anchors) = mmr.create_new_proof(&BigUint::from(1000u32)).unwrap();

    assert_eq!(mmr.root().unwrap(), info.root_hash);
    assert_eq!(mmr.root_difficulty().unwrap(), info.root_difficulty);
    assert_eq!(10, info.leaf_count);
    assert!(anchors.is_empty());

    // sampled leaf numbers are sorted
    assert!(!blocks.is_empty());
    assert!(blocks.windows(2).all(|w| w[0] <= w[1]));

    // the element stream ends with the root sentinel
    assert!(matches!(info.elems.last(), Some(ProofElem::Root { .. })));

    // disclosed leaves appear in ascending position order
    let positions = info
        .elems
        .iter()
        .filter_map(|e| match e {
            ProofElem::Child { position, .. } => Some(*position),
            _ => None,
        })
        .collect::<Vec<_>>();

    assert!(!positions.is_empty());
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn proof_elems_structure_works() {
    // a single sampled leaf in a perfect MMR discloses one child and one
    // witness per level, each witness being the right sibling subtree
    let mmr = make_mmr(8);
    let mut elems = Vec::new();
    mmr.proof_elems(0, 8, &[0], &mut elems).unwrap();

    assert_eq!(4, elems.len());

    assert!(matches!(
        elems[0],
        ProofElem::Child { position: 0, .. }
    ));

    for (elem, witness_pos) in elems[1..].iter().zip([1u64, 5, 13]) {
        match elem {
            ProofElem::Node { hash, right, .. } => {
                assert!(*right);
                assert_eq!(mmr.node_at(witness_pos).unwrap().hash(), *hash);
            }
            _ => panic!("expected witness node"),
        }
    }
}

#[test]
fn create_new_proof_is_deterministic() {
    let mmr = make_mmr(10);

    let p1 = mmr.create_new_proof(&BigUint::from(1000u32)).unwrap();
    let p2 = mmr.create_new_proof(&BigUint::from(1000u32)).unwrap();

    assert_eq!(p1, p2);
}

#[test]
fn create_new_proof_fails() {
    let mmr = make_mmr(0);
    let want = Error::NotEnoughLeaves(0);
    let got = mmr.create_new_proof(&BigUint::from(1000u32)).err().unwrap();
    assert_eq!(want, got);

    let mmr = make_mmr(1);
    let want = Error::NotEnoughLeaves(1);
    let got = mmr.create_new_proof(&BigUint::from(1000u32)).err().unwrap();
    assert_eq!(want, got);
}

#[test]
fn verify_required_blocks_works() {
    let mmr = make_mmr(10);
    let d = BigUint::from(1000u32);
    let (info, blocks, _) = mmr.create_new_proof(&d).unwrap();

    let proof_blocks = verify_required_blocks(
        &blocks,
        &info.root_hash,
        &info.root_difficulty,
        &d,
        info.leaf_count,
    )
    .unwrap();

    assert_eq!(blocks.len(), proof_blocks.len());

    // pairing preserves the sorted leaf numbers
    let numbers = proof_blocks.iter().map(|b| b.number).collect::<Vec<_>>();
    assert_eq!(blocks, numbers);

    for b in &proof_blocks {
        assert!((0.0..1.0).contains(&b.aggregated_weight));
    }
}

#[test]
fn verify_required_blocks_fails() {
    let mmr = make_mmr(10);
    let d = BigUint::from(1000u32);
    let (info, blocks, _) = mmr.create_new_proof(&d).unwrap();

    let got = verify_required_blocks(
        &blocks[..blocks.len() - 1],
        &info.root_hash,
        &info.root_difficulty,
        &d,
        info.leaf_count,
    )
    .err()
    .unwrap();

    assert!(matches!(got, Error::SampleCount { .. }));
}

#[test]
fn verify_proof_works() {
    let mmr = make_mmr(10);
    let d = BigUint::from(1000u32);
    let (info, blocks, _) = mmr.create_new_proof(&d).unwrap();

    let proof_blocks = verify_required_blocks(
        &blocks,
        &info.root_hash,
        &info.root_difficulty,
        &d,
        info.leaf_count,
    )
    .unwrap();

    assert!(verify_proof(&info, &proof_blocks));
}

#[test]
fn verify_proof_with_duplicates_works() {
    // few leaves and many samples force duplicate sampled positions
    let mmr = make_mmr(4);
    let d = BigUint::from(1000u32);
    let (info, blocks, _) = mmr.create_new_proof(&d).unwrap();

    assert!(blocks.len() > 4);

    let proof_blocks = verify_required_blocks(
        &blocks,
        &info.root_hash,
        &info.root_difficulty,
        &d,
        info.leaf_count,
    )
    .unwrap();

    assert!(verify_proof(&info, &proof_blocks));
}

#[test]
fn verify_proof_fails() {
    let mmr = make_mmr(10);
    let d = BigUint::from(1000u32);
    let (info, blocks, _) = mmr.create_new_proof(&d).unwrap();

    let proof_blocks = verify_required_blocks(
        &blocks,
        &info.root_hash,
        &info.root_difficulty,
        &d,
        info.leaf_count,
    )
    .unwrap();

    // no challenge blocks
    assert!(!verify_proof(&info, &[]));

    // missing root sentinel
    let mut tampered = info.clone();
    tampered.elems.pop();
    assert!(!verify_proof(&tampered, &proof_blocks));

    // empty element stream
    let mut tampered = info.clone();
    tampered.elems.clear();
    assert!(!verify_proof(&tampered, &proof_blocks));

    // tampered difficulty of a disclosed leaf
    let mut tampered = info.clone();
    for e in tampered.elems.iter_mut() {
        if let ProofElem::Child { difficulty, .. } = e {
            *difficulty += 1u32;
            break;
        }
    }
    assert!(!verify_proof(&tampered, &proof_blocks));
}
