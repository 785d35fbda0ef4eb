//! Replay harness tests for determinism.
//!
//! Two executors fed the same block sequence from the same genesis must produce
//! byte-identical snapshots, receipts and instance ids. Resuming from any intermediate
//! snapshot must converge to the same final root.

use crate::{
    dispatcher::{execute_block, replay, verify_replay, Block, Receipt, SignedAction},
    mocks::{create_address, TestChain, TestSimulator, IRON, SWORD_RECIPE},
    store::Snapshot,
};
use worldline_types::{
    action::{
        CombinationConsumable, CreateAvatar, HackAndSlash, MintAssets, MintSpec, Stake,
        TransferAsset,
    },
    address::avatar_address,
    entity::{Customization, InstanceId},
    key::Currency,
    Address, Event,
};

fn minter() -> Address {
    create_address(0xAA)
}

fn player() -> Address {
    create_address(1)
}

fn blocks() -> Vec<Block> {
    let avatar = avatar_address(&player(), 0);
    let craft = |slot_index| {
        SignedAction::new(
            player(),
            CombinationConsumable {
                avatar,
                slot_index,
                recipe_id: SWORD_RECIPE,
            },
        )
    };
    vec![
        Block {
            index: 1,
            actions: vec![SignedAction::new(
                player(),
                CreateAvatar {
                    index: 0,
                    name: "Hero".to_string(),
                    customization: Customization::default(),
                },
            )],
        },
        Block {
            index: 2,
            actions: vec![SignedAction::new(
                minter(),
                MintAssets {
                    specs: vec![
                        MintSpec::Asset {
                            recipient: player(),
                            currency: Currency::gold(),
                            amount: 200,
                        },
                        MintSpec::Item {
                            recipient: avatar,
                            item_id: IRON,
                            count: 4,
                        },
                    ],
                    memo: Some("genesis".to_string()),
                },
            )],
        },
        Block {
            index: 3,
            actions: vec![craft(0), craft(1)],
        },
        Block {
            index: 7,
            actions: vec![
                SignedAction::new(
                    player(),
                    HackAndSlash {
                        avatar,
                        stage_id: 1,
                    },
                ),
                SignedAction::new(
                    player(),
                    TransferAsset {
                        recipient: create_address(2),
                        currency: Currency::gold(),
                        amount: 30,
                        memo: None,
                    },
                ),
                SignedAction::new(player(), Stake { amount: 60 }),
            ],
        },
    ]
}

fn run_all(chain: &mut TestChain, blocks: &[Block]) -> Vec<Receipt> {
    blocks
        .iter()
        .flat_map(|block| chain.execute(block.clone()))
        .collect()
}

fn started_instances(receipts: &[Receipt]) -> Vec<InstanceId> {
    receipts
        .iter()
        .flat_map(|receipt| &receipt.events)
        .filter_map(|event| match event {
            Event::CombinationStarted { instance_id, .. } => Some(*instance_id),
            _ => None,
        })
        .collect()
}

#[test]
fn two_executors_agree_byte_for_byte() {
    let mut first = TestChain::new(vec![minter()]);
    let mut second = TestChain::new(vec![minter()]);
    first.simulator = TestSimulator {
        win_percent: 50,
        turns: 4,
    };
    second.simulator = first.simulator;

    let blocks = blocks();
    let first_receipts = run_all(&mut first, &blocks);
    let second_receipts = run_all(&mut second, &blocks);

    assert!(
        first_receipts.iter().all(|r| r.outcome.is_committed()),
        "{first_receipts:?}"
    );
    assert_eq!(first_receipts, second_receipts);
    assert_eq!(first.snapshot.root(), second.snapshot.root());
    assert_eq!(first.snapshot.entries(), second.snapshot.entries());

    let instances = started_instances(&first_receipts);
    assert_eq!(instances.len(), 2);
    assert_ne!(instances[0], instances[1]);
    assert_eq!(instances, started_instances(&second_receipts));
}

#[test]
fn resuming_from_any_block_converges() {
    let blocks = blocks();
    let mut chain = TestChain::new(vec![minter()]);
    let mut checkpoints = vec![chain.snapshot.clone()];
    for block in &blocks {
        chain.execute(block.clone());
        checkpoints.push(chain.snapshot.clone());
    }
    let expected = chain.snapshot.clone();

    for (done, checkpoint) in checkpoints.iter().enumerate() {
        let resumed = replay(checkpoint, &blocks[done..], chain.env()).unwrap();
        assert_eq!(resumed.root(), expected.root(), "resumed after {done} blocks");
    }
}

#[test]
fn verify_replay_detects_divergence() {
    let blocks = blocks();
    let chain = TestChain::new(vec![minter()]);
    let expected = replay(&Snapshot::empty(), &blocks, chain.env()).unwrap();
    verify_replay(&Snapshot::empty(), &blocks, chain.env(), &expected).unwrap();

    // Drop the transfer from the last block.
    let mut altered = blocks.clone();
    if let Some(last) = altered.last_mut() {
        last.actions.remove(1);
    }
    let err = verify_replay(&Snapshot::empty(), &altered, chain.env(), &expected).unwrap_err();
    assert!(err.to_string().contains("replay root mismatch"));
}

#[test]
fn non_monotonic_block_index_is_fatal() {
    let mut chain = TestChain::new(vec![minter()]);
    let blocks = blocks();
    chain.execute(blocks[0].clone());
    let before = chain.snapshot.root();

    for index in [0, 1] {
        let block = Block {
            index,
            actions: blocks[1].actions.clone(),
        };
        let err = execute_block(&chain.snapshot, &block, chain.env())
            .err()
            .expect("stale block must fail");
        assert!(err.to_string().contains("non-monotonic block index"));
    }
    assert_eq!(chain.snapshot.root(), before);
}

#[test]
fn position_determines_randomness() {
    // The same craft submitted at a different position draws a different instance id.
    let blocks = blocks();
    let mut chain = TestChain::new(vec![minter()]);
    let receipts = run_all(&mut chain, &blocks[..3]);
    let original = started_instances(&receipts);

    let mut shifted = blocks[..3].to_vec();
    shifted[2].index = 4;
    let mut other = TestChain::new(vec![minter()]);
    let receipts = run_all(&mut other, &shifted);
    let moved = started_instances(&receipts);

    assert_eq!(original.len(), 2);
    assert_eq!(moved.len(), 2);
    assert_ne!(original, moved);
}
