use std::{
    collections::HashSet,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread,
};

use evidence_types::{
    crypto, evidence_list_size, BlockMeta, Commit, Digest, DuplicateVoteEvidence, Evidence,
    EvidenceError, PublicKey, SecretKey, Timestamp, Vote,
};

use super::*;
use crate::{
    components::storage::{self, LmdbStore},
    testing::{self, chain_state, EvidenceFixture, MockBlockStore, MockStateStore, PoolHarness},
};

/// Chain at height 20, evidence expires after 5 blocks and 10 seconds.
fn default_state() -> ChainState {
    chain_state(20, 20_000, 5, 10_000)
}

fn harness(fixture: &EvidenceFixture) -> PoolHarness {
    testing::init_logging();
    PoolHarness::new(default_state(), fixture.validators().clone())
}

fn heights(evidence: &[Evidence]) -> Vec<u64> {
    evidence.iter().map(Evidence::height).collect()
}

fn listed_heights(pool: &EvidencePool) -> Vec<u64> {
    pool.evidence_list()
        .elements()
        .iter()
        .map(|element| element.value().height())
        .collect()
}

fn rejection(result: Result<(), Error>) -> InvalidEvidenceReason {
    match result {
        Err(err) => err
            .invalid_reason()
            .cloned()
            .unwrap_or_else(|| panic!("expected invalid evidence, got {}", err)),
        Ok(()) => panic!("expected evidence to be rejected"),
    }
}

fn gauge_value(registry: &Registry, name: &str) -> f64 {
    registry
        .gather()
        .iter()
        .find(|family| family.get_name() == name)
        .map(|family| family.get_metric()[0].get_gauge().get_value())
        .unwrap_or_else(|| panic!("metric {} should be registered", name))
}

/// Evidence from the fixture's votes at height 15, with the recorded powers overridden.
fn evidence_with_powers(
    fixture: &EvidenceFixture,
    total_voting_power: u64,
    validator_power: u64,
) -> Evidence {
    let (vote_a, vote_b) = canonical(fixture.conflicting_votes(15, 0));
    DuplicateVoteEvidence::from_parts(
        vote_a,
        vote_b,
        total_voting_power,
        validator_power,
        Timestamp::from(15_000),
    )
    .into()
}

fn canonical((vote1, vote2): (Vote, Vote)) -> (Vote, Vote) {
    if vote1.block_hash() <= vote2.block_hash() {
        (vote1, vote2)
    } else {
        (vote2, vote1)
    }
}

#[test]
fn should_add_evidence_once() {
    let fixture = EvidenceFixture::new();
    let harness = harness(&fixture);
    let evidence = fixture.evidence(15, 0, 15_000);

    harness.pool.add_evidence(evidence.clone()).unwrap();
    harness.pool.add_evidence(evidence.clone()).unwrap();
    harness.pool.add_evidence_trusted(evidence.clone()).unwrap();

    assert_eq!(harness.pool.size(), 1);
    assert_eq!(harness.pool.evidence_list().len(), 1);
    assert!(harness.pool.is_pending(&evidence));
    assert!(!harness.pool.is_committed(&evidence));
    assert_eq!(
        harness.pool.front().map(|element| element.value().clone()),
        Some(evidence)
    );
    assert_eq!(gauge_value(&harness.registry, "evidence_pool_pending"), 1.0);
}

#[test]
fn should_count_concurrent_adds_once() {
    let fixture = EvidenceFixture::new();
    let harness = harness(&fixture);
    let items: Vec<Evidence> = (0..16)
        .map(|round| fixture.evidence(15, round, 15_000))
        .collect();

    let pool = &harness.pool;
    thread::scope(|scope| {
        // Every item is submitted twice, from different threads.
        for item in items.iter().chain(items.iter()) {
            scope.spawn(move || pool.add_evidence(item.clone()).unwrap());
        }
    });

    assert_eq!(pool.size(), items.len());
    assert_eq!(pool.evidence_list().len(), items.len());
    let (pending, _) = pool.pending_evidence(-1);
    let hashes: HashSet<Digest> = pending.iter().map(Evidence::hash).collect();
    assert_eq!(hashes.len(), items.len());
    assert!(items.iter().all(|item| hashes.contains(&item.hash())));
}

#[test]
fn should_move_included_evidence_to_committed() {
    let fixture = EvidenceFixture::new();
    let harness = harness(&fixture);
    let evidence = fixture.evidence(15, 0, 15_000);
    let other = fixture.evidence(15, 1, 15_000);
    harness.pool.add_evidence(evidence.clone()).unwrap();
    harness.pool.add_evidence(other.clone()).unwrap();
    let element = harness.pool.front().expect("should have pending evidence");

    harness
        .pool
        .update(chain_state(21, 21_000, 5, 10_000), &[evidence.clone()]);

    assert_eq!(harness.pool.size(), 1);
    assert!(!harness.pool.is_pending(&evidence));
    assert!(harness.pool.is_committed(&evidence));
    assert!(element.is_removed());
    assert_eq!(listed_heights(&harness.pool), vec![15]);
    assert_eq!(harness.pool.pending_evidence(-1).0, vec![other]);
    assert_eq!(harness.pool.committed_height(&evidence).unwrap(), Some(21));

    // Resubmitting committed evidence is harmless, but a block must not include it again.
    harness.pool.add_evidence(evidence.clone()).unwrap();
    harness.pool.add_evidence_trusted(evidence.clone()).unwrap();
    assert_eq!(harness.pool.size(), 1);
    assert_eq!(
        rejection(harness.pool.check_evidence(&[evidence])),
        InvalidEvidenceReason::AlreadyCommitted
    );
}

#[test]
fn should_record_evidence_committed_without_being_pending() {
    let fixture = EvidenceFixture::new();
    let harness = harness(&fixture);
    let evidence = fixture.evidence(15, 0, 15_000);

    harness
        .pool
        .update(chain_state(21, 21_000, 5, 10_000), &[evidence.clone()]);

    assert!(harness.pool.is_committed(&evidence));
    assert_eq!(harness.pool.size(), 0);
    harness.pool.add_evidence(evidence.clone()).unwrap();
    assert_eq!(harness.pool.size(), 0);
    assert!(harness.pool.evidence_list().is_empty());
}

#[test]
fn should_recover_committed_evidence_from_block() {
    let fixture = EvidenceFixture::new();
    let harness = harness(&fixture);
    let evidence = fixture.evidence(15, 0, 15_000);
    let never_committed = fixture.evidence(15, 1, 15_000);
    harness.pool.add_evidence(evidence.clone()).unwrap();

    harness
        .pool
        .update(chain_state(21, 21_000, 5, 10_000), &[evidence.clone()]);
    // The block is pruned from the block store until it is inserted.
    assert_eq!(harness.pool.recover_committed(&evidence).unwrap(), None);

    harness.block_store.insert_commit(Commit {
        height: 21,
        block_hash: Digest::hash(b"block 21"),
        timestamp: Timestamp::from(21_000),
        evidence: vec![evidence.clone()],
    });
    assert_eq!(
        harness.pool.recover_committed(&evidence).unwrap(),
        Some(evidence)
    );
    assert_eq!(harness.pool.committed_height(&never_committed).unwrap(), None);
    assert_eq!(harness.pool.recover_committed(&never_committed).unwrap(), None);
}

#[test]
fn should_prune_expired_evidence_behind_watermark() {
    let fixture = EvidenceFixture::new();
    testing::init_logging();
    let harness = PoolHarness::new(chain_state(12, 12_000, 1, 2_500), fixture.validators().clone());
    for height in 10..=12 {
        harness
            .pool
            .add_evidence(fixture.evidence(height, 0, height * 1_000))
            .unwrap();
    }
    assert_eq!(harness.pool.size(), 3);
    assert_eq!(
        harness.pool.prune_watermark(),
        PruneWatermark {
            height: 12,
            time: Timestamp::from(12_000)
        }
    );

    // Only evidence from height 10 is past both limits.
    harness.pool.update(chain_state(14, 13_000, 1, 2_500), &[]);
    assert_eq!(harness.pool.size(), 2);
    assert_eq!(heights(&harness.pool.pending_evidence(-1).0), vec![11, 12]);
    assert_eq!(listed_heights(&harness.pool), vec![11, 12]);
    // Height 11 can't expire before height 13 and 11s + 2.5s + 1s.
    assert_eq!(
        harness.pool.prune_watermark(),
        PruneWatermark {
            height: 13,
            time: Timestamp::from(14_500)
        }
    );

    // The watermark time isn't reached yet, so nothing is pruned even though height 11 expired.
    harness.pool.update(chain_state(15, 14_000, 1, 2_500), &[]);
    assert_eq!(harness.pool.size(), 2);

    harness.pool.update(chain_state(16, 15_000, 1, 2_500), &[]);
    assert_eq!(harness.pool.size(), 0);
    assert!(harness.pool.evidence_list().is_empty());
    assert_eq!(
        harness.pool.prune_watermark(),
        PruneWatermark {
            height: 16,
            time: Timestamp::from(15_000)
        }
    );
    assert_eq!(gauge_value(&harness.registry, "evidence_pool_pending"), 0.0);
}

#[test]
fn should_never_lower_prune_watermark() {
    let fixture = EvidenceFixture::new();
    let harness = harness(&fixture);
    // Old in blocks, recent in time.
    let survivor = fixture.evidence(12, 0, 19_500);
    harness
        .pool
        .add_evidence_trusted(fixture.evidence(10, 0, 10_000))
        .unwrap();
    harness.pool.add_evidence_trusted(survivor.clone()).unwrap();

    // Height 10 expires. The survivor alone would give a watermark at height 18.
    harness.pool.update(chain_state(21, 21_000, 5, 10_000), &[]);
    assert_eq!(harness.pool.size(), 1);
    assert!(harness.pool.is_pending(&survivor));
    assert_eq!(
        harness.pool.prune_watermark(),
        PruneWatermark {
            height: 20,
            time: Timestamp::from(30_500)
        }
    );

    harness.pool.update(chain_state(22, 31_000, 5, 10_000), &[]);
    assert_eq!(harness.pool.size(), 0);
    assert_eq!(
        harness.pool.prune_watermark(),
        PruneWatermark {
            height: 22,
            time: Timestamp::from(31_000)
        }
    );
}

#[test]
fn should_keep_evidence_until_both_age_limits_pass() {
    let fixture = EvidenceFixture::new();
    testing::init_logging();
    let harness = PoolHarness::new(
        chain_state(10, 10_000, 1, 100_000),
        fixture.validators().clone(),
    );
    let evidence = fixture.evidence(5, 0, 5_000);
    harness.pool.add_evidence(evidence.clone()).unwrap();

    // Fifteen blocks old, but only six seconds.
    harness.pool.update(chain_state(20, 11_000, 1, 100_000), &[]);
    assert!(harness.pool.is_pending(&evidence));

    harness.pool.update(chain_state(21, 200_000, 1, 100_000), &[]);
    assert!(!harness.pool.is_pending(&evidence));
}

#[test]
fn should_reject_duplicates_in_block_before_verifying() {
    let fixture = EvidenceFixture::new();
    let harness = harness(&fixture);
    // Evidence from the future would fail verification.
    let evidence = fixture.evidence(50, 0, 50_000);

    assert_eq!(
        rejection(
            harness
                .pool
                .check_evidence(&[evidence.clone(), evidence.clone()])
        ),
        InvalidEvidenceReason::Duplicate
    );
    assert_eq!(
        rejection(harness.pool.check_evidence(&[evidence])),
        InvalidEvidenceReason::FutureHeight {
            evidence_height: 50,
            chain_height: 20
        }
    );
    assert_eq!(harness.pool.size(), 0);
}

#[test]
fn should_admit_unseen_evidence_from_block() {
    let fixture = EvidenceFixture::new();
    let harness = harness(&fixture);
    let first = fixture.evidence(14, 0, 14_000);
    let second = fixture.evidence(15, 0, 15_000);
    let third = fixture.evidence(16, 0, 16_000);

    harness
        .pool
        .check_evidence(&[first.clone(), second.clone()])
        .unwrap();
    assert_eq!(harness.pool.size(), 2);
    assert_eq!(listed_heights(&harness.pool), vec![14, 15]);

    // Already pending evidence is accepted as is.
    harness.pool.check_evidence(&[second.clone(), first]).unwrap();
    assert_eq!(harness.pool.size(), 2);

    // Items before the invalid one have been admitted by the time it is reached.
    let invalid = evidence_with_powers(&fixture, 40, 11);
    assert!(matches!(
        rejection(harness.pool.check_evidence(&[third.clone(), invalid])),
        InvalidEvidenceReason::ValidatorPowerMismatch { .. }
    ));
    assert!(harness.pool.is_pending(&third));
    assert_eq!(harness.pool.size(), 3);
}

#[test]
fn should_fill_pending_evidence_up_to_max_bytes() {
    let fixture = EvidenceFixture::new();
    let harness = harness(&fixture);
    for height in [15, 13, 14] {
        harness
            .pool
            .add_evidence(fixture.evidence(height, 0, height * 1_000))
            .unwrap();
    }

    let (all, total) = harness.pool.pending_evidence(-1);
    assert_eq!(heights(&all), vec![13, 14, 15]);
    assert_eq!(total, evidence_list_size(&all) as i64);

    for max_bytes in [0, EVIDENCE_LIST_PREFIX_SIZE, total - 1, total, total + 100] {
        let (evidence, size) = harness.pool.pending_evidence(max_bytes);
        assert!(size <= max_bytes, "{} exceeds {}", size, max_bytes);
        assert_eq!(evidence[..], all[..evidence.len()]);
        if evidence.is_empty() {
            assert_eq!(size, 0);
        } else {
            assert_eq!(size, evidence_list_size(&evidence) as i64);
        }
    }
    assert!(harness.pool.pending_evidence(EVIDENCE_LIST_PREFIX_SIZE).0.is_empty());
    assert_eq!(harness.pool.pending_evidence(total - 1).0.len(), 2);
    assert_eq!(harness.pool.pending_evidence(total).0.len(), 3);
}

#[test]
fn should_return_nothing_when_empty() {
    let fixture = EvidenceFixture::new();
    let harness = harness(&fixture);
    assert_eq!(harness.pool.pending_evidence(-1), (Vec::new(), 0));
    assert_eq!(harness.pool.pending_evidence(1_000), (Vec::new(), 0));
}

#[test]
fn should_reject_evidence_against_chain() {
    let fixture = EvidenceFixture::new();
    let harness = harness(&fixture);

    assert_eq!(
        rejection(harness.pool.add_evidence(fixture.evidence(21, 0, 21_000))),
        InvalidEvidenceReason::FutureHeight {
            evidence_height: 21,
            chain_height: 20
        }
    );
    assert_eq!(
        rejection(harness.pool.add_evidence(fixture.evidence(10, 0, 5_000))),
        InvalidEvidenceReason::Expired {
            height: 10,
            time: Timestamp::from(5_000)
        }
    );

    harness.block_store.insert_meta(BlockMeta {
        height: 15,
        block_hash: Digest::hash(b"block 15"),
        time: Timestamp::from(15_500),
    });
    assert_eq!(
        rejection(harness.pool.add_evidence(fixture.evidence(15, 0, 15_000))),
        InvalidEvidenceReason::TimeMismatch {
            evidence_time: Timestamp::from(15_000),
            block_time: Timestamp::from(15_500)
        }
    );
    harness
        .pool
        .add_evidence(fixture.evidence(15, 0, 15_500))
        .unwrap();

    assert_eq!(harness.pool.size(), 1);
}

#[test]
fn should_reject_evidence_against_validator_set() {
    let mut fixture = EvidenceFixture::new();
    let harness = harness(&fixture);

    assert_eq!(
        rejection(harness.pool.add_evidence(evidence_with_powers(&fixture, 40, 11))),
        InvalidEvidenceReason::ValidatorPowerMismatch {
            recorded: 11,
            actual: EvidenceFixture::ACCUSED_POWER
        }
    );
    assert_eq!(
        rejection(harness.pool.add_evidence(evidence_with_powers(&fixture, 41, 10))),
        InvalidEvidenceReason::TotalVotingPowerMismatch {
            recorded: 41,
            actual: 40
        }
    );

    // A validator outside the set, signing its own conflicting votes.
    let outsider = SecretKey::random(&mut fixture.rng);
    let vote = |block: &[u8]| {
        Vote::new_signed(
            evidence_types::VoteType::Prevote,
            15,
            0,
            Some(Digest::hash(block)),
            Timestamp::from(15_000),
            &outsider,
        )
    };
    let (vote_a, vote_b) = canonical((vote(b"first block"), vote(b"second block")));
    let unknown: Evidence =
        DuplicateVoteEvidence::from_parts(vote_a, vote_b, 40, 10, Timestamp::from(15_000)).into();
    assert_eq!(
        rejection(harness.pool.add_evidence(unknown)),
        InvalidEvidenceReason::UnknownValidator
    );
    assert_eq!(harness.pool.size(), 0);
}

#[test]
fn should_reject_malformed_or_forged_evidence() {
    let fixture = EvidenceFixture::new();
    let harness = harness(&fixture);
    let (vote_a, vote_b) = canonical(fixture.conflicting_votes(15, 0));

    let same_vote: Evidence = DuplicateVoteEvidence::from_parts(
        vote_a.clone(),
        vote_a.clone(),
        40,
        10,
        Timestamp::from(15_000),
    )
    .into();
    assert_eq!(
        rejection(harness.pool.add_evidence(same_vote)),
        InvalidEvidenceReason::Malformed(EvidenceError::SameBlock)
    );

    let reversed: Evidence = DuplicateVoteEvidence::from_parts(
        vote_b.clone(),
        vote_a.clone(),
        40,
        10,
        Timestamp::from(15_000),
    )
    .into();
    assert_eq!(
        rejection(harness.pool.add_evidence(reversed)),
        InvalidEvidenceReason::Malformed(EvidenceError::NonCanonicalOrder)
    );

    // Vote b carries vote a's signature.
    let forged_vote = Vote::from_parts(
        vote_b.vote_type(),
        vote_b.height(),
        vote_b.round(),
        vote_b.block_hash().copied(),
        vote_b.timestamp(),
        *vote_b.validator(),
        *vote_a.signature(),
    );
    let forged: Evidence =
        DuplicateVoteEvidence::from_parts(vote_a, forged_vote, 40, 10, Timestamp::from(15_000))
            .into();
    assert_eq!(
        rejection(harness.pool.add_evidence(forged)),
        InvalidEvidenceReason::InvalidSignature(crypto::Error::SignatureVerification)
    );
    assert_eq!(harness.pool.size(), 0);
}

#[test]
fn should_reject_evidence_without_validator_set() {
    let fixture = EvidenceFixture::new();
    testing::init_logging();
    let state_store = Arc::new(
        MockStateStore::new(default_state(), fixture.validators().clone()).with_first_height(16),
    );
    let harness = PoolHarness::with_store(
        state_store,
        Arc::new(storage::InMemStore::new()),
        Arc::new(MockBlockStore::default()),
    );

    assert_eq!(
        rejection(harness.pool.add_evidence(fixture.evidence(15, 0, 15_000))),
        InvalidEvidenceReason::ValidatorLookup(StateStoreError::NoValidatorSet(15))
    );
    harness
        .pool
        .add_evidence(fixture.evidence(16, 0, 16_000))
        .unwrap();
    assert_eq!(harness.pool.size(), 1);
}

#[test]
fn should_verify_without_adding() {
    let fixture = EvidenceFixture::new();
    let harness = harness(&fixture);
    let evidence = fixture.evidence(15, 0, 15_000);

    harness.pool.verify(&evidence).unwrap();
    assert!(harness.pool.verify(&evidence_with_powers(&fixture, 40, 11)).is_err());
    assert_eq!(harness.pool.size(), 0);
}

#[test]
fn should_trust_evidence_from_consensus() {
    let fixture = EvidenceFixture::new();
    let harness = harness(&fixture);
    // Wouldn't pass verification.
    let evidence = evidence_with_powers(&fixture, 40, 11);

    harness.pool.add_evidence_trusted(evidence.clone()).unwrap();
    harness.pool.add_evidence_trusted(evidence.clone()).unwrap();
    assert_eq!(harness.pool.size(), 1);
    assert!(harness.pool.is_pending(&evidence));
    // Once pending, a block may include it.
    harness.pool.check_evidence(&[evidence]).unwrap();
}

#[test]
fn should_reload_pending_evidence_on_open() {
    let fixture = EvidenceFixture::new();
    let harness = harness(&fixture);
    for height in [15, 13, 14] {
        harness
            .pool
            .add_evidence(fixture.evidence(height, 0, height * 1_000))
            .unwrap();
    }
    assert_eq!(listed_heights(&harness.pool), vec![15, 13, 14]);

    let harness = harness.reopen();
    assert_eq!(harness.pool.size(), 3);
    assert_eq!(listed_heights(&harness.pool), vec![13, 14, 15]);
    assert_eq!(gauge_value(&harness.registry, "evidence_pool_pending"), 3.0);
    // The survivor at height 13 puts the watermark at height 19, below the chain's 20.
    assert_eq!(
        harness.pool.prune_watermark(),
        PruneWatermark {
            height: 20,
            time: Timestamp::from(24_000)
        }
    );

    // Everything expired while the node was down.
    harness
        .state_store
        .set_state(chain_state(40, 40_000, 5, 10_000));
    let harness = harness.reopen();
    assert_eq!(harness.pool.size(), 0);
    assert!(harness.pool.evidence_list().is_empty());
    assert_eq!(harness.pool.state().last_block_height, 40);
    assert_eq!(
        harness.pool.prune_watermark(),
        PruneWatermark {
            height: 40,
            time: Timestamp::from(40_000)
        }
    );
}

#[test]
fn should_skip_undecodable_pending_entries_on_open() {
    let fixture = EvidenceFixture::new();
    let harness = harness(&fixture);
    harness
        .pool
        .add_evidence(fixture.evidence(15, 0, 15_000))
        .unwrap();
    let garbage_key = b"evidence-pending000000000000000E/00".to_vec();
    assert!(harness.store.put(&garbage_key, b"not evidence").unwrap());

    let harness = harness.reopen();
    // Counted, but neither gossiped nor proposed.
    assert_eq!(harness.pool.size(), 2);
    assert_eq!(listed_heights(&harness.pool), vec![15]);
    assert_eq!(heights(&harness.pool.pending_evidence(-1).0), vec![15]);
}

#[test]
#[should_panic(expected = "chain state must advance")]
fn should_panic_on_stale_update() {
    let fixture = EvidenceFixture::new();
    let harness = harness(&fixture);
    harness.pool.update(default_state(), &[]);
}

#[test]
fn should_stay_usable_after_stale_update() {
    let fixture = EvidenceFixture::new();
    let harness = harness(&fixture);
    let stale = panic::catch_unwind(AssertUnwindSafe(|| {
        harness.pool.update(default_state(), &[]);
    }));
    assert!(stale.is_err());

    let evidence = fixture.evidence(15, 0, 15_000);
    harness.pool.add_evidence(evidence.clone()).unwrap();
    assert!(harness.pool.is_pending(&evidence));
    harness
        .pool
        .update(chain_state(21, 21_000, 5, 10_000), &[evidence.clone()]);
    assert!(harness.pool.is_committed(&evidence));
    assert_eq!(harness.pool.state().last_block_height, 21);
}

#[test]
fn should_persist_pool_in_lmdb() {
    let fixture = EvidenceFixture::new();
    testing::init_logging();
    let (config, _tempdir) = storage::Config::default_for_tests();
    let store: Arc<dyn storage::Store> =
        Arc::new(LmdbStore::new(&config).expect("should open lmdb store"));
    let harness = PoolHarness::with_store(
        Arc::new(MockStateStore::new(
            default_state(),
            fixture.validators().clone(),
        )),
        store,
        Arc::new(MockBlockStore::default()),
    );
    let committed = fixture.evidence(14, 0, 14_000);
    let pending = fixture.evidence(15, 0, 15_000);
    harness.pool.add_evidence(committed.clone()).unwrap();
    harness.pool.add_evidence(pending.clone()).unwrap();
    harness
        .pool
        .update(chain_state(21, 21_000, 5, 10_000), &[committed.clone()]);

    let harness = harness.reopen();
    assert_eq!(harness.pool.size(), 1);
    assert!(harness.pool.is_pending(&pending));
    assert!(harness.pool.is_committed(&committed));
    assert_eq!(harness.pool.committed_height(&committed).unwrap(), Some(21));
    assert_eq!(harness.pool.pending_evidence(-1).0, vec![pending]);
}

#[test]
fn should_not_mix_up_accused_validators() {
    let fixture = EvidenceFixture::new();
    let harness = harness(&fixture);
    let evidence = fixture.evidence(15, 0, 15_000);
    harness.pool.add_evidence(evidence.clone()).unwrap();

    let accused = PublicKey::from(fixture.secret_key());
    let listed = harness.pool.front().expect("should have pending evidence");
    assert_eq!(listed.value().accused(), &accused);
}
