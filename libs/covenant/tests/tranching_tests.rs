//! Split, merge, principal redemption and yield claims

mod common;

use common::{holder, Harness, EXPIRY, RATE_BPS, START, TERM};
use facet_codec::{Commitment, CommitmentKind, Facet, PrincipalToken, StakeReceipt, YieldToken};
use facet_config::MergePolicy;
use facet_covenant::Operation;
use facet_types::{CovenantError, Utxo};
use proptest::prelude::*;

const FULL_TERM_YIELD: u64 = TERM as u64 * RATE_BPS as u64 / 10_000;

fn split(harness: &mut Harness, amount: u64) -> (Utxo, Utxo) {
    let receipt = harness.stake(amount, holder(1));
    let inputs = harness.split_inputs(receipt);
    harness
        .submit(
            &Operation::Split {
                expiry: EXPIRY,
                holder: holder(1),
            },
            inputs,
        )
        .unwrap();
    (
        harness.token(CommitmentKind::Principal).0,
        harness.token(CommitmentKind::Yield).0,
    )
}

fn merge_inputs(harness: &Harness, pt: Utxo, yt: Utxo) -> Vec<Utxo> {
    vec![
        pt,
        yt,
        harness.registry(Facet::Principal),
        harness.registry(Facet::Staking),
        harness.registry(Facet::Yield),
    ]
}

#[test]
fn test_split_commitments_match_wire_layout() {
    let mut harness = Harness::new();
    split(&mut harness, 50_000);

    let (pt, decoded) = harness.token(CommitmentKind::Principal);
    assert_eq!(
        decoded,
        Commitment::Principal(PrincipalToken {
            principal: 50_000,
            expiry: 500_000
        })
    );
    assert_eq!(
        hex::encode(&pt.output.nft().unwrap().commitment),
        "000000000000c3500007a120"
    );
    let (yt, _) = harness.token(CommitmentKind::Yield);
    assert_eq!(
        hex::encode(&yt.output.nft().unwrap().commitment),
        "00000000000000000007a120"
    );

    assert_eq!(harness.reserve(Facet::Staking), 0);
    assert_eq!(harness.reserve(Facet::Principal), 50_000);
    assert!(harness.tokens(CommitmentKind::StakeReceipt).is_empty());
}

#[test]
fn test_split_rejects_expiry_inside_term() {
    let mut harness = Harness::new();
    let receipt = harness.stake(50_000, holder(1));
    let inputs = harness.split_inputs(receipt);
    let err = harness
        .submit(
            &Operation::Split {
                expiry: START + TERM - 1,
                holder: holder(1),
            },
            inputs,
        )
        .unwrap_err();
    assert!(matches!(err, CovenantError::InvalidTransition(_)));
}

#[test]
fn test_merge_before_accrual_restores_receipt() {
    let mut harness = Harness::new();
    let (pt, yt) = split(&mut harness, 50_000);
    let inputs = merge_inputs(&harness, pt, yt);
    harness
        .submit(&Operation::Merge { holder: holder(1) }, inputs)
        .unwrap();

    let (_, receipt) = harness.token(CommitmentKind::StakeReceipt);
    assert_eq!(receipt, Commitment::StakeReceipt(StakeReceipt { amount: 50_000 }));
    assert_eq!(harness.reserve(Facet::Staking), 50_000);
    assert_eq!(harness.reserve(Facet::Principal), 0);
}

#[test]
fn test_merge_rejects_mismatched_expiries() {
    let mut harness = Harness::new();
    let (pt, _) = split(&mut harness, 50_000);

    let receipt = harness.stake(10_000, holder(2));
    let inputs = harness.split_inputs(receipt);
    harness
        .submit(
            &Operation::Split {
                expiry: EXPIRY + 1,
                holder: holder(2),
            },
            inputs,
        )
        .unwrap();
    let other_yt = harness
        .tokens(CommitmentKind::Yield)
        .into_iter()
        .find(|(_, c)| matches!(c, Commitment::Yield(YieldToken { expiry, .. }) if *expiry == EXPIRY + 1))
        .unwrap()
        .0;

    let inputs = merge_inputs(&harness, pt, other_yt);
    let err = harness
        .submit(&Operation::Merge { holder: holder(1) }, inputs)
        .unwrap_err();
    assert_eq!(
        err,
        CovenantError::IncompatibleExpiry {
            principal_expiry: EXPIRY,
            yield_expiry: EXPIRY + 1
        }
    );
}

#[test]
fn test_merge_policy_reject_requires_claim() {
    let mut harness = Harness::with(0, MergePolicy::Reject);
    harness.fund(Facet::Yield, 10_000);
    let (pt, yt) = split(&mut harness, 50_000);
    harness.now = EXPIRY - 1_000;

    let inputs = merge_inputs(&harness, pt, yt);
    let err = harness
        .submit(&Operation::Merge { holder: holder(1) }, inputs)
        .unwrap_err();
    assert!(matches!(err, CovenantError::UnclaimedYield { accrued } if accrued > 0));
}

#[test]
fn test_merge_policy_payout_pays_accrued() {
    let mut harness = Harness::new();
    harness.fund(Facet::Yield, 10_000);
    let (pt, yt) = split(&mut harness, 50_000);
    harness.now = EXPIRY;

    let inputs = merge_inputs(&harness, pt, yt);
    harness
        .submit(&Operation::Merge { holder: holder(1) }, inputs)
        .unwrap();
    assert_eq!(harness.paid_to(&holder(1)), FULL_TERM_YIELD);
    assert_eq!(harness.reserve(Facet::Yield), 10_000 - FULL_TERM_YIELD);
}

#[test]
fn test_merge_policy_forfeit_keeps_reserve() {
    let mut harness = Harness::with(0, MergePolicy::Forfeit);
    harness.fund(Facet::Yield, 10_000);
    let (pt, yt) = split(&mut harness, 50_000);
    harness.now = EXPIRY;

    let inputs = merge_inputs(&harness, pt, yt);
    harness
        .submit(&Operation::Merge { holder: holder(1) }, inputs)
        .unwrap();
    assert_eq!(harness.paid_to(&holder(1)), 0);
    assert_eq!(harness.reserve(Facet::Yield), 10_000);
}

#[test]
fn test_redeem_principal_gated_at_expiry() {
    let mut harness = Harness::with(546, MergePolicy::Payout);
    let (pt, _) = split(&mut harness, 50_000);

    harness.now = EXPIRY - 1;
    let inputs = vec![pt.clone(), harness.registry(Facet::Principal)];
    let err = harness
        .submit(&Operation::RedeemPrincipal { payout: holder(3) }, inputs)
        .unwrap_err();
    assert_eq!(
        err,
        CovenantError::NotYetMatured {
            now: EXPIRY - 1,
            expiry: EXPIRY
        }
    );

    harness.now = EXPIRY;
    let inputs = vec![pt, harness.registry(Facet::Principal)];
    harness
        .submit(&Operation::RedeemPrincipal { payout: holder(3) }, inputs)
        .unwrap();
    assert_eq!(harness.paid_to(&holder(3)), 50_000 + 546);
    assert_eq!(harness.reserve(Facet::Principal), 0);
}

#[test]
fn test_claim_after_expiry_burns_token() {
    let mut harness = Harness::new();
    harness.fund(Facet::Yield, 10_000);
    let (_, yt) = split(&mut harness, 50_000);
    harness.now = EXPIRY + 5_000;

    let inputs = vec![yt, harness.registry(Facet::Yield)];
    harness
        .submit(&Operation::ClaimYield { holder: holder(4) }, inputs)
        .unwrap();
    assert_eq!(harness.paid_to(&holder(4)), FULL_TERM_YIELD);
    assert!(harness.tokens(CommitmentKind::Yield).is_empty());
}

#[test]
fn test_claim_after_expiry_needs_funded_reserve() {
    let mut harness = Harness::new();
    let (_, yt) = split(&mut harness, 50_000);
    harness.now = EXPIRY;

    let inputs = vec![yt, harness.registry(Facet::Yield)];
    let err = harness
        .submit(&Operation::ClaimYield { holder: holder(4) }, inputs)
        .unwrap_err();
    assert_eq!(
        err,
        CovenantError::InsufficientReserve {
            available: 0,
            required: FULL_TERM_YIELD
        }
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_claims_before_expiry_never_decrease(
        mut offsets in proptest::collection::vec(0u32..(EXPIRY - START), 1..6),
    ) {
        offsets.sort_unstable();
        let mut harness = Harness::new();
        split(&mut harness, 50_000);

        let mut last = 0;
        for offset in offsets {
            harness.now = START + offset;
            let yt = harness.token(CommitmentKind::Yield).0;
            let inputs = vec![yt, harness.registry(Facet::Yield)];
            harness
                .submit(&Operation::ClaimYield { holder: holder(1) }, inputs)
                .unwrap();
            let accrued = match harness.token(CommitmentKind::Yield).1 {
                Commitment::Yield(token) => token.accrued,
                other => panic!("unexpected {:?}", other),
            };
            prop_assert!(accrued >= last);
            prop_assert!(accrued <= FULL_TERM_YIELD);
            last = accrued;
        }
    }
}
