//! Submission loop against the in-memory ledger, including lost races

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use facet_chain::{
    AdminPlan, AdminRequest, AdminSigner, Broadcaster, ChainError, ChainQuery, ChainResult,
    LocalSigner, MemoryLedger, Prepared, Rejection, RetryPolicy, Snapshot, Submitter,
};
use facet_codec::{Commitment, CommitmentKind, CommitmentLayout, Facet, StakeReceipt};
use facet_config::FacetConfig;
use facet_covenant::{AdminAction, Deployment, Operation, TransitionValidator, TxContext};
use facet_types::{
    CategoryId, CodeHash, CovenantError, Destination, Outpoint, Output, Transaction, TxId, Utxo,
};

const NOW: u32 = 1_000_000;
const FEE: u64 = 200;

fn wallet(tag: u8) -> Destination {
    Destination::holder(vec![0x76, tag])
}

fn category(facet: Facet) -> CategoryId {
    CategoryId::new([0x40 + facet.id(); 32])
}

fn policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        initial_backoff: Duration::from_millis(1),
    }
}

fn validator(signer: &LocalSigner) -> Arc<TransitionValidator> {
    let mut config = FacetConfig::default();
    config.admin.key_hash = signer.key_hash().to_hex();
    config.categories.staking = category(Facet::Staking).to_hex();
    config.categories.principal = category(Facet::Principal).to_hex();
    config.categories.yield_token = category(Facet::Yield).to_hex();
    config.categories.pool = category(Facet::Pool).to_hex();
    config.categories.options = category(Facet::Options).to_hex();
    config.categories.oracle = category(Facet::Oracle).to_hex();
    config.categories.quote = CategoryId::new([0x70; 32]).to_hex();
    config.categories.oracle_asset = CategoryId::new([0x71; 32]).to_hex();
    config.options.writer = "76ff".to_string();
    Arc::new(TransitionValidator::new(
        Deployment::from_config(&config).unwrap(),
    ))
}

async fn fund(ledger: &MemoryLedger, owner: &Destination, tag: u8, value: u64) {
    ledger
        .mint(Utxo::new(
            Outpoint::new(TxId::new([tag; 32]), 7),
            Output::payment(owner.clone(), value),
        ))
        .await;
}

/// Ledger with every facet deployed
async fn deployed(signer: &LocalSigner, validator: &TransitionValidator) -> MemoryLedger {
    let ledger = MemoryLedger::new(NOW);
    for facet in Facet::ALL {
        let genesis = Utxo::new(
            Outpoint::new(TxId::new(category(facet).into_inner()), 0),
            Output::payment(wallet(0xad), 10_000),
        );
        ledger.mint(genesis.clone()).await;

        let code_hash = CodeHash::new([facet.id(); 32]);
        let auth = signer
            .authorize(&genesis.outpoint, &AdminAction::Deploy { facet, code_hash })
            .await
            .unwrap();
        let ctx = TxContext {
            now: NOW,
            fee: FEE,
            funding: vec![genesis],
            change: wallet(0xad),
        };
        let tx = validator
            .construct(
                &Operation::Deploy {
                    facet,
                    code_hash,
                    auth,
                },
                &[],
                &ctx,
            )
            .unwrap();
        ledger.broadcast(&tx).await.unwrap();
    }
    ledger
}

fn stake_plan(amount: u64, holder: Destination) -> impl Fn(&Snapshot) -> ChainResult<Prepared> {
    move |snapshot: &Snapshot| {
        Ok(Prepared {
            operation: Operation::Stake {
                amount,
                holder: holder.clone(),
            },
            state_inputs: vec![snapshot.registry(Facet::Staking)?],
        })
    }
}

async fn staking_reserve(ledger: &MemoryLedger) -> u64 {
    let registries = ledger
        .unspent_by_category(&category(Facet::Staking))
        .await
        .unwrap()
        .into_iter()
        .filter(|utxo| utxo.output.token.as_ref().is_some_and(|t| t.is_minting()))
        .collect::<Vec<_>>();
    assert_eq!(registries.len(), 1);
    registries[0].output.value
}

/// Chain wrapper that lands a rival stake just before each of our broadcasts
struct Interloper {
    ledger: MemoryLedger,
    validator: Arc<TransitionValidator>,
    rival: Destination,
    front_runs: AtomicU32,
}

impl Interloper {
    async fn front_run(&self) -> ChainResult<()> {
        let snapshot = Snapshot::load(&self.ledger, self.validator.deployment(), &self.rival).await?;
        let ctx = TxContext {
            now: snapshot.now,
            fee: FEE,
            funding: snapshot.funding.clone(),
            change: self.rival.clone(),
        };
        let tx = self.validator.construct(
            &Operation::Stake {
                amount: 10_000,
                holder: self.rival.clone(),
            },
            &[snapshot.registry(Facet::Staking)?],
            &ctx,
        )?;
        self.ledger.broadcast(&tx).await?;
        Ok(())
    }
}

#[async_trait]
impl ChainQuery for Interloper {
    async fn unspent_by_category(&self, category: &CategoryId) -> ChainResult<Vec<Utxo>> {
        self.ledger.unspent_by_category(category).await
    }

    async fn unspent_for(&self, destination: &Destination) -> ChainResult<Vec<Utxo>> {
        self.ledger.unspent_for(destination).await
    }

    async fn current_time(&self) -> ChainResult<u32> {
        self.ledger.current_time().await
    }
}

#[async_trait]
impl Broadcaster for Interloper {
    async fn broadcast(&self, tx: &Transaction) -> ChainResult<TxId> {
        let pending = self.front_runs.load(Ordering::SeqCst);
        if pending > 0 {
            self.front_runs.store(pending - 1, Ordering::SeqCst);
            self.front_run().await?;
        }
        self.ledger.broadcast(tx).await
    }
}

async fn interloper(front_runs: u32) -> (Arc<Interloper>, Arc<TransitionValidator>) {
    let signer = LocalSigner::from_seed([1; 32]);
    let validator = validator(&signer);
    let ledger = deployed(&signer, &validator).await;
    fund(&ledger, &wallet(1), 0x01, 1_000_000).await;
    fund(&ledger, &wallet(2), 0x02, 1_000_000).await;
    let chain = Arc::new(Interloper {
        ledger,
        validator: validator.clone(),
        rival: wallet(2),
        front_runs: AtomicU32::new(front_runs),
    });
    (chain, validator)
}

#[tokio::test]
async fn test_stake_lands_on_first_attempt() {
    let signer = LocalSigner::from_seed([1; 32]);
    let validator = validator(&signer);
    let ledger = Arc::new(deployed(&signer, &validator).await);
    fund(&ledger, &wallet(1), 0x01, 1_000_000).await;

    let submitter = Submitter::new(validator, ledger.clone(), wallet(1), FEE, policy(3));
    let submitted = submitter.submit(&stake_plan(50_000, wallet(1))).await.unwrap();

    assert_eq!(submitted.attempts, 1);
    assert_eq!(submitted.txid, facet_chain::txid(&submitted.tx).unwrap());
    assert_eq!(staking_reserve(&ledger).await, 50_000);
    let receipts = ledger.unspent_for(&wallet(1)).await.unwrap();
    assert!(receipts
        .iter()
        .any(|utxo| utxo.output.category() == Some(category(Facet::Staking))));
}

#[tokio::test]
async fn test_receipt_cannot_be_inflated_outside_the_covenant() {
    let signer = LocalSigner::from_seed([1; 32]);
    let validator = validator(&signer);
    let ledger = Arc::new(deployed(&signer, &validator).await);
    fund(&ledger, &wallet(1), 0x01, 1_000_000).await;
    fund(&ledger, &wallet(2), 0x02, 1_000_000).await;
    for (owner, amount) in [(wallet(1), 50_000), (wallet(2), 10_000)] {
        Submitter::new(validator.clone(), ledger.clone(), owner.clone(), FEE, policy(3))
            .submit(&stake_plan(amount, owner))
            .await
            .unwrap();
    }

    let receipt = ledger
        .unspent_for(&wallet(2))
        .await
        .unwrap()
        .into_iter()
        .find(|utxo| utxo.output.category() == Some(category(Facet::Staking)))
        .unwrap();
    let mut inflated = receipt.output.clone();
    if let Some(nft) = inflated.token.as_mut().and_then(|token| token.nft.as_mut()) {
        nft.commitment = StakeReceipt { amount: 60_000 }.encode();
    }
    let err = ledger
        .broadcast(&Transaction {
            inputs: vec![receipt.clone()],
            outputs: vec![inflated],
            fee: 0,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ChainError::Rejected(Rejection::NftUnauthorized { .. })
    ));
    assert!(ledger.is_unspent(&receipt.outpoint).await);
    assert_eq!(staking_reserve(&ledger).await, 60_000);
}

#[tokio::test]
async fn test_lost_race_rebuilds_against_winner() {
    let (chain, validator) = interloper(1).await;
    let submitter = Submitter::new(validator, chain.clone(), wallet(1), FEE, policy(3));

    let submitted = submitter.submit(&stake_plan(30_000, wallet(1))).await.unwrap();
    assert_eq!(submitted.attempts, 2);
    assert_eq!(staking_reserve(&chain.ledger).await, 40_000);
}

#[tokio::test]
async fn test_retries_exhausted_after_repeated_losses() {
    let (chain, validator) = interloper(5).await;
    let submitter = Submitter::new(validator, chain.clone(), wallet(1), FEE, policy(2));

    let err = submitter
        .submit(&stake_plan(30_000, wallet(1)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ChainError::RetriesExhausted {
            attempts: 3,
            last: Rejection::InputsSpent { .. }
        }
    ));
    assert_eq!(staking_reserve(&chain.ledger).await, 30_000);
}

#[tokio::test]
async fn test_covenant_error_is_terminal() {
    let signer = LocalSigner::from_seed([1; 32]);
    let validator = validator(&signer);
    let ledger = Arc::new(deployed(&signer, &validator).await);
    fund(&ledger, &wallet(1), 0x01, 1_000_000).await;
    let before = ledger.accepted().await;

    let submitter = Submitter::new(validator, ledger.clone(), wallet(1), FEE, policy(3));
    let err = submitter.submit(&stake_plan(10, wallet(1))).await.unwrap_err();
    assert!(matches!(
        err,
        ChainError::Covenant(CovenantError::BelowMinimum { .. })
    ));
    assert!(!err.is_retryable());
    assert_eq!(ledger.accepted().await, before);
}

#[tokio::test]
async fn test_admin_plan_resigns_each_update() {
    let signer = Arc::new(LocalSigner::from_seed([1; 32]));
    let validator = validator(&signer);
    let ledger = Arc::new(deployed(&signer, &validator).await);
    fund(&ledger, &wallet(0xad), 0x0a, 1_000_000).await;

    let submitter = Submitter::new(
        validator.clone(),
        ledger.clone(),
        wallet(0xad),
        FEE,
        policy(3),
    );
    for (step, price) in [(0u32, 1_250u64), (60, 1_300)] {
        ledger.advance_time(step).await;
        let plan = AdminPlan {
            signer: signer.clone(),
            request: AdminRequest::UpdatePrice { price },
        };
        submitter.submit(&plan).await.unwrap();
    }

    let snapshot = Snapshot::load(ledger.as_ref(), validator.deployment(), &wallet(0xad))
        .await
        .unwrap();
    let feeds = snapshot.states(CommitmentKind::PriceFeed);
    assert_eq!(feeds.len(), 1);
    assert!(matches!(
        feeds[0].1,
        Commitment::PriceFeed(f) if f.price == 1_300 && f.published_at == NOW + 60
    ));
}

#[tokio::test]
async fn test_admin_plan_with_foreign_key_unauthorized() {
    let signer = LocalSigner::from_seed([1; 32]);
    let validator = validator(&signer);
    let ledger = Arc::new(deployed(&signer, &validator).await);
    fund(&ledger, &wallet(0xad), 0x0a, 1_000_000).await;

    let submitter = Submitter::new(validator, ledger, wallet(0xad), FEE, policy(3));
    let plan = AdminPlan {
        signer: Arc::new(LocalSigner::from_seed([2; 32])),
        request: AdminRequest::SetPaused {
            facet: Facet::Staking,
            paused: true,
        },
    };
    let err = submitter.submit(&plan).await.unwrap_err();
    assert!(matches!(
        err,
        ChainError::Covenant(CovenantError::Unauthorized { .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_stakers_all_land() {
    let signer = LocalSigner::from_seed([1; 32]);
    let validator = validator(&signer);
    let ledger = Arc::new(deployed(&signer, &validator).await);

    let mut handles = Vec::new();
    for tag in 1..=4u8 {
        fund(&ledger, &wallet(tag), tag, 1_000_000).await;
        let submitter = Submitter::new(
            validator.clone(),
            ledger.clone(),
            wallet(tag),
            FEE,
            policy(10),
        );
        handles.push(tokio::spawn(async move {
            submitter
                .submit(&stake_plan(10_000 * u64::from(tag), wallet(tag)))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(staking_reserve(&ledger).await, 100_000);
}

#[tokio::test]
async fn test_pool_plans_select_from_snapshot() {
    let signer = LocalSigner::from_seed([1; 32]);
    let validator = validator(&signer);
    let ledger = Arc::new(deployed(&signer, &validator).await);
    let provider = wallet(3);
    fund(&ledger, &provider, 0x03, 1_000_000).await;
    ledger
        .mint(Utxo::new(
            Outpoint::new(TxId::new([0x33; 32]), 0),
            Output::with_token(
                provider.clone(),
                0,
                facet_types::TokenData::fungible(validator.deployment().quote, 50_000),
            ),
        ))
        .await;

    let submitter = Submitter::new(validator.clone(), ledger.clone(), provider.clone(), FEE, policy(3));
    let holder = provider.clone();
    submitter
        .submit(&move |snapshot: &Snapshot| -> ChainResult<Prepared> {
            Ok(Prepared {
                operation: Operation::AddLiquidity {
                    amount0: 40_000,
                    amount1: 40_000,
                    tick_lower: -60,
                    tick_upper: 60,
                    holder: holder.clone(),
                },
                state_inputs: snapshot.pool_inputs()?,
            })
        })
        .await
        .unwrap();

    let holder = provider.clone();
    let collected = submitter
        .submit(&move |snapshot: &Snapshot| -> ChainResult<Prepared> {
            let mut state_inputs = snapshot.pool_inputs()?;
            state_inputs.push(snapshot.state_at(CommitmentKind::Position, &holder)?);
            state_inputs.push(snapshot.state_at(CommitmentKind::FeeCheckpoint, &holder)?);
            Ok(Prepared {
                operation: Operation::Collect {
                    payout: holder.clone(),
                },
                state_inputs,
            })
        })
        .await
        .unwrap();
    assert_eq!(collected.attempts, 1);

    let snapshot = Snapshot::load(ledger.as_ref(), validator.deployment(), &provider)
        .await
        .unwrap();
    let vault = snapshot.quote_vault().unwrap();
    assert_eq!(
        vault.output.fungible_amount(&validator.deployment().quote),
        40_000
    );
    assert_eq!(snapshot.states(CommitmentKind::Position).len(), 1);
}
