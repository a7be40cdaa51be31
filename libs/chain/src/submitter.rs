//! Resubmission loop
//!
//! Each attempt re-reads the chain, rebuilds the transition against the
//! current state and broadcasts it. Losing a race to another submission is
//! the only retryable outcome; covenant errors and every other rejection end
//! the loop immediately.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use facet_codec::{CommitmentKind, Facet};
use facet_config::SubmissionConfig;
use facet_covenant::{AdminAction, Operation, TransitionValidator, TxContext};
use facet_types::{CodeHash, Destination, Transaction, TxId, Utxo};
use tracing::{debug, info, warn};

use crate::error::{ChainError, ChainResult, Rejection};
use crate::services::{AdminSigner, Broadcaster, ChainQuery};
use crate::snapshot::Snapshot;

/// Operation and state inputs chosen against one snapshot
#[derive(Debug, Clone)]
pub struct Prepared {
    pub operation: Operation,
    pub state_inputs: Vec<Utxo>,
}

/// Chooses what to submit given the current state
#[async_trait]
pub trait TransitionPlan: Send + Sync {
    async fn prepare(&self, snapshot: &Snapshot) -> ChainResult<Prepared>;
}

#[async_trait]
impl<F> TransitionPlan for F
where
    F: Fn(&Snapshot) -> ChainResult<Prepared> + Send + Sync,
{
    async fn prepare(&self, snapshot: &Snapshot) -> ChainResult<Prepared> {
        self(snapshot)
    }
}

/// Governance change re-signed against the current registry or feed outpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminRequest {
    Upgrade {
        facet: Facet,
        code_hash: CodeHash,
        version: u16,
    },
    SetPaused {
        facet: Facet,
        paused: bool,
    },
    UpdatePrice {
        price: u64,
    },
}

/// Plan for an [`AdminRequest`] signed by an [`AdminSigner`]
#[derive(Debug)]
pub struct AdminPlan {
    pub signer: Arc<dyn AdminSigner>,
    pub request: AdminRequest,
}

#[async_trait]
impl TransitionPlan for AdminPlan {
    async fn prepare(&self, snapshot: &Snapshot) -> ChainResult<Prepared> {
        match self.request {
            AdminRequest::Upgrade {
                facet,
                code_hash,
                version,
            } => {
                let registry = snapshot.registry(facet)?;
                let auth = self
                    .signer
                    .authorize(
                        &registry.outpoint,
                        &AdminAction::Upgrade {
                            facet,
                            code_hash,
                            version,
                        },
                    )
                    .await?;
                Ok(Prepared {
                    operation: Operation::Upgrade {
                        facet,
                        code_hash,
                        version,
                        auth,
                    },
                    state_inputs: vec![registry],
                })
            }
            AdminRequest::SetPaused { facet, paused } => {
                let registry = snapshot.registry(facet)?;
                let auth = self
                    .signer
                    .authorize(&registry.outpoint, &AdminAction::SetPaused { facet, paused })
                    .await?;
                Ok(Prepared {
                    operation: Operation::SetPaused {
                        facet,
                        paused,
                        auth,
                    },
                    state_inputs: vec![registry],
                })
            }
            AdminRequest::UpdatePrice { price } => {
                let feed = snapshot.first(CommitmentKind::PriceFeed)?;
                let registry = snapshot.registry(Facet::Oracle)?;
                let auth = self
                    .signer
                    .authorize(
                        &feed.outpoint,
                        &AdminAction::UpdatePrice {
                            price,
                            published_at: snapshot.now,
                        },
                    )
                    .await?;
                Ok(Prepared {
                    operation: Operation::UpdatePrice { price, auth },
                    state_inputs: vec![feed, registry],
                })
            }
        }
    }
}

/// Retry schedule for lost races
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl From<&SubmissionConfig> for RetryPolicy {
    fn from(config: &SubmissionConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.backoff_ms),
        }
    }
}

/// Accepted submission
#[derive(Debug, Clone)]
pub struct Submitted {
    pub txid: TxId,
    pub tx: Transaction,
    /// 1 when the first attempt was accepted
    pub attempts: u32,
}

/// Builds, broadcasts and rebuilds transitions for one wallet
pub struct Submitter<C> {
    validator: Arc<TransitionValidator>,
    chain: Arc<C>,
    wallet: Destination,
    fee: u64,
    policy: RetryPolicy,
}

impl<C> Submitter<C>
where
    C: ChainQuery + Broadcaster,
{
    pub fn new(
        validator: Arc<TransitionValidator>,
        chain: Arc<C>,
        wallet: Destination,
        fee: u64,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            validator,
            chain,
            wallet,
            fee,
            policy,
        }
    }

    pub fn wallet(&self) -> &Destination {
        &self.wallet
    }

    async fn attempt<P: TransitionPlan + ?Sized>(
        &self,
        plan: &P,
    ) -> ChainResult<(TxId, Transaction, &'static str)> {
        let snapshot = Snapshot::load(
            self.chain.as_ref(),
            self.validator.deployment(),
            &self.wallet,
        )
        .await?;
        let prepared = plan.prepare(&snapshot).await?;
        let ctx = TxContext {
            now: snapshot.now,
            fee: self.fee,
            funding: snapshot.funding.clone(),
            change: self.wallet.clone(),
        };
        let tx = self
            .validator
            .construct(&prepared.operation, &prepared.state_inputs, &ctx)?;
        self.validator
            .verify(&prepared.operation, &tx, snapshot.now)?;
        let txid = self.chain.broadcast(&tx).await?;
        Ok((txid, tx, prepared.operation.name()))
    }

    /// Submit `plan`, rebuilding after each lost race
    pub async fn submit<P: TransitionPlan + ?Sized>(&self, plan: &P) -> ChainResult<Submitted> {
        let mut delay = self.policy.initial_backoff;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt(plan).await {
                Ok((txid, tx, operation)) => {
                    info!(operation, txid = %txid, attempts = attempt, "Transition submitted");
                    return Ok(Submitted {
                        txid,
                        tx,
                        attempts: attempt,
                    });
                }
                Err(ChainError::Rejected(rejection @ Rejection::InputsSpent { .. })) => {
                    if attempt > self.policy.max_retries {
                        return Err(ChainError::RetriesExhausted {
                            attempts: attempt,
                            last: rejection,
                        });
                    }
                    warn!(
                        attempt,
                        reason = %rejection,
                        ?delay,
                        "Lost race for covenant state, rebuilding"
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
                Err(e) => {
                    debug!(attempt, error = %e, "Submission failed");
                    return Err(e);
                }
            }
        }
    }
}
