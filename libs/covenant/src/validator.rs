//! Transition validator: construct and verify covenant transactions
//!
//! Construction and verification share one code path. `construct` drafts the
//! transition from the caller's state inputs and finalizes it; `verify`
//! re-drafts from the covenant inputs of a proposed transaction and requires
//! the proposal to contain exactly what the draft demands.

use facet_codec::{Facet, OptionContract};
use facet_types::{CodeHash, CovenantError, CovenantResult, Destination, Outpoint, Transaction, Utxo};
use tracing::debug;

use crate::auth::AdminAuthorization;
use crate::deployment::Deployment;
use crate::draft::{finalize, Context, TransitionDraft, TxContext};
use crate::guard;
use crate::tokens::{classify, InputSet};
use crate::transitions::{governance, options, pool, staking, tranching};

/// Every operation the covenant accepts, with its caller-declared parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Stake {
        amount: u64,
        holder: Destination,
    },
    Unstake {
        payout: Destination,
    },
    Split {
        expiry: u32,
        holder: Destination,
    },
    Merge {
        holder: Destination,
    },
    RedeemPrincipal {
        payout: Destination,
    },
    ClaimYield {
        holder: Destination,
    },
    AddLiquidity {
        amount0: u64,
        amount1: u64,
        tick_lower: i32,
        tick_upper: i32,
        holder: Destination,
    },
    RemoveLiquidity {
        payout: Destination,
    },
    Swap {
        zero_for_one: bool,
        amount_in: u64,
        min_amount_out: u64,
        recipient: Destination,
    },
    Collect {
        payout: Destination,
    },
    WriteOption {
        option: OptionContract,
        holder: Destination,
        auth: AdminAuthorization,
    },
    Exercise {
        payout: Destination,
    },
    Expire,
    Deploy {
        facet: Facet,
        code_hash: CodeHash,
        auth: AdminAuthorization,
    },
    Upgrade {
        facet: Facet,
        code_hash: CodeHash,
        version: u16,
        auth: AdminAuthorization,
    },
    SetPaused {
        facet: Facet,
        paused: bool,
        auth: AdminAuthorization,
    },
    UpdatePrice {
        price: u64,
        auth: AdminAuthorization,
    },
    FundReserve {
        facet: Facet,
        amount: u64,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Stake { .. } => "stake",
            Operation::Unstake { .. } => "unstake",
            Operation::Split { .. } => "split",
            Operation::Merge { .. } => "merge",
            Operation::RedeemPrincipal { .. } => "redeem_principal",
            Operation::ClaimYield { .. } => "claim_yield",
            Operation::AddLiquidity { .. } => "add_liquidity",
            Operation::RemoveLiquidity { .. } => "remove_liquidity",
            Operation::Swap { .. } => "swap",
            Operation::Collect { .. } => "collect",
            Operation::WriteOption { .. } => "write_option",
            Operation::Exercise { .. } => "exercise",
            Operation::Expire => "expire",
            Operation::Deploy { .. } => "deploy",
            Operation::Upgrade { .. } => "upgrade",
            Operation::SetPaused { .. } => "set_paused",
            Operation::UpdatePrice { .. } => "update_price",
            Operation::FundReserve { .. } => "fund_reserve",
        }
    }

    /// Admin-signed operations, exempt from the pause flag
    pub fn is_governance(&self) -> bool {
        matches!(
            self,
            Operation::Deploy { .. }
                | Operation::Upgrade { .. }
                | Operation::SetPaused { .. }
                | Operation::UpdatePrice { .. }
        )
    }
}

/// Pure validator over one deployment; holds no mutable state
#[derive(Debug, Clone)]
pub struct TransitionValidator {
    deployment: Deployment,
}

impl TransitionValidator {
    pub fn new(deployment: Deployment) -> Self {
        Self { deployment }
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    /// Covenant side of `operation` over `state_inputs` at `now`
    pub fn draft(
        &self,
        operation: &Operation,
        state_inputs: &[Utxo],
        now: u32,
        anchor: Option<Outpoint>,
    ) -> CovenantResult<TransitionDraft> {
        let cx = Context {
            deployment: &self.deployment,
            now,
            anchor,
        };
        let mut inputs = InputSet::new(&self.deployment, state_inputs)?;

        let draft = match operation {
            Operation::Stake { amount, holder } => {
                staking::stake(&cx, &mut inputs, *amount, holder.clone())
            }
            Operation::Unstake { payout } => staking::unstake(&cx, &mut inputs, payout.clone()),
            Operation::Split { expiry, holder } => {
                tranching::split(&cx, &mut inputs, *expiry, holder.clone())
            }
            Operation::Merge { holder } => tranching::merge(&cx, &mut inputs, holder.clone()),
            Operation::RedeemPrincipal { payout } => {
                tranching::redeem_principal(&cx, &mut inputs, payout.clone())
            }
            Operation::ClaimYield { holder } => tranching::claim_yield(&cx, &mut inputs, holder.clone()),
            Operation::AddLiquidity {
                amount0,
                amount1,
                tick_lower,
                tick_upper,
                holder,
            } => pool::add_liquidity(
                &cx,
                &mut inputs,
                *amount0,
                *amount1,
                *tick_lower,
                *tick_upper,
                holder.clone(),
            ),
            Operation::RemoveLiquidity { payout } => {
                pool::remove_liquidity(&cx, &mut inputs, payout.clone())
            }
            Operation::Swap {
                zero_for_one,
                amount_in,
                min_amount_out,
                recipient,
            } => pool::swap(
                &cx,
                &mut inputs,
                *zero_for_one,
                *amount_in,
                *min_amount_out,
                recipient.clone(),
            ),
            Operation::Collect { payout } => pool::collect(&cx, &mut inputs, payout.clone()),
            Operation::WriteOption {
                option,
                holder,
                auth,
            } => options::write_option(&cx, &mut inputs, *option, holder.clone(), auth),
            Operation::Exercise { payout } => options::exercise(&cx, &mut inputs, payout.clone()),
            Operation::Expire => options::expire(&cx, &mut inputs),
            Operation::Deploy {
                facet,
                code_hash,
                auth,
            } => governance::deploy(&cx, *facet, *code_hash, auth),
            Operation::Upgrade {
                facet,
                code_hash,
                version,
                auth,
            } => governance::upgrade(&cx, &mut inputs, *facet, *code_hash, *version, auth),
            Operation::SetPaused {
                facet,
                paused,
                auth,
            } => governance::set_paused(&cx, &mut inputs, *facet, *paused, auth),
            Operation::UpdatePrice { price, auth } => {
                governance::update_price(&cx, &mut inputs, *price, auth)
            }
            Operation::FundReserve { facet, amount } => {
                governance::fund_reserve(&cx, &mut inputs, *facet, *amount)
            }
        }?;

        inputs.finish()?;
        Ok(draft)
    }

    /// Build the complete transaction for `operation`
    pub fn construct(
        &self,
        operation: &Operation,
        state_inputs: &[Utxo],
        ctx: &TxContext,
    ) -> CovenantResult<Transaction> {
        let anchor = state_inputs
            .first()
            .or_else(|| ctx.funding.first())
            .map(|utxo| utxo.outpoint);
        let draft = self.draft(operation, state_inputs, ctx.now, anchor)?;
        let tx = finalize(&self.deployment, draft, ctx)?;
        debug!(
            operation = operation.name(),
            governance = operation.is_governance(),
            inputs = tx.inputs.len(),
            outputs = tx.outputs.len(),
            "Transition constructed"
        );
        Ok(tx)
    }

    /// Check a transaction built elsewhere against `operation` at `now`
    pub fn verify(
        &self,
        operation: &Operation,
        tx: &Transaction,
        now: u32,
    ) -> CovenantResult<()> {
        let mut state_inputs = Vec::new();
        for utxo in &tx.inputs {
            if classify(&self.deployment, &utxo.output)?.is_covenant_token() {
                state_inputs.push(utxo.clone());
            }
        }
        let anchor = tx.inputs.first().map(|utxo| utxo.outpoint);
        let draft = self.draft(operation, &state_inputs, now, anchor)?;

        let mut remaining: Vec<_> = tx.outputs.iter().collect();
        for required in &draft.outputs {
            let position = remaining
                .iter()
                .position(|output| *output == required)
                .ok_or_else(|| {
                    CovenantError::invalid(format!(
                        "{} requires an output of {} to {} that is missing",
                        operation.name(),
                        required.value,
                        required.destination
                    ))
                })?;
            remaining.swap_remove(position);
        }
        for extra in remaining {
            if classify(&self.deployment, extra)?.is_covenant_token() {
                return Err(CovenantError::invalid(format!(
                    "{} produces a covenant token it does not derive",
                    operation.name()
                )));
            }
        }

        guard::check(&self.deployment, tx, &draft.deltas)?;
        debug!(operation = operation.name(), "Transition verified");
        Ok(())
    }
}
