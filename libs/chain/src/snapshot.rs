//! Point-in-time view of the deployment's tokens
//!
//! A snapshot is only ever as fresh as the query that built it; the
//! submission loop rebuilds it after every lost race.

use facet_codec::{Commitment, CommitmentKind, Facet};
use facet_covenant::{classify, Deployment, TokenClass};
use facet_types::{CovenantError, CovenantResult, Destination, Utxo};

use crate::error::ChainResult;
use crate::services::ChainQuery;

/// Classified covenant tokens plus the caller's spendable coins
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub now: u32,
    tokens: Vec<(Utxo, TokenClass)>,
    /// Outputs at the wallet destination that are not covenant tokens
    pub funding: Vec<Utxo>,
}

impl Snapshot {
    pub async fn load<Q: ChainQuery + ?Sized>(
        query: &Q,
        deployment: &Deployment,
        wallet: &Destination,
    ) -> ChainResult<Self> {
        let now = query.current_time().await?;

        let mut tokens = Vec::new();
        for facet in Facet::ALL {
            for utxo in query.unspent_by_category(&deployment.category(facet)).await? {
                let class = classify(deployment, &utxo.output)?;
                tokens.push((utxo, class));
            }
        }
        for utxo in query.unspent_by_category(&deployment.quote).await? {
            if let TokenClass::QuoteVault { amount } = classify(deployment, &utxo.output)? {
                tokens.push((utxo, TokenClass::QuoteVault { amount }));
            }
        }

        let mut funding = Vec::new();
        for utxo in query.unspent_for(wallet).await? {
            if utxo.output.nft().is_none() && !classify(deployment, &utxo.output)?.is_covenant_token() {
                funding.push(utxo);
            }
        }

        Ok(Self {
            now,
            tokens,
            funding,
        })
    }

    pub fn registry(&self, facet: Facet) -> CovenantResult<Utxo> {
        self.tokens
            .iter()
            .find(|(_, class)| matches!(class, TokenClass::Registry { facet: f, .. } if *f == facet))
            .map(|(utxo, _)| utxo.clone())
            .ok_or_else(|| CovenantError::MissingInput(format!("{} registry", facet)))
    }

    /// State tokens of `kind`, in outpoint order
    pub fn states(&self, kind: CommitmentKind) -> Vec<(Utxo, Commitment)> {
        self.tokens
            .iter()
            .filter_map(|(utxo, class)| match class {
                TokenClass::State { commitment, .. } if commitment.kind() == kind => {
                    Some((utxo.clone(), *commitment))
                }
                _ => None,
            })
            .collect()
    }

    /// First state token of `kind` held at `destination`
    pub fn state_at(&self, kind: CommitmentKind, destination: &Destination) -> CovenantResult<Utxo> {
        self.states(kind)
            .into_iter()
            .map(|(utxo, _)| utxo)
            .find(|utxo| utxo.output.destination == *destination)
            .ok_or_else(|| CovenantError::MissingInput(format!("{} token", kind)))
    }

    /// Lowest-outpoint state token of `kind`; singletons such as the price feed
    pub fn first(&self, kind: CommitmentKind) -> CovenantResult<Utxo> {
        self.states(kind)
            .into_iter()
            .next()
            .map(|(utxo, _)| utxo)
            .ok_or_else(|| CovenantError::MissingInput(format!("{} token", kind)))
    }

    pub fn quote_vault(&self) -> Option<Utxo> {
        self.tokens
            .iter()
            .find(|(_, class)| matches!(class, TokenClass::QuoteVault { .. }))
            .map(|(utxo, _)| utxo.clone())
    }

    /// Pool registry, pool state and, when present, the quote vault
    pub fn pool_inputs(&self) -> CovenantResult<Vec<Utxo>> {
        let mut inputs = vec![
            self.registry(Facet::Pool)?,
            self.first(CommitmentKind::PoolState)?,
        ];
        inputs.extend(self.quote_vault());
        Ok(inputs)
    }
}
