//! Token classification and state-input selection
//!
//! Every output is one of: a facet token (registry or state commitment of a
//! facet's category), the pool's quote vault (quote-category balance locked
//! by the covenant), or something foreign to the deployment.

use facet_codec::{
    Commitment, CommitmentLayout, Facet, FeeCheckpoint, OptionContract, PoolState, Position,
    PriceFeed, PrincipalToken, RegistryEntry, StakeReceipt, YieldToken,
};
use facet_types::{Capability, CovenantError, CovenantResult, Output, Utxo};

use crate::deployment::Deployment;

/// What an output is, from the covenant's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Registry { facet: Facet, entry: RegistryEntry },
    State { facet: Facet, commitment: Commitment },
    QuoteVault { amount: u64 },
    Foreign,
}

impl TokenClass {
    pub fn is_covenant_token(&self) -> bool {
        !matches!(self, TokenClass::Foreign)
    }
}

/// Classify an output, decoding its commitment when it belongs to a facet
pub fn classify(deployment: &Deployment, output: &Output) -> CovenantResult<TokenClass> {
    let Some(token) = &output.token else {
        return Ok(TokenClass::Foreign);
    };

    let Some(facet) = deployment.categories.facet_of(&token.category) else {
        if token.category == deployment.quote
            && token.nft.is_none()
            && output.destination.is_covenant()
        {
            return Ok(TokenClass::QuoteVault {
                amount: token.amount,
            });
        }
        return Ok(TokenClass::Foreign);
    };

    if token.amount != 0 {
        return Err(CovenantError::invalid(format!(
            "{} category carries a fungible balance of {}",
            facet, token.amount
        )));
    }
    let nft = token.nft.as_ref().ok_or_else(|| {
        CovenantError::invalid(format!("{} category token without an NFT", facet))
    })?;

    match nft.capability {
        Capability::Minting => {
            let entry = RegistryEntry::decode(&nft.commitment)?;
            if entry.facet != facet {
                return Err(CovenantError::CategoryMismatch {
                    expected: deployment.category(entry.facet),
                    found: token.category,
                });
            }
            Ok(TokenClass::Registry { facet, entry })
        }
        Capability::None => Ok(TokenClass::State {
            facet,
            commitment: Commitment::decode_state(facet, &nft.commitment)?,
        }),
    }
}

/// State-token kinds a transition can take from its inputs
pub trait StateKind: CommitmentLayout + Copy {
    const FACET: Facet;

    fn from_commitment(commitment: Commitment) -> Option<Self>;
}

macro_rules! state_kind {
    ($ty:ty, $facet:expr, $variant:ident) => {
        impl StateKind for $ty {
            const FACET: Facet = $facet;

            fn from_commitment(commitment: Commitment) -> Option<Self> {
                match commitment {
                    Commitment::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

state_kind!(StakeReceipt, Facet::Staking, StakeReceipt);
state_kind!(PrincipalToken, Facet::Principal, Principal);
state_kind!(YieldToken, Facet::Yield, Yield);
state_kind!(PoolState, Facet::Pool, PoolState);
state_kind!(Position, Facet::Pool, Position);
state_kind!(FeeCheckpoint, Facet::Pool, FeeCheckpoint);
state_kind!(OptionContract, Facet::Options, Option);
state_kind!(PriceFeed, Facet::Oracle, PriceFeed);

/// A decoded token together with the output that carries it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Held<T> {
    pub utxo: Utxo,
    pub value: T,
}

impl<T> Held<T> {
    /// Native value attached to the carrying output
    pub fn attached(&self) -> u64 {
        self.utxo.output.value
    }
}

impl Held<RegistryEntry> {
    /// Reject non-governance use of a paused facet
    pub fn ensure_active(&self) -> CovenantResult<()> {
        if self.value.paused {
            return Err(CovenantError::Paused {
                facet: self.value.facet.name(),
            });
        }
        Ok(())
    }
}

/// Caller-supplied state inputs, taken by kind as a transition needs them
///
/// Every input must be taken exactly once; [`InputSet::finish`] rejects
/// leftovers so a transaction can never smuggle in extra state.
#[derive(Debug)]
pub struct InputSet {
    items: Vec<(Utxo, TokenClass)>,
    taken: Vec<bool>,
}

impl InputSet {
    pub fn new(deployment: &Deployment, inputs: &[Utxo]) -> CovenantResult<Self> {
        let mut items = Vec::with_capacity(inputs.len());
        for utxo in inputs {
            let class = classify(deployment, &utxo.output)?;
            if !class.is_covenant_token() {
                return Err(CovenantError::UnexpectedInput(format!(
                    "{} is not a covenant token",
                    utxo.outpoint
                )));
            }
            items.push((utxo.clone(), class));
        }
        let taken = vec![false; items.len()];
        Ok(Self { items, taken })
    }

    fn take_where<T>(
        &mut self,
        mut pick: impl FnMut(&TokenClass) -> Option<T>,
    ) -> Option<(Utxo, T)> {
        for (index, (utxo, class)) in self.items.iter().enumerate() {
            if self.taken[index] {
                continue;
            }
            if let Some(found) = pick(class) {
                self.taken[index] = true;
                return Some((utxo.clone(), found));
            }
        }
        None
    }

    /// Take the registry token of `facet`
    pub fn registry(&mut self, facet: Facet) -> CovenantResult<Held<RegistryEntry>> {
        self.take_where(|class| match class {
            TokenClass::Registry { facet: f, entry } if *f == facet => Some(*entry),
            _ => None,
        })
        .map(|(utxo, value)| Held { utxo, value })
        .ok_or_else(|| CovenantError::MissingInput(format!("{} registry", facet)))
    }

    /// Take a state token of kind `T`
    pub fn state<T: StateKind>(&mut self) -> CovenantResult<Held<T>> {
        self.take_where(|class| match class {
            TokenClass::State { facet, commitment } if *facet == T::FACET => {
                T::from_commitment(*commitment)
            }
            _ => None,
        })
        .map(|(utxo, value)| Held { utxo, value })
        .ok_or_else(|| CovenantError::MissingInput(format!("{} token", T::KIND)))
    }

    /// Take the pool's quote vault, if one was supplied
    pub fn quote_vault(&mut self) -> Option<Held<u64>> {
        self.take_where(|class| match class {
            TokenClass::QuoteVault { amount } => Some(*amount),
            _ => None,
        })
        .map(|(utxo, value)| Held { utxo, value })
    }

    /// Fail if any supplied input was not consumed by the transition
    pub fn finish(self) -> CovenantResult<()> {
        match self
            .items
            .iter()
            .zip(&self.taken)
            .find(|(_, taken)| !**taken)
        {
            Some(((utxo, _), _)) => Err(CovenantError::UnexpectedInput(format!(
                "{} is not consumed by this operation",
                utxo.outpoint
            ))),
            None => Ok(()),
        }
    }
}
