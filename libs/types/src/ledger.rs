//! # Ledger Model
//!
//! Outputs carry a native value and optionally token data: a category, a
//! fungible amount, and at most one NFT with a capability and a commitment.
//! There is no mutation anywhere in this model; state changes by spending an
//! output and creating a new one in the same transaction.

use serde::{Deserialize, Serialize};

use crate::common::identifiers::{CategoryId, Outpoint};

/// NFT capability class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Sole authority to grow or shrink the category's supply
    Minting,
    /// Plain state token
    None,
}

/// Where an output is locked
///
/// Address encoding is out of scope, so holder locks are opaque bytecode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Destination {
    /// Locked by the facet covenant itself
    Covenant,
    /// Locked to a holder's opaque locking bytecode
    Holder(Vec<u8>),
}

impl Destination {
    pub fn holder(bytecode: impl Into<Vec<u8>>) -> Self {
        Self::Holder(bytecode.into())
    }

    pub fn is_covenant(&self) -> bool {
        matches!(self, Self::Covenant)
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Covenant => write!(f, "covenant"),
            Self::Holder(bytes) => write!(f, "holder(0x{})", hex::encode(bytes)),
        }
    }
}

/// Non-fungible half of token data
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nft {
    pub capability: Capability,
    pub commitment: Vec<u8>,
}

/// Token data attached to an output
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenData {
    pub category: CategoryId,
    /// Fungible balance of `category` carried by the output
    pub amount: u64,
    pub nft: Option<Nft>,
}

impl TokenData {
    /// NFT without fungible balance
    pub fn nft(category: CategoryId, capability: Capability, commitment: Vec<u8>) -> Self {
        Self {
            category,
            amount: 0,
            nft: Some(Nft {
                capability,
                commitment,
            }),
        }
    }

    /// Fungible balance without NFT
    pub fn fungible(category: CategoryId, amount: u64) -> Self {
        Self {
            category,
            amount,
            nft: None,
        }
    }

    pub fn is_minting(&self) -> bool {
        matches!(
            self.nft,
            Some(Nft {
                capability: Capability::Minting,
                ..
            })
        )
    }
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Output {
    pub destination: Destination,
    pub value: u64,
    pub token: Option<TokenData>,
}

impl Output {
    /// Plain value transfer
    pub fn payment(destination: Destination, value: u64) -> Self {
        Self {
            destination,
            value,
            token: None,
        }
    }

    /// Output carrying token data
    pub fn with_token(destination: Destination, value: u64, token: TokenData) -> Self {
        Self {
            destination,
            value,
            token: Some(token),
        }
    }

    pub fn nft(&self) -> Option<&Nft> {
        self.token.as_ref().and_then(|t| t.nft.as_ref())
    }

    pub fn category(&self) -> Option<CategoryId> {
        self.token.as_ref().map(|t| t.category)
    }

    /// Fungible amount of `category` carried by this output
    pub fn fungible_amount(&self, category: &CategoryId) -> u64 {
        match &self.token {
            Some(token) if &token.category == category => token.amount,
            _ => 0,
        }
    }

    /// True when the output carries neither value nor tokens
    pub fn is_empty(&self) -> bool {
        self.value == 0 && self.token.is_none()
    }
}

/// Unspent output together with its location
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Utxo {
    pub outpoint: Outpoint,
    pub output: Output,
}

impl Utxo {
    pub fn new(outpoint: Outpoint, output: Output) -> Self {
        Self { outpoint, output }
    }
}

/// Fully specified transaction
///
/// Inputs embed the outputs they spend so validation never needs a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub inputs: Vec<Utxo>,
    pub outputs: Vec<Output>,
    pub fee: u64,
}

impl Transaction {
    /// Sum of native input value, `None` on overflow
    pub fn input_value(&self) -> Option<u64> {
        self.inputs
            .iter()
            .try_fold(0u64, |acc, utxo| acc.checked_add(utxo.output.value))
    }

    /// Sum of native output value, `None` on overflow
    pub fn output_value(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, output| acc.checked_add(output.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fungible_amount_only_counts_matching_category() {
        let usd = CategoryId::new([1; 32]);
        let other = CategoryId::new([2; 32]);
        let output = Output::with_token(
            Destination::holder(vec![0x51]),
            0,
            TokenData::fungible(usd, 500),
        );
        assert_eq!(output.fungible_amount(&usd), 500);
        assert_eq!(output.fungible_amount(&other), 0);
    }

    #[test]
    fn test_minting_detection() {
        let token = TokenData::nft(CategoryId::new([3; 32]), Capability::Minting, vec![]);
        assert!(token.is_minting());
        let token = TokenData::nft(CategoryId::new([3; 32]), Capability::None, vec![1]);
        assert!(!token.is_minting());
    }

    #[test]
    fn test_output_serializes_to_json() {
        let output = Output::payment(Destination::Covenant, 42);
        let json = serde_json::to_string(&output).unwrap();
        let back: Output = serde_json::from_str(&json).unwrap();
        assert_eq!(back, output);
    }
}
