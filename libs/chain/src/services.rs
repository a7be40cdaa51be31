//! Upstream services the covenant core depends on
//!
//! The core never performs I/O. Signing keys, the unspent-output set and
//! broadcast all sit behind these traits so the submission loop can run
//! against a real node or the in-memory ledger alike.

use std::fmt::Debug;

use async_trait::async_trait;
use facet_covenant::{admin_digest, AdminAction, AdminAuthorization};
use facet_types::{CategoryId, Destination, Outpoint, Transaction, TxId, Utxo};

use crate::error::ChainResult;

/// Holder of the admin key
#[async_trait]
pub trait AdminSigner: Send + Sync + Debug {
    async fn public_key(&self) -> ChainResult<[u8; 32]>;

    /// Sign a 32-byte message digest
    async fn sign_digest(&self, digest: &[u8; 32]) -> ChainResult<[u8; 64]>;

    /// Authorize `action` against the token at `bound`
    async fn authorize(
        &self,
        bound: &Outpoint,
        action: &AdminAction,
    ) -> ChainResult<AdminAuthorization> {
        let digest = admin_digest(bound, action);
        Ok(AdminAuthorization {
            public_key: self.public_key().await?,
            signature: self.sign_digest(&digest).await?,
        })
    }
}

/// Read access to the confirmed unspent-output set
#[async_trait]
pub trait ChainQuery: Send + Sync {
    /// Unspent outputs carrying tokens of `category`
    async fn unspent_by_category(&self, category: &CategoryId) -> ChainResult<Vec<Utxo>>;

    /// Unspent outputs locked to `destination`
    async fn unspent_for(&self, destination: &Destination) -> ChainResult<Vec<Utxo>>;

    /// Reference time of the chain tip
    async fn current_time(&self) -> ChainResult<u32>;
}

/// Submission of fully formed transactions
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Transaction id on acceptance, [`Rejection`](crate::Rejection) otherwise
    async fn broadcast(&self, tx: &Transaction) -> ChainResult<TxId>;
}
