//! In-process admin signer

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use facet_covenant::key_hash;
use facet_types::KeyHash;

use crate::error::ChainResult;
use crate::services::AdminSigner;

/// Admin signer holding an Ed25519 key in memory
pub struct LocalSigner {
    key: SigningKey,
}

impl LocalSigner {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self::new(SigningKey::from_bytes(&seed))
    }

    /// Hash to configure as `admin.key_hash`
    pub fn key_hash(&self) -> KeyHash {
        key_hash(&self.key.verifying_key().to_bytes())
    }
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("key_hash", &self.key_hash())
            .finish()
    }
}

#[async_trait]
impl AdminSigner for LocalSigner {
    async fn public_key(&self) -> ChainResult<[u8; 32]> {
        Ok(self.key.verifying_key().to_bytes())
    }

    async fn sign_digest(&self, digest: &[u8; 32]) -> ChainResult<[u8; 64]> {
        Ok(self.key.sign(digest).to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_codec::Facet;
    use facet_covenant::{sign_admin, verify_admin, AdminAction};
    use facet_types::{Outpoint, TxId};

    #[test]
    fn test_matches_direct_signing() {
        let signer = LocalSigner::from_seed([3; 32]);
        let bound = Outpoint::new(TxId::new([1; 32]), 0);
        let action = AdminAction::SetPaused {
            facet: Facet::Pool,
            paused: true,
        };

        let auth = tokio_test::block_on(signer.authorize(&bound, &action)).unwrap();
        assert_eq!(auth, sign_admin(&signer.key, &bound, &action));
        verify_admin(&signer.key_hash(), &auth, &bound, &action).unwrap();
    }

    #[test]
    fn test_debug_hides_key() {
        let signer = LocalSigner::from_seed([3; 32]);
        let rendered = format!("{:?}", signer);
        assert!(rendered.contains("key_hash"));
        assert!(!rendered.contains("SigningKey"));
    }
}
