//! Admin authorization
//!
//! Governance actions carry an Ed25519 signature from the admin key. The
//! signed message binds the outpoint of the state token being mutated, which
//! the authorized transaction spends, so a signature can never be replayed.
//!
//! ```text
//! digest = SHA-256("facet-admin-v1" || outpoint (36) || action tag (1) || payload)
//! ```

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use facet_codec::{CommitmentLayout, Facet, OptionContract};
use facet_types::{CodeHash, CovenantError, CovenantResult, Destination, KeyHash, Outpoint};
use sha2::{Digest, Sha256};
use tracing::warn;

const DOMAIN_TAG: &[u8] = b"facet-admin-v1";

/// Admin public key and signature over an [`AdminAction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminAuthorization {
    pub public_key: [u8; 32],
    pub signature: [u8; 64],
}

/// Action an admin signature authorizes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAction {
    Deploy {
        facet: Facet,
        code_hash: CodeHash,
    },
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
        published_at: u32,
    },
    WriteOption {
        option: OptionContract,
        holder: Destination,
    },
}

impl AdminAction {
    fn tag(&self) -> u8 {
        match self {
            AdminAction::Deploy { .. } => 1,
            AdminAction::Upgrade { .. } => 2,
            AdminAction::SetPaused { .. } => 3,
            AdminAction::UpdatePrice { .. } => 4,
            AdminAction::WriteOption { .. } => 5,
        }
    }

    fn payload(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            AdminAction::Deploy { facet, code_hash } => {
                out.push(facet.id());
                out.extend_from_slice(code_hash.as_bytes());
            }
            AdminAction::Upgrade {
                facet,
                code_hash,
                version,
            } => {
                out.push(facet.id());
                out.extend_from_slice(code_hash.as_bytes());
                out.extend_from_slice(&version.to_be_bytes());
            }
            AdminAction::SetPaused { facet, paused } => {
                out.push(facet.id());
                out.push(u8::from(*paused));
            }
            AdminAction::UpdatePrice {
                price,
                published_at,
            } => {
                out.extend_from_slice(&price.to_be_bytes());
                out.extend_from_slice(&published_at.to_be_bytes());
            }
            AdminAction::WriteOption { option, holder } => {
                out.extend_from_slice(&option.encode());
                match holder {
                    Destination::Covenant => out.push(0),
                    Destination::Holder(bytecode) => {
                        out.push(1);
                        out.extend_from_slice(bytecode);
                    }
                }
            }
        }
        out
    }
}

/// Digest an admin signs to authorize `action` on the token at `bound`
pub fn admin_digest(bound: &Outpoint, action: &AdminAction) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_TAG);
    hasher.update(bound.to_bytes());
    hasher.update([action.tag()]);
    hasher.update(action.payload());
    hasher.finalize().into()
}

/// Hash identifying an admin public key in configuration
pub fn key_hash(public_key: &[u8; 32]) -> KeyHash {
    KeyHash::new(Sha256::digest(public_key).into())
}

/// Sign `action` bound to `bound` with a local key
pub fn sign_admin(key: &SigningKey, bound: &Outpoint, action: &AdminAction) -> AdminAuthorization {
    let signature = key.sign(&admin_digest(bound, action));
    AdminAuthorization {
        public_key: key.verifying_key().to_bytes(),
        signature: signature.to_bytes(),
    }
}

/// Accept `auth` only from the configured admin key over this exact action
pub fn verify_admin(
    admin_key: &KeyHash,
    auth: &AdminAuthorization,
    bound: &Outpoint,
    action: &AdminAction,
) -> CovenantResult<()> {
    let reject = |reason: &str| {
        warn!(bound = %bound, reason, "Rejected admin authorization");
        CovenantError::Unauthorized {
            reason: reason.to_string(),
        }
    };

    if key_hash(&auth.public_key) != *admin_key {
        return Err(reject("public key does not match the configured admin key hash"));
    }
    let verifying_key =
        VerifyingKey::from_bytes(&auth.public_key).map_err(|_| reject("malformed public key"))?;
    let signature = Signature::from_bytes(&auth.signature);
    verifying_key
        .verify(&admin_digest(bound, action), &signature)
        .map_err(|_| reject("signature does not verify"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_types::TxId;

    fn admin() -> SigningKey {
        SigningKey::from_bytes(&[42u8; 32])
    }

    fn bound() -> Outpoint {
        Outpoint::new(TxId::new([1; 32]), 0)
    }

    #[test]
    fn test_valid_signature_accepted() {
        let key = admin();
        let action = AdminAction::SetPaused {
            facet: Facet::Staking,
            paused: true,
        };
        let auth = sign_admin(&key, &bound(), &action);
        let hash = key_hash(&auth.public_key);
        assert!(verify_admin(&hash, &auth, &bound(), &action).is_ok());
    }

    #[test]
    fn test_signature_bound_to_outpoint_and_action() {
        let key = admin();
        let action = AdminAction::UpdatePrice {
            price: 100,
            published_at: 5,
        };
        let auth = sign_admin(&key, &bound(), &action);
        let hash = key_hash(&auth.public_key);

        let other = Outpoint::new(TxId::new([1; 32]), 1);
        assert!(matches!(
            verify_admin(&hash, &auth, &other, &action),
            Err(CovenantError::Unauthorized { .. })
        ));

        let tampered = AdminAction::UpdatePrice {
            price: 101,
            published_at: 5,
        };
        assert!(verify_admin(&hash, &auth, &bound(), &tampered).is_err());
    }

    #[test]
    fn test_foreign_key_rejected() {
        let action = AdminAction::Deploy {
            facet: Facet::Oracle,
            code_hash: CodeHash::default(),
        };
        let auth = sign_admin(&SigningKey::from_bytes(&[7u8; 32]), &bound(), &action);
        let configured = key_hash(&admin().verifying_key().to_bytes());
        assert!(matches!(
            verify_admin(&configured, &auth, &bound(), &action),
            Err(CovenantError::Unauthorized { .. })
        ));
    }
}
