//! # Typed Byte Identifiers
//!
//! 32-byte values travel everywhere in this system: token categories, transaction
//! ids, covenant code hashes, admin key hashes. Each gets its own zero-cost
//! wrapper so a code hash can never be passed where a category is expected.
//!
//! ```rust
//! use facet_types::{CategoryId, TxId};
//!
//! let genesis = TxId::new([7u8; 32]);
//! // A category id is the txid of the outpoint its genesis transaction spends first.
//! let category = CategoryId::from(genesis);
//! assert_eq!(category.to_hex(), "07".repeat(32));
//! ```

use serde::{Deserialize, Serialize};

/// Macro for generating strongly typed 32-byte identifiers
///
/// Every generated type is `Copy`, orderable, hex-printable and serializes as its
/// inner byte array.
#[macro_export]
macro_rules! define_typed_wrapper {
    (
        $(#[$meta:meta])*
        $name:ident, $len:expr
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Default,
            serde::Serialize,
            serde::Deserialize
        )]
        #[repr(transparent)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Width of the identifier in bytes
            pub const LEN: usize = $len;

            /// Create a new typed wrapper
            #[inline(always)]
            pub const fn new(inner: [u8; $len]) -> Self {
                Self(inner)
            }

            /// Extract the inner value by value
            #[inline(always)]
            pub const fn into_inner(self) -> [u8; $len] {
                self.0
            }

            /// Borrow the raw bytes
            #[inline(always)]
            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            /// Lower-case hex without prefix
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parse from hex, with or without a `0x` prefix
            pub fn from_hex(input: &str) -> Result<Self, hex::FromHexError> {
                let trimmed = input.strip_prefix("0x").unwrap_or(input);
                let mut bytes = [0u8; $len];
                hex::decode_to_slice(trimmed, &mut bytes)?;
                Ok(Self(bytes))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}(0x{})", stringify!($name), self.to_hex())
            }
        }

        impl From<[u8; $len]> for $name {
            #[inline(always)]
            fn from(inner: [u8; $len]) -> Self {
                Self(inner)
            }
        }

        impl From<$name> for [u8; $len] {
            #[inline(always)]
            fn from(wrapper: $name) -> [u8; $len] {
                wrapper.0
            }
        }

        impl AsRef<[u8]> for $name {
            #[inline(always)]
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }
    };
}

define_typed_wrapper!(
    /// Token category identifier, stable for the lifetime of a deployed facet
    CategoryId, 32
);

define_typed_wrapper!(
    /// Transaction identifier
    TxId, 32
);

define_typed_wrapper!(
    /// Hash of the covenant bytecode a registry token commits to
    CodeHash, 32
);

define_typed_wrapper!(
    /// SHA-256 hash of an admin public key
    KeyHash, 32
);

impl From<TxId> for CategoryId {
    fn from(txid: TxId) -> Self {
        CategoryId(txid.0)
    }
}

/// Reference to a transaction output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Outpoint {
    pub txid: TxId,
    pub vout: u32,
}

impl Outpoint {
    pub const fn new(txid: TxId, vout: u32) -> Self {
        Self { txid, vout }
    }

    /// Canonical 36-byte encoding (txid followed by big-endian index)
    pub fn to_bytes(&self) -> [u8; 36] {
        let mut out = [0u8; 36];
        out[..32].copy_from_slice(&self.txid.0);
        out[32..].copy_from_slice(&self.vout.to_be_bytes());
        out
    }
}

impl std::fmt::Display for Outpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.txid.to_hex(), self.vout)
    }
}
