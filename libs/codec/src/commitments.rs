//! Typed commitments for every state-token kind

use facet_types::{CategoryId, CodeHash, CovenantError, CovenantResult};
use zerocopy::byteorder::{I32, U16, U32, U64};
use zerocopy::{AsBytes, FromBytes};

use crate::layout::{CommitmentKind, CommitmentLayout, Facet};
use crate::range;
use crate::wire::{
    FeeCheckpointWire, OptionWire, PoolStateWire, PositionWire, PriceFeedWire, RegistryWire,
    StakeReceiptWire, TrancheWire,
};

/// Registry flag: facet rejects every non-governance operation
pub const FLAG_PAUSED: u8 = 0b0000_0001;
const DEFINED_FLAGS: u8 = FLAG_PAUSED;

fn read<W: FromBytes>(kind: CommitmentKind, bytes: &[u8]) -> CovenantResult<W> {
    if bytes.len() != kind.width() {
        return Err(CovenantError::wrong_width(kind.name(), kind.width(), bytes.len()));
    }
    W::read_from(bytes)
        .ok_or_else(|| CovenantError::wrong_width(kind.name(), kind.width(), bytes.len()))
}

/// Facet registry entry, carried by the minting-capability token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    pub facet: Facet,
    pub code_hash: CodeHash,
    pub version: u16,
    pub paused: bool,
}

impl RegistryEntry {
    /// First version of a freshly deployed facet
    pub fn genesis(facet: Facet, code_hash: CodeHash) -> Self {
        Self {
            facet,
            code_hash,
            version: 1,
            paused: false,
        }
    }
}

impl CommitmentLayout for RegistryEntry {
    const KIND: CommitmentKind = CommitmentKind::Registry;

    fn encode(&self) -> Vec<u8> {
        let wire = RegistryWire {
            facet_id: self.facet.id(),
            code_hash: self.code_hash.into_inner(),
            version: U16::new(self.version),
            flags: if self.paused { FLAG_PAUSED } else { 0 },
        };
        wire.as_bytes().to_vec()
    }

    fn decode(bytes: &[u8]) -> CovenantResult<Self> {
        let wire: RegistryWire = read(Self::KIND, bytes)?;
        let facet = Facet::from_id(wire.facet_id).ok_or_else(|| {
            CovenantError::MalformedCommitment {
                kind: Self::KIND.name(),
                reason: format!("unknown facet id {}", wire.facet_id),
            }
        })?;
        if wire.flags & !DEFINED_FLAGS != 0 {
            return Err(CovenantError::MalformedCommitment {
                kind: Self::KIND.name(),
                reason: format!("undefined flag bits {:#010b}", wire.flags),
            });
        }
        Ok(Self {
            facet,
            code_hash: CodeHash::new(wire.code_hash),
            version: wire.version.get(),
            paused: wire.flags & FLAG_PAUSED != 0,
        })
    }
}

/// Stake receipt: the staked amount it can redeem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakeReceipt {
    pub amount: u64,
}

impl StakeReceipt {
    pub fn try_new(amount: u128) -> CovenantResult<Self> {
        Ok(Self {
            amount: range::amount("staked_amount", amount)?,
        })
    }
}

impl CommitmentLayout for StakeReceipt {
    const KIND: CommitmentKind = CommitmentKind::StakeReceipt;

    fn encode(&self) -> Vec<u8> {
        StakeReceiptWire {
            amount: U64::new(self.amount),
        }
        .as_bytes()
        .to_vec()
    }

    fn decode(bytes: &[u8]) -> CovenantResult<Self> {
        let wire: StakeReceiptWire = read(Self::KIND, bytes)?;
        Ok(Self {
            amount: wire.amount.get(),
        })
    }
}

/// Principal token (PT)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrincipalToken {
    pub principal: u64,
    pub expiry: u32,
}

impl PrincipalToken {
    pub fn try_new(principal: u128, expiry: u64) -> CovenantResult<Self> {
        Ok(Self {
            principal: range::amount("principal", principal)?,
            expiry: range::word("expiry", expiry)?,
        })
    }
}

impl CommitmentLayout for PrincipalToken {
    const KIND: CommitmentKind = CommitmentKind::Principal;

    fn encode(&self) -> Vec<u8> {
        TrancheWire {
            amount: U64::new(self.principal),
            expiry: U32::new(self.expiry),
        }
        .as_bytes()
        .to_vec()
    }

    fn decode(bytes: &[u8]) -> CovenantResult<Self> {
        let wire: TrancheWire = read(Self::KIND, bytes)?;
        Ok(Self {
            principal: wire.amount.get(),
            expiry: wire.expiry.get(),
        })
    }
}

/// Yield token (YT)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YieldToken {
    pub accrued: u64,
    pub expiry: u32,
}

impl YieldToken {
    pub fn try_new(accrued: u128, expiry: u64) -> CovenantResult<Self> {
        Ok(Self {
            accrued: range::amount("accrued_yield", accrued)?,
            expiry: range::word("expiry", expiry)?,
        })
    }
}

impl CommitmentLayout for YieldToken {
    const KIND: CommitmentKind = CommitmentKind::Yield;

    fn encode(&self) -> Vec<u8> {
        TrancheWire {
            amount: U64::new(self.accrued),
            expiry: U32::new(self.expiry),
        }
        .as_bytes()
        .to_vec()
    }

    fn decode(bytes: &[u8]) -> CovenantResult<Self> {
        let wire: TrancheWire = read(Self::KIND, bytes)?;
        Ok(Self {
            accrued: wire.amount.get(),
            expiry: wire.expiry.get(),
        })
    }
}

/// Liquidity position over `[tick_lower, tick_upper)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u64,
}

impl Position {
    pub fn try_new(tick_lower: i64, tick_upper: i64, liquidity: u128) -> CovenantResult<Self> {
        Ok(Self {
            tick_lower: range::tick("tick_lower", tick_lower)?,
            tick_upper: range::tick("tick_upper", tick_upper)?,
            liquidity: range::amount("liquidity", liquidity)?,
        })
    }
}

impl CommitmentLayout for Position {
    const KIND: CommitmentKind = CommitmentKind::Position;

    fn encode(&self) -> Vec<u8> {
        PositionWire {
            tick_lower: I32::new(self.tick_lower),
            tick_upper: I32::new(self.tick_upper),
            liquidity: U64::new(self.liquidity),
        }
        .as_bytes()
        .to_vec()
    }

    fn decode(bytes: &[u8]) -> CovenantResult<Self> {
        let wire: PositionWire = read(Self::KIND, bytes)?;
        Ok(Self {
            tick_lower: wire.tick_lower.get(),
            tick_upper: wire.tick_upper.get(),
            liquidity: wire.liquidity.get(),
        })
    }
}

/// Pool-wide state: tracked reserves, total liquidity, fee growth per unit liquidity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolState {
    pub reserve0: u64,
    pub reserve1: u64,
    pub liquidity: u64,
    pub fee_growth0: u64,
    pub fee_growth1: u64,
}

impl CommitmentLayout for PoolState {
    const KIND: CommitmentKind = CommitmentKind::PoolState;

    fn encode(&self) -> Vec<u8> {
        PoolStateWire {
            reserve0: U64::new(self.reserve0),
            reserve1: U64::new(self.reserve1),
            liquidity: U64::new(self.liquidity),
            fee_growth0: U64::new(self.fee_growth0),
            fee_growth1: U64::new(self.fee_growth1),
        }
        .as_bytes()
        .to_vec()
    }

    fn decode(bytes: &[u8]) -> CovenantResult<Self> {
        let wire: PoolStateWire = read(Self::KIND, bytes)?;
        Ok(Self {
            reserve0: wire.reserve0.get(),
            reserve1: wire.reserve1.get(),
            liquidity: wire.liquidity.get(),
            fee_growth0: wire.fee_growth0.get(),
            fee_growth1: wire.fee_growth1.get(),
        })
    }
}

/// Fee growth a position has already collected up to, bound to the position's shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeCheckpoint {
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u64,
    pub fee_growth0: u64,
    pub fee_growth1: u64,
}

impl FeeCheckpoint {
    pub fn for_position(position: &Position, fee_growth0: u64, fee_growth1: u64) -> Self {
        Self {
            tick_lower: position.tick_lower,
            tick_upper: position.tick_upper,
            liquidity: position.liquidity,
            fee_growth0,
            fee_growth1,
        }
    }

    /// True when this checkpoint belongs to a position of the same shape
    pub fn matches(&self, position: &Position) -> bool {
        self.tick_lower == position.tick_lower
            && self.tick_upper == position.tick_upper
            && self.liquidity == position.liquidity
    }
}

impl CommitmentLayout for FeeCheckpoint {
    const KIND: CommitmentKind = CommitmentKind::FeeCheckpoint;

    fn encode(&self) -> Vec<u8> {
        FeeCheckpointWire {
            tick_lower: I32::new(self.tick_lower),
            tick_upper: I32::new(self.tick_upper),
            liquidity: U64::new(self.liquidity),
            fee_growth0: U64::new(self.fee_growth0),
            fee_growth1: U64::new(self.fee_growth1),
        }
        .as_bytes()
        .to_vec()
    }

    fn decode(bytes: &[u8]) -> CovenantResult<Self> {
        let wire: FeeCheckpointWire = read(Self::KIND, bytes)?;
        Ok(Self {
            tick_lower: wire.tick_lower.get(),
            tick_upper: wire.tick_upper.get(),
            liquidity: wire.liquidity.get(),
            fee_growth0: wire.fee_growth0.get(),
            fee_growth1: wire.fee_growth1.get(),
        })
    }
}

/// Written option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionContract {
    pub asset: CategoryId,
    pub strike: u32,
    pub expiry: u32,
    pub is_call: bool,
}

impl OptionContract {
    pub fn try_new(asset: CategoryId, strike: u64, expiry: u64, is_call: bool) -> CovenantResult<Self> {
        Ok(Self {
            asset,
            strike: range::word("strike", strike)?,
            expiry: range::word("expiry", expiry)?,
            is_call,
        })
    }
}

impl CommitmentLayout for OptionContract {
    const KIND: CommitmentKind = CommitmentKind::Option;

    fn encode(&self) -> Vec<u8> {
        OptionWire {
            asset: self.asset.into_inner(),
            strike: U32::new(self.strike),
            expiry: U32::new(self.expiry),
            is_call: u8::from(self.is_call),
        }
        .as_bytes()
        .to_vec()
    }

    fn decode(bytes: &[u8]) -> CovenantResult<Self> {
        let wire: OptionWire = read(Self::KIND, bytes)?;
        let is_call = match wire.is_call {
            0 => false,
            1 => true,
            flag => {
                return Err(CovenantError::MalformedCommitment {
                    kind: Self::KIND.name(),
                    reason: format!("invalid is-call flag {}", flag),
                })
            }
        };
        Ok(Self {
            asset: CategoryId::new(wire.asset),
            strike: wire.strike.get(),
            expiry: wire.expiry.get(),
            is_call,
        })
    }
}

/// Oracle price observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceFeed {
    pub price: u64,
    pub published_at: u32,
}

impl CommitmentLayout for PriceFeed {
    const KIND: CommitmentKind = CommitmentKind::PriceFeed;

    fn encode(&self) -> Vec<u8> {
        PriceFeedWire {
            price: U64::new(self.price),
            published_at: U32::new(self.published_at),
        }
        .as_bytes()
        .to_vec()
    }

    fn decode(bytes: &[u8]) -> CovenantResult<Self> {
        let wire: PriceFeedWire = read(Self::KIND, bytes)?;
        Ok(Self {
            price: wire.price.get(),
            published_at: wire.published_at.get(),
        })
    }
}
