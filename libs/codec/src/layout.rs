//! Commitment kinds, facet identities and the layout trait

use facet_types::{CovenantError, CovenantResult};

use crate::commitments::{
    FeeCheckpoint, OptionContract, PoolState, Position, PriceFeed, PrincipalToken,
    RegistryEntry, StakeReceipt, YieldToken,
};

/// Deployed facet, identified on-chain by the first byte of its registry commitment
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Facet {
    Staking = 1,
    Principal = 2,
    Yield = 3,
    Pool = 4,
    Options = 5,
    Oracle = 6,
}

impl Facet {
    pub const ALL: [Facet; 6] = [
        Facet::Staking,
        Facet::Principal,
        Facet::Yield,
        Facet::Pool,
        Facet::Options,
        Facet::Oracle,
    ];

    pub const fn id(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Facet::Staking => "staking",
            Facet::Principal => "principal",
            Facet::Yield => "yield",
            Facet::Pool => "pool",
            Facet::Options => "options",
            Facet::Oracle => "oracle",
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|facet| facet.id() == id)
    }
}

impl std::fmt::Display for Facet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Every state-token kind with a fixed commitment layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitmentKind {
    Registry,
    StakeReceipt,
    Principal,
    Yield,
    Position,
    PoolState,
    FeeCheckpoint,
    Option,
    PriceFeed,
}

impl CommitmentKind {
    /// Fixed byte width of the layout
    pub const fn width(self) -> usize {
        match self {
            CommitmentKind::Registry => 36,
            CommitmentKind::StakeReceipt => 8,
            CommitmentKind::Principal => 12,
            CommitmentKind::Yield => 12,
            CommitmentKind::Position => 16,
            CommitmentKind::PoolState => 40,
            CommitmentKind::FeeCheckpoint => 32,
            CommitmentKind::Option => 41,
            CommitmentKind::PriceFeed => 12,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            CommitmentKind::Registry => "registry",
            CommitmentKind::StakeReceipt => "stake-receipt",
            CommitmentKind::Principal => "principal",
            CommitmentKind::Yield => "yield",
            CommitmentKind::Position => "position",
            CommitmentKind::PoolState => "pool-state",
            CommitmentKind::FeeCheckpoint => "fee-checkpoint",
            CommitmentKind::Option => "option",
            CommitmentKind::PriceFeed => "price-feed",
        }
    }

    /// Non-minting kinds a facet's category may hold
    pub const fn state_kinds(facet: Facet) -> &'static [CommitmentKind] {
        match facet {
            Facet::Staking => &[CommitmentKind::StakeReceipt],
            Facet::Principal => &[CommitmentKind::Principal],
            Facet::Yield => &[CommitmentKind::Yield],
            Facet::Pool => &[
                CommitmentKind::PoolState,
                CommitmentKind::Position,
                CommitmentKind::FeeCheckpoint,
            ],
            Facet::Options => &[CommitmentKind::Option],
            Facet::Oracle => &[CommitmentKind::PriceFeed],
        }
    }
}

impl std::fmt::Display for CommitmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed-width layout of one commitment kind
pub trait CommitmentLayout: Sized {
    const KIND: CommitmentKind;

    /// Serialize into exactly `KIND.width()` bytes
    fn encode(&self) -> Vec<u8>;

    /// Deserialize, rejecting any other width or invalid flag
    fn decode(bytes: &[u8]) -> CovenantResult<Self>;
}

/// Decoded commitment of any kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commitment {
    Registry(RegistryEntry),
    StakeReceipt(StakeReceipt),
    Principal(PrincipalToken),
    Yield(YieldToken),
    Position(Position),
    PoolState(PoolState),
    FeeCheckpoint(FeeCheckpoint),
    Option(OptionContract),
    PriceFeed(PriceFeed),
}

impl Commitment {
    pub fn kind(&self) -> CommitmentKind {
        match self {
            Commitment::Registry(_) => CommitmentKind::Registry,
            Commitment::StakeReceipt(_) => CommitmentKind::StakeReceipt,
            Commitment::Principal(_) => CommitmentKind::Principal,
            Commitment::Yield(_) => CommitmentKind::Yield,
            Commitment::Position(_) => CommitmentKind::Position,
            Commitment::PoolState(_) => CommitmentKind::PoolState,
            Commitment::FeeCheckpoint(_) => CommitmentKind::FeeCheckpoint,
            Commitment::Option(_) => CommitmentKind::Option,
            Commitment::PriceFeed(_) => CommitmentKind::PriceFeed,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Commitment::Registry(c) => c.encode(),
            Commitment::StakeReceipt(c) => c.encode(),
            Commitment::Principal(c) => c.encode(),
            Commitment::Yield(c) => c.encode(),
            Commitment::Position(c) => c.encode(),
            Commitment::PoolState(c) => c.encode(),
            Commitment::FeeCheckpoint(c) => c.encode(),
            Commitment::Option(c) => c.encode(),
            Commitment::PriceFeed(c) => c.encode(),
        }
    }

    pub fn decode(kind: CommitmentKind, bytes: &[u8]) -> CovenantResult<Self> {
        Ok(match kind {
            CommitmentKind::Registry => Commitment::Registry(RegistryEntry::decode(bytes)?),
            CommitmentKind::StakeReceipt => Commitment::StakeReceipt(StakeReceipt::decode(bytes)?),
            CommitmentKind::Principal => Commitment::Principal(PrincipalToken::decode(bytes)?),
            CommitmentKind::Yield => Commitment::Yield(YieldToken::decode(bytes)?),
            CommitmentKind::Position => Commitment::Position(Position::decode(bytes)?),
            CommitmentKind::PoolState => Commitment::PoolState(PoolState::decode(bytes)?),
            CommitmentKind::FeeCheckpoint => {
                Commitment::FeeCheckpoint(FeeCheckpoint::decode(bytes)?)
            }
            CommitmentKind::Option => Commitment::Option(OptionContract::decode(bytes)?),
            CommitmentKind::PriceFeed => Commitment::PriceFeed(PriceFeed::decode(bytes)?),
        })
    }

    /// Decode a non-minting commitment of `facet`, picking the kind by width
    pub fn decode_state(facet: Facet, bytes: &[u8]) -> CovenantResult<Self> {
        let kinds = CommitmentKind::state_kinds(facet);
        match kinds.iter().find(|kind| kind.width() == bytes.len()) {
            Some(kind) => Self::decode(*kind, bytes),
            None => Err(CovenantError::MalformedCommitment {
                kind: kinds[0].name(),
                reason: format!(
                    "{} bytes matches no {} state layout",
                    bytes.len(),
                    facet
                ),
            }),
        }
    }
}
