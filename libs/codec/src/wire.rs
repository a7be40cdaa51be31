//! Zero-copy wire structs
//!
//! Every field is either a byte, a byte array, or a big-endian integer, so the
//! structs are `Unaligned` and their size is exactly the layout width.

use zerocopy::byteorder::{BigEndian, I32, U16, U32, U64};
use zerocopy::{AsBytes, FromBytes, FromZeroes, Unaligned};

#[derive(AsBytes, FromBytes, FromZeroes, Unaligned, Clone, Copy)]
#[repr(C)]
pub(crate) struct RegistryWire {
    pub facet_id: u8,
    pub code_hash: [u8; 32],
    pub version: U16<BigEndian>,
    pub flags: u8,
}

#[derive(AsBytes, FromBytes, FromZeroes, Unaligned, Clone, Copy)]
#[repr(C)]
pub(crate) struct StakeReceiptWire {
    pub amount: U64<BigEndian>,
}

/// Shared by principal and yield tokens: amount then expiry
#[derive(AsBytes, FromBytes, FromZeroes, Unaligned, Clone, Copy)]
#[repr(C)]
pub(crate) struct TrancheWire {
    pub amount: U64<BigEndian>,
    pub expiry: U32<BigEndian>,
}

#[derive(AsBytes, FromBytes, FromZeroes, Unaligned, Clone, Copy)]
#[repr(C)]
pub(crate) struct PositionWire {
    pub tick_lower: I32<BigEndian>,
    pub tick_upper: I32<BigEndian>,
    pub liquidity: U64<BigEndian>,
}

#[derive(AsBytes, FromBytes, FromZeroes, Unaligned, Clone, Copy)]
#[repr(C)]
pub(crate) struct PoolStateWire {
    pub reserve0: U64<BigEndian>,
    pub reserve1: U64<BigEndian>,
    pub liquidity: U64<BigEndian>,
    pub fee_growth0: U64<BigEndian>,
    pub fee_growth1: U64<BigEndian>,
}

#[derive(AsBytes, FromBytes, FromZeroes, Unaligned, Clone, Copy)]
#[repr(C)]
pub(crate) struct FeeCheckpointWire {
    pub tick_lower: I32<BigEndian>,
    pub tick_upper: I32<BigEndian>,
    pub liquidity: U64<BigEndian>,
    pub fee_growth0: U64<BigEndian>,
    pub fee_growth1: U64<BigEndian>,
}

#[derive(AsBytes, FromBytes, FromZeroes, Unaligned, Clone, Copy)]
#[repr(C)]
pub(crate) struct OptionWire {
    pub asset: [u8; 32],
    pub strike: U32<BigEndian>,
    pub expiry: U32<BigEndian>,
    pub is_call: u8,
}

#[derive(AsBytes, FromBytes, FromZeroes, Unaligned, Clone, Copy)]
#[repr(C)]
pub(crate) struct PriceFeedWire {
    pub price: U64<BigEndian>,
    pub published_at: U32<BigEndian>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::CommitmentKind;

    #[test]
    fn test_wire_sizes_match_layout_widths() {
        use std::mem::size_of;
        assert_eq!(size_of::<RegistryWire>(), CommitmentKind::Registry.width());
        assert_eq!(size_of::<StakeReceiptWire>(), CommitmentKind::StakeReceipt.width());
        assert_eq!(size_of::<TrancheWire>(), CommitmentKind::Principal.width());
        assert_eq!(size_of::<TrancheWire>(), CommitmentKind::Yield.width());
        assert_eq!(size_of::<PositionWire>(), CommitmentKind::Position.width());
        assert_eq!(size_of::<PoolStateWire>(), CommitmentKind::PoolState.width());
        assert_eq!(size_of::<FeeCheckpointWire>(), CommitmentKind::FeeCheckpoint.width());
        assert_eq!(size_of::<OptionWire>(), CommitmentKind::Option.width());
        assert_eq!(size_of::<PriceFeedWire>(), CommitmentKind::PriceFeed.width());
    }
}
