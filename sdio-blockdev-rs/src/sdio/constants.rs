pub const BLOCK_SIZE: usize = 512;
pub(crate) const DATA_TIMEOUT_MS: u32 = 30000;
pub(crate) const CARD_LOCKED: u32 = 0x02000000;
pub(crate) const WIDE_BUS_4BIT_ARG: u32 = 2;
pub(crate) const RCA_ARG_SHIFT: u32 = 16;
