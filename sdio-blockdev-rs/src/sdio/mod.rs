mod constants;
mod debug;
mod device;
mod init;
mod transfer;

pub use constants::BLOCK_SIZE;
pub(crate) use constants::DATA_TIMEOUT_MS;
pub use device::{
    NoCardDetect,
    Sdio,
    SdioRef,
};

use crate::hal::HalError;

#[derive(Clone, Copy, Debug)]
pub enum SdioError {
    Failed = 1,
    Busy,
    Timeout,
    CardLocked,
    NoCard,
}

impl From<HalError> for SdioError {
    fn from(e: HalError) -> SdioError {
        match e {
            HalError::Busy => SdioError::Busy,
            HalError::Timeout => SdioError::Timeout,
            HalError::Failed | HalError::Unsupported => SdioError::Failed,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferState {
    Ready,
    Busy,
}

// One block's worth of data, aligned for the controller's 32-bit FIFO
// accesses.
#[repr(C, align(4))]
#[derive(Clone, Copy)]
pub struct Block(pub [u8; BLOCK_SIZE]);

impl Block {
    pub fn zeroed() -> Block {
        Block([0; BLOCK_SIZE])
    }
}

impl<I: core::slice::SliceIndex<[u8]>> core::ops::Index<I> for Block {
    type Output = I::Output;

    #[inline]
    fn index(&self, index: I) -> &I::Output {
        &self.0[index]
    }
}

impl<I: core::slice::SliceIndex<[u8]>> core::ops::IndexMut<I> for Block {
    #[inline]
    fn index_mut(&mut self, index: I) -> &mut I::Output {
        &mut self.0[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_alignment() {
        let block = Block::zeroed();
        assert_eq!(core::mem::size_of::<Block>(), BLOCK_SIZE);
        assert_eq!(block.0.as_ptr() as usize % 4, 0);
    }

    #[test]
    fn test_block_indexing() {
        let mut block = Block::zeroed();
        block[0] = 0x12;
        block[511] = 0x34;
        assert_eq!(block[0], 0x12);
        assert_eq!(&block[510..], &[0x00, 0x34]);
    }

    #[test]
    fn test_hal_error_conversion() {
        assert!(matches!(SdioError::from(HalError::Busy), SdioError::Busy));
        assert!(matches!(SdioError::from(HalError::Timeout), SdioError::Timeout));
        assert!(matches!(SdioError::from(HalError::Failed), SdioError::Failed));
        assert!(matches!(SdioError::from(HalError::Unsupported), SdioError::Failed));
    }
}
