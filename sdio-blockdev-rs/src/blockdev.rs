use crate::{
    hal::SdmmcHal,
    sdio::{
        SdioError,
        SdioRef,
        DATA_TIMEOUT_MS,
    },
};
use embedded_hal::digital::v2::InputPin;

#[derive(Clone, Copy, Debug)]
pub enum BlockDeviceError {
    DeviceFailed = 1,
    NotInitialized,
    NoCard,
    InvalidParameter,
    ReadFailed,
    WriteFailed,
    EraseFailed,
}

impl From<SdioError> for BlockDeviceError {
    fn from(e: SdioError) -> BlockDeviceError {
        match e {
            SdioError::NoCard => BlockDeviceError::NoCard,
            _ => BlockDeviceError::DeviceFailed,
        }
    }
}

pub struct SdioBlockDevice {
    is_initialized: bool,
    block_count: u32,
    block_size: u32,
}

impl SdioBlockDevice {
    pub fn new() -> SdioBlockDevice {
        SdioBlockDevice {
            is_initialized: false,
            block_count: 0,
            block_size: 0,
        }
    }

    pub fn init<H: SdmmcHal, CD: InputPin>(&mut self, sdio: SdioRef<H, CD>) -> Result<(), BlockDeviceError> {
        if self.is_initialized {
            return Ok(());
        }

        let mut device = sdio.borrow_mut();
        if !device.is_card_present() {
            return Err(BlockDeviceError::NoCard);
        }
        device.init()?;

        let info = device.card_info();
        self.block_count = info.logical_block_count;
        self.block_size = info.logical_block_size;
        self.is_initialized = true;
        Ok(())
    }

    pub fn deinit<H: SdmmcHal, CD: InputPin>(&mut self, sdio: SdioRef<H, CD>) -> Result<(), BlockDeviceError> {
        if !self.is_initialized {
            return Ok(());
        }

        sdio.borrow_mut().deinit()?;
        self.is_initialized = false;
        self.block_count = 0;
        self.block_size = 0;
        Ok(())
    }

    pub fn read<H: SdmmcHal, CD: InputPin>(
        &mut self,
        sdio: SdioRef<H, CD>,
        buf: &mut [u8],
        addr: u64,
    ) -> Result<(), BlockDeviceError> {
        if !self.is_initialized {
            return Err(BlockDeviceError::NotInitialized);
        }
        if !self.is_valid_read(addr, buf.len() as u64) {
            return Err(BlockDeviceError::InvalidParameter);
        }

        let mut device = sdio.borrow_mut();
        let block = (addr / self.block_size as u64) as u32;
        let count = (buf.len() as u64 / self.block_size as u64) as u32;

        device
            .wait_transfer_state(DATA_TIMEOUT_MS)
            .map_err(|_| BlockDeviceError::ReadFailed)?;
        // The buffer borrow is held until the completion wait returns, so the
        // transfer cannot outlive it
        unsafe { device.read_blocks_dma(buf, block, count) }.map_err(|_| BlockDeviceError::ReadFailed)?;
        device
            .wait_read_complete(DATA_TIMEOUT_MS)
            .map_err(|_| BlockDeviceError::ReadFailed)?;
        Ok(())
    }

    pub fn program<H: SdmmcHal, CD: InputPin>(
        &mut self,
        sdio: SdioRef<H, CD>,
        buf: &[u8],
        addr: u64,
    ) -> Result<(), BlockDeviceError> {
        if !self.is_initialized {
            return Err(BlockDeviceError::NotInitialized);
        }
        if !self.is_valid_program(addr, buf.len() as u64) {
            return Err(BlockDeviceError::InvalidParameter);
        }

        let mut device = sdio.borrow_mut();
        let block = (addr / self.block_size as u64) as u32;
        let count = (buf.len() as u64 / self.block_size as u64) as u32;

        device
            .wait_transfer_state(DATA_TIMEOUT_MS)
            .map_err(|_| BlockDeviceError::WriteFailed)?;
        unsafe { device.write_blocks_dma(buf, block, count) }.map_err(|_| BlockDeviceError::WriteFailed)?;
        device
            .wait_write_complete(DATA_TIMEOUT_MS)
            .map_err(|_| BlockDeviceError::WriteFailed)?;
        Ok(())
    }

    pub fn trim<H: SdmmcHal, CD: InputPin>(
        &mut self,
        sdio: SdioRef<H, CD>,
        addr: u64,
        len: u64,
    ) -> Result<(), BlockDeviceError> {
        if !self.is_initialized {
            return Err(BlockDeviceError::NotInitialized);
        }
        if !self.is_valid_trim(addr, len) {
            return Err(BlockDeviceError::InvalidParameter);
        }

        let mut device = sdio.borrow_mut();
        let block_size = self.block_size as u64;
        let start_block = (addr / block_size) as u32;
        let end_block = ((addr + len) / block_size) as u32 - 1;

        device.erase(start_block, end_block).map_err(|_| BlockDeviceError::EraseFailed)?;
        // The card reports Programming until the discard finishes
        device
            .wait_transfer_state(DATA_TIMEOUT_MS)
            .map_err(|_| BlockDeviceError::EraseFailed)?;
        Ok(())
    }

    pub fn is_valid_read(&self, addr: u64, len: u64) -> bool {
        self.is_valid_access(addr, len)
    }

    pub fn is_valid_program(&self, addr: u64, len: u64) -> bool {
        self.is_valid_access(addr, len)
    }

    pub fn is_valid_trim(&self, addr: u64, len: u64) -> bool {
        self.is_valid_access(addr, len)
    }

    fn is_valid_access(&self, addr: u64, len: u64) -> bool {
        if !self.is_initialized {
            return false;
        }
        let block_size = self.block_size as u64;
        len > 0
            && addr % block_size == 0
            && len % block_size == 0
            && addr.checked_add(len).map_or(false, |end| end <= self.size_bytes())
    }

    #[inline(always)]
    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    #[inline(always)]
    pub fn block_count(&self) -> u32 {
        self.block_count
    }

    #[inline(always)]
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    #[inline(always)]
    pub fn read_size(&self) -> u32 {
        self.block_size
    }

    #[inline(always)]
    pub fn program_size(&self) -> u32 {
        self.block_size
    }

    #[inline(always)]
    pub fn erase_size(&self) -> u32 {
        self.block_size
    }

    pub fn size_bytes(&self) -> u64 {
        self.block_count as u64 * self.block_size as u64
    }
}
