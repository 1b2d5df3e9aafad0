use super::{
    constants::*,
    Sdio,
    SdioError,
    TransferState,
};
use crate::hal::{
    BlockCount,
    BlockIndex,
    CardState,
    SdmmcHal,
};
use embedded_hal::digital::v2::InputPin;

impl<H: SdmmcHal, CD: InputPin> Sdio<H, CD> {
    pub fn read_blocks(
        &mut self,
        buf: &mut [u8],
        block: BlockIndex,
        count: BlockCount,
    ) -> Result<(), SdioError> {
        self.hal.read_blocks(buf, block, count, DATA_TIMEOUT_MS)?;
        Ok(())
    }

    pub fn write_blocks(
        &mut self,
        buf: &[u8],
        block: BlockIndex,
        count: BlockCount,
    ) -> Result<(), SdioError> {
        self.hal.write_blocks(buf, block, count, DATA_TIMEOUT_MS)?;
        Ok(())
    }

    /// Safety: the buffer must stay valid and unmoved until read_complete
    /// returns Ok or the transfer is abandoned by deinit.
    pub unsafe fn read_blocks_dma(
        &mut self,
        buf: &mut [u8],
        block: BlockIndex,
        count: BlockCount,
    ) -> Result<(), SdioError> {
        // The flag goes up before the command is issued so a completion
        // interrupt can never race it
        self.mark_read_pending();
        match self.hal.read_blocks_dma(buf, block, count) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.complete_read();
                Err(SdioError::from(e))
            },
        }
    }

    /// Safety: the buffer must stay valid and unmoved until write_complete
    /// returns Ok or the transfer is abandoned by deinit.
    pub unsafe fn write_blocks_dma(
        &mut self,
        buf: &[u8],
        block: BlockIndex,
        count: BlockCount,
    ) -> Result<(), SdioError> {
        self.mark_write_pending();
        match self.hal.write_blocks_dma(buf, block, count) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.complete_write();
                Err(SdioError::from(e))
            },
        }
    }

    pub fn erase(&mut self, start_block: BlockIndex, end_block: BlockIndex) -> Result<(), SdioError> {
        self.hal.erase(start_block, end_block)?;
        Ok(())
    }

    pub fn read_complete(&self) -> nb::Result<(), SdioError> {
        match self.read_pending() {
            TransferState::Busy => Err(nb::Error::WouldBlock),
            TransferState::Ready => Ok(()),
        }
    }

    pub fn write_complete(&self) -> nb::Result<(), SdioError> {
        match self.write_pending() {
            TransferState::Busy => Err(nb::Error::WouldBlock),
            TransferState::Ready => Ok(()),
        }
    }

    pub fn wait_read_complete(&mut self, timeout_ms: u32) -> Result<(), SdioError> {
        let start_time_ms = self.now();
        loop {
            if let TransferState::Ready = self.read_pending() {
                return Ok(());
            }
            // With the vectors masked nothing else services the controller,
            // so the wait loop does it
            self.handle_sdmmc_interrupt();
            self.handle_dma_rx_interrupt();
            if self.now().wrapping_sub(start_time_ms) > timeout_ms {
                return Err(SdioError::Timeout);
            }
        }
    }

    pub fn wait_write_complete(&mut self, timeout_ms: u32) -> Result<(), SdioError> {
        let start_time_ms = self.now();
        loop {
            if let TransferState::Ready = self.write_pending() {
                return Ok(());
            }
            self.handle_sdmmc_interrupt();
            self.handle_dma_tx_interrupt();
            if self.now().wrapping_sub(start_time_ms) > timeout_ms {
                return Err(SdioError::Timeout);
            }
        }
    }

    pub fn transfer_state(&mut self) -> TransferState {
        if self.hal.card_state() == CardState::Transfer {
            TransferState::Ready
        } else {
            TransferState::Busy
        }
    }

    pub fn wait_transfer_state(&mut self, timeout_ms: u32) -> Result<(), SdioError> {
        let start_time_ms = self.now();
        while self.transfer_state() == TransferState::Busy {
            if self.now().wrapping_sub(start_time_ms) > timeout_ms {
                return Err(SdioError::Timeout);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{
        ramcard::{
            FailOp,
            RamCardHal,
        },
        HalError,
    };
    use core::{
        cell::RefCell,
        sync::atomic::{
            AtomicU32,
            Ordering,
        },
    };

    fn zero_millis() -> u32 {
        0
    }

    fn ticking_millis() -> u32 {
        static NOW_MS: AtomicU32 = AtomicU32::new(0);
        NOW_MS.fetch_add(1, Ordering::Relaxed)
    }

    fn init_sdio(millis: fn() -> u32) -> RefCell<Sdio<RamCardHal>> {
        let sdio = Sdio::new(RamCardHal::new(16), millis);
        sdio.borrow_mut().init().unwrap();
        sdio
    }

    #[test]
    fn test_blocking_write_then_read() {
        let sdio = init_sdio(zero_millis);
        let mut device = sdio.borrow_mut();

        let mut data = [0u8; BLOCK_SIZE];
        for (i, byte) in data.iter_mut().enumerate() {
            *byte = i as u8;
        }
        device.write_blocks(&data, 1, 1).unwrap();

        let mut buf = [0u8; BLOCK_SIZE];
        device.read_blocks(&mut buf, 1, 1).unwrap();
        assert_eq!(&buf[..], &data[..]);
    }

    #[test]
    fn test_blocking_read_maps_controller_errors() {
        let sdio = init_sdio(zero_millis);
        let mut device = sdio.borrow_mut();
        device.hal.fail_next(FailOp::Read, HalError::Timeout);

        let mut buf = [0u8; BLOCK_SIZE];
        assert!(matches!(device.read_blocks(&mut buf, 0, 1), Err(SdioError::Timeout)));
    }

    #[test]
    fn test_dma_read_completes_via_interrupt() {
        let sdio = init_sdio(zero_millis);
        let mut device = sdio.borrow_mut();

        let data = [0x5au8; BLOCK_SIZE];
        device.write_blocks(&data, 2, 1).unwrap();

        let mut buf = [0u8; BLOCK_SIZE];
        unsafe { device.read_blocks_dma(&mut buf, 2, 1).unwrap() };
        assert_eq!(device.read_pending(), TransferState::Busy);
        assert!(matches!(device.read_complete(), Err(nb::Error::WouldBlock)));

        device.handle_sdmmc_interrupt();
        assert_eq!(device.read_pending(), TransferState::Ready);
        assert!(device.read_complete().is_ok());
        assert_eq!(&buf[..], &data[..]);
    }

    #[test]
    fn test_dma_write_completes_via_dma_vector() {
        let sdio = init_sdio(zero_millis);
        let mut device = sdio.borrow_mut();

        let data = [0xc3u8; BLOCK_SIZE];
        unsafe { device.write_blocks_dma(&data, 3, 1).unwrap() };
        assert_eq!(device.write_pending(), TransferState::Busy);

        device.handle_dma_tx_interrupt();
        assert_eq!(device.write_pending(), TransferState::Ready);

        let mut buf = [0u8; BLOCK_SIZE];
        device.read_blocks(&mut buf, 3, 1).unwrap();
        assert_eq!(&buf[..], &data[..]);
    }

    #[test]
    fn test_refused_dma_transfer_clears_pending() {
        let sdio = init_sdio(zero_millis);
        let mut device = sdio.borrow_mut();
        device.hal.fail_next(FailOp::ReadDma, HalError::Busy);

        let mut buf = [0u8; BLOCK_SIZE];
        let result = unsafe { device.read_blocks_dma(&mut buf, 0, 1) };
        assert!(matches!(result, Err(SdioError::Busy)));
        assert_eq!(device.read_pending(), TransferState::Ready);
    }

    #[test]
    fn test_wait_read_complete_services_controller() {
        let sdio = init_sdio(zero_millis);
        let mut device = sdio.borrow_mut();

        let mut buf = [0u8; BLOCK_SIZE];
        unsafe { device.read_blocks_dma(&mut buf, 0, 1).unwrap() };
        device.wait_read_complete(1000).unwrap();
        assert_eq!(device.read_pending(), TransferState::Ready);
    }

    #[test]
    fn test_wait_read_complete_times_out() {
        let sdio = init_sdio(ticking_millis);
        let mut device = sdio.borrow_mut();

        device.mark_read_pending();
        assert!(matches!(device.wait_read_complete(50), Err(SdioError::Timeout)));
        device.complete_read();
    }

    #[test]
    fn test_wait_write_complete_times_out() {
        let sdio = init_sdio(ticking_millis);
        let mut device = sdio.borrow_mut();

        device.mark_write_pending();
        assert!(matches!(device.wait_write_complete(50), Err(SdioError::Timeout)));
        device.complete_write();
    }

    #[test]
    fn test_wait_transfer_state_rides_out_programming() {
        let sdio = init_sdio(zero_millis);
        let mut device = sdio.borrow_mut();

        device.hal.set_busy_polls(3);
        assert_eq!(device.transfer_state(), TransferState::Busy);
        device.wait_transfer_state(1000).unwrap();
        assert_eq!(device.transfer_state(), TransferState::Ready);
    }

    #[test]
    fn test_wait_transfer_state_times_out() {
        let sdio = init_sdio(ticking_millis);
        let mut device = sdio.borrow_mut();

        device.hal.set_card_state(CardState::Standby);
        assert!(matches!(device.wait_transfer_state(50), Err(SdioError::Timeout)));
    }

    #[test]
    fn test_erase_reaches_card() {
        let sdio = init_sdio(zero_millis);
        let mut device = sdio.borrow_mut();

        let data = [0xffu8; BLOCK_SIZE];
        device.write_blocks(&data, 4, 1).unwrap();
        device.erase(2, 4).unwrap();
        assert_eq!(device.hal.erased(), Some((2, 4)));

        device.wait_transfer_state(1000).unwrap();
        let mut buf = [0xffu8; BLOCK_SIZE];
        device.read_blocks(&mut buf, 4, 1).unwrap();
        assert!(buf.iter().all(|b| *b == 0));
    }
}
