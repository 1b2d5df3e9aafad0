use super::{
    BlockCount,
    BlockIndex,
    CardInfo,
    CardState,
    CardType,
    HalError,
    HostConfig,
    SdmmcHal,
    TransferEvent,
};
use crate::{
    pins::PinAssignment,
    sdio::BLOCK_SIZE,
};

// The store only backs this many blocks; the reported geometry may be larger.
const STORE_BLOCKS: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailOp {
    Pins,
    Init,
    Deinit,
    Read,
    Write,
    ReadDma,
    WriteDma,
    Erase,
    AppCommand,
    BusWidthCommand,
    ApplyConfig,
}

pub struct RamCardHal {
    store: [u8; STORE_BLOCKS * BLOCK_SIZE],
    info: CardInfo,
    state: CardState,
    busy_polls: u32,
    pending_event: Option<TransferEvent>,
    response1_value: u32,
    fail_next: Option<(FailOp, HalError)>,
    initialized: bool,
    clocks_enabled: bool,
    interrupts_enabled: bool,
    configured_pin_count: usize,
    host_config: Option<HostConfig>,
    config_applications: u32,
    last_app_command: Option<u32>,
    last_bus_width: Option<u32>,
    erased: Option<(BlockIndex, BlockIndex)>,
}

impl RamCardHal {
    pub fn new(block_count: u32) -> RamCardHal {
        RamCardHal {
            store: [0; STORE_BLOCKS * BLOCK_SIZE],
            info: CardInfo {
                card_type: CardType::SdhcSdxc,
                card_version: 2,
                command_classes: 0x5b5,
                relative_card_address: 0xb368,
                block_count,
                block_size: BLOCK_SIZE as u32,
                logical_block_count: block_count,
                logical_block_size: BLOCK_SIZE as u32,
            },
            state: CardState::Standby,
            busy_polls: 0,
            pending_event: None,
            response1_value: 0,
            fail_next: None,
            initialized: false,
            clocks_enabled: false,
            interrupts_enabled: false,
            configured_pin_count: 0,
            host_config: None,
            config_applications: 0,
            last_app_command: None,
            last_bus_width: None,
            erased: None,
        }
    }

    pub fn fail_next(&mut self, op: FailOp, error: HalError) {
        self.fail_next = Some((op, error));
    }

    pub fn set_card_state(&mut self, state: CardState) {
        self.state = state;
    }

    pub fn set_busy_polls(&mut self, polls: u32) {
        self.busy_polls = polls;
    }

    pub fn set_response1(&mut self, value: u32) {
        self.response1_value = value;
    }

    #[inline(always)]
    pub fn initialized(&self) -> bool {
        self.initialized
    }

    #[inline(always)]
    pub fn clocks_enabled(&self) -> bool {
        self.clocks_enabled
    }

    #[inline(always)]
    pub fn interrupts_enabled(&self) -> bool {
        self.interrupts_enabled
    }

    #[inline(always)]
    pub fn configured_pin_count(&self) -> usize {
        self.configured_pin_count
    }

    #[inline(always)]
    pub fn host_config(&self) -> Option<HostConfig> {
        self.host_config
    }

    #[inline(always)]
    pub fn config_applications(&self) -> u32 {
        self.config_applications
    }

    #[inline(always)]
    pub fn last_app_command(&self) -> Option<u32> {
        self.last_app_command
    }

    #[inline(always)]
    pub fn last_bus_width(&self) -> Option<u32> {
        self.last_bus_width
    }

    #[inline(always)]
    pub fn erased(&self) -> Option<(BlockIndex, BlockIndex)> {
        self.erased
    }

    fn take_failure(&mut self, op: FailOp) -> Result<(), HalError> {
        match self.fail_next {
            Some((fail_op, error)) if fail_op == op => {
                self.fail_next = None;
                Err(error)
            },
            _ => Ok(()),
        }
    }

    fn check_range(&self, block: BlockIndex, count: BlockCount) -> Result<(), HalError> {
        let end = block as u64 + count as u64;
        if count == 0 || end > self.info.block_count as u64 || end > STORE_BLOCKS as u64 {
            return Err(HalError::Failed);
        }
        Ok(())
    }

    fn check_buf(count: BlockCount, buf_len: usize) -> Result<(), HalError> {
        if buf_len < count as usize * BLOCK_SIZE {
            return Err(HalError::Failed);
        }
        Ok(())
    }

    fn copy_out(&self, buf: &mut [u8], block: BlockIndex, count: BlockCount) {
        let start = block as usize * BLOCK_SIZE;
        let len = count as usize * BLOCK_SIZE;
        buf[..len].copy_from_slice(&self.store[start..start + len]);
    }

    fn copy_in(&mut self, buf: &[u8], block: BlockIndex, count: BlockCount) {
        let start = block as usize * BLOCK_SIZE;
        let len = count as usize * BLOCK_SIZE;
        self.store[start..start + len].copy_from_slice(&buf[..len]);
    }
}

impl SdmmcHal for RamCardHal {
    fn enable_clocks(&mut self) {
        self.clocks_enabled = true;
    }

    fn disable_clocks(&mut self) {
        self.clocks_enabled = false;
    }

    fn configure_pins(&mut self, pins: &[PinAssignment]) -> Result<(), HalError> {
        self.take_failure(FailOp::Pins)?;
        self.configured_pin_count = pins.len();
        Ok(())
    }

    fn release_pins(&mut self, _pins: &[PinAssignment]) {
        self.configured_pin_count = 0;
    }

    fn enable_interrupts(&mut self) {
        self.interrupts_enabled = true;
    }

    fn disable_interrupts(&mut self) {
        self.interrupts_enabled = false;
    }

    fn init(&mut self, config: &HostConfig) -> Result<(), HalError> {
        self.take_failure(FailOp::Init)?;
        if !self.clocks_enabled {
            return Err(HalError::Failed);
        }
        self.initialized = true;
        self.host_config = Some(*config);
        self.config_applications += 1;
        self.state = CardState::Transfer;
        Ok(())
    }

    fn deinit(&mut self) -> Result<(), HalError> {
        self.take_failure(FailOp::Deinit)?;
        self.initialized = false;
        self.state = CardState::Standby;
        Ok(())
    }

    fn read_blocks(
        &mut self,
        buf: &mut [u8],
        block: BlockIndex,
        count: BlockCount,
        _timeout_ms: u32,
    ) -> Result<(), HalError> {
        self.take_failure(FailOp::Read)?;
        if !self.initialized {
            return Err(HalError::Failed);
        }
        self.check_range(block, count)?;
        RamCardHal::check_buf(count, buf.len())?;
        self.copy_out(buf, block, count);
        Ok(())
    }

    fn write_blocks(
        &mut self,
        buf: &[u8],
        block: BlockIndex,
        count: BlockCount,
        _timeout_ms: u32,
    ) -> Result<(), HalError> {
        self.take_failure(FailOp::Write)?;
        if !self.initialized {
            return Err(HalError::Failed);
        }
        self.check_range(block, count)?;
        RamCardHal::check_buf(count, buf.len())?;
        self.copy_in(buf, block, count);
        Ok(())
    }

    unsafe fn read_blocks_dma(
        &mut self,
        buf: &mut [u8],
        block: BlockIndex,
        count: BlockCount,
    ) -> Result<(), HalError> {
        self.take_failure(FailOp::ReadDma)?;
        if !self.initialized {
            return Err(HalError::Failed);
        }
        self.check_range(block, count)?;
        RamCardHal::check_buf(count, buf.len())?;
        self.copy_out(buf, block, count);
        self.pending_event = Some(TransferEvent::RxComplete);
        Ok(())
    }

    unsafe fn write_blocks_dma(
        &mut self,
        buf: &[u8],
        block: BlockIndex,
        count: BlockCount,
    ) -> Result<(), HalError> {
        self.take_failure(FailOp::WriteDma)?;
        if !self.initialized {
            return Err(HalError::Failed);
        }
        self.check_range(block, count)?;
        RamCardHal::check_buf(count, buf.len())?;
        self.copy_in(buf, block, count);
        self.pending_event = Some(TransferEvent::TxComplete);
        self.busy_polls = 2;
        Ok(())
    }

    fn erase(&mut self, start_block: BlockIndex, end_block: BlockIndex) -> Result<(), HalError> {
        self.take_failure(FailOp::Erase)?;
        if !self.initialized {
            return Err(HalError::Failed);
        }
        if end_block < start_block {
            return Err(HalError::Failed);
        }
        self.check_range(start_block, end_block - start_block + 1)?;
        let start = start_block as usize * BLOCK_SIZE;
        let end = (end_block as usize + 1) * BLOCK_SIZE;
        for byte in self.store[start..end].iter_mut() {
            *byte = 0;
        }
        self.erased = Some((start_block, end_block));
        self.busy_polls = 2;
        Ok(())
    }

    fn card_state(&mut self) -> CardState {
        if self.busy_polls > 0 {
            self.busy_polls -= 1;
            return CardState::Programming;
        }
        self.state
    }

    fn card_info(&mut self) -> CardInfo {
        self.info
    }

    fn service_interrupt(&mut self) -> Option<TransferEvent> {
        self.pending_event.take()
    }

    fn service_dma_rx_interrupt(&mut self) -> Option<TransferEvent> {
        match self.pending_event {
            Some(TransferEvent::RxComplete) => self.pending_event.take(),
            _ => None,
        }
    }

    fn service_dma_tx_interrupt(&mut self) -> Option<TransferEvent> {
        match self.pending_event {
            Some(TransferEvent::TxComplete) => self.pending_event.take(),
            _ => None,
        }
    }

    fn response1(&mut self) -> u32 {
        self.response1_value
    }

    fn send_app_command(&mut self, argument: u32) -> Result<(), HalError> {
        self.take_failure(FailOp::AppCommand)?;
        self.last_app_command = Some(argument);
        Ok(())
    }

    fn send_bus_width_command(&mut self, argument: u32) -> Result<(), HalError> {
        self.take_failure(FailOp::BusWidthCommand)?;
        self.last_bus_width = Some(argument);
        Ok(())
    }

    fn apply_host_config(&mut self, config: &HostConfig) -> Result<(), HalError> {
        self.take_failure(FailOp::ApplyConfig)?;
        self.host_config = Some(*config);
        self.config_applications += 1;
        Ok(())
    }
}
