#[cfg(any(test, feature = "ramcard"))]
pub mod ramcard;

use crate::pins::PinAssignment;

pub type BlockIndex = u32;
pub type BlockCount = u32;

#[derive(Clone, Copy, Debug)]
pub enum HalError {
    Failed = 1,
    Busy,
    Timeout,
    Unsupported,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardState {
    Ready = 1,
    Identification,
    Standby,
    Transfer,
    Sending,
    Receiving,
    Programming,
    Disconnected,
    Error = 255,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferEvent {
    RxComplete,
    TxComplete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockEdge {
    Rising,
    Falling,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusWidth {
    One,
    Four,
    Eight,
}

#[derive(Clone, Copy, Debug)]
pub struct HostConfig {
    pub clock_edge: ClockEdge,
    pub clock_power_save: bool,
    pub bus_width: BusWidth,
    pub hardware_flow_control: bool,
    pub clock_divider: u8,
    pub transceiver_present: bool,
}

impl Default for HostConfig {
    fn default() -> HostConfig {
        HostConfig {
            clock_edge: ClockEdge::Rising,
            clock_power_save: false,
            bus_width: BusWidth::Four,
            hardware_flow_control: false,
            clock_divider: 0,
            transceiver_present: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardType {
    Sdsc,
    SdhcSdxc,
    Secured,
}

pub enum SdVersion {
    One,
    Two { sdhc: bool },
}

#[derive(Clone, Copy, Debug)]
pub struct CardInfo {
    pub card_type: CardType,
    pub card_version: u8,
    pub command_classes: u16,
    pub relative_card_address: u16,
    pub block_count: u32,
    pub block_size: u32,
    pub logical_block_count: u32,
    pub logical_block_size: u32,
}

impl CardInfo {
    #[inline(always)]
    pub fn is_high_capacity(&self) -> bool {
        self.card_type != CardType::Sdsc
    }

    pub fn version(&self) -> SdVersion {
        match self.card_version {
            1 => SdVersion::One,
            _ => SdVersion::Two {
                sdhc: self.is_high_capacity(),
            },
        }
    }

    pub fn capacity_mib(&self) -> u32 {
        ((self.block_count as u64 * self.block_size as u64) >> 20) as u32
    }
}

pub trait SdmmcHal {
    fn enable_clocks(&mut self);

    fn disable_clocks(&mut self);

    fn configure_pins(&mut self, pins: &[PinAssignment]) -> Result<(), HalError>;

    fn release_pins(&mut self, pins: &[PinAssignment]);

    fn enable_interrupts(&mut self);

    fn disable_interrupts(&mut self);

    fn init(&mut self, config: &HostConfig) -> Result<(), HalError>;

    fn deinit(&mut self) -> Result<(), HalError>;

    fn read_blocks(
        &mut self,
        buf: &mut [u8],
        block: BlockIndex,
        count: BlockCount,
        timeout_ms: u32,
    ) -> Result<(), HalError>;

    fn write_blocks(
        &mut self,
        buf: &[u8],
        block: BlockIndex,
        count: BlockCount,
        timeout_ms: u32,
    ) -> Result<(), HalError>;

    /// Safety: the buffer must remain valid and unmoved until the controller
    /// reports RxComplete or the transfer is abandoned by deinit.
    unsafe fn read_blocks_dma(
        &mut self,
        buf: &mut [u8],
        block: BlockIndex,
        count: BlockCount,
    ) -> Result<(), HalError>;

    /// Safety: the buffer must remain valid and unmoved until the controller
    /// reports TxComplete or the transfer is abandoned by deinit.
    unsafe fn write_blocks_dma(
        &mut self,
        buf: &[u8],
        block: BlockIndex,
        count: BlockCount,
    ) -> Result<(), HalError>;

    fn erase(&mut self, start_block: BlockIndex, end_block: BlockIndex) -> Result<(), HalError>;

    fn card_state(&mut self) -> CardState;

    fn card_info(&mut self) -> CardInfo;

    fn service_interrupt(&mut self) -> Option<TransferEvent>;

    fn service_dma_rx_interrupt(&mut self) -> Option<TransferEvent>;

    fn service_dma_tx_interrupt(&mut self) -> Option<TransferEvent>;

    fn response1(&mut self) -> u32;

    fn send_app_command(&mut self, argument: u32) -> Result<(), HalError>;

    fn send_bus_width_command(&mut self, argument: u32) -> Result<(), HalError>;

    fn apply_host_config(&mut self, config: &HostConfig) -> Result<(), HalError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_host_config() {
        let config = HostConfig::default();
        assert_eq!(config.clock_edge, ClockEdge::Rising);
        assert_eq!(config.bus_width, BusWidth::Four);
        assert_eq!(config.clock_divider, 0);
        assert!(!config.clock_power_save);
        assert!(!config.hardware_flow_control);
        assert!(!config.transceiver_present);
    }

    #[test]
    fn test_card_info_capacity() {
        let info = CardInfo {
            card_type: CardType::SdhcSdxc,
            card_version: 2,
            command_classes: 0x5b5,
            relative_card_address: 1,
            block_count: 15523840,
            block_size: 512,
            logical_block_count: 15523840,
            logical_block_size: 512,
        };
        assert_eq!(info.capacity_mib(), 7580);
        assert!(info.is_high_capacity());
        assert!(matches!(info.version(), SdVersion::Two { sdhc: true }));
    }

    #[test]
    fn test_card_info_version_one() {
        let info = CardInfo {
            card_type: CardType::Sdsc,
            card_version: 1,
            command_classes: 0x5b5,
            relative_card_address: 1,
            block_count: 4096,
            block_size: 512,
            logical_block_count: 4096,
            logical_block_size: 512,
        };
        assert!(!info.is_high_capacity());
        assert!(matches!(info.version(), SdVersion::One));
    }
}
