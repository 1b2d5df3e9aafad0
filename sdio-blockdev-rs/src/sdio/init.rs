use super::{
    constants::*,
    Sdio,
    SdioError,
};
use crate::{
    hal::{
        HostConfig,
        SdmmcHal,
    },
    pins::SDMMC1_PINS,
};
use embedded_hal::digital::v2::InputPin;

impl<H: SdmmcHal, CD: InputPin> Sdio<H, CD> {
    pub fn init(&mut self) -> Result<(), SdioError> {
        if !self.is_card_present() {
            return Err(SdioError::NoCard);
        }

        self.hal.enable_clocks();
        self.hal.configure_pins(&SDMMC1_PINS)?;
        self.hal.enable_interrupts();

        let config = HostConfig::default();
        self.hal.init(&config)?;
        self.enable_wide_bus(&config)
    }

    fn enable_wide_bus(&mut self, config: &HostConfig) -> Result<(), SdioError> {
        // A locked card ignores the bus width switch
        if self.hal.response1() & CARD_LOCKED != 0 {
            return Err(SdioError::CardLocked);
        }

        let rca = self.hal.card_info().relative_card_address;
        self.hal.send_app_command((rca as u32) << RCA_ARG_SHIFT)?;
        self.hal.send_bus_width_command(WIDE_BUS_4BIT_ARG)?;

        // Reprogram the host side now that the card has switched widths
        self.hal.apply_host_config(config)?;
        Ok(())
    }

    pub fn deinit(&mut self) -> Result<(), SdioError> {
        let result = self.hal.deinit();

        // Peripheral teardown happens even if the controller reported an
        // error above
        self.hal.disable_interrupts();
        self.hal.release_pins(&SDMMC1_PINS);
        self.hal.disable_clocks();

        result.map_err(SdioError::from)
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
        BusWidth,
        HalError,
    };

    fn zero_millis() -> u32 {
        0
    }

    struct TestPin {
        high: bool,
    }

    impl InputPin for TestPin {
        type Error = core::convert::Infallible;

        fn is_high(&self) -> Result<bool, Self::Error> {
            Ok(self.high)
        }

        fn is_low(&self) -> Result<bool, Self::Error> {
            Ok(!self.high)
        }
    }

    #[test]
    fn test_init_brings_up_controller() {
        let sdio = Sdio::new(RamCardHal::new(16), zero_millis);
        let mut device = sdio.borrow_mut();
        device.init().unwrap();

        assert!(device.hal.clocks_enabled());
        assert!(device.hal.interrupts_enabled());
        assert!(device.hal.initialized());
        assert_eq!(device.hal.configured_pin_count(), SDMMC1_PINS.len());
    }

    #[test]
    fn test_init_switches_to_wide_bus() {
        let sdio = Sdio::new(RamCardHal::new(16), zero_millis);
        let mut device = sdio.borrow_mut();
        device.init().unwrap();

        let rca = device.hal.card_info().relative_card_address;
        assert_eq!(device.hal.last_app_command(), Some((rca as u32) << 16));
        assert_eq!(device.hal.last_bus_width(), Some(WIDE_BUS_4BIT_ARG));
        assert_eq!(device.hal.host_config().map(|c| c.bus_width), Some(BusWidth::Four));
        // Once at init, once after the width switch
        assert_eq!(device.hal.config_applications(), 2);
    }

    #[test]
    fn test_init_refuses_locked_card() {
        let mut hal = RamCardHal::new(16);
        hal.set_response1(CARD_LOCKED);
        let sdio = Sdio::new(hal, zero_millis);
        let mut device = sdio.borrow_mut();

        assert!(matches!(device.init(), Err(SdioError::CardLocked)));
        // The controller itself still came up; only the width switch was
        // refused
        assert!(device.hal.initialized());
        assert_eq!(device.hal.last_bus_width(), None);
    }

    #[test]
    fn test_init_requires_card() {
        let sdio = Sdio::with_card_detect(RamCardHal::new(16), zero_millis, TestPin { high: false });
        let mut device = sdio.borrow_mut();

        assert!(matches!(device.init(), Err(SdioError::NoCard)));
        assert!(!device.hal.clocks_enabled());
    }

    #[test]
    fn test_init_propagates_controller_failure() {
        let mut hal = RamCardHal::new(16);
        hal.fail_next(FailOp::Init, HalError::Failed);
        let sdio = Sdio::new(hal, zero_millis);
        let mut device = sdio.borrow_mut();

        assert!(matches!(device.init(), Err(SdioError::Failed)));
        assert_eq!(device.hal.configured_pin_count(), SDMMC1_PINS.len());
        assert!(!device.hal.initialized());
    }

    #[test]
    fn test_deinit_tears_down_controller() {
        let sdio = Sdio::new(RamCardHal::new(16), zero_millis);
        let mut device = sdio.borrow_mut();
        device.init().unwrap();
        device.deinit().unwrap();

        assert!(!device.hal.initialized());
        assert!(!device.hal.clocks_enabled());
        assert!(!device.hal.interrupts_enabled());
        assert_eq!(device.hal.configured_pin_count(), 0);
    }

    #[test]
    fn test_deinit_failure_still_releases_peripherals() {
        let sdio = Sdio::new(RamCardHal::new(16), zero_millis);
        let mut device = sdio.borrow_mut();
        device.init().unwrap();

        device.hal.fail_next(FailOp::Deinit, HalError::Failed);
        assert!(matches!(device.deinit(), Err(SdioError::Failed)));
        assert!(!device.hal.clocks_enabled());
        assert_eq!(device.hal.configured_pin_count(), 0);
    }
}
