use super::TransferState;
use crate::hal::{
    CardInfo,
    SdmmcHal,
    TransferEvent,
};
use core::{
    cell::RefCell,
    sync::atomic::{
        AtomicBool,
        Ordering,
    },
};
use embedded_hal::digital::v2::InputPin;

pub struct NoCardDetect;

impl InputPin for NoCardDetect {
    type Error = core::convert::Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(false)
    }
}

pub struct Sdio<H: SdmmcHal, CD = NoCardDetect> {
    pub(crate) millis: fn() -> u32,
    pub(crate) hal: H,
    card_detect: Option<CD>,
    read_pending: AtomicBool,
    write_pending: AtomicBool,
}

impl<H: SdmmcHal> Sdio<H> {
    pub fn new(hal: H, millis: fn() -> u32) -> RefCell<Sdio<H>> {
        RefCell::new(Sdio {
            millis,
            hal,
            card_detect: None,
            read_pending: AtomicBool::new(false),
            write_pending: AtomicBool::new(false),
        })
    }
}

impl<H: SdmmcHal, CD: InputPin> Sdio<H, CD> {
    pub fn with_card_detect(hal: H, millis: fn() -> u32, card_detect: CD) -> RefCell<Sdio<H, CD>> {
        RefCell::new(Sdio {
            millis,
            hal,
            card_detect: Some(card_detect),
            read_pending: AtomicBool::new(false),
            write_pending: AtomicBool::new(false),
        })
    }

    // The detect switch reads high with a card in the socket; with no switch
    // fitted the card is assumed present.
    pub fn is_card_present(&self) -> bool {
        match &self.card_detect {
            Some(pin) => pin.is_high().unwrap_or(false),
            None => true,
        }
    }

    #[inline(always)]
    pub(crate) fn now(&self) -> u32 {
        (self.millis)()
    }

    pub fn read_pending(&self) -> TransferState {
        if self.read_pending.load(Ordering::Acquire) {
            TransferState::Busy
        } else {
            TransferState::Ready
        }
    }

    pub fn write_pending(&self) -> TransferState {
        if self.write_pending.load(Ordering::Acquire) {
            TransferState::Busy
        } else {
            TransferState::Ready
        }
    }

    pub(crate) fn mark_read_pending(&self) {
        self.read_pending.store(true, Ordering::Release);
    }

    pub(crate) fn mark_write_pending(&self) {
        self.write_pending.store(true, Ordering::Release);
    }

    pub fn complete_read(&self) {
        self.read_pending.store(false, Ordering::Release);
    }

    pub fn complete_write(&self) {
        self.write_pending.store(false, Ordering::Release);
    }

    pub fn handle_sdmmc_interrupt(&mut self) {
        let event = self.hal.service_interrupt();
        self.dispatch(event);
    }

    pub fn handle_dma_rx_interrupt(&mut self) {
        let event = self.hal.service_dma_rx_interrupt();
        self.dispatch(event);
    }

    pub fn handle_dma_tx_interrupt(&mut self) {
        let event = self.hal.service_dma_tx_interrupt();
        self.dispatch(event);
    }

    fn dispatch(&self, event: Option<TransferEvent>) {
        match event {
            Some(TransferEvent::RxComplete) => self.complete_read(),
            Some(TransferEvent::TxComplete) => self.complete_write(),
            None => {},
        }
    }

    pub fn card_info(&mut self) -> CardInfo {
        self.hal.card_info()
    }
}

pub type SdioRef<'s, H, CD = NoCardDetect> = &'s RefCell<Sdio<H, CD>>;
