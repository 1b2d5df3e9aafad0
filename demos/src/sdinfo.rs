use sdio_blockdev_rs::{
    hal::{
        ramcard::RamCardHal,
        SdmmcHal,
    },
    sdio::{
        Sdio,
        TransferState,
    },
};
use std::time::{
    SystemTime,
    UNIX_EPOCH,
};
use ufmt::uwrite;

struct Stdout;

impl ufmt::uWrite for Stdout {
    type Error = core::convert::Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        print!("{}", s);
        Ok(())
    }
}

fn millis() -> u32 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_millis() as u32,
        Err(_) => 0,
    }
}

fn main() {
    let mut out = Stdout;
    let mut hal = RamCardHal::new(16384);
    uwrite!(out, "Card state before bringup: {}\n", hal.card_state()).unwrap();

    let sdio = Sdio::new(hal, millis);
    if let Err(e) = sdio.borrow_mut().init() {
        panic!("Sdio initialization failed with error code {}", e as u8);
    }

    let info = sdio.borrow_mut().card_info();
    uwrite!(out, "\nCardInfo:\n").unwrap();
    uwrite!(out, "{:?}", info).unwrap();

    let ready = match sdio.borrow_mut().transfer_state() {
        TransferState::Ready => "ready for data",
        TransferState::Busy => "busy",
    };
    uwrite!(out, "\nCard is {}\n", ready).unwrap();
}
