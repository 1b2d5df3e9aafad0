use embedded_hal::digital::v2::InputPin;
use sdio_blockdev_rs::{
    blockdev::SdioBlockDevice,
    hal::ramcard::RamCardHal,
    sdio::{
        Block,
        Sdio,
        BLOCK_SIZE,
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

struct SocketSwitch {
    inserted: bool,
}

impl InputPin for SocketSwitch {
    type Error = core::convert::Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.inserted)
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(!self.inserted)
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
    let sdio = Sdio::with_card_detect(RamCardHal::new(64), millis, SocketSwitch { inserted: true });
    let mut bd = SdioBlockDevice::new();
    if let Err(e) = bd.init(&sdio) {
        panic!("Block device initialization failed with error code {}", e as u8);
    }
    uwrite!(out, "Device: {} blocks of {} B\n", bd.block_count(), bd.block_size()).unwrap();

    let mut data = [0u8; 4 * BLOCK_SIZE];
    for (i, byte) in data.iter_mut().enumerate() {
        *byte = i as u8;
    }
    let addr = 8 * BLOCK_SIZE as u64;

    if let Err(e) = bd.program(&sdio, &data, addr) {
        panic!("Program failed with error code {}", e as u8);
    }
    let mut readback = Block::zeroed();
    for i in 0..4 {
        let block_addr = addr + (i * BLOCK_SIZE) as u64;
        if let Err(e) = bd.read(&sdio, &mut readback[..], block_addr) {
            panic!("Read failed with error code {}", e as u8);
        }
        if readback[..] != data[i * BLOCK_SIZE..(i + 1) * BLOCK_SIZE] {
            panic!("Read back data does not match what was programmed");
        }
    }
    uwrite!(out, "Programmed and read back {} bytes at address {}\n", data.len(), addr).unwrap();

    if let Err(e) = bd.trim(&sdio, addr, data.len() as u64) {
        panic!("Trim failed with error code {}", e as u8);
    }
    if let Err(e) = bd.read(&sdio, &mut readback[..], addr) {
        panic!("Read after trim failed with error code {}", e as u8);
    }
    if !readback[..].iter().all(|b| *b == 0) {
        panic!("Trimmed region still holds data");
    }
    uwrite!(out, "Trimmed {} bytes at address {}\n", data.len(), addr).unwrap();

    if let Err(e) = bd.deinit(&sdio) {
        panic!("Block device teardown failed with error code {}", e as u8);
    }
    uwrite!(out, "Done\n").unwrap();
}
