#![no_std]

pub mod blockdev;
pub mod hal;
mod hexfmt;
pub mod pins;
pub mod sdio;
