#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SdmmcSignal {
    D0,
    D1,
    D2,
    D3,
    Ck,
    Cmd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinSpeed {
    Low,
    Medium,
    High,
    VeryHigh,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinPull {
    None,
    Up,
    Down,
}

#[derive(Clone, Copy, Debug)]
pub struct PinAssignment {
    pub port: Port,
    pub pin: u8,
    pub signal: SdmmcSignal,
    pub alternate: u8,
    pub speed: PinSpeed,
    pub pull: PinPull,
}

pub const SDMMC1_AF: u8 = 12;

// SDMMC1 routing: D0-D3 on PC8-PC11, CK on PC12, CMD on PD2.  The card
// supplies its own pull-ups on CMD and the data lines, so none are enabled
// here.
pub const SDMMC1_PINS: [PinAssignment; 6] = [
    PinAssignment {
        port: Port::C,
        pin: 8,
        signal: SdmmcSignal::D0,
        alternate: SDMMC1_AF,
        speed: PinSpeed::VeryHigh,
        pull: PinPull::None,
    },
    PinAssignment {
        port: Port::C,
        pin: 9,
        signal: SdmmcSignal::D1,
        alternate: SDMMC1_AF,
        speed: PinSpeed::VeryHigh,
        pull: PinPull::None,
    },
    PinAssignment {
        port: Port::C,
        pin: 10,
        signal: SdmmcSignal::D2,
        alternate: SDMMC1_AF,
        speed: PinSpeed::VeryHigh,
        pull: PinPull::None,
    },
    PinAssignment {
        port: Port::C,
        pin: 11,
        signal: SdmmcSignal::D3,
        alternate: SDMMC1_AF,
        speed: PinSpeed::VeryHigh,
        pull: PinPull::None,
    },
    PinAssignment {
        port: Port::C,
        pin: 12,
        signal: SdmmcSignal::Ck,
        alternate: SDMMC1_AF,
        speed: PinSpeed::VeryHigh,
        pull: PinPull::None,
    },
    PinAssignment {
        port: Port::D,
        pin: 2,
        signal: SdmmcSignal::Cmd,
        alternate: SDMMC1_AF,
        speed: PinSpeed::VeryHigh,
        pull: PinPull::None,
    },
];
