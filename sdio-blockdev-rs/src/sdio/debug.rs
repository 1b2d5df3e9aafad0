use crate::{
    hal::{
        CardInfo,
        CardState,
        CardType,
        SdVersion,
    },
    hexfmt::hexfmt16,
};
use ufmt::{
    uDebug,
    uDisplay,
    uWrite,
    Formatter,
};

impl uDisplay for SdVersion {
    fn fmt<W>(&self, out: &mut Formatter<W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        match self {
            SdVersion::One => out.write_str("1.0"),
            SdVersion::Two { sdhc: false } => out.write_str("2.0"),
            SdVersion::Two { sdhc: true } => out.write_str("2.0 (SDHC)"),
        }
    }
}

impl uDisplay for CardType {
    fn fmt<W>(&self, out: &mut Formatter<W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        match self {
            CardType::Sdsc => out.write_str("SDSC"),
            CardType::SdhcSdxc => out.write_str("SDHC/SDXC"),
            CardType::Secured => out.write_str("Secured"),
        }
    }
}

impl uDisplay for CardState {
    fn fmt<W>(&self, out: &mut Formatter<W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        match self {
            CardState::Ready => out.write_str("ready"),
            CardState::Identification => out.write_str("identification"),
            CardState::Standby => out.write_str("standby"),
            CardState::Transfer => out.write_str("transfer"),
            CardState::Sending => out.write_str("sending"),
            CardState::Receiving => out.write_str("receiving"),
            CardState::Programming => out.write_str("programming"),
            CardState::Disconnected => out.write_str("disconnected"),
            CardState::Error => out.write_str("error"),
        }
    }
}

impl uDebug for CardInfo {
    fn fmt<W>(&self, out: &mut Formatter<W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        out.write_str("  Card type:        ")?;
        uDisplay::fmt(&self.card_type, out)?;
        out.write_char('\n')?;
        out.write_str("  Card version:     ")?;
        uDisplay::fmt(&self.version(), out)?;
        out.write_char('\n')?;
        out.write_str("  Command classes:  ")?;
        for i in 0..12 {
            out.write_char((((self.command_classes >> (11 - i)) & 0x01) as u8 + b'0') as char)?;
        }
        out.write_char('\n')?;
        out.write_str("  RCA:              ")?;
        hexfmt16(out, self.relative_card_address)?;
        out.write_char('\n')?;
        out.write_str("  Blocks:           ")?;
        uDisplay::fmt(&self.block_count, out)?;
        out.write_str(" x ")?;
        uDisplay::fmt(&self.block_size, out)?;
        out.write_str(" B\n")?;
        out.write_str("  Logical blocks:   ")?;
        uDisplay::fmt(&self.logical_block_count, out)?;
        out.write_str(" x ")?;
        uDisplay::fmt(&self.logical_block_size, out)?;
        out.write_str(" B\n")?;
        out.write_str("  Capacity:         ")?;
        uDisplay::fmt(&self.capacity_mib(), out)?;
        out.write_str(" MiB\n")?;
        Ok(())
    }
}
