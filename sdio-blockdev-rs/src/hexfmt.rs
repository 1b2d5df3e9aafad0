use ufmt::{
    uWrite,
    Formatter,
};

fn hexfmt_u8(n: u8) -> u8 {
    match n & 0xf {
        v if v <= 9 => (v as u8) + 48,
        v if v > 9 => (v as u8) + 87,
        _ => 63, // '?'
    }
}

pub(crate) fn hexfmt16<W>(out: &mut Formatter<W>, n: u16) -> Result<(), W::Error>
where
    W: uWrite + ?Sized,
{
    out.write_str("0x")?;
    for shift in [12u16, 8, 4, 0].iter() {
        out.write_char(hexfmt_u8((n >> shift) as u8) as char)?;
    }
    Ok(())
}
