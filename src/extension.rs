//! Extension-header card construction.
//!
//! The mandatory keyword sequence shared by every extension HDU (XTENSION,
//! BITPIX, NAXIS, NAXISn, PCOUNT, GCOUNT) is identical whether the body that
//! follows is an image, an ASCII table, or a binary table; only the XTENSION
//! string and what comes after GCOUNT differ. This module builds that shared
//! prefix so callers can append their own body-specific keywords (TFIELDS,
//! TFORMn, EXTNAME, ...).

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::Result;
use crate::header::Card;
use crate::value::Value;

/// The type of FITS extension, determined by the XTENSION keyword value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionType {
    /// XTENSION = 'IMAGE'.
    Image,
    /// XTENSION = 'TABLE'.
    AsciiTable,
    /// XTENSION = 'BINTABLE'.
    BinaryTable,
}

impl ExtensionType {
    fn as_str(&self) -> &'static str {
        match self {
            ExtensionType::Image => "IMAGE",
            ExtensionType::AsciiTable => "TABLE",
            ExtensionType::BinaryTable => "BINTABLE",
        }
    }
}

fn kw(name: &[u8]) -> [u8; 8] {
    let mut buf = [b' '; 8];
    let len = name.len().min(8);
    buf[..len].copy_from_slice(&name[..len]);
    buf
}

/// Build the mandatory card prefix for an extension header: XTENSION, BITPIX,
/// NAXIS, NAXIS1..NAXISn, PCOUNT, GCOUNT, in that order.
pub fn build_extension_header(
    ext_type: ExtensionType,
    bitpix: i64,
    naxes: &[usize],
    pcount: usize,
    gcount: usize,
) -> Result<Vec<Card>> {
    let naxis = naxes.len();
    let mut cards = Vec::with_capacity(6 + naxis);

    cards.push(Card {
        keyword: kw(b"XTENSION"),
        value: Some(Value::String(String::from(ext_type.as_str()))),
        comment: None,
    });
    cards.push(Card {
        keyword: kw(b"BITPIX"),
        value: Some(Value::Integer(bitpix)),
        comment: None,
    });
    cards.push(Card {
        keyword: kw(b"NAXIS"),
        value: Some(Value::Integer(naxis as i64)),
        comment: None,
    });
    for (i, &dim) in naxes.iter().enumerate() {
        let kw_name = alloc::format!("NAXIS{}", i + 1);
        cards.push(Card {
            keyword: kw(kw_name.as_bytes()),
            value: Some(Value::Integer(dim as i64)),
            comment: None,
        });
    }
    cards.push(Card {
        keyword: kw(b"PCOUNT"),
        value: Some(Value::Integer(pcount as i64)),
        comment: None,
    });
    cards.push(Card {
        keyword: kw(b"GCOUNT"),
        value: Some(Value::Integer(gcount as i64)),
        comment: None,
    });

    Ok(cards)
}
