use alloc::string::String;
use alloc::string::ToString;
use alloc::vec::Vec;

use crate::block::{padded_byte_len, BLOCK_SIZE};
use crate::error::{Error, Result};
use crate::header::{header_byte_len, parse_header_blocks, Card};
use crate::value::Value;

/// Describes the kind and shape of data in a single HDU.
#[derive(Debug, Clone, PartialEq)]
pub enum HduInfo {
    /// Primary HDU containing image data.
    Primary {
        /// BITPIX value (8, 16, 32, 64, -32, -64).
        bitpix: i64,
        /// Axis dimensions (NAXIS1, NAXIS2, ...).
        naxes: Vec<usize>,
    },
    /// Image extension (XTENSION = 'IMAGE').
    Image {
        /// BITPIX value.
        bitpix: i64,
        /// Axis dimensions.
        naxes: Vec<usize>,
    },
    /// ASCII table extension (XTENSION = 'TABLE').
    AsciiTable {
        /// Row width in bytes.
        naxis1: usize,
        /// Number of rows.
        naxis2: usize,
        /// Number of columns.
        tfields: usize,
    },
    /// Binary table extension (XTENSION = 'BINTABLE').
    BinaryTable {
        /// Row width in bytes.
        naxis1: usize,
        /// Number of rows.
        naxis2: usize,
        /// Size of the variable-length array heap in bytes.
        pcount: usize,
        /// Number of columns.
        tfields: usize,
    },
    /// Random groups structure (primary HDU with GROUPS=T, NAXIS1=0).
    RandomGroups {
        /// BITPIX value.
        bitpix: i64,
        /// Group dimensions (NAXIS2..NAXISm, excluding NAXIS1=0).
        naxes: Vec<usize>,
        /// Number of parameters per group.
        pcount: usize,
        /// Number of groups.
        gcount: usize,
    },
    /// Binary table carrying ZIMAGE=T: a tile-compressed image. The compression
    /// codec itself is out of scope here; this tag only distinguishes the table
    /// from an ordinary [`HduInfo::BinaryTable`] so callers can route it elsewhere.
    ZImage {
        /// Row width in bytes.
        naxis1: usize,
        /// Number of rows (tiles).
        naxis2: usize,
        /// Size of the variable-length array heap in bytes.
        pcount: usize,
        /// Number of columns.
        tfields: usize,
    },
    /// Binary table carrying ZTABLE=T: a compressed representation of another
    /// binary table. Tagged but not decoded, for the same reason as `ZImage`.
    ZTable {
        /// Row width in bytes.
        naxis1: usize,
        /// Number of rows.
        naxis2: usize,
        /// Size of the variable-length array heap in bytes.
        pcount: usize,
        /// Number of columns.
        tfields: usize,
    },
    /// Historical image extension (XTENSION = 'IUEIMAGE'), as used by old IUE
    /// satellite data products. Recognized-but-inert: tagged distinctly from
    /// [`HduInfo::Conform`] but given no dedicated codec, sized by the same
    /// generic formula and left as an opaque byte range.
    IUEImage {
        /// BITPIX value.
        bitpix: i64,
        /// Axis dimensions.
        naxes: Vec<usize>,
        /// Heap / parameter byte count.
        pcount: usize,
        /// Group count.
        gcount: usize,
    },
    /// Historical 3-D table extension (XTENSION = 'A3DTABLE'). Recognized but
    /// inert, same treatment as [`HduInfo::IUEImage`].
    A3DTable {
        /// BITPIX value.
        bitpix: i64,
        /// Axis dimensions.
        naxes: Vec<usize>,
        /// Heap / parameter byte count.
        pcount: usize,
        /// Group count.
        gcount: usize,
    },
    /// Extension carrying a foreign (non-FITS) file verbatim (XTENSION =
    /// 'FOREIGN'). Recognized but inert, same treatment as [`HduInfo::IUEImage`].
    Foreign {
        /// BITPIX value.
        bitpix: i64,
        /// Axis dimensions.
        naxes: Vec<usize>,
        /// Heap / parameter byte count.
        pcount: usize,
        /// Group count.
        gcount: usize,
    },
    /// Opaque memory-dump extension (XTENSION = 'DUMP'). Recognized but inert,
    /// same treatment as [`HduInfo::IUEImage`].
    Dump {
        /// BITPIX value.
        bitpix: i64,
        /// Axis dimensions.
        naxes: Vec<usize>,
        /// Heap / parameter byte count.
        pcount: usize,
        /// Group count.
        gcount: usize,
    },
    /// Any other extension whose XTENSION value is recognized by the FITS
    /// standard but carries no dedicated structured reader here. The data
    /// segment is sized by the generic `|BITPIX|/8 * product(NAXISn) * GCOUNT +
    /// PCOUNT` formula and left as an opaque byte range.
    Conform {
        /// The XTENSION keyword value, trimmed.
        xtension: String,
        /// BITPIX value.
        bitpix: i64,
        /// Axis dimensions.
        naxes: Vec<usize>,
        /// Heap / parameter byte count.
        pcount: usize,
        /// Group count.
        gcount: usize,
    },
}

/// A single Header Data Unit parsed from a FITS byte stream.
#[derive(Debug, Clone)]
pub struct Hdu {
    /// Parsed metadata describing the HDU type and shape.
    pub info: HduInfo,
    /// Byte offset where the header begins in the FITS stream.
    pub header_start: usize,
    /// Byte offset where the data segment begins.
    pub data_start: usize,
    /// Length of the data segment in bytes (unpadded).
    pub data_len: usize,
    /// All header cards parsed from this HDU.
    pub cards: Vec<Card>,
}

/// A collection of HDUs parsed from a complete FITS file.
#[derive(Debug, Clone)]
pub struct FitsData {
    /// All HDUs in the file, with the primary HDU at index 0.
    pub hdus: Vec<Hdu>,
}

impl FitsData {
    /// Returns the primary (first) HDU.
    pub fn primary(&self) -> &Hdu {
        &self.hdus[0]
    }

    /// Returns the HDU at the given index, or `None` if out of bounds.
    pub fn get(&self, index: usize) -> Option<&Hdu> {
        self.hdus.get(index)
    }

    /// Finds the first HDU whose EXTNAME matches `name`.
    pub fn find_by_name(&self, name: &str) -> Option<&Hdu> {
        self.hdus.iter().find(|hdu| {
            card_string_value(&hdu.cards, "EXTNAME")
                .map(|s| s == name)
                .unwrap_or(false)
        })
    }

    /// Returns the number of HDUs.
    pub fn len(&self) -> usize {
        self.hdus.len()
    }

    /// Returns `true` if the file contains no HDUs.
    pub fn is_empty(&self) -> bool {
        self.hdus.is_empty()
    }

    /// Iterates over all HDUs in order.
    pub fn iter(&self) -> impl Iterator<Item = &Hdu> {
        self.hdus.iter()
    }
}

fn card_integer_value(cards: &[Card], keyword: &str) -> Option<i64> {
    cards.iter().find_map(|c| {
        if c.keyword_str() == keyword {
            match &c.value {
                Some(Value::Integer(n)) => Some(*n),
                _ => None,
            }
        } else {
            None
        }
    })
}

fn card_string_value(cards: &[Card], keyword: &str) -> Option<String> {
    cards.iter().find_map(|c| {
        if c.keyword_str() == keyword {
            match &c.value {
                Some(Value::String(s)) => Some(s.trim().into()),
                _ => None,
            }
        } else {
            None
        }
    })
}

fn card_logical_value(cards: &[Card], keyword: &str) -> Option<bool> {
    cards.iter().find_map(|c| {
        if c.keyword_str() == keyword {
            match &c.value {
                Some(Value::Logical(b)) => Some(*b),
                _ => None,
            }
        } else {
            None
        }
    })
}

fn is_primary_hdu(cards: &[Card]) -> bool {
    cards
        .first()
        .map(|c| c.keyword_str() == "SIMPLE")
        .unwrap_or(false)
}

fn compute_data_byte_len(cards: &[Card], is_primary: bool) -> Result<usize> {
    let bitpix = card_integer_value(cards, "BITPIX").ok_or_else(|| Error::KeyNotFound("BITPIX".to_string()))?;
    let naxis = card_integer_value(cards, "NAXIS").ok_or_else(|| Error::KeyNotFound("NAXIS".to_string()))?;
    let naxis = naxis as usize;

    if naxis == 0 {
        return Ok(0);
    }

    let bytes_per_value = (bitpix.unsigned_abs() as usize) / 8;

    let mut dims = Vec::with_capacity(naxis);
    for i in 1..=naxis {
        let kw = alloc::format!("NAXIS{}", i);
        let dim = card_integer_value(cards, &kw).ok_or_else(|| Error::KeyNotFound(kw.clone()))? as usize;
        dims.push(dim);
    }

    // Random groups: primary HDU with NAXIS1=0 and GROUPS=T
    if is_primary && dims[0] == 0 && card_logical_value(cards, "GROUPS") == Some(true) {
        let pcount =
            card_integer_value(cards, "PCOUNT").ok_or_else(|| Error::KeyNotFound("PCOUNT".to_string()))? as usize;
        let gcount =
            card_integer_value(cards, "GCOUNT").ok_or_else(|| Error::KeyNotFound("GCOUNT".to_string()))? as usize;

        // Product of NAXIS2 * NAXIS3 * ... * NAXISm
        let mut product: usize = 1;
        for &d in &dims[1..] {
            product = product
                .checked_mul(d)
                .ok_or_else(|| Error::ShapeMismatch("in-range NAXIS product".to_string(), "overflow".to_string()))?;
        }

        // Nbytes = bytes_per_value * GCOUNT * (PCOUNT + product)
        let group_size = pcount.checked_add(product).ok_or_else(|| {
            Error::ShapeMismatch("in-range group size".to_string(), "overflow".to_string())
        })?;
        let data_bytes = bytes_per_value
            .checked_mul(gcount)
            .and_then(|v| v.checked_mul(group_size))
            .ok_or_else(|| {
                Error::ShapeMismatch("in-range data size".to_string(), "overflow".to_string())
            })?;
        return Ok(data_bytes);
    }

    let total_pixels: usize = dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d)).ok_or_else(|| {
        Error::ShapeMismatch("in-range pixel count".to_string(), "overflow".to_string())
    })?;

    let pcount = if is_primary {
        0
    } else {
        card_integer_value(cards, "PCOUNT").unwrap_or(0) as usize
    };

    let gcount = if is_primary {
        1
    } else {
        let g = card_integer_value(cards, "GCOUNT").unwrap_or(1) as usize;
        if g == 0 {
            1
        } else {
            g
        }
    };

    let data_bytes = gcount
        .checked_mul(
            total_pixels.checked_mul(bytes_per_value).ok_or_else(|| {
                Error::ShapeMismatch("in-range data size".to_string(), "overflow".to_string())
            })?,
        )
        .and_then(|v| {
            gcount
                .checked_mul(pcount)
                .map(|heap| v.checked_add(heap))
        })
        .flatten()
        .ok_or_else(|| Error::ShapeMismatch("in-range data size".to_string(), "overflow".to_string()))?;

    Ok(data_bytes)
}

fn naxes_of(cards: &[Card], naxis: usize) -> Result<Vec<usize>> {
    let mut naxes = Vec::with_capacity(naxis);
    for i in 1..=naxis {
        let kw = alloc::format!("NAXIS{}", i);
        let dim = card_integer_value(cards, &kw).ok_or_else(|| Error::KeyNotFound(kw.clone()))? as usize;
        naxes.push(dim);
    }
    Ok(naxes)
}

/// Dispatch an HDU's cards to a variant, per the three-rule precedence: an
/// XTENSION keyword mapping first, then the Random-groups primary-HDU check,
/// and a data-shape fallback is left to callers constructing from raw data
/// rather than cards (see [`crate::constructor`]).
fn parse_hdu_info(cards: &[Card], is_primary: bool) -> Result<HduInfo> {
    if is_primary {
        let bitpix = card_integer_value(cards, "BITPIX").ok_or_else(|| Error::KeyNotFound("BITPIX".to_string()))?;
        let naxis =
            card_integer_value(cards, "NAXIS").ok_or_else(|| Error::KeyNotFound("NAXIS".to_string()))? as usize;
        let naxes = naxes_of(cards, naxis)?;

        if naxis > 0 && naxes[0] == 0 && card_logical_value(cards, "GROUPS") == Some(true) {
            let pcount = card_integer_value(cards, "PCOUNT")
                .ok_or_else(|| Error::KeyNotFound("PCOUNT".to_string()))? as usize;
            let gcount = card_integer_value(cards, "GCOUNT")
                .ok_or_else(|| Error::KeyNotFound("GCOUNT".to_string()))? as usize;
            return Ok(HduInfo::RandomGroups {
                bitpix,
                naxes: naxes[1..].to_vec(),
                pcount,
                gcount,
            });
        }

        return Ok(HduInfo::Primary { bitpix, naxes });
    }

    let xtension = card_string_value(cards, "XTENSION").ok_or_else(|| Error::KeyNotFound("XTENSION".to_string()))?;
    match xtension.as_str() {
        "IMAGE" => {
            let bitpix =
                card_integer_value(cards, "BITPIX").ok_or_else(|| Error::KeyNotFound("BITPIX".to_string()))?;
            let naxis =
                card_integer_value(cards, "NAXIS").ok_or_else(|| Error::KeyNotFound("NAXIS".to_string()))? as usize;
            let naxes = naxes_of(cards, naxis)?;
            Ok(HduInfo::Image { bitpix, naxes })
        }
        "TABLE" => {
            let naxis1 = card_integer_value(cards, "NAXIS1")
                .ok_or_else(|| Error::KeyNotFound("NAXIS1".to_string()))? as usize;
            let naxis2 = card_integer_value(cards, "NAXIS2")
                .ok_or_else(|| Error::KeyNotFound("NAXIS2".to_string()))? as usize;
            let tfields = card_integer_value(cards, "TFIELDS")
                .ok_or_else(|| Error::KeyNotFound("TFIELDS".to_string()))? as usize;
            Ok(HduInfo::AsciiTable {
                naxis1,
                naxis2,
                tfields,
            })
        }
        "BINTABLE" => {
            let naxis1 = card_integer_value(cards, "NAXIS1")
                .ok_or_else(|| Error::KeyNotFound("NAXIS1".to_string()))? as usize;
            let naxis2 = card_integer_value(cards, "NAXIS2")
                .ok_or_else(|| Error::KeyNotFound("NAXIS2".to_string()))? as usize;
            let pcount = card_integer_value(cards, "PCOUNT")
                .ok_or_else(|| Error::KeyNotFound("PCOUNT".to_string()))? as usize;
            let tfields = card_integer_value(cards, "TFIELDS")
                .ok_or_else(|| Error::KeyNotFound("TFIELDS".to_string()))? as usize;

            if card_logical_value(cards, "ZIMAGE") == Some(true) {
                return Ok(HduInfo::ZImage {
                    naxis1,
                    naxis2,
                    pcount,
                    tfields,
                });
            }
            if card_logical_value(cards, "ZTABLE") == Some(true) {
                return Ok(HduInfo::ZTable {
                    naxis1,
                    naxis2,
                    pcount,
                    tfields,
                });
            }

            Ok(HduInfo::BinaryTable {
                naxis1,
                naxis2,
                pcount,
                tfields,
            })
        }
        // IUEIMAGE, A3DTABLE, FOREIGN, DUMP, and any other conforming XTENSION
        // string: recognized by name but given no structured reader, sized by
        // the generic formula and left opaque.
        other => {
            let bitpix =
                card_integer_value(cards, "BITPIX").ok_or_else(|| Error::KeyNotFound("BITPIX".to_string()))?;
            let naxis =
                card_integer_value(cards, "NAXIS").ok_or_else(|| Error::KeyNotFound("NAXIS".to_string()))? as usize;
            let naxes = naxes_of(cards, naxis)?;
            let pcount = card_integer_value(cards, "PCOUNT").unwrap_or(0) as usize;
            let gcount = {
                let g = card_integer_value(cards, "GCOUNT").unwrap_or(1) as usize;
                if g == 0 {
                    1
                } else {
                    g
                }
            };
            match other {
                "IUEIMAGE" => Ok(HduInfo::IUEImage {
                    bitpix,
                    naxes,
                    pcount,
                    gcount,
                }),
                "A3DTABLE" => Ok(HduInfo::A3DTable {
                    bitpix,
                    naxes,
                    pcount,
                    gcount,
                }),
                "FOREIGN" => Ok(HduInfo::Foreign {
                    bitpix,
                    naxes,
                    pcount,
                    gcount,
                }),
                "DUMP" => Ok(HduInfo::Dump {
                    bitpix,
                    naxes,
                    pcount,
                    gcount,
                }),
                _ => Ok(HduInfo::Conform {
                    xtension: other.to_string(),
                    bitpix,
                    naxes,
                    pcount,
                    gcount,
                }),
            }
        }
    }
}

/// Parse a complete FITS byte stream into a [`FitsData`] containing all HDUs.
pub fn parse_fits(data: &[u8]) -> Result<FitsData> {
    if data.is_empty() {
        return Err(Error::HeaderTruncated);
    }
    if data.len() < BLOCK_SIZE {
        return Err(Error::HeaderTruncated);
    }

    let mut hdus = Vec::new();
    let mut offset: usize = 0;

    while offset < data.len() {
        let remaining = &data[offset..];
        if remaining.len() < BLOCK_SIZE {
            break;
        }

        let header_len = match header_byte_len(remaining) {
            Ok(len) => len,
            Err(_) if !hdus.is_empty() => break,
            Err(e) => return Err(e),
        };
        let header_data = &remaining[..header_len];
        let cards = match parse_header_blocks(header_data) {
            Ok(cards) => cards,
            Err(_) if !hdus.is_empty() => break,
            Err(e) => return Err(e),
        };

        let is_primary = hdus.is_empty() && is_primary_hdu(&cards);
        if hdus.is_empty() && !is_primary {
            return Err(Error::MalformedField(0, "first HDU must be primary".to_string()));
        }

        let info = match parse_hdu_info(&cards, is_primary) {
            Ok(info) => info,
            Err(_) if !hdus.is_empty() => break,
            Err(e) => return Err(e),
        };
        let data_len = match compute_data_byte_len(&cards, is_primary) {
            Ok(len) => len,
            Err(_) if !hdus.is_empty() => break,
            Err(e) => return Err(e),
        };
        let data_start = offset + header_len;

        // Require that all actual data bytes are present, but allow
        // the trailing block padding to be missing.  Many real-world
        // files (HiPS tiles from Aladin/Hipsgen) omit trailing padding.
        if data_len > 0 && data_start + data_len > data.len() {
            return Err(Error::stream_truncated());
        }

        hdus.push(Hdu {
            info,
            header_start: offset,
            data_start,
            data_len,
            cards,
        });

        let padded_data = padded_byte_len(data_len);
        offset = data_start + padded_data;
    }

    if hdus.is_empty() {
        return Err(Error::UnknownHDU);
    }

    Ok(FitsData { hdus })
}
