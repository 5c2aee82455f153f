//! Per-column field descriptor for binary-table HDUs.
//!
//! Where [`crate::bintable::BinaryColumnDescriptor`] carries just enough to read and
//! write raw cells, `FieldFormat` is the fuller per-column picture the Constructor and
//! Verifier need: the `TFORM` grammar's pointer flag (for P/Q variable-length columns),
//! the column's byte slice within a record, and the display/scale/null annotations
//! (`TUNIT`, `TDISP`, `TDIM`, `TSCAL`, `TZERO`, `TNULL`, `TDMIN`/`TDMAX`, `TLMIN`/`TLMAX`).

use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

use crate::cardstore::CardStore;
use crate::error::{Error, Result};
use crate::header::Card;

/// Element type named by a `TFORM` type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// L -- logical.
    Bool,
    /// X -- bit-packed vector.
    Bit,
    /// B -- unsigned byte.
    UInt8,
    /// I -- 16-bit signed integer.
    Int16,
    /// J -- 32-bit signed integer.
    Int32,
    /// K -- 64-bit signed integer.
    Int64,
    /// A -- ASCII character.
    String,
    /// E -- 32-bit IEEE float.
    Float32,
    /// D -- 64-bit IEEE float.
    Float64,
    /// C -- complex, pair of 32-bit floats.
    Complex64,
    /// M -- complex, pair of 64-bit floats.
    Complex128,
}

impl FieldType {
    /// Map a `TFORM` type-code byte to its element type.
    pub fn from_code(code: u8) -> Result<FieldType> {
        match code {
            b'L' => Ok(FieldType::Bool),
            b'X' => Ok(FieldType::Bit),
            b'B' => Ok(FieldType::UInt8),
            b'I' => Ok(FieldType::Int16),
            b'J' => Ok(FieldType::Int32),
            b'K' => Ok(FieldType::Int64),
            b'A' => Ok(FieldType::String),
            b'E' => Ok(FieldType::Float32),
            b'D' => Ok(FieldType::Float64),
            b'C' => Ok(FieldType::Complex64),
            b'M' => Ok(FieldType::Complex128),
            other => Err(Error::MalformedField(
                0,
                alloc::format!("unknown TFORM type code '{}'", other as char),
            )),
        }
    }

    /// Byte width of a single element, for types where that is type-determined (not
    /// repeat-dependent: bit and string widths depend on repeat count instead).
    fn element_size(self) -> usize {
        match self {
            FieldType::Bool | FieldType::UInt8 | FieldType::String => 1,
            FieldType::Int16 => 2,
            FieldType::Int32 | FieldType::Float32 => 4,
            FieldType::Int64 | FieldType::Float64 | FieldType::Complex64 => 8,
            FieldType::Complex128 => 16,
            FieldType::Bit => 0,
        }
    }

    /// True for numeric types to which a TSCAL/TZERO linear transform may apply.
    pub fn supports_scale(self) -> bool {
        !matches!(self, FieldType::Bool | FieldType::Bit | FieldType::String)
    }
}

/// Width, in bytes, of a variable-length-array pointer descriptor: `(count, offset)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerType {
    /// P -- two 32-bit big-endian words.
    P,
    /// Q -- two 64-bit big-endian words.
    Q,
}

impl PointerType {
    /// Total on-disk byte width of the `(count, offset)` pair.
    pub fn byte_width(self) -> usize {
        match self {
            PointerType::P => 8,
            PointerType::Q => 16,
        }
    }
}

/// Byte range of one field within a single record, 1-based per the FITS convention,
/// stored here as a half-open `[begin, end)` 0-based pair for Rust-native slicing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub begin: usize,
    pub end: usize,
}

impl Slice {
    pub fn width(&self) -> usize {
        self.end - self.begin
    }
}

/// Full per-column descriptor for a binary-table field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFormat {
    /// Column name, from `TTYPEn` (trimmed) or a synthesized `column{n}`/`field{n}`.
    pub name: String,
    /// Variable-array pointer width, if this column's `TFORM` carries a P/Q flag.
    pub pntr: Option<PointerType>,
    /// Element type.
    pub element_type: FieldType,
    /// Byte range within one record.
    pub slice: Slice,
    /// Repeat count (element count per cell; for pointer columns, always 1 after the
    /// repeat ∉ {0,1} clamp).
    pub leng: usize,
    /// `TUNIT`: physical unit string.
    pub unit: Option<String>,
    /// `TDISP`: display format hint.
    pub disp: Option<String>,
    /// `TDIM`: reshape dimensions for a multi-dimensional cell.
    pub dim: Option<String>,
    /// `TZERO`: additive offset applied as `zero + scale * value`. Absent (no
    /// transform) for Bool/Bit/String columns.
    pub zero: Option<f64>,
    /// `TSCAL`: multiplicative scale. Absent for Bool/Bit/String columns.
    pub scale: Option<f64>,
    /// `TNULL`: integer sentinel for a missing value.
    pub null: Option<i64>,
    /// `TDMIN`/`TDMAX`: declared data bounds.
    pub dmin: Option<f64>,
    pub dmax: Option<f64>,
    /// `TLMIN`/`TLMAX`: declared physical bounds.
    pub lmin: Option<f64>,
    pub lmax: Option<f64>,
}

/// Parse one `TFORM` value against the grammar `(\d*)([PQ]?)([LXBIJKAEDCM])(\(.*\))?`.
///
/// Returns `(repeat, pointer, element_type)`. The trailing parenthesized payload (an
/// array-descriptor hint for P/Q columns) is accepted but discarded; it is opaque at
/// this layer.
pub fn parse_tform(tform: &str) -> Result<(usize, Option<PointerType>, FieldType)> {
    let s = tform.trim();
    if s.is_empty() {
        return Err(Error::MalformedField(0, "empty TFORM".to_string()));
    }
    let s = match s.find('(') {
        Some(paren) => &s[..paren],
        None => s,
    };
    if s.is_empty() {
        return Err(Error::MalformedField(0, "empty TFORM".to_string()));
    }

    let bytes = s.as_bytes();
    let type_code = bytes[bytes.len() - 1];

    // A pointer flag is a P or Q immediately before the type code.
    let (pntr, digits_end) = if bytes.len() >= 2
        && (bytes[bytes.len() - 2] == b'P' || bytes[bytes.len() - 2] == b'Q')
    {
        let pntr = if bytes[bytes.len() - 2] == b'P' {
            PointerType::P
        } else {
            PointerType::Q
        };
        (Some(pntr), bytes.len() - 2)
    } else {
        (None, bytes.len() - 1)
    };

    let element_type = FieldType::from_code(type_code)?;

    let digits = &s[..digits_end];
    let mut repeat = if digits.is_empty() {
        1
    } else {
        digits
            .parse::<usize>()
            .map_err(|_| Error::MalformedField(0, alloc::format!("invalid repeat count '{digits}'")))?
    };

    // Pointer columns only ever hold 0 or 1 logical array per cell; repeat outside
    // that range is clamped to 1 per the FieldFormat builder contract.
    if pntr.is_some() && repeat != 0 && repeat != 1 {
        repeat = 1;
    }

    Ok((repeat, pntr, element_type))
}

/// Byte width of one cell (not counting heap payload for pointer columns, which
/// contribute only their fixed `(count, offset)` width to the record).
fn cell_width(repeat: usize, pntr: Option<PointerType>, element_type: FieldType) -> usize {
    if let Some(p) = pntr {
        return p.byte_width();
    }
    match element_type {
        FieldType::Bit => repeat.div_ceil(8),
        FieldType::String => repeat,
        other => repeat * other.element_size(),
    }
}

/// Build the `FieldFormat` list for a binary table's `TFIELDS` columns from header
/// cards, assigning contiguous byte slices in declaration order starting at byte 0.
pub fn fields_from_cards(cards: &[Card], tfields: usize) -> Result<Vec<FieldFormat>> {
    let store = CardStore::new(cards.to_vec());
    let mut fields = Vec::with_capacity(tfields);
    let mut offset = 0usize;

    for j in 1..=tfields {
        let tform_key = alloc::format!("TFORM{j}");
        let tform = store
            .get_string(&tform_key)
            .ok_or_else(|| Error::KeyNotFound(tform_key.clone()))?;
        let (repeat, pntr, element_type) = parse_tform(&tform)?;
        let width = cell_width(repeat, pntr, element_type);

        let name = store
            .get_string(&alloc::format!("TTYPE{j}"))
            .unwrap_or_else(|| alloc::format!("column{j}"));

        let (zero, scale) = if element_type.supports_scale() {
            (
                store.get_float(&alloc::format!("TZERO{j}")),
                store.get_float(&alloc::format!("TSCAL{j}")),
            )
        } else {
            (None, None)
        };

        fields.push(FieldFormat {
            name,
            pntr,
            element_type,
            slice: Slice {
                begin: offset,
                end: offset + width,
            },
            leng: repeat,
            unit: store.get_string(&alloc::format!("TUNIT{j}")),
            disp: store.get_string(&alloc::format!("TDISP{j}")),
            dim: store.get_string(&alloc::format!("TDIM{j}")),
            zero,
            scale,
            null: store.get_integer(&alloc::format!("TNULL{j}")),
            dmin: store.get_float(&alloc::format!("TDMIN{j}")),
            dmax: store.get_float(&alloc::format!("TDMAX{j}")),
            lmin: store.get_float(&alloc::format!("TLMIN{j}")),
            lmax: store.get_float(&alloc::format!("TLMAX{j}")),
        });

        offset += width;
    }

    Ok(fields)
}

/// Total record length in bytes: the sum of every field's byte width.
pub fn record_length(fields: &[FieldFormat]) -> usize {
    fields.iter().map(|f| f.slice.width()).sum()
}

/// Unpack `count` logical bits from a `TFORM='X'` cell into a `bool` vector.
///
/// Bit `i` of the logical vector lives in bit `7 - (i % 8)` of byte `i / 8`. Any
/// padding bits past `count` in the final byte are ignored.
pub fn unpack_bits(bytes: &[u8], count: usize) -> Vec<bool> {
    let mut bits = Vec::with_capacity(count);
    for i in 0..count {
        let byte = bytes[i / 8];
        let bit = (byte >> (7 - (i % 8))) & 1;
        bits.push(bit != 0);
    }
    bits
}

/// Pack a `bool` vector into the `⌈count/8⌉`-byte cell a `TFORM='X'` column expects.
/// Unused trailing bits in the final byte are zero.
pub fn pack_bits(bits: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; bits.len().div_ceil(8)];
    for (i, &bit) in bits.iter().enumerate() {
        if bit {
            bytes[i / 8] |= 1 << (7 - (i % 8));
        }
    }
    bytes
}
