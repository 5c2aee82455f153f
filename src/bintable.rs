//! FITS binary table extension reading and writing.

use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

use crate::block::padded_byte_len;
use crate::cardstore::CardStore;
use crate::dataformat::DataFormat;
use crate::endian::{
    read_f32_be, read_f64_be, read_i16_be, read_i32_be, read_i64_be, write_f32_be, write_f64_be,
    write_i16_be, write_i32_be, write_i64_be,
};
use crate::error::{Error, Result};
use crate::fieldformat::{FieldType, PointerType};
use crate::hdu::{Hdu, HduInfo};
use crate::header::{serialize_header, Card};
use crate::heap::{read_payload, HeapPayload, HeapWriter};
use crate::value::Value;

/// The data type of a column in a FITS binary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryColumnType {
    /// L -- logical, stored as a single byte (T/F/0).
    Logical,
    /// X -- bit array.
    Bit,
    /// B -- unsigned byte.
    Byte,
    /// I -- 16-bit signed integer.
    Short,
    /// J -- 32-bit signed integer.
    Int,
    /// K -- 64-bit signed integer.
    Long,
    /// E -- 32-bit IEEE float.
    Float,
    /// D -- 64-bit IEEE float.
    Double,
    /// C -- complex: pair of 32-bit IEEE floats.
    ComplexFloat,
    /// M -- complex: pair of 64-bit IEEE floats.
    ComplexDouble,
    /// A -- ASCII character.
    Ascii,
    /// P -- 32-bit variable-length array descriptor (8 bytes: count + heap offset).
    VarArrayP,
    /// Q -- 64-bit variable-length array descriptor (16 bytes: count + heap offset).
    VarArrayQ,
}

/// Describes one column in a binary table.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryColumnDescriptor {
    /// Column name (from TTYPEn), if present.
    pub name: Option<String>,
    /// Repeat count from TFORMn.
    pub repeat: usize,
    /// The element data type.
    pub col_type: BinaryColumnType,
    /// For `VarArrayP`/`VarArrayQ` columns, the pointee element type read out of the
    /// heap (the type code following the `P`/`Q` flag in the `TFORM` string). `None`
    /// for every other column.
    pub elem_type: Option<BinaryColumnType>,
    /// Total bytes this column occupies per row.
    pub byte_width: usize,
}

/// Column data extracted from a binary table.
#[derive(Debug, Clone, PartialEq)]
pub enum BinaryColumnData {
    Logical(Vec<bool>),
    Byte(Vec<u8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    ComplexFloat(Vec<(f32, f32)>),
    ComplexDouble(Vec<(f64, f64)>),
    Ascii(Vec<String>),
    Bit(Vec<Vec<u8>>),
    /// One variable-length heap payload per row, for `VarArrayP`/`VarArrayQ` columns.
    VarArray(Vec<crate::heap::HeapPayload>),
}

/// Return the number of bytes per single element for a column type.
///
/// For `Bit`, this returns 0 because bit columns use a special formula
/// based on repeat count (ceil(repeat / 8)).
pub fn binary_type_byte_size(col_type: &BinaryColumnType) -> usize {
    match col_type {
        BinaryColumnType::Logical => 1,
        BinaryColumnType::Bit => 0,
        BinaryColumnType::Byte => 1,
        BinaryColumnType::Short => 2,
        BinaryColumnType::Int => 4,
        BinaryColumnType::Long => 8,
        BinaryColumnType::Float => 4,
        BinaryColumnType::Double => 8,
        BinaryColumnType::ComplexFloat => 8,
        BinaryColumnType::ComplexDouble => 16,
        BinaryColumnType::Ascii => 1,
        BinaryColumnType::VarArrayP => 8,
        BinaryColumnType::VarArrayQ => 16,
    }
}

/// Parse a TFORMn value like "1J", "10E", "20A", "1024X", "1PB(200)", "1QJ".
///
/// Returns the repeat count, the column type, and — for `VarArrayP`/`VarArrayQ`
/// columns — the pointee element type read out of the heap.
pub fn parse_tform_binary(
    s: &str,
) -> Result<(usize, BinaryColumnType, Option<BinaryColumnType>)> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::MalformedField(0, "invalid value".to_string()));
    }

    // Strip optional (maxlen) suffix for variable-length arrays.
    let s = if let Some(paren) = s.find('(') {
        &s[..paren]
    } else {
        s
    };

    // Check for P/Q variable-length array descriptors: rPt or rQt
    // where r is repeat count, P/Q is the descriptor type, t is element type code.
    if s.len() >= 2 {
        let bytes = s.as_bytes();
        let last = bytes[s.len() - 1];
        let second_last = bytes[s.len() - 2];
        if second_last == b'P' || second_last == b'Q' {
            let pointee = match last {
                b'L' => BinaryColumnType::Logical,
                b'X' => BinaryColumnType::Bit,
                b'B' => BinaryColumnType::Byte,
                b'I' => BinaryColumnType::Short,
                b'J' => BinaryColumnType::Int,
                b'K' => BinaryColumnType::Long,
                b'E' => BinaryColumnType::Float,
                b'D' => BinaryColumnType::Double,
                b'C' => BinaryColumnType::ComplexFloat,
                b'M' => BinaryColumnType::ComplexDouble,
                b'A' => BinaryColumnType::Ascii,
                _ => return Err(Error::MalformedField(0, "invalid value".to_string())),
            };
            let repeat_str = &s[..s.len() - 2];
            let repeat = if repeat_str.is_empty() {
                1
            } else {
                repeat_str
                    .parse::<usize>()
                    .map_err(|_| Error::MalformedField(0, "invalid value".to_string()))?
            };
            let col_type = if second_last == b'P' {
                BinaryColumnType::VarArrayP
            } else {
                BinaryColumnType::VarArrayQ
            };
            return Ok((repeat, col_type, Some(pointee)));
        }
    }

    // Find the last character, which is the type code.
    let type_char = s.as_bytes()[s.len() - 1];
    let repeat_str = &s[..s.len() - 1];

    let repeat = if repeat_str.is_empty() {
        1
    } else {
        repeat_str
            .parse::<usize>()
            .map_err(|_| Error::MalformedField(0, "invalid value".to_string()))?
    };

    let col_type = match type_char {
        b'L' => BinaryColumnType::Logical,
        b'X' => BinaryColumnType::Bit,
        b'B' => BinaryColumnType::Byte,
        b'I' => BinaryColumnType::Short,
        b'J' => BinaryColumnType::Int,
        b'K' => BinaryColumnType::Long,
        b'E' => BinaryColumnType::Float,
        b'D' => BinaryColumnType::Double,
        b'C' => BinaryColumnType::ComplexFloat,
        b'M' => BinaryColumnType::ComplexDouble,
        b'A' => BinaryColumnType::Ascii,
        _ => return Err(Error::MalformedField(0, "invalid value".to_string())),
    };

    Ok((repeat, col_type, None))
}

/// Compute the byte width of a column given its repeat count and type.
fn compute_byte_width(repeat: usize, col_type: &BinaryColumnType) -> usize {
    match col_type {
        BinaryColumnType::Bit => repeat.div_ceil(8),
        // VarArray descriptors have a fixed size regardless of repeat count
        BinaryColumnType::VarArrayP => 8 * repeat,
        BinaryColumnType::VarArrayQ => 16 * repeat,
        _ => repeat * binary_type_byte_size(col_type),
    }
}

fn make_keyword(name: &str) -> [u8; 8] {
    let mut k = [b' '; 8];
    let bytes = name.as_bytes();
    let len = bytes.len().min(8);
    k[..len].copy_from_slice(&bytes[..len]);
    k
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

/// Extract binary table column descriptors from header cards.
pub fn parse_binary_table_columns(
    cards: &[Card],
    tfields: usize,
) -> Result<Vec<BinaryColumnDescriptor>> {
    let mut columns = Vec::with_capacity(tfields);

    for i in 1..=tfields {
        let tform_key = alloc::format!("TFORM{}", i);
        let tform_str =
            card_string_value(cards, &tform_key).ok_or_else(|| Error::KeyNotFound(tform_key.clone()))?;
        let (repeat, col_type, elem_type) = parse_tform_binary(&tform_str)?;

        let ttype_key = alloc::format!("TTYPE{}", i);
        let name = card_string_value(cards, &ttype_key);

        let byte_width = compute_byte_width(repeat, &col_type);

        columns.push(BinaryColumnDescriptor {
            name,
            repeat,
            col_type,
            elem_type,
            byte_width,
        });
    }

    Ok(columns)
}

/// Map a column's own `BinaryColumnType` (used as a `VarArrayP`/`VarArrayQ` pointee) to
/// the `FieldType` the heap codec expects.
fn field_type_of(col_type: BinaryColumnType) -> Result<FieldType> {
    Ok(match col_type {
        BinaryColumnType::Logical => FieldType::Bool,
        BinaryColumnType::Bit => FieldType::Bit,
        BinaryColumnType::Byte => FieldType::UInt8,
        BinaryColumnType::Short => FieldType::Int16,
        BinaryColumnType::Int => FieldType::Int32,
        BinaryColumnType::Long => FieldType::Int64,
        BinaryColumnType::Float => FieldType::Float32,
        BinaryColumnType::Double => FieldType::Float64,
        BinaryColumnType::ComplexFloat => FieldType::Complex64,
        BinaryColumnType::ComplexDouble => FieldType::Complex128,
        BinaryColumnType::Ascii => FieldType::String,
        BinaryColumnType::VarArrayP | BinaryColumnType::VarArrayQ => {
            return Err(Error::MalformedField(0, "invalid value".to_string()))
        }
    })
}

/// Byte offset of the heap region from the start of the FITS stream: `THEAP` if the
/// card is present, otherwise immediately after the fixed-record area.
fn heap_base_of(cards: &[Card], data_start: usize, naxis1: usize, naxis2: usize, pcount: usize) -> usize {
    let store = CardStore::new(cards.to_vec());
    let theap = store.get_integer("THEAP").map(|v| v as usize);
    let geometry = DataFormat::for_bintable(naxis1, naxis2, pcount, 1, theap);
    data_start + geometry.heap
}

/// Extract the binary table metadata from an HDU, returning (naxis1, naxis2, pcount,
/// heap_base, columns).
fn extract_table_info(
    fits_data: &[u8],
    hdu: &Hdu,
) -> Result<(usize, usize, usize, usize, Vec<BinaryColumnDescriptor>)> {
    let (naxis1, naxis2, pcount, tfields) = match &hdu.info {
        HduInfo::BinaryTable {
            naxis1,
            naxis2,
            pcount,
            tfields,
        } => (*naxis1, *naxis2, *pcount, *tfields),
        _ => return Err(Error::MalformedField(0, "not a binary table HDU".to_string())),
    };

    if hdu.data_start + naxis1 * naxis2 > fits_data.len() {
        return Err(Error::stream_truncated());
    }

    let columns = parse_binary_table_columns(&hdu.cards, tfields)?;
    let heap_base = heap_base_of(&hdu.cards, hdu.data_start, naxis1, naxis2, pcount);
    Ok((naxis1, naxis2, pcount, heap_base, columns))
}

/// Compute byte offsets for each column within a row.
fn column_offsets(columns: &[BinaryColumnDescriptor]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(columns.len());
    let mut offset = 0usize;
    for col in columns {
        offsets.push(offset);
        offset += col.byte_width;
    }
    offsets
}

/// Read a single column from all rows of a binary table HDU.
pub fn read_binary_column(
    fits_data: &[u8],
    hdu: &Hdu,
    col_index: usize,
) -> Result<BinaryColumnData> {
    let (naxis1, naxis2, _pcount, heap_base, columns) = extract_table_info(fits_data, hdu)?;

    if col_index >= columns.len() {
        return Err(Error::MalformedField(0, "invalid value".to_string()));
    }

    let offsets = column_offsets(&columns);
    let col = &columns[col_index];
    let col_offset = offsets[col_index];
    let data_start = hdu.data_start;

    read_column_cells(fits_data, data_start, heap_base, naxis1, naxis2, col, col_offset)
}

fn read_column_cells(
    fits_data: &[u8],
    data_start: usize,
    heap_base: usize,
    naxis1: usize,
    naxis2: usize,
    col: &BinaryColumnDescriptor,
    col_offset: usize,
) -> Result<BinaryColumnData> {
    match col.col_type {
        BinaryColumnType::VarArrayP | BinaryColumnType::VarArrayQ => {
            let pntr = if col.col_type == BinaryColumnType::VarArrayP {
                PointerType::P
            } else {
                PointerType::Q
            };
            let elem_type = col
                .elem_type
                .ok_or_else(|| Error::MalformedField(0, "invalid value".to_string()))?;
            let field_type = field_type_of(elem_type)?;
            let mut payloads = Vec::with_capacity(naxis2);
            for row in 0..naxis2 {
                let base = data_start + row * naxis1 + col_offset;
                let cell_width = pntr.byte_width();
                let cell = &fits_data[base..base + cell_width];
                let ptr = crate::heap::read_pointer(cell, pntr)?;
                let payload = read_payload(fits_data, heap_base, ptr, field_type)?;
                payloads.push(payload);
            }
            Ok(BinaryColumnData::VarArray(payloads))
        }
        BinaryColumnType::Logical => {
            let mut values = Vec::with_capacity(naxis2 * col.repeat);
            for row in 0..naxis2 {
                let base = data_start + row * naxis1 + col_offset;
                for r in 0..col.repeat {
                    let b = fits_data[base + r];
                    values.push(b == b'T');
                }
            }
            Ok(BinaryColumnData::Logical(values))
        }
        BinaryColumnType::Byte => {
            let mut values = Vec::with_capacity(naxis2 * col.repeat);
            for row in 0..naxis2 {
                let base = data_start + row * naxis1 + col_offset;
                for r in 0..col.repeat {
                    values.push(fits_data[base + r]);
                }
            }
            Ok(BinaryColumnData::Byte(values))
        }
        BinaryColumnType::Short => {
            let mut values = Vec::with_capacity(naxis2 * col.repeat);
            for row in 0..naxis2 {
                let base = data_start + row * naxis1 + col_offset;
                for r in 0..col.repeat {
                    let off = base + r * 2;
                    values.push(read_i16_be(&fits_data[off..]));
                }
            }
            Ok(BinaryColumnData::Short(values))
        }
        BinaryColumnType::Int => {
            let mut values = Vec::with_capacity(naxis2 * col.repeat);
            for row in 0..naxis2 {
                let base = data_start + row * naxis1 + col_offset;
                for r in 0..col.repeat {
                    let off = base + r * 4;
                    values.push(read_i32_be(&fits_data[off..]));
                }
            }
            Ok(BinaryColumnData::Int(values))
        }
        BinaryColumnType::Long => {
            let mut values = Vec::with_capacity(naxis2 * col.repeat);
            for row in 0..naxis2 {
                let base = data_start + row * naxis1 + col_offset;
                for r in 0..col.repeat {
                    let off = base + r * 8;
                    values.push(read_i64_be(&fits_data[off..]));
                }
            }
            Ok(BinaryColumnData::Long(values))
        }
        BinaryColumnType::Float => {
            let mut values = Vec::with_capacity(naxis2 * col.repeat);
            for row in 0..naxis2 {
                let base = data_start + row * naxis1 + col_offset;
                for r in 0..col.repeat {
                    let off = base + r * 4;
                    values.push(read_f32_be(&fits_data[off..]));
                }
            }
            Ok(BinaryColumnData::Float(values))
        }
        BinaryColumnType::Double => {
            let mut values = Vec::with_capacity(naxis2 * col.repeat);
            for row in 0..naxis2 {
                let base = data_start + row * naxis1 + col_offset;
                for r in 0..col.repeat {
                    let off = base + r * 8;
                    values.push(read_f64_be(&fits_data[off..]));
                }
            }
            Ok(BinaryColumnData::Double(values))
        }
        BinaryColumnType::ComplexFloat => {
            let mut values = Vec::with_capacity(naxis2 * col.repeat);
            for row in 0..naxis2 {
                let base = data_start + row * naxis1 + col_offset;
                for r in 0..col.repeat {
                    let off = base + r * 8;
                    let re = read_f32_be(&fits_data[off..]);
                    let im = read_f32_be(&fits_data[off + 4..]);
                    values.push((re, im));
                }
            }
            Ok(BinaryColumnData::ComplexFloat(values))
        }
        BinaryColumnType::ComplexDouble => {
            let mut values = Vec::with_capacity(naxis2 * col.repeat);
            for row in 0..naxis2 {
                let base = data_start + row * naxis1 + col_offset;
                for r in 0..col.repeat {
                    let off = base + r * 16;
                    let re = read_f64_be(&fits_data[off..]);
                    let im = read_f64_be(&fits_data[off + 8..]);
                    values.push((re, im));
                }
            }
            Ok(BinaryColumnData::ComplexDouble(values))
        }
        BinaryColumnType::Ascii => {
            let mut values = Vec::with_capacity(naxis2);
            for row in 0..naxis2 {
                let base = data_start + row * naxis1 + col_offset;
                let bytes = &fits_data[base..base + col.repeat];
                let s = core::str::from_utf8(bytes)
                    .map_err(|_| Error::MalformedField(0, "invalid value".to_string()))?
                    .trim_end()
                    .into();
                values.push(s);
            }
            Ok(BinaryColumnData::Ascii(values))
        }
        BinaryColumnType::Bit => {
            let bytes_per_row = col.repeat.div_ceil(8);
            let mut values = Vec::with_capacity(naxis2);
            for row in 0..naxis2 {
                let base = data_start + row * naxis1 + col_offset;
                let bytes = fits_data[base..base + bytes_per_row].to_vec();
                values.push(bytes);
            }
            Ok(BinaryColumnData::Bit(values))
        }
    }
}

/// Read all columns for a single row of a binary table.
pub fn read_binary_row(
    fits_data: &[u8],
    hdu: &Hdu,
    row_index: usize,
) -> Result<Vec<BinaryColumnData>> {
    let (naxis1, naxis2, _pcount, heap_base, columns) = extract_table_info(fits_data, hdu)?;

    if row_index >= naxis2 {
        return Err(Error::MalformedField(0, "invalid value".to_string()));
    }

    let offsets = column_offsets(&columns);
    let data_start = hdu.data_start;
    let mut result = Vec::with_capacity(columns.len());

    for (i, col) in columns.iter().enumerate() {
        let col_offset = offsets[i];
        let cell = read_column_cells(
            fits_data,
            data_start,
            heap_base,
            naxis1,
            1,
            col,
            col_offset + row_index * naxis1,
        )?;
        result.push(cell);
    }

    Ok(result)
}

/// Serialize a single cell (one column, one row) to big-endian bytes.
pub fn serialize_binary_column_value(
    col_type: &BinaryColumnType,
    repeat: usize,
    data: &BinaryColumnData,
    row_index: usize,
) -> Result<Vec<u8>> {
    match (col_type, data) {
        (BinaryColumnType::Logical, BinaryColumnData::Logical(vals)) => {
            let start = row_index * repeat;
            let mut out = vec![0u8; repeat];
            for i in 0..repeat {
                out[i] = if vals[start + i] { b'T' } else { b'F' };
            }
            Ok(out)
        }
        (BinaryColumnType::Byte, BinaryColumnData::Byte(vals)) => {
            let start = row_index * repeat;
            Ok(vals[start..start + repeat].to_vec())
        }
        (BinaryColumnType::Short, BinaryColumnData::Short(vals)) => {
            let start = row_index * repeat;
            let mut out = vec![0u8; repeat * 2];
            for i in 0..repeat {
                write_i16_be(&mut out[i * 2..], vals[start + i]);
            }
            Ok(out)
        }
        (BinaryColumnType::Int, BinaryColumnData::Int(vals)) => {
            let start = row_index * repeat;
            let mut out = vec![0u8; repeat * 4];
            for i in 0..repeat {
                write_i32_be(&mut out[i * 4..], vals[start + i]);
            }
            Ok(out)
        }
        (BinaryColumnType::Long, BinaryColumnData::Long(vals)) => {
            let start = row_index * repeat;
            let mut out = vec![0u8; repeat * 8];
            for i in 0..repeat {
                write_i64_be(&mut out[i * 8..], vals[start + i]);
            }
            Ok(out)
        }
        (BinaryColumnType::Float, BinaryColumnData::Float(vals)) => {
            let start = row_index * repeat;
            let mut out = vec![0u8; repeat * 4];
            for i in 0..repeat {
                write_f32_be(&mut out[i * 4..], vals[start + i]);
            }
            Ok(out)
        }
        (BinaryColumnType::Double, BinaryColumnData::Double(vals)) => {
            let start = row_index * repeat;
            let mut out = vec![0u8; repeat * 8];
            for i in 0..repeat {
                write_f64_be(&mut out[i * 8..], vals[start + i]);
            }
            Ok(out)
        }
        (BinaryColumnType::ComplexFloat, BinaryColumnData::ComplexFloat(vals)) => {
            let start = row_index * repeat;
            let mut out = vec![0u8; repeat * 8];
            for i in 0..repeat {
                let (re, im) = vals[start + i];
                write_f32_be(&mut out[i * 8..], re);
                write_f32_be(&mut out[i * 8 + 4..], im);
            }
            Ok(out)
        }
        (BinaryColumnType::ComplexDouble, BinaryColumnData::ComplexDouble(vals)) => {
            let start = row_index * repeat;
            let mut out = vec![0u8; repeat * 16];
            for i in 0..repeat {
                let (re, im) = vals[start + i];
                write_f64_be(&mut out[i * 16..], re);
                write_f64_be(&mut out[i * 16 + 8..], im);
            }
            Ok(out)
        }
        (BinaryColumnType::Ascii, BinaryColumnData::Ascii(vals)) => {
            let mut out = vec![b' '; repeat];
            let s = vals[row_index].as_bytes();
            let len = s.len().min(repeat);
            out[..len].copy_from_slice(&s[..len]);
            Ok(out)
        }
        (BinaryColumnType::Bit, BinaryColumnData::Bit(vals)) => Ok(vals[row_index].clone()),
        // VarArrayP/VarArrayQ cells are written by `serialize_binary_table` directly
        // against a shared `HeapWriter`, since a pointer's offset depends on every
        // prior row's heap payload and can't be produced from one cell in isolation.
        _ => Err(Error::MalformedField(0, "invalid value".to_string())),
    }
}

fn type_code(col_type: BinaryColumnType) -> char {
    match col_type {
        BinaryColumnType::Logical => 'L',
        BinaryColumnType::Bit => 'X',
        BinaryColumnType::Byte => 'B',
        BinaryColumnType::Short => 'I',
        BinaryColumnType::Int => 'J',
        BinaryColumnType::Long => 'K',
        BinaryColumnType::Float => 'E',
        BinaryColumnType::Double => 'D',
        BinaryColumnType::ComplexFloat => 'C',
        BinaryColumnType::ComplexDouble => 'M',
        BinaryColumnType::Ascii => 'A',
        BinaryColumnType::VarArrayP => 'P',
        BinaryColumnType::VarArrayQ => 'Q',
    }
}

fn tform_string(col: &BinaryColumnDescriptor) -> String {
    let ch = type_code(col.col_type);
    match (col.col_type, col.elem_type) {
        (BinaryColumnType::VarArrayP, Some(elem)) | (BinaryColumnType::VarArrayQ, Some(elem)) => {
            alloc::format!("{}{}{}", col.repeat, ch, type_code(elem))
        }
        _ => alloc::format!("{}{}", col.repeat, ch),
    }
}

fn make_card(keyword: &str, value: Value) -> Card {
    Card {
        keyword: make_keyword(keyword),
        value: Some(value),
        comment: None,
    }
}

/// Build the full set of header cards for a binary table extension.
pub fn build_binary_table_cards(
    columns: &[BinaryColumnDescriptor],
    naxis2: usize,
    pcount: usize,
) -> Result<Vec<Card>> {
    let naxis1: usize = columns.iter().map(|c| c.byte_width).sum();
    let tfields = columns.len();

    let mut cards = vec![
        make_card("XTENSION", Value::String(String::from("BINTABLE"))),
        make_card("BITPIX", Value::Integer(8)),
        make_card("NAXIS", Value::Integer(2)),
        make_card("NAXIS1", Value::Integer(naxis1 as i64)),
        make_card("NAXIS2", Value::Integer(naxis2 as i64)),
        make_card("PCOUNT", Value::Integer(pcount as i64)),
        make_card("GCOUNT", Value::Integer(1)),
        make_card("TFIELDS", Value::Integer(tfields as i64)),
    ];

    for (i, col) in columns.iter().enumerate() {
        let n = i + 1;
        let tform = tform_string(col);
        let tform_kw = alloc::format!("TFORM{}", n);
        cards.push(make_card(&tform_kw, Value::String(tform)));

        if let Some(ref name) = col.name {
            let ttype_kw = alloc::format!("TTYPE{}", n);
            cards.push(make_card(&ttype_kw, Value::String(name.clone())));
        }
    }

    Ok(cards)
}

/// Write one VarArrayP/VarArrayQ cell's pointer into the fixed-record area, accumulating
/// its payload into `heap`.
fn write_var_array_cell(
    buf: &mut [u8],
    dest_start: usize,
    col: &BinaryColumnDescriptor,
    payload: &HeapPayload,
    heap: &mut HeapWriter,
) -> Result<()> {
    let pntr = match col.col_type {
        BinaryColumnType::VarArrayP => PointerType::P,
        BinaryColumnType::VarArrayQ => PointerType::Q,
        _ => return Err(Error::MalformedField(0, "invalid value".to_string())),
    };
    let ptr = match payload {
        HeapPayload::Bytes(bytes) => heap.push_bytes(bytes),
        HeapPayload::Numeric(values) => {
            let elem_type = col
                .elem_type
                .ok_or_else(|| Error::MalformedField(0, "invalid value".to_string()))?;
            heap.push_numeric(values, field_type_of(elem_type)?)
        }
    };
    let cell_bytes = crate::heap::write_pointer(pntr, ptr);
    buf[dest_start..dest_start + cell_bytes.len()].copy_from_slice(&cell_bytes);
    Ok(())
}

/// Serialize all rows of a binary table into padded FITS data bytes, returning the
/// accumulated heap size in bytes (the real `PCOUNT`) alongside the buffer.
///
/// The returned buffer is padded to a multiple of 2880 bytes, with any heap bytes from
/// `VarArrayP`/`VarArrayQ` columns appended immediately after the fixed-record area
/// before padding.
pub fn serialize_binary_table(
    columns: &[BinaryColumnDescriptor],
    col_data: &[BinaryColumnData],
    naxis2: usize,
) -> Result<(Vec<u8>, usize)> {
    if columns.len() != col_data.len() {
        return Err(Error::MalformedField(0, "invalid value".to_string()));
    }

    let naxis1: usize = columns.iter().map(|c| c.byte_width).sum();
    let raw_len = naxis1 * naxis2;
    let mut fixed = vec![0u8; raw_len];
    let mut heap = HeapWriter::new();

    for row in 0..naxis2 {
        let mut col_offset = 0usize;
        for (col_idx, col) in columns.iter().enumerate() {
            let dest_start = row * naxis1 + col_offset;
            match &col_data[col_idx] {
                BinaryColumnData::VarArray(payloads) => {
                    let payload = payloads
                        .get(row)
                        .ok_or_else(|| Error::MalformedField(0, "invalid value".to_string()))?;
                    write_var_array_cell(&mut fixed, dest_start, col, payload, &mut heap)?;
                }
                other => {
                    let cell_bytes =
                        serialize_binary_column_value(&col.col_type, col.repeat, other, row)?;
                    fixed[dest_start..dest_start + cell_bytes.len()].copy_from_slice(&cell_bytes);
                }
            }
            col_offset += col.byte_width;
        }
    }

    let pcount = heap.len();
    let mut buf = fixed;
    buf.extend_from_slice(&heap.into_bytes());
    let padded_len = padded_byte_len(buf.len());
    buf.resize(padded_len, 0u8);

    Ok((buf, pcount))
}

/// Build and serialize a complete binary table HDU (header + data).
///
/// Returns the combined header and data bytes, each padded to block boundaries.
pub fn serialize_binary_table_hdu(
    columns: &[BinaryColumnDescriptor],
    col_data: &[BinaryColumnData],
    naxis2: usize,
) -> Result<Vec<u8>> {
    let (data_bytes, pcount) = serialize_binary_table(columns, col_data, naxis2)?;
    let cards = build_binary_table_cards(columns, naxis2, pcount)?;
    let header_bytes = serialize_header(&cards)?;

    let mut result = Vec::with_capacity(header_bytes.len() + data_bytes.len());
    result.extend_from_slice(&header_bytes);
    result.extend_from_slice(&data_bytes);
    Ok(result)
}
