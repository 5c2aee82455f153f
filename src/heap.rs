//! Heap accumulation and lookup for variable-length-array (P/Q) binary-table columns.
//!
//! Variable-length fields don't inline their payload into the fixed-record area: the
//! cell holds a `(count, offset)` pointer and the actual elements live in a heap region
//! appended after the last row. Reading seeks into the heap at `heap_base + offset` and
//! decodes `count` elements; writing must accumulate every row's payload into one buffer
//! before the fixed-record stream is final, since each pointer's `offset` is the heap
//! length *at the time that row was appended*, not a value knowable in isolation.

use alloc::vec::Vec;

use crate::endian::{
    read_f32_be, read_f64_be, read_i16_be, read_i32_be, read_i64_be, read_u32_be, read_u64_be,
    write_f32_be, write_f64_be, write_i16_be, write_i32_be, write_i64_be,
};
use crate::error::{Error, Result};
use crate::fieldformat::{FieldType, PointerType};

/// A `(count, offset)` pointer as stored in a P/Q column's cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapPointer {
    /// Number of elements in this cell's variable-length payload.
    pub count: u64,
    /// Byte offset of the payload from the start of the heap region.
    pub offset: u64,
}

/// Decode a cell's `(count, offset)` pointer, width determined by the column's
/// pointer kind.
pub fn read_pointer(cell: &[u8], pntr: PointerType) -> Result<HeapPointer> {
    match pntr {
        PointerType::P => {
            if cell.len() < 8 {
                return Err(Error::stream_truncated());
            }
            Ok(HeapPointer {
                count: read_u32_be(&cell[0..4]) as u64,
                offset: read_u32_be(&cell[4..8]) as u64,
            })
        }
        PointerType::Q => {
            if cell.len() < 16 {
                return Err(Error::stream_truncated());
            }
            Ok(HeapPointer {
                count: read_u64_be(&cell[0..8]),
                offset: read_u64_be(&cell[8..16]),
            })
        }
    }
}

/// Encode a `(count, offset)` pointer into a cell buffer of the right width for `pntr`.
pub fn write_pointer(pntr: PointerType, ptr: HeapPointer) -> Vec<u8> {
    match pntr {
        PointerType::P => {
            let mut buf = alloc::vec![0u8; 8];
            buf[0..4].copy_from_slice(&(ptr.count as u32).to_be_bytes());
            buf[4..8].copy_from_slice(&(ptr.offset as u32).to_be_bytes());
            buf
        }
        PointerType::Q => {
            let mut buf = alloc::vec![0u8; 16];
            buf[0..8].copy_from_slice(&ptr.count.to_be_bytes());
            buf[8..16].copy_from_slice(&ptr.offset.to_be_bytes());
            buf
        }
    }
}

/// A decoded variable-length payload: one element per entry, widened to `f64` for
/// numeric types (the caller narrows as needed) or returned as a raw bit/byte vector
/// for `Bit`/`UInt8`/`String` element types.
#[derive(Debug, Clone, PartialEq)]
pub enum HeapPayload {
    Numeric(Vec<f64>),
    Bytes(Vec<u8>),
}

/// Read `count` elements of `element_type` starting at `heap_base + offset` in the
/// full FITS byte stream.
pub fn read_payload(
    fits_data: &[u8],
    heap_base: usize,
    ptr: HeapPointer,
    element_type: FieldType,
) -> Result<HeapPayload> {
    let start = heap_base + ptr.offset as usize;
    let count = ptr.count as usize;

    if matches!(element_type, FieldType::UInt8 | FieldType::String) {
        let end = start + count;
        if end > fits_data.len() {
            return Err(Error::stream_truncated());
        }
        return Ok(HeapPayload::Bytes(fits_data[start..end].to_vec()));
    }

    let elem_size = match element_type {
        FieldType::Bool => 1,
        FieldType::Bit => return Err(Error::stream_truncated()),
        FieldType::Int16 => 2,
        FieldType::Int32 | FieldType::Float32 => 4,
        FieldType::Int64 | FieldType::Float64 => 8,
        FieldType::Complex64 => 8,
        FieldType::Complex128 => 16,
        FieldType::UInt8 | FieldType::String => unreachable!(),
    };
    let end = start + count * elem_size;
    if end > fits_data.len() {
        return Err(Error::stream_truncated());
    }

    let mut values = Vec::with_capacity(count);
    for i in 0..count {
        let cell = &fits_data[start + i * elem_size..start + (i + 1) * elem_size];
        let v = match element_type {
            FieldType::Bool => cell[0] as f64,
            FieldType::Int16 => read_i16_be(cell) as f64,
            FieldType::Int32 => read_i32_be(cell) as f64,
            FieldType::Int64 => read_i64_be(cell) as f64,
            FieldType::Float32 => read_f32_be(cell) as f64,
            FieldType::Float64 => read_f64_be(cell),
            _ => return Err(Error::stream_truncated()),
        };
        values.push(v);
    }
    Ok(HeapPayload::Numeric(values))
}

/// Accumulates variable-length payloads during a Bintable write, handing back the
/// pointer for each appended payload and the final byte buffer to append after the
/// fixed-record area.
#[derive(Debug, Default)]
pub struct HeapWriter {
    buf: Vec<u8>,
}

impl HeapWriter {
    pub fn new() -> Self {
        HeapWriter { buf: Vec::new() }
    }

    /// Append one row's numeric payload, returning the pointer to write into that
    /// row's fixed-record cell. `offset` is always the heap length *before* this
    /// append, matching the two-pass accumulate-then-concatenate write order.
    pub fn push_numeric(&mut self, values: &[f64], element_type: FieldType) -> HeapPointer {
        let offset = self.buf.len() as u64;
        for &v in values {
            let mut tmp = [0u8; 8];
            match element_type {
                FieldType::Bool => self.buf.push(v as u8),
                FieldType::Int16 => {
                    write_i16_be(&mut tmp[..2], v as i16);
                    self.buf.extend_from_slice(&tmp[..2]);
                }
                FieldType::Int32 => {
                    write_i32_be(&mut tmp[..4], v as i32);
                    self.buf.extend_from_slice(&tmp[..4]);
                }
                FieldType::Int64 => {
                    write_i64_be(&mut tmp[..8], v as i64);
                    self.buf.extend_from_slice(&tmp[..8]);
                }
                FieldType::Float32 => {
                    write_f32_be(&mut tmp[..4], v as f32);
                    self.buf.extend_from_slice(&tmp[..4]);
                }
                FieldType::Float64 => {
                    write_f64_be(&mut tmp[..8], v);
                    self.buf.extend_from_slice(&tmp[..8]);
                }
                _ => {}
            }
        }
        HeapPointer {
            count: values.len() as u64,
            offset,
        }
    }

    /// Append one row's raw byte payload (UInt8/String/Bit element columns).
    pub fn push_bytes(&mut self, bytes: &[u8]) -> HeapPointer {
        let offset = self.buf.len() as u64;
        self.buf.extend_from_slice(bytes);
        HeapPointer {
            count: bytes.len() as u64,
            offset,
        }
    }

    /// Total accumulated heap size in bytes — becomes `PCOUNT` on write.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume the writer, returning the heap bytes to append after the fixed-record
    /// area.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
