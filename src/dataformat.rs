//! Body geometry descriptor, derived either from header cards or from data in hand.
//!
//! `DataFormat` is the six-field summary every codec needs before it can read or write a
//! body: the on-disk element type, the total element count, the shape tuple, and the
//! PCOUNT/GCOUNT/heap-offset triple that together with shape fixes the byte layout. It is
//! deliberately ephemeral — callers recompute it from an `Hdu`'s cards (or from data) each
//! time they need it rather than caching it alongside the HDU.

use alloc::vec::Vec;

use crate::error::{Error, Result};

/// The on-disk primitive element type, per the FITS BITPIX encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    UInt8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
}

impl ElementType {
    /// Map a BITPIX value to its element type. `8→UInt8, 16→Int16, 32→Int32, 64→Int64,
    /// -32→Float32, -64→Float64`.
    pub fn from_bitpix(bitpix: i64) -> Result<ElementType> {
        match bitpix {
            8 => Ok(ElementType::UInt8),
            16 => Ok(ElementType::Int16),
            32 => Ok(ElementType::Int32),
            64 => Ok(ElementType::Int64),
            -32 => Ok(ElementType::Float32),
            -64 => Ok(ElementType::Float64),
            other => Err(Error::MalformedField(0, alloc::format!("invalid BITPIX {other}"))),
        }
    }

    /// The inverse of [`ElementType::from_bitpix`], used during write-side verification.
    pub fn to_bitpix(self) -> i64 {
        match self {
            ElementType::UInt8 => 8,
            ElementType::Int16 => 16,
            ElementType::Int32 => 32,
            ElementType::Int64 => 64,
            ElementType::Float32 => -32,
            ElementType::Float64 => -64,
        }
    }

    /// The on-disk width of one element, in bytes.
    pub fn size_of(self) -> usize {
        match self {
            ElementType::UInt8 => 1,
            ElementType::Int16 => 2,
            ElementType::Int32 => 4,
            ElementType::Int64 => 8,
            ElementType::Float32 => 4,
            ElementType::Float64 => 8,
        }
    }
}

/// Six-field body-geometry descriptor, computed either from mandatory header cards or
/// from a data object about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFormat {
    /// The on-disk primitive element type.
    pub element_type: ElementType,
    /// Total element count across one group: `param + product(shape)`.
    pub leng: usize,
    /// Dimension tuple, innermost (fastest-varying, NAXIS1) first.
    pub shape: Vec<usize>,
    /// PCOUNT: bytes/elements of per-group random parameters (Random), or heap size
    /// in bytes (Bintable).
    pub param: usize,
    /// GCOUNT: outer replication count.
    pub group: usize,
    /// Byte offset of the heap area from the start of the body (Bintable only; 0 for
    /// variants without a heap).
    pub heap: usize,
}

impl DataFormat {
    /// Build a `DataFormat` for a Primary or Image HDU from its BITPIX and NAXESn.
    pub fn for_image(bitpix: i64, naxes: &[usize]) -> Result<DataFormat> {
        let element_type = ElementType::from_bitpix(bitpix)?;
        let leng: usize = naxes.iter().product();
        Ok(DataFormat {
            element_type,
            leng,
            shape: naxes.to_vec(),
            param: 0,
            group: 1,
            heap: leng * element_type.size_of(),
        })
    }

    /// Build a `DataFormat` for a Random-groups HDU: `BITPIX`, the per-group array shape
    /// (`NAXIS2..NAXISm`, NAXIS1 excluded since it is always 0 for Random), `PCOUNT`
    /// (per-group parameter count), `GCOUNT`.
    pub fn for_random_groups(
        bitpix: i64,
        group_shape: &[usize],
        pcount: usize,
        gcount: usize,
    ) -> Result<DataFormat> {
        let element_type = ElementType::from_bitpix(bitpix)?;
        let array_len: usize = group_shape.iter().product();
        Ok(DataFormat {
            element_type,
            leng: gcount * (pcount + array_len),
            shape: group_shape.to_vec(),
            param: pcount,
            group: gcount,
            heap: 0,
        })
    }

    /// Build a `DataFormat` for a Bintable HDU from its header geometry: `NAXIS1`
    /// (record length in bytes), `NAXIS2` (row count), `PCOUNT` (heap size in bytes,
    /// falling back to the product when `THEAP` is absent), `GCOUNT`, and an explicit
    /// `theap` override when the `THEAP` keyword was present.
    pub fn for_bintable(
        naxis1: usize,
        naxis2: usize,
        pcount: usize,
        gcount: usize,
        theap: Option<usize>,
    ) -> DataFormat {
        let shape = alloc::vec![naxis1, naxis2];
        let product: usize = shape.iter().product();
        DataFormat {
            element_type: ElementType::UInt8,
            leng: gcount * (pcount + product),
            shape,
            param: pcount,
            group: gcount,
            heap: theap.unwrap_or(product),
        }
    }

    /// Build a `DataFormat` for a Bintable HDU directly from an in-memory record
    /// layout: `record_len` is the sum of each field's on-disk width, `row_count` the
    /// number of rows. `param`/`heap` start at zero; the Constructor fills them in once
    /// variable-length columns have been serialized and their heap size is known.
    pub fn for_bintable_from_data(record_len: usize, row_count: usize) -> DataFormat {
        DataFormat {
            element_type: ElementType::UInt8,
            leng: record_len * row_count,
            shape: alloc::vec![record_len, row_count],
            param: 0,
            group: 1,
            heap: 0,
        }
    }

    /// `shape[0]`, the record length in bytes for a Bintable, or the fastest-varying
    /// axis length for an Image/Primary/Random body.
    pub fn record_len(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    /// Number of rows (`shape[1]`), for Bintable/AsciiTable bodies.
    pub fn row_count(&self) -> usize {
        self.shape.get(1).copied().unwrap_or(0)
    }
}
