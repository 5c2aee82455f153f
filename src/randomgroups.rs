//! Random-groups HDU body reading and writing.
//!
//! A random-groups primary HDU (`GROUPS=T`, `NAXIS1=0`) does not store a single
//! PCOUNT×GCOUNT parameter block followed by all array data. Instead each of the
//! GCOUNT groups is its own `(PCOUNT parameters, group array)` pair, one after another,
//! with the parameters and the array sharing BITPIX's element type.

use alloc::string::ToString;
use alloc::vec;
use alloc::vec::Vec;

use crate::block::padded_byte_len;
use crate::endian::{
    read_f32_be, read_f64_be, read_i16_be, read_i32_be, read_i64_be, write_f32_be, write_f64_be,
    write_i16_be, write_i32_be, write_i64_be,
};
use crate::error::{Error, Result};
use crate::hdu::{Hdu, HduInfo};
use crate::header::serialize_header;
use crate::image::{bytes_per_pixel, ImageData};
use crate::primary::build_random_groups_header;

/// One random-groups HDU body: GCOUNT groups, each a `(params, group array)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomGroupsData {
    /// Per-group parameter vectors; one entry per group, each of length PCOUNT.
    pub params: Vec<Vec<f64>>,
    /// GCOUNT groups' pixel arrays, concatenated in group order (group 0's array
    /// first, then group 1's, ...).
    pub groups: ImageData,
}

fn read_scalar(raw: &[u8], bitpix: i64) -> Result<f64> {
    Ok(match bitpix {
        8 => raw[0] as f64,
        16 => read_i16_be(raw) as f64,
        32 => read_i32_be(raw) as f64,
        64 => read_i64_be(raw) as f64,
        -32 => read_f32_be(raw) as f64,
        -64 => read_f64_be(raw),
        other => return Err(Error::MalformedField(0, alloc::format!("invalid BITPIX {other}"))),
    })
}

fn write_scalar(out: &mut [u8], bitpix: i64, v: f64) {
    match bitpix {
        8 => out[0] = v as u8,
        16 => write_i16_be(out, v as i16),
        32 => write_i32_be(out, v as i32),
        64 => write_i64_be(out, v as i64),
        -32 => write_f32_be(out, v as f32),
        -64 => write_f64_be(out, v),
        _ => {}
    }
}

fn empty_image_data(bitpix: i64) -> Result<ImageData> {
    Ok(match bitpix {
        8 => ImageData::U8(Vec::new()),
        16 => ImageData::I16(Vec::new()),
        32 => ImageData::I32(Vec::new()),
        64 => ImageData::I64(Vec::new()),
        -32 => ImageData::F32(Vec::new()),
        -64 => ImageData::F64(Vec::new()),
        other => return Err(Error::MalformedField(0, alloc::format!("invalid BITPIX {other}"))),
    })
}

fn push_pixel(dest: &mut ImageData, bitpix: i64, raw: &[u8]) -> Result<()> {
    match (bitpix, dest) {
        (8, ImageData::U8(v)) => v.push(raw[0]),
        (16, ImageData::I16(v)) => v.push(read_i16_be(raw)),
        (32, ImageData::I32(v)) => v.push(read_i32_be(raw)),
        (64, ImageData::I64(v)) => v.push(read_i64_be(raw)),
        (-32, ImageData::F32(v)) => v.push(read_f32_be(raw)),
        (-64, ImageData::F64(v)) => v.push(read_f64_be(raw)),
        _ => return Err(Error::MalformedField(0, "invalid value".to_string())),
    }
    Ok(())
}

fn pixel_count(data: &ImageData) -> usize {
    match data {
        ImageData::U8(v) => v.len(),
        ImageData::I16(v) => v.len(),
        ImageData::I32(v) => v.len(),
        ImageData::I64(v) => v.len(),
        ImageData::F32(v) => v.len(),
        ImageData::F64(v) => v.len(),
    }
}

fn write_pixel_at(out: &mut [u8], bitpix: i64, data: &ImageData, index: usize) -> Result<()> {
    match (bitpix, data) {
        (8, ImageData::U8(v)) => out[0] = v[index],
        (16, ImageData::I16(v)) => write_i16_be(out, v[index]),
        (32, ImageData::I32(v)) => write_i32_be(out, v[index]),
        (64, ImageData::I64(v)) => write_i64_be(out, v[index]),
        (-32, ImageData::F32(v)) => write_f32_be(out, v[index]),
        (-64, ImageData::F64(v)) => write_f64_be(out, v[index]),
        _ => return Err(Error::MalformedField(0, "invalid value".to_string())),
    }
    Ok(())
}

/// Read a random-groups body: PCOUNT parameters followed by the group's pixel array,
/// repeated GCOUNT times in a row.
pub fn read_random_groups_data(fits_data: &[u8], hdu: &Hdu) -> Result<RandomGroupsData> {
    let (bitpix, naxes, pcount, gcount) = match &hdu.info {
        HduInfo::RandomGroups {
            bitpix,
            naxes,
            pcount,
            gcount,
        } => (*bitpix, naxes.as_slice(), *pcount, *gcount),
        _ => return Err(Error::MalformedField(0, "not a random-groups HDU".to_string())),
    };

    let elem_size = bytes_per_pixel(bitpix)?;
    let group_shape = if naxes.is_empty() { &[][..] } else { &naxes[1..] };
    let product: usize = group_shape.iter().product();
    let group_bytes = (pcount + product) * elem_size;

    let mut params = Vec::with_capacity(gcount);
    let mut groups = empty_image_data(bitpix)?;

    for g in 0..gcount {
        let group_start = hdu.data_start + g * group_bytes;
        if group_start + group_bytes > fits_data.len() {
            return Err(Error::stream_truncated());
        }

        let mut group_params = Vec::with_capacity(pcount);
        for p in 0..pcount {
            let off = group_start + p * elem_size;
            group_params.push(read_scalar(&fits_data[off..off + elem_size], bitpix)?);
        }
        params.push(group_params);

        let array_start = group_start + pcount * elem_size;
        for i in 0..product {
            let off = array_start + i * elem_size;
            push_pixel(&mut groups, bitpix, &fits_data[off..off + elem_size])?;
        }
    }

    Ok(RandomGroupsData { params, groups })
}

/// Build and serialize a complete random-groups HDU (header + data), padded to block
/// boundaries. `group_shape` is the per-group array shape (`NAXIS2..NAXISm`); every
/// entry in `data.params` must have the same length (PCOUNT), and `data.groups` must
/// hold exactly `gcount * product(group_shape)` pixels in group order.
pub fn build_random_groups_hdu(
    bitpix: i64,
    group_shape: &[usize],
    data: &RandomGroupsData,
) -> Result<Vec<u8>> {
    let gcount = data.params.len();
    let pcount = data.params.first().map_or(0, |p| p.len());
    for group_params in &data.params {
        if group_params.len() != pcount {
            return Err(Error::ShapeMismatch(
                alloc::format!("{pcount} parameters per group"),
                alloc::format!("{} parameters", group_params.len()),
            ));
        }
    }

    let product: usize = group_shape.iter().product();
    let elem_size = bytes_per_pixel(bitpix)?;
    let expected_pixels = product * gcount;
    if pixel_count(&data.groups) != expected_pixels {
        return Err(Error::ShapeMismatch(
            alloc::format!("{expected_pixels} pixels"),
            alloc::format!("{} pixels", pixel_count(&data.groups)),
        ));
    }

    let cards = build_random_groups_header(bitpix, group_shape, pcount, gcount)?;
    let header_bytes = serialize_header(&cards)?;

    let group_bytes = (pcount + product) * elem_size;
    let mut body = vec![0u8; gcount * group_bytes];
    for g in 0..gcount {
        let group_start = g * group_bytes;
        for (p, &v) in data.params[g].iter().enumerate() {
            let off = group_start + p * elem_size;
            write_scalar(&mut body[off..off + elem_size], bitpix, v);
        }
        let array_start = group_start + pcount * elem_size;
        for i in 0..product {
            let off = array_start + i * elem_size;
            write_pixel_at(&mut body[off..off + elem_size], bitpix, &data.groups, g * product + i)?;
        }
    }
    let padded_len = padded_byte_len(body.len());
    body.resize(padded_len, 0u8);

    let mut result = Vec::with_capacity(header_bytes.len() + body.len());
    result.extend_from_slice(&header_bytes);
    result.extend_from_slice(&body);
    Ok(result)
}
