//! Reconciles header cards against actual data geometry.
//!
//! Given a `CardStore` and a freshly computed `DataFormat`, the verifier compares
//! `BITPIX`, `NAXISn`, `PCOUNT`, `GCOUNT` against the values the data actually implies.
//! Any mismatch overwrites the card in place and emits a warning; the verifier never
//! raises on its own — a geometry mismatch is always repairable by construction, since
//! the repaired value comes from the data itself. The one error this layer can still
//! produce is [`Error::ShapeMismatch`], reserved for the case the mandatory card is
//! altogether absent and so there is nothing to reconcile the computed value against.

use alloc::string::ToString;

use crate::cardstore::CardStore;
use crate::dataformat::DataFormat;
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{Error, Result};
use crate::header::Card;
use crate::value::Value;

fn set_or_insert_integer(store: &mut CardStore, keyword: &str, value: i64) -> Result<()> {
    if store.has(keyword) {
        store.set(keyword, Value::Integer(value))
    } else {
        let mut kw = [b' '; 8];
        let bytes = keyword.as_bytes();
        let len = bytes.len().min(8);
        kw[..len].copy_from_slice(&bytes[..len]);
        store.push(Card {
            keyword: kw,
            value: Some(Value::Integer(value)),
            comment: None,
        });
        Ok(())
    }
}

/// Reconcile `BITPIX`, `NAXIS`, `NAXISn` against `fmt.shape`/`fmt.element_type`.
/// Existing mismatched cards are overwritten in place (comment preserved); missing
/// cards are appended. Every repair is reported through `diag`.
pub fn verify_image_geometry(
    store: &mut CardStore,
    fmt: &DataFormat,
    diag: &mut dyn Diagnostics,
) -> Result<()> {
    repair_integer(store, "BITPIX", fmt.element_type.to_bitpix(), diag)?;
    repair_integer(store, "NAXIS", fmt.shape.len() as i64, diag)?;
    for (i, &dim) in fmt.shape.iter().enumerate() {
        let keyword = alloc::format!("NAXIS{}", i + 1);
        repair_integer(&mut *store, &keyword, dim as i64, diag)?;
    }
    Ok(())
}

/// Reconcile `NAXIS1`/`NAXIS2`/`PCOUNT`/`GCOUNT` for a Bintable against a computed
/// `DataFormat`.
pub fn verify_bintable_geometry(
    store: &mut CardStore,
    fmt: &DataFormat,
    diag: &mut dyn Diagnostics,
) -> Result<()> {
    repair_integer(store, "NAXIS1", fmt.record_len() as i64, diag)?;
    repair_integer(store, "NAXIS2", fmt.row_count() as i64, diag)?;
    repair_integer(store, "PCOUNT", fmt.param as i64, diag)?;
    repair_integer(store, "GCOUNT", fmt.group as i64, diag)?;
    Ok(())
}

/// Reconcile `PCOUNT`/`GCOUNT` for a Random-groups HDU, plus `BITPIX`/`NAXISn` for the
/// per-group array shape (NAXIS1 is always 0 for Random and is repaired to that
/// constant regardless of `fmt.shape`).
pub fn verify_random_groups_geometry(
    store: &mut CardStore,
    fmt: &DataFormat,
    diag: &mut dyn Diagnostics,
) -> Result<()> {
    repair_integer(store, "BITPIX", fmt.element_type.to_bitpix(), diag)?;
    repair_integer(store, "NAXIS", (fmt.shape.len() + 1) as i64, diag)?;
    repair_integer(store, "NAXIS1", 0, diag)?;
    for (i, &dim) in fmt.shape.iter().enumerate() {
        let keyword = alloc::format!("NAXIS{}", i + 2);
        repair_integer(&mut *store, &keyword, dim as i64, diag)?;
    }
    repair_integer(store, "PCOUNT", fmt.param as i64, diag)?;
    repair_integer(store, "GCOUNT", fmt.group as i64, diag)?;
    Ok(())
}

/// Overwrite `keyword`'s value with `want` if it differs (or is missing a value), and
/// report the repair. A card present with a non-integer value is a genuine
/// irreconcilable mismatch and raises [`Error::ShapeMismatch`], since there is no
/// computed value to fall back to that the caller didn't already supply wrongly-typed.
fn repair_integer(
    store: &mut CardStore,
    keyword: &str,
    want: i64,
    diag: &mut dyn Diagnostics,
) -> Result<()> {
    match store.get_integer(keyword) {
        Some(found) if found == want => Ok(()),
        Some(found) => {
            diag.warn(Warning::GeometryRepaired {
                keyword: keyword.to_string(),
                found: found.to_string(),
                repaired: want.to_string(),
            });
            store.set(keyword, Value::Integer(want))
        }
        None => {
            if store.has(keyword) {
                return Err(Error::ShapeMismatch(
                    want.to_string(),
                    "non-integer value".to_string(),
                ));
            }
            diag.warn(Warning::GeometryRepaired {
                keyword: keyword.to_string(),
                found: "absent".to_string(),
                repaired: want.to_string(),
            });
            set_or_insert_integer(store, keyword, want)
        }
    }
}
