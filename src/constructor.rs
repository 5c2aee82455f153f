//! Synthesizes the mandatory card prefix for an HDU from its computed geometry,
//! preserving any pre-existing card from the caller's own deck so comments survive.
//!
//! [`crate::primary::build_primary_header`] and [`crate::bintable::build_binary_table_cards`]
//! each synthesize a fresh mandatory prefix from scratch. The Constructor generalizes
//! that to the case where the caller already has a partial card deck — e.g. read it
//! from one file and wants to write a reshaped version to another — and wants its
//! existing `TTYPEn`/comment text carried over rather than discarded.

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::Result;
use crate::fieldformat::{FieldFormat, FieldType};
use crate::header::Card;
use crate::heap::HeapPayload;
use crate::value::Value;

/// Recognized construction-time configuration (§6 Constructor options).
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructOptions {
    /// Render a binary-table body as a sequence of row records rather than a map of
    /// column arrays.
    pub record: bool,
    /// Apply `zero + scale * value` on read.
    pub scale: bool,
    /// Emit `CONTINUE` cards for long strings.
    pub append: bool,
    /// Fixed-format card emission (value starts in column 11, right-justified).
    pub fixed: bool,
    /// Column at which an inline comment's `/` separator is placed.
    pub slash: usize,
    /// Left padding before a string value.
    pub lpad: usize,
    /// Right padding after a string value.
    pub rpad: usize,
    /// Truncate overlong string values rather than erroring.
    pub truncate: bool,
}

impl Default for ConstructOptions {
    fn default() -> Self {
        ConstructOptions {
            record: false,
            scale: true,
            append: false,
            fixed: true,
            slash: 32,
            lpad: 1,
            rpad: 1,
            truncate: true,
        }
    }
}

fn kw(name: &str) -> [u8; 8] {
    let mut buf = [b' '; 8];
    let bytes = name.as_bytes();
    let len = bytes.len().min(8);
    buf[..len].copy_from_slice(&bytes[..len]);
    buf
}

fn find_existing<'a>(deck: &'a [Card], keyword: &str) -> Option<&'a Card> {
    deck.iter().find(|c| c.keyword_str() == keyword)
}

/// Take the caller's existing card for `keyword` (preserving its comment) if present,
/// otherwise synthesize a fresh one with `value` and no comment.
fn take_or_synthesize(deck: &[Card], keyword: &str, value: Value) -> Card {
    match find_existing(deck, keyword) {
        Some(existing) => Card {
            keyword: existing.keyword,
            value: Some(value),
            comment: existing.comment.clone(),
        },
        None => Card {
            keyword: kw(keyword),
            value: Some(value),
            comment: None,
        },
    }
}

/// Build the canonical Bintable mandatory prefix — `XTENSION, BITPIX, NAXIS, NAXIS1,
/// NAXIS2, PCOUNT, GCOUNT, TFIELDS, (TFORM_j, TTYPE_j)_j` — taking any pre-existing
/// card from `user_deck` in place so its comment is preserved, then appending the rest
/// of `user_deck` verbatim (with `END` and any card already consumed by the prefix
/// removed). `TTYPEn` cards are emitted only when at least one field has a non-empty
/// name.
pub fn build_bintable_cards(
    fields: &[FieldFormat],
    naxis2: usize,
    pcount: usize,
    user_deck: &[Card],
) -> Result<Vec<Card>> {
    let naxis1: usize = fields.iter().map(|f| f.slice.width()).sum();
    let tfields = fields.len();
    let emit_ttype = fields.iter().any(|f| !f.name.is_empty() && !f.name.starts_with("column"));

    let mut prefix_keywords: Vec<String> = alloc::vec![
        "XTENSION".into(),
        "BITPIX".into(),
        "NAXIS".into(),
        "NAXIS1".into(),
        "NAXIS2".into(),
        "PCOUNT".into(),
        "GCOUNT".into(),
        "TFIELDS".into(),
    ];

    let mut cards = Vec::with_capacity(8 + tfields * 2);
    cards.push(take_or_synthesize(
        user_deck,
        "XTENSION",
        Value::String("BINTABLE".into()),
    ));
    cards.push(take_or_synthesize(user_deck, "BITPIX", Value::Integer(8)));
    cards.push(take_or_synthesize(user_deck, "NAXIS", Value::Integer(2)));
    cards.push(take_or_synthesize(
        user_deck,
        "NAXIS1",
        Value::Integer(naxis1 as i64),
    ));
    cards.push(take_or_synthesize(
        user_deck,
        "NAXIS2",
        Value::Integer(naxis2 as i64),
    ));
    cards.push(take_or_synthesize(
        user_deck,
        "PCOUNT",
        Value::Integer(pcount as i64),
    ));
    cards.push(take_or_synthesize(user_deck, "GCOUNT", Value::Integer(1)));
    cards.push(take_or_synthesize(
        user_deck,
        "TFIELDS",
        Value::Integer(tfields as i64),
    ));

    for (i, field) in fields.iter().enumerate() {
        let n = i + 1;
        let tform_kw = alloc::format!("TFORM{n}");
        let tform_value = render_tform(field);
        cards.push(take_or_synthesize(user_deck, &tform_kw, Value::String(tform_value)));
        prefix_keywords.push(tform_kw);

        if emit_ttype {
            let ttype_kw = alloc::format!("TTYPE{n}");
            cards.push(take_or_synthesize(
                user_deck,
                &ttype_kw,
                Value::String(field.name.clone()),
            ));
            prefix_keywords.push(ttype_kw);
        }
    }

    for card in user_deck {
        let k = card.keyword_str();
        if k == "END" || prefix_keywords.iter().any(|p| p == k) {
            continue;
        }
        cards.push(card.clone());
    }

    Ok(cards)
}

/// Render a `FieldFormat` back to its `TFORM` string: `{repeat}{P|Q}{code}`.
fn render_tform(field: &FieldFormat) -> String {
    use crate::fieldformat::{FieldType, PointerType};

    let code = match field.element_type {
        FieldType::Bool => 'L',
        FieldType::Bit => 'X',
        FieldType::UInt8 => 'B',
        FieldType::Int16 => 'I',
        FieldType::Int32 => 'J',
        FieldType::Int64 => 'K',
        FieldType::String => 'A',
        FieldType::Float32 => 'E',
        FieldType::Float64 => 'D',
        FieldType::Complex64 => 'C',
        FieldType::Complex128 => 'M',
    };
    let pntr = match field.pntr {
        Some(PointerType::P) => "P",
        Some(PointerType::Q) => "Q",
        None => "",
    };
    alloc::format!("{}{}{}", field.leng, pntr, code)
}

/// One field's value within a single record. Non-scalar numeric/complex variants carry
/// `leng` elements (the field's `TFORM` repeat count); `Bit` and `Ascii` already encode
/// their own width as the vector/string length.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Logical(Vec<bool>),
    Byte(Vec<u8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    ComplexFloat(Vec<(f32, f32)>),
    ComplexDouble(Vec<(f64, f64)>),
    Ascii(String),
    Bit(Vec<bool>),
    VarArray(HeapPayload),
}

/// One row of a Bintable body in record mode: a fixed tuple of named fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub values: Vec<FieldValue>,
}

impl Record {
    /// Look up a field's value by name against the column list it was built from.
    pub fn get<'a>(&'a self, fields: &[FieldFormat], name: &str) -> Option<&'a FieldValue> {
        let idx = fields.iter().position(|f| f.name == name)?;
        self.values.get(idx)
    }
}

/// One column of a Bintable body in column mode: a named array of per-row values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<FieldValue>,
}

/// A Bintable body, shaped per [`ConstructOptions::record`]: either a sequence of
/// per-row records (fields accessible by name) or a column-keyed map of arrays.
#[derive(Debug, Clone, PartialEq)]
pub enum BintableBody {
    Records(Vec<Record>),
    Columns(Vec<Column>),
}

/// Zero / empty-string / empty-bit-vector / empty-heap-payload initialized value for
/// one field, per §4.6's "Default body" clause.
fn default_field_value(field: &FieldFormat) -> FieldValue {
    if field.pntr.is_some() {
        let payload = if matches!(field.element_type, FieldType::UInt8 | FieldType::String) {
            HeapPayload::Bytes(Vec::new())
        } else {
            HeapPayload::Numeric(Vec::new())
        };
        return FieldValue::VarArray(payload);
    }

    match field.element_type {
        FieldType::Bool => FieldValue::Logical(alloc::vec![false; field.leng]),
        FieldType::Bit => FieldValue::Bit(alloc::vec![false; field.leng]),
        FieldType::UInt8 => FieldValue::Byte(alloc::vec![0u8; field.leng]),
        FieldType::Int16 => FieldValue::Short(alloc::vec![0i16; field.leng]),
        FieldType::Int32 => FieldValue::Int(alloc::vec![0i32; field.leng]),
        FieldType::Int64 => FieldValue::Long(alloc::vec![0i64; field.leng]),
        FieldType::String => FieldValue::Ascii(String::new()),
        FieldType::Float32 => FieldValue::Float(alloc::vec![0.0f32; field.leng]),
        FieldType::Float64 => FieldValue::Double(alloc::vec![0.0f64; field.leng]),
        FieldType::Complex64 => FieldValue::ComplexFloat(alloc::vec![(0.0, 0.0); field.leng]),
        FieldType::Complex128 => FieldValue::ComplexDouble(alloc::vec![(0.0, 0.0); field.leng]),
    }
}

fn default_record(fields: &[FieldFormat]) -> Record {
    Record {
        values: fields.iter().map(default_field_value).collect(),
    }
}

/// Build a default-initialized Bintable body for `naxis2` rows: a per-row sequence of
/// records when `options.record` is set, otherwise a column-keyed map of arrays. Used
/// when a Bintable is constructed with `leng>0` but no supplied data.
pub fn default_bintable_body(
    fields: &[FieldFormat],
    naxis2: usize,
    options: &ConstructOptions,
) -> BintableBody {
    if options.record {
        BintableBody::Records((0..naxis2).map(|_| default_record(fields)).collect())
    } else {
        let columns = fields
            .iter()
            .map(|field| Column {
                name: field.name.clone(),
                values: (0..naxis2).map(|_| default_field_value(field)).collect(),
            })
            .collect();
        BintableBody::Columns(columns)
    }
}
