//! Ordered, keyword-indexed container of header cards.
//!
//! Read produces a flat `Vec<Card>`; the rest of the HDU layer — dispatch, verification,
//! construction — wants keyword-addressed access on top of that without losing insertion
//! order. `CardStore` is that thin wrapper: first-match lookup by (case-normalized)
//! keyword, in-place replace, positional insert, and pop-with-default, all in terms of the
//! plain `Vec<Card>` the codec already produces.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::error::{Error, Result};
use crate::header::Card;
use crate::value::Value;

/// An ordered sequence of cards with keyword-indexed lookup.
///
/// Lookup is O(n) and uppercases the query keyword; stored keywords are never mutated.
/// No card in a `CardStore` is ever the END card — callers that read one off a stream get
/// it already stripped, and nothing here re-inserts it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardStore {
    cards: Vec<Card>,
}

impl CardStore {
    /// Build a store from an already-parsed card sequence (as produced by
    /// [`crate::header::parse_header_blocks`]).
    pub fn new(cards: Vec<Card>) -> Self {
        CardStore { cards }
    }

    /// True iff some card's keyword equals `uppercase(key)`.
    pub fn has(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// The first matching card's value. Fails with [`Error::KeyNotFound`] when absent.
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.find(key)
            .and_then(|i| self.cards[i].value.as_ref())
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    /// The first matching card's value, or `default` when absent (or present with no value).
    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.find(key)
            .and_then(|i| self.cards[i].value.as_ref())
            .unwrap_or(default)
    }

    /// Parallel form of [`CardStore::get_or`] over several `(key, default)` pairs.
    pub fn get_many<'a>(&'a self, keys_defaults: &[(&str, &'a Value)]) -> Vec<&'a Value> {
        keys_defaults
            .iter()
            .map(|(key, default)| self.get_or(key, default))
            .collect()
    }

    /// Replace the value of the first matching card in place, preserving its keyword and
    /// comment. Fails with [`Error::KeyNotFound`] when absent.
    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let idx = self.find(key).ok_or_else(|| Error::KeyNotFound(key.to_string()))?;
        self.cards[idx].value = Some(value);
        Ok(())
    }

    /// The zero-based position of the first card whose keyword equals `uppercase(key)`.
    pub fn find(&self, key: &str) -> Option<usize> {
        let key = key.trim().to_ascii_uppercase();
        self.cards.iter().position(|c| c.keyword_str() == key)
    }

    /// Remove and return the first matching card's value, or `default` when absent.
    pub fn pop(&mut self, key: &str, default: Value) -> Value {
        match self.find(key) {
            Some(idx) => self.cards.remove(idx).value.unwrap_or(default),
            None => default,
        }
    }

    /// Append a card to the end of the store.
    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Insert a card at a given position, shifting later cards back.
    pub fn insert(&mut self, index: usize, card: Card) {
        self.cards.insert(index, card);
    }

    /// Read-only traversal in insertion order.
    pub fn iter(&self) -> core::slice::Iter<'_, Card> {
        self.cards.iter()
    }

    /// Read-only view of the underlying slice, in insertion order.
    pub fn as_slice(&self) -> &[Card] {
        &self.cards
    }

    /// The number of cards in the store.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// True iff the store holds no cards.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Consume the store, returning the underlying card sequence.
    pub fn into_vec(self) -> Vec<Card> {
        self.cards
    }

    /// Convenience accessor: the first matching string value, trimmed.
    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.find(key).and_then(|i| self.cards[i].value.as_ref()) {
            Some(Value::String(s)) => Some(s.trim().into()),
            _ => None,
        }
    }

    /// Convenience accessor: the first matching integer value.
    pub fn get_integer(&self, key: &str) -> Option<i64> {
        match self.find(key).and_then(|i| self.cards[i].value.as_ref()) {
            Some(Value::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    /// Convenience accessor: the first matching logical value.
    pub fn get_logical(&self, key: &str) -> Option<bool> {
        match self.find(key).and_then(|i| self.cards[i].value.as_ref()) {
            Some(Value::Logical(b)) => Some(*b),
            _ => None,
        }
    }

    /// Convenience accessor: the first matching floating value. Integer cards widen.
    pub fn get_float(&self, key: &str) -> Option<f64> {
        match self.find(key).and_then(|i| self.cards[i].value.as_ref()) {
            Some(Value::Float(f)) => Some(*f),
            Some(Value::Integer(n)) => Some(*n as f64),
            _ => None,
        }
    }
}

impl From<Vec<Card>> for CardStore {
    fn from(cards: Vec<Card>) -> Self {
        CardStore::new(cards)
    }
}
