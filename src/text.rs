//! Name normalization, character encoding, and batching
//!
//! Raw names are folded to the model alphabet (`a`-`z`, space, hyphen) by NFD
//! decomposition followed by an ASCII whitelist, then encoded to 1-based
//! character indices with 0 reserved for padding. The full input is padded to
//! one common length and split into bounded sub-batches that preserve input
//! order.

use crate::error::{EngineError, Result};
use unicode_normalization::UnicodeNormalization;

/// The model alphabet; character index = position + 1, 0 is padding.
pub const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz -";

/// Index value reserved for right-padding.
pub const PAD_INDEX: u32 = 0;

/// A list of equally padded, encoded names forming one forward-pass input.
///
/// Row-major: `rows` names, each padded to `seq_len` indices.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedBatch {
    pub indices: Vec<u32>,
    pub rows: usize,
    pub seq_len: usize,
}

/// Strips diacritics and non-alphabet characters, lowercases.
///
/// Accented Latin letters fold to their base letter ("é" -> "e"); digits,
/// punctuation, and non-Latin scripts vanish. Unencodable input degrades to an
/// empty or partial string rather than an error.
pub fn normalize(name: &str) -> String {
    name.nfd()
        .filter(|c| c.is_ascii())
        .filter(|c| c.is_ascii_alphabetic() || *c == ' ' || *c == '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Encodes a single normalized name into 1-based alphabet indices.
fn encode(normalized: &str) -> Result<Vec<u32>> {
    normalized
        .chars()
        .map(|c| match ALPHABET.find(c) {
            Some(pos) => Ok(pos as u32 + 1),
            // normalize() restricts to the alphabet, so this is a contract
            // violation rather than bad user input
            None => Err(EngineError::processing(format!(
                "character '{}' outside the model alphabet",
                c
            ))),
        })
        .collect()
}

/// Normalizes, encodes, pads, and chunks a list of names.
///
/// All names are right-padded with 0 to the longest name in the full input,
/// then split into consecutive chunks of `batch_size` (the last chunk may be
/// shorter). A single name, or an input that exactly fills one chunk, yields
/// one batch. Row order matches input order across all batches.
pub fn encode_batches(names: &[String], batch_size: usize) -> Result<Vec<EncodedBatch>> {
    if batch_size == 0 {
        return Err(EngineError::processing("batch size must be non-zero"));
    }
    if names.is_empty() {
        return Err(EngineError::processing("empty name list"));
    }

    let encoded: Vec<Vec<u32>> = names
        .iter()
        .map(|name| encode(&normalize(name)))
        .collect::<Result<_>>()?;

    let max_len = encoded.iter().map(Vec::len).max().unwrap_or(0);
    if max_len == 0 {
        return Err(EngineError::processing(
            "no classifiable characters left after normalization",
        ));
    }

    let mut batches = Vec::with_capacity(encoded.len().div_ceil(batch_size));
    for chunk in encoded.chunks(batch_size) {
        let mut indices = Vec::with_capacity(chunk.len() * max_len);
        for row in chunk {
            indices.extend_from_slice(row);
            indices.resize(indices.len() + (max_len - row.len()), PAD_INDEX);
        }
        batches.push(EncodedBatch {
            indices,
            rows: chunk.len(),
            seq_len: max_len,
        });
    }

    Ok(batches)
}
