//! Document chunking.
//!
//! Splits raw text into overlapping fixed-size character windows. Successive
//! chunks share exactly `overlap` characters, so the original text can be
//! reconstructed by dropping the leading `overlap` characters of every chunk
//! after the first.

use crate::core::errors::ApiError;

/// Split `text` into overlapping chunks of at most `chunk_size` characters.
///
/// Requires `chunk_size > overlap`. Empty input yields an empty sequence.
/// The split is deterministic: the same input and parameters always produce
/// the same chunks.
pub fn split(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>, ApiError> {
    if chunk_size == 0 {
        return Err(ApiError::Config("chunk_size must be positive".to_string()));
    }
    if overlap >= chunk_size {
        return Err(ApiError::Config(format!(
            "overlap ({}) must be smaller than chunk_size ({})",
            overlap, chunk_size
        )));
    }

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let step = chunk_size - overlap;
    let mut chunks = Vec::with_capacity(total / step + 1);
    let mut start = 0;

    while start < total {
        let end = (start + chunk_size).min(total);
        chunks.push(chars[start..end].iter().collect());
        if end == total {
            break;
        }
        start += step;
    }

    Ok(chunks)
}
