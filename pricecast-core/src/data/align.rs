//! Column alignment for provider responses.
//!
//! The timestamp array fixes the row count. Every value column is cut or
//! null-padded at the tail to that length; a missing column becomes all
//! nulls. Values are never shifted or filled.

/// Truncate or tail-pad `values` with `None` to exactly `len` entries.
pub fn align_length<T: Clone>(values: Option<&[Option<T>]>, len: usize) -> Vec<Option<T>> {
    let Some(values) = values else {
        return vec![None; len];
    };
    let mut aligned: Vec<Option<T>> = values.iter().take(len).cloned().collect();
    aligned.resize(len, None);
    aligned
}
