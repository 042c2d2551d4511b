//! Column/row decoding for list-style replies.
//!
//! Commands such as `admin.listPlayers` return a flat word list that encodes
//! a table:
//!
//! ```text
//! <column count> <column names...> <row count> <row values...>
//! ```
//!
//! For example `["2", "name", "score", "1", "Bob", "40"]` is a single row
//! with `name = Bob` and `score = 40`.

use std::collections::HashMap;

use crate::protocol::ProtocolError;

/// A decoded table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Index of the first word after the table, for replies that carry more
    /// data behind it.
    pub end: usize,
}

impl Table {
    /// Returns the value of `column` in row `row`.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// Iterates rows as `column → value` maps.
    pub fn records(&self) -> impl Iterator<Item = HashMap<&str, &str>> + '_ {
        self.rows.iter().map(|row| {
            self.columns
                .iter()
                .map(String::as_str)
                .zip(row.iter().map(String::as_str))
                .collect()
        })
    }
}

/// Decodes the table that starts at `words[offset]`.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedPayload`] when a count is not a number
/// or the list ends before the declared columns or rows do.
pub fn tabulate(words: &[String], offset: usize) -> Result<Table, ProtocolError> {
    let mut pos = offset;

    let column_count = read_count(words, pos, "column count")?;
    pos += 1;
    let columns = take(words, pos, column_count, "column names")?.to_vec();
    pos += column_count;

    let row_count = read_count(words, pos, "row count")?;
    pos += 1;

    let remaining = words.len().saturating_sub(pos);
    let fits = row_count
        .checked_mul(column_count)
        .is_some_and(|cells| cells <= remaining);
    if !fits || (column_count == 0 && row_count > 0) {
        return Err(ProtocolError::MalformedPayload(format!(
            "{row_count} rows of {column_count} columns do not fit in {remaining} words"
        )));
    }

    let mut rows = Vec::with_capacity(row_count);
    for _ in 0..row_count {
        rows.push(take(words, pos, column_count, "row values")?.to_vec());
        pos += column_count;
    }

    Ok(Table {
        columns,
        rows,
        end: pos,
    })
}

fn read_count(words: &[String], pos: usize, what: &str) -> Result<usize, ProtocolError> {
    let word = words
        .get(pos)
        .ok_or_else(|| ProtocolError::MalformedPayload(format!("{what} missing at word {pos}")))?;
    word.parse().map_err(|_| {
        ProtocolError::MalformedPayload(format!("{what} at word {pos} is not a number: {word:?}"))
    })
}

fn take<'a>(
    words: &'a [String],
    pos: usize,
    len: usize,
    what: &str,
) -> Result<&'a [String], ProtocolError> {
    let end = pos.checked_add(len).unwrap_or(usize::MAX);
    words.get(pos..end).ok_or_else(|| {
        ProtocolError::MalformedPayload(format!(
            "{what}: need {len} words at {pos}, have {}",
            words.len().saturating_sub(pos)
        ))
    })
}
