//! Non-destructive patch engine
//!
//! Transforms never touch the text they scan. They describe their changes as
//! [`Edit`] records keyed by byte offsets into the *original* buffer, and
//! [`apply_edits`] splices all of them in a single forward walk. Every byte
//! outside an edited span is copied verbatim.
//!
//! Ordering rules:
//! - edits are applied by ascending `index`;
//! - edits sharing an index keep the order they were submitted in;
//! - an insert at the start of a span that an earlier-submitted delete or
//!   replace removed is emitted after that replacement;
//! - any other overlap is a transform bug and fails with
//!   [`Error::OverlappingEdits`].

use crate::core::{Error, Result};
use std::ops::Range;

/// A single positional change against the original text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Insert { index: usize, text: String },
    Delete { index: usize, length: usize },
    Replace { index: usize, length: usize, text: String },
}

impl Edit {
    pub fn insert(index: usize, text: impl Into<String>) -> Self {
        Self::Insert {
            index,
            text: text.into(),
        }
    }

    pub fn delete(range: Range<usize>) -> Self {
        Self::Delete {
            index: range.start,
            length: range.len(),
        }
    }

    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self::Replace {
            index: range.start,
            length: range.len(),
            text: text.into(),
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Insert { index, .. }
            | Self::Delete { index, .. }
            | Self::Replace { index, .. } => *index,
        }
    }

    /// Span of original text this edit removes (empty for inserts)
    pub fn removed(&self) -> Range<usize> {
        match self {
            Self::Insert { index, .. } => *index..*index,
            Self::Delete { index, length } | Self::Replace { index, length, .. } => {
                *index..*index + *length
            }
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Insert { text, .. } | Self::Replace { text, .. } => text,
            Self::Delete { .. } => "",
        }
    }

    /// Same edit with its text passed through `f`
    pub fn map_text(self, f: impl FnOnce(&str) -> String) -> Self {
        match self {
            Self::Insert { index, text } => Self::Insert {
                index,
                text: f(&text),
            },
            Self::Replace {
                index,
                length,
                text,
            } => Self::Replace {
                index,
                length,
                text: f(&text),
            },
            delete @ Self::Delete { .. } => delete,
        }
    }
}

/// Apply `edits` to `original` and return the new text
pub fn apply_edits(original: &str, edits: &[Edit]) -> Result<String> {
    let mut ordered: Vec<&Edit> = edits.iter().collect();
    // stable: ties keep submission order
    ordered.sort_by_key(|edit| edit.index());

    let grown: usize = edits.iter().map(|e| e.text().len()).sum();
    let mut output = String::with_capacity(original.len() + grown);
    let mut cursor = 0;
    let mut last_removed: Option<Range<usize>> = None;

    for edit in ordered {
        let removed = edit.removed();
        check_bounds(original, &removed)?;

        if removed.start < cursor {
            let is_boundary_insert = matches!(edit, Edit::Insert { .. })
                && last_removed
                    .as_ref()
                    .is_some_and(|prev| prev.start == removed.start);
            if is_boundary_insert {
                output.push_str(edit.text());
                continue;
            }
            return Err(Error::OverlappingEdits {
                first: last_removed.unwrap_or(cursor..cursor),
                second: removed,
            });
        }

        output.push_str(&original[cursor..removed.start]);
        output.push_str(edit.text());
        cursor = removed.end;
        if !removed.is_empty() {
            last_removed = Some(removed);
        }
    }

    output.push_str(&original[cursor..]);
    Ok(output)
}

fn check_bounds(original: &str, range: &Range<usize>) -> Result<()> {
    for index in [range.start, range.end] {
        if index > original.len() || !original.is_char_boundary(index) {
            return Err(Error::EditOutOfBounds {
                index,
                len: original.len(),
            });
        }
    }
    Ok(())
}
