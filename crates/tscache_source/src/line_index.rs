//! Line-start indexing for fast offset to line/character lookup.

/// Precomputed line-start offsets for a piece of source text.
///
/// Offsets and characters count UTF-16 code units, the unit compilers for
/// JavaScript-family languages report positions in. Positions are zero-based
/// on both axes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// UTF-16 offsets of each line start (the first entry is always 0).
    line_starts: Vec<u32>,
    /// Total length of the indexed text in UTF-16 code units.
    len: u32,
}

impl LineIndex {
    /// Builds the index for `text`.
    pub fn new(text: &str) -> Self {
        let (line_starts, len) = compute_line_starts(text);
        Self { line_starts, len }
    }

    /// Converts a UTF-16 offset into zero-based `(line, character)`.
    ///
    /// Offsets past the end of the text clamp to the end.
    pub fn line_and_character(&self, offset: u32) -> (u32, u32) {
        let offset = offset.min(self.len);
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let character = offset - self.line_starts[line_idx];
        (line_idx as u32, character)
    }

    /// Returns the number of lines in the indexed text.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// Computes the UTF-16 offsets of each line start and the total length.
fn compute_line_starts(content: &str) -> (Vec<u32>, u32) {
    let mut starts = vec![0u32];
    let mut offset = 0u32;
    for ch in content.chars() {
        offset += ch.len_utf16() as u32;
        if ch == '\n' {
            starts.push(offset);
        }
    }
    (starts, offset)
}

/// Converts a byte offset into `text` to a UTF-16 offset.
///
/// Byte offsets inside a multi-byte character count the whole character.
pub fn utf16_offset(text: &str, byte_offset: usize) -> u32 {
    text.char_indices()
        .take_while(|(idx, _)| *idx < byte_offset)
        .map(|(_, ch)| ch.len_utf16() as u32)
        .sum()
}
