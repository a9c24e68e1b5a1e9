//! Source location utilities.
//!
//! The scanner only tracks byte offsets while decoding. Line and column are
//! resolved from the offset when an error is built, so the happy path never
//! pays for line counting.

/// Row/column location within the source plist document (1-indexed).
///
/// `column` counts Unicode scalar values, not bytes, so it lines up with what an
/// editor shows for UTF-8 text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    pub(crate) line: u32,
    pub(crate) column: u32,
    pub(crate) byte_offset: u32,
}

impl Location {
    /// Sentinel value meaning "location unknown".
    pub const UNKNOWN: Self = Self {
        line: 0,
        column: 0,
        byte_offset: 0,
    };

    /// 1-indexed line number.
    pub fn line(&self) -> u64 {
        self.line as u64
    }

    /// 1-indexed character column.
    pub fn column(&self) -> u64 {
        self.column as u64
    }

    /// Byte offset of the location within the input.
    pub fn byte_offset(&self) -> u64 {
        self.byte_offset as u64
    }

    /// Resolve a byte offset into a line/column location.
    ///
    /// Arguments:
    /// - `input`: the complete document bytes.
    /// - `offset`: byte offset; clamped to the input length.
    ///
    /// Called by:
    /// - The scanner, on error paths only.
    pub(crate) fn from_offset(input: &[u8], offset: usize) -> Self {
        let offset = offset.min(input.len());
        let before = &input[..offset];
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        // Count chars lossily: the prefix of the current line may end inside a
        // multi-byte sequence or may not be UTF-8 at all.
        let column = String::from_utf8_lossy(&before[line_start..]).chars().count() + 1;

        // Documents above 4 GiB still decode; only the reported coordinates saturate.
        Self {
            line: u32::try_from(line).unwrap_or(u32::MAX),
            column: u32::try_from(column).unwrap_or(u32::MAX),
            byte_offset: u32::try_from(offset).unwrap_or(u32::MAX),
        }
    }
}
