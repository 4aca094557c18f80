use std::ops::Range;

use miette::SourceSpan;

/// Byte range of a token in program text.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash, Debug)]
pub struct Span {
    offset: u32,
    len: u16,
}

impl Span {
    /// Tokens longer than `u16::MAX` bytes are clamped.
    pub fn new(offset: usize, len: usize) -> Self {
        Span {
            offset: offset as u32,
            len: u16::try_from(len).unwrap_or(u16::MAX),
        }
    }

    pub fn as_range(&self) -> Range<usize> {
        let start = self.offset as usize;
        start..start + self.len as usize
    }
}

impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        span.as_range().into()
    }
}
