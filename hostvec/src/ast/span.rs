//! Source location tracking

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Byte range in the script source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.start..span.end
    }
}

/// A node with its source location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge() {
        assert_eq!(Span::new(0, 5).merge(Span::new(10, 15)), Span::new(0, 15));
        assert_eq!(Span::new(10, 20).merge(Span::new(5, 15)), Span::new(5, 20));
        assert_eq!(Span::new(0, 100).merge(Span::new(20, 30)), Span::new(0, 100));
    }

    #[test]
    fn test_span_display_and_range() {
        let span = Span::new(42, 99);
        assert_eq!(span.to_string(), "42..99");
        let range: Range<usize> = span.into();
        assert_eq!(range, 42..99);
    }
}
