//! Byte ranges and resolved positions in a source text.

use std::fmt;

/// A half-open `[start, end)` byte range identifying a source fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Span {
        debug_assert!(start <= end);
        Span { start, end }
    }

    /// The smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// A byte offset resolved to a 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub byte_index: usize,
    pub line: usize,
    pub column: usize,
}

/// Everything known about a [Span]: its resolved end points and the text it
/// covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanInfo {
    pub span: Span,
    pub start: Location,
    pub end: Location,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_idempotent() {
        let span = Span::new(4, 17);
        assert_eq!(span.merge(span), span);
    }

    #[test]
    fn merge_is_commutative() {
        let a = Span::new(3, 9);
        let b = Span::new(6, 21);
        assert_eq!(a.merge(b), b.merge(a));
    }

    #[test]
    fn merge_takes_the_extremes() {
        let a = Span::new(10, 12);
        let b = Span::new(2, 5);
        assert_eq!(a.merge(b), Span::new(2, 12));
    }
}
