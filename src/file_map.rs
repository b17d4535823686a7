//! Resolves byte offsets and [Span]s back into human-readable positions.
//!
//! Resolution is lazy and memoised. Every resolved offset is cached, and a
//! later lookup starts counting from the nearest cached offset before it
//! instead of from the start of the file.

use std::collections::{BTreeMap, HashMap};

use crate::span::{Location, Span, SpanInfo};

/// Maps byte offsets in a single source text to lines and columns.
#[derive(Debug, Clone)]
pub struct FileMap {
    src: String,
    delimiter: &'static str,
    locations: BTreeMap<usize, Location>,
    spans: HashMap<Span, SpanInfo>,
}

impl FileMap {
    pub fn new(src: String) -> FileMap {
        let delimiter = if src.contains("\r\n") { "\r\n" } else { "\n" };

        FileMap {
            src,
            delimiter,
            locations: BTreeMap::new(),
            spans: HashMap::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.src
    }

    /// The 1-based line and column of `byte_index`.
    pub fn location_for(&mut self, byte_index: usize) -> Location {
        if let Some(location) = self.locations.get(&byte_index) {
            return *location;
        }

        let location = self.calculate_location(byte_index);
        self.locations.insert(byte_index, location);

        location
    }

    /// Resolves both ends of `span` and extracts the text it covers.
    pub fn span_info_for(&mut self, span: Span) -> SpanInfo {
        if let Some(info) = self.spans.get(&span) {
            return info.clone();
        }

        let info = SpanInfo {
            span,
            start: self.location_for(span.start),
            end: self.location_for(span.end),
            text: self.src[span.start..span.end].to_string(),
        };

        self.spans.insert(span, info.clone());

        info
    }

    fn calculate_location(&self, byte_index: usize) -> Location {
        let bytes = self.src.as_bytes();
        let delimiter = self.delimiter.as_bytes();

        // Resume counting from the closest already-resolved offset. The
        // resume point backs up so a CRLF straddling the cached offset is
        // still counted; a delimiter wholly before the offset was already
        // part of the cached line number and is not re-counted.
        let (start, mut line) = match self.locations.range(..byte_index).next_back() {
            Some((offset, location)) => (*offset, location.line),
            None => (0, 1),
        };

        let upto = byte_index.min(bytes.len());
        let resume = start.saturating_sub(delimiter.len() - 1).min(upto);

        line += bytes[resume..upto]
            .windows(delimiter.len())
            .filter(|window| *window == delimiter)
            .count();

        // Only delimiters ending at or before the offset count, so an
        // offset inside a delimiter still reports a 1-based column on the
        // line the delimiter terminates.
        let column = match bytes[..upto]
            .windows(delimiter.len())
            .rposition(|window| window == delimiter)
        {
            Some(p) => 1 + byte_index - (p + delimiter.len()),
            None => byte_index + 1,
        };

        Location {
            byte_index,
            line,
            column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_on_the_first_line() {
        let mut map = FileMap::new("abcdefghijk".to_string());
        assert_eq!(map.location_for(3).column, 4);
    }

    #[test]
    fn column_after_a_newline() {
        let mut map = FileMap::new("\nabcdefghijk".to_string());
        assert_eq!(map.location_for(3).column, 3);
    }

    #[test]
    fn column_with_windows_line_endings() {
        let mut map = FileMap::new("abc\r\ndefghijk".to_string());
        assert_eq!(map.location_for(8).column, 4);
    }

    #[test]
    fn lines_are_counted_from_one() {
        let mut map = FileMap::new("ab\ncdef\nghij\n".to_string());

        assert_eq!(map.location_for(0).line, 1);
        assert_eq!(map.location_for(2).line, 1);
        assert_eq!(map.location_for(4).line, 2);
        assert_eq!(map.location_for(10).line, 3);
    }

    #[test]
    fn lines_with_windows_line_endings() {
        let mut map = FileMap::new("ab\r\ncdef\r\nghij\r\n".to_string());
        assert_eq!(map.location_for(12).line, 3);
    }

    #[test]
    fn span_info_includes_the_covered_text() {
        let mut map = FileMap::new("ab\r\ncdef\r\nghij\n".to_string());
        let info = map.span_info_for(Span::new(1, 5));

        assert_eq!(info.text, "b\r\nc");
        assert_eq!(info.start.line, 1);
        assert_eq!(info.start.column, 2);
        assert_eq!(info.end.line, 2);
        assert_eq!(info.end.column, 2);
    }

    #[test]
    fn queries_inside_a_crlf_delimiter_stay_consistent() {
        let mut warm = FileMap::new("ab\r\ncd".to_string());
        warm.location_for(3);
        let warm_location = warm.location_for(4);

        let mut fresh = FileMap::new("ab\r\ncd".to_string());

        assert_eq!(warm_location, fresh.location_for(4));
        assert_eq!(warm_location.line, 2);
        assert_eq!(warm_location.column, 1);
    }

    #[test]
    fn columns_never_drop_below_one() {
        let mut map = FileMap::new("ab\r\ncd".to_string());
        let location = map.location_for(3);

        assert_eq!(location.line, 1);
        assert_eq!(location.column, 4);
    }

    #[test]
    fn the_cache_does_not_change_the_answer() {
        let src = "ab\ncdef\nghij\n";

        let mut cold = FileMap::new(src.to_string());
        let fresh: Vec<_> = (0..src.len()).map(|i| cold.calculate_location(i)).collect();

        let mut warm = FileMap::new(src.to_string());

        // Resolve out of order so later lookups hit intermediate cache
        // entries.
        warm.location_for(10);
        warm.location_for(4);

        for i in 0..src.len() {
            assert_eq!(warm.location_for(i), fresh[i], "offset {}", i);
        }
    }
}
