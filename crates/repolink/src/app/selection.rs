//! Mapping editor caret and selection state to 1-based line ranges.

use crate::domain::model::{Caret, SelectionRange, SelectionSpan};

/// Character offsets at which each line of a document begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        let mut len = 0;
        for (offset, ch) in text.chars().enumerate() {
            if ch == '\n' {
                starts.push(offset + 1);
            }
            len = offset + 1;
        }
        Self { starts, len }
    }

    #[cfg(test)]
    fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// 0-based line containing `offset`, and the offset at which that line starts.
    ///
    /// Offsets past the end of the document clamp to the end.
    pub fn locate(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.len);
        let line = self.starts.partition_point(|&start| start <= offset) - 1;
        (line, self.starts[line])
    }

    /// Offset of a 1-based `line`/`column` pair, clamped to the document.
    pub fn offset_of(&self, line: usize, column: usize) -> usize {
        let index = line.saturating_sub(1).min(self.starts.len() - 1);
        let start = self.starts[index];
        let line_end = self
            .starts
            .get(index + 1)
            .map(|next| next - 1)
            .unwrap_or(self.len);
        (start + column.saturating_sub(1)).min(line_end)
    }
}

/// Resolves selections against a single document.
#[derive(Debug, Clone)]
pub struct SelectionResolver {
    index: LineIndex,
}

impl SelectionResolver {
    pub fn new(text: &str) -> Self {
        Self {
            index: LineIndex::new(text),
        }
    }

    /// Normalize the caret and optional selection into a [`SelectionRange`].
    ///
    /// Without a selection the end line is reported as the caret line plus one, with both
    /// columns set to 1.
    pub fn resolve(&self, caret: Caret, selection: Option<SelectionSpan>) -> SelectionRange {
        match selection.filter(|span| !span.is_empty()) {
            None => caret_range(caret),
            Some(span) => {
                let (start, end) = if span.start <= span.end {
                    (span.start, span.end)
                } else {
                    (span.end, span.start)
                };
                let (start_line, start_line_offset) = self.index.locate(start);
                let (end_line, end_line_offset) = self.index.locate(end);
                SelectionRange {
                    start_line: start_line + 1,
                    end_line: end_line + 1,
                    start_column: start.min(self.index.len) - start_line_offset + 1,
                    end_column: end.min(self.index.len) - end_line_offset + 1,
                    caret_only: false,
                }
            }
        }
    }
}

/// Range reported when nothing is selected; needs no document text.
pub fn caret_range(caret: Caret) -> SelectionRange {
    let line = caret.line + 1;
    SelectionRange {
        start_line: line,
        end_line: line + 1,
        start_column: 1,
        end_column: 1,
        caret_only: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "fn main() {\n    let x = 1;\n    println!(\"{x}\");\n}\n";

    #[test]
    fn caret_without_selection_reports_next_line_as_end() {
        let resolver = SelectionResolver::new(DOC);
        let range = resolver.resolve(Caret { line: 4, column: 7 }, None);
        assert_eq!(
            range,
            SelectionRange {
                start_line: 5,
                end_line: 6,
                start_column: 1,
                end_column: 1,
                caret_only: true,
            }
        );
    }

    #[test]
    fn zero_width_selection_counts_as_none() {
        let resolver = SelectionResolver::new(DOC);
        let range = resolver.resolve(
            Caret { line: 1, column: 0 },
            Some(SelectionSpan { start: 14, end: 14 }),
        );
        assert!(range.caret_only);
        assert_eq!((range.start_line, range.end_line), (2, 3));
    }

    #[test]
    fn selection_maps_offsets_to_lines_and_columns() {
        let resolver = SelectionResolver::new(DOC);
        // "let" on line 2 through the `(` on line 3.
        let start = DOC.find("let").unwrap();
        let end = DOC.find("(\"").unwrap();
        let range = resolver.resolve(Caret::default(), Some(SelectionSpan { start, end }));
        assert_eq!(
            range,
            SelectionRange {
                start_line: 2,
                end_line: 3,
                start_column: 5,
                end_column: 13,
                caret_only: false,
            }
        );
    }

    #[test]
    fn reversed_selection_is_normalized() {
        let resolver = SelectionResolver::new(DOC);
        let forward = resolver.resolve(Caret::default(), Some(SelectionSpan { start: 3, end: 20 }));
        let backward = resolver.resolve(Caret::default(), Some(SelectionSpan { start: 20, end: 3 }));
        assert_eq!(forward, backward);
        assert!(forward.start_line <= forward.end_line);
    }

    #[test]
    fn selection_within_a_line_uses_same_line() {
        let resolver = SelectionResolver::new("alpha beta\ngamma\n");
        let range = resolver.resolve(Caret::default(), Some(SelectionSpan { start: 6, end: 10 }));
        assert_eq!((range.start_line, range.end_line), (1, 1));
        assert_eq!((range.start_column, range.end_column), (7, 11));
    }

    #[test]
    fn offsets_are_counted_in_characters() {
        let resolver = SelectionResolver::new("héllo\nwörld\n");
        let range = resolver.resolve(Caret::default(), Some(SelectionSpan { start: 7, end: 9 }));
        assert_eq!((range.start_line, range.start_column), (2, 2));
        assert_eq!((range.end_line, range.end_column), (2, 4));
    }

    #[test]
    fn offsets_past_the_end_clamp() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.line_count(), 2);
        assert_eq!(index.locate(99), (1, 3));
    }

    #[test]
    fn offset_of_round_trips_through_locate() {
        let index = LineIndex::new(DOC);
        let offset = index.offset_of(3, 5);
        assert_eq!(index.locate(offset), (2, offset - 4));
        assert_eq!(index.offset_of(2, 500), DOC.find("1;").unwrap() + 2);
    }
}
