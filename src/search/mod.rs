//! Search functionality.
//!
//! Finds a query in the rendered lines of a document and tracks a cursor
//! among the matches:
//! - Non-overlapping occurrences, one result per occurrence
//! - Case-insensitive by default
//! - Cyclic forward and backward navigation

use crate::document::RenderedLine;

/// One occurrence of the query, in char columns of a rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

/// Query, results and cursor.
///
/// The cursor is `None` exactly when there are no results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    query: Option<String>,
    case_sensitive: bool,
    matches: Vec<SearchMatch>,
    current: Option<usize>,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a new search, discarding previous results. Returns the match count.
    ///
    /// An empty query clears the state.
    pub fn search(&mut self, lines: &[RenderedLine], query: &str, case_sensitive: bool) -> usize {
        if query.is_empty() {
            self.clear();
            return 0;
        }
        let _scope = crate::perf::scope("search");
        self.query = Some(query.to_string());
        self.case_sensitive = case_sensitive;
        self.matches = find_matches(lines, query, case_sensitive);
        self.current = if self.matches.is_empty() { None } else { Some(0) };
        tracing::debug!(query, matches = self.matches.len(), "search");
        self.matches.len()
    }

    /// Re-run the active query over new lines, keeping the cursor in range.
    ///
    /// Returns true if the results changed.
    pub fn refresh(&mut self, lines: &[RenderedLine]) -> bool {
        let Some(query) = self.query.as_deref() else {
            return false;
        };
        let matches = find_matches(lines, query, self.case_sensitive);
        if matches == self.matches {
            return false;
        }
        self.current = match (self.current, matches.len()) {
            (_, 0) => None,
            (Some(idx), len) => Some(idx.min(len - 1)),
            (None, _) => Some(0),
        };
        self.matches = matches;
        true
    }

    pub fn clear(&mut self) {
        self.query = None;
        self.matches.clear();
        self.current = None;
    }

    /// Advance to the next match, wrapping from last to first.
    pub fn next(&mut self) -> Option<&SearchMatch> {
        let len = self.matches.len();
        if len == 0 {
            return None;
        }
        let next = self.current.map_or(0, |idx| (idx + 1) % len);
        self.current = Some(next);
        self.matches.get(next)
    }

    /// Step back to the previous match, wrapping from first to last.
    pub fn previous(&mut self) -> Option<&SearchMatch> {
        let len = self.matches.len();
        if len == 0 {
            return None;
        }
        let previous = self
            .current
            .map_or(len - 1, |idx| if idx == 0 { len - 1 } else { idx - 1 });
        self.current = Some(previous);
        self.matches.get(previous)
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub const fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    pub const fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Cursor position with `-1` meaning "no current match".
    pub fn current_index_signed(&self) -> isize {
        self.current
            .and_then(|idx| isize::try_from(idx).ok())
            .unwrap_or(-1)
    }

    pub fn current(&self) -> Option<&SearchMatch> {
        self.current.and_then(|idx| self.matches.get(idx))
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Matches on one rendered line, in column order.
    pub fn matches_on_line(&self, line: usize) -> &[SearchMatch] {
        let start = self.matches.partition_point(|m| m.line < line);
        let end = self.matches.partition_point(|m| m.line <= line);
        &self.matches[start..end]
    }
}

/// All non-overlapping occurrences of `query` in `lines`, in reading order.
pub fn find_matches(lines: &[RenderedLine], query: &str, case_sensitive: bool) -> Vec<SearchMatch> {
    let needle = fold(query, case_sensitive);
    if needle.is_empty() {
        return Vec::new();
    }

    let mut matches = Vec::new();
    for (line_idx, line) in lines.iter().enumerate() {
        let haystack = fold(line.content(), case_sensitive);
        let mut col = 0usize;
        while col + needle.len() <= haystack.len() {
            if haystack[col..col + needle.len()] == needle[..] {
                matches.push(SearchMatch {
                    line: line_idx,
                    start: col,
                    end: col + needle.len(),
                });
                col += needle.len();
            } else {
                col += 1;
            }
        }
    }
    matches
}

/// Chars of `text`, lowercased one-to-one when case-insensitive so columns
/// stay aligned with the original.
fn fold(text: &str, case_sensitive: bool) -> Vec<char> {
    if case_sensitive {
        return text.chars().collect();
    }
    text.chars()
        .map(|ch| {
            let mut lower = ch.to_lowercase();
            match (lower.next(), lower.next()) {
                (Some(single), None) => single,
                _ => ch,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::LineType;
    use proptest::prelude::*;

    fn lines(texts: &[&str]) -> Vec<RenderedLine> {
        texts
            .iter()
            .map(|t| RenderedLine::new((*t).to_string(), LineType::Paragraph))
            .collect()
    }

    #[test]
    fn test_search_counts_occurrences() {
        let doc = lines(&["Hello world", "world of worlds"]);
        let mut state = SearchState::new();
        assert_eq!(state.search(&doc, "world", false), 3);
        assert_eq!(state.current_index(), Some(0));
        assert_eq!(
            state.matches()[2],
            SearchMatch {
                line: 1,
                start: 9,
                end: 14
            }
        );
    }

    #[test]
    fn test_empty_query_clears() {
        let doc = lines(&["Hello world"]);
        let mut state = SearchState::new();
        state.search(&doc, "world", false);
        assert_eq!(state.search(&doc, "", false), 0);
        assert!(state.matches().is_empty());
        assert_eq!(state.current_index_signed(), -1);
        assert_eq!(state.query(), None);
    }

    #[test]
    fn test_no_match_has_no_cursor() {
        let doc = lines(&["Hello world"]);
        let mut state = SearchState::new();
        assert_eq!(state.search(&doc, "absent", false), 0);
        assert_eq!(state.current_index(), None);
        assert!(state.next().is_none());
        assert!(state.previous().is_none());
    }

    #[test]
    fn test_case_insensitive_by_default() {
        let doc = lines(&["Rust rust RUST"]);
        let mut state = SearchState::new();
        assert_eq!(state.search(&doc, "rust", false), 3);
        assert_eq!(state.search(&doc, "rust", true), 1);
    }

    #[test]
    fn test_matches_do_not_overlap() {
        let doc = lines(&["aaaa"]);
        let mut state = SearchState::new();
        assert_eq!(state.search(&doc, "aa", true), 2);
        assert_eq!(state.search(&doc, "aaa", true), 1);
    }

    #[test]
    fn test_columns_are_chars_not_bytes() {
        let doc = lines(&["héllo wörld"]);
        let mut state = SearchState::new();
        state.search(&doc, "wörld", false);
        assert_eq!(state.matches()[0].start, 6);
        assert_eq!(state.matches()[0].end, 11);
    }

    #[test]
    fn test_multi_char_lowercase_keeps_columns() {
        // 'İ' lowercases to two chars; it must stay one column.
        let doc = lines(&["İx x"]);
        let mut state = SearchState::new();
        state.search(&doc, "x", false);
        assert_eq!(state.matches()[0].start, 1);
        assert_eq!(state.matches()[1].start, 3);
    }

    #[test]
    fn test_next_and_previous_wrap() {
        let doc = lines(&["a a a"]);
        let mut state = SearchState::new();
        state.search(&doc, "a", true);
        assert_eq!(state.previous().map(|m| m.start), Some(4));
        assert_eq!(state.current_index(), Some(2));
        assert_eq!(state.next().map(|m| m.start), Some(0));
        assert_eq!(state.next().map(|m| m.start), Some(2));
    }

    #[test]
    fn test_new_query_discards_results() {
        let doc = lines(&["cat dog cat"]);
        let mut state = SearchState::new();
        state.search(&doc, "cat", false);
        state.next();
        assert_eq!(state.search(&doc, "dog", false), 1);
        assert_eq!(state.current_index(), Some(0));
        assert_eq!(state.query(), Some("dog"));
    }

    #[test]
    fn test_refresh_clamps_cursor() {
        let mut state = SearchState::new();
        state.search(&lines(&["x x x"]), "x", false);
        state.previous();
        assert_eq!(state.current_index(), Some(2));

        assert!(state.refresh(&lines(&["x"])));
        assert_eq!(state.current_index(), Some(0));
        assert!(!state.refresh(&lines(&["x"])));

        assert!(state.refresh(&lines(&["none"])));
        assert_eq!(state.current_index(), None);
        assert_eq!(state.query(), Some("x"));
    }

    #[test]
    fn test_refresh_without_query_is_noop() {
        let mut state = SearchState::new();
        assert!(!state.refresh(&lines(&["x"])));
    }

    #[test]
    fn test_matches_on_line() {
        let doc = lines(&["a", "b a a", "c"]);
        let mut state = SearchState::new();
        state.search(&doc, "a", false);
        assert_eq!(state.matches_on_line(1).len(), 2);
        assert!(state.matches_on_line(2).is_empty());
    }

    proptest! {
        #[test]
        fn prop_count_matches_occurrences(
            texts in prop::collection::vec("[ab ]{0,20}", 0..10),
            query in "[ab]{1,3}",
        ) {
            let doc: Vec<RenderedLine> = texts
                .iter()
                .map(|t| RenderedLine::new(t.clone(), LineType::Paragraph))
                .collect();
            let expected: usize = texts.iter().map(|t| t.matches(query.as_str()).count()).sum();
            let mut state = SearchState::new();
            prop_assert_eq!(state.search(&doc, &query, true), expected);
            prop_assert_eq!(state.matches().len(), expected);
        }

        #[test]
        fn prop_next_cycles(count in 1usize..30) {
            let text = vec!["z"; count].join(" ");
            let doc = lines(&[text.as_str()]);
            let mut state = SearchState::new();
            prop_assert_eq!(state.search(&doc, "z", false), count);
            for _ in 0..count {
                state.next();
            }
            prop_assert_eq!(state.current_index(), Some(0));
            for _ in 0..count {
                state.previous();
            }
            prop_assert_eq!(state.current_index(), Some(0));
        }
    }
}
