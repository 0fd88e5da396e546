use std::collections::HashMap;

use crate::errors::{SearchError, SearchResult};

/// Bad-character shift table for a single pattern.
///
/// Every character in `pattern[..len - 1]` maps to `len - 1 - last_index`,
/// where `last_index` is its last position in that prefix. Anything else,
/// including the final character when it does not occur earlier, shifts by
/// the full pattern length. The table is never mutated after construction.
#[derive(Debug, Clone)]
pub struct ShiftTable {
    shifts: HashMap<char, usize>,
    fallback: usize,
}

impl ShiftTable {
    /// Builds the table for a non-empty pattern given as characters
    pub fn new(pattern: &[char]) -> Self {
        let len = pattern.len();
        let mut shifts = HashMap::with_capacity(len);
        if let Some((_, prefix)) = pattern.split_last() {
            for (index, &c) in prefix.iter().enumerate() {
                shifts.insert(c, len - 1 - index);
            }
        }
        Self {
            shifts,
            fallback: len,
        }
    }

    /// Returns how far the window may slide when `c` sits under the last pattern position
    #[inline]
    pub fn shift(&self, c: char) -> usize {
        self.shifts.get(&c).copied().unwrap_or(self.fallback)
    }

    /// Shift used for characters absent from the table
    pub fn fallback(&self) -> usize {
        self.fallback
    }

    /// Number of explicit entries
    pub fn len(&self) -> usize {
        self.shifts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }
}

/// Boyer-Moore-Horspool matcher for a single fixed pattern.
///
/// Positions are character offsets, not byte offsets. A matcher is immutable
/// and can be shared across threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: String,
    chars: Vec<char>,
    table: ShiftTable,
}

impl PatternMatcher {
    /// Creates a matcher, rejecting the empty pattern
    pub fn new(pattern: impl Into<String>) -> SearchResult<Self> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(SearchError::invalid_pattern("pattern must not be empty"));
        }
        let chars: Vec<char> = pattern.chars().collect();
        let table = ShiftTable::new(&chars);
        Ok(Self {
            pattern,
            chars,
            table,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn shift_table(&self) -> &ShiftTable {
        &self.table
    }

    /// Returns the character index of the leftmost occurrence, if any
    pub fn find(&self, text: &str) -> Option<usize> {
        let text: Vec<char> = text.chars().collect();
        self.find_in_chars(&text)
    }

    /// Same as [`find`](Self::find) over pre-split characters
    pub fn find_in_chars(&self, text: &[char]) -> Option<usize> {
        let m = self.chars.len();
        let n = text.len();
        if m > n {
            return None;
        }

        let mut i = 0;
        while i <= n - m {
            let mut j = m;
            while j > 0 && text[i + j - 1] == self.chars[j - 1] {
                j -= 1;
            }
            if j == 0 {
                return Some(i);
            }
            i += self.table.shift(text[i + m - 1]);
        }
        None
    }
}

/// One-shot search: builds the shift table and scans `text` once.
pub fn search(text: &str, pattern: &str) -> SearchResult<Option<usize>> {
    Ok(PatternMatcher::new(pattern)?.find(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_find(text: &str, pattern: &str) -> Option<usize> {
        let text: Vec<char> = text.chars().collect();
        let pattern: Vec<char> = pattern.chars().collect();
        if pattern.len() > text.len() {
            return None;
        }
        (0..=text.len() - pattern.len()).find(|&i| text[i..i + pattern.len()] == pattern[..])
    }

    #[test]
    fn test_finds_first_occurrence() {
        assert_eq!(search("the algorithm list", "algorithm").unwrap(), Some(4));
        assert_eq!(search("abcabcabc", "cab").unwrap(), Some(2));
        assert_eq!(search("nothing here", "algorithm").unwrap(), None);
    }

    #[test]
    fn test_boundaries() {
        // Pattern longer than text
        assert_eq!(search("abc", "abcd").unwrap(), None);
        // Pattern equal to text
        assert_eq!(search("needle", "needle").unwrap(), Some(0));
        // Pattern at the very end
        assert_eq!(search("hay hay needle", "needle").unwrap(), Some(8));
        // Single character at both ends
        assert_eq!(search("xab", "x").unwrap(), Some(0));
        assert_eq!(search("abx", "x").unwrap(), Some(2));
    }

    #[test]
    fn test_only_leftmost_match_reported() {
        assert_eq!(search("aaaa", "aa").unwrap(), Some(0));
        assert_eq!(search("xx test yy test", "test").unwrap(), Some(3));
    }

    #[test]
    fn test_character_offsets_for_non_ascii_text() {
        let text = "Аналіз алгоритмів сортування";
        assert_eq!(search(text, "алгоритмів").unwrap(), Some(7));
    }

    #[test]
    fn test_empty_pattern_rejected() {
        assert!(matches!(
            PatternMatcher::new(""),
            Err(SearchError::InvalidPattern(_))
        ));
        assert!(search("text", "").is_err());
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(search("", "a").unwrap(), None);
    }

    #[test]
    fn test_shift_table_values() {
        let chars: Vec<char> = "abcab".chars().collect();
        let table = ShiftTable::new(&chars);
        // Prefix "abca": last 'a' at 3, 'b' at 1, 'c' at 2
        assert_eq!(table.shift('a'), 1);
        assert_eq!(table.shift('b'), 3);
        assert_eq!(table.shift('c'), 2);
        assert_eq!(table.shift('z'), 5);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_shift_table_last_char_falls_back() {
        let chars: Vec<char> = "algorithm".chars().collect();
        let table = ShiftTable::new(&chars);
        assert_eq!(table.shift('m'), 9);
        assert_eq!(table.shift('a'), 8);
        assert_eq!(table.shift('h'), 1);
        assert_eq!(table.fallback(), 9);
    }

    #[test]
    fn test_shift_table_formula_holds_for_every_prefix_char() {
        for pattern in ["algorithm", "abracadabra", "mississippi", "aaaa", "x", "алгоритмів"] {
            let chars: Vec<char> = pattern.chars().collect();
            let table = ShiftTable::new(&chars);
            let len = chars.len();
            let prefix = &chars[..len - 1];
            for &c in prefix {
                let last = prefix.iter().rposition(|&p| p == c).unwrap();
                assert_eq!(table.shift(c), len - 1 - last, "pattern {pattern}, char {c}");
            }
            let last_char = chars[len - 1];
            if !prefix.contains(&last_char) {
                assert_eq!(table.shift(last_char), len);
            }
            assert_eq!(table.shift('\u{1F600}'), len);
        }
    }

    #[test]
    fn test_matches_naive_scan() {
        let texts = [
            "",
            "a",
            "abracadabra",
            "mississippi river",
            "the quick brown fox jumps over the lazy dog",
            "aaaaaaaaab",
            "ababababababc",
            "пошук алгоритмів у тексті алгоритмів",
        ];
        let patterns = [
            "a", "ab", "abra", "cad", "issi", "ppi", "river", "dog", "the", "aab", "abc", "bab",
            "алгоритмів", "zzz", "mississippi river!",
        ];
        for text in texts {
            for pattern in patterns {
                assert_eq!(
                    search(text, pattern).unwrap(),
                    naive_find(text, pattern),
                    "text {text:?}, pattern {pattern:?}"
                );
            }
        }
    }

    #[test]
    fn test_matcher_is_reusable() {
        let matcher = PatternMatcher::new("fox").unwrap();
        assert_eq!(matcher.find("a fox"), Some(2));
        assert_eq!(matcher.find("no match"), None);
        assert_eq!(matcher.find("fox"), Some(0));
        assert_eq!(matcher.pattern(), "fox");
    }
}
