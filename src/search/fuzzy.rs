//! Fuzzy Matching Engine
//!
//! Approximate substring matching: the score of a text is the smallest edit
//! distance between the pattern and any substring of the text, divided by
//! the pattern length. Matching is case-insensitive and, when location is
//! ignored, independent of where in the text the match occurs.
//!
//! Match ranges are reported as inclusive UTF-16 code-unit offsets so they can
//! be handed to a browser or to [`super::highlight`] unchanged.

use unicode_normalization::UnicodeNormalization;

/// Smallest score reported for a non-identical match
pub const MIN_SCORE: f64 = 0.001;

/// Match result with score and position information
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyMatch {
    /// 0 for an identical value, otherwise in [MIN_SCORE, threshold]
    pub score: f64,
    /// Edit distance of the best occurrence
    pub errors: usize,
    /// Matched runs as inclusive (start, end) UTF-16 offsets, ascending
    pub ranges: Vec<(usize, usize)>,
}

/// A query prepared for repeated matching
#[derive(Debug, Clone)]
pub struct Pattern {
    chars: Vec<char>,
}

impl Pattern {
    /// Prepare a needle; `None` when it is empty after normalization
    pub fn new(needle: &str) -> Option<Self> {
        let normalized = normalize_query(needle);
        if normalized.is_empty() {
            return None;
        }
        Some(Self {
            chars: normalized.chars().map(fold_char).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

/// Fuzzy matcher with configuration
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    threshold: f64,
    min_match_len: usize,
    ignore_location: bool,
    /// Offset divisor for the location penalty when location matters
    distance: usize,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new(0.35, 2, true)
    }
}

impl FuzzyMatcher {
    pub fn new(threshold: f64, min_match_len: usize, ignore_location: bool) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            min_match_len: min_match_len.max(1),
            ignore_location,
            distance: 100,
        }
    }

    /// Largest edit distance still accepted for a pattern of this length
    pub fn max_errors(&self, pattern_len: usize) -> usize {
        (self.threshold * pattern_len as f64 + 1e-9).floor() as usize
    }

    /// Perform fuzzy matching between needle and haystack
    ///
    /// Returns Some(FuzzyMatch) if there's a match, None otherwise
    #[allow(dead_code)]
    pub fn fuzzy_match(&self, haystack: &str, needle: &str) -> Option<FuzzyMatch> {
        let pattern = Pattern::new(needle)?;
        self.match_pattern(haystack, &pattern)
    }

    /// Match an already prepared pattern
    pub fn match_pattern(&self, haystack: &str, pattern: &Pattern) -> Option<FuzzyMatch> {
        let text = fold(haystack);
        let m = pattern.len();
        if pattern.is_empty() || text.is_empty() {
            return None;
        }

        let max_errors = self.max_errors(m);
        let occurrences = find_occurrences(&pattern.chars, &text, max_errors);

        let (errors, best_score) = occurrences
            .iter()
            .map(|occ| (occ.errors, self.occurrence_score(occ, m, &text)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))?;

        if best_score > self.threshold {
            return None;
        }

        let ranges: Vec<(usize, usize)> = occurrences
            .iter()
            .flat_map(|occ| matched_runs(&occ.matched))
            .filter(|(first, last)| last - first + 1 >= self.min_match_len)
            .map(|(first, last)| (text[first].offset, text[last].offset + text[last].width - 1))
            .collect();

        // Fragments shorter than the minimum never count as a match
        if ranges.is_empty() {
            return None;
        }

        let identical = text.len() == m && text.iter().zip(&pattern.chars).all(|(t, p)| t.ch == *p);
        let score = if identical { 0.0 } else { best_score.max(MIN_SCORE) };

        Some(FuzzyMatch {
            score,
            errors,
            ranges,
        })
    }

    fn occurrence_score(&self, occ: &Occurrence, pattern_len: usize, text: &[FoldedChar]) -> f64 {
        let accuracy = occ.errors as f64 / pattern_len as f64;
        if self.ignore_location {
            return accuracy;
        }
        let offset = text.get(occ.start).map(|c| c.offset).unwrap_or(0);
        accuracy + offset as f64 / self.distance as f64
    }
}

/// Normalize query text: NFC composition, surrounding whitespace removed
pub fn normalize_query(text: &str) -> String {
    text.nfc().collect::<String>().trim().to_string()
}

#[derive(Debug, Clone, Copy)]
struct FoldedChar {
    ch: char,
    /// UTF-16 offset of this char in the original text
    offset: usize,
    /// UTF-16 width of the original char
    width: usize,
}

fn fold_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

fn fold(text: &str) -> Vec<FoldedChar> {
    let mut offset = 0;
    text.chars()
        .map(|c| {
            let folded = FoldedChar {
                ch: fold_char(c),
                offset,
                width: c.len_utf16(),
            };
            offset += folded.width;
            folded
        })
        .collect()
}

#[derive(Debug, Clone)]
struct Occurrence {
    /// First text position (char index) of the aligned substring
    start: usize,
    errors: usize,
    /// Text positions aligned with an equal pattern char, ascending
    matched: Vec<usize>,
}

/// Distance of the best alignment of the whole pattern ending at each text position
fn end_distances(pattern: &[char], text: &[FoldedChar]) -> Vec<usize> {
    let m = pattern.len();
    let mut column: Vec<usize> = (0..=m).collect();
    let mut next = vec![0usize; m + 1];
    let mut out = Vec::with_capacity(text.len());

    for t in text {
        next[0] = 0;
        for i in 1..=m {
            let cost = usize::from(pattern[i - 1] != t.ch);
            next[i] = (column[i - 1] + cost)
                .min(column[i] + 1)
                .min(next[i - 1] + 1);
        }
        std::mem::swap(&mut column, &mut next);
        out.push(column[m]);
    }

    out
}

/// Non-overlapping occurrences within `max_errors`, left to right
fn find_occurrences(pattern: &[char], text: &[FoldedChar], max_errors: usize) -> Vec<Occurrence> {
    let ends = end_distances(pattern, text);
    let mut occurrences: Vec<Occurrence> = Vec::new();
    let mut j = 0;

    while j < ends.len() {
        if ends[j] > max_errors {
            j += 1;
            continue;
        }

        // The best end is within max_errors chars of the first acceptable one
        let window_end = (j + max_errors).min(ends.len() - 1);
        let best_end = (j..=window_end).min_by_key(|&k| (ends[k], k)).unwrap_or(j);

        let occ = align(pattern, text, best_end, max_errors);
        let disjoint = occurrences
            .last()
            .map_or(true, |prev| occ.start > prev.matched.last().copied().unwrap_or(prev.start));
        if disjoint && !occ.matched.is_empty() {
            occurrences.push(occ);
        }

        j = best_end + 1;
    }

    occurrences
}

/// Recover the alignment of the best substring ending at `end`
fn align(pattern: &[char], text: &[FoldedChar], end: usize, max_errors: usize) -> Occurrence {
    let m = pattern.len();
    // A substring within max_errors is at most m + max_errors chars long
    let window_start = (end + 1).saturating_sub(m + max_errors);
    let window = &text[window_start..=end];
    let n = window.len();

    let cols = n + 1;
    let mut table = vec![0usize; (m + 1) * cols];
    for i in 0..=m {
        table[i * cols] = i;
    }
    for i in 1..=m {
        for j in 1..=n {
            let cost = usize::from(pattern[i - 1] != window[j - 1].ch);
            table[i * cols + j] = (table[(i - 1) * cols + j - 1] + cost)
                .min(table[(i - 1) * cols + j] + 1)
                .min(table[i * cols + j - 1] + 1);
        }
    }

    let errors = table[m * cols + n];
    let mut matched = Vec::new();
    let (mut i, mut j) = (m, n);

    while i > 0 {
        let here = table[i * cols + j];
        if j > 0 && pattern[i - 1] == window[j - 1].ch && here == table[(i - 1) * cols + j - 1] {
            matched.push(window_start + j - 1);
            i -= 1;
            j -= 1;
        } else if j > 0 && here == table[(i - 1) * cols + j - 1] + 1 {
            i -= 1;
            j -= 1;
        } else if here == table[(i - 1) * cols + j] + 1 {
            i -= 1;
        } else {
            j -= 1;
        }
    }

    matched.reverse();
    Occurrence {
        start: window_start + j,
        errors,
        matched,
    }
}

/// Group ascending positions into runs of consecutive positions
fn matched_runs(positions: &[usize]) -> Vec<(usize, usize)> {
    let mut runs: Vec<(usize, usize)> = Vec::new();
    for &p in positions {
        match runs.last_mut() {
            Some(run) if run.1 + 1 == p => run.1 = p,
            _ => runs.push((p, p)),
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_substring_match() {
        let matcher = FuzzyMatcher::default();
        let m = matcher
            .fuzzy_match("Getting Started with Widgets", "widget")
            .unwrap();
        assert_eq!(m.errors, 0);
        assert_eq!(m.score, MIN_SCORE);
        assert_eq!(m.ranges, vec![(21, 26)]);
    }

    #[test]
    fn test_identical_value_scores_zero() {
        let matcher = FuzzyMatcher::default();
        let m = matcher.fuzzy_match("Guide", "guide").unwrap();
        assert_eq!(m.score, 0.0);
        assert_eq!(m.ranges, vec![(0, 4)]);
    }

    #[test]
    fn test_typo_tolerated() {
        let matcher = FuzzyMatcher::default();
        let m = matcher.fuzzy_match("Deploying with containers", "contaners").unwrap();
        assert_eq!(m.errors, 1);
        assert!(m.score > 0.0 && m.score <= 0.35);
    }

    #[test]
    fn test_too_many_errors_rejected() {
        let matcher = FuzzyMatcher::default();
        assert!(matcher.fuzzy_match("hello world", "xyzzy").is_none());
    }

    #[test]
    fn test_single_char_never_matches() {
        let matcher = FuzzyMatcher::default();
        assert!(matcher.fuzzy_match("a b c", "a").is_none());
    }

    #[test]
    fn test_empty_needle() {
        let matcher = FuzzyMatcher::default();
        assert!(matcher.fuzzy_match("hello", "").is_none());
        assert!(matcher.fuzzy_match("hello", "   ").is_none());
    }

    #[test]
    fn test_empty_haystack() {
        let matcher = FuzzyMatcher::default();
        assert!(matcher.fuzzy_match("", "hello").is_none());
    }

    #[test]
    fn test_multiple_occurrences_reported() {
        let matcher = FuzzyMatcher::default();
        let m = matcher.fuzzy_match("rust and more rust", "rust").unwrap();
        assert_eq!(m.ranges, vec![(0, 3), (14, 17)]);
    }

    #[test]
    fn test_location_does_not_matter_when_ignored() {
        let matcher = FuzzyMatcher::default();
        let near = matcher.fuzzy_match("widget", "widget").unwrap();
        let far_text = format!("{}widget", "x ".repeat(500));
        let far = matcher.fuzzy_match(&far_text, "widget").unwrap();
        assert_eq!(far.errors, near.errors);
        assert_eq!(far.score, MIN_SCORE);
    }

    #[test]
    fn test_location_penalized_when_not_ignored() {
        let matcher = FuzzyMatcher::new(0.35, 2, false);
        assert!(matcher.fuzzy_match("widget at the start", "widget").is_some());
        let far_text = format!("{}widget", "x ".repeat(100));
        assert!(matcher.fuzzy_match(&far_text, "widget").is_none());
    }

    #[test]
    fn test_offsets_are_utf16() {
        let matcher = FuzzyMatcher::default();
        // The emoji occupies two UTF-16 code units
        let m = matcher.fuzzy_match("😊 rust", "rust").unwrap();
        assert_eq!(m.ranges, vec![(3, 6)]);
    }

    #[test]
    fn test_case_insensitive() {
        let matcher = FuzzyMatcher::default();
        assert!(matcher.fuzzy_match("HELLO WORLD", "world").is_some());
    }

    #[test]
    fn test_unicode_normalization_of_query() {
        let matcher = FuzzyMatcher::default();
        // Decomposed e + combining acute in the query matches the composed form
        let m = matcher.fuzzy_match("café", "cafe\u{301}").unwrap();
        assert_eq!(m.score, 0.0);
    }

    #[test]
    fn test_max_errors() {
        let matcher = FuzzyMatcher::default();
        assert_eq!(matcher.max_errors(6), 2);
        assert_eq!(matcher.max_errors(20), 7);
        assert_eq!(matcher.max_errors(2), 0);
    }

    #[test]
    fn test_matched_runs() {
        assert_eq!(matched_runs(&[1, 2, 3, 7, 8]), vec![(1, 3), (7, 8)]);
        assert!(matched_runs(&[]).is_empty());
    }
}
