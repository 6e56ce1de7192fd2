//! Search Engine Integration
//!
//! Ties together fuzzy matching and ranking over a loaded document
//! collection. The engine is built once and only read afterwards.

use serde::Serialize;
use tracing::{debug, trace};

use super::document::Document;
use super::fuzzy::{FuzzyMatcher, Pattern};
use super::ranking::{document_score, field_norm, Field, FieldScore, ScoringWeights};

/// Matching configuration
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Highest accepted fuzzy score per field value (0 exact, 1 anything)
    pub threshold: f64,
    /// Shortest run of matched characters that counts
    pub min_match_char_length: usize,
    /// Do not penalize matches far from the start of a field
    pub ignore_location: bool,
    /// Sort results best first
    pub should_sort: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            threshold: 0.35,
            min_match_char_length: 2,
            ignore_location: true,
            should_sort: true,
        }
    }
}

/// Ranges matched inside one field value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMatch {
    pub key: Field,
    /// Element index for array fields (tags, categories)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_index: Option<usize>,
    /// Inclusive (start, end) UTF-16 offsets
    pub indices: Vec<(usize, usize)>,
}

/// Search result with content and score
#[derive(Debug, Clone)]
pub struct QueryResult<'a> {
    /// The matched item
    pub item: &'a Document,
    /// Position of the item in the index
    pub ref_index: usize,
    /// Relevance score in [0, 1], lower is better
    pub score: f64,
    pub matches: Vec<FieldMatch>,
}

/// Search engine over an immutable document collection
#[derive(Debug)]
pub struct SearchEngine {
    documents: Vec<Document>,
    matcher: FuzzyMatcher,
    scoring_weights: ScoringWeights,
    options: SearchOptions,
}

impl SearchEngine {
    /// Create a new search engine with the default configuration
    pub fn new(documents: Vec<Document>) -> Self {
        Self::with_config(documents, ScoringWeights::default(), SearchOptions::default())
    }

    pub fn with_config(
        documents: Vec<Document>,
        scoring_weights: ScoringWeights,
        options: SearchOptions,
    ) -> Self {
        let matcher = FuzzyMatcher::new(
            options.threshold,
            options.min_match_char_length,
            options.ignore_location,
        );
        Self {
            documents,
            matcher,
            scoring_weights,
            options,
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Search all documents; best first when sorting is enabled
    pub fn search(&self, query: &str) -> Vec<QueryResult<'_>> {
        let Some(pattern) = Pattern::new(query) else {
            return Vec::new();
        };

        let mut results: Vec<QueryResult<'_>> = self
            .documents
            .iter()
            .enumerate()
            .filter_map(|(ref_index, doc)| self.match_document(ref_index, doc, &pattern))
            .collect();

        if self.options.should_sort {
            // Stable: equal scores keep index order
            results.sort_by(|a, b| {
                a.score
                    .partial_cmp(&b.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        debug!(
            "Query {:?} matched {} of {} documents",
            query,
            results.len(),
            self.documents.len()
        );
        results
    }

    /// Match a single document against the pattern
    fn match_document<'a>(
        &self,
        ref_index: usize,
        doc: &'a Document,
        pattern: &Pattern,
    ) -> Option<QueryResult<'a>> {
        let mut field_scores = Vec::new();
        let mut matches = Vec::new();

        for (field, weight) in self.scoring_weights.iter() {
            for (element, value) in doc.field_values(field) {
                let Some(fuzzy) = self.matcher.match_pattern(value, pattern) else {
                    continue;
                };
                trace!("{:?} matched {:?} with {} errors", field, value, fuzzy.errors);

                field_scores.push(FieldScore {
                    weight,
                    norm: field_norm(value),
                    score: fuzzy.score,
                });
                matches.push(FieldMatch {
                    key: field,
                    ref_index: element,
                    indices: fuzzy.ranges,
                });
            }
        }

        if matches.is_empty() {
            return None;
        }

        Some(QueryResult {
            item: doc,
            ref_index,
            score: document_score(&field_scores),
            matches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(title: &str, content: &str) -> Document {
        Document {
            title: title.to_string(),
            permalink: format!("/{}/", title.to_lowercase().replace(' ', "-")),
            content: content.to_string(),
            date: "2024-01-15".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_search_basic() {
        let engine = SearchEngine::new(vec![
            doc("Hello world", "first"),
            doc("Goodbye world", "second"),
            doc("Hello there", "third"),
        ]);

        let results = engine.search("hello");

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.item.title.contains("Hello")));
    }

    #[test]
    fn test_search_no_match() {
        let engine = SearchEngine::new(vec![doc("Hello world", "nothing here")]);
        assert!(engine.search("xyz").is_empty());
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let engine = SearchEngine::new(vec![doc("Hello world", "")]);
        assert!(engine.search("").is_empty());
        assert!(engine.search("   ").is_empty());
    }

    #[test]
    fn test_search_ranking_title_beats_content() {
        let engine = SearchEngine::new(vec![
            doc("Cooking notes", "a short piece about rust"),
            doc("Rust", "unrelated body"),
        ]);

        let results = engine.search("rust");

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].item.title, "Rust");
        assert!(results[0].score < results[1].score);
    }

    #[test]
    fn test_search_fuzzy_typo() {
        let engine = SearchEngine::new(vec![doc("Deploying containers", "")]);
        let results = engine.search("contaners");
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_scores_in_unit_interval() {
        let engine = SearchEngine::new(vec![
            doc("Widgets", "widgets widgets"),
            doc("Gadgets", "and a widget"),
        ]);
        for r in engine.search("widget") {
            assert!((0.0..=1.0).contains(&r.score));
        }
    }

    #[test]
    fn test_array_fields_record_element() {
        let mut d = doc("Plain", "");
        d.tags = vec!["misc".into(), "rustlang".into()];
        let engine = SearchEngine::new(vec![d]);

        let results = engine.search("rustlang");

        assert_eq!(results.len(), 1);
        let tag_match = results[0]
            .matches
            .iter()
            .find(|m| m.key == Field::Tags)
            .unwrap();
        assert_eq!(tag_match.ref_index, Some(1));
        assert_eq!(tag_match.indices, vec![(0, 7)]);
    }

    #[test]
    fn test_unsorted_keeps_index_order() {
        let options = SearchOptions {
            should_sort: false,
            ..Default::default()
        };
        let engine = SearchEngine::with_config(
            vec![doc("Cooking notes", "about rust"), doc("Rust", "")],
            ScoringWeights::default(),
            options,
        );

        let results = engine.search("rust");

        assert_eq!(results[0].ref_index, 0);
        assert_eq!(results[1].ref_index, 1);
    }

    #[test]
    fn test_categories_outrank_summary() {
        let mut alpha = doc("Alpha", "");
        alpha.categories = vec!["widgets".into()];
        let mut beta = doc("Beta", "");
        beta.summary = Some("widgets".into());
        let engine = SearchEngine::new(vec![beta, alpha]);

        let results = engine.search("widget");

        let titles: Vec<&str> = results.iter().map(|r| r.item.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Beta"]);
        assert!(results[0].score < results[1].score);
    }

    #[test]
    fn test_scaled_weights_rank_identically() {
        let docs = vec![
            doc("Widgets in depth", "widgets"),
            doc("Other", "all about widget factories"),
            doc("Gizmos", "a widgt typo"),
        ];
        let scaled = ScoringWeights::new(vec![
            (Field::Title, 5.0),
            (Field::Tags, 2.0),
            (Field::Categories, 1.5),
            (Field::Summary, 1.0),
            (Field::Content, 0.5),
        ]);
        let a = SearchEngine::new(docs.clone());
        let b = SearchEngine::with_config(docs, scaled, SearchOptions::default());

        let order_a: Vec<usize> = a.search("widget").iter().map(|r| r.ref_index).collect();
        let order_b: Vec<usize> = b.search("widget").iter().map(|r| r.ref_index).collect();

        assert_eq!(order_a, order_b);
        assert_eq!(order_a.len(), 3);
    }
}
