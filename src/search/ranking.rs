//! Ranking & Scoring System
//!
//! Combines per-field fuzzy scores into one document score with configurable
//! field weights. Scores follow the engine convention: 0 is a perfect match,
//! 1 is no match at all.

use serde::{Deserialize, Serialize};

/// Searchable document fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Tags,
    Categories,
    Summary,
    Content,
}

/// Scoring weights for the searchable fields
///
/// Weights are normalized by their sum on construction, so only their
/// proportions matter. The default orders fields title, tags, categories,
/// summary, content.
#[derive(Debug, Clone)]
pub struct ScoringWeights {
    weights: Vec<(Field, f64)>,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::new(vec![
            (Field::Title, 0.5),
            (Field::Tags, 0.2),
            (Field::Categories, 0.15),
            (Field::Summary, 0.1),
            (Field::Content, 0.05),
        ])
    }
}

impl ScoringWeights {
    /// Build a weight table; non-positive or non-finite weights fall back to 1
    pub fn new(weights: Vec<(Field, f64)>) -> Self {
        let sanitized: Vec<(Field, f64)> = weights
            .into_iter()
            .map(|(field, w)| (field, if w.is_finite() && w > 0.0 { w } else { 1.0 }))
            .collect();

        let total: f64 = sanitized.iter().map(|(_, w)| w).sum();
        let weights = sanitized
            .into_iter()
            .map(|(field, w)| (field, if total > 0.0 { w / total } else { 0.0 }))
            .collect();

        Self { weights }
    }

    /// Normalized weight for a field, 0 if the field is not searched
    #[cfg(test)]
    pub fn weight(&self, field: Field) -> f64 {
        self.weights
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, f64)> + '_ {
        self.weights.iter().copied()
    }
}

/// Score of one matched field value
#[derive(Debug, Clone, Copy)]
pub struct FieldScore {
    pub weight: f64,
    /// Length norm of the matched value, see [`field_norm`]
    pub norm: f64,
    /// Fuzzy score in [0, 1]
    pub score: f64,
}

/// Length norm: 1/sqrt(number of space-separated tokens), rounded to 3 decimals
///
/// Longer values contribute a gentler factor to the document score.
pub fn field_norm(text: &str) -> f64 {
    let tokens = text.split_whitespace().count().max(1) as f64;
    (1.0 / tokens.sqrt() * 1000.0).round() / 1000.0
}

/// Combine matched field scores into a document score in [0, 1]
///
/// Each matched value multiplies the total by `score^(weight * norm)`, so
/// matching more fields, or heavier ones, drives the score towards 0.
pub fn document_score(fields: &[FieldScore]) -> f64 {
    let total = fields.iter().fold(1.0_f64, |acc, f| {
        let base = if f.score == 0.0 && f.weight > 0.0 {
            f64::EPSILON
        } else {
            f.score
        };
        let exponent = if f.weight > 0.0 { f.weight } else { 1.0 } * f.norm;
        acc * base.powf(exponent)
    });

    total.clamp(0.0, 1.0)
}

/// Relevance percentage shown to users: round((1 - score) * 100)
pub fn relevance_percent(score: f64) -> u32 {
    let score = if score.is_finite() { score.clamp(0.0, 1.0) } else { 1.0 };
    ((1.0 - score) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_normalized() {
        let weights = ScoringWeights::default();
        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!((weights.weight(Field::Title) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_field_ordering() {
        let weights = ScoringWeights::default();
        assert!(weights.weight(Field::Title) > weights.weight(Field::Tags));
        assert!(weights.weight(Field::Tags) > weights.weight(Field::Categories));
        assert!(weights.weight(Field::Categories) > weights.weight(Field::Summary));
        assert!(weights.weight(Field::Summary) > weights.weight(Field::Content));
    }

    #[test]
    fn test_unnormalized_weights_scale_down() {
        let a = ScoringWeights::new(vec![(Field::Title, 3.0), (Field::Content, 1.0)]);
        assert!((a.weight(Field::Title) - 0.75).abs() < 1e-9);
        assert!((a.weight(Field::Content) - 0.25).abs() < 1e-9);
        assert_eq!(a.weight(Field::Tags), 0.0);
    }

    #[test]
    fn test_field_norm() {
        assert_eq!(field_norm("word"), 1.0);
        assert_eq!(field_norm("two words"), 0.707);
        assert_eq!(field_norm("getting started with widgets"), 0.5);
        assert_eq!(field_norm(""), 1.0);
    }

    #[test]
    fn test_document_score_no_fields_is_worst() {
        assert_eq!(document_score(&[]), 1.0);
    }

    #[test]
    fn test_document_score_more_fields_is_better() {
        let one = document_score(&[FieldScore { weight: 0.5, norm: 1.0, score: 0.2 }]);
        let two = document_score(&[
            FieldScore { weight: 0.5, norm: 1.0, score: 0.2 },
            FieldScore { weight: 0.2, norm: 1.0, score: 0.2 },
        ]);
        assert!(two < one);
    }

    #[test]
    fn test_document_score_heavier_field_is_better() {
        let title = document_score(&[FieldScore { weight: 0.5, norm: 1.0, score: 0.2 }]);
        let content = document_score(&[FieldScore { weight: 0.05, norm: 1.0, score: 0.2 }]);
        assert!(title < content);
    }

    #[test]
    fn test_exact_score_uses_epsilon() {
        let score = document_score(&[FieldScore { weight: 0.5, norm: 1.0, score: 0.0 }]);
        assert!(score > 0.0);
        assert!(score < 1e-6);
    }

    #[test]
    fn test_relevance_percent() {
        assert_eq!(relevance_percent(0.0), 100);
        assert_eq!(relevance_percent(1.0), 0);
        assert_eq!(relevance_percent(0.178), 82);
        assert_eq!(relevance_percent(f64::NAN), 0);
        assert_eq!(relevance_percent(-0.5), 100);
    }
}
