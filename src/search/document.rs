//! Document records as produced by the site's index build
//!
//! One record per page. The JSON shape is fixed by the static site generator
//! template that emits `index.json`; optional fields may be absent or null.

use serde::{Deserialize, Serialize};

use super::ranking::Field;

/// A single indexed page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub permalink: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    /// Raw timestamp string as written by the generator
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// Estimated reading time in minutes
    #[serde(default)]
    pub reading_time: Option<f64>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Document {
    /// Searchable values of a field, paired with the element index for array fields
    pub fn field_values(&self, field: Field) -> Vec<(Option<usize>, &str)> {
        match field {
            Field::Title => vec![(None, self.title.as_str())],
            Field::Content => vec![(None, self.content.as_str())],
            Field::Summary => self
                .summary
                .as_deref()
                .map(|s| vec![(None, s)])
                .unwrap_or_default(),
            Field::Tags => self
                .tags
                .iter()
                .enumerate()
                .map(|(i, t)| (Some(i), t.as_str()))
                .collect(),
            Field::Categories => self
                .categories
                .iter()
                .enumerate()
                .map(|(i, c)| (Some(i), c.as_str()))
                .collect(),
        }
    }

    /// Summary text if the page has a non-empty one
    pub fn summary_text(&self) -> Option<&str> {
        self.summary.as_deref().filter(|s| !s.is_empty())
    }

    pub fn first_category(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }

    /// Reading time for display; zero counts as absent
    pub fn reading_minutes(&self) -> Option<f64> {
        self.reading_time.filter(|m| *m > 0.0 && m.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_record() {
        let json = r#"{
            "title": "Getting Started with Widgets",
            "permalink": "/getting-started/",
            "summary": "A short intro",
            "content": "Widgets are great.",
            "date": "2024-01-15T00:00:00Z",
            "categories": ["Tutorials"],
            "tags": ["guide", "widgets"],
            "readingTime": 4
        }"#;

        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.title, "Getting Started with Widgets");
        assert_eq!(doc.first_category(), Some("Tutorials"));
        assert_eq!(doc.tags.len(), 2);
        assert_eq!(doc.reading_minutes(), Some(4.0));
    }

    #[test]
    fn test_deserialize_missing_optional_fields() {
        let json = r#"{"title": "Bare", "permalink": "/bare/", "content": "x", "date": "2024-01-01",
                       "tags": null}"#;

        let doc: Document = serde_json::from_str(json).unwrap();
        assert!(doc.summary_text().is_none());
        assert!(doc.categories.is_empty());
        assert!(doc.tags.is_empty());
        assert!(doc.reading_minutes().is_none());
    }

    #[test]
    fn test_empty_summary_is_absent() {
        let doc = Document {
            summary: Some(String::new()),
            ..Default::default()
        };
        assert!(doc.summary_text().is_none());
    }

    #[test]
    fn test_zero_reading_time_is_absent() {
        let doc = Document {
            reading_time: Some(0.0),
            ..Default::default()
        };
        assert!(doc.reading_minutes().is_none());
    }

    #[test]
    fn test_field_values_for_arrays_carry_index() {
        let doc = Document {
            tags: vec!["a".into(), "b".into()],
            ..Default::default()
        };
        let values = doc.field_values(Field::Tags);
        assert_eq!(values, vec![(Some(0), "a"), (Some(1), "b")]);
        assert!(doc.field_values(Field::Summary).is_empty());
    }
}
