//! Search index loading
//!
//! The index is a JSON array of [`Document`] records produced by the site
//! build. It is fetched once, parsed, and wrapped together with the engine in
//! a [`SearchContext`] that every later query borrows.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use super::document::Document;
use super::engine::{QueryResult, SearchEngine};

/// Failures that disable search for the session
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to fetch search index from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Search index request to {url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("Failed to read search index {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed search index: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where the index comes from
#[derive(Debug, Clone, PartialEq)]
pub enum IndexSource {
    Url(Url),
    File(PathBuf),
}

impl FromStr for IndexSource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Url::parse(s) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(IndexSource::Url(url)),
            _ => Ok(IndexSource::File(PathBuf::from(s))),
        }
    }
}

impl fmt::Display for IndexSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexSource::Url(url) => write!(f, "{}", url),
            IndexSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Loaded index plus the engine built over it
#[derive(Debug)]
pub struct SearchContext {
    engine: SearchEngine,
    source: String,
}

impl SearchContext {
    pub fn new(documents: Vec<Document>, source: impl Into<String>) -> Self {
        Self {
            engine: SearchEngine::new(documents),
            source: source.into(),
        }
    }

    pub fn documents(&self) -> &[Document] {
        self.engine.documents()
    }

    /// Where the index was loaded from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn search(&self, query: &str) -> Vec<QueryResult<'_>> {
        self.engine.search(query)
    }

    /// Search and measure only the engine call
    pub fn timed_search(&self, query: &str) -> (Vec<QueryResult<'_>>, Duration) {
        let started = Instant::now();
        let results = self.engine.search(query);
        let elapsed = started.elapsed();
        debug!("Search for {:?} took {:?}", query, elapsed);
        (results, elapsed)
    }
}

/// Parse the raw index document
pub fn parse_index(bytes: &[u8]) -> Result<Vec<Document>, LoadError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Fetch or read the index once and build the search context; no retries
pub async fn load_index(
    source: &IndexSource,
    client: &reqwest::Client,
) -> Result<SearchContext, LoadError> {
    let bytes = match source {
        IndexSource::Url(url) => {
            let response = client
                .get(url.clone())
                .send()
                .await
                .map_err(|source| LoadError::Fetch {
                    url: url.to_string(),
                    source,
                })?;

            if !response.status().is_success() {
                return Err(LoadError::Status {
                    url: url.to_string(),
                    status: response.status(),
                });
            }

            response
                .bytes()
                .await
                .map_err(|source| LoadError::Fetch {
                    url: url.to_string(),
                    source,
                })?
                .to_vec()
        }
        IndexSource::File(path) => {
            tokio::fs::read(path)
                .await
                .map_err(|source| LoadError::Read {
                    path: path.clone(),
                    source,
                })?
        }
    };

    let documents = parse_index(&bytes)?;
    info!("Loaded {} documents from {}", documents.len(), source);

    Ok(SearchContext::new(documents, source.to_string()))
}

/// Decoded, non-blank `q` parameter of a page URL
///
/// Relative URLs such as `/search/?q=rust` are accepted.
pub fn query_from_url(page_url: &str) -> Option<String> {
    let url = match Url::parse(page_url) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse("http://localhost/").ok()?.join(page_url).ok()?
        }
        Err(_) => return None,
    };

    url.query_pairs()
        .find(|(key, _)| key == "q")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const INDEX: &str = r#"[
        {"title": "Getting Started with Widgets", "permalink": "/getting-started/",
         "content": "Install the toolkit.", "date": "2024-01-15",
         "categories": ["Tutorials"], "tags": ["guide"]},
        {"title": "Release notes", "permalink": "/release-notes/",
         "content": "Bug fixes.", "date": "2024-02-01"}
    ]"#;

    #[test]
    fn test_parse_index() {
        let docs = parse_index(INDEX.as_bytes()).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].title, "Release notes");
    }

    #[test]
    fn test_parse_index_malformed() {
        let err = parse_index(b"{not json").unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
    }

    #[test]
    fn test_parse_index_wrong_shape() {
        assert!(parse_index(br#"{"title": "object, not array"}"#).is_err());
    }

    #[test]
    fn test_index_source_from_str() {
        assert!(matches!(
            "https://example.com/index.json".parse::<IndexSource>().unwrap(),
            IndexSource::Url(_)
        ));
        assert_eq!(
            "public/index.json".parse::<IndexSource>().unwrap(),
            IndexSource::File(PathBuf::from("public/index.json"))
        );
        assert!(matches!(
            "C:/site/index.json".parse::<IndexSource>().unwrap(),
            IndexSource::File(_)
        ));
    }

    #[tokio::test]
    async fn test_load_index_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(INDEX.as_bytes()).unwrap();

        let source = IndexSource::File(file.path().to_path_buf());
        let context = load_index(&source, &reqwest::Client::new()).await.unwrap();

        assert_eq!(context.documents().len(), 2);
        assert_eq!(context.search("widget").len(), 1);
    }

    #[tokio::test]
    async fn test_load_index_missing_file() {
        let source = IndexSource::File(PathBuf::from("/definitely/not/here/index.json"));
        let err = load_index(&source, &reqwest::Client::new()).await.unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
    }

    #[tokio::test]
    async fn test_load_index_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"<html>not an index</html>").unwrap();

        let source = IndexSource::File(file.path().to_path_buf());
        let err = load_index(&source, &reqwest::Client::new()).await.unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
    }

    #[tokio::test]
    async fn test_load_index_over_http() {
        use axum::{routing::get, Router};

        let app = Router::new()
            .route("/index.json", get(|| async { INDEX }))
            .route(
                "/broken.json",
                get(|| async { (axum::http::StatusCode::NOT_FOUND, "missing") }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        let client = reqwest::Client::builder().no_proxy().build().unwrap();

        let ok: IndexSource = format!("http://{}/index.json", addr).parse().unwrap();
        let context = load_index(&ok, &client).await.unwrap();
        assert_eq!(context.documents().len(), 2);

        let missing: IndexSource = format!("http://{}/broken.json", addr).parse().unwrap();
        let err = load_index(&missing, &client).await.unwrap_err();
        assert!(matches!(err, LoadError::Status { .. }));
    }

    #[test]
    fn test_query_from_url() {
        assert_eq!(
            query_from_url("https://example.com/search/?q=rust%20%26%20tokio"),
            Some("rust & tokio".to_string())
        );
        assert_eq!(query_from_url("/search/?q=hello+world"), Some("hello world".to_string()));
        assert_eq!(query_from_url("/search/?page=2&q=x"), Some("x".to_string()));
        assert_eq!(query_from_url("/search/?q="), None);
        assert_eq!(query_from_url("/search/?q=%20%20"), None);
        assert_eq!(query_from_url("/search/"), None);
    }

    #[test]
    fn test_timed_search() {
        let context = SearchContext::new(parse_index(INDEX.as_bytes()).unwrap(), "memory");
        let (results, elapsed) = context.timed_search("release");
        assert_eq!(results.len(), 1);
        assert!(elapsed < Duration::from_secs(5));
    }
}
