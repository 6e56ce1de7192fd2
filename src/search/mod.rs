//! Site search: index loading, fuzzy matching, debounced querying and
//! rendering of highlighted results.

pub mod context;
pub mod controller;
pub mod document;
pub mod engine;
pub mod fuzzy;
pub mod highlight;
pub mod ranking;
pub mod render;


pub use context::{load_index, IndexSource, LoadError, SearchContext};
pub use controller::{InputEvent, QueryController, SearchView};
pub use engine::FieldMatch;
pub use ranking::relevance_percent;
pub use render::{search_and_render, LOAD_FAILURE_HTML};
