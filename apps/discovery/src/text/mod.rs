//! Pure text utilities: keyword extraction, normalization, Jaccard similarity and
//! keyword classification. No I/O lives here.

pub mod classify;
pub mod keywords;
pub mod normalize;
pub mod similarity;
pub mod vocab;

pub use keywords::{extract_keywords, extract_search_keywords, extract_technical_keywords};
pub use similarity::{jaccard, text_similarity};
