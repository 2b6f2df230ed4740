//! docqa-vector
//!
//! Embeds chunks into an in-memory [`SearchableIndex`] and answers top-k
//! cosine-similarity queries against it.

pub mod builder;
pub mod index;
pub mod similarity;

pub use builder::{build, IndexBuilder};
pub use index::{retrieve, IndexedChunk, SearchableIndex};
pub use similarity::cosine_similarity;
