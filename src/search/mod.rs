//! Search Module
//!
//! Paper lookup against the arXiv export API.
//!
//! The retrieval agent only sees the [`PaperIndex`] trait, so any index that
//! can answer "query + result count → papers" can stand in for arXiv.

pub mod arxiv;

pub use arxiv::{ArxivClient, Paper, SearchError};

use async_trait::async_trait;

/// A searchable paper index
#[async_trait]
pub trait PaperIndex: Send + Sync {
    /// Return up to `max_results` papers for `query`, most relevant first
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Paper>, SearchError>;

    /// Largest result count a single lookup will honour
    fn max_results(&self) -> usize;
}
