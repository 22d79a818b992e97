//! arXiv Client
//!
//! Queries the arXiv export API (`/api/query`) and turns its Atom feed into
//! [`Paper`] records.
//!
//! ## Lookup contract
//!
//! - One request per lookup, results in arXiv's relevance order
//! - `max_results` is capped at the configured ceiling (no pagination)
//! - No retries; every failure surfaces as a [`SearchError`]
//!
//! arXiv does not use HTTP status codes for bad queries. It answers `200` with
//! a feed holding one entry whose id lives under `/api/errors`; that entry is
//! mapped to [`SearchError::Api`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::PaperIndex;

/// Errors that can occur during search operations
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search query is empty")]
    EmptyQuery,

    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("arXiv returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Failed to parse search results: {0}")]
    ParseError(String),

    #[error("arXiv rejected the query: {0}")]
    Api(String),
}

/// A paper returned by the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub title: String,
    /// Author names in the order arXiv lists them
    pub authors: Vec<String>,
    /// Publication date of the first version
    pub published: NaiveDate,
    /// Abstract
    pub summary: String,
    pub pdf_url: String,
    /// Abs page URL (`http://arxiv.org/abs/<id>`)
    #[serde(skip)]
    pub entry_id: String,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    published: String,
    #[serde(rename = "author", default)]
    authors: Vec<AtomAuthor>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@title", default)]
    title: Option<String>,
    #[serde(rename = "@type", default)]
    link_type: Option<String>,
}

/// arXiv export API client
#[derive(Clone)]
pub struct ArxivClient {
    client: Client,
    base_url: String,
    max_results: usize,
}

impl ArxivClient {
    /// Configure client from config
    pub fn from_config(config: &crate::config::SearchConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("arxivmind/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.arxiv_api_url.clone(),
            max_results: config.max_results,
        })
    }

    /// Search arXiv, most relevant first
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Paper>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let limit = max_results.clamp(1, self.max_results);
        if limit < max_results {
            warn!(requested = max_results, limit, "Capping arXiv lookup size");
        }

        info!(query = %query, max_results = limit, "Searching arXiv");

        let limit_param = limit.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("search_query", query),
                ("start", "0"),
                ("max_results", limit_param.as_str()),
                ("sortBy", "relevance"),
                ("sortOrder", "descending"),
            ])
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(SearchError::Http {
                status: status.as_u16(),
                body,
            });
        }

        debug!(bytes = body.len(), "Raw arXiv feed received");

        let papers = parse_feed(&body)?;
        info!(count = papers.len(), "arXiv search completed");
        Ok(papers)
    }
}

#[async_trait]
impl PaperIndex for ArxivClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Paper>, SearchError> {
        ArxivClient::search(self, query, max_results).await
    }

    fn max_results(&self) -> usize {
        self.max_results
    }
}

/// Parse an arXiv Atom feed into papers
pub fn parse_feed(xml: &str) -> Result<Vec<Paper>, SearchError> {
    let feed: AtomFeed =
        quick_xml::de::from_str(xml).map_err(|e| SearchError::ParseError(e.to_string()))?;

    let mut papers = Vec::with_capacity(feed.entries.len());
    for entry in feed.entries {
        if entry.id.contains("/api/errors") {
            return Err(SearchError::Api(collapse_whitespace(&entry.summary)));
        }
        papers.push(entry_to_paper(entry)?);
    }
    Ok(papers)
}

fn entry_to_paper(entry: AtomEntry) -> Result<Paper, SearchError> {
    let published = DateTime::parse_from_rfc3339(entry.published.trim())
        .map(|dt| dt.date_naive())
        .map_err(|e| {
            SearchError::ParseError(format!(
                "bad published date {:?} on {}: {}",
                entry.published, entry.id, e
            ))
        })?;

    let pdf_url = entry
        .links
        .iter()
        .find(|l| {
            l.title.as_deref() == Some("pdf") || l.link_type.as_deref() == Some("application/pdf")
        })
        .map(|l| l.href.clone())
        .unwrap_or_else(|| entry.id.replacen("/abs/", "/pdf/", 1));

    Ok(Paper {
        title: collapse_whitespace(&entry.title),
        authors: entry
            .authors
            .into_iter()
            .map(|a| a.name.trim().to_string())
            .collect(),
        published,
        summary: collapse_whitespace(&entry.summary),
        pdf_url,
        entry_id: entry.id.trim().to_string(),
    })
}

/// arXiv wraps titles and abstracts at fixed columns
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
pub(crate) const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <link href="http://arxiv.org/api/query?search_query%3Dall%3Aquantum" rel="self" type="application/atom+xml"/>
  <title type="html">ArXiv Query: search_query=all:quantum</title>
  <id>http://arxiv.org/api/abc</id>
  <updated>2024-05-01T00:00:00-04:00</updated>
  <opensearch:totalResults xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">2</opensearch:totalResults>
  <entry>
    <id>http://arxiv.org/abs/2101.00001v1</id>
    <updated>2021-01-02T10:00:00Z</updated>
    <published>2021-01-01T09:30:00Z</published>
    <title>Surface Codes
      for Beginners</title>
    <summary>  We review the surface code
  and its decoders.
</summary>
    <author>
      <name>Alice Smith</name>
      <arxiv:affiliation xmlns:arxiv="http://arxiv.org/schemas/atom">Somewhere</arxiv:affiliation>
    </author>
    <author>
      <name>Bob Jones</name>
    </author>
    <link href="http://arxiv.org/abs/2101.00001v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2101.00001v1" rel="related" type="application/pdf"/>
    <arxiv:primary_category xmlns:arxiv="http://arxiv.org/schemas/atom" term="quant-ph" scheme="http://arxiv.org/schemas/atom"/>
    <category term="quant-ph" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2202.00002v2</id>
    <updated>2022-02-03T10:00:00Z</updated>
    <published>2022-02-02T12:00:00Z</published>
    <title>Decoding with Neural Networks</title>
    <summary>Neural decoders for stabilizer codes.</summary>
    <author>
      <name>Carol White</name>
    </author>
    <link href="http://arxiv.org/abs/2202.00002v2" rel="alternate" type="text/html"/>
  </entry>
</feed>"#;
