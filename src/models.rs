use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::config::{Config, ReviewConfig};
use crate::llm::{LLMAdapter, LLMProviderConfig, LLM};
use crate::search::{ArxivClient, PaperIndex};
use crate::types::{AppError, AppResult};

/// Shared state for the HTTP surface
///
/// Holds one model adapter and one index client, both built from the
/// configuration loaded at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub llm: Arc<dyn LLMAdapter>,
    pub index: Arc<dyn PaperIndex>,
}

impl AppState {
    pub fn from_config(config: Config) -> AppResult<Self> {
        let llm = LLM::new(LLMProviderConfig::from_config(&config.llm)?)?;
        let index = ArxivClient::from_config(&config.search)?;

        info!(
            provider = %llm.provider(),
            arxiv = %config.search.arxiv_api_url,
            "Application state ready"
        );

        Ok(Self {
            llm: llm.adapter(),
            index: Arc::new(index),
            config,
        })
    }
}

/// A single literature review to run
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(length(min = 1, max = 500, message = "topic must be between 1 and 500 characters"))]
    pub topic: String,
    #[validate(range(min = 1, message = "num_papers must be at least 1"))]
    pub num_papers: i64,
    #[validate(length(min = 1, message = "model must not be empty"))]
    pub model: String,
}

impl ReviewRequest {
    pub fn new(topic: impl Into<String>, num_papers: i64, model: impl Into<String>) -> Self {
        Self {
            topic: topic.into().trim().to_string(),
            num_papers,
            model: model.into().trim().to_string(),
        }
    }

    /// Field validation plus the configured upper bound on paper count
    pub fn validate_against(&self, review: &ReviewConfig) -> AppResult<()> {
        self.validate()
            .map_err(|e| AppError::InvalidRequest(e.to_string()))?;

        if self.num_papers > i64::from(review.max_papers) {
            return Err(AppError::InvalidRequest(format!(
                "num_papers must be at most {}",
                review.max_papers
            )));
        }
        Ok(())
    }

    /// Requested paper count; only meaningful after validation
    pub fn paper_count(&self) -> usize {
        usize::try_from(self.num_papers).unwrap_or(0)
    }
}

/// Body of `POST /api/review`
#[derive(Debug, Deserialize)]
pub struct ReviewRequestBody {
    pub topic: String,
    pub num_papers: Option<i64>,
    pub model: Option<String>,
}

impl ReviewRequestBody {
    /// Fill unset fields from configuration defaults
    pub fn into_request(self, config: &Config) -> ReviewRequest {
        ReviewRequest::new(
            self.topic,
            self.num_papers
                .unwrap_or_else(|| i64::from(config.review.default_papers)),
            self.model
                .unwrap_or_else(|| config.llm.default_model.clone()),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_validate_against_bounds() {
        let review = ReviewConfig::default();

        assert_ok!(ReviewRequest::new("qec", 5, "gpt-4o-mini").validate_against(&review));
        assert_ok!(ReviewRequest::new("qec", 10, "gpt-4o-mini").validate_against(&review));
        assert_err!(ReviewRequest::new("qec", 0, "gpt-4o-mini").validate_against(&review));
        assert_err!(ReviewRequest::new("qec", -3, "gpt-4o-mini").validate_against(&review));
        assert_err!(ReviewRequest::new("qec", 11, "gpt-4o-mini").validate_against(&review));
        assert_err!(ReviewRequest::new("   ", 3, "gpt-4o-mini").validate_against(&review));
        assert_err!(ReviewRequest::new("qec", 3, "").validate_against(&review));
        assert_err!(ReviewRequest::new("x".repeat(501), 3, "m").validate_against(&review));
    }

    #[test]
    fn test_paper_count() {
        assert_eq!(ReviewRequest::new("qec", 3, "m").paper_count(), 3);
        assert_eq!(ReviewRequest::new("qec", -1, "m").paper_count(), 0);
    }

    #[test]
    fn test_body_defaults_from_config() {
        let body: ReviewRequestBody = serde_json::from_str(r#"{"topic": " qec "}"#).unwrap();
        let request = body.into_request(&test_config());
        assert_eq!(request.topic, "qec");
        assert_eq!(request.num_papers, 5);
        assert_eq!(request.model, "gpt-4o-mini");
    }

    #[test]
    fn test_app_state_requires_api_key() {
        let mut config = test_config();
        config.llm.api_key = String::new();
        assert!(matches!(AppState::from_config(config), Err(AppError::Config(_))));
        assert!(AppState::from_config(test_config()).is_ok());
    }
}
