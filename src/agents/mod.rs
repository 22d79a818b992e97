//! Agent System
//!
//! The two agents that produce a literature review and the team that runs them:
//!
//! - **Search Agent**: turns the topic into an arXiv query and picks candidates
//! - **Summarizer Agent**: writes the markdown review from those candidates
//! - **Team**: runs both agents once each, in order, streaming their messages
//!
//! ## Pipeline Overview
//!
//! ```text
//! Topic + paper count
//!      │
//!      ▼
//! ┌─────────────┐   arxiv_search
//! │   Search    │ ───────────────▶ arXiv export API
//! │   Agent     │ ◀─────────────── papers (over-fetched)
//! └─────────────┘
//!      │  frame 1: selected candidates (JSON)
//!      ▼
//! ┌─────────────┐
//! │ Summarizer  │
//! │   Agent     │
//! └─────────────┘
//!      │  frame 2: markdown review
//!      ▼
//!    Caller
//! ```

pub mod search;
pub mod summarizer;
pub mod team;

pub use search::{SearchAgent, ARXIV_TOOL_NAME};
pub use summarizer::{count_paper_bullets, extract_candidates, Candidate, SummarizerAgent};
pub use team::{task_prompt, Frame, RoleName, Stage, Team, TeamConfig};

use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::llm::LLMAdapter;
use crate::models::ReviewRequest;
use crate::search::PaperIndex;
use crate::types::AppResult;

/// Validate a review request and start the two-agent round
///
/// Validation happens before any external call; an invalid request never
/// produces a stream.
pub fn run_review(
    request: &ReviewRequest,
    team_config: TeamConfig,
    llm: Arc<dyn LLMAdapter>,
    index: Arc<dyn PaperIndex>,
    config: &Config,
) -> AppResult<BoxStream<'static, AppResult<Frame>>> {
    request.validate_against(&config.review)?;

    info!(
        review_id = %Uuid::new_v4(),
        topic = %request.topic,
        num_papers = request.num_papers,
        model = %request.model,
        "Starting literature review"
    );

    let team = Team::build(
        team_config,
        llm,
        index,
        &request.model,
        config.review.overfetch_factor as usize,
    );

    Ok(team.run_stream(request).boxed())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted collaborators for driving agents without network access

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use crate::llm::LLMAdapter;
    use crate::search::{Paper, PaperIndex, SearchError};
    use crate::types::{AppError, AppResult, LLMRequest, LLMResponse, TokenUsage, ToolCall};

    /// Replays canned responses in order and records every request
    pub struct ScriptedLLM {
        responses: Mutex<VecDeque<AppResult<LLMResponse>>>,
        requests: Mutex<Vec<LLMRequest>>,
    }

    impl ScriptedLLM {
        pub fn new(responses: Vec<AppResult<LLMResponse>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<LLMRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LLMAdapter for ScriptedLLM {
        async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AppError::Internal("script exhausted".to_string())))
        }
    }

    pub fn text_response(content: &str) -> LLMResponse {
        LLMResponse {
            content: content.to_string(),
            tool_calls: Vec::new(),
            finish_reason: "stop".to_string(),
            usage: TokenUsage::default(),
        }
    }

    pub fn tool_response(id: &str, arguments: serde_json::Value) -> LLMResponse {
        LLMResponse {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: id.to_string(),
                name: crate::agents::ARXIV_TOOL_NAME.to_string(),
                arguments,
            }],
            finish_reason: "tool_calls".to_string(),
            usage: TokenUsage::default(),
        }
    }

    pub fn sample_papers(count: usize) -> Vec<Paper> {
        (0..count)
            .map(|i| Paper {
                title: format!("Paper {}", i),
                authors: vec![format!("Author {}", i)],
                published: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                summary: format!("Abstract {}", i),
                pdf_url: format!("http://arxiv.org/pdf/{}", i),
                entry_id: format!("http://arxiv.org/abs/{}", i),
            })
            .collect()
    }

    /// In-memory index that records (query, max_results) per lookup
    pub struct StaticIndex {
        papers: Option<Vec<Paper>>,
        ceiling: usize,
        calls: Mutex<Vec<(String, usize)>>,
    }

    impl StaticIndex {
        pub fn new(papers: Vec<Paper>) -> Self {
            Self {
                papers: Some(papers),
                ceiling: 100,
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Index whose every lookup fails
        pub fn failing() -> Self {
            Self {
                papers: None,
                ceiling: 100,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn with_ceiling(mut self, ceiling: usize) -> Self {
            self.ceiling = ceiling;
            self
        }

        pub fn calls(&self) -> Vec<(String, usize)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PaperIndex for StaticIndex {
        async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Paper>, SearchError> {
            self.calls.lock().unwrap().push((query.to_string(), max_results));
            match &self.papers {
                Some(papers) => Ok(papers.iter().take(max_results).cloned().collect()),
                None => Err(SearchError::RequestFailed("connection refused".to_string())),
            }
        }

        fn max_results(&self) -> usize {
            self.ceiling
        }
    }
}
