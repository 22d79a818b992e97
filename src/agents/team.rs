//! Review Team
//!
//! Coordinates the two agents as a fixed round: the search agent speaks once,
//! then the summarizer speaks once. Each finished message is yielded to the
//! caller before the next agent starts.
//!
//! ```text
//!   Retrieve ──ok──▶ Summarize ──ok──▶ Done
//!      │                 │
//!      └──err──▶ Failed ◀┘
//! ```
//!
//! Reaching the turn bound also ends the round, so a team built with
//! `max_turns = 1` stops after the search agent.

use std::sync::Arc;

use futures::Stream;
use serde::Serialize;
use tracing::{error, info};

use crate::agents::search::SearchAgent;
use crate::agents::summarizer::SummarizerAgent;
use crate::llm::LLMAdapter;
use crate::models::ReviewRequest;
use crate::search::PaperIndex;
use crate::types::{AppError, AppResult, LLMMessage};

/// Participants of the review round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleName {
    SearchAgent,
    Summarizer,
}

impl RoleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::SearchAgent => "search_agent",
            RoleName::Summarizer => "summarizer",
        }
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finished agent message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub source: RoleName,
    pub content: String,
}

impl Frame {
    pub fn new(source: RoleName, content: impl Into<String>) -> Self {
        Self {
            source,
            content: content.into(),
        }
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source, self.content)
    }
}

/// Position of the round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Retrieve,
    Summarize,
    Done,
    Failed,
}

impl Stage {
    /// Agent that speaks in this stage
    pub fn role(self) -> Option<RoleName> {
        match self {
            Stage::Retrieve => Some(RoleName::SearchAgent),
            Stage::Summarize => Some(RoleName::Summarizer),
            Stage::Done | Stage::Failed => None,
        }
    }

    /// Stage after the active agent finished its message
    pub fn advance(self) -> Stage {
        match self {
            Stage::Retrieve => Stage::Summarize,
            Stage::Summarize => Stage::Done,
            terminal => terminal,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamConfig {
    roles: Vec<RoleName>,
    max_turns: usize,
}

impl TeamConfig {
    pub const DEFAULT_MAX_TURNS: usize = 2;

    pub fn new(max_turns: usize) -> AppResult<Self> {
        let roles = vec![RoleName::SearchAgent, RoleName::Summarizer];
        if max_turns == 0 || max_turns > roles.len() {
            return Err(AppError::InvalidRequest(format!(
                "max_turns must be between 1 and {}",
                roles.len()
            )));
        }
        Ok(Self { roles, max_turns })
    }

    pub fn roles(&self) -> &[RoleName] {
        &self.roles
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            roles: vec![RoleName::SearchAgent, RoleName::Summarizer],
            max_turns: Self::DEFAULT_MAX_TURNS,
        }
    }
}

/// Opening user message of every review
pub fn task_prompt(topic: &str, num_papers: usize) -> String {
    format!(
        "Conduct a literature review on **{}** and return exactly {} papers.",
        topic, num_papers
    )
}

pub struct Team {
    config: TeamConfig,
    search: SearchAgent,
    summarizer: SummarizerAgent,
}

impl Team {
    pub fn build(
        config: TeamConfig,
        llm: Arc<dyn LLMAdapter>,
        index: Arc<dyn PaperIndex>,
        model: &str,
        overfetch_factor: usize,
    ) -> Self {
        info!(roles = ?config.roles(), max_turns = config.max_turns(), model, "Building review team");
        Self {
            search: SearchAgent::new(Arc::clone(&llm), index, model, overfetch_factor),
            summarizer: SummarizerAgent::new(llm, model),
            config,
        }
    }

    /// Run the round, yielding each agent's message as soon as it is complete
    ///
    /// The stream ends after the last turn, or right after the first error.
    pub fn run_stream(self, request: &ReviewRequest) -> impl Stream<Item = AppResult<Frame>> + Send + 'static {
        let Team {
            config,
            search,
            summarizer,
        } = self;
        let num_papers = request.paper_count();
        let task = task_prompt(&request.topic, num_papers);
        let topic = request.topic.clone();

        async_stream::stream! {
            info!(topic = %topic, num_papers, "Review started");

            let mut history = vec![LLMMessage::user(task)];
            let mut stage = Stage::Retrieve;
            let mut turns = 0usize;

            while !stage.is_terminal() {
                if turns >= config.max_turns() {
                    stage = Stage::Done;
                    break;
                }

                let result = match stage {
                    Stage::Retrieve => search
                        .run(&history, num_papers)
                        .await
                        .map(|content| Frame::new(RoleName::SearchAgent, content)),
                    Stage::Summarize => summarizer
                        .run(&history)
                        .await
                        .map(|content| Frame::new(RoleName::Summarizer, content)),
                    Stage::Done | Stage::Failed => break,
                };
                turns += 1;

                match result {
                    Ok(frame) => {
                        history.push(
                            LLMMessage::user(frame.content.clone()).with_name(frame.source.as_str()),
                        );
                        stage = stage.advance();
                        yield Ok(frame);
                    }
                    Err(e) => {
                        error!(role = ?stage.role(), error = %e, "Review turn failed");
                        stage = Stage::Failed;
                        yield Err(e);
                    }
                }
            }

            info!(stage = ?stage, turns, "Review finished");
        }
    }
}
