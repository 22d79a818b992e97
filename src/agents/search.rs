//! Search Agent
//!
//! First speaker of the review team. Turns the user's topic into an arXiv
//! query, calls the `arxiv_search` tool, and hands the summarizer exactly the
//! requested number of candidates as a compact JSON array.
//!
//! One turn is at most two model calls:
//!
//! 1. the model sees the task plus the tool schema and (normally) calls the tool
//! 2. after the tool results are appended, a reflection call without tools
//!    produces the agent's message
//!
//! The lookup always over-fetches: whatever count the model asks for, the
//! index is queried for at least `num_papers × overfetch_factor` results so
//! the model has room to down-select.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::llm::LLMAdapter;
use crate::search::PaperIndex;
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest, ToolCall, ToolDefinition};

pub const ARXIV_TOOL_NAME: &str = "arxiv_search";

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    max_results: Option<u64>,
}

pub struct SearchAgent {
    llm: Arc<dyn LLMAdapter>,
    index: Arc<dyn PaperIndex>,
    model: String,
    overfetch_factor: usize,
}

impl SearchAgent {
    pub fn new(
        llm: Arc<dyn LLMAdapter>,
        index: Arc<dyn PaperIndex>,
        model: impl Into<String>,
        overfetch_factor: usize,
    ) -> Self {
        Self {
            llm,
            index,
            model: model.into(),
            overfetch_factor: overfetch_factor.max(1),
        }
    }

    /// Schema of the lookup tool as the model sees it
    pub fn tool_definition() -> ToolDefinition {
        ToolDefinition {
            name: ARXIV_TOOL_NAME.to_string(),
            description: "Search arXiv and return up to `max_results` papers, each containing \
                          title, authors, publication date, abstract, and pdf_url."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "arXiv search query, e.g. `all:\"surface code\" AND cat:quant-ph`"
                    },
                    "max_results": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Number of papers to fetch"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    fn system_prompt(&self) -> String {
        format!(
            "Given a user topic, think of the best arXiv query and call the provided tool. \
             Always fetch {factor} times the number of papers requested so that you can \
             down-select the ones most relevant to the topic. When the tool returns, choose \
             exactly the number of papers requested and pass them as a concise JSON array to \
             the summarizer. Each element must keep the fields title, authors, published, \
             summary and pdf_url. Do not invent papers or fields the tool did not return. \
             If the tool reports an error, say so plainly instead of guessing.",
            factor = self.overfetch_factor
        )
    }

    /// Result count actually sent to the index
    pub fn effective_result_count(&self, requested: Option<u64>, num_papers: usize) -> usize {
        let floor = num_papers.saturating_mul(self.overfetch_factor);
        let requested = requested
            .map(|r| usize::try_from(r).unwrap_or(usize::MAX))
            .unwrap_or(floor);
        let ceiling = self.index.max_results().max(num_papers);
        requested.max(floor).min(ceiling)
    }

    /// Run one turn over the shared conversation history
    pub async fn run(&self, history: &[LLMMessage], num_papers: usize) -> AppResult<String> {
        info!(num_papers, model = %self.model, "Search agent turn started");

        let mut messages = history.to_vec();
        let first = self.complete(&messages, true).await?;

        if first.tool_calls.is_empty() {
            warn!("Search agent answered without calling the lookup tool");
            return non_empty(first.content);
        }

        let calls = first.tool_calls.clone();
        messages.push(LLMMessage::assistant_tool_calls(first.content, first.tool_calls));

        for call in &calls {
            let result = self.execute_tool(call, num_papers).await;
            messages.push(LLMMessage::tool_result(call.id.clone(), result));
        }

        let reflection = self.complete(&messages, false).await?;
        info!(response_len = reflection.content.len(), "Search agent turn complete");
        non_empty(reflection.content)
    }

    async fn complete(
        &self,
        messages: &[LLMMessage],
        with_tools: bool,
    ) -> AppResult<crate::types::LLMResponse> {
        let request = LLMRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            max_tokens: None,
            temperature: Some(0.2),
            system_instruction: Some(self.system_prompt()),
            tools: if with_tools {
                vec![Self::tool_definition()]
            } else {
                Vec::new()
            },
        };
        self.llm.create_chat_completion(&request).await
    }

    /// Execute one tool call; failures come back as text for the model to report
    async fn execute_tool(&self, call: &ToolCall, num_papers: usize) -> String {
        if call.name != ARXIV_TOOL_NAME {
            warn!(tool = %call.name, "Model called an unknown tool");
            return format!("Error: unknown tool `{}`", call.name);
        }

        let args: SearchArgs = match serde_json::from_value(call.arguments.clone()) {
            Ok(args) => args,
            Err(e) => {
                warn!(error = %e, "Invalid lookup arguments");
                return format!("Error: invalid arguments for {}: {}", ARXIV_TOOL_NAME, e);
            }
        };

        let max_results = self.effective_result_count(args.max_results, num_papers);
        if args.max_results != u64::try_from(max_results).ok() {
            info!(
                requested = ?args.max_results,
                max_results,
                "Adjusted lookup size"
            );
        }

        match self.index.search(&args.query, max_results).await {
            Ok(papers) => {
                info!(query = %args.query, count = papers.len(), "Lookup returned papers");
                serde_json::to_string(&papers)
                    .unwrap_or_else(|e| format!("Error: failed to encode papers: {}", e))
            }
            Err(e) => {
                warn!(query = %args.query, error = %e, "Lookup failed");
                format!("Error: {}", e)
            }
        }
    }
}

fn non_empty(content: String) -> AppResult<String> {
    if content.trim().is_empty() {
        Err(AppError::LLMApi("Search agent produced an empty message".to_string()))
    } else {
        Ok(content)
    }
}
