//! Summarizer Agent
//!
//! Second speaker of the review team. Reads the candidate list produced by the
//! search agent and writes the markdown literature review.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::agents::team::RoleName;
use crate::llm::LLMAdapter;
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest};

const SYSTEM_PROMPT: &str = "You are an expert researcher. When you receive the JSON list of \
papers, write a literature review style report in markdown:\n\
1. Start with a 2-3 sentence introduction of the topic.\n\
2. Then include one bullet per paper with: title (as a markdown link to its pdf_url), authors, \
the specific problem tackled, its key contribution, and future scope of research.\n\
3. Close with a single-sentence takeaway.\n\
Use exactly one top-level `- ` bullet per paper and no other top-level bullets.";

/// A paper as the search agent forwarded it; every field but the title is optional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub pdf_url: Option<String>,
}

#[derive(Deserialize)]
struct CandidateEnvelope {
    papers: Vec<Candidate>,
}

pub struct SummarizerAgent {
    llm: Arc<dyn LLMAdapter>,
    model: String,
}

impl SummarizerAgent {
    pub fn new(llm: Arc<dyn LLMAdapter>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    /// Write the review from the shared conversation history
    pub async fn run(&self, history: &[LLMMessage]) -> AppResult<String> {
        let candidates = history
            .iter()
            .rev()
            .find(|m| m.name.as_deref() == Some(RoleName::SearchAgent.as_str()))
            .and_then(|m| extract_candidates(&m.content));

        info!(
            candidates = ?candidates.as_ref().map(Vec::len),
            model = %self.model,
            "Summarizer turn started"
        );

        let request = LLMRequest {
            model: self.model.clone(),
            messages: history.to_vec(),
            max_tokens: Some(2048),
            temperature: Some(0.7),
            system_instruction: Some(SYSTEM_PROMPT.to_string()),
            tools: Vec::new(),
        };

        let response = self.llm.create_chat_completion(&request).await?;
        if response.content.trim().is_empty() {
            return Err(AppError::LLMApi("Summarizer produced an empty report".to_string()));
        }

        let bullets = count_paper_bullets(&response.content);
        match &candidates {
            Some(papers) if papers.len() != bullets => warn!(
                expected = papers.len(),
                bullets,
                "Report bullet count does not match forwarded papers"
            ),
            None => warn!("Could not read the candidate list; bullet coverage unchecked"),
            _ => {}
        }

        info!(response_len = response.content.len(), bullets, "Summarizer turn complete");
        Ok(response.content)
    }
}

/// Pull the candidate JSON out of the search agent's message
///
/// Accepts a fenced ```json block, a bare array, or an object with a
/// `papers` array.
pub fn extract_candidates(text: &str) -> Option<Vec<Candidate>> {
    let json_str = if text.contains("```json") {
        text.split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .unwrap_or(text)
            .trim()
    } else if text.contains("```") {
        text.split("```").nth(1).unwrap_or(text).trim()
    } else {
        text.trim()
    };

    if let Ok(papers) = serde_json::from_str::<Vec<Candidate>>(json_str) {
        return Some(papers);
    }
    if let Ok(envelope) = serde_json::from_str::<CandidateEnvelope>(json_str) {
        return Some(envelope.papers);
    }

    // JSON embedded in prose
    let start = json_str.find('[')?;
    let end = json_str.rfind(']')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Vec<Candidate>>(&json_str[start..=end]).ok()
}

/// Count top-level markdown bullets, skipping fenced code and nested items
pub fn count_paper_bullets(markdown: &str) -> usize {
    let mut in_fence = false;
    let mut count = 0;

    for line in markdown.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence || line.starts_with(' ') || line.starts_with('\t') {
            continue;
        }
        if ["- ", "* ", "+ "].iter().any(|marker| line.starts_with(marker)) {
            count += 1;
        }
    }

    count
}
