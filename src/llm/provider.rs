use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::config::LLMConfig;
use crate::llm::openai::{OpenAIAdapter, GROQ_API_BASE, OPENAI_API_BASE, OPENROUTER_API_BASE};
use crate::types::{AppError, AppResult, LLMProvider, LLMRequest, LLMResponse};

/// A chat model backend: conversation history (+ tools) in, next message out
#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Configuration for an LLM provider (renamed to avoid conflict with the LLMProvider enum in types.rs)
pub struct LLMProviderConfig {
    pub provider: LLMProvider,
    pub api_key: String,
    pub api_base: Option<String>,
    pub timeout: Duration,
}

impl LLMProviderConfig {
    /// Build from the process configuration; fails when no key is configured
    pub fn from_config(config: &LLMConfig) -> AppResult<Self> {
        let api_key = config.active_api_key().ok_or_else(|| {
            AppError::Config(format!("No API key configured for provider {}", config.provider))
        })?;

        Ok(Self {
            provider: config.provider,
            api_key,
            api_base: config.api_base.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    fn default_api_base(&self) -> &'static str {
        match self.provider {
            LLMProvider::OpenAI => OPENAI_API_BASE,
            LLMProvider::OpenRouter => OPENROUTER_API_BASE,
            LLMProvider::Groq => GROQ_API_BASE,
        }
    }
}

pub struct LLM {
    adapter: Arc<dyn LLMAdapter>,
    provider: LLMProvider,
}

impl LLM {
    pub fn new(config: LLMProviderConfig) -> AppResult<Self> {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| config.default_api_base().to_string());

        let adapter = OpenAIAdapter::new_with_api_base(&config.api_key, &api_base)
            .with_timeout(config.timeout)?;

        info!(provider = %config.provider, api_base = %api_base, "LLM adapter ready");

        Ok(Self {
            adapter: Arc::new(adapter),
            provider: config.provider,
        })
    }

    pub fn provider(&self) -> LLMProvider {
        self.provider
    }

    /// Shared handle to the underlying adapter
    pub fn adapter(&self) -> Arc<dyn LLMAdapter> {
        Arc::clone(&self.adapter)
    }
}
