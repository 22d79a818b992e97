use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

use tracing::warn;

use crate::types::LLMProvider;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LLMConfig,
    pub search: SearchConfig,
    pub review: ReviewConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    pub api_key: String,
    /// Overrides the provider's default endpoint when set
    pub api_base: Option<String>,
    pub default_model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub arxiv_api_url: String,
    /// Hard ceiling on a single lookup; arXiv is not paginated here
    pub max_results: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewConfig {
    pub default_papers: u32,
    pub max_papers: u32,
    pub overfetch_factor: u32,
}

impl LLMConfig {
    /// The API key, if one was configured
    pub fn active_api_key(&self) -> Option<String> {
        let key = self.api_key.trim();
        if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            arxiv_api_url: "https://export.arxiv.org/api/query".to_string(),
            max_results: 100,
            timeout_secs: 30,
        }
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            default_papers: 5,
            max_papers: 10,
            overfetch_factor: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let provider_name = env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string());
        let provider = LLMProvider::from_name(&provider_name)
            .with_context(|| format!("Unsupported LLM_PROVIDER: {}", provider_name))?;

        let key_var = match provider {
            LLMProvider::OpenAI => "OPENAI_API_KEY",
            LLMProvider::OpenRouter => "OPENROUTER_API_KEY",
            LLMProvider::Groq => "GROQ_API_KEY",
        };

        let config = Self {
            server: ServerConfig {
                port: parse_var("PORT", 3000)?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            llm: LLMConfig {
                provider,
                api_key: env::var(key_var).unwrap_or_default(),
                api_base: env::var("LLM_API_BASE").ok().filter(|s| !s.trim().is_empty()),
                default_model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                timeout_secs: parse_var("LLM_TIMEOUT_SECS", 120)?,
            },
            search: SearchConfig {
                arxiv_api_url: env::var("ARXIV_API_URL")
                    .unwrap_or_else(|_| SearchConfig::default().arxiv_api_url),
                max_results: parse_var("ARXIV_MAX_RESULTS", 100)?,
                timeout_secs: parse_var("ARXIV_TIMEOUT_SECS", 30)?,
            },
            review: ReviewConfig {
                default_papers: parse_var("REVIEW_DEFAULT_PAPERS", 5)?,
                max_papers: parse_var("REVIEW_MAX_PAPERS", 10)?,
                overfetch_factor: parse_var("REVIEW_OVERFETCH_FACTOR", 5)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let review = &self.review;
        if review.max_papers == 0 {
            anyhow::bail!("REVIEW_MAX_PAPERS must be at least 1");
        }
        if review.default_papers == 0 || review.default_papers > review.max_papers {
            anyhow::bail!(
                "REVIEW_DEFAULT_PAPERS must be between 1 and {}",
                review.max_papers
            );
        }
        if review.overfetch_factor == 0 {
            anyhow::bail!("REVIEW_OVERFETCH_FACTOR must be at least 1");
        }
        let search = &self.search;
        if search.max_results < review.max_papers as usize {
            anyhow::bail!(
                "ARXIV_MAX_RESULTS ({}) must be at least REVIEW_MAX_PAPERS ({})",
                search.max_results,
                review.max_papers
            );
        }
        let full_overfetch = review.max_papers as usize * review.overfetch_factor as usize;
        if search.max_results < full_overfetch {
            warn!(
                max_results = search.max_results,
                full_overfetch,
                "ARXIV_MAX_RESULTS limits over-fetching for large reviews"
            );
        }
        Ok(())
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        server: ServerConfig {
            port: 3000,
            host: "127.0.0.1".to_string(),
            cors_allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        llm: LLMConfig {
            provider: LLMProvider::OpenAI,
            api_key: "test-key".to_string(),
            api_base: None,
            default_model: "gpt-4o-mini".to_string(),
            timeout_secs: 5,
        },
        search: SearchConfig::default(),
        review: ReviewConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_api_key() {
        let mut config = test_config();
        assert_eq!(config.llm.active_api_key().as_deref(), Some("test-key"));

        config.llm.api_key = "   ".to_string();
        assert!(config.llm.active_api_key().is_none());
    }

    #[test]
    fn test_validate_rejects_default_above_max() {
        let mut config = test_config();
        config.review.default_papers = 11;
        assert!(config.validate().is_err());

        config.review.default_papers = 5;
        assert!(config.validate().is_ok());

        config.review.overfetch_factor = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_ceiling_below_max_papers() {
        let mut config = test_config();
        config.search.max_results = 2;
        assert!(config.validate().is_err());

        config.search.max_results = config.review.max_papers as usize;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_var_malformed_number() {
        env::set_var("ARXIVMIND_TEST_MALFORMED_NUMBER", "abc");
        let parsed: Result<u16> = parse_var("ARXIVMIND_TEST_MALFORMED_NUMBER", 3000);
        env::remove_var("ARXIVMIND_TEST_MALFORMED_NUMBER");

        let err = parsed.unwrap_err();
        assert!(err.to_string().contains("ARXIVMIND_TEST_MALFORMED_NUMBER"));
    }

    #[test]
    fn test_parse_var_default_and_trimmed() {
        assert_eq!(parse_var("ARXIVMIND_TEST_UNSET_NUMBER", 42u32).unwrap(), 42);

        env::set_var("ARXIVMIND_TEST_PADDED_NUMBER", " 7 ");
        let parsed: u32 = parse_var("ARXIVMIND_TEST_PADDED_NUMBER", 1).unwrap();
        env::remove_var("ARXIVMIND_TEST_PADDED_NUMBER");
        assert_eq!(parsed, 7);
    }
}
