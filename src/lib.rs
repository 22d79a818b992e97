// ArXivMind - automated arXiv literature reviews with a two-agent LLM pipeline

pub mod config;
pub mod models;
pub mod types;
pub mod agents;
pub mod llm;
pub mod search;    // arXiv export API client
pub mod routes;
pub mod middleware;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::{AppState, ReviewRequest};
pub use agents::{run_review, Frame, RoleName, TeamConfig};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
