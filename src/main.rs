use std::net::SocketAddr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tokio::net::TcpListener;
use tracing::{error, info};

use arxivmind::{
    config::Config, routes::create_router, run_review, AppState, ReviewRequest, TeamConfig,
};

#[derive(Parser)]
#[command(name = "arxivmind", version, about = "Automated arXiv literature reviews")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one literature review and print each agent message as it arrives
    Review {
        /// Research topic
        topic: String,
        /// Number of papers to review
        #[arg(short, long)]
        papers: Option<i64>,
        /// Model identifier (defaults to LLM_MODEL)
        #[arg(short, long)]
        model: Option<String>,
        /// Turn bound; 1 stops after the search agent
        #[arg(long, default_value_t = TeamConfig::DEFAULT_MAX_TURNS)]
        turns: usize,
    },
    /// Start the HTTP server
    Serve {
        /// Overrides PORT
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    arxivmind::utils::init_logger();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config.server);

    match cli.command {
        Command::Review {
            topic,
            papers,
            model,
            turns,
        } => {
            let request = ReviewRequest::new(
                topic,
                papers.unwrap_or_else(|| i64::from(config.review.default_papers)),
                model.unwrap_or_else(|| config.llm.default_model.clone()),
            );
            review(config, request, turns).await
        }
        Command::Serve { port } => serve(config, port).await,
    }
}

async fn review(config: Config, request: ReviewRequest, turns: usize) -> anyhow::Result<()> {
    let team_config = TeamConfig::new(turns)?;
    let state = AppState::from_config(config)?;

    let mut frames = run_review(
        &request,
        team_config,
        state.llm.clone(),
        state.index.clone(),
        &state.config,
    )?;

    while let Some(frame) = frames.next().await {
        match frame {
            Ok(frame) => println!("**{}**: {}\n", frame.source, frame.content.trim()),
            Err(e) => {
                error!(error = %e, "Review failed");
                return Err(e.into());
            }
        }
    }

    println!("Review complete");
    Ok(())
}

async fn serve(mut config: Config, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }

    let host: std::net::IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid HOST: {}", config.server.host))?;
    let addr = SocketAddr::new(host, config.server.port);

    // Create shared state
    let state = AppState::from_config(config)?;

    // Create router
    let app = create_router(state);

    // Start server
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
