use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use llm_search::api::create_router;
use llm_search::config::Config;
use llm_search::crawler::CrawlerPool;
use llm_search::shutdown::{shutdown_signal, until_shutdown};
use llm_search::tool::{LlmSearch, LlmSearchRequest};

#[derive(Parser)]
#[command(name = "llm-search", about = "Web search with optional page crawling")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the llm_search tool over HTTP
    Serve {
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Run a single search and print the JSON result
    Query {
        query: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        start: Option<u32>,
        #[arg(long)]
        crawl: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    // Bridge log crate -> tracing (library code logs through `log`)
    tracing_log::LogTracer::init()?;

    let pool = Arc::new(CrawlerPool::new(&config.crawler)?);
    let tool = Arc::new(LlmSearch::from_config(&config, pool.clone())?);

    let res = match cli.command {
        Command::Serve { bind } => serve(tool, bind.unwrap_or(config.bind_addr)).await,
        Command::Query {
            query,
            location,
            start,
            crawl,
        } => {
            let request = LlmSearchRequest {
                query,
                location,
                start,
                crawl: Some(crawl),
            };
            match until_shutdown(tool.llm_search(&request), shutdown_signal()).await {
                Some(Ok(output)) => {
                    println!("{}", serde_json::to_string_pretty(&output)?);
                    Ok(())
                }
                Some(Err(e)) => Err(e.into()),
                None => Ok(()),
            }
        }
    };

    pool.close();
    res
}

async fn serve(tool: Arc<LlmSearch>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, create_router(tool))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
