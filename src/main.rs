use clap::Parser;
use code_exec::{CodeExecutionService, PollPolicy};
use code_exec_server::{create_app, run_server, AppState, ServerError};
use judge_client::{JudgeConfig, DEFAULT_API_HOST, DEFAULT_API_URL};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to listen on
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    addr: SocketAddr,

    /// Base URL of the execution provider
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Host identifier sent with every provider request
    #[arg(long, default_value = DEFAULT_API_HOST)]
    api_host: String,

    /// Delay between status polls in milliseconds
    #[arg(long, default_value = "1000")]
    poll_interval_ms: u64,

    /// Polls before a pending submission is reported as timed out
    #[arg(long, default_value = "30")]
    max_poll_attempts: u32,

    /// Maximum number of concurrent executions
    #[arg(
        short,
        long,
        default_value = "64",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    max_concurrent: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // A missing credential stops startup here, before anything is served
    let config = JudgeConfig::from_env()
        .map(|config| {
            config
                .with_api_url(args.api_url.clone())
                .with_api_host(args.api_host.clone())
        })
        .map_err(|e| ServerError::from(code_exec::Error::from(e)))?;

    let poll_policy = PollPolicy {
        interval: Duration::from_millis(args.poll_interval_ms),
        max_attempts: args.max_poll_attempts,
    };
    let max_concurrent = args.max_concurrent as usize;
    let service = CodeExecutionService::from_config(config, poll_policy, max_concurrent)
        .map_err(ServerError::from)?;

    info!(
        api_url = %args.api_url,
        poll_budget_secs = poll_policy.budget().as_secs(),
        "Execution provider configured"
    );

    let app = create_app(AppState::new(service));
    run_server(app, args.addr).await?;

    Ok(())
}
