use clap::Parser;
use rag_agent::cli::{Args, Command};
use rag_agent::{agent, api, middleware, Config};
use std::sync::Arc;
use tracing::info;
use warp::Filter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if args.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!("Configuration loaded");

    let executor = agent::from_config(&config).await?;

    match args.command() {
        Command::Ask { query } => {
            let response = executor.invoke(&query).await?;
            println!("{}", response.output);
        }
        Command::Serve { port } => {
            let routes = api::routes(Arc::new(executor))
                .with(warp::log("api"))
                .with(middleware::cors());

            let port = port.unwrap_or(config.port);
            info!("Server listening on {}", port);

            warp::serve(routes).run(([0, 0, 0, 0], port)).await;
        }
    }

    Ok(())
}
