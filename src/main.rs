use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rodent_search::api::{ApiServer, ServerConfig};
use rodent_search::search::types::{
    DEFAULT_KEYWORD_COLLECTION, DEFAULT_VECTOR_COLLECTION, DEFAULT_VECTOR_FIELD,
};
use rodent_search::{Config, Strategy, StrategySettings};

#[derive(Parser)]
#[command(name = "rodent-search")]
#[command(about = "Keyword, vector and hybrid search over Elasticsearch", long_about = None)]
struct Cli {
    /// Dense vector field of the vector collection
    #[arg(long, default_value = DEFAULT_VECTOR_FIELD)]
    vector_field: String,

    /// Collection used by keyword search
    #[arg(long, default_value = DEFAULT_KEYWORD_COLLECTION)]
    keyword_collection: String,

    /// Collection used by vector and hybrid search
    #[arg(long, default_value = DEFAULT_VECTOR_COLLECTION)]
    vector_collection: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one strategy and print the documents as JSON
    Search {
        /// keyword, vector, filtered, generated-vector, hybrid-boost or hybrid-rrf
        #[arg(short, long, default_value = "keyword")]
        strategy: Strategy,

        /// Search term
        term: String,
    },

    /// Start API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Directory served under /static
        #[arg(long, default_value = "static")]
        static_dir: PathBuf,

        /// Abort a strategy call after this many seconds (no limit by default)
        #[arg(long)]
        deadline_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "rodent_search=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    let settings = StrategySettings::new()
        .with_vector_field(cli.vector_field.as_str())
        .with_collections(cli.keyword_collection.as_str(), cli.vector_collection.as_str());
    let strategies = config.build_strategies(settings);

    match cli.command {
        Commands::Search { strategy, ref term } => {
            let documents = strategies.run(strategy, term).await?;
            println!("{}", serde_json::to_string_pretty(&documents)?);
        }

        Commands::Serve {
            host,
            port,
            static_dir,
            deadline_secs,
        } => {
            let server_config = ServerConfig {
                host,
                port,
                static_dir,
                deadline: deadline_secs.map(Duration::from_secs),
                ..ServerConfig::default()
            };

            let server = ApiServer::new(server_config, strategies);
            server.start().await?;
        }
    }

    Ok(())
}
