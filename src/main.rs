use clap::{Parser, Subcommand};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use storelink::config::Config;
use storelink::db::{self, AppState};
use storelink::handlers;
use storelink::models::Platform;
use storelink::refresh::{self, RefreshOptions};

#[derive(Parser)]
#[command(name = "storelink", about = "Store-integration lifecycle engine", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Refresh store access tokens that expire within a day
    RefreshTokens {
        /// Restrict the sweep to one platform (salla, zid, wordpress)
        #[arg(long)]
        platform: Option<Platform>,
        /// Refresh every store holding a refresh token
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storelink=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let pool = db::create_pool(&config.database_path).expect("failed to create database pool");
    {
        let conn = pool.get().expect("failed to get database connection");
        db::init_db(&conn).expect("failed to initialize database schema");
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let addr = config.addr();
            let state = AppState { db: pool, config };
            let app = handlers::router(state).layer(TraceLayer::new_for_http());

            tracing::info!("Listening on {}", addr);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .expect("failed to bind address");
            axum::serve(listener, app).await.expect("server error");
        }
        Command::RefreshTokens { platform, force } => {
            let options = RefreshOptions { platform, force };
            match refresh::run(&pool, &config, options).await {
                Ok(summary) => {
                    println!(
                        "attempted: {}, succeeded: {}, failed: {}",
                        summary.attempted, summary.succeeded, summary.failed
                    );
                    if summary.failed > 0 {
                        std::process::exit(1);
                    }
                }
                Err(e) => {
                    eprintln!("refresh sweep failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
