use anyhow::Result;
use clap::Parser;
use staynest_server::{create_app, identity_config_from_env, ServerConfig, StaynestServer};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "staynest-server", about = "Staynest identity and session API")]
struct Args {
    /// Bind address for the HTTP listener
    #[arg(long, env = "STAYNEST_BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("staynest_server=info,identity_engine=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let mut config = ServerConfig::from_env();
    config.bind_addr = args.bind;

    let server = StaynestServer::new(config.clone(), identity_config_from_env())?;
    let app = create_app(server);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "{} listening", config.name);
    axum::serve(listener, app).await?;

    Ok(())
}
