use std::path::Path;

use devgate::config::Config;
use devgate::server::handler::RequestHandler;
use devgate::server::listener;

const DEFAULT_CONFIG_PATH: &str = "devgate.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let cfg = Config::load(Path::new(&path))?;
    let handler = RequestHandler::new(&cfg)?;

    tokio::select! {
        res = listener::run(&cfg.server, handler) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
