use std::net::TcpListener;

use anyhow::Context;
use common::utils;
use relay::Config;
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    utils::load_dotenv();
    utils::init_tracing();

    info!("Starting the predict relay");
    let config = Config::from_env()?;
    let address = config.server_address();
    let listener =
        TcpListener::bind(&address).with_context(|| format!("failed to bind {address}"))?;

    info!(
        upstream = %config.predict_url(),
        timeout_secs = config.upstream_timeout.as_secs(),
        auth = config.api_key.is_some(),
        "Starting HTTP server on {}",
        address
    );
    relay::run(config, listener)?.await?;

    Ok(())
}
