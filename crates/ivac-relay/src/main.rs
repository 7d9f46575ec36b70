use ivac_relay::config::Config;
use ivac_relay::proxy::RelayServer;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ivac_relay=info")),
        )
        .init();

    // The listening port and upstream origin are deploy-time constants; the
    // defaults are the deployment.
    let config = Config::default();
    let server = RelayServer::new(config)?;
    server.run().await
}
