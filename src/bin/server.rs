use slack_recap::core::config::AppConfig;
use tracing::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    slack_recap::setup_logging();

    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        anyhow::anyhow!(e)
    })?;
    slack_recap::server::serve(config).await
}
