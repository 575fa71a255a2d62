//! banter - a channel-lurking IRC chatterbot.

use std::io::BufRead as _;
use std::sync::Arc;

use anyhow::Context as _;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use banter::backoff::BackoffSchedule;
use banter::client::IrcConnector;
use banter::config::{Config, IgnoreSet};
use banter::model::{Chain, Model};
use banter::router::Router;
use banter::session::SessionManager;
use banter::text::{Normalizer, Snowball};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        server = %config.server.address,
        nick = %config.server.nick,
        channels = config.channels.len(),
        "Starting banter"
    );

    let model = Arc::new(Chain::new(Normalizer::new(Snowball::english())));

    // Seed the model from corpus files named after the config path.
    for path in std::env::args().skip(2) {
        let lines = learn_file(model.as_ref(), &path)
            .await
            .with_context(|| format!("learning corpus file {path}"))?;
        info!(path = %path, lines, "Learned corpus file");
    }

    let connector = IrcConnector::new(
        &config.server.address,
        config.server.tls,
        config.server.password.clone(),
        &config.server.nick,
    );
    let router = Router::new(
        &config.server.nick,
        config.channel_names(),
        IgnoreSet::new(config.ignore.clone()),
        Arc::clone(&model),
    );
    let manager = SessionManager::new(
        connector,
        config.channels.clone(),
        router,
        BackoffSchedule::default(),
    );

    manager.run().await;
    Ok(())
}

async fn learn_file<M: Model>(model: &M, path: &str) -> anyhow::Result<usize> {
    let file = std::fs::File::open(path)?;
    let mut lines = 0usize;
    for line in std::io::BufReader::new(file).lines() {
        model.learn(&line?).await;
        lines += 1;
    }
    Ok(lines)
}
