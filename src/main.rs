use std::sync::Arc;

use plaza_rust::app::{LoggingSink, PlazaApp};
use plaza_rust::plaza::SeededDecoder;
use plaza_rust::utils::logging::{init_logging, log_system_info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    log_system_info();

    let settings = plaza_rust::load_settings().unwrap_or_default();
    tracing::info!("feed endpoint: {}", settings.data_source.feed_url);

    let app = PlazaApp::new(settings, Arc::new(LoggingSink), Arc::new(SeededDecoder));
    app.run().await
}
