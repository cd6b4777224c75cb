use anyhow::Result;
use sift_common::observability::init_logging;
use sift_config::{SiftConfig, SiftConfigLoader};
mod wiring;

const CONFIG_FILE: &str = "sift.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    // SIFT__* env wins over the optional file.
    let cfg: SiftConfig = SiftConfigLoader::new()
        .with_optional_file(CONFIG_FILE)
        .load()?;

    let log_path = init_logging(cfg.logging.to_log_config("sift"))?;
    tracing::info!(
        log = %log_path.display(),
        version = cfg.version.as_deref().unwrap_or("-"),
        "sift.start"
    );

    let scraper = wiring::build_scraper(&cfg)?;
    sift_tui::run(scraper, cfg.scrape.strategy).await
}
