use anyhow::{Context, Result};
use sift_config::SiftConfig;
use sift_llm::build_llm_client;
use sift_web::Scraper;
use sift_web::fetch::Fetcher;
use std::time::Duration;

/// Assemble the scraper from configuration. Nothing is contacted here.
pub fn build_scraper(cfg: &SiftConfig) -> Result<Scraper> {
    let llm = build_llm_client(&cfg.llm).context("building model client")?;

    let mut fetcher = Fetcher::new().context("building fetch client")?;
    if let Some(secs) = cfg.scrape.fetch_timeout_secs {
        fetcher = fetcher.with_timeout(Duration::from_secs(secs));
    }

    tracing::info!(
        provider = cfg.llm.provider_name(),
        model = cfg.llm.model(),
        strategy = cfg.scrape.strategy.label(),
        wrap_width = cfg.scrape.wrap_width,
        fetch_timeout_secs = cfg.scrape.fetch_timeout_secs,
        "sift.wiring"
    );

    Ok(Scraper::new(fetcher, llm).with_wrap_width(cfg.scrape.wrap_width))
}
