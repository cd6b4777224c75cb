//! Single page scraping: fetch a URL, normalize the markup and pull the
//! requested fields out with the help of a language model.
//!
//! [`scrape::Scraper`] is the entry point. It never returns an error; every
//! failure is logged and reported as an unsuccessful [`scrape::ScrapeResult`].
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod scrape;

pub use extract::{ExtractedRecord, ExtractionStrategy, SelectorMap};
pub use scrape::{ScrapeRequest, ScrapeResult, Scraper};
