//! Turning fetched markup into what each extraction strategy feeds the model.
//!
//! The text strategy sees the whole page flattened to wrapped plain text.
//! The selector strategy sees the `<body>` markup with the noisiest blocks
//! (`svg`, `style`, `script`) cut out textually.

use regex::Regex;
use scraper::{Html, Selector};
use sift_common::{Result, SiftError};
use std::io::Cursor;
use std::sync::LazyLock;

static NOISE_BLOCKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["svg", "style", "script"]
        .iter()
        .filter_map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).ok())
        .collect()
});

/// Fetched markup as received.
#[derive(Debug, Clone)]
pub struct RawDocument {
    markup: String,
}

impl RawDocument {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
        }
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Full DOM tree. html5ever recovers from any input, so this cannot fail.
    pub fn parse(&self) -> Html {
        Html::parse_document(&self.markup)
    }

    /// Word-wrapped plain text of the whole document, block structure kept.
    pub fn plain_text(&self, width: usize) -> Result<String> {
        html2text::from_read(Cursor::new(self.markup.as_bytes()), width)
            .map_err(|e| SiftError::Markup(format!("text conversion failed: {e}")))
    }

    /// Body markup with svg/style/script blocks removed.
    pub fn cleaned_body(&self) -> String {
        strip_noise(&body_markup(&self.parse()))
    }
}

/// Inner markup of `<body>`, or the whole document when there is none.
pub fn body_markup(doc: &Html) -> String {
    let body = Selector::parse("body")
        .ok()
        .and_then(|sel| doc.select(&sel).next().map(|el| el.inner_html()));
    body.unwrap_or_else(|| doc.root_element().html())
}

pub fn strip_noise(markup: &str) -> String {
    NOISE_BLOCKS
        .iter()
        .fold(markup.to_string(), |acc, re| re.replace_all(&acc, "").into_owned())
}
