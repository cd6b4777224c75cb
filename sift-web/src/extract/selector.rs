use super::{ExtractedRecord, SelectorMap, json_kind, parse_reply_object};
use crate::normalize::RawDocument;
use scraper::{Html, Selector};
use serde_json::Value;
use sift_common::{NOT_FOUND, Result};
use sift_llm::traits::LlmClient;

pub fn build_prompt(fields: &[String], markup: &str) -> String {
    format!(
        "Given the following HTML content, suggest a CSS selector or XPath for each of these fields:\n\
         {fields}\n\n\
         HTML content:\n\
         {markup}\n\n\
         Return a flat JSON object where each key is a field name and each value is a single selector string.",
        fields = fields.join(", "),
    )
}

/// Keep the string-valued entries of the model's reply.
pub fn parse_selector_map(reply: &str) -> SelectorMap {
    let Some(obj) = parse_reply_object(reply) else {
        return SelectorMap::new();
    };
    obj.into_iter()
        .filter_map(|(field, value)| match value {
            Value::String(sel) if !sel.trim().is_empty() => Some((field, sel.trim().to_string())),
            other => {
                tracing::warn!(%field, kind = json_kind(&other), "extract.selector.unusable_entry");
                None
            }
        })
        .collect()
}

/// Fill records positionally from selector matches.
///
/// Match `i` of a field lands in record `i`. A field whose selector matches
/// nothing (or does not parse as CSS) gets the sentinel in record 0 only, so
/// the record count is the largest match count and shorter fields leave
/// later records without their key.
pub fn apply_selectors(doc: &Html, selectors: &SelectorMap, fields: &[String]) -> Vec<ExtractedRecord> {
    let mut records: Vec<ExtractedRecord> = Vec::new();

    for field in fields {
        let Some(raw) = selectors.get(field) else {
            tracing::debug!(%field, "extract.selector.no_selector");
            continue;
        };

        let matches: Vec<String> = match Selector::parse(raw) {
            Ok(sel) => doc
                .select(&sel)
                .map(|el| el.text().collect::<String>().trim().to_string())
                .collect(),
            Err(err) => {
                tracing::warn!(%field, selector = %raw, error = ?err, "extract.selector.invalid");
                Vec::new()
            }
        };
        tracing::debug!(%field, selector = %raw, matches = matches.len(), "extract.selector.applied");

        if matches.is_empty() {
            if records.is_empty() {
                records.push(ExtractedRecord::new());
            }
            records[0].insert(field.clone(), Value::String(NOT_FOUND.to_string()));
            continue;
        }

        for (idx, text) in matches.into_iter().enumerate() {
            if records.len() <= idx {
                records.push(ExtractedRecord::new());
            }
            records[idx].insert(field.clone(), Value::String(text));
        }
    }

    records
}

/// Ask the model for selectors against the cleaned body, then read the full document.
pub async fn extract_records(
    llm: &dyn LlmClient,
    doc: &RawDocument,
    fields: &[String],
) -> Result<Vec<ExtractedRecord>> {
    let prompt = build_prompt(fields, &doc.cleaned_body());
    tracing::debug!(fields = fields.len(), prompt_len = prompt.len(), "extract.selector.start");

    let reply = llm.generate_json(&prompt).await?;
    let selectors = parse_selector_map(&reply.text);

    let records = apply_selectors(&doc.parse(), &selectors, fields);
    tracing::info!(
        selectors = selectors.len(),
        records = records.len(),
        "extract.selector.done"
    );
    Ok(records)
}
