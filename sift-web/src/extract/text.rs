use super::{ExtractedRecord, json_kind, parse_reply_object};
use serde_json::{Map, Value, json};
use sift_common::{NOT_FOUND, Result};
use sift_llm::traits::LlmClient;

/// JSON schema describing `{ "records": [ { <field>: string, ... } ] }`.
pub fn build_schema(fields: &[String]) -> Value {
    let properties: Map<String, Value> = fields
        .iter()
        .map(|f| (f.clone(), json!({ "type": "string" })))
        .collect();

    json!({
        "type": "object",
        "properties": {
            "records": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": properties,
                    "required": fields,
                }
            }
        },
        "required": ["records"]
    })
}

pub fn build_prompt(fields: &[String], content: &str) -> String {
    let schema = build_schema(fields);
    let schema = serde_json::to_string_pretty(&schema).unwrap_or_else(|_| schema.to_string());
    format!(
        "Extract multiple records with the following fields from the given content:\n\
         {fields}\n\n\
         Content:\n\
         {content}\n\n\
         Please return the results according to the following JSON schema:\n\
         {schema}\n\n\
         Ensure all fields are present in each record, using \"{NOT_FOUND}\" if a field couldn't be extracted.\n\
         Return an array of records, even if only one record is found.",
        fields = fields.join(", "),
    )
}

/// Read `records` out of a model reply.
///
/// Records are passed through untouched: no key filtering and no sentinel
/// filling. Anything unparseable collapses to an empty list.
pub fn parse_records(reply: &str) -> Vec<ExtractedRecord> {
    let Some(mut obj) = parse_reply_object(reply) else {
        return Vec::new();
    };
    let records = match obj.remove("records") {
        Some(Value::Array(items)) => items,
        Some(other) => {
            tracing::warn!(kind = json_kind(&other), "extract.text.records_not_array");
            return Vec::new();
        }
        None => {
            tracing::warn!("extract.text.records_missing");
            return Vec::new();
        }
    };

    records
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| match item {
            Value::Object(record) => Some(record),
            other => {
                tracing::warn!(idx, kind = json_kind(&other), "extract.text.record_skipped");
                None
            }
        })
        .collect()
}

/// One JSON-mode completion over the page text.
pub async fn extract_records(
    llm: &dyn LlmClient,
    content: &str,
    fields: &[String],
) -> Result<Vec<ExtractedRecord>> {
    let prompt = build_prompt(fields, content);
    tracing::debug!(fields = fields.len(), content_len = content.len(), "extract.text.start");

    let reply = llm.generate_json(&prompt).await?;
    let records = parse_records(&reply.text);

    tracing::info!(
        records = records.len(),
        tokens = reply.tokens_used,
        "extract.text.done"
    );
    Ok(records)
}
