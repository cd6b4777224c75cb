//! The two extraction strategies.
//!
//! Both take a model client and the requested fields and produce a list of
//! [`ExtractedRecord`]s. An unusable model reply is not an error: it yields
//! an empty list. Only a failed model call propagates.
pub mod selector;
pub mod text;

use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub use sift_common::ExtractionStrategy;

/// One extracted item. Keys keep the order they were inserted in.
pub type ExtractedRecord = Map<String, Value>;

/// Field name to the selector the model suggested for it.
pub type SelectorMap = BTreeMap<String, String>;

/// Fetch the first JSON object out of a model reply.
///
/// Models forced into JSON mode still occasionally wrap the object in a
/// markdown fence, so that is peeled off before parsing.
pub(crate) fn parse_reply_object(reply: &str) -> Option<Map<String, Value>> {
    let trimmed = strip_code_fence(reply.trim());
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(obj)) => Some(obj),
        Ok(other) => {
            tracing::warn!(kind = json_kind(&other), "extract.reply_not_object");
            None
        }
        Err(err) => {
            tracing::warn!(error = %err, reply_len = reply.len(), "extract.reply_unparseable");
            None
        }
    }
}

fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

pub(crate) fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
