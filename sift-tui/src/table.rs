use serde_json::Value;
use sift_web::ExtractedRecord;

/// Records flattened to display strings.
///
/// Columns are the first record's keys in order. Later records that lack a
/// column get an empty cell and their extra keys are not shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultTable {
    pub fn from_records(records: &[ExtractedRecord]) -> Self {
        let Some(first) = records.first() else {
            return Self::default();
        };
        let columns: Vec<String> = first.keys().cloned().collect();
        let rows = records
            .iter()
            .map(|rec| {
                columns
                    .iter()
                    .map(|col| rec.get(col).map(cell_text).unwrap_or_default())
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn cell_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
