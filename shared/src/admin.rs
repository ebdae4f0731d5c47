//! Query-log and statistics records served to the admin page.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// One row of the server's query log.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub id: i64,
    pub timestamp: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub court_complex: Option<String>,
    pub case_type: Option<String>,
    pub case_number: Option<String>,
    pub case_year: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
}

const ROW_WITHOUT_RAW_JSON: usize = 13;
const ROW_WITH_RAW_JSON: usize = 14;

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn flag(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

impl QueryLogEntry {
    /// Decodes a raw log row.
    ///
    /// Tables created with every column hold `raw_json_response` before
    /// `success`; tables migrated in place have it appended as the last
    /// column instead. The position of the boolean tells them apart.
    pub fn from_row(row: &[Value]) -> Result<Self, ApiError> {
        if row.len() != ROW_WITHOUT_RAW_JSON && row.len() != ROW_WITH_RAW_JSON {
            return Err(ApiError::Malformed {
                reason: format!("query log row has {} columns", row.len()),
            });
        }

        let id = row[0].as_i64().ok_or_else(|| ApiError::Malformed {
            reason: "query log row id is not an integer".into(),
        })?;

        let (success, error_message) = match (flag(row.get(12)), flag(row.get(11))) {
            (Some(success), _) if row.len() == ROW_WITH_RAW_JSON => (success, text(row.get(13))),
            (_, Some(success)) => (success, text(row.get(12))),
            _ => {
                return Err(ApiError::Malformed {
                    reason: format!("query log row {id} has no success flag"),
                })
            }
        };

        Ok(Self {
            id,
            timestamp: text(row.get(1)),
            state: text(row.get(2)),
            district: text(row.get(3)),
            court_complex: text(row.get(4)),
            case_type: text(row.get(5)),
            case_number: text(row.get(6)),
            case_year: text(row.get(7)),
            success,
            error_message,
        })
    }

    pub fn from_rows(rows: &[Vec<Value>]) -> Result<Vec<Self>, ApiError> {
        rows.iter().map(|r| Self::from_row(r)).collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryStats {
    pub total_queries: u64,
    pub successful_queries: u64,
    pub failed_queries: u64,
    pub success_rate: f64,
    #[serde(default)]
    pub top_states: Vec<(String, u64)>,
}

impl QueryStats {
    pub fn success_rate_label(&self) -> String {
        format!("{:.1}%", self.success_rate)
    }
}
