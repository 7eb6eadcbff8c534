use serde::{Deserialize, Serialize};

use crate::export::ExportFormat;
use crate::filter::FilterSpec;
use crate::models::CategoryScoreSet;
use crate::paginate::View;
use crate::severity::SeverityBand;

pub const PROTOCOL_VERSION: &str = "redline/1";

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RedlineRequest {
    Ping,
    Health,
    Categories,
    Insert {
        payload: serde_json::Value,
    },
    Query {
        #[serde(default)]
        filter: FilterSpec,
        page: Option<i64>,
        page_size: Option<usize>,
        view: Option<View>,
    },
    Classify {
        score: i64,
    },
    CategoriesAbove {
        scores: CategoryScoreSet,
        band: SeverityBand,
    },
    Export {
        #[serde(default)]
        filter: FilterSpec,
        #[serde(default)]
        format: ExportFormat,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RedlineResponse {
    pub status: String,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub version: String,
}

impl RedlineResponse {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            status: "ok".to_string(),
            data: Some(data),
            error: None,
            version: PROTOCOL_VERSION.to_string(),
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            error: Some(msg.into()),
            version: PROTOCOL_VERSION.to_string(),
        }
    }

    pub fn pong() -> Self {
        Self::ok(serde_json::json!({"pong": true}))
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
