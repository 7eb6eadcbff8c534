//! Serialize a filtered record set for download.
//!
//! Supports:
//! - `csv`  - one row per record, spreadsheet friendly
//! - `json` - pretty-printed array of records

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::RedlineError;
use crate::filter::FilterSpec;
use crate::models::flag::mark;
use crate::models::{Assessment, Category, ModerationRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = RedlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(RedlineError::InvalidRecord(format!(
                "Unknown export format '{}'. Valid formats: csv, json",
                s
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// `moderation-<from>-<to>.<ext>`; open bounds are written as `all`.
pub fn file_name(spec: &FilterSpec, format: ExportFormat) -> String {
    let bound = |d: Option<chrono::NaiveDate>| {
        d.map(|d| d.format("%Y%m%d").to_string())
            .unwrap_or_else(|| "all".to_string())
    };
    format!(
        "moderation-{}-{}.{}",
        bound(spec.date_from),
        bound(spec.date_to),
        format.extension()
    )
}

pub fn render(records: &[Arc<ModerationRecord>], format: ExportFormat) -> Result<Vec<u8>, RedlineError> {
    match format {
        ExportFormat::Csv => Ok(render_csv(records).into_bytes()),
        ExportFormat::Json => Ok(serde_json::to_vec_pretty(records)?),
    }
}

fn render_csv(records: &[Arc<ModerationRecord>]) -> String {
    let mut out = String::new();
    let mut header = vec!["id", "date", "content"];
    header.extend(Category::ALL.iter().map(|c| c.id()));
    header.extend(["total", "reason"]);
    push_row(&mut out, header.iter().map(|h| h.to_string()));

    for record in records {
        let mut row = vec![
            record.id().to_string(),
            record.created_at().format("%Y-%m-%d").to_string(),
            record.content().summary().to_string(),
        ];
        match record.assessment() {
            Assessment::Scored(scored) => {
                row.extend(Category::ALL.iter().map(|c| {
                    scored
                        .scores
                        .get(*c)
                        .map(|s| s.to_string())
                        .unwrap_or_default()
                }));
                row.push(scored.total.to_string());
                row.push(scored.reason.clone().unwrap_or_default());
            }
            Assessment::Flagged { flags } => {
                row.extend(Category::ALL.iter().map(|c| mark(flags.is_flagged(*c)).to_string()));
                row.push(String::new());
                row.push(String::new());
            }
        }
        push_row(&mut out, row.into_iter());
    }
    out
}

fn push_row(out: &mut String, fields: impl Iterator<Item = String>) {
    let line: Vec<String> = fields.map(|f| escape_csv(&f)).collect();
    out.push_str(&line.join(","));
    out.push_str("\r\n");
}

/// RFC 4180: quote fields holding a comma, quote or line break; double inner quotes.
fn escape_csv(field: &str) -> String {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
