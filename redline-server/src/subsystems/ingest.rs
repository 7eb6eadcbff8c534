//! Ingestion boundary: upstream payloads become validated records.
//!
//! Two payload shapes arrive here:
//! - screening results: `scores` (or the gallery's `metadata`) with 1-5 values,
//!   an authoritative `totalScore`, an optional `reason`;
//! - saved-prompt catalog rows: one `O`/`X` mark per category at top level.
//!
//! Anything malformed is rejected here so the engine only ever holds whole,
//! valid records.

use std::collections::BTreeSet;
use std::path::Path;

use redline_core::models::flag::parse_mark;
use redline_core::models::{parse_calendar_date, GeneratedImage};
use redline_core::{
    Assessment, Category, CategoryFlagSet, CategoryScoreSet, ContentRef, ModerationEngine,
    ModerationRecord, RecordId, RedlineError, Score, ScoredAssessment,
};
use serde::Serialize;
use serde_json::{Map, Value};

type Object = Map<String, Value>;

/// Outcome of a catalog import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub inserted: usize,
    pub rejected: Vec<RejectedEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RejectedEntry {
    pub index: usize,
    pub error: String,
}

/// Validate one payload and insert it. Returns the stored id.
pub fn ingest_payload(payload: &Value, engine: &ModerationEngine) -> Result<RecordId, RedlineError> {
    let record = record_from_payload(payload)?;
    let id = record.id().clone();
    engine.insert(record)?;
    Ok(id)
}

/// Insert every entry of a JSON array. Bad entries are reported, not fatal.
pub fn import_catalog(entries: &Value, engine: &ModerationEngine) -> Result<ImportReport, RedlineError> {
    let entries = entries
        .as_array()
        .ok_or_else(|| RedlineError::InvalidRecord("catalog must be a JSON array".to_string()))?;

    let mut report = ImportReport::default();
    for (index, entry) in entries.iter().enumerate() {
        match ingest_payload(entry, engine) {
            Ok(_) => report.inserted += 1,
            Err(e) => {
                tracing::warn!("Catalog entry {} rejected: {}", index, e);
                report.rejected.push(RejectedEntry {
                    index,
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        "Catalog import complete: {} inserted, {} rejected",
        report.inserted,
        report.rejected.len()
    );
    Ok(report)
}

pub fn import_catalog_file(path: impl AsRef<Path>, engine: &ModerationEngine) -> Result<ImportReport, RedlineError> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    let entries: Value = serde_json::from_str(&raw)?;
    import_catalog(&entries, engine)
}

pub fn record_from_payload(payload: &Value) -> Result<ModerationRecord, RedlineError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| invalid("payload must be a JSON object"))?;

    let id = match field(obj, &["id"]) {
        Some(Value::String(s)) if !s.trim().is_empty() => RecordId::new(s.trim()),
        Some(Value::Number(n)) => RecordId::new(n.to_string()),
        None | Some(Value::Null) => RecordId::generate(),
        Some(_) => return Err(invalid("'id' must be a string or number")),
    };

    let date = field(obj, &["date", "date_created", "created_at", "createdAt"])
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("missing 'date'"))?;
    let created_at = parse_calendar_date(date)?;

    let content = content_from(obj)?;
    let assessment = assessment_from(obj)?;

    Ok(ModerationRecord::new(id, created_at, content, assessment))
}

fn content_from(obj: &Object) -> Result<ContentRef, RedlineError> {
    if let Some(url) = field(obj, &["imageUrl", "image_url"]).and_then(Value::as_str) {
        let name = field(obj, &["imageName", "image_name"])
            .and_then(Value::as_str)
            .map(str::to_string);
        return Ok(ContentRef::Image {
            name,
            url: url.to_string(),
        });
    }

    if let Some(text) = field(obj, &["prompt"]).and_then(Value::as_str) {
        let images = match field(obj, &["images"]) {
            Some(Value::Array(items)) => items
                .iter()
                .map(image_from)
                .collect::<Result<Vec<_>, _>>()?,
            _ => Vec::new(),
        };
        return Ok(ContentRef::Prompt {
            text: text.to_string(),
            images,
        });
    }

    Err(invalid("missing content reference ('imageUrl' or 'prompt')"))
}

fn image_from(value: &Value) -> Result<GeneratedImage, RedlineError> {
    let url = value
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("image entry missing 'url'"))?;
    let model = value
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    Ok(GeneratedImage {
        url: url.to_string(),
        model: model.to_string(),
    })
}

fn assessment_from(obj: &Object) -> Result<Assessment, RedlineError> {
    if let Some(scores) = field(obj, &["scores", "metadata"]).and_then(Value::as_object) {
        if obj.keys().any(|key| key.parse::<Category>().is_ok()) {
            return Err(invalid("payload carries both scores and category flags"));
        }

        let mut seen = BTreeSet::new();
        let mut parsed = Vec::with_capacity(scores.len());
        for (key, value) in scores {
            let category: Category = key.parse()?;
            ensure_unique(&mut seen, category)?;
            let raw = value
                .as_i64()
                .ok_or_else(|| invalid(format!("score for '{}' must be an integer", key)))?;
            parsed.push((category, Score::new(raw)?));
        }
        let scores = CategoryScoreSet::new(parsed)?;

        let total = field(obj, &["totalScore", "total_score", "total"])
            .ok_or_else(|| invalid("missing 'totalScore'"))?
            .as_i64()
            .ok_or_else(|| invalid("'totalScore' must be an integer"))?;
        let total = Score::new(total)?;

        let reason = field(obj, &["reason"])
            .and_then(Value::as_str)
            .map(str::to_string);

        return Ok(Assessment::Scored(ScoredAssessment {
            scores,
            total,
            reason,
        }));
    }

    let mut seen = BTreeSet::new();
    let mut flags = Vec::new();
    for (key, value) in obj {
        let Ok(category) = key.parse::<Category>() else {
            continue;
        };
        ensure_unique(&mut seen, category)?;
        let flagged = match value {
            Value::String(mark) => parse_mark(mark)?,
            Value::Bool(b) => *b,
            _ => return Err(invalid(format!("flag for '{}' must be O or X", key))),
        };
        flags.push((category, flagged));
    }
    if flags.is_empty() {
        return Err(invalid("payload carries neither scores nor category flags"));
    }
    Ok(Assessment::Flagged {
        flags: CategoryFlagSet::new(flags)?,
    })
}

/// Keys match case-insensitively, so `violence` and `Violence` collide.
fn ensure_unique(seen: &mut BTreeSet<Category>, category: Category) -> Result<(), RedlineError> {
    if !seen.insert(category) {
        return Err(invalid(format!("duplicate category '{}'", category.id())));
    }
    Ok(())
}

fn field<'a>(obj: &'a Object, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| obj.get(*name))
}

fn invalid(msg: impl Into<String>) -> RedlineError {
    RedlineError::InvalidRecord(msg.into())
}
