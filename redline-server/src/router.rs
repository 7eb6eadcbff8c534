use redline_core::export;
use redline_core::ipc::{RedlineRequest, RedlineResponse};
use redline_core::{
    page_links, total_of, Category, CategoryScoreSet, FilterSpec, ModerationEngine, RedlineConfig,
    SeverityBand, View,
};

use crate::subsystems::ingest;

/// Dispatch a request against the engine. Shared by the IPC and HTTP transports.
pub fn handle_request(
    request: RedlineRequest,
    engine: &ModerationEngine,
    config: &RedlineConfig,
) -> RedlineResponse {
    match request {
        RedlineRequest::Ping => RedlineResponse::pong(),
        RedlineRequest::Health => RedlineResponse::ok(serde_json::json!({
            "status": "healthy",
            "records": engine.store().len(),
            "flag_threshold": engine.classifier().flag_threshold(),
            "socket": config.service.socket_path,
        })),
        RedlineRequest::Categories => RedlineResponse::ok(categories_json()),
        RedlineRequest::Insert { payload } => match ingest::ingest_payload(&payload, engine) {
            Ok(id) => RedlineResponse::ok(serde_json::json!({
                "inserted": true,
                "id": id,
            })),
            Err(e) => RedlineResponse::err(e.to_string()),
        },
        RedlineRequest::Query {
            filter,
            page,
            page_size,
            view,
        } => match query_json(engine, &filter, page, page_size, view) {
            Ok(data) => RedlineResponse::ok(data),
            Err(e) => RedlineResponse::err(e.to_string()),
        },
        RedlineRequest::Classify { score } => match classify_json(engine, score) {
            Ok(data) => RedlineResponse::ok(data),
            Err(e) => RedlineResponse::err(e.to_string()),
        },
        RedlineRequest::CategoriesAbove { scores, band } => {
            RedlineResponse::ok(categories_above_json(engine, &scores, band))
        }
        RedlineRequest::Export { filter, format } => {
            let records = engine.filtered(&filter);
            let body = export::render(&records, format)
                .map_err(anyhow::Error::from)
                .and_then(|bytes| String::from_utf8(bytes).map_err(anyhow::Error::from));
            match body {
                Ok(body) => RedlineResponse::ok(serde_json::json!({
                    "file_name": export::file_name(&filter, format),
                    "content_type": format.content_type(),
                    "count": records.len(),
                    "body": body,
                })),
                Err(e) => RedlineResponse::err(format!("Export failed: {}", e)),
            }
        }
    }
}

/// Requested page number; missing or negative values start at page 1.
pub fn resolve_page(page: Option<i64>) -> usize {
    page.unwrap_or(1).max(0) as usize
}

fn query_json(
    engine: &ModerationEngine,
    filter: &FilterSpec,
    page: Option<i64>,
    page_size: Option<usize>,
    view: Option<View>,
) -> anyhow::Result<serde_json::Value> {
    let page_number = resolve_page(page);
    let page_size = page_size.unwrap_or_else(|| engine.page_size_for(view.unwrap_or_default()));
    let page = engine.query_records(filter, page_number, page_size);
    let links = page_links(page.page_number, page.total_pages);

    tracing::debug!(
        "Query page {}/{} ({} items of {})",
        page.page_number,
        page.total_pages,
        page.items.len(),
        page.total_items
    );

    let mut data = serde_json::to_value(&page)?;
    if let Some(obj) = data.as_object_mut() {
        obj.insert("has_previous".to_string(), serde_json::json!(page.has_previous()));
        obj.insert("has_next".to_string(), serde_json::json!(page.has_next()));
        obj.insert("links".to_string(), serde_json::to_value(links)?);
    }
    Ok(data)
}

fn classify_json(engine: &ModerationEngine, score: i64) -> anyhow::Result<serde_json::Value> {
    let band = engine.classify(score)?;
    Ok(serde_json::json!({
        "score": score,
        "band": band,
        "emphasis": band.emphasis(),
        "flagged": band >= engine.classifier().flag_threshold(),
    }))
}

fn categories_above_json(
    engine: &ModerationEngine,
    scores: &CategoryScoreSet,
    band: SeverityBand,
) -> serde_json::Value {
    serde_json::json!({
        "band": band,
        "categories": engine.categories_above(scores, band),
        "max_score": total_of(scores),
    })
}

fn categories_json() -> serde_json::Value {
    let categories: Vec<serde_json::Value> = Category::ALL
        .iter()
        .map(|c| {
            serde_json::json!({
                "id": c.id(),
                "label": c.label(),
                "policy": c.is_policy(),
            })
        })
        .collect();
    serde_json::json!({ "categories": categories })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RedlineConfig {
        RedlineConfig::from_toml_str(
            "[service]\nsocket_path = \"/tmp/redline-test.sock\"\nlog_level = \"info\"\n",
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_page() {
        assert_eq!(resolve_page(None), 1);
        assert_eq!(resolve_page(Some(3)), 3);
        assert_eq!(resolve_page(Some(0)), 0);
        assert_eq!(resolve_page(Some(-4)), 0);
    }

    #[test]
    fn test_ping_and_health() {
        let engine = ModerationEngine::default();
        let config = config();
        assert!(handle_request(RedlineRequest::Ping, &engine, &config).is_ok());

        let health = handle_request(RedlineRequest::Health, &engine, &config);
        let data = health.data.unwrap();
        assert_eq!(data["status"], "healthy");
        assert_eq!(data["records"], 0);
        assert_eq!(data["flag_threshold"], "moderate");
    }

    #[test]
    fn test_classify() {
        let engine = ModerationEngine::default();
        let config = config();
        let resp = handle_request(RedlineRequest::Classify { score: 4 }, &engine, &config);
        let data = resp.data.unwrap();
        assert_eq!(data["band"], "elevated");
        assert_eq!(data["emphasis"], "warning");
        assert_eq!(data["flagged"], true);

        let resp = handle_request(RedlineRequest::Classify { score: 0 }, &engine, &config);
        assert!(!resp.is_ok());
        assert!(resp.error.unwrap().contains("Invalid score"));
    }

    #[test]
    fn test_categories_lists_all_ten() {
        let engine = ModerationEngine::default();
        let resp = handle_request(RedlineRequest::Categories, &engine, &config());
        let data = resp.data.unwrap();
        let categories = data["categories"].as_array().unwrap();
        assert_eq!(categories.len(), 10);
        assert_eq!(categories[9]["id"], "etc");
        assert_eq!(categories[9]["policy"], false);
    }

    #[test]
    fn test_categories_above() {
        let engine = ModerationEngine::default();
        let scores: CategoryScoreSet = serde_json::from_value(serde_json::json!({
            "sexual": 1, "violence": 5, "discrimination": 1, "illegal": 3, "fake": 2,
            "shocking": 4, "culture": 1, "privacy": 1, "disrespect": 2
        }))
        .unwrap();
        let resp = handle_request(
            RedlineRequest::CategoriesAbove {
                scores,
                band: SeverityBand::Elevated,
            },
            &engine,
            &config(),
        );
        let data = resp.data.unwrap();
        assert_eq!(data["categories"], serde_json::json!(["violence", "shocking"]));
        assert_eq!(data["max_score"], 5);
    }
}
