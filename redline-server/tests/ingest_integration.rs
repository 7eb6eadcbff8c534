use redline_core::ipc::RedlineRequest;
use redline_core::{FilterSpec, ModerationEngine, RedlineConfig};
use redline_server::router;
use serde_json::json;

fn config() -> RedlineConfig {
    RedlineConfig::from_toml_str(
        "[service]\nsocket_path = \"/tmp/redline-ingest-it.sock\"\nlog_level = \"info\"\n",
    )
    .expect("config should parse")
}

fn catalog_row(id: u32, date: &str, flagged: &[&str]) -> serde_json::Value {
    let mut row = json!({
        "id": id,
        "date_created": date,
        "prompt": format!("catalog prompt {id}"),
    });
    for c in [
        "sexual", "violence", "discrimination", "illegal", "fake", "shocking", "culture",
        "privacy", "disrespect", "etc",
    ] {
        row[c] = json!(if flagged.contains(&c) { "O" } else { "X" });
    }
    row
}

fn query(filter: serde_json::Value, page: i64, page_size: usize) -> RedlineRequest {
    RedlineRequest::Query {
        filter: serde_json::from_value::<FilterSpec>(filter).unwrap(),
        page: Some(page),
        page_size: Some(page_size),
        view: None,
    }
}

fn ids(data: &serde_json::Value) -> Vec<String> {
    data["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_insert_via_router() {
    let engine = ModerationEngine::from_config(&config());
    let config = config();

    let response = router::handle_request(
        RedlineRequest::Insert {
            payload: catalog_row(1, "20240501", &["violence", "shocking"]),
        },
        &engine,
        &config,
    );
    assert_eq!(response.status, "ok");
    let data = response.data.unwrap();
    assert_eq!(data["inserted"], true);
    assert_eq!(data["id"], "1");
    assert_eq!(engine.store().len(), 1);
}

#[test]
fn test_duplicate_insert_via_router() {
    let engine = ModerationEngine::from_config(&config());
    let config = config();

    let first = RedlineRequest::Insert {
        payload: catalog_row(7, "20240501", &[]),
    };
    let again = RedlineRequest::Insert {
        payload: catalog_row(7, "20240502", &["fake"]),
    };
    assert!(router::handle_request(first, &engine, &config).is_ok());
    let response = router::handle_request(again, &engine, &config);
    assert_eq!(response.status, "error");
    assert!(response.error.unwrap().contains("Duplicate record id: 7"));
    assert_eq!(engine.store().all().len(), 1);
}

#[test]
fn test_mixed_records_filter_uniformly() {
    let engine = ModerationEngine::from_config(&config());
    let config = config();

    let scored = json!({
        "id": "img-1",
        "date": "2024-05-02",
        "imageUrl": "https://images.example/1.jpg",
        "scores": {
            "sexual": 1, "violence": 4, "discrimination": 1, "illegal": 1, "fake": 1,
            "shocking": 1, "culture": 1, "privacy": 1, "disrespect": 1
        },
        "totalScore": 4
    });
    let calm = json!({
        "id": "img-2",
        "date": "2024-05-03",
        "imageUrl": "https://images.example/2.jpg",
        "scores": {
            "sexual": 1, "violence": 2, "discrimination": 1, "illegal": 1, "fake": 1,
            "shocking": 1, "culture": 1, "privacy": 1, "disrespect": 1
        },
        "totalScore": 2
    });
    for payload in [
        catalog_row(1, "20240501", &["violence"]),
        scored,
        calm,
        catalog_row(2, "20240504", &["sexual"]),
    ] {
        let response = router::handle_request(RedlineRequest::Insert { payload }, &engine, &config);
        assert!(response.is_ok(), "{:?}", response.error);
    }

    let response = router::handle_request(
        query(json!({"selected_categories": ["violence"]}), 1, 10),
        &engine,
        &config,
    );
    assert_eq!(ids(&response.data.unwrap()), vec!["1", "img-1"]);

    let response = router::handle_request(query(json!({}), 1, 10), &engine, &config);
    assert_eq!(ids(&response.data.unwrap()).len(), 4);
}

#[test]
fn test_insert_then_query_lands_on_last_page() {
    let engine = ModerationEngine::from_config(&config());
    let config = config();
    for id in 1..=10 {
        let payload = catalog_row(id, &format!("202405{:02}", id), &["privacy"]);
        router::handle_request(RedlineRequest::Insert { payload }, &engine, &config);
    }

    let filter = json!({
        "date_from": "2024-05-01",
        "date_to": "2024-05-31",
        "selected_categories": ["privacy"]
    });
    let before = router::handle_request(query(filter.clone(), 1, 5), &engine, &config);
    assert_eq!(before.data.unwrap()["total_pages"], 2);

    let payload = catalog_row(11, "20240520", &["privacy"]);
    router::handle_request(RedlineRequest::Insert { payload }, &engine, &config);

    let after = router::handle_request(query(filter, 3, 5), &engine, &config);
    let data = after.data.unwrap();
    assert_eq!(data["total_pages"], 3);
    assert_eq!(ids(&data), vec!["11"]);
}

#[test]
fn test_query_idempotent_via_router() {
    let engine = ModerationEngine::from_config(&config());
    let config = config();
    for id in 1..=6 {
        let payload = catalog_row(id, &format!("202405{:02}", id), &["culture"]);
        router::handle_request(RedlineRequest::Insert { payload }, &engine, &config);
    }
    let filter = json!({"date_from": "2024-05-02"});
    let a = router::handle_request(query(filter.clone(), 2, 2), &engine, &config);
    let b = router::handle_request(query(filter, 2, 2), &engine, &config);
    assert_eq!(a.data, b.data);
}

#[test]
fn test_export_via_router() {
    let engine = ModerationEngine::from_config(&config());
    let config = config();
    router::handle_request(
        RedlineRequest::Insert {
            payload: catalog_row(1, "20240501", &["etc"]),
        },
        &engine,
        &config,
    );
    let request: RedlineRequest =
        serde_json::from_value(json!({"action": "export", "format": "csv"})).unwrap();
    let response = router::handle_request(request, &engine, &config);
    let data = response.data.unwrap();
    assert_eq!(data["count"], 1);
    assert_eq!(data["file_name"], "moderation-all-all.csv");
    assert!(data["body"].as_str().unwrap().contains("1,2024-05-01,catalog prompt 1,"));
}

#[test]
fn test_mixed_assessment_rejected_via_router() {
    let engine = ModerationEngine::from_config(&config());
    let config = config();
    let mut payload = catalog_row(3, "20240501", &["violence"]);
    payload["scores"] = json!({
        "sexual": 1, "violence": 5, "discrimination": 1, "illegal": 1, "fake": 1,
        "shocking": 1, "culture": 1, "privacy": 1, "disrespect": 1
    });
    payload["totalScore"] = json!(5);

    let response = router::handle_request(RedlineRequest::Insert { payload }, &engine, &config);
    assert_eq!(response.status, "error");
    assert!(response.error.unwrap().contains("both scores and category flags"));
    assert!(engine.store().is_empty());
}
