use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use notemap::config::Settings;
use notemap::server::{bind_listener, create_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn router() -> Router {
    create_router(AppState::new(Settings::default()))
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = router().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_index_lists_endpoints() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["endpoints"]["/process"].is_string());
    assert!(body["endpoints"]["/generate_connection"].is_string());
    assert!(body["endpoints"]["/health"].is_string());
}

#[tokio::test]
async fn test_process_sample_notes() {
    let notes: Value = serde_json::from_str(notemap::SAMPLE_NOTES_JSON).unwrap();
    let mut notes = notes.as_array().unwrap().clone();
    notes[0]["wordCount"] = json!(12);
    notes[0]["tags"] = json!(["ml"]);
    let payload = json!({
        "notes": notes,
        "settings": { "perplexity": 40, "iterations": 500, "learning_rate": 150.0 }
    });

    let (status, body) = send(post_json("/process", payload.to_string())).await;
    assert_eq!(status, StatusCode::OK);

    let points = body["points"].as_array().unwrap();
    assert_eq!(points.len(), 10);
    assert_eq!(points[0]["path"], "note1.md");
    assert_eq!(points[0]["wordCount"], 12);
    assert_eq!(points[0]["tags"], json!(["ml"]));
    assert!(points[1].get("wordCount").is_none());

    assert!(body["clusters"].as_u64().is_some());
    let cluster_terms = body["cluster_terms"].as_object().unwrap();
    for point in points {
        let cluster = point["cluster"].as_i64().unwrap();
        assert!(point["top_terms"].as_array().unwrap().len() <= 5);
        if cluster == -1 {
            assert!(point["distanceToCenter"].is_null());
        } else {
            assert!(cluster_terms.contains_key(&cluster.to_string()));
            assert!(point["distanceToCenter"].as_f64().unwrap() >= 0.0);
        }
    }
    assert!(body["feature_names"].as_array().unwrap().len() <= 100);
}

#[tokio::test]
async fn test_process_too_few_notes() {
    let payload = json!({
        "notes": [
            { "path": "a.md", "title": "A", "content": "alpha" },
            { "path": "b.md", "title": "B", "content": "beta" }
        ]
    });
    let (status, body) = send(post_json("/process", payload.to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("at least 5 notes"));
}

#[tokio::test]
async fn test_process_malformed_json() {
    let (status, body) = send(post_json("/process", "{not json".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_process_invalid_settings() {
    let notes: Value = serde_json::from_str(notemap::SAMPLE_NOTES_JSON).unwrap();
    let payload = json!({ "notes": notes, "settings": { "iterations": 10 } });
    let (status, body) = send(post_json("/process", payload.to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("iterations"));
}

#[tokio::test]
async fn test_generate_connection() {
    let payload = json!({
        "source_note": { "title": "Deep Learning", "content": "...", "terms": ["neural"] },
        "target_note": { "title": "Neural Networks", "content": "...", "terms": ["brain"] },
        "common_terms": ["neural", "learning"],
        "cluster_terms": ["networks"]
    });
    let (status, body) = send(post_json("/generate_connection", payload.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    let description = body["description"].as_str().unwrap();
    assert!(description.contains("Deep Learning"));
    assert!(description.contains("Neural Networks"));
}

#[tokio::test]
async fn test_generate_connection_missing_note() {
    let payload = json!({ "source_note": { "title": "Only One" } });
    let (status, body) = send(post_json("/generate_connection", payload.to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing required data" }));
}

#[tokio::test]
async fn test_bind_listener_accepts_host_name() {
    let settings = Settings {
        host: "localhost".to_string(),
        port: 0,
        ..Settings::default()
    };
    let listener = bind_listener(&settings).await.unwrap();
    assert!(listener.local_addr().unwrap().ip().is_loopback());
}
