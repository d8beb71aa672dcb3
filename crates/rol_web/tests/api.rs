mod common;

use axum::http::StatusCode;
use common::test_app;
use serde_json::json;

#[tokio::test]
async fn test_countries() {
    let app = test_app().await;
    let (status, body) = app.json("GET", "/api/countries", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["Austria"]));
}

#[tokio::test]
async fn test_session_lifecycle() {
    let app = test_app().await;

    let (status, body) = app
        .json("POST", "/api/sessions", Some(json!({ "country": "austria" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["country"], "Austria");
    assert_eq!(body["overview"]["article_count"], 4);
    assert_eq!(body["overview"]["earliest"], "2024-03-04");

    let id = body["id"].as_str().unwrap().to_string();
    let (status, _) = app.json("DELETE", &format!("/api/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.json("GET", &format!("/api/sessions/{}/overview", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Session not found"));
}

#[tokio::test]
async fn test_unknown_and_missing_countries() {
    let app = test_app().await;

    let (status, _) = app
        .json("POST", "/api/sessions", Some(json!({ "country": "Atlantis" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .json("POST", "/api/sessions", Some(json!({ "country": "Malta" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Malta"));
}

#[tokio::test]
async fn test_summaries() {
    let app = test_app().await;
    let id = app.open_session("Austria").await;

    let (status, rows) = app
        .json("GET", &format!("/api/sessions/{}/summary/pillars", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows[0]["pillar"], "Pillar 2");
    assert_eq!(rows[0]["impact"], "Positive");
    assert_eq!(rows[1]["count"], 2);

    let (_, weekly) = app
        .json("GET", &format!("/api/sessions/{}/summary/weekly", id), None)
        .await;
    assert_eq!(weekly["totals"].as_array().unwrap().len(), 2);
    assert_eq!(weekly["stats"]["peak_week"], "2024-03-04");

    let (_, matrix) = app
        .json("GET", &format!("/api/sessions/{}/cooccurrence", id), None)
        .await;
    // every article is also flagged for civil justice
    assert_eq!(matrix["raw"][6][6], 4);
    assert_eq!(matrix["raw"][1][6], matrix["raw"][6][1]);

    let (_, reports) = app.json("GET", &format!("/api/sessions/{}/reports", id), None).await;
    assert_eq!(reports[1]["reports"][0]["text"], "- **Bribery** cases rose");
}

#[tokio::test]
async fn test_frequency() {
    let app = test_app().await;
    let id = app.open_session("Austria").await;
    let uri = format!("/api/sessions/{}/frequency", id);

    let (status, overview) = app.json("POST", &uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overview["by_pillar"].as_array().unwrap().len(), 8);
    assert_eq!(overview["by_pillar"][1]["terms"][0], "minister");

    let (_, detail) = app
        .json(
            "POST",
            &uri,
            Some(json!({ "pillar": "Pillar 2", "tfidf": true, "stopwords": "minister" })),
        )
        .await;
    assert_eq!(detail["weighting"], "tf_idf");
    assert_eq!(detail["by_sentiment"].as_array().unwrap().len(), 5);
    let scores = detail["scores"].as_array().unwrap();
    assert!(scores.iter().all(|s| s["term"] != "minister"));
}

#[tokio::test]
async fn test_search() {
    let app = test_app().await;
    let id = app.open_session("Austria").await;
    let uri = format!("/api/sessions/{}/search", id);

    let (status, body) = app
        .json(
            "POST",
            &uri,
            Some(json!({ "query": "european FUNDS", "pillar": "Pillar 2", "sentiment": "Negative" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["date"], "March 04, 2024");
    assert_eq!(body["results"][0]["impact"], "Negative");

    let (status, body) = app
        .json(
            "POST",
            &uri,
            Some(json!({ "query": "funds(", "pillar": "Pillar 2", "sentiment": "Negative" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid search query"));
}

#[tokio::test]
async fn test_topics() {
    let app = test_app().await;
    let id = app.open_session("Austria").await;

    let (status, _) = app
        .json("GET", &format!("/api/sessions/{}/topics/view", id), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .json(
            "POST",
            &format!("/api/sessions/{}/topics", id),
            Some(json!({ "pillar": "Pillar 2", "num_topics": 16 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .json(
            "POST",
            &format!("/api/sessions/{}/topics", id),
            Some(json!({ "pillar": "Pillar 2", "num_topics": 2, "sentiments": ["Negative"], "seed": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["topics"].as_array().unwrap().len(), 2);
    assert_eq!(body["report"]["document_count"], 2);
    let artifact = body["artifact"].as_str().unwrap();
    assert!(std::path::Path::new(artifact).starts_with(app.artifacts.path()));

    let (status, html) = app
        .request("GET", &format!("/api/sessions/{}/topics/view", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(html).unwrap().contains("<svg"));

    let artifact = std::path::PathBuf::from(artifact);
    assert!(artifact.exists());
    let (status, _) = app.json("DELETE", &format!("/api/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!artifact.exists());
}
