// Shared fixtures for the HTTP integration tests

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use rol_core::{
    Article, Country, CountrySummary, DashboardConfig, ImpactScore, Pillar, PillarMembership,
};
use rol_storage::MemorySource;
use rol_web::{create_app, AppState};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub fn article(id: &str, pillar: Pillar, score: i64, day: u32, summary: &str, text: &str) -> Article {
    Article {
        id: id.to_string(),
        domain_url: "orf.at".to_string(),
        link: format!("https://orf.at/stories/{}", id),
        published_date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
        title: format!("Story {}", id),
        content: format!("Full story {}", id),
        summary: summary.to_string(),
        cleaned_text: text.to_string(),
        entities: "Constitutional Court".to_string(),
        impact_score: ImpactScore::from_score(score).unwrap(),
        associated_pillar: pillar,
        pillars: PillarMembership::from_pillars(&[pillar, Pillar::CivilJustice]),
    }
}

pub fn austria() -> Vec<Article> {
    vec![
        article("1", Pillar::AbsenceOfCorruption, 2, 4, "European funds were frozen", "bribery minister scandal"),
        article("2", Pillar::AbsenceOfCorruption, 2, 5, "Minister resigns", "minister resign scandal"),
        article("3", Pillar::AbsenceOfCorruption, 4, 12, "European anticorruption funds", "reform office law"),
        article("4", Pillar::CivilJustice, 3, 13, "Court backlog shrinks", "court backlog judge"),
    ]
}

pub fn summary() -> CountrySummary {
    CountrySummary::from_json(r#"{"Pillar 2": {"Negative": "* **Bribery** cases rose"}}"#).unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub artifacts: tempfile::TempDir,
}

pub async fn test_app() -> TestApp {
    let source = MemorySource::new();
    source.insert(Country::Austria, austria(), summary()).await;

    let artifacts = tempfile::tempdir().unwrap();
    let config = DashboardConfig::default()
        .with_source("memory")
        .with_artifacts_dir(artifacts.path());
    let router = create_app(AppState::new(config, Arc::new(source))).await;
    TestApp { router, artifacts }
}

impl TestApp {
    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    pub async fn json(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self.request(method, uri, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn open_session(&self, country: &str) -> String {
        let (status, body) = self
            .json("POST", "/api/sessions", Some(serde_json::json!({ "country": country })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }
}
