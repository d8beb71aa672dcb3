use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use rol_analysis::{
    aggregate::{dataset_overview, pillar_impact_summary, weekly_summary, DatasetOverview},
    cooccurrence::cooccurrence,
    frequency::{default_user_stopwords, PillarTerms, SentimentTerms, TermScore},
    media_reports, search, StopWords, TermExtractor, TopicModeller, TopicReport, TopicRequest,
    Weighting,
};
use rol_core::{Country, Error, ImpactScore, Pillar, TextField};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::AppState;

pub async fn list_countries(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let countries = state.source.available_countries().await?;
    Ok(Json(countries))
}

#[derive(Debug, Deserialize)]
pub struct CreateSession {
    pub country: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub country: Country,
    pub overview: DatasetOverview,
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateSession>,
) -> ApiResult<impl IntoResponse> {
    let country: Country = body.country.parse()?;
    let session = state.open_session(country).await?;
    let info = SessionInfo {
        id: session.id,
        country,
        overview: dataset_overview(&session.dataset),
    };
    Ok((StatusCode::CREATED, Json(info)))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.close_session(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_overview(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let dataset = state.dataset(&id).await?;
    Ok(Json(dataset_overview(&dataset)))
}

pub async fn get_reports(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let dataset = state.dataset(&id).await?;
    Ok(Json(media_reports(&dataset.summary)))
}

pub async fn get_pillar_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let dataset = state.dataset(&id).await?;
    Ok(Json(pillar_impact_summary(&dataset.articles)))
}

pub async fn get_weekly_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let dataset = state.dataset(&id).await?;
    Ok(Json(weekly_summary(&dataset.articles)))
}

pub async fn get_cooccurrence(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let dataset = state.dataset(&id).await?;
    Ok(Json(cooccurrence(&dataset.articles)))
}

#[derive(Debug, Default, Deserialize)]
pub struct FrequencyBody {
    #[serde(default)]
    pub field: TextField,
    /// Whitespace-separated words; the country defaults when absent
    #[serde(default)]
    pub stopwords: Option<String>,
    #[serde(default)]
    pub tfidf: bool,
    #[serde(default)]
    pub pillar: Option<Pillar>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FrequencyResponse {
    pub field: TextField,
    pub weighting: Weighting,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_pillar: Option<Vec<PillarTerms>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_sentiment: Option<Vec<SentimentTerms>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<Vec<TermScore>>,
}

pub async fn post_frequency(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<FrequencyBody>,
) -> ApiResult<impl IntoResponse> {
    let dataset = state.dataset(&id).await?;
    let stopwords = body
        .stopwords
        .unwrap_or_else(|| default_user_stopwords(dataset.country));
    let weighting = Weighting::from_tfidf(body.tfidf);
    let extractor = TermExtractor::new(body.field, StopWords::new(&stopwords))
        .with_weighting(weighting)
        .with_limit(body.limit.unwrap_or(state.config.top_terms));

    let response = match body.pillar {
        Some(pillar) => FrequencyResponse {
            field: body.field,
            weighting,
            by_pillar: None,
            by_sentiment: Some(extractor.top_terms_by_sentiment(&dataset.articles, pillar)),
            scores: Some(extractor.term_scores(&dataset.articles, pillar)),
        },
        None => FrequencyResponse {
            field: body.field,
            weighting,
            by_pillar: Some(extractor.top_terms_by_pillar(&dataset.articles)),
            by_sentiment: None,
            scores: None,
        },
    };
    Ok(Json(response))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TopicsResponse {
    pub report: TopicReport,
    /// Rendered visualization, absent for an empty report
    pub artifact: Option<String>,
}

pub async fn post_topics(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<TopicRequest>,
) -> ApiResult<impl IntoResponse> {
    let session = state.session(&id).await?;
    let modeller = TopicModeller::new(state.config.topic_passes, state.config.max_topics);

    let dataset = session.dataset.clone();
    let report = tokio::task::spawn_blocking(move || modeller.fit(&dataset.articles, &request))
        .await
        .map_err(|e| Error::Analysis(format!("Topic model task failed: {}", e)))??;

    let artifact = match report.render_html() {
        Some(html) => {
            tokio::fs::create_dir_all(&state.config.artifacts_dir)
                .await
                .map_err(Error::from)?;
            let path = state
                .config
                .artifacts_dir
                .join(format!("topics-{}.html", session.id));
            tokio::fs::write(&path, html).await.map_err(Error::from)?;
            info!("📊 Topic visualization written to {}", path.display());
            state.set_topic_artifact(session.id, path.clone()).await?;
            Some(path.display().to_string())
        }
        None => {
            debug!("Empty topic report for session {}", session.id);
            None
        }
    };

    Ok(Json(TopicsResponse { report, artifact }))
}

pub async fn get_topic_view(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let session = state.session(&id).await?;
    let path = session.topic_artifact.ok_or_else(|| {
        Error::InvalidInput("No topic visualization has been rendered for this session".to_string())
    })?;
    let html = tokio::fs::read_to_string(&path).await.map_err(Error::from)?;
    Ok(Html(html))
}

#[derive(Debug, Deserialize)]
pub struct SearchBody {
    #[serde(default)]
    pub query: String,
    pub pillar: Pillar,
    pub sentiment: ImpactScore,
}

pub async fn post_search(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<SearchBody>,
) -> ApiResult<impl IntoResponse> {
    let dataset = state.dataset(&id).await?;
    let results = search(&dataset.articles, body.pillar, body.sentiment, &body.query)?;
    Ok(Json(results))
}
