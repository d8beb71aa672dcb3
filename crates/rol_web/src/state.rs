use chrono::{DateTime, Duration, Utc};
use rol_core::{Country, CountryDataset, DashboardConfig, DatasetSource, Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How often the background task looks for idle sessions.
pub const SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

/// One loaded country. The dataset is never mutated after loading.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub dataset: Arc<CountryDataset>,
    pub created_at: DateTime<Utc>,
    pub last_access: DateTime<Utc>,
    pub topic_artifact: Option<PathBuf>,
}

impl Session {
    pub fn is_idle(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.last_access > ttl
    }
}

pub struct AppState {
    pub config: DashboardConfig,
    pub source: Arc<dyn DatasetSource>,
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl AppState {
    pub fn new(config: DashboardConfig, source: Arc<dyn DatasetSource>) -> Self {
        Self {
            config,
            source,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        i64::try_from(self.config.session_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }

    pub async fn open_session(&self, country: Country) -> Result<Session> {
        self.expire_idle(Utc::now()).await;

        let dataset = self.source.load_dataset(country).await?;
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            dataset: Arc::new(dataset),
            created_at: now,
            last_access: now,
            topic_artifact: None,
        };
        info!(
            "🌐 Session {} opened for {} ({} articles)",
            session.id,
            country,
            session.dataset.articles.len()
        );
        self.sessions.write().await.insert(session.id, session.clone());
        Ok(session)
    }

    pub async fn close_session(&self, id: &str) -> Result<()> {
        let id = parse_id(id)?;
        let session = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        remove_artifact(session.topic_artifact.as_deref()).await;
        info!("Session {} closed", id);
        Ok(())
    }

    /// Looks a session up and marks it as used.
    pub async fn session(&self, id: &str) -> Result<Session> {
        let id = parse_id(id)?;
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        session.last_access = Utc::now();
        Ok(session.clone())
    }

    pub async fn dataset(&self, id: &str) -> Result<Arc<CountryDataset>> {
        Ok(self.session(id).await?.dataset)
    }

    pub async fn set_topic_artifact(&self, id: Uuid, path: PathBuf) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        session.topic_artifact = Some(path);
        Ok(())
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions idle for longer than the configured TTL, together with
    /// their topic artifacts. Returns how many were dropped.
    pub async fn expire_idle(&self, now: DateTime<Utc>) -> usize {
        let ttl = self.session_ttl();
        let expired: Vec<Session> = {
            let mut sessions = self.sessions.write().await;
            let ids: Vec<Uuid> = sessions
                .values()
                .filter(|s| s.is_idle(now, ttl))
                .map(|s| s.id)
                .collect();
            ids.iter().filter_map(|id| sessions.remove(id)).collect()
        };

        for session in &expired {
            info!(
                "⌛ Session {} expired after {}s idle (opened {})",
                session.id,
                (now - session.last_access).num_seconds(),
                session.created_at.to_rfc3339()
            );
            remove_artifact(session.topic_artifact.as_deref()).await;
        }
        expired.len()
    }

    /// Periodically expires idle sessions until the state is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let state: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                ticker.tick().await;
                let Some(state) = state.upgrade() else {
                    debug!("Session sweeper stopped");
                    break;
                };
                state.expire_idle(Utc::now()).await;
            }
        })
    }
}

async fn remove_artifact(path: Option<&Path>) {
    let Some(path) = path else {
        return;
    };
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed topic artifact {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("⚠️ Failed to remove {}: {}", path.display(), e),
    }
}

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| Error::SessionNotFound(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rol_storage::MemorySource;

    async fn malta_state(config: DashboardConfig) -> AppState {
        let source = MemorySource::new();
        source
            .insert(Country::Malta, Vec::new(), Default::default())
            .await;
        AppState::new(config, Arc::new(source))
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let state = malta_state(DashboardConfig::default()).await;

        let session = state.open_session(Country::Malta).await.unwrap();
        let id = session.id.to_string();
        assert_eq!(state.dataset(&id).await.unwrap().country, Country::Malta);

        state.close_session(&id).await.unwrap();
        assert!(matches!(
            state.session(&id).await,
            Err(Error::SessionNotFound(_))
        ));
        assert!(matches!(
            state.session("not-a-uuid").await,
            Err(Error::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_country() {
        let state = AppState::new(DashboardConfig::default(), Arc::new(MemorySource::new()));
        let err = state.open_session(Country::Spain).await.unwrap_err();
        assert!(matches!(err, Error::DataUnavailable { .. }));
        assert_eq!(state.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_close_removes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let state = malta_state(DashboardConfig::default()).await;
        let session = state.open_session(Country::Malta).await.unwrap();

        let artifact = dir.path().join("topics.html");
        std::fs::write(&artifact, "<html></html>").unwrap();
        state.set_topic_artifact(session.id, artifact.clone()).await.unwrap();

        state.close_session(&session.id.to_string()).await.unwrap();
        assert!(!artifact.exists());
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let dir = tempfile::tempdir().unwrap();
        let state = malta_state(DashboardConfig::default().with_session_ttl_secs(60)).await;

        let idle = state.open_session(Country::Malta).await.unwrap();
        let artifact = dir.path().join("idle.html");
        std::fs::write(&artifact, "<html></html>").unwrap();
        state.set_topic_artifact(idle.id, artifact.clone()).await.unwrap();

        let now = Utc::now();
        assert_eq!(state.expire_idle(now).await, 0);

        let active = state.open_session(Country::Malta).await.unwrap();
        let later = now + Duration::seconds(90);
        // touch the second session so only the first is idle at `later`
        {
            let mut sessions = state.sessions.write().await;
            sessions.get_mut(&active.id).unwrap().last_access = later;
        }

        assert_eq!(state.expire_idle(later).await, 1);
        assert_eq!(state.session_count().await, 1);
        assert!(!artifact.exists());
        assert!(matches!(
            state.session(&idle.id.to_string()).await,
            Err(Error::SessionNotFound(_))
        ));
        assert!(state.session(&active.id.to_string()).await.is_ok());
    }
}
