use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{NavigationHistory, NavigationHistoryItem, SessionContext, HISTORY_CAPACITY},
};

/// History of an idle session expires after 30 days
const HISTORY_TTL: u64 = 2_592_000;

/// Per-session navigation history
///
/// Every backend keeps the [`NavigationHistory`] rules: most recent first,
/// unique by path, at most `HISTORY_CAPACITY` entries.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait HistoryStore: Send + Sync {
    /// Records a visit and returns the updated history, most recent first
    async fn record(
        &self,
        session: &SessionContext,
        item: NavigationHistoryItem,
    ) -> AppResult<Vec<NavigationHistoryItem>>;

    async fn list(&self, session: &SessionContext) -> AppResult<Vec<NavigationHistoryItem>>;

    async fn clear(&self, session: &SessionContext) -> AppResult<()>;
}

/// Builds a history entry stamped with the current time
pub fn new_visit(path: &str, name: &str, category: &str) -> AppResult<NavigationHistoryItem> {
    let path = path.trim();
    if path.is_empty() {
        return Err(AppError::InvalidInput("Path cannot be empty".to_string()));
    }
    if !path.starts_with('/') {
        return Err(AppError::InvalidInput(format!(
            "Path must be a site route starting with '/': {}",
            path
        )));
    }
    if name.trim().is_empty() {
        return Err(AppError::InvalidInput("Name cannot be empty".to_string()));
    }

    Ok(NavigationHistoryItem {
        path: path.to_string(),
        name: name.trim().to_string(),
        category: category.trim().to_string(),
        timestamp: chrono::Utc::now().timestamp_millis(),
    })
}

struct SessionHistory {
    history: NavigationHistory,
    touched_at: Instant,
}

/// Process-local history, lost on restart
///
/// Sessions idle for longer than the idle TTL are dropped on the next write,
/// mirroring the expiry the Redis backend gets from `EX`.
#[derive(Clone)]
pub struct MemoryHistoryStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHistory>>>,
    idle_ttl: Duration,
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::with_idle_ttl(Duration::from_secs(HISTORY_TTL))
    }
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
        }
    }
}

#[async_trait::async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn record(
        &self,
        session: &SessionContext,
        item: NavigationHistoryItem,
    ) -> AppResult<Vec<NavigationHistoryItem>> {
        let mut sessions = self.sessions.write().await;
        let idle_ttl = self.idle_ttl;
        let before = sessions.len();
        sessions.retain(|_, s| s.touched_at.elapsed() < idle_ttl);
        if sessions.len() < before {
            tracing::debug!(evicted = before - sessions.len(), "Evicted idle sessions");
        }

        let entry = sessions
            .entry(session.session_id)
            .or_insert_with(|| SessionHistory {
                history: NavigationHistory::default(),
                touched_at: Instant::now(),
            });
        entry.history.record(item);
        entry.touched_at = Instant::now();
        Ok(entry.history.items().to_vec())
    }

    async fn list(&self, session: &SessionContext) -> AppResult<Vec<NavigationHistoryItem>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(&session.session_id)
            .filter(|s| s.touched_at.elapsed() < self.idle_ttl)
            .map(|s| s.history.items().to_vec())
            .unwrap_or_default())
    }

    async fn clear(&self, session: &SessionContext) -> AppResult<()> {
        self.sessions.write().await.remove(&session.session_id);
        Ok(())
    }
}

/// Promotes ARGV[1] to the front of the JSON list at KEYS[1], drops any older
/// entry with the same path, keeps ARGV[2] entries and refreshes the expiry to
/// ARGV[3] seconds. Returns the stored JSON.
const RECORD_VISIT_SCRIPT: &str = r#"
local raw = redis.call('GET', KEYS[1])
local items = {}
if raw then
    items = cjson.decode(raw)
end
local entry = cjson.decode(ARGV[1])
local capacity = tonumber(ARGV[2])
local updated = { entry }
for _, item in ipairs(items) do
    if #updated >= capacity then
        break
    end
    if item.path ~= entry.path then
        table.insert(updated, item)
    end
end
local encoded = cjson.encode(updated)
redis.call('SET', KEYS[1], encoded, 'EX', tonumber(ARGV[3]))
return encoded
"#;

/// History kept in Redis as one JSON list per session
///
/// Each write refreshes the expiry, so active visitors keep their history.
/// Visits are applied by a server-side script, so concurrent requests for
/// the same session never overwrite each other's entries.
#[derive(Clone)]
pub struct RedisHistoryStore {
    cache: Cache,
    record_script: Arc<redis::Script>,
}

impl RedisHistoryStore {
    pub fn new(cache: Cache) -> Self {
        Self {
            cache,
            record_script: Arc::new(redis::Script::new(RECORD_VISIT_SCRIPT)),
        }
    }

    async fn load(&self, key: &CacheKey) -> AppResult<NavigationHistory> {
        Ok(self.cache.get_from_cache(key).await?.unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn record(
        &self,
        session: &SessionContext,
        item: NavigationHistoryItem,
    ) -> AppResult<Vec<NavigationHistoryItem>> {
        let key = CacheKey::History(session.session_id);
        let entry = serde_json::to_string(&item)
            .map_err(|e| AppError::Internal(format!("History serialization error: {}", e)))?;

        let stored: String = self
            .cache
            .run_script(
                &self.record_script,
                &key,
                &[entry, HISTORY_CAPACITY.to_string(), HISTORY_TTL.to_string()],
            )
            .await?;

        let history: NavigationHistory = serde_json::from_str(&stored)
            .map_err(|e| AppError::Internal(format!("History deserialization error: {}", e)))?;
        Ok(history.into_items())
    }

    async fn list(&self, session: &SessionContext) -> AppResult<Vec<NavigationHistoryItem>> {
        let key = CacheKey::History(session.session_id);
        Ok(self.load(&key).await?.into_items())
    }

    async fn clear(&self, session: &SessionContext) -> AppResult<()> {
        self.cache
            .delete(&CacheKey::History(session.session_id))
            .await
    }
}
