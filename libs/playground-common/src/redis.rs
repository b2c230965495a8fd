use crate::error::StoreError;
use crate::store::Store;
use crate::types::{ExecutionRecord, Folder, Snippet, UserId};
use ::redis::aio::ConnectionManager;
use ::redis::AsyncCommands;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Redis key semantics - every key the playground touches is built here
/// so the API and tooling never drift.
///
/// Records are JSON strings; per-owner indexes are sorted sets scored by
/// creation time in milliseconds.

pub const KEY_PREFIX: &str = "playground";

pub fn folder_key(id: &Uuid) -> String {
    format!("{}:folder:{}", KEY_PREFIX, id)
}

pub fn snippet_key(id: &Uuid) -> String {
    format!("{}:snippet:{}", KEY_PREFIX, id)
}

pub fn execution_key(id: &Uuid) -> String {
    format!("{}:execution:{}", KEY_PREFIX, id)
}

pub fn user_folders_key(user: &UserId) -> String {
    format!("{}:user:{}:folders", KEY_PREFIX, user)
}

pub fn user_snippets_key(user: &UserId) -> String {
    format!("{}:user:{}:snippets", KEY_PREFIX, user)
}

pub fn user_executions_key(user: &UserId) -> String {
    format!("{}:user:{}:executions", KEY_PREFIX, user)
}

pub fn folder_snippets_key(folder: &Uuid) -> String {
    format!("{}:folder:{}:snippets", KEY_PREFIX, folder)
}

fn score(created_at: &DateTime<Utc>) -> i64 {
    created_at.timestamp_millis()
}

/// Redis-backed store for deployments that configure `REDIS_URL`
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = ::redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn))
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(key).await?;
        match payload {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    /// Resolve an index (newest first) into records, skipping dangling ids
    async fn load_index<T: DeserializeOwned>(
        &self,
        index_key: &str,
        limit: Option<usize>,
        record_key: fn(&Uuid) -> String,
    ) -> Result<Vec<T>, StoreError> {
        let stop = match limit {
            Some(0) => return Ok(Vec::new()),
            Some(n) => n as isize - 1,
            None => -1,
        };
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn.zrevrange(index_key, 0, stop).await?;

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            let Ok(id) = Uuid::parse_str(&id) else {
                tracing::warn!(index = %index_key, id = %id, "Skipping malformed index entry");
                continue;
            };
            if let Some(record) = self.get_json(&record_key(&id)).await? {
                records.push(record);
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn put_folder(&self, folder: &Folder) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let payload = serde_json::to_string(folder)?;
        let _: () = conn.set(folder_key(&folder.id), payload).await?;
        let _: () = conn
            .zadd(user_folders_key(&folder.user_id), folder.id.to_string(), score(&folder.created_at))
            .await?;
        Ok(())
    }

    async fn get_folder(&self, id: Uuid) -> Result<Option<Folder>, StoreError> {
        self.get_json(&folder_key(&id)).await
    }

    async fn delete_folder(&self, id: Uuid) -> Result<(), StoreError> {
        let Some(folder) = self.get_folder(id).await? else {
            return Ok(());
        };
        let mut conn = self.conn.clone();
        let _: () = conn.zrem(user_folders_key(&folder.user_id), id.to_string()).await?;
        let _: () = conn.del(folder_snippets_key(&id)).await?;
        let _: () = conn.del(folder_key(&id)).await?;
        Ok(())
    }

    async fn folders_for_user(&self, user: &UserId) -> Result<Vec<Folder>, StoreError> {
        self.load_index(&user_folders_key(user), None, folder_key).await
    }

    async fn put_snippet(&self, snippet: &Snippet) -> Result<(), StoreError> {
        let previous = self.get_snippet(snippet.id).await?;
        let mut conn = self.conn.clone();
        let member = snippet.id.to_string();
        let at = score(&snippet.created_at);

        if let Some(old_folder) = previous.and_then(|p| p.folder_id) {
            if Some(old_folder) != snippet.folder_id {
                let _: () = conn.zrem(folder_snippets_key(&old_folder), &member).await?;
            }
        }

        let payload = serde_json::to_string(snippet)?;
        let _: () = conn.set(snippet_key(&snippet.id), payload).await?;
        let _: () = conn.zadd(user_snippets_key(&snippet.user_id), &member, at).await?;
        if let Some(folder) = snippet.folder_id {
            let _: () = conn.zadd(folder_snippets_key(&folder), &member, at).await?;
        }
        Ok(())
    }

    async fn get_snippet(&self, id: Uuid) -> Result<Option<Snippet>, StoreError> {
        self.get_json(&snippet_key(&id)).await
    }

    async fn delete_snippet(&self, id: Uuid) -> Result<(), StoreError> {
        let Some(snippet) = self.get_snippet(id).await? else {
            return Ok(());
        };
        let mut conn = self.conn.clone();
        let member = id.to_string();
        let _: () = conn.zrem(user_snippets_key(&snippet.user_id), &member).await?;
        if let Some(folder) = snippet.folder_id {
            let _: () = conn.zrem(folder_snippets_key(&folder), &member).await?;
        }
        let _: () = conn.del(snippet_key(&id)).await?;
        Ok(())
    }

    async fn snippets_for_user(&self, user: &UserId) -> Result<Vec<Snippet>, StoreError> {
        self.load_index(&user_snippets_key(user), None, snippet_key).await
    }

    async fn snippets_in_folder(&self, folder: Uuid) -> Result<Vec<Snippet>, StoreError> {
        self.load_index(&folder_snippets_key(&folder), None, snippet_key).await
    }

    async fn put_execution(&self, record: &ExecutionRecord) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let payload = serde_json::to_string(record)?;
        let _: () = conn.set(execution_key(&record.id), payload).await?;
        if let Some(user) = &record.user_id {
            let _: () = conn
                .zadd(user_executions_key(user), record.id.to_string(), score(&record.created_at))
                .await?;
        }
        Ok(())
    }

    async fn executions_for_user(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<ExecutionRecord>, StoreError> {
        self.load_index(&user_executions_key(user), Some(limit), execution_key).await
    }
}
