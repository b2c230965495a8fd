/// Persistence Store - Storage Abstraction for Playground Records
///
/// **Responsibility:**
/// Durable storage of folders, snippets and execution history.
///
/// **Boundary:**
/// - Stores know HOW to persist and index records
/// - Stores do NOT check ownership or authentication (the library does)
///
/// Listing operations return newest records first.

use crate::error::StoreError;
use crate::types::{ExecutionRecord, Folder, Snippet, UserId};
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

#[async_trait]
pub trait Store: Send + Sync {
    /// Insert or replace a folder
    async fn put_folder(&self, folder: &Folder) -> Result<(), StoreError>;
    async fn get_folder(&self, id: Uuid) -> Result<Option<Folder>, StoreError>;
    async fn delete_folder(&self, id: Uuid) -> Result<(), StoreError>;
    async fn folders_for_user(&self, user: &UserId) -> Result<Vec<Folder>, StoreError>;

    /// Insert or replace a snippet, keeping folder indexes consistent
    async fn put_snippet(&self, snippet: &Snippet) -> Result<(), StoreError>;
    async fn get_snippet(&self, id: Uuid) -> Result<Option<Snippet>, StoreError>;
    async fn delete_snippet(&self, id: Uuid) -> Result<(), StoreError>;
    async fn snippets_for_user(&self, user: &UserId) -> Result<Vec<Snippet>, StoreError>;
    async fn snippets_in_folder(&self, folder: Uuid) -> Result<Vec<Snippet>, StoreError>;

    async fn put_execution(&self, record: &ExecutionRecord) -> Result<(), StoreError>;
    async fn executions_for_user(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<ExecutionRecord>, StoreError>;
}

/// In-process store used when no Redis URL is configured, and in tests
///
/// Records are kept in insertion order; replacing a record keeps its slot.
#[derive(Default)]
pub struct MemoryStore {
    folders: RwLock<Vec<Folder>>,
    snippets: RwLock<Vec<Snippet>>,
    executions: RwLock<Vec<ExecutionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn put_folder(&self, folder: &Folder) -> Result<(), StoreError> {
        let mut folders = self.folders.write().await;
        match folders.iter_mut().find(|f| f.id == folder.id) {
            Some(existing) => *existing = folder.clone(),
            None => folders.push(folder.clone()),
        }
        Ok(())
    }

    async fn get_folder(&self, id: Uuid) -> Result<Option<Folder>, StoreError> {
        Ok(self.folders.read().await.iter().find(|f| f.id == id).cloned())
    }

    async fn delete_folder(&self, id: Uuid) -> Result<(), StoreError> {
        self.folders.write().await.retain(|f| f.id != id);
        Ok(())
    }

    async fn folders_for_user(&self, user: &UserId) -> Result<Vec<Folder>, StoreError> {
        Ok(self
            .folders
            .read()
            .await
            .iter()
            .rev()
            .filter(|f| &f.user_id == user)
            .cloned()
            .collect())
    }

    async fn put_snippet(&self, snippet: &Snippet) -> Result<(), StoreError> {
        let mut snippets = self.snippets.write().await;
        match snippets.iter_mut().find(|s| s.id == snippet.id) {
            Some(existing) => *existing = snippet.clone(),
            None => snippets.push(snippet.clone()),
        }
        Ok(())
    }

    async fn get_snippet(&self, id: Uuid) -> Result<Option<Snippet>, StoreError> {
        Ok(self.snippets.read().await.iter().find(|s| s.id == id).cloned())
    }

    async fn delete_snippet(&self, id: Uuid) -> Result<(), StoreError> {
        self.snippets.write().await.retain(|s| s.id != id);
        Ok(())
    }

    async fn snippets_for_user(&self, user: &UserId) -> Result<Vec<Snippet>, StoreError> {
        Ok(self
            .snippets
            .read()
            .await
            .iter()
            .rev()
            .filter(|s| &s.user_id == user)
            .cloned()
            .collect())
    }

    async fn snippets_in_folder(&self, folder: Uuid) -> Result<Vec<Snippet>, StoreError> {
        Ok(self
            .snippets
            .read()
            .await
            .iter()
            .rev()
            .filter(|s| s.folder_id == Some(folder))
            .cloned()
            .collect())
    }

    async fn put_execution(&self, record: &ExecutionRecord) -> Result<(), StoreError> {
        self.executions.write().await.push(record.clone());
        Ok(())
    }

    async fn executions_for_user(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<ExecutionRecord>, StoreError> {
        Ok(self
            .executions
            .read()
            .await
            .iter()
            .rev()
            .filter(|e| e.user_id.as_ref() == Some(user))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::Language;
    use chrono::Utc;

    fn snippet(user: &str, folder_id: Option<Uuid>, title: &str) -> Snippet {
        Snippet {
            id: Uuid::new_v4(),
            user_id: UserId::new(user),
            folder_id,
            title: title.to_string(),
            language: Language::Python,
            code: "print(1)".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_snippets_listed_newest_first() {
        let store = MemoryStore::new();
        let first = snippet("alice", None, "first");
        let second = snippet("alice", None, "second");
        store.put_snippet(&first).await.unwrap();
        store.put_snippet(&second).await.unwrap();
        store.put_snippet(&snippet("bob", None, "other")).await.unwrap();

        let titles: Vec<String> = store
            .snippets_for_user(&UserId::new("alice"))
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_replacing_snippet_updates_folder_membership() {
        let store = MemoryStore::new();
        let folder = Uuid::new_v4();
        let mut s = snippet("alice", Some(folder), "moved");
        store.put_snippet(&s).await.unwrap();
        assert_eq!(store.snippets_in_folder(folder).await.unwrap().len(), 1);

        s.folder_id = None;
        store.put_snippet(&s).await.unwrap();
        assert!(store.snippets_in_folder(folder).await.unwrap().is_empty());
        assert_eq!(store.snippets_for_user(&UserId::new("alice")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_execution_limit_applies() {
        let store = MemoryStore::new();
        let user = UserId::new("alice");
        for i in 0..5 {
            store
                .put_execution(&ExecutionRecord {
                    id: Uuid::new_v4(),
                    user_id: Some(user.clone()),
                    language: Language::Python,
                    code: format!("print({})", i),
                    output: i.to_string(),
                    error: None,
                    execution_time: None,
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        let records = store.executions_for_user(&user, 3).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].output, "4");
    }
}
