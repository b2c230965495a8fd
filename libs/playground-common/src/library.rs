/// Snippet Library - User-Scoped Folders, Snippets and Run History
///
/// **Ownership Rules:**
/// - Mutations require an authenticated user
/// - Queries without a user return an empty list
/// - A record owned by someone else is reported exactly like a missing one
/// - Deleting a folder deletes the snippets inside it

use crate::error::LibraryError;
use crate::languages::Language;
use crate::store::Store;
use crate::types::{ExecutionRecord, Folder, Snippet, UserId};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

pub const HISTORY_LIMIT: usize = 50;
pub const RECENT_LIMIT: usize = 10;

/// Fields of a finished run worth keeping in history
#[derive(Debug, Clone)]
pub struct NewExecution {
    pub language: Language,
    pub code: String,
    pub output: String,
    pub error: Option<String>,
    pub execution_time: Option<f64>,
}

#[derive(Clone)]
pub struct Library {
    store: Arc<dyn Store>,
}

fn require_user(user: Option<&UserId>) -> Result<&UserId, LibraryError> {
    user.ok_or(LibraryError::Unauthenticated)
}

fn require_non_empty(value: &str, field: &'static str) -> Result<(), LibraryError> {
    if value.trim().is_empty() {
        return Err(LibraryError::EmptyField(field));
    }
    Ok(())
}

impl Library {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn owned_folder(&self, user: &UserId, id: Uuid) -> Result<Folder, LibraryError> {
        match self.store.get_folder(id).await? {
            Some(folder) if &folder.user_id == user => Ok(folder),
            _ => Err(LibraryError::NotFound("Folder")),
        }
    }

    async fn owned_snippet(&self, user: &UserId, id: Uuid) -> Result<Snippet, LibraryError> {
        match self.store.get_snippet(id).await? {
            Some(snippet) if &snippet.user_id == user => Ok(snippet),
            _ => Err(LibraryError::NotFound("Snippet")),
        }
    }

    pub async fn create_folder(
        &self,
        user: Option<&UserId>,
        name: &str,
        description: Option<String>,
    ) -> Result<Folder, LibraryError> {
        let user = require_user(user)?;
        require_non_empty(name, "Folder name")?;

        let folder = Folder {
            id: Uuid::new_v4(),
            user_id: user.clone(),
            name: name.to_string(),
            description,
            created_at: Utc::now(),
        };
        self.store.put_folder(&folder).await?;
        info!(user = %user, folder_id = %folder.id, "Folder created");
        Ok(folder)
    }

    pub async fn list_folders(&self, user: Option<&UserId>) -> Result<Vec<Folder>, LibraryError> {
        match user {
            Some(user) => Ok(self.store.folders_for_user(user).await?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn rename_folder(
        &self,
        user: Option<&UserId>,
        folder_id: Uuid,
        name: &str,
    ) -> Result<Folder, LibraryError> {
        let user = require_user(user)?;
        require_non_empty(name, "Folder name")?;

        let mut folder = self.owned_folder(user, folder_id).await?;
        folder.name = name.to_string();
        self.store.put_folder(&folder).await?;
        Ok(folder)
    }

    /// Delete a folder together with every snippet filed under it
    pub async fn delete_folder(
        &self,
        user: Option<&UserId>,
        folder_id: Uuid,
    ) -> Result<(), LibraryError> {
        let user = require_user(user)?;
        self.owned_folder(user, folder_id).await?;

        let snippets = self.store.snippets_in_folder(folder_id).await?;
        let removed = snippets.len();
        for snippet in snippets {
            self.store.delete_snippet(snippet.id).await?;
        }
        self.store.delete_folder(folder_id).await?;

        info!(user = %user, folder_id = %folder_id, snippets_removed = removed, "Folder deleted");
        Ok(())
    }

    pub async fn save_snippet(
        &self,
        user: Option<&UserId>,
        title: &str,
        language: Language,
        code: &str,
        folder_id: Option<Uuid>,
    ) -> Result<Snippet, LibraryError> {
        let user = require_user(user)?;
        require_non_empty(title, "Snippet title")?;
        if let Some(folder_id) = folder_id {
            self.owned_folder(user, folder_id).await?;
        }

        let snippet = Snippet {
            id: Uuid::new_v4(),
            user_id: user.clone(),
            folder_id,
            title: title.to_string(),
            language,
            code: code.to_string(),
            created_at: Utc::now(),
        };
        self.store.put_snippet(&snippet).await?;
        info!(user = %user, snippet_id = %snippet.id, language = %language, "Snippet saved");
        Ok(snippet)
    }

    /// List a user's snippets, optionally restricted to one of their folders
    pub async fn list_snippets(
        &self,
        user: Option<&UserId>,
        folder_id: Option<Uuid>,
    ) -> Result<Vec<Snippet>, LibraryError> {
        let Some(user) = user else {
            return Ok(Vec::new());
        };
        match folder_id {
            Some(folder_id) => {
                let snippets = self.store.snippets_in_folder(folder_id).await?;
                Ok(snippets.into_iter().filter(|s| &s.user_id == user).collect())
            }
            None => Ok(self.store.snippets_for_user(user).await?),
        }
    }

    pub async fn delete_snippet(
        &self,
        user: Option<&UserId>,
        snippet_id: Uuid,
    ) -> Result<(), LibraryError> {
        let user = require_user(user)?;
        self.owned_snippet(user, snippet_id).await?;
        self.store.delete_snippet(snippet_id).await?;
        debug!(user = %user, snippet_id = %snippet_id, "Snippet deleted");
        Ok(())
    }

    /// Move a snippet into a folder, or out of any folder with `None`
    pub async fn move_snippet(
        &self,
        user: Option<&UserId>,
        snippet_id: Uuid,
        folder_id: Option<Uuid>,
    ) -> Result<Snippet, LibraryError> {
        let user = require_user(user)?;
        let mut snippet = self.owned_snippet(user, snippet_id).await?;
        if let Some(folder_id) = folder_id {
            self.owned_folder(user, folder_id).await?;
        }

        snippet.folder_id = folder_id;
        self.store.put_snippet(&snippet).await?;
        Ok(snippet)
    }

    /// Record a finished run in the caller's history
    ///
    /// Anonymous runs have no history to land in and are not stored.
    pub async fn save_execution(
        &self,
        user: Option<&UserId>,
        execution: NewExecution,
    ) -> Result<Option<ExecutionRecord>, LibraryError> {
        let Some(user) = user else {
            debug!(language = %execution.language, "Anonymous run not recorded");
            return Ok(None);
        };

        let record = ExecutionRecord {
            id: Uuid::new_v4(),
            user_id: Some(user.clone()),
            language: execution.language,
            code: execution.code,
            output: execution.output,
            error: execution.error,
            execution_time: execution.execution_time,
            created_at: Utc::now(),
        };
        self.store.put_execution(&record).await?;
        Ok(Some(record))
    }

    pub async fn list_executions(
        &self,
        user: Option<&UserId>,
    ) -> Result<Vec<ExecutionRecord>, LibraryError> {
        self.executions_up_to(user, HISTORY_LIMIT).await
    }

    pub async fn recent_executions(
        &self,
        user: Option<&UserId>,
    ) -> Result<Vec<ExecutionRecord>, LibraryError> {
        self.executions_up_to(user, RECENT_LIMIT).await
    }

    async fn executions_up_to(
        &self,
        user: Option<&UserId>,
        limit: usize,
    ) -> Result<Vec<ExecutionRecord>, LibraryError> {
        match user {
            Some(user) => Ok(self.store.executions_for_user(user, limit).await?),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn library() -> Library {
        Library::new(Arc::new(MemoryStore::new()))
    }

    fn alice() -> UserId {
        UserId::new("alice")
    }

    fn bob() -> UserId {
        UserId::new("bob")
    }

    fn run(output: &str) -> NewExecution {
        NewExecution {
            language: Language::Python,
            code: "print('x')".to_string(),
            output: output.to_string(),
            error: None,
            execution_time: Some(0.02),
        }
    }

    #[tokio::test]
    async fn test_mutations_require_user() {
        let lib = library();
        assert!(matches!(
            lib.create_folder(None, "Work", None).await,
            Err(LibraryError::Unauthenticated)
        ));
        assert!(matches!(
            lib.save_snippet(None, "t", Language::C, "", None).await,
            Err(LibraryError::Unauthenticated)
        ));
        assert!(matches!(
            lib.delete_snippet(None, Uuid::new_v4()).await,
            Err(LibraryError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_queries_without_user_are_empty() {
        let lib = library();
        lib.create_folder(Some(&alice()), "Work", None).await.unwrap();
        assert!(lib.list_folders(None).await.unwrap().is_empty());
        assert!(lib.list_snippets(None, None).await.unwrap().is_empty());
        assert!(lib.list_executions(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_folder_listing_is_per_user_and_newest_first() {
        let lib = library();
        lib.create_folder(Some(&alice()), "First", None).await.unwrap();
        lib.create_folder(Some(&alice()), "Second", Some("desc".to_string()))
            .await
            .unwrap();
        lib.create_folder(Some(&bob()), "Bob's", None).await.unwrap();

        let names: Vec<String> = lib
            .list_folders(Some(&alice()))
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn test_foreign_folder_looks_missing() {
        let lib = library();
        let folder = lib.create_folder(Some(&alice()), "Work", None).await.unwrap();

        let err = lib.rename_folder(Some(&bob()), folder.id, "Mine").await.unwrap_err();
        assert_eq!(err.to_string(), "Folder not found or unauthorized");

        let err = lib.delete_folder(Some(&bob()), folder.id).await.unwrap_err();
        assert!(matches!(err, LibraryError::NotFound("Folder")));

        let renamed = lib.rename_folder(Some(&alice()), folder.id, "Play").await.unwrap();
        assert_eq!(renamed.name, "Play");
    }

    #[tokio::test]
    async fn test_delete_folder_cascades_to_snippets() {
        let lib = library();
        let user = alice();
        let folder = lib.create_folder(Some(&user), "Work", None).await.unwrap();
        lib.save_snippet(Some(&user), "in", Language::Go, "package main", Some(folder.id))
            .await
            .unwrap();
        let loose = lib
            .save_snippet(Some(&user), "out", Language::Go, "package main", None)
            .await
            .unwrap();

        lib.delete_folder(Some(&user), folder.id).await.unwrap();

        let remaining = lib.list_snippets(Some(&user), None).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, loose.id);
        assert!(lib.list_folders(Some(&user)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_move_snippet_between_folders() {
        let lib = library();
        let user = alice();
        let a = lib.create_folder(Some(&user), "A", None).await.unwrap();
        let b = lib.create_folder(Some(&user), "B", None).await.unwrap();
        let snippet = lib
            .save_snippet(Some(&user), "s", Language::Rust, "fn main() {}", Some(a.id))
            .await
            .unwrap();

        lib.move_snippet(Some(&user), snippet.id, Some(b.id)).await.unwrap();
        assert!(lib.list_snippets(Some(&user), Some(a.id)).await.unwrap().is_empty());
        assert_eq!(lib.list_snippets(Some(&user), Some(b.id)).await.unwrap().len(), 1);

        let unfiled = lib.move_snippet(Some(&user), snippet.id, None).await.unwrap();
        assert!(unfiled.folder_id.is_none());
    }

    #[tokio::test]
    async fn test_cannot_file_into_foreign_folder() {
        let lib = library();
        let foreign = lib.create_folder(Some(&bob()), "Bob", None).await.unwrap();
        let err = lib
            .save_snippet(Some(&alice()), "s", Language::C, "int main;", Some(foreign.id))
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::NotFound("Folder")));
    }

    #[tokio::test]
    async fn test_foreign_snippet_cannot_be_deleted() {
        let lib = library();
        let snippet = lib
            .save_snippet(Some(&alice()), "s", Language::Java, "class Main {}", None)
            .await
            .unwrap();
        let err = lib.delete_snippet(Some(&bob()), snippet.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Snippet not found or unauthorized");
        assert_eq!(lib.list_snippets(Some(&alice()), None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_names_rejected() {
        let lib = library();
        let err = lib.create_folder(Some(&alice()), "  ", None).await.unwrap_err();
        assert!(matches!(err, LibraryError::EmptyField(_)));
    }

    #[tokio::test]
    async fn test_execution_history_limits() {
        let lib = library();
        let user = alice();
        for i in 0..60 {
            lib.save_execution(Some(&user), run(&i.to_string())).await.unwrap();
        }
        assert!(lib.save_execution(None, run("anonymous")).await.unwrap().is_none());

        let history = lib.list_executions(Some(&user)).await.unwrap();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].output, "59");

        let recent = lib.recent_executions(Some(&user)).await.unwrap();
        assert_eq!(recent.len(), RECENT_LIMIT);
        assert!(recent.iter().all(|r| r.output != "anonymous"));
    }
}
