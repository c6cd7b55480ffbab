use crate::models::{
    Author, AuthorName, CreateAuthorError, CreateAuthorRequest, DeleteAuthorError,
    DeleteAuthorRequest, FindAllAuthorsError, UpdateAuthorError, UpdateAuthorRequest,
};
use crate::repositories::AuthorRepository;
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::sync::RwLock;

/// Author repository backed by a single JSON array on disk.
///
/// Every operation re-reads the whole file and every mutation rewrites it.
/// Within one process reads share the lock and mutations hold it exclusively;
/// writers in other processes still race with last write wins.
#[derive(Debug)]
pub struct JsonFileAuthorRepository {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonFileAuthorRepository {
    /// Opens the store at `path`, seeding an empty collection if the file does
    /// not exist yet. A file that exists is left untouched, even if corrupt.
    pub async fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
        }

        let exists = fs::try_exists(&path)
            .await
            .with_context(|| format!("Failed to inspect authors file {}", path.display()))?;
        if !exists {
            tracing::info!(path = %path.display(), "seeding empty authors file");
            save(&path, &[]).await?;
        }

        Ok(Self {
            path,
            lock: RwLock::new(()),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AuthorRecord {
    id: u64,
    name: String,
}

impl From<AuthorRecord> for Author {
    fn from(record: AuthorRecord) -> Self {
        Self::new(record.id, AuthorName::new_unchecked(&record.name))
    }
}

impl From<&Author> for AuthorRecord {
    fn from(author: &Author) -> Self {
        Self {
            id: author.id(),
            name: author.name().to_string(),
        }
    }
}

async fn load(path: &Path) -> anyhow::Result<Vec<Author>> {
    let data = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read authors file {}", path.display()))?;
    let records: Vec<AuthorRecord> = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse authors file {}", path.display()))?;

    tracing::debug!(path = %path.display(), count = records.len(), "loaded authors");
    Ok(records.into_iter().map(Author::from).collect())
}

async fn save(path: &Path, authors: &[Author]) -> anyhow::Result<()> {
    let records: Vec<AuthorRecord> = authors.iter().map(AuthorRecord::from).collect();
    let data = serde_json::to_string_pretty(&records).context("Failed to serialize authors")?;

    // Replace the file in one step so readers never see a truncated document.
    let tmp = tmp_path(path);
    fs::write(&tmp, data)
        .await
        .with_context(|| format!("Failed to write authors file {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to replace authors file {}", path.display()))?;

    tracing::debug!(path = %path.display(), count = records.len(), "saved authors");
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn now_millis() -> anyhow::Result<u64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("System clock is set before the unix epoch")?;
    u64::try_from(elapsed.as_millis()).map_err(|_| anyhow!("Timestamp does not fit in 64 bits"))
}

/// Ids are the creation time in milliseconds, bumped past the largest
/// existing id so sequential creates within one millisecond stay unique.
fn next_author_id(authors: &[Author], now_millis: u64) -> anyhow::Result<u64> {
    match authors.iter().map(Author::id).max() {
        Some(max) if max >= now_millis => max
            .checked_add(1)
            .ok_or_else(|| anyhow!("No author id left above {max}")),
        _ => Ok(now_millis),
    }
}

#[async_trait]
impl AuthorRepository for JsonFileAuthorRepository {
    async fn create_author(&self, req: &CreateAuthorRequest) -> Result<Author, CreateAuthorError> {
        let _guard = self.lock.write().await;

        let mut authors = load(&self.path).await.map_err(|err| {
            err.context(format!(
                r#"Failed to create author with name "{}""#,
                req.name()
            ))
        })?;

        let id = next_author_id(&authors, now_millis()?)?;
        let author = Author::new(id, req.name().clone());
        authors.push(author.clone());

        save(&self.path, &authors).await.map_err(|err| {
            err.context(format!(
                r#"Failed to create author with name "{}""#,
                req.name()
            ))
        })?;

        Ok(author)
    }

    async fn find_all_authors(&self) -> Result<Vec<Author>, FindAllAuthorsError> {
        let _guard = self.lock.read().await;

        let authors = load(&self.path)
            .await
            .map_err(|err| FindAllAuthorsError(err.context("Failed to retrieve all authors")))?;

        Ok(authors)
    }

    async fn update_author(&self, req: &UpdateAuthorRequest) -> Result<Author, UpdateAuthorError> {
        let _guard = self.lock.write().await;

        let mut authors = load(&self.path).await.map_err(|err| {
            err.context(format!(r#"Failed to update author with id "{}""#, req.id()))
        })?;

        let author = authors
            .iter_mut()
            .find(|author| author.id() == req.id())
            .ok_or(UpdateAuthorError::NotFound { id: req.id() })?;
        author.rename(req.name().clone());
        let author = author.clone();

        save(&self.path, &authors).await.map_err(|err| {
            err.context(format!(r#"Failed to update author with id "{}""#, req.id()))
        })?;

        Ok(author)
    }

    async fn delete_author(&self, req: &DeleteAuthorRequest) -> Result<(), DeleteAuthorError> {
        let _guard = self.lock.write().await;

        let mut authors = load(&self.path).await.map_err(|err| {
            err.context(format!(r#"Failed to delete author with id "{}""#, req.id()))
        })?;

        let before = authors.len();
        authors.retain(|author| author.id() != req.id());
        if authors.len() == before {
            return Err(DeleteAuthorError::NotFound { id: req.id() });
        }

        save(&self.path, &authors).await.map_err(|err| {
            err.context(format!(r#"Failed to delete author with id "{}""#, req.id()))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn author(id: u64, name: &str) -> Author {
        Author::new(id, AuthorName::new_unchecked(name))
    }

    async fn seeded(dir: &tempfile::TempDir, authors: &[Author]) -> JsonFileAuthorRepository {
        let path = dir.path().join("authors.json");
        save(&path, authors).await.unwrap();
        JsonFileAuthorRepository::open(path).await.unwrap()
    }

    #[tokio::test]
    async fn open_seeds_missing_file_with_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("authors.json");

        let repo = JsonFileAuthorRepository::open(&path).await.unwrap();

        assert_eq!(fs::read_to_string(&path).await.unwrap(), "[]");
        assert!(repo.find_all_authors().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn open_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let repo = seeded(&dir, &[author(1, "Ada")]).await;

        let reopened = JsonFileAuthorRepository::open(repo.path()).await.unwrap();
        assert_eq!(reopened.find_all_authors().await.unwrap(), vec![author(1, "Ada")]);
    }

    #[tokio::test]
    async fn save_then_load_preserves_order_and_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authors.json");
        let authors = vec![author(30, "Grace"), author(10, "Ada"), author(20, "Barbara")];

        save(&path, &authors).await.unwrap();

        assert_eq!(load(&path).await.unwrap(), authors);
    }

    #[tokio::test]
    async fn save_writes_two_space_indented_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authors.json");

        save(&path, &[author(1, "Ada")]).await.unwrap();

        let data = fs::read_to_string(&path).await.unwrap();
        assert_eq!(data, "[\n  {\n    \"id\": 1,\n    \"name\": \"Ada\"\n  }\n]");
    }

    #[tokio::test]
    async fn create_appends_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let repo = seeded(&dir, &[author(1, "Ada")]).await;

        let req = CreateAuthorRequest::new(AuthorName::new("Grace").unwrap());
        let created = repo.create_author(&req).await.unwrap();

        assert_eq!(created.name().as_str(), "Grace");
        let authors = repo.find_all_authors().await.unwrap();
        assert_eq!(authors, vec![author(1, "Ada"), created]);
    }

    #[tokio::test]
    async fn sequential_creates_assign_distinct_ids() {
        let dir = tempfile::tempdir().unwrap();
        let repo = seeded(&dir, &[]).await;

        let mut ids = HashSet::new();
        for i in 0..25 {
            let req = CreateAuthorRequest::new(AuthorName::new(&format!("Author {i}")).unwrap());
            ids.insert(repo.create_author(&req).await.unwrap().id());
        }

        assert_eq!(ids.len(), 25);
    }

    #[test]
    fn next_author_id_uses_clock_or_bumps_past_max() {
        assert_eq!(next_author_id(&[], 1_000).unwrap(), 1_000);
        assert_eq!(next_author_id(&[author(5, "Ada")], 1_000).unwrap(), 1_000);
        assert_eq!(next_author_id(&[author(1_000, "Ada")], 1_000).unwrap(), 1_001);
        assert_eq!(next_author_id(&[author(2_000, "Ada")], 1_000).unwrap(), 2_001);
    }

    #[test]
    fn next_author_id_refuses_to_overflow() {
        assert!(next_author_id(&[author(u64::MAX, "Ada")], 1_000).is_err());
    }

    #[tokio::test]
    async fn create_after_max_id_fails_and_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let repo = seeded(&dir, &[author(u64::MAX, "Ada")]).await;
        let before = fs::read(repo.path()).await.unwrap();

        let req = CreateAuthorRequest::new(AuthorName::new("Grace").unwrap());
        assert!(repo.create_author(&req).await.is_err());

        assert_eq!(fs::read(repo.path()).await.unwrap(), before);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn list_never_sees_a_partial_file_while_creating() {
        let dir = tempfile::tempdir().unwrap();
        let initial: Vec<Author> = (1..=2_000).map(|id| author(id, "Ada")).collect();
        let repo = std::sync::Arc::new(seeded(&dir, &initial).await);

        let writer = {
            let repo = std::sync::Arc::clone(&repo);
            tokio::spawn(async move {
                for i in 0..100 {
                    let name = AuthorName::new(&format!("Author {i}")).unwrap();
                    repo.create_author(&CreateAuthorRequest::new(name)).await.unwrap();
                }
            })
        };

        loop {
            let authors = repo.find_all_authors().await.unwrap();
            assert!(authors.len() >= initial.len());
            if writer.is_finished() {
                break;
            }
        }
        writer.await.unwrap();

        assert_eq!(repo.find_all_authors().await.unwrap().len(), initial.len() + 100);
    }

    #[tokio::test]
    async fn save_leaves_no_temporary_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authors.json");

        save(&path, &[author(1, "Ada")]).await.unwrap();

        assert!(!fs::try_exists(tmp_path(&path)).await.unwrap());
    }

    #[tokio::test]
    async fn update_renames_matching_author() {
        let dir = tempfile::tempdir().unwrap();
        let repo = seeded(&dir, &[author(1, "Ada"), author(2, "Grace")]).await;

        let req = UpdateAuthorRequest::new(1, AuthorName::new("Lovelace").unwrap());
        let updated = repo.update_author(&req).await.unwrap();

        assert_eq!(updated, author(1, "Lovelace"));
        assert_eq!(
            repo.find_all_authors().await.unwrap(),
            vec![author(1, "Lovelace"), author(2, "Grace")]
        );
    }

    #[tokio::test]
    async fn update_missing_author_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let repo = seeded(&dir, &[author(1, "Ada")]).await;

        let req = UpdateAuthorRequest::new(2, AuthorName::new("Lovelace").unwrap());
        let err = repo.update_author(&req).await.unwrap_err();

        assert!(matches!(err, UpdateAuthorError::NotFound { id: 2 }));
    }

    #[tokio::test]
    async fn delete_removes_every_matching_author() {
        let dir = tempfile::tempdir().unwrap();
        let repo = seeded(&dir, &[author(1, "Ada"), author(2, "Grace"), author(1, "Dup")]).await;

        repo.delete_author(&DeleteAuthorRequest::new(1)).await.unwrap();

        assert_eq!(repo.find_all_authors().await.unwrap(), vec![author(2, "Grace")]);
    }

    #[tokio::test]
    async fn delete_miss_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let repo = seeded(&dir, &[author(1, "Ada")]).await;
        let before = fs::read(repo.path()).await.unwrap();

        let err = repo.delete_author(&DeleteAuthorRequest::new(2)).await.unwrap_err();

        assert!(matches!(err, DeleteAuthorError::NotFound { id: 2 }));
        assert_eq!(fs::read(repo.path()).await.unwrap(), before);
    }

    #[tokio::test]
    async fn corrupt_file_is_reported_not_repaired() {
        let dir = tempfile::tempdir().unwrap();
        let repo = seeded(&dir, &[]).await;
        fs::write(repo.path(), "{ not json").await.unwrap();

        assert!(repo.find_all_authors().await.is_err());
        let req = CreateAuthorRequest::new(AuthorName::new("Ada").unwrap());
        assert!(repo.create_author(&req).await.is_err());
        assert_eq!(fs::read_to_string(repo.path()).await.unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn file_removed_after_open_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let repo = seeded(&dir, &[]).await;
        fs::remove_file(repo.path()).await.unwrap();

        assert!(repo.find_all_authors().await.is_err());
    }
}
