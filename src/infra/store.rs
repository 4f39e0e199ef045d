//! JSON document store for workspaces and users.
//!
//! Documents live under one data directory: `workspaces/<id>.json` holds
//! a full workspace (transcript + file map), `users.json` holds the user
//! list with token balances. Every write goes through a sibling temp
//! file and an atomic rename so a crash never leaves a half-written
//! document behind.

use chrono::Utc;
use itertools::Itertools;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fs::{self, File},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::cli::AppContext;
use crate::core::workspace::FileMap;
use crate::infra::config::load_config;

const WORKSPACES_DIR: &str = "workspaces";
const USERS_FILE: &str = "users.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("workspace not found: {0}")]
    WorkspaceNotFound(String),
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("invalid workspace id: {0:?}")]
    InvalidId(String),
    #[error("malformed document {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("encode document {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("store io at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn io_at(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError {
    let path = path.to_path_buf();
    move |source| StoreError::Io { path, source }
}

/// One transcript entry, persisted exactly as `{"role": ..., "content": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: Role::Ai,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Ai,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Ai => f.write_str("ai"),
        }
    }
}

/// Full persisted workspace document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceRecord {
    pub id: String,
    /// Owning user's email.
    pub user: String,
    pub messages: Vec<ChatMessage>,
    pub files: FileMap,
    /// Currently selected file, if any survives.
    #[serde(default)]
    pub selected: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// User with a token balance; keyed by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub name: String,
    pub email: String,
    pub token: u64,
}

/// Lightweight row for workspace listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSummary {
    pub id: String,
    pub user: String,
    pub messages: usize,
    pub files: usize,
    pub updated_at: String,
}

/// Open the store for a CLI invocation; `--data-dir` wins over config.
pub fn open_store(ctx: &AppContext) -> Result<Store, StoreError> {
    let config = load_config().unwrap_or_default();
    let root = match &ctx.data_dir {
        Some(dir) => dir.clone(),
        None => config.data_path(),
    };
    Store::open(root)
}

#[derive(Debug)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Open (and create if needed) the data directory layout.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let workspaces = root.join(WORKSPACES_DIR);
        fs::create_dir_all(&workspaces).map_err(io_at(&workspaces))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn workspaces_dir(&self) -> PathBuf {
        self.root.join(WORKSPACES_DIR)
    }

    fn workspace_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        validate_id(id)?;
        Ok(self.workspaces_dir().join(format!("{id}.json")))
    }

    fn users_path(&self) -> PathBuf {
        self.root.join(USERS_FILE)
    }

    /// Create and persist a workspace seeded with the given file map.
    /// The first key becomes the selection.
    pub fn create_workspace(
        &self,
        user: &str,
        messages: Vec<ChatMessage>,
        files: FileMap,
    ) -> Result<WorkspaceRecord, StoreError> {
        let now = Utc::now().to_rfc3339();
        let record = WorkspaceRecord {
            id: generate_workspace_id(),
            user: user.to_string(),
            selected: files.keys().next().cloned(),
            messages,
            files,
            created_at: now.clone(),
            updated_at: now,
        };
        self.write_workspace(&record)?;
        debug!(id = %record.id, user = %record.user, "workspace created");
        Ok(record)
    }

    pub fn get_workspace(&self, id: &str) -> Result<WorkspaceRecord, StoreError> {
        let path = self.workspace_path(id)?;
        if !path.exists() {
            return Err(StoreError::WorkspaceNotFound(id.to_string()));
        }
        let text = fs::read_to_string(&path).map_err(io_at(&path))?;
        serde_json::from_str(&text).map_err(|source| StoreError::Malformed { path, source })
    }

    /// Persist a record, bumping its `updated_at`.
    pub fn save_workspace(&self, record: &mut WorkspaceRecord) -> Result<(), StoreError> {
        record.updated_at = Utc::now().to_rfc3339();
        self.write_workspace(record)
    }

    /// Replace a workspace's transcript.
    pub fn update_messages(
        &self,
        id: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<WorkspaceRecord, StoreError> {
        let mut record = self.get_workspace(id)?;
        record.messages = messages;
        self.save_workspace(&mut record)?;
        Ok(record)
    }

    /// Replace a workspace's file map and selection.
    pub fn update_files(
        &self,
        id: &str,
        files: FileMap,
        selected: Option<String>,
    ) -> Result<WorkspaceRecord, StoreError> {
        let mut record = self.get_workspace(id)?;
        record.files = files;
        record.selected = selected;
        self.save_workspace(&mut record)?;
        Ok(record)
    }

    /// Summaries of all workspaces, newest first, optionally one user's.
    /// Documents that fail to parse are skipped, not fatal.
    pub fn list_workspaces(&self, user: Option<&str>) -> Result<Vec<WorkspaceSummary>, StoreError> {
        let dir = self.workspaces_dir();
        let mut out = Vec::new();

        for entry in fs::read_dir(&dir).map_err(io_at(&dir))? {
            let entry = entry.map_err(io_at(&dir))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let text = fs::read_to_string(&path).map_err(io_at(&path))?;
            let record: WorkspaceRecord = match serde_json::from_str(&text) {
                Ok(record) => record,
                Err(error) => {
                    warn!(path = %path.display(), %error, "skipping unreadable workspace document");
                    continue;
                }
            };
            if user.is_some_and(|u| u != record.user) {
                continue;
            }
            out.push(WorkspaceSummary {
                id: record.id,
                user: record.user,
                messages: record.messages.len(),
                files: record.files.len(),
                updated_at: record.updated_at,
            });
        }

        Ok(out
            .into_iter()
            .sorted_by(|a, b| b.updated_at.cmp(&a.updated_at))
            .collect())
    }

    pub fn delete_workspace(&self, id: &str) -> Result<(), StoreError> {
        let path = self.workspace_path(id)?;
        if !path.exists() {
            return Err(StoreError::WorkspaceNotFound(id.to_string()));
        }
        fs::remove_file(&path).map_err(io_at(&path))?;
        debug!(id, "workspace deleted");
        Ok(())
    }

    /// Create a user unless the email is already registered.
    /// Returns the record and whether it was newly created; an existing
    /// user is returned untouched (no second grant).
    pub fn create_user(
        &self,
        name: &str,
        email: &str,
        grant: u64,
    ) -> Result<(UserRecord, bool), StoreError> {
        let mut users = self.read_users()?;
        if let Some(existing) = users.iter().find(|u| u.email == email) {
            return Ok((existing.clone(), false));
        }

        let user = UserRecord {
            name: name.to_string(),
            email: email.to_string(),
            token: grant,
        };
        users.push(user.clone());
        self.write_users(&users)?;
        debug!(email, grant, "user created");
        Ok((user, true))
    }

    pub fn get_user(&self, email: &str) -> Result<UserRecord, StoreError> {
        self.read_users()?
            .into_iter()
            .find(|u| u.email == email)
            .ok_or_else(|| StoreError::UserNotFound(email.to_string()))
    }

    /// Set a user's balance to an absolute value.
    pub fn update_token(&self, email: &str, token: u64) -> Result<UserRecord, StoreError> {
        let mut users = self.read_users()?;
        let user = users
            .iter_mut()
            .find(|u| u.email == email)
            .ok_or_else(|| StoreError::UserNotFound(email.to_string()))?;
        user.token = token;
        let updated = user.clone();
        self.write_users(&users)?;
        debug!(email, token, "token balance updated");
        Ok(updated)
    }

    fn write_workspace(&self, record: &WorkspaceRecord) -> Result<(), StoreError> {
        let path = self.workspace_path(&record.id)?;
        write_json_atomic(&path, record)
    }

    fn read_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        let path = self.users_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&path).map_err(io_at(&path))?;
        serde_json::from_str(&text).map_err(|source| StoreError::Malformed { path, source })
    }

    fn write_users(&self, users: &[UserRecord]) -> Result<(), StoreError> {
        write_json_atomic(&self.users_path(), users)
    }
}

/// Ids compose into filenames; only filesystem-safe characters pass.
fn validate_id(id: &str) -> Result<(), StoreError> {
    let ok = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !ok {
        return Err(StoreError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Generate a sortable, filesystem-safe workspace ID,
/// e.g. `2025-08-14T10-30-15Z_a9Jh5x`.
fn generate_workspace_id() -> String {
    let ts = Utc::now().format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let alphabet = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::rng();
    let suffix: String = (0..6)
        .map(|_| {
            let idx = rng.random_range(0..alphabet.len());
            alphabet[idx] as char
        })
        .collect();
    format!("{ts}_{suffix}")
}

/// Serialize pretty, stage in a sibling temp file, rename into place,
/// then fsync the parent directory (best-effort).
fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| StoreError::Encode {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &text).map_err(io_at(&tmp))?;
    File::open(&tmp).and_then(|f| f.sync_all()).ok();
    fs::rename(&tmp, path).map_err(io_at(path))?;
    if let Some(parent) = path.parent() {
        let _ = sync_dir(parent);
    }
    Ok(())
}

/// Cross-platform directory fsync helper.
#[cfg(unix)]
fn sync_dir(p: &Path) -> std::io::Result<()> {
    use std::fs::OpenOptions;
    use std::os::unix::fs::OpenOptionsExt;
    let f = OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_DIRECTORY)
        .open(p)?;
    f.sync_all()
}

#[cfg(windows)]
fn sync_dir(_p: &Path) -> std::io::Result<()> {
    // Windows does not expose a reliable directory fsync; best-effort no-op.
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::workspace::FileContent;
    use tempfile::TempDir;

    fn seed_map() -> FileMap {
        let mut files = FileMap::new();
        files.insert(
            "/index.js".to_string(),
            FileContent::plain("// Write your code here..."),
        );
        files
    }

    #[test]
    fn workspace_round_trip_preserves_shapes() {
        let tmp = TempDir::new().unwrap();
        let store = Store::open(tmp.path()).unwrap();

        let mut files = seed_map();
        files.insert("/src/app.js".to_string(), FileContent::coded("let a = 1;"));
        let record = store
            .create_workspace("dev@example.com", vec![ChatMessage::user("build it")], files)
            .unwrap();

        let loaded = store.get_workspace(&record.id).unwrap();
        assert_eq!(loaded, record);
        assert_eq!(loaded.selected.as_deref(), Some("/index.js"));
        assert_eq!(
            loaded.files.get("/src/app.js"),
            Some(&FileContent::coded("let a = 1;"))
        );
    }

    #[test]
    fn update_files_and_messages_persist() {
        let tmp = TempDir::new().unwrap();
        let store = Store::open(tmp.path()).unwrap();
        let record = store
            .create_workspace("dev@example.com", Vec::new(), seed_map())
            .unwrap();

        let mut files = FileMap::new();
        files.insert("/new.js".to_string(), FileContent::coded("x"));
        store
            .update_files(&record.id, files, Some("/new.js".to_string()))
            .unwrap();
        store
            .update_messages(&record.id, vec![ChatMessage::ai("done")])
            .unwrap();

        let loaded = store.get_workspace(&record.id).unwrap();
        assert_eq!(loaded.selected.as_deref(), Some("/new.js"));
        assert_eq!(loaded.messages, vec![ChatMessage::ai("done")]);
        assert!(loaded.files.contains_key("/new.js"));
        assert!(!loaded.files.contains_key("/index.js"));
    }

    #[test]
    fn missing_workspace_and_bad_id_are_typed() {
        let tmp = TempDir::new().unwrap();
        let store = Store::open(tmp.path()).unwrap();

        assert!(matches!(
            store.get_workspace("2030-01-01T00-00-00Z_zzzzzz"),
            Err(StoreError::WorkspaceNotFound(_))
        ));
        assert!(matches!(
            store.get_workspace("../escape"),
            Err(StoreError::InvalidId(_))
        ));
    }

    #[test]
    fn create_user_dedupes_by_email() {
        let tmp = TempDir::new().unwrap();
        let store = Store::open(tmp.path()).unwrap();

        let (first, created) = store.create_user("Dev", "dev@example.com", 55_000).unwrap();
        assert!(created);
        assert_eq!(first.token, 55_000);

        let (again, created) = store.create_user("Dev Again", "dev@example.com", 99).unwrap();
        assert!(!created);
        assert_eq!(again.name, "Dev");
        assert_eq!(again.token, 55_000);
    }

    #[test]
    fn update_token_sets_absolute_balance() {
        let tmp = TempDir::new().unwrap();
        let store = Store::open(tmp.path()).unwrap();
        store.create_user("Dev", "dev@example.com", 55_000).unwrap();

        let updated = store.update_token("dev@example.com", 54_000).unwrap();
        assert_eq!(updated.token, 54_000);
        assert_eq!(store.get_user("dev@example.com").unwrap().token, 54_000);

        assert!(matches!(
            store.update_token("ghost@example.com", 1),
            Err(StoreError::UserNotFound(_))
        ));
    }

    #[test]
    fn list_is_newest_first_and_tolerant() {
        let tmp = TempDir::new().unwrap();
        let store = Store::open(tmp.path()).unwrap();

        let mut old = store
            .create_workspace("a@example.com", Vec::new(), seed_map())
            .unwrap();
        let mut new = store
            .create_workspace("b@example.com", Vec::new(), seed_map())
            .unwrap();
        // Pin the order instead of racing the clock
        old.updated_at = "2020-01-01T00:00:00+00:00".to_string();
        new.updated_at = "2030-01-01T00:00:00+00:00".to_string();
        write_json_atomic(&store.workspace_path(&old.id).unwrap(), &old).unwrap();
        write_json_atomic(&store.workspace_path(&new.id).unwrap(), &new).unwrap();

        // Corrupt stray document must not break listing
        fs::write(store.workspaces_dir().join("junk.json"), "{ not json").unwrap();

        let all = store.list_workspaces(None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, new.id);
        assert_eq!(all[1].id, old.id);

        let only_a = store.list_workspaces(Some("a@example.com")).unwrap();
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].user, "a@example.com");
    }

    #[test]
    fn delete_workspace_removes_document() {
        let tmp = TempDir::new().unwrap();
        let store = Store::open(tmp.path()).unwrap();
        let record = store
            .create_workspace("dev@example.com", Vec::new(), seed_map())
            .unwrap();

        store.delete_workspace(&record.id).unwrap();
        assert!(matches!(
            store.get_workspace(&record.id),
            Err(StoreError::WorkspaceNotFound(_))
        ));
        assert!(matches!(
            store.delete_workspace(&record.id),
            Err(StoreError::WorkspaceNotFound(_))
        ));
    }
}
