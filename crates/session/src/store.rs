//! Token storage for the signed-in session
//!
//! The store is the single source of truth for the access/refresh token pair
//! and the cached user profile. Reads and writes are synchronous: callers on
//! the request path read the current token without awaiting anything, and a
//! write is visible to the next read as soon as it returns.
//!
//! `FileTokenStore` persists a small JSON document keyed by `token`,
//! `refreshToken` and `user`. All writes use atomic temp-file + rename.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use common::Secret;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants::MOCK_TOKEN_PREFIX;
use crate::error::{Error, Result};

/// The current access/refresh token pair. Either side may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CredentialPair {
    pub access_token: Option<Secret<String>>,
    pub refresh_token: Option<Secret<String>>,
}

impl CredentialPair {
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_ref().map(Secret::<String>::as_str)
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(Secret::<String>::as_str)
    }

    /// True when neither token is present.
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Storage for the signed-in session.
///
/// Implementations must make `clear` idempotent: clearing an empty store is
/// not an error.
pub trait TokenStore: Send + Sync {
    /// Read the current token pair. Missing entries are `None`.
    fn get(&self) -> CredentialPair;

    /// Store a new access token. The refresh token is only replaced when one
    /// is given.
    fn set(&self, access_token: &str, refresh_token: Option<&str>) -> Result<()>;

    /// Remove the access token, refresh token, and cached user profile.
    fn clear(&self) -> Result<()>;

    /// Cached user profile, if one was stored at sign-in.
    fn user(&self) -> Option<serde_json::Value>;

    /// Replace the cached user profile.
    fn set_user(&self, user: serde_json::Value) -> Result<()>;

    /// Whether the current access token was issued by the demo backend.
    fn is_mock_mode(&self) -> bool {
        is_mock_token(self.get().access_token())
    }
}

/// Whether `token` follows the demo-token naming convention.
pub fn is_mock_token(token: Option<&str>) -> bool {
    token.is_some_and(|t| t.starts_with(MOCK_TOKEN_PREFIX))
}

/// On-disk layout of the session. Field names are the storage keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionDocument {
    #[serde(rename = "token", default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(
        rename = "refreshToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<serde_json::Value>,
}

impl SessionDocument {
    fn credential_pair(&self) -> CredentialPair {
        CredentialPair {
            access_token: self.access_token.clone().map(Secret::new),
            refresh_token: self.refresh_token.clone().map(Secret::new),
        }
    }

    fn apply_tokens(&mut self, access_token: &str, refresh_token: Option<&str>) {
        self.access_token = Some(access_token.to_owned());
        if let Some(refresh) = refresh_token {
            self.refresh_token = Some(refresh.to_owned());
        }
    }
}

fn lock(state: &Mutex<SessionDocument>) -> MutexGuard<'_, SessionDocument> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-local store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    state: Mutex<SessionDocument>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a token pair.
    pub fn with_tokens(access_token: &str, refresh_token: Option<&str>) -> Self {
        let store = Self::default();
        lock(&store.state).apply_tokens(access_token, refresh_token);
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> CredentialPair {
        lock(&self.state).credential_pair()
    }

    fn set(&self, access_token: &str, refresh_token: Option<&str>) -> Result<()> {
        lock(&self.state).apply_tokens(access_token, refresh_token);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *lock(&self.state) = SessionDocument::default();
        Ok(())
    }

    fn user(&self) -> Option<serde_json::Value> {
        lock(&self.state).user.clone()
    }

    fn set_user(&self, user: serde_json::Value) -> Result<()> {
        lock(&self.state).user = Some(user);
        Ok(())
    }
}

/// Session store persisted to a JSON file.
///
/// The Mutex serializes writes; reads clone the in-memory document and never
/// touch the disk.
pub struct FileTokenStore {
    path: PathBuf,
    state: Mutex<SessionDocument>,
}

impl FileTokenStore {
    /// Load the session from the given file path.
    ///
    /// A missing file is an empty session (signed out). The file is created on
    /// the first write.
    pub fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::Io(format!("reading session file: {e}")))?;
            let document: SessionDocument = if contents.trim().is_empty() {
                SessionDocument::default()
            } else {
                serde_json::from_str(&contents)
                    .map_err(|e| Error::Parse(format!("parsing session file: {e}")))?
            };
            info!(
                path = %path.display(),
                signed_in = document.access_token.is_some(),
                "loaded session"
            );
            document
        } else {
            info!(path = %path.display(), "session file not found, starting signed out");
            SessionDocument::default()
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileTokenStore {
    /// Apply `change` to a copy of the document, persist it, and only then
    /// publish it in memory. A failed write leaves memory matching the disk.
    fn update(&self, change: impl FnOnce(&mut SessionDocument)) -> Result<()> {
        let mut state = lock(&self.state);
        let mut next = state.clone();
        change(&mut next);
        write_atomic(&self.path, &next)?;
        *state = next;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> CredentialPair {
        lock(&self.state).credential_pair()
    }

    fn set(&self, access_token: &str, refresh_token: Option<&str>) -> Result<()> {
        self.update(|doc| doc.apply_tokens(access_token, refresh_token))?;
        debug!(refresh_replaced = refresh_token.is_some(), "updated tokens");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.update(|doc| *doc = SessionDocument::default())?;
        debug!("cleared session");
        Ok(())
    }

    fn user(&self) -> Option<serde_json::Value> {
        lock(&self.state).user.clone()
    }

    fn set_user(&self, user: serde_json::Value) -> Result<()> {
        self.update(|doc| doc.user = Some(user))
    }
}

/// Write the session document atomically.
///
/// Writes to a temporary file in the same directory, then renames it over the
/// target. The file holds bearer tokens, so it is created 0600 on unix.
fn write_atomic(path: &Path, data: &SessionDocument) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::Parse(format!("serializing session: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("session path has no parent directory".into()))?;
    if !dir.as_os_str().is_empty() {
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::Io(format!("creating session directory: {e}")))?;
    }

    let tmp_path = dir.join(format!(".session.tmp.{}", std::process::id()));

    std::fs::write(&tmp_path, json.as_bytes())
        .map_err(|e| Error::Io(format!("writing temp session file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&tmp_path, perms)
            .map_err(|e| Error::Io(format!("setting session file permissions: {e}")))?;
    }

    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(Error::Io(format!("renaming temp session file: {e}")));
    }

    debug!(path = %path.display(), "persisted session");
    Ok(())
}
