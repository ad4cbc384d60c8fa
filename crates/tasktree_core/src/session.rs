//! Session lifecycle and durable token storage.
//!
//! # Responsibility
//! - Restore a persisted `{token, user}` pair on startup.
//! - Run login, register and logout against the gateway, keeping the
//!   gateway token, the query cache and the store consistent.
//!
//! # Invariants
//! - A session is restored only when both a token and a user are stored.
//! - Login/register clear the cache before calling the server.
//! - Logout always clears local state, even when the server call fails.
//! - Tokens are never logged or printed by `Debug`.

use crate::api::{ApiError, TaskTreeApi};
use crate::cache::QueryCache;
use crate::logging::event_value;
use crate::model::common::ValidationError;
use crate::model::user::{LoginCredentials, RegisterCredentials, User};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

const SESSION_FILE_NAME: &str = "session.json";

pub type SessionResult<T> = Result<T, SessionError>;

/// Error for session operations.
#[derive(Debug)]
pub enum SessionError {
    /// Session file could not be read or written.
    Io(std::io::Error),
    /// Session file exists but does not hold a valid session.
    Corrupt(serde_json::Error),
    /// Credentials rejected before any request was sent.
    Validation(ValidationError),
    /// Server call failed.
    Api(ApiError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "session storage error: {err}"),
            Self::Corrupt(err) => write!(f, "stored session is corrupt: {err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Api(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Corrupt(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Api(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SessionError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(value: serde_json::Error) -> Self {
        Self::Corrupt(value)
    }
}

impl From<ValidationError> for SessionError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ApiError> for SessionError {
    fn from(value: ApiError) -> Self {
        Self::Api(value)
    }
}

/// Persisted authentication state.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl Session {
    fn is_usable(&self) -> bool {
        !self.token.trim().is_empty() && !self.user.id.trim().is_empty()
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// Durable storage for the active session.
pub trait SessionStore {
    /// Returns `None` when nothing is stored.
    fn load(&self) -> SessionResult<Option<Session>>;
    fn save(&self, session: &Session) -> SessionResult<()>;
    /// Removing an absent session is not an error.
    fn clear(&self) -> SessionResult<()>;
}

/// JSON file store under a directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SESSION_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> SessionResult<Option<Session>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, session: &Session) -> SessionResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(session)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> SessionResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Process-local store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> SessionResult<Option<Session>> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, session: &Session) -> SessionResult<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> SessionResult<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Current user, token and the store they persist to.
pub struct SessionContext<S: SessionStore> {
    store: S,
    current: Option<Session>,
}

impl<S: SessionStore> SessionContext<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            current: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn user(&self) -> Option<&User> {
        self.current.as_ref().map(|session| &session.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().map(|session| session.token.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// Loads the stored session and attaches its token to `api`.
    ///
    /// A corrupt or incomplete stored session is discarded.
    ///
    /// # Errors
    /// - `Io` when the store cannot be read.
    pub fn restore<A: TaskTreeApi + ?Sized>(&mut self, api: &A) -> SessionResult<Option<&User>> {
        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(SessionError::Corrupt(err)) => {
                warn!(
                    "event=session_restore module=session status=error error_kind=corrupt detail={}",
                    event_value(&err)
                );
                self.store.clear()?;
                None
            }
            Err(err) => return Err(err),
        };

        match stored.filter(Session::is_usable) {
            Some(session) => {
                api.set_auth_token(Some(session.token.clone()));
                self.current = Some(session);
                info!("event=session_restore module=session status=ok restored=true");
            }
            None => {
                api.set_auth_token(None);
                self.current = None;
                info!("event=session_restore module=session status=ok restored=false");
            }
        }
        Ok(self.user())
    }

    /// Signs in, replacing any previous session.
    ///
    /// # Errors
    /// - `Validation` before any request when credentials are malformed.
    /// - `Api` when the server rejects the credentials.
    /// - `Io` when the session cannot be persisted.
    pub fn login<A: TaskTreeApi + ?Sized>(
        &mut self,
        api: &A,
        cache: &mut QueryCache,
        credentials: &LoginCredentials,
    ) -> SessionResult<&User> {
        credentials.validate()?;
        cache.clear();
        let response = api.login(credentials).inspect_err(|err| {
            warn!(
                "event=session_login module=session status=error error={}",
                event_value(err)
            );
        })?;
        self.establish(api, response.token, response.user, "session_login")
    }

    /// Creates an account and signs in.
    pub fn register<A: TaskTreeApi + ?Sized>(
        &mut self,
        api: &A,
        cache: &mut QueryCache,
        credentials: &RegisterCredentials,
    ) -> SessionResult<&User> {
        credentials.validate()?;
        cache.clear();
        let response = api.register(credentials).inspect_err(|err| {
            warn!(
                "event=session_register module=session status=error error={}",
                event_value(err)
            );
        })?;
        self.establish(api, response.token, response.user, "session_register")
    }

    /// Signs out. The server call may fail; local state is cleared anyway.
    ///
    /// # Errors
    /// - `Io` when the stored session cannot be removed.
    pub fn logout<A: TaskTreeApi + ?Sized>(
        &mut self,
        api: &A,
        cache: &mut QueryCache,
    ) -> SessionResult<()> {
        if let Err(err) = api.logout() {
            warn!(
                "event=session_logout module=session status=degraded error={}",
                event_value(&err)
            );
        }
        cache.clear();
        api.set_auth_token(None);
        self.current = None;
        self.store.clear()?;
        info!("event=session_logout module=session status=ok");
        Ok(())
    }

    /// Re-reads the profile from `/auth/me`.
    ///
    /// A rejected token ends the session locally and returns `None`.
    pub fn verify<A: TaskTreeApi + ?Sized>(
        &mut self,
        api: &A,
        cache: &mut QueryCache,
    ) -> SessionResult<Option<&User>> {
        let Some(token) = self.token().map(str::to_string) else {
            return Ok(None);
        };
        match api.me() {
            Ok(user) => {
                let session = Session { token, user };
                self.store.save(&session)?;
                let current = self.current.insert(session);
                Ok(Some(&current.user))
            }
            Err(err) if err.is_unauthorized() => {
                warn!("event=session_verify module=session status=expired");
                cache.clear();
                api.set_auth_token(None);
                self.current = None;
                self.store.clear()?;
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn establish<A: TaskTreeApi + ?Sized>(
        &mut self,
        api: &A,
        token: String,
        user: User,
        event: &str,
    ) -> SessionResult<&User> {
        api.set_auth_token(Some(token.clone()));
        let session = Session { token, user };
        self.store.save(&session)?;
        let current = self.current.insert(session);
        info!("event={} module=session status=ok", event);
        Ok(&current.user)
    }
}
