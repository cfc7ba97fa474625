use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use storekeep_infra::{
    CsvRecordStore, InMemoryRecordStore, InventoryLedger, LedgerResult, Record, RecordStore,
    StorageBackend, StorageError, StorekeepConfig, UserDirectory,
};

/// Storage backend chosen at startup.
#[derive(Debug)]
pub enum AppStore {
    Csv(CsvRecordStore),
    Memory(InMemoryRecordStore),
}

impl RecordStore for AppStore {
    fn load_all<R: Record>(&self) -> Result<Vec<R>, StorageError> {
        match self {
            AppStore::Csv(s) => s.load_all(),
            AppStore::Memory(s) => s.load_all(),
        }
    }

    fn insert<R: Record>(&self, record: &R) -> Result<(), StorageError> {
        match self {
            AppStore::Csv(s) => s.insert(record),
            AppStore::Memory(s) => s.insert(record),
        }
    }

    fn update<R: Record>(&self, key: &str, record: &R) -> Result<(), StorageError> {
        match self {
            AppStore::Csv(s) => s.update(key, record),
            AppStore::Memory(s) => s.update(key, record),
        }
    }

    fn delete<R: Record>(&self, key: &str) -> Result<(), StorageError> {
        match self {
            AppStore::Csv(s) => s.delete::<R>(key),
            AppStore::Memory(s) => s.delete::<R>(key),
        }
    }
}

#[derive(Debug, Clone)]
struct Session {
    username: String,
    last_seen: DateTime<Utc>,
}

/// Opaque bearer tokens for signed-in users. Lost on restart.
///
/// A token unused for longer than the idle timeout stops resolving and is
/// purged on the next sign-in.
#[derive(Debug)]
pub struct SessionStore {
    inner: RwLock<HashMap<Uuid, Session>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(Duration::minutes(30))
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    fn lock_err() -> StorageError {
        StorageError::Lock("session table".to_string())
    }

    fn expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        now - session.last_seen > self.idle_timeout
    }

    pub fn create(&self, username: &str, now: DateTime<Utc>) -> Result<Uuid, StorageError> {
        let mut map = self.inner.write().map_err(|_| Self::lock_err())?;
        map.retain(|_, s| !self.expired(s, now));
        let token = Uuid::now_v7();
        map.insert(
            token,
            Session {
                username: username.to_string(),
                last_seen: now,
            },
        );
        Ok(token)
    }

    /// Resolve a token and mark it used. Expired tokens are removed.
    pub fn lookup(&self, token: &Uuid, now: DateTime<Utc>) -> Option<String> {
        let mut map = self.inner.write().ok()?;
        let session = map.get_mut(token)?;
        if self.expired(session, now) {
            map.remove(token);
            return None;
        }
        session.last_seen = now;
        Some(session.username.clone())
    }

    pub fn revoke(&self, token: &Uuid) -> bool {
        match self.inner.write() {
            Ok(mut map) => map.remove(token).is_some(),
            Err(_) => false,
        }
    }

    /// Drop every session of `username`.
    pub fn revoke_user(&self, username: &str) {
        if let Ok(mut map) = self.inner.write() {
            map.retain(|_, s| s.username != username);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub type SharedStore = Arc<AppStore>;

/// Everything the handlers need. Ledger and directory share one store.
#[derive(Debug)]
pub struct AppServices {
    pub ledger: InventoryLedger<SharedStore>,
    pub users: UserDirectory<SharedStore>,
    pub sessions: SessionStore,
}

impl AppServices {
    pub fn open(store: AppStore, admin_password: &str, hash_iterations: u32) -> LedgerResult<Self> {
        let store = Arc::new(store);
        Ok(Self {
            ledger: InventoryLedger::open(Arc::clone(&store))?,
            users: UserDirectory::open(store, admin_password, hash_iterations)?,
            sessions: SessionStore::new(),
        })
    }

    pub fn from_config(config: &StorekeepConfig) -> LedgerResult<Self> {
        let store = match config.storage {
            StorageBackend::Csv => {
                info!(data_dir = %config.data_dir.display(), "using csv storage");
                AppStore::Csv(CsvRecordStore::open(&config.data_dir)?)
            }
            StorageBackend::Memory => {
                info!("using in-memory storage; data is lost on exit");
                AppStore::Memory(InMemoryRecordStore::new())
            }
        };
        let mut services = Self::open(store, &config.admin_password, config.hash_iterations)?;
        services.sessions =
            SessionStore::with_idle_timeout(Duration::minutes(i64::from(config.session_idle_minutes)));
        Ok(services)
    }

    /// Fresh in-memory services (dev/test).
    pub fn in_memory(admin_password: &str, hash_iterations: u32) -> LedgerResult<Self> {
        Self::open(AppStore::Memory(InMemoryRecordStore::new()), admin_password, hash_iterations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(minutes: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_790_000_000, 0).unwrap() + Duration::minutes(minutes)
    }

    #[test]
    fn idle_sessions_expire_and_active_ones_stay() {
        let sessions = SessionStore::with_idle_timeout(Duration::minutes(10));
        let token = sessions.create("esi", at(0)).unwrap();

        assert_eq!(sessions.lookup(&token, at(9)).as_deref(), Some("esi"));
        // each use resets the idle clock
        assert_eq!(sessions.lookup(&token, at(18)).as_deref(), Some("esi"));
        assert_eq!(sessions.lookup(&token, at(29)), None);
        assert!(sessions.is_empty());
    }

    #[test]
    fn sign_in_purges_stale_tokens() {
        let sessions = SessionStore::with_idle_timeout(Duration::minutes(10));
        for _ in 0..5 {
            sessions.create("kofi", at(0)).unwrap();
        }
        assert_eq!(sessions.len(), 5);

        let fresh = sessions.create("ama", at(60)).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions.lookup(&fresh, at(61)).as_deref(), Some("ama"));
    }

    #[test]
    fn revoke_user_drops_all_their_tokens() {
        let sessions = SessionStore::new();
        let a = sessions.create("kofi", at(0)).unwrap();
        let b = sessions.create("kofi", at(0)).unwrap();
        let c = sessions.create("ama", at(0)).unwrap();
        sessions.revoke_user("kofi");
        assert_eq!(sessions.lookup(&a, at(1)), None);
        assert_eq!(sessions.lookup(&b, at(1)), None);
        assert!(sessions.lookup(&c, at(1)).is_some());
        assert!(sessions.revoke(&c));
        assert!(!sessions.revoke(&c));
    }
}
