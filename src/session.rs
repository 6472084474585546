use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::ApiError;
use crate::model::{ModelVariant, TableKind};

const MAX_SESSION_ID_LEN: usize = 128;


/// Checks a caller-supplied session id before it is joined into a path.
/// Only ASCII letters, digits, `-` and `_` are accepted.
pub fn validate_session_id(session_id: &str) -> Result<(), ApiError> {
    if session_id.is_empty() {
        return Err(ApiError::validation("Missing uuid"));
    }
    if session_id.len() > MAX_SESSION_ID_LEN {
        return Err(ApiError::validation("uuid is too long"));
    }
    if !session_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::validation("uuid contains invalid characters"));
    }
    Ok(())
}


/// On-disk layout `<root>/<session>/<model>/<table>.csv`.
#[derive(Clone, Debug)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.root.join(session_id)
    }

    pub fn model_dir(&self, session_id: &str, model: ModelVariant) -> PathBuf {
        self.session_dir(session_id).join(model.as_str())
    }

    pub fn table_path(&self, session_id: &str, model: ModelVariant, kind: TableKind) -> PathBuf {
        self.model_dir(session_id, model).join(kind.file_name())
    }

    /// Idempotent.
    pub fn ensure_model_dir(&self, session_id: &str, model: ModelVariant) -> io::Result<PathBuf> {
        let dir = self.model_dir(session_id, model);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn table_exists(&self, session_id: &str, model: ModelVariant, kind: TableKind) -> bool {
        self.table_path(session_id, model, kind).is_file()
    }

    /// Removes the whole session tree. Returns whether anything was there.
    pub fn clear_session(&self, session_id: &str) -> io::Result<bool> {
        let dir = self.session_dir(session_id);
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}


type LockKey = (String, ModelVariant);
type LockMap = HashMap<LockKey, Arc<Mutex<()>>>;

/// One async mutex per (session, model), created on demand and dropped from the
/// registry once the last guard or waiter lets go of it.
#[derive(Clone, Default)]
pub struct SessionLocks {
    locks: Arc<StdMutex<LockMap>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, LockMap> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn acquire(&self, session_id: &str, model: ModelVariant) -> SessionGuard {
        let key = (session_id.to_string(), model);
        // declared before the Arc clone so a cancelled wait still prunes the entry
        let mut held = SessionGuard {
            guard: None,
            key: key.clone(),
            locks: self.clone(),
        };
        let lock = self
            .registry()
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        held.guard = Some(lock.lock_owned().await);
        held
    }

    /// Takes every model lock of a session, always in `ModelVariant::ALL` order.
    pub async fn acquire_session(&self, session_id: &str) -> Vec<SessionGuard> {
        let mut guards = Vec::with_capacity(ModelVariant::ALL.len());
        for model in ModelVariant::ALL {
            guards.push(self.acquire(session_id, model).await);
        }
        guards
    }

    /// Removes `key` unless a guard or waiter still holds its mutex.
    fn prune(&self, key: &LockKey) {
        let mut locks = self.registry();
        if locks.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(key);
        }
    }

    pub fn len(&self) -> usize {
        self.registry().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry().is_empty()
    }
}


/// Held for the duration of one operation on a (session, model) pair.
pub struct SessionGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: LockKey,
    locks: SessionLocks,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        // release first so our own Arc no longer counts
        drop(self.guard.take());
        self.locks.prune(&self.key);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_validate_session_id_accepts_uuid() {
        assert!(validate_session_id("3f2b7c1e-8a4d-4e2b-9c55-0d1e2f3a4b5c").is_ok());
        assert!(validate_session_id("session_1").is_ok());
    }

    #[test]
    fn test_validate_session_id_rejects_traversal() {
        assert!(validate_session_id("").is_err());
        assert!(validate_session_id("..").is_err());
        assert!(validate_session_id("../etc").is_err());
        assert!(validate_session_id("a/b").is_err());
        assert!(validate_session_id("a\\b").is_err());
        assert!(validate_session_id(&"a".repeat(129)).is_err());
    }

    #[test]
    fn test_table_path_layout() {
        let store = SessionStore::new("/srv/data");
        let path = store.table_path("abc", ModelVariant::SmolVideoImageRaw, TableKind::ProductInfo);
        assert_eq!(
            path,
            PathBuf::from("/srv/data/abc/smol_video_image_raw/product_info.csv")
        );
    }

    #[test]
    fn test_ensure_model_dir_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SessionStore::new(tmp.path());

        let first = store.ensure_model_dir("s1", ModelVariant::QwenVideoImageInfo).unwrap();
        let second = store.ensure_model_dir("s1", ModelVariant::QwenVideoImageInfo).unwrap();

        assert_eq!(first, second);
        assert!(first.is_dir());
        let entries = std::fs::read_dir(tmp.path().join("s1")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_table_exists() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SessionStore::new(tmp.path());
        let model = ModelVariant::QwenDescriptionInfo;

        assert!(!store.table_exists("s1", model, TableKind::Judgement));
        store.ensure_model_dir("s1", model).unwrap();
        assert!(!store.table_exists("s1", model, TableKind::Judgement));

        std::fs::write(store.table_path("s1", model, TableKind::Judgement), "product_id\n").unwrap();
        assert!(store.table_exists("s1", model, TableKind::Judgement));
        assert!(!store.table_exists("s1", model, TableKind::ProductInfo));
    }

    #[test]
    fn test_clear_session() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SessionStore::new(tmp.path());
        store.ensure_model_dir("s1", ModelVariant::SmolDescriptionInfo).unwrap();
        store.ensure_model_dir("s2", ModelVariant::SmolDescriptionInfo).unwrap();

        assert!(store.clear_session("s1").unwrap());
        assert!(!store.session_dir("s1").exists());
        assert!(store.session_dir("s2").exists());
    }

    #[test]
    fn test_clear_missing_session_is_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SessionStore::new(tmp.path());
        assert!(!store.clear_session("never-created").unwrap());
    }

    #[tokio::test]
    async fn test_locks_serialize_same_key() {
        let locks = SessionLocks::new();
        let guard = locks.acquire("s1", ModelVariant::QwenVideoImageRaw).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("s1", ModelVariant::QwenVideoImageRaw).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_locks_independent_keys() {
        let locks = SessionLocks::new();
        let _a = locks.acquire("s1", ModelVariant::QwenVideoImageRaw).await;
        let _b = locks.acquire("s1", ModelVariant::SmolVideoImageRaw).await;
        let _c = locks.acquire("s2", ModelVariant::QwenVideoImageRaw).await;
        assert_eq!(locks.len(), 3);
    }

    #[tokio::test]
    async fn test_released_locks_leave_registry() {
        let locks = SessionLocks::new();
        for i in 0..100 {
            let _guard = locks.acquire(&format!("ghost{i}"), ModelVariant::QwenVideoImageRaw).await;
        }
        assert!(locks.is_empty());

        let guards = locks.acquire_session("s1").await;
        assert_eq!(locks.len(), 12);
        drop(guards);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_wait_leaves_registry() {
        let locks = SessionLocks::new();
        let held = locks.acquire("s1", ModelVariant::QwenVideoImageRaw).await;

        let timed_out = tokio::time::timeout(
            Duration::from_millis(20),
            locks.acquire("s1", ModelVariant::QwenVideoImageRaw),
        )
        .await;
        assert!(timed_out.is_err());
        assert_eq!(locks.len(), 1);

        drop(held);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_waiter_keeps_entry_alive() {
        let locks = SessionLocks::new();
        let first = locks.acquire("s1", ModelVariant::QwenVideoImageRaw).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("s1", ModelVariant::QwenVideoImageRaw).await;
                locks.len()
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        drop(first);
        // the waiter still holds the mutex, so it stays registered while it runs
        assert_eq!(waiter.await.unwrap(), 1);
        assert!(locks.is_empty());
    }
}
