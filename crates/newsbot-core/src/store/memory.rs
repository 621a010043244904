use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;

use crate::{
    domain::UserId,
    errors::Error,
    store::{
        AuditRecord, AuditStore, PreferenceKind, PreferenceRecord, PreferenceStore, User,
        UserStore,
    },
    Result,
};

/// In-process store implementing every persistence port.
///
/// Used for tests and throwaway runs. `set_failing(true)` makes every call return a store
/// error, which is how the "try again later" paths are exercised.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    failing: AtomicBool,
    preference_calls: AtomicUsize,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    preferences: HashMap<(PreferenceKind, UserId), PreferenceRecord>,
    audit: Vec<AuditRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of preference-store calls made so far.
    pub fn preference_calls(&self) -> usize {
        self.preference_calls.load(Ordering::SeqCst)
    }

    pub fn audit_log(&self) -> Vec<AuditRecord> {
        self.lock().audit.clone()
    }

    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Store("memory store is failing".to_string()));
        }
        Ok(())
    }

    fn check_preference(&self) -> Result<()> {
        self.preference_calls.fetch_add(1, Ordering::SeqCst);
        self.check()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means a test panicked mid-call; the data is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, user_id: UserId) -> Result<Option<User>> {
        self.check()?;
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.user_id == user_id)
            .cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        self.check()?;
        let mut inner = self.lock();
        if inner.users.iter().any(|u| u.user_id == user.user_id) {
            return Err(Error::Conflict(format!("user {} already exists", user.user_id)));
        }
        inner.users.push(user.clone());
        Ok(())
    }

    async fn set_active(&self, user_id: UserId, active: bool) -> Result<bool> {
        self.check()?;
        let mut inner = self.lock();
        let Some(user) = inner.users.iter_mut().find(|u| u.user_id == user_id) else {
            return Ok(false);
        };
        user.active = active;
        Ok(true)
    }

    async fn active_users(&self) -> Result<Vec<User>> {
        self.check()?;
        Ok(self
            .lock()
            .users
            .iter()
            .filter(|u| u.active)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PreferenceStore for MemoryStore {
    async fn find_preference(
        &self,
        kind: PreferenceKind,
        user_id: UserId,
    ) -> Result<Option<PreferenceRecord>> {
        self.check_preference()?;
        Ok(self.lock().preferences.get(&(kind, user_id)).cloned())
    }

    async fn insert_preference(&self, record: &PreferenceRecord) -> Result<()> {
        self.check_preference()?;
        let mut inner = self.lock();
        let key = (record.kind, record.user_id);
        if inner.preferences.contains_key(&key) {
            return Err(Error::Conflict(format!(
                "{:?} preferences for user {} already exist",
                record.kind, record.user_id
            )));
        }
        inner.preferences.insert(key, record.clone());
        Ok(())
    }

    async fn update_items(
        &self,
        kind: PreferenceKind,
        user_id: UserId,
        items: &[String],
    ) -> Result<bool> {
        self.check_preference()?;
        let mut inner = self.lock();
        let Some(rec) = inner.preferences.get_mut(&(kind, user_id)) else {
            return Ok(false);
        };
        rec.items = items.to_vec();
        Ok(true)
    }

    async fn update_page_size(
        &self,
        kind: PreferenceKind,
        user_id: UserId,
        page_size: u32,
    ) -> Result<bool> {
        self.check_preference()?;
        let mut inner = self.lock();
        let Some(rec) = inner.preferences.get_mut(&(kind, user_id)) else {
            return Ok(false);
        };
        rec.page_size = page_size;
        Ok(true)
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append_audit(&self, record: &AuditRecord) -> Result<()> {
        self.check()?;
        self.lock().audit.push(record.clone());
        Ok(())
    }
}
