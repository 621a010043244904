//! Persistence ports.
//!
//! The document store is an external collaborator; these traits are the only way the core
//! touches it. Implementations must map unique-key violations to [`Error::Conflict`] so
//! find-or-create callers can recover from a lost insert race.
//!
//! [`Error::Conflict`]: crate::Error::Conflict

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    domain::{ChatId, UserId},
    Result,
};

pub mod memory;

pub use memory::MemoryStore;

/// A registered bot user. Never hard-deleted; `active` toggles subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub user_id: UserId,
    pub chat_id: ChatId,
    pub username: Option<String>,
    pub active: bool,
}

/// The two independent preference kinds a user has.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PreferenceKind {
    Category,
    Source,
}

impl PreferenceKind {
    /// Singular noun used in replies ("Category sports ...").
    pub fn noun(self) -> &'static str {
        match self {
            PreferenceKind::Category => "Category",
            PreferenceKind::Source => "Source",
        }
    }
}

/// A CategoryPreference or SourcePreference record.
///
/// `items` behaves as an insertion-ordered set: no duplicates, display order preserved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreferenceRecord {
    pub kind: PreferenceKind,
    pub user_id: UserId,
    pub items: Vec<String>,
    pub page_size: u32,
}

impl PreferenceRecord {
    pub fn empty(kind: PreferenceKind, user_id: UserId, page_size: u32) -> Self {
        Self {
            kind,
            user_id,
            items: Vec::new(),
            page_size,
        }
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.iter().any(|i| i == item)
    }
}

/// Append-only audit entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditRecord {
    pub initiator: String,
    pub action: String,
    pub target: String,
    pub result: String,
    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, user_id: UserId) -> Result<Option<User>>;

    /// Insert a new user; `Error::Conflict` if the user id already exists.
    async fn insert_user(&self, user: &User) -> Result<()>;

    /// Flip the active flag. Returns `false` when no such user exists.
    async fn set_active(&self, user_id: UserId, active: bool) -> Result<bool>;

    async fn active_users(&self) -> Result<Vec<User>>;
}

#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn find_preference(
        &self,
        kind: PreferenceKind,
        user_id: UserId,
    ) -> Result<Option<PreferenceRecord>>;

    /// Insert a new record; `Error::Conflict` if one already exists for `(kind, user_id)`.
    async fn insert_preference(&self, record: &PreferenceRecord) -> Result<()>;

    /// Replace the item list. Returns `false` when the record does not exist.
    async fn update_items(
        &self,
        kind: PreferenceKind,
        user_id: UserId,
        items: &[String],
    ) -> Result<bool>;

    /// Replace the page size. Returns `false` when the record does not exist.
    async fn update_page_size(
        &self,
        kind: PreferenceKind,
        user_id: UserId,
        page_size: u32,
    ) -> Result<bool>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append_audit(&self, record: &AuditRecord) -> Result<()>;
}
