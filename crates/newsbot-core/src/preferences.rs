//! Per-user category and source preferences.

use std::sync::Arc;

use crate::{
    audit::{AuditOutcome, Auditor},
    domain::UserId,
    errors::Error,
    store::{PreferenceKind, PreferenceRecord, PreferenceStore},
    Result,
};

pub const MIN_PAGE_SIZE: u32 = 1;
pub const MAX_PAGE_SIZE: u32 = 20;

const INITIATOR: &str = "Preferences";

/// A validated per-delivery article limit in `[MIN_PAGE_SIZE, MAX_PAGE_SIZE]`.
///
/// The only way to reach [`Preferences::set_page_size`] is through this type, so the store
/// never sees unvalidated input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageSize(u32);

impl PageSize {
    pub fn new(value: u32) -> Result<Self> {
        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&value) {
            return Err(Error::Validation(format!(
                "limit must be between {MIN_PAGE_SIZE} and {MAX_PAGE_SIZE}, got {value}"
            )));
        }
        Ok(Self(value))
    }

    /// Parse a command argument such as `"7"`.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let value = raw
            .parse::<u32>()
            .map_err(|_| Error::Validation(format!("limit must be a number, got {raw:?}")))?;
        Self::new(value)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// Preference service over a [`PreferenceStore`].
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn PreferenceStore>,
    auditor: Auditor,
    default_page_size: u32,
}

impl Preferences {
    pub fn new(store: Arc<dyn PreferenceStore>, auditor: Auditor, default_page_size: u32) -> Self {
        Self {
            store,
            auditor,
            default_page_size,
        }
    }

    /// Find-or-create the record for `(kind, user_id)`.
    ///
    /// A concurrent first-time create for the same user loses with `Error::Conflict`; the
    /// loser re-reads the winner's record instead of failing.
    pub async fn get(&self, kind: PreferenceKind, user_id: UserId) -> Result<PreferenceRecord> {
        if let Some(rec) = self.store.find_preference(kind, user_id).await? {
            return Ok(rec);
        }

        let rec = PreferenceRecord::empty(kind, user_id, self.default_page_size);
        match self.store.insert_preference(&rec).await {
            Ok(()) => {
                tracing::info!(user_id = user_id.0, ?kind, "preference record created");
                Ok(rec)
            }
            Err(Error::Conflict(_)) => self
                .store
                .find_preference(kind, user_id)
                .await?
                .ok_or_else(|| {
                    Error::NotFound(format!("{kind:?} preferences for user {user_id}"))
                }),
            Err(e) => Err(e),
        }
    }

    /// Add `item`; `false` if it was already present.
    pub async fn add(&self, kind: PreferenceKind, user_id: UserId, item: &str) -> Result<bool> {
        let res = self.add_inner(kind, user_id, item).await;
        self.audit(kind, "add", user_id, &res).await;
        res
    }

    /// Remove `item`; `false` if it was absent.
    pub async fn remove(&self, kind: PreferenceKind, user_id: UserId, item: &str) -> Result<bool> {
        let res = self.remove_inner(kind, user_id, item).await;
        self.audit(kind, "remove", user_id, &res).await;
        res
    }

    pub async fn set_page_size(
        &self,
        kind: PreferenceKind,
        user_id: UserId,
        limit: PageSize,
    ) -> Result<()> {
        let res = self.set_page_size_inner(kind, user_id, limit).await;
        let action = match kind {
            PreferenceKind::Category => "setCategoryLimit",
            PreferenceKind::Source => "setSourceLimit",
        };
        self.auditor
            .record(INITIATOR, action, user_id, AuditOutcome::from_ok(res.is_ok()))
            .await;
        res
    }

    async fn add_inner(&self, kind: PreferenceKind, user_id: UserId, item: &str) -> Result<bool> {
        let mut rec = self.get(kind, user_id).await?;
        if rec.contains(item) {
            return Ok(false);
        }
        rec.items.push(item.to_string());
        self.write_items(&rec).await?;
        tracing::info!(user_id = user_id.0, ?kind, item, "preference added");
        Ok(true)
    }

    async fn remove_inner(
        &self,
        kind: PreferenceKind,
        user_id: UserId,
        item: &str,
    ) -> Result<bool> {
        let mut rec = self.get(kind, user_id).await?;
        if !rec.contains(item) {
            return Ok(false);
        }
        rec.items.retain(|i| i != item);
        self.write_items(&rec).await?;
        tracing::info!(user_id = user_id.0, ?kind, item, "preference removed");
        Ok(true)
    }

    async fn set_page_size_inner(
        &self,
        kind: PreferenceKind,
        user_id: UserId,
        limit: PageSize,
    ) -> Result<()> {
        self.get(kind, user_id).await?;
        if !self
            .store
            .update_page_size(kind, user_id, limit.get())
            .await?
        {
            return Err(Error::NotFound(format!(
                "{kind:?} preferences for user {user_id}"
            )));
        }
        tracing::info!(user_id = user_id.0, ?kind, limit = limit.get(), "page size updated");
        Ok(())
    }

    async fn write_items(&self, rec: &PreferenceRecord) -> Result<()> {
        if !self
            .store
            .update_items(rec.kind, rec.user_id, &rec.items)
            .await?
        {
            return Err(Error::NotFound(format!(
                "{:?} preferences for user {}",
                rec.kind, rec.user_id
            )));
        }
        Ok(())
    }

    async fn audit(&self, kind: PreferenceKind, verb: &str, user_id: UserId, res: &Result<bool>) {
        // Nothing changed, nothing to audit.
        if matches!(res, Ok(false)) {
            return;
        }
        let action = format!("{verb}{}", kind.noun());
        self.auditor
            .record(INITIATOR, &action, user_id, AuditOutcome::from_ok(res.is_ok()))
            .await;
    }
}
