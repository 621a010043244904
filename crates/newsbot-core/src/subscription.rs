//! Subscription state machine: `unregistered -> active <-> inactive`.

use std::sync::Arc;

use crate::{
    audit::{AuditOutcome, Auditor},
    domain::{ChatId, UserId},
    errors::Error,
    store::{User, UserStore},
    Result,
};

const INITIATOR: &str = "Subscriptions";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Subscribed,
    AlreadySubscribed,
    Resubscribed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    Unsubscribed,
    AlreadyUnsubscribed,
    NotFound,
}

/// Identity of the user issuing `/subscribe`.
#[derive(Clone, Debug)]
pub struct Subscriber {
    pub user_id: UserId,
    pub chat_id: ChatId,
    pub username: Option<String>,
}

#[derive(Clone)]
pub struct Subscriptions {
    store: Arc<dyn UserStore>,
    auditor: Auditor,
}

impl Subscriptions {
    pub fn new(store: Arc<dyn UserStore>, auditor: Auditor) -> Self {
        Self { store, auditor }
    }

    pub async fn subscribe(&self, subscriber: &Subscriber) -> Result<SubscribeOutcome> {
        let res = self.subscribe_inner(subscriber).await;
        if !matches!(res, Ok(SubscribeOutcome::AlreadySubscribed)) {
            self.auditor
                .record(
                    INITIATOR,
                    "subscribe",
                    subscriber.user_id,
                    AuditOutcome::from_ok(res.is_ok()),
                )
                .await;
        }
        res
    }

    pub async fn unsubscribe(&self, user_id: UserId) -> Result<UnsubscribeOutcome> {
        let res = self.unsubscribe_inner(user_id).await;
        if !matches!(
            res,
            Ok(UnsubscribeOutcome::AlreadyUnsubscribed | UnsubscribeOutcome::NotFound)
        ) {
            self.auditor
                .record(
                    INITIATOR,
                    "unsubscribe",
                    user_id,
                    AuditOutcome::from_ok(res.is_ok()),
                )
                .await;
        }
        res
    }

    pub async fn is_active(&self, user_id: UserId) -> Result<bool> {
        Ok(self
            .store
            .find_user(user_id)
            .await?
            .map(|u| u.active)
            .unwrap_or(false))
    }

    pub async fn active_users(&self) -> Result<Vec<User>> {
        self.store.active_users().await
    }

    async fn subscribe_inner(&self, subscriber: &Subscriber) -> Result<SubscribeOutcome> {
        let user_id = subscriber.user_id;
        if let Some(existing) = self.store.find_user(user_id).await? {
            return self.reactivate(existing).await;
        }

        let user = User {
            user_id,
            chat_id: subscriber.chat_id,
            username: subscriber.username.clone(),
            active: true,
        };
        match self.store.insert_user(&user).await {
            Ok(()) => {
                tracing::info!(
                    user_id = user_id.0,
                    username = subscriber.username.as_deref().unwrap_or("unknown"),
                    "user subscribed"
                );
                Ok(SubscribeOutcome::Subscribed)
            }
            // Someone registered this id between our read and write.
            Err(Error::Conflict(_)) => {
                let existing = self.store.find_user(user_id).await?.ok_or_else(|| {
                    Error::NotFound(format!("user {user_id} vanished after conflict"))
                })?;
                self.reactivate(existing).await
            }
            Err(e) => Err(e),
        }
    }

    async fn reactivate(&self, existing: User) -> Result<SubscribeOutcome> {
        if existing.active {
            tracing::info!(user_id = existing.user_id.0, "user already subscribed");
            return Ok(SubscribeOutcome::AlreadySubscribed);
        }
        if !self.store.set_active(existing.user_id, true).await? {
            return Err(Error::NotFound(format!("user {}", existing.user_id)));
        }
        tracing::info!(user_id = existing.user_id.0, "user resubscribed");
        Ok(SubscribeOutcome::Resubscribed)
    }

    async fn unsubscribe_inner(&self, user_id: UserId) -> Result<UnsubscribeOutcome> {
        let Some(user) = self.store.find_user(user_id).await? else {
            tracing::info!(user_id = user_id.0, "unsubscribe for unknown user");
            return Ok(UnsubscribeOutcome::NotFound);
        };
        if !user.active {
            return Ok(UnsubscribeOutcome::AlreadyUnsubscribed);
        }
        if !self.store.set_active(user_id, false).await? {
            return Ok(UnsubscribeOutcome::NotFound);
        }
        tracing::info!(user_id = user_id.0, "user unsubscribed");
        Ok(UnsubscribeOutcome::Unsubscribed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, Subscriptions) {
        let store = Arc::new(MemoryStore::new());
        let subs = Subscriptions::new(store.clone(), Auditor::new(store.clone()));
        (store, subs)
    }

    fn alice() -> Subscriber {
        Subscriber {
            user_id: UserId(1),
            chat_id: ChatId(100),
            username: Some("alice".to_string()),
        }
    }

    #[tokio::test]
    async fn subscribe_twice_is_already_subscribed() {
        let (store, subs) = setup();
        assert_eq!(
            subs.subscribe(&alice()).await.unwrap(),
            SubscribeOutcome::Subscribed
        );
        assert_eq!(
            subs.subscribe(&alice()).await.unwrap(),
            SubscribeOutcome::AlreadySubscribed
        );
        assert!(subs.is_active(UserId(1)).await.unwrap());
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn resubscribe_reuses_the_record() {
        let (store, subs) = setup();
        subs.subscribe(&alice()).await.unwrap();
        assert_eq!(
            subs.unsubscribe(UserId(1)).await.unwrap(),
            UnsubscribeOutcome::Unsubscribed
        );
        assert!(!subs.is_active(UserId(1)).await.unwrap());
        assert_eq!(
            subs.subscribe(&alice()).await.unwrap(),
            SubscribeOutcome::Resubscribed
        );
        assert!(subs.is_active(UserId(1)).await.unwrap());
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn unsubscribe_edge_states() {
        let (_, subs) = setup();
        assert_eq!(
            subs.unsubscribe(UserId(1)).await.unwrap(),
            UnsubscribeOutcome::NotFound
        );
        subs.subscribe(&alice()).await.unwrap();
        subs.unsubscribe(UserId(1)).await.unwrap();
        assert_eq!(
            subs.unsubscribe(UserId(1)).await.unwrap(),
            UnsubscribeOutcome::AlreadyUnsubscribed
        );
    }

    #[tokio::test]
    async fn inactive_users_are_not_listed() {
        let (_, subs) = setup();
        subs.subscribe(&alice()).await.unwrap();
        subs.subscribe(&Subscriber {
            user_id: UserId(2),
            chat_id: ChatId(200),
            username: None,
        })
        .await
        .unwrap();
        subs.unsubscribe(UserId(1)).await.unwrap();

        let active = subs.active_users().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].chat_id, ChatId(200));
    }

    #[tokio::test]
    async fn transitions_are_audited() {
        let (store, subs) = setup();
        subs.subscribe(&alice()).await.unwrap();
        subs.subscribe(&alice()).await.unwrap();
        subs.unsubscribe(UserId(1)).await.unwrap();

        let actions: Vec<(String, String)> = store
            .audit_log()
            .into_iter()
            .map(|r| (r.action, r.result))
            .collect();
        assert_eq!(
            actions,
            vec![
                ("subscribe".to_string(), "success".to_string()),
                ("unsubscribe".to_string(), "success".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn store_failure_is_an_error_not_a_state() {
        let (store, subs) = setup();
        store.set_failing(true);
        assert!(subs.subscribe(&alice()).await.is_err());
        assert!(subs.unsubscribe(UserId(1)).await.is_err());
    }
}
