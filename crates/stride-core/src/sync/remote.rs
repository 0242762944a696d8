//! Signed-in persistence.

use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;

use crate::auth::AuthService;
use crate::measurements::{MeasurementsByWeek, WeeklyMeasurements};
use crate::progress::CompletionMap;
use crate::store::{TrackerStore, User};

/// Server-side storage for a signed-in user.
///
/// `current_user` returning `Ok(None)` means there is no session; an
/// `Err` means the check itself failed.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn current_user(&self) -> Result<Option<User>>;
    async fn fetch_completions(&self) -> Result<CompletionMap>;
    async fn fetch_measurements(&self) -> Result<MeasurementsByWeek>;
    async fn save_completion(&self, day_id: &str, done: bool) -> Result<()>;
    async fn save_measurements(&self, week: u32, record: &WeeklyMeasurements) -> Result<()>;
    async fn sign_out(&self) -> Result<()>;
}

// Compile-time assertion: RemoteStore must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn RemoteStore) {}
};

/// [`RemoteStore`] talking to a [`TrackerStore`] directly with a session
/// token, as the CLI does once `stride login` has stored one.
pub struct StoreRemote {
    auth: AuthService,
    store: Arc<dyn TrackerStore>,
    token: Option<String>,
}

impl StoreRemote {
    pub fn new(auth: AuthService, store: Arc<dyn TrackerStore>, token: Option<String>) -> Self {
        Self { auth, store, token }
    }

    async fn user(&self) -> Result<User> {
        match self.current_user().await? {
            Some(user) => Ok(user),
            None => bail!("not signed in"),
        }
    }
}

#[async_trait]
impl RemoteStore for StoreRemote {
    async fn current_user(&self) -> Result<Option<User>> {
        let Some(token) = self.token.as_deref() else {
            return Ok(None);
        };
        Ok(self.auth.current_user(token).await?)
    }

    async fn fetch_completions(&self) -> Result<CompletionMap> {
        let user = self.user().await?;
        self.store.list_completions(user.id).await
    }

    async fn fetch_measurements(&self) -> Result<MeasurementsByWeek> {
        let user = self.user().await?;
        self.store.list_measurements(user.id).await
    }

    async fn save_completion(&self, day_id: &str, done: bool) -> Result<()> {
        let user = self.user().await?;
        self.store.upsert_completion(user.id, day_id, done).await
    }

    async fn save_measurements(&self, week: u32, record: &WeeklyMeasurements) -> Result<()> {
        let user = self.user().await?;
        self.store
            .upsert_measurements(user.id, week, &record.trimmed())
            .await
    }

    async fn sign_out(&self) -> Result<()> {
        if let Some(token) = self.token.as_deref() {
            self.auth.sign_out(token).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionConfig;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn without_token_there_is_no_session() {
        let store: Arc<dyn TrackerStore> = Arc::new(MemoryStore::new());
        let auth = AuthService::new(store.clone(), SessionConfig::default());
        let remote = StoreRemote::new(auth, store, None);
        assert_eq!(remote.current_user().await.unwrap(), None);
        assert!(remote.fetch_completions().await.is_err());
        remote.sign_out().await.unwrap();
    }

    #[tokio::test]
    async fn writes_are_scoped_to_the_token_user() {
        let store: Arc<dyn TrackerStore> = Arc::new(MemoryStore::new());
        let auth = AuthService::new(store.clone(), SessionConfig::default());
        let signed = auth.sign_up("a@example.com", "secret1", "A").await.unwrap();
        let remote = StoreRemote::new(auth, store.clone(), Some(signed.token));

        remote.save_completion("Jan 5-Mon", true).await.unwrap();
        let record = WeeklyMeasurements {
            weight: " 70 ".to_owned(),
            ..WeeklyMeasurements::default()
        };
        remote.save_measurements(1, &record).await.unwrap();

        let completions = store.list_completions(signed.user.id).await.unwrap();
        assert!(completions.is_done("Jan 5-Mon"));
        let measurements = store.list_measurements(signed.user.id).await.unwrap();
        assert_eq!(measurements.for_week(1).weight, "70");
        assert_eq!(remote.fetch_completions().await.unwrap(), completions);
    }
}
