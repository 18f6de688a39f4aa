use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use stockline_users::User;

use super::StoreError;

/// Read-only user directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
}

#[async_trait]
impl<S> UserDirectory for Arc<S>
where
    S: UserDirectory + ?Sized,
{
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        (**self).list_users().await
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().collect()),
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self
            .users
            .read()
            .map_err(|_| StoreError::poisoned())?
            .clone())
    }
}

/// Reads the user list from the external user service (`GET {url}`, a JSON
/// array of user records).
#[derive(Debug, Clone)]
pub struct HttpUserDirectory {
    client: reqwest::Client,
    url: String,
}

impl HttpUserDirectory {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Backend(format!("user service client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| StoreError::Backend(format!("user service request failed: {e}")))?;
        let users: Vec<User> = resp
            .json()
            .await
            .map_err(|e| StoreError::Backend(format!("user service response unreadable: {e}")))?;
        tracing::debug!(users = users.len(), "fetched users");
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_directory_lists_seeded_users() {
        let users: Vec<User> = serde_json::from_str(
            r#"[
                {"_id":"u-1","name":"Ann","email":"ann@example.com","address":{"country":"Peru"}},
                {"id":"u-2","email":"bo@example.com"}
            ]"#,
        )
        .unwrap();
        let directory = InMemoryUserDirectory::with_users(users);

        let listed = directory.list_users().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id.as_str(), "u-1");
        assert_eq!(listed[0].country(), Some("Peru"));
        assert_eq!(listed[1].country(), None);
    }

    #[tokio::test]
    async fn unreachable_user_service_is_a_backend_error() {
        let directory =
            HttpUserDirectory::new("http://127.0.0.1:9/users", Duration::from_millis(200)).unwrap();
        assert!(matches!(
            directory.list_users().await,
            Err(StoreError::Backend(_))
        ));
    }
}
