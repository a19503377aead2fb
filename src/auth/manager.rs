use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use log::{debug, info};

use super::{AuthError, ClientSecret, Result};
use crate::credential_storage::{Credential, CredentialStorage};

/// Exchanges a refresh token for a new access token
#[async_trait(?Send)]
pub trait TokenRefresher {
    async fn refresh(&self, creds: &Credential) -> Result<Credential>;
}

/// Runs the interactive consent flow and returns a freshly issued credential
#[async_trait(?Send)]
pub trait Authorizer {
    async fn authorize(&self, secret: &ClientSecret, scopes: &[String]) -> Result<Credential>;
}

/// Yields a credential valid for the requested scopes, doing the least
/// network or interactive work possible and persisting anything it obtains.
pub struct CredentialManager {
    storage: Arc<dyn CredentialStorage>,
    refresher: Box<dyn TokenRefresher>,
    authorizer: Box<dyn Authorizer>,
    /// only read when the interactive flow has to run
    client_secret_path: PathBuf,
    scopes: Vec<String>,
}

impl CredentialManager {
    pub fn new(
        storage: Arc<dyn CredentialStorage>,
        refresher: Box<dyn TokenRefresher>,
        authorizer: Box<dyn Authorizer>,
        client_secret_path: PathBuf,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            storage,
            refresher,
            authorizer,
            client_secret_path,
            scopes,
        }
    }

    /// Cached credential if still valid, else a refreshed one, else a newly
    /// authorized one.
    ///
    /// A failed refresh is returned as [`AuthError::Refresh`]; callers decide
    /// whether to fall back to [`CredentialManager::reauthorize`].
    pub async fn get_credentials(&self) -> Result<Credential> {
        let creds = match self.storage.get_credentials().await? {
            Some(cached) if cached.is_valid(&self.scopes) => {
                debug!("Using cached credential");
                return Ok(cached);
            }
            Some(cached) if cached.can_refresh(&self.scopes) => self
                .refresher
                .refresh(&cached)
                .await
                .map_err(|e| AuthError::Refresh(Box::new(e)))?,
            _ => self.authorize().await?,
        };

        self.storage.store_credentials(&creds).await?;
        Ok(creds)
    }

    /// Run the interactive flow regardless of what is cached
    pub async fn reauthorize(&self) -> Result<Credential> {
        let creds = self.authorize().await?;
        self.storage.store_credentials(&creds).await?;
        Ok(creds)
    }

    async fn authorize(&self) -> Result<Credential> {
        info!("No usable cached credential; starting authorization");
        let secret = ClientSecret::load(&self.client_secret_path).await?;
        self.authorizer.authorize(&secret, &self.scopes).await
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        path::Path,
        rc::Rc,
    };

    use super::*;
    use crate::credential_storage::{
        tests::{credential, test_dir},
        CredentialStorageError, CredentialStorageFile,
    };

    const DRIVE: &str = "https://www.googleapis.com/auth/drive";

    #[derive(Default)]
    struct MemoryStorage {
        creds: RefCell<Option<Credential>>,
        writes: Cell<usize>,
    }

    #[async_trait(?Send)]
    impl CredentialStorage for MemoryStorage {
        async fn store_credentials(&self, creds: &Credential) -> std::result::Result<(), CredentialStorageError> {
            self.writes.set(self.writes.get() + 1);
            *self.creds.borrow_mut() = Some(creds.clone());
            Ok(())
        }

        async fn get_credentials(&self) -> std::result::Result<Option<Credential>, CredentialStorageError> {
            Ok(self.creds.borrow().clone())
        }

        async fn clear_credentials(&self) -> std::result::Result<(), CredentialStorageError> {
            *self.creds.borrow_mut() = None;
            Ok(())
        }
    }

    struct FakeRefresher {
        calls: Rc<Cell<usize>>,
        fail: bool,
    }

    #[async_trait(?Send)]
    impl TokenRefresher for FakeRefresher {
        async fn refresh(&self, creds: &Credential) -> Result<Credential> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(AuthError::NoRefreshToken);
            }
            let mut refreshed = credential(Some(3600));
            refreshed.access_token = Some("refreshed".into());
            refreshed.refresh_token = creds.refresh_token.clone();
            Ok(refreshed)
        }
    }

    struct FakeAuthorizer {
        calls: Rc<Cell<usize>>,
    }

    #[async_trait(?Send)]
    impl Authorizer for FakeAuthorizer {
        async fn authorize(&self, secret: &ClientSecret, scopes: &[String]) -> Result<Credential> {
            self.calls.set(self.calls.get() + 1);
            let mut creds = credential(Some(3600));
            creds.access_token = Some("authorized".into());
            creds.client_id = secret.client_id.clone();
            creds.scopes = scopes.to_vec();
            Ok(creds)
        }
    }

    struct Harness {
        refreshes: Rc<Cell<usize>>,
        authorizations: Rc<Cell<usize>>,
        manager: CredentialManager,
    }

    fn harness(storage: Arc<dyn CredentialStorage>, secret_path: &Path, refresh_fails: bool) -> Harness {
        let refreshes = Rc::new(Cell::new(0));
        let authorizations = Rc::new(Cell::new(0));
        let manager = CredentialManager::new(
            storage,
            Box::new(FakeRefresher {
                calls: refreshes.clone(),
                fail: refresh_fails,
            }),
            Box::new(FakeAuthorizer {
                calls: authorizations.clone(),
            }),
            secret_path.into(),
            vec![DRIVE.into()],
        );
        Harness {
            refreshes,
            authorizations,
            manager,
        }
    }

    /// client secret file in a fresh temp dir; keep the guard alive
    fn write_secret() -> (tempfile::TempDir, PathBuf) {
        let tmp = test_dir();
        let path = tmp.path().join("client_secret.json");
        std::fs::write(
            &path,
            r#"{"installed": {"client_id": "from-file", "client_secret": "shh"}}"#,
        )
        .unwrap();
        (tmp, path)
    }

    #[tokio::test]
    async fn valid_cache_is_returned_untouched() {
        let cached = credential(Some(3600));
        let storage = Arc::new(MemoryStorage::default());
        *storage.creds.borrow_mut() = Some(cached.clone());

        // no secret file: any authorization attempt would fail
        let h = harness(storage.clone(), Path::new("/nonexistent/secret.json"), false);
        let creds = h.manager.get_credentials().await.unwrap();

        assert_eq!(creds, cached);
        assert_eq!(h.refreshes.get(), 0);
        assert_eq!(h.authorizations.get(), 0);
        assert_eq!(storage.writes.get(), 0);
    }

    #[tokio::test]
    async fn expired_cache_is_refreshed_once() {
        let storage = Arc::new(MemoryStorage::default());
        *storage.creds.borrow_mut() = Some(credential(Some(-600)));

        let h = harness(storage.clone(), Path::new("/nonexistent/secret.json"), false);
        let creds = h.manager.get_credentials().await.unwrap();

        assert_eq!(creds.access_token.as_deref(), Some("refreshed"));
        assert_eq!(h.refreshes.get(), 1);
        assert_eq!(h.authorizations.get(), 0);
        assert_eq!(storage.writes.get(), 1);
        assert_eq!(storage.creds.borrow().as_ref(), Some(&creds));
    }

    #[tokio::test]
    async fn refresh_failure_propagates_and_reauthorize_recovers() {
        let storage = Arc::new(MemoryStorage::default());
        let expired = credential(Some(-600));
        *storage.creds.borrow_mut() = Some(expired.clone());

        let (_tmp, secret) = write_secret();
        let h = harness(storage.clone(), &secret, true);
        let result = h.manager.get_credentials().await;

        assert!(matches!(result, Err(AuthError::Refresh(_))));
        assert_eq!(h.refreshes.get(), 1);
        assert_eq!(h.authorizations.get(), 0);
        // cache untouched on failure
        assert_eq!(storage.creds.borrow().as_ref(), Some(&expired));

        let creds = h.manager.reauthorize().await.unwrap();
        assert_eq!(creds.access_token.as_deref(), Some("authorized"));
        assert_eq!(h.authorizations.get(), 1);
        assert_eq!(storage.creds.borrow().as_ref(), Some(&creds));
    }

    #[tokio::test]
    async fn expired_without_refresh_token_reauthorizes() {
        let storage = Arc::new(MemoryStorage::default());
        let mut expired = credential(Some(-600));
        expired.refresh_token = None;
        *storage.creds.borrow_mut() = Some(expired);

        let (_tmp, secret) = write_secret();
        let h = harness(storage.clone(), &secret, false);
        let creds = h.manager.get_credentials().await.unwrap();

        assert_eq!(creds.client_id, "from-file");
        assert_eq!(h.refreshes.get(), 0);
        assert_eq!(h.authorizations.get(), 1);
        assert_eq!(storage.writes.get(), 1);
    }

    #[tokio::test]
    async fn narrower_scopes_reauthorize() {
        let storage = Arc::new(MemoryStorage::default());
        let mut readonly = credential(Some(-600));
        readonly.scopes = vec!["https://www.googleapis.com/auth/drive.readonly".into()];
        *storage.creds.borrow_mut() = Some(readonly);

        let (_tmp, secret) = write_secret();
        let h = harness(storage.clone(), &secret, false);
        let creds = h.manager.get_credentials().await.unwrap();

        assert_eq!(creds.scopes, vec![DRIVE.to_string()]);
        assert_eq!(h.refreshes.get(), 0);
        assert_eq!(h.authorizations.get(), 1);
    }

    #[tokio::test]
    async fn corrupt_cache_file_triggers_authorization_and_rewrite() {
        let (_tmp, secret) = write_secret();
        let cache = secret.with_file_name("token.json");
        std::fs::write(&cache, "{ definitely not a credential").unwrap();

        let storage = Arc::new(CredentialStorageFile::new(&cache));
        let h = harness(storage.clone(), &secret, false);
        let creds = h.manager.get_credentials().await.unwrap();

        assert_eq!(h.authorizations.get(), 1);
        let written: Credential = serde_json::from_slice(&std::fs::read(&cache).unwrap()).unwrap();
        assert_eq!(written, creds);
    }

    #[tokio::test]
    async fn missing_cache_and_missing_secret_is_an_error() {
        let tmp = test_dir();
        let dir = tmp.path();
        let storage = Arc::new(CredentialStorageFile::new(dir.join("token.json")));
        let h = harness(storage, &dir.join("client_secret.json"), false);

        let result = h.manager.get_credentials().await;
        assert!(matches!(result, Err(AuthError::ClientSecretMissing { .. })));
        assert!(!dir.join("token.json").exists());
    }
}
