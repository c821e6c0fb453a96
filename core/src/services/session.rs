//! Session service
//!
//! Registration, login and the cached logged-in identity. Passwords are
//! stored as Argon2 hashes; plaintext entries left by older builds are
//! upgraded on their first successful login.

use super::collection::EntityCollection;
use crate::config::{DEFAULT_AVATAR_URL, SESSION_KEY};
use crate::crypto::{hash_password, verify_password, Verification};
use crate::database::{Repository, Session, User};
use crate::error::{AppError, Result};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Service for accounts and the current session
#[derive(Clone)]
pub struct SessionService {
    repo: Repository,
    users: EntityCollection<User>,
    current: Arc<RwLock<Option<Session>>>,
}

impl SessionService {
    /// Load the user list and any cached session
    pub async fn load(repo: Repository) -> Self {
        let users = EntityCollection::load(repo.clone()).await;
        let current = repo.load_record::<Session>(SESSION_KEY).await;

        Self {
            repo,
            users,
            current: Arc::new(RwLock::new(current)),
        }
    }

    /// Session cached from a previous launch, if any.
    ///
    /// Decides whether startup lands on the login screen or the home screen.
    pub async fn restore(&self) -> Option<Session> {
        let session = self.current.read().await.clone();
        match &session {
            Some(s) => tracing::info!("Restored session for {}", s.username),
            None => tracing::info!("No saved session"),
        }
        session
    }

    pub async fn current_user(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    pub async fn is_logged_in(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Create an account and log it in
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        confirm_password: &str,
        avatar: Option<&str>,
    ) -> Result<Session> {
        if [username, password, confirm_password]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(AppError::validation("All fields are required"));
        }
        if password != confirm_password {
            return Err(AppError::validation("Passwords do not match"));
        }

        let avatar = avatar
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_AVATAR_URL)
            .to_string();
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .insert_with(|existing| {
                if existing.iter().any(|u| u.username == username) {
                    return Err(AppError::DuplicateUser(username.to_string()));
                }
                Ok(User {
                    username: username.to_string(),
                    password: password_hash,
                    avatar,
                })
            })
            .await?;

        tracing::info!("Registered user: {}", user.username);
        Ok(self.start_session(Session::from(&user)).await)
    }

    /// Log in with an exact username and password match
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        if username.trim().is_empty() || password.trim().is_empty() {
            return Err(AppError::validation("All fields are required"));
        }

        let user = match self.users.get(username).await {
            Ok(user) => user,
            Err(AppError::NotFound { .. }) => {
                tracing::info!("Login failed");
                return Err(AppError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        match verify_password(password, &user.password) {
            Verification::Valid => {}
            Verification::ValidLegacy => self.upgrade_password(&user.username, password).await,
            Verification::Invalid => {
                tracing::info!("Login failed");
                return Err(AppError::InvalidCredentials);
            }
        }

        tracing::info!("User logged in: {}", user.username);
        Ok(self.start_session(Session::from(&user)).await)
    }

    /// Forget the logged-in user. Collections are left alone.
    pub async fn logout(&self) {
        let previous = self.current.write().await.take();
        self.repo.remove_record(SESSION_KEY);

        if let Some(session) = previous {
            tracing::info!("User logged out: {}", session.username);
        }
    }

    /// Rename and/or change the avatar of the logged-in user.
    ///
    /// The matching user-list entry is found by the previous username and
    /// rewritten too. An empty `avatar` keeps the current one.
    pub async fn update_profile(&self, name: &str, avatar: &str) -> Result<Session> {
        let Some(current) = self.current_user().await else {
            return Err(AppError::NotLoggedIn);
        };
        if name.trim().is_empty() {
            return Err(AppError::validation("Name cannot be empty"));
        }

        let updated = Session {
            username: name.trim().to_string(),
            avatar: match avatar.trim() {
                "" => current.avatar.clone(),
                a => a.to_string(),
            },
        };

        if updated.username != current.username
            && self.users.get(&updated.username).await.is_ok()
        {
            return Err(AppError::DuplicateUser(updated.username));
        }

        let rewritten = self
            .users
            .update(&current.username, |user| {
                user.username = updated.username.clone();
                user.avatar = updated.avatar.clone();
                Ok(())
            })
            .await;
        if let Err(AppError::NotFound { .. }) = rewritten {
            tracing::warn!("Session user {} missing from user list", current.username);
        }

        tracing::info!("Profile updated: {} -> {}", current.username, updated.username);
        Ok(self.start_session(updated).await)
    }

    async fn start_session(&self, session: Session) -> Session {
        self.repo.persist_record(SESSION_KEY, &session);
        *self.current.write().await = Some(session.clone());
        session
    }

    async fn upgrade_password(&self, username: &str, password: &str) {
        let hash = match hash_password(password) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::error!("Failed to rehash legacy password for {}: {}", username, e);
                return;
            }
        };

        let result = self
            .users
            .update(username, |user| {
                user.password = hash;
                Ok(())
            })
            .await;

        match result {
            Ok(()) => tracing::info!("Upgraded legacy password for {}", username),
            Err(e) => tracing::error!("Failed to store rehashed password for {}: {}", username, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};

    async fn create_test_service() -> (SessionService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let repo = Repository::new(store.clone());
        (SessionService::load(repo).await, store)
    }

    async fn stored_users(service: &SessionService, store: &MemoryStore) -> Vec<User> {
        service.repo.flush().await;
        let raw = store.get("@users").await.unwrap().unwrap_or_else(|| "[]".into());
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test]
    async fn test_register_assigns_default_avatar() {
        let (service, store) = create_test_service().await;

        let session = service.register("ana", "pw1234", "pw1234", None).await.unwrap();
        assert_eq!(session.username, "ana");
        assert_eq!(session.avatar, DEFAULT_AVATAR_URL);

        let users = stored_users(&service, &store).await;
        assert_eq!(users.len(), 1);
        assert_ne!(users[0].password, "pw1234");

        let raw = store.get("@loggedInUser").await.unwrap().unwrap();
        let cached: Session = serde_json::from_str(&raw).unwrap();
        assert_eq!(cached, session);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (service, _store) = create_test_service().await;

        assert!(service.register("", "a", "a", None).await.unwrap_err().is_validation());
        assert!(service.register("bob", "a", "b", None).await.unwrap_err().is_validation());

        service.register("bob", "a", "a", None).await.unwrap();
        let err = service.register("bob", "x", "x", None).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateUser(_)));

        // Usernames are case-sensitive
        service.register("Bob", "x", "x", None).await.unwrap();
    }

    #[tokio::test]
    async fn test_login_does_not_leak_which_field_failed() {
        let (service, _store) = create_test_service().await;
        service.register("ana", "pw1234", "pw1234", None).await.unwrap();
        service.logout().await;

        let unknown = service.login("maria", "pw1234").await.unwrap_err();
        let wrong = service.login("ana", "nope").await.unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert!(!service.is_logged_in().await);

        let session = service.login("ana", "pw1234").await.unwrap();
        assert_eq!(session.username, "ana");
    }

    #[tokio::test]
    async fn test_legacy_plaintext_password_is_upgraded() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_raw(
                "@users",
                r#"[{"username":"ana","password":"pw1234","avatar":"a.png"}]"#,
            )
            .await;
        let service = SessionService::load(Repository::new(store.clone())).await;

        service.login("ana", "pw1234").await.unwrap();

        let users = stored_users(&service, &store).await;
        assert!(users[0].password.starts_with("$argon2"));
        service.logout().await;
        service.login("ana", "pw1234").await.unwrap();
    }

    #[tokio::test]
    async fn test_logout_clears_cached_session() {
        let (service, store) = create_test_service().await;
        service.register("ana", "pw", "pw", None).await.unwrap();

        service.logout().await;
        service.repo.flush().await;

        assert!(service.current_user().await.is_none());
        assert!(store.get("@loggedInUser").await.unwrap().is_none());
        assert_eq!(stored_users(&service, &store).await.len(), 1);
    }

    #[tokio::test]
    async fn test_restore_reads_saved_session() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_raw("@loggedInUser", r#"{"username":"ana","avatar":"a.png"}"#)
            .await;
        let service = SessionService::load(Repository::new(store)).await;

        assert_eq!(service.restore().await.unwrap().username, "ana");
    }

    #[tokio::test]
    async fn test_update_profile() {
        let (service, store) = create_test_service().await;
        assert!(matches!(
            service.update_profile("x", "").await,
            Err(AppError::NotLoggedIn)
        ));

        service.register("ana", "pw", "pw", Some("a.png")).await.unwrap();
        service.register("bia", "pw", "pw", None).await.unwrap();
        service.login("ana", "pw").await.unwrap();

        assert!(matches!(
            service.update_profile("bia", "").await,
            Err(AppError::DuplicateUser(_))
        ));

        let session = service.update_profile("Ana Maria", "").await.unwrap();
        assert_eq!(session.avatar, "a.png");

        let users = stored_users(&service, &store).await;
        assert!(users.iter().any(|u| u.username == "Ana Maria"));
        assert!(!users.iter().any(|u| u.username == "ana"));

        service.logout().await;
        service.login("Ana Maria", "pw").await.unwrap();
    }
}
