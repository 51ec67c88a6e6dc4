use super::auth::{AuthToken, AuthTokenValue, HashedPassword};
use super::user_store::{UserAuthCredentialsStore, UserAuthTokenStore, UserStore};
use crate::error::{AppError, AppResult, EntityKind};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

pub const MAX_USERNAME_LENGTH: usize = 150;
pub const DEFAULT_SESSION_IDLE_DAYS: u64 = 30;

/// The account behind a live session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedAccount {
    pub account_id: usize,
    pub username: String,
    pub token: AuthTokenValue,
}

/// Registration, credential checks and session bookkeeping.
pub struct AccountManager {
    user_store: Arc<dyn UserStore>,
    session_idle_days: u64,
}

fn validate_username(username: &str) -> AppResult<()> {
    if username.trim().is_empty() {
        return Err(AppError::invalid_field("username", "is required"));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AppError::invalid_field(
            "username",
            format!("must be at most {} characters", MAX_USERNAME_LENGTH),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> AppResult<()> {
    if password.is_empty() {
        return Err(AppError::invalid_field("password", "is required"));
    }
    Ok(())
}

impl AccountManager {
    pub fn new(user_store: Arc<dyn UserStore>, session_idle_days: u64) -> Self {
        Self {
            user_store,
            session_idle_days,
        }
    }

    fn session_idle_limit(&self) -> Duration {
        Duration::from_secs(self.session_idle_days * 24 * 60 * 60)
    }

    /// Creates an account. The username check here only gives a friendlier
    /// path, the store's unique constraint is what rejects a concurrent
    /// duplicate.
    pub fn register(&self, username: &str, password: &str) -> AppResult<usize> {
        validate_username(username)?;
        validate_password(password)?;

        if self.user_store.get_account_id(username)?.is_some() {
            return Err(AppError::DuplicateEntity {
                entity: EntityKind::Account,
                key: username.to_owned(),
            });
        }

        let hashed = HashedPassword::new(password)?;
        let account_id = self.user_store.create_account(username, &hashed)?;
        info!("Registered account {} ({})", username, account_id);
        Ok(account_id)
    }

    /// Unknown usernames and wrong passwords both fail with
    /// `AppError::AuthenticationFailure`.
    pub fn authenticate(&self, username: &str, password: &str) -> AppResult<usize> {
        let credentials = match self.user_store.get_password_credentials(username)? {
            Some(credentials) => credentials,
            None => {
                debug!("Login attempt for unknown account");
                return Err(AppError::AuthenticationFailure);
            }
        };

        let matches = credentials.password.verify(password)?;
        self.user_store
            .record_password_attempt(credentials.account_id, matches)?;
        if !matches {
            debug!("Wrong password for account {}", credentials.account_id);
            return Err(AppError::AuthenticationFailure);
        }
        Ok(credentials.account_id)
    }

    pub fn establish_session(&self, account_id: usize) -> AppResult<AuthToken> {
        let token = AuthToken::new(account_id);
        self.user_store.add_auth_token(&token)?;
        debug!("Established session for account {}", account_id);
        Ok(token)
    }

    /// `authenticate` followed by `establish_session`.
    pub fn login(&self, username: &str, password: &str) -> AppResult<AuthToken> {
        let account_id = self.authenticate(username, password)?;
        self.establish_session(account_id)
    }

    /// Returns `None` for unknown, idle or orphaned tokens. A resolved
    /// session has its last-used timestamp refreshed.
    pub fn resolve_session(&self, value: &AuthTokenValue) -> AppResult<Option<AuthenticatedAccount>> {
        let token = match self.user_store.get_auth_token(value)? {
            Some(token) => token,
            None => return Ok(None),
        };

        if token.is_idle(self.session_idle_limit(), SystemTime::now()) {
            debug!("Dropping idle session of account {}", token.account_id);
            self.user_store.delete_auth_token(value)?;
            return Ok(None);
        }

        let username = match self.user_store.get_username(token.account_id)? {
            Some(username) => username,
            None => {
                self.user_store.delete_auth_token(value)?;
                return Ok(None);
            }
        };

        self.user_store.touch_auth_token(value)?;
        Ok(Some(AuthenticatedAccount {
            account_id: token.account_id,
            username,
            token: token.value,
        }))
    }

    /// Ending a session that no longer exists is not an error.
    pub fn end_session(&self, value: &AuthTokenValue) -> AppResult<()> {
        if let Some(token) = self.user_store.delete_auth_token(value)? {
            debug!("Ended session of account {}", token.account_id);
        }
        Ok(())
    }

    pub fn prune_idle_sessions(&self) -> AppResult<usize> {
        Ok(self
            .user_store
            .prune_unused_auth_tokens(self.session_idle_days)?)
    }

    pub fn update_password(&self, username: &str, password: &str) -> AppResult<()> {
        validate_password(password)?;
        let account_id = self.require_account(username)?;
        let hashed = HashedPassword::new(password)?;
        self.user_store.update_password(account_id, &hashed)?;
        Ok(())
    }

    /// Deletes every session of the account, returning how many there were.
    pub fn revoke_sessions(&self, username: &str) -> AppResult<usize> {
        let account_id = self.require_account(username)?;
        Ok(self.user_store.delete_all_auth_tokens(account_id)?)
    }

    pub fn get_sessions(&self, username: &str) -> AppResult<Vec<AuthToken>> {
        Ok(self.user_store.get_all_auth_tokens(username)?)
    }

    pub fn get_all_usernames(&self) -> AppResult<Vec<String>> {
        Ok(self.user_store.get_all_usernames()?)
    }

    fn require_account(&self, username: &str) -> AppResult<usize> {
        self.user_store
            .get_account_id(username)?
            .ok_or_else(|| AppError::MissingReference {
                entity: EntityKind::Account,
                key: username.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AUTHENTICATION_FAILURE_MESSAGE;
    use crate::user::SqliteUserStore;
    use tempfile::TempDir;

    fn create_tmp_manager() -> (AccountManager, Arc<SqliteUserStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteUserStore::new(temp_dir.path().join("user.db")).unwrap());
        let manager = AccountManager::new(store.clone(), DEFAULT_SESSION_IDLE_DAYS);
        (manager, store, temp_dir)
    }

    #[test]
    fn registers_and_authenticates() {
        let (manager, _store, _temp_dir) = create_tmp_manager();

        let account_id = manager.register("freddie", "mercury").unwrap();
        assert_eq!(manager.authenticate("freddie", "mercury").unwrap(), account_id);
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let (manager, _store, _temp_dir) = create_tmp_manager();
        manager.register("freddie", "mercury").unwrap();

        let err = manager.register("freddie", "other").unwrap_err();
        assert!(matches!(
            err,
            AppError::DuplicateEntity {
                entity: EntityKind::Account,
                ..
            }
        ));
        assert_eq!(manager.get_all_usernames().unwrap().len(), 1);
        // The original password still works.
        manager.authenticate("freddie", "mercury").unwrap();
    }

    #[test]
    fn authentication_failures_are_indistinguishable() {
        let (manager, _store, _temp_dir) = create_tmp_manager();
        manager.register("freddie", "mercury").unwrap();

        let unknown = manager.authenticate("brian", "mercury").unwrap_err();
        let wrong = manager.authenticate("freddie", "may").unwrap_err();
        assert!(matches!(unknown, AppError::AuthenticationFailure));
        assert!(matches!(wrong, AppError::AuthenticationFailure));
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(wrong.to_string(), AUTHENTICATION_FAILURE_MESSAGE);
    }

    #[test]
    fn rejects_invalid_registration_fields() {
        let (manager, _store, _temp_dir) = create_tmp_manager();

        assert!(matches!(
            manager.register("", "pw"),
            Err(AppError::InvalidField {
                field: "username",
                ..
            })
        ));
        assert!(matches!(
            manager.register("freddie", ""),
            Err(AppError::InvalidField {
                field: "password",
                ..
            })
        ));
        let long_name = "x".repeat(MAX_USERNAME_LENGTH + 1);
        assert!(manager.register(&long_name, "pw").is_err());
    }

    #[test]
    fn session_lifecycle() {
        let (manager, _store, _temp_dir) = create_tmp_manager();
        let account_id = manager.register("freddie", "mercury").unwrap();

        let token = manager.login("freddie", "mercury").unwrap();
        let session = manager.resolve_session(&token.value).unwrap().unwrap();
        assert_eq!(session.account_id, account_id);
        assert_eq!(session.username, "freddie");

        manager.end_session(&token.value).unwrap();
        assert!(manager.resolve_session(&token.value).unwrap().is_none());
        // Ending twice is fine.
        manager.end_session(&token.value).unwrap();
    }

    #[test]
    fn unknown_token_resolves_to_none() {
        let (manager, _store, _temp_dir) = create_tmp_manager();
        let value = AuthTokenValue("not-a-token".to_string());
        assert!(manager.resolve_session(&value).unwrap().is_none());
    }

    #[test]
    fn idle_sessions_expire() {
        let (manager, store, _temp_dir) = create_tmp_manager();
        let account_id = manager.register("freddie", "mercury").unwrap();

        let mut token = AuthToken::new(account_id);
        token.created = SystemTime::now() - Duration::from_secs(31 * 24 * 60 * 60);
        store.add_auth_token(&token).unwrap();

        assert!(manager.resolve_session(&token.value).unwrap().is_none());
        assert!(store.get_auth_token(&token.value).unwrap().is_none());
    }

    #[test]
    fn revokes_all_sessions_and_updates_password() {
        let (manager, _store, _temp_dir) = create_tmp_manager();
        manager.register("freddie", "mercury").unwrap();
        let first = manager.login("freddie", "mercury").unwrap();
        manager.login("freddie", "mercury").unwrap();
        assert_eq!(manager.get_sessions("freddie").unwrap().len(), 2);

        assert_eq!(manager.revoke_sessions("freddie").unwrap(), 2);
        assert!(manager.resolve_session(&first.value).unwrap().is_none());

        manager.update_password("freddie", "bulsara").unwrap();
        assert!(manager.authenticate("freddie", "mercury").is_err());
        manager.authenticate("freddie", "bulsara").unwrap();

        assert!(manager.revoke_sessions("nobody").is_err());
    }
}
