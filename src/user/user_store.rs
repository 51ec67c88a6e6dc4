use super::auth::{AuthToken, AuthTokenValue, HashedPassword, PasswordCredentials};
use crate::error::AppResult;
use anyhow::Result;

pub trait UserAuthCredentialsStore: Send + Sync {
    /// Returns the account's password credentials given its username.
    /// Returns Ok(None) if the account does not exist.
    fn get_password_credentials(&self, username: &str) -> Result<Option<PasswordCredentials>>;

    /// Replaces the account's password hash.
    fn update_password(&self, account_id: usize, password: &HashedPassword) -> Result<()>;

    /// Records a login attempt, `succeeded` also refreshes `last_used`.
    fn record_password_attempt(&self, account_id: usize, succeeded: bool) -> Result<()>;
}

pub trait UserAuthTokenStore: Send + Sync {
    /// Returns Ok(None) if the token does not exist.
    fn get_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Deletes an auth token given the token value.
    /// Returns Ok(None) if the token did not exist.
    fn delete_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Updates an auth token with the latest timestamp.
    fn touch_auth_token(&self, value: &AuthTokenValue) -> Result<()>;

    fn add_auth_token(&self, token: &AuthToken) -> Result<()>;

    /// Returns all of an account's tokens.
    fn get_all_auth_tokens(&self, username: &str) -> Result<Vec<AuthToken>>;

    /// Returns the number of tokens deleted.
    fn delete_all_auth_tokens(&self, account_id: usize) -> Result<usize>;

    /// Prunes tokens that haven't been used for the specified duration.
    /// Returns the number of tokens that were deleted.
    fn prune_unused_auth_tokens(&self, unused_for_days: u64) -> Result<usize>;
}

pub trait UserStore: UserAuthTokenStore + UserAuthCredentialsStore + Send + Sync {
    /// Creates an account together with its password credentials in a
    /// single transaction and returns the account id.
    /// A taken username fails with `AppError::DuplicateEntity`.
    fn create_account(&self, username: &str, password: &HashedPassword) -> AppResult<usize>;

    /// Returns Ok(None) if the account does not exist.
    fn get_account_id(&self, username: &str) -> Result<Option<usize>>;

    /// Returns Ok(None) if the account does not exist.
    fn get_username(&self, account_id: usize) -> Result<Option<String>>;

    /// Returns all usernames, in creation order.
    fn get_all_usernames(&self) -> Result<Vec<String>>;
}
