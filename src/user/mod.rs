pub mod auth;
mod sqlite_user_store;
mod user_manager;
mod user_store;

pub use auth::{AuthToken, AuthTokenValue, HashedPassword, PasswordCredentials};
pub use sqlite_user_store::{SqliteUserStore, USER_DB_FILE_NAME};
pub use user_manager::{
    AccountManager, AuthenticatedAccount, DEFAULT_SESSION_IDLE_DAYS, MAX_USERNAME_LENGTH,
};
pub use user_store::{UserAuthCredentialsStore, UserAuthTokenStore, UserStore};
