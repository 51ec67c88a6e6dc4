use super::auth::{AuthToken, AuthTokenValue, HashedPassword, PasswordCredentials};
use super::user_store::{UserAuthCredentialsStore, UserAuthTokenStore, UserStore};
use crate::error::{classify_write_error, AppError, AppResult, EntityKind};
use crate::sqlite_column;
use crate::sqlite_persistence::{
    open_versioned_db, Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
    DEFAULT_TIMESTAMP,
};
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tracing::{debug, info};

pub const USER_DB_FILE_NAME: &str = "user.db";

/// V 0
const ACCOUNT_TABLE_V_0: Table = Table {
    name: "account",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("handle", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_account_handle", "handle")],
};
const PASSWORD_CREDENTIALS_TABLE_V_0: Table = Table {
    name: "password_credentials",
    columns: &[
        sqlite_column!(
            "account_id",
            &SqlType::Integer,
            non_null = true,
            is_unique = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "account",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
        sqlite_column!("hash", &SqlType::Text, non_null = true),
        sqlite_column!("hasher", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_tried", &SqlType::Integer),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    indices: &[],
};
const AUTH_TOKEN_TABLE_V_0: Table = Table {
    name: "auth_token",
    columns: &[
        sqlite_column!(
            "account_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "account",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("value", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    indices: &[("idx_auth_token_value", "value")],
};

pub const USER_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        ACCOUNT_TABLE_V_0,
        PASSWORD_CREDENTIALS_TABLE_V_0,
        AUTH_TOKEN_TABLE_V_0,
    ],
    migration: None,
}];

fn system_time_from_column_result(value: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(value.max(0) as u64)
}

fn system_time_to_column(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn now_column() -> i64 {
    system_time_to_column(SystemTime::now())
}

fn auth_token_from_row(row: &Row) -> rusqlite::Result<AuthToken> {
    Ok(AuthToken {
        account_id: row.get(0)?,
        value: AuthTokenValue(row.get(1)?),
        created: system_time_from_column_result(row.get(2)?),
        last_used: row
            .get::<usize, Option<i64>>(3)?
            .map(system_time_from_column_result),
    })
}

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned_db(db_path.as_ref(), USER_VERSIONED_SCHEMAS)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        info!("Opened user db {:?}", db_path.as_ref());
        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Looks for a `user.db` in `/data/db`, then in the current directory
    /// and each of its parents.
    pub fn infer_path() -> Option<PathBuf> {
        let db_data_dir = PathBuf::from("/data/db").join(USER_DB_FILE_NAME);
        if db_data_dir.exists() {
            return Some(db_data_dir);
        }

        let mut current_dir = std::env::current_dir().ok()?;
        loop {
            let candidate = current_dir.join(USER_DB_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if let Some(parent) = current_dir.parent() {
                current_dir = parent.to_path_buf();
            } else {
                break;
            }
        }

        None
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("User db connection mutex poisoned"))
    }
}

impl UserStore for SqliteUserStore {
    fn create_account(&self, username: &str, password: &HashedPassword) -> AppResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO account (handle) VALUES (?1)",
            params![username],
        )
        .map_err(|err| classify_write_error(err, EntityKind::Account, username))?;
        let account_id = tx.last_insert_rowid() as usize;
        tx.execute(
            "INSERT INTO password_credentials (account_id, salt, hash, hasher) VALUES (?1, ?2, ?3, ?4)",
            params![
                account_id,
                password.salt,
                password.hash,
                password.hasher.to_string()
            ],
        )?;
        tx.commit()?;
        debug!("Created account {} with id {}", username, account_id);
        Ok(account_id)
    }

    fn get_account_id(&self, username: &str) -> Result<Option<usize>> {
        let conn = self.lock()?;
        let id = conn
            .query_row(
                "SELECT id FROM account WHERE handle = ?1",
                params![username],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn get_username(&self, account_id: usize) -> Result<Option<String>> {
        let conn = self.lock()?;
        let handle = conn
            .query_row(
                "SELECT handle FROM account WHERE id = ?1",
                params![account_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(handle)
    }

    fn get_all_usernames(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT handle FROM account ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(rows)
    }
}

impl UserAuthTokenStore for SqliteUserStore {
    fn get_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let conn = self.lock()?;
        let token = conn
            .query_row(
                "SELECT account_id, value, created, last_used FROM auth_token WHERE value = ?1",
                params![value.0],
                auth_token_from_row,
            )
            .optional()?;
        Ok(token)
    }

    fn delete_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let token = match self.get_auth_token(value)? {
            Some(token) => token,
            None => return Ok(None),
        };
        let conn = self.lock()?;
        conn.execute("DELETE FROM auth_token WHERE value = ?1", params![value.0])?;
        Ok(Some(token))
    }

    fn touch_auth_token(&self, value: &AuthTokenValue) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE auth_token SET last_used = ?1 WHERE value = ?2",
            params![now_column(), value.0],
        )?;
        Ok(())
    }

    fn add_auth_token(&self, token: &AuthToken) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO auth_token (account_id, value, created, last_used) VALUES (?1, ?2, ?3, ?4)",
            params![
                token.account_id,
                token.value.0,
                system_time_to_column(token.created),
                token.last_used.map(system_time_to_column)
            ],
        )
        .with_context(|| format!("Failed to add auth token for account {}", token.account_id))?;
        Ok(())
    }

    fn get_all_auth_tokens(&self, username: &str) -> Result<Vec<AuthToken>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT account_id, value, created, last_used FROM auth_token
             WHERE account_id = (SELECT id FROM account WHERE handle = ?1)",
        )?;
        let rows = stmt
            .query_map(params![username], auth_token_from_row)?
            .collect::<Result<Vec<AuthToken>, _>>()?;
        Ok(rows)
    }

    fn delete_all_auth_tokens(&self, account_id: usize) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM auth_token WHERE account_id = ?1",
            params![account_id],
        )?;
        Ok(deleted)
    }

    fn prune_unused_auth_tokens(&self, unused_for_days: u64) -> Result<usize> {
        let conn = self.lock()?;
        let cutoff = now_column() - (unused_for_days * 24 * 60 * 60) as i64;
        let deleted = conn.execute(
            "DELETE FROM auth_token WHERE MAX(created, COALESCE(last_used, created)) < ?1",
            params![cutoff],
        )?;
        Ok(deleted)
    }
}

impl UserAuthCredentialsStore for SqliteUserStore {
    fn get_password_credentials(&self, username: &str) -> Result<Option<PasswordCredentials>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT c.account_id, c.salt, c.hash, c.hasher, c.created, c.last_tried, c.last_used
                 FROM password_credentials c JOIN account a ON a.id = c.account_id
                 WHERE a.handle = ?1",
                params![username],
                |row| {
                    Ok((
                        row.get::<usize, usize>(0)?,
                        row.get::<usize, String>(1)?,
                        row.get::<usize, String>(2)?,
                        row.get::<usize, String>(3)?,
                        row.get::<usize, i64>(4)?,
                        row.get::<usize, Option<i64>>(5)?,
                        row.get::<usize, Option<i64>>(6)?,
                    ))
                },
            )
            .optional()?;

        let Some((account_id, salt, hash, hasher, created, last_tried, last_used)) = row else {
            return Ok(None);
        };
        Ok(Some(PasswordCredentials {
            account_id,
            password: HashedPassword {
                salt,
                hash,
                hasher: super::auth::CredentialsHasher::from_str(&hasher)?,
            },
            created: system_time_from_column_result(created),
            last_tried: last_tried.map(system_time_from_column_result),
            last_used: last_used.map(system_time_from_column_result),
        }))
    }

    fn update_password(&self, account_id: usize, password: &HashedPassword) -> Result<()> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE password_credentials SET salt = ?1, hash = ?2, hasher = ?3 WHERE account_id = ?4",
            params![
                password.salt,
                password.hash,
                password.hasher.to_string(),
                account_id
            ],
        )?;
        if updated == 0 {
            return Err(AppError::NotFound {
                entity: EntityKind::Account,
                id: account_id as i64,
            }
            .into());
        }
        Ok(())
    }

    fn record_password_attempt(&self, account_id: usize, succeeded: bool) -> Result<()> {
        let conn = self.lock()?;
        let now = now_column();
        if succeeded {
            conn.execute(
                "UPDATE password_credentials SET last_tried = ?1, last_used = ?1 WHERE account_id = ?2",
                params![now, account_id],
            )?;
        } else {
            conn.execute(
                "UPDATE password_credentials SET last_tried = ?1 WHERE account_id = ?2",
                params![now, account_id],
            )?;
        }
        Ok(())
    }
}
