//! Error kinds surfaced by the catalog and account operations.
//!
//! Every variant except `Internal` is an expected outcome that the request
//! handlers recover from locally (re-rendered form, plain-text status).

use rusqlite::ffi;
use std::fmt;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Account,
    Artist,
    Album,
    Song,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Account => write!(f, "Account"),
            EntityKind::Artist => write!(f, "Artist"),
            EntityKind::Album => write!(f, "Album"),
            EntityKind::Song => write!(f, "Song"),
        }
    }
}

pub const AUTHENTICATION_FAILURE_MESSAGE: &str = "Incorrect username or password.";

#[derive(Debug, Error)]
pub enum AppError {
    /// The natural key (name, title, username) is already taken.
    #[error("{entity} '{key}' already exists.")]
    DuplicateEntity { entity: EntityKind, key: String },

    /// A referenced row could not be resolved by its natural key.
    #[error("{entity} '{key}' not found.")]
    MissingReference { entity: EntityKind, key: String },

    #[error("{entity} with id {id} not found.")]
    NotFound { entity: EntityKind, id: i64 },

    /// Only produced under `DeletePolicy::Reject`.
    #[error("{entity} with id {id} is still referenced by {dependents} other record(s).")]
    StillReferenced {
        entity: EntityKind,
        id: i64,
        dependents: usize,
    },

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("{}", AUTHENTICATION_FAILURE_MESSAGE)]
    AuthenticationFailure,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn invalid_field<S: Into<String>>(field: &'static str, reason: S) -> Self {
        AppError::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Whether the error is a user mistake rather than a server fault.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AppError::Internal(_))
    }
}

/// Classifies a failed write. Constraint violations raised by SQLite at
/// commit time become the same errors the pre-checks would have produced,
/// anything else is internal.
pub fn classify_write_error(err: rusqlite::Error, entity: EntityKind, key: &str) -> AppError {
    if let rusqlite::Error::SqliteFailure(sqlite_err, _) = &err {
        match sqlite_err.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                return AppError::DuplicateEntity {
                    entity,
                    key: key.to_owned(),
                }
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                return AppError::MissingReference {
                    entity,
                    key: key.to_owned(),
                }
            }
            _ => {}
        }
    }
    AppError::Internal(anyhow::Error::new(err).context(format!("Failed to write {}", entity)))
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Internal(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::{params, Connection};

    #[test]
    fn unique_violation_is_duplicate_entity() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (name TEXT NOT NULL UNIQUE)", [])
            .unwrap();
        conn.execute("INSERT INTO t (name) VALUES (?1)", params!["Queen"])
            .unwrap();
        let err = conn
            .execute("INSERT INTO t (name) VALUES (?1)", params!["Queen"])
            .unwrap_err();

        match classify_write_error(err, EntityKind::Artist, "Queen") {
            AppError::DuplicateEntity { entity, key } => {
                assert_eq!(entity, EntityKind::Artist);
                assert_eq!(key, "Queen");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn foreign_key_violation_is_missing_reference() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("PRAGMA foreign_keys = ON", []).unwrap();
        conn.execute("CREATE TABLE parent (id INTEGER PRIMARY KEY)", [])
            .unwrap();
        conn.execute(
            "CREATE TABLE child (parent_id INTEGER REFERENCES parent(id))",
            [],
        )
        .unwrap();
        let err = conn
            .execute("INSERT INTO child (parent_id) VALUES (42)", [])
            .unwrap_err();

        assert!(matches!(
            classify_write_error(err, EntityKind::Album, "x"),
            AppError::MissingReference { .. }
        ));
    }

    #[test]
    fn authentication_failure_message_is_uniform() {
        assert_eq!(
            AppError::AuthenticationFailure.to_string(),
            AUTHENTICATION_FAILURE_MESSAGE
        );
        assert!(!AppError::Internal(anyhow::anyhow!("boom")).is_recoverable());
    }
}
