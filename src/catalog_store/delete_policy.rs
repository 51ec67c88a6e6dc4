use serde::Deserialize;
use std::fmt;

/// What happens to songs and albums that reference a deleted row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DeletePolicy {
    /// Remove the row and leave dependents pointing at a missing id.
    #[default]
    AllowDangling,
    /// Refuse to delete a row that is still referenced.
    Reject,
    /// Remove dependents in the same transaction.
    Cascade,
}

impl DeletePolicy {
    /// Whether SQLite should enforce the declared foreign keys.
    pub fn enforces_foreign_keys(&self) -> bool {
        !matches!(self, DeletePolicy::AllowDangling)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "allow-dangling" | "allow_dangling" => Some(DeletePolicy::AllowDangling),
            "reject" => Some(DeletePolicy::Reject),
            "cascade" => Some(DeletePolicy::Cascade),
            _ => None,
        }
    }
}

impl fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeletePolicy::AllowDangling => write!(f, "allow-dangling"),
            DeletePolicy::Reject => write!(f, "reject"),
            DeletePolicy::Cascade => write!(f, "cascade"),
        }
    }
}
