use std::str::FromStr;

use rowgate_core::{AppError, AppResult, ConnectionId, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Store-type tag on a connection record, used only for adapter dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    /// PostgreSQL relational store.
    Postgres,
    /// MySQL relational store.
    Mysql,
    /// MongoDB document store.
    Mongodb,
    /// Elasticsearch search index.
    Elasticsearch,
}

impl ConnectionKind {
    /// Returns a stable storage value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Mongodb => "mongodb",
            Self::Elasticsearch => "elasticsearch",
        }
    }
}

impl FromStr for ConnectionKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "postgres" => Ok(Self::Postgres),
            "mysql" => Ok(Self::Mysql),
            "mongodb" => Ok(Self::Mongodb),
            "elasticsearch" => Ok(Self::Elasticsearch),
            _ => Err(AppError::Validation(format!(
                "unknown connection kind '{value}'"
            ))),
        }
    }
}

/// Registered external database connection.
///
/// Credentials live with an external encryption collaborator; this record only
/// carries what the gateway core needs for dispatch and display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    id: ConnectionId,
    kind: ConnectionKind,
    display_name: NonEmptyString,
}

impl ConnectionRecord {
    /// Creates a connection record with a validated display name.
    pub fn new(
        id: ConnectionId,
        kind: ConnectionKind,
        display_name: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            kind,
            display_name: NonEmptyString::new(display_name)?,
        })
    }

    /// Returns the connection identifier.
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the store-type tag.
    #[must_use]
    pub fn kind(&self) -> ConnectionKind {
        self.kind
    }

    /// Returns the human-readable connection name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }
}
