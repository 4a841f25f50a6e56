use std::str::FromStr;

use rowgate_core::AppError;
use serde::{Deserialize, Serialize};

/// Connection-level and group-level access grade.
///
/// The variants form a total order (`None < Readonly < Edit`) used by the
/// most-permissive-wins aggregation of overlapping grants.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// No access at all.
    #[default]
    None,
    /// Rows and structure may be read but never mutated.
    Readonly,
    /// Full administrative access including writes.
    Edit,
}

impl AccessLevel {
    /// Returns a stable storage value for this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Readonly => "readonly",
            Self::Edit => "edit",
        }
    }

    /// Returns the more permissive of two levels.
    #[must_use]
    pub fn most_permissive(self, other: Self) -> Self {
        self.max(other)
    }

    /// Returns whether this level allows reading the scope.
    #[must_use]
    pub fn can_read(&self) -> bool {
        matches!(self, Self::Readonly | Self::Edit)
    }

    /// Returns whether this level allows mutating the scope.
    #[must_use]
    pub fn can_write(&self) -> bool {
        matches!(self, Self::Edit)
    }
}

impl FromStr for AccessLevel {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(Self::None),
            "readonly" => Ok(Self::Readonly),
            "edit" => Ok(Self::Edit),
            _ => Err(AppError::Validation(format!(
                "unknown access level value '{value}'"
            ))),
        }
    }
}

/// Per-table capability set.
///
/// Unlike [`AccessLevel`] this is not a single grade: a table grant can allow
/// adding rows while disallowing edits, so each capability is tracked
/// independently and aggregated by per-field OR.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TablePermission {
    /// Table is listed and its rows may be read.
    pub visibility: bool,
    /// Table is pinned read-only; dominates `edit` for write checks.
    pub readonly: bool,
    /// Rows may be inserted.
    pub add: bool,
    /// Rows may be deleted.
    pub delete: bool,
    /// Rows may be updated.
    pub edit: bool,
}

impl TablePermission {
    /// Returns the maximal permission granted to connection administrators.
    #[must_use]
    pub fn full_access() -> Self {
        Self {
            visibility: true,
            readonly: false,
            add: true,
            delete: true,
            edit: true,
        }
    }

    /// Returns the per-field OR of two permissions.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            visibility: self.visibility || other.visibility,
            readonly: self.readonly || other.readonly,
            add: self.add || other.add,
            delete: self.delete || other.delete,
            edit: self.edit || other.edit,
        }
    }

    /// Returns whether any capability exposes the table to the subject.
    #[must_use]
    pub fn can_read_rows(&self) -> bool {
        self.visibility || self.add || self.delete || self.edit
    }

    /// Returns whether rows may be inserted.
    #[must_use]
    pub fn can_add_rows(&self) -> bool {
        self.visibility && self.add
    }

    /// Returns whether rows may be deleted.
    #[must_use]
    pub fn can_delete_rows(&self) -> bool {
        self.visibility && self.delete
    }

    /// Returns whether rows may be updated.
    ///
    /// A stored `edit` flag is void while `readonly` is set.
    #[must_use]
    pub fn can_edit_rows(&self) -> bool {
        self.visibility && self.edit && !self.readonly
    }
}
