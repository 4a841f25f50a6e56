use std::str::FromStr;

use rowgate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Page size applied when neither the caller nor table settings supply one.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Row filter comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// Value equality.
    Eq,
    /// Less than.
    Lt,
    /// Greater than.
    Gt,
    /// String contains comparison.
    Contains,
}

impl FilterOperator {
    /// Parses a transport value into an operator.
    pub fn parse_transport(value: &str) -> AppResult<Self> {
        Self::from_str(value)
    }

    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Lt => "lt",
            Self::Gt => "gt",
            Self::Contains => "contains",
        }
    }
}

impl FromStr for FilterOperator {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "eq" => Ok(Self::Eq),
            "lt" => Ok(Self::Lt),
            "gt" => Ok(Self::Gt),
            "contains" => Ok(Self::Contains),
            _ => Err(AppError::Validation(format!(
                "unknown filter operator '{value}'"
            ))),
        }
    }
}

/// Row sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending sort direction.
    #[default]
    Asc,
    /// Descending sort direction.
    Desc,
}

impl SortDirection {
    /// Parses a transport value into a sort direction.
    pub fn parse_transport(value: &str) -> AppResult<Self> {
        match value {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(AppError::Validation(format!(
                "unknown sort direction '{value}'"
            ))),
        }
    }

    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One comparison clause of a normalized row query.
///
/// Several clauses may name the same field; adapters apply them conjunctively
/// and must never merge them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowFilter {
    /// Field name to compare.
    pub field: String,
    /// Comparison operator.
    pub operator: FilterOperator,
    /// Expected field value.
    pub value: Value,
}

/// Sort instruction of a normalized row query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSort {
    /// Field name to sort by.
    pub field: String,
    /// Sort direction.
    pub direction: SortDirection,
}

/// Backend-neutral description of one row-fetch request.
///
/// `page` and `per_page` are always at least 1; garbage pagination never
/// reaches a backend. No sort means backend-natural order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpecification {
    /// One-based page number.
    pub page: u32,
    /// Rows per page.
    pub per_page: u32,
    /// Free-text search term, passed to the backend verbatim.
    pub search: Option<String>,
    /// Optional sort instruction.
    pub sort: Option<RowSort>,
    /// Conjunctive comparison clauses.
    pub filters: Vec<RowFilter>,
}

impl QuerySpecification {
    /// Returns a first-page specification with default page size and no
    /// search, sort, or filters.
    #[must_use]
    pub fn unfiltered() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            search: None,
            sort: None,
            filters: Vec::new(),
        }
    }
}

/// One raw filter clause as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawRowFilter {
    /// Field name to compare.
    pub field: String,
    /// Transport operator value.
    pub operator: String,
    /// Expected field value.
    pub value: Value,
}

/// Unvalidated caller-supplied row query parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawRowQuery {
    /// Requested page number, if any.
    pub page: Option<i64>,
    /// Requested page size, if any.
    pub per_page: Option<i64>,
    /// Free-text search term.
    pub search: Option<String>,
    /// Sort field name.
    pub sort_field: Option<String>,
    /// Transport sort direction value.
    pub sort_direction: Option<String>,
    /// Raw filter clauses.
    pub filters: Vec<RawRowFilter>,
}

impl RawRowQuery {
    /// Normalizes raw parameters into a [`QuerySpecification`].
    ///
    /// Pagination defaults instead of failing; an unparseable operator or
    /// sort direction fails fast with a validation error.
    pub fn normalize(self, default_per_page: Option<u32>) -> AppResult<QuerySpecification> {
        let page = self
            .page
            .filter(|value| *value >= 1)
            .and_then(|value| u32::try_from(value).ok())
            .unwrap_or(1);

        let per_page = self
            .per_page
            .filter(|value| *value >= 1)
            .and_then(|value| u32::try_from(value).ok())
            .or(default_per_page)
            .unwrap_or(DEFAULT_PER_PAGE);

        let sort = match self.sort_field {
            Some(field) if !field.trim().is_empty() => {
                let direction = self
                    .sort_direction
                    .as_deref()
                    .map(SortDirection::parse_transport)
                    .transpose()?
                    .unwrap_or_default();

                Some(RowSort { field, direction })
            }
            _ => None,
        };

        let filters = self
            .filters
            .into_iter()
            .map(|raw| {
                if raw.field.trim().is_empty() {
                    return Err(AppError::Validation(
                        "filter field name must not be empty".to_owned(),
                    ));
                }

                Ok(RowFilter {
                    field: raw.field,
                    operator: FilterOperator::parse_transport(raw.operator.as_str())?,
                    value: raw.value,
                })
            })
            .collect::<AppResult<Vec<RowFilter>>>()?;

        Ok(QuerySpecification {
            page,
            per_page,
            search: self.search,
            sort,
            filters,
        })
    }
}
