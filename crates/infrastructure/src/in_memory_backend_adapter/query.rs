//! Filter, search, and sort evaluation over in-memory rows.

use std::cmp::Ordering;

use rowgate_domain::{FilterOperator, QuerySpecification, RowData, RowFilter, SortDirection};
use serde_json::Value;

/// Applies the specification's filters, search, and sort to the given rows.
///
/// Pagination is left to the caller so the match total can be taken before
/// the page window is cut.
pub(super) fn matching_rows(
    rows: &[RowData],
    specification: &QuerySpecification,
    searchable_fields: &[String],
) -> Vec<RowData> {
    let mut matched: Vec<RowData> = rows
        .iter()
        .filter(|row| row_matches_filters(row, &specification.filters))
        .filter(|row| match specification.search.as_deref() {
            Some(term) => row_matches_search(row, term, searchable_fields),
            None => true,
        })
        .cloned()
        .collect();

    if let Some(sort) = &specification.sort {
        matched.sort_by(|left, right| {
            let ordering = compare_fields(left.get(&sort.field), right.get(&sort.field));
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    matched
}

fn row_matches_filters(row: &RowData, filters: &[RowFilter]) -> bool {
    filters
        .iter()
        .all(|filter| filter_matches(row.get(&filter.field), filter))
}

fn filter_matches(actual: Option<&Value>, filter: &RowFilter) -> bool {
    let Some(actual) = actual else {
        return false;
    };

    match filter.operator {
        FilterOperator::Eq => values_equal(actual, &filter.value),
        FilterOperator::Lt => compare_values(actual, &filter.value) == Some(Ordering::Less),
        FilterOperator::Gt => compare_values(actual, &filter.value) == Some(Ordering::Greater),
        FilterOperator::Contains => match (actual, &filter.value) {
            (Value::String(actual), Value::String(expected)) => {
                actual.to_lowercase().contains(&expected.to_lowercase())
            }
            _ => false,
        },
    }
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }

    // 18 and 18.0 name the same value even though serde_json keeps them apart.
    matches!(
        compare_values(actual, expected),
        Some(Ordering::Equal) if actual.is_number() && expected.is_number()
    )
}

fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => {
            left.as_f64().partial_cmp(&right.as_f64())
        }
        (Value::String(left), Value::String(right)) => Some(left.cmp(right)),
        (Value::Bool(left), Value::Bool(right)) => Some(left.cmp(right)),
        _ => None,
    }
}

fn compare_fields(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => compare_values(left, right).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn row_matches_search(row: &RowData, term: &str, searchable_fields: &[String]) -> bool {
    let needle = term.to_lowercase();

    searchable_fields.iter().any(|field| {
        matches!(
            row.get(field),
            Some(Value::String(text)) if text.to_lowercase().contains(&needle)
        )
    })
}
