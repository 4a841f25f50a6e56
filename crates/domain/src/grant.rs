use rowgate_core::{AppError, AppResult, GroupId};
use serde::{Deserialize, Serialize};

use crate::{AccessLevel, TablePermission};

/// Connection-scoped grant reachable through one group membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionGrant {
    /// Group that carries the grant.
    pub group_id: GroupId,
    /// Granted access level for the connection.
    pub access_level: AccessLevel,
    /// Whether the subject's membership in the group is suspended.
    pub membership_suspended: bool,
}

/// Group-scoped grant reachable through one group membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupGrant {
    /// Group that carries the grant.
    pub group_id: GroupId,
    /// Granted access level for the target group.
    pub access_level: AccessLevel,
    /// Whether the subject's membership in the group is suspended.
    pub membership_suspended: bool,
}

/// Table-scoped grant reachable through one group membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableGrant {
    /// Group that carries the grant.
    pub group_id: GroupId,
    /// Granted capability set for the table.
    pub permission: TablePermission,
    /// Whether the subject's membership in the group is suspended.
    pub membership_suspended: bool,
}

fn check_membership_suspension(
    suspended: impl IntoIterator<Item = (GroupId, bool)>,
) -> AppResult<()> {
    for (group_id, membership_suspended) in suspended {
        if membership_suspended {
            return Err(AppError::Forbidden(format!(
                "subject membership in group '{group_id}' is suspended"
            )));
        }
    }

    Ok(())
}

/// Folds connection or group grants into one effective access level.
///
/// A suspended membership on any reachable grant is a hard stop, not a `None`
/// result. An empty grant set resolves to [`AccessLevel::None`].
pub fn aggregate_access_levels(
    grants: &[(GroupId, AccessLevel, bool)],
) -> AppResult<AccessLevel> {
    check_membership_suspension(
        grants
            .iter()
            .map(|(group_id, _, suspended)| (*group_id, *suspended)),
    )?;

    Ok(grants
        .iter()
        .fold(AccessLevel::None, |effective, (_, level, _)| {
            effective.most_permissive(*level)
        }))
}

/// Folds table grants into one effective capability set.
///
/// Same suspension and empty-set semantics as [`aggregate_access_levels`];
/// capabilities are combined by per-field OR.
pub fn aggregate_table_permissions(grants: &[TableGrant]) -> AppResult<TablePermission> {
    check_membership_suspension(
        grants
            .iter()
            .map(|grant| (grant.group_id, grant.membership_suspended)),
    )?;

    Ok(grants
        .iter()
        .fold(TablePermission::default(), |effective, grant| {
            effective.union(grant.permission)
        }))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rowgate_core::GroupId;

    use super::{TableGrant, aggregate_access_levels, aggregate_table_permissions};
    use crate::{AccessLevel, TablePermission};

    #[test]
    fn empty_grants_resolve_to_none() {
        let level = aggregate_access_levels(&[]);
        assert!(level.is_ok());
        assert_eq!(level.unwrap_or(AccessLevel::Edit), AccessLevel::None);

        let permission = aggregate_table_permissions(&[]);
        assert!(permission.is_ok());
        assert_eq!(
            permission.unwrap_or(TablePermission::full_access()),
            TablePermission::default()
        );
    }

    #[test]
    fn most_permissive_level_wins_across_groups() {
        let grants = vec![
            (GroupId::new(), AccessLevel::Readonly, false),
            (GroupId::new(), AccessLevel::None, false),
            (GroupId::new(), AccessLevel::Edit, false),
        ];

        let level = aggregate_access_levels(&grants);
        assert!(level.is_ok());
        assert_eq!(level.unwrap_or(AccessLevel::None), AccessLevel::Edit);
    }

    #[test]
    fn suspended_membership_stops_resolution() {
        let grants = vec![
            (GroupId::new(), AccessLevel::Edit, false),
            (GroupId::new(), AccessLevel::Readonly, true),
        ];

        let level = aggregate_access_levels(&grants);
        assert!(level.is_err());
    }

    #[test]
    fn table_capabilities_or_across_groups() {
        let grants = vec![
            TableGrant {
                group_id: GroupId::new(),
                permission: TablePermission {
                    visibility: true,
                    readonly: false,
                    add: true,
                    delete: false,
                    edit: false,
                },
                membership_suspended: false,
            },
            TableGrant {
                group_id: GroupId::new(),
                permission: TablePermission {
                    visibility: true,
                    readonly: false,
                    add: false,
                    delete: true,
                    edit: false,
                },
                membership_suspended: false,
            },
        ];

        let permission = aggregate_table_permissions(&grants);
        assert!(permission.is_ok());

        let permission = permission.unwrap_or_default();
        assert!(permission.can_add_rows());
        assert!(permission.can_delete_rows());
        assert!(!permission.can_edit_rows());
    }

    #[test]
    fn suspended_table_membership_stops_resolution() {
        let grants = vec![TableGrant {
            group_id: GroupId::new(),
            permission: TablePermission::full_access(),
            membership_suspended: true,
        }];

        let permission = aggregate_table_permissions(&grants);
        assert!(permission.is_err());
    }

    fn access_level_strategy() -> impl Strategy<Value = AccessLevel> {
        prop_oneof![
            Just(AccessLevel::None),
            Just(AccessLevel::Readonly),
            Just(AccessLevel::Edit),
        ]
    }

    proptest! {
        #[test]
        fn aggregation_is_order_insensitive(
            levels in proptest::collection::vec(access_level_strategy(), 0..6),
        ) {
            let forward: Vec<_> = levels
                .iter()
                .map(|level| (GroupId::new(), *level, false))
                .collect();
            let mut reversed = forward.clone();
            reversed.reverse();

            let left = aggregate_access_levels(&forward);
            let right = aggregate_access_levels(&reversed);
            prop_assert!(left.is_ok());
            prop_assert!(right.is_ok());
            prop_assert_eq!(
                left.unwrap_or(AccessLevel::None),
                right.unwrap_or(AccessLevel::Edit)
            );
        }

        #[test]
        fn aggregation_is_idempotent_under_duplication(
            levels in proptest::collection::vec(access_level_strategy(), 0..6),
        ) {
            let grants: Vec<_> = levels
                .iter()
                .map(|level| (GroupId::new(), *level, false))
                .collect();
            let mut doubled = grants.clone();
            doubled.extend(grants.iter().copied());

            let once = aggregate_access_levels(&grants);
            let twice = aggregate_access_levels(&doubled);
            prop_assert!(once.is_ok());
            prop_assert!(twice.is_ok());
            prop_assert_eq!(
                once.unwrap_or(AccessLevel::None),
                twice.unwrap_or(AccessLevel::Edit)
            );
        }
    }
}
