use std::sync::Arc;

use rowgate_core::{AppError, AppResult, ConnectionId, GroupId, UserIdentity};
use rowgate_domain::{
    AccessLevel, ConnectionRecord, TablePermission, aggregate_access_levels,
    aggregate_table_permissions,
};

use crate::GrantRepository;

/// Application service resolving effective access from group-held grants.
///
/// Resolution is a pure read per call; the service holds no mutable state and
/// is safe to share across concurrent requests.
#[derive(Clone)]
pub struct AccessService {
    grant_repository: Arc<dyn GrantRepository>,
}

impl AccessService {
    /// Creates a new access service from a grant repository implementation.
    #[must_use]
    pub fn new(grant_repository: Arc<dyn GrantRepository>) -> Self {
        Self { grant_repository }
    }

    /// Resolves the connection record, distinguishing missing connections
    /// from denied ones.
    pub async fn require_connection(
        &self,
        connection_id: ConnectionId,
    ) -> AppResult<ConnectionRecord> {
        self.grant_repository
            .find_connection(connection_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("connection '{connection_id}' does not exist"))
            })
    }

    /// Resolves the effective connection-level access for a user.
    ///
    /// No reachable grant resolves to [`AccessLevel::None`]; a suspended
    /// identity or membership is a hard stop instead.
    pub async fn resolve_connection_access(
        &self,
        actor: &UserIdentity,
        connection_id: ConnectionId,
    ) -> AppResult<AccessLevel> {
        Self::ensure_actor_active(actor)?;
        self.require_connection(connection_id).await?;

        let grants = self
            .grant_repository
            .list_connection_grants_for_user(actor.user_id(), connection_id)
            .await?;

        let reachable: Vec<_> = grants
            .iter()
            .map(|grant| (grant.group_id, grant.access_level, grant.membership_suspended))
            .collect();

        aggregate_access_levels(&reachable)
    }

    /// Resolves the effective group-level access for a user.
    ///
    /// Connection-level `edit` on the owning connection dominates: holders
    /// administer every group of the connection without a group grant.
    pub async fn resolve_group_access(
        &self,
        actor: &UserIdentity,
        group_id: GroupId,
    ) -> AppResult<AccessLevel> {
        Self::ensure_actor_active(actor)?;

        let connection_id = self
            .grant_repository
            .find_group_connection(group_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("group '{group_id}' does not exist")))?;

        let connection_level = self.resolve_connection_access(actor, connection_id).await?;
        if connection_level.can_write() {
            return Ok(AccessLevel::Edit);
        }

        let grants = self
            .grant_repository
            .list_group_grants_for_user(actor.user_id(), group_id)
            .await?;

        let reachable: Vec<_> = grants
            .iter()
            .map(|grant| (grant.group_id, grant.access_level, grant.membership_suspended))
            .collect();

        aggregate_access_levels(&reachable)
    }

    /// Resolves the effective table capability set for a user.
    ///
    /// Connection-level `edit` short-circuits to full access for every table
    /// of the connection, without reading table grants.
    pub async fn resolve_table_access(
        &self,
        actor: &UserIdentity,
        connection_id: ConnectionId,
        table_name: &str,
    ) -> AppResult<TablePermission> {
        let connection_level = self.resolve_connection_access(actor, connection_id).await?;
        if connection_level.can_write() {
            return Ok(TablePermission::full_access());
        }

        let grants = self
            .grant_repository
            .list_table_grants_for_user(actor.user_id(), connection_id, table_name)
            .await?;

        aggregate_table_permissions(&grants)
    }

    /// Resolves table capability sets for many tables at once, keeping only
    /// tables visible to the user.
    pub async fn resolve_table_access_for_all(
        &self,
        actor: &UserIdentity,
        connection_id: ConnectionId,
        table_names: &[String],
    ) -> AppResult<Vec<(String, TablePermission)>> {
        let connection_level = self.resolve_connection_access(actor, connection_id).await?;

        let mut visible = Vec::new();
        for table_name in table_names {
            let permission = if connection_level.can_write() {
                TablePermission::full_access()
            } else {
                let grants = self
                    .grant_repository
                    .list_table_grants_for_user(actor.user_id(), connection_id, table_name)
                    .await?;
                aggregate_table_permissions(&grants)?
            };

            if permission.visibility {
                visible.push((table_name.clone(), permission));
            }
        }

        Ok(visible)
    }

    fn ensure_actor_active(actor: &UserIdentity) -> AppResult<()> {
        if actor.is_suspended() {
            return Err(AppError::Forbidden(format!(
                "user '{}' is suspended",
                actor.user_id()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use rowgate_core::{AppError, AppResult, ConnectionId, GroupId, UserId, UserIdentity};
    use rowgate_domain::{
        AccessLevel, ConnectionGrant, ConnectionKind, ConnectionRecord, GroupGrant,
        TablePermission, TableGrant,
    };

    use super::AccessService;
    use crate::GrantRepository;

    #[derive(Default)]
    struct FakeGrantRepository {
        connections: HashMap<ConnectionId, ConnectionRecord>,
        group_connections: HashMap<GroupId, ConnectionId>,
        connection_grants: HashMap<(UserId, ConnectionId), Vec<ConnectionGrant>>,
        group_grants: HashMap<(UserId, GroupId), Vec<GroupGrant>>,
        table_grants: HashMap<(UserId, ConnectionId, String), Vec<TableGrant>>,
    }

    impl FakeGrantRepository {
        fn with_connection(mut self, connection_id: ConnectionId) -> Self {
            let record =
                ConnectionRecord::new(connection_id, ConnectionKind::Postgres, "warehouse")
                    .unwrap_or_else(|_| unreachable!());
            self.connections.insert(connection_id, record);
            self
        }
    }

    #[async_trait]
    impl GrantRepository for FakeGrantRepository {
        async fn find_connection(
            &self,
            connection_id: ConnectionId,
        ) -> AppResult<Option<ConnectionRecord>> {
            Ok(self.connections.get(&connection_id).cloned())
        }

        async fn find_group_connection(
            &self,
            group_id: GroupId,
        ) -> AppResult<Option<ConnectionId>> {
            Ok(self.group_connections.get(&group_id).copied())
        }

        async fn list_connection_grants_for_user(
            &self,
            user_id: UserId,
            connection_id: ConnectionId,
        ) -> AppResult<Vec<ConnectionGrant>> {
            Ok(self
                .connection_grants
                .get(&(user_id, connection_id))
                .cloned()
                .unwrap_or_default())
        }

        async fn list_group_grants_for_user(
            &self,
            user_id: UserId,
            group_id: GroupId,
        ) -> AppResult<Vec<GroupGrant>> {
            Ok(self
                .group_grants
                .get(&(user_id, group_id))
                .cloned()
                .unwrap_or_default())
        }

        async fn list_table_grants_for_user(
            &self,
            user_id: UserId,
            connection_id: ConnectionId,
            table_name: &str,
        ) -> AppResult<Vec<TableGrant>> {
            Ok(self
                .table_grants
                .get(&(user_id, connection_id, table_name.to_owned()))
                .cloned()
                .unwrap_or_default())
        }
    }

    fn service(repository: FakeGrantRepository) -> AccessService {
        AccessService::new(Arc::new(repository))
    }

    #[tokio::test]
    async fn no_reachable_grant_resolves_to_none() {
        let connection_id = ConnectionId::new();
        let service = service(FakeGrantRepository::default().with_connection(connection_id));
        let actor = UserIdentity::new(UserId::new());

        let level = service
            .resolve_connection_access(&actor, connection_id)
            .await;
        assert!(level.is_ok());
        assert_eq!(level.unwrap_or(AccessLevel::Edit), AccessLevel::None);

        let permission = service
            .resolve_table_access(&actor, connection_id, "customers")
            .await;
        assert!(permission.is_ok());
        assert_eq!(
            permission.unwrap_or(TablePermission::full_access()),
            TablePermission::default()
        );
    }

    #[tokio::test]
    async fn unknown_connection_is_not_found_not_none() {
        let service = service(FakeGrantRepository::default());
        let actor = UserIdentity::new(UserId::new());

        let level = service
            .resolve_connection_access(&actor, ConnectionId::new())
            .await;
        assert!(matches!(level, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn suspended_identity_short_circuits_before_grants() {
        let connection_id = ConnectionId::new();
        let user_id = UserId::new();
        let mut repository = FakeGrantRepository::default().with_connection(connection_id);
        repository.connection_grants.insert(
            (user_id, connection_id),
            vec![ConnectionGrant {
                group_id: GroupId::new(),
                access_level: AccessLevel::Edit,
                membership_suspended: false,
            }],
        );
        let service = service(repository);
        let actor = UserIdentity::suspended(user_id);

        let level = service
            .resolve_connection_access(&actor, connection_id)
            .await;
        assert!(matches!(level, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn suspended_membership_fails_regardless_of_grant_content() {
        let connection_id = ConnectionId::new();
        let user_id = UserId::new();
        let mut repository = FakeGrantRepository::default().with_connection(connection_id);
        repository.connection_grants.insert(
            (user_id, connection_id),
            vec![
                ConnectionGrant {
                    group_id: GroupId::new(),
                    access_level: AccessLevel::Edit,
                    membership_suspended: false,
                },
                ConnectionGrant {
                    group_id: GroupId::new(),
                    access_level: AccessLevel::None,
                    membership_suspended: true,
                },
            ],
        );
        let service = service(repository);
        let actor = UserIdentity::new(user_id);

        let level = service
            .resolve_connection_access(&actor, connection_id)
            .await;
        assert!(matches!(level, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn most_permissive_connection_grant_wins() {
        let connection_id = ConnectionId::new();
        let user_id = UserId::new();
        let mut repository = FakeGrantRepository::default().with_connection(connection_id);
        repository.connection_grants.insert(
            (user_id, connection_id),
            vec![
                ConnectionGrant {
                    group_id: GroupId::new(),
                    access_level: AccessLevel::Readonly,
                    membership_suspended: false,
                },
                ConnectionGrant {
                    group_id: GroupId::new(),
                    access_level: AccessLevel::Edit,
                    membership_suspended: false,
                },
            ],
        );
        let service = service(repository);
        let actor = UserIdentity::new(user_id);

        let level = service
            .resolve_connection_access(&actor, connection_id)
            .await;
        assert!(level.is_ok());
        assert_eq!(level.unwrap_or(AccessLevel::None), AccessLevel::Edit);
    }

    #[tokio::test]
    async fn connection_edit_grants_full_table_access_without_table_grants() {
        let connection_id = ConnectionId::new();
        let user_id = UserId::new();
        let mut repository = FakeGrantRepository::default().with_connection(connection_id);
        repository.connection_grants.insert(
            (user_id, connection_id),
            vec![ConnectionGrant {
                group_id: GroupId::new(),
                access_level: AccessLevel::Edit,
                membership_suspended: false,
            }],
        );
        let service = service(repository);
        let actor = UserIdentity::new(user_id);

        for table_name in ["customers", "orders", "never_granted"] {
            let permission = service
                .resolve_table_access(&actor, connection_id, table_name)
                .await;
            assert!(permission.is_ok());
            assert_eq!(
                permission.unwrap_or_default(),
                TablePermission::full_access()
            );
        }
    }

    #[tokio::test]
    async fn connection_edit_wins_over_explicit_readonly_table_grant() {
        let connection_id = ConnectionId::new();
        let user_id = UserId::new();
        let group_id = GroupId::new();
        let mut repository = FakeGrantRepository::default().with_connection(connection_id);
        repository.connection_grants.insert(
            (user_id, connection_id),
            vec![ConnectionGrant {
                group_id,
                access_level: AccessLevel::Edit,
                membership_suspended: false,
            }],
        );
        repository.table_grants.insert(
            (user_id, connection_id, "customers".to_owned()),
            vec![TableGrant {
                group_id,
                permission: TablePermission {
                    visibility: true,
                    readonly: true,
                    add: false,
                    delete: false,
                    edit: false,
                },
                membership_suspended: false,
            }],
        );
        let service = service(repository);
        let actor = UserIdentity::new(user_id);

        let permission = service
            .resolve_table_access(&actor, connection_id, "customers")
            .await;
        assert!(permission.is_ok());
        assert!(permission.unwrap_or_default().can_edit_rows());
    }

    #[tokio::test]
    async fn group_access_aggregates_when_connection_level_is_below_edit() {
        let connection_id = ConnectionId::new();
        let group_id = GroupId::new();
        let user_id = UserId::new();
        let mut repository = FakeGrantRepository::default().with_connection(connection_id);
        repository.group_connections.insert(group_id, connection_id);
        repository.connection_grants.insert(
            (user_id, connection_id),
            vec![ConnectionGrant {
                group_id: GroupId::new(),
                access_level: AccessLevel::Readonly,
                membership_suspended: false,
            }],
        );
        repository.group_grants.insert(
            (user_id, group_id),
            vec![GroupGrant {
                group_id: GroupId::new(),
                access_level: AccessLevel::Readonly,
                membership_suspended: false,
            }],
        );
        let service = service(repository);
        let actor = UserIdentity::new(user_id);

        let level = service.resolve_group_access(&actor, group_id).await;
        assert!(level.is_ok());
        assert_eq!(level.unwrap_or(AccessLevel::None), AccessLevel::Readonly);
    }

    #[tokio::test]
    async fn group_access_inherits_connection_edit() {
        let connection_id = ConnectionId::new();
        let group_id = GroupId::new();
        let user_id = UserId::new();
        let mut repository = FakeGrantRepository::default().with_connection(connection_id);
        repository.group_connections.insert(group_id, connection_id);
        repository.connection_grants.insert(
            (user_id, connection_id),
            vec![ConnectionGrant {
                group_id: GroupId::new(),
                access_level: AccessLevel::Edit,
                membership_suspended: false,
            }],
        );
        let service = service(repository);
        let actor = UserIdentity::new(user_id);

        let level = service.resolve_group_access(&actor, group_id).await;
        assert!(level.is_ok());
        assert_eq!(level.unwrap_or(AccessLevel::None), AccessLevel::Edit);
    }

    #[tokio::test]
    async fn unknown_group_is_not_found() {
        let service = service(FakeGrantRepository::default());
        let actor = UserIdentity::new(UserId::new());

        let level = service.resolve_group_access(&actor, GroupId::new()).await;
        assert!(matches!(level, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn table_listing_keeps_only_visible_tables() {
        let connection_id = ConnectionId::new();
        let user_id = UserId::new();
        let group_id = GroupId::new();
        let mut repository = FakeGrantRepository::default().with_connection(connection_id);
        repository.table_grants.insert(
            (user_id, connection_id, "customers".to_owned()),
            vec![TableGrant {
                group_id,
                permission: TablePermission {
                    visibility: true,
                    readonly: false,
                    add: false,
                    delete: false,
                    edit: false,
                },
                membership_suspended: false,
            }],
        );
        repository.table_grants.insert(
            (user_id, connection_id, "salaries".to_owned()),
            vec![TableGrant {
                group_id,
                permission: TablePermission {
                    visibility: false,
                    readonly: false,
                    add: true,
                    delete: false,
                    edit: false,
                },
                membership_suspended: false,
            }],
        );
        let service = service(repository);
        let actor = UserIdentity::new(user_id);

        let visible = service
            .resolve_table_access_for_all(
                &actor,
                connection_id,
                &["customers".to_owned(), "salaries".to_owned()],
            )
            .await;
        assert!(visible.is_ok());

        let visible = visible.unwrap_or_default();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].0, "customers");
    }
}
