//! 프로세스 내 역할/권한 저장소
//!
//! 모든 상태가 하나의 뮤텍스 아래 있으므로 동기화(sync)와 삭제 연쇄가 원자적입니다.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::errors::AppError;
use crate::domain::entities::rbac::{Permission, Role, RolePermission, UserRole};
use crate::repositories::lock_poisoned;
use crate::repositories::rbac::{RbacStore, PERMISSION_CONFLICT, ROLE_CONFLICT, ROLE_VERSION_CONFLICT};

#[derive(Default)]
struct RbacState {
    roles: HashMap<String, Role>,
    permissions: HashMap<String, Permission>,
    /// (role_id, permission_id) → 부여
    grants: HashMap<(String, String), RolePermission>,
    /// (user_id, role_id) → 할당
    assignments: HashMap<(String, String), UserRole>,
}

impl RbacState {
    fn effective_role_ids(&self, user_id: &str, now: DateTime<Utc>) -> Vec<String> {
        self.assignments
            .values()
            .filter(|assignment| assignment.user_id == user_id && assignment.is_effective(now))
            .filter(|assignment| {
                self.roles
                    .get(&assignment.role_id)
                    .is_some_and(|role| role.is_active)
            })
            .map(|assignment| assignment.role_id.clone())
            .collect()
    }
}

#[derive(Default)]
pub struct InMemoryRbacStore {
    state: Mutex<RbacState>,
}

impl InMemoryRbacStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_name<T, F: Fn(&T) -> &str>(mut items: Vec<T>, key: F) -> Vec<T> {
    items.sort_by(|a, b| key(a).cmp(key(b)));
    items
}

#[async_trait]
impl RbacStore for InMemoryRbacStore {
    async fn create_role(&self, role: Role) -> Result<Role, AppError> {
        let mut state = self.state.lock().map_err(lock_poisoned)?;
        if state.roles.values().any(|existing| existing.name == role.name) {
            return Err(AppError::ConflictError(ROLE_CONFLICT.to_string()));
        }
        state.roles.insert(role.id.clone(), role.clone());
        Ok(role)
    }

    async fn find_role_by_id(&self, id: &str) -> Result<Option<Role>, AppError> {
        let state = self.state.lock().map_err(lock_poisoned)?;
        Ok(state.roles.get(id).cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AppError> {
        let state = self.state.lock().map_err(lock_poisoned)?;
        Ok(state.roles.values().find(|role| role.name == name).cloned())
    }

    async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        let state = self.state.lock().map_err(lock_poisoned)?;
        Ok(sorted_by_name(state.roles.values().cloned().collect(), |role| role.name.as_str()))
    }

    async fn update_role(&self, role: Role, now: DateTime<Utc>) -> Result<Role, AppError> {
        let mut state = self.state.lock().map_err(lock_poisoned)?;
        if state
            .roles
            .values()
            .any(|existing| existing.name == role.name && existing.id != role.id)
        {
            return Err(AppError::ConflictError(ROLE_CONFLICT.to_string()));
        }

        let stored = state
            .roles
            .get_mut(&role.id)
            .ok_or_else(|| AppError::NotFound("역할을 찾을 수 없습니다".to_string()))?;
        if stored.version != role.version {
            return Err(AppError::ConflictError(ROLE_VERSION_CONFLICT.to_string()));
        }

        stored.name = role.name;
        stored.description = role.description;
        stored.is_active = role.is_active;
        stored.version += 1;
        stored.updated_at = now;
        Ok(stored.clone())
    }

    async fn delete_role(&self, id: &str) -> Result<bool, AppError> {
        let mut state = self.state.lock().map_err(lock_poisoned)?;
        if state.roles.remove(id).is_none() {
            return Ok(false);
        }
        for grant in state.grants.values_mut().filter(|grant| grant.role_id == id) {
            grant.is_active = false;
        }
        for assignment in state.assignments.values_mut().filter(|a| a.role_id == id) {
            assignment.is_active = false;
        }
        Ok(true)
    }

    async fn create_permission(&self, permission: Permission) -> Result<Permission, AppError> {
        let mut state = self.state.lock().map_err(lock_poisoned)?;
        if state.permissions.values().any(|existing| existing.name == permission.name) {
            return Err(AppError::ConflictError(PERMISSION_CONFLICT.to_string()));
        }
        state.permissions.insert(permission.id.clone(), permission.clone());
        Ok(permission)
    }

    async fn find_permission_by_id(&self, id: &str) -> Result<Option<Permission>, AppError> {
        let state = self.state.lock().map_err(lock_poisoned)?;
        Ok(state.permissions.get(id).cloned())
    }

    async fn find_permission_by_name(&self, name: &str) -> Result<Option<Permission>, AppError> {
        let state = self.state.lock().map_err(lock_poisoned)?;
        Ok(state.permissions.values().find(|p| p.name == name).cloned())
    }

    async fn find_permissions_by_ids(&self, ids: &[String]) -> Result<Vec<Permission>, AppError> {
        let state = self.state.lock().map_err(lock_poisoned)?;
        Ok(ids.iter().filter_map(|id| state.permissions.get(id).cloned()).collect())
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, AppError> {
        let state = self.state.lock().map_err(lock_poisoned)?;
        Ok(sorted_by_name(state.permissions.values().cloned().collect(), |p| p.name.as_str()))
    }

    async fn update_permission(&self, permission: Permission, now: DateTime<Utc>) -> Result<Permission, AppError> {
        let mut state = self.state.lock().map_err(lock_poisoned)?;
        let stored = state
            .permissions
            .get_mut(&permission.id)
            .ok_or_else(|| AppError::NotFound("권한을 찾을 수 없습니다".to_string()))?;
        stored.description = permission.description;
        stored.is_active = permission.is_active;
        stored.updated_at = now;
        Ok(stored.clone())
    }

    async fn delete_permission(&self, id: &str) -> Result<bool, AppError> {
        let mut state = self.state.lock().map_err(lock_poisoned)?;
        if state.permissions.remove(id).is_none() {
            return Ok(false);
        }
        for grant in state.grants.values_mut().filter(|grant| grant.permission_id == id) {
            grant.is_active = false;
        }
        Ok(true)
    }

    async fn grant_permission(
        &self,
        role_id: &str,
        permission_id: &str,
        granted_by: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<RolePermission, AppError> {
        let mut state = self.state.lock().map_err(lock_poisoned)?;
        let grant = state
            .grants
            .entry((role_id.to_string(), permission_id.to_string()))
            .or_insert_with(|| RolePermission::new(role_id, permission_id, granted_by.map(str::to_string), now));

        if !grant.is_active {
            grant.is_active = true;
            grant.granted_by = granted_by.map(str::to_string);
            grant.granted_at = now;
        }
        Ok(grant.clone())
    }

    async fn revoke_permission(&self, role_id: &str, permission_id: &str) -> Result<bool, AppError> {
        let mut state = self.state.lock().map_err(lock_poisoned)?;
        match state.grants.get_mut(&(role_id.to_string(), permission_id.to_string())) {
            Some(grant) if grant.is_active => {
                grant.is_active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn sync_role_permissions(
        &self,
        role_id: &str,
        permission_ids: &[String],
        granted_by: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut state = self.state.lock().map_err(lock_poisoned)?;
        let desired: HashSet<&String> = permission_ids.iter().collect();

        for grant in state.grants.values_mut().filter(|grant| grant.role_id == role_id) {
            let wanted = desired.contains(&grant.permission_id);
            if grant.is_active && !wanted {
                grant.is_active = false;
            } else if !grant.is_active && wanted {
                grant.is_active = true;
                grant.granted_by = granted_by.map(str::to_string);
                grant.granted_at = now;
            }
        }

        for permission_id in desired {
            state
                .grants
                .entry((role_id.to_string(), permission_id.clone()))
                .or_insert_with(|| RolePermission::new(role_id, permission_id, granted_by.map(str::to_string), now));
        }
        Ok(())
    }

    async fn role_permissions(&self, role_id: &str) -> Result<Vec<Permission>, AppError> {
        let state = self.state.lock().map_err(lock_poisoned)?;
        let permissions = state
            .grants
            .values()
            .filter(|grant| grant.role_id == role_id && grant.is_active)
            .filter_map(|grant| state.permissions.get(&grant.permission_id).cloned())
            .collect();
        Ok(sorted_by_name(permissions, |p| p.name.as_str()))
    }

    async fn assign_role(
        &self,
        user_id: &str,
        role_id: &str,
        assigned_by: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<UserRole, AppError> {
        let mut state = self.state.lock().map_err(lock_poisoned)?;
        let assignment = state
            .assignments
            .entry((user_id.to_string(), role_id.to_string()))
            .or_insert_with(|| UserRole::new(user_id, role_id, assigned_by.map(str::to_string), expires_at, now));

        assignment.is_active = true;
        assignment.expires_at = expires_at;
        Ok(assignment.clone())
    }

    async fn unassign_role(&self, user_id: &str, role_id: &str) -> Result<bool, AppError> {
        let mut state = self.state.lock().map_err(lock_poisoned)?;
        match state.assignments.get_mut(&(user_id.to_string(), role_id.to_string())) {
            Some(assignment) if assignment.is_active => {
                assignment.is_active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn user_role_history(&self, user_id: &str) -> Result<Vec<UserRole>, AppError> {
        let state = self.state.lock().map_err(lock_poisoned)?;
        let mut history: Vec<UserRole> = state
            .assignments
            .values()
            .filter(|assignment| assignment.user_id == user_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.assigned_at.cmp(&a.assigned_at));
        Ok(history)
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut state = self.state.lock().map_err(lock_poisoned)?;
        let mut count = 0;
        for assignment in state.assignments.values_mut() {
            if assignment.is_active && assignment.expires_at.is_some_and(|expires_at| expires_at <= now) {
                assignment.is_active = false;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn effective_roles(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<Role>, AppError> {
        let state = self.state.lock().map_err(lock_poisoned)?;
        let roles = state
            .effective_role_ids(user_id, now)
            .iter()
            .filter_map(|role_id| state.roles.get(role_id).cloned())
            .collect();
        Ok(sorted_by_name(roles, |role| role.name.as_str()))
    }

    async fn effective_permissions(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<Permission>, AppError> {
        let state = self.state.lock().map_err(lock_poisoned)?;
        let role_ids: HashSet<String> = state.effective_role_ids(user_id, now).into_iter().collect();

        let permission_ids: HashSet<&String> = state
            .grants
            .values()
            .filter(|grant| grant.is_active && role_ids.contains(&grant.role_id))
            .map(|grant| &grant.permission_id)
            .collect();

        let permissions = permission_ids
            .into_iter()
            .filter_map(|id| state.permissions.get(id))
            .filter(|permission| permission.is_active)
            .cloned()
            .collect();
        Ok(sorted_by_name(permissions, |p| p.name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    struct Fixture {
        store: InMemoryRbacStore,
        role: Role,
        read: Permission,
        update: Permission,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryRbacStore::new();
        let now = Utc::now();
        let role = store.create_role(Role::new("EDITOR", None, now).unwrap()).await.unwrap();
        let read = store
            .create_permission(Permission::new("articles", "read", None, now).unwrap())
            .await
            .unwrap();
        let update = store
            .create_permission(Permission::new("articles", "update", None, now).unwrap())
            .await
            .unwrap();
        Fixture { store, role, read, update }
    }

    fn names(permissions: &[Permission]) -> Vec<&str> {
        permissions.iter().map(|p| p.name.as_str()).collect()
    }

    #[actix_web::test]
    async fn test_role_and_permission_names_are_unique() {
        let f = fixture().await;
        let now = Utc::now();

        let duplicate_role = f.store.create_role(Role::new("editor", None, now).unwrap()).await;
        assert!(matches!(duplicate_role, Err(AppError::ConflictError(_))));

        let duplicate_permission = f
            .store
            .create_permission(Permission::new("articles", "read", None, now).unwrap())
            .await;
        assert!(matches!(duplicate_permission, Err(AppError::ConflictError(_))));
    }

    #[actix_web::test]
    async fn test_grant_is_idempotent_and_reactivates() {
        let f = fixture().await;
        let now = Utc::now();

        let first = f.store.grant_permission(&f.role.id, &f.read.id, Some("admin-1"), now).await.unwrap();
        let second = f.store.grant_permission(&f.role.id, &f.read.id, Some("admin-2"), now).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.granted_by.as_deref(), Some("admin-1"));

        assert!(f.store.revoke_permission(&f.role.id, &f.read.id).await.unwrap());
        assert!(!f.store.revoke_permission(&f.role.id, &f.read.id).await.unwrap());

        let reactivated = f.store.grant_permission(&f.role.id, &f.read.id, Some("admin-3"), now).await.unwrap();
        assert_eq!(reactivated.id, first.id);
        assert!(reactivated.is_active);
        assert_eq!(reactivated.granted_by.as_deref(), Some("admin-3"));
    }

    #[actix_web::test]
    async fn test_sync_converges_regardless_of_prior_state() {
        let f = fixture().await;
        let now = Utc::now();
        f.store.grant_permission(&f.role.id, &f.read.id, None, now).await.unwrap();

        let desired = vec![f.update.id.clone()];
        f.store.sync_role_permissions(&f.role.id, &desired, None, now).await.unwrap();
        let after_first = f.store.role_permissions(&f.role.id).await.unwrap();
        assert_eq!(names(&after_first), vec!["articles:update"]);

        f.store.sync_role_permissions(&f.role.id, &desired, None, now).await.unwrap();
        let after_second = f.store.role_permissions(&f.role.id).await.unwrap();
        assert_eq!(names(&after_second), vec!["articles:update"]);

        f.store.sync_role_permissions(&f.role.id, &[], None, now).await.unwrap();
        assert!(f.store.role_permissions(&f.role.id).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_assign_twice_refreshes_expiry_only() {
        let f = fixture().await;
        let now = Utc::now();

        let first = f
            .store
            .assign_role("u1", &f.role.id, None, Some(now + Duration::hours(1)), now)
            .await
            .unwrap();
        let second = f
            .store
            .assign_role("u1", &f.role.id, None, Some(now + Duration::hours(5)), now)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.expires_at, Some(now + Duration::hours(5)));
        assert_eq!(f.store.user_role_history("u1").await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_effective_permissions_honor_every_link() {
        let f = fixture().await;
        let now = Utc::now();
        f.store.grant_permission(&f.role.id, &f.update.id, None, now).await.unwrap();
        f.store.assign_role("u1", &f.role.id, None, None, now).await.unwrap();

        let effective = f.store.effective_permissions("u1", now).await.unwrap();
        assert_eq!(names(&effective), vec!["articles:update"]);

        // 권한 비활성화
        let mut disabled = f.update.clone();
        disabled.is_active = false;
        f.store.update_permission(disabled.clone(), now).await.unwrap();
        assert!(f.store.effective_permissions("u1", now).await.unwrap().is_empty());
        disabled.is_active = true;
        f.store.update_permission(disabled, now).await.unwrap();

        // 역할 비활성화
        let mut role = f.store.find_role_by_id(&f.role.id).await.unwrap().unwrap();
        role.is_active = false;
        let role = f.store.update_role(role, now).await.unwrap();
        assert!(f.store.effective_permissions("u1", now).await.unwrap().is_empty());
        assert!(f.store.effective_roles("u1", now).await.unwrap().is_empty());

        let mut role = role;
        role.is_active = true;
        f.store.update_role(role, now).await.unwrap();
        assert_eq!(f.store.effective_permissions("u1", now).await.unwrap().len(), 1);

        // 부여 회수
        f.store.revoke_permission(&f.role.id, &f.update.id).await.unwrap();
        assert!(f.store.effective_permissions("u1", now).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_expired_assignment_stays_in_history_but_is_not_effective() {
        let f = fixture().await;
        let now = Utc::now();
        f.store.grant_permission(&f.role.id, &f.read.id, None, now).await.unwrap();
        f.store
            .assign_role("u1", &f.role.id, None, Some(now + Duration::minutes(5)), now)
            .await
            .unwrap();

        let later = now + Duration::minutes(5);
        assert!(f.store.effective_permissions("u1", later).await.unwrap().is_empty());
        assert_eq!(f.store.user_role_history("u1").await.unwrap().len(), 1);

        assert_eq!(f.store.cleanup_expired(later).await.unwrap(), 1);
        assert_eq!(f.store.cleanup_expired(later).await.unwrap(), 0);
        let history = f.store.user_role_history("u1").await.unwrap();
        assert!(!history[0].is_active);
    }

    #[actix_web::test]
    async fn test_delete_role_deactivates_join_rows() {
        let f = fixture().await;
        let now = Utc::now();
        f.store.grant_permission(&f.role.id, &f.read.id, None, now).await.unwrap();
        f.store.assign_role("u1", &f.role.id, None, None, now).await.unwrap();

        assert!(f.store.delete_role(&f.role.id).await.unwrap());
        assert!(!f.store.delete_role(&f.role.id).await.unwrap());

        let history = f.store.user_role_history("u1").await.unwrap();
        assert!(!history[0].is_active);
        assert!(f.store.effective_permissions("u1", now).await.unwrap().is_empty());
    }
}
