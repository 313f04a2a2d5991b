//! Role/relationship access control.
//!
//! Every handler builds a [`Requirement`] describing who may perform the
//! operation and calls [`require`] (or [`authorize`]) with the request's
//! [`Principal`]. Denial is a value, not an error: only store failures
//! propagate as `ApiError::Upstream`.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::auth::AuthenticatedUser;
use crate::models::user::Role;
use crate::services::classes::ClassService;
use crate::services::links::LinkService;
use crate::services::roles::RoleService;

/// An authenticated identity with its role resolved from the role store.
#[derive(Debug, Clone, Copy)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

impl Principal {
    /// Resolves the principal's role from the role store. A user without a
    /// role row is rejected here — roles are never defaulted.
    pub async fn load(pool: &PgPool, auth: &AuthenticatedUser) -> Result<Self, ApiError> {
        let role = RoleService::resolve(pool, auth.id).await?;
        Ok(Self { id: auth.id, role })
    }
}

/// Exactly one relationship dimension per requirement. A requirement cannot
/// carry a child check and a class check at the same time, so the question
/// of which one wins never arises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    /// Principal must hold an approved parent link to this child.
    Child(Uuid),
    /// Principal must be the owning teacher of this class.
    Class(Uuid),
    /// Principal must be this user, or hold an approved link to them
    /// (as parent or as child).
    TargetUser(Uuid),
}

type CustomCheck = Box<dyn Fn(&Principal) -> bool + Send + Sync>;

/// What an operation demands of the caller.
pub struct Requirement {
    allowed_roles: &'static [Role],
    relationship: Option<Relationship>,
    allow_admin: bool,
    custom: Option<CustomCheck>,
}

/// Outcome of the synchronous (store-free) part of a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Allow,
    Deny,
    /// Role gate passed; the verdict depends on a relationship lookup.
    Needs(Relationship),
}

impl Requirement {
    /// Restrict to the given roles. An empty slice means any resolved role.
    pub fn roles(allowed: &'static [Role]) -> Self {
        Self {
            allowed_roles: allowed,
            relationship: None,
            allow_admin: true,
            custom: None,
        }
    }

    /// Any authenticated user with a role row.
    pub fn any_role() -> Self {
        Self::roles(&[])
    }

    pub fn for_child(mut self, child_id: Uuid) -> Self {
        self.relationship = Some(Relationship::Child(child_id));
        self
    }

    pub fn for_class(mut self, class_id: Uuid) -> Self {
        self.relationship = Some(Relationship::Class(class_id));
        self
    }

    pub fn for_user(mut self, target_id: Uuid) -> Self {
        self.relationship = Some(Relationship::TargetUser(target_id));
        self
    }

    /// Turn off the admin short-circuit; admins then pass through the same
    /// role and relationship checks as everyone else.
    pub fn no_admin_override(mut self) -> Self {
        self.allow_admin = false;
        self
    }

    /// Caller-supplied predicate; when present its verdict is final (after
    /// the admin short-circuit, before any role or relationship check).
    pub fn custom_check<F>(mut self, f: F) -> Self
    where
        F: Fn(&Principal) -> bool + Send + Sync + 'static,
    {
        self.custom = Some(Box::new(f));
        self
    }

    /// Store-free decision steps, in order:
    /// 1. admin override, 2. custom check, 3. role membership,
    /// 4. self-access short-circuit, 5. allow when nothing else demanded.
    pub fn role_gate(&self, principal: &Principal) -> Gate {
        if self.allow_admin && principal.role == Role::Admin {
            return Gate::Allow;
        }
        if let Some(check) = &self.custom {
            return if check(principal) { Gate::Allow } else { Gate::Deny };
        }
        if !self.allowed_roles.is_empty() && !self.allowed_roles.contains(&principal.role) {
            return Gate::Deny;
        }
        match self.relationship {
            None => Gate::Allow,
            Some(Relationship::TargetUser(t)) if t == principal.id => Gate::Allow,
            Some(rel) => Gate::Needs(rel),
        }
    }
}

/// Full decision: role gate first, then the relationship lookup if one is
/// demanded. Missing or non-approved relationship rows yield `Ok(false)`.
pub async fn authorize(
    pool: &PgPool,
    principal: &Principal,
    req: &Requirement,
) -> Result<bool, ApiError> {
    match req.role_gate(principal) {
        Gate::Allow => Ok(true),
        Gate::Deny => Ok(false),
        Gate::Needs(rel) => check_relationship(pool, principal, rel).await,
    }
}

/// Like [`authorize`] but maps denial to `ApiError::NotAuthorized`.
pub async fn require(
    pool: &PgPool,
    principal: &Principal,
    req: &Requirement,
) -> Result<(), ApiError> {
    if authorize(pool, principal, req).await? {
        Ok(())
    } else {
        Err(ApiError::NotAuthorized)
    }
}

async fn check_relationship(
    pool: &PgPool,
    principal: &Principal,
    rel: Relationship,
) -> Result<bool, ApiError> {
    match rel {
        Relationship::Child(child_id) => {
            LinkService::is_approved_parent_of(pool, principal.id, child_id).await
        }
        Relationship::Class(class_id) => {
            ClassService::is_owning_teacher_of(pool, principal.id, class_id).await
        }
        Relationship::TargetUser(target_id) => {
            // Either direction of an approved link grants access to the
            // counterpart's data (parent reads child, child reads parent).
            if LinkService::is_approved_parent_of(pool, principal.id, target_id).await? {
                return Ok(true);
            }
            LinkService::is_approved_parent_of(pool, target_id, principal.id).await
        }
    }
}

/// Resource-level ownership check, applied to mutations after the
/// role/relationship gate. Both layers are mandatory; passing one never
/// waives the other.
pub fn ensure_owner(principal: &Principal, owner_id: Uuid) -> Result<(), ApiError> {
    if principal.role == Role::Admin || principal.id == owner_id {
        Ok(())
    } else {
        Err(ApiError::NotAuthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal { id: Uuid::new_v4(), role }
    }

    #[test]
    fn admin_override_skips_everything() {
        let admin = principal(Role::Admin);
        // Even a requirement that names no admin-compatible role and demands
        // a relationship is short-circuited.
        let req = Requirement::roles(&[Role::Parent]).for_child(Uuid::new_v4());
        assert_eq!(req.role_gate(&admin), Gate::Allow);

        let req = Requirement::roles(&[Role::Student]).custom_check(|_| false);
        assert_eq!(req.role_gate(&admin), Gate::Allow);
    }

    #[test]
    fn admin_override_can_be_disabled() {
        let admin = principal(Role::Admin);
        let req = Requirement::roles(&[Role::Parent]).no_admin_override();
        assert_eq!(req.role_gate(&admin), Gate::Deny);
    }

    #[test]
    fn custom_check_is_authoritative() {
        let teacher = principal(Role::Teacher);
        // Passing custom check overrides a failing role gate...
        let req = Requirement::roles(&[Role::Parent]).custom_check(|_| true);
        assert_eq!(req.role_gate(&teacher), Gate::Allow);
        // ...and a failing custom check overrides a passing role gate and
        // suppresses the relationship lookup.
        let req = Requirement::roles(&[Role::Teacher])
            .for_class(Uuid::new_v4())
            .custom_check(|_| false);
        assert_eq!(req.role_gate(&teacher), Gate::Deny);
    }

    #[test]
    fn role_gate_denies_before_relationship_is_consulted() {
        let student = principal(Role::Student);
        let req = Requirement::roles(&[Role::Parent]).for_child(Uuid::new_v4());
        assert_eq!(req.role_gate(&student), Gate::Deny);
    }

    #[test]
    fn empty_role_set_admits_any_role() {
        for role in [Role::Student, Role::Parent, Role::Teacher] {
            assert_eq!(Requirement::any_role().role_gate(&principal(role)), Gate::Allow);
        }
    }

    #[test]
    fn self_access_needs_no_relationship_row() {
        let student = principal(Role::Student);
        let req = Requirement::any_role().for_user(student.id);
        assert_eq!(req.role_gate(&student), Gate::Allow);
    }

    #[test]
    fn foreign_target_defers_to_relationship_lookup() {
        let parent = principal(Role::Parent);
        let other = Uuid::new_v4();
        let req = Requirement::any_role().for_user(other);
        assert_eq!(req.role_gate(&parent), Gate::Needs(Relationship::TargetUser(other)));
    }

    #[test]
    fn child_and_class_requirements_defer_to_lookup() {
        let parent = principal(Role::Parent);
        let child = Uuid::new_v4();
        let req = Requirement::roles(&[Role::Parent]).for_child(child);
        assert_eq!(req.role_gate(&parent), Gate::Needs(Relationship::Child(child)));

        let teacher = principal(Role::Teacher);
        let class = Uuid::new_v4();
        let req = Requirement::roles(&[Role::Teacher]).for_class(class);
        assert_eq!(req.role_gate(&teacher), Gate::Needs(Relationship::Class(class)));
    }

    #[test]
    fn owner_check_denies_non_owner() {
        let owner = Uuid::new_v4();
        let user = principal(Role::Student);
        assert!(ensure_owner(&user, owner).is_err());
        assert!(ensure_owner(&user, user.id).is_ok());
        // Admin is the explicit universal override.
        assert!(ensure_owner(&principal(Role::Admin), owner).is_ok());
    }
}
