use serde::Serialize;
use thiserror::Error;

use todolist_core::UserId;

use crate::{Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("role {actual} is not permitted here (requires one of: {required})")]
    MissingRole { required: String, actual: Role },

    #[error("{0}")]
    NotPermitted(String),
}

/// Broad operation-level check.
///
/// - No required roles: any authenticated caller passes.
/// - Otherwise the caller must be present and hold one of `required`.
///
/// Returns the principal on success so call sites can keep using it.
pub fn authorize<'a>(
    principal: Option<&'a Principal>,
    required: &[Role],
) -> Result<&'a Principal, AuthzError> {
    let principal = principal.ok_or(AuthzError::Unauthenticated)?;

    if required.is_empty() || required.contains(&principal.role) {
        Ok(principal)
    } else {
        Err(AuthzError::MissingRole {
            required: join_roles(required),
            actual: principal.role,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resource-level capabilities
// ─────────────────────────────────────────────────────────────────────────────

/// What the caller wants to do with a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// See it: owner or anyone it was shared with.
    Read,
    /// Change or delete it: owner only. ADMIN gets no bypass.
    Mutate,
}

/// A resource with an owner and, optionally, extra readers.
pub trait Protected {
    /// Human-readable kind used in denial messages ("task", "comment").
    const KIND: &'static str;

    fn owner(&self) -> UserId;

    /// Users besides the owner who may read the resource.
    fn readers(&self) -> &[UserId] {
        &[]
    }
}

/// Role check followed by the ownership/sharing check for `capability`.
pub fn check_capability<'a, R>(
    principal: Option<&'a Principal>,
    required: &[Role],
    resource: &R,
    capability: Capability,
) -> Result<&'a Principal, AuthzError>
where
    R: Protected + ?Sized,
{
    let principal = authorize(principal, required)?;

    let is_owner = principal.id == resource.owner();
    let allowed = match capability {
        Capability::Mutate => is_owner,
        Capability::Read => is_owner || resource.readers().contains(&principal.id),
    };

    if allowed {
        Ok(principal)
    } else {
        Err(AuthzError::NotPermitted(match capability {
            Capability::Read => format!("you can't access this {}", R::KIND),
            Capability::Mutate => format!("you are not the owner of this {}", R::KIND),
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation
// ─────────────────────────────────────────────────────────────────────────────

/// Structured record of one operation-level decision, for logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationExplanation {
    pub granted: bool,
    pub reason: String,
    pub principal: Option<UserId>,
    pub role: Option<Role>,
    pub required_roles: Vec<Role>,
}

/// Same decision as [`authorize`], with the reasoning spelled out.
pub fn explain(principal: Option<&Principal>, required: &[Role]) -> AuthorizationExplanation {
    let granted = authorize(principal, required).is_ok();
    let reason = match (principal, required.is_empty()) {
        (None, _) => "anonymous caller".to_string(),
        (Some(_), true) => "any authenticated caller is allowed".to_string(),
        (Some(p), false) if granted => format!("role {} is among the required roles", p.role),
        (Some(p), false) => format!(
            "role {} is not among the required roles ({})",
            p.role,
            join_roles(required)
        ),
    };

    AuthorizationExplanation {
        granted,
        reason,
        principal: principal.map(|p| p.id),
        role: principal.map(|p| p.role),
        required_roles: required.to_vec(),
    }
}

fn join_roles(roles: &[Role]) -> String {
    roles.iter().map(Role::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct Doc {
        owner: UserId,
        readers: Vec<UserId>,
    }

    impl Protected for Doc {
        const KIND: &'static str = "doc";

        fn owner(&self) -> UserId {
            self.owner
        }

        fn readers(&self) -> &[UserId] {
            &self.readers
        }
    }

    fn principal(role: Role) -> Principal {
        Principal::new(UserId::new(), "someone", role)
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::Admin), Just(Role::Basic)]
    }

    fn any_required() -> impl Strategy<Value = Vec<Role>> {
        prop::collection::vec(any_role(), 0..3)
    }

    #[test]
    fn anonymous_is_always_denied() {
        assert_eq!(authorize(None, &[]), Err(AuthzError::Unauthenticated));
        assert_eq!(authorize(None, &[Role::Admin]), Err(AuthzError::Unauthenticated));
    }

    #[test]
    fn basic_cannot_pass_admin_gate() {
        let p = principal(Role::Basic);
        let err = authorize(Some(&p), &[Role::Admin]).unwrap_err();
        assert_eq!(
            err,
            AuthzError::MissingRole {
                required: "ADMIN".into(),
                actual: Role::Basic
            }
        );
    }

    #[test]
    fn admin_passes_admin_gate() {
        let p = principal(Role::Admin);
        assert_eq!(authorize(Some(&p), &[Role::Admin]), Ok(&p));
    }

    #[test]
    fn read_allows_owner_and_readers_only() {
        let owner = principal(Role::Basic);
        let reader = principal(Role::Basic);
        let stranger = principal(Role::Admin);
        let doc = Doc {
            owner: owner.id,
            readers: vec![owner.id, reader.id],
        };

        assert!(check_capability(Some(&owner), &[], &doc, Capability::Read).is_ok());
        assert!(check_capability(Some(&reader), &[], &doc, Capability::Read).is_ok());
        let err = check_capability(Some(&stranger), &[], &doc, Capability::Read).unwrap_err();
        assert_eq!(err, AuthzError::NotPermitted("you can't access this doc".into()));
    }

    #[test]
    fn mutate_is_owner_only_even_for_admin_and_readers() {
        let owner = principal(Role::Basic);
        let reader = principal(Role::Basic);
        let admin = principal(Role::Admin);
        let doc = Doc {
            owner: owner.id,
            readers: vec![owner.id, reader.id],
        };

        assert!(check_capability(Some(&owner), &[], &doc, Capability::Mutate).is_ok());
        assert!(check_capability(Some(&reader), &[], &doc, Capability::Mutate).is_err());
        assert!(check_capability(Some(&admin), &[], &doc, Capability::Mutate).is_err());
    }

    #[test]
    fn capability_check_applies_role_gate_first() {
        let owner = principal(Role::Basic);
        let doc = Doc {
            owner: owner.id,
            readers: vec![],
        };
        assert!(matches!(
            check_capability(Some(&owner), &[Role::Admin], &doc, Capability::Read),
            Err(AuthzError::MissingRole { .. })
        ));
        assert_eq!(
            check_capability(None, &[], &doc, Capability::Read),
            Err(AuthzError::Unauthenticated)
        );
    }

    #[test]
    fn explanation_matches_decision() {
        let p = principal(Role::Basic);
        let e = explain(Some(&p), &[Role::Admin]);
        assert!(!e.granted);
        assert_eq!(e.role, Some(Role::Basic));
        assert!(e.reason.contains("not among"));

        let e = explain(None, &[]);
        assert!(!e.granted);
        assert_eq!(e.principal, None);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: a BASIC caller never passes an ADMIN-only gate.
        #[test]
        fn basic_never_passes_admin_only(_seed in any::<u8>()) {
            let p = principal(Role::Basic);
            prop_assert!(authorize(Some(&p), &[Role::Admin]).is_err());
        }

        /// Property: with no required roles, the decision is exactly "is authenticated".
        #[test]
        fn empty_roles_means_authenticated(role in any_role(), present in any::<bool>()) {
            let p = principal(role);
            let caller = present.then_some(&p);
            prop_assert_eq!(authorize(caller, &[]).is_ok(), present);
        }

        /// Property: the decision is membership of the caller's role in the required set.
        #[test]
        fn decision_is_role_membership(role in any_role(), required in any_required()) {
            let p = principal(role);
            let expected = required.is_empty() || required.contains(&role);
            prop_assert_eq!(authorize(Some(&p), &required).is_ok(), expected);
            prop_assert_eq!(explain(Some(&p), &required).granted, expected);
        }
    }
}
