//! Role-derived capabilities.
//!
//! An [`Actor`] carries who is performing an operation and what they are
//! allowed to do. Capabilities are computed once from the role list and passed
//! explicitly into the lifecycle state machine; nothing here reads ambient
//! state.

use super::record::UserRef;

/// The administrator role name in the external identity provider.
pub const ROLE_ADMIN: &str = "Admin";
/// The quality/HSE role name.
pub const ROLE_QHSE: &str = "QHSE";
/// The approver role name.
pub const ROLE_APPROVER: &str = "Approver";
/// The author role name.
pub const ROLE_AUTHOR: &str = "Author";

/// A capability set derived from an actor's roles.
///
/// Pure set-membership checks; deriving the set twice from the same roles
/// yields the same result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Actor holds the `Admin` role.
    pub is_admin: bool,
    /// Actor holds the `QHSE` role.
    pub is_qhse: bool,
    /// Actor holds the `Approver` role.
    pub is_approver: bool,
    /// Actor holds the `Author` role.
    pub is_author: bool,
}

impl Capabilities {
    /// Derives the capability set from a role list.
    #[must_use]
    pub fn from_roles<S: AsRef<str>>(roles: &[S]) -> Self {
        let has = |role: &str| roles.iter().any(|r| r.as_ref() == role);
        Self {
            is_admin: has(ROLE_ADMIN),
            is_qhse: has(ROLE_QHSE),
            is_approver: has(ROLE_APPROVER),
            is_author: has(ROLE_AUTHOR),
        }
    }

    /// Whether the actor may approve documents under review.
    #[must_use]
    pub const fn can_approve(self) -> bool {
        self.is_approver
    }

    /// Whether the actor may publish approved documents.
    #[must_use]
    pub const fn can_publish(self) -> bool {
        self.is_admin || self.is_qhse
    }

    /// Whether the actor may perform administrative operations such as
    /// marking documents obsolete or deleting them.
    #[must_use]
    pub const fn can_administer(self) -> bool {
        self.is_admin
    }

    /// Whether the actor may create drafts and submit them for review.
    /// Administrators implicitly author.
    #[must_use]
    pub const fn can_author(self) -> bool {
        self.is_author || self.is_admin
    }
}

/// Picks the highest-priority role present, for display and auditing.
///
/// Priority order is `Admin > QHSE > Approver > Author`; when none of the
/// known roles is present, the first role in the list is returned.
#[must_use]
pub fn preferred_role(roles: &[String]) -> Option<&str> {
    for candidate in [ROLE_ADMIN, ROLE_QHSE, ROLE_APPROVER, ROLE_AUTHOR] {
        if roles.iter().any(|r| r == candidate) {
            return Some(candidate);
        }
    }
    roles.first().map(String::as_str)
}

/// Whether the actor holds at least one of the given roles.
#[must_use]
pub fn has_any_role(roles: &[String], required: &[&str]) -> bool {
    required.iter().any(|req| roles.iter().any(|r| r == req))
}

/// Whether the actor holds every one of the given roles.
#[must_use]
pub fn has_all_roles(roles: &[String], required: &[&str]) -> bool {
    required.iter().all(|req| roles.iter().any(|r| r == req))
}

/// An authenticated actor: identity, roles, and the capabilities derived from
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Who is acting.
    pub user: UserRef,
    /// Role names as reported by the identity provider.
    pub roles: Vec<String>,
    /// Capabilities derived from `roles` at construction time.
    pub capabilities: Capabilities,
}

impl Actor {
    /// Creates an actor, deriving capabilities from the role list.
    #[must_use]
    pub fn new(user: UserRef, roles: Vec<String>) -> Self {
        let capabilities = Capabilities::from_roles(&roles);
        Self {
            user,
            roles,
            capabilities,
        }
    }

    /// The actor's preferred role for display, if any role is present.
    #[must_use]
    pub fn preferred_role(&self) -> Option<&str> {
        preferred_role(&self.roles)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn capabilities_from_role_membership() {
        let caps = Capabilities::from_roles(&roles(&["Approver", "Author"]));
        assert!(caps.is_approver);
        assert!(caps.is_author);
        assert!(!caps.is_admin);
        assert!(!caps.is_qhse);
    }

    #[test]
    fn unknown_roles_grant_nothing() {
        let caps = Capabilities::from_roles(&roles(&["Guest", "admin"]));
        assert_eq!(caps, Capabilities::default());
        assert!(!caps.can_author());
    }

    #[test]
    fn admin_implies_publish_and_author() {
        let caps = Capabilities::from_roles(&roles(&["Admin"]));
        assert!(caps.can_publish());
        assert!(caps.can_author());
        assert!(caps.can_administer());
        assert!(!caps.can_approve());
    }

    #[test]
    fn qhse_publishes_but_does_not_administer() {
        let caps = Capabilities::from_roles(&roles(&["QHSE"]));
        assert!(caps.can_publish());
        assert!(!caps.can_administer());
    }

    #[test_case(&["Author", "Admin"], Some("Admin"); "admin wins")]
    #[test_case(&["Author", "QHSE"], Some("QHSE"); "qhse beats author")]
    #[test_case(&["Author", "Approver"], Some("Approver"); "approver beats author")]
    #[test_case(&["Author"], Some("Author"); "author alone")]
    #[test_case(&["Guest", "Visitor"], Some("Guest"); "first unknown role")]
    #[test_case(&[], None; "no roles")]
    fn preferred_role_priority(input: &[&str], expected: Option<&str>) {
        assert_eq!(preferred_role(&roles(input)), expected);
    }

    #[test]
    fn any_and_all_role_predicates() {
        let r = roles(&["Author", "Approver"]);
        assert!(has_any_role(&r, &["Admin", "Approver"]));
        assert!(!has_any_role(&r, &["Admin", "QHSE"]));
        assert!(has_all_roles(&r, &["Author", "Approver"]));
        assert!(!has_all_roles(&r, &["Author", "Admin"]));
    }

    #[test]
    fn actor_derives_capabilities_once() {
        let actor = Actor::new(UserRef::system(), roles(&["Approver"]));
        assert!(actor.capabilities.can_approve());
        assert_eq!(actor.preferred_role(), Some("Approver"));
    }
}
