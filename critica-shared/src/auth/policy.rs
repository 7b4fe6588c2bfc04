/// Authorization policy engine
///
/// Every protected operation runs one of the policy functions below before
/// touching the database. Policies see the request subject (the resolved
/// user, or None for anonymous requests) and the kind of action, and return
/// a [`Decision`] that the handler converts into a response via
/// [`Decision::require`].
///
/// The split between [`AccessError::Unauthenticated`] and
/// [`AccessError::Forbidden`] is what drives the 401-versus-403 distinction:
/// an anonymous caller is told to authenticate, a known caller without the
/// capability is refused outright.
use crate::models::user::User;
use uuid::Uuid;

/// Kind of action being attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Read-only access (GET and friends)
    Safe,

    /// Anything that writes (POST, PATCH, DELETE)
    Unsafe,
}

/// Outcome of a policy check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The operation may proceed
    Allow,

    /// Refused because the caller is anonymous
    DenyUnauthenticated,

    /// Refused because the caller lacks the capability
    DenyForbidden,
}

/// Error type for failed policy checks
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// Authentication required
    #[error("Authentication required")]
    Unauthenticated,

    /// Authenticated but not permitted
    #[error("Permission denied")]
    Forbidden,
}

impl Decision {
    /// Converts the decision into a result the handler can `?` on
    pub fn require(self) -> Result<(), AccessError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::DenyUnauthenticated => Err(AccessError::Unauthenticated),
            Decision::DenyForbidden => Err(AccessError::Forbidden),
        }
    }
}

/// Reads are open to everyone; writes need an admin
///
/// Governs categories, genres and titles.
pub fn admin_or_read_only(subject: Option<&User>, action: Action) -> Decision {
    if action == Action::Safe {
        return Decision::Allow;
    }

    match subject {
        None => Decision::DenyUnauthenticated,
        Some(user) if user.is_admin() => Decision::Allow,
        Some(_) => Decision::DenyForbidden,
    }
}

/// Only admins, for reads and writes alike
///
/// Governs the user management collection.
pub fn admin_only(subject: Option<&User>) -> Decision {
    match subject {
        None => Decision::DenyUnauthenticated,
        Some(user) if user.is_admin() => Decision::Allow,
        Some(_) => Decision::DenyForbidden,
    }
}

/// Any authenticated user
///
/// Governs own-profile access and the creation of reviews and comments.
pub fn authenticated(subject: Option<&User>) -> Decision {
    match subject {
        None => Decision::DenyUnauthenticated,
        Some(_) => Decision::Allow,
    }
}

/// Reads are open; writes need the content's owner or staff
///
/// Governs mutation of existing reviews and comments. Staff means
/// moderators and admins.
pub fn owner_or_staff_or_read_only(
    subject: Option<&User>,
    action: Action,
    owner_id: Uuid,
) -> Decision {
    if action == Action::Safe {
        return Decision::Allow;
    }

    match subject {
        None => Decision::DenyUnauthenticated,
        Some(user) if user.id == owner_id || user.is_moderator_or_admin() => Decision::Allow,
        Some(_) => Decision::DenyForbidden,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;
    use chrono::Utc;

    fn user_with_role(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            username: "user_example_com".to_string(),
            first_name: None,
            last_name: None,
            bio: String::new(),
            role,
            is_active: true,
            is_superuser: false,
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_or_read_only() {
        let admin = user_with_role(UserRole::Admin);
        let moderator = user_with_role(UserRole::Moderator);
        let plain = user_with_role(UserRole::User);

        // Everyone reads
        assert_eq!(admin_or_read_only(None, Action::Safe), Decision::Allow);
        assert_eq!(
            admin_or_read_only(Some(&plain), Action::Safe),
            Decision::Allow
        );

        // Only admins write; moderators are not enough
        assert_eq!(
            admin_or_read_only(Some(&admin), Action::Unsafe),
            Decision::Allow
        );
        assert_eq!(
            admin_or_read_only(Some(&moderator), Action::Unsafe),
            Decision::DenyForbidden
        );
        assert_eq!(
            admin_or_read_only(Some(&plain), Action::Unsafe),
            Decision::DenyForbidden
        );
        assert_eq!(
            admin_or_read_only(None, Action::Unsafe),
            Decision::DenyUnauthenticated
        );
    }

    #[test]
    fn test_superuser_counts_as_admin() {
        let mut superuser = user_with_role(UserRole::User);
        superuser.is_superuser = true;

        assert_eq!(admin_only(Some(&superuser)), Decision::Allow);
        assert_eq!(
            admin_or_read_only(Some(&superuser), Action::Unsafe),
            Decision::Allow
        );
    }

    #[test]
    fn test_admin_only() {
        let admin = user_with_role(UserRole::Admin);
        let moderator = user_with_role(UserRole::Moderator);
        let plain = user_with_role(UserRole::User);

        assert_eq!(admin_only(Some(&admin)), Decision::Allow);
        assert_eq!(admin_only(Some(&moderator)), Decision::DenyForbidden);
        assert_eq!(admin_only(Some(&plain)), Decision::DenyForbidden);
        assert_eq!(admin_only(None), Decision::DenyUnauthenticated);
    }

    #[test]
    fn test_authenticated() {
        let plain = user_with_role(UserRole::User);

        assert_eq!(authenticated(Some(&plain)), Decision::Allow);
        assert_eq!(authenticated(None), Decision::DenyUnauthenticated);
    }

    #[test]
    fn test_owner_or_staff_or_read_only() {
        let owner = user_with_role(UserRole::User);
        let stranger = user_with_role(UserRole::User);
        let moderator = user_with_role(UserRole::Moderator);
        let admin = user_with_role(UserRole::Admin);

        // Reads open to all, including anonymous
        assert_eq!(
            owner_or_staff_or_read_only(None, Action::Safe, owner.id),
            Decision::Allow
        );

        // Writes: owner and staff yes, strangers no
        assert_eq!(
            owner_or_staff_or_read_only(Some(&owner), Action::Unsafe, owner.id),
            Decision::Allow
        );
        assert_eq!(
            owner_or_staff_or_read_only(Some(&moderator), Action::Unsafe, owner.id),
            Decision::Allow
        );
        assert_eq!(
            owner_or_staff_or_read_only(Some(&admin), Action::Unsafe, owner.id),
            Decision::Allow
        );
        assert_eq!(
            owner_or_staff_or_read_only(Some(&stranger), Action::Unsafe, owner.id),
            Decision::DenyForbidden
        );
        assert_eq!(
            owner_or_staff_or_read_only(None, Action::Unsafe, owner.id),
            Decision::DenyUnauthenticated
        );
    }

    #[test]
    fn test_decision_require() {
        assert!(Decision::Allow.require().is_ok());
        assert!(matches!(
            Decision::DenyUnauthenticated.require(),
            Err(AccessError::Unauthenticated)
        ));
        assert!(matches!(
            Decision::DenyForbidden.require(),
            Err(AccessError::Forbidden)
        ));
    }
}
