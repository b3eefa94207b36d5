use crate::core::Identity;

/// Decides whether an identity may act on a resource owned by `owner_id`.
///
/// Implementations must be pure: same inputs, same answer, no I/O.
pub trait AccessGuard: Send + Sync {
    fn allow(&self, identity: &Identity, owner_id: &str) -> bool;
}

/// Ownership by identity equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerGuard;

impl AccessGuard for OwnerGuard {
    #[inline]
    fn allow(&self, identity: &Identity, owner_id: &str) -> bool {
        identity.owner_id() == owner_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_is_allowed() {
        let identity = Identity::new("u-1", "a@mail.com", true);
        assert!(OwnerGuard.allow(&identity, "u-1"));
    }

    #[test]
    fn test_other_owner_is_denied() {
        let identity = Identity::new("u-1", "a@mail.com", true);
        assert!(!OwnerGuard.allow(&identity, "u-2"));
        assert!(!OwnerGuard.allow(&identity, ""));
    }

    #[test]
    fn test_anonymous_is_denied_for_real_owners() {
        let anon = Identity::anonymous();
        for owner in ["u-1", "8c1d7c0e-41b2-4b4e-9c55-0d1f6a0e8c11", ""] {
            assert!(!OwnerGuard.allow(&anon, owner));
        }
    }

    #[test]
    fn test_guard_usable_as_trait_object() {
        let guard: Box<dyn AccessGuard> = Box::new(OwnerGuard);
        assert!(guard.allow(&Identity::new("x", "", true), "x"));
    }
}
