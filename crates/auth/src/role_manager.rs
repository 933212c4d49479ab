//! Role storage contract and its session-backed reference implementation.

use std::sync::Arc;

use warden_core::{SecurityDomain, SecurityResult};

use crate::roles::RoleSet;
use crate::session::{self, SessionStore};

/// Stores and queries the role set of the current principal within one
/// security domain.
///
/// The `preloaded` marker records that supplemental roles from the
/// authentication provider were already merged in, so the context does not
/// fetch them again.
pub trait RoleManager: Send {
    fn set_domain(&mut self, domain: &SecurityDomain);

    /// True when `roles` is empty or shares at least one role with the
    /// granted set.
    fn has_role(&self, roles: &RoleSet) -> SecurityResult<bool> {
        if roles.is_empty() {
            return Ok(true);
        }

        Ok(self.roles()?.intersects(roles))
    }

    fn roles(&self) -> SecurityResult<RoleSet>;

    fn set_roles(&mut self, roles: RoleSet) -> SecurityResult<()>;

    fn add_roles(&mut self, roles: RoleSet) -> SecurityResult<()>;

    /// Drop every role and reset the preloaded marker.
    fn clear_roles(&mut self) -> SecurityResult<()>;

    fn is_preloaded(&self) -> SecurityResult<bool>;

    fn set_preloaded(&mut self) -> SecurityResult<()>;
}

/// Role manager persisting into a session store.
///
/// Keys:
/// - `"<domain>/role/roles"`: JSON array of role names (absent = no roles)
/// - `"<domain>/role/preloaded"`: bool (absent = false)
pub struct SessionRoleManager {
    session: Arc<dyn SessionStore>,
    domain: SecurityDomain,
}

impl SessionRoleManager {
    pub fn new(session: Arc<dyn SessionStore>) -> Self {
        Self {
            session,
            domain: SecurityDomain::default(),
        }
    }

    pub fn domain(&self) -> &SecurityDomain {
        &self.domain
    }

    fn roles_key(&self) -> String {
        self.domain.key("role/roles")
    }

    fn preloaded_key(&self) -> String {
        self.domain.key("role/preloaded")
    }
}

impl core::fmt::Debug for SessionRoleManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionRoleManager")
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

impl RoleManager for SessionRoleManager {
    fn set_domain(&mut self, domain: &SecurityDomain) {
        self.domain = domain.clone();
    }

    fn roles(&self) -> SecurityResult<RoleSet> {
        Ok(session::get_or(&*self.session, &self.roles_key(), RoleSet::new())?)
    }

    fn set_roles(&mut self, roles: RoleSet) -> SecurityResult<()> {
        Ok(session::put(&*self.session, &self.roles_key(), &roles)?)
    }

    fn add_roles(&mut self, roles: RoleSet) -> SecurityResult<()> {
        let mut current = self.roles()?;
        current.extend(roles);
        self.set_roles(current)
    }

    fn clear_roles(&mut self) -> SecurityResult<()> {
        self.session.remove(&self.roles_key())?;
        self.session.remove(&self.preloaded_key())?;
        Ok(())
    }

    fn is_preloaded(&self) -> SecurityResult<bool> {
        Ok(session::get_or(&*self.session, &self.preloaded_key(), false)?)
    }

    fn set_preloaded(&mut self) -> SecurityResult<()> {
        Ok(session::put(&*self.session, &self.preloaded_key(), &true)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::IntoRoles;
    use crate::session::InMemorySessionStore;
    use serde_json::json;

    fn manager_with(roles: &[&str]) -> (Arc<InMemorySessionStore>, SessionRoleManager) {
        let session = Arc::new(InMemorySessionStore::new());
        if !roles.is_empty() {
            session.set("secured/role/roles", json!(roles)).unwrap();
        }

        let mut manager = SessionRoleManager::new(session.clone());
        manager.set_domain(&SecurityDomain::new("secured").unwrap());
        (session, manager)
    }

    #[test]
    fn has_role_returns_true_if_empty_roles_is_passed() {
        let (_, manager) = manager_with(&[]);
        assert!(manager.has_role(&RoleSet::new()).unwrap());
    }

    #[test]
    fn has_role_returns_true_if_a_passed_role_is_granted() {
        let (_, manager) = manager_with(&["FOO", "BAR"]);
        assert!(manager.has_role(&"FOO".into_roles()).unwrap());
    }

    #[test]
    fn has_role_returns_true_if_passed_roles_contain_any_granted_role() {
        let (_, manager) = manager_with(&["FOO", "BAR"]);
        assert!(manager.has_role(&["BAR", "BAZ"].into_roles()).unwrap());
    }

    #[test]
    fn has_role_returns_false_if_passed_roles_do_not_contain_granted_role() {
        let (_, manager) = manager_with(&["FOO", "BAR"]);
        assert!(!manager.has_role(&"XYZ".into_roles()).unwrap());
    }

    #[test]
    fn set_roles_writes_the_namespaced_key() {
        let (session, mut manager) = manager_with(&[]);
        manager.set_roles(["FOO", "BAR"].into_roles()).unwrap();

        assert_eq!(session.get("secured/role/roles").unwrap(), Some(json!(["BAR", "FOO"])));
    }

    #[test]
    fn add_roles_merges_with_stored_roles() {
        let (session, mut manager) = manager_with(&["FOO", "BAR"]);
        manager.add_roles("BAZ".into_roles()).unwrap();

        assert_eq!(
            session.get("secured/role/roles").unwrap(),
            Some(json!(["BAR", "BAZ", "FOO"]))
        );
    }

    #[test]
    fn get_roles_reads_stored_roles() {
        let (_, manager) = manager_with(&["FOO", "BAR"]);
        assert_eq!(manager.roles().unwrap(), ["FOO", "BAR"].into_roles());
    }

    #[test]
    fn clear_roles_resets_the_preloaded_marker() {
        let (_, mut manager) = manager_with(&["FOO"]);
        manager.set_preloaded().unwrap();
        assert!(manager.is_preloaded().unwrap());

        manager.clear_roles().unwrap();

        assert!(manager.roles().unwrap().is_empty());
        assert!(!manager.is_preloaded().unwrap());
    }

    #[test]
    fn domains_do_not_share_role_state() {
        let session = Arc::new(InMemorySessionStore::new());

        let mut admin = SessionRoleManager::new(session.clone());
        admin.set_domain(&SecurityDomain::new("admin").unwrap());
        let mut member = SessionRoleManager::new(session.clone());
        member.set_domain(&SecurityDomain::new("member").unwrap());

        admin.set_roles("EDITOR".into_roles()).unwrap();

        assert!(member.roles().unwrap().is_empty());
        assert_eq!(
            session.keys().unwrap(),
            vec!["admin/role/roles".to_string()]
        );
    }
}
