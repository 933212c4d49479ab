//! Per-request security context.
//!
//! The context owns the configuration of one protected domain and wires the
//! collaborators (auth logic, role manager, HTTP auth strategies, previous-URL
//! holder) into a single authentication/authorization facade.
//!
//! Lifecycle:
//! 1. configure (domain, allowed roles, HTTPS flag, ...)
//! 2. bind collaborators
//! 3. [`SecurityContext::fix_domain`]
//! 4. query/mutate authentication and role state
//!
//! Role, authentication and bound previous-URL operations are rejected with
//! [`SecurityError::DomainNotFixed`] until step 3 has run, so collaborators are
//! never read under their default namespace by accident.

use std::borrow::Cow;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use warden_core::{SecurityDomain, SecurityError, SecurityResult};

use crate::auth_logic::AuthLogic;
use crate::http_auth::{HttpAuth, HttpAuthRegistry};
use crate::previous_url::PreviousUrlHolder;
use crate::role_manager::RoleManager;
use crate::roles::{IntoRoles, RoleSet};

/// Where an unauthenticated request is sent (e.g. a login handler).
///
/// Opaque to the context; the routing layer interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForwardingTarget(Cow<'static, str>);

impl ForwardingTarget {
    pub fn new(target: impl Into<Cow<'static, str>>) -> Self {
        Self(target.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ForwardingTarget {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ForwardingTarget {
    fn from(value: &str) -> Self {
        Self(Cow::Owned(value.to_owned()))
    }
}

impl From<String> for ForwardingTarget {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

/// Security state of one domain, generic over the principal type `U` of the
/// bound auth logic.
pub struct SecurityContext<U> {
    secure: bool,
    domain: SecurityDomain,
    domain_fixed: bool,
    https_required: bool,
    allowed_roles: RoleSet,
    options: Map<String, Value>,
    forwarding_target: Option<ForwardingTarget>,
    auth_logic: Option<Box<dyn AuthLogic<User = U>>>,
    role_manager: Option<Box<dyn RoleManager>>,
    http_auths: HttpAuthRegistry,
    previous_url_holder: Option<Box<dyn PreviousUrlHolder>>,
}

impl<U> Default for SecurityContext<U> {
    fn default() -> Self {
        Self {
            secure: false,
            domain: SecurityDomain::default(),
            domain_fixed: false,
            https_required: false,
            allowed_roles: RoleSet::new(),
            options: Map::new(),
            forwarding_target: None,
            auth_logic: None,
            role_manager: None,
            http_auths: HttpAuthRegistry::new(),
            previous_url_holder: None,
        }
    }
}

impl<U> core::fmt::Debug for SecurityContext<U> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SecurityContext")
            .field("secure", &self.secure)
            .field("domain", &self.domain)
            .field("domain_fixed", &self.domain_fixed)
            .field("https_required", &self.https_required)
            .field("allowed_roles", &self.allowed_roles)
            .field("forwarding_target", &self.forwarding_target)
            .field("auth_logic", &self.auth_logic.is_some())
            .field("role_manager", &self.role_manager.is_some())
            .field("http_auths", &self.http_auths.len())
            .field("previous_url_holder", &self.previous_url_holder.is_some())
            .finish_non_exhaustive()
    }
}

impl<U> SecurityContext<U> {
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Configuration
    // ─────────────────────────────────────────────────────────────────────

    pub fn set_secure(&mut self, secure: bool) {
        self.secure = secure;
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn set_allowed_roles(&mut self, roles: impl IntoRoles) {
        self.allowed_roles = roles.into_roles();
    }

    pub fn allowed_roles(&self) -> &RoleSet {
        &self.allowed_roles
    }

    /// Change the domain name. Re-setting the fixed domain is a no-op; any
    /// other change after [`fix_domain`](Self::fix_domain) is rejected.
    pub fn set_domain(&mut self, domain: SecurityDomain) -> SecurityResult<()> {
        if self.domain_fixed && domain != self.domain {
            return Err(SecurityError::DomainAlreadyFixed(self.domain.to_string()));
        }

        self.domain = domain;
        Ok(())
    }

    pub fn domain(&self) -> &SecurityDomain {
        &self.domain
    }

    pub fn set_https_required(&mut self, https_required: bool) {
        self.https_required = https_required;
    }

    pub fn is_https_required(&self) -> bool {
        self.https_required
    }

    pub fn set_options(&mut self, options: Map<String, Value>) {
        self.options = options;
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub fn set_forwarding_target(&mut self, target: impl Into<ForwardingTarget>) {
        self.forwarding_target = Some(target.into());
    }

    pub fn forwarding_target(&self) -> Option<&ForwardingTarget> {
        self.forwarding_target.as_ref()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Collaborators
    // ─────────────────────────────────────────────────────────────────────

    /// Bind the authentication logic. Once the domain is fixed, the new
    /// collaborator is bound to it immediately.
    pub fn set_auth_logic(&mut self, auth_logic: impl AuthLogic<User = U> + 'static) {
        let mut auth_logic: Box<dyn AuthLogic<User = U>> = Box::new(auth_logic);
        if self.domain_fixed {
            auth_logic.set_domain(&self.domain);
        }
        self.auth_logic = Some(auth_logic);
    }

    pub fn auth_logic(&self) -> Option<&dyn AuthLogic<User = U>> {
        self.auth_logic.as_deref()
    }

    pub fn set_role_manager(&mut self, role_manager: impl RoleManager + 'static) {
        let mut role_manager: Box<dyn RoleManager> = Box::new(role_manager);
        if self.domain_fixed {
            role_manager.set_domain(&self.domain);
        }
        self.role_manager = Some(role_manager);
    }

    pub fn role_manager(&self) -> Option<&dyn RoleManager> {
        self.role_manager.as_deref()
    }

    pub fn set_previous_url_holder(&mut self, holder: impl PreviousUrlHolder + 'static) {
        let mut holder: Box<dyn PreviousUrlHolder> = Box::new(holder);
        if self.domain_fixed {
            holder.setup(&self.domain);
        }
        self.previous_url_holder = Some(holder);
    }

    pub fn previous_url_holder(&self) -> Option<&dyn PreviousUrlHolder> {
        self.previous_url_holder.as_deref()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Domain fixing
    // ─────────────────────────────────────────────────────────────────────

    /// Bind every collaborator to the current domain and latch it.
    ///
    /// Idempotent: once fixed, further calls change nothing.
    pub fn fix_domain(&mut self) {
        if self.domain_fixed {
            return;
        }

        if let Some(auth_logic) = self.auth_logic.as_deref_mut() {
            auth_logic.set_domain(&self.domain);
        }
        if let Some(role_manager) = self.role_manager.as_deref_mut() {
            role_manager.set_domain(&self.domain);
        }
        if let Some(holder) = self.previous_url_holder.as_deref_mut() {
            holder.setup(&self.domain);
        }

        self.domain_fixed = true;
        debug!(domain = %self.domain, "security domain fixed");
    }

    pub fn is_domain_fixed(&self) -> bool {
        self.domain_fixed
    }

    fn ensure_bound(&self, bound: bool, collaborator: &'static str) -> SecurityResult<()> {
        if !bound {
            return Err(SecurityError::missing(collaborator));
        }
        if !self.domain_fixed {
            return Err(SecurityError::DomainNotFixed);
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Authentication
    // ─────────────────────────────────────────────────────────────────────

    fn auth_logic_mut(&mut self) -> SecurityResult<&mut (dyn AuthLogic<User = U> + 'static)> {
        self.ensure_bound(self.auth_logic.is_some(), "auth logic")?;
        self.auth_logic
            .as_deref_mut()
            .ok_or(SecurityError::missing("auth logic"))
    }

    pub fn login(&mut self, user: U) -> SecurityResult<()> {
        self.auth_logic_mut()?.login(user)?;
        debug!(domain = %self.domain, "principal logged in");
        Ok(())
    }

    /// Log out, clearing roles before the identity is dropped.
    pub fn logout(&mut self) -> SecurityResult<()> {
        self.ensure_bound(self.auth_logic.is_some(), "auth logic")?;

        if let Some(role_manager) = self.role_manager.as_deref_mut() {
            role_manager.clear_roles()?;
        }
        self.auth_logic_mut()?.logout()?;

        debug!(domain = %self.domain, "principal logged out");
        Ok(())
    }

    /// False when no auth logic is bound or the domain is not fixed yet.
    pub fn is_authenticated(&self) -> bool {
        match self.auth_logic.as_deref() {
            Some(auth_logic) if self.domain_fixed => auth_logic.is_authenticated(),
            _ => false,
        }
    }

    /// `None` when no auth logic is bound or the domain is not fixed yet.
    pub fn current_user(&self) -> Option<U> {
        match self.auth_logic.as_deref() {
            Some(auth_logic) if self.domain_fixed => auth_logic.current_user(),
            _ => None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // HTTP authentication
    // ─────────────────────────────────────────────────────────────────────

    /// Register a named strategy; an existing one with the same name is
    /// replaced.
    pub fn enable_http_auth(&mut self, name: impl Into<String>, strategy: Arc<dyn HttpAuth>) {
        self.http_auths.enable(name, strategy);
    }

    pub fn http_auth(&self, name: &str) -> SecurityResult<Arc<dyn HttpAuth>> {
        self.http_auths.get(name)
    }

    pub fn uses_http_auth(&self) -> bool {
        !self.http_auths.is_empty()
    }

    pub fn http_auths(&self) -> &HttpAuthRegistry {
        &self.http_auths
    }

    // ─────────────────────────────────────────────────────────────────────
    // Roles
    // ─────────────────────────────────────────────────────────────────────

    fn role_manager_mut(&mut self) -> SecurityResult<&mut (dyn RoleManager + 'static)> {
        self.ensure_bound(self.role_manager.is_some(), "role manager")?;
        self.role_manager
            .as_deref_mut()
            .ok_or(SecurityError::missing("role manager"))
    }

    /// True when `roles` is empty or the principal holds at least one of them.
    ///
    /// An empty query passes without consulting any collaborator.
    pub fn has_role(&mut self, roles: impl IntoRoles) -> SecurityResult<bool> {
        let roles = roles.into_roles();
        if roles.is_empty() {
            return Ok(true);
        }
        self.ensure_bound(self.role_manager.is_some(), "role manager")?;
        self.preload_roles()?;
        self.role_manager_mut()?.has_role(&roles)
    }

    pub fn has_allowed_roles(&mut self) -> SecurityResult<bool> {
        let allowed = self.allowed_roles.clone();
        self.has_role(allowed)
    }

    pub fn roles(&mut self) -> SecurityResult<RoleSet> {
        self.ensure_bound(self.role_manager.is_some(), "role manager")?;
        self.preload_roles()?;
        self.role_manager_mut()?.roles()
    }

    pub fn set_roles(&mut self, roles: impl IntoRoles) -> SecurityResult<()> {
        self.role_manager_mut()?.set_roles(roles.into_roles())
    }

    pub fn add_roles(&mut self, roles: impl IntoRoles) -> SecurityResult<()> {
        self.role_manager_mut()?.add_roles(roles.into_roles())
    }

    pub fn clear_roles(&mut self) -> SecurityResult<()> {
        self.role_manager_mut()?.clear_roles()
    }

    /// Merge roles supplied by the authentication provider, once.
    ///
    /// Fetch failures are logged and swallowed: checks continue with the
    /// roles already known and the preloaded marker stays unset, so a later
    /// call retries. Role storage failures still propagate.
    fn preload_roles(&mut self) -> SecurityResult<()> {
        let Some(preloadable) = self
            .auth_logic
            .as_deref_mut()
            .and_then(|auth_logic| auth_logic.as_role_preloadable())
        else {
            return Ok(());
        };
        let Some(role_manager) = self.role_manager.as_deref_mut() else {
            return Ok(());
        };

        if !preloadable.is_role_preloadable() || role_manager.is_preloaded()? {
            return Ok(());
        }

        match preloadable.preload_roles() {
            Ok(roles) => {
                debug!(domain = %self.domain, count = roles.len(), "preloaded roles");
                role_manager.add_roles(roles)?;
                role_manager.set_preloaded()?;
            }
            Err(err) => {
                warn!(domain = %self.domain, error = %err, "role preload failed, using known roles");
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Previous URL
    // ─────────────────────────────────────────────────────────────────────

    /// A bound holder is only usable once it shares the fixed domain; without
    /// a holder the previous-URL operations stay inert.
    fn ensure_previous_url_usable(&self) -> SecurityResult<()> {
        if self.previous_url_holder.is_some() && !self.domain_fixed {
            return Err(SecurityError::DomainNotFixed);
        }
        Ok(())
    }

    pub fn has_previous_url(&self) -> SecurityResult<bool> {
        self.ensure_previous_url_usable()?;
        match self.previous_url_holder.as_deref() {
            Some(holder) => holder.has(),
            None => Ok(false),
        }
    }

    pub fn set_previous_url(&mut self, url: &str) -> SecurityResult<()> {
        self.ensure_previous_url_usable()?;
        match self.previous_url_holder.as_deref_mut() {
            Some(holder) => holder.set(url),
            None => Ok(()),
        }
    }

    pub fn previous_url(&self) -> SecurityResult<Option<String>> {
        self.ensure_previous_url_usable()?;
        match self.previous_url_holder.as_deref() {
            Some(holder) => holder.get(),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::previous_url::SessionPreviousUrlHolder;
    use crate::role_manager::SessionRoleManager;
    use crate::session::{InMemorySessionStore, SessionStore};
    use serde_json::json;

    type Context = SecurityContext<String>;

    fn admin() -> SecurityDomain {
        SecurityDomain::new("admin").unwrap()
    }

    #[test]
    fn defaults_match_an_unconfigured_domain() {
        let ctx = Context::new();

        assert!(!ctx.is_secure());
        assert_eq!(ctx.domain().as_str(), "secured");
        assert!(!ctx.is_domain_fixed());
        assert!(!ctx.is_https_required());
        assert!(ctx.allowed_roles().is_empty());
        assert!(ctx.options().is_empty());
        assert!(ctx.forwarding_target().is_none());
        assert!(!ctx.uses_http_auth());
    }

    #[test]
    fn configuration_round_trips_through_accessors() {
        let mut ctx = Context::new();
        ctx.set_secure(true);
        ctx.set_https_required(true);
        ctx.set_allowed_roles(["ADMIN", "EDITOR"]);
        ctx.set_forwarding_target("AdminController::login");

        let mut options = Map::new();
        options.insert("remember_me".into(), json!(true));
        ctx.set_options(options);

        assert!(ctx.is_secure());
        assert!(ctx.is_https_required());
        assert_eq!(ctx.allowed_roles(), &["ADMIN", "EDITOR"].into_roles());
        assert_eq!(
            ctx.forwarding_target().map(ForwardingTarget::as_str),
            Some("AdminController::login")
        );
        assert_eq!(ctx.option("remember_me"), Some(&json!(true)));
    }

    #[test]
    fn fix_domain_binds_collaborators_once() {
        let session = Arc::new(InMemorySessionStore::new());

        let mut ctx = Context::new();
        ctx.set_domain(admin()).unwrap();
        ctx.set_role_manager(SessionRoleManager::new(session.clone()));
        ctx.set_previous_url_holder(SessionPreviousUrlHolder::new(session.clone()));
        ctx.fix_domain();
        ctx.fix_domain();

        ctx.set_roles("EDITOR").unwrap();
        ctx.set_previous_url("/admin/users").unwrap();

        assert!(ctx.is_domain_fixed());
        assert_eq!(
            session.keys().unwrap(),
            vec!["admin/previous_url".to_string(), "admin/role/roles".to_string()]
        );
    }

    #[test]
    fn domain_cannot_change_after_fixing() {
        let mut ctx = Context::new();
        ctx.set_domain(admin()).unwrap();
        ctx.fix_domain();

        assert_eq!(
            ctx.set_domain(SecurityDomain::new("member").unwrap()),
            Err(SecurityError::DomainAlreadyFixed("admin".into()))
        );
        assert_eq!(ctx.set_domain(admin()), Ok(()));
        assert_eq!(ctx.domain(), &admin());
    }

    #[test]
    fn collaborators_bound_after_fixing_join_the_fixed_domain() {
        let session = Arc::new(InMemorySessionStore::new());

        let mut ctx = Context::new();
        ctx.set_domain(admin()).unwrap();
        ctx.fix_domain();
        ctx.set_role_manager(SessionRoleManager::new(session.clone()));

        ctx.set_roles("EDITOR").unwrap();

        assert!(session.get("admin/role/roles").unwrap().is_some());
        assert!(session.get("secured/role/roles").unwrap().is_none());
    }

    #[test]
    fn role_operations_require_a_fixed_domain() {
        let session = Arc::new(InMemorySessionStore::new());

        let mut ctx = Context::new();
        ctx.set_role_manager(SessionRoleManager::new(session));

        assert_eq!(ctx.has_role("EDITOR"), Err(SecurityError::DomainNotFixed));
        assert_eq!(ctx.set_roles("EDITOR"), Err(SecurityError::DomainNotFixed));
        assert_eq!(ctx.roles(), Err(SecurityError::DomainNotFixed));
    }

    #[test]
    fn role_operations_without_role_manager_fail() {
        let mut ctx = Context::new();
        ctx.fix_domain();

        assert_eq!(
            ctx.has_role("EDITOR"),
            Err(SecurityError::MissingCollaborator("role manager"))
        );
        assert_eq!(
            ctx.clear_roles(),
            Err(SecurityError::MissingCollaborator("role manager"))
        );
    }

    #[test]
    fn previous_url_is_inert_without_holder() {
        let mut ctx = Context::new();

        assert!(!ctx.has_previous_url().unwrap());
        ctx.set_previous_url("/somewhere").unwrap();
        assert_eq!(ctx.previous_url().unwrap(), None);
    }

    #[test]
    fn previous_url_requires_a_fixed_domain_once_a_holder_is_bound() {
        let session = Arc::new(InMemorySessionStore::new());

        let mut ctx = Context::new();
        ctx.set_domain(admin()).unwrap();
        ctx.set_previous_url_holder(SessionPreviousUrlHolder::new(session.clone()));

        assert_eq!(
            ctx.set_previous_url("/admin/secret"),
            Err(SecurityError::DomainNotFixed)
        );
        assert_eq!(ctx.has_previous_url(), Err(SecurityError::DomainNotFixed));
        assert_eq!(ctx.previous_url(), Err(SecurityError::DomainNotFixed));
        assert!(session.keys().unwrap().is_empty());

        ctx.fix_domain();
        assert_eq!(ctx.previous_url(), Ok(None));
    }

    #[test]
    fn previous_url_holder_bound_after_fixing_uses_the_fixed_domain() {
        let session = Arc::new(InMemorySessionStore::new());

        let mut ctx = Context::new();
        ctx.set_domain(admin()).unwrap();
        ctx.fix_domain();
        ctx.set_previous_url_holder(SessionPreviousUrlHolder::new(session.clone()));

        ctx.set_previous_url("/admin/users").unwrap();

        assert_eq!(session.keys().unwrap(), vec!["admin/previous_url".to_string()]);
        assert_eq!(ctx.previous_url().unwrap().as_deref(), Some("/admin/users"));
    }

    #[test]
    fn empty_role_queries_pass_without_collaborators() {
        let mut ctx = Context::new();

        assert_eq!(ctx.has_role(RoleSet::new()), Ok(true));
        assert_eq!(ctx.has_allowed_roles(), Ok(true));

        ctx.set_allowed_roles("ADMIN");
        assert_eq!(
            ctx.has_allowed_roles(),
            Err(SecurityError::MissingCollaborator("role manager"))
        );
    }

    #[test]
    fn previous_url_delegates_to_holder() {
        let session = Arc::new(InMemorySessionStore::new());

        let mut ctx = Context::new();
        ctx.set_previous_url_holder(SessionPreviousUrlHolder::new(session));
        ctx.fix_domain();

        ctx.set_previous_url("/secured/profile").unwrap();

        assert!(ctx.has_previous_url().unwrap());
        assert_eq!(ctx.previous_url().unwrap().as_deref(), Some("/secured/profile"));
    }
}
