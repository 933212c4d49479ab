//! Declarative per-domain security configuration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use warden_core::{SecurityDomain, SecurityResult};

use crate::context::{ForwardingTarget, SecurityContext};
use crate::roles::RoleSet;

/// Security settings for a group of handlers, as declared by the wiring layer.
///
/// ```ignore
/// {
///   "domain": "admin",
///   "httpsRequired": true,
///   "allow": ["ADMIN"],
///   "auth": "session",
///   "roleManager": "session",
///   "forward": "AdminController::login"
/// }
/// ```
///
/// `auth` and `roleManager` name the strategies the wiring layer should bind;
/// they are carried here but never resolved by the context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecureConfig {
    pub disabled: bool,
    pub domain: Option<SecurityDomain>,
    pub https_required: Option<bool>,
    pub allow: RoleSet,
    pub options: Map<String, Value>,
    pub forward: Option<ForwardingTarget>,
    pub auth: Option<String>,
    pub role_manager: Option<String>,
}

impl SecureConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Copy the declared settings onto `ctx`. Unset fields leave the context
    /// untouched, except `secure`, which always follows `disabled`.
    ///
    /// Fails with `DomainAlreadyFixed` when it would move a fixed context to
    /// another domain.
    pub fn apply<U>(&self, ctx: &mut SecurityContext<U>) -> SecurityResult<()> {
        if let Some(domain) = &self.domain {
            ctx.set_domain(domain.clone())?;
        }

        ctx.set_secure(!self.disabled);

        if let Some(https_required) = self.https_required {
            ctx.set_https_required(https_required);
        }
        if !self.allow.is_empty() {
            ctx.set_allowed_roles(&self.allow);
        }
        if !self.options.is_empty() {
            ctx.set_options(self.options.clone());
        }
        if let Some(forward) = &self.forward {
            ctx.set_forwarding_target(forward.clone());
        }

        Ok(())
    }
}
