//! Authentication logic contract.
//!
//! Concrete backends (session login, social login, ...) live outside this
//! crate; the security context only ever talks to these traits.

use thiserror::Error;

use warden_core::{SecurityDomain, SecurityResult};

use crate::roles::RoleSet;

/// Performs login/logout and reports the current principal.
///
/// `User` is the principal type; the security context never inspects it.
pub trait AuthLogic: Send {
    type User;

    fn set_domain(&mut self, domain: &SecurityDomain);

    fn login(&mut self, user: Self::User) -> SecurityResult<()>;

    fn logout(&mut self) -> SecurityResult<()>;

    fn is_authenticated(&self) -> bool;

    fn current_user(&self) -> Option<Self::User>;

    /// Capability check for role preloading.
    ///
    /// Implementations that also implement [`RolePreloadable`] override this
    /// to return `Some(self)`.
    fn as_role_preloadable(&mut self) -> Option<&mut dyn RolePreloadable> {
        None
    }
}

/// Optional capability: the authentication provider can supply roles of its
/// own (e.g. groups attached to a social-login profile).
pub trait RolePreloadable {
    /// Whether preloading is possible right now (typically: a principal is
    /// authenticated).
    fn is_role_preloadable(&self) -> bool;

    fn preload_roles(&mut self) -> Result<RoleSet, PreloadError>;
}

/// Recoverable failure while fetching supplemental roles.
#[derive(Debug, Error)]
pub enum PreloadError {
    #[error("role preload fetch failed: {0}")]
    Fetch(#[source] anyhow::Error),
}

impl PreloadError {
    pub fn fetch(cause: impl Into<anyhow::Error>) -> Self {
        Self::Fetch(cause.into())
    }
}
