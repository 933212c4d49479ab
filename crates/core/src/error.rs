//! Security error model.

use thiserror::Error;

/// Result type used across the security layer.
pub type SecurityResult<T> = Result<T, SecurityError>;

/// Security-layer error.
///
/// Every variant is surfaced to the caller. The only failure the security
/// context swallows (a role preload fetch) never becomes a `SecurityError`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SecurityError {
    /// An operation needed a collaborator that was never bound.
    #[error("missing collaborator: no {0} bound")]
    MissingCollaborator(&'static str),

    /// No HTTP authentication strategy is registered under this name.
    #[error("unknown http auth \"{0}\"")]
    UnknownStrategy(String),

    /// The context was used before its domain was fixed.
    #[error("security domain is not fixed")]
    DomainNotFixed,

    /// The domain was changed after being fixed.
    #[error("security domain \"{0}\" is already fixed")]
    DomainAlreadyFixed(String),

    /// A domain name failed validation.
    #[error("invalid security domain: {0}")]
    InvalidDomain(String),

    /// The backing session store failed.
    #[error("session store failure ({kind}): {message}")]
    Session {
        kind: SessionFailureKind,
        message: String,
    },

    /// The authentication logic rejected a login/logout.
    #[error("authentication failed: {0}")]
    Authentication(String),
}

impl SecurityError {
    pub fn missing(collaborator: &'static str) -> Self {
        Self::MissingCollaborator(collaborator)
    }

    pub fn unknown_strategy(name: impl Into<String>) -> Self {
        Self::UnknownStrategy(name.into())
    }

    pub fn invalid_domain(msg: impl Into<String>) -> Self {
        Self::InvalidDomain(msg.into())
    }

    pub fn session(kind: SessionFailureKind, msg: impl Into<String>) -> Self {
        Self::Session {
            kind,
            message: msg.into(),
        }
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }
}

/// What went wrong inside a session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionFailureKind {
    /// The store's lock was poisoned by a panicking holder.
    Poisoned,
    /// A stored value did not match the expected shape.
    Serialization,
}

impl core::fmt::Display for SessionFailureKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Poisoned => "poisoned",
            Self::Serialization => "serialization",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        assert_eq!(
            SecurityError::missing("auth logic").to_string(),
            "missing collaborator: no auth logic bound"
        );
        assert_eq!(
            SecurityError::unknown_strategy("digest").to_string(),
            "unknown http auth \"digest\""
        );
        assert_eq!(
            SecurityError::DomainAlreadyFixed("admin".into()).to_string(),
            "security domain \"admin\" is already fixed"
        );
        assert_eq!(
            SecurityError::session(SessionFailureKind::Poisoned, "session lock poisoned").to_string(),
            "session store failure (poisoned): session lock poisoned"
        );
    }
}
