//! Security domain names.
//!
//! A domain is a named, isolated login boundary. Every piece of collaborator
//! state (session keys in particular) is namespaced by the domain name, so two
//! contexts bound to different domains never observe each other's state.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::{SecurityError, SecurityResult};
use crate::value_object::ValueObject;

/// Name of a protected area.
///
/// Names are non-empty, carry no surrounding whitespace and never contain the
/// `/` namespace separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecurityDomain(String);

impl SecurityDomain {
    /// Domain used by contexts (and collaborators) that were never configured.
    pub const DEFAULT: &'static str = "secured";

    pub fn new(name: impl Into<String>) -> SecurityResult<Self> {
        let name = name.into();

        if name.trim().is_empty() {
            return Err(SecurityError::invalid_domain("name must not be empty"));
        }
        if name.trim() != name {
            return Err(SecurityError::invalid_domain(format!(
                "\"{name}\" has surrounding whitespace"
            )));
        }
        if name.contains('/') {
            return Err(SecurityError::invalid_domain(format!(
                "\"{name}\" contains the '/' separator"
            )));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Namespaced storage key: `"<domain>/<suffix>"`.
    pub fn key(&self, suffix: &str) -> String {
        format!("{}/{}", self.0, suffix)
    }
}

impl Default for SecurityDomain {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl ValueObject for SecurityDomain {}

impl core::fmt::Display for SecurityDomain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SecurityDomain {
    type Err = SecurityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SecurityDomain {
    type Error = SecurityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SecurityDomain> for String {
    fn from(value: SecurityDomain) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_domain_is_secured() {
        assert_eq!(SecurityDomain::default().as_str(), "secured");
    }

    #[test]
    fn keys_are_namespaced_by_domain() {
        let admin = SecurityDomain::new("admin").unwrap();
        assert_eq!(admin.key("role/roles"), "admin/role/roles");
    }

    #[test]
    fn invalid_names_are_rejected() {
        for name in ["", "   ", " admin", "admin/role"] {
            assert!(
                matches!(SecurityDomain::new(name), Err(SecurityError::InvalidDomain(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn deserialization_validates() {
        let ok: SecurityDomain = serde_json::from_str("\"member\"").unwrap();
        assert_eq!(ok.as_str(), "member");

        assert!(serde_json::from_str::<SecurityDomain>("\"a/b\"").is_err());
    }
}
