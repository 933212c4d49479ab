use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use warden_core::ValueObject;

/// Role identifier.
///
/// Roles are intentionally opaque strings at this layer; what a role grants is
/// decided by whoever configures `allowed_roles` on a context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Role {}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Self(Cow::Owned(value.to_owned()))
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

/// Set of role identifiers, ordered for deterministic storage and display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, role: &Role) -> bool {
        self.0.contains(role)
    }

    pub fn insert(&mut self, role: impl Into<Role>) -> bool {
        self.0.insert(role.into())
    }

    /// Merge `other` into this set.
    pub fn extend(&mut self, other: RoleSet) {
        self.0.extend(other.0);
    }

    /// True when at least one role is shared.
    pub fn intersects(&self, other: &RoleSet) -> bool {
        self.0.intersection(&other.0).next().is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.0.iter()
    }
}

impl ValueObject for RoleSet {}

impl<R: Into<Role>> FromIterator<R> for RoleSet {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for RoleSet {
    type Item = Role;
    type IntoIter = std::collections::btree_set::IntoIter<Role>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a RoleSet {
    type Item = &'a Role;
    type IntoIter = std::collections::btree_set::Iter<'a, Role>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Anything that names one role or a collection of roles.
///
/// Role queries accept either form: `has_role("EDITOR")` and
/// `has_role(["EDITOR", "VIEWER"])` are both valid.
pub trait IntoRoles {
    fn into_roles(self) -> RoleSet;
}

impl IntoRoles for RoleSet {
    fn into_roles(self) -> RoleSet {
        self
    }
}

impl IntoRoles for &RoleSet {
    fn into_roles(self) -> RoleSet {
        self.clone()
    }
}

impl IntoRoles for Role {
    fn into_roles(self) -> RoleSet {
        RoleSet(BTreeSet::from([self]))
    }
}

impl IntoRoles for &str {
    fn into_roles(self) -> RoleSet {
        Role::from(self).into_roles()
    }
}

impl IntoRoles for String {
    fn into_roles(self) -> RoleSet {
        Role::from(self).into_roles()
    }
}

impl<R: Into<Role>> IntoRoles for Vec<R> {
    fn into_roles(self) -> RoleSet {
        self.into_iter().collect()
    }
}

impl<R: Into<Role>, const N: usize> IntoRoles for [R; N] {
    fn into_roles(self) -> RoleSet {
        self.into_iter().collect()
    }
}

impl<R: Into<Role> + Clone> IntoRoles for &[R] {
    fn into_roles(self) -> RoleSet {
        self.iter().cloned().collect()
    }
}
