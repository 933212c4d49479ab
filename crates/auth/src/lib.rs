//! `warden-auth` — domain-scoped security context and its collaborator contracts.
//!
//! This crate is intentionally decoupled from HTTP and storage: credential
//! checks, role storage and challenge mechanisms are pluggable strategies.

pub mod auth_logic;
pub mod config;
pub mod context;
pub mod http_auth;
pub mod previous_url;
pub mod role_manager;
pub mod roles;
pub mod session;

pub use auth_logic::{AuthLogic, PreloadError, RolePreloadable};
pub use config::SecureConfig;
pub use context::{ForwardingTarget, SecurityContext};
pub use http_auth::{HttpAuth, HttpAuthRegistry};
pub use previous_url::{PreviousUrlHolder, SessionPreviousUrlHolder};
pub use role_manager::{RoleManager, SessionRoleManager};
pub use roles::{IntoRoles, Role, RoleSet};
pub use session::{InMemorySessionStore, SessionError, SessionStore};
