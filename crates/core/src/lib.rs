//! `warden-core` — security domain building blocks.
//!
//! This crate contains the shared vocabulary of the security context
//! (domains, identifiers, errors) and no collaborator logic.

pub mod domain;
pub mod error;
pub mod id;
pub mod value_object;

pub use domain::SecurityDomain;
pub use error::{SecurityError, SecurityResult, SessionFailureKind};
pub use id::SessionId;
pub use value_object::ValueObject;
