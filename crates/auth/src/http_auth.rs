//! Named HTTP-level authentication strategies.

use std::collections::HashMap;
use std::sync::Arc;

use warden_core::{SecurityDomain, SecurityError, SecurityResult};

/// One HTTP challenge/response strategy (Basic, Digest, ...).
///
/// At this layer a strategy is identified by name only; callers outside the
/// security context decide which one to run for a request.
pub trait HttpAuth: Send + Sync + core::fmt::Debug {
    /// Value of the challenge sent to unauthenticated clients of `domain`.
    fn challenge(&self, domain: &SecurityDomain) -> String;
}

/// Flat name → strategy map. No precedence between entries.
#[derive(Debug, Clone, Default)]
pub struct HttpAuthRegistry {
    strategies: HashMap<String, Arc<dyn HttpAuth>>,
}

impl HttpAuthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `strategy` under `name`. An existing entry is replaced.
    pub fn enable(&mut self, name: impl Into<String>, strategy: Arc<dyn HttpAuth>) {
        self.strategies.insert(name.into(), strategy);
    }

    pub fn get(&self, name: &str) -> SecurityResult<Arc<dyn HttpAuth>> {
        self.strategies
            .get(name)
            .cloned()
            .ok_or_else(|| SecurityError::unknown_strategy(name))
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.strategies.keys().map(String::as_str)
    }
}
