//! "Return here after login" URL, one per domain.

use std::sync::Arc;

use warden_core::{SecurityDomain, SecurityResult};

use crate::session::{self, SessionStore};

pub trait PreviousUrlHolder: Send {
    fn setup(&mut self, domain: &SecurityDomain);

    fn has(&self) -> SecurityResult<bool>;

    fn set(&mut self, url: &str) -> SecurityResult<()>;

    fn get(&self) -> SecurityResult<Option<String>>;
}

/// Previous URL stored in the session under `"<domain>/previous_url"`.
pub struct SessionPreviousUrlHolder {
    session: Arc<dyn SessionStore>,
    domain: SecurityDomain,
}

impl SessionPreviousUrlHolder {
    pub fn new(session: Arc<dyn SessionStore>) -> Self {
        Self {
            session,
            domain: SecurityDomain::default(),
        }
    }

    fn key(&self) -> String {
        self.domain.key("previous_url")
    }
}

impl core::fmt::Debug for SessionPreviousUrlHolder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionPreviousUrlHolder")
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

impl PreviousUrlHolder for SessionPreviousUrlHolder {
    fn setup(&mut self, domain: &SecurityDomain) {
        self.domain = domain.clone();
    }

    fn has(&self) -> SecurityResult<bool> {
        Ok(self.session.get(&self.key())?.is_some())
    }

    fn set(&mut self, url: &str) -> SecurityResult<()> {
        Ok(session::put(&*self.session, &self.key(), url)?)
    }

    fn get(&self) -> SecurityResult<Option<String>> {
        Ok(session::get_or(&*self.session, &self.key(), None)?)
    }
}
