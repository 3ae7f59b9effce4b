//! Target resolution
//!
//! An accessor is bound to exactly one target, picked once at construction:
//! the system object (the session root) or one named domain. A domain that
//! does not exist is an error; there is no fallback to the root.

use qprefs_admin::{AdminError, AdminSession, PropertyHolder};

use crate::error::PrefError;
use crate::Result;

/// How an accessor picks its target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetResolver {
    System,
    Domain(String),
}

impl TargetResolver {
    pub fn resolve<S: AdminSession>(&self, session: &S) -> Result<Target<S>> {
        match self {
            TargetResolver::System => Ok(Target::System),
            TargetResolver::Domain(name) => {
                if name.trim().is_empty() {
                    return Err(PrefError::InvalidTarget(
                        "Domain name cannot be empty".to_string(),
                    ));
                }

                match session.domain(name) {
                    Ok(domain) => Ok(Target::Domain(domain)),
                    Err(source @ AdminError::NoSuchDomain(_)) => Err(PrefError::TargetNotFound {
                        domain: name.clone(),
                        source,
                    }),
                    Err(other) => Err(PrefError::Backend(other)),
                }
            }
        }
    }
}

impl std::fmt::Display for TargetResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetResolver::System => write!(f, "system"),
            TargetResolver::Domain(name) => write!(f, "domain {}", name),
        }
    }
}

/// A resolved target
pub enum Target<S: AdminSession> {
    System,
    Domain(S::Domain),
}

impl<S: AdminSession> Target<S> {
    /// The holder operations run against
    pub(crate) fn holder<'a>(&'a self, session: &'a S) -> &'a dyn PropertyHolder
    where
        S::Domain: 'a,
    {
        match self {
            Target::System => session,
            Target::Domain(domain) => domain,
        }
    }
}
