//! Preference accessors
//!
//! A [`PreferenceAccessor`] owns one administration session and is bound to
//! one target for its whole lifetime. Every operation goes through one
//! call-and-translate routine, which folds access-denied, no-such-property
//! and invalid-value failures into [`PrefError::Rejected`] while keeping the
//! backend error as its source.

use std::ops::Deref;

use qprefs_admin::{
    AdminSession, DefaultValue, PropertyHolder, PropertyValue, SessionConfig, SessionFactory,
};

use crate::error::{translate, PrefError};
use crate::target::{Target, TargetResolver};
use crate::Result;

pub struct PreferenceAccessor<S: AdminSession> {
    session: S,
    resolver: TargetResolver,
    target: Target<S>,
}

impl<S: AdminSession> PreferenceAccessor<S> {
    /// Accessor for the system-wide preferences
    pub fn new<F>(factory: &F) -> Result<Self>
    where
        F: SessionFactory<Session = S>,
    {
        Self::with_resolver(factory, TargetResolver::System)
    }

    pub fn with_resolver<F>(factory: &F, resolver: TargetResolver) -> Result<Self>
    where
        F: SessionFactory<Session = S>,
    {
        // One accessor is one logical view of the backend, so reads may be cached
        let session = factory
            .connect(SessionConfig {
                cache_enabled: true,
            })
            .map_err(PrefError::Backend)?;

        let target = resolver.resolve(&session)?;

        tracing::info!(scope = %resolver, "Bound preference accessor");

        Ok(Self {
            session,
            resolver,
            target,
        })
    }

    /// What this accessor is bound to
    pub fn target(&self) -> &TargetResolver {
        &self.resolver
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    fn holder(&self) -> &dyn PropertyHolder {
        self.target.holder(&self.session)
    }

    /// Run one backend call against the target, translating its failure
    fn call<T, F>(&self, property: &str, op: F) -> Result<T>
    where
        F: FnOnce(&dyn PropertyHolder) -> qprefs_admin::Result<T>,
    {
        tracing::debug!(scope = %self.resolver, property = %property, "Preference call");
        op(self.holder()).map_err(|err| translate(property, err))
    }

    pub fn get(&self, name: &str) -> Result<PropertyValue> {
        self.call(name, |holder| holder.property_get(name))
    }

    /// The platform default of `name`.
    ///
    /// A lookup failure and a default with no usable representation are
    /// separate paths: the first is a translated backend error, the second
    /// a sentinel returned by the backend.
    pub fn get_default(&self, name: &str) -> Result<PropertyValue> {
        match self.call(name, |holder| holder.property_get_default(name))? {
            DefaultValue::Value(value) => Ok(value),
            DefaultValue::Unparseable => {
                tracing::warn!(scope = %self.resolver, property = %name, "Unparseable default");
                Err(PrefError::NoDefaultAvailable(name.to_string()))
            }
        }
    }

    pub fn is_default(&self, name: &str) -> Result<bool> {
        self.call(name, |holder| holder.property_is_default(name))
    }

    /// Names of the properties valid on the target, as reported by the backend
    pub fn list(&self) -> Result<Vec<String>> {
        self.holder().property_list().map_err(PrefError::Backend)
    }

    pub fn set(&self, name: &str, value: impl Into<PropertyValue>) -> Result<()> {
        let value = value.into();
        self.call(name, |holder| holder.property_set(name, &value))
    }

    /// Drop the explicit value of `name`, reverting it to the default
    pub fn delete(&self, name: &str) -> Result<()> {
        self.call(name, |holder| holder.property_delete(name))
    }
}

/// Accessor bound to a single named domain
pub struct ScopedPreferenceAccessor<S: AdminSession> {
    inner: PreferenceAccessor<S>,
    domain: String,
}

impl<S: AdminSession> ScopedPreferenceAccessor<S> {
    /// Fails with `TargetNotFound` if `domain` is not a known domain
    pub fn new<F>(factory: &F, domain: impl Into<String>) -> Result<Self>
    where
        F: SessionFactory<Session = S>,
    {
        let domain = domain.into();
        let inner =
            PreferenceAccessor::with_resolver(factory, TargetResolver::Domain(domain.clone()))?;

        Ok(Self { inner, domain })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn into_inner(self) -> PreferenceAccessor<S> {
        self.inner
    }
}

impl<S: AdminSession> Deref for ScopedPreferenceAccessor<S> {
    type Target = PreferenceAccessor<S>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
