//! Proxy options resolution.
//!
//! # Responsibilities
//! - Accept caller options statically or through an async provider
//! - Inject named dependencies into factory functions
//! - Merge resolved overrides over the transport defaults
//!
//! # Design Decisions
//! - The provider forms are a tagged variant resolved once at startup; no
//!   live registry is carried into the hot path
//! - Exactly one of {factory, existing, class} is honored, in that order
//! - A class constructor with neither factory nor existing reference set is
//!   instantiated and used as the provider itself; this fallback is
//!   documented behavior, not an error
//! - Resolution failure aborts construction of the whole proxy subsystem

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::config::schema::{TransportOptions, TransportOverrides};
use crate::config::ConfigError;

/// Caller-supplied proxy options, as delivered by the wiring layer.
#[derive(Debug, Clone, Default)]
pub struct ProxyOptions {
    /// Transport overrides merged over defaults at resolution time.
    pub config: TransportOverrides,
}

/// Capability implemented by named option providers.
#[async_trait]
pub trait OptionsFactory: Send + Sync {
    /// Produce the module options. May suspend on IO (secret stores,
    /// discovery services) and may fail; failure is fatal to startup.
    async fn create_module_config(&self) -> Result<ProxyOptions, ConfigError>;
}

/// A named dependency handed to factory functions.
pub type Dependency = Arc<dyn Any + Send + Sync>;

/// Factory function receiving its injected dependencies in request order.
pub type FactoryFn =
    Arc<dyn Fn(Vec<Dependency>) -> BoxFuture<'static, Result<ProxyOptions, ConfigError>> + Send + Sync>;

/// Constructor for a provider type registered by class reference.
pub type ProviderCtor = Arc<dyn Fn() -> Arc<dyn OptionsFactory> + Send + Sync>;

/// Registry of named dependencies available for factory injection.
#[derive(Default)]
pub struct DependencyRegistry {
    entries: HashMap<String, Dependency>,
}

impl DependencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dependency under a name.
    pub fn insert<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.entries.insert(name.into(), Arc::new(value));
    }

    /// Look up a dependency by name.
    pub fn get(&self, name: &str) -> Result<Dependency, ConfigError> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::MissingDependency(name.to_string()))
    }
}

/// The source of proxy options, resolved once at startup.
pub enum OptionsSource {
    /// A static configuration value.
    Static(ProxyOptions),

    /// A factory function plus the names of dependencies to inject.
    Factory { factory: FactoryFn, inject: Vec<String> },

    /// An already-constructed provider.
    Existing(Arc<dyn OptionsFactory>),

    /// A provider type to instantiate and then invoke.
    Class(ProviderCtor),
}

impl std::fmt::Debug for OptionsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionsSource::Static(options) => f.debug_tuple("Static").field(options).finish(),
            OptionsSource::Factory { inject, .. } => f
                .debug_struct("Factory")
                .field("inject", inject)
                .finish_non_exhaustive(),
            OptionsSource::Existing(_) => f.debug_tuple("Existing").finish_non_exhaustive(),
            OptionsSource::Class(_) => f.debug_tuple("Class").finish_non_exhaustive(),
        }
    }
}

/// Async registration shape mirroring the wiring layer's input.
///
/// At most one of the three provider forms is meaningful. `into_source`
/// picks the factory first, then the existing reference. When only a class
/// constructor is supplied, the class is instantiated and used as the
/// provider; supplying none of the three is an error.
#[derive(Default)]
pub struct AsyncOptions {
    pub factory: Option<FactoryFn>,
    pub inject: Vec<String>,
    pub existing: Option<Arc<dyn OptionsFactory>>,
    pub class: Option<ProviderCtor>,
}

impl AsyncOptions {
    pub fn into_source(self) -> Result<OptionsSource, ConfigError> {
        if let Some(factory) = self.factory {
            return Ok(OptionsSource::Factory {
                factory,
                inject: self.inject,
            });
        }
        if let Some(existing) = self.existing {
            return Ok(OptionsSource::Existing(existing));
        }
        // Fallback: instantiate the class and treat the instance as the
        // provider.
        if let Some(class) = self.class {
            return Ok(OptionsSource::Class(class));
        }
        Err(ConfigError::NoSource)
    }
}

impl OptionsSource {
    /// Resolve the caller options, awaiting any async provider.
    pub async fn resolve(self, deps: &DependencyRegistry) -> Result<ProxyOptions, ConfigError> {
        match self {
            OptionsSource::Static(options) => Ok(options),
            OptionsSource::Factory { factory, inject } => {
                let mut args = Vec::with_capacity(inject.len());
                for name in &inject {
                    args.push(deps.get(name)?);
                }
                (factory.as_ref())(args).await
            }
            OptionsSource::Existing(provider) => provider.create_module_config().await,
            OptionsSource::Class(ctor) => (ctor.as_ref())().create_module_config().await,
        }
    }
}

/// Resolve a source into the final transport options used by the engine.
///
/// Caller overrides win field-by-field over the defaults; unspecified fields
/// retain them.
pub async fn resolve_transport(
    source: OptionsSource,
    deps: &DependencyRegistry,
) -> Result<TransportOptions, ConfigError> {
    let options = source.resolve(deps).await?;
    Ok(options.config.apply(TransportOptions::default()))
}
