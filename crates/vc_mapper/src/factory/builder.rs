use alloc::boxed::Box;
use alloc::sync::Arc;
use core::fmt;

use super::naming::{FieldName, NamingPolicy};
use super::{FactoryConfig, MapperFactory};
use crate::access::{AccessStrategy, RawAccess};
use crate::adapter::{Adapter, AdapterRegistry};

/// Configures a [`MapperFactory`] before its first use.
///
/// # Examples
///
/// ```
/// use vc_mapper::MapperFactory;
/// use vc_mapper::access::CheckedAccess;
/// use vc_mapper::factory::CamelCase;
///
/// let factory = MapperFactory::builder()
///     .strategy(CheckedAccess)
///     .naming(CamelCase)
///     .max_depth(8)
///     .build();
///
/// assert_eq!(factory.config().max_depth, 8);
/// ```
pub struct FactoryBuilder {
    strategy: Arc<dyn AccessStrategy>,
    naming: Box<dyn NamingPolicy>,
    adapters: AdapterRegistry,
    config: FactoryConfig,
}

impl FactoryBuilder {
    pub(super) fn new() -> Self {
        Self {
            strategy: Arc::new(RawAccess),
            naming: Box::new(FieldName),
            adapters: AdapterRegistry::new(),
            config: FactoryConfig::default(),
        }
    }

    /// Sets the accessor strategy, [`RawAccess`] by default.
    pub fn strategy(mut self, strategy: impl AccessStrategy) -> Self {
        self.strategy = Arc::new(strategy);
        self
    }

    /// Sets the naming policy, [`FieldName`] by default.
    pub fn naming(mut self, naming: impl NamingPolicy) -> Self {
        self.naming = Box::new(naming);
        self
    }

    /// Registers an adapter.
    pub fn adapter(mut self, adapter: impl Adapter) -> Self {
        self.adapters.add(adapter);
        self
    }

    /// See [`FactoryConfig::max_depth`].
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// See [`FactoryConfig::require_registration`].
    pub fn require_registration(mut self, require: bool) -> Self {
        self.config.require_registration = require;
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: FactoryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> MapperFactory {
        MapperFactory::from_parts(self.strategy, self.naming, self.adapters, self.config)
    }
}

impl fmt::Debug for FactoryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryBuilder")
            .field("strategy", &self.strategy.name())
            .field("adapters", &self.adapters)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
