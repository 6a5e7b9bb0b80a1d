//! The mapper cache and its configuration.
//!
//! ## Menu
//!
//! - [`MapperFactory`]: builds one mapper per type and shares it.
//!     - [`FactoryBuilder`]: accessor strategy, naming policy, adapters and [`FactoryConfig`].
//! - [`NamingPolicy`]: external property names.
//!     - [`FieldName`] (default) and [`CamelCase`].
//!
//! ## Cache
//!
//! Mappers are built outside of any lock. When two threads build the mapper
//! of the same type at once, the first one to publish it wins and the other
//! mapper is dropped, so every caller ends up with the same `Arc`.

// -----------------------------------------------------------------------------
// Modules

mod builder;
mod naming;

// -----------------------------------------------------------------------------
// Exports

pub use builder::FactoryBuilder;
pub use naming::{CamelCase, FieldName, NamingPolicy};

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use core::any::{Any, TypeId};
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use log::{debug, warn};
use vc_utils::TypeIdMap;
use vc_utils::hash::HashMap;

use crate::access::AccessStrategy;
use crate::adapter::{Adapter, AdapterChain, AdapterRegistry};
use crate::context::SerializationContext;
use crate::error::{ConfigError, MapError};
use crate::info::{Mapped, TypeDescriptor, TypeOps};
use crate::mappable::Mappable;
use crate::mapper::{Mapper, TypeMapper};

// -----------------------------------------------------------------------------
// FactoryConfig

/// Runtime limits of a [`MapperFactory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactoryConfig {
    /// Maximum nesting of mapped objects below the top-level value.
    ///
    /// Exceeding it is a [`MapError::DepthExceeded`]. Default `64`.
    pub max_depth: u32,
    /// Only allow nested object types that were registered with
    /// [`MapperFactory::register`]. Default `false`.
    pub require_registration: bool,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            require_registration: false,
        }
    }
}

// -----------------------------------------------------------------------------
// KnownTypes

#[derive(Default)]
struct KnownTypes {
    by_id: TypeIdMap<&'static TypeDescriptor>,
    by_name: HashMap<String, TypeId>,
}

impl KnownTypes {
    fn insert(&mut self, descriptor: &'static TypeDescriptor, name: &str) {
        let type_id = descriptor.type_id();
        self.by_id.insert(type_id, descriptor);
        match self.by_name.insert(name.to_string(), type_id) {
            Some(previous) if previous != type_id => {
                warn!("type name `{name}` now refers to `{}`", descriptor.type_name());
            }
            _ => {}
        }
    }
}

// -----------------------------------------------------------------------------
// MapperFactory

struct Inner {
    cache: RwLock<TypeIdMap<Arc<TypeMapper>>>,
    adapters: RwLock<AdapterRegistry>,
    strategy: RwLock<Arc<dyn AccessStrategy>>,
    // Set once the first mapper build has read the strategy.
    strategy_locked: AtomicBool,
    naming: Box<dyn NamingPolicy>,
    known: RwLock<KnownTypes>,
    config: FactoryConfig,
}

/// Builds and caches the mapper of each type.
///
/// The factory is cheap to clone, clones share the cache. Every mapper
/// keeps its factory, nested objects are resolved from it.
///
/// # Examples
///
/// ```
/// use vc_mapper::{Mapped, MapperFactory};
///
/// #[derive(Mapped)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// let factory = MapperFactory::new();
/// let first = factory.create_or_get::<Point>().unwrap();
/// let second = factory.create_or_get::<Point>().unwrap();
///
/// assert!(std::sync::Arc::ptr_eq(first.type_mapper(), second.type_mapper()));
/// assert_eq!(factory.cached_len(), 1);
/// ```
#[derive(Clone)]
pub struct MapperFactory {
    inner: Arc<Inner>,
}

impl Default for MapperFactory {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl MapperFactory {
    /// Creates a factory with [`RawAccess`](crate::access::RawAccess),
    /// [`FieldName`] and no adapters.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// See [`FactoryBuilder`].
    #[inline]
    pub fn builder() -> FactoryBuilder {
        FactoryBuilder::new()
    }

    fn from_parts(
        strategy: Arc<dyn AccessStrategy>,
        naming: Box<dyn NamingPolicy>,
        adapters: AdapterRegistry,
        config: FactoryConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache: RwLock::new(TypeIdMap::new()),
                adapters: RwLock::new(adapters),
                strategy: RwLock::new(strategy),
                strategy_locked: AtomicBool::new(false),
                naming,
                known: RwLock::new(KnownTypes::default()),
                config,
            }),
        }
    }

    #[inline]
    pub fn config(&self) -> &FactoryConfig {
        &self.inner.config
    }

    /// A context for calling [`Mappable::from_value`] or a format directly.
    #[inline]
    pub fn context(&self) -> SerializationContext<'_> {
        SerializationContext::new(self)
    }

    /// Number of cached mappers.
    pub fn cached_len(&self) -> usize {
        self.inner
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    // -------------------------------------------------------------------------
    // Mappers

    /// Returns the cached mapper of `T`, building it on first use.
    pub fn create_or_get<T: Mappable>(&self) -> Result<Mapper<T>, MapError> {
        let inner = self.cached_or_build(TypeOps::of::<T>(), T::type_descriptor())?;
        Ok(Mapper::new(inner, self.clone()))
    }

    /// Builds a new mapper of `T`, bypassing the cache.
    ///
    /// Nested types are still resolved through the cache.
    pub fn create<T: Mappable>(&self) -> Result<Mapper<T>, MapError> {
        let inner = TypeMapper::build(self, TypeOps::of::<T>(), T::type_descriptor())?;
        Ok(Mapper::new(Arc::new(inner), self.clone()))
    }

    /// Returns the mapper of a registered type.
    pub fn create_or_get_by_id(&self, type_id: TypeId) -> Result<Arc<TypeMapper>, MapError> {
        let descriptor = self
            .inner
            .known
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .get(&type_id)
            .copied();
        let descriptor = descriptor
            .ok_or_else(|| ConfigError::MissingMapper(alloc::format!("{type_id:?}")))?;
        Ok(self.mapper_for(descriptor)?)
    }

    /// Returns the mapper of a type registered under `name`.
    ///
    /// Types are registered under their full type name, see
    /// [`register_as`](Self::register_as) for shorter names.
    pub fn create_or_get_by_name(&self, name: &str) -> Result<Arc<TypeMapper>, MapError> {
        let type_id = self
            .inner
            .known
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_name
            .get(name)
            .copied();
        match type_id {
            Some(type_id) => self.create_or_get_by_id(type_id),
            None => Err(ConfigError::MissingMapper(name.to_string()).into()),
        }
    }

    /// The cached mapper of a nested type, built on first use.
    pub(crate) fn mapper_for(
        &self,
        descriptor: &'static TypeDescriptor,
    ) -> Result<Arc<TypeMapper>, ConfigError> {
        self.cached_or_build(*descriptor.ops(), Some(descriptor))
    }

    fn cached_or_build(
        &self,
        ops: TypeOps,
        descriptor: Option<&'static TypeDescriptor>,
    ) -> Result<Arc<TypeMapper>, ConfigError> {
        let type_id = ops.type_id();
        if let Some(mapper) = self
            .inner
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
        {
            return Ok(Arc::clone(mapper));
        }

        let built = Arc::new(TypeMapper::build(self, ops, descriptor)?);

        let mut cache = self
            .inner
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let installed = cache.get_or_insert(type_id, || Arc::clone(&built));
        if !Arc::ptr_eq(installed, &built) {
            debug!("discarded a concurrently built mapper for `{}`", ops.type_name());
        }
        Ok(Arc::clone(installed))
    }

    // -------------------------------------------------------------------------
    // Registration

    /// Registers `T` under its full type name.
    ///
    /// Registered types can be looked up by name and id, and are the only
    /// nested types allowed with [`FactoryConfig::require_registration`].
    ///
    /// # Examples
    ///
    /// ```
    /// use vc_mapper::{Mapped, MapperFactory};
    ///
    /// #[derive(Mapped)]
    /// struct Point {
    ///     x: i32,
    /// }
    ///
    /// let factory = MapperFactory::new();
    /// factory.register_as::<Point>("Point");
    ///
    /// let mapper = factory.create_or_get_by_name("Point").unwrap();
    /// assert_eq!(mapper.properties()[0].name(), "x");
    /// assert!(factory.create_or_get_by_name("Line").is_err());
    /// ```
    pub fn register<T: Mapped>(&self) {
        self.register_descriptor(T::descriptor());
    }

    /// Registers `T` under its full type name and `alias`.
    pub fn register_as<T: Mapped>(&self, alias: &str) {
        let descriptor = T::descriptor();
        let mut known = self
            .inner
            .known
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        known.insert(descriptor, descriptor.type_name());
        known.insert(descriptor, alias);
    }

    fn register_descriptor(&self, descriptor: &'static TypeDescriptor) {
        self.inner
            .known
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(descriptor, descriptor.type_name());
    }

    /// Returns `true` if the type was registered.
    pub fn is_registered(&self, type_id: TypeId) -> bool {
        self.inner
            .known
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .contains(&type_id)
    }

    /// Registers every type declared `#[mapped(auto_register)]`.
    ///
    /// Generic types cannot be collected and must be registered by hand.
    /// Returns `false` when the `auto_register` feature is disabled or the
    /// platform does not support it.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::any::TypeId;
    /// use vc_mapper::{Mapped, MapperFactory};
    ///
    /// #[derive(Mapped)]
    /// #[mapped(auto_register)]
    /// struct Config {
    ///     name: String,
    /// }
    ///
    /// let factory = MapperFactory::new();
    /// if factory.auto_register() {
    ///     assert!(factory.is_registered(TypeId::of::<Config>()));
    /// }
    /// ```
    pub fn auto_register(&self) -> bool {
        #[cfg(feature = "auto_register")]
        {
            use crate::__macro_exports::{__AutoRegisterFunc, inventory};

            let mut count = 0_usize;
            for func in inventory::iter::<__AutoRegisterFunc> {
                self.register_descriptor((func.0)());
                count += 1;
            }
            debug!("auto-registered {count} mapped types");
            true
        }
        #[cfg(not(feature = "auto_register"))]
        {
            false
        }
    }

    // -------------------------------------------------------------------------
    // Accessor strategy

    /// Replaces the accessor strategy.
    ///
    /// Fails with [`ConfigError::StrategyLocked`] once a mapper was built,
    /// all mappers of a factory use the same strategy.
    pub fn set_strategy(&self, strategy: impl AccessStrategy) -> Result<(), ConfigError> {
        let mut slot = self
            .inner
            .strategy
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if self.inner.strategy_locked.load(Ordering::Acquire) {
            return Err(ConfigError::StrategyLocked);
        }
        *slot = Arc::new(strategy);
        Ok(())
    }

    /// Name of the current accessor strategy.
    pub fn strategy_name(&self) -> &'static str {
        self.inner
            .strategy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .name()
    }

    /// Returns the strategy for a mapper build and locks it.
    pub(crate) fn lock_strategy(&self) -> Arc<dyn AccessStrategy> {
        let strategy = self
            .inner
            .strategy
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        self.inner.strategy_locked.store(true, Ordering::Release);
        Arc::clone(&strategy)
    }

    // -------------------------------------------------------------------------
    // Adapters

    /// Registers an adapter.
    ///
    /// Only mappers built afterwards use it, cached mappers keep the chains
    /// they were built with.
    pub fn add_adapter(&self, adapter: impl Adapter) {
        self.warn_if_warm("added");
        self.inner
            .adapters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(adapter);
    }

    /// Removes the adapter of type `A`, returns `false` if it was not registered.
    pub fn remove_adapter<A: Adapter>(&self) -> bool {
        let removed = self
            .inner
            .adapters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove::<A>();
        if removed {
            self.warn_if_warm("removed");
        }
        removed
    }

    /// Returns `true` if an adapter of type `A` is registered.
    pub fn has_adapter<A: Adapter>(&self) -> bool {
        self.inner
            .adapters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains::<A>()
    }

    /// Resolves the adapter chain of `T` with the current adapters.
    pub fn adapter_chain<T: Any>(&self) -> Result<AdapterChain, ConfigError> {
        self.resolve_chain(&TypeOps::opaque::<T>())
    }

    pub(crate) fn resolve_chain(&self, declared: &TypeOps) -> Result<AdapterChain, ConfigError> {
        self.inner
            .adapters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve(declared)
    }

    fn warn_if_warm(&self, action: &str) {
        let cached = self.cached_len();
        if cached != 0 {
            warn!("adapter {action} after {cached} mappers were built, they keep their chains");
        }
    }

    // -------------------------------------------------------------------------
    // Build inputs

    #[inline]
    pub(crate) fn naming(&self) -> &dyn NamingPolicy {
        &*self.inner.naming
    }
}

impl fmt::Debug for MapperFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperFactory")
            .field("cached", &self.cached_len())
            .field("strategy", &self.strategy_name())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::MapperFactory;
    use crate::access::CheckedAccess;
    use crate::adapter::tests::{Celsius, CelsiusToKelvin, KelvinToText};
    use crate::value::{Value, ValueMap};
    use crate::{ConfigError, MapError};
    use alloc::sync::Arc;
    use alloc::vec::Vec;
    use core::any::TypeId;

    #[derive(crate::Mapped, Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(crate::Mapped, Debug, PartialEq)]
    struct Segment {
        from: Point,
        to: Point,
    }

    #[derive(crate::Mapped)]
    struct Reading {
        #[mapped(adapted)]
        temperature: Celsius,
    }

    #[test]
    fn concurrent_create_or_get() {
        let factory = MapperFactory::new();
        let mappers: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| factory.create_or_get::<Segment>().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let first = mappers[0].type_mapper();
        assert!(mappers.iter().all(|m| Arc::ptr_eq(m.type_mapper(), first)));
        assert_eq!(factory.cached_len(), 1);

        // Uncached, but equivalent.
        let fresh = factory.create::<Segment>().unwrap();
        assert!(!Arc::ptr_eq(fresh.type_mapper(), first));
        assert_eq!(fresh.properties().len(), 2);
        assert_eq!(factory.cached_len(), 1);
    }

    #[test]
    fn strategy_lock() {
        let factory = MapperFactory::new();
        assert_eq!(factory.strategy_name(), "raw");
        factory.set_strategy(CheckedAccess).unwrap();
        assert_eq!(factory.strategy_name(), "checked");

        factory.create_or_get::<Point>().unwrap();
        assert_eq!(factory.set_strategy(CheckedAccess), Err(ConfigError::StrategyLocked));

        // A failed build locks as well.
        let factory = MapperFactory::new();
        assert!(factory.create_or_get::<Reading>().is_err());
        assert_eq!(factory.set_strategy(CheckedAccess), Err(ConfigError::StrategyLocked));
    }

    #[test]
    fn registration() {
        let factory = MapperFactory::new();
        assert!(!factory.is_registered(TypeId::of::<Point>()));
        assert!(factory.create_or_get_by_id(TypeId::of::<Point>()).is_err());

        factory.register::<Point>();
        factory.register_as::<Segment>("Segment");
        assert!(factory.is_registered(TypeId::of::<Point>()));

        let by_name = factory
            .create_or_get_by_name(core::any::type_name::<Point>())
            .unwrap();
        let by_id = factory.create_or_get_by_id(TypeId::of::<Point>()).unwrap();
        assert!(Arc::ptr_eq(&by_name, &by_id));

        let segment = factory.create_or_get_by_name("Segment").unwrap();
        assert_eq!(segment.type_id(), TypeId::of::<Segment>());
    }

    #[test]
    fn required_registration() {
        let factory = MapperFactory::builder().require_registration(true).build();
        let err = factory.create_or_get::<Segment>().unwrap_err();
        assert!(matches!(err, MapError::Config(ConfigError::MissingMapper(_))));

        factory.register::<Point>();
        let mapper = factory.create_or_get::<Segment>().unwrap();
        let map = ValueMap::from_iter([(
            "to",
            Value::Map(ValueMap::from_iter([("x", Value::Int(1)), ("y", Value::Int(2))])),
        )]);
        // `from` is absent and left at its default.
        assert_eq!(
            mapper.deserialize_map(map).unwrap(),
            Segment {
                from: Point { x: 0, y: 0 },
                to: Point { x: 1, y: 2 },
            }
        );
    }

    #[test]
    fn adapters_only_affect_new_mappers() {
        let factory = MapperFactory::new();
        assert!(!factory.has_adapter::<CelsiusToKelvin>());
        factory.add_adapter(CelsiusToKelvin);
        assert!(factory.has_adapter::<CelsiusToKelvin>());

        let before = factory.create_or_get::<Reading>().unwrap();
        assert_eq!(before.properties()[0].adapter_chain().len(), 1);

        factory.add_adapter(KelvinToText);
        assert_eq!(factory.adapter_chain::<Celsius>().unwrap().len(), 2);
        let cached = factory.create_or_get::<Reading>().unwrap();
        assert_eq!(cached.properties()[0].adapter_chain().len(), 1);
        assert_eq!(factory.create::<Reading>().unwrap().properties()[0].adapter_chain().len(), 2);

        assert!(factory.remove_adapter::<KelvinToText>());
        assert!(!factory.remove_adapter::<KelvinToText>());
        assert_eq!(factory.adapter_chain::<Celsius>().unwrap().len(), 1);
    }
}
