use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::TypeId;
use core::fmt;

use log::trace;
use vc_utils::TypeIdSet;

use super::{Adapter, AdapterChain, ErasedAdapter};
use crate::error::ConfigError;
use crate::info::TypeOps;

struct Entry {
    id: TypeId,
    adapter: Arc<dyn ErasedAdapter>,
}

// -----------------------------------------------------------------------------
// AdapterRegistry

/// Registered adapters, matched by the type they consume.
///
/// When several adapters consume the same type, the first registered one
/// wins. Registering an adapter type twice replaces the first instance in
/// place.
#[derive(Default)]
pub struct AdapterRegistry {
    entries: Vec<Entry>,
}

impl AdapterRegistry {
    /// Creates an empty registry.
    #[inline]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registers an adapter.
    pub fn add<A: Adapter>(&mut self, adapter: A) {
        let id = TypeId::of::<A>();
        let adapter: Arc<dyn ErasedAdapter> = Arc::new(adapter);
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => entry.adapter = adapter,
            None => self.entries.push(Entry { id, adapter }),
        }
    }

    /// Removes the adapter of type `A`, returns `false` if it was not registered.
    pub fn remove<A: Adapter>(&mut self) -> bool {
        let id = TypeId::of::<A>();
        let len = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != len
    }

    /// Returns `true` if an adapter of type `A` is registered.
    pub fn contains<A: Adapter>(&self) -> bool {
        let id = TypeId::of::<A>();
        self.entries.iter().any(|e| e.id == id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find(&self, input: TypeId) -> Option<&Arc<dyn ErasedAdapter>> {
        self.entries
            .iter()
            .find(|e| e.adapter.input_id() == input)
            .map(|e| &e.adapter)
    }

    /// Builds the adapter chain of a declared type.
    ///
    /// Starting from `declared`, the adapter consuming the current type is
    /// appended and its output becomes the current type, until no adapter
    /// matches. A type seen twice is an [`AdapterCycle`](ConfigError::AdapterCycle).
    pub fn resolve(&self, declared: &TypeOps) -> Result<AdapterChain, ConfigError> {
        let mut visited = TypeIdSet::new();
        visited.insert(declared.type_id());

        let mut adapters = Vec::new();
        let mut current = *declared;
        while let Some(adapter) = self.find(current.type_id()) {
            current = adapter.output_ops();
            adapters.push(Arc::clone(adapter));

            if !visited.insert(current.type_id()) {
                return Err(ConfigError::AdapterCycle {
                    start: declared.type_name(),
                    repeated: current.type_name(),
                });
            }
        }

        if !adapters.is_empty() {
            trace!(
                "adapter chain of `{}`: {} adapter(s), terminal `{}`",
                declared.type_name(),
                adapters.len(),
                current.type_name(),
            );
        }
        Ok(AdapterChain::new(adapters, current))
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.adapter.name()))
            .finish()
    }
}
