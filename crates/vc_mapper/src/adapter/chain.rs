use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use super::ErasedAdapter;
use crate::error::MapError;
use crate::info::TypeOps;

// -----------------------------------------------------------------------------
// AdapterChain

/// Adapters applied to one property, outer to inner.
///
/// The output type of each adapter is the input type of the next one, the
/// [`terminal`](Self::terminal) type is the output of the last adapter, or the
/// declared type itself for an empty chain.
#[derive(Clone)]
pub struct AdapterChain {
    adapters: Vec<Arc<dyn ErasedAdapter>>,
    terminal: TypeOps,
}

impl AdapterChain {
    pub(crate) fn new(adapters: Vec<Arc<dyn ErasedAdapter>>, terminal: TypeOps) -> Self {
        Self { adapters, terminal }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// The type values are finally represented as.
    #[inline]
    pub fn terminal(&self) -> &TypeOps {
        &self.terminal
    }

    /// Type names of the adapters, outer first.
    pub fn adapter_names(&self) -> impl ExactSizeIterator<Item = &'static str> + '_ {
        self.adapters.iter().map(|a| a.name())
    }

    /// Applies every adapter in order.
    ///
    /// `input` must be of the declared type. Must not be called on an empty chain.
    pub fn adapt(&self, input: &dyn Any) -> Result<Box<dyn Any>, MapError> {
        let mut adapters = self.adapters.iter();
        let Some(first) = adapters.next() else {
            return Err(MapError::custom("adapt called on an empty adapter chain"));
        };
        adapters.try_fold(first.adapt_dyn(input)?, |value, adapter| {
            adapter.adapt_dyn(&*value)
        })
    }

    /// Applies every adapter backwards, from the terminal type to the declared type.
    pub fn restore(&self, output: Box<dyn Any>) -> Result<Box<dyn Any>, MapError> {
        self.adapters
            .iter()
            .rev()
            .try_fold(output, |value, adapter| adapter.restore_dyn(value))
    }
}

impl fmt::Debug for AdapterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterChain")
            .field("adapters", &self.adapter_names().collect::<Vec<_>>())
            .field("terminal", &self.terminal.type_name())
            .finish()
    }
}
