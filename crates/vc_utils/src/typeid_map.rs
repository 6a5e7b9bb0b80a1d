use core::any::TypeId;
use core::fmt::Debug;

use crate::hash::NoOpHashState;
use crate::hash::hashbrown::hash_map::Entry;
use crate::hash::hashbrown::{HashMap, HashSet};

// -----------------------------------------------------------------------------
// TypeIdMap

/// A map keyed by [`TypeId`].
///
/// Type ids are hashed with [`NoOpHashState`], the id already is a hash.
/// Only a small map-like surface is exposed so the storage can change later.
///
/// # Examples
///
/// ```
/// use vc_utils::TypeIdMap;
///
/// let mut map = TypeIdMap::new();
/// map.insert_type::<u8>("byte");
///
/// assert_eq!(map.get_type::<u8>(), Some(&"byte"));
/// assert!(!map.contains_type::<u16>());
/// ```
pub struct TypeIdMap<V>(HashMap<TypeId, V, NoOpHashState>);

impl<V> TypeIdMap<V> {
    /// Creates an empty `TypeIdMap`.
    #[inline]
    pub const fn new() -> Self {
        Self(HashMap::with_hasher(NoOpHashState))
    }

    /// Inserts the value built by `f` if `type_id` is not present yet.
    ///
    /// Returns `true` if the value was inserted. `f` is only called on insertion.
    #[inline]
    pub fn try_insert(&mut self, type_id: TypeId, f: impl FnOnce() -> V) -> bool {
        match self.0.entry(type_id) {
            Entry::Vacant(entry) => {
                entry.insert(f());
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Returns the value for `type_id`, inserting the result of `f` first if absent.
    #[inline]
    pub fn get_or_insert(&mut self, type_id: TypeId, f: impl FnOnce() -> V) -> &mut V {
        match self.0.entry(type_id) {
            Entry::Vacant(entry) => entry.insert(f()),
            Entry::Occupied(entry) => entry.into_mut(),
        }
    }

    /// Returns a reference to the value corresponding to the type.
    #[inline]
    pub fn get(&self, type_id: &TypeId) -> Option<&V> {
        self.0.get(type_id)
    }

    /// Returns a reference to the value corresponding to `T`.
    #[inline(always)]
    pub fn get_type<T: ?Sized + 'static>(&self) -> Option<&V> {
        self.get(&TypeId::of::<T>())
    }

    /// Inserts a key-value pair, returning the previous value.
    #[inline]
    pub fn insert(&mut self, type_id: TypeId, v: V) -> Option<V> {
        self.0.insert(type_id, v)
    }

    /// Inserts a value for `T`, returning the previous value.
    #[inline(always)]
    pub fn insert_type<T: ?Sized + 'static>(&mut self, v: V) -> Option<V> {
        self.insert(TypeId::of::<T>(), v)
    }

    /// Removes a key from the map, returning its value.
    #[inline]
    pub fn remove(&mut self, type_id: &TypeId) -> Option<V> {
        self.0.remove(type_id)
    }

    /// Returns `true` if the map contains a value for the specified key.
    #[inline]
    pub fn contains(&self, type_id: &TypeId) -> bool {
        self.0.contains_key(type_id)
    }

    /// Returns `true` if the map contains a value for `T`.
    #[inline(always)]
    pub fn contains_type<T: ?Sized + 'static>(&self) -> bool {
        self.contains(&TypeId::of::<T>())
    }

    /// Clears the map, keeping the allocated memory.
    #[inline]
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Returns the number of elements in the map.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates all values in arbitrary order.
    #[inline]
    pub fn values(&self) -> impl ExactSizeIterator<Item = &V> {
        self.0.values()
    }
}

impl<V> Default for TypeIdMap<V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Clone for TypeIdMap<V> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<V: Debug> Debug for TypeIdMap<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

// -----------------------------------------------------------------------------
// TypeIdSet

/// A set of [`TypeId`], used to detect repeated types while walking a chain.
///
/// # Examples
///
/// ```
/// use vc_utils::TypeIdSet;
///
/// let mut visited = TypeIdSet::new();
/// assert!(visited.insert_type::<String>());
/// assert!(!visited.insert_type::<String>());
/// ```
#[derive(Clone, Debug, Default)]
pub struct TypeIdSet(HashSet<TypeId, NoOpHashState>);

impl TypeIdSet {
    /// Creates an empty `TypeIdSet`.
    #[inline]
    pub const fn new() -> Self {
        Self(HashSet::with_hasher(NoOpHashState))
    }

    /// Adds a type id, returns `false` if it was already present.
    #[inline]
    pub fn insert(&mut self, type_id: TypeId) -> bool {
        self.0.insert(type_id)
    }

    /// Adds `T`, returns `false` if it was already present.
    #[inline(always)]
    pub fn insert_type<T: ?Sized + 'static>(&mut self) -> bool {
        self.insert(TypeId::of::<T>())
    }

    /// Returns `true` if the set contains `type_id`.
    #[inline]
    pub fn contains(&self, type_id: &TypeId) -> bool {
        self.0.contains(type_id)
    }

    /// Returns the number of elements in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{TypeIdMap, TypeIdSet};
    use core::any::TypeId;

    #[test]
    fn try_insert_keeps_first() {
        let mut map = TypeIdMap::new();
        assert!(map.try_insert(TypeId::of::<i32>(), || 1));
        assert!(!map.try_insert(TypeId::of::<i32>(), || unreachable!()));
        assert_eq!(map.get_type::<i32>(), Some(&1));

        *map.get_or_insert(TypeId::of::<i64>(), || 5) += 1;
        assert_eq!(map.get_type::<i64>(), Some(&6));
        assert_eq!(map.len(), 2);

        assert_eq!(map.remove(&TypeId::of::<i32>()), Some(1));
        assert!(!map.contains_type::<i32>());
    }

    #[test]
    fn set_detects_repeat() {
        let mut set = TypeIdSet::new();
        assert!(set.insert_type::<u8>());
        assert!(set.insert_type::<u16>());
        assert!(!set.insert_type::<u8>());
        assert_eq!(set.len(), 2);
        assert!(set.contains(&TypeId::of::<u16>()));
    }
}
