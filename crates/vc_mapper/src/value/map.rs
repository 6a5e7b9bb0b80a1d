use alloc::borrow::Cow;
use alloc::vec::Vec;
use core::fmt;
use core::hash::BuildHasher;
use core::mem;

use vc_utils::hash::{FixedHashState, HashTable};

use super::Value;

#[inline]
fn hash_key(key: &str) -> u64 {
    FixedHashState.hash_one(key)
}

// -----------------------------------------------------------------------------
// ValueMap

/// An insertion-ordered string-keyed map of [`Value`]s.
///
/// This is what [`Format::read`](crate::format::Format::read) returns for a
/// document and what [`Mapper::deserialize_map`](crate::Mapper::deserialize_map)
/// consumes. Entries are stored in a `Vec` and indexed by a [`HashTable`] of
/// positions, so iteration follows insertion order and lookups stay O(1).
///
/// # Examples
///
/// ```
/// use vc_mapper::{Value, ValueMap};
///
/// let mut map = ValueMap::new();
/// map.insert("y", Value::Int(4));
/// map.insert("x", Value::Int(3));
/// map.insert("y", Value::Int(5));
///
/// let keys: Vec<_> = map.keys().collect();
/// assert_eq!(keys, ["y", "x"]);
/// assert_eq!(map.get("y"), Some(&Value::Int(5)));
/// ```
#[derive(Default)]
pub struct ValueMap<'a> {
    entries: Vec<(Cow<'a, str>, Value<'a>)>,
    index: HashTable<usize>,
}

impl<'a> ValueMap<'a> {
    /// Creates an empty map.
    #[inline]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashTable::new(),
        }
    }

    /// Creates an empty map with space for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashTable::with_capacity(capacity),
        }
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.index
            .find(hash_key(key), |&i| self.entries[i].0 == key)
            .copied()
    }

    /// Returns the value for `key`.
    pub fn get(&self, key: &str) -> Option<&Value<'a>> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    /// Returns the value for `key` mutably.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value<'a>> {
        self.position(key).map(|i| &mut self.entries[i].1)
    }

    /// Returns `true` if the map contains `key`.
    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Inserts a value.
    ///
    /// An existing key keeps its position, the previous value is returned.
    pub fn insert(&mut self, key: impl Into<Cow<'a, str>>, value: Value<'a>) -> Option<Value<'a>> {
        let key = key.into();
        if let Some(i) = self.position(&key) {
            return Some(mem::replace(&mut self.entries[i].1, value));
        }

        let hash = hash_key(&key);
        let position = self.entries.len();
        self.entries.push((key, value));

        let entries = &self.entries;
        self.index
            .insert_unique(hash, position, |&i| hash_key(&entries[i].0));
        None
    }

    /// Moves the value for `key` out, leaving [`Value::Null`] behind.
    ///
    /// The entry itself stays, so positions and iteration order do not change.
    pub fn take(&mut self, key: &str) -> Option<Value<'a>> {
        self.get_mut(key).map(|slot| mem::replace(slot, Value::Null))
    }

    /// Iterates the entries in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Value<'a>)> {
        self.entries.iter().map(|(k, v)| (&**k, v))
    }

    /// Iterates the keys in insertion order.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &str> {
        self.entries.iter().map(|(k, _)| &**k)
    }
}

impl<'a> IntoIterator for ValueMap<'a> {
    type Item = (Cow<'a, str>, Value<'a>);
    type IntoIter = alloc::vec::IntoIter<(Cow<'a, str>, Value<'a>)>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, K: Into<Cow<'a, str>>> Extend<(K, Value<'a>)> for ValueMap<'a> {
    fn extend<I: IntoIterator<Item = (K, Value<'a>)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K: Into<Cow<'a, str>>> FromIterator<(K, Value<'a>)> for ValueMap<'a> {
    fn from_iter<I: IntoIterator<Item = (K, Value<'a>)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut map = ValueMap::with_capacity(iter.size_hint().0);
        map.extend(iter);
        map
    }
}

impl PartialEq for ValueMap<'_> {
    /// Same keys with equal values, regardless of order.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).is_some_and(|v| v == value))
    }
}

impl fmt::Debug for ValueMap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::ValueMap;
    use crate::value::Value;
    use alloc::format;
    use alloc::string::String;
    use alloc::vec::Vec;

    #[test]
    fn insertion_order_and_replace() {
        let mut map = ValueMap::new();
        for i in 0..40 {
            assert!(map.insert(format!("k{i}"), Value::Int(i)).is_none());
        }
        assert_eq!(map.insert("k7", Value::Int(-7)), Some(Value::Int(7)));

        assert_eq!(map.len(), 40);
        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys[7], "k7");
        assert_eq!(keys[39], "k39");
        assert_eq!(map.get("k7"), Some(&Value::Int(-7)));
        assert_eq!(map.get("k40"), None);
    }

    #[test]
    fn take_leaves_null() {
        let mut map: ValueMap<'static> = [("text", Value::from(String::from("hi")))]
            .into_iter()
            .collect();

        assert_eq!(map.take("text"), Some(Value::from("hi")));
        assert_eq!(map.get("text"), Some(&Value::Null));
        assert_eq!(map.take("missing"), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn debug_output() {
        let mut map = ValueMap::new();
        map.insert("b", Value::Bool(true));
        map.insert("a", Value::Null);
        assert_eq!(format!("{map:?}"), r#"{"b": Bool(true), "a": Null}"#);
    }
}
