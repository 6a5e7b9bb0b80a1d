use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::hash::BuildHasher;

use vc_utils::hash::hashbrown;

use super::{Mappable, mismatch, sequence};
use crate::context::SerializationContext;
use crate::error::MapError;
use crate::kind::Kind;
use crate::value::{Value, ValueMap};

// -----------------------------------------------------------------------------
// Vec

impl<T: Mappable> Mappable for Vec<T> {
    const KIND: Kind = Kind::Array;

    fn to_value(&self) -> Value<'_> {
        Value::Array(self.iter().map(T::to_value).collect())
    }

    fn into_value(self) -> Value<'static> {
        Value::Array(self.into_iter().map(T::into_value).collect())
    }

    #[inline]
    fn from_value(value: Value<'static>, ctx: &SerializationContext<'_>) -> Result<Self, MapError> {
        sequence(value, ctx)
    }

    #[inline]
    fn alloc_default() -> Option<Self> {
        Some(Vec::new())
    }
}

// -----------------------------------------------------------------------------
// String keyed maps

macro_rules! impl_mappable_for_map {
    ($ty:ty $(, $hasher:ident)?) => {
        impl<V: Mappable $(, $hasher: BuildHasher + Default + 'static)?> Mappable for $ty {
            const KIND: Kind = Kind::Map;

            fn to_value(&self) -> Value<'_> {
                Value::Map(self.iter().map(|(k, v)| (k.as_str(), v.to_value())).collect())
            }

            fn into_value(self) -> Value<'static> {
                Value::Map(self.into_iter().map(|(k, v)| (k, v.into_value())).collect())
            }

            fn from_value(
                value: Value<'static>,
                ctx: &SerializationContext<'_>,
            ) -> Result<Self, MapError> {
                match value {
                    Value::Map(map) => map
                        .into_iter()
                        .map(|(k, v)| Ok((k.into_owned(), V::from_value(v, ctx)?)))
                        .collect(),
                    other => Err(mismatch(Kind::Map, &other)),
                }
            }

            #[inline]
            fn alloc_default() -> Option<Self> {
                Some(<$ty>::default())
            }
        }
    };
}

impl_mappable_for_map!(BTreeMap<String, V>);
impl_mappable_for_map!(std::collections::HashMap<String, V, S>, S);
impl_mappable_for_map!(hashbrown::HashMap<String, V, S>, S);

// -----------------------------------------------------------------------------
// ValueMap

/// A map kept as is, for documents whose shape is not known in advance.
impl Mappable for ValueMap<'static> {
    const KIND: Kind = Kind::Map;

    fn to_value(&self) -> Value<'_> {
        Value::Map(self.iter().map(|(k, v)| (k, v.reborrow())).collect())
    }

    #[inline]
    fn into_value(self) -> Value<'static> {
        Value::Map(self)
    }

    fn from_value(value: Value<'static>, _: &SerializationContext<'_>) -> Result<Self, MapError> {
        match value {
            Value::Map(map) => Ok(map),
            other => Err(mismatch(Kind::Map, &other)),
        }
    }

    #[inline]
    fn alloc_default() -> Option<Self> {
        Some(ValueMap::new())
    }
}
