use alloc::borrow::Cow;
use alloc::string::String;

use crate::info::{PropertyInfo, TypeDescriptor};

// -----------------------------------------------------------------------------
// NamingPolicy

/// Derives the external name of a property.
///
/// Called once per property when a mapper is built. Two properties of one
/// type mapping to the same name is a
/// [`ConfigError::DuplicateName`](crate::ConfigError::DuplicateName).
///
/// Closures taking the owner descriptor and the property implement this
/// trait.
///
/// # Examples
///
/// ```
/// use std::borrow::Cow;
/// use vc_mapper::{Mapped, MapperFactory};
/// use vc_mapper::info::{PropertyInfo, TypeDescriptor};
///
/// #[derive(Mapped)]
/// struct Sample {
///     value: i32,
/// }
///
/// let factory = MapperFactory::builder()
///     .naming(|owner: &TypeDescriptor, p: &PropertyInfo| {
///         Cow::Owned(format!("{}.{}", owner.ident(), p.name()))
///     })
///     .build();
///
/// let mapper = factory.create_or_get::<Sample>().unwrap();
/// assert_eq!(mapper.properties()[0].name(), "Sample.value");
/// ```
pub trait NamingPolicy: Send + Sync + 'static {
    fn external_name(&self, owner: &TypeDescriptor, property: &PropertyInfo) -> Cow<'static, str>;
}

impl<F> NamingPolicy for F
where
    F: Fn(&TypeDescriptor, &PropertyInfo) -> Cow<'static, str> + Send + Sync + 'static,
{
    #[inline]
    fn external_name(&self, owner: &TypeDescriptor, property: &PropertyInfo) -> Cow<'static, str> {
        self(owner, property)
    }
}

// -----------------------------------------------------------------------------
// Policies

/// The `#[mapped(rename = "...")]` value, or the field name. The default.
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldName;

impl NamingPolicy for FieldName {
    #[inline]
    fn external_name(&self, _: &TypeDescriptor, property: &PropertyInfo) -> Cow<'static, str> {
        Cow::Borrowed(property.rename().unwrap_or(property.name()))
    }
}

/// `snake_case` field names written as `camelCase`.
///
/// Renamed properties keep their rename as is. Leading underscores are
/// kept, so `_cache_size` becomes `_cacheSize`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CamelCase;

impl NamingPolicy for CamelCase {
    fn external_name(&self, _: &TypeDescriptor, property: &PropertyInfo) -> Cow<'static, str> {
        if let Some(rename) = property.rename() {
            return Cow::Borrowed(rename);
        }
        let name = property.name();
        if !name.contains('_') {
            return Cow::Borrowed(name);
        }
        Cow::Owned(to_camel_case(name))
    }
}

fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            if out.chars().all(|v| v == '_') {
                out.push(c);
            } else {
                upper = true;
            }
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::to_camel_case;

    #[test]
    fn camel_case() {
        assert_eq!(to_camel_case("station_name"), "stationName");
        assert_eq!(to_camel_case("a_b_c"), "aBC");
        assert_eq!(to_camel_case("_cache_size"), "_cacheSize");
        assert_eq!(to_camel_case("trailing_"), "trailing");
        assert_eq!(to_camel_case("double__gap"), "doubleGap");
    }
}
