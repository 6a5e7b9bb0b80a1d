use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use thiserror::Error;

use crate::kind::Kind;

// -----------------------------------------------------------------------------
// ConfigError

/// A mapper cannot be built with the current factory configuration.
///
/// Detected while a mapper is constructed, before any value is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Two adapters in a chain consume the same type.
    #[error("adapter cycle while resolving `{start}`: `{repeated}` is consumed twice")]
    AdapterCycle {
        start: &'static str,
        repeated: &'static str,
    },
    /// A nested type has no descriptor, or is not registered while
    /// registration is required.
    #[error("no mapper available for `{0}`")]
    MissingMapper(String),
    /// The accessor strategy cannot prepare a property.
    #[error("accessor strategy `{strategy}` cannot access `{owner}::{property}`")]
    StrategyRejected {
        strategy: &'static str,
        owner: &'static str,
        property: &'static str,
    },
    /// The accessor strategy was replaced after the first mapper was built.
    #[error("the accessor strategy cannot be replaced after a mapper was built")]
    StrategyLocked,
    /// An `#[mapped(adapted)]` property without an adapter for its type.
    #[error("`{owner}::{property}` of type `{ty}` has no value representation and no adapter")]
    Unmappable {
        owner: &'static str,
        property: &'static str,
        ty: &'static str,
    },
    /// The naming policy produced the same external name twice.
    #[error("external name `{name}` is used twice in `{owner}`")]
    DuplicateName { owner: &'static str, name: String },
}

// -----------------------------------------------------------------------------
// ShapeError

/// The input does not have the shape the target type expects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("expected {expected}, found {found}")]
    Mismatch { expected: Kind, found: Kind },
    #[error("{value} is out of range for `{target}`")]
    OutOfRange { value: String, target: &'static str },
    #[error("expected {expected} elements, found {found}")]
    Length { expected: usize, found: usize },
    /// A type-erased value is not of the expected concrete type.
    #[error("value is not a `{expected}`")]
    WrongType { expected: &'static str },
}

impl ShapeError {
    #[inline]
    pub(crate) fn out_of_range(value: impl fmt::Display, target: &'static str) -> Self {
        Self::OutOfRange {
            value: alloc::format!("{value}"),
            target,
        }
    }
}

// -----------------------------------------------------------------------------
// PropertyPath

/// The chain of properties an error happened in, outermost first.
///
/// Only collected in debug builds with the `debug` feature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyPath {
    segments: Vec<(&'static str, &'static str)>,
}

impl PropertyPath {
    /// Iterates `(owner type, property)` pairs, outermost first.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.segments.iter().copied()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (owner, property)) in self.iter().enumerate() {
            if index != 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "`{owner}::{property}`")?;
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// MapError

/// The error type of every mapping operation.
#[derive(Error, Debug)]
pub enum MapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
    /// The accessor strategy cannot produce an instance.
    #[error("cannot allocate `{type_name}`: {reason}")]
    Allocation {
        type_name: &'static str,
        reason: &'static str,
    },
    /// Nested values go deeper than `FactoryConfig::max_depth`.
    #[error("nesting depth exceeds the limit of {0}")]
    DepthExceeded(u32),
    #[cfg(feature = "json")]
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Raised by formats and adapters, see [`MapError::custom`].
    #[error("{0}")]
    Custom(String),
    #[error("at {path}: {source}")]
    InProperty {
        path: PropertyPath,
        source: Box<MapError>,
    },
}

impl MapError {
    /// Creates an error with a custom message.
    ///
    /// # Examples
    ///
    /// ```
    /// use vc_mapper::MapError;
    ///
    /// let err = MapError::custom(format_args!("bad timestamp {}", -1));
    /// assert_eq!(err.to_string(), "bad timestamp -1");
    /// ```
    #[inline]
    pub fn custom(msg: impl fmt::Display) -> Self {
        Self::Custom(alloc::format!("{msg}"))
    }

    /// Shorthand for a [`ShapeError::Mismatch`].
    #[inline]
    pub fn mismatch(expected: Kind, found: Kind) -> Self {
        Self::Shape(ShapeError::Mismatch { expected, found })
    }

    /// The error without its property path.
    pub fn root(&self) -> &MapError {
        match self {
            MapError::InProperty { source, .. } => source.root(),
            other => other,
        }
    }

    /// The property path, if one was collected.
    pub fn path(&self) -> Option<&PropertyPath> {
        match self {
            MapError::InProperty { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Returns `true` if the root cause is a [`ConfigError`].
    pub fn is_config(&self) -> bool {
        matches!(self.root(), MapError::Config(_))
    }

    /// Returns `true` if the root cause is a [`ShapeError`].
    pub fn is_shape(&self) -> bool {
        matches!(self.root(), MapError::Shape(_))
    }

    /// Records that this error happened inside `owner::property`.
    #[cfg(all(debug_assertions, feature = "debug"))]
    pub(crate) fn at(self, owner: &'static str, property: &'static str) -> Self {
        match self {
            MapError::InProperty { mut path, source } => {
                path.segments.insert(0, (owner, property));
                MapError::InProperty { path, source }
            }
            other => MapError::InProperty {
                path: PropertyPath {
                    segments: alloc::vec![(owner, property)],
                },
                source: Box::new(other),
            },
        }
    }

    #[cfg(not(all(debug_assertions, feature = "debug")))]
    #[inline(always)]
    pub(crate) fn at(self, _: &'static str, _: &'static str) -> Self {
        self
    }
}

impl From<fmt::Error> for MapError {
    #[inline]
    fn from(_: fmt::Error) -> Self {
        MapError::Custom(String::from("formatter error"))
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, MapError, ShapeError};
    use crate::kind::Kind;

    #[test]
    fn display() {
        let err = MapError::from(ConfigError::AdapterCycle {
            start: "Celsius",
            repeated: "Celsius",
        });
        assert_eq!(
            err.to_string(),
            "adapter cycle while resolving `Celsius`: `Celsius` is consumed twice"
        );
        assert!(err.is_config());

        let err = MapError::mismatch(Kind::Object, Kind::Int);
        assert_eq!(err.to_string(), "expected object, found int");
        assert!(err.is_shape());
    }

    #[cfg(all(debug_assertions, feature = "debug"))]
    #[test]
    fn property_path() {
        let err = MapError::from(ShapeError::out_of_range(300, "i8"))
            .at("Inner", "level")
            .at("Outer", "inner");

        assert_eq!(err.path().map(|p| p.len()), Some(2));
        assert_eq!(
            err.to_string(),
            "at `Outer::inner` -> `Inner::level`: 300 is out of range for `i8`"
        );
        assert!(matches!(err.root(), MapError::Shape(ShapeError::OutOfRange { .. })));
    }
}
