//! Bidirectional conversions between a declared type and a representation.
//!
//! An [`Adapter`] consumes values of its [`Input`](Adapter::Input) type and
//! produces values of its [`Output`](Adapter::Output) type. Adapters are
//! registered on the [`MapperFactory`](crate::MapperFactory) and looked up by
//! the type they consume, so they compose: if `Celsius -> Fahrenheit` and
//! `Fahrenheit -> String` are registered, a `Celsius` property is written as
//! a string and read back through both adapters in reverse.
//!
//! Chains are resolved once per property when a mapper is built, see
//! [`AdapterRegistry::resolve`].

// -----------------------------------------------------------------------------
// Modules

mod chain;
mod registry;

// -----------------------------------------------------------------------------
// Exports

pub use chain::AdapterChain;
pub use registry::AdapterRegistry;

use alloc::boxed::Box;
use core::any::{Any, TypeId, type_name};

use crate::error::{MapError, ShapeError};
use crate::info::TypeOps;
use crate::mappable::Mappable;

// -----------------------------------------------------------------------------
// Adapter

/// A bidirectional conversion, `Input -> Output` on write and back on read.
///
/// `Output` must be [`Mappable`] so every step of a chain has a value
/// representation; `Input` can be any type, which is how fields of foreign
/// types (declared `#[mapped(adapted)]`) become mappable.
///
/// # Examples
///
/// ```
/// use vc_mapper::{MapError, adapter::Adapter};
///
/// struct Celsius(f64);
///
/// struct CelsiusAsText;
///
/// impl Adapter for CelsiusAsText {
///     type Input = Celsius;
///     type Output = String;
///
///     fn adapt(&self, input: &Celsius) -> Result<String, MapError> {
///         Ok(format!("{}C", input.0))
///     }
///
///     fn restore(&self, output: String) -> Result<Celsius, MapError> {
///         output
///             .strip_suffix('C')
///             .and_then(|v| v.parse().ok())
///             .map(Celsius)
///             .ok_or_else(|| MapError::custom(format_args!("`{output}` is not a temperature")))
///     }
/// }
/// ```
pub trait Adapter: Send + Sync + 'static {
    /// The type this adapter consumes.
    type Input: Any;
    /// The representation it produces.
    type Output: Mappable;

    /// Converts a value to its representation.
    fn adapt(&self, input: &Self::Input) -> Result<Self::Output, MapError>;

    /// Converts a representation back.
    fn restore(&self, output: Self::Output) -> Result<Self::Input, MapError>;
}

// -----------------------------------------------------------------------------
// ErasedAdapter

/// Object-safe form of [`Adapter`], working on `dyn Any`.
pub(crate) trait ErasedAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    fn input_id(&self) -> TypeId;

    fn output_ops(&self) -> TypeOps;

    fn adapt_dyn(&self, input: &dyn Any) -> Result<Box<dyn Any>, MapError>;

    fn restore_dyn(&self, output: Box<dyn Any>) -> Result<Box<dyn Any>, MapError>;
}

impl<A: Adapter> ErasedAdapter for A {
    #[inline]
    fn name(&self) -> &'static str {
        type_name::<A>()
    }

    #[inline]
    fn input_id(&self) -> TypeId {
        TypeId::of::<A::Input>()
    }

    #[inline]
    fn output_ops(&self) -> TypeOps {
        TypeOps::of::<A::Output>()
    }

    fn adapt_dyn(&self, input: &dyn Any) -> Result<Box<dyn Any>, MapError> {
        let input = input
            .downcast_ref::<A::Input>()
            .ok_or(ShapeError::WrongType {
                expected: type_name::<A::Input>(),
            })?;
        Ok(Box::new(self.adapt(input)?))
    }

    fn restore_dyn(&self, output: Box<dyn Any>) -> Result<Box<dyn Any>, MapError> {
        let output = output
            .downcast::<A::Output>()
            .map_err(|_| ShapeError::WrongType {
                expected: type_name::<A::Output>(),
            })?;
        Ok(Box::new(self.restore(*output)?))
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
pub(crate) mod tests {
    use super::{Adapter, AdapterRegistry};
    use crate::error::{ConfigError, MapError};
    use crate::info::TypeOps;
    use crate::kind::Kind;
    use crate::value::Value;
    use alloc::boxed::Box;
    use alloc::format;
    use alloc::string::String;
    use core::any::Any;

    #[derive(Debug, PartialEq)]
    pub(crate) struct Celsius(pub f64);

    pub(crate) struct CelsiusToKelvin;

    impl Adapter for CelsiusToKelvin {
        type Input = Celsius;
        type Output = f64;

        fn adapt(&self, input: &Celsius) -> Result<f64, MapError> {
            Ok(input.0 + 273.15)
        }

        fn restore(&self, output: f64) -> Result<Celsius, MapError> {
            Ok(Celsius(output - 273.15))
        }
    }

    pub(crate) struct KelvinToText;

    impl Adapter for KelvinToText {
        type Input = f64;
        type Output = String;

        fn adapt(&self, input: &f64) -> Result<String, MapError> {
            Ok(format!("{input}K"))
        }

        fn restore(&self, output: String) -> Result<f64, MapError> {
            output
                .strip_suffix('K')
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| MapError::custom(format_args!("bad kelvin `{output}`")))
        }
    }

    pub(crate) struct TextToKelvin;

    impl Adapter for TextToKelvin {
        type Input = String;
        type Output = f64;

        fn adapt(&self, input: &String) -> Result<f64, MapError> {
            KelvinToText.restore(input.clone())
        }

        fn restore(&self, output: f64) -> Result<String, MapError> {
            KelvinToText.adapt(&output)
        }
    }

    #[test]
    fn chain_resolution() {
        let mut registry = AdapterRegistry::new();
        registry.add(CelsiusToKelvin);
        registry.add(KelvinToText);

        let chain = registry.resolve(&TypeOps::opaque::<Celsius>()).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.terminal().value().map(|v| v.kind()), Some(Kind::String));

        let out = chain.adapt(&Celsius(1.0)).unwrap();
        let value = chain.terminal().value().unwrap().into_value(out).unwrap();
        assert_eq!(value, Value::from("274.15K"));

        let back = chain.restore(Box::new(String::from("273.15K"))).unwrap();
        assert_eq!(back.downcast_ref::<Celsius>(), Some(&Celsius(0.0)));

        // `f64` is consumed by an adapter, so its own chain is not empty.
        assert_eq!(registry.resolve(&TypeOps::of::<f64>()).unwrap().len(), 1);
        assert!(registry.resolve(&TypeOps::of::<i32>()).unwrap().is_empty());
    }

    #[test]
    fn cycle_detection() {
        let mut registry = AdapterRegistry::new();
        registry.add(KelvinToText);
        registry.add(TextToKelvin);

        let err = registry.resolve(&TypeOps::of::<f64>()).unwrap_err();
        assert_eq!(
            err,
            ConfigError::AdapterCycle {
                start: "f64",
                repeated: "f64",
            }
        );
    }

    #[test]
    fn add_replace_remove() {
        let mut registry = AdapterRegistry::new();
        registry.add(CelsiusToKelvin);
        registry.add(CelsiusToKelvin);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains::<CelsiusToKelvin>());

        assert!(registry.remove::<CelsiusToKelvin>());
        assert!(!registry.remove::<CelsiusToKelvin>());
        assert!(registry.is_empty());
    }

    #[test]
    fn wrong_input_type() {
        let mut registry = AdapterRegistry::new();
        registry.add(CelsiusToKelvin);
        let chain = registry.resolve(&TypeOps::opaque::<Celsius>()).unwrap();

        let err = chain.adapt(&3_u8 as &dyn Any).unwrap_err();
        assert!(err.is_shape());
    }
}
