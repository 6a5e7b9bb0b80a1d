use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::vec::Vec;

use super::{MappedProperty, PropertySetter, TypeMapper};
use crate::access::{AccessStrategy, FieldGetter, Incoming, Location, Target, make_getter};
use crate::adapter::AdapterChain;
use crate::context::SerializationContext;
use crate::error::{ConfigError, MapError};
use crate::factory::MapperFactory;
use crate::info::{PropertyInfo, TypeDescriptor, TypeOps, ValueOps};
use crate::kind::Kind;
use crate::value::Value;

#[inline]
fn make_property_setter<F>(f: F) -> PropertySetter
where
    F: Fn(Target<'_>, Value<'static>, &SerializationContext<'_>) -> Result<(), MapError>
        + Send
        + Sync
        + 'static,
{
    Box::new(f)
}

impl TypeMapper {
    /// Compiles the mapper of the type described by `ops`.
    ///
    /// Types without a descriptor get a mapper without properties, they are
    /// written as a single value.
    pub(crate) fn build(
        factory: &MapperFactory,
        ops: TypeOps,
        descriptor: Option<&'static TypeDescriptor>,
    ) -> Result<Self, ConfigError> {
        let strategy = factory.lock_strategy();

        let properties = match descriptor {
            Some(descriptor) => descriptor
                .properties()
                .iter()
                .try_fold(Vec::new(), |mut done, property| {
                    let mapped = compile(factory, &*strategy, descriptor, property, &done)?;
                    done.push(mapped);
                    Ok::<_, ConfigError>(done)
                })?
                .into_boxed_slice(),
            None => {
                if ops.value().is_none() {
                    return Err(ConfigError::MissingMapper(ops.type_name().to_string()));
                }
                Box::new([])
            }
        };

        log::debug!(
            "built mapper for `{}`: {} properties, `{}` access",
            ops.type_name(),
            properties.len(),
            strategy.name(),
        );

        Ok(Self {
            ops,
            descriptor,
            properties,
            strategy,
        })
    }
}

fn compile(
    factory: &MapperFactory,
    strategy: &dyn AccessStrategy,
    owner: &'static TypeDescriptor,
    property: &'static PropertyInfo,
    done: &[MappedProperty],
) -> Result<MappedProperty, ConfigError> {
    let name = factory.naming().external_name(owner, property);
    if done.iter().any(|p| p.name() == name) {
        return Err(ConfigError::DuplicateName {
            owner: owner.type_name(),
            name: name.into_owned(),
        });
    }

    let chain = factory.resolve_chain(property.ops())?;
    let Some(terminal) = chain.terminal().value().copied() else {
        return Err(ConfigError::Unmappable {
            owner: owner.type_name(),
            property: property.name(),
            ty: property.type_name(),
        });
    };

    if terminal.kind() == Kind::Object {
        let missing = || ConfigError::MissingMapper(chain.terminal().type_name().to_string());
        let nested = terminal.descriptor().ok_or_else(missing)?;
        if factory.config().require_registration && !factory.is_registered(nested.type_id()) {
            return Err(missing());
        }
    }

    if !strategy.can_access(property) {
        return Err(ConfigError::StrategyRejected {
            strategy: strategy.name(),
            owner: owner.type_name(),
            property: property.name(),
        });
    }
    let location = strategy.prepare(owner, property)?;

    let getter = compile_getter(strategy, &location, &chain, terminal);
    let setter = compile_setter(strategy, &location, &chain, terminal);

    Ok(MappedProperty {
        info: property,
        name,
        kind: terminal.kind(),
        nullable: terminal.is_nullable(),
        chain,
        location,
        getter,
        setter,
    })
}

fn compile_getter(
    strategy: &dyn AccessStrategy,
    location: &Location,
    chain: &AdapterChain,
    terminal: ValueOps,
) -> FieldGetter {
    if chain.is_empty() {
        return strategy.getter(location);
    }
    let reference = strategy.reference(location);
    let chain = chain.clone();
    make_getter(move |owner| {
        let adapted = chain.adapt(reference(owner)?)?;
        terminal.into_value(adapted)
    })
}

fn compile_setter(
    strategy: &dyn AccessStrategy,
    location: &Location,
    chain: &AdapterChain,
    terminal: ValueOps,
) -> PropertySetter {
    let setter = strategy.setter(location);
    if chain.is_empty() {
        return make_property_setter(move |target, value, ctx| {
            setter(target, Incoming::Wire(value, ctx))
        });
    }
    let chain = chain.clone();
    make_property_setter(move |target, value, ctx| {
        let restored = chain.restore(terminal.from_value(value, ctx)?)?;
        setter(target, Incoming::Boxed(restored))
    })
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use crate::adapter::tests::{Celsius, CelsiusToKelvin, KelvinToText, TextToKelvin};
    use crate::factory::{CamelCase, MapperFactory};
    use crate::info::{PropertyInfo, TypeDescriptor};
    use crate::kind::Kind;
    use crate::value::Value;
    use crate::{ConfigError, MapError};
    use alloc::borrow::Cow;
    use alloc::string::String;

    #[derive(crate::Mapped)]
    struct Reading {
        #[mapped(adapted)]
        temperature: Celsius,
        station_name: String,
    }

    #[derive(crate::Mapped)]
    struct Renamed {
        #[mapped(rename = "id")]
        key: i32,
        id: i32,
    }

    fn config_error<T>(result: Result<T, MapError>) -> ConfigError {
        match result {
            Err(MapError::Config(err)) => err,
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("mapper built"),
        }
    }

    #[test]
    fn adapted_properties() {
        let factory = MapperFactory::builder()
            .adapter(CelsiusToKelvin)
            .adapter(KelvinToText)
            .build();
        let mapper = factory.create_or_get::<Reading>().unwrap();

        let temperature = &mapper.properties()[0];
        assert_eq!(temperature.name(), "temperature");
        assert_eq!(temperature.kind(), Kind::String);
        assert_eq!(temperature.adapter_chain().len(), 2);

        let reading = Reading {
            temperature: Celsius(1.0),
            station_name: String::from("north"),
        };
        assert_eq!(temperature.read(&reading).unwrap(), Value::from("274.15K"));
        assert_eq!(mapper.properties()[1].kind(), Kind::String);
    }

    #[test]
    fn construction_errors() {
        // No adapter for `Celsius`.
        let factory = MapperFactory::new();
        assert!(matches!(
            config_error(factory.create_or_get::<Reading>()),
            ConfigError::Unmappable {
                property: "temperature",
                ..
            }
        ));

        let factory = MapperFactory::builder()
            .adapter(CelsiusToKelvin)
            .adapter(KelvinToText)
            .adapter(TextToKelvin)
            .build();
        assert!(matches!(
            config_error(factory.create_or_get::<Reading>()),
            ConfigError::AdapterCycle { .. }
        ));

        let factory = MapperFactory::new();
        assert_eq!(
            config_error(factory.create_or_get::<Renamed>()),
            ConfigError::DuplicateName {
                owner: core::any::type_name::<Renamed>(),
                name: String::from("id"),
            }
        );
        assert_eq!(factory.cached_len(), 0);
    }

    #[test]
    fn naming_policies() {
        let factory = MapperFactory::builder()
            .naming(CamelCase)
            .adapter(CelsiusToKelvin)
            .build();
        let mapper = factory.create_or_get::<Reading>().unwrap();
        assert_eq!(mapper.properties()[1].name(), "stationName");

        let factory = MapperFactory::builder()
            .naming(|_: &TypeDescriptor, p: &PropertyInfo| Cow::Owned(p.name().to_uppercase()))
            .adapter(CelsiusToKelvin)
            .build();
        let mapper = factory.create_or_get::<Reading>().unwrap();
        assert_eq!(mapper.properties()[0].name(), "TEMPERATURE");
        assert_eq!(mapper.properties()[0].kind(), Kind::Double);
    }
}
