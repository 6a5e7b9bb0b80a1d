use super::{
    AccessStrategy, Allocation, FieldGetter, FieldRef, FieldSetter, Location, make_getter,
    make_ref, make_setter,
};
use crate::error::{ConfigError, MapError, ShapeError};
use crate::info::{PropertyInfo, TypeDescriptor};

/// Field access through the accessors generated by `#[derive(Mapped)]`.
///
/// Every read and write is a checked downcast, no memory is touched
/// directly. Instances are created with their constructor, so the type must
/// be declared `#[mapped(default)]`, and absent properties keep the value the
/// constructor gave them.
#[derive(Debug, Default, Clone, Copy)]
pub struct CheckedAccess;

impl AccessStrategy for CheckedAccess {
    fn name(&self) -> &'static str {
        "checked"
    }

    fn can_access(&self, _: &PropertyInfo) -> bool {
        true
    }

    fn prepare(
        &self,
        owner: &'static TypeDescriptor,
        property: &'static PropertyInfo,
    ) -> Result<Location, ConfigError> {
        let index =
            Location::position(owner, property).ok_or(ConfigError::StrategyRejected {
                strategy: self.name(),
                owner: owner.type_name(),
                property: property.name(),
            })?;
        Ok(Location::new(owner, property, index, index))
    }

    fn getter(&self, location: &Location) -> FieldGetter {
        let location = *location;
        let property = location.property();
        let value_ops = property.ops().value().copied();
        make_getter(move |owner| {
            let field = property.get(owner).ok_or_else(|| location.wrong_owner())?;
            match &value_ops {
                Some(ops) => ops.to_value(field),
                None => Err(ShapeError::WrongType {
                    expected: property.type_name(),
                }
                .into()),
            }
        })
    }

    fn reference(&self, location: &Location) -> FieldRef {
        let location = *location;
        make_ref(move |owner| {
            location
                .property()
                .get(owner)
                .ok_or_else(|| location.wrong_owner())
        })
    }

    fn setter(&self, location: &Location) -> FieldSetter {
        let location = *location;
        make_setter(move |target, incoming| {
            let property = location.property();
            let owner = target.into_existing().ok_or(MapError::Allocation {
                type_name: location.owner().type_name(),
                reason: "checked access only writes constructed instances",
            })?;
            let field = property
                .get_mut(owner)
                .ok_or_else(|| location.wrong_owner())?;
            let value = incoming.into_boxed(property.ops())?;
            property.ops().assign(field, value)
        })
    }

    fn allocate(&self, descriptor: &'static TypeDescriptor) -> Result<Allocation, MapError> {
        descriptor
            .construct()
            .map(Allocation::constructed)
            .ok_or(MapError::Allocation {
                type_name: descriptor.type_name(),
                reason: "no constructor, declare the type `#[mapped(default)]`",
            })
    }
}

#[cfg(test)]
mod tests {
    use super::CheckedAccess;
    use crate::access::{AccessStrategy, Incoming, Target};
    use crate::factory::MapperFactory;
    use crate::info::Mapped;
    use crate::value::Value;
    use crate::MapError;

    #[derive(crate::Mapped, Default)]
    #[mapped(default)]
    struct Settings {
        volume: u8,
        title: String,
    }

    #[derive(crate::Mapped)]
    struct NoDefault {
        id: i32,
    }

    #[test]
    fn constructs_and_writes() {
        let factory = MapperFactory::new();
        let ctx = factory.context();
        let descriptor = Settings::descriptor();

        let mut allocation = CheckedAccess.allocate(descriptor).unwrap();
        for property in descriptor.properties() {
            let location = CheckedAccess.prepare(descriptor, property).unwrap();
            if property.name() == "volume" {
                CheckedAccess.setter(&location)(
                    allocation.target(),
                    Incoming::Wire(Value::Int(80), &ctx),
                )
                .unwrap();
            }
        }
        let settings = allocation.finish().unwrap().downcast::<Settings>().unwrap();
        assert_eq!(settings.volume, 80);
        assert_eq!(settings.title, "");

        let title = &descriptor.properties()[1];
        let location = CheckedAccess.prepare(descriptor, title).unwrap();
        assert_eq!(CheckedAccess.getter(&location)(&*settings).unwrap(), Value::from(""));

        let mut settings = *settings;
        let err = CheckedAccess.setter(&location)(
            Target::existing(&mut settings),
            Incoming::Wire(Value::Int(1), &ctx),
        )
        .unwrap_err();
        assert!(err.is_shape());
    }

    #[test]
    fn requires_constructor() {
        let err = CheckedAccess.allocate(NoDefault::descriptor()).err().unwrap();
        assert!(matches!(err, MapError::Allocation { .. }));
        let _ = NoDefault { id: 0 }.id;
    }
}
