//! Items used by the code `#[derive(Mapped)]` generates.

#[cfg(feature = "auto_register")]
pub use inventory;

#[cfg(feature = "auto_register")]
pub use auto_register::__AutoRegisterFunc;

#[cfg(feature = "auto_register")]
mod auto_register {
    use crate::info::TypeDescriptor;

    /// Submitted by `#[mapped(auto_register)]` types, collected by
    /// [`MapperFactory::auto_register`](crate::MapperFactory::auto_register).
    pub struct __AutoRegisterFunc(pub fn() -> &'static TypeDescriptor);

    inventory::collect!(__AutoRegisterFunc);
}
