//! The protocol between a mapper and a wire format.
//!
//! A format knows nothing about mapped types. On the write path a mapper
//! drives it call by call:
//!
//! ```text
//! write_begin
//! write_begin_object
//!     write_value(Some(name), kind, value)  write_field_separator(first, last)
//!     write_value(Some(name), kind, value)  write_field_separator(first, last)
//!     ...
//! write_end_object
//! write_end
//! ```
//!
//! A top-level value that is not an object is a single
//! `write_value(None, kind, value)` between `write_begin` and `write_end`.
//! Nested objects arrive as [`Value::Object`] and are handed back to
//! [`SerializationContext::serialize_nested`], which writes
//! `write_begin_object` to `write_end_object` with the nested type's mapper.
//!
//! On the read path [`Format::read`] turns the whole input into a [`Value`]
//! tree of scalars, arrays and [`ValueMap`](crate::ValueMap)s, the mapper
//! does the rest.

// -----------------------------------------------------------------------------
// Modules

#[cfg(feature = "json")]
pub mod json;

use crate::context::SerializationContext;
use crate::error::MapError;
use crate::kind::Kind;
use crate::value::Value;

// -----------------------------------------------------------------------------
// Format

/// A wire format.
///
/// `first` and `last` passed to [`write_field_separator`] let a format emit
/// delimiters between fields without buffering.
///
/// [`write_field_separator`]: Format::write_field_separator
///
/// # Examples
///
/// A format writing `name=value` lines:
///
/// ```
/// use vc_mapper::{Kind, MapError, SerializationContext, Value};
/// use vc_mapper::format::Format;
///
/// struct Lines;
///
/// impl Format for Lines {
///     type Output = String;
///     type Input = str;
///
///     fn write_value(
///         &self,
///         out: &mut String,
///         name: Option<&str>,
///         _: Kind,
///         value: &Value<'_>,
///         _: &SerializationContext<'_>,
///     ) -> Result<(), MapError> {
///         if let Some(name) = name {
///             out.push_str(name);
///             out.push('=');
///         }
///         match value {
///             Value::Int(v) => out.push_str(&v.to_string()),
///             Value::String(s) => out.push_str(s),
///             other => return Err(MapError::custom(format_args!("unsupported {}", other.kind()))),
///         }
///         Ok(())
///     }
///
///     fn write_begin_object(&self, _: &mut String) -> Result<(), MapError> {
///         Ok(())
///     }
///
///     fn write_field_separator(&self, out: &mut String, _: bool, last: bool) -> Result<(), MapError> {
///         if !last {
///             out.push('\n');
///         }
///         Ok(())
///     }
///
///     fn write_end_object(&self, _: &mut String) -> Result<(), MapError> {
///         Ok(())
///     }
///
///     fn read(&self, _: &str) -> Result<Value<'static>, MapError> {
///         Err(MapError::custom("write only"))
///     }
/// }
/// ```
pub trait Format {
    /// Where values are written, e.g. `String` or `Vec<u8>`.
    type Output: ?Sized;
    /// What [`read`](Self::read) parses, e.g. `str` or `[u8]`.
    type Input: ?Sized;

    /// Starts a document.
    fn write_begin(&self, out: &mut Self::Output) -> Result<(), MapError> {
        let _ = out;
        Ok(())
    }

    /// Writes one value, named if it is a field of an object.
    ///
    /// `kind` is the classified kind of the property, or [`Kind::Null`] for a
    /// null value.
    fn write_value(
        &self,
        out: &mut Self::Output,
        name: Option<&str>,
        kind: Kind,
        value: &Value<'_>,
        ctx: &SerializationContext<'_>,
    ) -> Result<(), MapError>;

    /// Starts an object.
    fn write_begin_object(&self, out: &mut Self::Output) -> Result<(), MapError>;

    /// Called after every field of an object.
    fn write_field_separator(
        &self,
        out: &mut Self::Output,
        first: bool,
        last: bool,
    ) -> Result<(), MapError>;

    /// Ends an object.
    fn write_end_object(&self, out: &mut Self::Output) -> Result<(), MapError>;

    /// Ends a document.
    fn write_end(&self, out: &mut Self::Output) -> Result<(), MapError> {
        let _ = out;
        Ok(())
    }

    /// Parses a whole document.
    ///
    /// Never produces [`Value::Object`].
    fn read(&self, input: &Self::Input) -> Result<Value<'static>, MapError>;
}

impl<F: Format + ?Sized> Format for &F {
    type Output = F::Output;
    type Input = F::Input;

    #[inline]
    fn write_begin(&self, out: &mut Self::Output) -> Result<(), MapError> {
        (**self).write_begin(out)
    }

    #[inline]
    fn write_value(
        &self,
        out: &mut Self::Output,
        name: Option<&str>,
        kind: Kind,
        value: &Value<'_>,
        ctx: &SerializationContext<'_>,
    ) -> Result<(), MapError> {
        (**self).write_value(out, name, kind, value, ctx)
    }

    #[inline]
    fn write_begin_object(&self, out: &mut Self::Output) -> Result<(), MapError> {
        (**self).write_begin_object(out)
    }

    #[inline]
    fn write_field_separator(
        &self,
        out: &mut Self::Output,
        first: bool,
        last: bool,
    ) -> Result<(), MapError> {
        (**self).write_field_separator(out, first, last)
    }

    #[inline]
    fn write_end_object(&self, out: &mut Self::Output) -> Result<(), MapError> {
        (**self).write_end_object(out)
    }

    #[inline]
    fn write_end(&self, out: &mut Self::Output) -> Result<(), MapError> {
        (**self).write_end(out)
    }

    #[inline]
    fn read(&self, input: &Self::Input) -> Result<Value<'static>, MapError> {
        (**self).read(input)
    }
}
