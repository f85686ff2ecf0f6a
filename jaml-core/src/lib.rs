//! Type descriptors and the registration registry for Jaml
//! deserialization.
//!
//! The deserializer in the `jaml` crate is driven entirely by
//! [`Shape`]s: per-type metadata describing a type's structural kind
//! (scalar, record, list, or map), its fields, how to default-construct
//! it, and its ordered constructor list. Shapes are built with typed
//! closures at program start and registered in a [`Registry`]; from then
//! on the engine works type-erased.
//!
//! # Example
//!
//! ```
//! use jaml_core::{Registry, Shape};
//!
//! #[derive(Default)]
//! struct Server {
//!     host: String,
//!     port: i64,
//! }
//!
//! let mut registry = Registry::new();
//! registry.register(
//!     Shape::record::<Server>("Server")
//!         .field("host", |server: &mut Server, value: String| server.host = value)
//!         .field("port", |server: &mut Server, value: i64| server.port = value)
//!         .with_default()
//!         .build(),
//! );
//! ```
//!
//! For plain field-bag records the [`jaml_record!`] macro expands to the
//! same builder chain.

#![warn(missing_docs)]

mod builder;
mod registry;
mod shape;

pub use builder::RecordBuilder;
pub use registry::Registry;
pub use shape::{
    Constructor, Def, Field, Instance, ListDef, MapDef, Param, RecordDef, ScalarDef, Shape,
    ShapeError,
};

/// Register a plain field-bag record shape.
///
/// Expands to the [`Shape::record`] builder chain with one setter per
/// field and `T::default()` as the zero-argument construction, so the
/// type must implement [`Default`].
///
/// ```
/// use jaml_core::{Registry, jaml_record};
///
/// #[derive(Default)]
/// struct Config {
///     name: String,
///     port: i64,
/// }
///
/// let mut registry = Registry::new();
/// jaml_record!(registry, Config as "Config" { name: String, port: i64 });
/// assert!(registry.resolve("Config").is_some());
/// ```
#[macro_export]
macro_rules! jaml_record {
    ($registry:expr, $ty:ty as $name:literal { $($field:ident : $fty:ty),* $(,)? }) => {
        $registry.register(
            $crate::Shape::record::<$ty>($name)
                $(
                    .field(stringify!($field), |target: &mut $ty, value: $fty| {
                        target.$field = value;
                    })
                )*
                .with_default()
                .build(),
        )
    };
}
