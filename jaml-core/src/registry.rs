//! The registry: textual type names and Rust `TypeId`s to shapes.
//!
//! Registration is an explicit program-start step. The engine only ever
//! reads a registry, so one registry can drive any number of parses.

use core::any::{Any, TypeId, type_name};
use core::hash::Hash;
use std::collections::HashMap;

use crate::shape::Shape;

/// Maps textual type names and Rust types to registered [`Shape`]s.
///
/// [`Registry::new`] pre-registers the primitive scalars (`i8`..`i64`,
/// `isize`, `u8`..`u64`, `usize`, `f32`, `f64`, `bool`, `char`,
/// `String`) plus the surface aliases `int` (→ `i64`), `float`
/// (→ `f64`) and `string`/`str` (→ `String`).
///
/// # Example
///
/// ```
/// use jaml_core::{Registry, Shape};
///
/// #[derive(Default)]
/// struct Point {
///     x: i64,
///     y: i64,
/// }
///
/// let mut registry = Registry::new();
/// registry.register(
///     Shape::record::<Point>("Point")
///         .field("x", |point: &mut Point, value: i64| point.x = value)
///         .field("y", |point: &mut Point, value: i64| point.y = value)
///         .with_default()
///         .build(),
/// );
///
/// assert!(registry.resolve("Point").is_some());
/// assert!(registry.resolve("int").is_some());
/// ```
pub struct Registry {
    shapes: HashMap<TypeId, Shape>,
    names: HashMap<String, TypeId>,
    generics: HashMap<(String, Vec<TypeId>), TypeId>,
}

impl Registry {
    /// A registry with the primitive scalars pre-registered.
    pub fn new() -> Self {
        let mut registry = Registry {
            shapes: HashMap::new(),
            names: HashMap::new(),
            generics: HashMap::new(),
        };
        registry.register_primitives();
        registry
    }

    fn register_primitives(&mut self) {
        macro_rules! numeric {
            ($($ty:ty),* $(,)?) => {
                $(
                    self.register(Shape::scalar::<$ty>(stringify!($ty), |text| {
                        text.parse::<$ty>().ok()
                    }));
                )*
            };
        }
        numeric!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

        self.register(Shape::scalar::<bool>("bool", |text| text.parse().ok()));
        self.register(Shape::scalar::<char>("char", |text| {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => None,
            }
        }));
        self.register(Shape::scalar::<String>("String", |text| {
            Some(text.to_string())
        }));

        self.alias("int", "i64");
        self.alias("float", "f64");
        self.alias("string", "String");
        self.alias("str", "String");
    }

    /// Register a shape, indexing it by Rust type, by display name, and,
    /// for generic instantiations, by `(base, argument types)`.
    ///
    /// Re-registering a type or name replaces the previous entry.
    pub fn register(&mut self, shape: Shape) -> &mut Self {
        self.names.insert(shape.name.clone(), shape.id);
        if let Some(base) = &shape.base {
            self.generics
                .insert((base.clone(), shape.generic_args.clone()), shape.id);
        }
        self.shapes.insert(shape.id, shape);
        self
    }

    /// Add an alternative textual name (qualified paths included) for an
    /// already-registered shape. Unknown targets are ignored.
    pub fn alias(&mut self, alias: impl Into<String>, target: &str) -> &mut Self {
        if let Some(id) = self.names.get(target).copied() {
            self.names.insert(alias.into(), id);
        }
        self
    }

    /// Register `Vec<E>` as a `List` instantiation.
    ///
    /// The display name is derived from the element's registered name
    /// (`List<i64>` for `Vec<i64>`), so register the element first.
    pub fn register_list<E: Any>(&mut self) -> &mut Self {
        let name = format!("List<{}>", self.display_name(TypeId::of::<E>(), type_name::<E>()));
        self.register(Shape::list_of::<E>(name))
    }

    /// Register `HashMap<K, V>` as a `Map` instantiation.
    ///
    /// The display name is derived from the registered key and value
    /// names (`Map<String,i64>`), so register those first.
    pub fn register_map<K: Any + Eq + Hash, V: Any>(&mut self) -> &mut Self {
        let name = format!(
            "Map<{},{}>",
            self.display_name(TypeId::of::<K>(), type_name::<K>()),
            self.display_name(TypeId::of::<V>(), type_name::<V>()),
        );
        self.register(Shape::map_of::<K, V>(name))
    }

    fn display_name(&self, id: TypeId, fallback: &'static str) -> String {
        self.shapes
            .get(&id)
            .map(|shape| shape.name.clone())
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Resolve a textual class path: exact registered name first, then
    /// the final `.`-separated segment, so `demo.Point` finds `Point`
    /// without an explicit alias.
    pub fn resolve(&self, path: &str) -> Option<&Shape> {
        let id = self.names.get(path).or_else(|| {
            path.rsplit('.')
                .next()
                .filter(|segment| *segment != path)
                .and_then(|segment| self.names.get(segment))
        })?;
        self.shapes.get(id)
    }

    /// Resolve a generic instantiation from its base name and textual
    /// argument names: `resolve_generic("List", &["int"])`.
    pub fn resolve_generic(&self, base: &str, args: &[&str]) -> Option<&Shape> {
        let ids = args
            .iter()
            .map(|arg| self.resolve(arg).map(Shape::id))
            .collect::<Option<Vec<_>>>()?;
        let id = self.generics.get(&(base.to_string(), ids))?;
        self.shapes.get(id)
    }

    /// Shape registered for a Rust `TypeId`.
    pub fn shape_of(&self, id: TypeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    /// Shape registered for `T`.
    pub fn shape_of_type<T: Any>(&self) -> Option<&Shape> {
        self.shape_of(TypeId::of::<T>())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
