//! Shapes: per-type metadata the deserializer is driven by.
//!
//! A [`Shape`] describes one registered type: its structural kind
//! ([`Def`]), how to default-construct it, and the ordered constructor
//! list consulted by constructor-call syntax. Values move through the
//! engine type-erased as [`Instance`]s; every erased op downcasts
//! internally and surfaces a [`ShapeError`] when a registration promised
//! one type and the engine delivered another.

use core::any::{Any, TypeId, type_name};
use core::fmt;

/// A type-erased value owned by the engine while under construction.
pub type Instance = Box<dyn Any>;

pub(crate) type SetFn = Box<dyn Fn(&mut dyn Any, Instance) -> Result<(), ShapeError>>;
pub(crate) type PushFn = Box<dyn Fn(&mut dyn Any, Instance) -> Result<(), ShapeError>>;
pub(crate) type InsertFn = Box<dyn Fn(&mut dyn Any, Instance, Instance) -> Result<(), ShapeError>>;
pub(crate) type ParseFn = Box<dyn Fn(&str) -> Option<Instance>>;
pub(crate) type DefaultFn = Box<dyn Fn() -> Instance>;
pub(crate) type InvokeFn = Box<dyn Fn(Vec<Instance>) -> Result<Instance, ShapeError>>;

/// A defect surfaced by a type-erased op.
///
/// These indicate registration bugs (a setter fed a value of the wrong
/// type, an invoker handed the wrong argument count), not malformed
/// input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// A downcast failed inside a setter, push, insert, or invoker.
    TypeMismatch {
        /// The Rust type the op was registered against.
        expected: &'static str,
    },
    /// A constructor invoker received the wrong number of arguments.
    WrongArity {
        /// Declared parameter count.
        expected: usize,
        /// Arguments actually supplied.
        got: usize,
    },
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeError::TypeMismatch { expected } => {
                write!(f, "value does not have the registered type {expected}")
            }
            ShapeError::WrongArity { expected, got } => {
                write!(f, "constructor takes {expected} arguments, got {got}")
            }
        }
    }
}

impl std::error::Error for ShapeError {}

/// Structural kind of a shape, fixed at registration.
pub enum Def {
    /// Converted directly from text.
    Scalar(ScalarDef),
    /// Named fields, assigned one per structural line.
    Record(RecordDef),
    /// Ordered homogeneous elements, appended in input order.
    List(ListDef),
    /// Keyed homogeneous entries; duplicate keys overwrite.
    Map(MapDef),
}

impl fmt::Debug for Def {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Def::Scalar(_) => write!(f, "Scalar"),
            Def::Record(record) => write!(f, "Record({} fields)", record.fields.len()),
            Def::List(list) => write!(f, "List<{}>", list.t_name),
            Def::Map(map) => write!(f, "Map<{}, {}>", map.k_name, map.v_name),
        }
    }
}

/// A scalar kind: one parse function from text to value.
pub struct ScalarDef {
    pub(crate) parse: ParseFn,
}

impl ScalarDef {
    /// Attempt the textual conversion. `None` means the text is not in
    /// the lexical form of this type.
    pub fn parse(&self, text: &str) -> Option<Instance> {
        (self.parse)(text)
    }
}

/// One named field of a record shape.
pub struct Field {
    pub(crate) name: &'static str,
    pub(crate) shape_id: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) set: SetFn,
}

impl Field {
    /// Field name as written in input keys.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `TypeId` of the field's declared type.
    pub fn shape_id(&self) -> TypeId {
        self.shape_id
    }

    /// Rust name of the field's declared type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Assign a coerced value into `target`.
    pub fn set(&self, target: &mut dyn Any, value: Instance) -> Result<(), ShapeError> {
        (self.set)(target, value)
    }
}

/// A record with named fields.
pub struct RecordDef {
    pub(crate) fields: Vec<Field>,
}

impl RecordDef {
    /// Look a field up by name, returning its declaration index too.
    pub fn field(&self, name: &str) -> Option<(usize, &Field)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, field)| field.name == name)
    }

    /// Field at a declaration index previously returned by [`Self::field`].
    pub fn field_at(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// All field names, in declaration order.
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|field| field.name).collect()
    }

    /// All fields, in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}

/// An ordered sequence with a homogeneous element shape.
pub struct ListDef {
    pub(crate) t: TypeId,
    pub(crate) t_name: &'static str,
    pub(crate) push: PushFn,
}

impl ListDef {
    /// `TypeId` of the element type.
    pub fn t(&self) -> TypeId {
        self.t
    }

    /// Rust name of the element type, for diagnostics.
    pub fn t_name(&self) -> &'static str {
        self.t_name
    }

    /// Append a coerced element.
    pub fn push(&self, list: &mut dyn Any, item: Instance) -> Result<(), ShapeError> {
        (self.push)(list, item)
    }
}

/// A keyed map with homogeneous key and value shapes.
pub struct MapDef {
    pub(crate) k: TypeId,
    pub(crate) k_name: &'static str,
    pub(crate) v: TypeId,
    pub(crate) v_name: &'static str,
    pub(crate) insert: InsertFn,
}

impl MapDef {
    /// `TypeId` of the key type.
    pub fn k(&self) -> TypeId {
        self.k
    }

    /// Rust name of the key type, for diagnostics.
    pub fn k_name(&self) -> &'static str {
        self.k_name
    }

    /// `TypeId` of the value type.
    pub fn v(&self) -> TypeId {
        self.v
    }

    /// Rust name of the value type, for diagnostics.
    pub fn v_name(&self) -> &'static str {
        self.v_name
    }

    /// Insert a coerced entry. Duplicate keys overwrite.
    pub fn insert(&self, map: &mut dyn Any, key: Instance, value: Instance) -> Result<(), ShapeError> {
        (self.insert)(map, key, value)
    }
}

/// One declared constructor parameter.
pub struct Param {
    pub(crate) id: TypeId,
    pub(crate) type_name: &'static str,
}

impl Param {
    /// `TypeId` of the parameter type.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Rust name of the parameter type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn of<T: Any>() -> Param {
        Param {
            id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }
}

/// One registered constructor: ordered parameter shapes plus an invoker.
pub struct Constructor {
    pub(crate) params: Vec<Param>,
    pub(crate) invoke: InvokeFn,
}

impl Constructor {
    /// Declared parameters, in positional order.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Build a value from positionally coerced arguments.
    pub fn invoke(&self, args: Vec<Instance>) -> Result<Instance, ShapeError> {
        (self.invoke)(args)
    }
}

/// Registered metadata for one target type.
///
/// Built through [`Shape::scalar`], [`Shape::record`],
/// [`Shape::list_of`], or [`Shape::map_of`], then handed to
/// [`Registry::register`](crate::Registry::register).
pub struct Shape {
    pub(crate) id: TypeId,
    pub(crate) name: String,
    pub(crate) base: Option<String>,
    pub(crate) generic_args: Vec<TypeId>,
    pub(crate) def: Def,
    pub(crate) default_fn: Option<DefaultFn>,
    pub(crate) constructors: Vec<Constructor>,
}

impl Shape {
    /// `TypeId` of the described Rust type.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Display name used in input text and diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Generic base this shape is an instantiation of, if any
    /// (`"List"` for `Vec<E>` shapes).
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Structural kind.
    pub fn def(&self) -> &Def {
        &self.def
    }

    /// Default-construct a fresh value, when the type has a registered
    /// zero-argument construction.
    pub fn default_instance(&self) -> Option<Instance> {
        self.default_fn.as_ref().map(|default| default())
    }

    /// Registered constructors, in declaration order.
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// Mark this shape as an instantiation of a generic base, indexed by
    /// the registry under `(base, args)`.
    pub fn generic_origin(mut self, base: impl Into<String>, args: Vec<TypeId>) -> Self {
        self.base = Some(base.into());
        self.generic_args = args;
        self
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape({}, {:?})", self.name, self.def)
    }
}
