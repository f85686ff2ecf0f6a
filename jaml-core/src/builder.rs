//! Typed registration builders.
//!
//! Registration happens once at program start: each builder takes typed
//! closures and erases them exactly once, at the builder boundary, so the
//! engine never sees a concrete type again.

use core::any::{Any, TypeId, type_name};
use core::hash::Hash;
use core::marker::PhantomData;
use std::collections::HashMap;

use crate::shape::{
    Constructor, Def, DefaultFn, Field, Instance, ListDef, MapDef, Param, RecordDef, ScalarDef,
    Shape, ShapeError,
};

fn cast<T: Any>(value: Instance) -> Result<T, ShapeError> {
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| ShapeError::TypeMismatch {
            expected: type_name::<T>(),
        })
}

impl Shape {
    /// A scalar shape for `T`, converted from text by `parse`.
    ///
    /// `parse` returning `None` means the text is not in the lexical form
    /// of `T` and surfaces as a conversion error.
    pub fn scalar<T: Any>(
        name: impl Into<String>,
        parse: impl Fn(&str) -> Option<T> + 'static,
    ) -> Shape {
        Shape {
            id: TypeId::of::<T>(),
            name: name.into(),
            base: None,
            generic_args: Vec::new(),
            def: Def::Scalar(ScalarDef {
                parse: Box::new(move |text| parse(text).map(|value| Box::new(value) as Instance)),
            }),
            default_fn: None,
            constructors: Vec::new(),
        }
    }

    /// Open a record builder for `T`.
    pub fn record<T: Any>(name: impl Into<String>) -> RecordBuilder<T> {
        RecordBuilder {
            name: name.into(),
            fields: Vec::new(),
            default_fn: None,
            constructors: Vec::new(),
            _target: PhantomData,
        }
    }

    /// A list shape for `Vec<E>`.
    ///
    /// Prefer [`Registry::register_list`](crate::Registry::register_list),
    /// which derives the display name and generic origin for you.
    pub fn list_of<E: Any>(name: impl Into<String>) -> Shape {
        Shape {
            id: TypeId::of::<Vec<E>>(),
            name: name.into(),
            base: Some("List".to_string()),
            generic_args: vec![TypeId::of::<E>()],
            def: Def::List(ListDef {
                t: TypeId::of::<E>(),
                t_name: type_name::<E>(),
                push: Box::new(|list, item| {
                    let list =
                        list.downcast_mut::<Vec<E>>()
                            .ok_or(ShapeError::TypeMismatch {
                                expected: type_name::<Vec<E>>(),
                            })?;
                    list.push(cast::<E>(item)?);
                    Ok(())
                }),
            }),
            default_fn: Some(Box::new(|| Box::new(Vec::<E>::new()) as Instance)),
            constructors: Vec::new(),
        }
    }

    /// A map shape for `HashMap<K, V>`. Duplicate keys overwrite.
    ///
    /// Prefer [`Registry::register_map`](crate::Registry::register_map),
    /// which derives the display name and generic origin for you.
    pub fn map_of<K: Any + Eq + Hash, V: Any>(name: impl Into<String>) -> Shape {
        Shape {
            id: TypeId::of::<HashMap<K, V>>(),
            name: name.into(),
            base: Some("Map".to_string()),
            generic_args: vec![TypeId::of::<K>(), TypeId::of::<V>()],
            def: Def::Map(MapDef {
                k: TypeId::of::<K>(),
                k_name: type_name::<K>(),
                v: TypeId::of::<V>(),
                v_name: type_name::<V>(),
                insert: Box::new(|map, key, value| {
                    let map = map.downcast_mut::<HashMap<K, V>>().ok_or(
                        ShapeError::TypeMismatch {
                            expected: type_name::<HashMap<K, V>>(),
                        },
                    )?;
                    map.insert(cast::<K>(key)?, cast::<V>(value)?);
                    Ok(())
                }),
            }),
            default_fn: Some(Box::new(|| Box::new(HashMap::<K, V>::new()) as Instance)),
            constructors: Vec::new(),
        }
    }
}

/// Builder for record shapes.
///
/// Field setters and constructors are given as typed closures; the
/// builder erases them. Constructors are tried in the order they are
/// added here.
pub struct RecordBuilder<T> {
    name: String,
    fields: Vec<Field>,
    default_fn: Option<DefaultFn>,
    constructors: Vec<Constructor>,
    _target: PhantomData<fn() -> T>,
}

impl<T: Any> RecordBuilder<T> {
    /// Declare a named field of type `F` with its setter.
    pub fn field<F: Any>(
        mut self,
        name: &'static str,
        set: impl Fn(&mut T, F) + 'static,
    ) -> Self {
        self.fields.push(Field {
            name,
            shape_id: TypeId::of::<F>(),
            type_name: type_name::<F>(),
            set: Box::new(move |target, value| {
                let target = target
                    .downcast_mut::<T>()
                    .ok_or(ShapeError::TypeMismatch {
                        expected: type_name::<T>(),
                    })?;
                set(target, cast::<F>(value)?);
                Ok(())
            }),
        });
        self
    }

    /// Use `T::default()` for zero-argument construction.
    pub fn with_default(self) -> Self
    where
        T: Default,
    {
        self.default_with(T::default)
    }

    /// Use a custom zero-argument construction.
    pub fn default_with(mut self, default: impl Fn() -> T + 'static) -> Self {
        self.default_fn = Some(Box::new(move || Box::new(default()) as Instance));
        self
    }

    /// Add a one-argument constructor.
    pub fn ctor1<A: Any>(mut self, build: impl Fn(A) -> T + 'static) -> Self {
        self.constructors.push(Constructor {
            params: vec![Param::of::<A>()],
            invoke: Box::new(move |args| {
                let [a]: [Instance; 1] = args.try_into().map_err(|args: Vec<Instance>| {
                    ShapeError::WrongArity {
                        expected: 1,
                        got: args.len(),
                    }
                })?;
                Ok(Box::new(build(cast::<A>(a)?)) as Instance)
            }),
        });
        self
    }

    /// Add a two-argument constructor.
    pub fn ctor2<A: Any, B: Any>(mut self, build: impl Fn(A, B) -> T + 'static) -> Self {
        self.constructors.push(Constructor {
            params: vec![Param::of::<A>(), Param::of::<B>()],
            invoke: Box::new(move |args| {
                let [a, b]: [Instance; 2] = args.try_into().map_err(|args: Vec<Instance>| {
                    ShapeError::WrongArity {
                        expected: 2,
                        got: args.len(),
                    }
                })?;
                Ok(Box::new(build(cast::<A>(a)?, cast::<B>(b)?)) as Instance)
            }),
        });
        self
    }

    /// Add a three-argument constructor.
    pub fn ctor3<A: Any, B: Any, C: Any>(mut self, build: impl Fn(A, B, C) -> T + 'static) -> Self {
        self.constructors.push(Constructor {
            params: vec![Param::of::<A>(), Param::of::<B>(), Param::of::<C>()],
            invoke: Box::new(move |args| {
                let [a, b, c]: [Instance; 3] =
                    args.try_into().map_err(|args: Vec<Instance>| {
                        ShapeError::WrongArity {
                            expected: 3,
                            got: args.len(),
                        }
                    })?;
                Ok(Box::new(build(cast::<A>(a)?, cast::<B>(b)?, cast::<C>(c)?)) as Instance)
            }),
        });
        self
    }

    /// Add a four-argument constructor.
    pub fn ctor4<A: Any, B: Any, C: Any, D: Any>(
        mut self,
        build: impl Fn(A, B, C, D) -> T + 'static,
    ) -> Self {
        self.constructors.push(Constructor {
            params: vec![
                Param::of::<A>(),
                Param::of::<B>(),
                Param::of::<C>(),
                Param::of::<D>(),
            ],
            invoke: Box::new(move |args| {
                let [a, b, c, d]: [Instance; 4] =
                    args.try_into().map_err(|args: Vec<Instance>| {
                        ShapeError::WrongArity {
                            expected: 4,
                            got: args.len(),
                        }
                    })?;
                Ok(Box::new(build(
                    cast::<A>(a)?,
                    cast::<B>(b)?,
                    cast::<C>(c)?,
                    cast::<D>(d)?,
                )) as Instance)
            }),
        });
        self
    }

    /// Finish the shape.
    pub fn build(self) -> Shape {
        Shape {
            id: TypeId::of::<T>(),
            name: self.name,
            base: None,
            generic_args: Vec::new(),
            def: Def::Record(RecordDef {
                fields: self.fields,
            }),
            default_fn: self.default_fn,
            constructors: self.constructors,
        }
    }
}
