//! The Jaml deserializer: layer-stack structural parsing with
//! type-directed dispatch and constructor resolution.
//!
//! Each indentation level is one layer; the layer stack is the
//! `parse_block` recursion. A layer holds at most one *pending* value:
//! the most recent value it produced, not yet attached to its owner, so
//! a deeper block can fill the value in place before it is flushed.

use core::any::{Any, TypeId, type_name};
use std::fs;
use std::path::Path;

use jaml_core::{Constructor, Def, Instance, ListDef, MapDef, RecordDef, Registry, Shape,
    ShapeError};

use crate::error::{JamlError, JamlErrorKind};
use crate::parser::{self, Classified, CtorCall, Line, StructuralMatch};

type Result<T> = core::result::Result<T, JamlError>;

// ============================================================================
// Public API
// ============================================================================

/// Deserialize a Jaml string into a registered value of type `T`.
///
/// # Example
///
/// ```
/// use jaml::{Registry, jaml_record};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Config {
///     name: String,
///     port: i64,
/// }
///
/// let mut registry = Registry::new();
/// jaml_record!(registry, Config as "Config" { name: String, port: i64 });
///
/// let config: Config = jaml::from_str(&registry, "name: myapp\nport: 8080").unwrap();
/// assert_eq!(config.name, "myapp");
/// assert_eq!(config.port, 8080);
/// ```
pub fn from_str<T: Any>(registry: &Registry, input: &str) -> Result<T> {
    from_lines(registry, input.lines())
}

/// Deserialize an already-split sequence of lines.
///
/// Indentation is compared by raw leading-whitespace *character count*:
/// a tab counts as one character, not a column width, so mixed tabs and
/// spaces compare by whatever counts result. This matches the input
/// grammar and is intentional.
pub fn from_lines<T, I, S>(registry: &Registry, lines: I) -> Result<T>
where
    T: Any,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let owned: Vec<S> = lines.into_iter().collect();
    let lines: Vec<Line<'_>> = owned
        .iter()
        .enumerate()
        .map(|(index, raw)| Line {
            raw: raw.as_ref(),
            number: index as u32 + 1,
        })
        .collect();
    deserialize_lines(registry, &lines)
}

/// Read a file and deserialize it, attaching the path to every error.
pub fn from_path<T: Any>(registry: &Registry, path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let input = fs::read_to_string(path).map_err(|err| {
        JamlError::without_line(JamlErrorKind::Io(err.to_string())).with_path(&display)
    })?;
    from_str(registry, &input).map_err(|err| err.with_path(&display))
}

fn deserialize_lines<T: Any>(registry: &Registry, lines: &[Line<'_>]) -> Result<T> {
    log::trace!(
        "deserialize_lines: {} lines into {}",
        lines.len(),
        type_name::<T>()
    );

    let shape = registry.shape_of_type::<T>().ok_or_else(|| {
        JamlError::without_line(JamlErrorKind::UnknownType {
            path: type_name::<T>().to_string(),
        })
    })?;

    let mut deserializer = JamlDeserializer {
        registry,
        lines,
        pos: 0,
    };
    let root = deserializer.parse_root(shape)?;

    root.downcast::<T>().map(|boxed| *boxed).map_err(|_| {
        JamlError::without_line(JamlErrorKind::Shape(ShapeError::TypeMismatch {
            expected: type_name::<T>(),
        }))
    })
}

// ============================================================================
// Parse context
// ============================================================================

/// The most recent value produced at a layer, not yet attached to its
/// owner so a deeper block can still fill it.
struct Pending {
    value: Instance,
    shape_id: TypeId,
    type_name: &'static str,
    slot: Slot,
    line: u32,
}

/// Where a pending value lands when its layer flushes it.
enum Slot {
    /// Record field, by declaration index.
    Field(usize),
    /// Next list element.
    Element,
    /// Map entry, key already coerced.
    Entry(Instance),
}

/// Parse context: the line cursor owned by one in-flight parse.
struct JamlDeserializer<'input, 'reg> {
    registry: &'reg Registry,
    lines: &'input [Line<'input>],
    pos: usize,
}

impl<'input, 'reg> JamlDeserializer<'input, 'reg> {
    /// Default-construct the root and fill it from the base layer,
    /// which has width 0 and lives for the whole parse.
    fn parse_root(&mut self, shape: &Shape) -> Result<Instance> {
        log::trace!("parse_root: shape = {}", shape.name());
        let mut root = shape
            .default_instance()
            .ok_or_else(|| no_default(shape, None))?;
        self.parse_block(root.as_mut(), shape, Some(0))?;
        Ok(root)
    }

    /// Advance past ignorable lines; classify the next structural line
    /// without consuming it.
    fn peek_structural(&mut self) -> Result<Option<(StructuralMatch<'input>, u32)>> {
        while let Some(line) = self.lines.get(self.pos) {
            match parser::classify(line)? {
                Classified::Ignorable => self.pos += 1,
                Classified::Structural(matched) => return Ok(Some((matched, line.number))),
            }
        }
        Ok(None)
    }

    /// One layer of the stack: fill `target` from consecutive lines at a
    /// single indentation width.
    ///
    /// `width` is fixed at 0 for the base layer and adopted from the
    /// first structural line for nested layers. Returns *without
    /// consuming* the line that ends the layer, so the caller
    /// re-evaluates it against its own width; the line a nested parse
    /// ends on must stay available to every enclosing layer.
    fn parse_block(
        &mut self,
        target: &mut dyn Any,
        shape: &Shape,
        width: Option<usize>,
    ) -> Result<()> {
        log::trace!("parse_block: shape = {}, width = {width:?}", shape.name());

        let mut width = width;
        let mut pending: Option<Pending> = None;

        loop {
            let Some((matched, line_no)) = self.peek_structural()? else {
                break; // end of input closes every open layer
            };
            let layer_width = *width.get_or_insert(matched.indent);

            if matched.indent < layer_width {
                break; // layer-down: the line belongs to an enclosing layer
            }

            if matched.indent > layer_width {
                // Layer-up: the pending value becomes a nested structural
                // value and is filled before this layer flushes it.
                let Some(pending) = pending.as_mut() else {
                    return Err(JamlError::new(
                        JamlErrorKind::Syntax {
                            line_text: matched_line_text(self.lines, self.pos),
                        },
                        line_no,
                    ));
                };
                let registry = self.registry;
                let nested_shape = registry.shape_of(pending.shape_id).ok_or_else(|| {
                    JamlError::new(
                        JamlErrorKind::UnknownType {
                            path: pending.type_name.to_string(),
                        },
                        line_no,
                    )
                })?;
                self.parse_block(pending.value.as_mut(), nested_shape, None)?;
                continue; // re-evaluate the line the nested block ended on
            }

            self.flush(target, shape, pending.take())?;
            pending = Some(self.dispatch(&matched, shape, line_no)?);
            self.pos += 1;
        }

        self.flush(target, shape, pending.take())?;
        Ok(())
    }

    /// Structural dispatch: one strategy per structural value, selected
    /// from the target shape's `Def`.
    fn dispatch(
        &self,
        matched: &StructuralMatch<'_>,
        shape: &Shape,
        line_no: u32,
    ) -> Result<Pending> {
        log::trace!("dispatch: key = `{}`, shape = {}", matched.key, shape.name());
        match shape.def() {
            Def::Record(record) => self.dispatch_record(matched, record, line_no),
            Def::List(list) => self.dispatch_list(matched, list, line_no),
            Def::Map(map) => self.dispatch_map(matched, map, line_no),
            // A scalar owns no block; every key is foreign to it.
            Def::Scalar(_) => Err(JamlError::new(
                JamlErrorKind::UnknownField {
                    field: matched.key.to_string(),
                    expected: Vec::new(),
                    suggestion: None,
                },
                line_no,
            )),
        }
    }

    fn dispatch_record(
        &self,
        matched: &StructuralMatch<'_>,
        record: &RecordDef,
        line_no: u32,
    ) -> Result<Pending> {
        let Some((index, field)) = record.field(matched.key) else {
            let expected = record.field_names();
            let suggestion = closest_field(matched.key, &expected);
            return Err(JamlError::new(
                JamlErrorKind::UnknownField {
                    field: matched.key.to_string(),
                    expected,
                    suggestion,
                },
                line_no,
            ));
        };
        let field_shape = self.shape_for(field.shape_id(), field.type_name(), line_no)?;
        let value = self.coerce(matched.value, field_shape, line_no)?;
        Ok(Pending {
            value,
            shape_id: field.shape_id(),
            type_name: field.type_name(),
            slot: Slot::Field(index),
            line: line_no,
        })
    }

    fn dispatch_list(
        &self,
        matched: &StructuralMatch<'_>,
        list: &ListDef,
        line_no: u32,
    ) -> Result<Pending> {
        // The key token is only a marker; its text is irrelevant.
        let element_shape = self.shape_for(list.t(), list.t_name(), line_no)?;
        let value = self.coerce(matched.value, element_shape, line_no)?;
        Ok(Pending {
            value,
            shape_id: list.t(),
            type_name: list.t_name(),
            slot: Slot::Element,
            line: line_no,
        })
    }

    fn dispatch_map(
        &self,
        matched: &StructuralMatch<'_>,
        map: &MapDef,
        line_no: u32,
    ) -> Result<Pending> {
        let key_shape = self.shape_for(map.k(), map.k_name(), line_no)?;
        let value_shape = self.shape_for(map.v(), map.v_name(), line_no)?;
        let key = self.coerce(matched.key, key_shape, line_no)?;
        let value = self.coerce(matched.value, value_shape, line_no)?;
        Ok(Pending {
            value,
            shape_id: map.v(),
            type_name: map.v_name(),
            slot: Slot::Entry(key),
            line: line_no,
        })
    }

    /// Attach a layer's pending value to its owner. Runs when the cursor
    /// moves past the value's block: same-width successor, layer-down,
    /// or end of input.
    fn flush(&self, target: &mut dyn Any, shape: &Shape, pending: Option<Pending>) -> Result<()> {
        let Some(pending) = pending else {
            return Ok(());
        };
        let attached = match (shape.def(), pending.slot) {
            (Def::Record(record), Slot::Field(index)) => match record.field_at(index) {
                Some(field) => field.set(target, pending.value),
                None => Err(ShapeError::TypeMismatch {
                    expected: "a field index produced by dispatch",
                }),
            },
            (Def::List(list), Slot::Element) => list.push(target, pending.value),
            (Def::Map(map), Slot::Entry(key)) => map.insert(target, key, pending.value),
            // dispatch only produces slots matching the target's def
            _ => Err(ShapeError::TypeMismatch {
                expected: "a slot matching the target shape",
            }),
        };
        attached.map_err(|err| JamlError::new(JamlErrorKind::Shape(err), pending.line))
    }

    fn shape_for(&self, id: TypeId, name: &'static str, line_no: u32) -> Result<&'reg Shape> {
        let registry = self.registry;
        registry.shape_of(id).ok_or_else(|| {
            JamlError::new(
                JamlErrorKind::UnknownType {
                    path: name.to_string(),
                },
                line_no,
            )
        })
    }

    // ========================================================================
    // Value coercion
    // ========================================================================

    /// Convert raw value text into a typed value: trim, strip one pair
    /// of double quotes (contents used verbatim, no escapes), then
    /// scalar-parse or delegate to constructor resolution.
    fn coerce(&self, raw: &str, shape: &'reg Shape, line_no: u32) -> Result<Instance> {
        let text = strip_quotes(raw.trim());
        log::trace!("coerce: `{text}` as {}", shape.name());
        match shape.def() {
            Def::Scalar(scalar) => scalar.parse(text).ok_or_else(|| {
                JamlError::new(
                    JamlErrorKind::Conversion {
                        value: text.to_string(),
                        target: shape.name().to_string(),
                    },
                    line_no,
                )
            }),
            _ => self.instantiate(text, shape, line_no),
        }
    }

    // ========================================================================
    // Constructor resolution
    // ========================================================================

    /// Build a non-scalar value from constructor-call text:
    /// default-construct on empty text, otherwise parse the call
    /// grammar, resolve the class path, and trial-match constructors in
    /// declaration order. The first fully-coercing candidate wins.
    fn instantiate(&self, text: &str, declared: &'reg Shape, line_no: u32) -> Result<Instance> {
        if text.is_empty() {
            return declared
                .default_instance()
                .ok_or_else(|| no_default(declared, Some(line_no)));
        }

        let Some(call) = parser::parse_ctor_call(text) else {
            return Err(JamlError::new(
                JamlErrorKind::MalformedConstructor {
                    text: text.to_string(),
                },
                line_no,
            ));
        };
        log::trace!("instantiate: {call:?} against {}", declared.name());

        let shape = self.resolve_call_shape(&call, declared, line_no)?;

        let Some(args) = call.args.filter(|args| !args.is_empty()) else {
            return shape
                .default_instance()
                .ok_or_else(|| no_default(shape, Some(line_no)));
        };

        let candidates = shape
            .constructors()
            .iter()
            .filter(|ctor| ctor.params().len() == args.len());
        for ctor in candidates {
            if let Some(values) = self.try_coerce_args(&args, ctor, line_no) {
                return ctor
                    .invoke(values)
                    .map_err(|err| JamlError::new(JamlErrorKind::Shape(err), line_no));
            }
        }

        Err(JamlError::new(
            JamlErrorKind::NoMatchingConstructor {
                text: text.to_string(),
                target: shape.name().to_string(),
            },
            line_no,
        ))
    }

    /// Resolve the shape a constructor call constructs: the written
    /// class path if present, the declared shape otherwise; generic
    /// arguments select a registered instantiation.
    fn resolve_call_shape(
        &self,
        call: &CtorCall<'_>,
        declared: &'reg Shape,
        line_no: u32,
    ) -> Result<&'reg Shape> {
        let registry = self.registry;
        match (call.class_path, call.generic_args.is_empty()) {
            (None, true) => Ok(declared),
            (Some(path), true) => registry
                .resolve(path)
                .ok_or_else(|| unknown_type(path, line_no)),
            (written, false) => {
                let base = match written {
                    Some(base) => base,
                    None => declared.base().unwrap_or_else(|| declared.name()),
                };
                registry
                    .resolve_generic(base, &call.generic_args)
                    .ok_or_else(|| {
                        let rendered = format!("{base}<{}>", call.generic_args.join(","));
                        unknown_type(&rendered, line_no)
                    })
            }
        }
    }

    /// One constructor trial: every argument must coerce positionally.
    /// Failures here are flow control (the next candidate is tried),
    /// not errors.
    fn try_coerce_args(
        &self,
        args: &[&str],
        ctor: &Constructor,
        line_no: u32,
    ) -> Option<Vec<Instance>> {
        let registry = self.registry;
        let mut values = Vec::with_capacity(args.len());
        for (arg, param) in args.iter().zip(ctor.params()) {
            let shape = registry.shape_of(param.id())?;
            values.push(self.coerce(arg, shape, line_no).ok()?);
        }
        Some(values)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Strip one matching pair of double quotes; the contents are used
/// verbatim (no escape processing).
fn strip_quotes(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(text)
}

/// Closest field name for a did-you-mean hint.
fn closest_field(key: &str, candidates: &[&'static str]) -> Option<&'static str> {
    candidates
        .iter()
        .copied()
        .map(|candidate| {
            (
                strsim::normalized_damerau_levenshtein(key, candidate),
                candidate,
            )
        })
        .filter(|(score, _)| *score >= 0.6)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate)
}

fn no_default(shape: &Shape, line: Option<u32>) -> JamlError {
    let kind = JamlErrorKind::NoMatchingConstructor {
        text: String::new(),
        target: shape.name().to_string(),
    };
    match line {
        Some(line) => JamlError::new(kind, line),
        None => JamlError::without_line(kind),
    }
}

fn unknown_type(path: &str, line_no: u32) -> JamlError {
    JamlError::new(
        JamlErrorKind::UnknownType {
            path: path.to_string(),
        },
        line_no,
    )
}

fn matched_line_text(lines: &[Line<'_>], pos: usize) -> String {
    lines
        .get(pos)
        .map(|line| line.raw.to_string())
        .unwrap_or_default()
}
