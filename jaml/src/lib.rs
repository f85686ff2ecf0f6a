//! Deserialization for Jaml, an indentation-sensitive configuration
//! language with typed, registry-driven value construction.
//!
//! Structure comes from indentation (`key: value` lines, `-` sequence
//! markers, `#` comments); values are coerced against the statically
//! registered target shape, including constructor-call syntax such as
//! `Point(1,2)` or `List<int>` for dynamically-named construction.
//!
//! Target types are described to the engine through a
//! [`Registry`] of shapes, built once at program start; see the
//! `jaml-core` crate and the [`jaml_record!`] macro.
//!
//! # Example
//!
//! ```
//! use jaml::{Registry, jaml_record};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Config {
//!     name: String,
//!     port: i64,
//! }
//!
//! let mut registry = Registry::new();
//! jaml_record!(registry, Config as "Config" { name: String, port: i64 });
//!
//! let input = "\
//! ## service config
//! name: myapp
//! port: 8080";
//!
//! let config: Config = jaml::from_str(&registry, input).unwrap();
//! assert_eq!(config.name, "myapp");
//! assert_eq!(config.port, 8080);
//! ```

#![warn(missing_docs)]

mod deserialize;
mod error;
mod parser;

pub use deserialize::{from_lines, from_path, from_str};
pub use error::{JamlError, JamlErrorKind};

// Re-export the registration surface so callers need only this crate.
pub use jaml_core::{Def, RecordBuilder, Registry, Shape, ShapeError, jaml_record};
