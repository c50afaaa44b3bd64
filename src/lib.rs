//! Streaming, depth-selective JSON decoding.
//!
//! A [`Decoder`] consumes any [`std::io::Read`] source and publishes decoded
//! values the moment their closing delimiter is consumed, selected by nesting
//! depth. Multi-gigabyte documents, newline-delimited streams, and
//! concatenated JSON values all decode in bounded memory: only values inside
//! the emit frontier are materialized, and a prefetch worker overlaps reading
//! with parsing.
//!
//! # Examples
//!
//! Pull the elements out of a top-level array without ever holding the whole
//! document:
//!
//! ```
//! use std::io::Cursor;
//! use jsonsift::{Decoder, Value};
//!
//! let input = Cursor::new(br#"[{"id": 1}, {"id": 2}]"#.to_vec());
//! let ids: Vec<_> = Decoder::new(input, 1)
//!     .stream()
//!     .filter_map(|mv| match mv.value {
//!         Value::Object(map) => map.get("id").cloned(),
//!         _ => None,
//!     })
//!     .collect();
//! assert_eq!(ids, vec![Value::Integer(1), Value::Integer(2)]);
//! ```

mod decoder;
mod error;
mod scanner;
mod scratch;
mod value;

pub use decoder::{Decoder, DecoderOptions, MetaValue, ValueStream};
pub use error::{DecoderError, SyntaxError};
pub use value::{Array, KeyValue, Map, Value, ValueType};

#[cfg(test)]
mod tests;
