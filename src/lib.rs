//! Serde support for bracket-nested querystrings
//!
//! Querystrings are not formally defined and loosely take the form of
//! _nested_ urlencoded queries: `user[name]=Alice&user[tags][]=a&user[tags][]=b`.
//!
//! This library follows the PHP/Rack convention: every `[selector]` after a
//! root key nests one level deeper, `[]` appends to a list, and numeric
//! selectors index into one.
//!
//! ## Lists or maps
//!
//! When decoding, every subtree is classified once from its selectors:
//!
//! - only `[]` selectors: a list in the order the values appeared
//! - only non-negative integer selectors: a list ordered by index (gaps are
//!   closed, and a repeated index keeps the last value)
//! - anything else: a map, sorted by key
//!
//! A repeated plain key (`a=1&a=2`) is also a list. A key that carries both a
//! value and nested keys (`a=1&a[b]=2`) keeps the nested keys.
//!
//! ## Supported Types
//!
//! At the **top level**, `serde_qstring` supports structs, maps and strings.
//! A top-level string is the whole querystring, unescaped. Lists and
//! fixed-size arrays can be decoded from an input with a single root key.
//!
//! Below the top level, all primitive types, strings, options, lists,
//! fixed-size arrays, tuples, maps with string keys, structs and unit enum
//! variants are supported. Raw bytes and enum variants carrying data are not.
//!
//! Values that are absent from the input deserialize to their zero value:
//! `0`, `false`, `""`, `None`, an empty collection, a struct whose fields
//! are all zero, or the first variant of an enum (which must be a unit
//! variant). The empty sentinel `key=` works the same way for options,
//! collections and structs, and is what the serializer writes for `None` and
//! empty collections.
//!
//! Every declared field of a struct is filled, either from the input or
//! with its zero value, so serde's own missing-field handling never runs.
//! In particular `#[serde(default)]` and `#[serde(default = "path")]` have
//! no effect: an absent `#[serde(default = "five")] page: u32` is `0`, not
//! `5`. Wrap the field in `Option` to tell an absent key apart from a zero.
//!
//! ## Usage
//!
//! ```
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Deserialize, Serialize)]
//! struct Address {
//!     city: String,
//!     postcode: String,
//! }
//!
//! #[derive(Debug, PartialEq, Deserialize, Serialize)]
//! struct QueryParams {
//!     id: u8,
//!     name: String,
//!     address: Address,
//!     phone: u32,
//!     user_ids: Vec<u8>,
//! }
//!
//! let params = QueryParams {
//!     id: 42,
//!     name: "Acme".to_string(),
//!     phone: 12345,
//!     address: Address {
//!         city: "Carrot City".to_string(),
//!         postcode: "12345".to_string(),
//!     },
//!     user_ids: vec![1, 2, 3, 4],
//! };
//! let rec_params: QueryParams = serde_qstring::from_str(
//!     "\
//!     name=Acme&id=42&phone=12345&address[postcode]=12345&\
//!     address[city]=Carrot+City&user_ids[0]=1&user_ids[1]=2&\
//!     user_ids[2]=3&user_ids[3]=4",
//! )
//! .unwrap();
//! assert_eq!(rec_params, params);
//!
//! assert_eq!(
//!     serde_qstring::to_string(&params).unwrap(),
//!     "id=42&name=Acme&address[city]=Carrot+City&address[postcode]=12345&\
//!      phone=12345&user_ids[0]=1&user_ids[1]=2&user_ids[2]=3&user_ids[3]=4"
//! );
//! ```
//!
//! ## Omitting empty fields
//!
//! [`is_empty`] can be used with `skip_serializing_if` so that a zero-valued
//! field is left out instead of being written as `field=`.
//!
//! ## Logging
//!
//! Input that is accepted but partly discarded (conflicting keys, repeated
//! indices, keys nested too deep) is reported through `tracing` at `debug`
//! level. With the `debug_parsed` feature the compacted tree of every
//! decoded input is traced as well.

mod config;
mod de;
mod error;
mod ser;
mod value;

pub use config::{ArrayFormat, Config};
pub use de::{
    decode_to_list, decode_to_map, decode_to_string, from_bytes, from_str, QsDeserializer,
};
pub use error::{Error, Result};
pub use ser::{is_empty, to_pairs, to_string, to_writer, EncodingSink, PairSink, QsSerializer};
pub use value::{Map, Value};
