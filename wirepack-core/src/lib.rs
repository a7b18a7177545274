// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! # Wirepack Core
//!
//! Schema-driven binary serialization over a MessagePack-compatible wire
//! format. Given a closed type, the engine computes its wire schema once,
//! compiles an encode/decode pair for it, and reuses that pair for the
//! process lifetime.
//!
//! ## Architecture
//!
//! - **`buffer`** / **`wire`**: big-endian byte plumbing and the
//!   MessagePack format layer (canonical-minimal encode, tolerant decode)
//! - **`descriptor`**: per-type descriptors — the explicit stand-in for
//!   runtime reflection
//! - **`schema`** / **`synthesize`**: schema building and formatter
//!   synthesis for object types
//! - **`automaton`**: allocation-free UTF-8 key matching for string-keyed
//!   schemas
//! - **`builtin`** / **`ext`** / **`container`**: primitive, extension and
//!   generic-container formatters
//! - **`enum_`** / **`union`**: underlying-integer enums and closed
//!   polymorphic dispatch
//! - **`registry`** / **`resolver`**: the two-phase registration surface
//!   and the memoizing resolution chain
//!
//! ## Usage
//!
//! ```
//! use wirepack_core::descriptor::{
//!     ConstructorDef, Described, Descriptor, MemberDef, ObjectDescriptor, ParamDef,
//! };
//! use wirepack_core::error::Error;
//! use wirepack_core::{deserialize, serialize};
//! use std::any::Any;
//!
//! #[derive(Debug, PartialEq)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! impl Described for Point {
//!     fn descriptor() -> Descriptor {
//!         fn get_x(v: &dyn Any) -> Result<&dyn Any, Error> {
//!             Ok(&v.downcast_ref::<Point>().ok_or_else(|| Error::type_error("not a Point"))?.x)
//!         }
//!         fn get_y(v: &dyn Any) -> Result<&dyn Any, Error> {
//!             Ok(&v.downcast_ref::<Point>().ok_or_else(|| Error::type_error("not a Point"))?.y)
//!         }
//!         fn make(args: Vec<Box<dyn Any>>) -> Result<Box<dyn Any>, Error> {
//!             let mut args = args.into_iter();
//!             let x = *args.next().unwrap().downcast::<i32>().unwrap();
//!             let y = *args.next().unwrap().downcast::<i32>().unwrap();
//!             Ok(Box::new(Point { x, y }))
//!         }
//!         Descriptor::Object(
//!             ObjectDescriptor::new("Point")
//!                 .member(MemberDef::new::<i32>("x").with_int_key(0).with_getter(get_x))
//!                 .member(MemberDef::new::<i32>("y").with_int_key(1).with_getter(get_y))
//!                 .constructor(ConstructorDef::new(
//!                     vec![ParamDef::new::<i32>("x"), ParamDef::new::<i32>("y")],
//!                     make,
//!                 )),
//!         )
//!     }
//! }
//!
//! let bytes = serialize(&Point { x: 3, y: 4 }).unwrap();
//! assert_eq!(bytes, vec![0x92, 0x03, 0x04]);
//! let point: Point = deserialize(&bytes).unwrap();
//! assert_eq!(point, Point { x: 3, y: 4 });
//! ```

pub mod automaton;
pub mod buffer;
pub mod builtin;
pub mod container;
pub mod descriptor;
pub mod enum_;
pub mod error;
pub mod ext;
pub mod formatter;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod synthesize;
pub mod types;
pub mod union;
pub mod wire;

use crate::buffer::{Reader, Writer};
use crate::descriptor::Described;
use crate::error::Error;
use crate::resolver::Resolver;

/// Serializes a value with the process-wide default resolver.
pub fn serialize<T: Described>(value: &T) -> Result<Vec<u8>, Error> {
    serialize_with(value, registry::global())
}

/// Serializes a value with an explicit resolver.
pub fn serialize_with<T: Described>(value: &T, resolver: &Resolver) -> Result<Vec<u8>, Error> {
    let formatter = resolver.formatter::<T>()?;
    let mut writer = Writer::default();
    formatter.encode_erased(value, &mut writer, resolver)?;
    Ok(writer.into_bytes())
}

/// Deserializes a value with the process-wide default resolver.
pub fn deserialize<T: Described>(bytes: &[u8]) -> Result<T, Error> {
    deserialize_with(bytes, registry::global())
}

/// Deserializes a value with an explicit resolver. The buffer must hold
/// exactly one value; trailing bytes are an error.
pub fn deserialize_with<T: Described>(bytes: &[u8], resolver: &Resolver) -> Result<T, Error> {
    let formatter = resolver.formatter::<T>()?;
    let mut reader = Reader::new(bytes);
    let value = formatter.decode_value::<T>(&mut reader, resolver)?;
    if reader.remaining() != 0 {
        return Err(Error::invalid_data(format!(
            "{} trailing bytes after the decoded value",
            reader.remaining()
        )));
    }
    Ok(value)
}
