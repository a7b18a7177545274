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

//! # Wirepack
//!
//! Schema-driven binary serialization over a MessagePack-compatible wire
//! format. A type's wire schema is computed once, a formatter is compiled
//! for it once, and the compiled pair is reused for the process lifetime —
//! no per-call reflection, no name hashing on the hot path.
//!
//! ## Quick start
//!
//! ```
//! use wirepack::{deserialize, serialize, Described};
//!
//! #[derive(Described, Debug, PartialEq)]
//! struct Point {
//!     #[pack(key = 0)]
//!     x: i32,
//!     #[pack(key = 1)]
//!     y: i32,
//! }
//!
//! let bytes = serialize(&Point { x: 3, y: 4 }).unwrap();
//! // positional-array layout: [3, 4]
//! assert_eq!(bytes, vec![0x92, 0x03, 0x04]);
//! let point: Point = deserialize(&bytes).unwrap();
//! assert_eq!(point, Point { x: 3, y: 4 });
//! ```
//!
//! Dropping the `#[pack(key = ...)]` attributes switches the schema to the
//! contractless named-map layout keyed by field name, which tolerates
//! unknown fields on decode for forward compatibility.
//!
//! ## Configuration
//!
//! The global registry is mutable until the first formatter lookup:
//!
//! ```ignore
//! wirepack::registry::configure(|registry| {
//!     registry.register_formatter::<MyType, _, _>(encode_fn, decode_fn)
//! })?;
//! ```
//!
//! For an isolated chain, build a `Registry`, consume it with
//! `into_resolver()`, and use [`serialize_with`]/[`deserialize_with`].

pub use wirepack_core::buffer::{Reader, Writer};
pub use wirepack_core::descriptor::{
    AsAny, ConstructorDef, Described, Descriptor, EnumDescriptor, FieldType, KeyDef, MemberDef,
    ObjectDescriptor, ParamDef, UnionDescriptor, UnionVariant,
};
pub use wirepack_core::error::Error;
pub use wirepack_core::formatter::Formatter;
pub use wirepack_core::registry::{self, Registry};
pub use wirepack_core::resolver::{FormatterSource, Resolver};
pub use wirepack_core::types::Bytes;
pub use wirepack_core::{deserialize, deserialize_with, serialize, serialize_with};
pub use wirepack_core::register_union;
pub use wirepack_derive::Described;
