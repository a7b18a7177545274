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

//! # Wirepack Derive Macros
//!
//! `#[derive(Described)]` generates the per-type descriptor the wirepack
//! engine resolves formatters from.
//!
//! **Structs with named fields** become object descriptors: one member per
//! field with generated accessor functions, plus a constructor taking every
//! serialized field in declaration order. Field behavior is tuned with
//! `#[pack(...)]` attributes:
//!
//! - `#[pack(key = 0)]` — integer wire key (positional-array layout)
//! - `#[pack(key = "name")]` — string wire key (named-map layout)
//! - `#[pack(skip)]` — exclude the field; it is default-initialized on
//!   decode, so its type must implement `Default`
//! - `#[pack(formatter = "path::to::build")]` — per-field formatter
//!   override, a `fn(&Resolver) -> Result<Formatter, Error>`
//!
//! Fields with no `key` attribute produce a contractless schema keyed by
//! field name. Key-consistency and uniqueness are validated by the engine's
//! schema builder at first use, not at macro expansion time.
//!
//! The struct-level `#[pack(default)]` attribute registers a
//! default-construct fallback (requires `Default`). Sparse int-key schemas
//! need it: the generated constructor binds parameters by position, which
//! cannot match keys with gaps, so decoding falls back to
//! default-construct-then-assign.
//!
//! **Enums with unit variants** become underlying-integer enum descriptors.
//! The underlying kind comes from `#[repr(...)]` (default `i32`);
//! discriminant values from explicit `Variant = N` assignments, continuing
//! sequentially after the last explicit value.
//!
//! ```ignore
//! use wirepack_derive::Described;
//!
//! #[derive(Described, Debug, PartialEq)]
//! struct Point {
//!     #[pack(key = 0)]
//!     x: i32,
//!     #[pack(key = 1)]
//!     y: i32,
//! }
//!
//! #[derive(Described, Debug, PartialEq)]
//! #[repr(u8)]
//! enum Suit {
//!     Clubs,
//!     Spades = 7,
//!     Hearts,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod object;

/// Derive macro generating a `wirepack_core::descriptor::Described` impl.
#[proc_macro_derive(Described, attributes(pack))]
pub fn proc_macro_derive_described(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    object::derive_described(&input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
