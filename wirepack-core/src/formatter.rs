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

//! The compiled encode/decode capability pair.
//!
//! A [`Formatter`] is type-erased so one registry can hold the whole
//! process's formatters; the typed entry points downcast at the boundary.
//! Once published through a resolver a formatter is immutable and shared
//! behind an `Arc` for the process lifetime.

use std::any::Any;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::buffer::{Reader, Writer};
use crate::error::Error;
use crate::resolver::Resolver;

pub type EncodeFn =
    Box<dyn Fn(&dyn Any, &mut Writer, &Resolver) -> Result<(), Error> + Send + Sync>;
pub type DecodeFn = Box<
    dyn for<'buf> Fn(&mut Reader<'buf>, &Resolver) -> Result<Box<dyn Any>, Error> + Send + Sync,
>;

/// Monomorphized hook resolving one type's formatter through a resolver;
/// captured as a plain fn pointer inside descriptors so type-erased plans
/// can recurse without carrying generics.
pub type ResolveFn = fn(&Resolver) -> Result<Arc<Formatter>, Error>;

/// Compiled encode/decode pair for one concrete type.
pub struct Formatter {
    type_name: &'static str,
    encode: EncodeFn,
    decode: DecodeFn,
}

impl Formatter {
    pub fn new(type_name: &'static str, encode: EncodeFn, decode: DecodeFn) -> Formatter {
        Formatter {
            type_name,
            encode,
            decode,
        }
    }

    /// Name of the type this formatter was compiled for.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn encode_erased(
        &self,
        value: &dyn Any,
        writer: &mut Writer,
        resolver: &Resolver,
    ) -> Result<(), Error> {
        (self.encode)(value, writer, resolver)
    }

    #[inline]
    pub fn decode_erased(
        &self,
        reader: &mut Reader<'_>,
        resolver: &Resolver,
    ) -> Result<Box<dyn Any>, Error> {
        (self.decode)(reader, resolver)
    }

    /// Typed decode, downcasting the erased result.
    pub fn decode_value<T: Any>(
        &self,
        reader: &mut Reader<'_>,
        resolver: &Resolver,
    ) -> Result<T, Error> {
        let value = self.decode_erased(reader, resolver)?;
        value.downcast::<T>().map(|v| *v).map_err(|_| {
            Error::type_error(format!(
                "formatter for `{}` produced a value that is not a {}",
                self.type_name,
                std::any::type_name::<T>()
            ))
        })
    }
}

impl std::fmt::Debug for Formatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Formatter")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Deferred, memoize-once formatter slot.
///
/// Member and element formatters resolve on first use rather than at
/// compile time, which keeps self-referential types resolvable and matches
/// the build-once-cache-forever discipline.
pub struct LazyFormatter {
    resolve: ResolveFn,
    cell: OnceCell<Arc<Formatter>>,
}

impl LazyFormatter {
    pub fn new(resolve: ResolveFn) -> LazyFormatter {
        LazyFormatter {
            resolve,
            cell: OnceCell::new(),
        }
    }

    pub fn get(&self, resolver: &Resolver) -> Result<&Arc<Formatter>, Error> {
        self.cell.get_or_try_init(|| (self.resolve)(resolver))
    }
}

impl std::fmt::Debug for LazyFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyFormatter")
            .field("resolved", &self.cell.get().is_some())
            .finish()
    }
}
