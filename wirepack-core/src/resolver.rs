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

//! The immutable resolution chain with permanent per-type memoization.
//!
//! Chain order, earlier entries shadowing later ones:
//! 1. explicit formatters registered by exact type identity,
//! 2. custom formatter sources, in registration order,
//! 3. the native extension table (Uuid, Decimal, Duration, date-times),
//! 4. the built-in primitive table,
//! 5. the type's own descriptor: declared custom formatter (which also
//!    covers the generic containers), enum, union, then schema-built
//!    object — key-attributed or contractless by name.
//!
//! The first hit is compiled at most once and cached for the process
//! lifetime; concurrent first requests for one type converge on a single
//! published formatter.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::OnceCell;

use crate::descriptor::{Described, Descriptor};
use crate::error::Error;
use crate::formatter::Formatter;
use crate::registry;
use crate::{builtin, enum_, ext, schema, synthesize, union};

/// A pluggable stage of the resolver chain: maps a type identity to a
/// formatter or declines.
pub trait FormatterSource: Send + Sync + 'static {
    /// Name shown in chain identity diagnostics.
    fn name(&self) -> &'static str;

    fn formatter(&self, ty: TypeId) -> Option<Arc<Formatter>>;
}

type CacheSlot = Arc<OnceCell<Arc<Formatter>>>;

/// Immutable resolver chain; built by consuming a
/// [`Registry`](crate::registry::Registry).
pub struct Resolver {
    explicit: HashMap<TypeId, Arc<Formatter>>,
    sources: Vec<Arc<dyn FormatterSource>>,
    chain: String,
    cache: RwLock<HashMap<TypeId, CacheSlot>>,
}

impl Resolver {
    pub(crate) fn new(
        explicit: HashMap<TypeId, Arc<Formatter>>,
        sources: Vec<Arc<dyn FormatterSource>>,
    ) -> Resolver {
        let mut chain = String::from("explicit");
        for source in &sources {
            chain.push_str(" > ");
            chain.push_str(source.name());
        }
        chain.push_str(" > extension > builtin > descriptor");
        Resolver {
            explicit,
            sources,
            chain,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Human-readable identity of the chain, used in lookup failures.
    pub fn chain_identity(&self) -> &str {
        &self.chain
    }

    /// Returns the formatter for `T`, compiling it on the first request and
    /// returning the identical cached instance afterwards.
    pub fn formatter<T: Described>(&self) -> Result<Arc<Formatter>, Error> {
        registry::note_lookup();
        let ty = TypeId::of::<T>();
        let slot = {
            let cache = self.cache.read().expect("formatter cache poisoned");
            cache.get(&ty).cloned()
        };
        let slot = match slot {
            Some(slot) => slot,
            None => {
                let mut cache = self.cache.write().expect("formatter cache poisoned");
                cache
                    .entry(ty)
                    .or_insert_with(|| Arc::new(OnceCell::new()))
                    .clone()
            }
        };
        slot.get_or_try_init(|| self.resolve_uncached::<T>()).cloned()
    }

    fn resolve_uncached<T: Described>(&self) -> Result<Arc<Formatter>, Error> {
        let ty = TypeId::of::<T>();
        let type_name = std::any::type_name::<T>();
        if let Some(formatter) = self.explicit.get(&ty) {
            return Ok(formatter.clone());
        }
        for source in &self.sources {
            if let Some(formatter) = source.formatter(ty) {
                return Ok(formatter);
            }
        }
        if let Some(formatter) = ext::lookup(ty) {
            return Ok(formatter);
        }
        if let Some(formatter) = builtin::lookup(ty) {
            return Ok(formatter);
        }
        match T::descriptor() {
            Descriptor::Custom(build) => Ok(Arc::new(build(self)?)),
            Descriptor::Enum(desc) => Ok(Arc::new(enum_::compile(type_name, desc)?)),
            Descriptor::Union(desc) => Ok(Arc::new(union::compile(type_name, desc)?)),
            Descriptor::Object(desc) => {
                let schema = schema::build(desc)?;
                Ok(Arc::new(synthesize::compile(type_name, schema)?))
            }
            Descriptor::Builtin => Err(Error::formatter_not_found(
                type_name,
                self.chain.clone(),
            )),
        }
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver").field("chain", &self.chain).finish()
    }
}
