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

//! The mutable registration surface and the process-wide default resolver.
//!
//! Two-phase lifecycle: a [`Registry`] is mutable during configuration and
//! consumed into an immutable [`Resolver`]. The global default follows
//! freeze-on-first-use — the first formatter lookup anywhere in the process
//! flips a one-way latch, after which [`configure`] fails with
//! [`Error::RegistryFrozen`] rather than silently dropping the
//! registration.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;

use crate::buffer::{Reader, Writer};
use crate::error::Error;
use crate::formatter::Formatter;
use crate::resolver::{FormatterSource, Resolver};

/// Mutable configuration-phase registry.
#[derive(Default)]
pub struct Registry {
    formatters: HashMap<TypeId, Arc<Formatter>>,
    sources: Vec<Arc<dyn FormatterSource>>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Registers an explicit formatter for `T`, matched by exact type
    /// identity ahead of every other chain stage. Registering a type twice
    /// is an error.
    pub fn register_formatter<T, E, D>(&mut self, encode: E, decode: D) -> Result<(), Error>
    where
        T: Any,
        E: Fn(&T, &mut Writer, &Resolver) -> Result<(), Error> + Send + Sync + 'static,
        D: for<'buf> Fn(&mut Reader<'buf>, &Resolver) -> Result<T, Error> + Send + Sync + 'static,
    {
        let type_name = std::any::type_name::<T>();
        let formatter = Formatter::new(
            type_name,
            Box::new(move |value, writer, resolver| {
                let value = value.downcast_ref::<T>().ok_or_else(|| {
                    Error::type_error(format!("value is not a {}", type_name))
                })?;
                encode(value, writer, resolver)
            }),
            Box::new(move |reader, resolver| {
                Ok(Box::new(decode(reader, resolver)?) as Box<dyn Any>)
            }),
        );
        self.insert_formatter(TypeId::of::<T>(), type_name, Arc::new(formatter))
    }

    fn insert_formatter(
        &mut self,
        ty: TypeId,
        type_name: &'static str,
        formatter: Arc<Formatter>,
    ) -> Result<(), Error> {
        if self.formatters.insert(ty, formatter).is_some() {
            return Err(Error::schema(format!(
                "a formatter for `{}` is already registered",
                type_name
            )));
        }
        Ok(())
    }

    /// Appends a resolver stage; stages are consulted in registration
    /// order, after explicit formatters and before the built-in tables.
    pub fn register_source(&mut self, source: Arc<dyn FormatterSource>) {
        self.sources.push(source);
    }

    /// Consumes the registry into an immutable resolver chain.
    pub fn into_resolver(self) -> Resolver {
        Resolver::new(self.formatters, self.sources)
    }
}

static FROZEN: AtomicBool = AtomicBool::new(false);
static STAGING: Mutex<Option<Registry>> = Mutex::new(None);
static DEFAULT: OnceCell<Resolver> = OnceCell::new();

/// Flips the process-wide latch; called on every formatter lookup.
#[inline]
pub(crate) fn note_lookup() {
    FROZEN.store(true, Ordering::Release);
}

/// Mutates the global registry during the configuration phase. Fails once
/// the first formatter lookup has happened anywhere in the process.
pub fn configure<F>(f: F) -> Result<(), Error>
where
    F: FnOnce(&mut Registry) -> Result<(), Error>,
{
    let mut staging = STAGING.lock().expect("registry mutex poisoned");
    if FROZEN.load(Ordering::Acquire) {
        return Err(Error::registry_frozen(
            "the global registry is frozen: a formatter lookup already happened",
        ));
    }
    f(staging.get_or_insert_with(Registry::new))
}

/// The process-wide default resolver; materialized from the staged registry
/// on first use.
pub fn global() -> &'static Resolver {
    DEFAULT.get_or_init(|| {
        note_lookup();
        let staged = STAGING
            .lock()
            .expect("registry mutex poisoned")
            .take()
            .unwrap_or_default();
        staged.into_resolver()
    })
}
