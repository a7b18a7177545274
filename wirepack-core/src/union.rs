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

//! Closed polymorphic dispatch over `Box<dyn Trait>` base types.
//!
//! Wire shape is a 2-element array `[key, payload]`. Key-to-subtype mapping
//! uses a dense jump table when the declared keys are zero-based and
//! contiguous, a binary search otherwise. Encoding a runtime type absent
//! from the subtype map and decoding an unknown key are both typed errors;
//! the unknown-key path still consumes the payload so the reader stays
//! positioned.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use crate::descriptor::{UnionDescriptor, UnionVariant};
use crate::error::Error;
use crate::formatter::{Formatter, LazyFormatter};
use crate::wire::skip_value;
use crate::ensure;

struct VariantPlan {
    key: u32,
    fmt: LazyFormatter,
    wrap: crate::descriptor::WrapFn,
}

enum KeyTable {
    /// Keys are exactly `0..n`: index directly.
    Dense,
    /// Sorted `(key, variant index)` pairs.
    Sparse(Vec<(u32, usize)>),
}

struct UnionPlan {
    name: &'static str,
    project: crate::descriptor::GetFn,
    variants: Vec<VariantPlan>,
    by_type: HashMap<TypeId, usize>,
    table: KeyTable,
}

impl UnionPlan {
    fn variant_for_key(&self, key: u32) -> Option<&VariantPlan> {
        match &self.table {
            KeyTable::Dense => self.variants.get(key as usize),
            KeyTable::Sparse(pairs) => pairs
                .binary_search_by_key(&key, |(k, _)| *k)
                .ok()
                .map(|i| &self.variants[pairs[i].1]),
        }
    }
}

fn build_plan(desc: UnionDescriptor) -> Result<UnionPlan, Error> {
    let UnionDescriptor {
        name,
        project,
        mut variants,
    } = desc;
    ensure!(
        !variants.is_empty(),
        Error::schema(format!("union `{}` declares no subtypes", name))
    );
    variants.sort_by_key(|v| v.key);
    let mut by_type = HashMap::with_capacity(variants.len());
    for (i, v) in variants.iter().enumerate() {
        if i > 0 && variants[i - 1].key == v.key {
            return Err(Error::schema(format!(
                "union `{}` declares key {} twice",
                name, v.key
            )));
        }
        if by_type.insert(v.type_id, i).is_some() {
            return Err(Error::schema(format!(
                "union `{}` declares subtype `{}` twice",
                name, v.type_name
            )));
        }
    }
    let dense = variants
        .iter()
        .enumerate()
        .all(|(i, v)| v.key == i as u32);
    let table = if dense {
        KeyTable::Dense
    } else {
        KeyTable::Sparse(variants.iter().enumerate().map(|(i, v)| (v.key, i)).collect())
    };
    let variants = variants
        .into_iter()
        .map(|v: UnionVariant| VariantPlan {
            key: v.key,
            fmt: LazyFormatter::new(v.resolve),
            wrap: v.wrap,
        })
        .collect();
    Ok(UnionPlan {
        name,
        project,
        variants,
        by_type,
        table,
    })
}

pub fn compile(type_name: &'static str, desc: UnionDescriptor) -> Result<Formatter, Error> {
    let plan = Arc::new(build_plan(desc)?);
    let encode_plan = Arc::clone(&plan);
    let decode_plan = plan;
    Ok(Formatter::new(
        type_name,
        Box::new(move |value, writer, resolver| {
            let plan = &encode_plan;
            let payload = (plan.project)(value)?;
            let index = plan.by_type.get(&payload.type_id()).copied().ok_or_else(|| {
                Error::unregistered_union_type(format!(
                    "runtime type of the value is not registered in union `{}`",
                    plan.name
                ))
            })?;
            let variant = &plan.variants[index];
            writer.write_array_header(2)?;
            writer.write_uint(variant.key as u64);
            variant.fmt.get(resolver)?.encode_erased(payload, writer, resolver)
        }),
        Box::new(move |reader, resolver| {
            let plan = &decode_plan;
            ensure!(
                !reader.peek_is_nil()?,
                Error::decode(format!(
                    "nil cannot decode into non-nullable union `{}`",
                    plan.name
                ))
            );
            let arity = reader.read_array_len()?;
            ensure!(
                arity == 2,
                Error::decode(format!(
                    "union `{}` expects a 2-element array, found {} elements",
                    plan.name, arity
                ))
            );
            let key = reader.read_uint()?;
            let variant = u32::try_from(key).ok().and_then(|k| plan.variant_for_key(k));
            let variant = match variant {
                Some(v) => v,
                None => {
                    skip_value(reader)?;
                    return Err(Error::unknown_union_key(format!(
                        "unknown key {} for union `{}`",
                        key, plan.name
                    )));
                }
            };
            let payload = variant.fmt.get(resolver)?.decode_erased(reader, resolver)?;
            (variant.wrap)(payload)
        }),
    ))
}

/// Declares a closed union over a boxed trait object: generates the
/// [`Described`](crate::descriptor::Described) impl for `Box<dyn Base>`.
/// The base trait must carry [`AsAny`](crate::descriptor::AsAny) as a
/// supertrait so the runtime type of a value can be recovered.
///
/// ```ignore
/// trait Animal: wirepack_core::descriptor::AsAny {}
///
/// wirepack_core::register_union! {
///     dyn Animal {
///         1 => Cat,
///         2 => Dog,
///     }
/// }
/// ```
#[macro_export]
macro_rules! register_union {
    (dyn $base:path { $($key:literal => $sub:ty),+ $(,)? }) => {
        impl $crate::descriptor::Described for ::std::boxed::Box<dyn $base> {
            fn descriptor() -> $crate::descriptor::Descriptor {
                fn project(
                    value: &dyn ::std::any::Any,
                ) -> ::std::result::Result<&dyn ::std::any::Any, $crate::error::Error> {
                    let boxed = value
                        .downcast_ref::<::std::boxed::Box<dyn $base>>()
                        .ok_or_else(|| {
                            $crate::error::Error::type_error("union value type mismatch")
                        })?;
                    ::std::result::Result::Ok($crate::descriptor::AsAny::as_dyn_any(&**boxed))
                }
                let mut variants = ::std::vec::Vec::new();
                $({
                    fn wrap(
                        payload: ::std::boxed::Box<dyn ::std::any::Any>,
                    ) -> ::std::result::Result<
                        ::std::boxed::Box<dyn ::std::any::Any>,
                        $crate::error::Error,
                    > {
                        let concrete = payload.downcast::<$sub>().map_err(|_| {
                            $crate::error::Error::type_error("union payload type mismatch")
                        })?;
                        ::std::result::Result::Ok(::std::boxed::Box::new(
                            ::std::boxed::Box::new(*concrete) as ::std::boxed::Box<dyn $base>,
                        ))
                    }
                    variants.push($crate::descriptor::UnionVariant::new::<$sub>($key, wrap));
                })+
                $crate::descriptor::Descriptor::Union($crate::descriptor::UnionDescriptor::new(
                    ::std::concat!("Box<dyn ", ::std::stringify!($base), ">"),
                    project,
                    variants,
                ))
            }
        }
    };
}
