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

//! Generic container support: nullable wrapping, sequences, maps, tuples
//! and boxes. Element formatters resolve lazily through the chain, so
//! containers of self-referential types build without recursion at
//! synthesis time.
//!
//! The nullable convention lives here: `Option<T>` encodes `None` as the
//! single-byte Nil marker and delegates `Some` to the inner formatter
//! untouched.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::Arc;

use crate::descriptor::{resolve_described, Described, Descriptor};
use crate::error::Error;
use crate::formatter::{Formatter, LazyFormatter};
use crate::resolver::Resolver;
use crate::ensure;

fn value_mismatch<T>() -> Error {
    Error::type_error(format!(
        "value is not a {}",
        std::any::type_name::<T>()
    ))
}

impl<T: Described> Described for Option<T> {
    fn descriptor() -> Descriptor {
        Descriptor::Custom(build_option::<T>)
    }
}

fn build_option<T: Described>(_resolver: &Resolver) -> Result<Formatter, Error> {
    let inner = Arc::new(LazyFormatter::new(resolve_described::<T>));
    let enc = Arc::clone(&inner);
    let dec = inner;
    Ok(Formatter::new(
        std::any::type_name::<Option<T>>(),
        Box::new(move |value, writer, resolver| {
            let opt = value
                .downcast_ref::<Option<T>>()
                .ok_or_else(value_mismatch::<Option<T>>)?;
            match opt {
                None => {
                    writer.write_nil();
                    Ok(())
                }
                Some(v) => enc.get(resolver)?.encode_erased(v, writer, resolver),
            }
        }),
        Box::new(move |reader, resolver| {
            if reader.peek_is_nil()? {
                reader.read_nil()?;
                return Ok(Box::new(None::<T>) as Box<dyn Any>);
            }
            let value = dec.get(resolver)?.decode_value::<T>(reader, resolver)?;
            Ok(Box::new(Some(value)) as Box<dyn Any>)
        }),
    ))
}

impl<T: Described> Described for Vec<T> {
    fn descriptor() -> Descriptor {
        Descriptor::Custom(build_vec::<T>)
    }
}

fn build_vec<T: Described>(_resolver: &Resolver) -> Result<Formatter, Error> {
    let element = Arc::new(LazyFormatter::new(resolve_described::<T>));
    let enc = Arc::clone(&element);
    let dec = element;
    Ok(Formatter::new(
        std::any::type_name::<Vec<T>>(),
        Box::new(move |value, writer, resolver| {
            let vec = value
                .downcast_ref::<Vec<T>>()
                .ok_or_else(value_mismatch::<Vec<T>>)?;
            writer.write_array_header(vec.len())?;
            let fmt = enc.get(resolver)?;
            for item in vec {
                fmt.encode_erased(item, writer, resolver)?;
            }
            Ok(())
        }),
        Box::new(move |reader, resolver| {
            let count = reader.read_array_len()?;
            let fmt = dec.get(resolver)?;
            // cap pre-allocation so a corrupt length cannot reserve the moon
            let mut vec: Vec<T> = Vec::with_capacity(count.min(4096));
            for _ in 0..count {
                vec.push(fmt.decode_value::<T>(reader, resolver)?);
            }
            Ok(Box::new(vec) as Box<dyn Any>)
        }),
    ))
}

impl<T: Described> Described for Box<T> {
    fn descriptor() -> Descriptor {
        Descriptor::Custom(build_boxed::<T>)
    }
}

fn build_boxed<T: Described>(_resolver: &Resolver) -> Result<Formatter, Error> {
    let inner = Arc::new(LazyFormatter::new(resolve_described::<T>));
    let enc = Arc::clone(&inner);
    let dec = inner;
    Ok(Formatter::new(
        std::any::type_name::<Box<T>>(),
        Box::new(move |value, writer, resolver| {
            let boxed = value
                .downcast_ref::<Box<T>>()
                .ok_or_else(value_mismatch::<Box<T>>)?;
            enc.get(resolver)?.encode_erased(&**boxed, writer, resolver)
        }),
        Box::new(move |reader, resolver| {
            let value = dec.get(resolver)?.decode_value::<T>(reader, resolver)?;
            Ok(Box::new(Box::new(value)) as Box<dyn Any>)
        }),
    ))
}

macro_rules! impl_map {
    ($map:ident, $build:ident, $($bound:tt)+) => {
        impl<K, V> Described for $map<K, V>
        where
            K: Described + $($bound)+,
            V: Described,
        {
            fn descriptor() -> Descriptor {
                Descriptor::Custom($build::<K, V>)
            }
        }

        fn $build<K, V>(_resolver: &Resolver) -> Result<Formatter, Error>
        where
            K: Described + $($bound)+,
            V: Described,
        {
            let fmts = Arc::new((
                LazyFormatter::new(resolve_described::<K>),
                LazyFormatter::new(resolve_described::<V>),
            ));
            let enc = Arc::clone(&fmts);
            let dec = fmts;
            Ok(Formatter::new(
                std::any::type_name::<$map<K, V>>(),
                Box::new(move |value, writer, resolver| {
                    let map = value
                        .downcast_ref::<$map<K, V>>()
                        .ok_or_else(value_mismatch::<$map<K, V>>)?;
                    writer.write_map_header(map.len())?;
                    let key_fmt = enc.0.get(resolver)?;
                    let value_fmt = enc.1.get(resolver)?;
                    for (k, v) in map {
                        key_fmt.encode_erased(k, writer, resolver)?;
                        value_fmt.encode_erased(v, writer, resolver)?;
                    }
                    Ok(())
                }),
                Box::new(move |reader, resolver| {
                    let count = reader.read_map_len()?;
                    let key_fmt = dec.0.get(resolver)?;
                    let value_fmt = dec.1.get(resolver)?;
                    let mut map = $map::<K, V>::new();
                    for _ in 0..count {
                        let k = key_fmt.decode_value::<K>(reader, resolver)?;
                        let v = value_fmt.decode_value::<V>(reader, resolver)?;
                        map.insert(k, v);
                    }
                    Ok(Box::new(map) as Box<dyn Any>)
                }),
            ))
        }
    };
}

impl_map!(HashMap, build_hash_map, Eq + Hash);
impl_map!(BTreeMap, build_btree_map, Ord);

macro_rules! impl_tuple {
    ($build:ident; $($T:ident : $idx:tt),+) => {
        impl<$($T: Described),+> Described for ($($T,)+) {
            fn descriptor() -> Descriptor {
                Descriptor::Custom($build::<$($T),+>)
            }
        }

        fn $build<$($T: Described),+>(_resolver: &Resolver) -> Result<Formatter, Error> {
            let fmts = Arc::new(($(LazyFormatter::new(resolve_described::<$T>),)+));
            let enc = Arc::clone(&fmts);
            let dec = fmts;
            let arity = [$(stringify!($T)),+].len();
            Ok(Formatter::new(
                std::any::type_name::<($($T,)+)>(),
                Box::new(move |value, writer, resolver| {
                    let tuple = value
                        .downcast_ref::<($($T,)+)>()
                        .ok_or_else(value_mismatch::<($($T,)+)>)?;
                    writer.write_array_header(arity)?;
                    $(
                        enc.$idx.get(resolver)?.encode_erased(&tuple.$idx, writer, resolver)?;
                    )+
                    Ok(())
                }),
                Box::new(move |reader, resolver| {
                    let found = reader.read_array_len()?;
                    ensure!(
                        found == arity,
                        Error::decode(format!(
                            "tuple of {} elements cannot decode from a {}-element array",
                            arity, found
                        ))
                    );
                    let tuple = ($(
                        dec.$idx.get(resolver)?.decode_value::<$T>(reader, resolver)?,
                    )+);
                    Ok(Box::new(tuple) as Box<dyn Any>)
                }),
            ))
        }
    };
}

impl_tuple!(build_tuple2; A:0, B:1);
impl_tuple!(build_tuple3; A:0, B:1, C:2);
impl_tuple!(build_tuple4; A:0, B:1, C:2, D:3);
