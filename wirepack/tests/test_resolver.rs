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

use std::any::TypeId;
use std::sync::Arc;

use wirepack::{
    deserialize_with, serialize_with, Described, Descriptor, Error, Formatter, FormatterSource,
    Registry,
};

#[derive(Described, Debug, PartialEq, Clone)]
struct Meters {
    value: f64,
}

#[test]
fn resolution_is_idempotent() {
    let resolver = Registry::new().into_resolver();
    let first = resolver.formatter::<Meters>().unwrap();
    let second = resolver.formatter::<Meters>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn concurrent_first_requests_converge() {
    let resolver = Arc::new(Registry::new().into_resolver());
    let mut handles = Vec::new();
    for _ in 0..8 {
        let resolver = Arc::clone(&resolver);
        handles.push(std::thread::spawn(move || {
            resolver.formatter::<Meters>().map(|f| Arc::as_ptr(&f) as usize)
        }));
    }
    let mut addresses = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect::<Vec<_>>();
    addresses.dedup();
    assert_eq!(addresses.len(), 1);
}

#[test]
fn explicit_formatter_shadows_the_descriptor() {
    let mut registry = Registry::new();
    registry
        .register_formatter::<Meters, _, _>(
            |v, writer, _| {
                // scalar form instead of the object map
                writer.write_float64(v.value);
                Ok(())
            },
            |reader, _| {
                Ok(Meters {
                    value: reader.read_float64()?,
                })
            },
        )
        .unwrap();
    let resolver = registry.into_resolver();

    let m = Meters { value: 1.25 };
    let bytes = serialize_with(&m, &resolver).unwrap();
    assert_eq!(bytes[0], 0xcb); // float64, not a map
    let decoded: Meters = deserialize_with(&bytes, &resolver).unwrap();
    assert_eq!(decoded, m);

    // the default chain still uses the object schema
    let plain = Registry::new().into_resolver();
    let bytes = serialize_with(&m, &plain).unwrap();
    assert_eq!(bytes[0], 0x81);
}

#[test]
fn duplicate_explicit_registration_fails() {
    let mut registry = Registry::new();
    registry
        .register_formatter::<Meters, _, _>(
            |v, w, _| {
                w.write_float64(v.value);
                Ok(())
            },
            |r, _| Ok(Meters { value: r.read_float64()? }),
        )
        .unwrap();
    let err = registry
        .register_formatter::<Meters, _, _>(
            |v, w, _| {
                w.write_float64(v.value);
                Ok(())
            },
            |r, _| Ok(Meters { value: r.read_float64()? }),
        )
        .unwrap_err();
    assert!(matches!(err, Error::Schema(_)));
}

struct NegatingSource;

impl FormatterSource for NegatingSource {
    fn name(&self) -> &'static str {
        "negating"
    }

    fn formatter(&self, ty: TypeId) -> Option<Arc<Formatter>> {
        if ty != TypeId::of::<i32>() {
            return None;
        }
        Some(Arc::new(Formatter::new(
            "i32",
            Box::new(|value, writer, _| {
                let v = value
                    .downcast_ref::<i32>()
                    .ok_or_else(|| Error::type_error("not an i32"))?;
                writer.write_int(-(*v as i64));
                Ok(())
            }),
            Box::new(|reader, _| Ok(Box::new(-(reader.read_int()?) as i32) as Box<dyn std::any::Any>)),
        )))
    }
}

#[test]
fn sources_shadow_the_builtin_table() {
    let mut registry = Registry::new();
    registry.register_source(Arc::new(NegatingSource));
    let resolver = registry.into_resolver();

    let bytes = serialize_with(&5i32, &resolver).unwrap();
    assert_eq!(bytes, vec![0xfb]); // -5 as negative fixint
    let decoded: i32 = deserialize_with(&bytes, &resolver).unwrap();
    assert_eq!(decoded, 5);
    assert!(resolver.chain_identity().contains("negating"));
}

struct Opaque;

impl Described for Opaque {
    fn descriptor() -> Descriptor {
        // claims table support that no table provides
        Descriptor::Builtin
    }
}

#[test]
fn unsupported_types_fail_with_the_chain_identity() {
    let resolver = Registry::new().into_resolver();
    let err = resolver.formatter::<Opaque>().unwrap_err();
    match err {
        Error::FormatterNotFound { type_name, chain } => {
            assert!(type_name.contains("Opaque"));
            assert!(chain.contains("builtin"));
        }
        other => panic!("expected FormatterNotFound, got {:?}", other),
    }
}

#[test]
fn schema_errors_surface_on_every_lookup() {
    #[derive(Described, Debug, PartialEq)]
    struct DupKey {
        #[pack(key = 1)]
        a: i32,
        #[pack(key = 1)]
        b: i32,
    }

    let resolver = Registry::new().into_resolver();
    // the schema fails to build before any value is serialized
    assert!(matches!(
        resolver.formatter::<DupKey>().unwrap_err(),
        Error::Schema(_)
    ));
    // and the type stays unusable
    assert!(matches!(
        resolver.formatter::<DupKey>().unwrap_err(),
        Error::Schema(_)
    ));
}
