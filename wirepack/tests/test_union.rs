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

use wirepack::{deserialize, register_union, serialize, AsAny, Described, Error};

trait Animal: AsAny + std::fmt::Debug {
    fn name(&self) -> &str;
}

#[derive(Described, Debug, PartialEq)]
struct Cat {
    name: String,
    lives: u8,
}

#[derive(Described, Debug, PartialEq)]
struct Dog {
    name: String,
    good: bool,
}

// deliberately unregistered
#[derive(Debug)]
struct Ferret;

impl Animal for Cat {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Animal for Dog {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Animal for Ferret {
    fn name(&self) -> &str {
        "ferret"
    }
}

register_union! {
    dyn Animal {
        1 => Cat,
        2 => Dog,
    }
}

fn cat() -> Box<dyn Animal> {
    Box::new(Cat {
        name: "whiskers".to_string(),
        lives: 9,
    })
}

#[test]
fn union_wire_shape_is_key_then_payload() {
    let bytes = serialize(&cat()).unwrap();
    assert_eq!(bytes[0], 0x92); // 2-element array
    assert_eq!(bytes[1], 0x01); // the cat key
    let decoded: Box<dyn Animal> = deserialize(&bytes).unwrap();
    assert_eq!(decoded.name(), "whiskers");
}

#[test]
fn union_dispatches_to_the_registered_subtype() {
    let dog: Box<dyn Animal> = Box::new(Dog {
        name: "rex".to_string(),
        good: true,
    });
    let bytes = serialize(&dog).unwrap();
    assert_eq!(bytes[1], 0x02);
    let decoded: Box<dyn Animal> = deserialize(&bytes).unwrap();
    let decoded = decoded
        .as_dyn_any()
        .downcast_ref::<Dog>()
        .expect("dog key decodes to a Dog");
    assert!(decoded.good);
}

#[test]
fn unregistered_runtime_type_fails_on_encode() {
    let ferret: Box<dyn Animal> = Box::new(Ferret);
    let err = serialize(&ferret).unwrap_err();
    assert!(matches!(err, Error::UnregisteredUnionType(_)));
}

#[test]
fn unknown_key_consumes_the_payload_and_fails() {
    // hand-built [9, "payload"]
    let mut bytes = vec![0x92, 0x09];
    bytes.extend_from_slice(&[0xa7]);
    bytes.extend_from_slice(b"payload");
    let err = deserialize::<Box<dyn Animal>>(&bytes).unwrap_err();
    assert!(matches!(err, Error::UnknownUnionKey(_)));
}

#[test]
fn wrong_arity_is_a_hard_decode_error() {
    // 3-element array
    let bytes = vec![0x93, 0x01, 0xc0, 0xc0];
    let err = deserialize::<Box<dyn Animal>>(&bytes).unwrap_err();
    assert!(matches!(err, Error::Decode(_)));

    let bytes = vec![0x91, 0x01];
    let err = deserialize::<Box<dyn Animal>>(&bytes).unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}

#[test]
fn nullable_union_wraps_with_nil() {
    let bytes = serialize(&None::<Box<dyn Animal>>).unwrap();
    assert_eq!(bytes, vec![0xc0]);
    let decoded: Option<Box<dyn Animal>> = deserialize(&bytes).unwrap();
    assert!(decoded.is_none());

    let bytes = serialize(&Some(cat())).unwrap();
    let decoded: Option<Box<dyn Animal>> = deserialize(&bytes).unwrap();
    assert_eq!(decoded.unwrap().name(), "whiskers");
}

#[test]
fn bare_nil_is_an_error_for_a_non_nullable_union() {
    let err = deserialize::<Box<dyn Animal>>(&[0xc0]).unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}

trait Shape: AsAny {}

#[derive(Described, Debug, PartialEq)]
struct Circle {
    radius: f64,
}

#[derive(Described, Debug, PartialEq)]
struct Square {
    side: f64,
}

impl Shape for Circle {}
impl Shape for Square {}

// non-contiguous keys exercise the sparse lookup path
register_union! {
    dyn Shape {
        10 => Circle,
        40 => Square,
    }
}

#[test]
fn sparse_keys_resolve_through_binary_search() {
    let square: Box<dyn Shape> = Box::new(Square { side: 2.0 });
    let bytes = serialize(&square).unwrap();
    assert_eq!(bytes[1], 40);
    let decoded: Box<dyn Shape> = deserialize(&bytes).unwrap();
    assert!(decoded.as_dyn_any().downcast_ref::<Square>().is_some());
}

#[test]
fn unions_nest_inside_containers() {
    let animals: Vec<Box<dyn Animal>> = vec![
        cat(),
        Box::new(Dog {
            name: "rex".to_string(),
            good: false,
        }),
    ];
    let bytes = serialize(&animals).unwrap();
    let decoded: Vec<Box<dyn Animal>> = deserialize(&bytes).unwrap();
    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded[0].name(), "whiskers");
    assert_eq!(decoded[1].name(), "rex");
}
