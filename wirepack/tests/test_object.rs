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

use wirepack::{deserialize, serialize, Described};

#[derive(Described, Debug, PartialEq)]
struct Point {
    #[pack(key = 0)]
    x: i32,
    #[pack(key = 1)]
    y: i32,
}

#[derive(Described, Debug, PartialEq)]
struct NamedPoint {
    x: i32,
    y: i32,
}

#[test]
fn int_key_layout_is_a_positional_array() {
    let bytes = serialize(&Point { x: 3, y: 4 }).unwrap();
    // fixarray of 2, then the two fixints
    assert_eq!(bytes, vec![0x92, 0x03, 0x04]);
    let point: Point = deserialize(&bytes).unwrap();
    assert_eq!(point, Point { x: 3, y: 4 });
}

#[test]
fn contractless_layout_is_a_named_map() {
    let bytes = serialize(&NamedPoint { x: 3, y: 4 }).unwrap();
    assert_eq!(
        bytes,
        vec![0x82, 0xa1, b'x', 0x03, 0xa1, b'y', 0x04]
    );
    let point: NamedPoint = deserialize(&bytes).unwrap();
    assert_eq!(point, NamedPoint { x: 3, y: 4 });
}

// sparse keys leave the generated constructor unmatchable, so decode goes
// through the default-construct-then-assign fallback
#[derive(Described, Debug, PartialEq, Default)]
#[pack(default)]
struct Sparse {
    #[pack(key = 0)]
    first: i32,
    #[pack(key = 3)]
    fourth: i32,
}

#[test]
fn int_key_gaps_are_nil_placeholders() {
    let bytes = serialize(&Sparse { first: 1, fourth: 2 }).unwrap();
    // array sized max key + 1 with nil in the unused slots
    assert_eq!(bytes, vec![0x94, 0x01, 0xc0, 0xc0, 0x02]);
    let value: Sparse = deserialize(&bytes).unwrap();
    assert_eq!(value, Sparse { first: 1, fourth: 2 });
}

#[derive(Described, Debug, PartialEq)]
struct WideV1 {
    a: i32,
    b: String,
    c: bool,
}

#[derive(Described, Debug, PartialEq)]
struct WideV2 {
    a: i32,
    c: bool,
}

#[test]
fn unknown_fields_are_skipped_for_forward_compatibility() {
    let bytes = serialize(&WideV1 {
        a: 7,
        b: "dropped".to_string(),
        c: true,
    })
    .unwrap();
    let narrow: WideV2 = deserialize(&bytes).unwrap();
    assert_eq!(narrow, WideV2 { a: 7, c: true });
}

#[derive(Described, Debug, PartialEq)]
struct SparseV1 {
    #[pack(key = 0)]
    a: i32,
    #[pack(key = 1)]
    b: i32,
    #[pack(key = 2)]
    c: i32,
}

#[derive(Described, Debug, PartialEq, Default)]
#[pack(default)]
struct SparseV2 {
    #[pack(key = 0)]
    a: i32,
    #[pack(key = 2)]
    c: i32,
}

#[test]
fn unknown_int_slots_are_skipped() {
    let bytes = serialize(&SparseV1 { a: 1, b: 2, c: 3 }).unwrap();
    let narrow: SparseV2 = deserialize(&bytes).unwrap();
    assert_eq!(narrow, SparseV2 { a: 1, c: 3 });
}

#[derive(Described, Debug, PartialEq)]
struct Renamed {
    #[pack(key = "n")]
    name: String,
    #[pack(key = "v")]
    value: i64,
}

#[test]
fn declared_string_keys_replace_names_on_the_wire() {
    let bytes = serialize(&Renamed {
        name: "a".to_string(),
        value: 1,
    })
    .unwrap();
    assert_eq!(bytes[1], 0xa1);
    assert_eq!(bytes[2], b'n');
    let value: Renamed = deserialize(&bytes).unwrap();
    assert_eq!(value.name, "a");
}

#[derive(Described, Debug, PartialEq)]
struct WithSkip {
    kept: i32,
    #[pack(skip)]
    scratch: Vec<String>,
}

#[test]
fn skipped_fields_are_absent_and_default_initialized() {
    let bytes = serialize(&WithSkip {
        kept: 9,
        scratch: vec!["transient".to_string()],
    })
    .unwrap();
    // map with a single entry
    assert_eq!(bytes[0], 0x81);
    let value: WithSkip = deserialize(&bytes).unwrap();
    assert_eq!(value.kept, 9);
    assert!(value.scratch.is_empty());
}

#[derive(Described, Debug, PartialEq)]
struct Nested {
    origin: Point,
    label: String,
}

#[test]
fn nested_objects_resolve_recursively() {
    let value = Nested {
        origin: Point { x: -5, y: 1000 },
        label: "corner".to_string(),
    };
    let bytes = serialize(&value).unwrap();
    let decoded: Nested = deserialize(&bytes).unwrap();
    assert_eq!(decoded, value);
}

#[derive(Described, Debug, PartialEq)]
struct Tree {
    value: i32,
    left: Option<Box<Tree>>,
    right: Option<Box<Tree>>,
}

#[test]
fn self_referential_types_build_and_round_trip() {
    let tree = Tree {
        value: 1,
        left: Some(Box::new(Tree {
            value: 2,
            left: None,
            right: None,
        })),
        right: None,
    };
    let bytes = serialize(&tree).unwrap();
    let decoded: Tree = deserialize(&bytes).unwrap();
    assert_eq!(decoded, tree);
}

#[test]
fn nil_decodes_to_none_without_construction() {
    let bytes = serialize(&None::<Point>).unwrap();
    assert_eq!(bytes, vec![0xc0]);
    let decoded: Option<Point> = deserialize(&bytes).unwrap();
    assert_eq!(decoded, None);
}

#[test]
fn nil_is_a_hard_error_for_non_nullable_targets() {
    let err = deserialize::<Point>(&[0xc0]).unwrap_err();
    assert!(matches!(err, wirepack::Error::Decode(_)));
}

#[test]
fn trailing_bytes_are_rejected() {
    let mut bytes = serialize(&Point { x: 1, y: 2 }).unwrap();
    bytes.push(0x00);
    assert!(deserialize::<Point>(&bytes).is_err());
}
