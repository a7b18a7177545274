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

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;
use wirepack::{deserialize, serialize, Bytes};

fn round_trip<T>(value: T)
where
    T: wirepack::Described + PartialEq + std::fmt::Debug,
{
    let bytes = serialize(&value).unwrap();
    let decoded: T = deserialize(&bytes).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn scalar_round_trips() {
    round_trip(true);
    round_trip(false);
    round_trip(0u8);
    round_trip(255u8);
    round_trip(-1i8);
    round_trip(i16::MIN);
    round_trip(i32::MAX);
    round_trip(i64::MIN);
    round_trip(u64::MAX);
    round_trip(1.5f32);
    round_trip(-0.25f64);
    round_trip('é');
    round_trip(());
    round_trip("hello".to_string());
    round_trip(String::new());
}

#[test]
fn nullable_round_trips() {
    round_trip(Some(42i32));
    round_trip(None::<i32>);
    round_trip(Some("x".to_string()));
    round_trip(None::<String>);
    // nested nullability collapses on the wire; inner Some survives
    round_trip(Some(Some(1i64)));
}

#[test]
fn container_round_trips() {
    round_trip(vec![1i32, 2, 3]);
    round_trip(Vec::<String>::new());
    round_trip(vec![Some(1u16), None, Some(3)]);
    round_trip((1i32, "pair".to_string()));
    round_trip((1i8, 2i16, 3i32));
    round_trip((true, 'x', 0.5f64, "quad".to_string()));
    round_trip(Box::new(7i64));

    let mut hash = HashMap::new();
    hash.insert("one".to_string(), 1i32);
    hash.insert("two".to_string(), 2);
    round_trip(hash);

    let mut tree = BTreeMap::new();
    tree.insert(1u32, vec![true, false]);
    tree.insert(2, vec![]);
    round_trip(tree);
}

#[test]
fn bytes_use_the_bin_family() {
    let payload = Bytes(vec![0, 1, 254, 255]);
    let bytes = serialize(&payload).unwrap();
    assert_eq!(bytes[0], 0xc4); // bin8
    assert_eq!(bytes[1], 4);
    round_trip(payload);
}

#[test]
fn uuid_is_a_16_byte_extension() {
    let id = Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);
    let bytes = serialize(&id).unwrap();
    assert_eq!(bytes[0], 0xd8); // fixext16
    assert_eq!(bytes[1], 1); // uuid extension code
    round_trip(id);
}

#[test]
fn decimal_preserves_scale() {
    round_trip("123.4500".parse::<Decimal>().unwrap());
    round_trip("-0.000001".parse::<Decimal>().unwrap());
    round_trip(Decimal::MAX);
    let d = "1.100".parse::<Decimal>().unwrap();
    let bytes = serialize(&d).unwrap();
    let decoded: Decimal = deserialize(&bytes).unwrap();
    assert_eq!(decoded.scale(), 3);
}

#[test]
fn datetime_round_trips() {
    round_trip(Utc.with_ymd_and_hms(2024, 2, 29, 12, 30, 45).unwrap());
    round_trip(
        Utc.with_ymd_and_hms(2024, 2, 29, 12, 30, 45).unwrap()
            + Duration::nanoseconds(123_456_789),
    );
    // pre-epoch instants take the 96-bit form
    round_trip(Utc.with_ymd_and_hms(1903, 1, 1, 0, 0, 0).unwrap());
    round_trip(
        Utc.with_ymd_and_hms(2024, 2, 29, 12, 30, 45)
            .unwrap()
            .naive_utc(),
    );
}

#[test]
fn fixed_offset_datetime_preserves_the_offset() {
    let offset = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
    let value: DateTime<FixedOffset> = offset.with_ymd_and_hms(2023, 7, 1, 8, 0, 0).unwrap();
    let bytes = serialize(&value).unwrap();
    let decoded: DateTime<FixedOffset> = deserialize(&bytes).unwrap();
    assert_eq!(decoded, value);
    assert_eq!(decoded.offset().local_minus_utc(), 5 * 3600 + 1800);
}

#[test]
fn duration_round_trips() {
    round_trip(Duration::seconds(0));
    round_trip(Duration::seconds(86_400) + Duration::nanoseconds(42));
    round_trip(Duration::seconds(-3600));
}

#[test]
fn enum_like_int_widths_share_the_wire_form() {
    // the same logical value decodes into any integer type that holds it
    let bytes = serialize(&5u8).unwrap();
    assert_eq!(deserialize::<i64>(&bytes).unwrap(), 5);
    assert_eq!(deserialize::<u32>(&bytes).unwrap(), 5);

    let bytes = serialize(&-5i64).unwrap();
    assert_eq!(deserialize::<i8>(&bytes).unwrap(), -5);
    assert!(deserialize::<u8>(&bytes).is_err());
}

#[test]
fn out_of_range_integers_are_rejected() {
    let bytes = serialize(&300i32).unwrap();
    assert!(deserialize::<u8>(&bytes).is_err());
    assert!(deserialize::<i8>(&bytes).is_err());
}
