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

use wirepack::{deserialize, serialize, Described, Error};

#[derive(Described, Debug, PartialEq, Clone, Copy)]
#[repr(u8)]
enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

#[derive(Described, Debug, PartialEq)]
#[repr(i16)]
enum Offset {
    Behind = -100,
    Zero = 0,
    Ahead, // 1, sequential after the last explicit value
}

#[test]
fn enum_round_trips() {
    for suit in [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades] {
        let bytes = serialize(&suit).unwrap();
        let decoded: Suit = deserialize(&bytes).unwrap();
        assert_eq!(decoded, suit);
    }
}

#[test]
fn enum_bytes_equal_the_underlying_integer_bytes() {
    assert_eq!(
        serialize(&Suit::Hearts).unwrap(),
        serialize(&2u8).unwrap()
    );
    assert_eq!(
        serialize(&Offset::Behind).unwrap(),
        serialize(&-100i16).unwrap()
    );
}

#[test]
fn explicit_and_sequential_discriminants() {
    assert_eq!(serialize(&Offset::Zero).unwrap(), vec![0x00]);
    assert_eq!(serialize(&Offset::Ahead).unwrap(), vec![0x01]);
    let decoded: Offset = deserialize(&serialize(&Offset::Behind).unwrap()).unwrap();
    assert_eq!(decoded, Offset::Behind);
}

#[test]
fn unknown_discriminant_is_a_typed_error() {
    let bytes = serialize(&9i32).unwrap();
    let err = deserialize::<Suit>(&bytes).unwrap_err();
    assert!(matches!(err, Error::UnknownEnum(_)));
}

#[test]
fn discriminant_outside_the_underlying_width_is_rejected() {
    let bytes = serialize(&300i32).unwrap();
    let err = deserialize::<Suit>(&bytes).unwrap_err();
    assert!(matches!(err, Error::UnknownEnum(_)));
}

#[test]
fn nullable_enum_wraps_with_nil() {
    let bytes = serialize(&None::<Suit>).unwrap();
    assert_eq!(bytes, vec![0xc0]);
    assert_eq!(deserialize::<Option<Suit>>(&bytes).unwrap(), None);

    let bytes = serialize(&Some(Suit::Spades)).unwrap();
    assert_eq!(bytes, serialize(&Suit::Spades).unwrap());
    assert_eq!(
        deserialize::<Option<Suit>>(&bytes).unwrap(),
        Some(Suit::Spades)
    );
}

#[derive(Described, Debug, PartialEq)]
struct Hand {
    trump: Suit,
    count: u8,
}

#[test]
fn enums_nest_inside_objects() {
    let hand = Hand {
        trump: Suit::Diamonds,
        count: 13,
    };
    let bytes = serialize(&hand).unwrap();
    let decoded: Hand = deserialize(&bytes).unwrap();
    assert_eq!(decoded, hand);
}
