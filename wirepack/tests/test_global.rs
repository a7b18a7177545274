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

//! Freeze-on-first-use semantics of the global registry. Kept as a single
//! test so the one-way latch is exercised in a deterministic order within
//! this process.

use wirepack::{deserialize, registry, serialize, Described, Error};

#[derive(Described, Debug, PartialEq)]
struct Celsius {
    degrees: f64,
}

#[test]
fn registration_freezes_on_first_lookup() {
    // configuration phase: registration succeeds
    registry::configure(|registry| {
        registry.register_formatter::<Celsius, _, _>(
            |v, writer, _| {
                writer.write_float64(v.degrees);
                Ok(())
            },
            |reader, _| {
                Ok(Celsius {
                    degrees: reader.read_float64()?,
                })
            },
        )
    })
    .unwrap();

    // first lookup anywhere flips the latch; the registered formatter wins
    let value = Celsius { degrees: 21.5 };
    let bytes = serialize(&value).unwrap();
    assert_eq!(bytes[0], 0xcb);
    let decoded: Celsius = deserialize(&bytes).unwrap();
    assert_eq!(decoded, value);

    // late registration fails loudly instead of being dropped
    let err = registry::configure(|registry| {
        registry.register_formatter::<i128, _, _>(
            |_, writer, _| {
                writer.write_nil();
                Ok(())
            },
            |reader, _| {
                reader.read_nil()?;
                Ok(0i128)
            },
        )
    })
    .unwrap_err();
    assert!(matches!(err, Error::RegistryFrozen(_)));
}
