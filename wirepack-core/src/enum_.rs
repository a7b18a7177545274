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

//! Enum formatter generation: the wire value is the underlying integer,
//! encoded canonically, so an enum and its underlying integer produce
//! identical bytes. `Option<E>` picks up Nil handling from the generic
//! nullable wrapper.

use crate::descriptor::EnumDescriptor;
use crate::error::Error;
use crate::formatter::Formatter;
use crate::ensure;

pub fn compile(type_name: &'static str, desc: EnumDescriptor) -> Result<Formatter, Error> {
    let EnumDescriptor {
        name,
        underlying,
        to_int,
        from_int,
    } = desc;
    Ok(Formatter::new(
        type_name,
        Box::new(move |value, writer, _resolver| {
            let v = to_int(value)?;
            writer.write_int(v);
            Ok(())
        }),
        Box::new(move |reader, _resolver| {
            let v = reader.read_int()?;
            ensure!(
                underlying.contains(v),
                Error::unknown_enum(format!(
                    "{} does not fit the underlying integer of enum `{}`",
                    v, name
                ))
            );
            from_int(v)
        }),
    ))
}
