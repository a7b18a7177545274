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

//! Built-in primitive formatter table: O(1) `TypeId` lookup for the
//! well-known scalar types. Built once, shared for the process lifetime.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::error::Error;
use crate::formatter::Formatter;
use crate::types::Bytes;

fn value_mismatch<T>() -> Error {
    Error::type_error(format!(
        "value is not a {}",
        std::any::type_name::<T>()
    ))
}

fn int_formatter<T>() -> Formatter
where
    T: Any + Copy + Into<i64> + TryFrom<i64>,
{
    Formatter::new(
        std::any::type_name::<T>(),
        Box::new(|value, writer, _| {
            let v = value.downcast_ref::<T>().ok_or_else(value_mismatch::<T>)?;
            writer.write_int((*v).into());
            Ok(())
        }),
        Box::new(|reader, _| {
            let v = reader.read_int()?;
            let v = T::try_from(v).map_err(|_| {
                Error::invalid_data(format!(
                    "integer {} out of range for {}",
                    v,
                    std::any::type_name::<T>()
                ))
            })?;
            Ok(Box::new(v) as Box<dyn Any>)
        }),
    )
}

fn u64_formatter() -> Formatter {
    Formatter::new(
        "u64",
        Box::new(|value, writer, _| {
            let v = value.downcast_ref::<u64>().ok_or_else(value_mismatch::<u64>)?;
            writer.write_uint(*v);
            Ok(())
        }),
        Box::new(|reader, _| Ok(Box::new(reader.read_uint()?) as Box<dyn Any>)),
    )
}

fn bool_formatter() -> Formatter {
    Formatter::new(
        "bool",
        Box::new(|value, writer, _| {
            let v = value.downcast_ref::<bool>().ok_or_else(value_mismatch::<bool>)?;
            writer.write_bool(*v);
            Ok(())
        }),
        Box::new(|reader, _| Ok(Box::new(reader.read_bool()?) as Box<dyn Any>)),
    )
}

fn f32_formatter() -> Formatter {
    Formatter::new(
        "f32",
        Box::new(|value, writer, _| {
            let v = value.downcast_ref::<f32>().ok_or_else(value_mismatch::<f32>)?;
            writer.write_float32(*v);
            Ok(())
        }),
        Box::new(|reader, _| Ok(Box::new(reader.read_float32()?) as Box<dyn Any>)),
    )
}

fn f64_formatter() -> Formatter {
    Formatter::new(
        "f64",
        Box::new(|value, writer, _| {
            let v = value.downcast_ref::<f64>().ok_or_else(value_mismatch::<f64>)?;
            writer.write_float64(*v);
            Ok(())
        }),
        Box::new(|reader, _| Ok(Box::new(reader.read_float64()?) as Box<dyn Any>)),
    )
}

fn char_formatter() -> Formatter {
    Formatter::new(
        "char",
        Box::new(|value, writer, _| {
            let v = value.downcast_ref::<char>().ok_or_else(value_mismatch::<char>)?;
            writer.write_uint(*v as u32 as u64);
            Ok(())
        }),
        Box::new(|reader, _| {
            let v = reader.read_uint()?;
            let c = u32::try_from(v)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| Error::invalid_data(format!("{} is not a valid char scalar", v)))?;
            Ok(Box::new(c) as Box<dyn Any>)
        }),
    )
}

fn string_formatter() -> Formatter {
    Formatter::new(
        "String",
        Box::new(|value, writer, _| {
            let v = value
                .downcast_ref::<String>()
                .ok_or_else(value_mismatch::<String>)?;
            writer.write_str(v)
        }),
        Box::new(|reader, _| Ok(Box::new(reader.read_str()?) as Box<dyn Any>)),
    )
}

fn unit_formatter() -> Formatter {
    Formatter::new(
        "()",
        Box::new(|value, writer, _| {
            value.downcast_ref::<()>().ok_or_else(value_mismatch::<()>)?;
            writer.write_nil();
            Ok(())
        }),
        Box::new(|reader, _| {
            reader.read_nil()?;
            Ok(Box::new(()) as Box<dyn Any>)
        }),
    )
}

fn bytes_formatter() -> Formatter {
    Formatter::new(
        "Bytes",
        Box::new(|value, writer, _| {
            let v = value
                .downcast_ref::<Bytes>()
                .ok_or_else(value_mismatch::<Bytes>)?;
            writer.write_bin(&v.0)
        }),
        Box::new(|reader, _| {
            let data = reader.read_bin()?;
            Ok(Box::new(Bytes(data.to_vec())) as Box<dyn Any>)
        }),
    )
}

static TABLE: Lazy<HashMap<TypeId, Arc<Formatter>>> = Lazy::new(|| {
    let mut table: HashMap<TypeId, Arc<Formatter>> = HashMap::new();
    table.insert(TypeId::of::<bool>(), Arc::new(bool_formatter()));
    table.insert(TypeId::of::<i8>(), Arc::new(int_formatter::<i8>()));
    table.insert(TypeId::of::<i16>(), Arc::new(int_formatter::<i16>()));
    table.insert(TypeId::of::<i32>(), Arc::new(int_formatter::<i32>()));
    table.insert(TypeId::of::<i64>(), Arc::new(int_formatter::<i64>()));
    table.insert(TypeId::of::<u8>(), Arc::new(int_formatter::<u8>()));
    table.insert(TypeId::of::<u16>(), Arc::new(int_formatter::<u16>()));
    table.insert(TypeId::of::<u32>(), Arc::new(int_formatter::<u32>()));
    table.insert(TypeId::of::<u64>(), Arc::new(u64_formatter()));
    table.insert(TypeId::of::<f32>(), Arc::new(f32_formatter()));
    table.insert(TypeId::of::<f64>(), Arc::new(f64_formatter()));
    table.insert(TypeId::of::<char>(), Arc::new(char_formatter()));
    table.insert(TypeId::of::<String>(), Arc::new(string_formatter()));
    table.insert(TypeId::of::<()>(), Arc::new(unit_formatter()));
    table.insert(TypeId::of::<Bytes>(), Arc::new(bytes_formatter()));
    table
});

/// O(1) formatter lookup for the well-known primitive types.
pub fn lookup(ty: TypeId) -> Option<Arc<Formatter>> {
    TABLE.get(&ty).cloned()
}

macro_rules! impl_builtin_described {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::descriptor::Described for $ty {
                fn descriptor() -> $crate::descriptor::Descriptor {
                    $crate::descriptor::Descriptor::Builtin
                }
            }
        )+
    };
}

impl_builtin_described!(
    bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, char, String, (), Bytes
);

pub(crate) use impl_builtin_described;
