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

//! Core type definitions: extension codes, the blittable fast-path set,
//! enum underlying-integer kinds, and the [`Bytes`] binary-blob newtype.

use std::any::{Any, TypeId};
use std::ops::Deref;

use crate::buffer::{Reader, Writer};
use crate::error::Error;

/// Extension type codes used on the wire.
pub mod ext_code {
    /// MessagePack's reserved timestamp extension.
    pub const TIMESTAMP: i8 = -1;
    pub const UUID: i8 = 1;
    pub const DECIMAL: i8 = 2;
    pub const DURATION: i8 = 3;
    pub const DATETIME_TZ: i8 = 4;
}

/// Owned binary blob, wired as MessagePack `bin`.
///
/// `Vec<u8>` itself resolves through the generic container support and
/// encodes as an integer array; wrap payloads in `Bytes` to get the compact
/// length-prefixed form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bytes(pub Vec<u8>);

impl From<Vec<u8>> for Bytes {
    fn from(v: Vec<u8>) -> Self {
        Bytes(v)
    }
}

impl From<&[u8]> for Bytes {
    fn from(v: &[u8]) -> Self {
        Bytes(v.to_vec())
    }
}

impl Deref for Bytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

/// Underlying integer kind of an enum schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntKind {
    /// Whether `v` is representable in this kind.
    pub fn contains(self, v: i64) -> bool {
        match self {
            IntKind::I8 => i8::try_from(v).is_ok(),
            IntKind::I16 => i16::try_from(v).is_ok(),
            IntKind::I32 => i32::try_from(v).is_ok(),
            IntKind::I64 => true,
            IntKind::U8 => u8::try_from(v).is_ok(),
            IntKind::U16 => u16::try_from(v).is_ok(),
            IntKind::U32 => u32::try_from(v).is_ok(),
            IntKind::U64 => v >= 0,
        }
    }
}

/// Fixed-primitive member kinds that bypass formatter resolution entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Char,
}

macro_rules! fast_int_arms {
    ($self:expr, $value:expr, $writer:expr; $(($kind:ident, $ty:ty)),+ $(,)?) => {
        match $self {
            $(
                FastKind::$kind => {
                    let v = downcast::<$ty>($value)?;
                    $writer.write_int(*v as i64);
                    return Ok(());
                }
            )+
            _ => {}
        }
    };
}

fn downcast<T: Any>(value: &dyn Any) -> Result<&T, Error> {
    value.downcast_ref::<T>().ok_or_else(|| {
        Error::type_error(format!(
            "fast-path value is not a {}",
            std::any::type_name::<T>()
        ))
    })
}

fn int_in_range<T: TryFrom<i64> + Any>(v: i64) -> Result<Box<dyn Any>, Error> {
    T::try_from(v)
        .map(|v| Box::new(v) as Box<dyn Any>)
        .map_err(|_| {
            Error::invalid_data(format!(
                "integer {} out of range for {}",
                v,
                std::any::type_name::<T>()
            ))
        })
}

impl FastKind {
    /// Classifies a member's declared type, if it belongs to the blittable
    /// set.
    pub fn of(ty: TypeId) -> Option<FastKind> {
        if ty == TypeId::of::<bool>() {
            Some(FastKind::Bool)
        } else if ty == TypeId::of::<i8>() {
            Some(FastKind::I8)
        } else if ty == TypeId::of::<i16>() {
            Some(FastKind::I16)
        } else if ty == TypeId::of::<i32>() {
            Some(FastKind::I32)
        } else if ty == TypeId::of::<i64>() {
            Some(FastKind::I64)
        } else if ty == TypeId::of::<u8>() {
            Some(FastKind::U8)
        } else if ty == TypeId::of::<u16>() {
            Some(FastKind::U16)
        } else if ty == TypeId::of::<u32>() {
            Some(FastKind::U32)
        } else if ty == TypeId::of::<u64>() {
            Some(FastKind::U64)
        } else if ty == TypeId::of::<f32>() {
            Some(FastKind::F32)
        } else if ty == TypeId::of::<f64>() {
            Some(FastKind::F64)
        } else if ty == TypeId::of::<char>() {
            Some(FastKind::Char)
        } else {
            None
        }
    }

    pub fn write(self, value: &dyn Any, writer: &mut Writer) -> Result<(), Error> {
        fast_int_arms!(self, value, writer;
            (I8, i8),
            (I16, i16),
            (I32, i32),
            (I64, i64),
            (U8, u8),
            (U16, u16),
            (U32, u32),
        );
        match self {
            FastKind::Bool => writer.write_bool(*downcast::<bool>(value)?),
            FastKind::U64 => writer.write_uint(*downcast::<u64>(value)?),
            FastKind::F32 => writer.write_float32(*downcast::<f32>(value)?),
            FastKind::F64 => writer.write_float64(*downcast::<f64>(value)?),
            FastKind::Char => writer.write_uint(*downcast::<char>(value)? as u32 as u64),
            _ => unreachable!("integer kinds handled above"),
        }
        Ok(())
    }

    pub fn read_boxed(self, reader: &mut Reader<'_>) -> Result<Box<dyn Any>, Error> {
        match self {
            FastKind::Bool => Ok(Box::new(reader.read_bool()?)),
            FastKind::I8 => int_in_range::<i8>(reader.read_int()?),
            FastKind::I16 => int_in_range::<i16>(reader.read_int()?),
            FastKind::I32 => int_in_range::<i32>(reader.read_int()?),
            FastKind::I64 => Ok(Box::new(reader.read_int()?)),
            FastKind::U8 => int_in_range::<u8>(reader.read_int()?),
            FastKind::U16 => int_in_range::<u16>(reader.read_int()?),
            FastKind::U32 => int_in_range::<u32>(reader.read_int()?),
            FastKind::U64 => Ok(Box::new(reader.read_uint()?)),
            FastKind::F32 => Ok(Box::new(reader.read_float32()?)),
            FastKind::F64 => Ok(Box::new(reader.read_float64()?)),
            FastKind::Char => {
                let v = reader.read_uint()?;
                let scalar = u32::try_from(v)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| {
                        Error::invalid_data(format!("{} is not a valid char scalar", v))
                    })?;
                Ok(Box::new(scalar))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_kind_covers_blittables_only() {
        assert_eq!(FastKind::of(TypeId::of::<i32>()), Some(FastKind::I32));
        assert_eq!(FastKind::of(TypeId::of::<char>()), Some(FastKind::Char));
        assert_eq!(FastKind::of(TypeId::of::<String>()), None);
        assert_eq!(FastKind::of(TypeId::of::<Vec<u8>>()), None);
    }

    #[test]
    fn fast_round_trip() {
        let mut w = Writer::default();
        FastKind::I32.write(&42i32, &mut w).unwrap();
        FastKind::Bool.write(&true, &mut w).unwrap();
        FastKind::Char.write(&'é', &mut w).unwrap();
        let bytes = w.into_bytes();

        let mut r = Reader::new(&bytes);
        let v = FastKind::I32.read_boxed(&mut r).unwrap();
        assert_eq!(*v.downcast::<i32>().unwrap(), 42);
        let v = FastKind::Bool.read_boxed(&mut r).unwrap();
        assert!(*v.downcast::<bool>().unwrap());
        let v = FastKind::Char.read_boxed(&mut r).unwrap();
        assert_eq!(*v.downcast::<char>().unwrap(), 'é');
    }

    #[test]
    fn fast_read_checks_range() {
        let mut w = Writer::default();
        w.write_int(300);
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        assert!(FastKind::I8.read_boxed(&mut r).is_err());
    }

    #[test]
    fn int_kind_ranges() {
        assert!(IntKind::U8.contains(255));
        assert!(!IntKind::U8.contains(256));
        assert!(!IntKind::U8.contains(-1));
        assert!(IntKind::I64.contains(i64::MIN));
    }
}
