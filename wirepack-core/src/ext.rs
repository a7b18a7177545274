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

//! Native extension formatters: Uuid, Decimal, Duration and the date-time
//! kinds, wired as MessagePack extension blocks. This table sits ahead of
//! the primitive table in the resolver chain.
//!
//! Timestamps use the reserved `-1` extension with canonical-minimal form
//! selection on encode (32/64/96-bit) and all three forms accepted on
//! decode. The offset-preserving `DateTime<FixedOffset>` carries its UTC
//! offset next to the instant instead of collapsing to UTC.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::buffer::{Reader, Writer};
use crate::builtin::impl_builtin_described;
use crate::error::Error;
use crate::formatter::Formatter;
use crate::types::ext_code;
use crate::ensure;

fn value_mismatch<T>() -> Error {
    Error::type_error(format!(
        "value is not a {}",
        std::any::type_name::<T>()
    ))
}

const SECONDS_34_BIT: i64 = 1 << 34;

fn write_timestamp(writer: &mut Writer, secs: i64, nanos: u32) -> Result<(), Error> {
    if nanos == 0 && (0..=u32::MAX as i64).contains(&secs) {
        let mut data = [0u8; 4];
        data.copy_from_slice(&(secs as u32).to_be_bytes());
        writer.write_ext(ext_code::TIMESTAMP, &data)
    } else if (0..SECONDS_34_BIT).contains(&secs) {
        let packed = ((nanos as u64) << 34) | secs as u64;
        writer.write_ext(ext_code::TIMESTAMP, &packed.to_be_bytes())
    } else {
        let mut data = [0u8; 12];
        data[..4].copy_from_slice(&nanos.to_be_bytes());
        data[4..].copy_from_slice(&secs.to_be_bytes());
        writer.write_ext(ext_code::TIMESTAMP, &data)
    }
}

fn read_timestamp(reader: &mut Reader<'_>) -> Result<(i64, u32), Error> {
    let (code, data) = reader.read_ext()?;
    ensure!(
        code == ext_code::TIMESTAMP,
        Error::decode(format!("expected timestamp extension, found code {}", code))
    );
    match data.len() {
        4 => {
            let secs = u32::from_be_bytes(data.try_into().expect("length checked")) as i64;
            Ok((secs, 0))
        }
        8 => {
            let packed = u64::from_be_bytes(data.try_into().expect("length checked"));
            Ok(((packed & 0x3_ffff_ffff) as i64, (packed >> 34) as u32))
        }
        12 => {
            let nanos = u32::from_be_bytes(data[..4].try_into().expect("length checked"));
            let secs = i64::from_be_bytes(data[4..].try_into().expect("length checked"));
            Ok((secs, nanos))
        }
        n => Err(Error::invalid_data(format!(
            "timestamp extension payload of {} bytes",
            n
        ))),
    }
}

fn instant_from_parts(secs: i64, nanos: u32) -> Result<DateTime<Utc>, Error> {
    DateTime::from_timestamp(secs, nanos)
        .ok_or_else(|| Error::invalid_data(format!("timestamp {}s {}ns out of range", secs, nanos)))
}

fn datetime_utc_formatter() -> Formatter {
    Formatter::new(
        "DateTime<Utc>",
        Box::new(|value, writer, _| {
            let v = value
                .downcast_ref::<DateTime<Utc>>()
                .ok_or_else(value_mismatch::<DateTime<Utc>>)?;
            write_timestamp(writer, v.timestamp(), v.timestamp_subsec_nanos())
        }),
        Box::new(|reader, _| {
            let (secs, nanos) = read_timestamp(reader)?;
            Ok(Box::new(instant_from_parts(secs, nanos)?) as Box<dyn Any>)
        }),
    )
}

fn naive_datetime_formatter() -> Formatter {
    Formatter::new(
        "NaiveDateTime",
        Box::new(|value, writer, _| {
            let v = value
                .downcast_ref::<NaiveDateTime>()
                .ok_or_else(value_mismatch::<NaiveDateTime>)?;
            let utc = v.and_utc();
            write_timestamp(writer, utc.timestamp(), utc.timestamp_subsec_nanos())
        }),
        Box::new(|reader, _| {
            let (secs, nanos) = read_timestamp(reader)?;
            Ok(Box::new(instant_from_parts(secs, nanos)?.naive_utc()) as Box<dyn Any>)
        }),
    )
}

fn datetime_tz_formatter() -> Formatter {
    Formatter::new(
        "DateTime<FixedOffset>",
        Box::new(|value, writer, _| {
            let v = value
                .downcast_ref::<DateTime<FixedOffset>>()
                .ok_or_else(value_mismatch::<DateTime<FixedOffset>>)?;
            let mut data = [0u8; 12];
            data[..8].copy_from_slice(&v.timestamp_micros().to_be_bytes());
            data[8..].copy_from_slice(&v.offset().local_minus_utc().to_be_bytes());
            writer.write_ext(ext_code::DATETIME_TZ, &data)
        }),
        Box::new(|reader, _| {
            let (code, data) = reader.read_ext()?;
            ensure!(
                code == ext_code::DATETIME_TZ && data.len() == 12,
                Error::invalid_data("malformed offset date-time extension")
            );
            let micros = i64::from_be_bytes(data[..8].try_into().expect("length checked"));
            let offset_secs = i32::from_be_bytes(data[8..].try_into().expect("length checked"));
            let offset = FixedOffset::east_opt(offset_secs)
                .ok_or_else(|| Error::invalid_data(format!("invalid UTC offset {}s", offset_secs)))?;
            let secs = micros.div_euclid(1_000_000);
            let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
            Ok(Box::new(instant_from_parts(secs, nanos)?.with_timezone(&offset)) as Box<dyn Any>)
        }),
    )
}

fn duration_formatter() -> Formatter {
    Formatter::new(
        "Duration",
        Box::new(|value, writer, _| {
            let v = value
                .downcast_ref::<Duration>()
                .ok_or_else(value_mismatch::<Duration>)?;
            let mut data = [0u8; 12];
            data[..8].copy_from_slice(&v.num_seconds().to_be_bytes());
            data[8..].copy_from_slice(&v.subsec_nanos().to_be_bytes());
            writer.write_ext(ext_code::DURATION, &data)
        }),
        Box::new(|reader, _| {
            let (code, data) = reader.read_ext()?;
            ensure!(
                code == ext_code::DURATION && data.len() == 12,
                Error::invalid_data("malformed duration extension")
            );
            let secs = i64::from_be_bytes(data[..8].try_into().expect("length checked"));
            let nanos = i32::from_be_bytes(data[8..].try_into().expect("length checked"));
            let duration = Duration::try_seconds(secs)
                .and_then(|d| d.checked_add(&Duration::nanoseconds(nanos as i64)))
                .ok_or_else(|| Error::invalid_data(format!("duration {}s out of range", secs)))?;
            Ok(Box::new(duration) as Box<dyn Any>)
        }),
    )
}

fn uuid_formatter() -> Formatter {
    Formatter::new(
        "Uuid",
        Box::new(|value, writer, _| {
            let v = value.downcast_ref::<Uuid>().ok_or_else(value_mismatch::<Uuid>)?;
            writer.write_ext(ext_code::UUID, v.as_bytes())
        }),
        Box::new(|reader, _| {
            let (code, data) = reader.read_ext()?;
            ensure!(
                code == ext_code::UUID && data.len() == 16,
                Error::invalid_data("malformed uuid extension")
            );
            let bytes: [u8; 16] = data.try_into().expect("length checked");
            Ok(Box::new(Uuid::from_bytes(bytes)) as Box<dyn Any>)
        }),
    )
}

fn decimal_formatter() -> Formatter {
    Formatter::new(
        "Decimal",
        Box::new(|value, writer, _| {
            let v = value
                .downcast_ref::<Decimal>()
                .ok_or_else(value_mismatch::<Decimal>)?;
            let mut data = [0u8; 20];
            data[..4].copy_from_slice(&v.scale().to_be_bytes());
            data[4..].copy_from_slice(&v.mantissa().to_be_bytes());
            writer.write_ext(ext_code::DECIMAL, &data)
        }),
        Box::new(|reader, _| {
            let (code, data) = reader.read_ext()?;
            ensure!(
                code == ext_code::DECIMAL && data.len() == 20,
                Error::invalid_data("malformed decimal extension")
            );
            let scale = u32::from_be_bytes(data[..4].try_into().expect("length checked"));
            let mantissa = i128::from_be_bytes(data[4..].try_into().expect("length checked"));
            let decimal = Decimal::try_from_i128_with_scale(mantissa, scale)
                .map_err(|e| Error::invalid_data(format!("decimal out of range: {}", e)))?;
            Ok(Box::new(decimal) as Box<dyn Any>)
        }),
    )
}

static TABLE: Lazy<HashMap<TypeId, Arc<Formatter>>> = Lazy::new(|| {
    let mut table: HashMap<TypeId, Arc<Formatter>> = HashMap::new();
    table.insert(TypeId::of::<Uuid>(), Arc::new(uuid_formatter()));
    table.insert(TypeId::of::<Decimal>(), Arc::new(decimal_formatter()));
    table.insert(TypeId::of::<Duration>(), Arc::new(duration_formatter()));
    table.insert(
        TypeId::of::<DateTime<Utc>>(),
        Arc::new(datetime_utc_formatter()),
    );
    table.insert(
        TypeId::of::<DateTime<FixedOffset>>(),
        Arc::new(datetime_tz_formatter()),
    );
    table.insert(
        TypeId::of::<NaiveDateTime>(),
        Arc::new(naive_datetime_formatter()),
    );
    table
});

/// O(1) formatter lookup for the native extension types.
pub fn lookup(ty: TypeId) -> Option<Arc<Formatter>> {
    TABLE.get(&ty).cloned()
}

impl_builtin_described!(
    Uuid,
    Decimal,
    Duration,
    DateTime<Utc>,
    DateTime<FixedOffset>,
    NaiveDateTime,
);
