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

//! MessagePack wire primitives over [`Writer`]/[`Reader`].
//!
//! Every value is self-describing through a leading format marker. Encoding
//! always selects the canonical minimal header (the smallest marker whose
//! range fits the value/length); decoding accepts any valid-length encoding
//! of the same logical value, so `read_i64` consumes anything from a
//! positive fixint up to a full `int 64`.

use crate::buffer::{Reader, Writer};
use crate::error::Error;
use crate::ensure;

/// Format markers (single-byte tags) of the MessagePack spec.
pub mod marker {
    pub const NIL: u8 = 0xc0;
    pub const FALSE: u8 = 0xc2;
    pub const TRUE: u8 = 0xc3;
    pub const BIN8: u8 = 0xc4;
    pub const BIN16: u8 = 0xc5;
    pub const BIN32: u8 = 0xc6;
    pub const EXT8: u8 = 0xc7;
    pub const EXT16: u8 = 0xc8;
    pub const EXT32: u8 = 0xc9;
    pub const FLOAT32: u8 = 0xca;
    pub const FLOAT64: u8 = 0xcb;
    pub const UINT8: u8 = 0xcc;
    pub const UINT16: u8 = 0xcd;
    pub const UINT32: u8 = 0xce;
    pub const UINT64: u8 = 0xcf;
    pub const INT8: u8 = 0xd0;
    pub const INT16: u8 = 0xd1;
    pub const INT32: u8 = 0xd2;
    pub const INT64: u8 = 0xd3;
    pub const FIXEXT1: u8 = 0xd4;
    pub const FIXEXT2: u8 = 0xd5;
    pub const FIXEXT4: u8 = 0xd6;
    pub const FIXEXT8: u8 = 0xd7;
    pub const FIXEXT16: u8 = 0xd8;
    pub const STR8: u8 = 0xd9;
    pub const STR16: u8 = 0xda;
    pub const STR32: u8 = 0xdb;
    pub const ARRAY16: u8 = 0xdc;
    pub const ARRAY32: u8 = 0xdd;
    pub const MAP16: u8 = 0xde;
    pub const MAP32: u8 = 0xdf;

    pub const FIXMAP_LOW: u8 = 0x80;
    pub const FIXARRAY_LOW: u8 = 0x90;
    pub const FIXSTR_LOW: u8 = 0xa0;
    pub const NEG_FIXINT_LOW: u8 = 0xe0;

    pub const FIXSTR_MAX_LEN: usize = 31;
    pub const FIXARRAY_MAX_LEN: usize = 15;
    pub const FIXMAP_MAX_LEN: usize = 15;
}

use marker::*;

impl Writer {
    pub fn write_nil(&mut self) {
        self.write_u8(NIL);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(if v { TRUE } else { FALSE });
    }

    /// Canonical unsigned integer: positive fixint, then uint 8/16/32/64.
    pub fn write_uint(&mut self, v: u64) {
        if v < 0x80 {
            self.write_u8(v as u8);
        } else if v <= u8::MAX as u64 {
            self.write_u8(UINT8);
            self.write_u8(v as u8);
        } else if v <= u16::MAX as u64 {
            self.write_u8(UINT16);
            self.write_u16(v as u16);
        } else if v <= u32::MAX as u64 {
            self.write_u8(UINT32);
            self.write_u32(v as u32);
        } else {
            self.write_u8(UINT64);
            self.write_u64(v);
        }
    }

    /// Canonical signed integer. Non-negative values take the unsigned
    /// family so an `i64` and a `u64` holding the same value encode to
    /// identical bytes.
    pub fn write_int(&mut self, v: i64) {
        if v >= 0 {
            self.write_uint(v as u64);
        } else if v >= -32 {
            self.write_u8(v as u8);
        } else if v >= i8::MIN as i64 {
            self.write_u8(INT8);
            self.write_i8(v as i8);
        } else if v >= i16::MIN as i64 {
            self.write_u8(INT16);
            self.write_i16(v as i16);
        } else if v >= i32::MIN as i64 {
            self.write_u8(INT32);
            self.write_i32(v as i32);
        } else {
            self.write_u8(INT64);
            self.write_i64(v);
        }
    }

    pub fn write_float32(&mut self, v: f32) {
        self.write_u8(FLOAT32);
        self.write_f32(v);
    }

    pub fn write_float64(&mut self, v: f64) {
        self.write_u8(FLOAT64);
        self.write_f64(v);
    }

    /// Writes a string header for a UTF-8 payload of `len` bytes; the caller
    /// appends the raw bytes. Split out so precomputed key bytes can be
    /// emitted without re-encoding.
    pub fn write_str_header(&mut self, len: usize) -> Result<(), Error> {
        if len <= FIXSTR_MAX_LEN {
            self.write_u8(FIXSTR_LOW | len as u8);
        } else if len <= u8::MAX as usize {
            self.write_u8(STR8);
            self.write_u8(len as u8);
        } else if len <= u16::MAX as usize {
            self.write_u8(STR16);
            self.write_u16(len as u16);
        } else if len <= u32::MAX as usize {
            self.write_u8(STR32);
            self.write_u32(len as u32);
        } else {
            return Err(Error::invalid_data("string exceeds u32 length"));
        }
        Ok(())
    }

    pub fn write_str(&mut self, v: &str) -> Result<(), Error> {
        self.write_str_header(v.len())?;
        self.write_bytes(v.as_bytes());
        Ok(())
    }

    pub fn write_bin(&mut self, v: &[u8]) -> Result<(), Error> {
        let len = v.len();
        if len <= u8::MAX as usize {
            self.write_u8(BIN8);
            self.write_u8(len as u8);
        } else if len <= u16::MAX as usize {
            self.write_u8(BIN16);
            self.write_u16(len as u16);
        } else if len <= u32::MAX as usize {
            self.write_u8(BIN32);
            self.write_u32(len as u32);
        } else {
            return Err(Error::invalid_data("binary blob exceeds u32 length"));
        }
        self.write_bytes(v);
        Ok(())
    }

    pub fn write_array_header(&mut self, len: usize) -> Result<(), Error> {
        if len <= FIXARRAY_MAX_LEN {
            self.write_u8(FIXARRAY_LOW | len as u8);
        } else if len <= u16::MAX as usize {
            self.write_u8(ARRAY16);
            self.write_u16(len as u16);
        } else if len <= u32::MAX as usize {
            self.write_u8(ARRAY32);
            self.write_u32(len as u32);
        } else {
            return Err(Error::invalid_data("array exceeds u32 length"));
        }
        Ok(())
    }

    pub fn write_map_header(&mut self, len: usize) -> Result<(), Error> {
        if len <= FIXMAP_MAX_LEN {
            self.write_u8(FIXMAP_LOW | len as u8);
        } else if len <= u16::MAX as usize {
            self.write_u8(MAP16);
            self.write_u16(len as u16);
        } else if len <= u32::MAX as usize {
            self.write_u8(MAP32);
            self.write_u32(len as u32);
        } else {
            return Err(Error::invalid_data("map exceeds u32 length"));
        }
        Ok(())
    }

    /// Extension block: fixext for the fixed payload sizes, ext 8/16/32
    /// otherwise.
    pub fn write_ext(&mut self, code: i8, data: &[u8]) -> Result<(), Error> {
        match data.len() {
            1 => self.write_u8(FIXEXT1),
            2 => self.write_u8(FIXEXT2),
            4 => self.write_u8(FIXEXT4),
            8 => self.write_u8(FIXEXT8),
            16 => self.write_u8(FIXEXT16),
            len if len <= u8::MAX as usize => {
                self.write_u8(EXT8);
                self.write_u8(len as u8);
            }
            len if len <= u16::MAX as usize => {
                self.write_u8(EXT16);
                self.write_u16(len as u16);
            }
            len if len <= u32::MAX as usize => {
                self.write_u8(EXT32);
                self.write_u32(len as u32);
            }
            _ => return Err(Error::invalid_data("extension exceeds u32 length")),
        }
        self.write_i8(code);
        self.write_bytes(data);
        Ok(())
    }
}

#[inline]
fn is_fixstr(m: u8) -> bool {
    (0xa0..=0xbf).contains(&m)
}

#[inline]
fn is_fixarray(m: u8) -> bool {
    (0x90..=0x9f).contains(&m)
}

#[inline]
fn is_fixmap(m: u8) -> bool {
    (0x80..=0x8f).contains(&m)
}

#[inline]
fn is_pos_fixint(m: u8) -> bool {
    m < 0x80
}

#[inline]
fn is_neg_fixint(m: u8) -> bool {
    m >= NEG_FIXINT_LOW
}

impl<'buf> Reader<'buf> {
    pub fn peek_is_nil(&self) -> Result<bool, Error> {
        Ok(self.peek_u8()? == NIL)
    }

    pub fn read_nil(&mut self) -> Result<(), Error> {
        let m = self.read_u8()?;
        ensure!(
            m == NIL,
            Error::decode(format!("expected nil, found marker 0x{:02x}", m))
        );
        Ok(())
    }

    pub fn read_bool(&mut self) -> Result<bool, Error> {
        match self.read_u8()? {
            TRUE => Ok(true),
            FALSE => Ok(false),
            m => Err(Error::decode(format!(
                "expected bool, found marker 0x{:02x}",
                m
            ))),
        }
    }

    /// Reads any integer encoding whose value fits `i64`.
    pub fn read_int(&mut self) -> Result<i64, Error> {
        let m = self.read_u8()?;
        if is_pos_fixint(m) {
            return Ok(m as i64);
        }
        if is_neg_fixint(m) {
            return Ok(m as i8 as i64);
        }
        match m {
            UINT8 => Ok(self.read_u8()? as i64),
            UINT16 => Ok(self.read_u16()? as i64),
            UINT32 => Ok(self.read_u32()? as i64),
            UINT64 => {
                let v = self.read_u64()?;
                i64::try_from(v)
                    .map_err(|_| Error::invalid_data(format!("integer {} exceeds i64 range", v)))
            }
            INT8 => Ok(self.read_i8()? as i64),
            INT16 => Ok(self.read_i16()? as i64),
            INT32 => Ok(self.read_i32()? as i64),
            INT64 => self.read_i64(),
            _ => Err(Error::decode(format!(
                "expected integer, found marker 0x{:02x}",
                m
            ))),
        }
    }

    /// Reads any integer encoding whose value is non-negative.
    pub fn read_uint(&mut self) -> Result<u64, Error> {
        let m = self.read_u8()?;
        if is_pos_fixint(m) {
            return Ok(m as u64);
        }
        match m {
            UINT8 => Ok(self.read_u8()? as u64),
            UINT16 => Ok(self.read_u16()? as u64),
            UINT32 => Ok(self.read_u32()? as u64),
            UINT64 => self.read_u64(),
            INT8 | INT16 | INT32 | INT64 => {
                let v = match m {
                    INT8 => self.read_i8()? as i64,
                    INT16 => self.read_i16()? as i64,
                    INT32 => self.read_i32()? as i64,
                    _ => self.read_i64()?,
                };
                u64::try_from(v)
                    .map_err(|_| Error::invalid_data(format!("integer {} is negative", v)))
            }
            _ if is_neg_fixint(m) => Err(Error::invalid_data(format!(
                "integer {} is negative",
                m as i8
            ))),
            _ => Err(Error::decode(format!(
                "expected integer, found marker 0x{:02x}",
                m
            ))),
        }
    }

    pub fn read_float32(&mut self) -> Result<f32, Error> {
        let m = self.read_u8()?;
        ensure!(
            m == FLOAT32,
            Error::decode(format!("expected float32, found marker 0x{:02x}", m))
        );
        self.read_f32()
    }

    /// Accepts both float widths; a float32 payload widens losslessly.
    pub fn read_float64(&mut self) -> Result<f64, Error> {
        match self.read_u8()? {
            FLOAT32 => Ok(self.read_f32()? as f64),
            FLOAT64 => self.read_f64(),
            m => Err(Error::decode(format!(
                "expected float, found marker 0x{:02x}",
                m
            ))),
        }
    }

    pub fn read_str_len(&mut self) -> Result<usize, Error> {
        let m = self.read_u8()?;
        if is_fixstr(m) {
            return Ok((m & 0x1f) as usize);
        }
        match m {
            STR8 => Ok(self.read_u8()? as usize),
            STR16 => Ok(self.read_u16()? as usize),
            STR32 => Ok(self.read_u32()? as usize),
            _ => Err(Error::decode(format!(
                "expected string, found marker 0x{:02x}",
                m
            ))),
        }
    }

    /// Raw UTF-8 payload of a string value, borrowed from the buffer.
    pub fn read_str_bytes(&mut self) -> Result<&'buf [u8], Error> {
        let len = self.read_str_len()?;
        self.read_bytes(len)
    }

    pub fn read_str(&mut self) -> Result<String, Error> {
        let bytes = self.read_str_bytes()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| Error::invalid_data("string payload is not valid UTF-8"))
    }

    pub fn read_bin(&mut self) -> Result<&'buf [u8], Error> {
        let m = self.read_u8()?;
        let len = match m {
            BIN8 => self.read_u8()? as usize,
            BIN16 => self.read_u16()? as usize,
            BIN32 => self.read_u32()? as usize,
            _ => {
                return Err(Error::decode(format!(
                    "expected binary, found marker 0x{:02x}",
                    m
                )))
            }
        };
        self.read_bytes(len)
    }

    pub fn read_array_len(&mut self) -> Result<usize, Error> {
        let m = self.read_u8()?;
        if is_fixarray(m) {
            return Ok((m & 0x0f) as usize);
        }
        match m {
            ARRAY16 => Ok(self.read_u16()? as usize),
            ARRAY32 => Ok(self.read_u32()? as usize),
            _ => Err(Error::decode(format!(
                "expected array, found marker 0x{:02x}",
                m
            ))),
        }
    }

    pub fn read_map_len(&mut self) -> Result<usize, Error> {
        let m = self.read_u8()?;
        if is_fixmap(m) {
            return Ok((m & 0x0f) as usize);
        }
        match m {
            MAP16 => Ok(self.read_u16()? as usize),
            MAP32 => Ok(self.read_u32()? as usize),
            _ => Err(Error::decode(format!(
                "expected map, found marker 0x{:02x}",
                m
            ))),
        }
    }

    /// Extension block: `(type code, payload)`.
    pub fn read_ext(&mut self) -> Result<(i8, &'buf [u8]), Error> {
        let m = self.read_u8()?;
        let len = match m {
            FIXEXT1 => 1,
            FIXEXT2 => 2,
            FIXEXT4 => 4,
            FIXEXT8 => 8,
            FIXEXT16 => 16,
            EXT8 => self.read_u8()? as usize,
            EXT16 => self.read_u16()? as usize,
            EXT32 => self.read_u32()? as usize,
            _ => {
                return Err(Error::decode(format!(
                    "expected extension, found marker 0x{:02x}",
                    m
                )))
            }
        };
        let code = self.read_i8()?;
        let data = self.read_bytes(len)?;
        Ok((code, data))
    }
}

/// Skips one complete value, including nested containers. Iterative: the
/// pending counter tracks how many values remain to be consumed.
pub fn skip_value(reader: &mut Reader<'_>) -> Result<(), Error> {
    let mut pending: u64 = 1;
    while pending > 0 {
        pending -= 1;
        let m = reader.read_u8()?;
        if is_pos_fixint(m) || is_neg_fixint(m) {
            continue;
        }
        if is_fixstr(m) {
            reader.skip((m & 0x1f) as usize)?;
            continue;
        }
        if is_fixarray(m) {
            pending += (m & 0x0f) as u64;
            continue;
        }
        if is_fixmap(m) {
            pending += 2 * (m & 0x0f) as u64;
            continue;
        }
        match m {
            NIL | TRUE | FALSE => {}
            UINT8 | INT8 => reader.skip(1)?,
            UINT16 | INT16 => reader.skip(2)?,
            UINT32 | INT32 | FLOAT32 => reader.skip(4)?,
            UINT64 | INT64 | FLOAT64 => reader.skip(8)?,
            STR8 | BIN8 => {
                let len = reader.read_u8()? as usize;
                reader.skip(len)?;
            }
            STR16 | BIN16 => {
                let len = reader.read_u16()? as usize;
                reader.skip(len)?;
            }
            STR32 | BIN32 => {
                let len = reader.read_u32()? as usize;
                reader.skip(len)?;
            }
            FIXEXT1 => reader.skip(2)?,
            FIXEXT2 => reader.skip(3)?,
            FIXEXT4 => reader.skip(5)?,
            FIXEXT8 => reader.skip(9)?,
            FIXEXT16 => reader.skip(17)?,
            EXT8 => {
                let len = reader.read_u8()? as usize;
                reader.skip(len + 1)?;
            }
            EXT16 => {
                let len = reader.read_u16()? as usize;
                reader.skip(len + 1)?;
            }
            EXT32 => {
                let len = reader.read_u32()? as usize;
                reader.skip(len + 1)?;
            }
            ARRAY16 => pending += reader.read_u16()? as u64,
            ARRAY32 => pending += reader.read_u32()? as u64,
            MAP16 => pending += 2 * reader.read_u16()? as u64,
            MAP32 => pending += 2 * reader.read_u32()? as u64,
            _ => {
                return Err(Error::decode(format!(
                    "cannot skip unknown marker 0x{:02x}",
                    m
                )))
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(f: impl FnOnce(&mut Writer)) -> Vec<u8> {
        let mut w = Writer::default();
        f(&mut w);
        w.into_bytes()
    }

    #[test]
    fn canonical_int_headers() {
        assert_eq!(written(|w| w.write_int(7)), vec![0x07]);
        assert_eq!(written(|w| w.write_int(127)), vec![0x7f]);
        assert_eq!(written(|w| w.write_int(128)), vec![UINT8, 0x80]);
        assert_eq!(written(|w| w.write_int(-1)), vec![0xff]);
        assert_eq!(written(|w| w.write_int(-32)), vec![0xe0]);
        assert_eq!(written(|w| w.write_int(-33)), vec![INT8, 0xdf]);
        assert_eq!(written(|w| w.write_int(300)), vec![UINT16, 0x01, 0x2c]);
        assert_eq!(
            written(|w| w.write_int(-70000)),
            vec![INT32, 0xff, 0xfe, 0xee, 0x90]
        );
        assert_eq!(
            written(|w| w.write_uint(u64::MAX)),
            vec![UINT64, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn signed_and_unsigned_same_value_same_bytes() {
        assert_eq!(written(|w| w.write_int(200)), written(|w| w.write_uint(200)));
        assert_eq!(
            written(|w| w.write_int(1 << 40)),
            written(|w| w.write_uint(1 << 40))
        );
    }

    #[test]
    fn tolerant_int_decode() {
        // the same logical value in a deliberately oversized encoding
        let mut w = Writer::default();
        w.write_u8(INT64);
        w.write_i64(5);
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_int().unwrap(), 5);

        let mut w = Writer::default();
        w.write_u8(UINT32);
        w.write_u32(5);
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_int().unwrap(), 5);
    }

    #[test]
    fn uint_rejects_negative() {
        let bytes = written(|w| w.write_int(-3));
        let mut r = Reader::new(&bytes);
        assert!(r.read_uint().is_err());
    }

    #[test]
    fn str_headers() {
        let bytes = written(|w| w.write_str("ab").unwrap());
        assert_eq!(bytes, vec![0xa2, b'a', b'b']);

        let long = "x".repeat(40);
        let bytes = written(|w| w.write_str(&long).unwrap());
        assert_eq!(bytes[0], STR8);
        assert_eq!(bytes[1], 40);

        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_str().unwrap(), long);
    }

    #[test]
    fn non_minimal_str_header_accepted() {
        let mut w = Writer::default();
        w.write_u8(STR16);
        w.write_u16(2);
        w.write_bytes(b"hi");
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_str().unwrap(), "hi");
    }

    #[test]
    fn array_and_map_headers() {
        assert_eq!(written(|w| w.write_array_header(2).unwrap()), vec![0x92]);
        assert_eq!(written(|w| w.write_map_header(2).unwrap()), vec![0x82]);
        let bytes = written(|w| w.write_array_header(70000).unwrap());
        assert_eq!(bytes[0], ARRAY32);
    }

    #[test]
    fn bin_round_trip() {
        let payload = vec![0u8, 1, 2, 255];
        let bytes = written(|w| w.write_bin(&payload).unwrap());
        assert_eq!(bytes[0], BIN8);
        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_bin().unwrap(), payload.as_slice());
    }

    #[test]
    fn ext_round_trip() {
        let bytes = written(|w| w.write_ext(5, &[1, 2, 3, 4]).unwrap());
        assert_eq!(bytes[0], FIXEXT4);
        let mut r = Reader::new(&bytes);
        let (code, data) = r.read_ext().unwrap();
        assert_eq!(code, 5);
        assert_eq!(data, &[1, 2, 3, 4]);

        // odd-sized payload falls back to ext8
        let bytes = written(|w| w.write_ext(-1, &[9, 9, 9]).unwrap());
        assert_eq!(bytes[0], EXT8);
    }

    #[test]
    fn skip_nested_value() {
        let mut w = Writer::default();
        // [1, {"k": [true, nil]}, "tail"]
        w.write_array_header(3).unwrap();
        w.write_int(1);
        w.write_map_header(1).unwrap();
        w.write_str("k").unwrap();
        w.write_array_header(2).unwrap();
        w.write_bool(true);
        w.write_nil();
        w.write_str("tail").unwrap();
        w.write_int(42);
        let bytes = w.into_bytes();

        let mut r = Reader::new(&bytes);
        skip_value(&mut r).unwrap();
        assert_eq!(r.read_int().unwrap(), 42);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn nil_round_trip() {
        let bytes = written(|w| w.write_nil());
        assert_eq!(bytes, vec![NIL]);
        let mut r = Reader::new(&bytes);
        assert!(r.peek_is_nil().unwrap());
        r.read_nil().unwrap();
    }
}
