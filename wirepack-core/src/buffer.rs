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

//! Raw byte-level `Writer`/`Reader` over a caller-owned buffer.
//!
//! Multi-byte fields are big-endian. Neither side carries any internal
//! synchronization; a writer or reader instance must not be shared across
//! concurrent threads.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use crate::error::Error;

/// Append-only growable output buffer.
#[derive(Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn with_capacity(capacity: usize) -> Writer {
        Writer {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Keeps capacity, resets length to 0.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.buf.reserve(additional);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_bytes(&mut self, v: &[u8]) {
        self.buf.extend_from_slice(v);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.write_u8(value).unwrap();
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buf.write_i8(value).unwrap();
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf.write_u16::<BigEndian>(value).unwrap();
    }

    pub fn write_i16(&mut self, value: i16) {
        self.buf.write_i16::<BigEndian>(value).unwrap();
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.write_u32::<BigEndian>(value).unwrap();
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.write_i32::<BigEndian>(value).unwrap();
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.write_u64::<BigEndian>(value).unwrap();
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.write_i64::<BigEndian>(value).unwrap();
    }

    pub fn write_i128(&mut self, value: i128) {
        self.buf.write_i128::<BigEndian>(value).unwrap();
    }

    pub fn write_f32(&mut self, value: f32) {
        self.buf.write_f32::<BigEndian>(value).unwrap();
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.write_f64::<BigEndian>(value).unwrap();
    }
}

/// Bounds-checked cursor over a borrowed byte slice.
///
/// `read_bytes` hands out slices of the underlying buffer (`'buf`), not of
/// the reader, so decoded key/payload spans stay usable while the cursor
/// keeps advancing.
pub struct Reader<'buf> {
    buf: &'buf [u8],
    pos: usize,
}

impl<'buf> Reader<'buf> {
    pub fn new(buf: &'buf [u8]) -> Reader<'buf> {
        Reader { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    fn require(&self, n: usize) -> Result<(), Error> {
        if self.remaining() < n {
            return Err(Error::buffer_out_of_bound(self.pos, n, self.buf.len()));
        }
        Ok(())
    }

    pub fn peek_u8(&self) -> Result<u8, Error> {
        self.require(1)?;
        Ok(self.buf[self.pos])
    }

    pub fn skip(&mut self, n: usize) -> Result<(), Error> {
        self.require(n)?;
        self.pos += n;
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'buf [u8], Error> {
        self.require(n)?;
        let s = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        self.require(1)?;
        let v = self.buf[self.pos];
        self.pos += 1;
        Ok(v)
    }

    pub fn read_i8(&mut self) -> Result<i8, Error> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        Ok(BigEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_i16(&mut self) -> Result<i16, Error> {
        Ok(BigEndian::read_i16(self.read_bytes(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        Ok(BigEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32, Error> {
        Ok(BigEndian::read_i32(self.read_bytes(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64, Error> {
        Ok(BigEndian::read_u64(self.read_bytes(8)?))
    }

    pub fn read_i64(&mut self) -> Result<i64, Error> {
        Ok(BigEndian::read_i64(self.read_bytes(8)?))
    }

    pub fn read_i128(&mut self) -> Result<i128, Error> {
        Ok(BigEndian::read_i128(self.read_bytes(16)?))
    }

    pub fn read_f32(&mut self) -> Result<f32, Error> {
        Ok(BigEndian::read_f32(self.read_bytes(4)?))
    }

    pub fn read_f64(&mut self) -> Result<f64, Error> {
        Ok(BigEndian::read_f64(self.read_bytes(8)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_fixed_width() {
        let mut w = Writer::default();
        w.write_u8(0x7f);
        w.write_u16(0xbeef);
        w.write_u32(0xdead_beef);
        w.write_i64(-42);
        w.write_f64(1.5);
        let bytes = w.into_bytes();

        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_u8().unwrap(), 0x7f);
        assert_eq!(r.read_u16().unwrap(), 0xbeef);
        assert_eq!(r.read_u32().unwrap(), 0xdead_beef);
        assert_eq!(r.read_i64().unwrap(), -42);
        assert_eq!(r.read_f64().unwrap(), 1.5);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn big_endian_layout() {
        let mut w = Writer::default();
        w.write_u32(0x0102_0304);
        assert_eq!(w.as_slice(), &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn out_of_bound_read_fails() {
        let mut r = Reader::new(&[0x01]);
        assert!(r.read_u32().is_err());
        // cursor untouched after a failed read
        assert_eq!(r.read_u8().unwrap(), 0x01);
    }

    #[test]
    fn read_bytes_outlives_cursor_moves() {
        let bytes = [1u8, 2, 3, 4];
        let mut r = Reader::new(&bytes);
        let head = r.read_bytes(2).unwrap();
        let tail = r.read_bytes(2).unwrap();
        assert_eq!(head, &[1, 2]);
        assert_eq!(tail, &[3, 4]);
    }
}
